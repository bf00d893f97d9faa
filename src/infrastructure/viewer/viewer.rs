use crate::entities::EntUser;

/// Request-scoped identity. Anonymous when no live session was presented.
#[derive(Debug, Clone)]
pub struct ViewerContext {
    pub request_id: String,
    pub user: Option<EntUser>,
    pub session_token: Option<String>,
}

impl ViewerContext {
    pub fn anonymous(request_id: String) -> Self {
        ViewerContext {
            request_id,
            user: None,
            session_token: None,
        }
    }

    pub fn authenticated(request_id: String, user: EntUser, session_token: String) -> Self {
        ViewerContext {
            request_id,
            user: Some(user),
            session_token: Some(session_token),
        }
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user.as_ref().map(|user| user.id)
    }
}
