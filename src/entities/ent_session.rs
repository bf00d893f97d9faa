// EntSession - login sessions behind the `sessionid` cookie

use chrono::{DateTime, Duration, Utc};
use sqlx::FromRow;
use tracing::{debug, info};

use super::EntUser;
use crate::error::AppResult;
use crate::infrastructure::database::BlogDatabase;
use crate::infrastructure::security::generate_session_token;

#[derive(Debug, Clone, FromRow)]
pub struct EntSession {
    pub token: String,
    pub user_id: i64,
    pub created: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

impl EntSession {
    pub async fn create(db: &BlogDatabase, user_id: i64, ttl: Duration) -> AppResult<Self> {
        let now = Utc::now();
        let session = sqlx::query_as::<_, EntSession>(
            "INSERT INTO sessions (token, user_id, created, expires) VALUES (?, ?, ?, ?) RETURNING *",
        )
        .bind(generate_session_token())
        .bind(user_id)
        .bind(now)
        .bind(now + ttl)
        .fetch_one(&db.pool)
        .await?;

        info!("Opened session for user {}", user_id);
        Ok(session)
    }

    /// The user behind a live session. Expired sessions are dropped on sight.
    pub async fn gen_user(db: &BlogDatabase, token: &str) -> AppResult<Option<EntUser>> {
        let session = sqlx::query_as::<_, EntSession>("SELECT * FROM sessions WHERE token = ?")
            .bind(token)
            .fetch_optional(&db.pool)
            .await?;

        let Some(session) = session else {
            return Ok(None);
        };
        if session.expires <= Utc::now() {
            debug!("Session for user {} expired", session.user_id);
            Self::delete(db, token).await?;
            return Ok(None);
        }

        let user = sqlx::query_as::<_, EntUser>("SELECT * FROM users WHERE id = ?")
            .bind(session.user_id)
            .fetch_optional(&db.pool)
            .await?;
        Ok(user)
    }

    pub async fn delete(db: &BlogDatabase, token: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&db.pool)
            .await?;
        Ok(())
    }

    pub async fn purge_expired(db: &BlogDatabase) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires <= ?")
            .bind(Utc::now())
            .execute(&db.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
