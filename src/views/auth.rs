// Auth views - signup, login, logout backed by the sessions table

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Form,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    app_state::AppState,
    entities::{EntSession, EntUser},
    error::{AppError, AppResult},
    forms::{
        auth_form::{safe_next, INVALID_LOGIN, USERNAME_TAKEN},
        BoundForm, FormErrors, LoginForm, SignupForm,
    },
    infrastructure::{
        middleware::{Vc, SESSION_COOKIE},
        security::{hash_password, verify_password},
    },
    render::{redirect, TemplateResponse},
};

#[derive(Serialize)]
pub struct AuthFormContext<T> {
    pub form: BoundForm<T>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.session.cookie_secure)
        .build()
}

async fn start_session(state: &AppState, jar: CookieJar, user: &EntUser, location: &str) -> AppResult<Response> {
    let session = EntSession::create(&state.db, user.id, state.session_ttl()).await?;
    let jar = jar.add(session_cookie(state, session.token));
    Ok((jar, redirect(location)).into_response())
}

async fn blocking<T, F>(work: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Internal(format!("Password task failed: {}", e)))?
}

fn signup_form(form: BoundForm<SignupForm>) -> Response {
    TemplateResponse::new("signup.html", AuthFormContext { form }).into_response()
}

fn login_form(form: BoundForm<LoginForm>) -> Response {
    TemplateResponse::new("login.html", AuthFormContext { form }).into_response()
}

pub async fn signup_page() -> Response {
    signup_form(BoundForm::unbound(SignupForm::default()))
}

pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SignupForm>,
) -> AppResult<Response> {
    let mut errors = form.clean().err().unwrap_or_default();
    if !errors.has("username") && EntUser::username_exists(&state.db, &form.username).await? {
        errors.add("username", USERNAME_TAKEN);
    }
    if !errors.is_empty() {
        return Ok(signup_form(BoundForm::with_errors(form, errors)));
    }

    let password = form.password1.clone();
    let password_hash = blocking(move || hash_password(&password)).await?;
    let user = match EntUser::create(&state.db, &form.username, &password_hash).await {
        Ok(user) => user,
        Err(AppError::Validation(message)) => {
            let mut errors = FormErrors::new();
            errors.add("username", message);
            return Ok(signup_form(BoundForm::with_errors(form, errors)));
        }
        Err(e) => return Err(e),
    };

    info!(user = %user.username, "Signed up");
    start_session(&state, jar, &user, "/").await
}

pub async fn login_page(Query(query): Query<NextQuery>) -> Response {
    login_form(BoundForm::unbound(LoginForm {
        next: query.next,
        ..LoginForm::default()
    }))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    if let Err(errors) = form.clean() {
        return Ok(login_form(BoundForm::with_errors(form, errors)));
    }

    let user = match EntUser::gen_by_username(&state.db, &form.username).await? {
        Some(user) => {
            let password = form.password.clone();
            let password_hash = user.password_hash.clone();
            if blocking(move || verify_password(&password, &password_hash)).await? {
                Some(user)
            } else {
                None
            }
        }
        None => None,
    };

    let Some(user) = user else {
        info!(user = %form.username, "Failed login");
        let mut errors = FormErrors::new();
        errors.add("__all__", INVALID_LOGIN);
        return Ok(login_form(BoundForm::with_errors(form, errors)));
    };

    let location = safe_next(form.next.as_deref()).to_string();
    start_session(&state, jar, &user, &location).await
}

pub async fn logout(State(state): State<AppState>, vc: Vc, jar: CookieJar) -> AppResult<Response> {
    if let Some(token) = &vc.session_token {
        EntSession::delete(&state.db, token).await?;
    }
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    let page = TemplateResponse::new("logged_out.html", serde_json::json!({}));
    Ok((jar, page).into_response())
}
