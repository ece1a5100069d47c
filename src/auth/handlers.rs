//! Registration, login and logout handlers

use crate::api::cookies::{removal_cookie, session_cookie, SESSION_COOKIE};
use crate::api::flash::{Flash, FlashRedirect};
use crate::api::handlers::AppState;
use crate::api::views::Page;
use crate::auth::middleware::{CurrentUser, LOGIN_PATH};
use crate::auth::models::{LoginRequest, RegisterRequest};
use crate::core::error::{BoardError, Result};
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Form,
};
use serde_json::json;

/// Handler for GET /user/register
pub async fn register_page(user: CurrentUser, flash: Flash) -> Response {
    Page::new("register", "Register").render(&user, flash)
}

/// Handler for POST /user/register
pub async fn register(
    State(state): State<AppState>,
    user: CurrentUser,
    flash: Flash,
    Form(req): Form<RegisterRequest>,
) -> Result<Response> {
    tracing::info!(username = %req.username, "User registration attempt");

    match state.auth_service.register(&req).await {
        Ok(_) => Ok(FlashRedirect::to(LOGIN_PATH)
            .success("You are now registered.")
            .into_response()),
        Err(BoardError::Validation(errors)) => {
            tracing::info!(username = %req.username, errors = errors.len(), "Registration rejected");
            // Passwords are never echoed back
            let form = json!({
                "name": req.name,
                "email": req.email,
                "username": req.username,
            });
            Ok(Page::new("register", "Register")
                .with_data(form)
                .with_errors(errors)
                .render(&user, flash))
        }
        Err(e) => Err(e),
    }
}

/// Handler for GET /user/login
pub async fn login_page(user: CurrentUser, flash: Flash) -> Response {
    Page::new("login", "Login").render(&user, flash)
}

/// Handler for POST /user/login
pub async fn login(
    State(state): State<AppState>,
    Form(req): Form<LoginRequest>,
) -> Result<Response> {
    tracing::info!(username = %req.username, "Login attempt");

    let session = match state.auth_service.authenticate(&req.username, &req.password).await {
        Ok(session) => session,
        Err(BoardError::AuthenticationError(message)) => {
            return Ok(FlashRedirect::to(LOGIN_PATH).danger(message).into_response());
        }
        Err(e) => return Err(e),
    };

    let token = state.auth_service.issue_token(&session)?;
    let cookie = session_cookie(&token, state.auth_service.session_ttl(), state.secure_cookies);

    Ok(FlashRedirect::to("/")
        .with_cookie(cookie)
        .success("You are now logged in.")
        .into_response())
}

/// Handler for GET /user/logout
pub async fn logout(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> Result<Response> {
    if let Some(user) = user {
        state.auth_service.logout(&user.session_id).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "User logged out");
    }

    Ok(FlashRedirect::to(LOGIN_PATH)
        .with_cookie(removal_cookie(SESSION_COOKIE))
        .success("You are logged out.")
        .into_response())
}
