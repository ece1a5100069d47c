//! Session middleware and identity extractors

use crate::api::cookies::{read_cookie, removal_cookie, SESSION_COOKIE};
use crate::api::flash::FlashRedirect;
use crate::api::handlers::AppState;
use crate::auth::models::SessionUser;
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use std::convert::Infallible;

/// Where anonymous callers are sent
pub const LOGIN_PATH: &str = "/user/login";

/// Notice shown when a protected route is hit anonymously
pub const LOGIN_REQUIRED: &str = "You need to login.";

/// Identity of the caller, if any, stored in request extensions
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<SessionUser>);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Extractor for handlers that need a logged-in caller
#[derive(Debug, Clone)]
pub struct AuthUser(pub SessionUser);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = FlashRedirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<CurrentUser>() {
            Some(CurrentUser(Some(user))) => Ok(AuthUser(user.clone())),
            _ => Err(login_redirect()),
        }
    }
}

fn login_redirect() -> FlashRedirect {
    FlashRedirect::to(LOGIN_PATH).danger(LOGIN_REQUIRED)
}

/// Resolve the session cookie into a [`CurrentUser`]
///
/// Tokens that fail validation or name a dead session make the request
/// anonymous and the stale cookie is cleared on the way out.
pub async fn resolve_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let mut stale = false;
    let user = match read_cookie(request.headers(), SESSION_COOKIE) {
        Some(token) => match state.auth_service.resolve_token(&token).await {
            Ok(Some(user)) => Some(user),
            Ok(None) => {
                stale = true;
                None
            }
            Err(e) => return e.into_response(),
        },
        None => None,
    };

    if let Some(user) = &user {
        tracing::debug!(user_id = %user.id, username = %user.username, "Session resolved");
    }
    request.extensions_mut().insert(CurrentUser(user));

    let response = next.run(request).await;
    // A handler that issued a fresh session (login) wins over the clear
    let reissued = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| Cookie::parse(value).ok())
        .any(|cookie| cookie.name() == SESSION_COOKIE);
    if stale && !reissued {
        let jar = CookieJar::new().add(removal_cookie(SESSION_COOKIE));
        return (jar, response).into_response();
    }
    response
}

/// Gate a route on a logged-in caller
///
/// Anonymous callers are redirected to the login page with a notice.
pub async fn ensure_authenticated(request: Request, next: Next) -> Response {
    let authenticated = matches!(
        request.extensions().get::<CurrentUser>(),
        Some(CurrentUser(Some(_)))
    );

    if !authenticated {
        tracing::info!(path = %request.uri().path(), "Anonymous access to protected route");
        return login_redirect().into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::flash::decode;
    use axum::{
        body::Body,
        http::StatusCode,
        middleware,
        routing::get,
        Router,
    };
    use tower::util::ServiceExt; // For oneshot method

    async fn protected_handler(AuthUser(user): AuthUser) -> String {
        user.username
    }

    fn with_user(user: Option<SessionUser>) -> Router {
        Router::new()
            .route("/protected", get(protected_handler))
            .layer(middleware::from_fn(ensure_authenticated))
            .layer(middleware::from_fn(move |mut req: Request, next: Next| {
                let user = user.clone();
                async move {
                    req.extensions_mut().insert(CurrentUser(user));
                    next.run(req).await
                }
            }))
    }

    #[tokio::test]
    async fn test_anonymous_is_redirected_to_login() {
        let request = Request::builder().uri("/protected").body(Body::empty()).unwrap();
        let response = with_user(None).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], LOGIN_PATH);

        let raw = response.headers()[header::SET_COOKIE].to_str().unwrap();
        let cookie = Cookie::parse_encoded(raw).unwrap();
        assert_eq!(cookie.name(), crate::api::cookies::FLASH_COOKIE);
        assert_eq!(decode(cookie.value())[0].message, LOGIN_REQUIRED);
    }

    #[tokio::test]
    async fn test_logged_in_user_reaches_handler() {
        let user = SessionUser {
            session_id: "s1".to_string(),
            id: "u1".to_string(),
            username: "alice".to_string(),
            name: "Alice".to_string(),
        };
        let request = Request::builder().uri("/protected").body(Body::empty()).unwrap();
        let response = with_user(Some(user)).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"alice");
    }

    #[tokio::test]
    async fn test_extractor_alone_redirects_without_middleware() {
        let app = Router::new().route("/protected", get(protected_handler));
        let request = Request::builder().uri("/protected").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }
}
