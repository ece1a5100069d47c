//! One-shot flash notices
//!
//! A notice is queued on a redirect and shown by the next rendered page,
//! which also clears the cookie.

use crate::api::cookies::{flash_cookie, read_cookie, FLASH_COOKIE};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub kind: FlashKind,
    pub message: String,
}

impl FlashMessage {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Danger,
            message: message.into(),
        }
    }
}

/// Serialize notices for the flash cookie
pub fn encode(messages: &[FlashMessage]) -> String {
    serde_json::to_string(messages).unwrap_or_else(|_| "[]".to_string())
}

/// Read a decoded flash cookie; anything unreadable is dropped
pub fn decode(value: &str) -> Vec<FlashMessage> {
    serde_json::from_str(value).unwrap_or_default()
}

/// Notices pending for the current request
#[derive(Debug, Clone, Default)]
pub struct Flash(pub Vec<FlashMessage>);

impl Flash {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Flash
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Flash(
            read_cookie(&parts.headers, FLASH_COOKIE)
                .map(|value| decode(&value))
                .unwrap_or_default(),
        ))
    }
}

/// `303 See Other` that queues flash notices and optional extra cookies
#[derive(Debug)]
pub struct FlashRedirect {
    location: String,
    messages: Vec<FlashMessage>,
    cookies: Vec<Cookie<'static>>,
}

impl FlashRedirect {
    pub fn to(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            messages: Vec::new(),
            cookies: Vec::new(),
        }
    }

    pub fn success(mut self, message: impl Into<String>) -> Self {
        self.messages.push(FlashMessage::success(message));
        self
    }

    pub fn danger(mut self, message: impl Into<String>) -> Self {
        self.messages.push(FlashMessage::danger(message));
        self
    }

    pub fn with_cookie(mut self, cookie: Cookie<'static>) -> Self {
        self.cookies.push(cookie);
        self
    }
}

impl IntoResponse for FlashRedirect {
    fn into_response(self) -> Response {
        let mut jar = self
            .cookies
            .into_iter()
            .fold(CookieJar::new(), |jar, cookie| jar.add(cookie));
        if !self.messages.is_empty() {
            jar = jar.add(flash_cookie(encode(&self.messages)));
        }
        (jar, Redirect::to(&self.location)).into_response()
    }
}
