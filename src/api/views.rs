//! Page rendering
//!
//! Pages are rendered as JSON documents naming the view, so a template layer
//! or a client can draw them. Every page carries the current user and drains
//! pending flash notices.

use crate::api::cookies::{removal_cookie, FLASH_COOKIE};
use crate::api::flash::{Flash, FlashMessage};
use crate::auth::middleware::CurrentUser;
use crate::auth::models::SessionUser;
use crate::core::validation::ValidationErrors;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use serde_json::Value;

/// Rendered page body
#[derive(Debug, Serialize)]
pub struct PageBody<'a> {
    pub view: &'static str,
    pub page_title: String,
    pub user: Option<&'a SessionUser>,
    pub messages: Vec<FlashMessage>,
    pub errors: ValidationErrors,
    pub data: Value,
}

/// A page waiting to be rendered
#[derive(Debug)]
pub struct Page {
    view: &'static str,
    page_title: String,
    status: StatusCode,
    errors: ValidationErrors,
    data: Value,
}

impl Page {
    pub fn new(view: &'static str, page_title: impl Into<String>) -> Self {
        Self {
            view,
            page_title: page_title.into(),
            status: StatusCode::OK,
            errors: ValidationErrors::default(),
            data: Value::Null,
        }
    }

    pub fn with_data(mut self, data: impl Serialize) -> Self {
        self.data = serde_json::to_value(data).unwrap_or_default();
        self
    }

    /// Attach field errors; the page is served as `400 Bad Request`
    pub fn with_errors(mut self, errors: ValidationErrors) -> Self {
        self.errors = errors;
        self.status = StatusCode::BAD_REQUEST;
        self
    }

    pub fn render(self, user: &CurrentUser, flash: Flash) -> Response {
        let had_flash = !flash.is_empty();
        let body = PageBody {
            view: self.view,
            page_title: self.page_title,
            user: user.0.as_ref(),
            messages: flash.0,
            errors: self.errors,
            data: self.data,
        };

        let mut jar = CookieJar::new();
        if had_flash {
            jar = jar.add(removal_cookie(FLASH_COOKIE));
        }
        (self.status, jar, Json(body)).into_response()
    }
}
