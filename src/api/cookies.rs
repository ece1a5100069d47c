//! Session and flash cookies

use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

/// Cookie holding the signed session token
pub const SESSION_COOKIE: &str = "session";

/// Cookie holding pending flash notices
pub const FLASH_COOKIE: &str = "flash";

/// Decoded value of a request cookie
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(name)
        .map(|cookie| cookie.value().to_owned())
}

fn base(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Session token cookie living as long as the server-side session
pub fn session_cookie(token: &str, max_age: u64, secure: bool) -> Cookie<'static> {
    let mut cookie = base(SESSION_COOKIE, token.to_owned());
    cookie.set_max_age(Duration::seconds(i64::try_from(max_age).unwrap_or(i64::MAX)));
    cookie.set_secure(secure);
    cookie
}

/// Flash cookie carrying serialized notices
pub fn flash_cookie(payload: String) -> Cookie<'static> {
    base(FLASH_COOKIE, payload)
}

/// Cookie that makes the browser drop `name`
pub fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = base(name, String::new());
    cookie.make_removal();
    cookie
}
