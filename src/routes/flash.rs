//! Notices carried across a redirect in an encrypted cookie.

use axum_extra::extract::cookie::{Cookie, PrivateCookieJar};
use tracing::warn;

use crate::notice::Notice;

pub const FLASH_COOKIE: &str = "trip_flash";

pub fn take(jar: PrivateCookieJar) -> (PrivateCookieJar, Vec<Notice>) {
    let Some(cookie) = jar.get(FLASH_COOKIE) else {
        return (jar, Vec::new());
    };
    let notices = serde_json::from_str(cookie.value()).unwrap_or_else(|err| {
        warn!("dropping unreadable flash cookie: {err}");
        Vec::new()
    });
    let jar = jar.remove(Cookie::build(FLASH_COOKIE).path("/"));
    (jar, notices)
}

pub fn put(jar: PrivateCookieJar, notices: Vec<Notice>) -> PrivateCookieJar {
    if notices.is_empty() {
        return jar;
    }
    match serde_json::to_string(&notices) {
        Ok(value) => jar.add(
            Cookie::build((FLASH_COOKIE, value))
                .path("/")
                .http_only(true),
        ),
        Err(err) => {
            warn!("could not encode flash notices: {err}");
            jar
        }
    }
}
