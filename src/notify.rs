use axum::response::Redirect;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};

use crate::models::MovieId;

const FLASH_COOKIE: &str = "flash";

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Error,
}

/// A user-visible notification.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub level: Level,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: Level::Success, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: Level::Error, message: message.into() }
    }
}

/// Route transitions the controllers ask for.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Navigation {
    SignIn,
    List,
    Create,
    Edit(MovieId),
}

impl Navigation {
    pub fn path(&self) -> String {
        match self {
            Navigation::SignIn => "/".to_string(),
            Navigation::List => "/movies".to_string(),
            Navigation::Create => "/movies/new".to_string(),
            Navigation::Edit(id) => format!("/movies/{}/edit", urlencoding::encode(id.as_str())),
        }
    }

    pub fn redirect(&self) -> Redirect {
        Redirect::to(&self.path())
    }
}

/// Stores a notice for the next page render.
pub fn flash(jar: CookieJar, notice: &Notice) -> CookieJar {
    let Ok(json) = serde_json::to_string(notice) else {
        return jar;
    };
    let cookie = Cookie::build((FLASH_COOKIE, urlencoding::encode(&json).into_owned()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    jar.add(cookie)
}

/// Reads and clears the pending notice, if any.
pub fn take_flash(jar: CookieJar) -> (CookieJar, Option<Notice>) {
    let Some(raw) = jar.get(FLASH_COOKIE).map(|c| c.value().to_string()) else {
        return (jar, None);
    };
    let notice = urlencoding::decode(&raw)
        .ok()
        .and_then(|json| serde_json::from_str::<Notice>(&json).ok());
    (jar.remove(Cookie::build(FLASH_COOKIE).path("/")), notice)
}
