use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CatalogError;

/// Identifier assigned by the catalog service. Numeric and textual ids are
/// both carried as text.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovieId(String);

impl MovieId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MovieId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    pub year: i32,
    /// Legacy rows may lack a poster; rows written here always have one.
    pub poster: Option<String>,
}

/// Payload of an insert or update. The poster is always a resolved URL.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct MovieFields {
    pub title: String,
    pub year: String,
    pub poster: String,
}

/// A selected image that has not been uploaded yet.
#[derive(Clone, Debug, PartialEq)]
pub struct LocalFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Poster {
    Url(String),
    Local(LocalFile),
}

impl Poster {
    pub fn url(&self) -> Option<&str> {
        match self {
            Poster::Url(url) => Some(url),
            Poster::Local(_) => None,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Session {
    pub access_token: AccessToken,
    pub expires_in: i64,
    pub user_email: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
pub struct StoredObject {
    /// Bucket-qualified path, e.g. `movies/movies/1737849326350-poster.jpg`.
    #[serde(rename = "Key")]
    pub path: String,
}

/// A record row exactly as the service returns it, before any checks.
#[derive(Debug, Deserialize)]
pub struct RawMovieRow {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    year: Value,
    #[serde(default)]
    poster: Option<String>,
}

impl TryFrom<RawMovieRow> for Movie {
    type Error = CatalogError;

    fn try_from(row: RawMovieRow) -> Result<Self, Self::Error> {
        let id = match row.id {
            Value::String(s) if !s.trim().is_empty() => s,
            Value::Number(n) => n.to_string(),
            other => return Err(CatalogError::Schema(format!("invalid id: {other}"))),
        };

        let title = row
            .title
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| CatalogError::Schema(format!("movie {id} has no title")))?;

        let year = match &row.year {
            Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
            Value::String(s) => s.trim().parse::<i32>().ok(),
            _ => None,
        }
        .ok_or_else(|| CatalogError::Schema(format!("movie {id} has invalid year {}", row.year)))?;

        let poster = row.poster.filter(|p| !p.trim().is_empty());

        Ok(Movie { id: MovieId(id), title, year, poster })
    }
}

impl Movie {
    pub fn from_value(value: Value) -> Result<Self, CatalogError> {
        let row: RawMovieRow =
            serde_json::from_value(value).map_err(|e| CatalogError::Schema(e.to_string()))?;
        Movie::try_from(row)
    }
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}
