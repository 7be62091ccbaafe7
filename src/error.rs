use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::models::MovieId;

/// Failures raised at the boundary with the hosted catalog service.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog service unreachable: {0}")]
    Unreachable(String),
    #[error("record not found")]
    NotFound,
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("malformed response from catalog service: {0}")]
    Schema(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Field {
    Title,
    Year,
    Poster,
    Email,
    Password,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldError {
    pub field: Field,
    pub message: &'static str,
}

/// Every failed check of a form, in field order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn push(&mut self, field: Field, message: &'static str) {
        self.0.push(FieldError { field, message });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn for_field(&self, field: Field) -> Option<&'static str> {
        self.0.iter().find(|e| e.field == field).map(|e| e.message)
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<&str> = self.0.iter().map(|e| e.message).collect();
        f.write_str(&messages.join("; "))
    }
}

/// User-facing failures. Each one ends at the route boundary as a notice,
/// a re-rendered form, or an error page.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(ValidationErrors),
    #[error("{0}")]
    Upload(String),
    #[error("{0}")]
    RecordWrite(String),
    #[error("Movie not found")]
    NotFound(MovieId),
    #[error("{0}")]
    Auth(String),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("The poster is too large.")]
    TooLarge,
    #[error("{0}")]
    BadRequest(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Upload(_) | AppError::RecordWrite(_) | AppError::Catalog(_) => {
                StatusCode::BAD_GATEWAY
            },
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::TooLarge
        } else {
            Self::BadRequest(err.body_text())
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = crate::templates::error_page(self.to_string());
        (status, Html(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
