use std::sync::Arc;

use axum::{
    extract::{Form, Multipart, Path, Query, State},
    http::{HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    AppState,
    auth::{self, SessionToken, SignInForm},
    error::{AppError, AppResult},
    form::MovieForm,
    listing::{CatalogList, Pagination},
    models::{LocalFile, MovieId, SignInRequest},
    notify::{self, Navigation, Notice},
    templates,
};

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    /// A missing or unreadable page starts a fresh view at page 1.
    fn page(&self) -> i64 {
        self.page.as_deref().and_then(|p| p.trim().parse().ok()).unwrap_or(1)
    }
}

pub async fn index(jar: CookieJar) -> Response {
    if auth::session_token(&jar).is_some() {
        return Navigation::List.redirect().into_response();
    }
    let (jar, notice) = notify::take_flash(jar);
    (jar, Html(templates::sign_in_page(&SignInForm::default(), None, notice.as_ref()))).into_response()
}

pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(req): Form<SignInRequest>,
) -> Response {
    let form = SignInForm::from(req);

    match auth::sign_in(&*state.catalog, &form).await {
        Ok(session) => {
            let jar = auth::start_session(jar, &session, state.config.secure_cookies);
            let jar = notify::flash(jar, &Notice::success("Login successful"));
            (jar, Navigation::List.redirect()).into_response()
        },
        Err(AppError::Validation(errors)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Html(templates::sign_in_page(&form, Some(&errors), None)),
        )
            .into_response(),
        Err(err) => {
            let notice = Notice::error(err.to_string());
            (StatusCode::UNAUTHORIZED, Html(templates::sign_in_page(&form, None, Some(&notice))))
                .into_response()
        },
    }
}

pub async fn sign_out(jar: CookieJar) -> Response {
    (auth::end_session(jar), Navigation::SignIn.redirect()).into_response()
}

pub async fn list(_session: SessionToken, jar: CookieJar, Query(q): Query<PageQuery>) -> Response {
    let (jar, notice) = notify::take_flash(jar);
    (jar, Html(templates::list_page(q.page(), notice.as_ref()))).into_response()
}

pub async fn grid(
    State(state): State<Arc<AppState>>,
    SessionToken(token): SessionToken,
    Query(q): Query<PageQuery>,
) -> Response {
    let mut list = CatalogList::new(state.catalog.clone(), Some(token));
    let notice = list.load_all().await;
    list.go_to_page(q.page());
    debug!(
        page = list.pagination().map(Pagination::current_page),
        shown = list.displayed().len(),
        "grid rendered"
    );

    let mut resp = Html(templates::grid_fragment(&list, notice.as_ref())).into_response();
    resp.headers_mut().insert("datastar-selector", HeaderValue::from_static("#content"));
    resp.headers_mut().insert("datastar-mode", HeaderValue::from_static("outer"));
    resp
}

pub async fn new_movie(
    State(state): State<Arc<AppState>>,
    SessionToken(token): SessionToken,
    jar: CookieJar,
) -> Response {
    let (jar, notice) = notify::take_flash(jar);
    let form = MovieForm::create(state.catalog.clone(), Some(token));
    (jar, Html(templates::movie_form_page(&form, None, notice.as_ref()))).into_response()
}

pub async fn create_movie(
    State(state): State<Arc<AppState>>,
    SessionToken(token): SessionToken,
    jar: CookieJar,
    multipart: Multipart,
) -> Response {
    let mut form = MovieForm::create(state.catalog.clone(), Some(token));
    match Submission::read(multipart).await {
        Ok(submission) => submission.apply(&mut form, &state.catalog.public_url("")),
        Err(err) => return rerender(&form, err),
    }

    finish(&mut form, jar).await
}

pub async fn edit_movie(
    State(state): State<Arc<AppState>>,
    SessionToken(token): SessionToken,
    Path(id): Path<String>,
    jar: CookieJar,
) -> Response {
    match MovieForm::load_existing(state.catalog.clone(), Some(token), MovieId::new(id)).await {
        Ok(form) => {
            let (jar, notice) = notify::take_flash(jar);
            (jar, Html(templates::movie_form_page(&form, None, notice.as_ref()))).into_response()
        },
        Err(err @ AppError::NotFound(_)) => {
            let jar = notify::flash(jar, &Notice::error(err.to_string()));
            (jar, Navigation::List.redirect()).into_response()
        },
        Err(err) => err.into_response(),
    }
}

pub async fn update_movie(
    State(state): State<Arc<AppState>>,
    SessionToken(token): SessionToken,
    Path(id): Path<String>,
    jar: CookieJar,
    multipart: Multipart,
) -> Response {
    let mut form =
        match MovieForm::load_existing(state.catalog.clone(), Some(token), MovieId::new(id)).await {
            Ok(form) => form,
            Err(err @ AppError::NotFound(_)) => {
                let jar = notify::flash(jar, &Notice::error(err.to_string()));
                return (jar, Navigation::List.redirect()).into_response();
            },
            Err(err) => return err.into_response(),
        };
    match Submission::read(multipart).await {
        Ok(submission) => submission.apply(&mut form, &state.catalog.public_url("")),
        Err(err) => return rerender(&form, err),
    }

    finish(&mut form, jar).await
}

/// Submits the form and turns the outcome into a redirect or a re-rendered form.
async fn finish(form: &mut MovieForm, jar: CookieJar) -> Response {
    match form.submit().await {
        Ok(saved) => (notify::flash(jar, &saved.notice), saved.navigate.redirect()).into_response(),
        Err(AppError::Validation(errors)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Html(templates::movie_form_page(form, Some(&errors), None)),
        )
            .into_response(),
        Err(err @ AppError::NotFound(_)) => {
            let jar = notify::flash(jar, &Notice::error(err.to_string()));
            (jar, Navigation::List.redirect()).into_response()
        },
        Err(err) => rerender(form, err),
    }
}

/// Keeps the user on the form with the failure shown as a notice.
fn rerender(form: &MovieForm, err: AppError) -> Response {
    warn!(error = %err, "movie form not saved");
    let notice = Notice::error(err.to_string());
    (err.status(), Html(templates::movie_form_page(form, None, Some(&notice)))).into_response()
}

/// Fields of a multipart movie form.
#[derive(Debug, Default)]
struct Submission {
    title: Option<String>,
    year: Option<String>,
    poster_file: Option<LocalFile>,
    poster_url: Option<String>,
}

impl Submission {
    async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut out = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "title" => out.title = Some(field.text().await?),
                "year" => out.year = Some(field.text().await?),
                "poster_url" => {
                    let url = field.text().await?;
                    out.poster_url = Some(url.trim().to_string()).filter(|u| !u.is_empty());
                },
                "poster" => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field.bytes().await?;
                    // browsers send an empty part when no file is chosen
                    if !file_name.is_empty() && !bytes.is_empty() {
                        out.poster_file =
                            Some(LocalFile { name: file_name, content_type, bytes: bytes.to_vec() });
                    }
                },
                _ => {},
            }
        }

        Ok(out)
    }

    /// Copies the submitted values onto the form. A kept poster URL is only
    /// honoured when it points into the catalog's public storage.
    fn apply(self, form: &mut MovieForm, public_prefix: &str) {
        if let Some(title) = self.title {
            form.set_title(title);
        }
        if let Some(year) = self.year {
            form.set_year(year);
        }
        if let Some(file) = self.poster_file {
            form.set_poster_file(file);
        } else if let Some(url) = self.poster_url.filter(|u| u.starts_with(public_prefix)) {
            form.set_poster_url(url);
        }
    }
}
