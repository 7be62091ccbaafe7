//! In-memory catalog used by unit and route tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::{
    catalog::CatalogService,
    error::CatalogError,
    models::{AccessToken, Movie, MovieFields, MovieId, Session, StoredObject},
};

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    SignIn { email: String },
    List,
    Insert(MovieFields),
    Update(MovieId, MovieFields),
    GetById(MovieId),
    PutObject { key: String, content_type: String, len: usize },
}

#[derive(Default)]
pub struct FakeCatalog {
    pub movies: Vec<Movie>,
    pub fail_upload: bool,
    pub fail_write: bool,
    pub fail_list: bool,
    pub fail_get: bool,
    pub reject_sign_in: bool,
    pub calls: Mutex<Vec<Call>>,
}

impl FakeCatalog {
    pub const PUBLIC_BASE: &'static str = "https://cdn.example/storage/v1/object/public";

    pub fn with_movies(count: usize) -> Self {
        Self { movies: (1..=count).map(movie).collect(), ..Default::default() }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> usize {
        self.calls().iter().filter(|c| matches!(c, Call::PutObject { .. })).count()
    }

    pub fn writes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Insert(_) | Call::Update(..)))
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

pub fn movie(n: usize) -> Movie {
    Movie {
        id: MovieId::new(n.to_string()),
        title: format!("Movie {n}"),
        year: 2000 + n as i32,
        poster: Some(format!("{}/movies/movies/{n}-poster.jpg", FakeCatalog::PUBLIC_BASE)),
    }
}

fn rejected(message: &str) -> CatalogError {
    CatalogError::Rejected { status: 500, message: message.to_string() }
}

#[async_trait]
impl CatalogService for FakeCatalog {
    async fn sign_in(&self, email: &str, _password: &str) -> Result<Session, CatalogError> {
        self.record(Call::SignIn { email: email.to_string() });
        if self.reject_sign_in {
            return Err(CatalogError::Rejected {
                status: 400,
                message: "Invalid login credentials".to_string(),
            });
        }
        Ok(Session {
            access_token: AccessToken::new("token-123"),
            expires_in: 3600,
            user_email: Some(email.to_string()),
        })
    }

    async fn list(&self, _token: Option<&AccessToken>) -> Result<Vec<Movie>, CatalogError> {
        self.record(Call::List);
        if self.fail_list {
            return Err(rejected("list failed"));
        }
        Ok(self.movies.clone())
    }

    async fn insert(
        &self,
        _token: Option<&AccessToken>,
        fields: &MovieFields,
    ) -> Result<Movie, CatalogError> {
        self.record(Call::Insert(fields.clone()));
        if self.fail_write {
            return Err(rejected("insert failed"));
        }
        Ok(Movie {
            id: MovieId::new(format!("new-{}", self.movies.len() + 1)),
            title: fields.title.clone(),
            year: fields.year.parse().unwrap_or_default(),
            poster: Some(fields.poster.clone()),
        })
    }

    async fn update(
        &self,
        _token: Option<&AccessToken>,
        id: &MovieId,
        fields: &MovieFields,
    ) -> Result<Movie, CatalogError> {
        self.record(Call::Update(id.clone(), fields.clone()));
        if self.fail_write {
            return Err(rejected("update failed"));
        }
        if !self.movies.iter().any(|m| &m.id == id) {
            return Err(CatalogError::NotFound);
        }
        Ok(Movie {
            id: id.clone(),
            title: fields.title.clone(),
            year: fields.year.parse().unwrap_or_default(),
            poster: Some(fields.poster.clone()),
        })
    }

    async fn get_by_id(
        &self,
        _token: Option<&AccessToken>,
        id: &MovieId,
    ) -> Result<Movie, CatalogError> {
        self.record(Call::GetById(id.clone()));
        if self.fail_get {
            return Err(rejected("movie lookup failed"));
        }
        self.movies.iter().find(|m| &m.id == id).cloned().ok_or(CatalogError::NotFound)
    }

    async fn put_object(
        &self,
        _token: Option<&AccessToken>,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredObject, CatalogError> {
        self.record(Call::PutObject {
            key: key.to_string(),
            content_type: content_type.to_string(),
            len: bytes.len(),
        });
        if self.fail_upload {
            return Err(rejected("storage unavailable"));
        }
        Ok(StoredObject { path: format!("movies/{key}") })
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", Self::PUBLIC_BASE, path)
    }
}
