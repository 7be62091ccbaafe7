use std::{num::NonZeroU32, sync::Arc};

use async_trait::async_trait;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use reqwest::{RequestBuilder, Response, header::CONTENT_TYPE};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::{
    config::Config,
    error::CatalogError,
    models::{AccessToken, Movie, MovieFields, MovieId, Session, StoredObject},
};

/// The hosted backend: password auth, the movie table and the poster bucket.
#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, CatalogError>;

    /// Every movie visible to the caller, in the service's default order.
    async fn list(&self, token: Option<&AccessToken>) -> Result<Vec<Movie>, CatalogError>;

    async fn insert(
        &self,
        token: Option<&AccessToken>,
        fields: &MovieFields,
    ) -> Result<Movie, CatalogError>;

    async fn update(
        &self,
        token: Option<&AccessToken>,
        id: &MovieId,
        fields: &MovieFields,
    ) -> Result<Movie, CatalogError>;

    async fn get_by_id(
        &self,
        token: Option<&AccessToken>,
        id: &MovieId,
    ) -> Result<Movie, CatalogError>;

    async fn put_object(
        &self,
        token: Option<&AccessToken>,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredObject, CatalogError>;

    /// Publicly resolvable URL of a stored object path.
    fn public_url(&self, path: &str) -> String;
}

pub struct SupabaseCatalog {
    client: reqwest::Client,
    base_url: Option<String>,
    api_key: Option<String>,
    table: String,
    bucket: String,
    public_base: String,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl SupabaseCatalog {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        // Warn once on app load; every call will fail until this is fixed
        if config.catalog_url.is_none() || config.catalog_key.is_none() {
            warn!("SUPABASE_URL or SUPABASE_KEY missing - catalog calls will fail");
        }

        let rps = NonZeroU32::new(config.catalog_rps).unwrap_or(NonZeroU32::MIN);
        let limiter = Arc::new(RateLimiter::direct(Quota::per_second(rps)));

        Self {
            client,
            base_url: config.catalog_url.clone(),
            api_key: config.catalog_key.clone(),
            table: config.catalog_table.clone(),
            bucket: config.catalog_bucket.clone(),
            public_base: config.public_object_base().unwrap_or_default(),
            limiter,
        }
    }

    fn endpoint(&self) -> Result<(&str, &str), CatalogError> {
        match (self.base_url.as_deref(), self.api_key.as_deref()) {
            (Some(url), Some(key)) => Ok((url, key)),
            (None, _) => Err(CatalogError::Unreachable("SUPABASE_URL is not configured".into())),
            (_, None) => Err(CatalogError::Unreachable("SUPABASE_KEY is not configured".into())),
        }
    }

    fn authorize(&self, req: RequestBuilder, key: &str, token: Option<&AccessToken>) -> RequestBuilder {
        let bearer = token.map(AccessToken::as_str).unwrap_or(key);
        req.header("apikey", key).bearer_auth(bearer)
    }

    fn table_url(&self, url: &str) -> String {
        format!("{url}/rest/v1/{}", self.table)
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, CatalogError> {
        self.limiter.until_ready().await;

        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let message = error_message(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
        debug!(status = status.as_u16(), message = %message, "catalog request rejected");
        Err(CatalogError::Rejected { status: status.as_u16(), message })
    }

    async fn rows(&self, req: RequestBuilder) -> Result<Vec<Value>, CatalogError> {
        let resp = self.send(req).await?;
        resp.json::<Vec<Value>>().await.map_err(|e| CatalogError::Schema(e.to_string()))
    }
}

#[async_trait]
impl CatalogService for SupabaseCatalog {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, CatalogError> {
        let (url, key) = self.endpoint()?;

        let req = self
            .client
            .post(format!("{url}/auth/v1/token"))
            .query(&[("grant_type", "password")])
            .header("apikey", key)
            .json(&json!({ "email": email, "password": password }));

        let resp: TokenResponse = self
            .send(req)
            .await?
            .json()
            .await
            .map_err(|e| CatalogError::Schema(e.to_string()))?;

        Ok(Session {
            access_token: AccessToken::new(resp.access_token),
            expires_in: resp.expires_in,
            user_email: resp.user.and_then(|u| u.email),
        })
    }

    async fn list(&self, token: Option<&AccessToken>) -> Result<Vec<Movie>, CatalogError> {
        let (url, key) = self.endpoint()?;

        let req = self.client.get(self.table_url(url)).query(&[("select", "*")]);
        let rows = self.rows(self.authorize(req, key, token)).await?;

        let total = rows.len();
        let movies: Vec<Movie> = rows
            .into_iter()
            .filter_map(|row| match Movie::from_value(row) {
                Ok(movie) => Some(movie),
                Err(err) => {
                    warn!(error = %err, "skipping malformed movie row");
                    None
                },
            })
            .collect();

        debug!(total = total, decoded = movies.len(), "listed movies");
        Ok(movies)
    }

    async fn insert(
        &self,
        token: Option<&AccessToken>,
        fields: &MovieFields,
    ) -> Result<Movie, CatalogError> {
        let (url, key) = self.endpoint()?;

        let req = self
            .client
            .post(self.table_url(url))
            .header("Prefer", "return=representation")
            .json(fields);
        let row = self
            .rows(self.authorize(req, key, token))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::Schema("insert returned no rows".into()))?;

        Movie::from_value(row)
    }

    async fn update(
        &self,
        token: Option<&AccessToken>,
        id: &MovieId,
        fields: &MovieFields,
    ) -> Result<Movie, CatalogError> {
        let (url, key) = self.endpoint()?;

        let req = self
            .client
            .patch(self.table_url(url))
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(fields);
        let row = self
            .rows(self.authorize(req, key, token))
            .await?
            .into_iter()
            .next()
            .ok_or(CatalogError::NotFound)?;

        Movie::from_value(row)
    }

    async fn get_by_id(
        &self,
        token: Option<&AccessToken>,
        id: &MovieId,
    ) -> Result<Movie, CatalogError> {
        let (url, key) = self.endpoint()?;

        let req = self
            .client
            .get(self.table_url(url))
            .query(&[("select", "*".to_string()), ("id", format!("eq.{id}"))]);
        let row = self
            .rows(self.authorize(req, key, token))
            .await?
            .into_iter()
            .next()
            .ok_or(CatalogError::NotFound)?;

        Movie::from_value(row)
    }

    async fn put_object(
        &self,
        token: Option<&AccessToken>,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredObject, CatalogError> {
        let (url, api_key) = self.endpoint()?;

        let object_url = format!("{url}/storage/v1/object/{}/{}", self.bucket, encode_path(key));
        let req = self
            .client
            .post(object_url)
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes);

        self.send(self.authorize(req, api_key, token))
            .await?
            .json()
            .await
            .map_err(|e| CatalogError::Schema(e.to_string()))
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.public_base, encode_path(path.trim_start_matches('/')))
    }
}

fn encode_path(key: &str) -> String {
    key.split('/').map(|segment| urlencoding::encode(segment)).collect::<Vec<_>>().join("/")
}

/// Pulls a human-readable message out of an auth, PostgREST or storage error body.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|field| value.get(field).and_then(Value::as_str))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: i64,
    #[serde(default)]
    user: Option<TokenUser>,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    email: Option<String>,
}
