use std::net::SocketAddr;

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub catalog_url: Option<String>,
    pub catalog_key: Option<String>,
    pub catalog_table: String,
    pub catalog_bucket: String,
    pub catalog_public_base: Option<String>,
    pub catalog_rps: u32,
    pub request_timeout_secs: u64,
    pub max_upload_bytes: usize,
    pub secure_cookies: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = var("PORT").unwrap_or_else(|| "3000".to_string()).parse().context("PORT")?;

        let catalog_url = var("SUPABASE_URL").map(|u| u.trim_end_matches('/').to_string());
        let catalog_key = var("SUPABASE_KEY");

        let catalog_table = var("CATALOG_TABLE").unwrap_or_else(|| "movies".to_string());
        let catalog_bucket = var("CATALOG_BUCKET").unwrap_or_else(|| "movies".to_string());
        let catalog_public_base =
            var("CATALOG_PUBLIC_BASE").map(|u| u.trim_end_matches('/').to_string());

        let catalog_rps: u32 = parse_or(&var, "CATALOG_RPS", 10)?;
        let request_timeout_secs: u64 = parse_or(&var, "REQUEST_TIMEOUT_SECS", 30)?;
        let max_upload_bytes: usize = parse_or(&var, "MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?;
        let secure_cookies: bool = parse_or(&var, "SECURE_COOKIES", false)?;

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            catalog_url,
            catalog_key,
            catalog_table,
            catalog_bucket,
            catalog_public_base,
            catalog_rps,
            request_timeout_secs,
            max_upload_bytes,
            secure_cookies,
        })
    }

    /// Base that stored object paths are appended to.
    pub fn public_object_base(&self) -> Option<String> {
        self.catalog_public_base
            .clone()
            .or_else(|| self.catalog_url.as_ref().map(|u| format!("{u}/storage/v1/object/public")))
    }
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(key) {
        Some(raw) => raw.parse().with_context(|| format!("{key}={raw}")),
        None => Ok(default),
    }
}
