use tracing::{debug, error};

use crate::{
    catalog::CatalogService,
    models::{AccessToken, LocalFile},
};

const KEY_PREFIX: &str = "movies";

/// Object key for a poster: `movies/{unix_millis}-{name}` with spaces turned into hyphens.
pub fn storage_key(timestamp_ms: i64, file_name: &str) -> String {
    format!("{KEY_PREFIX}/{timestamp_ms}-{}", file_name.replace(' ', "-"))
}

/// Stores the poster and returns its public URL. Failures are logged and
/// reported as `None`; the caller decides what an absent poster means.
pub async fn upload_poster(
    catalog: &dyn CatalogService,
    token: Option<&AccessToken>,
    file: &LocalFile,
) -> Option<String> {
    let key = storage_key(jiff::Timestamp::now().as_millisecond(), &file.name);
    debug!(key = %key, bytes = file.bytes.len(), "uploading poster");

    match catalog.put_object(token, &key, &file.content_type, file.bytes.clone()).await {
        Ok(stored) => {
            let url = catalog.public_url(&stored.path);
            debug!(key = %key, url = %url, "poster uploaded");
            Some(url)
        },
        Err(err) => {
            error!(key = %key, error = %err, "error uploading poster");
            None
        },
    }
}
