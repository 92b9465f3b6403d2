use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use folio_core::{
    catalog::storage_key::OBJECTS_DIR,
    model::Digest,
    processing::image::sniff_format,
};

use crate::{
    app_state::SharedState,
    http_error::{ApiResult, RequestError},
    mime_type::guess_mime_type_key,
};

/// Stored files never change under their key
const CACHE_CONTROL: &str = "public, max-age=31536000, immutable";
const OCTET_STREAM: &str = "application/octet-stream";

pub fn router() -> Router<SharedState> {
    Router::new().route("/uploads/*key", get(get_upload))
}

/// `original/<digest>` serves an original with a content type sniffed from
/// its bytes, any other key is a derived file read straight from the store.
#[tracing::instrument(skip(app_state))]
pub async fn get_upload(
    State(app_state): State<SharedState>,
    Path(key): Path<String>,
) -> ApiResult<Response> {
    let store = app_state.ingester.store().clone();
    // a variant may itself be called "original", its keys carry an extension
    let original: Option<Digest> = key
        .strip_prefix("original/")
        .and_then(|digest| digest.parse().ok());
    if let Some(digest) = original {
        let bytes = tokio::task::spawn_blocking(move || store.get(&digest)).await??;
        let content_type = sniff_format(&bytes)
            .map(|format| format.mime_type())
            .unwrap_or(OCTET_STREAM);
        return Ok(file_response(content_type, bytes));
    }
    // originals are only reachable by digest
    if key.split('/').next() == Some(OBJECTS_DIR) {
        return Err(RequestError::NotFound.into());
    }
    let content_type = guess_mime_type_key(&key).unwrap_or(OCTET_STREAM);
    let bytes = tokio::task::spawn_blocking(move || store.read_key(&key)).await??;
    Ok(file_response(content_type, bytes))
}

fn file_response(content_type: &'static str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, CACHE_CONTROL),
        ],
        bytes,
    )
        .into_response()
}
