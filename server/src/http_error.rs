use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use eyre;
use folio_core::{
    auth::AuthError,
    catalog::operation::ingest_image::IngestError,
    core::storage::StoreError,
    model::repository::{is_not_found, site_config::UnknownThemeError},
};
use serde_json::json;
use tracing::error;

/// Failures detected by the handlers themselves
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("not logged in")]
    Unauthorized,
    #[error("{0}")]
    BadRequest(String),
    #[error("not found")]
    NotFound,
}

#[derive(Debug)]
pub struct HttpError(eyre::Error);

fn find<T>(report: &eyre::Report) -> Option<&T>
where
    T: std::error::Error + Send + Sync + 'static,
{
    report.chain().find_map(|err| err.downcast_ref::<T>())
}

impl HttpError {
    pub fn status(&self) -> StatusCode {
        if let Some(err) = find::<RequestError>(&self.0) {
            return match err {
                RequestError::Unauthorized => StatusCode::UNAUTHORIZED,
                RequestError::BadRequest(_) => StatusCode::BAD_REQUEST,
                RequestError::NotFound => StatusCode::NOT_FOUND,
            };
        }
        if let Some(err) = find::<IngestError>(&self.0) {
            return match err {
                IngestError::Decode(_) | IngestError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                IngestError::NotFound(_) => StatusCode::NOT_FOUND,
                IngestError::Encode(_)
                | IngestError::StorageIo(_)
                | IngestError::Timeout(_)
                | IngestError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
        }
        if let Some(AuthError::InvalidCredentials) = find::<AuthError>(&self.0) {
            return StatusCode::UNAUTHORIZED;
        }
        if let Some(err) = find::<StoreError>(&self.0) {
            return match err {
                StoreError::NotFound(_) | StoreError::InvalidDigest(_) | StoreError::InvalidKey(_) => {
                    StatusCode::NOT_FOUND
                }
                StoreError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            };
        }
        if find::<UnknownThemeError>(&self.0).is_some() {
            return StatusCode::BAD_REQUEST;
        }
        if is_not_found(&self.0) {
            return StatusCode::NOT_FOUND;
        }
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!(err = ?self.0, "error handling request");
            "internal server error".to_owned()
        } else {
            self.0.to_string()
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

macro_rules! impl_from {
    ($from:ty) => {
        impl From<$from> for HttpError {
            fn from(err: $from) -> Self {
                Self(err.into())
            }
        }
    };
}

impl_from!(std::io::Error);
impl_from!(color_eyre::Report);
impl_from!(tokio::task::JoinError);
impl_from!(RequestError);
impl_from!(IngestError);
impl_from!(AuthError);
impl_from!(StoreError);

impl From<MultipartError> for HttpError {
    fn from(err: MultipartError) -> Self {
        RequestError::BadRequest(err.body_text()).into()
    }
}

pub type ApiResult<T> = Result<T, HttpError>;

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
