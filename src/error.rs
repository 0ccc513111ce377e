use axum::{http::StatusCode, Json};
use serde_json::{json, Value};

pub type BannerResult<T> = Result<T, BannerError>;

#[derive(Debug, thiserror::Error)]
pub enum BannerError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Non-database store failure (in-process store, unavailable backend).
    #[error("storage error: {0}")]
    Storage(String),

    #[error("notification #{0} not found")]
    NotFound(i64),

    #[error("{0}")]
    Validation(String),

    /// Rejected by the single-shown unique index: another activation won the race.
    #[error("another notification was activated concurrently")]
    Conflict,
}

impl BannerError {
    pub fn status(&self) -> StatusCode {
        match self {
            BannerError::NotFound(_) => StatusCode::NOT_FOUND,
            BannerError::Validation(_) => StatusCode::BAD_REQUEST,
            BannerError::Conflict => StatusCode::CONFLICT,
            BannerError::Database(_) | BannerError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<BannerError> for (StatusCode, Json<Value>) {
    fn from(e: BannerError) -> Self {
        if e.status().is_server_error() {
            tracing::error!("request failed: {e}");
        }
        (e.status(), Json(json!({ "error": e.to_string() })))
    }
}
