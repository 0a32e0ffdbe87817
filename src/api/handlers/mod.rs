pub mod health;
pub use self::health::health;

pub mod users;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::error;

use crate::account::AccountError;

/// Map a domain error onto its HTTP response.
///
/// Internal detail stays in the logs; the body is always the stable
/// `{"error": "<message>"}` shape with a message safe to show.
pub(crate) fn error_response(err: &AccountError) -> Response {
    let status = match err {
        AccountError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AccountError::Auth(_) => StatusCode::UNAUTHORIZED,
        AccountError::Conflict(_) => StatusCode::CONFLICT,
        AccountError::NotFound => StatusCode::NOT_FOUND,
        AccountError::Storage(source) => {
            error!("internal error: {source:#}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

// Service banner for the bare root path.
pub async fn root() -> impl IntoResponse {
    concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"))
}
