use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::path::PathBuf;
use thiserror::Error;

use crate::rate_limiter::Admission;
use crate::response::{rate_limit_headers, retry_after_secs, ErrorBody};
use crate::search::MIN_QUERY_LEN;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("query must be at least {} characters", MIN_QUERY_LEN)]
    QueryTooShort,

    #[error("rate limit exceeded, window resets at {}", .0.reset_at)]
    RateLimitExceeded(Admission),

    #[error("failed to read catalog at {path}")]
    CatalogRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog at {path}")]
    CatalogParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::QueryTooShort => (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody::new(format!(
                    "Query must be at least {MIN_QUERY_LEN} characters"
                ))),
            )
                .into_response(),

            ApiError::RateLimitExceeded(admission) => {
                let mut response = (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(ErrorBody::new("Too many requests. Please try again later.")),
                )
                    .into_response();
                response.headers_mut().extend(rate_limit_headers(&admission));
                response
                    .headers_mut()
                    .insert("Retry-After", retry_after_secs(&admission).into());
                response
            }

            err @ (ApiError::CatalogRead { .. } | ApiError::CatalogParse { .. }) => {
                // The operator gets the detail; the client gets a generic 500.
                tracing::error!(error = %err, "catalog unavailable");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody::new("Internal server error")),
                )
                    .into_response()
            }

            err @ ApiError::Configuration(_) => {
                tracing::error!(error = %err, "configuration error surfaced on request path");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody::new("Internal server error")),
                )
                    .into_response()
            }
        }
    }
}
