use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;

use crate::catalog::CatalogLoader;
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::middleware::client_ip;
use crate::rate_limiter::RateLimiter;
use crate::response::{rate_limit_headers, ErrorBody, HealthResponse, SearchResponse};
use crate::search::{FuzzyMatcher, DEFAULT_LIMIT, MIN_QUERY_LEN};

/// Shared application state: the three core components, wired once at
/// startup and cloned by handle.
pub struct AppState {
    pub catalog: CatalogLoader,
    pub matcher: FuzzyMatcher,
    pub limiter: RateLimiter,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn from_config(config: &Config) -> SharedState {
        Arc::new(Self {
            catalog: CatalogLoader::new(&config.catalog_path),
            matcher: FuzzyMatcher::new(),
            limiter: RateLimiter::new(config.rate_limit.clone()),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    name: Option<String>,
}

/// GET /api/search?name=<query>
///
/// Admission runs first: a denied client never reaches the matcher. Admitted
/// requests are validated, then answered from the cached catalog, with quota
/// headers on every outcome.
pub async fn search_candidates(
    State(state): State<SharedState>,
    Query(params): Query<SearchParams>,
    headers: HeaderMap,
) -> Result<Response> {
    let client = client_ip(&headers);
    let admission = state.limiter.admit(&client);

    if !admission.admitted {
        tracing::warn!(
            client = %client,
            reset_at = admission.reset_at,
            "search request rejected by rate limit"
        );
        return Err(ApiError::RateLimitExceeded(admission));
    }

    let query = params.name.as_deref().unwrap_or("");
    if query.trim().chars().count() < MIN_QUERY_LEN {
        // Quota was spent on this request; tell the client where it stands.
        let mut response = ApiError::QueryTooShort.into_response();
        response.headers_mut().extend(rate_limit_headers(&admission));
        return Ok(response);
    }

    let catalog = state.catalog.load().await?;
    let results = state.matcher.search(query, &catalog, DEFAULT_LIMIT);

    tracing::debug!(
        client = %client,
        query = %query.trim(),
        matches = results.len(),
        remaining = admission.remaining,
        "search completed"
    );

    let mut response = Json(SearchResponse { results }).into_response();
    response.headers_mut().extend(rate_limit_headers(&admission));
    Ok(response)
}

/// GET /health — liveness plus a snapshot of the subsystem's state.
pub async fn health_check(State(state): State<SharedState>) -> impl IntoResponse {
    Json(HealthResponse::healthy(
        state.catalog.is_loaded(),
        state.limiter.tracked_clients(),
        state.limiter.settings().clone(),
    ))
}

/// GET /ready — readiness is catalog availability: the subsystem is
/// meaningless without it.
pub async fn readiness_check(State(state): State<SharedState>) -> Response {
    match state.catalog.load().await {
        Ok(catalog) => Json(serde_json::json!({
            "status": "ready",
            "catalog_entries": catalog.len(),
        }))
        .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorBody::new("Catalog failed to load")),
            )
                .into_response()
        }
    }
}
