//! Snapshot Query Endpoints
//!
//! Every endpoint validates its path into an [`EndpointQuery`] and then goes
//! through the read-through cache. Responses are the cached JSON bytes as-is,
//! tagged `X-Cache: HIT` or `X-Cache: MISS`.

use axum::{
    extract::{Path, State},
    http::{header, HeaderName},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use axfr_core::DiffTld;
use axfr_storage::CacheRead;

use crate::error::{ApiError, ApiResult};
use crate::policy::EndpointQuery;
use crate::state::AppState;
use crate::telemetry::METRICS;

pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /se/:page, /nu/:page - dates with domain counts, newest first
pub async fn list_dates(state: AppState, tld: DiffTld, page: String) -> ApiResult<Response> {
    serve(&state, EndpointQuery::dates(tld, &page)?).await
}

/// GET /sedomains/:date/:page, /nudomains/:date/:page - domains of one date
pub async fn list_domains(
    state: AppState,
    tld: DiffTld,
    date: String,
    page: String,
) -> ApiResult<Response> {
    serve(&state, EndpointQuery::domains(tld, &date, &page)?).await
}

/// GET /search/:tld/:query - substring search, shortest domains first
pub async fn search(
    State(state): State<AppState>,
    Path((tld, query)): Path<(String, String)>,
) -> ApiResult<Response> {
    serve(&state, EndpointQuery::search(&tld, &query)?).await
}

/// GET /stats/:tld - domain count per date, oldest first
pub async fn stats(
    State(state): State<AppState>,
    Path(tld): Path<String>,
) -> ApiResult<Response> {
    serve(&state, EndpointQuery::stats(&tld)?).await
}

/// GET /seappearance/:query, /nuappearance/:query - earliest date seen
pub async fn first_appearance(state: AppState, tld: DiffTld, query: String) -> ApiResult<Response> {
    serve(&state, EndpointQuery::appearance(tld, &query)?).await
}

async fn serve(state: &AppState, query: EndpointQuery) -> ApiResult<Response> {
    let key = query.cache_key();
    let store = state.store.as_ref();

    let read = match state
        .cache
        .get_or_set(&key, query.ttl_tier().duration(), || query.generate(store))
        .await
    {
        Ok(read) => read,
        // Nothing was cached, so the failure is still a miss
        Err(e) => return Ok(miss_error_response(ApiError::from(e))),
    };

    if let Ok(metrics) = METRICS.as_ref() {
        metrics.record_cache_lookup(query.endpoint(), read.outcome().as_str());
    }

    Ok(payload_response(read))
}

fn miss_error_response(err: ApiError) -> Response {
    ([(X_CACHE, "MISS")], err).into_response()
}

fn payload_response(read: CacheRead) -> Response {
    let cache_status = if read.was_cache_hit() { "HIT" } else { "MISS" };
    (
        [
            (header::CONTENT_TYPE, "application/json"),
            (X_CACHE, cache_status),
        ],
        read.into_payload(),
    )
        .into_response()
}

// ============================================================================
// ROUTER
// ============================================================================

fn tld_routes(tld: DiffTld) -> Router<AppState> {
    let prefix = tld.as_str();
    Router::new()
        .route(
            &format!("/{prefix}/:page"),
            get(move |State(state): State<AppState>, Path(page): Path<String>| {
                list_dates(state, tld, page)
            }),
        )
        .route(
            &format!("/{prefix}domains/:date/:page"),
            get(
                move |State(state): State<AppState>,
                      Path((date, page)): Path<(String, String)>| {
                    list_domains(state, tld, date, page)
                },
            ),
        )
        .route(
            &format!("/{prefix}appearance/:query"),
            get(move |State(state): State<AppState>, Path(query): Path<String>| {
                first_appearance(state, tld, query)
            }),
        )
}

/// Create the snapshot router.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .merge(tld_routes(DiffTld::Se))
        .merge(tld_routes(DiffTld::Nu))
        .route("/search/:tld/:query", get(search))
        .route("/stats/:tld", get(stats))
}
