//! Caching gateway for requests outside the explicit API surface.
//!
//! Every request that matches no explicit route lands here, gets classified,
//! and is served according to its fetch policy: navigations are
//! network-first with a cache and offline-page fallback, assets are
//! cache-first, and API calls are forwarded untouched.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::cache::CachedResponse;
use crate::worker::{classify, FetchPolicy};

use super::super::error::ApiError;
use super::super::state::AppState;

/// Headers that must not be copied between hops.
const HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "transfer-encoding",
    "content-length",
    "host",
];

pub async fn gateway(State(state): State<AppState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| parts.uri.path().to_string());
    let path = parts.uri.path().to_string();
    let accept = parts
        .headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok());

    let class = classify(parts.method.as_str(), &path, accept, &state.intercept);
    tracing::debug!(method = %parts.method, path = %path, class = ?class, "gateway request");

    let result = match class.policy() {
        // The explicit share route handles submissions; a request classified
        // here has no usable body to extract.
        FetchPolicy::Intercept => Err(ApiError::invalid_multipart(
            "share submissions must target the configured share path",
        )),
        FetchPolicy::NetworkOnly => forward(&state, parts, body, &path_and_query).await,
        FetchPolicy::NetworkFirst => network_first(&state, &path_and_query).await,
        FetchPolicy::CacheFirst => cache_first(&state, &path_and_query).await,
    };

    match result {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

/// Forward an API request to the upstream as-is, no caching in either
/// direction.
async fn forward(
    state: &AppState,
    parts: axum::http::request::Parts,
    body: Body,
    path_and_query: &str,
) -> Result<Response, ApiError> {
    let url = state
        .upstream_url(path_and_query)
        .ok_or_else(ApiError::no_upstream)?;

    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(|e| ApiError::internal(format!("failed to read request body: {}", e)))?;

    let mut headers = parts.headers.clone();
    for name in HOP_HEADERS {
        headers.remove(*name);
    }

    let upstream = state
        .client
        .request(parts.method, &url)
        .headers(headers)
        .body(bytes)
        .send()
        .await
        .map_err(|e| {
            tracing::warn!(url = %url, error = %e, "upstream unreachable");
            ApiError::offline(&url)
        })?;

    let status = upstream.status();
    let response_headers = upstream.headers().clone();
    let body = upstream
        .bytes()
        .await
        .map_err(|e| ApiError::internal(format!("failed to read upstream body: {}", e)))?;

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    for (name, value) in response_headers.iter() {
        if HOP_HEADERS.contains(&name.as_str()) {
            continue;
        }
        response.headers_mut().append(name.clone(), value.clone());
    }
    Ok(response)
}

/// Network-first: fresh content when connected, cached content when not,
/// the offline page as the last resort.
async fn network_first(state: &AppState, path_and_query: &str) -> Result<Response, ApiError> {
    match fetch_cacheable(state, path_and_query).await {
        Ok(fetched) => {
            if fetched.is_success() {
                if let Err(e) = state.cache.put_current(path_and_query, &fetched) {
                    tracing::warn!(url = path_and_query, error = %e, "failed to cache response");
                }
            }
            Ok(to_response(fetched))
        }
        Err(reason) => {
            tracing::debug!(url = path_and_query, reason = %reason, "network miss, trying cache");
            if let Some(cached) = state.cache.get_current(path_and_query)? {
                return Ok(to_response(cached));
            }
            if let Some(offline) = state.cache.get_current(&state.intercept.offline_url)? {
                let mut response = to_response(offline);
                *response.status_mut() = StatusCode::SERVICE_UNAVAILABLE;
                return Ok(response);
            }
            Err(ApiError::offline(path_and_query))
        }
    }
}

/// Cache-first: cached content when present, otherwise fetch once and fill
/// the cache.
async fn cache_first(state: &AppState, path_and_query: &str) -> Result<Response, ApiError> {
    if let Some(cached) = state.cache.get_current(path_and_query)? {
        return Ok(to_response(cached));
    }

    match fetch_cacheable(state, path_and_query).await {
        Ok(fetched) => {
            if fetched.is_success() {
                if let Err(e) = state.cache.put_current(path_and_query, &fetched) {
                    tracing::warn!(url = path_and_query, error = %e, "failed to cache response");
                }
            }
            Ok(to_response(fetched))
        }
        Err(reason) => {
            tracing::debug!(url = path_and_query, reason = %reason, "asset unavailable");
            Err(ApiError::offline(path_and_query))
        }
    }
}

/// GET one URL from the upstream and capture it as a [`CachedResponse`].
///
/// A missing upstream counts as a network failure so the caller's cache
/// fallback still applies.
async fn fetch_cacheable(state: &AppState, path_and_query: &str) -> Result<CachedResponse, String> {
    let url = state
        .upstream_url(path_and_query)
        .ok_or_else(|| "no upstream configured".to_string())?;

    let response = state
        .client
        .get(&url)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let status = response.status().as_u16();
    let headers: Vec<(String, String)> = response
        .headers()
        .iter()
        .filter(|(name, _)| !HOP_HEADERS.contains(&name.as_str()))
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    let body = response.bytes().await.map_err(|e| e.to_string())?.to_vec();

    Ok(CachedResponse::new(status, headers, body))
}

/// Turn a captured response back into an HTTP response, skipping any header
/// that no longer parses.
fn to_response(cached: CachedResponse) -> Response {
    let mut response = Response::new(Body::from(cached.body));
    *response.status_mut() =
        StatusCode::from_u16(cached.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    for (name, value) in &cached.headers {
        let Ok(name) = HeaderName::from_bytes(name.as_bytes()) else {
            continue;
        };
        let Ok(value) = HeaderValue::from_str(value) else {
            continue;
        };
        response.headers_mut().append(name, value);
    }
    response
}
