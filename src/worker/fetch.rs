//! Request classification and fetch policies.
//!
//! Classification is a pure function of the request line, the `Accept`
//! header, and the persisted intercept configuration. The caller (the HTTP
//! gateway) executes the resulting policy against the cache manager and the
//! upstream network.

use serde::Deserialize;

/// Persisted intercept configuration.
///
/// Sourced from the server configuration file rather than process-global
/// worker state, so classification survives worker restarts unchanged.
#[derive(Debug, Clone, Deserialize)]
pub struct InterceptConfig {
    /// Path receiving OS share-target submissions.
    #[serde(default = "default_share_path")]
    pub share_path: String,
    /// In-app queue-review page that share submissions redirect to.
    #[serde(default = "default_review_path")]
    pub review_path: String,
    /// Path prefix of the dynamic remote API namespace.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    /// Fixed offline fallback page, part of the application shell.
    #[serde(default = "default_offline_url")]
    pub offline_url: String,
}

fn default_share_path() -> String {
    "/share".to_string()
}

fn default_review_path() -> String {
    "/static/share.html".to_string()
}

fn default_api_prefix() -> String {
    "/api/".to_string()
}

fn default_offline_url() -> String {
    "/static/offline.html".to_string()
}

impl Default for InterceptConfig {
    fn default() -> Self {
        Self {
            share_path: default_share_path(),
            review_path: default_review_path(),
            api_prefix: default_api_prefix(),
            offline_url: default_offline_url(),
        }
    }
}

/// What kind of request the worker is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchClass {
    /// Share-target submission; intercepted, never reaches the network.
    Share,
    /// Dynamic API request; forwarded unconditionally, never cached.
    Api,
    /// HTML page load.
    Navigation,
    /// Everything else: a static asset.
    Asset,
}

/// How a classified request is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPolicy {
    /// Handle locally; the request must never fall through to the network.
    Intercept,
    /// Try the network, cache successes, fall back to cache then the
    /// offline page.
    NetworkFirst,
    /// Network only; a structured offline error on failure, never cached
    /// content.
    NetworkOnly,
    /// Serve from cache when present, otherwise fetch and fill the cache.
    CacheFirst,
}

impl FetchClass {
    /// The serving policy for this class of request.
    ///
    /// Navigations are network-first so a connected user always sees fresh
    /// content; assets are cache-first since they only change with the
    /// worker revision; API calls bypass caching because they are
    /// non-idempotent and time-sensitive.
    pub fn policy(self) -> FetchPolicy {
        match self {
            FetchClass::Share => FetchPolicy::Intercept,
            FetchClass::Api => FetchPolicy::NetworkOnly,
            FetchClass::Navigation => FetchPolicy::NetworkFirst,
            FetchClass::Asset => FetchPolicy::CacheFirst,
        }
    }
}

/// Classify one request.
///
/// The API prefix is checked before navigation detection so an API response
/// can never be served from cache, whatever its `Accept` header says.
pub fn classify(
    method: &str,
    path: &str,
    accept: Option<&str>,
    config: &InterceptConfig,
) -> FetchClass {
    if method.eq_ignore_ascii_case("POST") && path == config.share_path {
        return FetchClass::Share;
    }
    if path.starts_with(&config.api_prefix) {
        return FetchClass::Api;
    }
    let wants_html = accept.is_some_and(|a| a.contains("text/html"));
    if method.eq_ignore_ascii_case("GET") && wants_html {
        return FetchClass::Navigation;
    }
    FetchClass::Asset
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> InterceptConfig {
        InterceptConfig::default()
    }

    #[test]
    fn share_post_is_intercepted() {
        let class = classify("POST", "/share", None, &config());
        assert_eq!(class, FetchClass::Share);
        assert_eq!(class.policy(), FetchPolicy::Intercept);
    }

    #[test]
    fn share_path_get_is_not_a_share() {
        // Loading the review page is a navigation, not a submission.
        let class = classify("GET", "/share", Some("text/html"), &config());
        assert_eq!(class, FetchClass::Navigation);
    }

    #[test]
    fn api_requests_are_network_only_even_for_html_accept() {
        let class = classify("GET", "/api/browse", Some("text/html,*/*"), &config());
        assert_eq!(class, FetchClass::Api);
        assert_eq!(class.policy(), FetchPolicy::NetworkOnly);
    }

    #[test]
    fn navigation_is_network_first() {
        let class = classify("GET", "/b/photos", Some("text/html,application/xhtml+xml"), &config());
        assert_eq!(class, FetchClass::Navigation);
        assert_eq!(class.policy(), FetchPolicy::NetworkFirst);
    }

    #[test]
    fn assets_are_cache_first() {
        let class = classify("GET", "/static/css/style.css", Some("text/css,*/*;q=0.1"), &config());
        assert_eq!(class, FetchClass::Asset);
        assert_eq!(class.policy(), FetchPolicy::CacheFirst);
    }

    #[test]
    fn custom_share_path_is_honored() {
        let config = InterceptConfig {
            share_path: "/static/share.html".to_string(),
            ..InterceptConfig::default()
        };
        assert_eq!(
            classify("POST", "/static/share.html", None, &config),
            FetchClass::Share
        );
    }
}
