//! Cached-response representation and generation naming.

use serde::{Deserialize, Serialize};

use super::error::CacheError;

/// Prefix shared by every generation name.
const GENERATION_PREFIX: &str = "filevault-cache-";

/// Build the generation name for a worker revision tag, e.g. `v2` ->
/// `filevault-cache-v2`. Changing the tag creates a new generation and
/// marks all others for deletion on the next activation.
pub fn generation_name(version_tag: &str) -> String {
    format!("{}{}", GENERATION_PREFIX, version_tag)
}

/// One captured HTTP response: status, headers, and full body.
///
/// Entries are keyed by exact request URL (always GET in this design); the
/// header list preserves order and duplicates as captured at fetch time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    #[serde(skip)]
    pub body: Vec<u8>,
}

impl CachedResponse {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Shorthand for a successful response with one content type header.
    pub fn ok(content_type: &str, body: Vec<u8>) -> Self {
        Self::new(
            200,
            vec![("content-type".to_string(), content_type.to_string())],
            body,
        )
    }

    /// Whether the captured status is in the 2xx range. Only successful
    /// responses are worth caching.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header value matching `name`, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Encode status and headers for storage; the body is stored under a
    /// side key.
    pub fn encode_meta(&self) -> Result<Vec<u8>, CacheError> {
        serde_json::to_vec(self).map_err(|e| CacheError::InvalidFormat(e.to_string()))
    }

    /// Decode status and headers and attach the separately stored body.
    pub fn decode(meta: &[u8], body: Vec<u8>) -> Result<Self, CacheError> {
        let mut response: Self =
            serde_json::from_slice(meta).map_err(|e| CacheError::InvalidFormat(e.to_string()))?;
        response.body = body;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_name_embeds_tag() {
        assert_eq!(generation_name("v2"), "filevault-cache-v2");
    }

    #[test]
    fn meta_roundtrip_reattaches_body() {
        let response = CachedResponse::ok("text/html", b"<html></html>".to_vec());
        let meta = response.encode_meta().unwrap();
        let decoded = CachedResponse::decode(&meta, b"<html></html>".to_vec()).unwrap();
        assert_eq!(decoded, response);
        assert_eq!(decoded.header("Content-Type"), Some("text/html"));
        assert!(decoded.is_success());
    }
}
