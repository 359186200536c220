//! Wire format for requests crossing the HTTP/bus boundary.

use axum::http::request::Parts;
use serde::{Deserialize, Serialize};

/// JSON envelope published as the request payload.
///
/// Routing happens on the subject alone; the envelope gives the backend the
/// full request line so it can reconstruct what the caller sent. `path`
/// keeps the raw path and query exactly as received, and `headers`
/// preserves arrival order and duplicate names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusEnvelope {
    /// Uppercase HTTP method name.
    pub method: String,

    /// Raw path plus query string, e.g. `/widgets/42?verbose=1`.
    pub path: String,

    /// Header pairs in arrival order. Values that are not UTF-8 are
    /// replaced lossily; body bytes are the lossless channel.
    pub headers: Vec<(String, String)>,

    /// Request body, carried as base64 inside the JSON text.
    #[serde(with = "body_encoding")]
    pub body: Vec<u8>,
}

impl BusEnvelope {
    /// Build the envelope for one received request.
    pub fn from_parts(parts: &Parts, body: &[u8]) -> Self {
        let path = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());

        let headers = parts
            .headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        Self {
            method: parts.method.as_str().to_string(),
            path,
            headers,
            body: body.to_vec(),
        }
    }

    /// Append a header the gateway injects on behalf of the caller.
    pub fn push_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }
}

mod body_encoding {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text).map_err(serde::de::Error::custom)
    }
}
