//! Request correlation
//!
//! Every inbound request gets a `RequestId` so that statement logs, op
//! boundary events and error responses can be tied back together.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Header used to propagate a caller-supplied request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Unique identifier for a single request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a new time-ordered RequestId (UUIDv7)
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Reuse a caller-supplied id when it is usable, otherwise mint a new one.
    ///
    /// Ids longer than 128 bytes or containing anything but ASCII
    /// alphanumerics, `-` and `_` are discarded.
    pub fn from_header(value: Option<&str>) -> Self {
        match value {
            Some(v)
                if !v.is_empty()
                    && v.len() <= 128
                    && v.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') =>
            {
                Self(v.to_string())
            }
            _ => Self::new(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_generation() {
        let id1 = RequestId::new();
        let id2 = RequestId::new();

        assert_ne!(id1, id2);
        assert!(!id1.as_str().is_empty());
    }

    #[test]
    fn test_from_header_keeps_well_formed_id() {
        let id = RequestId::from_header(Some("req-42_a"));
        assert_eq!(id.as_str(), "req-42_a");
    }

    #[test]
    fn test_from_header_replaces_suspicious_id() {
        let id = RequestId::from_header(Some("bad id\n"));
        assert_ne!(id.as_str(), "bad id\n");

        let missing = RequestId::from_header(None);
        assert!(!missing.as_str().is_empty());

        let long = "a".repeat(200);
        assert_ne!(RequestId::from_header(Some(&long)).as_str(), long);
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = RequestId::from_header(Some("abc"));
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"abc\"");
        let back: RequestId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
