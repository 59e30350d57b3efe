//! Wire types for the backend's JSON API.

use serde::{Deserialize, Serialize};

use crate::settings::clamp_k;

/// Body of `POST /api/chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub question: String,
    /// How many candidate books the backend retrieves before answering
    pub k: u8,
    /// Ask the backend to rebuild its vector store first. Always false from this client.
    pub rebuild: bool,
}

impl ChatRequest {
    /// Build a request for `question`, with `k` clamped into the accepted range.
    pub fn new(question: impl Into<String>, k: u8) -> Self {
        Self {
            question: question.into(),
            k: clamp_k(i64::from(k)),
            rebuild: false,
        }
    }
}

/// Successful reply from `POST /api/chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
}

/// Reply from `GET /api/health`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_chat_request_wire_shape() {
        let request = ChatRequest::new("Ce este 1984?", 3);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "question": "Ce este 1984?",
                "k": 3,
                "rebuild": false
            })
        );
    }

    #[test]
    fn test_chat_request_clamps_k() {
        assert_eq!(ChatRequest::new("q", 0).k, 1);
        assert_eq!(ChatRequest::new("q", 42).k, 8);
        assert_eq!(ChatRequest::new("q", 5).k, 5);
    }

    #[test]
    fn test_health_response_requires_ok_field() {
        assert!(serde_json::from_str::<HealthResponse>(r#"{"ok":true}"#).unwrap().ok);
        assert!(serde_json::from_str::<HealthResponse>(r#"{"status":"up"}"#).is_err());
    }
}
