use serde::{Deserialize, Serialize};

/// Error body returned by the employee API. Servers differ on the message key, so the
/// common spellings are accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(alias = "error", alias = "detail")]
    pub message: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Extracts a readable message from a raw error body, falling back to the trimmed text.
    pub fn message_from_body(body: &str) -> String {
        match serde_json::from_str::<ApiError>(body) {
            Ok(parsed) => parsed.message,
            Err(_) => body.trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_from_body_accepts_known_keys_and_raw_text() {
        assert_eq!(
            ApiError::message_from_body(r#"{"code":"validation","message":"email taken"}"#),
            "email taken"
        );
        assert_eq!(
            ApiError::message_from_body(r#"{"detail":"Employee not found"}"#),
            "Employee not found"
        );
        assert_eq!(ApiError::message_from_body("  bad gateway \n"), "bad gateway");
    }
}
