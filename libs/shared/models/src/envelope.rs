use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `{ success, message, data, timestamp }` wrapper used by the backend and by
/// every dashboard response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self::with_message(data, "Operation completed successfully")
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            timestamp: Some(Utc::now()),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            timestamp: Some(Utc::now()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_backend_envelope() {
        let envelope: ApiResponse<Vec<u32>> = serde_json::from_value(json!({
            "success": true,
            "message": "ok",
            "data": [1, 2],
            "timestamp": "2024-06-01T09:00:00Z"
        }))
        .unwrap();

        assert!(envelope.success);
        assert_eq!(envelope.data, Some(vec![1, 2]));
    }

    #[test]
    fn tolerates_missing_message_and_null_data() {
        let envelope: ApiResponse<Vec<u32>> = serde_json::from_value(json!({
            "success": false,
            "data": null,
            "timestamp": null
        }))
        .unwrap();

        assert!(!envelope.success);
        assert!(envelope.message.is_empty());
        assert!(envelope.data.is_none());
    }
}
