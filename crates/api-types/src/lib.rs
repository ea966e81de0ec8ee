//! Shared request/response types used by API-facing crates.

use serde::{Deserialize, Serialize};

/// Envelope codes carried in [`ApiResponse::code`].
pub mod codes {
    pub const SUCCESS: i32 = 0;
    pub const PARAM_MISSING: i32 = 1001;
    pub const METHOD_NOT_ALLOWED: i32 = 1002;
    pub const PATH_NOT_EXIST: i32 = 1003;
    pub const OPERATION_FAILED: i32 = 1004;
}

/// Uniform response envelope: `code == 0` means success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    #[must_use]
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            code: codes::SUCCESS,
            message: message.into(),
            data: Some(data),
        }
    }

    #[must_use]
    pub fn failure(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == codes::SUCCESS
    }
}

impl ApiResponse<()> {
    /// Success without a payload; `data` serializes as `null`.
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            code: codes::SUCCESS,
            message: message.into(),
            data: None,
        }
    }
}

/// Body of `POST /document`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDocumentRequest {
    pub path: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDocumentResponse {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    pub status: String,
}

impl HealthCheckResponse {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_check_ok_payload() {
        let response = HealthCheckResponse::ok();
        assert_eq!(response.status, "ok");
    }

    #[test]
    fn failure_envelope_has_null_data() {
        let response = ApiResponse::<()>::failure(codes::PARAM_MISSING, "Missing path parameter");

        let json = serde_json::to_value(&response).expect("serialize envelope");
        assert_eq!(
            json,
            serde_json::json!({
                "code": 1001,
                "message": "Missing path parameter",
                "data": null
            })
        );
        assert!(!response.is_success());
    }

    #[test]
    fn success_envelope_carries_data() {
        let response = ApiResponse::success("success", vec!["a", "b"]);

        let json = serde_json::to_value(&response).expect("serialize envelope");
        assert_eq!(json["code"], 0);
        assert_eq!(json["data"], serde_json::json!(["a", "b"]));
        assert!(response.is_success());
    }

    #[test]
    fn create_document_request_uses_type_key() {
        let request: CreateDocumentRequest =
            serde_json::from_str(r#"{"path":"/srv/notes","type":"md"}"#)
                .expect("deserialize request");

        assert_eq!(request.path, "/srv/notes");
        assert_eq!(request.doc_type, "md");
        assert!(request.content.is_empty());
    }
}
