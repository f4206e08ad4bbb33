use actix_web::{web, HttpResponse};
use serde::Serialize;
use tracing::warn;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            fields: None,
        }
    }
}

/// Creates a configured QueryConfig with standardized error handling for the entire project
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let message = match &err {
            actix_web::error::QueryPayloadError::Deserialize(de_err) => de_err.to_string(),
            other => other.to_string(),
        };
        warn!("Rejected query string: {}", message);

        let error_response = ErrorResponse {
            error: "Invalid query parameters".to_string(),
            fields: Some(serde_json::json!({ "message": message })),
        };
        actix_web::error::InternalError::from_response(
            err,
            HttpResponse::BadRequest().json(error_response),
        )
        .into()
    })
}
