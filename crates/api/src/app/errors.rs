use http::StatusCode;
use serde_json::{Value, json};
use tracing::{error, warn};

use forgeml_core::DomainError;

/// Status plus JSON body of one handled request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// `{ "success": true, ..payload }`. Non-object payloads go under `data`.
pub fn json_ok(payload: Value) -> ApiResponse {
    let body = match payload {
        Value::Object(mut fields) => {
            fields.insert("success".to_string(), Value::Bool(true));
            Value::Object(fields)
        }
        other => json!({ "success": true, "data": other }),
    };
    ApiResponse {
        status: StatusCode::OK,
        body,
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> ApiResponse {
    ApiResponse {
        status,
        body: json!({
            "success": false,
            "error": code,
            "message": message.into(),
        }),
    }
}

pub fn domain_error_to_response(err: DomainError) -> ApiResponse {
    if err.is_client_error() {
        warn!(error = %err, "request rejected");
    } else {
        error!(error = %err, "request failed");
    }

    let message = err.to_string();
    match err {
        DomainError::Validation(_) => json_error(StatusCode::BAD_REQUEST, "validation_error", message),
        DomainError::MissingRequiredFeature(_) => {
            json_error(StatusCode::BAD_REQUEST, "missing_required_feature", message)
        }
        DomainError::UnknownEntity { .. } => json_error(StatusCode::NOT_FOUND, "unknown_entity", message),
        DomainError::Uninitialized => json_error(StatusCode::SERVICE_UNAVAILABLE, "uninitialized", message),
        DomainError::MissingArtifact(_) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "missing_artifact", message)
        }
        DomainError::ModelFitFailure(_) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "model_fit_failure", message)
        }
        DomainError::Storage(_) => json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", message),
        DomainError::Generation(_) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "generation_error", message)
        }
        DomainError::Training(_) => json_error(StatusCode::INTERNAL_SERVER_ERROR, "training_error", message),
    }
}
