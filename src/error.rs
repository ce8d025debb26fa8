use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::error;

/// Failure of a proxied operation. Every variant renders as a JSON error body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing configuration: {0}")]
    ConfigurationMissing(&'static str),

    #[error("{service} answered {status}")]
    Upstream {
        service: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("could not reach {service}: {source}")]
    Network {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected response from {service}: {reason}")]
    InvalidResponse {
        service: &'static str,
        reason: String,
    },

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigurationMissing(_) => "configuration_missing",
            Self::Upstream { .. } => "upstream_error",
            Self::Network { .. } => "network_error",
            Self::InvalidResponse { .. } => "invalid_response",
            Self::BadRequest(_) => "bad_request",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::ConfigurationMissing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Upstream { status, .. } => *status,
            Self::Network { .. } | Self::InvalidResponse { .. } => StatusCode::BAD_GATEWAY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Upstream body, decoded as JSON when possible so the front-end can show it as-is.
    fn details(&self) -> Value {
        match self {
            Self::Upstream { body, .. } => {
                serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.clone()))
            }
            _ => Value::Null,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{}", self);
        }

        let body = json!({
            "error": self.kind(),
            "message": self.to_string(),
            "details": self.details(),
        });
        (status, Json(body)).into_response()
    }
}
