//! API error types and responses

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use broker_core::BrokerError;

use super::response::{BrokerResponse, EmptyResponse};

/// Realm announced on authentication failures
const AUTH_CHALLENGE: &str = "Basic realm=\"RabbitMQ Service Broker\"";

/// API error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Method not allowed")]
    MethodNotAllowed,
}

/// API error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub description: String,
}

impl ApiError {
    /// Wire status of the error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Broker(err) => match err {
                BrokerError::Conflict(_) => StatusCode::CONFLICT,
                BrokerError::Gone(_) => StatusCode::GONE,
                BrokerError::Decode(_) | BrokerError::BadRequest(_) => StatusCode::BAD_REQUEST,
                BrokerError::Unauthenticated(_) | BrokerError::Unauthorized(_) => {
                    StatusCode::UNAUTHORIZED
                }
                BrokerError::UnsupportedVersion(_) => StatusCode::PRECONDITION_FAILED,
                BrokerError::Unexpected(_)
                | BrokerError::Generation(_)
                | BrokerError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let mut response = match status {
            StatusCode::CONFLICT | StatusCode::GONE => {
                BrokerResponse::new(status, EmptyResponse {}).into_response()
            }
            _ => BrokerResponse::new(
                status,
                ErrorResponse {
                    description: self.to_string(),
                },
            )
            .into_response(),
        };

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(AUTH_CHALLENGE),
            );
        }
        response
    }
}
