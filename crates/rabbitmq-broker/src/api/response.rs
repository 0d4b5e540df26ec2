//! Response shaping
//!
//! Every response body is JSON and carries an explicit charset.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

/// Content type of every broker response
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Body of acknowledgements and of conflict/gone errors: `{}`
#[derive(Debug, Serialize)]
pub struct EmptyResponse {}

/// A status code and a JSON body
#[derive(Debug)]
pub struct BrokerResponse<T> {
    pub status: StatusCode,
    pub body: T,
}

impl<T: Serialize> BrokerResponse<T> {
    pub fn new(status: StatusCode, body: T) -> Self {
        Self { status, body }
    }

    /// 200 OK
    pub fn ok(body: T) -> Self {
        Self::new(StatusCode::OK, body)
    }

    /// 201 Created
    pub fn created(body: T) -> Self {
        Self::new(StatusCode::CREATED, body)
    }
}

impl<T: Serialize> IntoResponse for BrokerResponse<T> {
    fn into_response(self) -> Response {
        let content_type = [(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))];
        match serde_json::to_vec(&self.body) {
            Ok(bytes) => (self.status, content_type, bytes).into_response(),
            Err(e) => {
                error!(error = %e, "Cannot encode response body");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    content_type,
                    r#"{"description":"Cannot encode response body"}"#,
                )
                    .into_response()
            }
        }
    }
}
