//! Request gating
//!
//! Applied outermost first:
//! 1. `capture_request` logs the incoming request (never rejects)
//! 2. `check_api_version` requires a supported `X-Broker-Api-Version`
//! 3. `authenticate` requires the broker's Basic-Auth credentials
//!
//! Requests failing a gate never reach routing.

use axum::{
    body::{to_bytes, Body, Bytes, HttpBody},
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use futures::stream;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{debug, warn, Level};

use broker_core::{ApiVersion, BrokerError};

use super::error::ApiError;
use super::handlers::AppState;

/// Header carrying the platform's API version
pub const API_VERSION_HEADER: &str = "x-broker-api-version";

/// Log target of request captures
pub const REQUEST_TARGET: &str = "broker::requests";

/// Bodies larger than this are not captured
const MAX_CAPTURED_BODY: u64 = 64 * 1024;

/// Log method, URI, headers and body of each request
///
/// Only active when the `broker::requests` target is enabled at debug level.
/// Never rejects: a body that cannot be read is handed on as a failing body,
/// so the handler reports the error.
pub async fn capture_request(req: Request, next: Next) -> Response {
    if !tracing::enabled!(target: REQUEST_TARGET, Level::DEBUG) {
        return next.run(req).await;
    }

    let (parts, body) = req.into_parts();
    let headers = describe_headers(&parts.headers);

    let capturable = body
        .size_hint()
        .upper()
        .is_some_and(|len| len <= MAX_CAPTURED_BODY);

    let body = if capturable {
        match to_bytes(body, MAX_CAPTURED_BODY as usize).await {
            Ok(bytes) => {
                debug!(
                    target: REQUEST_TARGET,
                    method = %parts.method,
                    uri = %parts.uri,
                    headers = %headers,
                    body = %String::from_utf8_lossy(&bytes),
                    "Incoming request"
                );
                Body::from(bytes)
            }
            Err(e) => {
                warn!(
                    target: REQUEST_TARGET,
                    method = %parts.method,
                    uri = %parts.uri,
                    error = %e,
                    "Cannot capture request body"
                );
                Body::from_stream(stream::once(async move { Err::<Bytes, _>(e) }))
            }
        }
    } else {
        debug!(
            target: REQUEST_TARGET,
            method = %parts.method,
            uri = %parts.uri,
            headers = %headers,
            "Incoming request (body not captured)"
        );
        body
    };

    next.run(Request::from_parts(parts, body)).await
}

/// Reject requests without a supported API version
pub async fn check_api_version(req: Request, next: Next) -> Result<Response, ApiError> {
    let version = extract_version(req.headers()).inspect_err(|e| {
        warn!(uri = %req.uri(), error = %e, "Rejected request without a valid API version");
    })?;
    version.ensure_supported().inspect_err(|e| {
        warn!(uri = %req.uri(), error = %e, "Rejected request for an unsupported API version");
    })?;

    Ok(next.run(req).await)
}

/// Reject requests without the broker's credentials
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (username, password) = extract_credentials(req.headers()).inspect_err(|e| {
        warn!(uri = %req.uri(), error = %e, "Rejected unauthenticated request");
    })?;

    let user_matches = credential_eq(&username, &state.auth.username);
    let password_matches = credential_eq(&password, &state.auth.password);
    if !(user_matches & password_matches) {
        warn!(uri = %req.uri(), username = %username, "Rejected request with wrong credentials");
        return Err(BrokerError::Unauthorized("Invalid credentials".into()).into());
    }

    Ok(next.run(req).await)
}

fn credential_eq(provided: &str, expected: &str) -> bool {
    provided.len() == expected.len() && provided.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Exactly one value of a header
fn single_header<'a>(headers: &'a HeaderMap, name: &str) -> Option<std::result::Result<&'a HeaderValue, usize>> {
    let values: Vec<&HeaderValue> = headers.get_all(name).iter().collect();
    match values.len() {
        0 => None,
        1 => Some(Ok(values[0])),
        n => Some(Err(n)),
    }
}

/// Parse the `X-Broker-Api-Version` header
pub fn extract_version(headers: &HeaderMap) -> Result<ApiVersion, BrokerError> {
    let value = match single_header(headers, API_VERSION_HEADER) {
        None => {
            return Err(BrokerError::Decode(
                "Missing X-Broker-Api-Version header".into(),
            ))
        }
        Some(Err(count)) => {
            return Err(BrokerError::Decode(format!(
                "Expected one X-Broker-Api-Version header, got {}",
                count
            )))
        }
        Some(Ok(value)) => value,
    };

    value
        .to_str()
        .map_err(|_| BrokerError::Decode("X-Broker-Api-Version is not valid text".into()))?
        .trim()
        .parse()
}

/// Decode `Authorization: Basic <base64(user:pass)>`
pub fn extract_credentials(headers: &HeaderMap) -> Result<(String, String), BrokerError> {
    let unauthenticated = |msg: &str| BrokerError::Unauthenticated(msg.to_string());

    let value = match single_header(headers, header::AUTHORIZATION.as_str()) {
        None => return Err(unauthenticated("Missing Authorization header")),
        Some(Err(_)) => return Err(unauthenticated("Multiple Authorization headers")),
        Some(Ok(value)) => value,
    };

    let value = value
        .to_str()
        .map_err(|_| unauthenticated("Authorization header is not valid text"))?;
    let (scheme, encoded) = value
        .trim()
        .split_once(' ')
        .ok_or_else(|| unauthenticated("Malformed Authorization header"))?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return Err(unauthenticated("Unsupported authentication scheme"));
    }

    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|_| unauthenticated("Invalid base64 in Authorization header"))?;
    let decoded =
        String::from_utf8(decoded).map_err(|_| unauthenticated("Credentials are not valid UTF-8"))?;

    let parts: Vec<&str> = decoded.split(':').collect();
    match parts.as_slice() {
        [username, password] => Ok((username.to_string(), password.to_string())),
        _ => Err(unauthenticated("Malformed credentials")),
    }
}

/// Header list with the credentials blanked out
fn describe_headers(headers: &HeaderMap) -> String {
    headers
        .iter()
        .map(|(name, value)| {
            if name == header::AUTHORIZATION {
                format!("{}: <redacted>", name)
            } else {
                format!("{}: {}", name, value.to_str().unwrap_or("<binary>"))
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
