//! Middleware for logging requests and responses.

use std::fmt::Debug;

use axum::{
    body::{Body, Bytes, HttpBody, to_bytes},
    extract::Request,
    http::{request, response},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::Error;

/// The number of bytes of a body that is logged at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// The largest body that is buffered for logging.
///
/// Larger bodies, and bodies of unknown length, are passed on without being read.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();

    let body = if is_loggable(&body) {
        let bytes = match read_body(body).await {
            Ok(bytes) => bytes,
            Err(error) => return error.into_response(),
        };
        log_request(&parts, &String::from_utf8_lossy(&bytes));
        Body::from(bytes)
    } else {
        log_unread("Received request", &parts, &body);
        body
    };

    let response = next.run(Request::from_parts(parts, body)).await;
    let (parts, body) = response.into_parts();

    if !is_loggable(&body) {
        log_unread("Sending response", &parts, &body);
        return Response::from_parts(parts, body);
    }

    match read_body(body).await {
        Ok(bytes) => {
            log_response(&parts, &String::from_utf8_lossy(&bytes));
            Response::from_parts(parts, Body::from(bytes))
        }
        Err(error) => error.into_response(),
    }
}

/// Whether `body` is known to fit in [MAX_BODY_BYTES].
fn is_loggable(body: &Body) -> bool {
    body.size_hint()
        .upper()
        .is_some_and(|length| length <= MAX_BODY_BYTES as u64)
}

async fn read_body(body: Body) -> Result<Bytes, Error> {
    to_bytes(body, MAX_BODY_BYTES).await.map_err(|error| {
        tracing::error!("could not read body for logging: {error}");
        Error::BodyTooLarge
    })
}

fn log_unread(message: &str, parts: &impl Debug, body: &Body) {
    tracing::info!(
        "{message}: {parts:#?}\nbody: <{} bytes, not logged>",
        body.size_hint().lower()
    );
}

/// The longest prefix of `body` that fits in [LOG_BODY_LENGTH_LIMIT] bytes
/// without splitting a character.
fn truncate(body: &str) -> &str {
    let mut end = LOG_BODY_LENGTH_LIMIT.min(body.len());

    while !body.is_char_boundary(end) {
        end -= 1;
    }

    &body[..end]
}

fn log_request(parts: &request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {parts:#?}\nbody: {:}...",
            truncate(body)
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!("Received request: {parts:#?}\nbody: {body:?}");
    }
}

fn log_response(parts: &response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {parts:#?}\nbody: {:}...",
            truncate(body)
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {parts:#?}\nbody: {body:?}");
    }
}
