//! Inbound callback endpoint
//!
//! Framework-neutral: takes an `http::Request` with a buffered body and
//! answers with an `http::Response` carrying `{"message": ...}`.

use crate::processor::{NotificationOutcome, NotificationProcessor};
use bytes::Bytes;
use http::header::{ALLOW, CONTENT_TYPE, HeaderValue};
use http::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Route the provider posts callbacks to
pub const NOTIFY_PATH: &str = "/cardpay/notify";

/// Header carrying the callback signature
pub const SIGNATURE_HEADER: &str = "Signature";

/// Body of every endpoint response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub message: String,
}

/// HTTP face of the [`NotificationProcessor`]
#[derive(Debug, Clone)]
pub struct NotificationEndpoint {
    processor: Arc<NotificationProcessor>,
}

impl NotificationEndpoint {
    pub fn new(processor: Arc<NotificationProcessor>) -> Self {
        Self { processor }
    }

    /// Whether a request targets this endpoint
    pub fn matches(&self, request: &Request<Bytes>) -> bool {
        request.uri().path() == NOTIFY_PATH
    }

    /// Handle a callback request
    pub async fn handle(&self, request: Request<Bytes>) -> Response<Bytes> {
        if !self.matches(&request) {
            return respond(StatusCode::NOT_FOUND, "not found");
        }
        if *request.method() != Method::POST {
            let mut response = respond(StatusCode::METHOD_NOT_ALLOWED, "method not allowed");
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static("POST"));
            return response;
        }

        let signature = request
            .headers()
            .get(SIGNATURE_HEADER)
            .and_then(|value| value.to_str().ok());

        let outcome = self.processor.handle(request.body(), signature).await;
        respond(status_of(&outcome), &outcome.message())
    }
}

fn status_of(outcome: &NotificationOutcome) -> StatusCode {
    match outcome.http_status() {
        200 => StatusCode::OK,
        _ => StatusCode::BAD_REQUEST,
    }
}

fn respond(status: StatusCode, message: &str) -> Response<Bytes> {
    let body = WebhookResponse {
        message: message.to_string(),
    };
    // serializing a struct with one string field cannot fail
    let body = serde_json::to_vec(&body).unwrap_or_default();

    let mut response = Response::new(Bytes::from(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
