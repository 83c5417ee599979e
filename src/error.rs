use axum::Json;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// ApiError
///
/// The application's user-visible error taxonomy. Every refusal produced by the
/// dispatcher or a domain handler becomes one of these variants, which render as a
/// JSON `{"error": "<message>"}` body with the matching status code. Collaborator
/// failures are translated at the call site; nothing in this module ever panics and
/// no internal detail beyond the carried message reaches the client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Unknown route or missing resource (404).
    #[error("{0}")]
    NotFound(String),

    /// Method outside the matched route's allowed set (405).
    #[error("405 Method Not Allowed")]
    MethodNotAllowed,

    /// Client does not accept JSON responses (406).
    #[error("406 Not Acceptable")]
    NotAcceptable,

    /// Malformed or incomplete request body, bad content type, or a refused
    /// self-action (400).
    #[error("{0}")]
    BadRequest(String),

    /// Missing or invalid credentials (401). The response carries a Basic challenge.
    #[error("401 Unauthorized")]
    Unauthenticated,

    /// Authenticated but the role does not permit the action (403).
    #[error("403 Forbidden")]
    Forbidden,

    /// A collaborator (store, body transport) failed; the message passes through
    /// as a 400-class response rather than terminating the process.
    #[error("{0}")]
    Store(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Store(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Shorthand for the generic unknown-route/unknown-resource refusal.
    pub fn not_found() -> Self {
        ApiError::NotFound("404 Not Found".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        let mut response = (status, body).into_response();

        // Unauthenticated responses must challenge the client for Basic credentials.
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                header::HeaderValue::from_static("Basic"),
            );
        }

        response
    }
}
