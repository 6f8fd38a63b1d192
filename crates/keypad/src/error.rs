//! Keypad controller error taxonomy, mirroring `cencon::error::CenconError`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeypadError {
    BadRequest(&'static str),
}

impl IntoResponse for KeypadError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(reason) => (StatusCode::BAD_REQUEST, reason).into_response(),
        }
    }
}
