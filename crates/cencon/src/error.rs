//! Central controller error taxonomy, mirroring the teacher's `MuxError`
//! machine-readable-code + human-message envelope, adapted to the plain
//! `text/plain` error bodies §4.6 specifies for this surface.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CenconError {
    BadRequest(&'static str),
}

impl IntoResponse for CenconError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(reason) => (StatusCode::BAD_REQUEST, reason).into_response(),
        }
    }
}
