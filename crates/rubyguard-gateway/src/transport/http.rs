//! HTTP check endpoint.
//!
//! `POST /v1/check/:profile` with a JSON syntax tree as the body.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde_json::json;

use rubyguard_core::error::{ErrorCode, RubyGuardError};

use crate::app_state::AppState;
use crate::transport::check::check_bytes;

pub async fn check(
    State(state): State<AppState>,
    Path(profile): Path<String>,
    body: Bytes,
) -> Response {
    match check_bytes(&state, &profile, &body) {
        Ok(resp) => (StatusCode::OK, Json(resp)).into_response(),
        Err(e) => error_response(&e),
    }
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::BadRequest | ErrorCode::MalformedTree | ErrorCode::TreeTooDeep => {
            StatusCode::BAD_REQUEST
        }
        ErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        ErrorCode::UnknownProfile => StatusCode::NOT_FOUND,
        ErrorCode::UnsupportedVersion | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(e: &RubyGuardError) -> Response {
    let code = e.error_code();
    let body = json!({
        "code": code.as_str(),
        "msg": e.to_string(),
    });
    (status_for(code), Json(body)).into_response()
}
