//! Transport layer.
//!
//! `check` holds the transport-independent request path; `http` adapts it to
//! axum.

pub mod check;
pub mod http;
