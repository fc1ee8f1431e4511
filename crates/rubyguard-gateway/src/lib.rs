//! rubyguard gateway library entry.
//!
//! Hosts the script safety policy behind an HTTP check endpoint: profile
//! config, compiled per-profile policies, metrics, and transport. It is
//! consumed by the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod obs;
pub mod ops;
pub mod policy;
pub mod router;
pub mod transport;
