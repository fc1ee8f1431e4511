//! Policy layer (profile compilation).
//!
//! Compiles profile configuration into ready-to-use [`rubyguard_core::Policy`]
//! instances for the transport layer to consume at runtime.

pub mod lists;
pub mod runtime;

pub use runtime::ProfilePolicyRuntime;
