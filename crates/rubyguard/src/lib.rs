//! Top-level facade crate for rubyguard.
//!
//! Re-exports the policy core and the gateway library so users can depend on a single crate.

pub mod core {
    pub use rubyguard_core::*;
}

pub mod gateway {
    pub use rubyguard_gateway::*;
}
