//! rubyguard core: syntax tree model, tree decoder, and the script safety
//! policy.
//!
//! The policy is a static allow/deny gate over an already-parsed Ruby syntax
//! tree. It never executes anything; it walks the tree and rejects constructs
//! that could escape a sandbox (shell access, reflection, global state,
//! dynamic code loading) or that name denied calls and constants. This crate
//! carries no transport or runtime dependencies so hosts can embed it
//! directly.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Malformed trees surface as `RubyGuardError`; node kinds the policy does not
//! know are rejected, never approved.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod ast;
pub mod error;
pub mod policy;

/// Shared result type.
pub use error::{Result, RubyGuardError};
pub use ast::Node;
pub use policy::{Evaluation, GrayList, Policy, PolicyOptions, Rejection};
