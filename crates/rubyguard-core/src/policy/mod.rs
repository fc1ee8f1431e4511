//! Script safety policy (gray lists, seed lists, rule table).
//!
//! [`Policy`] walks a [`crate::ast::Node`] tree and decides, per node kind,
//! whether the construct may run inside the sandbox. The rule table is a
//! single exhaustive `match` over the node enum; kinds it does not know are
//! rejected.

pub mod engine;
pub mod gray_list;
pub mod seeds;

pub use engine::{Evaluation, Policy, PolicyOptions, Rejection, UNRECOGNIZED_KIND};
pub use gray_list::GrayList;
