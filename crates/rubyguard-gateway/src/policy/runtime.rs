use rubyguard_core::ast::decode_tree;
use rubyguard_core::error::{Result, RubyGuardError};
use rubyguard_core::policy::{Evaluation, Policy};

use crate::config::schema::ProfileConfig;

use super::lists::{compile_call_names, compile_constant_names};

/// Profile-scoped policy runtime.
/// Construct once at startup, then share via Arc.
#[derive(Debug)]
pub struct ProfilePolicyRuntime {
    pub profile_id: String,

    max_body_bytes: usize,
    max_tree_depth: usize,
    policy: Policy,
}

impl ProfilePolicyRuntime {
    pub fn new(
        max_body_bytes: usize,
        max_tree_depth: usize,
        profile: &ProfileConfig,
    ) -> Result<Self> {
        let mut policy = Policy::with_options(profile.policy);

        // Config validation guarantees a name is on one side only.
        for name in compile_call_names("deny_calls", &profile.deny_calls)? {
            policy.deny_identifier(name);
        }
        for name in compile_call_names("allow_calls", &profile.allow_calls)? {
            policy.allow_identifier(name);
        }
        for name in compile_constant_names("deny_constants", &profile.deny_constants)? {
            policy.deny_constant(name);
        }
        for name in compile_constant_names("allow_constants", &profile.allow_constants)? {
            policy.allow_constant(name);
        }

        Ok(Self {
            profile_id: profile.id.clone(),
            max_body_bytes,
            max_tree_depth,
            policy,
        })
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn max_tree_depth(&self) -> usize {
        self.max_tree_depth
    }

    /// Cheap size guard before any parsing.
    pub fn check_len(&self, bytes_len: usize) -> Result<()> {
        if bytes_len > self.max_body_bytes {
            return Err(RubyGuardError::PayloadTooLarge);
        }
        Ok(())
    }

    /// Size guard, decode, evaluate.
    pub fn check(&self, body: &[u8]) -> Result<Evaluation> {
        self.check_len(body.len())?;
        let tree = decode_tree(body, self.max_tree_depth)?;
        Ok(self.policy.evaluate(&tree))
    }
}
