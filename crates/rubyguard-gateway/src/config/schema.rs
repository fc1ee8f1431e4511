use std::collections::HashSet;

use serde::Deserialize;
use rubyguard_core::ast::DEFAULT_MAX_DEPTH;
use rubyguard_core::error::{Result, RubyGuardError};
use rubyguard_core::policy::PolicyOptions;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub profiles: Vec<ProfileConfig>,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(RubyGuardError::UnsupportedVersion);
        }
        if self.profiles.is_empty() {
            return Err(RubyGuardError::BadRequest("profiles must not be empty".into()));
        }

        self.gateway.validate()?;

        let mut seen = HashSet::new();
        for p in &self.profiles {
            p.validate()?;
            if !seen.insert(p.id.as_str()) {
                return Err(RubyGuardError::BadRequest(format!(
                    "duplicate profile id: {}",
                    p.id
                )));
            }
        }

        Ok(())
    }

    pub fn profile(&self, id: &str) -> Option<&ProfileConfig> {
        self.profiles.iter().find(|p| p.id == id)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Node nesting bound applied before a tree reaches the policy.
    #[serde(default = "default_max_tree_depth")]
    pub max_tree_depth: usize,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            max_body_bytes: default_max_body_bytes(),
            max_tree_depth: default_max_tree_depth(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        if !(1024..=64 * 1024 * 1024).contains(&self.max_body_bytes) {
            return Err(RubyGuardError::BadRequest(
                "gateway.max_body_bytes must be between 1024 and 67108864".into(),
            ));
        }
        // serde_json stops at 128 nested JSON levels; a node can take two.
        if !(1..=64).contains(&self.max_tree_depth) {
            return Err(RubyGuardError::BadRequest(
                "gateway.max_tree_depth must be between 1 and 64".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_max_body_bytes() -> usize {
    1024 * 1024
}
fn default_max_tree_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

/// One named policy configuration. Requests pick a profile by id.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    pub id: String,

    #[serde(default)]
    pub policy: PolicyOptions,

    /// Call/identifier names added on top of the seed lists.
    #[serde(default)]
    pub allow_calls: Vec<String>,
    #[serde(default)]
    pub deny_calls: Vec<String>,

    /// Constant names added on top of the seed lists.
    #[serde(default)]
    pub allow_constants: Vec<String>,
    #[serde(default)]
    pub deny_constants: Vec<String>,
}

impl ProfileConfig {
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(RubyGuardError::BadRequest("profile id must not be empty".into()));
        }
        if let Some(name) = first_overlap(&self.allow_calls, &self.deny_calls) {
            return Err(RubyGuardError::BadRequest(format!(
                "profile {}: call {name} is in both allow_calls and deny_calls",
                self.id
            )));
        }
        if let Some(name) = first_overlap(&self.allow_constants, &self.deny_constants) {
            return Err(RubyGuardError::BadRequest(format!(
                "profile {}: constant {name} is in both allow_constants and deny_constants",
                self.id
            )));
        }
        Ok(())
    }
}

fn first_overlap<'a>(allow: &'a [String], deny: &[String]) -> Option<&'a str> {
    allow
        .iter()
        .find(|name| deny.contains(name))
        .map(String::as_str)
}
