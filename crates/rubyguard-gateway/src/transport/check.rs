//! Check request path: profile lookup, decode, evaluate, record.

use std::time::Instant;

use serde::Serialize;

use rubyguard_core::error::{Result, RubyGuardError};

use crate::app_state::AppState;

/// Verdict returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResponse {
    pub allowed: bool,
    /// `Not allowed to use '...'` for rejected trees.
    pub rejection: Option<String>,
    /// Node kind of the first offending node.
    pub rejected_kind: Option<String>,
    pub nodes_visited: usize,
}

/// Evaluate one JSON tree against a profile.
pub fn check_bytes(state: &AppState, profile_id: &str, body: &[u8]) -> Result<CheckResponse> {
    let metrics = state.metrics();
    let started = Instant::now();

    let runtime = match state.profile(profile_id) {
        Some(rt) => rt,
        None => {
            metrics.request_errors.inc(&[("profile", "-"), ("code", "UNKNOWN_PROFILE")]);
            return Err(RubyGuardError::UnknownProfile(profile_id.to_string()));
        }
    };

    let eval = match runtime.check(body) {
        Ok(eval) => eval,
        Err(e) => {
            let code = e.error_code().as_str();
            metrics.request_errors.inc(&[("profile", profile_id), ("code", code)]);
            tracing::warn!(profile = profile_id, code, error = %e, "tree not evaluated");
            return Err(e);
        }
    };

    metrics
        .check_duration
        .observe(&[("profile", profile_id)], started.elapsed());

    let resp = CheckResponse {
        allowed: eval.is_allowed(),
        rejection: eval.message(),
        rejected_kind: eval.rejection.as_ref().map(|r| r.kind().to_string()),
        nodes_visited: eval.nodes_visited,
    };

    match &eval.rejection {
        Some(r) => {
            // Label values come from the closed kind set only.
            metrics.checks.inc(&[("profile", profile_id), ("verdict", "rejected")]);
            metrics.rejections.inc(&[("profile", profile_id), ("kind", r.metric_kind())]);
            tracing::info!(
                profile = profile_id,
                kind = r.kind(),
                rejection = resp.rejection.as_deref().unwrap_or_default(),
                "script rejected"
            );
        }
        None => {
            metrics.checks.inc(&[("profile", profile_id), ("verdict", "allowed")]);
            tracing::debug!(profile = profile_id, nodes = resp.nodes_visited, "script allowed");
        }
    }

    Ok(resp)
}
