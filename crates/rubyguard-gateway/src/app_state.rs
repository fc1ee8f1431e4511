//! Shared application state for the rubyguard gateway.
//!
//! Every configured profile is compiled into a [`ProfilePolicyRuntime`] at
//! startup. Compilation errors surface as `Result` so `main` can report them
//! instead of panicking.

use std::collections::HashMap;
use std::sync::Arc;

use rubyguard_core::error::{Result, RubyGuardError};

use crate::config::GatewayConfig;
use crate::obs::CheckMetrics;
use crate::policy::ProfilePolicyRuntime;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    metrics: Arc<CheckMetrics>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    profiles: HashMap<String, Arc<ProfilePolicyRuntime>>,
}

impl AppState {
    pub fn new(cfg: GatewayConfig) -> Result<Self> {
        let mut profiles = HashMap::new();
        for p in &cfg.profiles {
            let runtime = ProfilePolicyRuntime::new(
                cfg.gateway.max_body_bytes,
                cfg.gateway.max_tree_depth,
                p,
            )
            .map_err(|e| {
                RubyGuardError::BadRequest(format!(
                    "profile policy compile failed (profile={}): {e}",
                    p.id
                ))
            })?;

            tracing::info!(
                profile = %runtime.profile_id,
                max_tree_depth = runtime.max_tree_depth(),
                denied_calls = runtime.policy().identifiers().denied_len(),
                allowed_calls = runtime.policy().identifiers().allowed_len(),
                denied_constants = runtime.policy().constants().denied_len(),
                allowed_constants = runtime.policy().constants().allowed_len(),
                "profile compiled"
            );
            profiles.insert(runtime.profile_id.clone(), Arc::new(runtime));
        }

        Ok(Self {
            inner: Arc::new(AppStateInner { cfg, profiles }),
            metrics: Arc::new(CheckMetrics::default()),
        })
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn profile(&self, profile_id: &str) -> Option<Arc<ProfilePolicyRuntime>> {
        self.inner.profiles.get(profile_id).cloned()
    }

    pub fn metrics(&self) -> &CheckMetrics {
        &self.metrics
    }

    pub fn metrics_extra(&self) -> Vec<(&'static str, u64)> {
        vec![("rubyguard_profiles", self.inner.profiles.len() as u64)]
    }

    pub fn set_draining(&self) {
        self.metrics.set_draining();
    }

    pub fn is_draining(&self) -> bool {
        self.metrics.is_draining()
    }
}
