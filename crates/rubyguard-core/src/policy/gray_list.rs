//! Combined allow/deny list for names.

use std::collections::HashSet;

/// Allow set plus deny set with a configurable default for unlisted names.
///
/// A name is never in both sets: adding it to one removes it from the other.
/// Lookup order is allow set, then deny set, then the default (`!strict`).
#[derive(Debug, Clone, Default)]
pub struct GrayList {
    deny: HashSet<String>,
    allow: HashSet<String>,
    strict: bool,
}

impl GrayList {
    pub fn new(strict: bool) -> Self {
        Self {
            deny: HashSet::new(),
            allow: HashSet::new(),
            strict,
        }
    }

    /// Whether `item` is permitted.
    pub fn allows(&self, item: &str) -> bool {
        if self.allow.contains(item) {
            return true;
        }
        if self.deny.contains(item) {
            return false;
        }
        !self.strict
    }

    /// Add to the deny set. Idempotent.
    pub fn deny(&mut self, item: impl Into<String>) {
        let item = item.into();
        self.allow.remove(&item);
        self.deny.insert(item);
    }

    /// Add to the allow set. Idempotent.
    pub fn allow(&mut self, item: impl Into<String>) {
        let item = item.into();
        self.deny.remove(&item);
        self.allow.insert(item);
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Only affects names absent from both sets.
    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    pub fn is_denied(&self, item: &str) -> bool {
        self.deny.contains(item)
    }

    pub fn is_allowlisted(&self, item: &str) -> bool {
        self.allow.contains(item)
    }

    pub fn denied_len(&self) -> usize {
        self.deny.len()
    }

    pub fn allowed_len(&self) -> usize {
        self.allow.len()
    }
}
