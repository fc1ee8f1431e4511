//! Name list compilation for profile allow/deny entries.
//!
//! Host-supplied names are checked once at startup so a typo in the config
//! fails the boot instead of silently never matching.

use rubyguard_core::error::{Result, RubyGuardError};

/// Call/identifier names: non-empty, no whitespace, optional trailing
/// `?`, `!` or `=`.
pub fn compile_call_names(field: &str, raw: &[String]) -> Result<Vec<String>> {
    let mut out = Vec::with_capacity(raw.len());
    for s in raw {
        let base = s.strip_suffix(&['?', '!', '='][..]).unwrap_or(s.as_str());
        if base.is_empty() || !base.chars().all(is_ident_char) {
            return Err(RubyGuardError::BadRequest(format!(
                "invalid {field} entry: {s:?} (expected a method name)"
            )));
        }
        out.push(s.clone());
    }
    Ok(out)
}

/// Constant names: must start with an uppercase ASCII letter.
pub fn compile_constant_names(field: &str, raw: &[String]) -> Result<Vec<String>> {
    let mut out = Vec::with_capacity(raw.len());
    for s in raw {
        let starts_upper = s.chars().next().is_some_and(|c| c.is_ascii_uppercase());
        if !starts_upper || !s.chars().all(is_ident_char) {
            return Err(RubyGuardError::BadRequest(format!(
                "invalid {field} entry: {s:?} (expected a constant name)"
            )));
        }
        out.push(s.clone());
    }
    Ok(out)
}

fn is_ident_char(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}
