//! Seed lists loaded into every new [`super::Policy`].
//!
//! Hosts extend these through the policy mutators; the lists themselves are
//! plain data.

/// Calls and identifiers that reach outside the sandbox: dynamic send,
/// reflection, eval/load/require, process control, I/O, RNG seeding,
/// continuations and tracing hooks.
pub const DENIED_CALLS: &[&str] = &[
    "__callee__",
    "__method__",
    "__send__",
    "abort",
    "alias_method",
    "at_exit",
    "autoload",
    "binding",
    "callcc",
    "caller",
    "class_eval",
    "const_get",
    "const_set",
    "dup",
    "eval",
    "exec",
    "exit",
    "fail",
    "fork",
    "gets",
    "global_variables",
    "instance_eval",
    "load",
    "loop",
    "method",
    "module_eval",
    "open",
    "public_send",
    "readline",
    "readlines",
    "redo",
    "remove_const",
    "require",
    "retry",
    "send",
    "set_trace_func",
    "sleep",
    "spawn",
    "srand",
    "syscall",
    "system",
    "trap",
    "undef",
];

/// Process, environment, IO and reflection roots plus constants that leak
/// interpreter identity.
pub const DENIED_CONSTANTS: &[&str] = &[
    "ARGF",
    "ARGV",
    "Array",
    "Base64",
    "Class",
    "Dir",
    "ENV",
    "Enumerable",
    "Error",
    "Exception",
    "Fiber",
    "File",
    "FileUtils",
    "GC",
    "Gem",
    "Hash",
    "IO",
    "IRB",
    "Kernel",
    "Module",
    "Net",
    "Object",
    "ObjectSpace",
    "OpenSSL",
    "OpenURI",
    "PLATFORM",
    "Proc",
    "Process",
    "RUBY_COPYRIGHT",
    "RUBY_DESCRIPTION",
    "RUBY_ENGINE",
    "RUBY_PATCHLEVEL",
    "RUBY_PLATFORM",
    "RUBY_RELEASE_DATE",
    "RUBY_VERSION",
    "Rails",
    "STDERR",
    "STDIN",
    "STDOUT",
    "String",
    "TOPLEVEL_BINDING",
    "Thread",
    "VERSION",
];

/// Keyword tokens a script may use as values.
pub const ALLOWED_KEYWORDS: &[&str] = &["false", "nil", "self", "true"];
