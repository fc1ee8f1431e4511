use std::fmt;

use serde::Deserialize;

use crate::ast::{Node, StringPart};

use super::gray_list::GrayList;
use super::seeds::{ALLOWED_KEYWORDS, DENIED_CALLS, DENIED_CONSTANTS};

/// Host-facing switches applied when a [`Policy`] is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyOptions {
    /// Accept `while` loops (and the `x while c` modifier form).
    pub permit_while_loops: bool,
    /// Accept `until` loops (and the `x until c` modifier form).
    pub permit_until_loops: bool,
    /// Accept `defined?(expr)`. Off by default: it exposes introspection on
    /// the host environment.
    pub permit_defined: bool,
    /// Reject call/identifier names that are in neither list.
    pub strict_identifiers: bool,
    /// Reject constant names that are in neither list.
    pub strict_constants: bool,
}

/// Label reported by [`Rejection::metric_kind`] for kinds outside the rule table.
pub const UNRECOGNIZED_KIND: &str = "unrecognized";

/// Longest unknown kind tag (in chars) kept in rejections and log events.
pub const MAX_UNRECOGNIZED_KIND_CHARS: usize = 64;

/// Why a tree was rejected: the first offending node in walk order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    kind: String,
    token: String,
    recognized: bool,
}

impl Rejection {
    fn new(node: &Node, token: impl Into<String>) -> Self {
        Self {
            kind: clip(node.kind(), MAX_UNRECOGNIZED_KIND_CHARS).to_string(),
            token: token.into(),
            recognized: !matches!(node, Node::Unrecognized { .. }),
        }
    }

    /// Kind tag of the offending node. Unknown tags are cut to
    /// [`MAX_UNRECOGNIZED_KIND_CHARS`].
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Kind tag drawn from the closed set of known kinds, or
    /// [`UNRECOGNIZED_KIND`]. Safe to use as a metrics label.
    pub fn metric_kind(&self) -> &str {
        if self.recognized {
            &self.kind
        } else {
            UNRECOGNIZED_KIND
        }
    }

    /// Name or construct that was refused (`eval`, `Constant: File`, ...).
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Not allowed to use '{}'", self.token)
    }
}

/// Outcome of evaluating one tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// `None` when the tree is permitted.
    pub rejection: Option<Rejection>,
    /// Nodes entered before the walk finished or stopped at a rejection.
    pub nodes_visited: usize,
}

impl Evaluation {
    pub fn is_allowed(&self) -> bool {
        self.rejection.is_none()
    }

    /// Human-readable rejection message, if any.
    pub fn message(&self) -> Option<String> {
        self.rejection.as_ref().map(ToString::to_string)
    }
}

/// Static safety gate over a Ruby syntax tree.
///
/// Build once per sandbox configuration and reuse. [`Policy::evaluate`] only
/// borrows the policy, so a shared `Arc<Policy>` can serve concurrent checks.
/// [`Policy::visit`] keeps the last rejection on the policy itself and
/// therefore needs exclusive access.
#[derive(Debug, Clone)]
pub struct Policy {
    identifiers: GrayList,
    constants: GrayList,
    permit_while_loops: bool,
    permit_until_loops: bool,
    permit_defined: bool,
    last_rejection: Option<String>,
}

impl Default for Policy {
    fn default() -> Self {
        Self::new()
    }
}

impl Policy {
    /// Policy with default options and the seed deny lists.
    pub fn new() -> Self {
        Self::with_options(PolicyOptions::default())
    }

    pub fn with_options(opts: PolicyOptions) -> Self {
        let mut identifiers = GrayList::new(opts.strict_identifiers);
        for name in DENIED_CALLS {
            identifiers.deny(*name);
        }
        let mut constants = GrayList::new(opts.strict_constants);
        for name in DENIED_CONSTANTS {
            constants.deny(*name);
        }

        Self {
            identifiers,
            constants,
            permit_while_loops: opts.permit_while_loops,
            permit_until_loops: opts.permit_until_loops,
            permit_defined: opts.permit_defined,
            last_rejection: None,
        }
    }

    /// Current switches, as they would be passed to [`Policy::with_options`].
    pub fn options(&self) -> PolicyOptions {
        PolicyOptions {
            permit_while_loops: self.permit_while_loops,
            permit_until_loops: self.permit_until_loops,
            permit_defined: self.permit_defined,
            strict_identifiers: self.identifiers.is_strict(),
            strict_constants: self.constants.is_strict(),
        }
    }

    pub fn identifiers(&self) -> &GrayList {
        &self.identifiers
    }

    pub fn constants(&self) -> &GrayList {
        &self.constants
    }

    pub fn allow_identifier(&mut self, name: impl Into<String>) {
        self.identifiers.allow(name);
    }

    pub fn deny_identifier(&mut self, name: impl Into<String>) {
        self.identifiers.deny(name);
    }

    pub fn allow_constant(&mut self, name: impl Into<String>) {
        self.constants.allow(name);
    }

    pub fn deny_constant(&mut self, name: impl Into<String>) {
        self.constants.deny(name);
    }

    pub fn identifier_allowed(&self, name: &str) -> bool {
        self.identifiers.allows(name)
    }

    pub fn constant_allowed(&self, name: &str) -> bool {
        self.constants.allows(name)
    }

    pub fn set_strict_identifiers(&mut self, strict: bool) {
        self.identifiers.set_strict(strict);
    }

    pub fn set_strict_constants(&mut self, strict: bool) {
        self.constants.set_strict(strict);
    }

    pub fn permits_while_loops(&self) -> bool {
        self.permit_while_loops
    }

    pub fn set_permit_while_loops(&mut self, permit: bool) {
        self.permit_while_loops = permit;
    }

    pub fn permits_until_loops(&self) -> bool {
        self.permit_until_loops
    }

    pub fn set_permit_until_loops(&mut self, permit: bool) {
        self.permit_until_loops = permit;
    }

    pub fn permits_defined(&self) -> bool {
        self.permit_defined
    }

    pub fn set_permit_defined(&mut self, permit: bool) {
        self.permit_defined = permit;
    }

    /// Evaluate a whole tree.
    ///
    /// The walk is depth-first, left to right, and stops at the first
    /// rejection, so the reported reason is the first offending node in
    /// source order and nothing after it is inspected.
    pub fn evaluate(&self, root: &Node) -> Evaluation {
        let mut walk = Walk { policy: self, visited: 0 };
        let rejection = walk.visit(root).err();

        if let Some(r) = &rejection {
            tracing::debug!(
                kind = r.kind(),
                token = r.token(),
                nodes_visited = walk.visited,
                "script rejected"
            );
        }

        Evaluation {
            rejection,
            nodes_visited: walk.visited,
        }
    }

    /// Evaluate and remember the rejection message for [`Policy::rejection`].
    ///
    /// An accepted tree leaves the previous message in place.
    pub fn visit(&mut self, root: &Node) -> bool {
        let eval = self.evaluate(root);
        match eval.message() {
            Some(msg) => {
                self.last_rejection = Some(msg);
                false
            }
            None => true,
        }
    }

    /// Message from the last rejecting [`Policy::visit`] call.
    pub fn rejection(&self) -> Option<&str> {
        self.last_rejection.as_deref()
    }
}

type Step = std::result::Result<(), Rejection>;

struct Walk<'p> {
    policy: &'p Policy,
    visited: usize,
}

impl Walk<'_> {
    fn visit(&mut self, node: &Node) -> Step {
        self.visited += 1;
        let p = self.policy;

        match node {
            // Leaves with nothing to check.
            Node::Char { .. }
            | Node::Float { .. }
            | Node::Integer { .. }
            | Node::InstanceVariable { .. }
            | Node::Label { .. }
            | Node::Symbol { .. } => Ok(()),

            Node::Keyword { token } => {
                if ALLOWED_KEYWORDS.contains(&token.as_str()) {
                    Ok(())
                } else {
                    Err(Rejection::new(node, token.as_str()))
                }
            }

            // Never allowed.
            Node::Alias { .. } => Err(Rejection::new(node, "alias")),
            Node::ClassVariable { token } => {
                Err(Rejection::new(node, format!("Class Variable: {token}")))
            }
            Node::ClassVariableAssignment { lvalue, .. } => {
                Err(Rejection::new(node, format!("Class Variable: {lvalue}")))
            }
            Node::GlobalVariable { token } => Err(Rejection::new(node, token.as_str())),
            Node::GlobalVariableAssignment { lvalue, .. } => {
                Err(Rejection::new(node, lvalue.as_str()))
            }
            Node::ExecutableString { .. } => Err(Rejection::new(
                node,
                "shell access e.g. (exec or backticks ``)",
            )),

            Node::Defined { expression } => {
                if !p.permit_defined {
                    return Err(Rejection::new(node, "defined?"));
                }
                self.visit(expression)
            }

            // Gray-listed names.
            Node::Identifier { token } => {
                if p.identifiers.allows(token) {
                    Ok(())
                } else {
                    Err(Rejection::new(node, token.as_str()))
                }
            }
            Node::Constant { token } => {
                if p.constants.allows(token) {
                    Ok(())
                } else {
                    Err(Rejection::new(node, format!("Constant: {token}")))
                }
            }

            // A denied callee stops the walk before receiver and arguments.
            Node::Call { target, identifier, arguments, block } => {
                if !p.identifiers.allows(identifier) {
                    return Err(Rejection::new(node, identifier.as_str()));
                }
                self.opt(target)?;
                self.opt(arguments)?;
                self.opt(block)
            }

            Node::String { elements } => self.parts(elements),

            Node::Args { elements }
            | Node::Array { elements }
            | Node::Else { elements }
            | Node::MultiAssignmentList { elements }
            | Node::Params { elements }
            | Node::Program { elements }
            | Node::RescueParams { elements }
            | Node::Statements { elements }
            | Node::StringConcat { elements } => self.all(elements),

            Node::Hash { assocs } => self.all(assocs),
            Node::Assoc { key, value } => {
                self.visit(key)?;
                self.visit(value)
            }
            Node::Binary { lvalue, rvalue, .. }
            | Node::ConstantAssignment { lvalue, rvalue }
            | Node::MultiAssignment { lvalue, rvalue } => {
                self.visit(lvalue)?;
                self.visit(rvalue)
            }
            Node::Unary { operand, .. } => self.visit(operand),
            Node::SplatArg { arg } => self.visit(arg),
            Node::Range { min, max } => {
                self.visit(min)?;
                self.visit(max)
            }

            // Plain variable assignment: only the value can carry code.
            Node::InstanceVariableAssignment { rvalue, .. }
            | Node::LocalVariableAssignment { rvalue, .. } => self.visit(rvalue),

            Node::Block { params, elements } => {
                self.opt(params)?;
                self.all(elements)
            }
            Node::ChainedBlock { elements, blocks, params } => {
                self.all(elements)?;
                self.all(blocks)?;
                self.opt(params)
            }
            Node::Method { target, params, body, .. } => {
                self.opt(target)?;
                self.opt(params)?;
                self.visit(body)
            }
            Node::Class { constant, superclass, body } => {
                self.visit(constant)?;
                self.opt(superclass)?;
                self.visit(body)
            }
            Node::Module { constant, body } => {
                self.visit(constant)?;
                self.visit(body)
            }
            Node::SingletonClass { superclass, body } => {
                self.visit(superclass)?;
                self.visit(body)
            }

            Node::If { expression, elements, blocks }
            | Node::Unless { expression, elements, blocks }
            | Node::When { expression, elements, blocks } => {
                self.visit(expression)?;
                self.all(elements)?;
                self.all(blocks)
            }
            Node::IfMod { expression, elements } | Node::UnlessMod { expression, elements } => {
                self.visit(expression)?;
                self.all(elements)
            }
            Node::IfOp { condition, then_part, else_part } => {
                self.visit(condition)?;
                self.visit(then_part)?;
                self.visit(else_part)
            }
            Node::Case { expression, block } => {
                self.visit(expression)?;
                self.visit(block)
            }
            Node::For { variable, range, statements } => {
                self.visit(variable)?;
                self.visit(range)?;
                self.visit(statements)
            }
            Node::RescueMod { elements, expression } => {
                self.all(elements)?;
                self.visit(expression)
            }

            // Gated loops: a disabled loop is refused without looking inside.
            Node::While { expression, statements } | Node::WhileMod { expression, statements } => {
                if !p.permit_while_loops {
                    return Err(Rejection::new(node, "while"));
                }
                self.visit(expression)?;
                self.visit(statements)
            }
            Node::Until { expression, statements } | Node::UntilMod { expression, statements } => {
                if !p.permit_until_loops {
                    return Err(Rejection::new(node, "until"));
                }
                self.visit(expression)?;
                self.visit(statements)
            }

            Node::Unrecognized { kind } => {
                let kind = clip(kind, MAX_UNRECOGNIZED_KIND_CHARS);
                tracing::error!(
                    kind,
                    kind_len = node.kind().len(),
                    "no policy rule for node kind; rejecting"
                );
                Err(Rejection::new(node, format!("unrecognized node kind: {kind}")))
            }
        }
    }

    fn opt(&mut self, node: &Option<Box<Node>>) -> Step {
        match node {
            Some(n) => self.visit(n),
            None => Ok(()),
        }
    }

    fn all(&mut self, nodes: &[Node]) -> Step {
        nodes.iter().try_for_each(|n| self.visit(n))
    }

    fn parts(&mut self, parts: &[StringPart]) -> Step {
        parts.iter().try_for_each(|part| match part {
            StringPart::Fragment(_) => Ok(()),
            StringPart::Embedded(n) => self.visit(n),
        })
    }
}

/// Longest prefix of `s` holding at most `max` chars.
fn clip(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((at, _)) => &s[..at],
        None => s,
    }
}
