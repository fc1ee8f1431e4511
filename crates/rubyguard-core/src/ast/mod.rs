//! Ruby syntax tree model consumed by the policy.
//!
//! The tree is produced by an external parser and handed over either as Rust
//! values or as JSON (see [`decode`]). Every construct is a variant of the
//! closed [`Node`] enum, so a rule table that matches on it is checked for
//! exhaustiveness by the compiler. Kinds the decoder does not recognise are
//! kept as [`Node::Unrecognized`] rather than dropped.

pub mod decode;

pub use decode::{decode_tree, decode_value, DEFAULT_MAX_DEPTH};

/// Element of a (possibly interpolated) string literal.
#[derive(Debug, Clone, PartialEq)]
pub enum StringPart {
    /// Literal text between interpolations.
    Fragment(String),
    /// `#{...}` interpolation.
    Embedded(Node),
}

/// One syntax tree node.
///
/// Token payloads are kept as source text. Children are owned; the tree has
/// no sharing and no cycles.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Alias { new_name: String, old_name: String },
    Args { elements: Vec<Node> },
    Array { elements: Vec<Node> },
    Assoc { key: Box<Node>, value: Box<Node> },
    Binary { operator: String, lvalue: Box<Node>, rvalue: Box<Node> },
    Block { params: Option<Box<Node>>, elements: Vec<Node> },
    Call {
        target: Option<Box<Node>>,
        identifier: String,
        arguments: Option<Box<Node>>,
        block: Option<Box<Node>>,
    },
    Case { expression: Box<Node>, block: Box<Node> },
    Char { token: String },
    ChainedBlock { elements: Vec<Node>, blocks: Vec<Node>, params: Option<Box<Node>> },
    Class { constant: Box<Node>, superclass: Option<Box<Node>>, body: Box<Node> },
    ClassVariable { token: String },
    ClassVariableAssignment { lvalue: String, rvalue: Box<Node> },
    Constant { token: String },
    ConstantAssignment { lvalue: Box<Node>, rvalue: Box<Node> },
    /// `defined?(expr)`
    Defined { expression: Box<Node> },
    Else { elements: Vec<Node> },
    /// Backticks and `%x{}`.
    ExecutableString { elements: Vec<StringPart> },
    Float { token: String },
    For { variable: Box<Node>, range: Box<Node>, statements: Box<Node> },
    GlobalVariable { token: String },
    GlobalVariableAssignment { lvalue: String, rvalue: Box<Node> },
    Hash { assocs: Vec<Node> },
    Identifier { token: String },
    /// `blocks` chains `elsif`/`else` clauses.
    If { expression: Box<Node>, elements: Vec<Node>, blocks: Vec<Node> },
    IfMod { expression: Box<Node>, elements: Vec<Node> },
    /// Ternary `a ? b : c`.
    IfOp { condition: Box<Node>, then_part: Box<Node>, else_part: Box<Node> },
    InstanceVariable { token: String },
    InstanceVariableAssignment { lvalue: String, rvalue: Box<Node> },
    Integer { token: String },
    Keyword { token: String },
    Label { token: String },
    LocalVariableAssignment { lvalue: String, rvalue: Box<Node> },
    Method {
        target: Option<Box<Node>>,
        identifier: String,
        params: Option<Box<Node>>,
        body: Box<Node>,
    },
    Module { constant: Box<Node>, body: Box<Node> },
    MultiAssignment { lvalue: Box<Node>, rvalue: Box<Node> },
    MultiAssignmentList { elements: Vec<Node> },
    Params { elements: Vec<Node> },
    Program { elements: Vec<Node> },
    Range { min: Box<Node>, max: Box<Node> },
    RescueMod { elements: Vec<Node>, expression: Box<Node> },
    RescueParams { elements: Vec<Node> },
    /// `class << expr`
    SingletonClass { superclass: Box<Node>, body: Box<Node> },
    SplatArg { arg: Box<Node> },
    Statements { elements: Vec<Node> },
    String { elements: Vec<StringPart> },
    StringConcat { elements: Vec<Node> },
    Symbol { token: String },
    Unary { operator: String, operand: Box<Node> },
    Unless { expression: Box<Node>, elements: Vec<Node>, blocks: Vec<Node> },
    UnlessMod { expression: Box<Node>, elements: Vec<Node> },
    Until { expression: Box<Node>, statements: Box<Node> },
    UntilMod { expression: Box<Node>, statements: Box<Node> },
    /// `blocks` chains the following `when`/`else` clauses.
    When { expression: Box<Node>, elements: Vec<Node>, blocks: Vec<Node> },
    While { expression: Box<Node>, statements: Box<Node> },
    WhileMod { expression: Box<Node>, statements: Box<Node> },
    /// A kind tag the decoder did not know. Always rejected by the policy.
    Unrecognized { kind: String },
}

impl Node {
    /// Every kind tag understood by the decoder, in wire spelling.
    pub const KNOWN_KINDS: &'static [&'static str] = &[
        "alias",
        "args",
        "array",
        "assoc",
        "binary",
        "block",
        "call",
        "case",
        "char",
        "chained_block",
        "class",
        "class_variable",
        "class_variable_assignment",
        "constant",
        "constant_assignment",
        "defined",
        "else",
        "executable_string",
        "float",
        "for",
        "global_variable",
        "global_variable_assignment",
        "hash",
        "identifier",
        "if",
        "if_mod",
        "if_op",
        "instance_variable",
        "instance_variable_assignment",
        "integer",
        "keyword",
        "label",
        "local_variable_assignment",
        "method",
        "module",
        "multi_assignment",
        "multi_assignment_list",
        "params",
        "program",
        "range",
        "rescue_mod",
        "rescue_params",
        "singleton_class",
        "splat_arg",
        "statements",
        "string",
        "string_concat",
        "symbol",
        "unary",
        "unless",
        "unless_mod",
        "until",
        "until_mod",
        "when",
        "while",
        "while_mod",
    ];

    /// Kind tag in wire spelling (`"call"`, `"if_mod"`, ...).
    pub fn kind(&self) -> &str {
        match self {
            Node::Alias { .. } => "alias",
            Node::Args { .. } => "args",
            Node::Array { .. } => "array",
            Node::Assoc { .. } => "assoc",
            Node::Binary { .. } => "binary",
            Node::Block { .. } => "block",
            Node::Call { .. } => "call",
            Node::Case { .. } => "case",
            Node::Char { .. } => "char",
            Node::ChainedBlock { .. } => "chained_block",
            Node::Class { .. } => "class",
            Node::ClassVariable { .. } => "class_variable",
            Node::ClassVariableAssignment { .. } => "class_variable_assignment",
            Node::Constant { .. } => "constant",
            Node::ConstantAssignment { .. } => "constant_assignment",
            Node::Defined { .. } => "defined",
            Node::Else { .. } => "else",
            Node::ExecutableString { .. } => "executable_string",
            Node::Float { .. } => "float",
            Node::For { .. } => "for",
            Node::GlobalVariable { .. } => "global_variable",
            Node::GlobalVariableAssignment { .. } => "global_variable_assignment",
            Node::Hash { .. } => "hash",
            Node::Identifier { .. } => "identifier",
            Node::If { .. } => "if",
            Node::IfMod { .. } => "if_mod",
            Node::IfOp { .. } => "if_op",
            Node::InstanceVariable { .. } => "instance_variable",
            Node::InstanceVariableAssignment { .. } => "instance_variable_assignment",
            Node::Integer { .. } => "integer",
            Node::Keyword { .. } => "keyword",
            Node::Label { .. } => "label",
            Node::LocalVariableAssignment { .. } => "local_variable_assignment",
            Node::Method { .. } => "method",
            Node::Module { .. } => "module",
            Node::MultiAssignment { .. } => "multi_assignment",
            Node::MultiAssignmentList { .. } => "multi_assignment_list",
            Node::Params { .. } => "params",
            Node::Program { .. } => "program",
            Node::Range { .. } => "range",
            Node::RescueMod { .. } => "rescue_mod",
            Node::RescueParams { .. } => "rescue_params",
            Node::SingletonClass { .. } => "singleton_class",
            Node::SplatArg { .. } => "splat_arg",
            Node::Statements { .. } => "statements",
            Node::String { .. } => "string",
            Node::StringConcat { .. } => "string_concat",
            Node::Symbol { .. } => "symbol",
            Node::Unary { .. } => "unary",
            Node::Unless { .. } => "unless",
            Node::UnlessMod { .. } => "unless_mod",
            Node::Until { .. } => "until",
            Node::UntilMod { .. } => "until_mod",
            Node::When { .. } => "when",
            Node::While { .. } => "while",
            Node::WhileMod { .. } => "while_mod",
            Node::Unrecognized { kind } => kind.as_str(),
        }
    }

    // Shorthand constructors for hosts and tests that build trees by hand.

    pub fn integer(token: impl Into<String>) -> Self {
        Node::Integer { token: token.into() }
    }

    pub fn identifier(token: impl Into<String>) -> Self {
        Node::Identifier { token: token.into() }
    }

    pub fn constant(token: impl Into<String>) -> Self {
        Node::Constant { token: token.into() }
    }

    pub fn keyword(token: impl Into<String>) -> Self {
        Node::Keyword { token: token.into() }
    }

    pub fn symbol(token: impl Into<String>) -> Self {
        Node::Symbol { token: token.into() }
    }

    /// Plain string literal without interpolation.
    pub fn string(text: impl Into<String>) -> Self {
        Node::String { elements: vec![StringPart::Fragment(text.into())] }
    }

    /// `target.identifier(args...)`; no argument list when `args` is empty.
    pub fn call(target: Option<Node>, identifier: impl Into<String>, args: Vec<Node>) -> Self {
        let arguments = if args.is_empty() {
            None
        } else {
            Some(Box::new(Node::Args { elements: args }))
        };
        Node::Call {
            target: target.map(Box::new),
            identifier: identifier.into(),
            arguments,
            block: None,
        }
    }

    pub fn statements(elements: Vec<Node>) -> Self {
        Node::Statements { elements }
    }

    pub fn program(elements: Vec<Node>) -> Self {
        Node::Program { elements }
    }
}
