//! JSON tree decoding (panic-free).
//!
//! Wire format: every node is an object with a `"kind"` tag (see
//! [`Node::KNOWN_KINDS`]) and named fields matching the [`Node`] variant.
//! Child nodes are nested objects, child lists are arrays, tokens are strings.
//! String parts are either a JSON string (fragment) or a node object
//! (interpolation).
//!
//! Decoding rules:
//! - An unknown `"kind"` decodes to [`Node::Unrecognized`]; the policy decides
//!   what to do with it.
//! - A known kind with a missing or mistyped required field is a contract
//!   violation of the producing parser and fails with `MalformedTree`.
//! - Optional children may be absent or `null`. Absent child lists are empty.
//! - Nesting beyond `max_depth` nodes fails with `TreeTooDeep`. serde_json
//!   itself refuses documents nested deeper than 128 JSON levels; those are
//!   reported as `MalformedTree`.

use serde_json::{Map, Value};

use crate::ast::{Node, StringPart};
use crate::error::{Result, RubyGuardError};

/// Node nesting bound used when the host does not configure one.
pub const DEFAULT_MAX_DEPTH: usize = 48;

/// Decode a tree from raw JSON bytes.
pub fn decode_tree(buf: &[u8], max_depth: usize) -> Result<Node> {
    let value: Value = serde_json::from_slice(buf)
        .map_err(|e| RubyGuardError::MalformedTree(format!("invalid json: {e}")))?;
    decode_value(&value, max_depth)
}

/// Decode a tree from an already-parsed JSON value.
pub fn decode_value(value: &Value, max_depth: usize) -> Result<Node> {
    Decoder { max_depth }.node(value, 1)
}

fn malformed(msg: String) -> RubyGuardError {
    RubyGuardError::MalformedTree(msg)
}

struct Decoder {
    max_depth: usize,
}

impl Decoder {
    fn node(&self, value: &Value, depth: usize) -> Result<Node> {
        if depth > self.max_depth {
            return Err(RubyGuardError::TreeTooDeep { max_depth: self.max_depth });
        }

        let obj = value
            .as_object()
            .ok_or_else(|| malformed(format!("expected node object, got {}", json_type(value))))?;
        let kind = obj
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("node without string \"kind\" tag".into()))?;

        let f = Fields { dec: self, obj, kind, depth: depth + 1 };

        let node = match kind {
            "alias" => Node::Alias {
                new_name: f.token("new_name")?,
                old_name: f.token("old_name")?,
            },
            "args" => Node::Args { elements: f.nodes("elements")? },
            "array" => Node::Array { elements: f.nodes("elements")? },
            "assoc" => Node::Assoc { key: f.child("key")?, value: f.child("value")? },
            "binary" => Node::Binary {
                operator: f.token("operator")?,
                lvalue: f.child("lvalue")?,
                rvalue: f.child("rvalue")?,
            },
            "block" => Node::Block {
                params: f.opt_child("params")?,
                elements: f.nodes("elements")?,
            },
            "call" => Node::Call {
                target: f.opt_child("target")?,
                identifier: f.token("identifier")?,
                arguments: f.opt_child("arguments")?,
                block: f.opt_child("block")?,
            },
            "case" => Node::Case { expression: f.child("expression")?, block: f.child("block")? },
            "char" => Node::Char { token: f.token("token")? },
            "chained_block" => Node::ChainedBlock {
                elements: f.nodes("elements")?,
                blocks: f.nodes("blocks")?,
                params: f.opt_child("params")?,
            },
            "class" => Node::Class {
                constant: f.child("constant")?,
                superclass: f.opt_child("superclass")?,
                body: f.child("body")?,
            },
            "class_variable" => Node::ClassVariable { token: f.token("token")? },
            "class_variable_assignment" => Node::ClassVariableAssignment {
                lvalue: f.token("lvalue")?,
                rvalue: f.child("rvalue")?,
            },
            "constant" => Node::Constant { token: f.token("token")? },
            "constant_assignment" => Node::ConstantAssignment {
                lvalue: f.child("lvalue")?,
                rvalue: f.child("rvalue")?,
            },
            "defined" => Node::Defined { expression: f.child("expression")? },
            "else" => Node::Else { elements: f.nodes("elements")? },
            "executable_string" => Node::ExecutableString { elements: f.parts("elements")? },
            "float" => Node::Float { token: f.token("token")? },
            "for" => Node::For {
                variable: f.child("variable")?,
                range: f.child("range")?,
                statements: f.child("statements")?,
            },
            "global_variable" => Node::GlobalVariable { token: f.token("token")? },
            "global_variable_assignment" => Node::GlobalVariableAssignment {
                lvalue: f.token("lvalue")?,
                rvalue: f.child("rvalue")?,
            },
            "hash" => Node::Hash { assocs: f.nodes("assocs")? },
            "identifier" => Node::Identifier { token: f.token("token")? },
            "if" => Node::If {
                expression: f.child("expression")?,
                elements: f.nodes("elements")?,
                blocks: f.nodes("blocks")?,
            },
            "if_mod" => Node::IfMod {
                expression: f.child("expression")?,
                elements: f.nodes("elements")?,
            },
            "if_op" => Node::IfOp {
                condition: f.child("condition")?,
                then_part: f.child("then_part")?,
                else_part: f.child("else_part")?,
            },
            "instance_variable" => Node::InstanceVariable { token: f.token("token")? },
            "instance_variable_assignment" => Node::InstanceVariableAssignment {
                lvalue: f.token("lvalue")?,
                rvalue: f.child("rvalue")?,
            },
            "integer" => Node::Integer { token: f.token("token")? },
            "keyword" => Node::Keyword { token: f.token("token")? },
            "label" => Node::Label { token: f.token("token")? },
            "local_variable_assignment" => Node::LocalVariableAssignment {
                lvalue: f.token("lvalue")?,
                rvalue: f.child("rvalue")?,
            },
            "method" => Node::Method {
                target: f.opt_child("target")?,
                identifier: f.token("identifier")?,
                params: f.opt_child("params")?,
                body: f.child("body")?,
            },
            "module" => Node::Module { constant: f.child("constant")?, body: f.child("body")? },
            "multi_assignment" => Node::MultiAssignment {
                lvalue: f.child("lvalue")?,
                rvalue: f.child("rvalue")?,
            },
            "multi_assignment_list" => Node::MultiAssignmentList { elements: f.nodes("elements")? },
            "params" => Node::Params { elements: f.nodes("elements")? },
            "program" => Node::Program { elements: f.nodes("elements")? },
            "range" => Node::Range { min: f.child("min")?, max: f.child("max")? },
            "rescue_mod" => Node::RescueMod {
                elements: f.nodes("elements")?,
                expression: f.child("expression")?,
            },
            "rescue_params" => Node::RescueParams { elements: f.nodes("elements")? },
            "singleton_class" => Node::SingletonClass {
                superclass: f.child("superclass")?,
                body: f.child("body")?,
            },
            "splat_arg" => Node::SplatArg { arg: f.child("arg")? },
            "statements" => Node::Statements { elements: f.nodes("elements")? },
            "string" => Node::String { elements: f.parts("elements")? },
            "string_concat" => Node::StringConcat { elements: f.nodes("elements")? },
            "symbol" => Node::Symbol { token: f.token("token")? },
            "unary" => Node::Unary { operator: f.token("operator")?, operand: f.child("operand")? },
            "unless" => Node::Unless {
                expression: f.child("expression")?,
                elements: f.nodes("elements")?,
                blocks: f.nodes("blocks")?,
            },
            "unless_mod" => Node::UnlessMod {
                expression: f.child("expression")?,
                elements: f.nodes("elements")?,
            },
            "until" => Node::Until {
                expression: f.child("expression")?,
                statements: f.child("statements")?,
            },
            "until_mod" => Node::UntilMod {
                expression: f.child("expression")?,
                statements: f.child("statements")?,
            },
            "when" => Node::When {
                expression: f.child("expression")?,
                elements: f.nodes("elements")?,
                blocks: f.nodes("blocks")?,
            },
            "while" => Node::While {
                expression: f.child("expression")?,
                statements: f.child("statements")?,
            },
            "while_mod" => Node::WhileMod {
                expression: f.child("expression")?,
                statements: f.child("statements")?,
            },
            other => {
                tracing::debug!(kind = other, "decoded unrecognized node kind");
                Node::Unrecognized { kind: other.to_string() }
            }
        };

        Ok(node)
    }
}

/// Field accessors for one node object.
struct Fields<'a> {
    dec: &'a Decoder,
    obj: &'a Map<String, Value>,
    kind: &'a str,
    depth: usize,
}

impl Fields<'_> {
    fn missing(&self, name: &str) -> RubyGuardError {
        malformed(format!("{} node: missing field \"{name}\"", self.kind))
    }

    fn mistyped(&self, name: &str, expected: &str, got: &Value) -> RubyGuardError {
        malformed(format!(
            "{} node: field \"{name}\" must be {expected}, got {}",
            self.kind,
            json_type(got)
        ))
    }

    fn token(&self, name: &str) -> Result<String> {
        let v = self.obj.get(name).ok_or_else(|| self.missing(name))?;
        v.as_str()
            .map(str::to_string)
            .ok_or_else(|| self.mistyped(name, "a string", v))
    }

    fn child(&self, name: &str) -> Result<Box<Node>> {
        match self.obj.get(name) {
            None | Some(Value::Null) => Err(self.missing(name)),
            Some(v) => Ok(Box::new(self.dec.node(v, self.depth)?)),
        }
    }

    fn opt_child(&self, name: &str) -> Result<Option<Box<Node>>> {
        match self.obj.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => Ok(Some(Box::new(self.dec.node(v, self.depth)?))),
        }
    }

    fn list(&self, name: &str) -> Result<&[Value]> {
        match self.obj.get(name) {
            None | Some(Value::Null) => Ok(&[]),
            Some(Value::Array(items)) => Ok(items.as_slice()),
            Some(v) => Err(self.mistyped(name, "an array", v)),
        }
    }

    fn nodes(&self, name: &str) -> Result<Vec<Node>> {
        self.list(name)?
            .iter()
            .map(|v| self.dec.node(v, self.depth))
            .collect()
    }

    fn parts(&self, name: &str) -> Result<Vec<StringPart>> {
        self.list(name)?
            .iter()
            .map(|v| match v {
                Value::String(s) => Ok(StringPart::Fragment(s.clone())),
                other => Ok(StringPart::Embedded(self.dec.node(other, self.depth)?)),
            })
            .collect()
    }
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
