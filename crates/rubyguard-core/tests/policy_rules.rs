//! Rule table, traversal order and diagnostics.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use rubyguard_core::ast::{Node, StringPart};
use rubyguard_core::policy::seeds::{DENIED_CALLS, DENIED_CONSTANTS};
use rubyguard_core::policy::engine::MAX_UNRECOGNIZED_KIND_CHARS;
use rubyguard_core::policy::{Policy, PolicyOptions, UNRECOGNIZED_KIND};

fn b(node: Node) -> Box<Node> {
    Box::new(node)
}

fn reason(policy: &Policy, node: &Node) -> Option<String> {
    policy.evaluate(node).message()
}

fn while_loop(body: Vec<Node>) -> Node {
    Node::While {
        expression: b(Node::keyword("true")),
        statements: b(Node::statements(body)),
    }
}

#[test]
fn puts_with_string_is_allowed() {
    let tree = Node::program(vec![Node::call(None, "puts", vec![Node::string("hi")])]);
    assert!(Policy::new().evaluate(&tree).is_allowed());
}

#[test]
fn eval_is_rejected_with_its_name() {
    let tree = Node::call(None, "eval", vec![Node::identifier("x")]);
    let eval = Policy::new().evaluate(&tree);
    assert!(!eval.is_allowed());
    assert_eq!(eval.message().as_deref(), Some("Not allowed to use 'eval'"));
    let r = eval.rejection.unwrap();
    assert_eq!(r.kind(), "call");
    assert_eq!(r.token(), "eval");
}

#[test]
fn seeded_escape_calls_are_rejected() {
    let policy = Policy::new();
    for name in ["eval", "system", "send", "__send__", "instance_eval", "require"] {
        let tree = Node::call(None, name, vec![]);
        let msg = reason(&policy, &tree).expect("must reject");
        assert!(msg.contains(name), "{name}: {msg}");
    }
    for name in DENIED_CALLS {
        assert!(!policy.evaluate(&Node::identifier(*name)).is_allowed(), "{name}");
    }
}

#[test]
fn seeded_constants_are_rejected() {
    let policy = Policy::new();
    for name in DENIED_CONSTANTS {
        let msg = reason(&policy, &Node::constant(*name)).expect("must reject");
        assert_eq!(msg, format!("Not allowed to use 'Constant: {name}'"));
    }
    assert!(policy.evaluate(&Node::constant("Warrior")).is_allowed());
}

#[test]
fn global_variable_assignment_is_rejected() {
    let tree = Node::GlobalVariableAssignment {
        lvalue: "$global".into(),
        rvalue: b(Node::integer("1")),
    };
    let msg = reason(&Policy::new(), &tree).unwrap();
    assert!(msg.contains("$global"), "{msg}");
}

#[test]
fn self_dot_class_is_allowed_when_not_strict() {
    let tree = Node::call(Some(Node::keyword("self")), "class", vec![]);
    assert!(Policy::new().evaluate(&tree).is_allowed());
}

#[test]
fn always_unsafe_leaves() {
    let policy = Policy::new();
    let cases = [
        (
            Node::Alias { new_name: "a".into(), old_name: "b".into() },
            "Not allowed to use 'alias'",
        ),
        (
            Node::ClassVariable { token: "@@count".into() },
            "Not allowed to use 'Class Variable: @@count'",
        ),
        (
            Node::ClassVariableAssignment {
                lvalue: "@@count".into(),
                rvalue: b(Node::integer("1")),
            },
            "Not allowed to use 'Class Variable: @@count'",
        ),
        (Node::GlobalVariable { token: "$stdout".into() }, "Not allowed to use '$stdout'"),
        (
            Node::ExecutableString { elements: vec![StringPart::Fragment("ls".into())] },
            "Not allowed to use 'shell access e.g. (exec or backticks ``)'",
        ),
        (
            Node::Defined { expression: b(Node::identifier("x")) },
            "Not allowed to use 'defined?'",
        ),
    ];
    for (node, expected) in cases {
        assert_eq!(reason(&policy, &node).as_deref(), Some(expected), "{}", node.kind());
    }
}

#[test]
fn always_safe_leaves() {
    let policy = Policy::new();
    let leaves = [
        Node::integer("1"),
        Node::Float { token: "1.5".into() },
        Node::Char { token: "?a".into() },
        Node::symbol("left"),
        Node::Label { token: "key:".into() },
        Node::InstanceVariable { token: "@warrior".into() },
        Node::string("plain"),
    ];
    for leaf in leaves {
        assert!(policy.evaluate(&leaf).is_allowed(), "{}", leaf.kind());
    }
}

#[test]
fn keywords_are_restricted_to_value_keywords() {
    let policy = Policy::new();
    for ok in ["true", "false", "nil", "self"] {
        assert!(policy.evaluate(&Node::keyword(ok)).is_allowed(), "{ok}");
    }
    for bad in ["__FILE__", "super", "yield", "__LINE__"] {
        let msg = reason(&policy, &Node::keyword(bad)).expect("must reject");
        assert_eq!(msg, format!("Not allowed to use '{bad}'"));
    }
}

#[test]
fn interpolated_strings_are_checked() {
    let tree = Node::String {
        elements: vec![
            StringPart::Fragment("pid: ".into()),
            StringPart::Embedded(Node::call(None, "system", vec![Node::string("id")])),
        ],
    };
    assert_eq!(reason(&Policy::new(), &tree).as_deref(), Some("Not allowed to use 'system'"));
}

#[test]
fn denied_callee_is_not_descended_into() {
    // `eval($x)`: the call name fails first, the global argument is never seen.
    let tree = Node::call(None, "eval", vec![Node::GlobalVariable { token: "$x".into() }]);
    let eval = Policy::new().evaluate(&tree);
    assert_eq!(eval.message().as_deref(), Some("Not allowed to use 'eval'"));
    assert_eq!(eval.nodes_visited, 1);
}

#[test]
fn allowed_call_checks_receiver_arguments_and_block() {
    let policy = Policy::new();

    let receiver = Node::call(Some(Node::constant("File")), "read", vec![Node::string("x")]);
    assert_eq!(reason(&policy, &receiver).as_deref(), Some("Not allowed to use 'Constant: File'"));

    let block = Node::Call {
        target: Some(b(Node::Array { elements: vec![Node::integer("1")] })),
        identifier: "each".into(),
        arguments: None,
        block: Some(b(Node::Block {
            params: Some(b(Node::Params { elements: vec![Node::identifier("i")] })),
            elements: vec![Node::GlobalVariable { token: "$stderr".into() }],
        })),
    };
    assert_eq!(reason(&policy, &block).as_deref(), Some("Not allowed to use '$stderr'"));
}

#[test]
fn first_failure_wins_and_later_siblings_are_not_visited() {
    let a = Node::GlobalVariable { token: "$a".into() };
    let b_fail = Node::call(None, "system", vec![Node::string("rm")]);
    let tree = Node::statements(vec![a, b_fail]);

    let eval = Policy::new().evaluate(&tree);
    assert_eq!(eval.message().as_deref(), Some("Not allowed to use '$a'"));
    // statements + $a; the second child was never entered.
    assert_eq!(eval.nodes_visited, 2);
}

#[test]
fn nested_failure_is_reported_from_depth_first_order() {
    // [[1, Kernel], $g]: Kernel is reached before $g.
    let tree = Node::Array {
        elements: vec![
            Node::Array { elements: vec![Node::integer("1"), Node::constant("Kernel")] },
            Node::GlobalVariable { token: "$g".into() },
        ],
    };
    let eval = Policy::new().evaluate(&tree);
    assert_eq!(eval.message().as_deref(), Some("Not allowed to use 'Constant: Kernel'"));
    assert_eq!(eval.nodes_visited, 4);
}

#[test]
fn disabled_while_is_rejected_without_visiting_the_body() {
    let tree = while_loop(vec![Node::integer("1")]);
    let eval = Policy::new().evaluate(&tree);
    assert_eq!(eval.message().as_deref(), Some("Not allowed to use 'while'"));
    assert_eq!(eval.nodes_visited, 1);

    // A violation inside a forbidden loop is not diagnosed on its own.
    let tree = while_loop(vec![Node::call(None, "eval", vec![])]);
    assert_eq!(reason(&Policy::new(), &tree).as_deref(), Some("Not allowed to use 'while'"));
}

#[test]
fn enabled_while_checks_condition_and_body() {
    let mut policy = Policy::new();
    policy.set_permit_while_loops(true);

    assert!(policy.evaluate(&while_loop(vec![Node::integer("1")])).is_allowed());

    let tree = while_loop(vec![Node::call(None, "fork", vec![])]);
    assert_eq!(reason(&policy, &tree).as_deref(), Some("Not allowed to use 'fork'"));
}

#[test]
fn until_and_modifier_loops_share_their_gates() {
    let body = || b(Node::statements(vec![Node::integer("1")]));
    let cond = || b(Node::keyword("false"));
    let until = Node::Until { expression: cond(), statements: body() };
    let until_mod = Node::UntilMod { expression: cond(), statements: body() };
    let while_mod = Node::WhileMod { expression: cond(), statements: body() };

    let strict = Policy::new();
    assert_eq!(reason(&strict, &until).as_deref(), Some("Not allowed to use 'until'"));
    assert_eq!(reason(&strict, &until_mod).as_deref(), Some("Not allowed to use 'until'"));
    assert_eq!(reason(&strict, &while_mod).as_deref(), Some("Not allowed to use 'while'"));

    let loose = Policy::with_options(PolicyOptions {
        permit_until_loops: true,
        ..PolicyOptions::default()
    });
    assert!(loose.evaluate(&until).is_allowed());
    assert!(loose.evaluate(&until_mod).is_allowed());
    assert!(!loose.evaluate(&while_mod).is_allowed());
}

#[test]
fn defined_can_be_enabled_and_then_checks_its_operand() {
    let mut policy = Policy::new();
    policy.set_permit_defined(true);
    let ok = Node::Defined { expression: b(Node::identifier("x")) };
    let bad = Node::Defined { expression: b(Node::constant("ObjectSpace")) };
    assert!(policy.evaluate(&ok).is_allowed());
    assert_eq!(
        reason(&policy, &bad).as_deref(),
        Some("Not allowed to use 'Constant: ObjectSpace'")
    );
}

#[test]
fn unrecognized_kind_fails_closed() {
    let tree = Node::program(vec![Node::Unrecognized { kind: "flip_flop".into() }]);
    let eval = Policy::new().evaluate(&tree);
    assert!(!eval.is_allowed());
    let r = eval.rejection.unwrap();
    assert_eq!(r.kind(), "flip_flop");
    assert_eq!(r.metric_kind(), UNRECOGNIZED_KIND);
    assert!(r.to_string().contains("flip_flop"));

    let known = Policy::new().evaluate(&Node::call(None, "eval", vec![])).rejection.unwrap();
    assert_eq!(known.metric_kind(), "call");
}

#[test]
fn long_unrecognized_kind_is_clipped() {
    let kind = format!("{}{}", "é".repeat(MAX_UNRECOGNIZED_KIND_CHARS), "tail");
    let r = Policy::new()
        .evaluate(&Node::Unrecognized { kind })
        .rejection
        .unwrap();
    assert_eq!(r.kind().chars().count(), MAX_UNRECOGNIZED_KIND_CHARS);
    assert!(!r.kind().contains("tail"));
    assert!(!r.token().contains("tail"));
    assert_eq!(r.metric_kind(), UNRECOGNIZED_KIND);
}

#[test]
fn strict_modes_reject_unlisted_names() {
    let policy = Policy::with_options(PolicyOptions {
        strict_identifiers: true,
        strict_constants: true,
        ..PolicyOptions::default()
    });
    assert_eq!(
        reason(&policy, &Node::call(None, "puts", vec![])).as_deref(),
        Some("Not allowed to use 'puts'")
    );
    assert_eq!(
        reason(&policy, &Node::constant("Warrior")).as_deref(),
        Some("Not allowed to use 'Constant: Warrior'")
    );
    assert!(policy.options().strict_identifiers);
}

#[test]
fn strict_modes_and_toggles_can_change_after_construction() {
    let mut policy = Policy::new();
    let puts = Node::call(None, "puts", vec![]);
    let warrior = Node::constant("Warrior");
    assert!(policy.evaluate(&puts).is_allowed());
    assert!(policy.evaluate(&warrior).is_allowed());

    policy.set_strict_identifiers(true);
    policy.set_strict_constants(true);
    assert_eq!(reason(&policy, &puts).as_deref(), Some("Not allowed to use 'puts'"));
    assert_eq!(
        reason(&policy, &warrior).as_deref(),
        Some("Not allowed to use 'Constant: Warrior'")
    );
    assert!(policy.identifiers().is_strict());

    policy.allow_identifier("puts");
    policy.set_strict_constants(false);
    assert!(policy.evaluate(&puts).is_allowed());
    assert!(policy.evaluate(&warrior).is_allowed());

    assert!(!policy.permits_while_loops());
    assert!(!policy.permits_until_loops());
    assert!(!policy.permits_defined());
    policy.set_permit_while_loops(true);
    policy.set_permit_until_loops(true);
    policy.set_permit_defined(true);
    assert!(policy.permits_while_loops());
    assert!(policy.permits_until_loops());
    assert!(policy.permits_defined());
    assert_eq!(
        policy.options(),
        PolicyOptions {
            permit_while_loops: true,
            permit_until_loops: true,
            permit_defined: true,
            strict_identifiers: true,
            strict_constants: false,
        }
    );
}

#[test]
fn host_allow_and_deny_entries_override_seeds() {
    let mut policy = Policy::with_options(PolicyOptions {
        strict_identifiers: true,
        ..PolicyOptions::default()
    });
    policy.allow_identifier("walk!");
    policy.allow_identifier("sleep");
    policy.deny_identifier("puts");
    policy.allow_constant("Array");
    policy.deny_constant("Warrior");

    assert!(policy.identifier_allowed("walk!"));
    assert!(policy.identifier_allowed("sleep"));
    assert!(!policy.identifier_allowed("puts"));
    assert!(policy.constant_allowed("Array"));
    assert!(!policy.constant_allowed("Warrior"));
    assert!(!policy.identifiers().is_denied("sleep"));
}

#[test]
fn class_and_method_definitions_are_walked() {
    let tree = Node::Class {
        constant: b(Node::constant("Player")),
        superclass: None,
        body: b(Node::Method {
            target: None,
            identifier: "play_turn".into(),
            params: Some(b(Node::Params { elements: vec![Node::identifier("warrior")] })),
            body: b(Node::statements(vec![
                Node::InstanceVariableAssignment {
                    lvalue: "@warrior".into(),
                    rvalue: b(Node::identifier("warrior")),
                },
                Node::IfMod {
                    expression: b(Node::call(Some(Node::identifier("warrior")), "feel", vec![])),
                    elements: vec![Node::call(Some(Node::identifier("warrior")), "walk!", vec![])],
                },
            ])),
        }),
    };
    assert!(Policy::new().evaluate(&tree).is_allowed());

    let subclass_of_object = Node::Class {
        constant: b(Node::constant("Player")),
        superclass: Some(b(Node::constant("Object"))),
        body: b(Node::statements(vec![])),
    };
    assert_eq!(
        reason(&Policy::new(), &subclass_of_object).as_deref(),
        Some("Not allowed to use 'Constant: Object'")
    );
}

#[test]
fn visit_keeps_last_rejection_and_is_deterministic() {
    let mut policy = Policy::new();
    let bad = Node::call(None, "exit", vec![]);
    let good = Node::integer("1");

    assert!(policy.rejection().is_none());
    assert!(!policy.visit(&bad));
    let first = policy.rejection().map(str::to_string);
    assert!(!policy.visit(&bad));
    assert_eq!(policy.rejection().map(str::to_string), first);
    assert_eq!(first.as_deref(), Some("Not allowed to use 'exit'"));

    assert!(policy.visit(&good));
    assert_eq!(policy.evaluate(&bad), policy.evaluate(&bad));
}

/// `$g` in child slot `at` when `hit == at`, an inert integer otherwise.
fn slot(hit: usize, at: usize) -> Node {
    if hit == at {
        Node::GlobalVariable { token: "$g".into() }
    } else {
        Node::integer("1")
    }
}

fn bslot(hit: usize, at: usize) -> Box<Node> {
    b(slot(hit, at))
}

fn oslot(hit: usize, at: usize) -> Option<Box<Node>> {
    Some(bslot(hit, at))
}

fn vslot(hit: usize, at: usize) -> Vec<Node> {
    vec![Node::integer("1"), slot(hit, at)]
}

type Build = fn(usize) -> Node;

/// Every composite kind with its number of child slots.
const COMPOSITES: &[(&str, usize, Build)] = &[
    ("args", 1, |h| Node::Args { elements: vslot(h, 0) }),
    ("array", 1, |h| Node::Array { elements: vslot(h, 0) }),
    ("assoc", 2, |h| Node::Assoc { key: bslot(h, 0), value: bslot(h, 1) }),
    ("binary", 2, |h| Node::Binary {
        operator: "+".into(),
        lvalue: bslot(h, 0),
        rvalue: bslot(h, 1),
    }),
    ("block", 2, |h| Node::Block { params: oslot(h, 0), elements: vslot(h, 1) }),
    ("call", 3, |h| Node::Call {
        target: oslot(h, 0),
        identifier: "puts".into(),
        arguments: oslot(h, 1),
        block: oslot(h, 2),
    }),
    ("case", 2, |h| Node::Case { expression: bslot(h, 0), block: bslot(h, 1) }),
    ("chained_block", 3, |h| Node::ChainedBlock {
        elements: vslot(h, 0),
        blocks: vslot(h, 1),
        params: oslot(h, 2),
    }),
    ("class", 3, |h| Node::Class {
        constant: bslot(h, 0),
        superclass: oslot(h, 1),
        body: bslot(h, 2),
    }),
    ("constant_assignment", 2, |h| Node::ConstantAssignment {
        lvalue: bslot(h, 0),
        rvalue: bslot(h, 1),
    }),
    ("defined", 1, |h| Node::Defined { expression: bslot(h, 0) }),
    ("else", 1, |h| Node::Else { elements: vslot(h, 0) }),
    ("for", 3, |h| Node::For {
        variable: bslot(h, 0),
        range: bslot(h, 1),
        statements: bslot(h, 2),
    }),
    ("hash", 1, |h| Node::Hash { assocs: vslot(h, 0) }),
    ("if", 3, |h| Node::If {
        expression: bslot(h, 0),
        elements: vslot(h, 1),
        blocks: vslot(h, 2),
    }),
    ("if_mod", 2, |h| Node::IfMod { expression: bslot(h, 0), elements: vslot(h, 1) }),
    ("if_op", 3, |h| Node::IfOp {
        condition: bslot(h, 0),
        then_part: bslot(h, 1),
        else_part: bslot(h, 2),
    }),
    ("instance_variable_assignment", 1, |h| Node::InstanceVariableAssignment {
        lvalue: "@x".into(),
        rvalue: bslot(h, 0),
    }),
    ("local_variable_assignment", 1, |h| Node::LocalVariableAssignment {
        lvalue: "x".into(),
        rvalue: bslot(h, 0),
    }),
    ("method", 3, |h| Node::Method {
        target: oslot(h, 0),
        identifier: "m".into(),
        params: oslot(h, 1),
        body: bslot(h, 2),
    }),
    ("module", 2, |h| Node::Module { constant: bslot(h, 0), body: bslot(h, 1) }),
    ("multi_assignment", 2, |h| Node::MultiAssignment { lvalue: bslot(h, 0), rvalue: bslot(h, 1) }),
    ("multi_assignment_list", 1, |h| Node::MultiAssignmentList { elements: vslot(h, 0) }),
    ("params", 1, |h| Node::Params { elements: vslot(h, 0) }),
    ("program", 1, |h| Node::Program { elements: vslot(h, 0) }),
    ("range", 2, |h| Node::Range { min: bslot(h, 0), max: bslot(h, 1) }),
    ("rescue_mod", 2, |h| Node::RescueMod { elements: vslot(h, 0), expression: bslot(h, 1) }),
    ("rescue_params", 1, |h| Node::RescueParams { elements: vslot(h, 0) }),
    ("singleton_class", 2, |h| Node::SingletonClass { superclass: bslot(h, 0), body: bslot(h, 1) }),
    ("splat_arg", 1, |h| Node::SplatArg { arg: bslot(h, 0) }),
    ("statements", 1, |h| Node::Statements { elements: vslot(h, 0) }),
    ("string", 1, |h| Node::String {
        elements: vec![StringPart::Fragment("a".into()), StringPart::Embedded(slot(h, 0))],
    }),
    ("string_concat", 1, |h| Node::StringConcat { elements: vslot(h, 0) }),
    ("unary", 1, |h| Node::Unary { operator: "-".into(), operand: bslot(h, 0) }),
    ("unless", 3, |h| Node::Unless {
        expression: bslot(h, 0),
        elements: vslot(h, 1),
        blocks: vslot(h, 2),
    }),
    ("unless_mod", 2, |h| Node::UnlessMod { expression: bslot(h, 0), elements: vslot(h, 1) }),
    ("until", 2, |h| Node::Until { expression: bslot(h, 0), statements: bslot(h, 1) }),
    ("until_mod", 2, |h| Node::UntilMod { expression: bslot(h, 0), statements: bslot(h, 1) }),
    ("when", 3, |h| Node::When {
        expression: bslot(h, 0),
        elements: vslot(h, 1),
        blocks: vslot(h, 2),
    }),
    ("while", 2, |h| Node::While { expression: bslot(h, 0), statements: bslot(h, 1) }),
    ("while_mod", 2, |h| Node::WhileMod { expression: bslot(h, 0), statements: bslot(h, 1) }),
];

#[test]
fn every_child_slot_of_every_composite_is_checked() {
    let policy = Policy::with_options(PolicyOptions {
        permit_while_loops: true,
        permit_until_loops: true,
        permit_defined: true,
        ..PolicyOptions::default()
    });

    for &(kind, slots, build) in COMPOSITES {
        let clean = build(usize::MAX);
        assert_eq!(clean.kind(), kind);
        assert!(policy.evaluate(&clean).is_allowed(), "{kind} with inert children");

        for at in 0..slots {
            assert_eq!(
                reason(&policy, &build(at)).as_deref(),
                Some("Not allowed to use '$g'"),
                "{kind} slot {at}"
            );
        }
    }
}
