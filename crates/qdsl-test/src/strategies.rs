//! Property-based testing strategies for qdsl-lang.
//!
//! Trees draw their names and values from small pools so that generated
//! conditions actually hit nodes.
//!
//! # Examples
//!
//! ```rust,ignore
//! use qdsl_test::strategies::*;
//! use proptest::prelude::*;
//!
//! proptest! {
//!     #[test]
//!     fn test_something(tree in arb_tree(), condition in arb_condition()) {
//!         // Your test here
//!     }
//! }
//! ```

use proptest::prelude::*;
use qdsl_lang::predicate::{self, eq, gt, name_equals};
use qdsl_lang::{Condition, Node, Value};

pub const NAMES: &[&str] = &["kind", "name", "spec", "image", "replicas", "labels"];

/// Strategy for generating node names from [`NAMES`].
pub fn arb_name() -> impl Strategy<Value = &'static str> {
    prop::sample::select(NAMES)
}

/// Strategy for generating scalar values of every kind.
pub fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        (-3i64..4).prop_map(Value::from),
        prop::sample::select(vec!["web", "db", "nginx"]).prop_map(Value::from),
        prop::bool::ANY.prop_map(Value::Bool),
        Just(Value::None),
    ]
}

/// Strategy for generating a named node with up to four levels of children.
pub fn arb_node() -> impl Strategy<Value = Node> {
    let leaf = (arb_name(), prop::collection::vec(arb_value(), 0..3))
        .prop_map(|(name, values)| Node::leaf(name, values));

    leaf.prop_recursive(4, 48, 4, |inner| {
        (
            arb_name(),
            prop::collection::vec(arb_value(), 0..2),
            prop::collection::vec(inner, 0..4),
        )
            .prop_map(|(name, values, children)| {
                Node::branch(name).with_values(values).with_children(children)
            })
    })
}

/// Strategy for generating a document tree: a nameless root over named nodes.
pub fn arb_tree() -> impl Strategy<Value = Node> {
    prop::collection::vec(arb_node(), 0..4).prop_map(Node::root)
}

fn arb_leaf_condition() -> impl Strategy<Value = Condition<Node>> {
    prop_oneof![
        arb_name().prop_map(name_equals),
        arb_value().prop_map(|v| predicate::value(eq(v)).expect("valid value condition")),
        (-3i64..4).prop_map(|n| predicate::value(gt(n)).expect("valid value condition")),
        arb_name().prop_map(|name| {
            predicate::has_child(name_equals(name)).expect("valid child condition")
        }),
        Just(Condition::always()),
        Just(Condition::never()),
    ]
}

/// Strategy for generating node conditions built from every combinator.
/// `All`/`Any` always get at least one operand.
pub fn arb_condition() -> impl Strategy<Value = Condition<Node>> {
    arb_leaf_condition().prop_recursive(5, 32, 3, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a & b),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a | b),
            inner.clone().prop_map(|c| !c),
            prop::collection::vec(inner.clone(), 1..4).prop_map(|cs| Condition::all(cs)),
            prop::collection::vec(inner, 1..4).prop_map(|cs| Condition::any(cs)),
        ]
    })
}
