use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use qdsl_lang::predicate::{NodeQuery, eq, name_equals, startswith};
use qdsl_lang::{Condition, Node, Selection, Value, filter, find, flatten_forest, intern, matches, to_tree};
use rstest::rstest;

fn names(nodes: &[&Node]) -> Vec<String> {
    nodes
        .iter()
        .map(|n| n.name().map(|n| n.as_str()).unwrap_or_default())
        .collect()
}

fn scenario() -> Node {
    Node::branch("r").with_children(vec![Node::leaf("x", [1]), Node::branch("y")])
}

#[rstest]
#[case(name_equals("x"), vec!["x"])]
#[case(name_equals("x") | name_equals("y"), vec!["x", "y"])]
#[case(!name_equals("x"), vec!["r", "y"])]
#[case(Condition::any([name_equals("y"), name_equals("r")]), vec!["r", "y"])]
#[case(Condition::all([name_equals("x"), name_equals("y")]), vec![])]
fn test_find_scenario(#[case] condition: Condition<Node>, #[case] expected: Vec<&str>) {
    let tree = scenario();
    let found = find(&tree, &condition).unwrap().to_vec().unwrap();
    assert_eq!(names(&found), expected);
}

#[test]
fn test_find_returns_the_tree_nodes() {
    let tree = scenario();
    let found = find(&tree, &name_equals("x")).unwrap().to_vec().unwrap();
    assert!(std::ptr::eq(found[0], &tree.children()[0]));
}

fn counting_name_equals(text: &str) -> (Condition<Node>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let target = intern(text);
    let condition = Condition::pred(format!("counting {}", text), move |node: &Node| {
        counter.fetch_add(1, Ordering::SeqCst);
        node.name() == Some(target)
    });
    (condition, calls)
}

#[test]
fn test_matches_evaluates_root_once() {
    let tree = scenario();
    let (condition, calls) = counting_name_equals("r");
    assert!(matches(&tree, &condition).unwrap());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_double_negation_invokes_leaf_once_per_node() {
    let tree = scenario();
    let (condition, calls) = counting_name_equals("x");
    let found = find(&tree, &!!condition).unwrap().to_vec().unwrap();
    assert_eq!(names(&found), vec!["x"]);
    assert_eq!(calls.load(Ordering::SeqCst), tree.size());
}

#[test]
fn test_short_circuit_never_reaches_failing_leaf() {
    let tree = scenario();
    let failing = Condition::try_pred("fails", |_: &Node| {
        Err(qdsl_lang::PredicateError::new("must not run"))
    });
    let found = find(&tree, &(Condition::never() & failing.clone())).unwrap();
    assert!(found.to_vec().unwrap().is_empty());
    let found = find(&tree, &(Condition::always() | failing)).unwrap();
    assert_eq!(found.to_vec().unwrap().len(), 3);
}

#[test]
fn test_predicate_error_reaches_caller_unchanged() {
    #[derive(Debug, thiserror::Error)]
    #[error("node {0} is not allowed")]
    struct Forbidden(String);

    let tree = scenario();
    let condition = Condition::try_pred("forbid y", |node: &Node| match node.name() {
        Some(name) if name.as_str() == "y" => Err(qdsl_lang::PredicateError::new(Forbidden(name.as_str()))),
        _ => Ok(true),
    });

    let err = find(&tree, &condition).unwrap().to_vec().unwrap_err();
    assert_eq!(err.downcast_ref::<Forbidden>().map(|f| f.0.as_str()), Some("y"));
}

#[test]
fn test_interning_is_stable_across_threads() {
    let handles = (0..8)
        .map(|_| std::thread::spawn(|| intern("shared-across-threads")))
        .collect::<Vec<_>>();
    let names = handles.into_iter().map(|h| h.join().unwrap()).collect::<Vec<_>>();
    assert!(names.iter().all(|n| *n == names[0]));
    assert_eq!(names[0], intern("shared-across-threads"));
}

#[test]
fn test_default_values_are_shared() {
    let a = Node::branch("a");
    let b = Node::branch("b");
    assert!(Arc::ptr_eq(a.values_handle(), b.values_handle()));
}

#[test]
fn test_queries_over_loaded_documents() {
    let web = serde_json::json!({
        "kind": "Deployment",
        "metadata": {"name": "web"},
        "spec": {"containers": [{"name": "app", "image": "nginx:1.25"}]},
    });
    let db = serde_json::json!({
        "kind": "StatefulSet",
        "metadata": {"name": "db"},
        "spec": {"containers": [{"name": "pg", "image": "postgres:16"}]},
    });
    let trees = [
        to_tree(&web, Some("web.json")).unwrap(),
        to_tree(&db, Some("db.json")).unwrap(),
    ];

    let nginx = NodeQuery::named("image").value(startswith("nginx")).build().unwrap();
    let query = filter(&nginx).unwrap();
    let hits = trees.iter().map(|t| query.count(t).unwrap()).collect::<Vec<_>>();
    assert_eq!(hits, vec![1, 0]);

    let index = flatten_forest(&trees);
    let roots = Selection::roots_of(&index);
    let kinds = roots.query(&name_equals("kind")).unwrap();
    assert_eq!(
        kinds.values(),
        vec![&Value::from("Deployment"), &Value::from("StatefulSet")]
    );

    let images = roots.find(&nginx).unwrap();
    assert_eq!(images.sources(), vec!["web.json"]);
    assert_eq!(images.crumbs(), vec!["spec.containers.image"]);

    let stateful = roots
        .where_children(&NodeQuery::named("kind").value(eq("StatefulSet")).build().unwrap())
        .unwrap();
    assert_eq!(stateful.sources(), vec!["db.json"]);
}
