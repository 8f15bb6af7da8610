//! Ready-made predicates.
//!
//! Scalar predicates (`eq`, `lt`, `contains`, `search`, ...) are generic over
//! [`Scalar`], so the same constructor builds a `Condition<Value>` for node
//! values or a `Condition<str>` for node names. Node predicates lift those
//! into `Condition<Node>`.
//!
//! ```
//! use qdsl_lang::predicate::{eq, gt, name, value};
//!
//! let replicas = name(eq("replicas"))? & value(gt(2))?;
//! assert_eq!(replicas.to_string(), "(name(eq(\"replicas\")) and value(gt(2)))");
//! # Ok::<(), qdsl_lang::Error>(())
//! ```

use std::cmp::Ordering;

use regex_lite::Regex;

use crate::compiler::{CompiledPredicate, Compiler};
use crate::condition::Condition;
use crate::error::{Error, PredicateError};
use crate::name::intern;
use crate::node::Node;
use crate::value::Value;

/// Something a scalar predicate can look at: a node value or a node name.
pub trait Scalar: 'static {
    fn text(&self) -> Option<&str>;

    /// Orders `self` against `other`, or `None` when they are of different kinds.
    fn compare(&self, other: &Value) -> Option<Ordering>;
}

impl Scalar for Value {
    fn text(&self) -> Option<&str> {
        self.as_str()
    }

    fn compare(&self, other: &Value) -> Option<Ordering> {
        self.partial_cmp_same_kind(other)
    }
}

impl Scalar for str {
    fn text(&self) -> Option<&str> {
        Some(self)
    }

    fn compare(&self, other: &Value) -> Option<Ordering> {
        other.as_str().map(|other| self.cmp(other))
    }
}

fn ordering<T, F>(op: &str, operand: Value, accept: F) -> Condition<T>
where
    T: Scalar + ?Sized,
    F: Fn(Ordering) -> bool + Send + Sync + 'static,
{
    Condition::pred(format!("{}({:?})", op, operand), move |subject: &T| {
        subject.compare(&operand).is_some_and(&accept)
    })
}

pub fn eq<T: Scalar + ?Sized>(operand: impl Into<Value>) -> Condition<T> {
    ordering("eq", operand.into(), Ordering::is_eq)
}

pub fn lt<T: Scalar + ?Sized>(operand: impl Into<Value>) -> Condition<T> {
    ordering("lt", operand.into(), Ordering::is_lt)
}

pub fn le<T: Scalar + ?Sized>(operand: impl Into<Value>) -> Condition<T> {
    ordering("le", operand.into(), Ordering::is_le)
}

pub fn gt<T: Scalar + ?Sized>(operand: impl Into<Value>) -> Condition<T> {
    ordering("gt", operand.into(), Ordering::is_gt)
}

pub fn ge<T: Scalar + ?Sized>(operand: impl Into<Value>) -> Condition<T> {
    ordering("ge", operand.into(), Ordering::is_ge)
}

/// True when the subject equals one of `candidates`.
pub fn isin<T, I, V>(candidates: I) -> Condition<T>
where
    T: Scalar + ?Sized,
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    let candidates = candidates.into_iter().map(Into::into).collect::<Vec<Value>>();
    Condition::pred(format!("isin({:?})", candidates), move |subject: &T| {
        candidates
            .iter()
            .any(|candidate| subject.compare(candidate).is_some_and(Ordering::is_eq))
    })
}

/// True when the subject is a substring of `haystack`.
pub fn isin_text<T: Scalar + ?Sized>(haystack: impl Into<String>) -> Condition<T> {
    let haystack = haystack.into();
    Condition::pred(format!("isin({:?})", haystack), move |subject: &T| {
        subject.text().is_some_and(|text| haystack.contains(text))
    })
}

/// True when the subject contains `needle`.
pub fn contains<T: Scalar + ?Sized>(needle: impl Into<String>) -> Condition<T> {
    let needle = needle.into();
    Condition::pred(format!("contains({:?})", needle), move |subject: &T| {
        subject.text().is_some_and(|text| text.contains(needle.as_str()))
    })
}

pub fn startswith<T: Scalar + ?Sized>(prefix: impl Into<String>) -> Condition<T> {
    let prefix = prefix.into();
    Condition::pred(format!("startswith({:?})", prefix), move |subject: &T| {
        subject.text().is_some_and(|text| text.starts_with(prefix.as_str()))
    })
}

pub fn endswith<T: Scalar + ?Sized>(suffix: impl Into<String>) -> Condition<T> {
    let suffix = suffix.into();
    Condition::pred(format!("endswith({:?})", suffix), move |subject: &T| {
        subject.text().is_some_and(|text| text.ends_with(suffix.as_str()))
    })
}

/// True when `pattern` matches anywhere in the subject.
///
/// # Errors
///
/// Returns [`Error::InvalidRegex`] if `pattern` does not compile.
pub fn search<T: Scalar + ?Sized>(pattern: &str) -> Result<Condition<T>, Error> {
    let regex = Regex::new(pattern).map_err(|source| Error::InvalidRegex {
        pattern: pattern.to_string(),
        source,
    })?;
    Ok(Condition::pred(format!("search({:?})", pattern), move |subject: &T| {
        subject.text().is_some_and(|text| regex.is_match(text))
    }))
}

/// Alias of [`search`].
pub fn matches<T: Scalar + ?Sized>(pattern: &str) -> Result<Condition<T>, Error> {
    search(pattern)
}

/// True when the node's name is exactly `text`. Compares interned names.
pub fn name_equals(text: &str) -> Condition<Node> {
    let target = intern(text);
    Condition::pred(format!("name == {:?}", text), move |node: &Node| {
        node.name() == Some(target)
    })
}

/// Applies a name condition to the node's name. Nameless nodes never match.
pub fn name(condition: Condition<str>) -> Result<Condition<Node>, Error> {
    let compiled = compile(&condition)?;
    Ok(Condition::try_pred(format!("name({})", condition), move |node: &Node| {
        match node.name() {
            Some(name) => compiled.test(&name.as_str()),
            None => Ok(false),
        }
    }))
}

/// True when any of the node's values satisfies `condition`.
pub fn value(condition: Condition<Value>) -> Result<Condition<Node>, Error> {
    let compiled = compile(&condition)?;
    Ok(Condition::try_pred(format!("value({})", condition), move |node: &Node| {
        try_any(node.value(), &compiled)
    }))
}

/// True when any direct child of the node satisfies `condition`.
pub fn has_child(condition: Condition<Node>) -> Result<Condition<Node>, Error> {
    let compiled = compile(&condition)?;
    Ok(Condition::try_pred(format!("has_child({})", condition), move |node: &Node| {
        try_any(node.children(), &compiled)
    }))
}

fn compile<T: ?Sized + 'static>(condition: &Condition<T>) -> Result<CompiledPredicate<T>, Error> {
    Ok(Compiler::default().compile(condition)?)
}

fn try_any<T>(subjects: &[T], predicate: &CompiledPredicate<T>) -> Result<bool, PredicateError> {
    for subject in subjects {
        if predicate.test(subject)? {
            return Ok(true);
        }
    }
    Ok(false)
}

#[derive(Debug, Clone)]
enum NamePart {
    Exact(String),
    Matching(Condition<str>),
}

/// A node query made of an optional name part and any number of value parts.
///
/// Value parts are OR-ed together and the result is AND-ed with the name
/// part. A query with neither matches every node.
///
/// ```
/// use qdsl_lang::predicate::{NodeQuery, eq};
/// use qdsl_lang::{Node, matches};
///
/// let query = NodeQuery::named("image").value(eq("nginx")).value(eq("redis")).build()?;
/// assert!(matches(&Node::leaf("image", ["redis"]), &query)?);
/// assert!(!matches(&Node::leaf("image", ["httpd"]), &query)?);
/// # Ok::<(), qdsl_lang::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct NodeQuery {
    name: Option<NamePart>,
    values: Vec<Condition<Value>>,
}

impl NodeQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// A query on the exact node name.
    pub fn named(text: impl Into<String>) -> Self {
        Self {
            name: Some(NamePart::Exact(text.into())),
            values: Vec::new(),
        }
    }

    /// Replaces the name part with an arbitrary name condition.
    pub fn name(mut self, condition: Condition<str>) -> Self {
        self.name = Some(NamePart::Matching(condition));
        self
    }

    /// Adds a value part.
    pub fn value(mut self, condition: Condition<Value>) -> Self {
        self.values.push(condition);
        self
    }

    pub fn build(&self) -> Result<Condition<Node>, Error> {
        let name_part = match &self.name {
            None => None,
            Some(NamePart::Exact(text)) => Some(name_equals(text)),
            Some(NamePart::Matching(condition)) => Some(name(condition.clone())?),
        };

        let value_part = match self.values.as_slice() {
            [] => None,
            [single] => Some(value(single.clone())?),
            many => Some(value(Condition::any(many.iter().cloned()))?),
        };

        Ok(match (name_part, value_part) {
            (Some(name), Some(value)) => name & value,
            (Some(part), None) | (None, Some(part)) => part,
            (None, None) => Condition::always(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn check(condition: &Condition<Value>, subject: impl Into<Value>) -> bool {
        condition.evaluate(&subject.into()).unwrap()
    }

    #[rstest]
    #[case(eq(3), Value::from(3), true)]
    #[case(eq(3), Value::from(3.0), true)]
    #[case(eq(3), Value::from("3"), false)]
    #[case(eq("web"), Value::from("web"), true)]
    #[case(eq(Value::None), Value::None, true)]
    #[case(lt(5), Value::from(4), true)]
    #[case(lt(5), Value::from(5), false)]
    #[case(le(5), Value::from(5), true)]
    #[case(gt("b"), Value::from("c"), true)]
    #[case(gt(1), Value::from("c"), false)]
    #[case(ge(1.5), Value::from(2), true)]
    #[case(gt(0), Value::Bool(true), false)]
    fn test_comparisons(#[case] condition: Condition<Value>, #[case] subject: Value, #[case] expected: bool) {
        assert_eq!(check(&condition, subject), expected);
    }

    #[rstest]
    #[case(contains("ngin"), "nginx:1.25", true)]
    #[case(contains("redis"), "nginx:1.25", false)]
    #[case(startswith("ngi"), "nginx", true)]
    #[case(endswith(":1.25"), "nginx:1.25", true)]
    #[case(endswith(":1.25"), "nginx:latest", false)]
    #[case(isin_text("nginx redis"), "redis", true)]
    #[case(isin_text("nginx redis"), "httpd", false)]
    fn test_string_predicates(#[case] condition: Condition<Value>, #[case] subject: &str, #[case] expected: bool) {
        assert_eq!(check(&condition, subject), expected);
    }

    #[test]
    fn test_string_predicates_ignore_other_kinds() {
        assert!(!check(&contains("1"), 10));
        assert!(!check(&startswith("t"), true));
    }

    #[test]
    fn test_isin() {
        let condition: Condition<Value> = isin([1, 2, 3]);
        assert!(check(&condition, 2));
        assert!(!check(&condition, 4));
        assert!(!check(&condition, "2"));
    }

    #[test]
    fn test_search() {
        let condition: Condition<Value> = search(r"^v\d+\.").unwrap();
        assert!(check(&condition, "v1.2"));
        assert!(!check(&condition, "1.2"));
        assert!(matches::<Value>("a+").unwrap().evaluate(&Value::from("baa")).unwrap());
    }

    #[test]
    fn test_invalid_regex() {
        let err = search::<Value>("(unclosed").unwrap_err();
        assert!(matches!(err, Error::InvalidRegex { ref pattern, .. } if pattern == "(unclosed"));
    }

    #[test]
    fn test_name_predicates_over_str() {
        let condition: Condition<str> = startswith("meta") & !eq("metadata2");
        assert!(condition.evaluate("metadata").unwrap());
        assert!(!condition.evaluate("metadata2").unwrap());
        assert!(!condition.evaluate("spec").unwrap());
    }

    #[rstest]
    #[case(Node::leaf("image", ["nginx"]), true)]
    #[case(Node::leaf("name", ["image"]), false)]
    #[case(Node::root(Vec::new()), false)]
    fn test_name_equals(#[case] node: Node, #[case] expected: bool) {
        assert_eq!(name_equals("image").evaluate(&node).unwrap(), expected);
    }

    #[test]
    fn test_name_and_value() {
        let node = Node::leaf("ports", [80, 443]);
        assert!(name(startswith("po")).unwrap().evaluate(&node).unwrap());
        assert!(value(eq(443)).unwrap().evaluate(&node).unwrap());
        assert!(!value(eq(8080)).unwrap().evaluate(&node).unwrap());
        assert!(!value(eq(1)).unwrap().evaluate(&Node::branch("empty")).unwrap());
        assert!(!name(Condition::always()).unwrap().evaluate(&Node::root(Vec::new())).unwrap());
    }

    #[test]
    fn test_has_child() {
        let node = Node::branch("spec").with_children(vec![Node::leaf("replicas", [3])]);
        let condition = has_child(name_equals("replicas") & value(gt(2)).unwrap()).unwrap();
        assert!(condition.evaluate(&node).unwrap());
        assert!(!condition.evaluate(&Node::leaf("replicas", [3])).unwrap());
    }

    #[test]
    fn test_invalid_inner_condition() {
        let err = value(Condition::all(Vec::new())).unwrap_err();
        assert!(matches!(err, Error::InvalidCondition(_)));
    }

    #[rstest]
    #[case(NodeQuery::new(), Node::leaf("any", [1]), true)]
    #[case(NodeQuery::named("image"), Node::leaf("image", [1]), true)]
    #[case(NodeQuery::named("image"), Node::leaf("name", [1]), false)]
    #[case(NodeQuery::new().value(eq(1)), Node::leaf("any", [1]), true)]
    #[case(NodeQuery::new().value(eq(2)).value(eq(1)), Node::leaf("any", [1]), true)]
    #[case(NodeQuery::named("image").value(eq(2)), Node::leaf("image", [1]), false)]
    #[case(NodeQuery::new().name(endswith("age")).value(eq(1)), Node::leaf("image", [1]), true)]
    fn test_node_query(#[case] query: NodeQuery, #[case] node: Node, #[case] expected: bool) {
        assert_eq!(query.build().unwrap().evaluate(&node).unwrap(), expected);
    }
}
