//! Building node trees from parsed JSON and YAML documents.
//!
//! Documents are made of mappings, lists and scalars:
//!
//! - a mapping entry holding a mapping becomes a branch named after the key;
//! - a mapping entry holding a list of mappings (or lists) becomes one branch
//!   per element, all named after the key;
//! - a mapping entry holding a list of scalars becomes one leaf with every
//!   scalar as a value, and an empty list is dropped;
//! - a mapping entry holding a scalar becomes a leaf with that one value;
//! - lists of lists are flattened.
//!
//! The converted entries hang off a nameless root branch carrying the source.

use std::borrow::Cow;

use yaml_rust2::Yaml;

use crate::error::Error;
use crate::node::Node;
use crate::number::Number;
use crate::value::Value;

/// The shape of one document element.
pub enum Shape<'d, D> {
    Mapping(Vec<(Cow<'d, str>, &'d D)>),
    List(&'d [D]),
    Scalar(Value),
}

/// A parsed document that can be turned into a node tree.
pub trait Document: Sized {
    fn shape(&self) -> Shape<'_, Self>;
}

impl Document for serde_json::Value {
    fn shape(&self) -> Shape<'_, Self> {
        match self {
            serde_json::Value::Object(map) => {
                Shape::Mapping(map.iter().map(|(k, v)| (Cow::Borrowed(k.as_str()), v)).collect())
            }
            serde_json::Value::Array(items) => Shape::List(items),
            serde_json::Value::Null => Shape::Scalar(Value::None),
            serde_json::Value::Bool(b) => Shape::Scalar(Value::Bool(*b)),
            serde_json::Value::Number(n) => Shape::Scalar(json_number(n)),
            serde_json::Value::String(s) => Shape::Scalar(Value::String(s.clone())),
        }
    }
}

fn json_number(n: &serde_json::Number) -> Value {
    match n.as_i64() {
        Some(i) => Value::Number(Number::from(i)),
        None => Value::Number(Number::new(n.as_f64().unwrap_or(f64::NAN))),
    }
}

impl Document for Yaml {
    fn shape(&self) -> Shape<'_, Self> {
        match self {
            Yaml::Hash(hash) => Shape::Mapping(hash.iter().map(|(k, v)| (yaml_key(k), v)).collect()),
            Yaml::Array(items) => Shape::List(items),
            scalar => Shape::Scalar(yaml_scalar(scalar)),
        }
    }
}

fn yaml_scalar(yaml: &Yaml) -> Value {
    match yaml {
        Yaml::Integer(i) => Value::Number(Number::from(*i)),
        Yaml::Real(text) => match text.parse::<f64>() {
            Ok(f) => Value::Number(Number::new(f)),
            Err(_) => Value::String(text.clone()),
        },
        Yaml::String(s) => Value::String(s.clone()),
        Yaml::Boolean(b) => Value::Bool(*b),
        _ => Value::None,
    }
}

fn yaml_key(key: &Yaml) -> Cow<'_, str> {
    match key {
        Yaml::String(s) => Cow::Borrowed(s.as_str()),
        Yaml::Real(s) => Cow::Borrowed(s.as_str()),
        Yaml::Hash(_) | Yaml::Array(_) => Cow::Owned(format!("{:?}", key)),
        scalar => Cow::Owned(yaml_scalar(scalar).to_string()),
    }
}

/// Converts a whole document into a tree rooted at a nameless branch.
///
/// # Errors
///
/// Returns [`Error::UnsupportedDocument`] when a scalar appears where a
/// mapping or list is required, including a document that is a bare scalar,
/// or when a list mixes scalars with mappings or lists.
pub fn to_tree<D: Document>(doc: &D, source: Option<&str>) -> Result<Node, Error> {
    let root = Node::root(convert(doc)?);
    Ok(match source {
        Some(source) => root.with_source(source),
        None => root,
    })
}

fn convert<D: Document>(doc: &D) -> Result<Vec<Node>, Error> {
    match doc.shape() {
        Shape::Mapping(entries) => {
            let mut nodes = Vec::with_capacity(entries.len());
            for (key, value) in entries {
                convert_entry(&key, value, &mut nodes)?;
            }
            Ok(nodes)
        }
        Shape::List(items) => {
            let mut nodes = Vec::new();
            for item in items {
                nodes.extend(convert(item)?);
            }
            Ok(nodes)
        }
        Shape::Scalar(value) => Err(Error::UnsupportedDocument(format!(
            "expected a mapping or a list, found `{}`",
            value
        ))),
    }
}

fn convert_entry<D: Document>(key: &str, value: &D, nodes: &mut Vec<Node>) -> Result<(), Error> {
    match value.shape() {
        Shape::Mapping(_) => nodes.push(Node::branch(key).with_children(convert(value)?)),
        Shape::List([]) => {}
        Shape::List(items) => {
            if is_scalar(&items[0]) {
                let values = items
                    .iter()
                    .map(|item| match item.shape() {
                        Shape::Scalar(v) => Ok(v),
                        _ => Err(Error::UnsupportedDocument(format!(
                            "list under `{}` mixes scalars with collections",
                            key
                        ))),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                nodes.push(Node::leaf(key, values));
            } else {
                for item in items {
                    if is_scalar(item) {
                        return Err(Error::UnsupportedDocument(format!(
                            "list under `{}` mixes collections with scalars",
                            key
                        )));
                    }
                    nodes.push(Node::branch(key).with_children(convert(item)?));
                }
            }
        }
        Shape::Scalar(v) => nodes.push(Node::leaf(key, [v])),
    }
    Ok(())
}

fn is_scalar<D: Document>(doc: &D) -> bool {
    matches!(doc.shape(), Shape::Scalar(_))
}
