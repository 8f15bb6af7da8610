use std::fmt::{self, Display, Formatter, Write};
use std::sync::{Arc, LazyLock};

use itertools::Itertools;

use crate::name::Name;
use crate::value::Value;

/// The scalar payload of a node. Cloning only bumps a reference count.
pub type Values = Arc<[Value]>;

static EMPTY_VALUES: LazyLock<Values> = LazyLock::new(|| Arc::from(Vec::new()));

/// The value shared by every node built without one.
pub fn empty_values() -> Values {
    Arc::clone(&EMPTY_VALUES)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A named section that may carry values and children.
    Branch,
    /// A simple name/value pair.
    Leaf,
}

/// An immutable element of a tree.
///
/// A node owns its children. Nodes are assembled bottom-up with the consuming
/// `with_*` methods and never change afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    name: Option<Name>,
    value: Values,
    children: Vec<Node>,
    kind: NodeKind,
    source: Option<Arc<str>>,
}

impl Node {
    pub fn branch(name: impl Into<Name>) -> Self {
        Self::new(Some(name.into()), NodeKind::Branch)
    }

    /// A nameless branch, used as the top of a converted document.
    pub fn root(children: Vec<Node>) -> Self {
        Self::new(None, NodeKind::Branch).with_children(children)
    }

    pub fn leaf<I, V>(name: impl Into<Name>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::new(Some(name.into()), NodeKind::Leaf).with_values(values)
    }

    fn new(name: Option<Name>, kind: NodeKind) -> Self {
        Self {
            name,
            value: empty_values(),
            children: Vec::new(),
            kind,
            source: None,
        }
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn with_values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect::<Vec<_>>();
        self.value = if values.is_empty() {
            empty_values()
        } else {
            Arc::from(values)
        };
        self
    }

    pub fn with_source(mut self, source: impl Into<Arc<str>>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn name(&self) -> Option<Name> {
        self.name
    }

    pub fn value(&self) -> &[Value] {
        &self.value
    }

    /// The shared value handle, for callers that keep values beyond the tree.
    pub fn values_handle(&self) -> &Values {
        &self.value
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_leaf(&self) -> bool {
        self.kind == NodeKind::Leaf
    }

    /// The source recorded on this node itself. See
    /// [`Flattened::source`](crate::Flattened::source) for inherited sources.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Total number of nodes in this subtree, including `self`.
    pub fn size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }

    fn write_tree(&self, out: &mut String, indent: &str) -> fmt::Result {
        let name = self.name.map(|n| n.as_str()).unwrap_or_default();
        let value = self.value.iter().map(|v| format!("{:?}", v)).join(" ");

        match self.kind {
            NodeKind::Branch => {
                let text = format!("{} {}", name, value);
                write!(out, "\n{}[{}]\n", indent, text.trim())?;
                let child_indent = format!("  {}", indent);
                for child in &self.children {
                    child.write_tree(out, &child_indent)?;
                }
                out.push('\n');
            }
            NodeKind::Leaf => {
                let text = format!("{}: {}", name, value);
                writeln!(out, "{}{}", indent, text.trim())?;
            }
        }
        Ok(())
    }
}

/// Renders the subtree with two-space indentation, `[name values]` for
/// branches and `name: values` for leaves.
impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write_tree(&mut out, "")?;
        f.write_str(&collapse_blank_lines(&out))
    }
}

fn collapse_blank_lines(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut newlines = 0;
    for c in s.chars() {
        if c == '\n' {
            newlines += 1;
            if newlines <= 2 {
                out.push(c);
            }
        } else {
            newlines = 0;
            out.push(c);
        }
    }
    out
}
