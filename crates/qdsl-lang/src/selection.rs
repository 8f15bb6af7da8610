//! Navigating a flattened forest.
//!
//! A [`Selection`] is an ordered list of positions in a [`Flattened`] index.
//! Every step returns a new selection, so queries chain:
//!
//! ```
//! use qdsl_lang::predicate::name_equals;
//! use qdsl_lang::{Node, Selection, flatten};
//!
//! let tree = Node::root(vec![
//!     Node::branch("metadata").with_children(vec![Node::leaf("name", ["web"])]),
//! ]);
//! let index = flatten(&tree);
//! let names = Selection::roots_of(&index)
//!     .find(&name_equals("metadata"))?
//!     .query(&name_equals("name"))?;
//! assert_eq!(names.crumbs(), vec!["metadata.name"]);
//! # Ok::<(), qdsl_lang::Error>(())
//! ```

use std::fmt::{self, Display, Formatter};

use itertools::Itertools;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::compiler::{CompiledPredicate, Compiler};
use crate::condition::Condition;
use crate::error::Error;
use crate::flatten::{Flattened, NodeId};
use crate::node::Node;
use crate::value::Value;

#[derive(Debug, Clone)]
pub struct Selection<'f, 'a> {
    index: &'f Flattened<'a>,
    ids: Vec<NodeId>,
}

impl<'f, 'a> Selection<'f, 'a> {
    pub fn new(index: &'f Flattened<'a>, ids: Vec<NodeId>) -> Self {
        Self { index, ids }
    }

    /// Selects the top-level nodes of every tree in `index`.
    pub fn roots_of(index: &'f Flattened<'a>) -> Self {
        let ids = index
            .entries()
            .filter(|(_, entry)| entry.parent.is_none())
            .map(|(id, _)| id)
            .collect();
        Self::new(index, ids)
    }

    fn with_ids(&self, ids: Vec<NodeId>) -> Self {
        Self::new(self.index, ids)
    }

    fn compile(condition: &Condition<Node>) -> Result<CompiledPredicate<Node>, Error> {
        Ok(Compiler::default().compile(condition)?)
    }

    /// Children of the selected nodes that satisfy `condition`.
    pub fn query(&self, condition: &Condition<Node>) -> Result<Self, Error> {
        let predicate = Self::compile(condition)?;
        let mut ids = Vec::new();
        for &id in &self.ids {
            for child in self.index.children(id) {
                if predicate.test(self.index.node(child))? {
                    ids.push(child);
                }
            }
        }
        Ok(self.with_ids(ids))
    }

    /// Nodes anywhere under the selected nodes, the selected nodes included,
    /// that satisfy `condition`.
    pub fn find(&self, condition: &Condition<Node>) -> Result<Self, Error> {
        let predicate = Self::compile(condition)?;
        let mut ids = Vec::new();
        for &id in &self.ids {
            for position in self.index.subtree(id) {
                let candidate = NodeId::from(position);
                if predicate.test(self.index.node(candidate))? {
                    ids.push(candidate);
                }
            }
        }
        Ok(self.with_ids(ids))
    }

    /// Keeps the selected nodes having at least one child that satisfies `condition`.
    pub fn where_children(&self, condition: &Condition<Node>) -> Result<Self, Error> {
        let predicate = Self::compile(condition)?;
        let mut ids = Vec::new();
        for &id in &self.ids {
            for child in self.index.children(id) {
                if predicate.test(self.index.node(child))? {
                    ids.push(id);
                    break;
                }
            }
        }
        Ok(self.with_ids(ids))
    }

    /// Distinct parents of the selected nodes, in first-seen order.
    pub fn parents(&self) -> Self {
        self.distinct(self.ids.iter().filter_map(|&id| self.index.parent(id)))
    }

    /// Distinct top-level ancestors of the selected nodes. Selected nodes that
    /// are roots themselves contribute nothing.
    pub fn roots(&self) -> Self {
        self.distinct(
            self.ids
                .iter()
                .filter_map(|&id| self.index.ancestors(id).last()),
        )
    }

    /// For each selected node, its nearest proper ancestor satisfying `condition`.
    pub fn upto(&self, condition: &Condition<Node>) -> Result<Self, Error> {
        let predicate = Self::compile(condition)?;
        let mut found = Vec::new();
        for &id in &self.ids {
            for ancestor in self.index.ancestors(id) {
                if predicate.test(self.index.node(ancestor))? {
                    found.push(ancestor);
                    break;
                }
            }
        }
        Ok(self.distinct(found))
    }

    fn distinct(&self, ids: impl IntoIterator<Item = NodeId>) -> Self {
        let mut seen = FxHashSet::default();
        self.with_ids(ids.into_iter().filter(|id| seen.insert(*id)).collect())
    }

    /// Sorted, distinct dotted name paths of the selected nodes.
    pub fn crumbs(&self) -> Vec<String> {
        self.ids
            .iter()
            .map(|&id| self.index.path(id).iter().map(|name| name.as_str()).join("."))
            .sorted()
            .dedup()
            .collect()
    }

    /// Sorted, distinct names of the children of the selected nodes.
    pub fn keys(&self) -> Vec<String> {
        self.ids
            .iter()
            .flat_map(|&id| self.index.children(id))
            .filter_map(|child| self.index.node(child).name())
            .unique()
            .map(|name| name.as_str())
            .sorted()
            .collect()
    }

    fn all_values(&self) -> impl Iterator<Item = &'a Value> + '_ {
        self.ids
            .iter()
            .flat_map(|&id| self.index.node(id).value().iter())
    }

    /// Every value of the selected nodes, sorted.
    pub fn values(&self) -> Vec<&'a Value> {
        self.all_values().sorted().collect()
    }

    pub fn unique_values(&self) -> Vec<&'a Value> {
        self.all_values().sorted().dedup().collect()
    }

    /// The first value of the first selected node that has one.
    pub fn first_value(&self) -> Option<&'a Value> {
        self.all_values().next()
    }

    /// Values with their number of occurrences, most frequent first. Ties
    /// keep the order in which values were first seen. `None` returns all.
    pub fn most_common(&self, n: Option<usize>) -> Vec<(&'a Value, usize)> {
        let mut counts: FxHashMap<&'a Value, (usize, usize)> = FxHashMap::default();
        for (seen, value) in self.all_values().enumerate() {
            counts.entry(value).or_insert((0, seen)).0 += 1;
        }
        counts
            .into_iter()
            .sorted_by(|(_, (a_count, a_seen)), (_, (b_count, b_seen))| {
                b_count.cmp(a_count).then(a_seen.cmp(b_seen))
            })
            .take(n.unwrap_or(usize::MAX))
            .map(|(value, (count, _))| (value, count))
            .collect()
    }

    /// Sorted, distinct sources of the selected nodes.
    pub fn sources(&self) -> Vec<&'a str> {
        self.ids
            .iter()
            .filter_map(|&id| self.index.source(id))
            .sorted()
            .dedup()
            .collect()
    }

    /// The `index`-th selected node on its own, or an empty selection.
    pub fn nth(&self, index: usize) -> Self {
        self.with_ids(self.ids.get(index).copied().into_iter().collect())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Node> + '_ {
        self.ids.iter().map(|&id| self.index.node(id))
    }
}

impl Display for Selection<'_, '_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for node in self.iter() {
            write!(f, "{}", node)?;
        }
        Ok(())
    }
}
