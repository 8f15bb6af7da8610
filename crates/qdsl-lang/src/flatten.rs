//! Pre-order flattening of node trees.
//!
//! A [`Flattened`] index lists every node of one or more trees exactly once,
//! each node before its descendants and siblings in their original order.
//! Every entry remembers its parent's position, so ancestry questions
//! (parents, roots, dotted paths, inherited sources) are answered without
//! back-references in the tree itself.

use std::ops::Range;

use smallvec::SmallVec;

use crate::arena::{Arena, ArenaId};
use crate::name::Name;
use crate::node::Node;

/// Position of a node inside a [`Flattened`] index.
pub type NodeId = ArenaId<Node>;

/// One node in a flattened index.
#[derive(Debug, Clone, Copy)]
pub struct Entry<'a> {
    pub node: &'a Node,
    pub parent: Option<NodeId>,
    pub depth: u32,
    /// One past the last position of this node's subtree.
    end: u32,
}

/// Every node of a tree (or forest) in pre-order.
#[derive(Debug, Clone, Default)]
pub struct Flattened<'a> {
    entries: Arena<Entry<'a>, Node>,
}

/// Flattens a single tree, root included.
pub fn flatten(root: &Node) -> Flattened<'_> {
    flatten_forest([root])
}

/// Flattens several trees into one index, in the order given.
pub fn flatten_forest<'a, I>(roots: I) -> Flattened<'a>
where
    I: IntoIterator<Item = &'a Node>,
{
    let mut entries: Arena<Entry<'a>, Node> = Arena::default();
    let mut stack = roots
        .into_iter()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .map(|root| (root, None, 0))
        .collect::<Vec<_>>();

    while let Some((node, parent, depth)) = stack.pop() {
        let id = entries.alloc(Entry {
            node,
            parent,
            depth,
            end: 0,
        });
        stack.extend(node.children().iter().rev().map(|child| (child, Some(id), depth + 1)));
    }

    close_subtrees(&mut entries);
    log::debug!("flattened {} nodes", entries.len());

    Flattened { entries }
}

/// Records where each subtree ends. In pre-order, a subtree ends at the first
/// later entry that is not deeper than its root.
fn close_subtrees(entries: &mut Arena<Entry<'_>, Node>) {
    let len = entries.len() as u32;
    let mut open: Vec<(NodeId, u32)> = Vec::new();

    for position in 0..len {
        let id = NodeId::new(position);
        let depth = entries[id].depth;
        while let Some(&(open_id, open_depth)) = open.last() {
            if open_depth < depth {
                break;
            }
            if let Some(entry) = entries.get_mut(open_id) {
                entry.end = position;
            }
            open.pop();
        }
        open.push((id, depth));
    }

    for (open_id, _) in open {
        if let Some(entry) = entries.get_mut(open_id) {
            entry.end = len;
        }
    }
}

impl<'a> Flattened<'a> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Nodes in pre-order.
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = &'a Node> + '_ {
        self.entries.iter().map(|entry| entry.node)
    }

    pub fn entries(&self) -> impl Iterator<Item = (NodeId, &Entry<'a>)> {
        self.entries.iter_with_ids()
    }

    pub fn ids(&self) -> impl ExactSizeIterator<Item = NodeId> {
        (0..self.entries.len() as u32).map(NodeId::new)
    }

    pub fn get(&self, id: NodeId) -> Option<&Entry<'a>> {
        self.entries.get(id)
    }

    /// # Panics
    ///
    /// Panics if `id` does not come from this index.
    pub fn node(&self, id: NodeId) -> &'a Node {
        self.entries[id].node
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|entry| entry.parent)
    }

    /// Ancestors of `id`, nearest first, excluding `id` itself.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&current| self.parent(current))
    }

    /// The top-most ancestor of `id`, or `id` itself for a root.
    pub fn root_of(&self, id: NodeId) -> NodeId {
        self.ancestors(id).last().unwrap_or(id)
    }

    /// Positions covered by the subtree rooted at `id`, `id` included.
    pub fn subtree(&self, id: NodeId) -> Range<usize> {
        match self.get(id) {
            Some(entry) => id.index()..entry.end as usize,
            None => 0..0,
        }
    }

    /// Direct children of `id` in their original order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let range = self.subtree(id);
        let mut next = range.start + 1;
        std::iter::from_fn(move || {
            if next >= range.end {
                return None;
            }
            let child = NodeId::from(next);
            next = self.subtree(child).end;
            Some(child)
        })
    }

    /// The source of `id`: its own, or else the nearest ancestor's.
    pub fn source(&self, id: NodeId) -> Option<&'a str> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find_map(|current| self.node(current).source())
    }

    /// Names from the top of the tree down to `id`, skipping nameless nodes.
    /// Paths up to eight names deep stay off the heap.
    pub fn path(&self, id: NodeId) -> SmallVec<[Name; 8]> {
        let mut names = std::iter::once(id)
            .chain(self.ancestors(id))
            .filter_map(|current| self.node(current).name())
            .collect::<SmallVec<[Name; 8]>>();
        names.reverse();
        names
    }
}
