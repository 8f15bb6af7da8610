//! Running node conditions against trees.
//!
//! [`matches`] tests a single node. [`find`] compiles a condition once,
//! flattens the tree once and then hands back a [`Found`] sequence that is
//! scanned lazily. [`filter`] keeps the compiled condition around as a
//! [`CompiledQuery`] so it can be applied to many trees.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::compiler::{CompiledPredicate, Compiler};
use crate::condition::Condition;
use crate::error::{Error, PredicateError};
use crate::flatten::{Flattened, NodeId, flatten};
use crate::node::Node;

/// Tests `condition` against `root` alone. Descendants are not visited.
pub fn matches(root: &Node, condition: &Condition<Node>) -> Result<bool, Error> {
    Ok(filter(condition)?.matches(root)?)
}

/// Every node of `root` (itself included) satisfying `condition`, in pre-order.
///
/// Compilation errors are reported here. Predicate failures surface while
/// iterating the result.
pub fn find<'a>(root: &'a Node, condition: &Condition<Node>) -> Result<Found<'a>, Error> {
    Ok(filter(condition)?.find(root))
}

/// Compiles `condition` into a reusable query.
pub fn filter(condition: &Condition<Node>) -> Result<CompiledQuery, Error> {
    CompiledQuery::with_compiler(&Compiler::default(), condition)
}

/// A compiled node condition. Cheap to clone and safe to share across threads.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    predicate: CompiledPredicate<Node>,
}

impl CompiledQuery {
    pub fn with_compiler(compiler: &Compiler, condition: &Condition<Node>) -> Result<Self, Error> {
        Ok(Self {
            predicate: compiler.compile(condition)?,
        })
    }

    pub fn predicate(&self) -> &CompiledPredicate<Node> {
        &self.predicate
    }

    pub fn matches(&self, root: &Node) -> Result<bool, PredicateError> {
        self.predicate.test(root)
    }

    pub fn find<'a>(&self, root: &'a Node) -> Found<'a> {
        Found {
            flattened: flatten(root),
            predicate: self.predicate.clone(),
        }
    }

    /// Scans an index that was flattened beforehand.
    pub fn find_in<'f, 'a>(&'f self, flattened: &'f Flattened<'a>) -> Matches<'f, 'a> {
        Matches::new(flattened, &self.predicate)
    }

    /// Number of matching nodes in `root`.
    pub fn count(&self, root: &Node) -> Result<usize, PredicateError> {
        let flattened = flatten(root);
        self.find_in(&flattened)
            .try_fold(0, |count, found| found.map(|_| count + 1))
    }
}

/// The result of [`find`]: a finite, ordered and restartable sequence.
#[derive(Debug, Clone)]
pub struct Found<'a> {
    flattened: Flattened<'a>,
    predicate: CompiledPredicate<Node>,
}

impl<'a> Found<'a> {
    /// Starts a fresh scan. Each call begins at the root again.
    pub fn iter(&self) -> Matches<'_, 'a> {
        Matches::new(&self.flattened, &self.predicate)
    }

    /// Starts a scan that stops as soon as `cancel` is set.
    pub fn iter_with_cancel<'f>(&'f self, cancel: &'f AtomicBool) -> Matches<'f, 'a> {
        self.iter().with_cancel(cancel)
    }

    /// Runs a full scan and collects the matches.
    pub fn to_vec(&self) -> Result<Vec<&'a Node>, PredicateError> {
        self.iter().collect()
    }

    /// The flattened tree behind this result.
    pub fn flattened(&self) -> &Flattened<'a> {
        &self.flattened
    }
}

impl<'f, 'a> IntoIterator for &'f Found<'a> {
    type Item = Result<&'a Node, PredicateError>;
    type IntoIter = Matches<'f, 'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A lazy scan over a flattened tree.
///
/// The scan ends after yielding the first predicate error, or once the
/// cancellation flag (if any) is observed set between two nodes.
#[derive(Debug, Clone)]
pub struct Matches<'f, 'a> {
    flattened: &'f Flattened<'a>,
    predicate: &'f CompiledPredicate<Node>,
    cancel: Option<&'f AtomicBool>,
    position: usize,
    done: bool,
}

impl<'f, 'a> Matches<'f, 'a> {
    fn new(flattened: &'f Flattened<'a>, predicate: &'f CompiledPredicate<Node>) -> Self {
        Self {
            flattened,
            predicate,
            cancel: None,
            position: 0,
            done: false,
        }
    }

    pub fn with_cancel(mut self, cancel: &'f AtomicBool) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Yields positions instead of nodes.
    pub fn ids(mut self) -> impl Iterator<Item = Result<NodeId, PredicateError>> {
        std::iter::from_fn(move || self.next_id())
    }

    fn next_id(&mut self) -> Option<Result<NodeId, PredicateError>> {
        if self.done {
            return None;
        }

        while self.position < self.flattened.len() {
            if self.cancel.is_some_and(|cancel| cancel.load(Ordering::Relaxed)) {
                log::debug!("scan cancelled at node {}", self.position);
                self.done = true;
                return None;
            }

            let id = NodeId::from(self.position);
            self.position += 1;
            match self.predicate.test(self.flattened.node(id)) {
                Ok(true) => return Some(Ok(id)),
                Ok(false) => {}
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }

        self.done = true;
        None
    }
}

impl<'a> Iterator for Matches<'_, 'a> {
    type Item = Result<&'a Node, PredicateError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_id()
            .map(|found| found.map(|id| self.flattened.node(id)))
    }
}

impl std::iter::FusedIterator for Matches<'_, '_> {}
