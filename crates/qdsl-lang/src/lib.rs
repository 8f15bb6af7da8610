//! `qdsl-lang` compiles boolean conditions over tree nodes into fast predicates
//! and runs them against whole trees of configuration data.
//!
//! ## Examples
//!
//! ```
//! use qdsl_lang::predicate::{gt, name_equals, value};
//! use qdsl_lang::{Node, find};
//!
//! let tree = Node::root(vec![
//!     Node::branch("spec").with_children(vec![Node::leaf("replicas", [3])]),
//!     Node::leaf("replicas", [1]),
//! ]);
//!
//! let scaled = name_equals("replicas") & value(gt(2))?;
//! let found = find(&tree, &scaled)?;
//! let nodes = found.to_vec()?;
//!
//! assert_eq!(nodes.len(), 1);
//! assert_eq!(nodes[0].value()[0], qdsl_lang::Value::from(3));
//!
//! // Compile once, run against many trees.
//! let query = qdsl_lang::filter(&name_equals("replicas"))?;
//! assert_eq!(query.count(&tree)?, 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
mod arena;
mod compiler;
mod condition;
pub mod convert;
mod error;
mod flatten;
mod name;
mod node;
mod number;
pub mod predicate;
mod query;
mod selection;
mod value;

pub use arena::{Arena, ArenaId};
pub use compiler::{CompiledPredicate, Compiler, DEFAULT_MAX_DEPTH, Options as CompilerOptions};
pub use condition::{Condition, Predicate, TestFn};
pub use convert::to_tree;
pub use error::{BoxError, Error, InvalidCondition, PredicateError};
pub use flatten::{Entry, Flattened, NodeId, flatten, flatten_forest};
pub use name::{Name, intern, interned_count};
pub use node::{Node, NodeKind, Values, empty_values};
pub use number::Number;
pub use query::{CompiledQuery, Found, Matches, filter, find, matches};
pub use selection::Selection;
pub use value::Value;
