//! Closure-based compiler for conditions.
//!
//! This module turns a [`Condition`](crate::Condition) into a single
//! [`CompiledPredicate`]: a shared closure whose shape mirrors the condition
//! but which no longer inspects condition variants when it runs.
//!
//! ## Design
//!
//! Compilation is one structural pass over the condition:
//! - a leaf compiles to the leaf's own test handle, unwrapped;
//! - `Not(Not(x))` compiles to `x`, and negated constants fold;
//! - `And`/`Or` compile to short-circuiting closures, and constant operands
//!   are elided (`TRUE and x` is `x`, `FALSE or x` is `x`);
//! - `All`/`Any` compile to one closure that loops over the non-constant
//!   operands, so wide lists do not nest closures.
//!
//! The compiled predicate is `Send + Sync` and cheap to clone. Compile once,
//! then apply it to as many subjects as needed.
//!
//! ## Example
//!
//! ```rust
//! use qdsl_lang::{Compiler, Condition};
//!
//! let even = Condition::pred("even", |n: &i32| n % 2 == 0);
//! let compiled = Compiler::default().compile(&!!even).unwrap();
//!
//! assert!(compiled.test(&4).unwrap());
//! assert_eq!(compiled.test_all([1, 2, 3].iter()).unwrap(), vec![false, true, false]);
//! ```

mod compile;
mod compiled;
#[cfg(test)]
mod test_compiler;

pub use compile::{Compiler, DEFAULT_MAX_DEPTH, Options};
pub use compiled::CompiledPredicate;
