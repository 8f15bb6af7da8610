//! Compiled predicate type.

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use crate::condition::{Test, TestFn, test_fn};
use crate::error::PredicateError;

/// A condition compiled into a single test.
///
/// Either a constant (the condition folded away entirely and never looks at
/// its subject) or one shared closure.
pub struct CompiledPredicate<T: ?Sized> {
    pub(crate) test: Test<T>,
}

impl<T: ?Sized> Clone for CompiledPredicate<T> {
    fn clone(&self) -> Self {
        Self {
            test: self.test.clone(),
        }
    }
}

impl<T: ?Sized> CompiledPredicate<T> {
    pub(crate) fn new(test: Test<T>) -> Self {
        Self { test }
    }

    #[inline]
    pub fn test(&self, subject: &T) -> Result<bool, PredicateError> {
        match &self.test {
            Test::Constant(b) => Ok(*b),
            Test::Fn(f) => f(subject),
        }
    }

    /// Tests every subject in order. Stops at the first failing predicate.
    pub fn test_all<'a, I>(&self, subjects: I) -> Result<Vec<bool>, PredicateError>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let subjects = subjects.into_iter();
        match &self.test {
            Test::Constant(b) => Ok(vec![*b; subjects.count()]),
            Test::Fn(f) => subjects.map(|s| f(s)).collect(),
        }
    }

    /// `Some(b)` if the condition folded to the constant `b`.
    pub fn as_constant(&self) -> Option<bool> {
        match self.test {
            Test::Constant(b) => Some(b),
            Test::Fn(_) => None,
        }
    }

    /// Returns `true` if both predicates run the very same closure.
    pub fn ptr_eq(&self, other: &CompiledPredicate<T>) -> bool {
        match (&self.test, &other.test) {
            (Test::Constant(a), Test::Constant(b)) => a == b,
            (Test::Fn(a), Test::Fn(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl<T: ?Sized + 'static> CompiledPredicate<T> {
    /// The compiled test as a plain shared closure.
    pub fn into_test_fn(self) -> TestFn<T> {
        match self.test {
            Test::Constant(b) => test_fn(move |_: &T| Ok(b)),
            Test::Fn(f) => f,
        }
    }
}

impl<T: ?Sized> Debug for CompiledPredicate<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.test {
            Test::Constant(b) => write!(f, "CompiledPredicate({})", b),
            Test::Fn(_) => write!(f, "CompiledPredicate(<fn>)"),
        }
    }
}
