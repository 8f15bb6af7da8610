//! Boolean condition trees.
//!
//! A [`Condition`] is a small algebra of leaf [`Predicate`]s combined with
//! AND/OR/NOT. It is generic over the subject being tested, so the same
//! combinators build conditions over nodes, node names (`str`) and scalar
//! [`Value`](crate::Value)s.
//!
//! Conditions are plain data. [`Condition::evaluate`] interprets them
//! directly; the [`Compiler`](crate::Compiler) turns them into a single
//! closure for repeated use.

use std::fmt::{self, Debug, Display, Formatter};
use std::ops::{BitAnd, BitOr, Not};
use std::sync::Arc;

use crate::error::PredicateError;

/// A shared, thread-safe test over a subject.
pub type TestFn<T> = Arc<dyn Fn(&T) -> Result<bool, PredicateError> + Send + Sync>;

/// Shares `f` as a [`TestFn`]. Going through a bounded generic fixes the
/// closure's signature to the higher-ranked `Fn(&T)`.
pub(crate) fn test_fn<T, F>(f: F) -> TestFn<T>
where
    T: ?Sized + 'static,
    F: Fn(&T) -> Result<bool, PredicateError> + Send + Sync + 'static,
{
    Arc::new(f)
}

pub(crate) enum Test<T: ?Sized> {
    Constant(bool),
    Fn(TestFn<T>),
}

impl<T: ?Sized> Clone for Test<T> {
    fn clone(&self) -> Self {
        match self {
            Test::Constant(b) => Test::Constant(*b),
            Test::Fn(f) => Test::Fn(Arc::clone(f)),
        }
    }
}

/// A named leaf test.
///
/// Predicates must be pure: the compiler may skip them (short-circuiting) or
/// share them between compiled conditions.
pub struct Predicate<T: ?Sized> {
    label: Arc<str>,
    pub(crate) test: Test<T>,
}

impl<T: ?Sized> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        Self {
            label: Arc::clone(&self.label),
            test: self.test.clone(),
        }
    }
}

impl<T: ?Sized + 'static> Predicate<T> {
    /// Creates an infallible predicate.
    pub fn new<F>(label: impl Into<Arc<str>>, f: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            test: Test::Fn(test_fn(move |subject: &T| Ok(f(subject)))),
        }
    }

    /// Creates a predicate whose failures propagate out of queries unchanged.
    pub fn try_new<F>(label: impl Into<Arc<str>>, f: F) -> Self
    where
        F: Fn(&T) -> Result<bool, PredicateError> + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            test: Test::Fn(test_fn(f)),
        }
    }

    /// A predicate that ignores its subject.
    pub fn constant(value: bool) -> Self {
        Self {
            label: if value { "TRUE".into() } else { "FALSE".into() },
            test: Test::Constant(value),
        }
    }
}

impl<T: ?Sized> Predicate<T> {
    pub fn label(&self) -> &str {
        &self.label
    }

    /// `Some(b)` if this predicate always returns `b`.
    pub fn as_constant(&self) -> Option<bool> {
        match self.test {
            Test::Constant(b) => Some(b),
            Test::Fn(_) => None,
        }
    }

    pub fn evaluate(&self, subject: &T) -> Result<bool, PredicateError> {
        match &self.test {
            Test::Constant(b) => Ok(*b),
            Test::Fn(f) => f(subject),
        }
    }
}

impl<T: ?Sized> Debug for Predicate<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Predicate").field(&self.label).finish()
    }
}

/// A boolean expression over leaf predicates.
#[non_exhaustive]
pub enum Condition<T: ?Sized> {
    Leaf(Predicate<T>),
    And(Box<Condition<T>>, Box<Condition<T>>),
    Or(Box<Condition<T>>, Box<Condition<T>>),
    Not(Box<Condition<T>>),
    /// True when every operand is true. Must not be empty.
    All(Vec<Condition<T>>),
    /// True when any operand is true. Must not be empty.
    Any(Vec<Condition<T>>),
}

impl<T: ?Sized + 'static> Condition<T> {
    pub fn pred<F>(label: impl Into<Arc<str>>, f: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Condition::Leaf(Predicate::new(label, f))
    }

    pub fn try_pred<F>(label: impl Into<Arc<str>>, f: F) -> Self
    where
        F: Fn(&T) -> Result<bool, PredicateError> + Send + Sync + 'static,
    {
        Condition::Leaf(Predicate::try_new(label, f))
    }

    pub fn always() -> Self {
        Condition::Leaf(Predicate::constant(true))
    }

    pub fn never() -> Self {
        Condition::Leaf(Predicate::constant(false))
    }
}

impl<T: ?Sized> Condition<T> {
    pub fn and(self, other: Condition<T>) -> Self {
        Condition::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Condition<T>) -> Self {
        Condition::Or(Box::new(self), Box::new(other))
    }

    pub fn negate(self) -> Self {
        Condition::Not(Box::new(self))
    }

    pub fn all(conditions: impl IntoIterator<Item = Condition<T>>) -> Self {
        Condition::All(conditions.into_iter().collect())
    }

    pub fn any(conditions: impl IntoIterator<Item = Condition<T>>) -> Self {
        Condition::Any(conditions.into_iter().collect())
    }

    /// Interprets the condition directly against `subject`.
    ///
    /// This walks the tree on every call; prefer compiling when a condition is
    /// applied to many subjects. Empty `All`/`Any` follow the usual identities
    /// here (true and false respectively), whereas the compiler rejects them.
    pub fn evaluate(&self, subject: &T) -> Result<bool, PredicateError> {
        match self {
            Condition::Leaf(p) => p.evaluate(subject),
            Condition::And(a, b) => Ok(a.evaluate(subject)? && b.evaluate(subject)?),
            Condition::Or(a, b) => Ok(a.evaluate(subject)? || b.evaluate(subject)?),
            Condition::Not(inner) => Ok(!inner.evaluate(subject)?),
            Condition::All(conditions) => {
                for c in conditions {
                    if !c.evaluate(subject)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Condition::Any(conditions) => {
                for c in conditions {
                    if c.evaluate(subject)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    /// Nesting depth, where a single leaf has depth 1.
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(self, 1)];
        while let Some((condition, depth)) = stack.pop() {
            max = max.max(depth);
            match condition {
                Condition::Leaf(_) => {}
                Condition::And(a, b) | Condition::Or(a, b) => {
                    stack.push((&**a, depth + 1));
                    stack.push((&**b, depth + 1));
                }
                Condition::Not(inner) => stack.push((&**inner, depth + 1)),
                Condition::All(cs) | Condition::Any(cs) => {
                    stack.extend(cs.iter().map(|c| (c, depth + 1)));
                }
            }
        }
        max
    }

    fn fmt_joined(f: &mut Formatter<'_>, op: &str, conditions: &[&Condition<T>]) -> fmt::Result {
        write!(f, "(")?;
        for (i, c) in conditions.iter().enumerate() {
            if i > 0 {
                write!(f, " {} ", op)?;
            }
            write!(f, "{}", c)?;
        }
        write!(f, ")")
    }
}

impl<T: ?Sized> Clone for Condition<T> {
    fn clone(&self) -> Self {
        match self {
            Condition::Leaf(p) => Condition::Leaf(p.clone()),
            Condition::And(a, b) => Condition::And(a.clone(), b.clone()),
            Condition::Or(a, b) => Condition::Or(a.clone(), b.clone()),
            Condition::Not(inner) => Condition::Not(inner.clone()),
            Condition::All(cs) => Condition::All(cs.clone()),
            Condition::Any(cs) => Condition::Any(cs.clone()),
        }
    }
}

impl<T: ?Sized> From<Predicate<T>> for Condition<T> {
    fn from(predicate: Predicate<T>) -> Self {
        Condition::Leaf(predicate)
    }
}

impl<T: ?Sized> BitAnd for Condition<T> {
    type Output = Condition<T>;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.and(rhs)
    }
}

impl<T: ?Sized> BitOr for Condition<T> {
    type Output = Condition<T>;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.or(rhs)
    }
}

impl<T: ?Sized> Not for Condition<T> {
    type Output = Condition<T>;

    fn not(self) -> Self::Output {
        self.negate()
    }
}

/// Renders the condition as an infix expression, e.g. `(name == "a" and (not TRUE))`.
impl<T: ?Sized> Display for Condition<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Leaf(p) => write!(f, "{}", p.label()),
            Condition::And(a, b) => Self::fmt_joined(f, "and", &[&**a, &**b]),
            Condition::Or(a, b) => Self::fmt_joined(f, "or", &[&**a, &**b]),
            Condition::Not(inner) => write!(f, "(not {})", inner),
            Condition::All(cs) => Self::fmt_joined(f, "and", &cs.iter().collect::<Vec<_>>()),
            Condition::Any(cs) => Self::fmt_joined(f, "or", &cs.iter().collect::<Vec<_>>()),
        }
    }
}

impl<T: ?Sized> Debug for Condition<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Condition({})", self)
    }
}
