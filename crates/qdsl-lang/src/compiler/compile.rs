//! Main compilation logic for turning conditions into compiled predicates.

use super::compiled::CompiledPredicate;
use crate::condition::{Condition, Test, TestFn, test_fn};
use crate::error::InvalidCondition;

/// Default maximum nesting depth of a condition.
///
/// Compilation and evaluation both recurse once per nesting level.
pub const DEFAULT_MAX_DEPTH: u32 = 1024;

#[derive(Debug, Clone)]
pub struct Options {
    pub max_depth: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Compiler for transforming conditions into compiled predicates.
///
/// The compiler keeps no state between calls and does no memoization:
/// callers hold on to the [`CompiledPredicate`] they get back.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: Options,
}

impl Compiler {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Compiles a condition into a single reusable test.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCondition`] for an empty `All`/`Any` or a condition
    /// nested deeper than [`Options::max_depth`]. Leaf predicates are never
    /// called during compilation.
    pub fn compile<T>(&self, condition: &Condition<T>) -> Result<CompiledPredicate<T>, InvalidCondition>
    where
        T: ?Sized + 'static,
    {
        if log::log_enabled!(log::Level::Debug) {
            log::debug!("compiling condition of depth {}", condition.depth());
        }
        self.compile_condition(condition, 1).map(CompiledPredicate::new)
    }

    fn compile_condition<T>(&self, condition: &Condition<T>, depth: u32) -> Result<Test<T>, InvalidCondition>
    where
        T: ?Sized + 'static,
    {
        if depth > self.options.max_depth {
            return Err(InvalidCondition::TooDeep(self.options.max_depth));
        }

        match condition {
            // Leaf: reuse the predicate's own handle
            Condition::Leaf(predicate) => Ok(predicate.test.clone()),

            // Double negation: compile the inner-most operand directly
            Condition::Not(inner) => {
                if let Condition::Not(operand) = &**inner {
                    return self.compile_condition(operand, depth + 2);
                }
                Ok(negate(self.compile_condition(inner, depth + 1)?))
            }

            // And expression: short-circuit evaluation
            Condition::And(left, right) => {
                let left = self.compile_condition(left, depth + 1)?;
                let right = self.compile_condition(right, depth + 1)?;
                Ok(and(left, right))
            }

            // Or expression: short-circuit evaluation
            Condition::Or(left, right) => {
                let left = self.compile_condition(left, depth + 1)?;
                let right = self.compile_condition(right, depth + 1)?;
                Ok(or(left, right))
            }

            Condition::All(conditions) => self.compile_chain(conditions, depth, Chain::All),
            Condition::Any(conditions) => self.compile_chain(conditions, depth, Chain::Any),
        }
    }

    /// Compiles `All`/`Any` into one closure that loops over its operands, so
    /// evaluation stays flat however wide the list is.
    fn compile_chain<T>(&self, conditions: &[Condition<T>], depth: u32, chain: Chain) -> Result<Test<T>, InvalidCondition>
    where
        T: ?Sized + 'static,
    {
        if conditions.is_empty() {
            return Err(InvalidCondition::EmptyOperands(chain.name()));
        }

        let decisive = chain.decisive();
        let mut tests: Vec<TestFn<T>> = Vec::new();
        let mut outcome = !decisive;

        for condition in conditions {
            // Operands after a decisive constant are unreachable but still validated.
            let test = self.compile_condition(condition, depth + 1)?;
            if outcome == decisive {
                continue;
            }
            match test {
                Test::Constant(b) if b == decisive => outcome = decisive,
                Test::Constant(_) => {}
                Test::Fn(f) => tests.push(f),
            }
        }

        if tests.is_empty() {
            return Ok(Test::Constant(outcome));
        }
        if outcome != decisive && tests.len() == 1 {
            if let Some(only) = tests.pop() {
                return Ok(Test::Fn(only));
            }
        }

        Ok(Test::Fn(test_fn(move |subject: &T| {
            for test in &tests {
                if test(subject)? == decisive {
                    return Ok(decisive);
                }
            }
            Ok(outcome)
        })))
    }
}

#[derive(Debug, Clone, Copy)]
enum Chain {
    All,
    Any,
}

impl Chain {
    fn name(self) -> &'static str {
        match self {
            Chain::All => "all",
            Chain::Any => "any",
        }
    }

    /// The operand result that settles the whole chain.
    fn decisive(self) -> bool {
        matches!(self, Chain::Any)
    }
}

fn negate<T: ?Sized + 'static>(test: Test<T>) -> Test<T> {
    match test {
        Test::Constant(b) => Test::Constant(!b),
        Test::Fn(f) => Test::Fn(test_fn(move |subject: &T| Ok(!f(subject)?))),
    }
}

fn and<T: ?Sized + 'static>(left: Test<T>, right: Test<T>) -> Test<T> {
    match (left, right) {
        (Test::Constant(true), other) | (other, Test::Constant(true)) => other,
        (Test::Constant(false), _) => Test::Constant(false),
        // The left side still runs, so its failures surface as they would unfolded.
        (Test::Fn(l), Test::Constant(false)) => Test::Fn(test_fn(move |subject: &T| l(subject).map(|_| false))),
        (Test::Fn(l), Test::Fn(r)) => Test::Fn(test_fn(move |subject: &T| Ok(l(subject)? && r(subject)?))),
    }
}

fn or<T: ?Sized + 'static>(left: Test<T>, right: Test<T>) -> Test<T> {
    match (left, right) {
        (Test::Constant(false), other) | (other, Test::Constant(false)) => other,
        (Test::Constant(true), _) => Test::Constant(true),
        (Test::Fn(l), Test::Constant(true)) => Test::Fn(test_fn(move |subject: &T| l(subject).map(|_| true))),
        (Test::Fn(l), Test::Fn(r)) => Test::Fn(test_fn(move |subject: &T| Ok(l(subject)? || r(subject)?))),
    }
}
