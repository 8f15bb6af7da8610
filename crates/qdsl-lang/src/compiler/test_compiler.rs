//! Tests for the condition compiler.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rstest::rstest;

    use crate::compiler::{Compiler, DEFAULT_MAX_DEPTH, Options};
    use crate::condition::Condition;
    use crate::error::{InvalidCondition, PredicateError};

    fn even() -> Condition<i32> {
        Condition::pred("even", |n: &i32| n % 2 == 0)
    }

    fn positive() -> Condition<i32> {
        Condition::pred("positive", |n: &i32| *n > 0)
    }

    fn small() -> Condition<i32> {
        Condition::pred("small", |n: &i32| n.abs() < 10)
    }

    fn counting(label: &str) -> (Condition<i32>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let condition = Condition::pred(label.to_string(), move |n: &i32| {
            counter.fetch_add(1, Ordering::SeqCst);
            *n > 0
        });
        (condition, calls)
    }

    fn exploding() -> Condition<i32> {
        Condition::try_pred("exploding", |_: &i32| {
            Err(PredicateError::new("must not be evaluated"))
        })
    }

    #[test]
    fn test_compiled_and_interpreted_agree() {
        let conditions = vec![
            even(),
            !even(),
            !!even(),
            !!!even(),
            even() & positive(),
            even() | positive(),
            !(even() & positive()) | small(),
            Condition::all([even(), positive(), small()]),
            Condition::any([even(), !positive(), small()]),
            Condition::always() & even(),
            even() & Condition::always(),
            Condition::never() | even(),
            even() | Condition::never(),
            even() & Condition::never(),
            even() | Condition::always(),
            !Condition::always(),
            !Condition::never() & (positive() | Condition::never()),
            Condition::all([Condition::always(), Condition::always()]),
            Condition::any([Condition::never(), positive(), Condition::never()]),
        ];

        let compiler = Compiler::default();
        for condition in conditions {
            let compiled = compiler.compile(&condition).unwrap();
            for n in -12..=12 {
                assert_eq!(
                    compiled.test(&n).unwrap(),
                    condition.evaluate(&n).unwrap(),
                    "condition: {} subject: {}",
                    condition,
                    n
                );
            }
        }
    }

    #[test]
    fn test_double_negation_calls_leaf_once() {
        let (leaf, calls) = counting("leaf");
        let compiled = Compiler::default().compile(&!!leaf.clone()).unwrap();

        for n in [-1, 0, 1, 2] {
            compiled.test(&n).unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 4);

        let direct = Compiler::default().compile(&leaf).unwrap();
        assert!(compiled.ptr_eq(&direct));
    }

    #[test]
    fn test_leaf_is_not_wrapped() {
        let leaf = even();
        let compiler = Compiler::default();
        let a = compiler.compile(&leaf).unwrap();
        let b = compiler.compile(&leaf).unwrap();
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn test_and_short_circuits() {
        let compiled = Compiler::default().compile(&(positive() & exploding())).unwrap();
        assert!(!compiled.test(&-1).unwrap());
        assert!(compiled.test(&1).is_err());
    }

    #[test]
    fn test_or_short_circuits() {
        let compiled = Compiler::default().compile(&(positive() | exploding())).unwrap();
        assert!(compiled.test(&1).unwrap());
        assert!(compiled.test(&-1).is_err());
    }

    #[rstest]
    #[case(|c: Condition<i32>| Condition::always() & c)]
    #[case(|c: Condition<i32>| c & Condition::always())]
    #[case(|c: Condition<i32>| Condition::never() | c)]
    #[case(|c: Condition<i32>| c | Condition::never())]
    #[case(|c: Condition<i32>| Condition::all([Condition::always(), c, Condition::always()]))]
    fn test_constant_operand_is_elided(#[case] build: fn(Condition<i32>) -> Condition<i32>) {
        let compiler = Compiler::default();
        let leaf = even();
        let elided = compiler.compile(&build(leaf.clone())).unwrap();
        assert!(elided.ptr_eq(&compiler.compile(&leaf).unwrap()));
    }

    #[rstest]
    #[case(!Condition::always(), false)]
    #[case(!Condition::never(), true)]
    #[case(Condition::never() & exploding(), false)]
    #[case(Condition::always() | exploding(), true)]
    #[case(Condition::all([Condition::always(), Condition::always()]), true)]
    #[case(Condition::any([Condition::never(), Condition::always(), exploding()]), true)]
    fn test_constant_folding(#[case] condition: Condition<i32>, #[case] expected: bool) {
        let compiled = Compiler::default().compile(&condition).unwrap();
        assert_eq!(compiled.as_constant(), Some(expected));
        assert_eq!(compiled.test(&0).unwrap(), expected);
    }

    #[test]
    fn test_constant_false_right_operand_still_runs_left() {
        let (leaf, calls) = counting("leaf");
        let compiled = Compiler::default().compile(&(leaf & Condition::never())).unwrap();
        assert!(!compiled.test(&5).unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[rstest]
    #[case(Condition::all(Vec::new()), InvalidCondition::EmptyOperands("all"))]
    #[case(Condition::any(Vec::new()), InvalidCondition::EmptyOperands("any"))]
    #[case(even() & Condition::any(Vec::new()), InvalidCondition::EmptyOperands("any"))]
    fn test_empty_operands(#[case] condition: Condition<i32>, #[case] expected: InvalidCondition) {
        assert_eq!(Compiler::default().compile(&condition).unwrap_err(), expected);
    }

    #[test]
    fn test_too_deep() {
        let compiler = Compiler::new(Options { max_depth: 8 });
        let shallow = (0..7).fold(even(), |acc, _| acc & positive());
        assert!(compiler.compile(&shallow).is_ok());

        let deep = (0..8).fold(even(), |acc, _| acc & positive());
        assert_eq!(
            compiler.compile(&deep).unwrap_err(),
            InvalidCondition::TooDeep(8)
        );
    }

    #[test]
    fn test_leaf_error_is_not_rewrapped() {
        #[derive(Debug, thiserror::Error)]
        #[error("custom failure on {0}")]
        struct Custom(i32);

        let condition = Condition::try_pred("custom", |n: &i32| Err(PredicateError::new(Custom(*n))));
        let compiled = Compiler::default().compile(&!condition).unwrap();
        let err = compiled.test(&7).unwrap_err();
        assert_eq!(err.downcast_ref::<Custom>().map(|c| c.0), Some(7));
        assert_eq!(err.to_string(), "custom failure on 7");
    }

    #[test]
    fn test_test_all() {
        let compiler = Compiler::default();
        let subjects = [-2, -1, 0, 1, 2];

        let compiled = compiler.compile(&(even() & positive())).unwrap();
        assert_eq!(
            compiled.test_all(subjects.iter()).unwrap(),
            vec![false, false, false, false, true]
        );

        let constant = compiler.compile(&Condition::always()).unwrap();
        assert_eq!(constant.test_all(subjects.iter()).unwrap(), vec![true; 5]);
    }

    #[test]
    fn test_compiled_predicate_is_shareable_across_threads() {
        let compiled = Compiler::default().compile(&(even() | small())).unwrap();
        let handles = (0..4)
            .map(|i| {
                let compiled = compiled.clone();
                std::thread::spawn(move || compiled.test(&(i * 10)).unwrap())
            })
            .collect::<Vec<_>>();
        let results = handles.into_iter().map(|h| h.join().unwrap()).collect::<Vec<_>>();
        assert_eq!(results, vec![true, true, true, true]);
    }

    #[rstest]
    #[case(Condition::all((0..20_000).map(|_| positive())), true, false)]
    #[case(Condition::any((0..20_000).map(|_| !positive())), false, true)]
    #[case(Condition::all((0..200_000).map(|_| small())), true, true)]
    fn test_wide_chains_evaluate_flat(
        #[case] condition: Condition<i32>,
        #[case] on_one: bool,
        #[case] on_minus_one: bool,
    ) {
        assert_eq!(condition.depth(), 2);
        let compiled = Compiler::default().compile(&condition).unwrap();
        assert_eq!(compiled.test(&1).unwrap(), on_one);
        assert_eq!(compiled.test(&-1).unwrap(), on_minus_one);
    }

    #[test]
    fn test_chain_stops_at_first_decisive_operand() {
        let (leaf, calls) = counting("leaf");
        let compiled = Compiler::default()
            .compile(&Condition::any([positive(), leaf, exploding()]))
            .unwrap();
        assert!(compiled.test(&3).unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(compiled.test(&-3).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_chain_constant_after_test_keeps_the_test() {
        let (leaf, calls) = counting("leaf");
        let compiled = Compiler::default()
            .compile(&Condition::all([leaf, Condition::never(), exploding()]))
            .unwrap();
        assert_eq!(compiled.as_constant(), None);
        assert!(!compiled.test(&5).unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_chain_validates_unreachable_operands() {
        let condition: Condition<i32> = Condition::any([Condition::always(), Condition::all(Vec::new())]);
        assert_eq!(
            Compiler::default().compile(&condition).unwrap_err(),
            InvalidCondition::EmptyOperands("all")
        );
    }

    #[test]
    fn test_into_test_fn() {
        let compiler = Compiler::default();
        let leaf = even();

        let test = compiler.compile(&!!leaf.clone()).unwrap().into_test_fn();
        assert!(test(&4).unwrap());
        assert!(!test(&3).unwrap());
        assert!(Arc::ptr_eq(&test, &compiler.compile(&leaf).unwrap().into_test_fn()));

        let constant = compiler.compile(&(even() | Condition::always())).unwrap().into_test_fn();
        assert!(constant(&3).unwrap());
    }

    struct Discard;

    impl log::Log for Discard {
        fn enabled(&self, _: &log::Metadata<'_>) -> bool {
            true
        }

        fn log(&self, _: &log::Record<'_>) {}

        fn flush(&self) {}
    }

    static DISCARD: Discard = Discard;

    #[test]
    fn test_too_deep_with_debug_logging() {
        let _ = log::set_logger(&DISCARD);
        log::set_max_level(log::LevelFilter::Debug);

        let deep = (0..5_000).fold(even(), |acc, _| acc & positive());
        assert_eq!(
            Compiler::default().compile(&deep).unwrap_err(),
            InvalidCondition::TooDeep(DEFAULT_MAX_DEPTH)
        );
    }
}
