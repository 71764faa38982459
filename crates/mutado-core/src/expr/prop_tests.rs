//! Property-based tests for the expression engine
//!
//! These tests verify that chain construction, display, and rewriting are
//! deterministic and preserve structure across arbitrary member/index/each
//! sequences.

use proptest::prelude::*;

use crate::expr::ast::Expression;
use crate::expr::chain::smash;
use crate::expr::eval::wildcard_count;
use crate::expr::rewrite::substitute_parameter;
use crate::types::DataType;

#[derive(Debug, Clone)]
enum Step {
    Member(String),
    Index(i64),
    Each,
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        "[a-z][a-z0-9]{0,8}".prop_map(Step::Member),
        (0i64..16).prop_map(Step::Index),
        Just(Step::Each),
    ]
}

fn build(steps: &[Step]) -> Expression {
    let mut expr = Expression::parameter(DataType::object("T", vec![]));
    for step in steps {
        expr = match step {
            Step::Member(name) => expr.member(name.clone()),
            Step::Index(i) => expr.index(*i),
            Step::Each => expr.each(),
        };
    }
    expr
}

proptest! {
    #[test]
    fn smash_length_matches_step_count(steps in proptest::collection::vec(step_strategy(), 0..12)) {
        let expr = build(&steps);
        let links = smash(&expr).unwrap();
        prop_assert_eq!(links.len(), steps.len() + 1);
    }

    #[test]
    fn display_is_deterministic(steps in proptest::collection::vec(step_strategy(), 0..12)) {
        let expr = build(&steps);
        prop_assert_eq!(expr.to_string(), expr.clone().to_string());
    }

    #[test]
    fn wildcard_count_matches_each_steps(steps in proptest::collection::vec(step_strategy(), 0..12)) {
        let expr = build(&steps);
        let expected = steps.iter().filter(|s| matches!(s, Step::Each)).count();
        prop_assert_eq!(wildcard_count(&expr), expected);
    }

    #[test]
    fn rebasing_onto_bare_parameter_is_identity(steps in proptest::collection::vec(step_strategy(), 0..12)) {
        let expr = build(&steps);
        let root = Expression::parameter(DataType::object("T", vec![]));
        let rebased = substitute_parameter(&expr, &root);
        prop_assert_eq!(rebased, expr);
    }

    #[test]
    fn rebasing_prepends_root_chain(steps in proptest::collection::vec(step_strategy(), 1..8)) {
        let expr = build(&steps);
        let root = Expression::parameter(DataType::object("T", vec![])).member("inner");
        let rebased = substitute_parameter(&expr, &root);
        let expected = format!("$.inner{}", expr.to_string().trim_start_matches('$'));
        prop_assert_eq!(rebased.to_string(), expected);
    }
}
