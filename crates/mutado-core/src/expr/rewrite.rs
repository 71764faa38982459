//! Expression rewriting utilities
//!
//! Rebasing a lambda onto a new root, substituting recorded array aliases,
//! folding constants, and collecting the navigation chains a fragment
//! depends on. Every rewrite returns a new expression; nothing is mutated in
//! place, so fragments can be shared and rebased across subtrees freely.
//!
//! Copyright (c) 2025 Mutado Team
//! Licensed under the Apache-2.0 license

use std::collections::HashSet;

use crate::expr::ast::{BinaryOp, Expression, UnaryOp};
use crate::expr::chain::is_simple_link_of_chain;
use crate::types::Literal;

/// A recorded equivalence between a concrete indexed/keyed path and its
/// generalized wildcard-element counterpart
///
/// Produced by the tree traveler when a concrete access falls back to an
/// existing `each` child; consumed by `resolve_aliases` to reconcile rules
/// written at different specificity levels.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayAlias {
    /// The concrete indexed or keyed expression, rooted at the tree root
    pub from: Expression,
    /// The equivalent wildcard-element expression
    pub to: Expression,
}

/// Replace the lambda's root parameter with the given expression
///
/// `where_` predicates keep their own scoped element parameter; substitution
/// descends into the filtered receiver but never into the predicate body.
pub fn substitute_parameter(expr: &Expression, replacement: &Expression) -> Expression {
    match expr {
        Expression::Parameter(_) => replacement.clone(),
        Expression::Member { base, name } => Expression::Member {
            base: Box::new(substitute_parameter(base, replacement)),
            name: name.clone(),
        },
        Expression::Index { base, index } => Expression::Index {
            base: Box::new(substitute_parameter(base, replacement)),
            index: Box::new(substitute_parameter(index, replacement)),
        },
        Expression::Each { base } => Expression::Each {
            base: Box::new(substitute_parameter(base, replacement)),
        },
        Expression::Current { base } => Expression::Current {
            base: Box::new(substitute_parameter(base, replacement)),
        },
        Expression::TemplateIndex { base } => Expression::TemplateIndex {
            base: Box::new(substitute_parameter(base, replacement)),
        },
        Expression::Indexer { base, args } => Expression::Indexer {
            base: Box::new(substitute_parameter(base, replacement)),
            args: args
                .iter()
                .map(|a| substitute_parameter(a, replacement))
                .collect(),
        },
        Expression::Convert { base, target } => Expression::Convert {
            base: Box::new(substitute_parameter(base, replacement)),
            target: target.clone(),
        },
        Expression::Length { base } => Expression::Length {
            base: Box::new(substitute_parameter(base, replacement)),
        },
        Expression::Where { base, predicate } => Expression::Where {
            base: Box::new(substitute_parameter(base, replacement)),
            predicate: predicate.clone(),
        },
        Expression::Literal(lit) => Expression::Literal(lit.clone()),
        Expression::Binary { op, left, right } => Expression::Binary {
            op: *op,
            left: Box::new(substitute_parameter(left, replacement)),
            right: Box::new(substitute_parameter(right, replacement)),
        },
        Expression::Unary { op, operand } => Expression::Unary {
            op: *op,
            operand: Box::new(substitute_parameter(operand, replacement)),
        },
    }
}

/// Substitute every subexpression structurally equal to an alias source with
/// its wildcard-element target, bottom-up
pub fn resolve_aliases(expr: &Expression, aliases: &[ArrayAlias]) -> Expression {
    if aliases.is_empty() {
        return expr.clone();
    }
    let rebuilt = match expr {
        Expression::Parameter(_) | Expression::Literal(_) => expr.clone(),
        Expression::Member { base, name } => Expression::Member {
            base: Box::new(resolve_aliases(base, aliases)),
            name: name.clone(),
        },
        Expression::Index { base, index } => Expression::Index {
            base: Box::new(resolve_aliases(base, aliases)),
            index: Box::new(resolve_aliases(index, aliases)),
        },
        Expression::Each { base } => Expression::Each {
            base: Box::new(resolve_aliases(base, aliases)),
        },
        Expression::Current { base } => Expression::Current {
            base: Box::new(resolve_aliases(base, aliases)),
        },
        Expression::TemplateIndex { base } => Expression::TemplateIndex {
            base: Box::new(resolve_aliases(base, aliases)),
        },
        Expression::Indexer { base, args } => Expression::Indexer {
            base: Box::new(resolve_aliases(base, aliases)),
            args: args.iter().map(|a| resolve_aliases(a, aliases)).collect(),
        },
        Expression::Convert { base, target } => Expression::Convert {
            base: Box::new(resolve_aliases(base, aliases)),
            target: target.clone(),
        },
        Expression::Length { base } => Expression::Length {
            base: Box::new(resolve_aliases(base, aliases)),
        },
        Expression::Where { base, predicate } => Expression::Where {
            base: Box::new(resolve_aliases(base, aliases)),
            predicate: predicate.clone(),
        },
        Expression::Binary { op, left, right } => Expression::Binary {
            op: *op,
            left: Box::new(resolve_aliases(left, aliases)),
            right: Box::new(resolve_aliases(right, aliases)),
        },
        Expression::Unary { op, operand } => Expression::Unary {
            op: *op,
            operand: Box::new(resolve_aliases(operand, aliases)),
        },
    };
    for alias in aliases {
        if rebuilt == alias.from {
            return alias.to.clone();
        }
    }
    rebuilt
}

/// Fold an expression into a constant, when it is one
///
/// Indexer parameters and array indices go through this before they become
/// part of a node-identity key.
pub fn fold_constant(expr: &Expression) -> Option<Literal> {
    match expr {
        Expression::Literal(lit) => Some(lit.clone()),
        Expression::Unary { op, operand } => {
            let folded = fold_constant(operand)?;
            match op {
                UnaryOp::Neg => match folded {
                    Literal::Int(i) => Some(Literal::Int(-i)),
                    Literal::Float(x) => Some(Literal::Float(-x)),
                    _ => None,
                },
                UnaryOp::Not => match folded {
                    Literal::Bool(b) => Some(Literal::Bool(!b)),
                    _ => None,
                },
            }
        }
        Expression::Binary { op, left, right } => {
            let l = fold_constant(left)?;
            let r = fold_constant(right)?;
            match (op, l, r) {
                (BinaryOp::Add, Literal::Int(a), Literal::Int(b)) => Some(Literal::Int(a + b)),
                (BinaryOp::Sub, Literal::Int(a), Literal::Int(b)) => Some(Literal::Int(a - b)),
                (BinaryOp::Mul, Literal::Int(a), Literal::Int(b)) => Some(Literal::Int(a * b)),
                (BinaryOp::Div, Literal::Int(a), Literal::Int(b)) if b != 0 => {
                    Some(Literal::Int(a / b))
                }
                _ => None,
            }
        }
        _ => None,
    }
}

/// Collect the maximal pure navigation chains a fragment depends upon,
/// deduplicated by their canonical textual form
pub fn collect_dependencies(expr: &Expression) -> Vec<Expression> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    collect_into(expr, &mut out, &mut seen);
    out
}

fn collect_into(expr: &Expression, out: &mut Vec<Expression>, seen: &mut HashSet<String>) {
    if is_simple_link_of_chain(expr) {
        if seen.insert(expr.to_string()) {
            out.push(expr.clone());
        }
        return;
    }
    match expr {
        Expression::Parameter(_) | Expression::Literal(_) => {}
        Expression::Member { base, .. }
        | Expression::Each { base }
        | Expression::Current { base }
        | Expression::TemplateIndex { base }
        | Expression::Convert { base, .. }
        | Expression::Length { base } => collect_into(base, out, seen),
        Expression::Index { base, index } => {
            collect_into(base, out, seen);
            collect_into(index, out, seen);
        }
        Expression::Indexer { base, args } => {
            collect_into(base, out, seen);
            for arg in args {
                collect_into(arg, out, seen);
            }
        }
        Expression::Where { base, predicate } => {
            collect_into(base, out, seen);
            collect_into(predicate, out, seen);
        }
        Expression::Binary { left, right, .. } => {
            collect_into(left, out, seen);
            collect_into(right, out, seen);
        }
        Expression::Unary { operand, .. } => collect_into(operand, out, seen),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataType;

    fn b_type() -> DataType {
        DataType::object("B", vec![("n", DataType::Int), ("s", DataType::String)])
    }

    fn a_type() -> DataType {
        DataType::object("A", vec![("bs", DataType::array(b_type()))])
    }

    #[test]
    fn test_substitute_parameter_rebases_chain() {
        let rel = Expression::parameter(b_type()).member("n");
        let root = Expression::parameter(a_type()).member("bs").each();
        let rebased = substitute_parameter(&rel, &root);
        assert_eq!(rebased.to_string(), "$.bs.each().n");
    }

    #[test]
    fn test_substitute_keeps_predicate_parameter_scoped() {
        let pred = Expression::parameter(b_type()).member("n").eq(Expression::int(5));
        let filtered = Expression::parameter(a_type()).member("bs").where_(pred.clone());
        let new_root = Expression::parameter(a_type());
        let rebased = substitute_parameter(&filtered, &new_root);
        match rebased {
            Expression::Where { predicate, .. } => assert_eq!(*predicate, pred),
            other => panic!("expected Where, got {:?}", other.shape()),
        }
    }

    #[test]
    fn test_resolve_aliases_rewrites_concrete_index() {
        let concrete = Expression::parameter(a_type()).member("bs").index(0);
        let wildcard = Expression::parameter(a_type()).member("bs").each();
        let aliases = vec![ArrayAlias {
            from: concrete.clone(),
            to: wildcard.clone(),
        }];

        let cond = concrete.member("n").eq(Expression::int(5));
        let resolved = resolve_aliases(&cond, &aliases);
        assert_eq!(resolved.to_string(), "($.bs.each().n == 5)");
    }

    #[test]
    fn test_fold_constant_arithmetic() {
        let expr = Expression::int(2).add(Expression::int(3));
        assert_eq!(fold_constant(&expr), Some(Literal::Int(5)));
        let dynamic = Expression::parameter(a_type()).member("bs").length();
        assert_eq!(fold_constant(&dynamic), None);
    }

    #[test]
    fn test_collect_dependencies_dedups_by_display() {
        let n = Expression::parameter(a_type()).member("bs").each().member("n");
        let cond = n.clone().eq(Expression::int(5)).and(n.clone().gt(Expression::int(0)));
        let deps = collect_dependencies(&cond);
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].to_string(), "$.bs.each().n");
    }

    #[test]
    fn test_round_trip_rebase_preserves_meaning() {
        let cond = Expression::parameter(b_type()).member("n").eq(Expression::int(5));
        let root = Expression::parameter(a_type()).member("bs").index(0);
        let rebased = substitute_parameter(&cond, &root);
        assert_eq!(rebased.to_string(), "($.bs[0].n == 5)");

        // Rebasing an already-rooted fragment onto a bare parameter is the
        // identity modulo the substituted root.
        let back = substitute_parameter(&rebased, &Expression::parameter(a_type()));
        assert_eq!(back.to_string(), rebased.to_string());
    }
}
