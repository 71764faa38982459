//! Access-chain decomposition and the simple-link classifier
//!
//! A chain is the linear spine of single-step navigations from a lambda
//! parameter outward. `smash` flattens an expression into that spine;
//! `is_simple_link_of_chain` decides whether a node is pure navigation or an
//! opaque computation, which gates whether downstream tooling may treat it as
//! an addressable path.
//!
//! Copyright (c) 2025 Mutado Team
//! Licensed under the Apache-2.0 license

use crate::expr::ast::Expression;
use crate::types::DataType;
use crate::{Error, Result};

/// Flatten an access chain into its ordered sequence of atomic links
///
/// The returned slice is parent-to-child: the first element is always the
/// chain's `Parameter`, the last is the expression itself. Fails on any node
/// that has no navigation base and is not a parameter.
pub fn smash(expr: &Expression) -> Result<Vec<&Expression>> {
    let mut links = Vec::new();
    let mut current = expr;
    loop {
        links.push(current);
        match current {
            Expression::Parameter(_) => break,
            _ => match current.base() {
                Some(base) => current = base,
                None => {
                    return Err(Error::unsupported(current.shape(), "chain decomposition"));
                }
            },
        }
    }
    links.reverse();
    Ok(links)
}

/// Classify whether an expression is one pure navigation link over a valid
/// receiver chain
///
/// A bare parameter is always a valid chain root. Member and array-index
/// accesses, indexer accesses, and the whitelisted `each`/`current`/
/// `template_index`/`where_` calls are links when their receiver is itself a
/// valid chain. A `length` access is a link only over an array receiver;
/// string length is an opaque computation in this model. Everything else
/// (literals, binary/unary operations, conversions) is not a link.
pub fn is_simple_link_of_chain(expr: &Expression) -> bool {
    match expr {
        Expression::Parameter(_) => true,
        Expression::Member { base, .. }
        | Expression::Index { base, .. }
        | Expression::Each { base }
        | Expression::Current { base }
        | Expression::TemplateIndex { base }
        | Expression::Indexer { base, .. }
        | Expression::Where { base, .. } => is_simple_link_of_chain(base),
        Expression::Length { base } => {
            matches!(base.static_type(), Ok(ty) if ty.is_array()) && is_simple_link_of_chain(base)
        }
        Expression::Convert { .. }
        | Expression::Literal(_)
        | Expression::Binary { .. }
        | Expression::Unary { .. } => false,
    }
}

/// The static type a simple chain yields, or `None` when the expression is
/// not a simple chain or does not type-check
pub fn chain_type(expr: &Expression) -> Option<DataType> {
    if !is_simple_link_of_chain(expr) {
        return None;
    }
    expr.static_type().ok()
}
