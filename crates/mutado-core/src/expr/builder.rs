//! Path construction from traversal edges
//!
//! Pure functions that, given a base expression and one edge, construct the
//! corresponding extended path expression. The configuration tree uses this
//! when it synthesizes a child node, so a node's path is always its parent's
//! path extended by exactly the connecting edge.
//!
//! Copyright (c) 2025 Mutado Team
//! Licensed under the Apache-2.0 license

use crate::expr::ast::Expression;
use crate::tree::edge::{Edge, ARRAY_LENGTH};
use crate::Result;

/// Construct the path expression reached from `base` through `edge`
///
/// The synthetic array-length member builds a `Length` node over an array
/// base; every other edge maps one-to-one onto its expression shape.
pub fn extend(base: &Expression, edge: &Edge) -> Result<Expression> {
    match edge {
        Edge::Member(name) => {
            if name == ARRAY_LENGTH && base.static_type()?.is_array() {
                Ok(base.clone().length())
            } else {
                Ok(base.clone().member(name.clone()))
            }
        }
        Edge::ArrayIndex(index) => Ok(base.clone().index(*index)),
        Edge::Each => Ok(base.clone().each()),
        Edge::Indexer(keys) => Ok(base.clone().indexer(
            keys.iter()
                .map(|k| Expression::literal(k.to_literal()))
                .collect(),
        )),
        Edge::TypeConversion(target) => Ok(base.clone().convert(target.clone())),
    }
}
