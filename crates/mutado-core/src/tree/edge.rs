//! Traversal edges of a configuration tree
//!
//! An edge is one atomic step of a data-model access path. Edges key the
//! child map of every configuration node, so equality is structural: two
//! edges with the same tag and payload are interchangeable regardless of
//! creation site.
//!
//! Copyright (c) 2025 Mutado Team
//! Licensed under the Apache-2.0 license

use std::fmt;

use crate::types::{DataType, Key};

/// The synthetic member name of an array's length
pub const ARRAY_LENGTH: &str = "length";

/// One traversal step between a configuration node and a child
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Edge {
    /// Member access by name
    Member(String),
    /// Array element access by a constant index
    ArrayIndex(i64),
    /// Wildcard element of a sequence
    Each,
    /// Indexer access with constant parameters
    Indexer(Vec<Key>),
    /// Explicit conversion to a target type
    TypeConversion(DataType),
}

impl Edge {
    pub fn member(name: impl Into<String>) -> Self {
        Edge::Member(name.into())
    }

    pub fn array_length() -> Self {
        Edge::Member(ARRAY_LENGTH.to_string())
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edge::Member(name) => write!(f, ".{}", name),
            Edge::ArrayIndex(index) => write!(f, "[{}]", index),
            Edge::Each => write!(f, ".each()"),
            Edge::Indexer(keys) => {
                write!(f, "[")?;
                for (i, key) in keys.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", key)?;
                }
                write!(f, "]")
            }
            Edge::TypeConversion(target) => write!(f, " as {}", target),
        }
    }
}
