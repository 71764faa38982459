//! Expression engine for access paths, values, and conditions
//!
//! This module provides the typed expression IR shared by rule targets,
//! values, and conditions, together with the rewriting passes (rebasing,
//! alias resolution, filter extraction) and the interpretation backend that
//! executes fragments against `serde_json::Value`.
//!
//! Copyright (c) 2025 Mutado Team
//! Licensed under the Apache-2.0 license

pub mod ast;
pub mod builder;
pub mod chain;
pub mod eval;
pub mod filters;
pub mod rewrite;

#[cfg(test)]
mod prop_tests;

pub use ast::{BinaryOp, Expression, UnaryOp};
pub use chain::{chain_type, is_simple_link_of_chain, smash};
pub use eval::{assign, concrete_path, enumerate_bindings, is_truthy, wildcard_count, Evaluator};
pub use filters::extract_filters;
pub use rewrite::{
    collect_dependencies, fold_constant, resolve_aliases, substitute_parameter, ArrayAlias,
};
