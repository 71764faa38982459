//! Mutado Core - declarative mapping, mutation, and validation over typed
//! expression trees
//!
//! This crate provides the core engine for declaring field-by-field mapping
//! rules, conditional mutation rules, and validation rules over two object
//! models, and compiling them into one executable conversion function plus a
//! parallel validation function.
//!
//! # Main Components
//!
//! - **Expression IR**: a typed AST for access paths, values, and conditions
//! - **Configuration Tree**: path nodes mirroring a data model's shape, each
//!   owning the rules declared against its exact sub-path
//! - **Tree Traveler**: resolves compound access expressions into nodes,
//!   creating them on demand and recording array aliases
//! - **Rule Configurations**: mutators, validators, and aggregators with a
//!   shared rebase/alias/guard capability surface
//! - **Plans**: converter and validation plans interpreted over
//!   `serde_json::Value`
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use mutado_core::{DataType, NullRecorder, Result, TreeConfigurator};
//!
//! fn example() -> Result<()> {
//!     let line = DataType::object("Line", vec![("qty", DataType::Int)]);
//!     let order = DataType::object("Order", vec![("lines", DataType::array(line))]);
//!
//!     let mut configurator = TreeConfigurator::new("orders", order);
//!     let root = configurator.root();
//!     configurator
//!         .target(root.clone().member("lines").each().member("qty"))?
//!         .set(root.member("lines").each().member("qty"));
//!
//!     let (converter, _validator) = configurator.compile(Arc::new(NullRecorder))?;
//!     let dest = converter.convert(&serde_json::json!({"lines": [{"qty": 3}]}))?;
//!     assert_eq!(dest, serde_json::json!({"lines": [{"qty": 3}]}));
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

pub mod compile;
pub mod configurator;
pub mod error;
pub mod expr;
pub mod recording;
pub mod rules;
pub mod tree;
pub mod types;

// Re-export main types for convenience
pub use error::{Error, Result, Severity};
pub use types::{DataType, FieldDef, Key, Literal, ObjectType};

pub use expr::{
    collect_dependencies, extract_filters, is_simple_link_of_chain, resolve_aliases,
    substitute_parameter, ArrayAlias, BinaryOp, Expression, Evaluator, UnaryOp,
};

pub use tree::{Attached, ConfigTree, Edge, NodeId, Travelled, TreeTraveler, ARRAY_LENGTH};

pub use rules::{
    AggregatorConfiguration, AggregatorKind, Check, CompositionPerformer, Mutation,
    MutationAction, MutatorConfiguration, MutatorKind, ValidatorConfiguration, ValidatorKind,
};

pub use compile::{
    collect_visibility, compile_converter, compile_validator, CompiledConverter,
    CompiledValidator, ValidationError, ValidationReport, VisibilityRule,
};

pub use configurator::{Scoped, Target, TreeConfigurator};

pub use recording::{CoverageRecorder, NullRecorder, RecordNode, Recorder};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_error_creation() {
        let err = Error::StructuralMismatch {
            expected: "Order".to_string(),
            actual: "Line".to_string(),
        };
        assert!(err.to_string().contains("Order"));
    }
}
