//! Fluent rule-authoring surface
//!
//! The consumer-facing API over the tree engine: declare a target path,
//! optionally under conditions, and attach what should happen there. Filter
//! calls embedded in the target are extracted into guard conditions, the
//! cleaned path is resolved through the traveler (creating nodes on demand),
//! and any array aliases discovered en route are resolved into the attached
//! rule before it lands on its node.
//!
//! Copyright (c) 2025 Mutado Team
//! Licensed under the Apache-2.0 license

use std::sync::Arc;

use tracing::debug;

use crate::compile::{compile_converter, compile_validator, CompiledConverter, CompiledValidator};
use crate::error::Severity;
use crate::expr::ast::Expression;
use crate::expr::filters::extract_filters;
use crate::expr::rewrite::{substitute_parameter, ArrayAlias};
use crate::recording::Recorder;
use crate::rules::{
    and_conditions, AggregatorConfiguration, MutatorConfiguration, ValidatorConfiguration,
};
use crate::tree::node::{ConfigTree, NodeId};
use crate::tree::traveler::TreeTraveler;
use crate::types::DataType;
use crate::Result;

/// Builder of one configuration tree
pub struct TreeConfigurator {
    tree: ConfigTree,
}

/// A resolved target node accepting rule declarations
pub struct Target<'a> {
    configurator: &'a mut TreeConfigurator,
    node: NodeId,
    node_type: DataType,
    guard: Option<Expression>,
    aliases: Vec<ArrayAlias>,
    rebase: Option<Expression>,
}

/// A sub-configurator whose rule lambdas are rooted at a subtree
pub struct Scoped<'a> {
    configurator: &'a mut TreeConfigurator,
    base_path: Expression,
    guard: Option<Expression>,
    aliases: Vec<ArrayAlias>,
}

impl TreeConfigurator {
    pub fn new(configurator_kind: impl Into<String>, root_type: DataType) -> Self {
        Self {
            tree: ConfigTree::new(configurator_kind, root_type),
        }
    }

    /// The root parameter expression for authoring paths over this tree
    pub fn root(&self) -> Expression {
        Expression::parameter(self.tree.root_type().clone())
    }

    /// Resolve a target path, extracting filters and creating nodes on demand
    pub fn target(&mut self, path: Expression) -> Result<Target<'_>> {
        debug!(path = %path, "declaring target");
        let (clean, filters) = extract_filters(&path)?;
        let travelled = TreeTraveler::new(&mut self.tree, true).travel(&clean)?;
        let node = travelled
            .node
            .expect("creating traversal always resolves a node");
        let mut guard = None;
        for filter in filters.into_iter().flatten() {
            guard = Some(and_conditions(guard, filter));
        }
        let node_type = self.tree.node_type(node).clone();
        Ok(Target {
            configurator: self,
            node,
            node_type,
            guard,
            aliases: travelled.aliases,
            rebase: None,
        })
    }

    /// Scope declarations under a subtree; attached rule lambdas are written
    /// against the subtree's type and rebased onto the full path
    pub fn go_to(&mut self, path: Expression) -> Result<Scoped<'_>> {
        let (clean, filters) = extract_filters(&path)?;
        let travelled = TreeTraveler::new(&mut self.tree, true).travel(&clean)?;
        travelled
            .node
            .expect("creating traversal always resolves a node");
        let mut guard = None;
        for filter in filters.into_iter().flatten() {
            guard = Some(and_conditions(guard, filter));
        }
        Ok(Scoped {
            configurator: self,
            base_path: clean,
            guard,
            aliases: travelled.aliases,
        })
    }

    pub fn tree(&self) -> &ConfigTree {
        &self.tree
    }

    pub fn into_tree(self) -> ConfigTree {
        self.tree
    }

    /// Finalize the tree and synthesize its conversion and validation plans
    pub fn compile(
        self,
        recorder: Arc<dyn Recorder>,
    ) -> Result<(CompiledConverter, CompiledValidator)> {
        let tree = self.tree;
        let converter = compile_converter(&tree, recorder.clone())?;
        let validator = compile_validator(&tree, recorder)?;
        Ok((converter, validator))
    }
}

impl<'a> Scoped<'a> {
    /// Resolve a target path written against the subtree's type
    pub fn target(&mut self, relative: Expression) -> Result<Target<'_>> {
        let full = substitute_parameter(&relative, &self.base_path);
        let (clean, filters) = extract_filters(&full)?;
        let travelled = TreeTraveler::new(&mut self.configurator.tree, true).travel(&clean)?;
        let node = travelled
            .node
            .expect("creating traversal always resolves a node");
        let mut guard = self.guard.clone();
        for filter in filters.into_iter().flatten() {
            guard = Some(and_conditions(guard, filter));
        }
        let mut aliases = self.aliases.clone();
        aliases.extend(travelled.aliases);
        let node_type = self.configurator.tree.node_type(node).clone();
        Ok(Target {
            configurator: &mut *self.configurator,
            node,
            node_type,
            guard,
            aliases,
            rebase: Some(self.base_path.clone()),
        })
    }
}

impl<'a> Target<'a> {
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn node_type(&self) -> &DataType {
        &self.node_type
    }

    /// Assign the value expression to this target
    pub fn set(self, value: Expression) -> Self {
        let ty = self.node_type.clone();
        self.mutator(MutatorConfiguration::equals_to(ty, value))
    }

    /// Assign the value expression when the condition holds
    pub fn set_if(self, condition: Expression, value: Expression) -> Self {
        let ty = self.node_type.clone();
        self.mutator(MutatorConfiguration::equals_to_if(ty, condition, value))
    }

    /// Write an explicit null when the condition holds
    pub fn nullify_if(self, condition: Expression) -> Self {
        let ty = self.node_type.clone();
        self.mutator(MutatorConfiguration::nullify_if(ty, condition))
    }

    /// Pre-size this target array to the length expression
    pub fn set_array_length(self, length: Expression) -> Self {
        let ty = self.node_type.clone();
        self.mutator(MutatorConfiguration::set_array_length(ty, length))
    }

    /// Designate the source array driving wildcard iteration at this target
    pub fn set_source_array(self, source: Expression) -> Self {
        let ty = self.node_type.clone();
        self.mutator(MutatorConfiguration::set_source_array(ty, source))
    }

    /// The target is invalid whenever the condition holds
    pub fn invalid_if(
        self,
        condition: Expression,
        message: impl Into<String>,
        severity: Severity,
    ) -> Self {
        let ty = self.node_type.clone();
        self.validator(ValidatorConfiguration::invalid_if(
            ty, condition, message, severity,
        ))
    }

    /// The target must carry a value
    pub fn required(self, message: impl Into<String>, severity: Severity) -> Self {
        let ty = self.node_type.clone();
        self.validator(ValidatorConfiguration::required(ty, message, severity))
    }

    /// The target must carry a value when the condition holds
    pub fn required_if(
        self,
        condition: Expression,
        message: impl Into<String>,
        severity: Severity,
    ) -> Self {
        let ty = self.node_type.clone();
        self.validator(ValidatorConfiguration::required_if(
            ty, condition, message, severity,
        ))
    }

    /// Disable this target whenever the condition holds
    pub fn disabled_if(self, condition: Expression) -> Self {
        let ty = self.node_type.clone();
        self.aggregator(AggregatorConfiguration::disable_if(ty, condition))
    }

    /// Hide this target whenever the condition holds
    pub fn hidden_if(self, condition: Expression) -> Self {
        let ty = self.node_type.clone();
        self.aggregator(AggregatorConfiguration::hide_if(ty, condition))
    }

    /// Group this target into a named aggregate
    pub fn aggregate_if(self, name: impl Into<String>, condition: Option<Expression>) -> Self {
        let ty = self.node_type.clone();
        self.aggregator(AggregatorConfiguration::conditional_aggregator(
            ty, name, condition,
        ))
    }

    fn mutator(self, config: MutatorConfiguration) -> Self {
        let mut config = config;
        if let Some(rebase) = &self.rebase {
            config = config.to_root(rebase);
        }
        if let Some(guard) = &self.guard {
            config = config.if_also(guard.clone());
        }
        let config = config.resolve_aliases(&self.aliases);
        self.configurator.tree.attach_mutator(self.node, config);
        self
    }

    fn validator(self, config: ValidatorConfiguration) -> Self {
        let mut config = config;
        if let Some(rebase) = &self.rebase {
            config = config.to_root(rebase);
        }
        if let Some(guard) = &self.guard {
            config = config.if_also(guard.clone());
        }
        let config = config.resolve_aliases(&self.aliases);
        self.configurator.tree.attach_validator(self.node, config);
        self
    }

    fn aggregator(self, config: AggregatorConfiguration) -> Self {
        let mut config = config;
        if let Some(rebase) = &self.rebase {
            config = config.to_root(rebase);
        }
        if let Some(guard) = &self.guard {
            config = config.if_also(guard.clone());
        }
        let config = config.resolve_aliases(&self.aliases);
        self.configurator.tree.attach_aggregator(self.node, config);
        self
    }
}
