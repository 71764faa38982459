//! Mutator configurations
//!
//! Value-producing rule payloads: equality assignment, conditional
//! assignment, conditional nullification, array pre-sizing, and the source
//! array designation that drives wildcard iteration.
//!
//! Copyright (c) 2025 Mutado Team
//! Licensed under the Apache-2.0 license

use crate::expr::ast::Expression;
use crate::expr::rewrite::{
    collect_dependencies, resolve_aliases, substitute_parameter, ArrayAlias,
};
use crate::rules::{and_conditions, CompositionPerformer};
use crate::types::DataType;
use crate::Result;

/// A mutator rule attached to a configuration node
#[derive(Debug, Clone)]
pub struct MutatorConfiguration {
    ty: DataType,
    condition: Option<Expression>,
    kind: MutatorKind,
}

/// Variant-specific mutator payload
#[derive(Debug, Clone)]
pub enum MutatorKind {
    /// Assign the value expression to the target path
    EqualsTo { value: Expression },
    /// Write an explicit null when the condition holds
    NullifyIf,
    /// Pre-size the target array to the length expression
    SetArrayLength { length: Expression },
    /// Designate the source array driving wildcard iteration
    SetSourceArray { source: Expression },
}

/// The executable fragment a mutator materializes into
#[derive(Debug, Clone)]
pub struct Mutation {
    pub action: MutationAction,
    pub condition: Option<Expression>,
}

/// What a mutation writes at its target
#[derive(Debug, Clone)]
pub enum MutationAction {
    Set(Expression),
    SetNull,
    SetArrayLength(Expression),
}

impl MutatorConfiguration {
    pub fn equals_to(ty: DataType, value: Expression) -> Self {
        Self {
            ty,
            condition: None,
            kind: MutatorKind::EqualsTo { value },
        }
    }

    pub fn equals_to_if(ty: DataType, condition: Expression, value: Expression) -> Self {
        Self {
            ty,
            condition: Some(condition),
            kind: MutatorKind::EqualsTo { value },
        }
    }

    pub fn nullify_if(ty: DataType, condition: Expression) -> Self {
        Self {
            ty,
            condition: Some(condition),
            kind: MutatorKind::NullifyIf,
        }
    }

    pub fn set_array_length(ty: DataType, length: Expression) -> Self {
        Self {
            ty,
            condition: None,
            kind: MutatorKind::SetArrayLength { length },
        }
    }

    pub fn set_source_array(ty: DataType, source: Expression) -> Self {
        Self {
            ty,
            condition: None,
            kind: MutatorKind::SetSourceArray { source },
        }
    }

    /// The node type this rule is declared against
    pub fn ty(&self) -> &DataType {
        &self.ty
    }

    pub fn condition(&self) -> Option<&Expression> {
        self.condition.as_ref()
    }

    pub fn kind(&self) -> &MutatorKind {
        &self.kind
    }

    /// Rebase all contained lambdas so they start from a new root
    pub fn to_root(&self, path: &Expression) -> Self {
        self.map_lambdas(|l| substitute_parameter(l, path))
    }

    /// Translate this configuration to apply against a converted type
    pub fn mutate(
        &self,
        target: &DataType,
        path: &Expression,
        performer: &dyn CompositionPerformer,
    ) -> Result<Self> {
        let rebased = self.to_root(path);
        Ok(Self {
            ty: target.clone(),
            condition: rebased
                .condition
                .as_ref()
                .map(|c| performer.perform(c, target))
                .transpose()?,
            kind: match &rebased.kind {
                MutatorKind::EqualsTo { value } => MutatorKind::EqualsTo {
                    value: performer.perform(value, target)?,
                },
                MutatorKind::NullifyIf => MutatorKind::NullifyIf,
                MutatorKind::SetArrayLength { length } => MutatorKind::SetArrayLength {
                    length: performer.perform(length, target)?,
                },
                MutatorKind::SetSourceArray { source } => MutatorKind::SetSourceArray {
                    source: performer.perform(source, target)?,
                },
            },
        })
    }

    /// Substitute recorded array aliases in every contained lambda
    pub fn resolve_aliases(&self, aliases: &[ArrayAlias]) -> Self {
        self.map_lambdas(|l| resolve_aliases(l, aliases))
    }

    /// Return a configuration with an additional AND-ed guard condition
    pub fn if_also(&self, extra: Expression) -> Self {
        Self {
            ty: self.ty.clone(),
            condition: Some(and_conditions(self.condition.clone(), extra)),
            kind: self.kind.clone(),
        }
    }

    /// The navigation chains this rule's lambdas depend upon, deduplicated
    /// by their canonical textual form
    pub fn dependencies(&self) -> Vec<Expression> {
        let mut out = Vec::new();
        let mut seen = std::collections::HashSet::new();
        for lambda in self.lambdas() {
            for dep in collect_dependencies(lambda) {
                if seen.insert(dep.to_string()) {
                    out.push(dep);
                }
            }
        }
        out
    }

    /// Materialize into an executable assignment fragment, or `None` when
    /// this configuration contributes no generated code
    pub fn apply(&self, aliases: &[ArrayAlias]) -> Result<Option<Mutation>> {
        let resolved = self.resolve_aliases(aliases);
        let action = match resolved.kind {
            MutatorKind::EqualsTo { value } => MutationAction::Set(value),
            MutatorKind::NullifyIf => MutationAction::SetNull,
            MutatorKind::SetArrayLength { length } => MutationAction::SetArrayLength(length),
            MutatorKind::SetSourceArray { .. } => return Ok(None),
        };
        Ok(Some(Mutation {
            action,
            condition: resolved.condition,
        }))
    }

    fn lambdas(&self) -> Vec<&Expression> {
        let mut lambdas = Vec::new();
        if let Some(condition) = &self.condition {
            lambdas.push(condition);
        }
        match &self.kind {
            MutatorKind::EqualsTo { value } => lambdas.push(value),
            MutatorKind::NullifyIf => {}
            MutatorKind::SetArrayLength { length } => lambdas.push(length),
            MutatorKind::SetSourceArray { source } => lambdas.push(source),
        }
        lambdas
    }

    fn map_lambdas(&self, f: impl Fn(&Expression) -> Expression) -> Self {
        Self {
            ty: self.ty.clone(),
            condition: self.condition.as_ref().map(&f),
            kind: match &self.kind {
                MutatorKind::EqualsTo { value } => MutatorKind::EqualsTo { value: f(value) },
                MutatorKind::NullifyIf => MutatorKind::NullifyIf,
                MutatorKind::SetArrayLength { length } => MutatorKind::SetArrayLength {
                    length: f(length),
                },
                MutatorKind::SetSourceArray { source } => MutatorKind::SetSourceArray {
                    source: f(source),
                },
            },
        }
    }
}
