//! Aggregator configurations
//!
//! Visibility and grouping metadata: conditional disabling, conditional
//! hiding, and named conditional aggregation. Aggregators never contribute
//! generated code; they annotate the tree for surface layers that render or
//! group fields.
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

/// An aggregator rule attached to a configuration node
#[derive(Debug, Clone)]
pub struct AggregatorConfiguration {
    ty: DataType,
    condition: Option<Expression>,
    kind: AggregatorKind,
}

/// Variant-specific aggregator payload
#[derive(Debug, Clone)]
pub enum AggregatorKind {
    /// The target is disabled whenever the condition holds
    DisableIf,
    /// The target is hidden whenever the condition holds
    HideIf,
    /// The target participates in a named aggregate, optionally conditioned
    ConditionalAggregator { name: String },
}

impl AggregatorConfiguration {
    pub fn disable_if(ty: DataType, condition: Expression) -> Self {
        Self {
            ty,
            condition: Some(condition),
            kind: AggregatorKind::DisableIf,
        }
    }

    pub fn hide_if(ty: DataType, condition: Expression) -> Self {
        Self {
            ty,
            condition: Some(condition),
            kind: AggregatorKind::HideIf,
        }
    }

    pub fn conditional_aggregator(
        ty: DataType,
        name: impl Into<String>,
        condition: Option<Expression>,
    ) -> Self {
        Self {
            ty,
            condition,
            kind: AggregatorKind::ConditionalAggregator { name: name.into() },
        }
    }

    pub fn ty(&self) -> &DataType {
        &self.ty
    }

    pub fn condition(&self) -> Option<&Expression> {
        self.condition.as_ref()
    }

    pub fn kind(&self) -> &AggregatorKind {
        &self.kind
    }

    /// Rebase the condition so it starts from a new root
    pub fn to_root(&self, path: &Expression) -> Self {
        Self {
            ty: self.ty.clone(),
            condition: self
                .condition
                .as_ref()
                .map(|c| substitute_parameter(c, path)),
            kind: self.kind.clone(),
        }
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
            kind: rebased.kind,
        })
    }

    /// Substitute recorded array aliases in the condition
    pub fn resolve_aliases(&self, aliases: &[ArrayAlias]) -> Self {
        Self {
            ty: self.ty.clone(),
            condition: self.condition.as_ref().map(|c| resolve_aliases(c, aliases)),
            kind: self.kind.clone(),
        }
    }

    /// Return a configuration with an additional AND-ed guard condition
    pub fn if_also(&self, extra: Expression) -> Self {
        Self {
            ty: self.ty.clone(),
            condition: Some(and_conditions(self.condition.clone(), extra)),
            kind: self.kind.clone(),
        }
    }

    /// The navigation chains the condition depends upon
    pub fn dependencies(&self) -> Vec<Expression> {
        self.condition
            .as_ref()
            .map(collect_dependencies)
            .unwrap_or_default()
    }

    /// Aggregators affect visibility metadata only; they never materialize
    /// into generated code
    pub fn apply(&self, _path: &Expression, _aliases: &[ArrayAlias]) -> Result<Option<Expression>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataType;

    fn a_type() -> DataType {
        DataType::object("A", vec![("n", DataType::Int)])
    }

    #[test]
    fn test_apply_contributes_no_code() {
        let config = AggregatorConfiguration::disable_if(
            DataType::Int,
            Expression::parameter(a_type()).member("n").eq(Expression::int(0)),
        );
        let path = Expression::parameter(a_type()).member("n");
        assert!(config.apply(&path, &[]).unwrap().is_none());
    }

    #[test]
    fn test_conditional_aggregator_keeps_name() {
        let config =
            AggregatorConfiguration::conditional_aggregator(DataType::Int, "totals", None);
        match config.kind() {
            AggregatorKind::ConditionalAggregator { name } => assert_eq!(name, "totals"),
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_if_also_on_bare_aggregator() {
        let config = AggregatorConfiguration::conditional_aggregator(DataType::Int, "totals", None)
            .if_also(Expression::bool(true));
        assert_eq!(config.condition().unwrap().to_string(), "true");
    }
}
