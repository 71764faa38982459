//! Validator configurations
//!
//! Correctness-check rule payloads. A validator materializes into a check
//! condition evaluated at every concrete binding of its node path; a firing
//! check produces a finding with the node's concrete field path, the
//! declared message, and a severity.
//!
//! Copyright (c) 2025 Mutado Team
//! Licensed under the Apache-2.0 license

use crate::error::Severity;
use crate::expr::ast::Expression;
use crate::expr::rewrite::{
    collect_dependencies, resolve_aliases, substitute_parameter, ArrayAlias,
};
use crate::rules::{and_conditions, CompositionPerformer};
use crate::types::DataType;
use crate::Result;

/// A validator rule attached to a configuration node
#[derive(Debug, Clone)]
pub struct ValidatorConfiguration {
    ty: DataType,
    condition: Option<Expression>,
    kind: ValidatorKind,
}

/// Variant-specific validator payload
#[derive(Debug, Clone)]
pub enum ValidatorKind {
    /// The target is invalid whenever the condition holds
    InvalidIf { message: String, severity: Severity },
    /// The target must carry a value; the optional condition guards the check
    RequiredIf { message: String, severity: Severity },
}

/// The executable check fragment a validator materializes into
#[derive(Debug, Clone)]
pub struct Check {
    pub condition: Expression,
    pub message: String,
    pub severity: Severity,
}

impl ValidatorConfiguration {
    pub fn invalid_if(
        ty: DataType,
        condition: Expression,
        message: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            ty,
            condition: Some(condition),
            kind: ValidatorKind::InvalidIf {
                message: message.into(),
                severity,
            },
        }
    }

    pub fn required(ty: DataType, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            ty,
            condition: None,
            kind: ValidatorKind::RequiredIf {
                message: message.into(),
                severity,
            },
        }
    }

    pub fn required_if(
        ty: DataType,
        condition: Expression,
        message: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            ty,
            condition: Some(condition),
            kind: ValidatorKind::RequiredIf {
                message: message.into(),
                severity,
            },
        }
    }

    pub fn ty(&self) -> &DataType {
        &self.ty
    }

    pub fn condition(&self) -> Option<&Expression> {
        self.condition.as_ref()
    }

    pub fn kind(&self) -> &ValidatorKind {
        &self.kind
    }

    /// Rebase all contained lambdas so they start from a new root
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

    /// Substitute recorded array aliases in every contained lambda
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

    /// The navigation chains this rule's condition depends upon
    pub fn dependencies(&self) -> Vec<Expression> {
        self.condition
            .as_ref()
            .map(collect_dependencies)
            .unwrap_or_default()
    }

    /// Materialize into an executable check against the given target path
    pub fn apply(&self, path: &Expression, aliases: &[ArrayAlias]) -> Result<Option<Check>> {
        let resolved = self.resolve_aliases(aliases);
        let target = resolve_aliases(path, aliases);
        match &resolved.kind {
            ValidatorKind::InvalidIf { message, severity } => {
                let Some(condition) = resolved.condition else {
                    return Ok(None);
                };
                Ok(Some(Check {
                    condition,
                    message: message.clone(),
                    severity: *severity,
                }))
            }
            ValidatorKind::RequiredIf { message, severity } => {
                let missing = target
                    .clone()
                    .eq(Expression::null())
                    .or(target.eq(Expression::string("")));
                let condition = match resolved.condition {
                    Some(guard) => guard.and(missing),
                    None => missing,
                };
                Ok(Some(Check {
                    condition,
                    message: message.clone(),
                    severity: *severity,
                }))
            }
        }
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
    fn test_invalid_if_requires_its_condition() {
        let config = ValidatorConfiguration::invalid_if(
            DataType::Int,
            Expression::parameter(a_type())
                .member("bs")
                .each()
                .member("n")
                .lt(Expression::int(0)),
            "quantity must not be negative",
            Severity::Error,
        );
        let path = Expression::parameter(a_type()).member("bs").each().member("n");
        let check = config.apply(&path, &[]).unwrap().unwrap();
        assert_eq!(check.severity, Severity::Error);
        assert_eq!(check.condition.to_string(), "($.bs.each().n < 0)");
    }

    #[test]
    fn test_required_builds_missing_condition() {
        let config =
            ValidatorConfiguration::required(DataType::String, "value is required", Severity::Error);
        let path = Expression::parameter(a_type()).member("bs").each().member("s");
        let check = config.apply(&path, &[]).unwrap().unwrap();
        assert_eq!(
            check.condition.to_string(),
            "(($.bs.each().s == null) || ($.bs.each().s == ''))"
        );
    }

    #[test]
    fn test_required_if_guards_the_check() {
        let guard = Expression::parameter(a_type())
            .member("bs")
            .each()
            .member("n")
            .gt(Expression::int(0));
        let config = ValidatorConfiguration::required_if(
            DataType::String,
            guard,
            "label required for positive quantities",
            Severity::Warning,
        );
        let path = Expression::parameter(a_type()).member("bs").each().member("s");
        let check = config.apply(&path, &[]).unwrap().unwrap();
        assert!(check.condition.to_string().starts_with("(($.bs.each().n > 0) &&"));
    }

    #[test]
    fn test_to_root_and_back_preserves_condition() {
        let condition = Expression::parameter(b_type()).member("n").eq(Expression::int(5));
        let config = ValidatorConfiguration::invalid_if(
            DataType::Int,
            condition,
            "matched",
            Severity::Info,
        );
        let root = Expression::parameter(a_type()).member("bs").index(0);
        let rebased = config.to_root(&root);
        assert_eq!(
            rebased.condition().unwrap().to_string(),
            "($.bs[0].n == 5)"
        );
        let again = rebased.to_root(&Expression::parameter(a_type()));
        assert_eq!(
            again.condition().unwrap().to_string(),
            rebased.condition().unwrap().to_string()
        );
    }
}
