//! Plan compilation and execution
//!
//! Build-time walk of a finalized configuration tree that combines every
//! node's rules, in declaration order, into a converter plan and a parallel
//! validation plan. Both plans are immutable once built and safe to execute
//! concurrently against independent documents; the tree itself is no longer
//! consulted at run time.
//!
//! Steps whose target crosses wildcard elements iterate their driving source
//! array (an explicit source-array designation, or the first wildcard chain
//! found in the step's value or condition), binding one shared index per
//! wildcard depth.
//!
//! Copyright (c) 2025 Mutado Team
//! Licensed under the Apache-2.0 license

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::Severity;
use crate::expr::ast::Expression;
use crate::expr::eval::{
    assign, concrete_path, enumerate_bindings, is_truthy, slot_mut, wildcard_count, Evaluator,
};
use crate::recording::Recorder;
use crate::rules::{AggregatorKind, MutationAction, MutatorKind};
use crate::tree::node::ConfigTree;
use crate::{Error, Result};

/// One resolved assignment of a converter plan
#[derive(Debug, Clone)]
struct ConvertStep {
    target: Expression,
    action: MutationAction,
    condition: Option<Expression>,
    /// Driving source array per wildcard depth of the target
    depth_bases: Vec<Expression>,
}

/// An executable conversion function synthesized from a configuration tree
pub struct CompiledConverter {
    id: String,
    steps: Vec<ConvertStep>,
    recorder: Arc<dyn Recorder>,
}

/// One resolved check of a validation plan
#[derive(Debug, Clone)]
struct CheckStep {
    target: Expression,
    condition: Expression,
    message: String,
    severity: Severity,
}

/// An executable validation function synthesized from a configuration tree
pub struct CompiledValidator {
    id: String,
    steps: Vec<CheckStep>,
    recorder: Arc<dyn Recorder>,
}

/// A validation finding against a concrete field path
#[derive(Debug, Clone, Serialize)]
pub struct ValidationError {
    pub field_path: String,
    pub message: String,
    pub severity: Severity,
}

/// Aggregated outcome of one validation run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
}

/// Visibility/grouping metadata collected from a tree's aggregators
#[derive(Debug, Clone)]
pub struct VisibilityRule {
    pub path: String,
    pub kind: AggregatorKind,
    pub condition: Option<Expression>,
}

impl ValidationReport {
    /// Whether no finding reaches `Error` severity
    pub fn is_valid(&self) -> bool {
        self.errors.iter().all(|e| e.severity < Severity::Error)
    }

    /// The worst severity among the findings
    pub fn worst(&self) -> Option<Severity> {
        self.errors.iter().map(|e| e.severity).max()
    }
}

/// Synthesize the conversion function for a configuration tree
pub fn compile_converter(
    tree: &ConfigTree,
    recorder: Arc<dyn Recorder>,
) -> Result<CompiledConverter> {
    let id = tree.configurator_kind().to_string();
    let mut entries = Vec::new();

    for node in tree.node_ids() {
        let target = tree.path(node).clone();
        let node_source = tree.mutators(node).iter().find_map(|a| match a.config.kind() {
            MutatorKind::SetSourceArray { source } => Some(source.clone()),
            _ => None,
        });
        for attached in tree.mutators(node) {
            let Some(mutation) = attached.config.apply(&[])? else {
                continue;
            };
            let depth = wildcard_count(&target);
            let mut bases = BTreeMap::new();
            if let Some(source) = &node_source {
                bases.entry(0).or_insert_with(|| source.clone());
            }
            match &mutation.action {
                MutationAction::Set(value) | MutationAction::SetArrayLength(value) => {
                    collect_each_bases(value, &mut bases);
                }
                MutationAction::SetNull => {}
            }
            if let Some(condition) = &mutation.condition {
                collect_each_bases(condition, &mut bases);
            }
            let depth_bases = (0..depth)
                .map(|d| {
                    bases.get(&d).cloned().ok_or_else(|| Error::Evaluation {
                        message: format!("no driving source array for wildcard depth {}", d),
                        path: target.to_string(),
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            entries.push((
                attached.seq,
                ConvertStep {
                    target: target.clone(),
                    action: mutation.action,
                    condition: mutation.condition,
                    depth_bases,
                },
            ));
        }
    }

    entries.sort_by_key(|(seq, _)| *seq);
    let steps: Vec<_> = entries.into_iter().map(|(_, step)| step).collect();
    debug!(converter = %id, steps = steps.len(), "compiled converter plan");

    for step in &steps {
        recorder.record_compiling(
            &id,
            &step.target.to_string(),
            &action_display(&step.action),
            false,
        );
    }
    for node in tree.node_ids() {
        for attached in tree.aggregators(node) {
            let value = attached
                .config
                .condition()
                .map(|c| c.to_string())
                .unwrap_or_default();
            recorder.record_compiling(&id, &tree.path(node).to_string(), &value, true);
        }
    }

    Ok(CompiledConverter {
        id,
        steps,
        recorder,
    })
}

/// Synthesize the validation function for a configuration tree
pub fn compile_validator(
    tree: &ConfigTree,
    recorder: Arc<dyn Recorder>,
) -> Result<CompiledValidator> {
    let id = tree.configurator_kind().to_string();
    let mut entries = Vec::new();

    for node in tree.node_ids() {
        let target = tree.path(node).clone();
        for attached in tree.validators(node) {
            let Some(check) = attached.config.apply(&target, &[])? else {
                continue;
            };
            entries.push((
                attached.seq,
                CheckStep {
                    target: target.clone(),
                    condition: check.condition,
                    message: check.message,
                    severity: check.severity,
                },
            ));
        }
    }

    entries.sort_by_key(|(seq, _)| *seq);
    let steps: Vec<_> = entries.into_iter().map(|(_, step)| step).collect();
    debug!(validator = %id, steps = steps.len(), "compiled validation plan");

    for step in &steps {
        recorder.record_compiling(&id, &step.target.to_string(), &step.condition.to_string(), false);
    }

    Ok(CompiledValidator {
        id,
        steps,
        recorder,
    })
}

/// Collect the visibility metadata declared through aggregators
pub fn collect_visibility(tree: &ConfigTree) -> Vec<VisibilityRule> {
    let mut entries = Vec::new();
    for node in tree.node_ids() {
        for attached in tree.aggregators(node) {
            entries.push((
                attached.seq,
                VisibilityRule {
                    path: tree.path(node).to_string(),
                    kind: attached.config.kind().clone(),
                    condition: attached.config.condition().cloned(),
                },
            ));
        }
    }
    entries.sort_by_key(|(seq, _)| *seq);
    entries.into_iter().map(|(_, rule)| rule).collect()
}

impl CompiledConverter {
    /// Run the conversion against one source document
    pub fn convert(&self, source: &Value) -> Result<Value> {
        let mut dest = Value::Null;
        let mut bindings = Vec::new();
        for step in &self.steps {
            self.run_step(step, source, &mut dest, &mut bindings)?;
        }
        if dest.is_null() {
            dest = Value::Object(serde_json::Map::new());
        }
        Ok(dest)
    }

    fn run_step(
        &self,
        step: &ConvertStep,
        source: &Value,
        dest: &mut Value,
        bindings: &mut Vec<usize>,
    ) -> Result<()> {
        if bindings.len() < step.depth_bases.len() {
            let base = &step.depth_bases[bindings.len()];
            let array = Evaluator::new(source).eval(base, bindings)?;
            let len = array.as_array().map(|a| a.len()).unwrap_or(0);
            for i in 0..len {
                bindings.push(i);
                self.run_step(step, source, dest, bindings)?;
                bindings.pop();
            }
            return Ok(());
        }

        let evaluator = Evaluator::new(source);
        if let Some(condition) = &step.condition {
            if !is_truthy(&evaluator.eval(condition, bindings)?) {
                return Ok(());
            }
        }
        match &step.action {
            MutationAction::Set(value) => {
                let value = evaluator.eval(value, bindings)?;
                assign(dest, &step.target, bindings, value)?;
            }
            MutationAction::SetNull => {
                assign(dest, &step.target, bindings, Value::Null)?;
            }
            MutationAction::SetArrayLength(length) => {
                let len = evaluator.eval(length, bindings)?.as_u64().unwrap_or(0) as usize;
                let slot = slot_mut(dest, &step.target, bindings)?;
                if !slot.is_array() {
                    *slot = Value::Array(Vec::new());
                }
                slot.as_array_mut()
                    .expect("slot was just made an array")
                    .resize(len, Value::Null);
            }
        }
        self.recorder.record_executing(
            &self.id,
            &concrete_path(&step.target, bindings),
            &action_display(&step.action),
        );
        Ok(())
    }
}

impl CompiledValidator {
    /// Run the validation against one document
    pub fn validate(&self, data: &Value) -> Result<ValidationReport> {
        let mut report = ValidationReport::default();
        let evaluator = Evaluator::new(data);
        for step in &self.steps {
            for bindings in enumerate_bindings(data, &step.target)? {
                if is_truthy(&evaluator.eval(&step.condition, &bindings)?) {
                    report.errors.push(ValidationError {
                        field_path: concrete_path(&step.target, &bindings),
                        message: step.message.clone(),
                        severity: step.severity,
                    });
                }
            }
            self.recorder.record_executing(
                &self.id,
                &step.target.to_string(),
                &step.condition.to_string(),
            );
        }
        Ok(report)
    }
}

fn action_display(action: &MutationAction) -> String {
    match action {
        MutationAction::Set(value) => value.to_string(),
        MutationAction::SetNull => "null".to_string(),
        MutationAction::SetArrayLength(length) => format!("length = {}", length),
    }
}

/// Map each wildcard depth to the base array chain that drives it
fn collect_each_bases(expr: &Expression, out: &mut BTreeMap<usize, Expression>) {
    match expr {
        Expression::Each { base } | Expression::Current { base } => {
            out.entry(wildcard_count(base)).or_insert_with(|| (**base).clone());
            collect_each_bases(base, out);
        }
        Expression::Member { base, .. }
        | Expression::TemplateIndex { base }
        | Expression::Convert { base, .. }
        | Expression::Length { base }
        | Expression::Where { base, .. } => collect_each_bases(base, out),
        Expression::Index { base, index } => {
            collect_each_bases(base, out);
            collect_each_bases(index, out);
        }
        Expression::Indexer { base, args } => {
            collect_each_bases(base, out);
            for arg in args {
                collect_each_bases(arg, out);
            }
        }
        Expression::Binary { left, right, .. } => {
            collect_each_bases(left, out);
            collect_each_bases(right, out);
        }
        Expression::Unary { operand, .. } => collect_each_bases(operand, out),
        Expression::Parameter(_) | Expression::Literal(_) => {}
    }
}
