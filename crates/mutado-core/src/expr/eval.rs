//! Expression evaluation against JSON data
//!
//! The interpretation backend for compiled plans: synchronous, CPU-bound
//! evaluation of expression fragments over `serde_json::Value`, plus the
//! auto-vivifying write path used when a converter materializes its
//! destination document.
//!
//! Wildcard elements are resolved through a binding environment: the k-th
//! wildcard of a chain (counting from the root) reads `bindings[k]`, so every
//! chain in one step iterates its arrays in lockstep.
//!
//! Copyright (c) 2025 Mutado Team
//! Licensed under the Apache-2.0 license

use std::cmp::Ordering;

use serde_json::{Map, Value};

use crate::expr::ast::{BinaryOp, Expression, UnaryOp};
use crate::expr::chain::smash;
use crate::expr::rewrite::fold_constant;
use crate::types::Literal;
use crate::{Error, Result};

/// Evaluator over one root document
pub struct Evaluator<'a> {
    root: &'a Value,
}

impl<'a> Evaluator<'a> {
    pub fn new(root: &'a Value) -> Self {
        Self { root }
    }

    /// Evaluate an expression under the given wildcard bindings
    ///
    /// Absent members, out-of-range indices, and out-of-range bindings all
    /// read as `Null`. Absence is data, not a fault; shape errors were ruled
    /// out when the tree was built.
    pub fn eval(&self, expr: &Expression, bindings: &[usize]) -> Result<Value> {
        match expr {
            Expression::Parameter(_) => Ok(self.root.clone()),
            Expression::Member { base, name } => {
                let base_value = self.eval(base, bindings)?;
                Ok(base_value.get(name.as_str()).cloned().unwrap_or(Value::Null))
            }
            Expression::Index { base, index } => {
                let base_value = self.eval(base, bindings)?;
                let index_value = self.eval(index, bindings)?;
                let idx = index_value.as_i64().unwrap_or(-1);
                if idx < 0 {
                    return Ok(Value::Null);
                }
                Ok(base_value
                    .get(idx as usize)
                    .cloned()
                    .unwrap_or(Value::Null))
            }
            Expression::Each { base } | Expression::Current { base } => {
                let depth = wildcard_count(base);
                let Some(&idx) = bindings.get(depth) else {
                    return Ok(Value::Null);
                };
                let base_value = self.eval(base, bindings)?;
                Ok(base_value.get(idx).cloned().unwrap_or(Value::Null))
            }
            Expression::Indexer { base, args } => {
                let base_value = self.eval(base, bindings)?;
                let Some(key) = args.first() else {
                    return Ok(Value::Null);
                };
                let key_value = self.eval(key, bindings)?;
                let result = match &key_value {
                    Value::String(s) => base_value.get(s.as_str()),
                    Value::Number(n) => n
                        .as_u64()
                        .and_then(|i| base_value.get(i as usize)),
                    _ => None,
                };
                Ok(result.cloned().unwrap_or(Value::Null))
            }
            Expression::Convert { base, .. } => self.eval(base, bindings),
            Expression::Length { base } => {
                let base_value = self.eval(base, bindings)?;
                match base_value {
                    Value::Array(items) => Ok(Value::from(items.len() as i64)),
                    Value::String(s) => Ok(Value::from(s.chars().count() as i64)),
                    _ => Ok(Value::Null),
                }
            }
            Expression::Where { base, predicate } => {
                let base_value = self.eval(base, bindings)?;
                let Value::Array(items) = base_value else {
                    return Ok(Value::Array(Vec::new()));
                };
                let mut kept = Vec::new();
                for item in items {
                    let keep = is_truthy(&Evaluator::new(&item).eval(predicate, &[])?);
                    if keep {
                        kept.push(item);
                    }
                }
                Ok(Value::Array(kept))
            }
            Expression::Literal(lit) => Ok(lit.to_value()),
            Expression::Binary { op, left, right } => self.eval_binary(*op, left, right, bindings),
            Expression::Unary { op, operand } => {
                let value = self.eval(operand, bindings)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!is_truthy(&value))),
                    UnaryOp::Neg => match value.as_f64() {
                        Some(x) if value.is_i64() => Ok(Value::from(-(x as i64))),
                        Some(x) => Ok(Value::from(-x)),
                        None => Ok(Value::Null),
                    },
                }
            }
            Expression::TemplateIndex { .. } => Err(Error::unsupported(expr.shape(), "evaluation")),
        }
    }

    fn eval_binary(
        &self,
        op: BinaryOp,
        left: &Expression,
        right: &Expression,
        bindings: &[usize],
    ) -> Result<Value> {
        match op {
            BinaryOp::And => {
                let left_value = self.eval(left, bindings)?;
                if !is_truthy(&left_value) {
                    return Ok(Value::Bool(false));
                }
                let right_value = self.eval(right, bindings)?;
                Ok(Value::Bool(is_truthy(&right_value)))
            }
            BinaryOp::Or => {
                let left_value = self.eval(left, bindings)?;
                if is_truthy(&left_value) {
                    return Ok(Value::Bool(true));
                }
                let right_value = self.eval(right, bindings)?;
                Ok(Value::Bool(is_truthy(&right_value)))
            }
            _ => {
                let l = self.eval(left, bindings)?;
                let r = self.eval(right, bindings)?;
                apply_binary(op, &l, &r)
            }
        }
    }
}

fn apply_binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(values_equal(left, right))),
        BinaryOp::Ne => Ok(Value::Bool(!values_equal(left, right))),
        BinaryOp::Lt => Ok(compare(left, right, |o| o == Ordering::Less)),
        BinaryOp::Le => Ok(compare(left, right, |o| o != Ordering::Greater)),
        BinaryOp::Gt => Ok(compare(left, right, |o| o == Ordering::Greater)),
        BinaryOp::Ge => Ok(compare(left, right, |o| o != Ordering::Less)),
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
            arithmetic(op, left, right)
        }
        BinaryOp::And | BinaryOp::Or => unreachable!("short-circuited in eval_binary"),
    }
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
    if let (Some(a), Some(b)) = (left.as_i64(), right.as_i64()) {
        let result = match op {
            BinaryOp::Add => a.checked_add(b),
            BinaryOp::Sub => a.checked_sub(b),
            BinaryOp::Mul => a.checked_mul(b),
            BinaryOp::Div => {
                if b == 0 {
                    None
                } else {
                    a.checked_div(b)
                }
            }
            _ => unreachable!(),
        };
        return Ok(result.map(Value::from).unwrap_or(Value::Null));
    }
    if let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) {
        let result = match op {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
            _ => unreachable!(),
        };
        return Ok(Value::from(result));
    }
    Ok(Value::Null)
}

/// Truthiness of a JSON value: null and false are falsy, a number is truthy
/// unless zero, a string unless empty, arrays and objects always
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|x| x != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Equality with numeric coercion (1 == 1.0)
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        },
        _ => left == right,
    }
}

fn compare(left: &Value, right: &Value, check: impl Fn(Ordering) -> bool) -> Value {
    let ordering = match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => None,
        },
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    };
    match ordering {
        Some(o) => Value::Bool(check(o)),
        None => Value::Bool(false),
    }
}

/// Number of wildcard elements in an access chain
pub fn wildcard_count(expr: &Expression) -> usize {
    match expr {
        Expression::Each { base } | Expression::Current { base } => 1 + wildcard_count(base),
        other => other.base().map(wildcard_count).unwrap_or(0),
    }
}

/// Navigate to the slot a target path designates, creating intermediate
/// objects and arrays on demand, and return it mutably
pub fn slot_mut<'v>(
    dest: &'v mut Value,
    target: &Expression,
    bindings: &[usize],
) -> Result<&'v mut Value> {
    let links = smash(target)?;
    let mut slot = dest;
    for link in &links[1..] {
        match link {
            Expression::Member { name, .. } => {
                slot = ensure_member(slot, name);
            }
            Expression::Index { index, .. } => {
                let idx = fold_constant(index)
                    .and_then(|lit| match lit {
                        Literal::Int(i) if i >= 0 => Some(i as usize),
                        _ => None,
                    })
                    .ok_or_else(|| Error::Evaluation {
                        message: "target index is not a non-negative constant".to_string(),
                        path: target.to_string(),
                    })?;
                slot = ensure_element(slot, idx);
            }
            Expression::Each { base } | Expression::Current { base } => {
                let depth = wildcard_count(base);
                let idx = *bindings.get(depth).ok_or_else(|| Error::Evaluation {
                    message: "unbound wildcard element in target path".to_string(),
                    path: target.to_string(),
                })?;
                slot = ensure_element(slot, idx);
            }
            Expression::Convert { .. } => {}
            other => {
                return Err(Error::unsupported(other.shape(), "target navigation"));
            }
        }
    }
    Ok(slot)
}

/// Write a value at a target path, auto-vivifying intermediate containers
pub fn assign(
    dest: &mut Value,
    target: &Expression,
    bindings: &[usize],
    value: Value,
) -> Result<()> {
    *slot_mut(dest, target, bindings)? = value;
    Ok(())
}

fn ensure_member<'v>(slot: &'v mut Value, name: &str) -> &'v mut Value {
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    slot.as_object_mut()
        .expect("slot was just made an object")
        .entry(name.to_string())
        .or_insert(Value::Null)
}

fn ensure_element(slot: &mut Value, idx: usize) -> &mut Value {
    if !slot.is_array() {
        *slot = Value::Array(Vec::new());
    }
    let items = slot.as_array_mut().expect("slot was just made an array");
    while items.len() <= idx {
        items.push(Value::Null);
    }
    &mut items[idx]
}

/// Enumerate every concrete wildcard binding a chain reaches in the data
///
/// A chain without wildcards yields exactly one empty binding.
pub fn enumerate_bindings(root: &Value, target: &Expression) -> Result<Vec<Vec<usize>>> {
    let links = smash(target)?;
    let evaluator = Evaluator::new(root);
    let mut partials: Vec<Vec<usize>> = vec![Vec::new()];
    for link in &links {
        if let Expression::Each { base } | Expression::Current { base } = link {
            let mut expanded = Vec::new();
            for binding in &partials {
                let array = evaluator.eval(base, binding)?;
                let len = array.as_array().map(|a| a.len()).unwrap_or(0);
                for i in 0..len {
                    let mut next = binding.clone();
                    next.push(i);
                    expanded.push(next);
                }
            }
            partials = expanded;
        }
    }
    Ok(partials)
}

/// Render a wildcard path with its bindings substituted as concrete indices
pub fn concrete_path(target: &Expression, bindings: &[usize]) -> String {
    rebind(target, bindings).to_string()
}

fn rebind(expr: &Expression, bindings: &[usize]) -> Expression {
    match expr {
        Expression::Each { base } | Expression::Current { base } => {
            let depth = wildcard_count(base);
            let idx = bindings.get(depth).copied().unwrap_or(0);
            rebind(base, bindings).index(idx as i64)
        }
        Expression::Member { base, name } => rebind(base, bindings).member(name.clone()),
        Expression::Index { base, index } => {
            rebind(base, bindings).index_expr((**index).clone())
        }
        Expression::Indexer { base, args } => rebind(base, bindings).indexer(args.clone()),
        Expression::Convert { base, target } => rebind(base, bindings).convert(target.clone()),
        Expression::Length { base } => rebind(base, bindings).length(),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use crate::types::DataType;

    fn b_type() -> DataType {
        DataType::object("B", vec![("n", DataType::Int), ("s", DataType::String)])
    }

    fn a_type() -> DataType {
        DataType::object("A", vec![("bs", DataType::array(b_type()))])
    }

    fn sample() -> Value {
        json!({
            "bs": [
                {"n": 5, "s": "first"},
                {"n": 7, "s": "second"}
            ]
        })
    }

    #[test]
    fn test_member_and_index_navigation() {
        let data = sample();
        let evaluator = Evaluator::new(&data);
        let path = Expression::parameter(a_type()).member("bs").index(1).member("s");
        assert_eq!(evaluator.eval(&path, &[]).unwrap(), json!("second"));
    }

    #[test]
    fn test_absent_member_reads_null() {
        let data = json!({});
        let evaluator = Evaluator::new(&data);
        let path = Expression::parameter(a_type()).member("bs").index(0).member("s");
        assert_eq!(evaluator.eval(&path, &[]).unwrap(), Value::Null);
    }

    #[test]
    fn test_wildcard_binding() {
        let data = sample();
        let evaluator = Evaluator::new(&data);
        let path = Expression::parameter(a_type()).member("bs").each().member("n");
        assert_eq!(evaluator.eval(&path, &[0]).unwrap(), json!(5));
        assert_eq!(evaluator.eval(&path, &[1]).unwrap(), json!(7));
    }

    #[test]
    fn test_where_filters_elements() {
        let data = sample();
        let evaluator = Evaluator::new(&data);
        let pred = Expression::parameter(b_type()).member("n").eq(Expression::int(5));
        let filtered = Expression::parameter(a_type()).member("bs").where_(pred);
        let result = evaluator.eval(&filtered, &[]).unwrap();
        assert_eq!(result, json!([{"n": 5, "s": "first"}]));
    }

    #[test]
    fn test_length_and_arithmetic() {
        let data = sample();
        let evaluator = Evaluator::new(&data);
        let expr = Expression::parameter(a_type())
            .member("bs")
            .length()
            .add(Expression::int(1));
        assert_eq!(evaluator.eval(&expr, &[]).unwrap(), json!(3));
    }

    #[test]
    fn test_comparison_and_logic() {
        let data = sample();
        let evaluator = Evaluator::new(&data);
        let n = Expression::parameter(a_type()).member("bs").index(0).member("n");
        let cond = n.clone().eq(Expression::int(5)).and(n.gt(Expression::int(4)));
        assert_eq!(evaluator.eval(&cond, &[]).unwrap(), json!(true));
    }

    #[test]
    fn test_assign_auto_vivifies() {
        let mut dest = Value::Null;
        let target = Expression::parameter(a_type()).member("bs").index(1).member("s");
        assign(&mut dest, &target, &[], json!("x")).unwrap();
        assert_eq!(dest, json!({"bs": [null, {"s": "x"}]}));
    }

    #[test]
    fn test_assign_wildcard_uses_binding() {
        let mut dest = Value::Null;
        let target = Expression::parameter(a_type()).member("bs").each().member("n");
        assign(&mut dest, &target, &[2], json!(9)).unwrap();
        assert_eq!(dest, json!({"bs": [null, null, {"n": 9}]}));
    }

    #[test]
    fn test_enumerate_bindings() {
        let data = sample();
        let path = Expression::parameter(a_type()).member("bs").each().member("n");
        let bindings = enumerate_bindings(&data, &path).unwrap();
        assert_eq!(bindings, vec![vec![0], vec![1]]);

        let flat = Expression::parameter(a_type()).member("bs");
        assert_eq!(enumerate_bindings(&data, &flat).unwrap(), vec![Vec::<usize>::new()]);
    }

    #[test]
    fn test_concrete_path_substitutes_bindings() {
        let path = Expression::parameter(a_type()).member("bs").each().member("s");
        assert_eq!(concrete_path(&path, &[1]), "$.bs[1].s");
    }
}
