//! Comparison operators, keyed by name.
//!
//! `left` is the request value, `right` the literal from the condition.
//! Numeric datatypes compare numerically, `BOOL` compares as booleans, and
//! everything else compares as case-insensitive text.

use crate::flatten::{DataType, ScalarValue};
use std::collections::HashMap;

pub type OperatorFn = fn(&ScalarValue, &str, DataType) -> bool;

#[derive(Clone, Default)]
pub struct OperatorTable {
    ops: HashMap<String, OperatorFn>,
}

impl OperatorTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn standard() -> Self {
        Self::empty()
            .with("EQUALS_TO", equals_to)
            .with("NOT_EQUALS_TO", not_equals_to)
            .with("LESS_THAN", less_than)
            .with("LESS_THAN_OR_EQUALS_TO", less_than_or_equals_to)
            .with("GREATER_THAN", greater_than)
            .with("GREATER_THAN_OR_EQUALS_TO", greater_than_or_equals_to)
            .with("CONTAINS", contains)
            .with("STARTS_WITH", starts_with)
            .with("ENDS_WITH", ends_with)
    }

    /// Add or replace an operator. Names are case-insensitive.
    pub fn with(mut self, name: &str, op: OperatorFn) -> Self {
        self.ops.insert(name.trim().to_uppercase(), op);
        self
    }

    pub fn get(&self, name: &str) -> Option<OperatorFn> {
        self.ops.get(&name.trim().to_uppercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl std::fmt::Debug for OperatorTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.ops.keys().collect();
        names.sort();
        f.debug_list().entries(names).finish()
    }
}

fn right_value(right: &str) -> ScalarValue {
    ScalarValue::Str(right.to_string())
}

fn upper(value: &ScalarValue) -> String {
    value.to_string().to_uppercase()
}

pub fn equals_to(left: &ScalarValue, right: &str, datatype: DataType) -> bool {
    let r = right_value(right);
    match datatype {
        DataType::Bool => left.to_bool() == r.to_bool(),
        DataType::Float64 => left.to_f64() == r.to_f64(),
        DataType::Int => left.to_i64() == r.to_i64(),
        _ => upper(left) == right.to_uppercase(),
    }
}

pub fn not_equals_to(left: &ScalarValue, right: &str, datatype: DataType) -> bool {
    !equals_to(left, right, datatype)
}

/// Relational operators on `BOOL` only distinguish equal from not equal:
/// strict forms test inequality, inclusive forms test equality.
fn relational(
    left: &ScalarValue,
    right: &str,
    datatype: DataType,
    inclusive: bool,
    ord: fn(std::cmp::Ordering) -> bool,
) -> bool {
    let r = right_value(right);
    match datatype {
        DataType::Bool => (left.to_bool() == r.to_bool()) == inclusive,
        DataType::Float64 => left
            .to_f64()
            .partial_cmp(&r.to_f64())
            .map(ord)
            .unwrap_or(false),
        DataType::Int => ord(left.to_i64().cmp(&r.to_i64())),
        _ => ord(upper(left).cmp(&right.to_uppercase())),
    }
}

pub fn less_than(left: &ScalarValue, right: &str, datatype: DataType) -> bool {
    relational(left, right, datatype, false, |o| o.is_lt())
}

pub fn less_than_or_equals_to(left: &ScalarValue, right: &str, datatype: DataType) -> bool {
    relational(left, right, datatype, true, |o| o.is_le())
}

pub fn greater_than(left: &ScalarValue, right: &str, datatype: DataType) -> bool {
    relational(left, right, datatype, false, |o| o.is_gt())
}

pub fn greater_than_or_equals_to(left: &ScalarValue, right: &str, datatype: DataType) -> bool {
    relational(left, right, datatype, true, |o| o.is_ge())
}

pub fn contains(left: &ScalarValue, right: &str, _datatype: DataType) -> bool {
    upper(left).contains(&right.to_uppercase())
}

pub fn starts_with(left: &ScalarValue, right: &str, _datatype: DataType) -> bool {
    upper(left).starts_with(&right.to_uppercase())
}

pub fn ends_with(left: &ScalarValue, right: &str, _datatype: DataType) -> bool {
    upper(left).ends_with(&right.to_uppercase())
}
