//! Evaluation of a single condition.

use super::operators::OperatorTable;
use crate::call::TraceLog;
use crate::endpoint::Condition;
use crate::flatten::FlatMap;

impl Condition {
    /// Evaluate against the flattened request.
    ///
    /// A missing request key fails the condition. An operator name that is
    /// not in `operators` passes it.
    pub fn evaluate(&self, request: &FlatMap, operators: &OperatorTable, trace: &TraceLog) -> bool {
        let Some(field) = request.get(&self.variable_key) else {
            trace.error(format!(
                "Condition {}: request parameter {} not found",
                self.name, self.variable_key
            ));
            return false;
        };

        let Some(op) = operators.get(&self.operator) else {
            trace.error(format!(
                "Condition {}: operator {} not found, treating as passed",
                self.name, self.operator
            ));
            return true;
        };

        let passed = op(&field.value, &self.value, self.datatype);
        trace.info(format!(
            "Condition {}: {} [{}] {} {} -> {}",
            self.name, self.variable_key, field.value, self.operator, self.value, passed
        ));
        passed
    }
}
