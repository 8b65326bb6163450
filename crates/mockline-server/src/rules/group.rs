//! Execution of a condition group against a call.

use super::operators::OperatorTable;
use crate::call::Call;
use crate::endpoint::ConditionGroup;
use crate::substitution::{Substituter, STATUS_CODE_KEY};

impl ConditionGroup {
    /// Evaluate the conditions in order and, if all pass, apply the group's
    /// actions to `call`. Returns whether the group fired.
    ///
    /// A group without conditions never fires. Variant selection is
    /// first-writer-wins per call.
    pub fn execute(&self, call: &mut Call, operators: &OperatorTable, substituter: &Substituter) -> bool {
        if self.conditions.is_empty() {
            call.trace.info(format!(
                "SKIPPED condition group {}. No condition to process",
                self.name
            ));
            return false;
        }

        call.trace
            .info(format!("Processing condition group {}", self.name));
        for condition in &self.conditions {
            if !condition.evaluate(&call.request, operators, &call.trace) {
                call.trace.info(format!(
                    "Condition group {} failed at condition {}",
                    self.name, condition.name
                ));
                return false;
            }
        }

        call.trace
            .info(format!("Condition group {} passed. Starting assignment", self.name));

        if !self.target_variant_id.is_empty() {
            if call.is_claimed(STATUS_CODE_KEY) {
                call.trace.info(format!(
                    "Condition group {}: response already selected. No override",
                    self.name
                ));
            } else {
                call.active_variant = Some(self.target_variant_id.clone());
                call.claim(STATUS_CODE_KEY);
                call.trace.info(format!(
                    "Condition group {} selected response {}",
                    self.name, self.target_variant_id
                ));
            }
        }

        if self.call_upstream {
            call.trace.info(format!(
                "Condition group {} requested the actual endpoint",
                self.name
            ));
            call.use_upstream = true;
        }

        for assignment in &self.assignments {
            if assignment.expression.trim().is_empty() {
                call.trace.info(format!(
                    "Param {} assignment skipped. Blank value",
                    assignment.param.key
                ));
                continue;
            }
            if self.target_variant_id.is_empty() {
                call.trace.error(format!(
                    "Param {} assignment skipped. Group selects no response",
                    assignment.param.key
                ));
                continue;
            }
            substituter.process(
                call,
                &self.target_variant_id,
                &assignment.param,
                &assignment.expression,
            );
        }

        true
    }
}
