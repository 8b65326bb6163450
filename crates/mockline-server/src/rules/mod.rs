//! Rule evaluation: operators, conditions and condition groups.
//!
//! ## Module Structure
//!
//! - `operators`: `OperatorTable` and the standard comparison functions
//! - `condition`: `Condition::evaluate`
//! - `group`: `ConditionGroup::execute`

mod condition;
mod group;
mod operators;


#[allow(unused_imports)]
pub use operators::{
    contains, ends_with, equals_to, greater_than, greater_than_or_equals_to, less_than,
    less_than_or_equals_to, not_equals_to, starts_with, OperatorFn, OperatorTable,
};
