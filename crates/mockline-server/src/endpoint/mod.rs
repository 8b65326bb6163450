//! Mock endpoint model and lookup.
//!
//! ## Module Structure
//!
//! - `types`: stored records, resolved endpoint shapes, `EndpointError`
//! - `url`: upstream URL and path template parsing
//! - `cache`: `EndpointCache`, the `(collection, name, method)` lookup

mod cache;
mod types;
mod url;

#[cfg(test)]
mod tests;

pub use cache::{EndpointCache, EndpointSource};
#[allow(unused_imports)]
pub use types::{
    param_id, AssignmentRecord, CallLogEntry, Condition, ConditionGroup, ConditionGroupRecord,
    Endpoint, EndpointError, EndpointRecord, ParameterAssignment, ParsedUrl, PathSegment,
    ResponseParam, ResponseVariant, VariantRecord, DEFAULT_COLLECTION, DEFAULT_VARIANT_NAME,
};
pub use url::{parse_actual_url, path_segments};
