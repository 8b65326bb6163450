// Library exports for the binary, integration tests and benchmarks

pub mod call;
pub mod config;
pub mod endpoint;
pub mod flatten;
pub mod metrics;
pub mod rules;
pub mod server;
pub mod store;
pub mod substitution;

#[cfg(test)]
mod fixtures;
