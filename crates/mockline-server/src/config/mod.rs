//! Configuration types for the mockline server.
//!
//! A config file is YAML (JSON is accepted as well). Endpoints may be
//! defined inline or in separate files listed under `endpoint_files`.

mod listen;
mod upstream;

use crate::store::EndpointDefinition;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[allow(unused_imports)]
pub use listen::{ListenConfig, LogFormat, LoggingConfig};
pub use upstream::UpstreamConfig;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub listen: ListenConfig,

    /// Cap on cached endpoints. Absent or non-positive means unlimited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_endpoints: Option<i64>,

    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub endpoints: Vec<EndpointDefinition>,

    /// Extra definition files, each holding a list of endpoints. Relative
    /// paths resolve against the config file's directory.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub endpoint_files: Vec<PathBuf>,
}

impl ServerConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: ServerConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        for file in std::mem::take(&mut config.endpoint_files) {
            let file = if file.is_relative() { base.join(file) } else { file };
            config.endpoints.extend(load_definitions(&file)?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        let mut seen = HashSet::new();
        for definition in &self.endpoints {
            definition.validate().map_err(|e| anyhow::anyhow!(e))?;

            let collection = match definition.collection.trim() {
                "" => crate::endpoint::DEFAULT_COLLECTION.to_string(),
                c => c.to_uppercase(),
            };
            let key = (
                collection,
                definition.name.trim().trim_matches('/').to_uppercase(),
                definition.method.trim().to_uppercase(),
            );
            if !seen.insert(key) {
                anyhow::bail!(
                    "Endpoint {} {} is defined more than once",
                    definition.method,
                    definition.name
                );
            }
        }

        if self.upstream.timeout_secs == 0 {
            anyhow::bail!("upstream.timeout_secs must be greater than zero");
        }
        Ok(())
    }

    pub fn endpoint_limit(&self) -> Option<usize> {
        self.max_endpoints
            .filter(|n| *n > 0)
            .and_then(|n| usize::try_from(n).ok())
    }
}

fn load_definitions(path: &Path) -> Result<Vec<EndpointDefinition>, anyhow::Error> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read endpoint file {}", path.display()))?;
    serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse endpoint file {}", path.display()))
}
