//! Runtime configuration consulted once per top-level compilation.

use serde::{Deserialize, Serialize};

/// Supplies the FastAGI host used by host-dependent blocks.
pub trait ConfigurationProvider: Send + Sync {
    fn fast_agi_host(&self) -> String;
}

/// Fixed configuration, typically deserialized from a settings file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticConfiguration {
    pub fast_agi_host: String,
}

impl Default for StaticConfiguration {
    fn default() -> Self {
        Self {
            fast_agi_host: "127.0.0.1".to_string(),
        }
    }
}

impl StaticConfiguration {
    pub fn with_fast_agi_host(host: impl Into<String>) -> Self {
        Self {
            fast_agi_host: host.into(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl ConfigurationProvider for StaticConfiguration {
    fn fast_agi_host(&self) -> String {
        self.fast_agi_host.clone()
    }
}
