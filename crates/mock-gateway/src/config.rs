use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Address to listen on (e.g., "127.0.0.1:3000")
    pub bind: String,
    /// Path of the single GET endpoint
    pub route: String,
    /// Steady-state requests per second
    pub rate_per_sec: u64,
    /// Requests admitted back to back from a full bucket
    pub burst: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            route: "/test".to_string(),
            rate_per_sec: 100,
            burst: 200,
        }
    }
}

impl GatewayConfig {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: GatewayConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.route.starts_with('/') {
            anyhow::bail!("route must start with '/' (got {})", self.route);
        }
        Ok(())
    }
}
