//! Gateway config loader (strict parsing).

pub mod schema;

use std::fs;
use std::io::ErrorKind;

use reqmetrics_core::error::{MetricsError, Result};

pub use schema::{
    GatewayConfig, InterceptorsSection, LogFormat, LoggingSection, MetricsSection, PathLabel,
    SamplerSection, ServerSection,
};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "REQMETRICS_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "reqmetrics.yaml";
/// Environment variable overriding the port of `server.listen`.
pub const PORT_ENV: &str = "PORT";

pub fn load_from_file(path: &str) -> Result<GatewayConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| MetricsError::Internal(format!("read config {path} failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg: GatewayConfig = serde_yaml::from_str(s)
        .map_err(|e| MetricsError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Load from `$REQMETRICS_CONFIG`, else `reqmetrics.yaml`. Only a missing
/// file at the default path falls back to built-in defaults.
pub fn load() -> Result<GatewayConfig> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return load_from_file(&path);
    }
    match fs::read_to_string(DEFAULT_CONFIG_PATH) {
        Ok(s) => load_from_str(&s),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            let cfg = GatewayConfig::default();
            cfg.validate()?;
            Ok(cfg)
        }
        Err(e) => Err(MetricsError::Internal(format!(
            "read config {DEFAULT_CONFIG_PATH} failed: {e}"
        ))),
    }
}
