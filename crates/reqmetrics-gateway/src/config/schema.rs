use std::net::SocketAddr;

use serde::Deserialize;
use reqmetrics_core::error::{MetricsError, Result};
use reqmetrics_core::intercept::InterceptorToggles;
use reqmetrics_core::metric::{Buckets, DEFAULT_BUCKETS};

use crate::ops::HEALTHZ_PATH;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub metrics: MetricsSection,

    #[serde(default)]
    pub sampler: SamplerSection,

    #[serde(default)]
    pub logging: LoggingSection,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            metrics: MetricsSection::default(),
            sampler: SamplerSection::default(),
            logging: LoggingSection::default(),
        }
    }
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(MetricsError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }

        self.server.validate()?;
        self.metrics.validate()?;
        self.sampler.validate()?;

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr(None)?;
        Ok(())
    }

    /// `listen`, with the port replaced by `port` when given (the `PORT`
    /// environment variable in the binary).
    pub fn listen_addr(&self, port: Option<&str>) -> Result<SocketAddr> {
        let mut addr: SocketAddr = self
            .listen
            .parse()
            .map_err(|e| MetricsError::Config(format!("server.listen: {e}")))?;
        if let Some(port) = port {
            let port: u16 = port
                .trim()
                .parse()
                .map_err(|e| MetricsError::Config(format!("PORT {port:?}: {e}")))?;
            addr.set_port(port);
        }
        Ok(addr)
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}

/// Which request path goes into the `path` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PathLabel {
    /// The request URI path, as received.
    #[default]
    Raw,
    /// The matched route template (e.g. `/users/:id`).
    Route,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    #[serde(default = "default_metrics_path")]
    pub path: String,

    /// `null` disables the cap.
    #[serde(default = "default_max_series")]
    pub max_series_per_metric: Option<usize>,

    #[serde(default)]
    pub path_label: PathLabel,

    #[serde(default = "default_buckets")]
    pub response_time_buckets: Vec<f64>,

    #[serde(default)]
    pub interceptors: InterceptorsSection,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            path: default_metrics_path(),
            max_series_per_metric: default_max_series(),
            path_label: PathLabel::default(),
            response_time_buckets: default_buckets(),
            interceptors: InterceptorsSection::default(),
        }
    }
}

impl MetricsSection {
    pub fn validate(&self) -> Result<()> {
        if !self.path.starts_with('/') {
            return Err(MetricsError::Config("metrics.path must start with '/'".into()));
        }
        if self.path == HEALTHZ_PATH {
            return Err(MetricsError::Config(format!(
                "metrics.path must not be {HEALTHZ_PATH}"
            )));
        }
        if let Some(n) = self.max_series_per_metric {
            if !(1..=1_000_000).contains(&n) {
                return Err(MetricsError::Config(
                    "metrics.max_series_per_metric must be between 1 and 1000000".into(),
                ));
            }
        }
        self.buckets()?;
        Ok(())
    }

    pub fn buckets(&self) -> Result<Buckets> {
        Buckets::new(&self.response_time_buckets)
            .map_err(|e| MetricsError::Config(format!("metrics.response_time_buckets: {e}")))
    }
}

fn default_metrics_path() -> String {
    "/metrics".into()
}
fn default_max_series() -> Option<usize> {
    Some(1000)
}
fn default_buckets() -> Vec<f64> {
    DEFAULT_BUCKETS.to_vec()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InterceptorsSection {
    #[serde(default = "enabled")]
    pub cpu: bool,
    #[serde(default = "enabled")]
    pub memory: bool,
    #[serde(default = "enabled")]
    pub response_time: bool,
    #[serde(default = "enabled")]
    pub route_response_time: bool,
    #[serde(default = "enabled")]
    pub request_count: bool,
    #[serde(default = "enabled")]
    pub request_size: bool,
    #[serde(default = "enabled")]
    pub payload_size: bool,
    #[serde(default = "enabled")]
    pub request_rate: bool,
    #[serde(default = "enabled")]
    pub throughput: bool,
}

impl Default for InterceptorsSection {
    fn default() -> Self {
        Self {
            cpu: true,
            memory: true,
            response_time: true,
            route_response_time: true,
            request_count: true,
            request_size: true,
            payload_size: true,
            request_rate: true,
            throughput: true,
        }
    }
}

impl InterceptorsSection {
    pub fn toggles(&self) -> InterceptorToggles {
        InterceptorToggles {
            cpu: self.cpu,
            memory: self.memory,
            response_time: self.response_time,
            route_response_time: self.route_response_time,
            request_count: self.request_count,
            request_size: self.request_size,
            payload_size: self.payload_size,
            request_rate: self.request_rate,
            throughput: self.throughput,
        }
    }
}

fn enabled() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SamplerSection {
    #[serde(default = "enabled")]
    pub enabled: bool,

    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl Default for SamplerSection {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: default_interval_ms(),
        }
    }
}

impl SamplerSection {
    pub fn validate(&self) -> Result<()> {
        if !(100..=3_600_000).contains(&self.interval_ms) {
            return Err(MetricsError::Config(
                "sampler.interval_ms must be between 100 and 3600000".into(),
            ));
        }
        Ok(())
    }
}

fn default_interval_ms() -> u64 {
    10_000
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_level() -> String {
    "info".into()
}
