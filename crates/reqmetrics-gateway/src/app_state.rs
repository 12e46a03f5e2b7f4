//! Shared application state for the reqmetrics gateway.
//!
//! Owns the registry (one per process, passed by handle, never global), the
//! interceptor chain built from it, and the process collector. Startup
//! errors are returned, not panicked, so a metric name conflict aborts boot
//! cleanly.

use std::sync::Arc;

use reqmetrics_core::error::Result;
use reqmetrics_core::intercept::StandardMetrics;
use reqmetrics_core::process::ProcessCollector;
use reqmetrics_core::{Chain, Registry, RegistryOptions};

use crate::config::GatewayConfig;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    registry: Arc<Registry>,
    standard: StandardMetrics,
    chain: Chain,
    process: Arc<ProcessCollector>,
}

impl AppState {
    /// Build application state.
    /// Returns Result so main can handle errors gracefully (no panic).
    pub fn new(cfg: GatewayConfig) -> Result<Self> {
        Self::with_registry(cfg, |opts| Arc::new(Registry::with_options(opts)))
    }

    /// Build on a caller-supplied registry constructor (tests pre-register
    /// metrics to exercise name conflicts).
    pub fn with_registry(
        cfg: GatewayConfig,
        make: impl FnOnce(RegistryOptions) -> Arc<Registry>,
    ) -> Result<Self> {
        let registry = make(RegistryOptions {
            max_series_per_metric: cfg.metrics.max_series_per_metric,
        });

        // 1) Request-scoped metrics + chain
        let standard = StandardMetrics::register(&registry, cfg.metrics.buckets()?)?;
        let chain = standard.chain(cfg.metrics.interceptors.toggles());

        // 2) Process-level metrics in the same namespace
        let process = Arc::new(ProcessCollector::register(&registry)?);

        tracing::info!(
            interceptors = ?chain.names(),
            families = registry.names().len(),
            max_series = ?cfg.metrics.max_series_per_metric,
            "instrumentation ready"
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                registry,
                standard,
                chain,
                process,
            }),
        })
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.inner.registry
    }

    pub fn standard(&self) -> &StandardMetrics {
        &self.inner.standard
    }

    pub fn chain(&self) -> &Chain {
        &self.inner.chain
    }

    pub fn process(&self) -> Arc<ProcessCollector> {
        Arc::clone(&self.inner.process)
    }
}
