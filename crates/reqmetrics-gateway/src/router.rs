//! Axum router wiring.
//!
//! Ops endpoints (`/healthz`, the metrics path) are mounted next to the host
//! application's routes, and everything, the scrape endpoint included, runs
//! through the tracking middleware.

use std::collections::HashSet;

use axum::{middleware, routing::get, routing::MethodRouter, Router};

use reqmetrics_core::error::{MetricsError, Result};

use crate::{app_state::AppState, ops, transport};

/// Host routes as `(path, handlers)`. Combine methods for one path into a
/// single `MethodRouter`.
pub type Routes = Vec<(&'static str, MethodRouter<AppState>)>;

/// Ops endpoints only.
pub fn build_router(state: AppState) -> Result<Router> {
    build_router_with(state, Routes::new())
}

/// Mount `routes` plus the ops endpoints, instrumented.
///
/// A path mounted twice (including the metrics path or `/healthz`) is a
/// configuration error.
pub fn build_router_with(state: AppState, routes: Routes) -> Result<Router> {
    let metrics_path = state.cfg().metrics.path.clone();

    let mut taken: HashSet<&str> = HashSet::from([metrics_path.as_str(), ops::HEALTHZ_PATH]);
    if taken.len() < 2 {
        return Err(MetricsError::Config(format!(
            "metrics.path collides with {}",
            ops::HEALTHZ_PATH
        )));
    }
    for (path, _) in &routes {
        if !taken.insert(*path) {
            return Err(MetricsError::Config(format!("route {path} is mounted twice")));
        }
    }

    let app = routes
        .into_iter()
        .fold(Router::new(), |app, (path, handlers)| app.route(path, handlers));

    Ok(app
        .route(&metrics_path, get(ops::metrics))
        .route(ops::HEALTHZ_PATH, get(ops::healthz))
        .layer(middleware::from_fn_with_state(state.clone(), transport::track))
        .with_state(state))
}
