//! Demo application routes served by the binary.

use axum::routing::get;
use tokio::time::{sleep, Duration};

use crate::router::Routes;

pub fn routes() -> Routes {
    vec![("/fast", get(fast)), ("/slow", get(slow))]
}

async fn fast() -> &'static str {
    sleep(Duration::from_millis(300)).await;
    "Fast API"
}

async fn slow() -> &'static str {
    sleep(Duration::from_secs(3)).await;
    "Slow API"
}
