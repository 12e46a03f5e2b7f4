#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use futures_util::stream;
use tower::ServiceExt;

use reqmetrics_core::intercept::standard::{
    HTTP_REQUESTS_TOTAL, HTTP_REQUEST_THROUGHPUT, HTTP_RESPONSE_TIME_SECONDS,
    REST_RESPONSE_TIME_DURATION_SECONDS,
};
use reqmetrics_core::{ErrorClass, MetricsError, Registry};
use reqmetrics_gateway::app_state::AppState;
use reqmetrics_gateway::config::{GatewayConfig, PathLabel};
use reqmetrics_gateway::router::Routes;
use reqmetrics_gateway::{demo, ops, router};

async fn slow(headers: HeaderMap) -> (StatusCode, &'static str) {
    if headers.contains_key("x-fail") {
        (StatusCode::INTERNAL_SERVER_ERROR, "boom")
    } else {
        (StatusCode::OK, "Slow API")
    }
}

async fn hang() -> &'static str {
    std::future::pending::<()>().await;
    "never"
}

async fn broken() -> Body {
    let chunks: Vec<io::Result<Bytes>> = vec![
        Ok(Bytes::from_static(b"partial")),
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "upstream reset")),
    ];
    Body::from_stream(stream::iter(chunks))
}

fn app_routes() -> Routes {
    vec![
        ("/slow", get(slow)),
        ("/hang", get(hang)),
        ("/broken", get(broken)),
        ("/users/:id", get(|| async { "user" })),
    ]
}

fn setup(cfg: GatewayConfig) -> (AppState, Router) {
    let state = AppState::new(cfg).unwrap();
    let app = router::build_router_with(state.clone(), app_routes()).unwrap();
    (state, app)
}

fn get_req(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, String) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn metrics_endpoint_serves_exposition() {
    let state = AppState::new(GatewayConfig::default()).unwrap();
    let app = router::build_router(state).unwrap();

    let res = app.clone().oneshot(get_req("/metrics")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/plain; version=0.0.4; charset=utf-8"
    );

    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("# TYPE http_requests_total counter"));
    assert!(text.contains("# TYPE http_response_time_seconds histogram"));
    assert!(text.contains("# TYPE process_resident_memory_bytes gauge"));
    // The scrape itself is in flight while rendering.
    assert!(text.contains("http_request_throughput 1\n"));
}

#[tokio::test]
async fn completed_requests_are_counted_by_status() {
    let (state, app) = setup(GatewayConfig::default());

    for fail in [false, false, true] {
        let mut req = Request::builder().uri("/slow");
        if fail {
            req = req.header("x-fail", "1");
        }
        send(&app, req.body(Body::empty()).unwrap()).await;
    }

    let m = state.standard();
    let ok = [("method", "GET"), ("path", "/slow"), ("status_code", "200")];
    let err = [("method", "GET"), ("path", "/slow"), ("status_code", "500")];
    assert_eq!(m.requests_total.get(&ok), Some(2.0));
    assert_eq!(m.requests_total.get(&err), Some(1.0));
    assert_eq!(m.request_rate.get(&[("method", "GET"), ("path", "/slow")]), Some(3.0));

    let h = m
        .response_time
        .get(&[("method", "GET"), ("path", "/slow")])
        .unwrap();
    assert_eq!(h.count, 3);
    assert_eq!(m.request_throughput.get(&[]), Some(0.0));

    let (_, text) = send(&app, get_req("/metrics")).await;
    assert!(text.contains(
        "http_requests_total{method=\"GET\",path=\"/slow\",status_code=\"200\"} 2\n"
    ));
    assert!(text.contains(
        "http_requests_total{method=\"GET\",path=\"/slow\",status_code=\"500\"} 1\n"
    ));
    assert!(text.contains(&format!(
        "{HTTP_RESPONSE_TIME_SECONDS}_count{{method=\"GET\",path=\"/slow\"}} 3\n"
    )));
}

#[tokio::test]
async fn dropped_request_aborts_and_settles_throughput() {
    let (state, app) = setup(GatewayConfig::default());
    let m = state.standard();

    let pending = app.clone().oneshot(get_req("/hang"));
    let timed_out = tokio::time::timeout(Duration::from_millis(50), pending).await;
    assert!(timed_out.is_err());

    assert_eq!(m.request_throughput.get(&[]), Some(0.0));
    assert_eq!(
        m.request_rate.get(&[("method", "GET"), ("path", "/hang")]),
        Some(1.0)
    );
    let snap = state.registry().snapshot();
    let total = snap.family(HTTP_REQUESTS_TOTAL).unwrap();
    assert!(total.series.iter().all(|s| s.labels[1] != "/hang"));
    assert!(m
        .response_time
        .get(&[("method", "GET"), ("path", "/hang")])
        .is_none());
}

#[tokio::test]
async fn unread_response_body_aborts() {
    let (state, app) = setup(GatewayConfig::default());

    let res = app.clone().oneshot(get_req("/slow")).await.unwrap();
    assert_eq!(state.standard().request_throughput.get(&[]), Some(1.0));
    drop(res);

    assert_eq!(state.standard().request_throughput.get(&[]), Some(0.0));
    assert!(state
        .standard()
        .requests_total
        .get(&[("method", "GET"), ("path", "/slow"), ("status_code", "200")])
        .is_none());
}

#[tokio::test]
async fn head_request_completes_without_body() {
    let (state, app) = setup(GatewayConfig::default());

    let req = Request::builder()
        .method(Method::HEAD)
        .uri("/healthz")
        .body(Body::empty())
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    drop(res);

    let got = state
        .standard()
        .requests_total
        .get(&[("method", "HEAD"), ("path", "/healthz"), ("status_code", "200")]);
    assert_eq!(got, Some(1.0));
}

#[tokio::test]
async fn route_labels_use_matched_template() {
    let mut cfg = GatewayConfig::default();
    cfg.metrics.path_label = PathLabel::Route;
    let (state, app) = setup(cfg);

    send(&app, get_req("/users/42")).await;
    send(&app, get_req("/users/7")).await;
    let (status, _) = send(&app, get_req("/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let total = &state.standard().requests_total;
    let route = [("method", "GET"), ("path", "/users/:id"), ("status_code", "200")];
    let unmatched = [("method", "GET"), ("path", "unmatched"), ("status_code", "404")];
    assert_eq!(total.get(&route), Some(2.0));
    assert_eq!(total.get(&unmatched), Some(1.0));
}

#[tokio::test]
async fn custom_metrics_path_and_healthz() {
    let mut cfg = GatewayConfig::default();
    cfg.metrics.path = "/internal/metrics".into();
    let (_state, app) = setup(cfg);

    let (status, body) = send(&app, get_req("/healthz")).await;
    assert_eq!((status, body.as_str()), (StatusCode::OK, "ok"));

    let (status, _) = send(&app, get_req("/internal/metrics")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, get_req("/metrics")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn disabled_interceptors_leave_families_empty() {
    let mut cfg = GatewayConfig::default();
    cfg.metrics.interceptors.request_count = false;
    cfg.metrics.interceptors.throughput = false;
    let (state, app) = setup(cfg);

    send(&app, get_req("/slow")).await;

    let snap = state.registry().snapshot();
    assert!(snap.family(HTTP_REQUESTS_TOTAL).unwrap().series.is_empty());
    // Unlabeled families are always present at zero.
    let throughput = snap.family(HTTP_REQUEST_THROUGHPUT).unwrap();
    assert_eq!(throughput.series.len(), 1);
    assert_eq!(
        state
            .standard()
            .request_rate
            .get(&[("method", "GET"), ("path", "/slow")]),
        Some(1.0)
    );
}

#[tokio::test]
async fn render_failure_maps_to_500() {
    let res = ops::exposition_response(Err(MetricsError::Render("bucket count mismatch".into())));
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8(body.to_vec())
        .unwrap()
        .contains("bucket count mismatch"));
}

#[test]
fn conflicting_preregistration_fails_startup() {
    let err = AppState::with_registry(GatewayConfig::default(), |opts| {
        let registry = Registry::with_options(opts);
        registry
            .gauge(HTTP_REQUESTS_TOTAL, "not a counter", &[])
            .unwrap();
        Arc::new(registry)
    })
    .err()
    .expect("name conflict must fail");
    assert_eq!(err.class(), ErrorClass::Configuration);
}

#[tokio::test]
async fn demo_fast_route_is_timed() {
    let state = AppState::new(GatewayConfig::default()).unwrap();
    let app = router::build_router_with(state.clone(), demo::routes()).unwrap();

    let (status, body) = send(&app, get_req("/fast")).await;
    assert_eq!((status, body.as_str()), (StatusCode::OK, "Fast API"));

    let h = state
        .standard()
        .response_time
        .get(&[("method", "GET"), ("path", "/fast")])
        .unwrap();
    assert_eq!(h.count, 1);
    assert!(h.sum >= 0.3);
}

#[tokio::test]
async fn body_stream_error_aborts() {
    let (state, app) = setup(GatewayConfig::default());
    let m = state.standard();

    let res = app.clone().oneshot(get_req("/broken")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(to_bytes(res.into_body(), usize::MAX).await.is_err());

    assert_eq!(m.request_throughput.get(&[]), Some(0.0));
    assert_eq!(
        m.request_rate.get(&[("method", "GET"), ("path", "/broken")]),
        Some(1.0)
    );
    assert!(m
        .requests_total
        .get(&[("method", "GET"), ("path", "/broken"), ("status_code", "200")])
        .is_none());
    assert!(m
        .response_time
        .get(&[("method", "GET"), ("path", "/broken")])
        .is_none());
}

#[tokio::test]
async fn route_response_time_keyed_by_template_and_status() {
    let (state, app) = setup(GatewayConfig::default());

    send(&app, get_req("/users/1")).await;
    send(&app, get_req("/users/2")).await;
    send(&app, get_req("/missing")).await;

    let h = &state.standard().route_response_time;
    let route = [("method", "GET"), ("route", "/users/:id"), ("status_code", "200")];
    assert_eq!(h.get(&route).unwrap().count, 2);
    // Raw path labels are unaffected.
    let total = &state.standard().requests_total;
    assert_eq!(
        total.get(&[("method", "GET"), ("path", "/users/1"), ("status_code", "200")]),
        Some(1.0)
    );

    let snap = state.registry().snapshot();
    let fam = snap.family(REST_RESPONSE_TIME_DURATION_SECONDS).unwrap();
    assert_eq!(fam.label_names, ["method", "route", "status_code"]);
    assert!(fam.series.iter().all(|s| s.labels[1] != "unmatched"));
    assert!(fam.series.iter().all(|s| !s.labels[1].starts_with("/missing")));
}

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn completed_request_writes_access_line() {
    let capture = Capture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let (_state, app) = setup(GatewayConfig::default());
    send(&app, get_req("/slow")).await;

    let logged = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
    let line = logged
        .lines()
        .find(|l| l.contains("request completed"))
        .expect("access line");
    assert!(line.contains("INFO"));
    assert!(line.contains("reqmetrics::access"));
    assert!(line.contains("method=GET"));
    assert!(line.contains("path=/slow"));
    assert!(line.contains("status=200"));
    assert!(line.contains("content_length=8"));
    assert!(line.contains("elapsed_ms="));
}

#[test]
fn route_collisions_are_config_errors() {
    let state = AppState::new(GatewayConfig::default()).unwrap();

    let err = router::build_router_with(state.clone(), vec![("/metrics", get(slow))])
        .err()
        .expect("metrics path taken");
    assert_eq!(err.class(), ErrorClass::Configuration);

    let err = router::build_router_with(state.clone(), vec![("/healthz", get(slow))])
        .err()
        .expect("healthz taken");
    assert_eq!(err.class(), ErrorClass::Configuration);

    let mut cfg = GatewayConfig::default();
    cfg.metrics.path = "/fast".into();
    let state = AppState::new(cfg).unwrap();
    let err = router::build_router_with(state, demo::routes())
        .err()
        .expect("demo route taken");
    assert_eq!(err.class(), ErrorClass::Configuration);
}
