//! Axum middleware driving the interceptor chain.
//!
//! Lifecycle mapping:
//! - request enters the middleware -> `Chain::enter`
//! - response body yields its last chunk -> `Observation::complete(status)`
//! - body error, body dropped early, or the handler future dropped
//!   (client gone, timeout, panic) -> `Observation::abort`
//!
//! The observation travels inside the response body, so whichever path
//! runs first settles it and the other is a no-op. A completed request
//! writes one `info` access line (target `reqmetrics::access`).

use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::{Body, HttpBody};
use axum::extract::{MatchedPath, Request, State};
use axum::http::{header, HeaderValue, Method};
use axum::middleware::Next;
use axum::response::Response;
use bytes::Bytes;
use futures_util::stream::{BoxStream, Stream, StreamExt};

use reqmetrics_core::{Observation, RequestAttrs};

use crate::app_state::AppState;
use crate::config::PathLabel;

/// `path` label for requests that matched no route when labelling by route.
pub const UNMATCHED_ROUTE: &str = "unmatched";

/// Bytes read from the client connection so far.
///
/// A host that counts socket reads can attach this as a request extension;
/// without it the serialized size of the request head is used.
#[derive(Debug, Clone, Default)]
pub struct SocketBytesRead(pub Arc<AtomicU64>);

pub async fn track(State(app): State<AppState>, req: Request, next: Next) -> Response {
    let attrs = request_attrs(&req, app.cfg().metrics.path_label);
    let is_head = req.method() == Method::HEAD;
    let obs = app.chain().enter(attrs);

    // Dropping this future before `run` returns drops `obs` and aborts it.
    let res = next.run(req).await;
    let status = res.status().as_u16();

    let (mut parts, body) = res.into_parts();
    let expected = HttpBody::size_hint(&body).exact();

    // Nothing left to stream: settle now.
    if is_head || expected == Some(0) {
        if obs.complete(status) {
            let declared = parts
                .headers
                .get(header::CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(0);
            access_log(&obs, status, declared);
        }
        return Response::from_parts(parts, body);
    }

    // Keep a known length on the wire once the body becomes a stream.
    if let Some(n) = expected {
        if !parts.headers.contains_key(header::CONTENT_LENGTH) {
            parts.headers.insert(header::CONTENT_LENGTH, HeaderValue::from(n));
        }
    }

    let tracked = TrackedBody {
        inner: body.into_data_stream().boxed(),
        obs,
        status,
        expected,
        sent: 0,
    };
    Response::from_parts(parts, Body::from_stream(tracked))
}

fn request_attrs(req: &Request, label: PathLabel) -> RequestAttrs {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|m| m.as_str().to_string());
    let path = match label {
        PathLabel::Raw => req.uri().path().to_string(),
        PathLabel::Route => route
            .clone()
            .unwrap_or_else(|| UNMATCHED_ROUTE.to_string()),
    };

    let headers = req
        .headers()
        .iter()
        .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
        .collect();

    let bytes_read = req
        .extensions()
        .get::<SocketBytesRead>()
        .map(|b| b.0.load(Ordering::Relaxed))
        .unwrap_or_else(|| head_size(req));

    RequestAttrs {
        method: req.method().as_str().to_string(),
        path,
        route,
        headers,
        bytes_read,
    }
}

fn access_log(obs: &Observation, status: u16, content_length: u64) {
    let req = obs.request();
    tracing::info!(
        target: "reqmetrics::access",
        method = %req.method,
        path = %req.path,
        status,
        content_length,
        elapsed_ms = obs.elapsed().as_secs_f64() * 1000.0,
        "request completed"
    );
}

/// Size of the HTTP/1.1 request head as it would appear on the wire.
fn head_size(req: &Request) -> u64 {
    const CRLF: usize = 2;
    let target = req.uri().path_and_query().map_or("/", |pq| pq.as_str());
    // "METHOD SP target SP HTTP/1.1 CRLF"
    let request_line = req.method().as_str().len() + 1 + target.len() + 1 + "HTTP/1.1".len() + CRLF;
    // "name: value CRLF" per header, then the blank line
    let fields: usize = req
        .headers()
        .iter()
        .map(|(k, v)| k.as_str().len() + 2 + v.as_bytes().len() + CRLF)
        .sum();
    (request_line + fields + CRLF) as u64
}

/// Response body that settles the observation when it ends or is dropped.
struct TrackedBody {
    inner: BoxStream<'static, Result<Bytes, axum::Error>>,
    obs: Arc<Observation>,
    status: u16,
    expected: Option<u64>,
    sent: u64,
}

impl Stream for TrackedBody {
    type Item = Result<Bytes, axum::Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let polled = self.inner.poll_next_unpin(cx);
        match &polled {
            Poll::Ready(Some(Ok(chunk))) => self.sent += chunk.len() as u64,
            Poll::Ready(Some(Err(e))) => {
                self.obs.abort(format!("response body error: {e}"));
            }
            Poll::Ready(None) => {
                if self.obs.complete(self.status) {
                    access_log(&self.obs, self.status, self.sent);
                }
            }
            Poll::Pending => {}
        }
        polled
    }
}

impl Drop for TrackedBody {
    fn drop(&mut self) {
        // A sized body may be dropped right after its last byte without a
        // final poll; that still counts as fully sent.
        if self.expected.map_or(false, |n| self.sent >= n) {
            if self.obs.complete(self.status) {
                access_log(&self.obs, self.status, self.sent);
            }
        } else {
            self.obs.abort("response body dropped before end");
        }
    }
}
