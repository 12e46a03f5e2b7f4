//! Text exposition renderer.
//!
//! Per family: `# HELP`, `# TYPE`, then one line per series. Histograms
//! expand to `_bucket` lines (cumulative, ending in `le="+Inf"`), `_sum`
//! and `_count`. Rendering reads a snapshot only; it never touches the
//! registry. Invariant violations in the snapshot fail the whole render
//! instead of emitting a partial page.

use std::fmt::Write;

use crate::error::{MetricsError, Result};
use crate::snapshot::{FamilySnapshot, HistogramSnapshot, RegistrySnapshot, SeriesValue};

/// Content type of the rendered page.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn escape_help(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n")
}

fn fmt_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v == f64::INFINITY {
        "+Inf".to_string()
    } else if v == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        v.to_string()
    }
}

/// `name="value",...` without braces. `extra` is appended last (used for `le`).
fn label_body(names: &[String], values: &[String], extra: Option<(&str, &str)>) -> String {
    let mut parts: Vec<String> = names
        .iter()
        .zip(values)
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect();
    if let Some((k, v)) = extra {
        parts.push(format!("{}=\"{}\"", k, escape_label(v)));
    }
    parts.join(",")
}

fn braces(body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!("{{{body}}}")
    }
}

fn check_histogram(name: &str, h: &HistogramSnapshot) -> Result<()> {
    if h.cumulative.len() != h.bounds.len() {
        return Err(MetricsError::Render(format!(
            "{name}: {} bucket counts for {} bounds",
            h.cumulative.len(),
            h.bounds.len()
        )));
    }
    if h.cumulative.windows(2).any(|w| w[0] > w[1]) {
        return Err(MetricsError::Render(format!("{name}: bucket counts decrease")));
    }
    if h.cumulative.last().map_or(false, |&last| last > h.count) {
        return Err(MetricsError::Render(format!("{name}: bucket count exceeds total count")));
    }
    Ok(())
}

fn render_family(f: &FamilySnapshot, out: &mut String) -> Result<()> {
    let fmt_err = |e: std::fmt::Error| MetricsError::Render(format!("{}: {e}", f.name));

    writeln!(out, "# HELP {} {}", f.name, escape_help(&f.help)).map_err(fmt_err)?;
    writeln!(out, "# TYPE {} {}", f.name, f.kind.as_str()).map_err(fmt_err)?;

    for s in &f.series {
        if s.labels.len() != f.label_names.len() {
            return Err(MetricsError::Render(format!(
                "{}: series has {} label values for {} label names",
                f.name,
                s.labels.len(),
                f.label_names.len()
            )));
        }
        let body = label_body(&f.label_names, &s.labels, None);

        match &s.value {
            SeriesValue::Counter(v) | SeriesValue::Gauge(v) => {
                writeln!(out, "{}{} {}", f.name, braces(&body), fmt_value(*v)).map_err(fmt_err)?;
            }
            SeriesValue::Histogram(h) => {
                check_histogram(&f.name, h)?;
                for (le, count) in h.bounds.iter().zip(&h.cumulative) {
                    let le = fmt_value(*le);
                    let b = label_body(&f.label_names, &s.labels, Some(("le", &le)));
                    writeln!(out, "{}_bucket{{{}}} {}", f.name, b, count).map_err(fmt_err)?;
                }
                let b = label_body(&f.label_names, &s.labels, Some(("le", "+Inf")));
                writeln!(out, "{}_bucket{{{}}} {}", f.name, b, h.count).map_err(fmt_err)?;
                writeln!(out, "{}_sum{} {}", f.name, braces(&body), fmt_value(h.sum)).map_err(fmt_err)?;
                writeln!(out, "{}_count{} {}", f.name, braces(&body), h.count).map_err(fmt_err)?;
            }
        }
    }
    Ok(())
}

/// Render a snapshot. Families keep snapshot order (registration order).
pub fn render(snapshot: &RegistrySnapshot) -> Result<String> {
    let mut out = String::new();
    for f in &snapshot.families {
        render_family(f, &mut out)?;
    }
    Ok(out)
}
