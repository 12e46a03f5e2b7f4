#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use reqmetrics_core::ErrorClass;
use reqmetrics_gateway::config::{self, LogFormat, PathLabel};

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
metrics:
  path: "/metrics"
  interceptors:
    cpu: true
    memroy: false # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.class(), ErrorClass::Configuration);
    assert_eq!(err.class().as_str(), "CONFIGURATION");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.server.listen, "0.0.0.0:8080");
    assert_eq!(cfg.metrics.path, "/metrics");
    assert_eq!(cfg.metrics.max_series_per_metric, Some(1000));
    assert_eq!(cfg.metrics.path_label, PathLabel::Raw);
    assert_eq!(cfg.metrics.buckets().unwrap().bounds().len(), 11);
    assert!(cfg.sampler.enabled);
    assert_eq!(cfg.sampler.interval_ms, 10_000);
    assert_eq!(cfg.logging.format, LogFormat::Text);
}

#[test]
fn full_config_parses() {
    let ok = r#"
version: 1
server:
  listen: "127.0.0.1:9000"
metrics:
  path: "/internal/metrics"
  max_series_per_metric: null
  path_label: route
  response_time_buckets: [0.1, 0.5, 2.5]
  interceptors:
    cpu: false
    memory: false
sampler:
  enabled: false
  interval_ms: 500
logging:
  level: "debug"
  format: json
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.metrics.max_series_per_metric, None);
    assert_eq!(cfg.metrics.path_label, PathLabel::Route);
    assert_eq!(cfg.metrics.buckets().unwrap().bounds(), &[0.1, 0.5, 2.5]);

    let toggles = cfg.metrics.interceptors.toggles();
    assert!(!toggles.cpu && !toggles.memory);
    assert!(toggles.response_time && toggles.throughput);

    assert!(!cfg.sampler.enabled);
    assert_eq!(cfg.logging.format, LogFormat::Json);
}

#[test]
fn rejects_invalid_values() {
    let cases = [
        "version: 2\n",
        "version: 1\nserver:\n  listen: \"not-an-addr\"\n",
        "version: 1\nmetrics:\n  path: \"metrics\"\n",
        "version: 1\nmetrics:\n  path: \"/healthz\"\n",
        "version: 1\nmetrics:\n  max_series_per_metric: 0\n",
        "version: 1\nmetrics:\n  response_time_buckets: [1.0, 0.5]\n",
        "version: 1\nmetrics:\n  response_time_buckets: []\n",
        "version: 1\nmetrics:\n  path_label: template\n",
        "version: 1\nsampler:\n  interval_ms: 5\n",
        "version: 1\nlogging:\n  format: xml\n",
    ];
    for yaml in cases {
        let err = config::load_from_str(yaml).expect_err(yaml);
        assert_eq!(err.class(), ErrorClass::Configuration, "{yaml}");
    }
}

#[test]
fn load_from_file_reads_and_validates() {
    let dir = std::env::temp_dir().join(format!("reqmetrics-cfg-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("reqmetrics.yaml");
    std::fs::write(&path, "version: 1\nmetrics:\n  path: \"/m\"\n").unwrap();

    let cfg = config::load_from_file(path.to_str().unwrap()).unwrap();
    assert_eq!(cfg.metrics.path, "/m");

    let missing = dir.join("absent.yaml");
    assert!(config::load_from_file(missing.to_str().unwrap()).is_err());

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn port_overrides_listen_port() {
    let cfg = config::load_from_str("version: 1\nserver:\n  listen: \"127.0.0.1:9000\"\n").unwrap();
    assert_eq!(cfg.server.listen_addr(None).unwrap().to_string(), "127.0.0.1:9000");
    assert_eq!(
        cfg.server.listen_addr(Some("3000")).unwrap().to_string(),
        "127.0.0.1:3000"
    );

    let err = cfg.server.listen_addr(Some("http")).unwrap_err();
    assert_eq!(err.class(), ErrorClass::Configuration);
}
