//! Tests for configuration defaults, validation and environment loading.

use std::collections::HashMap;

use ragkit_rag::{DistanceMetric, RagConfig, RagError};

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> =
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |key: &str| vars.get(key).cloned()
}

#[test]
fn defaults() {
    let config = RagConfig::default();
    assert_eq!(config.chunk_size, 512);
    assert_eq!(config.chunk_overlap, 100);
    assert_eq!(config.separator, None);
    assert_eq!(config.distance_metric, DistanceMetric::Cosine);
    assert_eq!(config.top_k, 4);
    assert_eq!(config.context_char_budget, 4000);
    assert!(config.validate().is_ok());
}

#[test]
fn builder_rejects_inconsistent_values() {
    let overlap = RagConfig::builder().chunk_size(100).chunk_overlap(100).build();
    assert!(matches!(overlap, Err(RagError::ConfigError(_))));

    assert!(RagConfig::builder().chunk_size(0).chunk_overlap(0).build().is_err());
    assert!(RagConfig::builder().top_k(0).build().is_err());
    assert!(RagConfig::builder().context_char_budget(0).build().is_err());
}

#[test]
fn empty_separator_means_none() {
    let config = RagConfig::builder().separator("").build().unwrap();
    assert_eq!(config.separator, None);
}

#[test]
fn from_env_without_variables_is_default() {
    assert_eq!(RagConfig::from_env_with(env(&[])).unwrap(), RagConfig::default());
}

#[test]
fn from_env_reads_every_variable() {
    let config = RagConfig::from_env_with(env(&[
        ("RAG_CHUNK_SIZE", "300"),
        ("RAG_CHUNK_OVERLAP", " 0 "),
        ("RAG_CHUNK_SEPARATOR", "\\n"),
        ("RAG_DISTANCE_METRIC", "euclidean"),
        ("RAG_TOP_K", "10"),
        ("RAG_CONTEXT_CHAR_BUDGET", "2000"),
    ]))
    .unwrap();

    assert_eq!(config.chunk_size, 300);
    assert_eq!(config.chunk_overlap, 0);
    assert_eq!(config.separator.as_deref(), Some("\n"));
    assert_eq!(config.distance_metric, DistanceMetric::Euclidean);
    assert_eq!(config.top_k, 10);
    assert_eq!(config.context_char_budget, 2000);
}

#[test]
fn from_env_reports_unparsable_values() {
    let err = RagConfig::from_env_with(env(&[("RAG_TOP_K", "many")])).unwrap_err();
    match err {
        RagError::ConfigError(message) => assert!(message.contains("RAG_TOP_K")),
        other => panic!("expected ConfigError, got {other:?}"),
    }

    let err = RagConfig::from_env_with(env(&[("RAG_DISTANCE_METRIC", "manhattan")])).unwrap_err();
    assert!(matches!(err, RagError::ConfigError(_)));
}

#[test]
fn from_env_validates_result() {
    let err = RagConfig::from_env_with(env(&[("RAG_CHUNK_SIZE", "50")])).unwrap_err();
    assert!(matches!(err, RagError::ConfigError(_)));
}

#[test]
fn deserializes_partial_json_with_defaults() {
    let config: RagConfig =
        serde_json::from_str(r#"{"chunk_size": 300, "distance_metric": "euclidean"}"#).unwrap();
    assert_eq!(config.chunk_size, 300);
    assert_eq!(config.chunk_overlap, 100);
    assert_eq!(config.distance_metric, DistanceMetric::Euclidean);
}
