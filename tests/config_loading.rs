use std::io::Write;

use crosswalk_rs::{
    AggregationMode, CrosswalkConfig, CrosswalkError, DuplicatePolicy, Pipeline, ProviderKind,
};
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
fn test_load_from_toml_file() {
    let file = write_config(
        r#"
[scoring]
preferred_exchanges = ["1"]

[scoring.weights]
tier_step = 120.0
overlap = 40.0

[matching]
parallel = false
aggregation = "overlap-weighted"

[dedup]
policy = "merge"

[[providers]]
name = "msci"
kind = "msci"

[[providers]]
name = "internal"
kind = "custom"
enabled = false
"#,
    );

    let config = CrosswalkConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.scoring.weights.tier_step, 120.0);
    assert_eq!(config.scoring.weights.overlap, 40.0);
    assert_eq!(config.scoring.weights.common, 30.0);
    assert!(!config.matching.parallel);
    assert_eq!(config.matching.aggregation, AggregationMode::OverlapWeighted);
    assert_eq!(config.dedup.policy, DuplicatePolicy::Merge);
    assert_eq!(config.providers.len(), 2);
    assert_eq!(config.provider("internal").unwrap().kind, ProviderKind::Custom);
    assert_eq!(config.enabled_providers().count(), 1);

    let pipeline = Pipeline::new(config).unwrap();
    assert!(pipeline.scorer().is_preferred_exchange(Some("NYSE")));
    assert!(!pipeline.scorer().is_preferred_exchange(Some("NASDAQ")));
}

#[test]
fn test_load_defaults_without_file() {
    let config = CrosswalkConfig::load(None).unwrap();
    assert_eq!(config.dedup.policy, DuplicatePolicy::Reject);
    assert_eq!(config.providers.len(), 3);
}

#[test]
fn test_load_rejects_non_dominant_tier() {
    let file = write_config(
        r#"
[scoring.weights]
tier_step = 60.0
"#,
    );
    let err = CrosswalkConfig::load(Some(file.path())).unwrap_err();
    assert!(matches!(err, CrosswalkError::InvalidWeights { .. }));
}

#[test]
fn test_load_rejects_unknown_policy() {
    let file = write_config(
        r#"
[dedup]
policy = "highest-completeness"
"#,
    );
    let err = CrosswalkConfig::load(Some(file.path())).unwrap_err();
    assert!(matches!(err, CrosswalkError::Config(_)));
}
