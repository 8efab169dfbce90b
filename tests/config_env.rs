//! Environment overrides for configuration.
//!
//! Kept in its own test binary: `CROSSWALK_*` variables are process-wide and
//! would leak into the default-loading tests.

use std::path::Path;

use crosswalk_rs::{CrosswalkConfig, DuplicatePolicy};
use figment::Jail;

#[test]
fn test_env_overrides_config_file() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "crosswalk.toml",
            r#"
[scoring.weights]
tier_step = 120.0

[dedup]
policy = "merge"
"#,
        )?;
        jail.set_env("CROSSWALK_DEDUP__POLICY", "keep-first");
        jail.set_env("CROSSWALK_SCORING__WEIGHTS__TIER_STEP", "150");

        let config = CrosswalkConfig::load(Some(Path::new("crosswalk.toml")))
            .map_err(|err| err.to_string())?;
        assert_eq!(config.dedup.policy, DuplicatePolicy::KeepFirst);
        assert_eq!(config.scoring.weights.tier_step, 150.0);
        assert_eq!(config.scoring.weights.common, 30.0);
        Ok(())
    });
}

#[test]
fn test_env_weight_still_validated() {
    Jail::expect_with(|jail| {
        jail.set_env("CROSSWALK_SCORING__WEIGHTS__TIER_STEP", "50");
        let result = CrosswalkConfig::load(None);
        assert!(result.is_err());
        Ok(())
    });
}
