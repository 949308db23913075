use std::path::Path;

use serde::Deserialize;

use crate::encoder::EncoderConfig;
use crate::error::ConfigError;
use crate::policy::{Decay, PolicyConfig};
use crate::reward::RewardConfig;

/// Every tunable constant of the agent, loadable from JSON.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub encoder: EncoderConfig,
    pub reward: RewardConfig,
    pub policy: PolicyConfig,
}

impl AgentConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: AgentConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::warn!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.encoder.feature_len == 0 {
            return Err(ConfigError::Validation(
                "encoder.feature_len must be > 0".into(),
            ));
        }

        let reward = &self.reward;
        if !(reward.min < reward.max) {
            return Err(ConfigError::Validation(
                "reward.min must be < reward.max".into(),
            ));
        }
        if !(reward.terminal >= 0.0) {
            return Err(ConfigError::Validation(
                "reward.terminal must be >= 0".into(),
            ));
        }
        if !(reward.hp_coefficient > 0.0) {
            return Err(ConfigError::Validation(
                "reward.hp_coefficient must be > 0".into(),
            ));
        }

        let exploration = &self.policy.exploration;
        if !(0.0..=1.0).contains(&exploration.start) || !(0.0..=1.0).contains(&exploration.floor) {
            return Err(ConfigError::Validation(
                "policy.exploration.start and floor must be in [0, 1]".into(),
            ));
        }
        if exploration.floor > exploration.start {
            return Err(ConfigError::Validation(
                "policy.exploration.floor must be <= start".into(),
            ));
        }
        if exploration.decay == Decay::Geometric && exploration.floor <= 0.0 {
            return Err(ConfigError::Validation(
                "policy.exploration.floor must be > 0 for geometric decay".into(),
            ));
        }
        if exploration.horizon == 0 {
            return Err(ConfigError::Validation(
                "policy.exploration.horizon must be > 0".into(),
            ));
        }
        if let Some(cycle) = self.policy.cycle {
            if cycle.train_turns == 0 {
                return Err(ConfigError::Validation(
                    "policy.cycle.train_turns must be > 0".into(),
                ));
            }
        }

        let switch = &self.policy.switch;
        if !(switch.type_advantage >= 0.0) || !(switch.hp_fraction >= 0.0) {
            return Err(ConfigError::Validation(
                "policy.switch weights must be >= 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        AgentConfig::default()
            .validate()
            .expect("default config validates");
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config = AgentConfig::from_json(
            r#"{
                "reward": {"terminal": 500, "terms": {"boosts": false}},
                "policy": {"exploration": {"start": 0.8, "floor": 0.05, "horizon": 40000, "decay": "geometric"},
                           "cycle": {"train_turns": 150, "eval_turns": 20}}
            }"#,
        )
        .expect("config parses");
        assert_eq!(config.reward.terminal, 500.0);
        assert!(!config.reward.terms.boosts);
        assert!(config.reward.terms.faint);
        assert_eq!(config.reward.max, 1000.0);
        assert_eq!(config.policy.exploration.decay, Decay::Geometric);
        assert_eq!(config.policy.exploration.horizon, 40_000);
        assert_eq!(config.encoder.feature_len, 85);
        assert_eq!(config.policy.switch.hp_fraction, 0.6);
    }

    #[test]
    fn inverted_reward_bounds_are_rejected() {
        let err = AgentConfig::from_json(r#"{"reward": {"min": 10, "max": -10}}"#)
            .expect_err("bounds must be ordered");
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn floor_above_start_is_rejected() {
        let err = AgentConfig::from_json(r#"{"policy": {"exploration": {"start": 0.1, "floor": 0.5}}}"#)
            .expect_err("floor must not exceed start");
        assert!(err.to_string().contains("floor"));
    }

    #[test]
    fn geometric_decay_needs_positive_floor() {
        let err = AgentConfig::from_json(
            r#"{"policy": {"exploration": {"floor": 0.0, "decay": "geometric"}}}"#,
        )
        .expect_err("geometric decay cannot reach zero");
        assert!(err.to_string().contains("geometric"));
        AgentConfig::from_json(r#"{"policy": {"exploration": {"floor": 0.0, "decay": "linear"}}}"#)
            .expect("linear decay may reach zero");
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = AgentConfig::from_json("{ not json").expect_err("must fail");
        assert!(matches!(err, ConfigError::JsonParse(_)));
    }
}
