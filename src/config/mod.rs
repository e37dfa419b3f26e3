//! Application settings.
//!
//! Built-in defaults come from `default.toml`; any key can be overridden by an
//! environment variable prefixed with `HARMONY__`, using `__` to separate
//! nesting levels (e.g. `HARMONY__FOREST__N_TREES=300`,
//! `HARMONY__MODEL__SOURCE=load`).

use std::path::PathBuf;

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::serving::ModelSource;
use crate::training::{ConfigError, ForestConfig};

const DEFAULT_CONFIG: &str = include_str!("default.toml");

/// Top-level settings for the binary and the serving workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub model: ModelConfig,
    pub dataset: DatasetConfig,
    pub forest: ForestConfig,
}

/// How the served model is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    Train,
    Load,
    LoadOrTrain,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Location of the model artifact.
    pub path: PathBuf,
    pub source: SourceKind,
    /// Persist a model trained by `train` or `load-or-train` to `path`.
    pub save_after_train: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// CSV file with the historical observations.
    pub path: PathBuf,
}

impl AppConfig {
    /// Load defaults merged with `HARMONY__*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Figment::from(Toml::string(DEFAULT_CONFIG))
            .admerge(Env::prefixed("HARMONY__").map(|p| p.as_str().replace("__", ".").into()))
            .extract()
            .map_err(|e| ConfigError::Load(e.to_string()))?;
        config.forest.validate()?;
        Ok(config)
    }

    /// The initialization step these settings describe.
    pub fn model_source(&self) -> ModelSource {
        let save_to = self.model.save_after_train.then(|| self.model.path.clone());
        match self.model.source {
            SourceKind::Train => ModelSource::Train {
                dataset: self.dataset.path.clone(),
                config: self.forest.clone(),
                save_to,
            },
            SourceKind::Load => ModelSource::Load {
                path: self.model.path.clone(),
            },
            SourceKind::LoadOrTrain => ModelSource::LoadOrTrain {
                model: self.model.path.clone(),
                dataset: self.dataset.path.clone(),
                config: self.forest.clone(),
                save: self.model.save_after_train,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;
    use crate::training::MaxFeatures;

    #[test]
    fn defaults_match_forest_defaults() {
        Jail::expect_with(|_| {
            let config = AppConfig::load().unwrap();
            assert_eq!(config.forest, ForestConfig::default());
            assert_eq!(config.model.source, SourceKind::LoadOrTrain);
            assert!(config.model.save_after_train);
            Ok(())
        });
    }

    #[test]
    fn environment_overrides_nested_keys() {
        Jail::expect_with(|jail| {
            jail.set_env("HARMONY__FOREST__N_TREES", "7");
            jail.set_env("HARMONY__FOREST__MAX_DEPTH", "5");
            jail.set_env("HARMONY__FOREST__MAX_FEATURES", "all");
            jail.set_env("HARMONY__MODEL__SOURCE", "load");
            jail.set_env("HARMONY__MODEL__PATH", "/tmp/other.hspl");

            let config = AppConfig::load().unwrap();
            assert_eq!(config.forest.n_trees, 7);
            assert_eq!(config.forest.max_depth, Some(5));
            assert_eq!(config.forest.max_features, MaxFeatures::All);
            assert_eq!(
                config.model_source(),
                ModelSource::Load {
                    path: PathBuf::from("/tmp/other.hspl")
                }
            );
            Ok(())
        });
    }

    #[test]
    fn max_features_accepts_fraction_and_count() {
        Jail::expect_with(|jail| {
            jail.set_env("HARMONY__FOREST__MAX_FEATURES", "0.5");
            let config = AppConfig::load().unwrap();
            assert_eq!(config.forest.max_features, MaxFeatures::Fraction(0.5));

            jail.set_env("HARMONY__FOREST__MAX_FEATURES", "4");
            let config = AppConfig::load().unwrap();
            assert_eq!(config.forest.max_features, MaxFeatures::Count(4));

            jail.set_env("HARMONY__FOREST__MAX_FEATURES", "0");
            assert!(matches!(AppConfig::load(), Err(ConfigError::Load(_))));
            Ok(())
        });
    }

    #[test]
    fn invalid_override_is_config_error() {
        Jail::expect_with(|jail| {
            jail.set_env("HARMONY__FOREST__TEST_FRACTION", "1.5");
            assert_eq!(
                AppConfig::load(),
                Err(ConfigError::InvalidTestFraction(1.5))
            );

            jail.set_env("HARMONY__FOREST__TEST_FRACTION", "lots");
            assert!(matches!(AppConfig::load(), Err(ConfigError::Load(_))));
            Ok(())
        });
    }

    #[test]
    fn save_flag_controls_train_target() {
        Jail::expect_with(|jail| {
            jail.set_env("HARMONY__MODEL__SOURCE", "train");
            jail.set_env("HARMONY__MODEL__SAVE_AFTER_TRAIN", "false");
            let config = AppConfig::load().unwrap();
            assert!(matches!(
                config.model_source(),
                ModelSource::Train { save_to: None, .. }
            ));
            Ok(())
        });
    }
}
