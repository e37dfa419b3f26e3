//! Random forest configuration with builder pattern.
//!
//! [`ForestConfig`] is built with `bon`; the custom `build()` validates every
//! field and returns [`ConfigError`] on bad values.
//!
//! # Example
//!
//! ```
//! use harmony_splash::training::{ForestConfig, MaxFeatures};
//!
//! // All defaults
//! let config = ForestConfig::builder().build().unwrap();
//! assert_eq!(config.n_trees, 100);
//!
//! let config = ForestConfig::builder()
//!     .n_trees(50)
//!     .max_depth(8)
//!     .max_features(MaxFeatures::Fraction(0.5))
//!     .seed(7)
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::str::FromStr;

use bon::Builder;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

// =============================================================================
// ConfigError
// =============================================================================

/// Errors raised while validating or loading configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Number of trees must be at least 1.
    #[error("n_trees must be at least 1")]
    InvalidNTrees,

    /// Depth limit must be at least 1 when set.
    #[error("max_depth must be at least 1 when set")]
    InvalidMaxDepth,

    /// A minimum sample count is below its floor.
    #[error("{field} must be at least {min}, got {value}")]
    InvalidMinSamples {
        field: &'static str,
        min: u32,
        value: u32,
    },

    /// Held-out fraction must lie strictly between 0 and 1.
    #[error("test_fraction must be in (0, 1), got {0}")]
    InvalidTestFraction(f64),

    /// Feature subset specification is out of range.
    #[error("invalid max_features: {0}")]
    InvalidMaxFeatures(String),

    /// Layered configuration could not be extracted.
    #[error("failed to load configuration: {0}")]
    Load(String),
}

// =============================================================================
// Verbosity
// =============================================================================

/// How much the trainer logs per tree.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Verbosity {
    /// Only the summary lines.
    #[default]
    Silent,
    /// Progress every 10% of trees.
    Info,
    /// One line per tree.
    Debug,
}

// =============================================================================
// MaxFeatures
// =============================================================================

/// Number of features to consider when looking for the best split.
///
/// Parsed from strings as `all`, `sqrt`, `log2`, a fraction in `(0, 1]`
/// (e.g. `0.5`) or a whole count (e.g. `4`). Human-readable formats (TOML,
/// environment, JSON) also accept the fraction and the count as bare numbers;
/// binary formats use the plain enum encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum MaxFeatures {
    /// Every feature.
    All,
    /// `floor(sqrt(n_features))`.
    #[default]
    Sqrt,
    /// `floor(log2(n_features))`.
    Log2,
    /// `floor(fraction * n_features)`.
    Fraction(f64),
    /// A fixed number, capped at `n_features`.
    Count(usize),
}

impl MaxFeatures {
    /// Resolve to a concrete count in `[1, n_features]`.
    pub fn resolve(self, n_features: usize) -> usize {
        let n = n_features as f64;
        let k = match self {
            Self::All => n_features,
            Self::Sqrt => n.sqrt().floor() as usize,
            Self::Log2 => n.log2().floor() as usize,
            Self::Fraction(f) => (f * n).floor() as usize,
            Self::Count(c) => c,
        };
        k.clamp(1, n_features.max(1))
    }

    fn validate(self) -> Result<(), ConfigError> {
        match self {
            Self::Fraction(f) if !(f > 0.0 && f <= 1.0) => Err(ConfigError::InvalidMaxFeatures(
                format!("fraction must be in (0, 1], got {f}"),
            )),
            Self::Count(0) => Err(ConfigError::InvalidMaxFeatures(
                "count must be at least 1".into(),
            )),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for MaxFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Sqrt => f.write_str("sqrt"),
            Self::Log2 => f.write_str("log2"),
            Self::Fraction(v) => write!(f, "{v:?}"),
            Self::Count(c) => write!(f, "{c}"),
        }
    }
}

impl FromStr for MaxFeatures {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = match s.trim().to_ascii_lowercase().as_str() {
            "all" => Self::All,
            "sqrt" => Self::Sqrt,
            "log2" => Self::Log2,
            other => {
                if let Ok(count) = other.parse::<usize>() {
                    Self::Count(count)
                } else if let Ok(fraction) = other.parse::<f64>() {
                    Self::Fraction(fraction)
                } else {
                    return Err(ConfigError::InvalidMaxFeatures(format!(
                        "expected all, sqrt, log2, a fraction or a count, got `{s}`"
                    )));
                }
            }
        };
        parsed.validate()?;
        Ok(parsed)
    }
}

/// Binary representation of [`MaxFeatures`].
#[derive(Serialize, Deserialize)]
#[serde(rename = "MaxFeatures", rename_all = "kebab-case")]
enum MaxFeaturesRepr {
    All,
    Sqrt,
    Log2,
    Fraction(f64),
    Count(usize),
}

impl Serialize for MaxFeatures {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            return match *self {
                Self::Fraction(v) => serializer.serialize_f64(v),
                Self::Count(c) => serializer.serialize_u64(c as u64),
                other => serializer.collect_str(&other),
            };
        }
        let repr = match *self {
            Self::All => MaxFeaturesRepr::All,
            Self::Sqrt => MaxFeaturesRepr::Sqrt,
            Self::Log2 => MaxFeaturesRepr::Log2,
            Self::Fraction(v) => MaxFeaturesRepr::Fraction(v),
            Self::Count(c) => MaxFeaturesRepr::Count(c),
        };
        repr.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MaxFeatures {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            return deserializer.deserialize_any(MaxFeaturesVisitor);
        }
        let parsed = match MaxFeaturesRepr::deserialize(deserializer)? {
            MaxFeaturesRepr::All => Self::All,
            MaxFeaturesRepr::Sqrt => Self::Sqrt,
            MaxFeaturesRepr::Log2 => Self::Log2,
            MaxFeaturesRepr::Fraction(v) => Self::Fraction(v),
            MaxFeaturesRepr::Count(c) => Self::Count(c),
        };
        parsed.validate().map_err(de::Error::custom)?;
        Ok(parsed)
    }
}

struct MaxFeaturesVisitor;

impl de::Visitor<'_> for MaxFeaturesVisitor {
    type Value = MaxFeatures;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("all, sqrt, log2, a fraction in (0, 1] or a positive count")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        let count = usize::try_from(v).map_err(E::custom)?;
        let parsed = MaxFeatures::Count(count);
        parsed.validate().map_err(E::custom)?;
        Ok(parsed)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        match u64::try_from(v) {
            Ok(v) => self.visit_u64(v),
            Err(_) => Err(E::custom(ConfigError::InvalidMaxFeatures(format!(
                "count must be at least 1, got {v}"
            )))),
        }
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        let parsed = MaxFeatures::Fraction(v);
        parsed.validate().map_err(E::custom)?;
        Ok(parsed)
    }
}

// =============================================================================
// ForestConfig
// =============================================================================

/// Configuration for random forest training and evaluation.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(
    derive(Clone, Debug),
    finish_fn(vis = "", name = __build_internal)
)]
#[serde(default)]
pub struct ForestConfig {
    // === Ensemble ===
    /// Number of trees. Default: 100.
    #[builder(default = 100)]
    pub n_trees: u32,

    /// Whether each tree sees a bootstrap resample of the training rows.
    /// Default: `true`.
    #[builder(default = true)]
    pub bootstrap: bool,

    // === Tree structure ===
    /// Maximum depth. `None` grows until the leaf constraints stop it.
    pub max_depth: Option<u32>,

    /// Minimum rows a node needs to be split. Default: 2.
    #[builder(default = 2)]
    pub min_samples_split: u32,

    /// Minimum rows on each side of a split. Default: 1.
    #[builder(default = 1)]
    pub min_samples_leaf: u32,

    /// Features considered per split. Default: [`MaxFeatures::Sqrt`].
    #[builder(default)]
    pub max_features: MaxFeatures,

    // === Evaluation ===
    /// Share of rows held out for evaluation. Default: 0.2.
    #[builder(default = 0.2)]
    pub test_fraction: f64,

    // === Reproducibility ===
    /// Seed for the split, bootstrap and feature sampling. Default: 42.
    #[builder(default = 42)]
    pub seed: u64,

    // === Resource control ===
    /// Fit trees on the rayon pool. Results do not depend on this.
    #[builder(default = true)]
    pub parallel: bool,

    // === Logging ===
    /// Verbosity level. Default: `Silent`.
    #[builder(default)]
    pub verbosity: Verbosity,
}

/// Custom finishing function that validates the config.
impl<S: forest_config_builder::IsComplete> ForestConfigBuilder<S> {
    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any parameter is out of range.
    pub fn build(self) -> Result<ForestConfig, ConfigError> {
        let config = self.__build_internal();
        config.validate()?;
        Ok(config)
    }
}

impl ForestConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_trees == 0 {
            return Err(ConfigError::InvalidNTrees);
        }
        if self.max_depth == Some(0) {
            return Err(ConfigError::InvalidMaxDepth);
        }
        if self.min_samples_split < 2 {
            return Err(ConfigError::InvalidMinSamples {
                field: "min_samples_split",
                min: 2,
                value: self.min_samples_split,
            });
        }
        if self.min_samples_leaf < 1 {
            return Err(ConfigError::InvalidMinSamples {
                field: "min_samples_leaf",
                min: 1,
                value: self.min_samples_leaf,
            });
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(ConfigError::InvalidTestFraction(self.test_fraction));
        }
        self.max_features.validate()
    }
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self::builder().build().expect("default config is valid")
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn defaults() {
        let config = ForestConfig::default();
        assert_eq!(config.n_trees, 100);
        assert_eq!(config.max_depth, None);
        assert_eq!(config.min_samples_split, 2);
        assert_eq!(config.min_samples_leaf, 1);
        assert_eq!(config.max_features, MaxFeatures::Sqrt);
        assert!(config.bootstrap);
        assert_eq!(config.test_fraction, 0.2);
        assert_eq!(config.seed, 42);
        assert_eq!(config.verbosity, Verbosity::Silent);
    }

    #[test]
    fn builder_rejects_invalid_values() {
        assert_eq!(
            ForestConfig::builder().n_trees(0).build(),
            Err(ConfigError::InvalidNTrees)
        );
        assert_eq!(
            ForestConfig::builder().max_depth(0).build(),
            Err(ConfigError::InvalidMaxDepth)
        );
        assert!(matches!(
            ForestConfig::builder().min_samples_split(1).build(),
            Err(ConfigError::InvalidMinSamples { field: "min_samples_split", .. })
        ));
        assert!(matches!(
            ForestConfig::builder().min_samples_leaf(0).build(),
            Err(ConfigError::InvalidMinSamples { field: "min_samples_leaf", .. })
        ));
        assert_eq!(
            ForestConfig::builder().test_fraction(1.0).build(),
            Err(ConfigError::InvalidTestFraction(1.0))
        );
        assert!(matches!(
            ForestConfig::builder().max_features(MaxFeatures::Fraction(1.5)).build(),
            Err(ConfigError::InvalidMaxFeatures(_))
        ));
    }

    #[rstest]
    #[case(MaxFeatures::All, 16, 16)]
    #[case(MaxFeatures::Sqrt, 16, 4)]
    #[case(MaxFeatures::Sqrt, 15, 3)]
    #[case(MaxFeatures::Log2, 16, 4)]
    #[case(MaxFeatures::Fraction(0.5), 16, 8)]
    #[case(MaxFeatures::Fraction(0.01), 16, 1)]
    #[case(MaxFeatures::Count(40), 16, 16)]
    #[case(MaxFeatures::Log2, 1, 1)]
    fn resolve_max_features(#[case] max_features: MaxFeatures, #[case] n: usize, #[case] expected: usize) {
        assert_eq!(max_features.resolve(n), expected);
    }

    #[rstest]
    #[case("all", MaxFeatures::All)]
    #[case("SQRT", MaxFeatures::Sqrt)]
    #[case("log2", MaxFeatures::Log2)]
    #[case("0.3", MaxFeatures::Fraction(0.3))]
    #[case("5", MaxFeatures::Count(5))]
    fn parse_max_features(#[case] input: &str, #[case] expected: MaxFeatures) {
        assert_eq!(input.parse::<MaxFeatures>().unwrap(), expected);
    }

    #[test]
    fn parse_max_features_rejects_garbage() {
        assert!("half".parse::<MaxFeatures>().is_err());
        assert!("0".parse::<MaxFeatures>().is_err());
        assert!("2.5".parse::<MaxFeatures>().is_err());
    }

    #[rstest]
    #[case("\"all\"", MaxFeatures::All)]
    #[case("\"log2\"", MaxFeatures::Log2)]
    #[case("\"0.25\"", MaxFeatures::Fraction(0.25))]
    #[case("0.5", MaxFeatures::Fraction(0.5))]
    #[case("1.0", MaxFeatures::Fraction(1.0))]
    #[case("4", MaxFeatures::Count(4))]
    fn max_features_from_json(#[case] json: &str, #[case] expected: MaxFeatures) {
        let parsed: MaxFeatures = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, expected);
        let back: MaxFeatures = serde_json::from_str(&serde_json::to_string(&parsed).unwrap()).unwrap();
        assert_eq!(back, expected);
    }

    #[test]
    fn max_features_from_json_rejects_out_of_range() {
        for json in ["0", "-3", "1.5", "\"half\""] {
            assert!(serde_json::from_str::<MaxFeatures>(json).is_err(), "{json}");
        }
    }

    #[test]
    fn max_features_binary_encoding() {
        for value in [MaxFeatures::Sqrt, MaxFeatures::Fraction(0.5), MaxFeatures::Count(3)] {
            let bytes = postcard::to_allocvec(&value).unwrap();
            assert_eq!(postcard::from_bytes::<MaxFeatures>(&bytes).unwrap(), value);
        }
    }

    #[test]
    fn fraction_display_stays_a_fraction() {
        assert_eq!(MaxFeatures::Fraction(1.0).to_string(), "1.0");
        assert_eq!("1.0".parse::<MaxFeatures>().unwrap(), MaxFeatures::Fraction(1.0));
    }

    #[test]
    fn verbosity_ordering() {
        assert!(Verbosity::Debug >= Verbosity::Info);
        assert!(Verbosity::Silent < Verbosity::Info);
    }
}
