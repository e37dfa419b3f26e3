//! Fitted model: forest, frozen schema and metadata.
//!
//! A [`FittedModel`] is immutable once built. Every prediction path goes
//! through its [`FeatureSchema`], so a vector built for a different layout is
//! rejected instead of silently mis-indexed.
//!
//! # Example
//!
//! ```
//! use harmony_splash::model::FittedModel;
//! use harmony_splash::testing::synthetic_dataset;
//! use harmony_splash::training::ForestConfig;
//!
//! let dataset = synthetic_dataset(60, 1);
//! let config = ForestConfig::builder().n_trees(10).build().unwrap();
//! let (model, report) = FittedModel::train(&dataset, &config).unwrap();
//!
//! assert_eq!(model.schema().width(), model.forest().n_features());
//! assert_eq!(report.n_train + report.n_test, dataset.len());
//! ```

use log::info;
use ndarray::{Array1, Axis};

use super::meta::ModelMeta;
use crate::data::{InputError, RawRecord, TrainingDataset};
use crate::encoding::{EncodedRow, FeatureSchema, SchemaMismatch};
use crate::repr::Forest;
use crate::training::{train_test_split, EvaluationReport, ForestConfig, ForestTrainer};
use crate::Result;

/// Fewest complete rows that can be split into a train and a test part.
pub const MIN_TRAINING_ROWS: usize = 2;

/// A trained random forest bound to the schema it was trained on.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    forest: Forest,
    schema: FeatureSchema,
    meta: ModelMeta,
}

impl FittedModel {
    /// Fit the schema, split, fit the forest and evaluate on the held-out rows.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`](crate::Error::Config) if `config` is invalid
    /// - [`Error::Data`](crate::Error::Data) if fewer than two complete rows remain
    pub fn train(
        dataset: &TrainingDataset,
        config: &ForestConfig,
    ) -> Result<(Self, EvaluationReport)> {
        config.validate()?;
        dataset.ensure_min_rows(MIN_TRAINING_ROWS)?;

        let schema = FeatureSchema::fit(dataset.records());
        let features = schema.encode_records(dataset.rows().iter().map(|r| &r.record))?;
        let targets = dataset.targets();

        let split = train_test_split(dataset.len(), config.test_fraction, config.seed);
        info!(
            "training on {} rows, evaluating on {} ({} encoded columns)",
            split.train.len(),
            split.test.len(),
            schema.width()
        );

        let x_train = features.select(Axis(0), &split.train);
        let y_train = targets.select(Axis(0), &split.train);
        let x_test = features.select(Axis(0), &split.test);
        let y_test = targets.select(Axis(0), &split.test);

        let forest = ForestTrainer::new(config.clone()).fit(x_train.view(), y_train.view());

        let preds = forest.predict_rows(x_test.view());
        let report = EvaluationReport::compute(&preds.to_vec(), &y_test.to_vec(), split.train.len());
        info!("held-out evaluation: {}", report);

        let meta = ModelMeta::new(config.clone(), dataset.len(), dataset.n_dropped())
            .with_evaluation(report);

        Ok((Self { forest, schema, meta }, report))
    }

    /// Assemble a model from stored parts.
    ///
    /// The forest must be built for exactly as many columns as the schema has.
    pub fn from_parts(
        forest: Forest,
        schema: FeatureSchema,
        meta: ModelMeta,
    ) -> std::result::Result<Self, SchemaMismatch> {
        schema.check_width(forest.n_features())?;
        Ok(Self { forest, schema, meta })
    }

    /// Get reference to the underlying forest.
    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    /// The frozen feature schema.
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Get reference to model metadata.
    pub fn meta(&self) -> &ModelMeta {
        &self.meta
    }

    // =========================================================================
    // Prediction
    // =========================================================================

    /// Predict from a row whose column names must match the schema exactly.
    pub fn predict_row(&self, row: &EncodedRow) -> Result<f64> {
        self.schema.check(row)?;
        self.predict_checked(row.values())
    }

    /// Predict from a bare vector laid out in schema order.
    ///
    /// Only the width can be checked here; prefer
    /// [`predict_row`](Self::predict_row) or [`predict_record`](Self::predict_record).
    pub fn predict_values(&self, values: &[f64]) -> Result<f64> {
        self.schema.check_width(values.len())?;
        self.predict_checked(values)
    }

    /// Encode a raw record with the frozen schema and predict.
    pub fn predict_record(&self, record: &RawRecord) -> Result<f64> {
        let row = self.schema.encode_record(record)?;
        self.predict_row(&row)
    }

    /// Predict a batch of raw records.
    pub fn predict_records(&self, records: &[RawRecord]) -> Result<Array1<f64>> {
        let features = self.schema.encode_records(records.iter())?;
        if let Some((position, &value)) = features.iter().enumerate().find(|(_, v)| !v.is_finite())
        {
            return Err(InputError::NonFiniteFeature {
                position: position % self.schema.width(),
                value,
            }
            .into());
        }
        Ok(self.forest.predict_rows(features.view()))
    }

    fn predict_checked(&self, values: &[f64]) -> Result<f64> {
        if let Some((position, &value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(InputError::NonFiniteFeature { position, value }.into());
        }
        Ok(self.forest.predict_row(values))
    }

    // =========================================================================
    // Explainability
    // =========================================================================

    /// Impurity-based importance per schema column, summing to 1.
    pub fn feature_importance(&self) -> Vec<(String, f64)> {
        self.schema
            .names()
            .iter()
            .cloned()
            .zip(self.forest.feature_importance())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::data::{Activity, DataError, Season, TimeOfDay};
    use crate::testing::synthetic_dataset;
    use crate::Error;

    fn small_config() -> ForestConfig {
        ForestConfig::builder().n_trees(15).seed(5).build().unwrap()
    }

    fn trained() -> FittedModel {
        FittedModel::train(&synthetic_dataset(120, 3), &small_config())
            .unwrap()
            .0
    }

    fn example_record() -> RawRecord {
        RawRecord {
            activity: Activity::Shower,
            time_of_day: TimeOfDay::Morning,
            season: Season::Winter,
            external_temp: 5.0,
            room_temp: 22.0,
            room_humidity: 55.0,
            flow_rate: 10.0,
            cold_water_temp: 8.0,
        }
    }

    #[test]
    fn train_reports_split_sizes() {
        let dataset = synthetic_dataset(120, 3);
        let (model, report) = FittedModel::train(&dataset, &small_config()).unwrap();
        assert_eq!(report.n_test, 24);
        assert_eq!(report.n_train, 96);
        assert_eq!(model.meta().n_rows, 120);
        assert_eq!(model.meta().evaluation, Some(report));
        assert_eq!(model.forest().n_trees(), 15);
        assert!(report.r2 > 0.5, "r2 = {}", report.r2);
    }

    #[test]
    fn too_few_rows() {
        let dataset = synthetic_dataset(1, 3);
        let err = FittedModel::train(&dataset, &small_config()).unwrap_err();
        assert!(matches!(
            err,
            Error::Data(DataError::InsufficientRows { found: 1, required: 2 })
        ));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = ForestConfig {
            n_trees: 0,
            ..small_config()
        };
        let err = FittedModel::train(&synthetic_dataset(20, 3), &config).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn record_and_row_paths_agree() {
        let model = trained();
        let record = example_record();
        let row = model.schema().encode_record(&record).unwrap();

        let a = model.predict_record(&record).unwrap();
        let b = model.predict_row(&row).unwrap();
        let c = model.predict_values(row.values()).unwrap();
        assert!(a.is_finite());
        assert_eq!(a, b);
        assert_eq!(a, c);

        let batch = model.predict_records(&[record, record]).unwrap();
        assert_eq!(batch.to_vec(), vec![a, a]);
    }

    #[test]
    fn wrong_width_is_schema_mismatch() {
        let model = trained();
        let width = model.schema().width();
        let err = model.predict_values(&vec![0.0; width - 1]).unwrap_err();
        assert!(matches!(
            err,
            Error::SchemaMismatch(SchemaMismatch::WidthMismatch { .. })
        ));
    }

    #[test]
    fn reordered_row_is_schema_mismatch() {
        let model = trained();
        let row = model.schema().encode_record(&example_record()).unwrap();
        let mut names = row.names().to_vec();
        let mut values = row.values().to_vec();
        names.swap(5, 6);
        values.swap(5, 6);
        let swapped = EncodedRow::new(names, values).unwrap();
        assert!(matches!(
            model.predict_row(&swapped),
            Err(Error::SchemaMismatch(SchemaMismatch::ColumnMismatch { position: 5, .. }))
        ));
    }

    #[test]
    fn non_finite_feature_is_rejected() {
        let model = trained();
        let mut values = model
            .schema()
            .encode_record(&example_record())
            .unwrap()
            .into_values();
        values[2] = f64::NAN;
        assert!(matches!(
            model.predict_values(&values),
            Err(Error::InvalidInput(InputError::NonFiniteFeature { position: 2, .. }))
        ));
    }

    #[test]
    fn importance_covers_schema() {
        let model = trained();
        let importance = model.feature_importance();
        assert_eq!(importance.len(), model.schema().width());
        let total: f64 = importance.iter().map(|(_, v)| v).sum();
        assert_abs_diff_eq!(total, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn from_parts_checks_width() {
        let model = trained();
        let narrow = Forest::from_trees(model.forest().trees().cloned().collect(), 3);
        assert!(matches!(
            FittedModel::from_parts(narrow, model.schema().clone(), model.meta().clone()),
            Err(SchemaMismatch::WidthMismatch { .. })
        ));
    }
}
