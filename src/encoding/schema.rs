//! Frozen feature schema.
//!
//! A [`FeatureSchema`] is the ordered list of encoded column names a model is
//! trained on. It is fitted once from the training rows, persisted next to the
//! forest, and is the only source used to build vectors at inference time, so
//! training and inference cannot drift apart.
//!
//! # Column order
//!
//! ```text
//! ExternalTemp, RoomTemp, RoomHumidity, FlowRate, ColdWaterTemp,
//! Activity_<v>..., TimeOfDay_<v>..., Season_<v>...
//! ```
//!
//! Within each categorical field the indicator columns are sorted by value
//! label. Only labels observed in training get a column.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use ndarray::Array2;

use super::row::EncodedRow;
use crate::data::{Categorical, CategoricalField, NumericField, RawRecord};

/// Separator between field name and value label in indicator column names.
pub const INDICATOR_SEPARATOR: char = '_';

// =============================================================================
// SchemaMismatch
// =============================================================================

/// An encoded vector or a requested encoding disagrees with the schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaMismatch {
    /// Vector has the wrong number of columns.
    #[error("expected {expected} encoded columns, got {got}")]
    WidthMismatch { expected: usize, got: usize },

    /// Column at `position` has a different name than the schema.
    #[error("column {position} should be `{expected}`, got `{got}`")]
    ColumnMismatch {
        position: usize,
        expected: String,
        got: String,
    },

    /// Selected category value has no indicator column.
    #[error("{field} `{value}` was not seen during training")]
    UnseenCategory { field: &'static str, value: String },

    /// Column name is neither a numeric field nor a known indicator.
    #[error("unknown column `{name}`")]
    UnknownColumn { name: String },

    /// Column name appears more than once.
    #[error("duplicate column `{name}`")]
    DuplicateColumn { name: String },

    /// A numeric field has no column.
    #[error("numeric column `{name}` is missing")]
    MissingNumericColumn { name: &'static str },

    /// A categorical field has no indicator columns at all.
    #[error("no indicator columns for {field}")]
    MissingIndicators { field: &'static str },
}

// =============================================================================
// ColumnKind
// =============================================================================

/// What an encoded column holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnKind {
    /// A raw numeric field, copied unchanged.
    Numeric(NumericField),
    /// 1.0 when `field` equals `value`, 0.0 otherwise.
    Indicator {
        field: CategoricalField,
        value: String,
    },
}

impl ColumnKind {
    /// Column name for this kind.
    pub fn column_name(&self) -> String {
        match self {
            Self::Numeric(f) => f.name().to_string(),
            Self::Indicator { field, value } => indicator_name(*field, value),
        }
    }

    /// Parse a column name back into its kind.
    pub fn parse(name: &str) -> Result<Self, SchemaMismatch> {
        if let Some(field) = NumericField::from_name(name) {
            return Ok(Self::Numeric(field));
        }
        let unknown = || SchemaMismatch::UnknownColumn {
            name: name.to_string(),
        };
        let (prefix, value) = name.split_once(INDICATOR_SEPARATOR).ok_or_else(unknown)?;
        let field = CategoricalField::from_name(prefix).ok_or_else(unknown)?;
        if !field.labels().contains(&value) {
            return Err(unknown());
        }
        Ok(Self::Indicator {
            field,
            value: value.to_string(),
        })
    }
}

/// Indicator column name, e.g. `Activity_Hand Washing`.
pub fn indicator_name(field: CategoricalField, value: &str) -> String {
    format!("{}{}{}", field.name(), INDICATOR_SEPARATOR, value)
}

// =============================================================================
// FeatureSchema
// =============================================================================

/// Ordered encoded column layout a model is bound to.
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    names: Arc<[String]>,
    kinds: Vec<ColumnKind>,
}

impl FeatureSchema {
    /// Derive the schema from training records.
    ///
    /// Numeric columns come first in fixed order, followed by one indicator
    /// per distinct observed label of each categorical field.
    pub fn fit<'a>(records: impl IntoIterator<Item = &'a RawRecord>) -> Self {
        let mut observed: [BTreeSet<&'static str>; 3] = Default::default();
        for record in records {
            for (seen, field) in observed.iter_mut().zip(CategoricalField::ALL) {
                seen.insert(record.category(field));
            }
        }

        let mut kinds: Vec<ColumnKind> = NumericField::ALL
            .into_iter()
            .map(ColumnKind::Numeric)
            .collect();
        for (seen, field) in observed.iter().zip(CategoricalField::ALL) {
            kinds.extend(seen.iter().map(|value| ColumnKind::Indicator {
                field,
                value: (*value).to_string(),
            }));
        }

        Self::from_kinds(kinds)
    }

    /// Schema covering every label of every field, whether observed or not.
    pub fn full() -> Self {
        let mut kinds: Vec<ColumnKind> = NumericField::ALL
            .into_iter()
            .map(ColumnKind::Numeric)
            .collect();
        for field in CategoricalField::ALL {
            let mut labels = field.labels();
            labels.sort_unstable();
            kinds.extend(labels.into_iter().map(|value| ColumnKind::Indicator {
                field,
                value: value.to_string(),
            }));
        }
        Self::from_kinds(kinds)
    }

    /// Rebuild a schema from persisted column names, preserving their order.
    pub fn from_names(names: Vec<String>) -> Result<Self, SchemaMismatch> {
        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(SchemaMismatch::DuplicateColumn { name: name.clone() });
            }
        }

        let kinds = names
            .iter()
            .map(|n| ColumnKind::parse(n))
            .collect::<Result<Vec<_>, _>>()?;

        for field in NumericField::ALL {
            if !kinds.contains(&ColumnKind::Numeric(field)) {
                return Err(SchemaMismatch::MissingNumericColumn { name: field.name() });
            }
        }
        for field in CategoricalField::ALL {
            let has_indicator = kinds
                .iter()
                .any(|k| matches!(k, ColumnKind::Indicator { field: f, .. } if *f == field));
            if !has_indicator {
                return Err(SchemaMismatch::MissingIndicators { field: field.name() });
            }
        }

        Ok(Self {
            names: names.into(),
            kinds,
        })
    }

    fn from_kinds(kinds: Vec<ColumnKind>) -> Self {
        let names: Vec<String> = kinds.iter().map(ColumnKind::column_name).collect();
        Self {
            names: names.into(),
            kinds,
        }
    }

    /// Number of encoded columns.
    #[inline]
    pub fn width(&self) -> usize {
        self.kinds.len()
    }

    /// Column names in order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Column kinds in order.
    pub fn kinds(&self) -> &[ColumnKind] {
        &self.kinds
    }

    /// Position of a column by name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Labels that have an indicator column for `field`, in column order.
    pub fn indicator_values(&self, field: CategoricalField) -> impl Iterator<Item = &str> + '_ {
        self.kinds.iter().filter_map(move |k| match k {
            ColumnKind::Indicator { field: f, value } if *f == field => Some(value.as_str()),
            _ => None,
        })
    }

    // =========================================================================
    // Encoding
    // =========================================================================

    /// Encode one record into a row bound to this schema.
    pub fn encode_record(&self, record: &RawRecord) -> Result<EncodedRow, SchemaMismatch> {
        let mut values = vec![0.0; self.width()];
        self.encode_into(record, &mut values)?;
        Ok(EncodedRow::bound(Arc::clone(&self.names), values))
    }

    /// Encode several records into a `[n_rows, width]` matrix.
    pub fn encode_records<'a>(
        &self,
        records: impl ExactSizeIterator<Item = &'a RawRecord>,
    ) -> Result<Array2<f64>, SchemaMismatch> {
        let mut matrix = Array2::zeros((records.len(), self.width()));
        for (mut row, record) in matrix.rows_mut().into_iter().zip(records) {
            // Freshly allocated standard-layout rows are contiguous.
            match row.as_slice_mut() {
                Some(out) => self.encode_into(record, out)?,
                None => {
                    let mut buf = vec![0.0; self.width()];
                    self.encode_into(record, &mut buf)?;
                    row.iter_mut().zip(buf).for_each(|(dst, v)| *dst = v);
                }
            }
        }
        Ok(matrix)
    }

    /// Write the encoded form of `record` into `out` (length = width).
    fn encode_into(&self, record: &RawRecord, out: &mut [f64]) -> Result<(), SchemaMismatch> {
        debug_assert_eq!(out.len(), self.width());
        let mut hits = [0usize; 3];

        for (slot, kind) in out.iter_mut().zip(&self.kinds) {
            *slot = match kind {
                ColumnKind::Numeric(field) => record.numeric(*field),
                ColumnKind::Indicator { field, value } => {
                    if record.category(*field) == value.as_str() {
                        hits[*field as usize] += 1;
                        1.0
                    } else {
                        0.0
                    }
                }
            };
        }

        for field in CategoricalField::ALL {
            if hits[field as usize] == 0 {
                return Err(SchemaMismatch::UnseenCategory {
                    field: field.name(),
                    value: record.category(field).to_string(),
                });
            }
        }
        Ok(())
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Check that a row was built for exactly this column layout.
    pub fn check(&self, row: &EncodedRow) -> Result<(), SchemaMismatch> {
        self.check_width(row.width())?;
        if Arc::ptr_eq(&self.names, row.shared_names()) {
            return Ok(());
        }
        for (position, (expected, got)) in self.names.iter().zip(row.names()).enumerate() {
            if expected != got {
                return Err(SchemaMismatch::ColumnMismatch {
                    position,
                    expected: expected.clone(),
                    got: got.clone(),
                });
            }
        }
        Ok(())
    }

    /// Check a bare vector width.
    pub fn check_width(&self, width: usize) -> Result<(), SchemaMismatch> {
        if width != self.width() {
            return Err(SchemaMismatch::WidthMismatch {
                expected: self.width(),
                got: width,
            });
        }
        Ok(())
    }
}

impl PartialEq for FeatureSchema {
    fn eq(&self, other: &Self) -> bool {
        self.names == other.names
    }
}

impl Eq for FeatureSchema {}

/// Indicator name for a typed categorical value.
pub fn indicator_for<C: Categorical>(value: C) -> String {
    indicator_name(C::FIELD, value.label())
}
