//! Encoded feature vector.

use std::sync::Arc;

use super::schema::SchemaMismatch;

/// A numeric feature vector together with the column names it was built for.
///
/// Rows produced by [`FeatureSchema::encode_record`](super::FeatureSchema::encode_record)
/// share the schema's name list, so checking them against that schema is a
/// pointer comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRow {
    names: Arc<[String]>,
    values: Vec<f64>,
}

impl EncodedRow {
    /// Build a row from explicit names and values.
    pub fn new(names: Vec<String>, values: Vec<f64>) -> Result<Self, SchemaMismatch> {
        if names.len() != values.len() {
            return Err(SchemaMismatch::WidthMismatch {
                expected: names.len(),
                got: values.len(),
            });
        }
        Ok(Self {
            names: names.into(),
            values,
        })
    }

    pub(crate) fn bound(names: Arc<[String]>, values: Vec<f64>) -> Self {
        debug_assert_eq!(names.len(), values.len());
        Self { names, values }
    }

    /// Number of columns.
    #[inline]
    pub fn width(&self) -> usize {
        self.values.len()
    }

    /// Column names in order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub(crate) fn shared_names(&self) -> &Arc<[String]> {
        &self.names
    }

    /// Values in column order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Value of a named column.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i])
    }

    /// Iterate over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    /// Consume the row and return its values.
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_checks_lengths() {
        let err = EncodedRow::new(vec!["a".into(), "b".into()], vec![1.0]).unwrap_err();
        assert_eq!(err, SchemaMismatch::WidthMismatch { expected: 2, got: 1 });
    }

    #[test]
    fn lookup_by_name() {
        let row = EncodedRow::new(vec!["a".into(), "b".into()], vec![1.0, 2.0]).unwrap();
        assert_eq!(row.get("b"), Some(2.0));
        assert_eq!(row.get("c"), None);
        assert_eq!(row.iter().collect::<Vec<_>>(), vec![("a", 1.0), ("b", 2.0)]);
    }
}
