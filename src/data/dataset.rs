//! Tabular training dataset.
//!
//! The dataset is read from CSV with the columns
//! `UserID, Activity, TimeOfDay, Season, ExternalTemp, RoomTemp, RoomHumidity,
//! FlowRate, ColdWaterTemp, DesiredTemp`. `UserID` is an identifier and is
//! never read; extra columns are ignored.
//!
//! Rows with any missing required cell are dropped before anything else
//! looks at them. Cells count as missing when empty or one of the usual
//! null markers (`NA`, `N/A`, `NaN`, `null`, `None`, case-insensitive).

use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::{info, warn};
use ndarray::Array1;

use super::error::DataError;
use super::record::{
    Activity, Categorical, CategoricalField, NumericField, RawRecord, Season, TimeOfDay,
    TrainingRow,
};

/// Name of the supervised target column.
pub const TARGET_COLUMN: &str = "DesiredTemp";

const MISSING_MARKERS: [&str; 6] = ["na", "n/a", "nan", "null", "none", "<na>"];

fn is_missing(cell: &str) -> bool {
    let cell = cell.trim();
    cell.is_empty() || MISSING_MARKERS.iter().any(|m| cell.eq_ignore_ascii_case(m))
}

// =============================================================================
// TrainingDataset
// =============================================================================

/// Complete training rows plus a count of the rows that were discarded.
#[derive(Debug, Clone, Default)]
pub struct TrainingDataset {
    rows: Vec<TrainingRow>,
    n_dropped: usize,
}

impl TrainingDataset {
    /// Build a dataset from rows that are already complete.
    pub fn from_rows(rows: Vec<TrainingRow>) -> Self {
        Self { rows, n_dropped: 0 }
    }

    /// Read a CSV file.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let dataset = Self::from_csv_reader(file)?;
        info!(
            "loaded {} complete rows from {} ({} dropped)",
            dataset.len(),
            path.display(),
            dataset.n_dropped()
        );
        Ok(dataset)
    }

    /// Read CSV data from any reader. The first line must be a header.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, DataError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let columns = ColumnIndex::from_headers(rdr.headers()?)?;

        let mut rows = Vec::new();
        let mut n_dropped = 0usize;
        for result in rdr.records() {
            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            if columns.required().any(|idx| is_missing(record.get(idx).unwrap_or(""))) {
                n_dropped += 1;
                continue;
            }

            rows.push(columns.parse_row(&record, line)?);
        }

        if n_dropped > 0 {
            warn!("dropped {} rows with missing values", n_dropped);
        }

        Ok(Self { rows, n_dropped })
    }

    /// Number of complete rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when no complete rows remain.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows discarded for missing values.
    pub fn n_dropped(&self) -> usize {
        self.n_dropped
    }

    /// All complete rows, in file order.
    pub fn rows(&self) -> &[TrainingRow] {
        &self.rows
    }

    /// Iterate over the raw records (features only).
    pub fn records(&self) -> impl Iterator<Item = &RawRecord> + '_ {
        self.rows.iter().map(|r| &r.record)
    }

    /// Target vector (`DesiredTemp`) in row order.
    pub fn targets(&self) -> Array1<f64> {
        self.rows.iter().map(|r| r.desired_temp).collect()
    }

    /// Fail unless at least `required` complete rows are available.
    pub fn ensure_min_rows(&self, required: usize) -> Result<(), DataError> {
        if self.rows.len() < required {
            return Err(DataError::InsufficientRows {
                found: self.rows.len(),
                required,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Column lookup
// =============================================================================

/// Header positions of every column the loader reads.
struct ColumnIndex {
    categorical: [usize; 3],
    numeric: [usize; 5],
    target: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, DataError> {
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or(DataError::MissingColumn { column: name })
        };

        let mut categorical = [0usize; 3];
        for (slot, field) in categorical.iter_mut().zip(CategoricalField::ALL) {
            *slot = find(field.name())?;
        }
        let mut numeric = [0usize; 5];
        for (slot, field) in numeric.iter_mut().zip(NumericField::ALL) {
            *slot = find(field.name())?;
        }
        let target = find(TARGET_COLUMN)?;

        Ok(Self {
            categorical,
            numeric,
            target,
        })
    }

    fn required(&self) -> impl Iterator<Item = usize> + '_ {
        self.categorical
            .iter()
            .chain(self.numeric.iter())
            .chain(std::iter::once(&self.target))
            .copied()
    }

    fn parse_row(&self, record: &csv::StringRecord, line: u64) -> Result<TrainingRow, DataError> {
        let cell = |idx: usize| record.get(idx).unwrap_or("").trim();

        let number = |idx: usize, column: &'static str| {
            let raw = cell(idx);
            raw.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| DataError::InvalidNumber {
                    line,
                    column,
                    value: raw.to_string(),
                })
        };

        let numeric: Vec<f64> = NumericField::ALL
            .into_iter()
            .zip(self.numeric)
            .map(|(field, idx)| number(idx, field.name()))
            .collect::<Result<_, _>>()?;

        let record = RawRecord {
            activity: parse_category::<Activity>(cell(self.categorical[0]), line)?,
            time_of_day: parse_category::<TimeOfDay>(cell(self.categorical[1]), line)?,
            season: parse_category::<Season>(cell(self.categorical[2]), line)?,
            external_temp: numeric[0],
            room_temp: numeric[1],
            room_humidity: numeric[2],
            flow_rate: numeric[3],
            cold_water_temp: numeric[4],
        };

        Ok(TrainingRow {
            record,
            desired_temp: number(self.target, TARGET_COLUMN)?,
        })
    }
}

fn parse_category<C: Categorical>(raw: &str, line: u64) -> Result<C, DataError> {
    C::from_label(raw).ok_or_else(|| DataError::UnknownCategory {
        line,
        field: C::FIELD.name(),
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "UserID,Activity,TimeOfDay,Season,ExternalTemp,RoomTemp,RoomHumidity,FlowRate,ColdWaterTemp,DesiredTemp\n";

    fn load(body: &str) -> Result<TrainingDataset, DataError> {
        TrainingDataset::from_csv_reader(format!("{HEADER}{body}").as_bytes())
    }

    #[test]
    fn loads_complete_rows() {
        let ds = load(
            "1,Shower,Morning,Winter,5,22,55,10,8,40.5\n\
             2,Hand Washing,Evening,Summer,30,25,60,8,18,31\n",
        )
        .unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.n_dropped(), 0);
        assert_eq!(ds.rows()[1].record.activity, Activity::HandWashing);
        assert_eq!(ds.targets().to_vec(), vec![40.5, 31.0]);
    }

    #[test]
    fn drops_rows_with_missing_cells() {
        let ds = load(
            "1,Shower,Morning,Winter,5,22,55,10,8,40.5\n\
             2,Laundry,Afternoon,Autumn,12,21,,15,11,38\n\
             3,Dishwashing,Evening,Spring,15,20,NaN,9,12,42\n\
             4,Shower,Evening,Summer,25,24,65,12,16,37\n",
        )
        .unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.n_dropped(), 2);
    }

    #[test]
    fn short_rows_are_dropped() {
        let ds = load(
            "1,Shower,Morning,Winter,5,22,55,10,8,40.5\n\
             2,Laundry,Afternoon,Autumn,12,21,15,11,38\n\
             3,Shower,Evening,Summer,25,24,65,12,16,37\n",
        )
        .unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.n_dropped(), 1);
        assert_eq!(ds.rows()[1].desired_temp, 37.0);
    }

    #[test]
    fn missing_user_id_value_does_not_drop() {
        let ds = load(",Shower,Morning,Winter,5,22,55,10,8,40.5\n").unwrap();
        assert_eq!(ds.len(), 1);
    }

    #[test]
    fn missing_target_column() {
        let csv = "Activity,TimeOfDay,Season,ExternalTemp,RoomTemp,RoomHumidity,FlowRate,ColdWaterTemp\n\
                   Shower,Morning,Winter,5,22,55,10,8\n";
        let err = TrainingDataset::from_csv_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DataError::MissingColumn { column: "DesiredTemp" }));
    }

    #[test]
    fn unknown_category_is_reported() {
        let err = load("1,Bath,Morning,Winter,5,22,55,10,8,40\n").unwrap_err();
        match err {
            DataError::UnknownCategory { field, value, line } => {
                assert_eq!(field, "Activity");
                assert_eq!(value, "Bath");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bad_number_is_reported() {
        let err = load("1,Shower,Morning,Winter,five,22,55,10,8,40\n").unwrap_err();
        assert!(matches!(
            err,
            DataError::InvalidNumber { column: "ExternalTemp", .. }
        ));
    }

    #[test]
    fn ensure_min_rows() {
        let ds = load("1,Shower,Morning,Winter,5,22,55,10,8,40.5\n").unwrap();
        assert!(matches!(
            ds.ensure_min_rows(2),
            Err(DataError::InsufficientRows { found: 1, required: 2 })
        ));
    }

    #[test]
    fn missing_markers() {
        for cell in ["", "  ", "NA", "n/a", "NaN", "null", "None"] {
            assert!(is_missing(cell), "{cell:?} should be missing");
        }
        assert!(!is_missing("0"));
        assert!(!is_missing("Shower"));
    }
}
