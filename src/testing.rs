//! Testing utilities.
//!
//! Deterministic synthetic household data for unit tests, integration tests
//! and doc examples.
//!
//! Categories cycle through every combination (`Activity` fastest, then
//! `TimeOfDay`, then `Season`), so any dataset with at least 48 rows observes
//! every label. Numeric fields are drawn uniformly from the form ranges. The
//! target is a fixed function of the inputs plus uniform noise in
//! `[-0.5, 0.5]`, strong enough for a small forest to pick up.

use rand::prelude::*;

use crate::data::{
    Activity, Categorical, NumericField, RawRecord, Season, TimeOfDay, TrainingDataset,
    TrainingRow,
};

/// CSV header used by [`synthetic_csv`].
pub const CSV_HEADER: &str = "UserID,Activity,TimeOfDay,Season,ExternalTemp,RoomTemp,RoomHumidity,FlowRate,ColdWaterTemp,DesiredTemp";

/// Noise-free desired temperature for a record.
pub fn reference_temperature(record: &RawRecord) -> f64 {
    let activity = match record.activity {
        Activity::Shower => 40.0,
        Activity::HandWashing => 33.0,
        Activity::Dishwashing => 45.0,
        Activity::Laundry => 50.0,
    };
    let time_of_day = match record.time_of_day {
        TimeOfDay::Morning => 1.5,
        TimeOfDay::Afternoon => -1.0,
        TimeOfDay::Evening => 0.5,
    };
    let season = match record.season {
        Season::Spring => 0.0,
        Season::Summer => -2.5,
        Season::Autumn => 1.0,
        Season::Winter => 3.0,
    };
    activity + time_of_day + season
        + 0.15 * (20.0 - record.external_temp)
        + 0.1 * (15.0 - record.cold_water_temp)
}

/// Generate `n` complete training rows from `seed`.
pub fn synthetic_rows(n: usize, seed: u64) -> Vec<TrainingRow> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut draw = |field: NumericField| {
        let (lo, hi) = field.ui_range();
        let v: f64 = rng.gen_range(lo..=hi);
        (v * 10.0).round() / 10.0
    };

    let mut rows = Vec::with_capacity(n);
    for i in 0..n {
        let record = RawRecord {
            activity: Activity::ALL[i % Activity::ALL.len()],
            time_of_day: TimeOfDay::ALL[(i / 4) % TimeOfDay::ALL.len()],
            season: Season::ALL[(i / 12) % Season::ALL.len()],
            external_temp: draw(NumericField::ExternalTemp),
            room_temp: draw(NumericField::RoomTemp),
            room_humidity: draw(NumericField::RoomHumidity),
            flow_rate: draw(NumericField::FlowRate),
            cold_water_temp: draw(NumericField::ColdWaterTemp),
        };
        rows.push(TrainingRow {
            record,
            desired_temp: 0.0,
        });
    }

    // Noise is drawn after the features so the feature stream does not
    // depend on the target formula.
    for row in &mut rows {
        let noise: f64 = rng.gen_range(-0.5..=0.5);
        row.desired_temp = ((reference_temperature(&row.record) + noise) * 10.0).round() / 10.0;
    }
    rows
}

/// [`synthetic_rows`] wrapped in a dataset.
pub fn synthetic_dataset(n: usize, seed: u64) -> TrainingDataset {
    TrainingDataset::from_rows(synthetic_rows(n, seed))
}

/// [`synthetic_rows`] rendered as CSV text with a header and `UserID` column.
pub fn synthetic_csv(n: usize, seed: u64) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for (i, row) in synthetic_rows(n, seed).iter().enumerate() {
        out.push_str(&csv_line(i + 1, row));
        out.push('\n');
    }
    out
}

/// One CSV line for a row, in [`CSV_HEADER`] order.
pub fn csv_line(user_id: usize, row: &TrainingRow) -> String {
    let r = &row.record;
    format!(
        "{},{},{},{},{},{},{},{},{},{}",
        user_id,
        r.activity.label(),
        r.time_of_day.label(),
        r.season.label(),
        r.external_temp,
        r.room_temp,
        r.room_humidity,
        r.flow_rate,
        r.cold_water_temp,
        row.desired_temp
    )
}
