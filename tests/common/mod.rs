//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use harmony_splash::data::{Activity, InboundRecord, RawRecord, Season, TimeOfDay};
use harmony_splash::training::ForestConfig;

/// Small, fast forest used across the integration suites.
pub fn small_config(seed: u64) -> ForestConfig {
    ForestConfig::builder()
        .n_trees(12)
        .seed(seed)
        .build()
        .unwrap()
}

/// Shower, Morning, Winter, 5 / 22 / 55 / 10 / 8.
pub fn example_record() -> RawRecord {
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

/// [`example_record`] as the form layer would hand it over.
pub fn example_inbound() -> InboundRecord {
    InboundRecord::from(&example_record())
}

/// Write `contents` to `dir/name` and return the path.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}
