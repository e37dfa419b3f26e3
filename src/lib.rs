//! harmony-splash: desired water temperature prediction.
//!
//! A household describes an activity (shower, hand washing, dishwashing,
//! laundry), when it happens and the surrounding conditions; a seeded random
//! forest trained on past observations predicts the water temperature they
//! will want.
//!
//! # Key Types
//!
//! - [`data::TrainingDataset`] - CSV observations with incomplete rows dropped
//! - [`encoding::FeatureSchema`] - Frozen one-hot column layout
//! - [`model::FittedModel`] - Forest bound to its schema
//! - [`serving::ServingState`] - Explicitly owned model slot for predictions
//! - [`config::AppConfig`] - Layered settings for the binary
//!
//! # Training and Predicting
//!
//! ```
//! use harmony_splash::data::InboundRecord;
//! use harmony_splash::model::FittedModel;
//! use harmony_splash::serving::ServingState;
//! use harmony_splash::testing::synthetic_dataset;
//! use harmony_splash::training::ForestConfig;
//!
//! let config = ForestConfig::builder().n_trees(20).build().unwrap();
//! let (model, report) = FittedModel::train(&synthetic_dataset(96, 7), &config).unwrap();
//! println!("{report}");
//!
//! let state = ServingState::from_model(model);
//! let inbound = InboundRecord::new()
//!     .with("Activity", "Shower")
//!     .with("TimeOfDay", "Morning")
//!     .with("Season", "Winter")
//!     .with("ExternalTemp", 5)
//!     .with("RoomTemp", 22)
//!     .with("RoomHumidity", 55)
//!     .with("FlowRate", 10)
//!     .with("ColdWaterTemp", 8);
//! let prediction = state.predict(&inbound).unwrap();
//! assert!(prediction.value.is_finite());
//! ```

pub mod config;
pub mod data;
pub mod encoding;
pub mod io;
pub mod model;
pub mod repr;
pub mod serving;
pub mod testing;
pub mod training;

mod error;

pub use error::{Error, Result};
