//! Serving workflow: initialization, persistence and prediction failures.

mod common;

use harmony_splash::data::InputError;
use harmony_splash::encoding::{EncodedRow, SchemaMismatch};
use harmony_splash::io::{DeserializeError, PersistenceError};
use harmony_splash::model::FittedModel;
use harmony_splash::serving::{ModelSource, ServingState};
use harmony_splash::testing::{synthetic_csv, synthetic_dataset};
use harmony_splash::Error;

use common::{example_inbound, example_record, small_config, write_file};

#[test]
fn predict_before_initialize_is_not_fitted() {
    let state = ServingState::new();
    assert!(matches!(state.predict(&example_inbound()), Err(Error::NotFitted)));
    assert!(matches!(
        state.predict_record(&example_record()),
        Err(Error::NotFitted)
    ));
    assert!(state.model().is_none());
}

#[test]
fn saved_model_serves_identical_predictions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.hspl");
    let (model, _) = FittedModel::train(&synthetic_dataset(80, 13), &small_config(6)).unwrap();
    model.save(&path).unwrap();

    let trained = ServingState::from_model(model);
    let mut loaded = ServingState::new();
    loaded.initialize(&ModelSource::Load { path }).unwrap();

    for record in synthetic_dataset(25, 77).records() {
        assert_eq!(
            trained.predict_record(record).unwrap(),
            loaded.predict_record(record).unwrap()
        );
    }
    assert_eq!(trained.model().unwrap().schema(), loaded.model().unwrap().schema());
}

#[test]
fn failed_reload_drops_the_served_model() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = write_file(dir.path(), "data.csv", &synthetic_csv(60, 2));
    let mut state = ServingState::new();
    state
        .initialize(&ModelSource::Train {
            dataset,
            config: small_config(1),
            save_to: None,
        })
        .unwrap();
    assert!(state.predict(&example_inbound()).is_ok());

    let corrupt = write_file(dir.path(), "broken.hspl", &"x".repeat(64));
    let err = state
        .initialize(&ModelSource::Load { path: corrupt })
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Persistence(PersistenceError::Deserialize(DeserializeError::NotAModel))
    ));
    assert!(!state.is_ready());
    assert!(matches!(state.predict(&example_inbound()), Err(Error::NotFitted)));
}

#[test]
fn missing_dataset_leaves_state_uninitialized() {
    let dir = tempfile::tempdir().unwrap();
    let mut state = ServingState::new();
    let err = state
        .initialize(&ModelSource::LoadOrTrain {
            model: dir.path().join("model.hspl"),
            dataset: dir.path().join("missing.csv"),
            config: small_config(1),
            save: true,
        })
        .unwrap_err();
    assert_eq!(err.kind(), "DataError");
    assert!(!state.is_ready());
    assert!(!dir.path().join("model.hspl").exists());
}

#[test]
fn train_source_saves_when_asked() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = write_file(dir.path(), "data.csv", &synthetic_csv(60, 3));
    let target = dir.path().join("out").join("model.hspl");

    let mut state = ServingState::new();
    let served = state
        .initialize(&ModelSource::Train {
            dataset,
            config: small_config(2),
            save_to: Some(target.clone()),
        })
        .unwrap()
        .clone();

    assert_eq!(FittedModel::load(&target).unwrap(), served);
}

#[test]
fn inbound_problems_surface_as_typed_errors() {
    let (model, _) = FittedModel::train(&synthetic_dataset(60, 4), &small_config(3)).unwrap();
    let state = ServingState::from_model(model);

    let mut missing = example_inbound();
    assert_eq!(missing.remove("FlowRate").as_deref(), Some("10"));
    assert!(matches!(
        state.predict(&missing),
        Err(Error::InvalidInput(InputError::MissingField { field: "FlowRate" }))
    ));

    let not_a_number = example_inbound().with("RoomTemp", "warm");
    assert!(matches!(
        state.predict(&not_a_number),
        Err(Error::InvalidInput(InputError::InvalidNumber { field: "RoomTemp", .. }))
    ));

    let unknown_activity = example_inbound().with("Activity", "Gardening");
    assert!(matches!(
        state.predict(&unknown_activity),
        Err(Error::SchemaMismatch(SchemaMismatch::UnseenCategory { field: "Activity", .. }))
    ));

    // Outside the slider range is still accepted.
    let cold = example_inbound().with("ExternalTemp", -20);
    assert!(state.predict(&cold).unwrap().value.is_finite());
}

#[test]
fn encoded_row_with_foreign_layout_is_rejected() {
    let (model, _) = FittedModel::train(&synthetic_dataset(60, 4), &small_config(3)).unwrap();
    let row = model.schema().encode_record(&example_record()).unwrap();
    let mut names = row.names().to_vec();
    names.reverse();
    let foreign = EncodedRow::new(names, row.values().to_vec()).unwrap();

    let state = ServingState::from_model(model);
    assert!(state.predict_row(&row).is_ok());
    assert!(matches!(
        state.predict_row(&foreign),
        Err(Error::SchemaMismatch(SchemaMismatch::ColumnMismatch { position: 0, .. }))
    ));
}
