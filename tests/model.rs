//! Integration tests for loading the example model.
use broadband_rollout::geotype::Geotype;
use broadband_rollout::input::load_model;
use broadband_rollout::model::ScenarioID;
use std::path::PathBuf;

/// Get the path to the example model.
fn get_model_dir() -> PathBuf {
    PathBuf::from("demos/simple")
}

#[test]
fn test_load_model() {
    let model = load_model(get_model_dir()).unwrap();
    assert_eq!(model.assets.len(), 10);
    assert_eq!(model.iter_years().collect::<Vec<_>>(), (2020..=2025).collect::<Vec<_>>());

    // Explicit geotypes are kept as given
    let dp09 = model.assets.iter().find(|asset| asset.id.0.as_ref() == "dp09").unwrap();
    assert_eq!(dp09.geotype, Geotype::Below1kLong);

    for scenario in ["baseline", "high"] {
        let targets = model.adoption_targets(&ScenarioID::from(scenario)).unwrap();
        assert_eq!(targets.len(), 6);
    }
}
