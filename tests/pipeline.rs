use std::fs;
use std::path::Path;

use pjm_load_forecast::app::pipeline::{FAILURE_FILE, run_training};
use pjm_load_forecast::data::{SynthConfig, write_sample_csvs};
use pjm_load_forecast::domain::{TrainingPaths, Zone};
use pjm_load_forecast::error::ErrorKind;
use pjm_load_forecast::forecast::{ForecastRequest, render_forecast};
use pjm_load_forecast::io::{artifact_path, load_bundle, read_table};
use pjm_load_forecast::report::DIAGNOSTICS_FILE;

fn seed_input(root: &Path) -> TrainingPaths {
    let paths = TrainingPaths::under(root);
    write_sample_csvs(&paths.input, &SynthConfig::default()).unwrap();
    paths
}

#[test]
fn training_run_produces_bundle_artifact_and_diagnostics() {
    let dir = tempfile::tempdir().unwrap();
    let paths = seed_input(dir.path());

    let bundle_path = run_training(&paths).unwrap();
    assert_eq!(bundle_path, paths.model.join("model.json"));
    assert!(bundle_path.is_file());
    assert!(paths.output.join(DIAGNOSTICS_FILE).is_file());
    assert!(!paths.output.join(FAILURE_FILE).exists());

    // 3 days of 10-minute readings for two zones.
    let table = read_table(&artifact_path(&paths.input)).unwrap();
    assert_eq!(table.len(), 2 * 3 * 144);
    assert!(table.windows(2).all(|w| w[0].datetime <= w[1].datetime));
    let pe: Vec<_> = table.iter().filter(|r| r.zone == Zone::Pe).collect();
    assert!(pe[..12].iter().all(|r| r.load_diffed.is_none()));
    let expected = pe[12].load - pe[0].load;
    assert!((pe[12].load_diffed.unwrap() - expected).abs() < 1e-9);

    let model = load_bundle(&bundle_path).unwrap();
    assert_eq!(model.fitted_zones(), vec![Zone::Pe, Zone::Pep]);

    let text = render_forecast(&model, &ForecastRequest::new("2021-02-01", "01:00", "PE")).unwrap();
    let value: f64 = text.strip_suffix(" MW").unwrap().parse().unwrap();
    assert!(value > 3000.0 && value < 5500.0, "implausible PE load {value}");
}

#[test]
fn rerunning_training_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let paths = seed_input(dir.path());

    let first = fs::read_to_string(run_training(&paths).unwrap()).unwrap();
    let second = fs::read_to_string(run_training(&paths).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn empty_input_fails_with_marker() {
    let dir = tempfile::tempdir().unwrap();
    let paths = TrainingPaths::under(dir.path());
    fs::create_dir_all(&paths.input).unwrap();

    let err = run_training(&paths).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoData);
    assert_eq!(err.exit_code(), 3);

    let marker = fs::read_to_string(paths.output.join(FAILURE_FILE)).unwrap();
    assert!(marker.starts_with("Exception raised during training"));
    assert!(!paths.model.join("model.json").exists());
}

#[test]
fn hyperparameters_drive_the_seasonal_lag() {
    let dir = tempfile::tempdir().unwrap();
    let paths = seed_input(dir.path());
    fs::create_dir_all(&paths.config).unwrap();
    fs::write(paths.config.join("hyperparameters.json"), r#"{"season_len": "6"}"#).unwrap();

    run_training(&paths).unwrap();
    let table = read_table(&artifact_path(&paths.input)).unwrap();
    let pep: Vec<_> = table.iter().filter(|r| r.zone == Zone::Pep).collect();
    assert!(pep[5].load_diffed.is_none());
    assert!(pep[6].load_diffed.is_some());
}
