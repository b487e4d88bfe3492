mod common;
use common::{Fixture, CHANNELS, FIRST_ONSET, TRIAL_SPACING};
use mindmotor::{
    extract_csp_features, load_subject_data, run_epoch_extraction, DisplayConfig, Error,
    PipelineConfig,
};

/// 12 unlabeled trials spread over the session.
fn unlabeled() -> Vec<usize> {
    (0..12).map(|i| 5 + i * 23).collect()
}

#[test]
fn nan_trials_are_dropped_with_their_positions() {
    let dir = tempfile::tempdir().unwrap();
    let path = Fixture::motor_imagery(280, &unlabeled()).write(dir.path(), "aa");

    let (recording, events) = load_subject_data(&path, "eeg").unwrap();
    assert_eq!(events.len(), 268);
    assert!(events.iter().all(|e| e.class_code <= 1 && e.reserved == 0));
    // Every surviving event keeps its own onset: trial i sits at FIRST_ONSET + i·spacing.
    for e in &events {
        let trial = (e.sample - FIRST_ONSET) / TRIAL_SPACING;
        assert_eq!((e.sample - FIRST_ONSET) % TRIAL_SPACING, 0);
        assert!(!unlabeled().contains(&trial));
        assert_eq!(e.class_code as usize, trial % 2);
    }
    assert!(events.windows(2).all(|w| w[0].sample < w[1].sample));
    assert_eq!(recording.ch_names(), CHANNELS.map(String::from).as_slice());
    assert_eq!(recording.sfreq(), 100);
}

#[test]
fn epochs_use_the_default_two_second_window() {
    let dir = tempfile::tempdir().unwrap();
    let path = Fixture::motor_imagery(280, &unlabeled()).write(dir.path(), "aa");

    let epochs = run_epoch_extraction(&path, &PipelineConfig::default()).unwrap();
    assert_eq!(epochs.get_data().dim(), (268, CHANNELS.len(), 201));
    assert_eq!(epochs.targets().len(), 268);
    let from_events: Vec<u8> = epochs.events().iter().map(|e| e.class_code).collect();
    assert_eq!(epochs.targets(), from_events.as_slice());
}

#[test]
fn label_three_fails_before_epoching() {
    let dir = tempfile::tempdir().unwrap();
    let mut fx = Fixture::motor_imagery(20, &[]);
    fx.y[7] = 3.0;
    let path = fx.write(dir.path(), "bad_label");
    assert!(matches!(load_subject_data(&path, "eeg"), Err(Error::Label(_))));
    assert!(matches!(run_epoch_extraction(&path, &PipelineConfig::default()), Err(Error::Label(_))));
}

#[test]
fn late_cue_aborts_the_whole_extraction() {
    let dir = tempfile::tempdir().unwrap();
    let mut fx = Fixture::motor_imagery(20, &[]);
    let n_t = fx.cnt.nrows();
    fx.pos[19] = (n_t - 50) as f64;
    let path = fx.write(dir.path(), "late");
    let err = run_epoch_extraction(&path, &PipelineConfig::default()).unwrap_err();
    assert!(matches!(err, Error::Bounds(_)));
}

#[test]
fn non_integer_sampling_rate_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut fx = Fixture::motor_imagery(4, &[]);
    fx.fs = 99.5;
    let path = fx.write(dir.path(), "fs");
    assert!(matches!(load_subject_data(&path, "eeg"), Err(Error::Config(_))));
}

#[test]
fn channel_name_count_mismatch_is_shape_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut fx = Fixture::motor_imagery(4, &[]);
    fx.ch_names.pop();
    let path = fx.write(dir.path(), "clab");
    assert!(matches!(load_subject_data(&path, "eeg"), Err(Error::Shape(_))));
}

#[test]
fn not_a_mat_file_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("junk.mat");
    std::fs::write(&path, b"definitely not a MAT file").unwrap();
    assert!(matches!(load_subject_data(&path, "eeg"), Err(Error::Parse(_))));
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.mat");
    assert!(matches!(load_subject_data(&path, "eeg"), Err(Error::Io(_))));
}

#[test]
fn compressed_file_loads_identically() {
    let dir = tempfile::tempdir().unwrap();
    let fx = Fixture::motor_imagery(30, &[3]);
    let plain = fx.write(dir.path(), "plain");
    let packed = dir.path().join("packed.mat");
    fx.to_writer().compressed(true).write(&packed).unwrap();

    let (a, ea) = load_subject_data(&plain, "eeg").unwrap();
    let (b, eb) = load_subject_data(&packed, "eeg").unwrap();
    assert_eq!(a.data(), b.data());
    assert_eq!(ea, eb);
}

#[test]
fn csp_features_have_one_row_per_trial() {
    let dir = tempfile::tempdir().unwrap();
    let path = Fixture::motor_imagery(280, &unlabeled()).write(dir.path(), "aa");

    let (model, features) = extract_csp_features(&path, &PipelineConfig::default()).unwrap();
    assert_eq!(features.dim(), (268, 4));
    assert!(features.iter().all(|v| v.is_finite()));
    assert_eq!(model.patterns().dim(), (4, CHANNELS.len()));
    // Pattern columns follow the recording's channel order.
    assert_eq!(model.ch_names(), CHANNELS.map(String::from).as_slice());
}

#[test]
fn pattern_view_keeps_channel_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = Fixture::motor_imagery(60, &[]).write(dir.path(), "small");
    let (model, _) = extract_csp_features(&path, &PipelineConfig::default()).unwrap();

    let view = model.pattern_view(&DisplayConfig::bci_competition_iva());
    assert_eq!(view.ch_names, vec!["FC3", "C3", "Cz", "C4", "CP4"]);
    assert_eq!(view.patterns.column(3), model.patterns().column(4));
}
