mod common;
use approx::assert_abs_diff_eq;
use common::Fixture;
use mindmotor::io::read_tensors;
use mindmotor::{
    extract_csp_features, run_epoch_extraction, write_features, write_features_with_view,
    ComponentOrder, Csp, CspConfig, DisplayConfig, Error, PipelineConfig,
};

fn fixture_path(dir: &std::path::Path) -> std::path::PathBuf {
    Fixture::motor_imagery(120, &[4, 50, 77]).write(dir, "subject")
}

#[test]
fn refit_reproduces_filters() {
    let dir = tempfile::tempdir().unwrap();
    let path = fixture_path(dir.path());
    let cfg = PipelineConfig::default();

    let (a, fa) = extract_csp_features(&path, &cfg).unwrap();
    let (b, fb) = extract_csp_features(&path, &cfg).unwrap();
    for (x, y) in a.filters().iter().zip(b.filters().iter()) {
        assert_abs_diff_eq!(x, y, epsilon = 1e-10);
    }
    for (x, y) in fa.iter().zip(fb.iter()) {
        assert_abs_diff_eq!(x, y, epsilon = 1e-10);
    }
}

#[test]
fn leading_filters_find_the_motor_channels() {
    let dir = tempfile::tempdir().unwrap();
    let path = fixture_path(dir.path());
    let (model, _) = extract_csp_features(&path, &PipelineConfig::default()).unwrap();

    let peak = |k: usize| {
        let p = model.patterns().row(k).to_owned();
        let idx = (0..p.len()).max_by(|&i, &j| p[i].abs().total_cmp(&p[j].abs())).unwrap();
        model.ch_names()[idx].clone()
    };
    let leading = [peak(0), peak(1)];
    assert!(leading.contains(&"C3".to_string()), "leading patterns peak at {leading:?}");
    assert!(leading.contains(&"C4".to_string()), "leading patterns peak at {leading:?}");
    let d0 = (model.eigenvalues()[0] - 0.5).abs();
    assert!(d0 > 0.3, "|λ₀ − 0.5| = {d0}");
}

#[test]
fn log_features_separate_the_classes() {
    let dir = tempfile::tempdir().unwrap();
    let path = fixture_path(dir.path());
    let cfg = PipelineConfig::default();
    let epochs = run_epoch_extraction(&path, &cfg).unwrap();
    let (_, features) = Csp::new(cfg.csp.clone())
        .unwrap()
        .fit_transform(epochs.get_data(), epochs.targets())
        .unwrap();

    let mean_of = |class: u8| {
        let rows: Vec<f64> = epochs
            .targets()
            .iter()
            .zip(features.column(0))
            .filter(|&(&t, _)| t == class)
            .map(|(_, &f)| f)
            .collect();
        rows.iter().sum::<f64>() / rows.len() as f64
    };
    assert!((mean_of(0) - mean_of(1)).abs() > 1.0);
}

#[test]
fn alternate_order_still_yields_n_components() {
    let dir = tempfile::tempdir().unwrap();
    let path = fixture_path(dir.path());
    let cfg = PipelineConfig {
        csp: CspConfig {
            n_components: 2,
            component_order: ComponentOrder::Alternate,
            ..CspConfig::default()
        },
        ..PipelineConfig::default()
    };
    let (model, features) = extract_csp_features(&path, &cfg).unwrap();
    assert_eq!(features.ncols(), 2);
    // Largest eigenvalue first, then the smallest.
    let eig = model.eigenvalues();
    assert!(eig[0] > 0.5 && eig[1] < 0.5);
    assert!(eig.iter().all(|&l| l <= eig[0] && l >= eig[1]));
}

#[test]
fn invalid_settings_fail_before_reading() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.mat");
    let bad_reg = PipelineConfig {
        csp: CspConfig { reg: "graphical_lasso".into(), ..CspConfig::default() },
        ..PipelineConfig::default()
    };
    assert!(matches!(extract_csp_features(&missing, &bad_reg), Err(Error::Config(_))));
}

#[test]
fn more_components_than_channels() {
    let dir = tempfile::tempdir().unwrap();
    let path = fixture_path(dir.path());
    let cfg = PipelineConfig {
        csp: CspConfig { n_components: 7, ..CspConfig::default() },
        ..PipelineConfig::default()
    };
    assert!(matches!(extract_csp_features(&path, &cfg), Err(Error::Config(_))));
}

#[test]
fn every_estimator_fits() {
    let dir = tempfile::tempdir().unwrap();
    let path = fixture_path(dir.path());
    for reg in ["ledoit_wolf", "oas", "empirical", "shrunk", "0.3"] {
        let cfg = PipelineConfig {
            csp: CspConfig { reg: reg.into(), ..CspConfig::default() },
            ..PipelineConfig::default()
        };
        let (_, features) = extract_csp_features(&path, &cfg).unwrap();
        assert_eq!(features.dim(), (117, 4), "reg = {reg}");
    }
}

#[test]
fn exported_file_matches_the_model() {
    let dir = tempfile::tempdir().unwrap();
    let path = fixture_path(dir.path());
    let cfg = PipelineConfig::default();
    let epochs = run_epoch_extraction(&path, &cfg).unwrap();
    let model = Csp::new(cfg.csp.clone()).unwrap().fit_epochs(&epochs).unwrap();
    let features = model.transform(epochs.get_data()).unwrap();

    let out = dir.path().join("features.safetensors");
    write_features(&out, &model, &features, epochs.targets()).unwrap();
    let tensors = read_tensors(&std::fs::read(&out).unwrap()).unwrap();

    assert_eq!(tensors["features"].shape, vec![117, 4]);
    assert_eq!(tensors["features"].to_f64().unwrap(), features.iter().copied().collect::<Vec<_>>());
    let targets: Vec<i32> = epochs.targets().iter().map(|&t| t as i32).collect();
    assert_eq!(tensors["targets"].to_i32().unwrap(), targets);
    assert_eq!(tensors["patterns"].shape, vec![4, 6]);
    assert_eq!(tensors["filters"].shape, vec![4, 6]);
    let names = String::from_utf8(tensors["ch_names"].bytes.clone()).unwrap();
    assert_eq!(names.split('\n').collect::<Vec<_>>(), common::CHANNELS.to_vec());
}

#[test]
fn exported_view_drops_unplottable_channels() {
    let dir = tempfile::tempdir().unwrap();
    let path = fixture_path(dir.path());
    let (model, features) = extract_csp_features(&path, &PipelineConfig::default()).unwrap();
    let targets = run_epoch_extraction(&path, &PipelineConfig::default()).unwrap().targets().to_vec();
    let view = model.pattern_view(&DisplayConfig::bci_competition_iva());

    let out = dir.path().join("features.safetensors");
    write_features_with_view(&out, &model, &features, &targets, &view).unwrap();
    let tensors = read_tensors(&std::fs::read(&out).unwrap()).unwrap();

    assert_eq!(tensors["view_patterns"].shape, vec![4, 5]);
    assert_eq!(
        tensors["view_patterns"].to_f64().unwrap(),
        view.patterns.iter().copied().collect::<Vec<_>>()
    );
    let names = String::from_utf8(tensors["view_ch_names"].bytes.clone()).unwrap();
    assert_eq!(names, "FC3\nC3\nCz\nC4\nCP4");
    assert_eq!(tensors["patterns"].shape, vec![4, 6]);

    let mut short = view.clone();
    short.ch_names.pop();
    assert!(matches!(
        write_features_with_view(&out, &model, &features, &targets, &short),
        Err(Error::Shape(_))
    ));
}

#[test]
fn mismatched_targets_rejected_on_export() {
    let dir = tempfile::tempdir().unwrap();
    let path = fixture_path(dir.path());
    let (model, features) = extract_csp_features(&path, &PipelineConfig::default()).unwrap();
    let out = dir.path().join("features.safetensors");
    assert!(matches!(write_features(&out, &model, &features, &[0, 1]), Err(Error::Shape(_))));
}
