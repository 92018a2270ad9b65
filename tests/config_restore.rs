use std::fs;
use std::path::PathBuf;

use shareplot::config::{
    AppConfig, BaselineMode, CdfFigureConfig, OutputConfig, PacketFigureConfig, RecoveryConfig,
};
use shareplot::core::recovery::Normalization;
use shareplot::data::run_params::Param;
use shareplot::error::PlotError;
use shareplot::paper::figure::{LineStyle, OutputFormat};

fn unique_path(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!(
        "shareplot_config_restore_{}_{}",
        name,
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    path
}

fn assert_close(a: f64, b: f64, label: &str) {
    let diff = (a - b).abs();
    assert!(diff <= 1e-9, "{label} mismatch: {a} vs {b}");
}

fn assert_config_eq(actual: &AppConfig, expected: &AppConfig) {
    assert_eq!(actual.output.dir, expected.output.dir);
    assert_eq!(actual.output.format, expected.output.format);
    assert_eq!(actual.output.width, expected.output.width);
    assert_eq!(actual.output.height, expected.output.height);
    assert_eq!(actual.output.font_size, expected.output.font_size);
    assert_eq!(actual.recovery.groups, expected.recovery.groups);
    assert_eq!(
        actual.recovery.shares_per_group,
        expected.recovery.shares_per_group
    );
    assert_eq!(actual.recovery.normalization, expected.recovery.normalization);
    assert_eq!(actual.recovery.file_stem, expected.recovery.file_stem);
    assert_eq!(actual.cdf.iterations, expected.cdf.iterations);
    assert_close(actual.cdf.epsilon, expected.cdf.epsilon, "cdf.epsilon");
    assert_eq!(actual.cdf.colors, expected.cdf.colors);
    assert_eq!(actual.cdf.figures, expected.cdf.figures);
    assert_eq!(actual.cdf.overlays, expected.cdf.overlays);
    assert_eq!(actual.comparison.output_folder, expected.comparison.output_folder);
    assert_eq!(actual.comparison.figures, expected.comparison.figures);
    assert_eq!(actual.expected.figures, expected.expected.figures);
    assert_close(
        actual.expected.bar_width,
        expected.expected.bar_width,
        "expected.bar_width",
    );
    assert_eq!(actual.timing.value_column, expected.timing.value_column);
    assert_eq!(actual.timing.figures, expected.timing.figures);
    assert_close(actual.packet.divisor, expected.packet.divisor, "packet.divisor");
    assert_eq!(actual.packet.folder, expected.packet.folder);
    assert_eq!(actual.packet.figures, expected.packet.figures);
}

#[test]
fn config_roundtrip_default_toml() {
    let default_cfg = AppConfig::default();
    let text = toml::to_string_pretty(&default_cfg).expect("serialize default");
    let parsed: AppConfig = toml::from_str(&text).expect("parse default");
    assert_config_eq(&parsed, &default_cfg);
}

#[test]
fn config_load_custom_values() {
    let path = unique_path("custom.toml");
    let path_str = path.to_string_lossy().to_string();
    let mut custom = AppConfig {
        output: OutputConfig {
            dir: "figures".into(),
            format: OutputFormat::Png,
            width: 1024,
            height: 768,
            font_size: 22,
        },
        recovery: RecoveryConfig {
            groups: 5,
            shares_per_group: 8,
            normalization: Normalization::PerPoint,
            file_stem: "plot-prob-5x8".into(),
            ..RecoveryConfig::default()
        },
        ..AppConfig::default()
    };
    custom.cdf.epsilon = 0.01;
    custom.cdf.figures = vec![CdfFigureConfig {
        param: Param::Subsecrets,
        relevant_dir: "p-add-ss".into(),
        values: vec![10, 20],
        legend: "Subsecrets".into(),
        baseline: BaselineMode::Shared,
    }];
    custom.packet.figures = vec![PacketFigureConfig {
        name: "th".into(),
        file: "results-th.csv".into(),
        group_column: 2,
        total_column: 3,
        relevant_column: 5,
        step: None,
        max: Some(40.0),
        filter_column: Some(1),
        filter_value: Some(150.0),
        x_label: "Threshold".into(),
    }];
    let text = toml::to_string_pretty(&custom).expect("serialize custom");
    fs::write(&path, text).expect("write custom config");

    let loaded = AppConfig::load_or_default(&path_str).unwrap();
    assert_config_eq(&loaded, &custom);

    let _ = fs::remove_file(&path);
}

#[test]
fn config_missing_file_fallback() {
    let path = unique_path("missing.toml");
    let path_str = path.to_string_lossy().to_string();
    let _ = fs::remove_file(&path);

    let loaded = AppConfig::load_or_default(&path_str).unwrap();
    let defaults = AppConfig::default();
    assert!(path.exists(), "missing config should be created");
    assert_config_eq(&loaded, &defaults);

    let _ = fs::remove_file(&path);
}

#[test]
fn config_unparsable_file_is_an_error() {
    let path = unique_path("broken.toml");
    let path_str = path.to_string_lossy().to_string();
    fs::write(&path, "[recovery\ngroups = ").expect("write broken config");

    let err = AppConfig::load_or_default(&path_str).unwrap_err();
    assert!(matches!(err, PlotError::InvalidConfig(_)), "{err}");
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "[recovery\ngroups = ",
        "a broken config is left untouched"
    );

    let _ = fs::remove_file(&path);
}

#[test]
fn config_unknown_enum_value_is_an_error() {
    let path = unique_path("typo.toml");
    let path_str = path.to_string_lossy().to_string();
    fs::write(
        &path,
        "[recovery]\ngroups = 4\nshares_per_group = 6\nnormalization = \"perpoint\"\n",
    )
    .expect("write config");

    let err = AppConfig::load_or_default(&path_str).unwrap_err();
    match err {
        PlotError::InvalidConfig(message) => {
            assert!(message.contains("perpoint"), "{message}");
        }
        other => panic!("expected InvalidConfig, got {other:?}"),
    }

    let _ = fs::remove_file(&path);
}

#[test]
fn config_overlay_and_comparison_sections_parse() {
    let text = r#"
[[cdf.overlays]]
name = "add-hint"
param = "anonymity"
value = 100

[[cdf.overlays.schemes]]
relevant_dir = "p-add-an"
label = "Additive"

[[cdf.overlays.schemes]]
relevant_dir = "p-hint-an"
label = "Hinted"
extra = 5
style = "dotted"

[comparison]
iterations = 200

[[comparison.figures]]
name = "anonymity"
relevant_dir = "p-adv-an"
obtain = [80]
"#;
    let parsed: AppConfig = toml::from_str(text).expect("parse overlay and comparison");
    let overlay = &parsed.cdf.overlays[0];
    assert_eq!(overlay.schemes.len(), 2);
    assert_eq!(overlay.schemes[0].style, LineStyle::Solid);
    assert_eq!(overlay.schemes[0].extra, None);
    assert_eq!(overlay.schemes[1].style, LineStyle::Dotted);
    assert_eq!(overlay.schemes[1].extra, Some(5));
    assert_eq!(parsed.comparison.iterations, 200);
    assert_eq!(parsed.comparison.figures[0].obtain, vec![80]);
    assert!(parsed.comparison.figures[0].grids.is_empty());
    assert_eq!(parsed.comparison.output_folder, "prob-comparison");
}

#[test]
fn config_baseline_mode_parses_kebab_case() {
    let text = r#"
[cdf]
iterations = 500

[[cdf.figures]]
param = "threshold"
relevant_dir = "p-add-th"
baseline = "shared"
"#;
    let parsed: AppConfig = toml::from_str(text).expect("parse cdf figure");
    assert_eq!(parsed.cdf.iterations, 500);
    assert_eq!(parsed.cdf.figures.len(), 1);
    let fig = &parsed.cdf.figures[0];
    assert_eq!(fig.param, Param::Threshold);
    assert_eq!(fig.baseline, BaselineMode::Shared);
    assert!(fig.values.is_empty());
}
