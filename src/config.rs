use crate::core::recovery::Normalization;
use crate::data::run_params::Param;
use crate::error::PlotError;
use crate::paper::figure::{LineStyle, OutputFormat, RenderStyle};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "OutputConfig::default_dir")]
    pub dir: String,
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default = "OutputConfig::default_width")]
    pub width: u32,
    #[serde(default = "OutputConfig::default_height")]
    pub height: u32,
    #[serde(default = "OutputConfig::default_font_size")]
    pub font_size: u32,
}

impl OutputConfig {
    fn default_dir() -> String {
        "plots".to_string()
    }
    fn default_width() -> u32 {
        800
    }
    fn default_height() -> u32 {
        640
    }
    fn default_font_size() -> u32 {
        18
    }

    pub fn render_style(&self) -> RenderStyle {
        RenderStyle {
            format: self.format,
            width: self.width,
            height: self.height,
            font_size: self.font_size,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: Self::default_dir(),
            format: OutputFormat::default(),
            width: Self::default_width(),
            height: Self::default_height(),
            font_size: Self::default_font_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryConfig {
    #[serde(default = "RecoveryConfig::default_groups")]
    pub groups: u32,
    #[serde(default = "RecoveryConfig::default_shares_per_group")]
    pub shares_per_group: u32,
    #[serde(default)]
    pub normalization: Normalization,
    #[serde(default = "RecoveryConfig::default_file_stem")]
    pub file_stem: String,
    #[serde(default = "RecoveryConfig::default_x_label")]
    pub x_label: String,
    #[serde(default = "RecoveryConfig::default_y_label")]
    pub y_label: String,
}

impl RecoveryConfig {
    fn default_groups() -> u32 {
        10
    }
    fn default_shares_per_group() -> u32 {
        10
    }
    fn default_file_stem() -> String {
        "plot-prob-1".to_string()
    }
    fn default_x_label() -> String {
        "No. of trustees contacted".to_string()
    }
    fn default_y_label() -> String {
        "Probability of secret recovery".to_string()
    }
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            groups: Self::default_groups(),
            shares_per_group: Self::default_shares_per_group(),
            normalization: Normalization::default(),
            file_stem: Self::default_file_stem(),
            x_label: Self::default_x_label(),
            y_label: Self::default_y_label(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum BaselineMode {
    /// Every parameter value has a baseline file in the paired baseline
    /// directory, drawn dashed in the same color.
    #[default]
    Paired,
    /// One baseline curve from the shared baseline directory.
    Shared,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CdfFigureConfig {
    pub param: Param,
    pub relevant_dir: String,
    #[serde(default)]
    pub values: Vec<u32>,
    #[serde(default)]
    pub legend: String,
    #[serde(default)]
    pub baseline: BaselineMode,
}

/// One scheme of an overlay: where its runs live and how its curve is drawn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchemeConfig {
    pub relevant_dir: String,
    pub label: String,
    /// Keep only runs whose first extra file-name field equals this, such as
    /// the subsecret threshold or the hint count.
    #[serde(default)]
    pub extra: Option<u32>,
    #[serde(default)]
    pub style: LineStyle,
}

/// A single parameter value compared across several schemes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchemeOverlayConfig {
    pub name: String,
    pub param: Param,
    pub value: u32,
    #[serde(default)]
    pub legend: String,
    pub schemes: Vec<SchemeConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CdfConfig {
    #[serde(default = "CdfConfig::default_folder")]
    pub folder: String,
    #[serde(default = "CdfConfig::default_iterations")]
    pub iterations: u64,
    #[serde(default = "CdfConfig::default_epsilon")]
    pub epsilon: f64,
    #[serde(default = "CdfConfig::default_h_line")]
    pub h_line: bool,
    #[serde(default = "CdfConfig::default_output_folder")]
    pub output_folder: String,
    #[serde(default = "CdfConfig::default_y_label")]
    pub y_label: String,
    #[serde(default = "CdfConfig::default_x_label_trustees")]
    pub x_label_trustees: String,
    #[serde(default = "CdfConfig::default_x_label_people")]
    pub x_label_people: String,
    #[serde(default = "CdfConfig::default_x_label_comparison")]
    pub x_label_comparison: String,
    #[serde(default = "CdfConfig::default_shared_baseline_dir")]
    pub shared_baseline_dir: String,
    #[serde(default = "default_colors")]
    pub colors: Vec<String>,
    #[serde(default = "CdfConfig::default_figures")]
    pub figures: Vec<CdfFigureConfig>,
    #[serde(default = "CdfConfig::default_overlays")]
    pub overlays: Vec<SchemeOverlayConfig>,
}

impl CdfConfig {
    fn default_folder() -> String {
        "results".to_string()
    }
    fn default_iterations() -> u64 {
        1000
    }
    fn default_epsilon() -> f64 {
        0.05
    }
    fn default_h_line() -> bool {
        true
    }
    fn default_output_folder() -> String {
        "prob-cdf".to_string()
    }
    fn default_y_label() -> String {
        "Probability of secret recovery".to_string()
    }
    fn default_x_label_trustees() -> String {
        "No. of trustees contacted".to_string()
    }
    fn default_x_label_people() -> String {
        "No. of people contacted".to_string()
    }
    fn default_x_label_comparison() -> String {
        "No. of contacts".to_string()
    }
    fn default_shared_baseline_dir() -> String {
        "p-baseline-an".to_string()
    }
    fn default_figures() -> Vec<CdfFigureConfig> {
        vec![
            CdfFigureConfig {
                param: Param::Anonymity,
                relevant_dir: "p-add-an".to_string(),
                values: vec![50, 100, 150],
                legend: "Anonymity".to_string(),
                baseline: BaselineMode::Paired,
            },
            CdfFigureConfig {
                param: Param::Threshold,
                relevant_dir: "p-add-th".to_string(),
                values: vec![10, 20, 30],
                legend: "Threshold".to_string(),
                baseline: BaselineMode::Shared,
            },
        ]
    }
    fn default_overlays() -> Vec<SchemeOverlayConfig> {
        vec![SchemeOverlayConfig {
            name: "add-th-hinted".to_string(),
            param: Param::Anonymity,
            value: 100,
            legend: String::new(),
            schemes: vec![
                SchemeConfig {
                    relevant_dir: "p-add-an".to_string(),
                    label: "Additive".to_string(),
                    extra: None,
                    style: LineStyle::Solid,
                },
                SchemeConfig {
                    relevant_dir: "p-th-an".to_string(),
                    label: "Thresholded".to_string(),
                    extra: Some(80),
                    style: LineStyle::Dashed,
                },
                SchemeConfig {
                    relevant_dir: "p-hint-an".to_string(),
                    label: "Hinted".to_string(),
                    extra: Some(5),
                    style: LineStyle::Dotted,
                },
            ],
        }]
    }
}

impl Default for CdfConfig {
    fn default() -> Self {
        Self {
            folder: Self::default_folder(),
            iterations: Self::default_iterations(),
            epsilon: Self::default_epsilon(),
            h_line: Self::default_h_line(),
            output_folder: Self::default_output_folder(),
            y_label: Self::default_y_label(),
            x_label_trustees: Self::default_x_label_trustees(),
            x_label_people: Self::default_x_label_people(),
            x_label_comparison: Self::default_x_label_comparison(),
            shared_baseline_dir: Self::default_shared_baseline_dir(),
            colors: default_colors(),
            figures: Self::default_figures(),
            overlays: Self::default_overlays(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpectedFigureConfig {
    pub param: Param,
    pub relevant_dir: String,
    #[serde(default)]
    pub x_label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpectedConfig {
    #[serde(default = "CdfConfig::default_folder")]
    pub folder: String,
    #[serde(default = "CdfConfig::default_iterations")]
    pub iterations: u64,
    #[serde(default = "ExpectedConfig::default_output_folder")]
    pub output_folder: String,
    #[serde(default = "ExpectedConfig::default_y_label_people")]
    pub y_label_people: String,
    #[serde(default = "ExpectedConfig::default_y_label_trustees")]
    pub y_label_trustees: String,
    #[serde(default = "ExpectedConfig::default_bar_width")]
    pub bar_width: f64,
    #[serde(default = "ExpectedConfig::default_figures")]
    pub figures: Vec<ExpectedFigureConfig>,
}

impl ExpectedConfig {
    fn default_output_folder() -> String {
        "expected".to_string()
    }
    fn default_y_label_people() -> String {
        "Expected no. of people contacted".to_string()
    }
    fn default_y_label_trustees() -> String {
        "Expected no. of trustees contacted".to_string()
    }
    fn default_bar_width() -> f64 {
        4.0
    }
    fn default_figures() -> Vec<ExpectedFigureConfig> {
        vec![ExpectedFigureConfig {
            param: Param::Anonymity,
            relevant_dir: "p-add-an".to_string(),
            x_label: "Anonymity".to_string(),
        }]
    }
}

impl Default for ExpectedConfig {
    fn default() -> Self {
        Self {
            folder: CdfConfig::default_folder(),
            iterations: CdfConfig::default_iterations(),
            output_folder: Self::default_output_folder(),
            y_label_people: Self::default_y_label_people(),
            y_label_trustees: Self::default_y_label_trustees(),
            bar_width: Self::default_bar_width(),
            figures: Self::default_figures(),
        }
    }
}

/// User run against adversary runs that vary in whistleblowing, crossed with
/// adversary memory errors and obtaining probabilities.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WhistleblowGridConfig {
    pub name: String,
    pub user_memory: u32,
    pub adversary_memory: Vec<u32>,
    pub obtain: Vec<u32>,
    pub whistleblow: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComparisonFigureConfig {
    pub name: String,
    pub relevant_dir: String,
    /// Adversary obtaining probabilities, in percent.
    #[serde(default)]
    pub obtain: Vec<u32>,
    /// Adversary whistleblowing levels.
    #[serde(default)]
    pub whistleblow: Vec<u32>,
    /// Memory errors compared against random contact order.
    #[serde(default)]
    pub memory: Vec<u32>,
    /// User memory errors paired with an adversary at twice the error.
    #[serde(default)]
    pub memory_overall: Vec<u32>,
    #[serde(default)]
    pub grids: Vec<WhistleblowGridConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonConfig {
    #[serde(default = "CdfConfig::default_folder")]
    pub folder: String,
    #[serde(default = "CdfConfig::default_iterations")]
    pub iterations: u64,
    #[serde(default = "ComparisonConfig::default_output_folder")]
    pub output_folder: String,
    #[serde(default = "CdfConfig::default_y_label")]
    pub y_label: String,
    #[serde(default = "CdfConfig::default_x_label_people")]
    pub x_label: String,
    #[serde(default = "default_colors")]
    pub colors: Vec<String>,
    #[serde(default = "ComparisonConfig::default_figures")]
    pub figures: Vec<ComparisonFigureConfig>,
}

impl ComparisonConfig {
    fn default_output_folder() -> String {
        "prob-comparison".to_string()
    }
    fn default_figures() -> Vec<ComparisonFigureConfig> {
        vec![ComparisonFigureConfig {
            name: "anonymity".to_string(),
            relevant_dir: "p-adv-an".to_string(),
            obtain: vec![80, 70, 50],
            whistleblow: vec![0, 1, 2],
            memory: vec![10, 20, 40],
            memory_overall: vec![20, 40],
            grids: vec![
                WhistleblowGridConfig {
                    name: "obtain-wb".to_string(),
                    user_memory: 20,
                    adversary_memory: vec![40],
                    obtain: vec![80, 70],
                    whistleblow: vec![0, 1, 2],
                },
                WhistleblowGridConfig {
                    name: "error-wb".to_string(),
                    user_memory: 20,
                    adversary_memory: vec![20, 40],
                    obtain: vec![50],
                    whistleblow: vec![0, 1],
                },
            ],
        }]
    }
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            folder: CdfConfig::default_folder(),
            iterations: CdfConfig::default_iterations(),
            output_folder: Self::default_output_folder(),
            y_label: CdfConfig::default_y_label(),
            x_label: CdfConfig::default_x_label_people(),
            colors: default_colors(),
            figures: Self::default_figures(),
        }
    }
}

/// One timing series: a single CSV, or shards whose rows are merged first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TimingSource {
    File(String),
    Shards(Vec<String>),
}

impl From<&str> for TimingSource {
    fn from(file: &str) -> Self {
        TimingSource::File(file.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimingFigureConfig {
    pub name: String,
    pub files: Vec<TimingSource>,
    pub group_column: usize,
    #[serde(default)]
    pub x_label: String,
    #[serde(default)]
    pub legend: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "TimingConfig::default_folder")]
    pub folder: String,
    #[serde(default = "TimingConfig::default_output_folder")]
    pub output_folder: String,
    /// Column holding the elapsed time in nanoseconds.
    #[serde(default = "TimingConfig::default_value_column")]
    pub value_column: usize,
    #[serde(default = "TimingConfig::default_figures")]
    pub figures: Vec<TimingFigureConfig>,
}

impl TimingConfig {
    fn default_folder() -> String {
        "computation".to_string()
    }
    fn default_output_folder() -> String {
        "computation".to_string()
    }
    fn default_value_column() -> usize {
        4
    }
    fn default_figures() -> Vec<TimingFigureConfig> {
        vec![TimingFigureConfig {
            name: "anonymity".to_string(),
            files: vec![
                "anon/add-results.csv".into(),
                "anon/strawman-results.csv".into(),
            ],
            group_column: 1,
            x_label: "Anonymity".to_string(),
            legend: vec!["Additive".to_string(), "Strawman".to_string()],
        }]
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            folder: Self::default_folder(),
            output_folder: Self::default_output_folder(),
            value_column: Self::default_value_column(),
            figures: Self::default_figures(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PacketFigureConfig {
    pub name: String,
    pub file: String,
    pub group_column: usize,
    #[serde(default = "PacketFigureConfig::default_total_column")]
    pub total_column: usize,
    #[serde(default = "PacketFigureConfig::default_relevant_column")]
    pub relevant_column: usize,
    /// Keep rows whose group value is a multiple of this step.
    #[serde(default)]
    pub step: Option<f64>,
    /// Keep rows whose group value does not exceed this.
    #[serde(default)]
    pub max: Option<f64>,
    /// Keep rows where `filter_column == filter_value`.
    #[serde(default)]
    pub filter_column: Option<usize>,
    #[serde(default)]
    pub filter_value: Option<f64>,
    #[serde(default)]
    pub x_label: String,
}

impl PacketFigureConfig {
    fn default_total_column() -> usize {
        3
    }
    fn default_relevant_column() -> usize {
        5
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacketConfig {
    /// Base folder the figure files are read from.
    #[serde(default = "PacketConfig::default_folder")]
    pub folder: String,
    #[serde(default = "PacketConfig::default_output_folder")]
    pub output_folder: String,
    /// Bytes per plotted unit.
    #[serde(default = "PacketConfig::default_divisor")]
    pub divisor: f64,
    #[serde(default = "PacketConfig::default_y_label")]
    pub y_label: String,
    #[serde(default = "PacketConfig::default_figures")]
    pub figures: Vec<PacketFigureConfig>,
}

impl PacketConfig {
    fn default_folder() -> String {
        ".".to_string()
    }
    fn default_output_folder() -> String {
        "packet-size".to_string()
    }
    fn default_divisor() -> f64 {
        102_400.0
    }
    fn default_y_label() -> String {
        "Total size of data distributed (in kB)".to_string()
    }
    fn default_figures() -> Vec<PacketFigureConfig> {
        vec![
            PacketFigureConfig {
                name: "anon".to_string(),
                file: "results-anon.csv".to_string(),
                group_column: 1,
                total_column: PacketFigureConfig::default_total_column(),
                relevant_column: PacketFigureConfig::default_relevant_column(),
                step: Some(10.0),
                max: Some(150.0),
                filter_column: None,
                filter_value: None,
                x_label: "Privacy Pool Size".to_string(),
            },
            PacketFigureConfig {
                name: "th".to_string(),
                file: "results-th.csv".to_string(),
                group_column: 2,
                total_column: PacketFigureConfig::default_total_column(),
                relevant_column: PacketFigureConfig::default_relevant_column(),
                step: None,
                max: None,
                filter_column: Some(1),
                filter_value: Some(150.0),
                x_label: "Threshold".to_string(),
            },
        ]
    }
}

impl Default for PacketConfig {
    fn default() -> Self {
        Self {
            folder: Self::default_folder(),
            output_folder: Self::default_output_folder(),
            divisor: Self::default_divisor(),
            y_label: Self::default_y_label(),
            figures: Self::default_figures(),
        }
    }
}

fn default_colors() -> Vec<String> {
    [
        "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b",
    ]
    .iter()
    .map(|c| c.to_string())
    .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub recovery: RecoveryConfig,
    #[serde(default)]
    pub cdf: CdfConfig,
    #[serde(default)]
    pub expected: ExpectedConfig,
    #[serde(default)]
    pub comparison: ComparisonConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub packet: PacketConfig,
}

impl AppConfig {
    /// Comment out every key (and array-of-table header) so the written file
    /// documents the defaults without pinning them.
    fn commented(text: &str) -> String {
        let mut out = String::new();
        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                out.push('\n');
            } else if trimmed.starts_with('[') && !trimmed.starts_with("[[") && trimmed.ends_with(']')
            {
                out.push_str(line);
                out.push('\n');
            } else {
                out.push_str("# ");
                out.push_str(line);
                out.push('\n');
            }
        }
        out
    }

    /// Load `path`, or write commented defaults there when it does not exist.
    /// An existing file that cannot be read or parsed is an error.
    pub fn load_or_default(path: &str) -> Result<Self, PlotError> {
        let path_obj = Path::new(path);
        if path_obj.exists() {
            let contents = fs::read_to_string(path_obj)
                .map_err(|err| PlotError::InvalidConfig(format!("cannot read {path}: {err}")))?;
            let cfg = toml::from_str(&contents)
                .map_err(|err| PlotError::InvalidConfig(format!("cannot parse {path}: {err}")))?;
            info!(path, "loaded config");
            return Ok(cfg);
        }

        // File does not exist: write defaults and return them.
        let default_cfg = Self::default();
        match toml::to_string_pretty(&default_cfg) {
            Ok(text) => {
                if let Err(err) = fs::write(path_obj, Self::commented(&text)) {
                    warn!("Failed to write default config to {path}: {err}");
                } else {
                    info!(path, "wrote default config");
                }
            }
            Err(err) => {
                warn!("Failed to serialize default config: {err}; continuing with defaults");
            }
        }
        Ok(default_cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn unique_path(name: &str) -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!(
            "shareplot_config_test_{}_{}",
            name,
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        p
    }

    #[test]
    fn load_or_default_writes_defaults_cleanly() {
        let path = unique_path("defaults.toml");
        let path_str = path.to_string_lossy().to_string();
        let _ = fs::remove_file(&path);

        let cfg = AppConfig::load_or_default(&path_str).unwrap();
        assert!(path.exists(), "config file should be created");
        assert_eq!(cfg.recovery.groups, 10);
        assert_eq!(cfg.recovery.shares_per_group, 10);
        assert_eq!(cfg.recovery.normalization, Normalization::Sum);
        assert_eq!(cfg.output.format, OutputFormat::Svg);

        let contents = fs::read_to_string(&path).expect("read written config");
        assert!(contents.contains("[recovery]"), "section headers stay live");
        assert!(
            contents.contains("# groups = 10"),
            "should write commented groups"
        );
        assert!(
            contents.contains("# [[cdf.figures]]"),
            "array tables should be commented"
        );

        // The commented file parses back to the defaults.
        let reread = AppConfig::load_or_default(&path_str).unwrap();
        assert_eq!(reread.cdf.figures, cfg.cdf.figures);
        assert_eq!(reread.cdf.overlays, cfg.cdf.overlays);
        assert_eq!(reread.comparison.figures, cfg.comparison.figures);
        assert!(contents.contains("# [[comparison.figures.grids]]"));
        assert_eq!(reread.packet.divisor, 102_400.0);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let path = unique_path("partial.toml");
        let path_str = path.to_string_lossy().to_string();
        fs::write(
            &path,
            "[recovery]\ngroups = 4\nnormalization = \"per-point\"\n\n[output]\nformat = \"png\"\n",
        )
        .unwrap();

        let cfg = AppConfig::load_or_default(&path_str).unwrap();
        assert_eq!(cfg.recovery.groups, 4);
        assert_eq!(cfg.recovery.shares_per_group, 10);
        assert_eq!(cfg.recovery.normalization, Normalization::PerPoint);
        assert_eq!(cfg.output.format, OutputFormat::Png);
        assert_eq!(cfg.output.width, 800);
        assert_eq!(cfg.cdf.iterations, 1000);

        let _ = fs::remove_file(&path);
    }
}
