//! Recovery by the legitimate user against recovery by an adversary.
//!
//! Adversary runs carry four extra file-name fields after the base
//! parameters: the memory error, the peer memory error, the obtaining
//! probability (percent) and the whistleblowing level. The user run is the
//! one that always obtains its share (`obtain = 100`) and never
//! whistleblows. Only the people-contacted CDF is plotted.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::Output;
use super::cdf::{Contacts, ContactCdf};
use super::figure::{Figure, LineStyle, Rgb, Series, parse_palette};
use crate::config::{ComparisonConfig, ComparisonFigureConfig, WhistleblowGridConfig};
use crate::data::discovery::{keyed_files, result_directories};
use crate::data::run_params::RunParams;
use crate::error::PlotError;

/// Obtaining probability of the user run.
pub const USER_OBTAIN: u32 = 100;

const GRID_STYLES: [LineStyle; 3] = [LineStyle::Solid, LineStyle::Dashed, LineStyle::Dotted];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttackParams {
    pub memory: u32,
    pub peer_memory: u32,
    pub obtain: u32,
    pub whistleblow: u32,
}

impl AttackParams {
    /// Run with both memory fields equal to `memory`.
    pub fn new(memory: u32, obtain: u32, whistleblow: u32) -> Self {
        Self {
            memory,
            peer_memory: memory,
            obtain,
            whistleblow,
        }
    }

    pub fn user(memory: u32) -> Self {
        Self::new(memory, USER_OBTAIN, 0)
    }

    pub fn from_run(params: &RunParams) -> Self {
        let [memory, peer_memory, obtain, whistleblow] = params.extras;
        Self {
            memory,
            peer_memory,
            obtain,
            whistleblow,
        }
    }

    fn label(&self) -> String {
        if *self == Self::user(self.memory) {
            format!("User-{}", self.memory)
        } else {
            format!("Adv-{}-{}-{}", self.memory, self.obtain, self.whistleblow)
        }
    }
}

/// Scaled CDFs of every run under one relevant directory.
#[derive(Clone, Debug, Default)]
pub struct AttackRuns {
    cdfs: BTreeMap<AttackParams, ContactCdf>,
}

impl AttackRuns {
    pub fn load(dirs: &[PathBuf], relevant: &str, iterations: u64) -> Result<Self, PlotError> {
        let matching = dirs
            .iter()
            .filter(|d| d.to_string_lossy().contains(relevant));
        let cdfs = keyed_files(matching, |params| Some(AttackParams::from_run(params)))?
            .into_iter()
            .map(|(key, (path, params))| -> Result<_, PlotError> {
                Ok((key, ContactCdf::read(&path, params, iterations)?))
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { cdfs })
    }

    pub fn insert(&mut self, key: AttackParams, cdf: ContactCdf) {
        self.cdfs.insert(key, cdf);
    }

    pub fn len(&self) -> usize {
        self.cdfs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cdfs.is_empty()
    }

    pub fn people(&self, key: AttackParams) -> Result<&[f64], PlotError> {
        self.cdfs
            .get(&key)
            .map(|cdf| cdf.values(Contacts::People))
            .ok_or_else(|| {
                PlotError::MissingData(format!(
                    "no run with memory {}/{}, obtain {}, whistleblow {}",
                    key.memory, key.peer_memory, key.obtain, key.whistleblow
                ))
            })
    }

    fn series(&self, key: AttackParams) -> Result<Series, PlotError> {
        Ok(Series::from_values(self.people(key)?).with_label(key.label()))
    }
}

/// One rendered comparison figure and where it goes.
#[derive(Clone, Debug, PartialEq)]
pub struct Panel {
    pub family: String,
    pub stem: String,
    pub figure: Figure,
}

impl Panel {
    fn new(family: &str, stem: String, figure: Figure) -> Self {
        Self {
            family: family.to_string(),
            stem,
            figure,
        }
    }
}

fn base_figure(cfg: &ComparisonConfig) -> Figure {
    let mut fig = Figure::new(&cfg.x_label, &cfg.y_label);
    fig.y_from_zero = true;
    fig.integer_x = true;
    fig
}

/// User against the adversary with and without whistleblowing, per
/// obtaining probability, with no memory error on either side.
pub fn overall(
    cfg: &ComparisonConfig,
    fig_cfg: &ComparisonFigureConfig,
    runs: &AttackRuns,
) -> Result<Vec<Panel>, PlotError> {
    fig_cfg
        .obtain
        .iter()
        .map(|&obtain| -> Result<Panel, PlotError> {
            let mut fig = base_figure(cfg);
            fig.push_series(runs.series(AttackParams::user(0))?);
            for whistleblow in [0, 1] {
                fig.push_series(runs.series(AttackParams::new(0, obtain, whistleblow))?);
            }
            Ok(Panel::new("overall", format!("plot-prob-cdf-{obtain}"), fig))
        })
        .collect()
}

/// User against the adversary at every configured whistleblowing level.
pub fn whistleblow(
    cfg: &ComparisonConfig,
    fig_cfg: &ComparisonFigureConfig,
    runs: &AttackRuns,
) -> Result<Vec<Panel>, PlotError> {
    fig_cfg
        .obtain
        .iter()
        .map(|&obtain| -> Result<Panel, PlotError> {
            let mut fig = base_figure(cfg);
            fig.push_series(runs.series(AttackParams::user(0))?);
            for &level in &fig_cfg.whistleblow {
                fig.push_series(runs.series(AttackParams::new(0, obtain, level))?);
            }
            Ok(Panel::new("whistleblow", format!("plot-prob-cdf-{obtain}"), fig))
        })
        .collect()
}

/// User with memory error `m` against an adversary with `2m`. Only errors
/// whose double is configured as well get a figure.
pub fn memory_overall(
    cfg: &ComparisonConfig,
    fig_cfg: &ComparisonFigureConfig,
    runs: &AttackRuns,
) -> Result<Vec<Panel>, PlotError> {
    let configured: BTreeSet<u32> = fig_cfg.memory_overall.iter().copied().collect();
    let mut panels = Vec::new();
    for &memory in &fig_cfg.memory_overall {
        let adversary = memory.saturating_mul(2);
        if !configured.contains(&adversary) {
            continue;
        }
        for &obtain in &fig_cfg.obtain {
            let mut fig = base_figure(cfg);
            fig.push_series(runs.series(AttackParams::user(memory))?);
            for whistleblow in [0, 1] {
                fig.push_series(runs.series(AttackParams::new(adversary, obtain, whistleblow))?);
            }
            let stem = format!("plot-prob-cdf-{memory}-{obtain}");
            panels.push(Panel::new("memory-overall", stem, fig));
        }
    }
    Ok(panels)
}

/// User runs at every memory error, with the error-free run as the random
/// reference.
pub fn memory(
    cfg: &ComparisonConfig,
    fig_cfg: &ComparisonFigureConfig,
    runs: &AttackRuns,
) -> Result<Option<Panel>, PlotError> {
    if fig_cfg.memory.is_empty() {
        return Ok(None);
    }
    let palette = parse_palette(&cfg.colors);
    let mut memories = fig_cfg.memory.clone();
    memories.sort_unstable();

    let mut fig = base_figure(cfg);
    fig.legend_title = Some("Memory Error".to_string());
    for (i, &memory) in memories.iter().enumerate() {
        fig.push_series(
            Series::from_values(runs.people(AttackParams::user(memory))?)
                .with_label(memory.to_string())
                .with_color(palette.get(i).copied()),
        );
    }
    fig.push_series(
        Series::from_values(runs.people(AttackParams::user(0))?)
            .with_label("Random")
            .with_color(palette.last().copied())
            .with_style(LineStyle::Dotted),
    );
    Ok(Some(Panel::new("memory", "plot-prob-cdf-memory".to_string(), fig)))
}

/// Adversary without whistleblowing at every obtaining probability, one
/// figure per memory error including none.
pub fn obtain(
    cfg: &ComparisonConfig,
    fig_cfg: &ComparisonFigureConfig,
    runs: &AttackRuns,
) -> Result<Vec<Panel>, PlotError> {
    let memories: BTreeSet<u32> = fig_cfg.memory.iter().copied().chain([0]).collect();
    memories
        .into_iter()
        .map(|memory| -> Result<Panel, PlotError> {
            let mut fig = base_figure(cfg);
            fig.legend_title = Some("Obtaining probability".to_string());
            for &obtain in &fig_cfg.obtain {
                fig.push_series(
                    Series::from_values(runs.people(AttackParams::new(memory, obtain, 0))?)
                        .with_label(obtain.to_string()),
                );
            }
            Ok(Panel::new("obtain", format!("plot-prob-cdf-{memory}"), fig))
        })
        .collect()
}

/// User plus one color per adversary (memory, obtain) pair and one line
/// style per whistleblowing level.
pub fn grid(
    cfg: &ComparisonConfig,
    grid_cfg: &WhistleblowGridConfig,
    runs: &AttackRuns,
) -> Result<Panel, PlotError> {
    let palette = parse_palette(&cfg.colors);
    let color = |i: usize| -> Option<Rgb> { palette.get(i).copied() };

    let mut fig = base_figure(cfg);
    fig.push_series(runs.series(AttackParams::user(grid_cfg.user_memory))?.with_color(color(0)));

    let pairs: Vec<(u32, u32)> = grid_cfg
        .adversary_memory
        .iter()
        .flat_map(|&m| grid_cfg.obtain.iter().map(move |&o| (m, o)))
        .collect();
    for (level_idx, &level) in grid_cfg.whistleblow.iter().enumerate() {
        let style = GRID_STYLES[level_idx % GRID_STYLES.len()];
        for (pair_idx, &(memory, obtain)) in pairs.iter().enumerate() {
            fig.push_series(
                runs.series(AttackParams::new(memory, obtain, level))?
                    .with_color(color(pair_idx + 1))
                    .with_style(style),
            );
        }
    }
    let stem = format!("plot-prob-cdf-{}", grid_cfg.name);
    Ok(Panel::new(&grid_cfg.name, stem, fig))
}

/// Every comparison figure of one configured entry.
pub fn panels(
    cfg: &ComparisonConfig,
    fig_cfg: &ComparisonFigureConfig,
    runs: &AttackRuns,
) -> Result<Vec<Panel>, PlotError> {
    let mut out = overall(cfg, fig_cfg, runs)?;
    out.extend(memory_overall(cfg, fig_cfg, runs)?);
    out.extend(memory(cfg, fig_cfg, runs)?);
    out.extend(obtain(cfg, fig_cfg, runs)?);
    out.extend(whistleblow(cfg, fig_cfg, runs)?);
    for grid_cfg in &fig_cfg.grids {
        out.push(grid(cfg, grid_cfg, runs)?);
    }
    Ok(out)
}

pub fn run(cfg: &ComparisonConfig, output: &Output) -> Result<Vec<PathBuf>, PlotError> {
    let dirs = result_directories(Path::new(&cfg.folder))?;
    let mut written = Vec::new();

    for fig_cfg in &cfg.figures {
        let runs = AttackRuns::load(&dirs, &fig_cfg.relevant_dir, cfg.iterations)?;
        if runs.is_empty() {
            warn!(
                name = %fig_cfg.name,
                relevant = %fig_cfg.relevant_dir,
                "no result files; skipping comparison"
            );
            continue;
        }
        let panels = panels(cfg, fig_cfg, &runs)?;
        info!(
            name = %fig_cfg.name,
            runs = runs.len(),
            figures = panels.len(),
            "comparison figures"
        );

        for panel in panels {
            let sub = Path::new(&cfg.output_folder)
                .join(&fig_cfg.name)
                .join(&panel.family);
            written.push(output.save(&panel.figure, &sub, &panel.stem)?);
        }
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_cdf(people: &[f64]) -> ContactCdf {
        ContactCdf {
            params: RunParams::from_file_name("result-adv-2-3-100-3-10-.csv").unwrap(),
            trustees: people.to_vec(),
            people: people.to_vec(),
        }
    }

    fn runs(keys: &[AttackParams]) -> AttackRuns {
        let mut runs = AttackRuns::default();
        for (i, &key) in keys.iter().enumerate() {
            runs.insert(key, run_cdf(&[0.1 * i as f64, 0.5]));
        }
        runs
    }

    fn fig_cfg() -> ComparisonFigureConfig {
        ComparisonFigureConfig {
            name: "anonymity".into(),
            relevant_dir: "p-adv-an".into(),
            obtain: vec![80],
            whistleblow: vec![0, 1, 2],
            memory: vec![],
            memory_overall: vec![],
            grids: vec![],
        }
    }

    #[test]
    fn extras_map_to_attack_fields() {
        let params = RunParams::from_file_name("result-adv-2-3-100-3-10-40-40-70-1-.csv").unwrap();
        assert_eq!(
            AttackParams::from_run(&params),
            AttackParams {
                memory: 40,
                peer_memory: 40,
                obtain: 70,
                whistleblow: 1,
            }
        );
        let plain = RunParams::from_file_name("result-adv-2-3-100-3-10-.csv").unwrap();
        assert_eq!(AttackParams::from_run(&plain), AttackParams::new(0, 0, 0));
    }

    #[test]
    fn overall_plots_user_then_adversary_levels() {
        let runs = runs(&[
            AttackParams::user(0),
            AttackParams::new(0, 80, 0),
            AttackParams::new(0, 80, 1),
        ]);
        let cfg = ComparisonConfig::default();
        let panels = overall(&cfg, &fig_cfg(), &runs).unwrap();
        assert_eq!(panels.len(), 1);
        assert_eq!(panels[0].stem, "plot-prob-cdf-80");
        let labels: Vec<_> = panels[0]
            .figure
            .series
            .iter()
            .map(|s| s.label.clone().unwrap())
            .collect();
        assert_eq!(labels, vec!["User-0", "Adv-0-80-0", "Adv-0-80-1"]);
    }

    #[test]
    fn missing_adversary_run_is_reported() {
        let runs = runs(&[AttackParams::user(0), AttackParams::new(0, 80, 0)]);
        let cfg = ComparisonConfig::default();
        assert!(matches!(
            whistleblow(&cfg, &fig_cfg(), &runs),
            Err(PlotError::MissingData(_))
        ));
    }

    #[test]
    fn memory_overall_needs_the_doubled_error() {
        let runs = runs(&[
            AttackParams::user(20),
            AttackParams::new(40, 80, 0),
            AttackParams::new(40, 80, 1),
        ]);
        let cfg = ComparisonConfig::default();
        let mut fig_cfg = fig_cfg();
        fig_cfg.memory_overall = vec![20, 40];
        let panels = memory_overall(&cfg, &fig_cfg, &runs).unwrap();
        assert_eq!(panels.len(), 1);
        assert_eq!(panels[0].stem, "plot-prob-cdf-20-80");
        assert_eq!(panels[0].family, "memory-overall");
    }

    #[test]
    fn memory_figure_ends_with_dotted_random_reference() {
        let runs = runs(&[AttackParams::user(0), AttackParams::user(10), AttackParams::user(20)]);
        let cfg = ComparisonConfig::default();
        let mut fig_cfg = fig_cfg();
        fig_cfg.memory = vec![20, 10];
        let panel = memory(&cfg, &fig_cfg, &runs).unwrap().unwrap();
        let series = &panel.figure.series;
        assert_eq!(series.len(), 3);
        assert_eq!(series[0].label.as_deref(), Some("10"));
        assert_eq!(series[2].label.as_deref(), Some("Random"));
        assert_eq!(series[2].style, LineStyle::Dotted);
        assert_eq!(panel.figure.legend_title.as_deref(), Some("Memory Error"));

        fig_cfg.memory.clear();
        assert!(memory(&cfg, &fig_cfg, &runs).unwrap().is_none());
    }

    #[test]
    fn grid_styles_follow_whistleblow_levels() {
        let grid_cfg = WhistleblowGridConfig {
            name: "obtain-wb".into(),
            user_memory: 20,
            adversary_memory: vec![40],
            obtain: vec![80, 70],
            whistleblow: vec![0, 1],
        };
        let mut keys = vec![AttackParams::user(20)];
        for level in [0, 1] {
            for obtain in [80, 70] {
                keys.push(AttackParams::new(40, obtain, level));
            }
        }
        let cfg = ComparisonConfig::default();
        let panel = grid(&cfg, &grid_cfg, &runs(&keys)).unwrap();
        let series = &panel.figure.series;
        assert_eq!(series.len(), 5);
        assert_eq!(series[1].style, LineStyle::Solid);
        assert_eq!(series[3].style, LineStyle::Dashed);
        // same adversary, same color across levels
        assert_eq!(series[1].color, series[3].color);
        assert_ne!(series[1].color, series[2].color);
        assert_eq!(panel.family, "obtain-wb");
        assert_eq!(panel.stem, "plot-prob-cdf-obtain-wb");
    }
}
