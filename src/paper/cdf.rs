//! Cumulative recovery probability over the number of contacts.
//!
//! For every parameter value, the per-contact histogram of a result file is
//! summed into a CDF and divided by the iteration count. Baseline runs come
//! either from the paired baseline directory (one per value, dashed in the
//! matching color) or from a single shared baseline directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::Output;
use super::figure::{Figure, LegendCorner, Series, parse_palette};
use crate::config::{BaselineMode, CdfConfig, CdfFigureConfig, SchemeOverlayConfig};
use crate::core::stats::{cumulative, scale};
use crate::data::discovery::{files_by_param, files_in_named_dirs, result_directories};
use crate::data::run_params::{Param, RunParams, baseline_dir_name};
use crate::data::table::ContactHistogram;
use crate::error::PlotError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Contacts {
    Trustees,
    People,
}

impl Contacts {
    fn suffix(self) -> &'static str {
        match self {
            Contacts::Trustees => "tr",
            Contacts::People => "anon",
        }
    }
}

/// Scaled CDFs of one result file.
#[derive(Clone, Debug, PartialEq)]
pub struct ContactCdf {
    pub params: RunParams,
    pub trustees: Vec<f64>,
    pub people: Vec<f64>,
}

impl ContactCdf {
    pub fn from_histogram(
        params: RunParams,
        hist: &ContactHistogram,
        iterations: u64,
    ) -> Result<Self, PlotError> {
        let scaled = |values: &[f64]| {
            scale(&cumulative(values), iterations)
                .ok_or_else(|| PlotError::InvalidConfig("iteration count must be positive".into()))
        };
        Ok(Self {
            params,
            trustees: scaled(&hist.trustees)?,
            people: scaled(&hist.people)?,
        })
    }

    pub fn read(path: &Path, params: RunParams, iterations: u64) -> Result<Self, PlotError> {
        Self::from_histogram(params, &ContactHistogram::read(path)?, iterations)
    }

    pub fn values(&self, contacts: Contacts) -> &[f64] {
        match contacts {
            Contacts::Trustees => &self.trustees,
            Contacts::People => &self.people,
        }
    }
}

/// Load every result file under the relevant directories, keyed by `param`.
pub fn load_cdfs(
    dirs: &[PathBuf],
    relevant: &str,
    param: Param,
    iterations: u64,
) -> Result<BTreeMap<u32, ContactCdf>, PlotError> {
    files_by_param(dirs, relevant, param)?
        .into_iter()
        .map(|(key, (path, params))| -> Result<_, PlotError> {
            Ok((key, ContactCdf::read(&path, params, iterations)?))
        })
        .collect()
}

/// The configured values in configuration order, or every loaded value when
/// none are configured.
pub fn select<'a>(
    cdfs: &'a BTreeMap<u32, ContactCdf>,
    values: &[u32],
    param: Param,
) -> Result<Vec<(u32, &'a ContactCdf)>, PlotError> {
    if values.is_empty() {
        return Ok(cdfs.iter().map(|(&k, v)| (k, v)).collect());
    }
    values
        .iter()
        .map(|v| {
            cdfs.get(v)
                .map(|cdf| (*v, cdf))
                .ok_or_else(|| PlotError::MissingData(format!("no result file with {param} = {v}")))
        })
        .collect()
}

fn base_figure(cfg: &CdfConfig, x_label: &str, legend_title: &str) -> Figure {
    let mut fig = Figure::new(x_label, &cfg.y_label);
    fig.y_from_zero = true;
    fig.integer_x = true;
    if !legend_title.is_empty() {
        fig.legend_title = Some(legend_title.to_string());
    }
    if cfg.h_line {
        fig.push_h_line(cfg.epsilon);
    }
    fig
}

fn x_label(cfg: &CdfConfig, contacts: Contacts) -> &str {
    match contacts {
        Contacts::Trustees => &cfg.x_label_trustees,
        Contacts::People => &cfg.x_label_people,
    }
}

fn stem(param: Param, contacts: Contacts) -> String {
    format!("plot-prob-cdf-{param}-{}", contacts.suffix())
}

/// Selected values as solid lines plus their baselines.
pub fn with_baselines(
    cfg: &CdfConfig,
    fig_cfg: &CdfFigureConfig,
    selected: &[(u32, &ContactCdf)],
    baselines: &Baselines,
    contacts: Contacts,
) -> Result<Figure, PlotError> {
    let palette = parse_palette(&cfg.colors);
    let color = |i: usize| palette.get(i).copied();
    let mut fig = base_figure(cfg, x_label(cfg, contacts), &fig_cfg.legend);

    for (i, (value, cdf)) in selected.iter().enumerate() {
        fig.push_series(
            Series::from_values(cdf.values(contacts))
                .with_label(value.to_string())
                .with_color(color(i)),
        );
        if let Baselines::Paired(paired) = baselines {
            let baseline = paired.get(value).ok_or_else(|| {
                PlotError::MissingData(format!("no baseline file with {} = {value}", fig_cfg.param))
            })?;
            fig.push_series(
                Series::from_values(baseline.values(contacts))
                    .with_color(color(i))
                    .dashed(),
            );
        }
    }
    if let Baselines::Shared(baseline) = baselines {
        fig.push_series(
            Series::from_values(baseline.values(contacts))
                .with_label("Baseline")
                .with_color(color(selected.len()))
                .dashed(),
        );
    }
    Ok(fig)
}

/// Selected values only, default palette.
pub fn without_baselines(
    cfg: &CdfConfig,
    fig_cfg: &CdfFigureConfig,
    selected: &[(u32, &ContactCdf)],
    contacts: Contacts,
) -> Figure {
    let mut fig = base_figure(cfg, x_label(cfg, contacts), &fig_cfg.legend);
    for (value, cdf) in selected {
        fig.push_series(Series::from_values(cdf.values(contacts)).with_label(value.to_string()));
    }
    fig
}

/// Trustee and people CDFs of a single run on one axis.
pub fn comparison(cfg: &CdfConfig, fig_cfg: &CdfFigureConfig, cdf: &ContactCdf) -> Figure {
    let mut fig = base_figure(cfg, &cfg.x_label_comparison, &fig_cfg.legend);
    fig.push_series(Series::from_values(&cdf.trustees).with_label("Trustees"));
    fig.push_series(Series::from_values(&cdf.people).with_label("People"));
    fig
}

/// The configured value of every scheme in the overlay, in scheme order.
pub fn load_scheme_cdfs(
    cfg: &CdfConfig,
    overlay: &SchemeOverlayConfig,
    dirs: &[PathBuf],
) -> Result<Vec<ContactCdf>, PlotError> {
    overlay
        .schemes
        .iter()
        .map(|scheme| -> Result<ContactCdf, PlotError> {
            let files = files_in_named_dirs(dirs, &scheme.relevant_dir, overlay.param, |p| {
                scheme.extra.is_none_or(|extra| p.extras[0] == extra)
            })?;
            let (path, params) = files.get(&overlay.value).ok_or_else(|| {
                PlotError::MissingData(format!(
                    "no result file in {} with {} = {}",
                    scheme.relevant_dir, overlay.param, overlay.value
                ))
            })?;
            ContactCdf::read(path, *params, cfg.iterations)
        })
        .collect()
}

/// One curve per scheme, each in its configured line style.
pub fn scheme_overlay(
    cfg: &CdfConfig,
    overlay: &SchemeOverlayConfig,
    cdfs: &[ContactCdf],
    contacts: Contacts,
) -> Figure {
    let mut fig = base_figure(cfg, x_label(cfg, contacts), &overlay.legend);
    if contacts == Contacts::People {
        fig.legend = LegendCorner::LowerRight;
    }
    for (scheme, cdf) in overlay.schemes.iter().zip(cdfs) {
        fig.push_series(
            Series::from_values(cdf.values(contacts))
                .with_label(scheme.label.clone())
                .with_style(scheme.style),
        );
    }
    fig
}

#[derive(Clone, Debug)]
pub enum Baselines {
    Paired(BTreeMap<u32, ContactCdf>),
    Shared(ContactCdf),
}

/// Baseline runs for one figure.
///
/// In shared mode the baseline file is the one whose anonymity matches the
/// first selected run.
pub fn load_baselines(
    cfg: &CdfConfig,
    fig_cfg: &CdfFigureConfig,
    dirs: &[PathBuf],
    first: &ContactCdf,
) -> Result<Baselines, PlotError> {
    match fig_cfg.baseline {
        BaselineMode::Paired => {
            let relevant = baseline_dir_name(&fig_cfg.relevant_dir);
            Ok(Baselines::Paired(load_cdfs(
                dirs,
                &relevant,
                fig_cfg.param,
                cfg.iterations,
            )?))
        }
        BaselineMode::Shared => {
            let anonymity = first.params.anonymity;
            let candidates = files_by_param(dirs, &cfg.shared_baseline_dir, Param::Anonymity)?;
            let (path, params) = candidates.get(&anonymity).ok_or_else(|| {
                PlotError::MissingData(format!(
                    "no shared baseline in {} with anonymity {anonymity}",
                    cfg.shared_baseline_dir
                ))
            })?;
            Ok(Baselines::Shared(ContactCdf::read(path, *params, cfg.iterations)?))
        }
    }
}

/// Render every configured CDF figure. Returns the written paths.
pub fn run(cfg: &CdfConfig, output: &Output) -> Result<Vec<PathBuf>, PlotError> {
    let dirs = result_directories(Path::new(&cfg.folder))?;
    let mut written = Vec::new();

    for fig_cfg in &cfg.figures {
        let param = fig_cfg.param;
        let cdfs = load_cdfs(&dirs, &fig_cfg.relevant_dir, param, cfg.iterations)?;
        if cdfs.is_empty() {
            warn!(%param, relevant = %fig_cfg.relevant_dir, "no result files; skipping figure");
            continue;
        }
        let selected = select(&cdfs, &fig_cfg.values, param)?;
        info!(%param, files = cdfs.len(), selected = selected.len(), "cdf figure");

        let sub = Path::new(&cfg.output_folder).join(param.label());
        let sub_wo = Path::new(&format!("{}-wo", cfg.output_folder)).join(param.label());

        let baselines = match selected.first() {
            Some((_, first)) => Some(load_baselines(cfg, fig_cfg, &dirs, first)?),
            None => None,
        };

        for contacts in [Contacts::Trustees, Contacts::People] {
            if let Some(baselines) = &baselines {
                let fig = with_baselines(cfg, fig_cfg, &selected, baselines, contacts)?;
                written.push(output.save(&fig, &sub, &stem(param, contacts))?);
            }
            let fig = without_baselines(cfg, fig_cfg, &selected, contacts);
            written.push(output.save(&fig, &sub_wo, &stem(param, contacts))?);
        }

        for (value, cdf) in &selected {
            let fig = comparison(cfg, fig_cfg, cdf);
            let name = format!("plot-prob-cdf-th-{param}-comp-{value}");
            written.push(output.save(&fig, &sub_wo, &name)?);
        }
    }

    for overlay in &cfg.overlays {
        let cdfs = load_scheme_cdfs(cfg, overlay, &dirs)?;
        info!(
            name = %overlay.name,
            param = %overlay.param,
            value = overlay.value,
            schemes = cdfs.len(),
            "scheme overlay"
        );
        let sub = Path::new(&cfg.output_folder).join(overlay.param.label());
        for contacts in [Contacts::Trustees, Contacts::People] {
            let fig = scheme_overlay(cfg, overlay, &cdfs, contacts);
            let name = format!(
                "plot-prob-cdf-{}-{}-{}",
                overlay.param,
                overlay.name,
                contacts.suffix()
            );
            written.push(output.save(&fig, &sub, &name)?);
        }
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paper::figure::{LineStyle, parse_hex_color};

    fn params(anonymity: u32) -> RunParams {
        RunParams {
            threshold: 2,
            trustees: 4,
            anonymity,
            subsecrets: 3,
            absolute: 10,
            extras: [0; 4],
        }
    }

    fn cdf(anonymity: u32, trustees: &[f64]) -> ContactCdf {
        ContactCdf {
            params: params(anonymity),
            trustees: trustees.to_vec(),
            people: trustees.to_vec(),
        }
    }

    fn fig_cfg(baseline: BaselineMode) -> CdfFigureConfig {
        CdfFigureConfig {
            param: Param::Anonymity,
            relevant_dir: "p-add-an".into(),
            values: vec![],
            legend: "Anonymity".into(),
            baseline,
        }
    }

    #[test]
    fn histogram_becomes_scaled_cdf() {
        let hist = ContactHistogram {
            trustees: vec![0.0, 5.0, 5.0],
            people: vec![2.0, 2.0, 6.0],
        };
        let cdf = ContactCdf::from_histogram(params(50), &hist, 10).unwrap();
        assert_eq!(cdf.trustees, vec![0.0, 0.5, 1.0]);
        assert_eq!(cdf.people, vec![0.2, 0.4, 1.0]);
        assert!(ContactCdf::from_histogram(params(50), &hist, 0).is_err());
    }

    #[test]
    fn select_keeps_configured_order_and_reports_missing() {
        let mut cdfs = BTreeMap::new();
        cdfs.insert(50, cdf(50, &[1.0]));
        cdfs.insert(100, cdf(100, &[1.0]));
        let picked = select(&cdfs, &[100, 50], Param::Anonymity).unwrap();
        assert_eq!(picked.iter().map(|(v, _)| *v).collect::<Vec<_>>(), vec![100, 50]);
        assert_eq!(select(&cdfs, &[], Param::Anonymity).unwrap().len(), 2);
        assert!(select(&cdfs, &[150], Param::Anonymity).is_err());
    }

    #[test]
    fn paired_baselines_share_colors_and_are_dashed() {
        let cfg = CdfConfig::default();
        let a = cdf(50, &[0.1, 0.5]);
        let b = cdf(100, &[0.2, 0.6]);
        let mut paired = BTreeMap::new();
        paired.insert(50, cdf(50, &[0.0, 0.3]));
        paired.insert(100, cdf(100, &[0.0, 0.4]));
        let selected = vec![(50, &a), (100, &b)];
        let fig = with_baselines(
            &cfg,
            &fig_cfg(BaselineMode::Paired),
            &selected,
            &Baselines::Paired(paired),
            Contacts::Trustees,
        )
        .unwrap();
        assert_eq!(fig.series.len(), 4);
        assert_eq!(fig.series[0].color, fig.series[1].color);
        assert_eq!(fig.series[1].style, LineStyle::Dashed);
        assert!(fig.series[1].label.is_none());
        assert_eq!(fig.h_lines, vec![cfg.epsilon]);
        assert!(fig.y_from_zero);
    }

    #[test]
    fn shared_baseline_is_one_labelled_curve() {
        let cfg = CdfConfig::default();
        let a = cdf(50, &[0.1, 0.5]);
        let selected = vec![(20, &a)];
        let fig = with_baselines(
            &cfg,
            &fig_cfg(BaselineMode::Shared),
            &selected,
            &Baselines::Shared(cdf(50, &[0.0, 0.2])),
            Contacts::People,
        )
        .unwrap();
        assert_eq!(fig.series.len(), 2);
        assert_eq!(fig.series[1].label.as_deref(), Some("Baseline"));
        assert_eq!(fig.series[1].color, parse_hex_color(&cfg.colors[1]));
        assert_eq!(fig.x_label, cfg.x_label_people);
    }

    #[test]
    fn scheme_overlay_keeps_scheme_styles() {
        let cfg = CdfConfig::default();
        let overlay = cfg.overlays[0].clone();
        let cdfs = vec![cdf(100, &[0.1, 0.5]), cdf(100, &[0.0, 0.4]), cdf(100, &[0.2, 0.3])];
        let fig = scheme_overlay(&cfg, &overlay, &cdfs, Contacts::People);
        let styles: Vec<LineStyle> = fig.series.iter().map(|s| s.style).collect();
        assert_eq!(styles, vec![LineStyle::Solid, LineStyle::Dashed, LineStyle::Dotted]);
        assert_eq!(fig.series[2].label.as_deref(), Some("Hinted"));
        assert_eq!(fig.legend, LegendCorner::LowerRight);
        assert_eq!(fig.x_label, cfg.x_label_people);
    }

    #[test]
    fn missing_paired_baseline_is_an_error() {
        let cfg = CdfConfig::default();
        let a = cdf(50, &[0.1]);
        let result = with_baselines(
            &cfg,
            &fig_cfg(BaselineMode::Paired),
            &[(50, &a)],
            &Baselines::Paired(BTreeMap::new()),
            Contacts::Trustees,
        );
        assert!(matches!(result, Err(PlotError::MissingData(_))));
    }
}
