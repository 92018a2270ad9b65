//! Recovery-probability figure: one curve per group threshold.

use std::path::PathBuf;

use tracing::info;

use super::Output;
use super::figure::{Figure, LegendCorner, Series};
use crate::config::RecoveryConfig;
use crate::core::recovery::{RecoveryCurve, RecoveryModel};
use crate::error::PlotError;

/// Build the figure for a finished sweep.
pub fn figure(curves: &[RecoveryCurve], x_label: &str, y_label: &str) -> Figure {
    let mut fig = Figure::new(x_label, y_label);
    fig.y_from_zero = true;
    fig.integer_x = true;
    fig.legend = LegendCorner::UpperRight;
    for curve in curves {
        fig.push_series(Series::line(curve.points().collect()).with_label(format!("t={}", curve.threshold)));
    }
    fig
}

/// `p,t=2,t=3,...` with one row per contacted-share count.
pub fn curves_csv(curves: &[RecoveryCurve]) -> String {
    let mut csv = String::from("p");
    for curve in curves {
        csv.push_str(&format!(",t={}", curve.threshold));
    }
    csv.push('\n');
    let len = curves.iter().map(|c| c.probabilities.len()).max().unwrap_or(0);
    for i in 0..len {
        csv.push_str(&(i + 1).to_string());
        for curve in curves {
            match curve.probabilities.get(i) {
                Some(p) => csv.push_str(&format!(",{p:.12e}")),
                None => csv.push(','),
            }
        }
        csv.push('\n');
    }
    csv
}

/// Sweep every threshold, render the figure and write the curves next to it.
pub fn run(cfg: &RecoveryConfig, output: &Output) -> Result<PathBuf, PlotError> {
    let model = RecoveryModel::new(cfg.groups, cfg.shares_per_group, cfg.normalization)?;
    let curves = model.sweep()?;
    info!(
        groups = model.groups(),
        shares_per_group = model.shares_per_group(),
        thresholds = curves.len(),
        "recovery sweep finished"
    );

    let fig = figure(&curves, &cfg.x_label, &cfg.y_label);
    let path = output.save(&fig, "", &cfg.file_stem)?;
    super::write_csv(&output.root, &format!("{}.csv", cfg.file_stem), curves_csv(&curves))?;
    Ok(path)
}
