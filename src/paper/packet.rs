//! Total data distributed per parameter value, split into the share data a
//! recipient needs and the random padding around it.

use std::path::{Path, PathBuf};

use tracing::info;

use super::Output;
use super::figure::{Band, Figure, Series};
use crate::config::{PacketConfig, PacketFigureConfig};
use crate::core::stats::group_by;
use crate::data::table::ResultTable;
use crate::error::PlotError;

const RELEVANT_COLOR: (u8, u8, u8) = (135, 206, 235);
const RANDOM_COLOR: (u8, u8, u8) = (240, 128, 128);
const BAND_OPACITY: f64 = 0.4;

/// Summed sizes for one group value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PacketPoint {
    pub key: f64,
    pub total: f64,
    pub relevant: f64,
}

fn keep_row(row: &[f64], fig_cfg: &PacketFigureConfig) -> bool {
    let key = row[fig_cfg.group_column];
    if let Some(step) = fig_cfg.step
        && step != 0.0
        && key % step != 0.0
    {
        return false;
    }
    if let Some(max) = fig_cfg.max
        && key > max
    {
        return false;
    }
    match (fig_cfg.filter_column, fig_cfg.filter_value) {
        (Some(column), Some(value)) => row.get(column) == Some(&value),
        _ => true,
    }
}

/// Filter, scale by `divisor` and sum both size columns per group value.
pub fn packet_points(
    mut table: ResultTable,
    fig_cfg: &PacketFigureConfig,
    divisor: f64,
) -> Result<Vec<PacketPoint>, PlotError> {
    // Validate every referenced column before touching rows.
    table.column(fig_cfg.group_column)?;
    if let Some(column) = fig_cfg.filter_column {
        table.column(column)?;
    }
    table.retain(|row| keep_row(row, fig_cfg));
    table.scale_column(fig_cfg.total_column, divisor)?;
    table.scale_column(fig_cfg.relevant_column, divisor)?;

    let totals = group_by(&table.pairs(fig_cfg.group_column, fig_cfg.total_column)?);
    let relevant = group_by(&table.pairs(fig_cfg.group_column, fig_cfg.relevant_column)?);
    Ok(totals
        .iter()
        .zip(relevant.iter())
        .map(|(t, r)| PacketPoint {
            key: t.key,
            total: t.sum,
            relevant: r.sum,
        })
        .collect())
}

pub fn figure(points: &[PacketPoint], x_label: &str, y_label: &str) -> Figure {
    let mut fig = Figure::new(x_label, y_label);
    fig.y_from_zero = true;

    let relevant: Vec<(f64, f64)> = points.iter().map(|p| (p.key, p.relevant)).collect();
    let total: Vec<(f64, f64)> = points.iter().map(|p| (p.key, p.total)).collect();
    let zero: Vec<(f64, f64)> = points.iter().map(|p| (p.key, 0.0)).collect();

    fig.push_band(Band {
        label: Some("Relevant data".to_string()),
        lower: zero,
        upper: relevant.clone(),
        color: RELEVANT_COLOR,
        opacity: BAND_OPACITY,
    });
    fig.push_band(Band {
        label: Some("Random data".to_string()),
        lower: relevant,
        upper: total.clone(),
        color: RANDOM_COLOR,
        opacity: BAND_OPACITY,
    });
    fig.push_series(Series::line(total).with_label("Total data"));
    fig
}

pub fn run(cfg: &PacketConfig, output: &Output) -> Result<Vec<PathBuf>, PlotError> {
    let folder = Path::new(&cfg.folder);
    let mut written = Vec::new();
    for fig_cfg in &cfg.figures {
        let table = ResultTable::read(&folder.join(&fig_cfg.file))?;
        let rows = table.len();
        let points = packet_points(table, fig_cfg, cfg.divisor)?;
        info!(name = %fig_cfg.name, rows, groups = points.len(), "packet size figure");

        let fig = figure(&points, &fig_cfg.x_label, &cfg.y_label);
        let stem = format!("varying-{}", fig_cfg.name);
        written.push(output.save(&fig, &cfg.output_folder, &stem)?);
    }
    Ok(written)
}
