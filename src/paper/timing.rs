//! Computation time per parameter value, averaged over repeated runs.

use std::path::{Path, PathBuf};

use tracing::info;

use super::Output;
use super::figure::{Figure, Series};
use crate::config::{TimingConfig, TimingFigureConfig, TimingSource};
use crate::core::stats::{GroupStats, group_by};
use crate::data::table::ResultTable;
use crate::error::PlotError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
}

impl TimeUnit {
    pub const ALL: [TimeUnit; 3] = [TimeUnit::Seconds, TimeUnit::Minutes, TimeUnit::Hours];

    pub fn nanos(self) -> f64 {
        match self {
            TimeUnit::Seconds => 1e9,
            TimeUnit::Minutes => 1e9 * 60.0,
            TimeUnit::Hours => 1e9 * 60.0 * 60.0,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            TimeUnit::Seconds => "s",
            TimeUnit::Minutes => "mins",
            TimeUnit::Hours => "hrs",
        }
    }

    pub fn y_label(self) -> String {
        format!("Computation time (in {})", self.suffix())
    }
}

/// Mean and spread of the timing column per group, in `unit`.
pub fn timing_groups(
    table: &ResultTable,
    group_column: usize,
    value_column: usize,
    unit: TimeUnit,
) -> Result<Vec<GroupStats>, PlotError> {
    let divisor = unit.nanos();
    let pairs: Vec<(f64, f64)> = table
        .pairs(group_column, value_column)?
        .into_iter()
        .map(|(k, v)| (k, v / divisor))
        .collect();
    Ok(group_by(&pairs))
}

/// Read one series, merging shards by the group column.
pub fn read_source(
    folder: &Path,
    source: &TimingSource,
    group_column: usize,
) -> Result<ResultTable, PlotError> {
    match source {
        TimingSource::File(file) => ResultTable::read(&folder.join(file)),
        TimingSource::Shards(files) => {
            let shards = files
                .iter()
                .map(|f| ResultTable::read(&folder.join(f)))
                .collect::<Result<Vec<_>, _>>()?;
            ResultTable::concat(shards, group_column)
        }
    }
}

pub fn figure(
    tables: &[ResultTable],
    fig_cfg: &TimingFigureConfig,
    value_column: usize,
    unit: TimeUnit,
) -> Result<Figure, PlotError> {
    let mut fig = Figure::new(&fig_cfg.x_label, unit.y_label());
    fig.integer_x = true;
    for (i, table) in tables.iter().enumerate() {
        let points = timing_groups(table, fig_cfg.group_column, value_column, unit)?
            .into_iter()
            .map(|g| (g.key, g.mean))
            .collect();
        let mut series = Series::line(points).with_markers();
        if let Some(label) = fig_cfg.legend.get(i) {
            series = series.with_label(label.clone());
        }
        fig.push_series(series);
    }
    Ok(fig)
}

pub fn run(cfg: &TimingConfig, output: &Output) -> Result<Vec<PathBuf>, PlotError> {
    let folder = Path::new(&cfg.folder);
    let mut written = Vec::new();

    for fig_cfg in &cfg.figures {
        let tables = fig_cfg
            .files
            .iter()
            .map(|source| read_source(folder, source, fig_cfg.group_column))
            .collect::<Result<Vec<_>, _>>()?;
        info!(name = %fig_cfg.name, files = tables.len(), "timing figure");

        for unit in TimeUnit::ALL {
            let fig = figure(&tables, fig_cfg, cfg.value_column, unit)?;
            let stem = format!("varying-{}-{}", fig_cfg.name, unit.suffix());
            written.push(output.save(&fig, &cfg.output_folder, &stem)?);
        }
    }
    Ok(written)
}
