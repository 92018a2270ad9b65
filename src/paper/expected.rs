//! Expected number of contacts until recovery, with one standard deviation
//! as error bars.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::Output;
use super::figure::{Bar, Figure};
use crate::config::{ExpectedConfig, ExpectedFigureConfig};
use crate::core::stats::{expected_value, scale, standard_deviation, support_bounds};
use crate::data::discovery::{files_by_param, result_directories};
use crate::data::table::ContactHistogram;
use crate::error::PlotError;

/// Moments of one contact PMF.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContactMoments {
    pub expected: f64,
    pub std: f64,
    /// First and last contact count with non-zero probability.
    pub support: Option<(usize, usize)>,
}

impl ContactMoments {
    pub fn of(pmf: &[f64]) -> Self {
        Self {
            expected: expected_value(pmf),
            std: standard_deviation(pmf),
            support: support_bounds(pmf),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExpectedRow {
    pub value: u32,
    pub trustees: ContactMoments,
    pub people: ContactMoments,
}

/// Moments for one result file. The trustee PMF is cut at the number of
/// trustees in the run.
pub fn expected_row(
    value: u32,
    trustee_count: u32,
    hist: &ContactHistogram,
    iterations: u64,
) -> Result<ExpectedRow, PlotError> {
    let invalid = || PlotError::InvalidConfig("iteration count must be positive".into());
    let people = scale(&hist.people, iterations).ok_or_else(invalid)?;
    let mut trustees = scale(&hist.trustees, iterations).ok_or_else(invalid)?;
    trustees.truncate(trustee_count as usize);
    Ok(ExpectedRow {
        value,
        trustees: ContactMoments::of(&trustees),
        people: ContactMoments::of(&people),
    })
}

pub fn bar_figure(
    rows: &[ExpectedRow],
    pick: impl Fn(&ExpectedRow) -> ContactMoments,
    x_label: &str,
    y_label: &str,
    bar_width: f64,
) -> Figure {
    let mut fig = Figure::new(x_label, y_label);
    fig.y_from_zero = true;
    fig.integer_x = true;
    fig.bar_width = bar_width;
    for row in rows {
        let m = pick(row);
        fig.push_bar(Bar {
            x: row.value as f64,
            height: m.expected,
            error: Some(m.std),
        });
    }
    fig
}

fn bound(support: Option<(usize, usize)>, pick: fn((usize, usize)) -> usize) -> String {
    support.map(|s| pick(s).to_string()).unwrap_or_default()
}

pub fn rows_csv(param: &str, rows: &[ExpectedRow]) -> String {
    let mut csv = format!(
        "{param},expected_trustees,std_trustees,min_trustees,max_trustees,\
         expected_people,std_people,min_people,max_people\n"
    );
    for row in rows {
        let (t, p) = (row.trustees, row.people);
        csv.push_str(&format!(
            "{},{:.6},{:.6},{},{},{:.6},{:.6},{},{}\n",
            row.value,
            t.expected,
            t.std,
            bound(t.support, |s| s.0),
            bound(t.support, |s| s.1),
            p.expected,
            p.std,
            bound(p.support, |s| s.0),
            bound(p.support, |s| s.1),
        ));
    }
    csv
}

fn load_rows(
    cfg: &ExpectedConfig,
    fig_cfg: &ExpectedFigureConfig,
    dirs: &[PathBuf],
) -> Result<Vec<ExpectedRow>, PlotError> {
    files_by_param(dirs, &fig_cfg.relevant_dir, fig_cfg.param)?
        .into_iter()
        .map(|(value, (path, params))| {
            let hist = ContactHistogram::read(&path)?;
            expected_row(value, params.trustees, &hist, cfg.iterations)
        })
        .collect()
}

pub fn run(cfg: &ExpectedConfig, output: &Output) -> Result<Vec<PathBuf>, PlotError> {
    let dirs = result_directories(Path::new(&cfg.folder))?;
    let mut written = Vec::new();

    for fig_cfg in &cfg.figures {
        let param = fig_cfg.param;
        let rows = load_rows(cfg, fig_cfg, &dirs)?;
        if rows.is_empty() {
            warn!(%param, relevant = %fig_cfg.relevant_dir, "no result files; skipping figure");
            continue;
        }
        info!(%param, values = rows.len(), "expected contacts");

        let sub = Path::new(&cfg.output_folder).join(param.label());
        let trustees = bar_figure(
            &rows,
            |r| r.trustees,
            &fig_cfg.x_label,
            &cfg.y_label_trustees,
            cfg.bar_width,
        );
        written.push(output.save(&trustees, &sub, &format!("plot-expected-people-{param}-tr-std"))?);

        let people = bar_figure(
            &rows,
            |r| r.people,
            &fig_cfg.x_label,
            &cfg.y_label_people,
            cfg.bar_width,
        );
        written.push(output.save(&people, &sub, &format!("plot-expected-people-{param}-anon-std"))?);

        written.push(super::write_csv(
            &output.dir(&sub),
            &format!("expected-{param}.csv"),
            rows_csv(param.label(), &rows),
        )?);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trustee_pmf_is_cut_at_trustee_count() {
        let hist = ContactHistogram {
            trustees: vec![0.0, 5.0, 5.0, 10.0],
            people: vec![0.0, 0.0, 10.0, 10.0],
        };
        let row = expected_row(50, 3, &hist, 20).unwrap();
        // trustees: 0.25 at 2, 0.25 at 3 after the cut
        assert!((row.trustees.expected - 1.25).abs() < 1e-12);
        assert_eq!(row.trustees.support, Some((2, 3)));
        // people: 0.5 at 3, 0.5 at 4
        assert!((row.people.expected - 3.5).abs() < 1e-12);
        assert!((row.people.std - 0.5).abs() < 1e-12);
        assert_eq!(row.people.support, Some((3, 4)));
    }

    #[test]
    fn bars_carry_std_errors() {
        let row = ExpectedRow {
            value: 100,
            trustees: ContactMoments::of(&[0.5, 0.5]),
            people: ContactMoments::of(&[0.0, 1.0]),
        };
        let fig = bar_figure(&[row], |r| r.people, "x", "y", 4.0);
        assert_eq!(fig.bars.len(), 1);
        assert_eq!(fig.bars[0].x, 100.0);
        assert_eq!(fig.bars[0].height, 2.0);
        assert_eq!(fig.bars[0].error, Some(0.0));
        assert_eq!(fig.bar_width, 4.0);
    }

    #[test]
    fn csv_leaves_empty_support_blank() {
        let row = ExpectedRow {
            value: 7,
            trustees: ContactMoments::of(&[0.0, 0.0]),
            people: ContactMoments::of(&[1.0]),
        };
        let csv = rows_csv("threshold", &[row]);
        let line = csv.lines().nth(1).unwrap();
        assert!(line.starts_with("7,0.000000,0.000000,,,1.000000,0.000000,1,1"));
    }
}
