//! Explicit plot context for paper figures.
//!
//! Pipelines accumulate series, bands, bars and reference lines into a
//! [`Figure`] value and render it once, to SVG or PNG.

use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

use plotters::coord::Shift;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::PlotError;

pub type Rgb = (u8, u8, u8);

const FONT: &str = "sans-serif";
const REFERENCE_LINE: Rgb = (214, 39, 40);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Svg,
    Png,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Svg => "svg",
            OutputFormat::Png => "png",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderStyle {
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
    pub font_size: u32,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            format: OutputFormat::Svg,
            width: 800,
            height: 640,
            font_size: 18,
        }
    }
}

/// Parse `#rrggbb` (leading `#` optional).
pub fn parse_hex_color(s: &str) -> Option<Rgb> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

/// Parse a configured color list, skipping entries that are not `#rrggbb`.
pub fn parse_palette(colors: &[String]) -> Vec<Rgb> {
    colors
        .iter()
        .filter_map(|c| {
            let parsed = parse_hex_color(c);
            if parsed.is_none() {
                warn!(color = %c, "ignoring unparsable color");
            }
            parsed
        })
        .collect()
}

fn palette(i: usize) -> RGBColor {
    let c = Palette99::pick(i).to_rgba();
    RGBColor(c.0, c.1, c.2)
}

fn rgb(c: Rgb) -> RGBColor {
    RGBColor(c.0, c.1, c.2)
}

fn integer_label(x: &f64) -> String {
    format!("{x:.0}")
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LegendCorner {
    #[default]
    UpperLeft,
    UpperRight,
    LowerRight,
}

impl LegendCorner {
    fn position(self) -> SeriesLabelPosition {
        match self {
            LegendCorner::UpperLeft => SeriesLabelPosition::UpperLeft,
            LegendCorner::UpperRight => SeriesLabelPosition::UpperRight,
            LegendCorner::LowerRight => SeriesLabelPosition::LowerRight,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Series {
    pub label: Option<String>,
    pub points: Vec<(f64, f64)>,
    pub color: Option<Rgb>,
    pub style: LineStyle,
    pub markers: bool,
}

impl Series {
    pub fn line(points: Vec<(f64, f64)>) -> Self {
        Self {
            points,
            ..Self::default()
        }
    }

    /// `(i + 1, values[i])`.
    pub fn from_values(values: &[f64]) -> Self {
        Self::line(
            values
                .iter()
                .enumerate()
                .map(|(i, &y)| ((i + 1) as f64, y))
                .collect(),
        )
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_color(mut self, color: Option<Rgb>) -> Self {
        self.color = color;
        self
    }

    pub fn dashed(self) -> Self {
        self.with_style(LineStyle::Dashed)
    }

    pub fn with_style(mut self, style: LineStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_markers(mut self) -> Self {
        self.markers = true;
        self
    }
}

/// Filled region between two curves sharing x positions.
#[derive(Clone, Debug, PartialEq)]
pub struct Band {
    pub label: Option<String>,
    pub lower: Vec<(f64, f64)>,
    pub upper: Vec<(f64, f64)>,
    pub color: Rgb,
    pub opacity: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bar {
    pub x: f64,
    pub height: f64,
    pub error: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Figure {
    pub caption: Option<String>,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<Series>,
    pub bands: Vec<Band>,
    pub bars: Vec<Bar>,
    pub bar_width: f64,
    pub bar_color: Rgb,
    pub h_lines: Vec<f64>,
    pub y_from_zero: bool,
    pub integer_x: bool,
    pub legend: LegendCorner,
    /// First legend row, drawn without a marker.
    pub legend_title: Option<String>,
}

impl Figure {
    pub fn new(x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        Self {
            caption: None,
            x_label: x_label.into(),
            y_label: y_label.into(),
            series: Vec::new(),
            bands: Vec::new(),
            bars: Vec::new(),
            bar_width: 1.0,
            bar_color: (135, 206, 235),
            h_lines: Vec::new(),
            y_from_zero: false,
            integer_x: false,
            legend: LegendCorner::default(),
            legend_title: None,
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn push_series(&mut self, series: Series) {
        self.series.push(series);
    }

    pub fn push_band(&mut self, band: Band) {
        self.bands.push(band);
    }

    pub fn push_bar(&mut self, bar: Bar) {
        self.bars.push(bar);
    }

    pub fn push_h_line(&mut self, y: f64) {
        self.h_lines.push(y);
    }

    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|s| s.points.is_empty())
            && self.bands.is_empty()
            && self.bars.is_empty()
    }

    fn has_legend(&self) -> bool {
        self.series.iter().any(|s| s.label.is_some())
            || self.bands.iter().any(|b| b.label.is_some())
    }

    /// Axis ranges covering every element, with a little headroom on y.
    pub fn bounds(&self) -> ((f64, f64), (f64, f64)) {
        let mut xs: Vec<f64> = Vec::new();
        let mut ys: Vec<f64> = Vec::new();
        for s in &self.series {
            for &(x, y) in &s.points {
                xs.push(x);
                ys.push(y);
            }
        }
        for b in &self.bands {
            for &(x, y) in b.lower.iter().chain(b.upper.iter()) {
                xs.push(x);
                ys.push(y);
            }
        }
        let half = self.bar_width / 2.0;
        for b in &self.bars {
            xs.push(b.x - half);
            xs.push(b.x + half);
            let err = b.error.unwrap_or(0.0);
            ys.push(b.height + err);
            ys.push(b.height - err);
            ys.push(0.0);
        }
        ys.extend(self.h_lines.iter().copied());

        let finite = |v: &f64| v.is_finite();
        let mut x_min = xs.iter().copied().filter(finite).fold(f64::INFINITY, f64::min);
        let mut x_max = xs.iter().copied().filter(finite).fold(f64::NEG_INFINITY, f64::max);
        let mut y_min = ys.iter().copied().filter(finite).fold(f64::INFINITY, f64::min);
        let mut y_max = ys.iter().copied().filter(finite).fold(f64::NEG_INFINITY, f64::max);

        if !x_min.is_finite() || !x_max.is_finite() {
            x_min = 0.0;
            x_max = 1.0;
        }
        if (x_max - x_min).abs() < 1e-12 {
            x_min -= 1.0;
            x_max += 1.0;
        }
        if !y_min.is_finite() || !y_max.is_finite() {
            y_min = 0.0;
            y_max = 1.0;
        }
        if self.y_from_zero {
            y_min = 0.0;
        }
        if (y_max - y_min).abs() < 1e-12 {
            y_max = y_min + 1.0;
        }
        let pad = 0.05 * (y_max - y_min);
        let y_lo = if self.y_from_zero { y_min } else { y_min - pad };
        ((x_min, x_max), (y_lo, y_max + pad))
    }

    /// Render into `dir/stem.<ext>`, overwriting an existing file.
    pub fn save(&self, dir: &Path, stem: &str, style: &RenderStyle) -> Result<PathBuf, PlotError> {
        create_dir_all(dir).map_err(|e| PlotError::io(dir, e))?;
        let path = dir.join(format!("{stem}.{}", style.format.extension()));
        let size = (style.width, style.height);
        let drawn = match style.format {
            OutputFormat::Svg => self
                .draw(SVGBackend::new(&path, size).into_drawing_area(), style.font_size)
                .map_err(|e| e.to_string()),
            OutputFormat::Png => self
                .draw(BitMapBackend::new(&path, size).into_drawing_area(), style.font_size)
                .map_err(|e| e.to_string()),
        };
        drawn.map_err(|message| PlotError::Render {
            path: path.clone(),
            message,
        })?;
        info!(path = %path.display(), "figure written");
        Ok(path)
    }

    fn draw<DB: DrawingBackend>(
        &self,
        root: DrawingArea<DB, Shift>,
        font_size: u32,
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        root.fill(&WHITE)?;
        let ((x_min, x_max), (y_min, y_max)) = self.bounds();

        let mut builder = ChartBuilder::on(&root);
        builder
            .margin(15)
            .x_label_area_size(font_size * 3)
            .y_label_area_size(font_size * 4);
        if let Some(caption) = &self.caption {
            builder.caption(caption, (FONT, font_size + 2));
        }
        let mut chart = builder.build_cartesian_2d(x_min..x_max, y_min..y_max)?;

        let mut mesh = chart.configure_mesh();
        mesh.x_desc(self.x_label.as_str())
            .y_desc(self.y_label.as_str())
            .label_style((FONT, font_size))
            .axis_desc_style((FONT, font_size + 2))
            .light_line_style(BLACK.mix(0.05));
        if self.integer_x {
            mesh.x_label_formatter(&integer_label);
        }
        mesh.draw()?;

        if let Some(title) = &self.legend_title {
            chart
                .draw_series(std::iter::empty::<PathElement<(f64, f64)>>())?
                .label(title.clone())
                .legend(|(x, y)| EmptyElement::at((x, y)));
        }

        for band in &self.bands {
            let color = rgb(band.color).mix(band.opacity);
            let mut outline = band.upper.clone();
            outline.extend(band.lower.iter().rev().copied());
            let anno = chart.draw_series(std::iter::once(Polygon::new(outline, color.filled())))?;
            if let Some(label) = &band.label {
                anno.label(label.clone()).legend(move |(x, y)| {
                    Rectangle::new([(x, y - 5), (x + 20, y + 5)], color.filled())
                });
            }
        }

        let half = self.bar_width / 2.0;
        let bar_color = rgb(self.bar_color);
        for bar in &self.bars {
            let corners = [(bar.x - half, 0.0), (bar.x + half, bar.height)];
            chart.draw_series(std::iter::once(Rectangle::new(corners, bar_color.filled())))?;
            chart.draw_series(std::iter::once(Rectangle::new(corners, BLACK.stroke_width(1))))?;
            if let Some(err) = bar.error {
                chart.draw_series(std::iter::once(ErrorBar::new_vertical(
                    bar.x,
                    bar.height - err,
                    bar.height,
                    bar.height + err,
                    BLACK.stroke_width(1),
                    10,
                )))?;
            }
        }

        for (i, series) in self.series.iter().enumerate() {
            let color = series.color.map(rgb).unwrap_or_else(|| palette(i));
            let style = color.stroke_width(2);
            let points = series.points.iter().copied();
            let anno = match series.style {
                LineStyle::Solid => chart.draw_series(LineSeries::new(points, style))?,
                LineStyle::Dashed => chart.draw_series(DashedLineSeries::new(points, 8, 5, style))?,
                LineStyle::Dotted => chart.draw_series(DashedLineSeries::new(points, 2, 4, style))?,
            };
            if let Some(label) = &series.label {
                anno.label(label.clone()).legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
            }
            if series.markers {
                chart.draw_series(
                    series
                        .points
                        .iter()
                        .map(|&p| Circle::new(p, 4, color.filled())),
                )?;
            }
        }

        let line_style = rgb(REFERENCE_LINE).stroke_width(1);
        for &y in &self.h_lines {
            chart.draw_series(DashedLineSeries::new(
                vec![(x_min, y), (x_max, y)],
                6,
                4,
                line_style,
            ))?;
        }

        if self.has_legend() {
            chart
                .configure_series_labels()
                .position(self.legend.position())
                .label_font((FONT, font_size))
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;
        }

        root.present()?;
        Ok(())
    }
}
