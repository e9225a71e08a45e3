//! Chart rendering to PNG and SVG files

use super::charts::{BarChart, Heatmap, LineChart, LineKind, PanelChart};
use super::layouts::{ChartLayout, axis_label};
use super::styles::{ChartStyle, coolwarm};
use crate::errors::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Output file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Png,
    Svg,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
        }
    }
}

/// A chart model that can draw itself onto any plotters backend
pub trait Render {
    fn render<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        layout: &ChartLayout,
        style: &ChartStyle,
    ) -> Result<()>
    where
        DB::ErrorType: 'static;
}

/// Writes chart models to image files
#[derive(Debug, Clone)]
pub struct ChartExporter {
    layout: ChartLayout,
    style: ChartStyle,
    format: OutputFormat,
}

impl ChartExporter {
    pub fn new(layout: ChartLayout, style: ChartStyle, format: OutputFormat) -> Self {
        Self { layout, style, format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Render `chart` to `path` with the exporter's extension applied.
    /// Returns the path actually written.
    pub fn export<C: Render>(&self, chart: &C, path: &Path) -> Result<PathBuf> {
        let path = path.with_extension(self.format.extension());
        let size = (self.layout.width, self.layout.height);

        match self.format {
            OutputFormat::Png => {
                let root = BitMapBackend::new(&path, size).into_drawing_area();
                chart.render(&root, &self.layout, &self.style)?;
                root.present()?;
            }
            OutputFormat::Svg => {
                let root = SVGBackend::new(&path, size).into_drawing_area();
                chart.render(&root, &self.layout, &self.style)?;
                root.present()?;
            }
        }

        info!(path = %path.display(), "chart written");
        Ok(path)
    }
}

impl Render for LineChart {
    fn render<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        layout: &ChartLayout,
        style: &ChartStyle,
    ) -> Result<()>
    where
        DB::ErrorType: 'static,
    {
        root.fill(&style.colors.background)?;
        draw_line_chart(self, root, layout, style)
    }
}

impl Render for PanelChart {
    fn render<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        layout: &ChartLayout,
        style: &ChartStyle,
    ) -> Result<()>
    where
        DB::ErrorType: 'static,
    {
        root.fill(&style.colors.background)?;
        let body = root.titled(
            &self.title,
            (style.font_family.as_str(), style.title_font_size),
        )?;

        let panel_layout = layout.panel(self.panels.len());
        let areas = body.split_evenly((self.panels.len().max(1), 1));
        for (panel, area) in self.panels.iter().zip(areas.iter()) {
            draw_line_chart(panel, area, &panel_layout, style)?;
        }
        Ok(())
    }
}

impl Render for Heatmap {
    fn render<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        layout: &ChartLayout,
        style: &ChartStyle,
    ) -> Result<()>
    where
        DB::ErrorType: 'static,
    {
        root.fill(&style.colors.background)?;

        let n = self.labels.len();
        let slots = n.max(1);
        let reversed: Vec<String> = self.labels.iter().rev().cloned().collect();

        let mut chart = ChartBuilder::on(root)
            .caption(&self.title, (style.font_family.as_str(), style.title_font_size))
            .margin_left(layout.margins.left)
            .margin_right(layout.margins.right)
            .margin_top(layout.margins.top)
            .margin_bottom(layout.margins.bottom)
            .x_label_area_size(layout.x_label_area)
            .y_label_area_size(layout.y_label_area * 2)
            .build_cartesian_2d(category_range(slots), category_range(slots))?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(slots)
            .y_labels(slots)
            .x_label_formatter(&|x| category_label(&self.labels, *x))
            .y_label_formatter(&|y| category_label(&reversed, *y))
            .label_style((style.font_family.as_str(), style.label_font_size))
            .draw()?;

        // Row 0 sits at the top; cell (col, row) is centred on integer coordinates
        let cells: Vec<(f64, f64, Option<f64>, String)> = (0..n)
            .flat_map(|row| (0..n).map(move |col| (row, col)))
            .map(|(row, col)| {
                let value = self.values.get(row).and_then(|r| r.get(col)).copied().flatten();
                (col as f64, (n - row - 1) as f64, value, self.annotation(row, col))
            })
            .collect();

        chart.draw_series(cells.iter().map(|(x, y, value, _)| {
            let fill = value.map(coolwarm).unwrap_or(style.colors.grid);
            Rectangle::new([(*x - 0.5, *y - 0.5), (*x + 0.5, *y + 0.5)], fill.filled())
        }))?;

        let centred = Pos::new(HPos::Center, VPos::Center);
        chart.draw_series(cells.iter().map(|(x, y, value, text)| {
            let fill = value.map(coolwarm).unwrap_or(style.colors.grid);
            let font = (style.font_family.as_str(), style.annotation_font_size)
                .into_font()
                .color(&style.annotation_color(fill))
                .pos(centred);
            Text::new(text.clone(), (*x, *y), font)
        }))?;

        Ok(())
    }
}

impl Render for BarChart {
    fn render<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        layout: &ChartLayout,
        style: &ChartStyle,
    ) -> Result<()>
    where
        DB::ErrorType: 'static,
    {
        root.fill(&style.colors.background)?;

        let slots = self.categories.len().max(1);
        let y_max = match self.max_value() {
            v if v > 0.0 => v * 1.1,
            _ => 1.0,
        };

        let mut chart = ChartBuilder::on(root)
            .caption(&self.title, (style.font_family.as_str(), style.title_font_size))
            .margin_left(layout.margins.left)
            .margin_right(layout.margins.right)
            .margin_top(layout.margins.top)
            .margin_bottom(layout.margins.bottom)
            .x_label_area_size(layout.x_label_area)
            .y_label_area_size(layout.y_label_area)
            .build_cartesian_2d(category_range(slots), 0.0..y_max)?;

        chart
            .configure_mesh()
            .x_desc(&self.x_label)
            .y_desc(&self.y_label)
            .x_labels(slots)
            .x_label_formatter(&|x| category_label(&self.categories, *x))
            .label_style((style.font_family.as_str(), style.label_font_size))
            .draw()?;

        if let Some(title) = &self.legend_title {
            legend_heading(&mut chart, title)?;
        }

        let ratio = style.bar_width_ratio.clamp(0.1, 1.0);
        let width = ratio / self.groups.len().max(1) as f64;
        let offset = (1.0 - ratio) / 2.0;

        for (g, group) in self.groups.iter().enumerate() {
            let color = style.colors.series_color(g);
            chart
                .draw_series(group.values.iter().enumerate().filter_map(|(i, value)| {
                    let value = (*value)?;
                    let left = i as f64 - 0.5 + offset + g as f64 * width;
                    Some(Rectangle::new([(left, 0.0), (left + width, value)], color.filled()))
                }))?
                .label(group.label.as_str())
                .legend(move |(x, y)| {
                    Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled())
                });
        }

        draw_legend(&mut chart, style)
    }
}

fn draw_line_chart<DB: DrawingBackend>(
    model: &LineChart,
    area: &DrawingArea<DB, Shift>,
    layout: &ChartLayout,
    style: &ChartStyle,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let (x_min, x_max) = padded(model.x_bounds());
    let (y_min, y_max) = padded(model.y_bounds());
    let time_format = model.time_format;

    let mut chart = ChartBuilder::on(area)
        .caption(&model.title, (style.font_family.as_str(), style.title_font_size))
        .margin_left(layout.margins.left)
        .margin_right(layout.margins.right)
        .margin_top(layout.margins.top)
        .margin_bottom(layout.margins.bottom)
        .x_label_area_size(layout.x_label_area)
        .y_label_area_size(layout.y_label_area)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc(&model.x_label)
        .y_desc(&model.y_label)
        .x_labels(layout.x_label_count)
        .x_label_formatter(&|x| axis_label(*x, time_format))
        .label_style((style.font_family.as_str(), style.label_font_size))
        .light_line_style(style.colors.grid.mix(0.3))
        .draw()?;

    if let Some(title) = &model.legend_title {
        legend_heading(&mut chart, title)?;
    }

    let (dash, gap) = style.dash;
    for (i, series) in model.series.iter().enumerate() {
        let color = series.color.unwrap_or_else(|| style.colors.series_color(i));
        let line = color.stroke_width(style.line_width);
        let points: Vec<(f64, f64)> = series
            .points
            .iter()
            .map(|(dt, v)| (super::layouts::axis_position(dt), *v))
            .collect();

        let anno = match series.kind {
            LineKind::Solid => chart.draw_series(LineSeries::new(points, line))?,
            LineKind::Dashed => chart.draw_series(DashedLineSeries::new(points, dash, gap, line))?,
        };
        anno.label(series.label.as_str()).legend(move |(x, y)| {
            PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
        });
    }

    draw_legend(&mut chart, style)
}

/// Text-only legend entry placed ahead of the series entries
fn legend_heading<'a, DB, X, Y>(
    chart: &mut ChartContext<'a, DB, Cartesian2d<X, Y>>,
    title: &str,
) -> Result<()>
where
    DB: DrawingBackend + 'a,
    DB::ErrorType: 'static,
    X: Ranged,
    Y: Ranged,
{
    chart
        .draw_series(std::iter::empty::<PathElement<(X::ValueType, Y::ValueType)>>())?
        .label(title)
        .legend(|(x, y)| EmptyElement::at((x, y)));
    Ok(())
}

fn draw_legend<'a, DB, X, Y>(
    chart: &mut ChartContext<'a, DB, Cartesian2d<X, Y>>,
    style: &ChartStyle,
) -> Result<()>
where
    DB: DrawingBackend + 'a,
    DB::ErrorType: 'static,
    X: Ranged,
    Y: Ranged,
{
    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(style.colors.background.mix(0.8))
        .border_style(style.colors.border)
        .label_font((style.font_family.as_str(), style.legend_font_size))
        .draw()?;
    Ok(())
}

/// Axis over `slots` categories, each centred on its integer position
fn category_range(slots: usize) -> std::ops::Range<f64> {
    -0.5..slots as f64 - 0.5
}

/// Label for a tick that falls on a category centre, empty elsewhere
fn category_label(labels: &[String], position: f64) -> String {
    let slot = position.round();
    if (position - slot).abs() > 1e-6 || slot < 0.0 {
        return String::new();
    }
    labels.get(slot as usize).cloned().unwrap_or_default()
}

/// Bounds widened by 5% (or by one unit when flat), `0..1` when empty
fn padded(bounds: Option<(f64, f64)>) -> (f64, f64) {
    match bounds {
        Some((lo, hi)) if hi > lo => {
            let pad = (hi - lo) * 0.05;
            (lo - pad, hi + pad)
        }
        Some((lo, _)) => (lo - 1.0, lo + 1.0),
        None => (0.0, 1.0),
    }
}
