//! Chart layout and time-axis formatting

use chrono::{DateTime, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Chart layout configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartLayout {
    /// Total chart width in pixels
    pub width: u32,
    /// Total chart height in pixels
    pub height: u32,
    /// Margin configuration
    pub margins: Margins,
    /// Space reserved below the plot for x-axis labels
    pub x_label_area: u32,
    /// Space reserved left of the plot for y-axis labels
    pub y_label_area: u32,
    /// Number of x-axis labels
    pub x_label_count: usize,
}

impl Default for ChartLayout {
    fn default() -> Self {
        Self {
            width: super::DEFAULT_WIDTH,
            height: super::DEFAULT_HEIGHT,
            margins: Margins::default(),
            x_label_area: 70,
            y_label_area: 80,
            x_label_count: 10,
        }
    }
}

impl ChartLayout {
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Layout for one of `count` vertically stacked panels
    pub fn panel(&self, count: usize) -> ChartLayout {
        let count = count.max(1) as u32;
        ChartLayout {
            height: self.height / count,
            x_label_area: self.x_label_area / 2,
            ..self.clone()
        }
    }
}

/// Margin configuration for chart layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            left: 20,
            right: 40, // Small buffer
            top: 20,
            bottom: 20,
        }
    }
}

/// Label format for a date/time x axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeAxisFormat {
    /// `%Y-%m-%d`
    Date,
    /// `%Y-%m-%d %H:%M`
    DateTime,
}

impl TimeAxisFormat {
    pub fn pattern(self) -> &'static str {
        match self {
            TimeAxisFormat::Date => "%Y-%m-%d",
            TimeAxisFormat::DateTime => "%Y-%m-%d %H:%M",
        }
    }

    /// Date-only labels unless some timestamp has a non-zero minute.
    ///
    /// Only minutes are inspected, so hourly bars on the hour still get
    /// date-only labels. Unparsed (`None`) entries are skipped; they never
    /// switch the axis to minute labels on their own.
    pub fn infer(index: &[Option<NaiveDateTime>]) -> Self {
        if index.iter().flatten().any(|dt| dt.minute() != 0) {
            TimeAxisFormat::DateTime
        } else {
            TimeAxisFormat::Date
        }
    }

    pub fn format(self, dt: &NaiveDateTime) -> String {
        dt.format(self.pattern()).to_string()
    }
}

/// Position of a timestamp on a numeric axis (seconds since the epoch)
pub fn axis_position(dt: &NaiveDateTime) -> f64 {
    dt.and_utc().timestamp() as f64
}

/// Inverse of [`axis_position`], formatted for tick labels
pub fn axis_label(position: f64, format: TimeAxisFormat) -> String {
    DateTime::from_timestamp(position.round() as i64, 0)
        .map(|dt| format.format(&dt.naive_utc()))
        .unwrap_or_default()
}
