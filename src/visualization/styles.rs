//! Visual styling and color schemes for exchange-rate charts

use plotters::style::RGBColor;

pub const BLUE: RGBColor = RGBColor(31, 119, 180);
pub const ORANGE: RGBColor = RGBColor(255, 127, 14);
pub const GREEN: RGBColor = RGBColor(44, 160, 44);
pub const RED: RGBColor = RGBColor(214, 39, 40);

/// Color scheme for chart backgrounds, axes and series
#[derive(Debug, Clone)]
pub struct ColorScheme {
    /// Background color
    pub background: RGBColor,
    /// Grid line color
    pub grid: RGBColor,
    /// Text color
    pub text: RGBColor,
    /// Legend border color
    pub border: RGBColor,
    /// Series colors, cycled in draw order
    pub palette: Vec<RGBColor>,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::light()
    }
}

impl ColorScheme {
    /// White background with a ten-color categorical palette
    pub fn light() -> Self {
        Self {
            background: RGBColor(255, 255, 255),
            grid: RGBColor(192, 192, 192),    // Silver
            text: RGBColor(47, 79, 79),       // Dark Slate Gray
            border: RGBColor(105, 105, 105),  // Dim Gray
            palette: vec![
                BLUE,
                ORANGE,
                GREEN,
                RED,
                RGBColor(148, 103, 189),
                RGBColor(140, 86, 75),
                RGBColor(227, 119, 194),
                RGBColor(127, 127, 127),
                RGBColor(188, 189, 34),
                RGBColor(23, 190, 207),
            ],
        }
    }

    /// Dark theme color scheme
    pub fn dark() -> Self {
        Self {
            background: RGBColor(21, 23, 25), // Very Dark Gray
            grid: RGBColor(64, 68, 75),       // Dark Gray
            text: RGBColor(208, 210, 214),    // Light Gray
            border: RGBColor(128, 128, 128),  // Gray
            palette: vec![
                RGBColor(0, 200, 83),
                RGBColor(255, 193, 7),
                RGBColor(77, 166, 255),
                RGBColor(255, 77, 77),
                RGBColor(186, 104, 200),
                RGBColor(255, 138, 101),
            ],
        }
    }

    /// Color for the `index`-th series
    pub fn series_color(&self, index: usize) -> RGBColor {
        if self.palette.is_empty() {
            return self.text;
        }
        self.palette[index % self.palette.len()]
    }
}

/// Diverging blue-white-red map for values in [-1, 1]
pub fn coolwarm(value: f64) -> RGBColor {
    const COLD: RGBColor = RGBColor(59, 76, 192);
    const NEUTRAL: RGBColor = RGBColor(221, 221, 221);
    const WARM: RGBColor = RGBColor(180, 4, 38);

    let value = value.clamp(-1.0, 1.0);
    if value < 0.0 {
        blend(NEUTRAL, COLD, -value)
    } else {
        blend(NEUTRAL, WARM, value)
    }
}

/// Linear blend from `from` (t = 0) to `to` (t = 1)
fn blend(from: RGBColor, to: RGBColor, t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    RGBColor(mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
}

/// Visual styling configuration for charts
#[derive(Debug, Clone)]
pub struct ChartStyle {
    /// Color scheme to use
    pub colors: ColorScheme,
    /// Line width in pixels
    pub line_width: u32,
    /// Dash length and gap for dashed series
    pub dash: (u32, u32),
    /// Bar group width relative to its category slot (0.1 to 1.0)
    pub bar_width_ratio: f64,
    pub font_family: String,
    pub title_font_size: u32,
    pub label_font_size: u32,
    pub legend_font_size: u32,
    /// Heatmap cell annotations
    pub annotation_font_size: u32,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            colors: ColorScheme::light(),
            line_width: 2,
            dash: (8, 4),
            bar_width_ratio: 0.8,
            font_family: "sans-serif".to_string(),
            title_font_size: 24,
            label_font_size: 14,
            legend_font_size: 12,
            annotation_font_size: 14,
        }
    }
}

impl ChartStyle {
    pub fn dark() -> Self {
        Self {
            colors: ColorScheme::dark(),
            ..Self::default()
        }
    }

    /// Readable annotation color on top of a heatmap cell
    pub fn annotation_color(&self, cell: RGBColor) -> RGBColor {
        let luminance = 0.299 * cell.0 as f64 + 0.587 * cell.1 as f64 + 0.114 * cell.2 as f64;
        if luminance > 140.0 {
            RGBColor(0, 0, 0)
        } else {
            RGBColor(255, 255, 255)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coolwarm_endpoints() {
        assert_eq!(coolwarm(0.0), RGBColor(221, 221, 221));
        assert_eq!(coolwarm(1.0), RGBColor(180, 4, 38));
        assert_eq!(coolwarm(-1.0), RGBColor(59, 76, 192));
        assert_eq!(coolwarm(5.0), coolwarm(1.0));
    }

    #[test]
    fn test_palette_cycles() {
        let colors = ColorScheme::light();
        assert_eq!(colors.series_color(0), colors.series_color(colors.palette.len()));
    }

    #[test]
    fn test_annotation_contrast() {
        let style = ChartStyle::default();
        assert_eq!(style.annotation_color(coolwarm(0.0)), RGBColor(0, 0, 0));
        assert_eq!(style.annotation_color(coolwarm(1.0)), RGBColor(255, 255, 255));
    }
}
