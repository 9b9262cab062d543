use serde::{Deserialize, Serialize};

use crate::errors::HandwritingError;
use crate::geometry::spline::DEFAULT_UPSAMPLE_FACTOR;
use crate::synthesis::alphabet::ALPHABET_SIZE;

/// Nominal height of one written line in model units. Multiplied by a canvas's
/// stroke scale this must fit inside that canvas's line spacing.
pub const NOMINAL_LINE_HEIGHT: f32 = 40.0;

/// The longest line the model is asked to write in one go.
pub const MAX_CHARS_PER_LINE_CEILING: usize = ALPHABET_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperMode {
    #[default]
    Blank,
    #[serde(alias = "ruled")]
    Lined,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

/// Single page, height grows with the line count, lines centred.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlankCanvasConfig {
    pub width: f32,
    pub line_height: f32,
    pub padding_top: f32,
    pub padding_bottom: f32,
    /// Left offset for lines too wide to centre.
    pub overflow_margin: f32,
    pub stroke_scale: f32,
    pub stroke_width: f32,
    pub stroke_color: String,
    /// Above this many lines a quality warning is logged.
    pub warn_above_lines: usize,
}

impl Default for BlankCanvasConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            line_height: 80.0,
            padding_top: 40.0,
            padding_bottom: 40.0,
            overflow_margin: 50.0,
            stroke_scale: 1.5,
            stroke_width: 2.0,
            stroke_color: "black".to_string(),
            warn_above_lines: 10,
        }
    }
}

impl BlankCanvasConfig {
    pub fn height(&self, lines: usize) -> f32 {
        self.padding_top + lines as f32 * self.line_height + self.padding_bottom
    }
}

/// Notebook paper: fixed page size, ruled guides, left-aligned lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuledCanvasConfig {
    pub width: f32,
    pub margins: Margins,
    pub line_gap: f32,
    pub lines_per_page: usize,
    pub stroke_scale: f32,
    /// Vertical shift of the written line relative to its rule.
    pub baseline_offset: f32,
    pub stroke_width: f32,
    pub stroke_color: String,
    pub default_stretch: f32,
    pub max_stretch: f32,
    /// Fill ratio of the writing area above which a line is justified.
    pub justify_threshold: f32,
    pub margin_color: String,
    pub margin_width: f32,
    pub header_color: String,
    pub header_width: f32,
    pub header_gap: f32,
    pub rule_color: String,
    pub rule_width: f32,
}

impl Default for RuledCanvasConfig {
    fn default() -> Self {
        Self {
            width: 1860.0,
            margins: Margins {
                left: 150.0,
                right: 150.0,
                top: 250.0,
                bottom: 250.0,
            },
            line_gap: 125.0,
            lines_per_page: 17,
            stroke_scale: 2.4,
            baseline_offset: -15.0,
            stroke_width: 2.4,
            stroke_color: "black".to_string(),
            default_stretch: 1.5,
            max_stretch: 1.7,
            justify_threshold: 0.75,
            margin_color: "#DBDBDB".to_string(),
            margin_width: 2.0,
            header_color: "#FFB0B0".to_string(),
            header_width: 2.0,
            header_gap: 6.0,
            rule_color: "#7BA3C4".to_string(),
            rule_width: 1.5,
        }
    }
}

impl RuledCanvasConfig {
    /// Header margin, one gap per line, bottom margin.
    pub fn page_height(&self) -> f32 {
        self.margins.top + self.lines_per_page as f32 * self.line_gap + self.margins.bottom
    }

    pub fn writing_width(&self) -> f32 {
        self.width - self.margins.left - self.margins.right
    }

    /// Rule `k` (0-based) sits one gap below the header for `k = 0`.
    pub fn rule_y(&self, k: usize) -> f32 {
        self.margins.top + (k + 1) as f32 * self.line_gap
    }
}

/// Every layout constant in one place. Passed explicitly to the wrapper,
/// paginator and renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub paper: PaperMode,
    pub max_chars_per_line: usize,
    /// Spline upsampling factor applied after smoothing; 1 disables it.
    pub interpolation_factor: usize,
    pub blank: BlankCanvasConfig,
    pub ruled: RuledCanvasConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            paper: PaperMode::Blank,
            max_chars_per_line: 55,
            interpolation_factor: DEFAULT_UPSAMPLE_FACTOR,
            blank: BlankCanvasConfig::default(),
            ruled: RuledCanvasConfig::default(),
        }
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<(), HandwritingError> {
        let invalid = |msg: String| Err(HandwritingError::InvalidLayout(msg));

        if self.max_chars_per_line == 0 || self.max_chars_per_line > MAX_CHARS_PER_LINE_CEILING {
            return invalid(format!(
                "max_chars_per_line must be in 1..={MAX_CHARS_PER_LINE_CEILING}, got {}",
                self.max_chars_per_line
            ));
        }
        if self.interpolation_factor == 0 {
            return invalid("interpolation_factor must be at least 1".to_string());
        }

        let blank = &self.blank;
        if blank.width <= 0.0 || blank.line_height <= 0.0 {
            return invalid("blank canvas width and line height must be positive".to_string());
        }
        if blank.stroke_scale <= 0.0 || blank.stroke_scale * NOMINAL_LINE_HEIGHT > blank.line_height {
            return invalid(format!(
                "blank stroke scale {} does not fit a {}px line",
                blank.stroke_scale, blank.line_height
            ));
        }

        let ruled = &self.ruled;
        if ruled.lines_per_page == 0 {
            return invalid("lines_per_page must be at least 1".to_string());
        }
        if ruled.writing_width() <= 0.0 {
            return invalid("ruled margins leave no writing area".to_string());
        }
        if ruled.stroke_scale <= 0.0 || ruled.stroke_scale * NOMINAL_LINE_HEIGHT > ruled.line_gap {
            return invalid(format!(
                "ruled stroke scale {} does not fit a {}px line gap",
                ruled.stroke_scale, ruled.line_gap
            ));
        }
        if ruled.default_stretch <= 0.0 || ruled.max_stretch < ruled.default_stretch {
            return invalid("ruled stretch must satisfy 0 < default_stretch <= max_stretch".to_string());
        }
        Ok(())
    }

    /// Lines per page for the configured paper.
    pub fn page_capacity(&self) -> crate::layout::paginate::PageCapacity {
        use crate::layout::paginate::PageCapacity;
        match self.paper {
            PaperMode::Blank => PageCapacity::Unbounded,
            PaperMode::Lined => PageCapacity::Lines(self.ruled.lines_per_page),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::paginate::PageCapacity;

    #[test]
    fn test_defaults_validate() {
        assert!(LayoutConfig::default().validate().is_ok());
    }

    #[test]
    fn test_ruled_page_height() {
        let ruled = RuledCanvasConfig::default();
        assert_eq!(ruled.page_height(), 250.0 + 17.0 * 125.0 + 250.0);
        assert_eq!(ruled.writing_width(), 1560.0);
        assert_eq!(ruled.rule_y(0), 375.0);
    }

    #[test]
    fn test_stroke_scale_must_fit_line_gap() {
        let mut config = LayoutConfig::default();
        config.ruled.line_gap = 90.0; // 2.4 × 40 = 96 > 90
        assert!(matches!(
            config.validate(),
            Err(HandwritingError::InvalidLayout(_))
        ));
    }

    #[test]
    fn test_max_chars_ceiling() {
        let mut config = LayoutConfig {
            max_chars_per_line: 76,
            ..LayoutConfig::default()
        };
        assert!(config.validate().is_err());
        config.max_chars_per_line = 0;
        assert!(config.validate().is_err());
        config.max_chars_per_line = 75;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_page_capacity_by_paper() {
        let mut config = LayoutConfig::default();
        assert_eq!(config.page_capacity(), PageCapacity::Unbounded);
        config.paper = PaperMode::Lined;
        assert_eq!(config.page_capacity(), PageCapacity::Lines(17));
    }

    #[test]
    fn test_paper_mode_accepts_ruled_alias() {
        let mode: PaperMode = serde_json::from_str(r#""ruled""#).unwrap();
        assert_eq!(mode, PaperMode::Lined);
        let mode: PaperMode = serde_json::from_str(r#""blank""#).unwrap();
        assert_eq!(mode, PaperMode::Blank);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: LayoutConfig =
            serde_json::from_str(r#"{"paper":"lined","ruled":{"lines_per_page":5}}"#).unwrap();
        assert_eq!(config.ruled.lines_per_page, 5);
        assert_eq!(config.ruled.line_gap, 125.0);
        assert_eq!(config.max_chars_per_line, 55);
    }
}
