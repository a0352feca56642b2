//! Text overlay placement and drawtext filter construction.

use crate::error::{ReelcutError, Result};
use std::path::Path;

/// Distance from the frame edge, in pixels, for edge-anchored text.
const EDGE_MARGIN: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HorizontalAlign {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerticalAlign {
    Top,
    #[default]
    Center,
    Bottom,
}

/// On-screen anchor for a text overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextPosition {
    pub horizontal: HorizontalAlign,
    pub vertical: VerticalAlign,
}

impl TextPosition {
    /// drawtext `x` expression.
    fn x_expr(&self) -> String {
        match self.horizontal {
            HorizontalAlign::Left => EDGE_MARGIN.to_string(),
            HorizontalAlign::Center => "(w-text_w)/2".to_string(),
            HorizontalAlign::Right => format!("w-text_w-{}", EDGE_MARGIN),
        }
    }

    /// drawtext `y` expression.
    fn y_expr(&self) -> String {
        match self.vertical {
            VerticalAlign::Top => EDGE_MARGIN.to_string(),
            VerticalAlign::Center => "(h-text_h)/2".to_string(),
            VerticalAlign::Bottom => format!("h-text_h-{}", EDGE_MARGIN),
        }
    }
}

impl std::str::FromStr for TextPosition {
    type Err = ReelcutError;

    /// Accepts `center`, `top-left`, `bottom_right`, `center,top`,
    /// `('center', 'top')` and similar spellings. Pairs are read as (x, y).
    fn from_str(s: &str) -> Result<Self> {
        let mut position = TextPosition::default();

        let words = s
            .split(|c: char| !c.is_ascii_alphabetic())
            .filter(|w| !w.is_empty())
            .map(|w| w.to_ascii_lowercase());

        for word in words {
            match word.as_str() {
                "left" => position.horizontal = HorizontalAlign::Left,
                "right" => position.horizontal = HorizontalAlign::Right,
                "top" => position.vertical = VerticalAlign::Top,
                "bottom" => position.vertical = VerticalAlign::Bottom,
                "center" | "centre" | "middle" => {}
                other => {
                    return Err(ReelcutError::InvalidParameters(format!(
                        "unknown text position '{}' (in '{}')",
                        other, s
                    )))
                }
            }
        }

        Ok(position)
    }
}

impl std::fmt::Display for TextPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let vertical = match self.vertical {
            VerticalAlign::Top => Some("top"),
            VerticalAlign::Center => None,
            VerticalAlign::Bottom => Some("bottom"),
        };
        let horizontal = match self.horizontal {
            HorizontalAlign::Left => Some("left"),
            HorizontalAlign::Center => None,
            HorizontalAlign::Right => Some("right"),
        };

        match (vertical, horizontal) {
            (Some(v), Some(h)) => write!(f, "{}-{}", v, h),
            (Some(v), None) => write!(f, "{}", v),
            (None, Some(h)) => write!(f, "{}", h),
            (None, None) => write!(f, "center"),
        }
    }
}

/// Font selection for drawtext.
pub(crate) enum FontSource<'a> {
    Family(&'a str),
    File(&'a Path),
}

/// Reject colors that could break out of the filter option.
pub(crate) fn validate_color(color: &str) -> Result<()> {
    let ok = !color.is_empty()
        && color
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '#' | '@' | '.' | '_'));
    if ok {
        Ok(())
    } else {
        Err(ReelcutError::InvalidParameters(format!(
            "invalid color '{}'",
            color
        )))
    }
}

/// Build the drawtext filter. The label is read from `text_file` with
/// expansion disabled, so the text itself needs no escaping.
pub(crate) fn drawtext_filter(
    text_file: &Path,
    font: FontSource<'_>,
    fontsize: u32,
    color: &str,
    position: TextPosition,
) -> String {
    let font_opt = match font {
        FontSource::Family(name) => format!("font={}", quote(name)),
        FontSource::File(path) => format!("fontfile={}", quote(&path.to_string_lossy())),
    };

    format!(
        "drawtext={}:textfile={}:expansion=none:fontsize={}:fontcolor={}:x={}:y={}",
        font_opt,
        quote(&text_file.to_string_lossy()),
        fontsize,
        color,
        position.x_expr(),
        position.y_expr()
    )
}

/// Quote a filter option value.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positions() {
        let center: TextPosition = "center".parse().unwrap();
        assert_eq!(center, TextPosition::default());

        let tl: TextPosition = "top-left".parse().unwrap();
        assert_eq!(tl.horizontal, HorizontalAlign::Left);
        assert_eq!(tl.vertical, VerticalAlign::Top);

        let pair: TextPosition = "('center', 'bottom')".parse().unwrap();
        assert_eq!(pair.horizontal, HorizontalAlign::Center);
        assert_eq!(pair.vertical, VerticalAlign::Bottom);

        let br: TextPosition = "BOTTOM_RIGHT".parse().unwrap();
        assert_eq!(br.to_string(), "bottom-right");

        assert!("sideways".parse::<TextPosition>().is_err());
    }

    #[test]
    fn test_display_roundtrips_through_parse() {
        for s in ["center", "top", "bottom-left", "right"] {
            let pos: TextPosition = s.parse().unwrap();
            assert_eq!(pos.to_string(), s);
        }
    }

    #[test]
    fn test_validate_color() {
        assert!(validate_color("white").is_ok());
        assert!(validate_color("#FF0000").is_ok());
        assert!(validate_color("red@0.5").is_ok());
        assert!(validate_color("").is_err());
        assert!(validate_color("red:x=0").is_err());
    }

    #[test]
    fn test_drawtext_filter() {
        let filter = drawtext_filter(
            Path::new("/tmp/label.txt"),
            FontSource::Family("Arial"),
            32,
            "yellow",
            "bottom".parse().unwrap(),
        );
        assert_eq!(
            filter,
            "drawtext=font='Arial':textfile='/tmp/label.txt':expansion=none:fontsize=32:\
             fontcolor=yellow:x=(w-text_w)/2:y=h-text_h-20"
        );
    }

    #[test]
    fn test_quote_escapes_single_quote() {
        assert_eq!(quote("it's"), r"'it'\''s'");
    }
}
