//! Deterministic output file naming.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use super::text::TextPosition;

/// Operation tag appended to the source file stem.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationTag {
    Trim { start: i64, end: i64 },
    Speed { factor: f64 },
    TextOverlay {
        text: String,
        fontsize: u32,
        color: String,
        position: TextPosition,
    },
    Crop { x1: i64, y1: i64, x2: i64, y2: i64 },
}

impl std::fmt::Display for OperationTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationTag::Trim { start, end } => write!(f, "trimmed_{}_{}", start, end),
            OperationTag::Speed { factor } => write!(f, "speed_{}x", format_factor(*factor)),
            OperationTag::TextOverlay {
                text,
                fontsize,
                color,
                position,
            } => {
                let mut hasher = Sha256::new();
                hasher.update(text.as_bytes());
                hasher.update([0]);
                hasher.update(fontsize.to_string().as_bytes());
                hasher.update([0]);
                hasher.update(color.as_bytes());
                hasher.update([0]);
                hasher.update(position.to_string().as_bytes());
                let digest = hex::encode(hasher.finalize());
                write!(f, "text_{}_{}", slugify(text, 24), &digest[..8])
            }
            OperationTag::Crop { x1, y1, x2, y2 } => {
                write!(f, "cropped_{}_{}_{}_{}", x1, y1, x2, y2)
            }
        }
    }
}

/// Build `<outputs_dir>/{stem}_{tag}{.ext}` for an input file.
pub fn output_path(outputs_dir: &Path, input: &Path, tag: &OperationTag) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("video");

    let file_name = match input.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}_{}.{}", stem, tag, ext),
        None => format!("{}_{}", stem, tag),
    };

    outputs_dir.join(file_name)
}

/// Render a speed factor the way people write it: `2.0`, `0.5`, `1.25`.
pub fn format_factor(factor: f64) -> String {
    if factor.is_finite() && factor.fract() == 0.0 {
        format!("{:.1}", factor)
    } else {
        format!("{}", factor)
    }
}

/// Lowercase ASCII slug, runs of other characters collapsed to `-`.
fn slugify(text: &str, max_len: usize) -> String {
    let mut slug = String::new();
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
        if slug.len() >= max_len {
            break;
        }
    }

    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "overlay".to_string()
    } else {
        slug.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlay(text: &str, color: &str) -> OperationTag {
        OperationTag::TextOverlay {
            text: text.to_string(),
            fontsize: 24,
            color: color.to_string(),
            position: TextPosition::default(),
        }
    }

    #[test]
    fn test_trim_and_crop_names() {
        let out = Path::new("outputs");
        assert_eq!(
            output_path(out, Path::new("uploads/clip.mp4"), &OperationTag::Trim { start: 2, end: 5 }),
            PathBuf::from("outputs/clip_trimmed_2_5.mp4")
        );
        assert_eq!(
            output_path(
                out,
                Path::new("uploads/clip.mov"),
                &OperationTag::Crop { x1: 0, y1: 0, x2: 100, y2: 100 }
            ),
            PathBuf::from("outputs/clip_cropped_0_0_100_100.mov")
        );
    }

    #[test]
    fn test_speed_name_uses_decimal_factor() {
        let out = Path::new("outputs");
        let path = output_path(out, Path::new("clip.mp4"), &OperationTag::Speed { factor: 2.0 });
        assert_eq!(path, PathBuf::from("outputs/clip_speed_2.0x.mp4"));

        assert_eq!(format_factor(0.5), "0.5");
        assert_eq!(format_factor(1.25), "1.25");
        assert_eq!(format_factor(3.0), "3.0");
    }

    #[test]
    fn test_chained_edits_keep_extension() {
        let out = Path::new("outputs");
        let first = output_path(out, Path::new("uploads/clip.mp4"), &OperationTag::Trim { start: 0, end: 4 });
        let second = output_path(out, &first, &OperationTag::Speed { factor: 2.0 });
        assert_eq!(second, PathBuf::from("outputs/clip_trimmed_0_4_speed_2.0x.mp4"));
    }

    #[test]
    fn test_overlay_names_are_deterministic_and_distinct() {
        let out = Path::new("outputs");
        let input = Path::new("clip.mp4");

        let a = output_path(out, input, &overlay("Hello, World!", "white"));
        let b = output_path(out, input, &overlay("Hello, World!", "white"));
        let c = output_path(out, input, &overlay("Hello, World!", "red"));
        let d = output_path(out, input, &overlay("hello world", "white"));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert!(a.to_string_lossy().starts_with("outputs/clip_text_hello-world_"));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello, World!", 24), "hello-world");
        assert_eq!(slugify("   ", 24), "overlay");
        assert_eq!(slugify("日本語", 24), "overlay");
        assert!(slugify(&"a".repeat(100), 24).len() <= 24);
    }
}
