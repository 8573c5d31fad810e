//! Width-based line breaking
//!
//! Every backend draws the lines produced here, so a badge wraps the same
//! way in the PDF and in the raster output.

use crate::FontMetrics;

/// Wrap text into lines no wider than `max_width` points
///
/// Breaks greedily on whitespace. A single word wider than the line is split
/// between characters (at least one character per line). Explicit `\n`
/// always starts a new line. Without a positive `max_width` only the
/// explicit breaks apply.
///
/// # Arguments
/// * `text` - Text to wrap
/// * `font_size` - Font size in points
/// * `max_width` - Maximum line width in points
/// * `metrics` - Metrics of the face the text will be drawn with
pub fn wrap_to_width<M>(text: &str, font_size: f64, max_width: Option<f64>, metrics: &M) -> Vec<String>
where
    M: FontMetrics + ?Sized,
{
    if text.is_empty() {
        return Vec::new();
    }

    let max_width = match max_width {
        Some(w) if w > 0.0 => w,
        _ => return text.split('\n').map(|l| l.trim_end().to_string()).collect(),
    };

    let fits = |candidate: &str| metrics.text_width(candidate, font_size) <= max_width;
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();

        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                if fits(word) {
                    current.push_str(word);
                    continue;
                }
            } else {
                let candidate = format!("{current} {word}");
                if fits(&candidate) {
                    current = candidate;
                    continue;
                }
                lines.push(std::mem::take(&mut current));
                if fits(word) {
                    current.push_str(word);
                    continue;
                }
            }

            // Word on its own is too wide: split between characters
            for c in word.chars() {
                current.push(c);
                if !fits(&current) && current.chars().count() > 1 {
                    current.pop();
                    lines.push(std::mem::take(&mut current));
                    current.push(c);
                }
            }
        }

        lines.push(current);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StandardFont;
    use pretty_assertions::assert_eq;

    /// Every character is exactly one em wide
    struct Monospace;

    impl FontMetrics for Monospace {
        fn advance(&self, _c: char) -> f64 {
            1.0
        }
        fn cap_height(&self) -> f64 {
            0.7
        }
        fn ascent(&self) -> f64 {
            0.8
        }
        fn descent(&self) -> f64 {
            -0.2
        }
    }

    #[test]
    fn test_wrap_greedy() {
        // 1pt font: width == character count
        let lines = wrap_to_width("Hello world this is a test", 1.0, Some(12.0), &Monospace);
        assert_eq!(lines, vec!["Hello world", "this is a", "test"]);
    }

    #[test]
    fn test_wrap_exact_fit() {
        let lines = wrap_to_width("Hello world", 1.0, Some(11.0), &Monospace);
        assert_eq!(lines, vec!["Hello world"]);
    }

    #[test]
    fn test_wrap_just_over() {
        let lines = wrap_to_width("Hello world", 1.0, Some(10.0), &Monospace);
        assert_eq!(lines, vec!["Hello", "world"]);
    }

    #[test]
    fn test_wrap_splits_long_word() {
        let lines = wrap_to_width("Supercalifragilistic", 1.0, Some(8.0), &Monospace);
        assert_eq!(lines, vec!["Supercal", "ifragili", "stic"]);
    }

    #[test]
    fn test_wrap_long_word_after_short() {
        let lines = wrap_to_width("Dr Abcdefghij", 1.0, Some(5.0), &Monospace);
        assert_eq!(lines, vec!["Dr", "Abcde", "fghij"]);
    }

    #[test]
    fn test_wrap_narrower_than_one_char() {
        // Each line keeps at least one character
        let lines = wrap_to_width("abc", 1.0, Some(0.5), &Monospace);
        assert_eq!(lines, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_explicit_newlines() {
        let lines = wrap_to_width("Line one\nLine two", 1.0, None, &Monospace);
        assert_eq!(lines, vec!["Line one", "Line two"]);

        let lines = wrap_to_width("a b\n\nc", 1.0, Some(10.0), &Monospace);
        assert_eq!(lines, vec!["a b", "", "c"]);
    }

    #[test]
    fn test_no_max_width_keeps_single_line() {
        let text = "A very long attendee name that would never fit";
        let lines = wrap_to_width(text, 24.0, None, &StandardFont::Helvetica);
        assert_eq!(lines, vec![text]);
    }

    #[test]
    fn test_empty_text() {
        assert!(wrap_to_width("", 12.0, Some(100.0), &Monospace).is_empty());
    }

    #[test]
    fn test_wrap_with_helvetica() {
        // "Jane" = 26.016pt, "Appleseed" = 56.7pt at 12pt
        let lines = wrap_to_width("Jane Appleseed", 12.0, Some(60.0), &StandardFont::Helvetica);
        assert_eq!(lines, vec!["Jane", "Appleseed"]);
    }
}
