//! Emotion label extraction and presentation colors
//!
//! Responses may end with an `[emotion: <word>]` label. The label vocabulary
//! is an open, case-insensitive word; unknown or missing labels present as
//! neutral. The label is stripped before the text reaches synthesis.
//!
//! The label-to-color table is configuration data, not code: colors are byte
//! triples in the strip's configured byte order, and operators can replace
//! the whole table from JSON.

use crate::mouth::Rgb;
use crate::{HeadError, Result};
use std::collections::HashMap;

const LABEL_OPEN: &str = "[emotion:";

/// Split a response into its spoken text and lowercase emotion label.
///
/// A malformed label (no closing bracket) is left in place and presents as
/// neutral; an empty label (`[emotion: ]`) is stripped and presents as
/// neutral.
pub fn extract_emotion(reply: &str) -> (String, String) {
    let Some(open) = find_label_open(reply) else {
        return (reply.trim().to_string(), "neutral".to_string());
    };

    let after_marker = &reply[open + LABEL_OPEN.len()..];
    let Some(close) = after_marker.find(']') else {
        return (reply.trim().to_string(), "neutral".to_string());
    };

    let label = after_marker[..close]
        .trim()
        .split_whitespace()
        .next()
        .unwrap_or("neutral")
        .to_lowercase();
    let label = if label.is_empty() { "neutral".to_string() } else { label };

    let mut spoken = String::with_capacity(reply.len());
    spoken.push_str(&reply[..open]);
    spoken.push_str(&after_marker[close + 1..]);

    (spoken.trim().to_string(), label)
}

/// Case-insensitive search for the label marker (ASCII, so byte offsets are
/// safe to slice with).
fn find_label_open(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let marker = LABEL_OPEN.as_bytes();
    bytes
        .windows(marker.len())
        .position(|w| w.eq_ignore_ascii_case(marker))
}

/// Emotion-to-color table.
#[derive(Debug, Clone)]
pub struct EmotionPalette {
    colors: HashMap<String, Rgb>,
    neutral: Rgb,
}

impl Default for EmotionPalette {
    fn default() -> Self {
        // Shipped table, kept verbatim; the tuples are in strip byte order.
        let colors = HashMap::from([
            ("happy".to_string(), Rgb(0, 255, 255)),
            ("sad".to_string(), Rgb(255, 0, 0)),
            ("angry".to_string(), Rgb(0, 255, 0)),
            ("surprised".to_string(), Rgb(255, 255, 0)),
            ("neutral".to_string(), Rgb(0, 255, 0)),
        ]);
        Self { neutral: Rgb(0, 255, 0), colors }
    }
}

impl EmotionPalette {
    /// Load a replacement table from JSON, e.g.
    /// `{"happy": [0, 255, 255], "neutral": [0, 255, 0]}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: HashMap<String, Rgb> = serde_json::from_str(json)
            .map_err(|e| HeadError::Config(format!("Invalid palette JSON: {e}")))?;
        let colors: HashMap<String, Rgb> = raw
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();
        let neutral = colors
            .get("neutral")
            .copied()
            .unwrap_or_else(|| EmotionPalette::default().neutral);
        Ok(Self { colors, neutral })
    }

    /// Resolve a label to its presentation color; unknown labels are neutral.
    pub fn color(&self, label: &str) -> Rgb {
        self.colors
            .get(&label.to_lowercase())
            .copied()
            .unwrap_or(self.neutral)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_case_label_resolves_and_strips() {
        let (spoken, label) = extract_emotion("The sky is blue. [emotion: Happy]");
        assert_eq!(spoken, "The sky is blue.");
        assert_eq!(label, "happy");

        let palette = EmotionPalette::default();
        assert_eq!(palette.color(&label), Rgb(0, 255, 255));
    }

    #[test]
    fn test_uppercase_marker_is_found() {
        let (spoken, label) = extract_emotion("Fine. [EMOTION: SAD]");
        assert_eq!(spoken, "Fine.");
        assert_eq!(label, "sad");
    }

    #[test]
    fn test_missing_label_is_neutral() {
        let (spoken, label) = extract_emotion("Just an answer.");
        assert_eq!(spoken, "Just an answer.");
        assert_eq!(label, "neutral");
    }

    #[test]
    fn test_unknown_label_maps_to_neutral_color() {
        let (_, label) = extract_emotion("Hm. [emotion: bewildered]");
        assert_eq!(label, "bewildered");
        assert_eq!(EmotionPalette::default().color(&label), Rgb(0, 255, 0));
    }

    #[test]
    fn test_empty_label_is_neutral_and_stripped() {
        let (spoken, label) = extract_emotion("Okay. [emotion: ]");
        assert_eq!(spoken, "Okay.");
        assert_eq!(label, "neutral");
    }

    #[test]
    fn test_unclosed_label_left_in_place() {
        let (spoken, label) = extract_emotion("Okay. [emotion: happy");
        assert_eq!(spoken, "Okay. [emotion: happy");
        assert_eq!(label, "neutral");
    }

    #[test]
    fn test_palette_from_json_overrides_table() {
        let palette =
            EmotionPalette::from_json(r#"{"happy": [1, 2, 3], "neutral": [9, 9, 9]}"#).unwrap();
        assert_eq!(palette.color("HAPPY"), Rgb(1, 2, 3));
        assert_eq!(palette.color("unknown"), Rgb(9, 9, 9));
    }

    #[test]
    fn test_palette_bad_json_is_config_error() {
        assert!(EmotionPalette::from_json("not json").is_err());
    }
}
