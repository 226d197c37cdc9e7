//! Hex color parsing for the `#RRGGBB` strings the API accepts.

use image::Rgb;

pub const DEFAULT_FONT_COLOR: &str = "#000000";
pub const DEFAULT_BACKGROUND_COLOR: &str = "#FFFFFF";

/// Parse a `#RRGGBB` string into an RGB triple.
pub fn hex_to_rgb(hex: &str) -> Option<Rgb<u8>> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
    let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
    let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
    Some(Rgb([r, g, b]))
}

/// Whether the string is a well-formed `#RRGGBB` color.
pub fn is_valid_hex(hex: &str) -> bool {
    hex_to_rgb(hex).is_some()
}

/// Parse, substituting the fallback on a miss. The HTTP layer
/// normalizes colors first, so a miss here is a defect upstream.
pub fn hex_to_rgb_or(hex: &str, fallback: Rgb<u8>) -> Rgb<u8> {
    hex_to_rgb(hex).unwrap_or(fallback)
}

/// Case-insensitive check for pure white, used to skip painting PDF
/// backgrounds that would be invisible anyway.
pub fn is_white(hex: &str) -> bool {
    hex.eq_ignore_ascii_case(DEFAULT_BACKGROUND_COLOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn round_trips_valid_colors() {
        assert_eq!(hex_to_rgb("#000000"), Some(Rgb([0, 0, 0])));
        assert_eq!(hex_to_rgb("#FFFFFF"), Some(Rgb([255, 255, 255])));
        assert_eq!(hex_to_rgb("#1a2B3c"), Some(Rgb([0x1a, 0x2b, 0x3c])));
    }

    #[test]
    fn rejects_malformed_strings() {
        assert_eq!(hex_to_rgb("000000"), None);
        assert_eq!(hex_to_rgb("#fff"), None);
        assert_eq!(hex_to_rgb("#GGGGGG"), None);
        assert_eq!(hex_to_rgb("#1234567"), None);
        assert_eq!(hex_to_rgb(""), None);
    }

    #[test]
    fn fallback_applies_on_miss() {
        assert_eq!(hex_to_rgb_or("nope", Rgb([1, 2, 3])), Rgb([1, 2, 3]));
        assert_eq!(hex_to_rgb_or("#102030", Rgb([0, 0, 0])), Rgb([0x10, 0x20, 0x30]));
    }

    #[test]
    fn white_detection_ignores_case() {
        assert!(is_white("#ffffff"));
        assert!(is_white("#FFFFFF"));
        assert!(!is_white("#fffffe"));
    }
}
