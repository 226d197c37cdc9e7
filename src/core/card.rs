//! Bitmap text layout: renders a styled, multi-line card onto an RGB
//! buffer at a given DPI.

use ab_glyph::PxScale;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};

use super::color;
use super::fonts::{FontCatalog, FontHandle};
use super::glyphs;
use super::units;
use super::RenderOutcome;

/// Horizontal/vertical padding kept around the text block, in pixels.
pub const PADDING: u32 = 20;
/// Floor on output dimensions so degenerate mm sizes still render.
pub const MIN_WIDTH_PX: u32 = 200;
pub const MIN_HEIGHT_PX: u32 = 100;
pub const MIN_FONT_PX: u32 = 12;

/// Substituted when the request carries no renderable text.
pub const PLACEHOLDER_TEXT: &str = "نمونہ متن\nSample Text";

/// Width estimate per character for lines the resolved face cannot
/// measure, as a fraction of the font size.
const APPROX_CHAR_WIDTH: f64 = 0.6;

/// Effective pixel font size at the given DPI, floored so tiny point
/// sizes stay legible.
pub fn effective_font_px(font_size_pt: f64, dpi: u32) -> u32 {
    units::pt_to_px(font_size_pt, dpi).max(MIN_FONT_PX)
}

fn estimated_width(font_px: u32, line: &str) -> u32 {
    (APPROX_CHAR_WIDTH * font_px as f64 * line.chars().count() as f64) as u32
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
}

impl Alignment {
    /// Lenient parse; unrecognized values mean left, not an error.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "center" => Self::Center,
            "right" => Self::Right,
            _ => Self::Left,
        }
    }
}

/// Normalized style parameters for one card render. Produced by the
/// HTTP layer after clamping and defaulting; colors are guaranteed
/// well-formed there, but the routines below still guard.
#[derive(Clone, Debug)]
pub struct CardStyle {
    pub text: String,
    pub width_mm: f64,
    pub height_mm: f64,
    pub font_size_pt: f64,
    pub font_color: String,
    pub background_color: String,
    pub alignment: Alignment,
    pub line_spacing_pt: f64,
    pub font_family: String,
}

/// Split into drawable lines, dropping blank ones.
pub fn content_lines(text: &str, trim: bool) -> Vec<String> {
    text.split('\n')
        .filter(|line| !line.trim().is_empty())
        .map(|line| if trim { line.trim().to_string() } else { line.to_string() })
        .collect()
}

/// Horizontal position of a line for the given alignment, clamped into
/// the padded canvas bounds.
pub fn aligned_x(alignment: Alignment, canvas_w: u32, line_w: u32) -> u32 {
    let w = canvas_w as i64;
    let lw = line_w as i64;
    let pad = PADDING as i64;
    let x = match alignment {
        Alignment::Left => pad,
        Alignment::Center => ((w - lw) / 2).max(pad),
        Alignment::Right => (w - lw - pad).max(pad),
    };
    x.clamp(pad, (w - pad).max(pad)) as u32
}

struct LineMetrics {
    width: u32,
    height: u32,
    /// The resolved face produced nothing for this line; draw it with
    /// the bitmap fallback and estimate its extent instead.
    no_coverage: bool,
}

fn measure_line(font: &FontHandle, font_px: u32, line: &str) -> LineMetrics {
    match font {
        FontHandle::Outline(face) => {
            let scale = PxScale::from(font_px as f32);
            let (width, height) = text_size(scale, face, line);
            if width == 0 && !line.trim().is_empty() {
                LineMetrics {
                    width: estimated_width(font_px, line),
                    height: font_px,
                    no_coverage: true,
                }
            } else {
                LineMetrics {
                    width,
                    height: height.max(1),
                    no_coverage: false,
                }
            }
        }
        FontHandle::Bitmap => LineMetrics {
            width: glyphs::line_width(line),
            height: glyphs::line_height(),
            no_coverage: false,
        },
    }
}

/// Render a card bitmap. Always yields an image; anything that had to
/// be absorbed along the way is reported through the outcome.
pub fn render_card(catalog: &FontCatalog, style: &CardStyle, dpi: u32) -> RenderOutcome<RgbImage> {
    let img_w = units::mm_to_px(style.width_mm, dpi).max(MIN_WIDTH_PX);
    let img_h = units::mm_to_px(style.height_mm, dpi).max(MIN_HEIGHT_PX);
    let font_px = effective_font_px(style.font_size_pt, dpi);
    let spacing_px = units::pt_to_px(style.line_spacing_pt, dpi);

    let bg = color::hex_to_rgb_or(&style.background_color, Rgb([255, 255, 255]));
    let fg = color::hex_to_rgb_or(&style.font_color, Rgb([0, 0, 0]));

    let mut img = RgbImage::from_pixel(img_w, img_h, bg);

    let font = catalog.resolve(&style.font_family);
    let mut reasons: Vec<String> = Vec::new();
    if font.is_bitmap() {
        reasons.push(format!(
            "font family '{}' unresolved, built-in bitmap face used",
            style.font_family
        ));
    }

    let mut lines = content_lines(&style.text, false);
    if lines.is_empty() {
        lines = content_lines(PLACEHOLDER_TEXT, false);
    }

    let metrics: Vec<LineMetrics> = lines
        .iter()
        .map(|line| measure_line(&font, font_px, line))
        .collect();
    if metrics.iter().any(|m| m.no_coverage) {
        reasons.push("resolved face lacks coverage for some lines, bitmap face used".to_string());
    }

    let line_h = metrics.iter().map(|m| m.height).max().unwrap_or(font_px);
    let line_count = lines.len() as u32;
    let total_h = line_h * line_count + spacing_px * line_count.saturating_sub(1);
    let start_y = (((img_h as i64) - (total_h as i64)) / 2).max(PADDING as i64);

    for (i, line) in lines.iter().enumerate() {
        let m = &metrics[i];
        let x = aligned_x(style.alignment, img_w, m.width) as i32;
        let y_floor = 10i64;
        let y_ceil = (img_h as i64 - line_h as i64 - 10).max(y_floor);
        let y = (start_y + i as i64 * (line_h + spacing_px) as i64).clamp(y_floor, y_ceil) as i32;

        match &font {
            FontHandle::Outline(face) if !m.no_coverage => {
                draw_text_mut(&mut img, fg, x, y, PxScale::from(font_px as f32), face, line);
            }
            _ => glyphs::draw_line(&mut img, x, y, line, fg),
        }
    }

    if reasons.is_empty() {
        RenderOutcome::Full(img)
    } else {
        RenderOutcome::degraded(img, reasons.join("; "))
    }
}

/// Fixed-size bitmap carrying an error message in red; the whole-routine
/// last resort, kept renderable no matter what went wrong.
pub fn error_image(message: &str) -> RgbImage {
    let mut img = RgbImage::from_pixel(400, 300, Rgb([255, 255, 255]));
    let red = Rgb([255, 0, 0]);
    let text = format!("Error: {message}");
    // Naive wrap so long messages stay on the canvas.
    let per_line = 30usize;
    let chars: Vec<char> = text.chars().collect();
    for (row, chunk) in chars.chunks(per_line).enumerate().take(18) {
        let line: String = chunk.iter().collect();
        let y = 20 + row as i32 * (glyphs::line_height() as i32 + 2);
        glyphs::draw_line(&mut img, 20, y, &line, red);
    }
    img
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn style(text: &str) -> CardStyle {
        CardStyle {
            text: text.to_string(),
            width_mm: 100.0,
            height_mm: 70.0,
            font_size_pt: 16.0,
            font_color: "#000000".to_string(),
            background_color: "#FFFFFF".to_string(),
            alignment: Alignment::Center,
            line_spacing_pt: 5.0,
            font_family: "Noto Nastaliq Urdu".to_string(),
        }
    }

    fn catalog() -> (tempfile::TempDir, FontCatalog) {
        let dir = tempfile::tempdir().unwrap();
        let catalog = FontCatalog::new(dir.path());
        (dir, catalog)
    }

    #[test]
    fn output_dimensions_follow_mm_and_dpi() {
        let (_dir, catalog) = catalog();
        let img = render_card(&catalog, &style("salaam"), 300).into_value();
        assert_eq!((img.width(), img.height()), (1181, 827));
    }

    #[test]
    fn output_dimensions_are_floored() {
        let (_dir, catalog) = catalog();
        let mut s = style("x");
        s.width_mm = 10.0;
        s.height_mm = 10.0;
        let img = render_card(&catalog, &s, 150).into_value();
        assert_eq!((img.width(), img.height()), (MIN_WIDTH_PX, MIN_HEIGHT_PX));
    }

    #[test]
    fn font_pixel_size_is_floored_at_twelve() {
        // 8 pt at 72 DPI is 8 px and must come back floored.
        assert_eq!(effective_font_px(8.0, 72), MIN_FONT_PX);
        assert_eq!(effective_font_px(3.0, 150), MIN_FONT_PX);
        // Above the floor the DPI ratio applies unchanged.
        assert_eq!(effective_font_px(8.0, 300), 33);
        assert_eq!(effective_font_px(16.0, 300), 67);
    }

    #[test]
    fn unmeasurable_lines_use_the_width_estimate() {
        assert_eq!(estimated_width(20, "abcd"), 48);
        assert_eq!(estimated_width(12, "نون"), 21);
        assert_eq!(estimated_width(12, ""), 0);
    }

    #[test]
    fn alignment_positions_are_ordered() {
        let canvas = 1000;
        let line = 100;
        let left = aligned_x(Alignment::Left, canvas, line);
        let center = aligned_x(Alignment::Center, canvas, line);
        let right = aligned_x(Alignment::Right, canvas, line);
        assert!(left < center, "{left} < {center}");
        assert!(center < right, "{center} < {right}");
        assert_eq!(left, PADDING);
        assert_eq!(right, canvas - line - PADDING);
    }

    #[test]
    fn wide_lines_are_clamped_to_the_padding() {
        let canvas = 300;
        let line = 400;
        for alignment in [Alignment::Left, Alignment::Center, Alignment::Right] {
            assert_eq!(aligned_x(alignment, canvas, line), PADDING);
        }
    }

    #[test]
    fn empty_text_substitutes_the_placeholder() {
        let (_dir, catalog) = catalog();
        let blank = render_card(&catalog, &style("   \n  "), 150);
        let img = blank.value();
        // Placeholder text must have been inked over the background.
        let inked = img.pixels().filter(|p| p.0 == [0, 0, 0]).count();
        assert!(inked > 0, "placeholder should be drawn");
        assert_eq!(content_lines("  \n\n ", false), Vec::<String>::new());
        assert_eq!(content_lines(PLACEHOLDER_TEXT, true).len(), 2);
    }

    #[test]
    fn missing_fonts_degrade_but_still_render() {
        let (_dir, catalog) = catalog();
        let outcome = render_card(&catalog, &style("hello"), 150);
        assert!(outcome.is_degraded());
        assert!(outcome.reason().unwrap().contains("bitmap"));
    }

    #[test]
    fn background_color_fills_the_canvas() {
        let (_dir, catalog) = catalog();
        let mut s = style("x");
        s.background_color = "#102030".to_string();
        let img = render_card(&catalog, &s, 150).into_value();
        assert_eq!(img.get_pixel(0, 0), &Rgb([0x10, 0x20, 0x30]));
    }

    #[test]
    fn error_image_has_fixed_size_and_red_ink() {
        let img = error_image("boom");
        assert_eq!((img.width(), img.height()), (400, 300));
        let red = img.pixels().filter(|p| p.0 == [255, 0, 0]).count();
        assert!(red > 0);
    }
}
