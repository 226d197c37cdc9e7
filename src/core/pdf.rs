//! PDF emission: vector text layout for card exports and single-image
//! embedding for client-rendered canvases.

use std::fs;
use std::io::Cursor;

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use anyhow::{anyhow, Context, Result};
use image::{DynamicImage, ImageFormat, RgbImage};
use printpdf::font::ParsedFont;
use printpdf::graphics::{LinePoint, PaintMode, Point, Polygon, PolygonRing, WindingOrder};
use printpdf::matrix::TextMatrix;
use printpdf::ops::Op;
use printpdf::text::TextItem;
use printpdf::xobject::{XObject, XObjectTransform};
use printpdf::{
    BuiltinFont, FontId, Mm, PdfDocument, PdfPage, PdfSaveOptions, Pt, Rgb as PdfRgb, XObjectId,
};

use super::card::{self, Alignment, CardStyle};
use super::color;
use super::fonts::FontCatalog;
use super::units;
use super::RenderOutcome;

/// Padding kept around the text block, in points.
pub const PAGE_PADDING_PT: f64 = 20.0;

/// Width approximation per character when no metrics are available,
/// as a fraction of the font size.
const APPROX_CHAR_WIDTH: f64 = 0.6;

/// The face active on the page. Width measurement must follow whichever
/// one is in use.
enum PdfFace {
    Custom { id: FontId, metrics: FontArc },
    Builtin,
}

fn pdf_color(rgb: image::Rgb<u8>) -> printpdf::color::Color {
    printpdf::color::Color::Rgb(PdfRgb::new(
        rgb[0] as f32 / 255.0,
        rgb[1] as f32 / 255.0,
        rgb[2] as f32 / 255.0,
        None,
    ))
}

/// Try to register the requested family from the font directory; on any
/// miss fall back to the built-in Helvetica face.
fn register_face(
    doc: &mut PdfDocument,
    catalog: &FontCatalog,
    family: &str,
) -> (PdfFace, Option<String>) {
    for path in catalog.local_candidates(family) {
        let Ok(data) = fs::read(&path) else { continue };
        let mut warnings = Vec::new();
        let Some(parsed) = ParsedFont::from_bytes(&data, 0, &mut warnings) else {
            tracing::debug!(path = %path.display(), "font not usable for PDF embedding");
            continue;
        };
        let Ok(metrics) = FontArc::try_from_vec(data) else { continue };
        let id = doc.add_font(&parsed);
        return (PdfFace::Custom { id, metrics }, None);
    }
    (
        PdfFace::Builtin,
        Some(format!(
            "font family '{family}' not registered, built-in Helvetica used"
        )),
    )
}

fn line_width_pt(face: &PdfFace, size: f64, line: &str) -> f64 {
    match face {
        PdfFace::Custom { metrics, .. } => {
            let scaled = metrics.as_scaled(PxScale::from(size as f32));
            line.chars()
                .map(|c| scaled.h_advance(metrics.glyph_id(c)) as f64)
                .sum()
        }
        PdfFace::Builtin => APPROX_CHAR_WIDTH * size * line.chars().count() as f64,
    }
}

fn aligned_x_pt(alignment: Alignment, page_w: f64, line_w: f64) -> f64 {
    let pad = PAGE_PADDING_PT;
    let x = match alignment {
        Alignment::Left => pad,
        Alignment::Center => ((page_w - line_w) / 2.0).max(pad),
        Alignment::Right => (page_w - line_w - pad).max(pad),
    };
    x.min(page_w - pad).max(pad)
}

fn full_page_rect(page_w: f64, page_h: f64) -> Polygon {
    let (w, h) = (page_w as f32, page_h as f32);
    Polygon {
        rings: vec![PolygonRing {
            points: vec![
                LinePoint { p: Point { x: Pt(0.0), y: Pt(0.0) }, bezier: false },
                LinePoint { p: Point { x: Pt(w), y: Pt(0.0) }, bezier: false },
                LinePoint { p: Point { x: Pt(w), y: Pt(h) }, bezier: false },
                LinePoint { p: Point { x: Pt(0.0), y: Pt(h) }, bezier: false },
            ],
        }],
        mode: PaintMode::Fill,
        winding_order: WindingOrder::EvenOdd,
    }
}

fn save(mut doc: PdfDocument) -> Vec<u8> {
    let mut bytes = Vec::new();
    let mut warnings = Vec::new();
    doc.save_writer(&mut bytes, &PdfSaveOptions::default(), &mut warnings);
    bytes
}

/// Lay out the card text on a single vector page sized in physical
/// points. Always yields a document; degradations are reported.
pub fn render_pdf(catalog: &FontCatalog, style: &CardStyle) -> RenderOutcome<Vec<u8>> {
    let page_w = units::mm_to_pt(style.width_mm);
    let page_h = units::mm_to_pt(style.height_mm);

    let mut doc = PdfDocument::new("Urdu Card");
    let mut ops: Vec<Op> = Vec::new();
    let mut reasons: Vec<String> = Vec::new();

    if !color::is_white(&style.background_color) {
        if let Some(bg) = color::hex_to_rgb(&style.background_color) {
            ops.push(Op::SetFillColor { col: pdf_color(bg) });
            ops.push(Op::DrawPolygon {
                polygon: full_page_rect(page_w, page_h),
            });
        }
    }

    let (face, face_reason) = register_face(&mut doc, catalog, &style.font_family);
    if let Some(reason) = face_reason {
        reasons.push(reason);
    }

    let fg = color::hex_to_rgb_or(&style.font_color, image::Rgb([0, 0, 0]));
    let size = style.font_size_pt;

    let mut lines = card::content_lines(&style.text, true);
    if lines.is_empty() {
        lines = card::content_lines(card::PLACEHOLDER_TEXT, true);
    }

    let line_h = size + style.line_spacing_pt;
    let total_h = lines.len() as f64 * line_h;
    let start_y = page_h - (page_h - total_h) / 2.0;

    ops.push(Op::StartTextSection);
    ops.push(Op::SetFillColor { col: pdf_color(fg) });
    match &face {
        PdfFace::Custom { id, .. } => ops.push(Op::SetFontSize {
            size: Pt(size as f32),
            font: id.clone(),
        }),
        PdfFace::Builtin => ops.push(Op::SetFontSizeBuiltinFont {
            size: Pt(size as f32),
            font: BuiltinFont::Helvetica,
        }),
    }

    for (i, line) in lines.iter().enumerate() {
        let line_w = line_width_pt(&face, size, line);
        let x = aligned_x_pt(style.alignment, page_w, line_w);
        let y = (start_y - i as f64 * line_h)
            .min(page_h - PAGE_PADDING_PT)
            .max(line_h);

        ops.push(Op::SetTextMatrix {
            matrix: TextMatrix::Translate(Pt(x as f32), Pt(y as f32)),
        });
        match &face {
            PdfFace::Custom { id, .. } => ops.push(Op::WriteText {
                items: vec![TextItem::Text(line.clone())],
                font: id.clone(),
            }),
            PdfFace::Builtin => ops.push(Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(line.clone())],
                font: BuiltinFont::Helvetica,
            }),
        }
    }
    ops.push(Op::EndTextSection);

    doc.pages.push(PdfPage::new(
        Mm(style.width_mm as f32),
        Mm(style.height_mm as f32),
        ops,
    ));

    let bytes = save(doc);
    if reasons.is_empty() {
        RenderOutcome::Full(bytes)
    } else {
        RenderOutcome::degraded(bytes, reasons.join("; "))
    }
}

/// Minimal one-line document stating an error; the whole-routine last
/// resort for the PDF path.
pub fn error_pdf(message: &str) -> Vec<u8> {
    let mut doc = PdfDocument::new("Render Error");
    let ops = vec![
        Op::StartTextSection,
        Op::SetFillColor {
            col: pdf_color(image::Rgb([0, 0, 0])),
        },
        Op::SetFontSizeBuiltinFont {
            size: Pt(12.0),
            font: BuiltinFont::Helvetica,
        },
        Op::SetTextMatrix {
            matrix: TextMatrix::Translate(Pt(20.0), Pt(50.0)),
        },
        Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(format!("Error: {message}"))],
            font: BuiltinFont::Helvetica,
        },
        Op::EndTextSection,
    ];
    let (w, h): (Mm, Mm) = (Pt(200.0).into(), Pt(100.0).into());
    doc.pages.push(PdfPage::new(w, h, ops));
    save(doc)
}

/// Embed a pre-rendered raster (PNG or JPEG bytes) scaled to fill one
/// page of the requested physical size. Transparency is flattened onto
/// white first.
pub fn embed_raster(image_bytes: &[u8], width_mm: f64, height_mm: f64) -> Result<Vec<u8>> {
    let decoded = image::load_from_memory(image_bytes).context("invalid image data")?;
    let flattened = flatten_to_white(decoded);

    let mut png = Vec::new();
    DynamicImage::ImageRgb8(flattened)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .context("failed to re-encode canvas image")?;

    let mut warnings = Vec::new();
    let raw = printpdf::image::RawImage::decode_from_bytes(&png, &mut warnings)
        .map_err(|e| anyhow!("failed to decode canvas image for embedding: {e}"))?;
    let (img_w, img_h) = (raw.width as f32, raw.height as f32);

    let mut doc = PdfDocument::new("Urdu Card Canvas");
    let xobj_id = XObjectId::new();
    doc.resources
        .xobjects
        .map
        .insert(xobj_id.clone(), XObject::Image(raw));

    let page_w = units::mm_to_pt(width_mm) as f32;
    let page_h = units::mm_to_pt(height_mm) as f32;
    // At 72 DPI one pixel is one point, so scale maps the raster onto
    // the full page.
    let transform = XObjectTransform {
        translate_x: Some(Pt(0.0)),
        translate_y: Some(Pt(0.0)),
        scale_x: Some(page_w / img_w),
        scale_y: Some(page_h / img_h),
        rotate: None,
        dpi: Some(72.0),
    };
    let ops = vec![Op::UseXobject {
        id: xobj_id,
        transform,
    }];
    doc.pages.push(PdfPage::new(
        Mm(width_mm as f32),
        Mm(height_mm as f32),
        ops,
    ));
    Ok(save(doc))
}

fn flatten_to_white(img: DynamicImage) -> RgbImage {
    let rgba = img.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (dst, src) in out.pixels_mut().zip(rgba.pixels()) {
        let alpha = src[3] as f32 / 255.0;
        for c in 0..3 {
            dst[c] = (src[c] as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn style() -> CardStyle {
        CardStyle {
            text: "Sample".to_string(),
            width_mm: 90.0,
            height_mm: 54.0,
            font_size_pt: 16.0,
            font_color: "#000000".to_string(),
            background_color: "#FFEEDD".to_string(),
            alignment: Alignment::Center,
            line_spacing_pt: 5.0,
            font_family: "Noto Nastaliq Urdu".to_string(),
        }
    }

    #[test]
    fn pdf_bytes_carry_the_magic_header() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = FontCatalog::new(dir.path());
        let outcome = render_pdf(&catalog, &style());
        assert!(outcome.value().starts_with(b"%PDF"));
        // No font files installed, so the built-in face was used.
        assert!(outcome.is_degraded());
    }

    #[test]
    fn error_pdf_is_still_a_document() {
        let bytes = error_pdf("something broke");
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn alignment_positions_are_ordered_in_points() {
        let left = aligned_x_pt(Alignment::Left, 500.0, 80.0);
        let center = aligned_x_pt(Alignment::Center, 500.0, 80.0);
        let right = aligned_x_pt(Alignment::Right, 500.0, 80.0);
        assert!(left < center && center < right);
        assert_eq!(left, PAGE_PADDING_PT);
    }

    #[test]
    fn builtin_width_uses_the_approximation() {
        let w = line_width_pt(&PdfFace::Builtin, 10.0, "abcd");
        assert!((w - 24.0).abs() < 1e-9);
    }

    #[test]
    fn canvas_raster_embeds_into_a_page() {
        let mut png = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, image::Rgb([10, 20, 30])))
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();
        let bytes = embed_raster(&png, 100.0, 70.0).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn invalid_canvas_bytes_are_a_transport_error() {
        assert!(embed_raster(b"not an image", 100.0, 70.0).is_err());
    }

    #[test]
    fn transparency_flattens_onto_white() {
        let mut rgba = image::RgbaImage::new(1, 1);
        rgba.put_pixel(0, 0, image::Rgba([0, 0, 0, 0]));
        let flat = flatten_to_white(DynamicImage::ImageRgba8(rgba));
        assert_eq!(flat.get_pixel(0, 0), &image::Rgb([255, 255, 255]));
    }
}
