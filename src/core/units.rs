//! Physical-unit conversions between millimetres, points and pixels.

/// 1 mm = 2.834645669 PostScript points.
pub const PT_PER_MM: f64 = 2.834645669;

const MM_PER_INCH: f64 = 25.4;
const PT_PER_INCH: f64 = 72.0;

/// Millimetres to device pixels at the given DPI, rounded half-up.
pub fn mm_to_px(mm: f64, dpi: u32) -> u32 {
    (mm * dpi as f64 / MM_PER_INCH).round() as u32
}

/// Points to device pixels at the given DPI, rounded half-up.
pub fn pt_to_px(pt: f64, dpi: u32) -> u32 {
    (pt * dpi as f64 / PT_PER_INCH).round() as u32
}

/// Millimetres to PDF points. PDF space is physical, no DPI involved.
pub fn mm_to_pt(mm: f64) -> f64 {
    mm * PT_PER_MM
}
