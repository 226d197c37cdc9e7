use poem_openapi::{
    ApiResponse, Object,
    payload::{Attachment, Json},
};
use serde::Deserialize;

use crate::core::card::{Alignment, CardStyle, PLACEHOLDER_TEXT};
use crate::core::color;

use super::common::ErrorBody;

pub const DEFAULT_FONT_FAMILY: &str = "Noto Nastaliq Urdu";

const MIN_DIMENSION_MM: f64 = 10.0;
const MAX_DIMENSION_MM: f64 = 500.0;

/// Card style parameters as submitted by the client. Every field is
/// optional; out-of-range and malformed values are normalized, never
/// rejected.
#[derive(Object, Deserialize, Clone, Debug)]
#[oai(rename_all = "camelCase")]
pub struct CardRequest {
    /// Card text; newlines separate lines.
    pub text: Option<String>,

    /// Card width in millimetres.
    pub width: Option<f64>,

    /// Card height in millimetres.
    pub height: Option<f64>,

    /// Font size in points.
    pub font_size: Option<f64>,

    /// Text color as `#RRGGBB`.
    pub font_color: Option<String>,

    /// Background color as `#RRGGBB`.
    pub background_color: Option<String>,

    /// left, center or right.
    pub alignment: Option<String>,

    /// Extra spacing between lines in points.
    pub line_spacing: Option<f64>,

    /// Requested font family name.
    pub font_family: Option<String>,
}

impl CardRequest {
    /// Clamp ranges and revert malformed colors to the defaults.
    pub fn normalized(&self) -> CardStyle {
        let font_color = self
            .font_color
            .clone()
            .filter(|c| color::is_valid_hex(c))
            .unwrap_or_else(|| color::DEFAULT_FONT_COLOR.to_string());
        let background_color = self
            .background_color
            .clone()
            .filter(|c| color::is_valid_hex(c))
            .unwrap_or_else(|| color::DEFAULT_BACKGROUND_COLOR.to_string());
        CardStyle {
            text: self
                .text
                .clone()
                .unwrap_or_else(|| PLACEHOLDER_TEXT.to_string()),
            width_mm: self
                .width
                .unwrap_or(100.0)
                .clamp(MIN_DIMENSION_MM, MAX_DIMENSION_MM),
            height_mm: self
                .height
                .unwrap_or(70.0)
                .clamp(MIN_DIMENSION_MM, MAX_DIMENSION_MM),
            font_size_pt: self.font_size.unwrap_or(16.0).clamp(8.0, 72.0),
            font_color,
            background_color,
            // The UI defaults to right alignment for Urdu; an explicit
            // but unrecognized value falls back to left.
            alignment: match &self.alignment {
                Some(value) => Alignment::parse(value),
                None => Alignment::Right,
            },
            line_spacing_pt: self.line_spacing.unwrap_or(5.0).clamp(0.0, 50.0),
            font_family: self
                .font_family
                .clone()
                .unwrap_or_else(|| DEFAULT_FONT_FAMILY.to_string()),
        }
    }
}

/// Canvas passthrough request: a client-rendered bitmap to embed in a
/// PDF page of the given physical size.
#[derive(Object, Deserialize, Clone, Debug)]
pub struct CanvasPdfRequest {
    /// Base64 image, bare or as a `data:image/png;base64,...` /
    /// `data:image/jpeg;base64,...` URL.
    pub canvas_data: Option<String>,

    /// Page width in millimetres.
    pub width: Option<f64>,

    /// Page height in millimetres.
    pub height: Option<f64>,

    /// Raster resolution hint.
    pub dpi: Option<u32>,
}

impl CanvasPdfRequest {
    /// Uniform clamping, same ranges as the card endpoints.
    pub fn clamped(&self) -> (f64, f64, u32) {
        (
            self.width
                .unwrap_or(100.0)
                .clamp(MIN_DIMENSION_MM, MAX_DIMENSION_MM),
            self.height
                .unwrap_or(70.0)
                .clamp(MIN_DIMENSION_MM, MAX_DIMENSION_MM),
            self.dpi.unwrap_or(1200).clamp(72, 1200),
        )
    }
}

#[derive(Object, Debug)]
pub struct PreviewPayload {
    pub success: bool,

    /// `data:image/png;base64,...`
    pub image: String,

    pub message: String,
}

#[derive(ApiResponse)]
pub enum PreviewResponse {
    #[oai(status = 200)]
    Ok(Json<PreviewPayload>),

    #[oai(status = 400)]
    BadRequest(Json<ErrorBody>),
}

#[derive(ApiResponse)]
pub enum JpgExportResponse {
    #[oai(status = 200, content_type = "image/jpeg")]
    Jpeg(Attachment<Vec<u8>>),

    #[oai(status = 500)]
    InternalServerError(Json<ErrorBody>),
}

#[derive(ApiResponse)]
pub enum PdfExportResponse {
    #[oai(status = 200, content_type = "application/pdf")]
    Pdf(Attachment<Vec<u8>>),

    #[oai(status = 500)]
    InternalServerError(Json<ErrorBody>),
}

#[derive(ApiResponse)]
pub enum CanvasPdfResponse {
    #[oai(status = 200, content_type = "application/pdf")]
    Pdf(Attachment<Vec<u8>>),

    #[oai(status = 400)]
    BadRequest(Json<ErrorBody>),
}
