use std::sync::Arc;

use poem::web::Data;
use poem_openapi::{
    OpenApi, Tags,
    payload::{Attachment, AttachmentType, Json},
};

use crate::{
    AppState,
    schemas::{
        common::ErrorBody,
        render::{
            CanvasPdfRequest, CanvasPdfResponse, CardRequest, JpgExportResponse,
            PdfExportResponse, PreviewPayload, PreviewResponse,
        },
    },
};

#[derive(Tags)]
enum ApiCardTags {
    Render,
    Fonts,
}

pub struct ApiCard;

#[OpenApi()]
impl ApiCard {
    /// Preview
    ///
    /// Render the card as a PNG at screen resolution (150 DPI) and
    /// return it as a base64 data URL.
    ///
    /// # Example Request
    /// ```json
    /// {
    ///   "text": "نمونہ متن\nSample Text",
    ///   "width": 100,
    ///   "height": 70,
    ///   "fontSize": 16,
    ///   "fontColor": "#000000",
    ///   "backgroundColor": "#FFFFFF",
    ///   "alignment": "right",
    ///   "lineSpacing": 5,
    ///   "fontFamily": "Noto Nastaliq Urdu"
    /// }
    /// ```
    #[oai(path = "/preview", method = "post", tag = "ApiCardTags::Render")]
    async fn preview(
        &self,
        Json(json): Json<CardRequest>,
        state: Data<&Arc<AppState>>,
    ) -> PreviewResponse {
        let style = json.normalized();
        tracing::info!(
            width = style.width_mm,
            height = style.height_mm,
            font = %style.font_family,
            "preview request"
        );

        match state.engine.render_preview(style).await {
            Ok(preview) => PreviewResponse::Ok(Json(PreviewPayload {
                success: true,
                image: preview.data_url,
                message: preview.message,
            })),
            Err(e) => PreviewResponse::BadRequest(Json(ErrorBody::new(
                "Preview generation failed",
                &e.to_string(),
                "Please check your input and try again",
            ))),
        }
    }

    /// Export JPG
    ///
    /// Render the card at 300 DPI and download it as a JPEG.
    #[oai(path = "/export/jpg", method = "post", tag = "ApiCardTags::Render")]
    async fn export_jpg(
        &self,
        Json(json): Json<CardRequest>,
        state: Data<&Arc<AppState>>,
    ) -> JpgExportResponse {
        let style = json.normalized();
        tracing::info!(
            width = style.width_mm,
            height = style.height_mm,
            font = %style.font_family,
            "jpg export request"
        );

        match state.engine.export_jpg(style).await {
            Ok(file) => JpgExportResponse::Jpeg(
                Attachment::new(file.bytes)
                    .attachment_type(AttachmentType::Attachment)
                    .filename(file.filename),
            ),
            Err(e) => JpgExportResponse::InternalServerError(Json(ErrorBody::new(
                "JPG export failed",
                &e.to_string(),
                "Please try again",
            ))),
        }
    }

    /// Export PDF
    ///
    /// Lay out the card text on a single vector page sized to the
    /// requested physical dimensions and download it as a PDF.
    #[oai(path = "/export/pdf", method = "post", tag = "ApiCardTags::Render")]
    async fn export_pdf(
        &self,
        Json(json): Json<CardRequest>,
        state: Data<&Arc<AppState>>,
    ) -> PdfExportResponse {
        let style = json.normalized();
        tracing::info!(
            width = style.width_mm,
            height = style.height_mm,
            font = %style.font_family,
            "pdf export request"
        );

        match state.engine.export_pdf(style).await {
            Ok(file) => PdfExportResponse::Pdf(
                Attachment::new(file.bytes)
                    .attachment_type(AttachmentType::Attachment)
                    .filename(file.filename),
            ),
            Err(e) => PdfExportResponse::InternalServerError(Json(ErrorBody::new(
                "PDF export failed",
                &e.to_string(),
                "Please try again",
            ))),
        }
    }

    /// Export Canvas PDF
    ///
    /// Embed a client-rendered canvas bitmap into a single PDF page of
    /// the requested physical size.
    #[oai(path = "/export_pdf", method = "post", tag = "ApiCardTags::Render")]
    async fn export_canvas_pdf(
        &self,
        Json(json): Json<CanvasPdfRequest>,
        state: Data<&Arc<AppState>>,
    ) -> CanvasPdfResponse {
        let Some(canvas_data) = json.canvas_data.clone().filter(|d| !d.is_empty()) else {
            return CanvasPdfResponse::BadRequest(Json(ErrorBody::new(
                "Canvas PDF export failed",
                "no canvas data provided",
                "Send the canvas as a base64 data URL",
            )));
        };
        let (width_mm, height_mm, dpi) = json.clamped();
        tracing::info!(width_mm, height_mm, dpi, "canvas pdf export request");

        match state
            .engine
            .export_canvas_pdf(canvas_data, width_mm, height_mm, dpi)
            .await
        {
            Ok(file) => CanvasPdfResponse::Pdf(
                Attachment::new(file.bytes)
                    .attachment_type(AttachmentType::Attachment)
                    .filename(file.filename),
            ),
            Err(e) => CanvasPdfResponse::BadRequest(Json(ErrorBody::new(
                "Canvas PDF export failed",
                &e.to_string(),
                "Send the canvas as a base64 data URL",
            ))),
        }
    }

    /// List Fonts
    ///
    /// Available font family names: the built-in defaults plus any font
    /// files discovered in the font directory.
    #[oai(path = "/fonts", method = "get", tag = "ApiCardTags::Fonts")]
    async fn fonts(&self, state: Data<&Arc<AppState>>) -> Json<Vec<String>> {
        Json(state.engine.list_fonts())
    }

    #[oai(path = "/health", method = "get")]
    async fn health(&self, state: Data<&Arc<AppState>>) -> Json<serde_json::Value> {
        Json(serde_json::json!({
            "status": "healthy",
            "fonts": state.engine.list_fonts().len(),
            "export_dir": state.engine.export_dir().display().to_string(),
        }))
    }
}
