//! Async facade over the layout routines: encodes outputs, builds
//! base64 data URLs and writes timestamped export files.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose, Engine as _};
use chrono::Local;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbImage};

use crate::core::card::{self, CardStyle};
use crate::core::fonts::FontCatalog;
use crate::core::pdf;

pub const PREVIEW_DPI: u32 = 150;
pub const EXPORT_DPI: u32 = 300;
pub const JPEG_QUALITY: u8 = 95;

pub struct PreviewImage {
    /// `data:image/png;base64,...`
    pub data_url: String,
    pub message: String,
}

pub struct ExportFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct CardRenderer {
    fonts: FontCatalog,
    export_dir: PathBuf,
}

impl CardRenderer {
    pub fn new(font_dir: &Path, export_dir: &Path) -> Result<Self> {
        fs::create_dir_all(font_dir)
            .with_context(|| format!("failed to create font directory {}", font_dir.display()))?;
        fs::create_dir_all(export_dir).with_context(|| {
            format!("failed to create export directory {}", export_dir.display())
        })?;
        Ok(Self {
            fonts: FontCatalog::new(font_dir),
            export_dir: export_dir.to_path_buf(),
        })
    }

    pub fn list_fonts(&self) -> Vec<String> {
        self.fonts.list_families()
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    /// PNG preview at screen DPI, returned as a base64 data URL.
    pub async fn render_preview(&self, style: CardStyle) -> Result<PreviewImage> {
        let engine = self.clone();
        match tokio::task::spawn_blocking(move || engine.preview_sync(&style)).await {
            Ok(result) => result,
            Err(join_err) => {
                // A panic inside the render is absorbed into the error
                // bitmap; the preview endpoint always gets an image.
                tracing::error!(%join_err, "preview render panicked, emitting error bitmap");
                let png = encode_png(&card::error_image("internal render failure"))?;
                Ok(PreviewImage {
                    data_url: data_url(&png),
                    message: "Preview degraded: internal render failure".to_string(),
                })
            }
        }
    }

    fn preview_sync(&self, style: &CardStyle) -> Result<PreviewImage> {
        let outcome = card::render_card(&self.fonts, style, PREVIEW_DPI);
        let message = match outcome.reason() {
            Some(reason) => {
                tracing::warn!(reason, "preview render degraded");
                format!("Preview degraded: {reason}")
            }
            None => "Preview generated successfully".to_string(),
        };
        let png = encode_png(outcome.value())?;
        Ok(PreviewImage {
            data_url: data_url(&png),
            message,
        })
    }

    /// High-resolution JPEG export, written to the export directory.
    pub async fn export_jpg(&self, style: CardStyle) -> Result<ExportFile> {
        let engine = self.clone();
        let bytes = match tokio::task::spawn_blocking(move || engine.jpg_sync(&style)).await {
            Ok(result) => result?,
            Err(join_err) => {
                tracing::error!(%join_err, "jpg render panicked, emitting error bitmap");
                encode_jpeg(&card::error_image("internal render failure"))?
            }
        };
        let filename = stamped_filename("jpg");
        self.write_export(&filename, &bytes)?;
        Ok(ExportFile { filename, bytes })
    }

    fn jpg_sync(&self, style: &CardStyle) -> Result<Vec<u8>> {
        let outcome = card::render_card(&self.fonts, style, EXPORT_DPI);
        if let Some(reason) = outcome.reason() {
            tracing::warn!(reason, "jpg render degraded");
        }
        encode_jpeg(outcome.value())
    }

    /// Single-page vector PDF export, written to the export directory.
    pub async fn export_pdf(&self, style: CardStyle) -> Result<ExportFile> {
        let engine = self.clone();
        let bytes = match tokio::task::spawn_blocking(move || engine.pdf_sync(&style)).await {
            Ok(bytes) => bytes,
            Err(join_err) => {
                tracing::error!(%join_err, "pdf render panicked, emitting error document");
                pdf::error_pdf("internal render failure")
            }
        };
        let filename = stamped_filename("pdf");
        self.write_export(&filename, &bytes)?;
        Ok(ExportFile { filename, bytes })
    }

    fn pdf_sync(&self, style: &CardStyle) -> Vec<u8> {
        let outcome = pdf::render_pdf(&self.fonts, style);
        if let Some(reason) = outcome.reason() {
            tracing::warn!(reason, "pdf render degraded");
        }
        outcome.into_value()
    }

    /// Embed a client-rendered canvas raster into a PDF page. Invalid
    /// data is a transport error for the caller to surface.
    pub async fn export_canvas_pdf(
        &self,
        canvas_data: String,
        width_mm: f64,
        height_mm: f64,
        dpi: u32,
    ) -> Result<ExportFile> {
        let raster = general_purpose::STANDARD
            .decode(strip_data_url_prefix(&canvas_data).trim())
            .context("invalid base64 image data")?;
        let bytes =
            tokio::task::spawn_blocking(move || pdf::embed_raster(&raster, width_mm, height_mm))
                .await
                .map_err(|e| anyhow!("task join error: {e}"))??;
        // Served directly, not persisted like the card exports.
        let filename = format!("urdu-card-{width_mm}x{height_mm}mm-{dpi}dpi.pdf");
        Ok(ExportFile { filename, bytes })
    }

    fn write_export(&self, filename: &str, bytes: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.export_dir)?;
        let path = self.export_dir.join(filename);
        fs::write(&path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), size = bytes.len(), "export written");
        Ok(())
    }
}

/// Export names carry a wall-clock timestamp with second granularity;
/// two exports within the same second overwrite each other.
fn stamped_filename(ext: &str) -> String {
    format!("urdu_card_{}.{ext}", Local::now().format("%Y%m%d_%H%M%S"))
}

fn data_url(png: &[u8]) -> String {
    format!(
        "data:image/png;base64,{}",
        general_purpose::STANDARD.encode(png)
    )
}

fn strip_data_url_prefix(data: &str) -> &str {
    data.strip_prefix("data:image/png;base64,")
        .or_else(|| data.strip_prefix("data:image/jpeg;base64,"))
        .unwrap_or(data)
}

fn encode_png(img: &RgbImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img.clone())
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .context("failed to encode PNG")?;
    Ok(bytes)
}

fn encode_jpeg(img: &RgbImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    let mut cursor = Cursor::new(&mut bytes);
    let encoder = JpegEncoder::new_with_quality(&mut cursor, JPEG_QUALITY);
    img.write_with_encoder(encoder)
        .context("failed to encode JPEG")?;
    Ok(bytes)
}
