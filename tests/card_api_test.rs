use std::io::Cursor;
use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose};
use card_renderer::core::renderer::CardRenderer;
use card_renderer::settings::Config;
use card_renderer::{AppState, init_openapi_route};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use poem::{http::StatusCode, test::TestClient};
use serde_json::{Value, json};
use tempfile::TempDir;

struct TestService {
    font_dir: TempDir,
    export_dir: TempDir,
    client: TestClient<
        poem::middleware::CorsEndpoint<
            poem::middleware::AddDataEndpoint<poem::Route, Arc<AppState>>,
        >,
    >,
}

fn test_service() -> TestService {
    let font_dir = TempDir::new().unwrap();
    let export_dir = TempDir::new().unwrap();

    let engine = Arc::new(
        CardRenderer::new(font_dir.path(), export_dir.path())
            .expect("Failed to initialize card renderer"),
    );
    let app_state = Arc::new(AppState { engine });

    let config = Config {
        env: "file".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        prefix: None,
        font_dir: font_dir.path().to_path_buf(),
        export_dir: export_dir.path().to_path_buf(),
    };
    let app = init_openapi_route(app_state, &config);

    TestService {
        font_dir,
        export_dir,
        client: TestClient::new(app),
    }
}

fn card_payload() -> Value {
    json!({
        "text": "نمونہ متن\nSample Text",
        "width": 100,
        "height": 70,
        "fontSize": 16,
        "fontColor": "#000000",
        "backgroundColor": "#FFFFFF",
        "alignment": "center",
        "lineSpacing": 5,
        "fontFamily": "Noto Nastaliq Urdu"
    })
}

#[tokio::test]
async fn preview_returns_a_png_data_url() {
    let service = test_service();

    let resp = service
        .client
        .post("/preview")
        .content_type("application/json")
        .body_json(&card_payload())
        .send()
        .await;
    resp.assert_status_is_ok();

    let body = resp.0.into_body().into_string().await.unwrap();
    let payload: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(payload["success"], true);
    assert!(
        payload["image"]
            .as_str()
            .unwrap()
            .starts_with("data:image/png;base64,")
    );
    assert!(payload["message"].is_string());
}

#[tokio::test]
async fn preview_clamps_out_of_range_values() {
    let service = test_service();

    // Values far outside the documented ranges must be normalized, not
    // rejected.
    let resp = service
        .client
        .post("/preview")
        .content_type("application/json")
        .body_json(&json!({
            "text": "x",
            "width": 99999,
            "height": -5,
            "fontSize": 1000,
            "fontColor": "not-a-color",
            "alignment": "diagonal"
        }))
        .send()
        .await;
    resp.assert_status_is_ok();

    let body = resp.0.into_body().into_string().await.unwrap();
    let payload: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(payload["success"], true);
}

#[tokio::test]
async fn export_jpg_downloads_and_persists_a_file() {
    let service = test_service();

    let resp = service
        .client
        .post("/export/jpg")
        .content_type("application/json")
        .body_json(&card_payload())
        .send()
        .await;
    resp.assert_status_is_ok();

    let bytes = resp.0.into_body().into_vec().await.unwrap();
    assert_eq!(&bytes[..2], &[0xFF, 0xD8], "expected a JPEG SOI marker");

    let exported: Vec<_> = std::fs::read_dir(service.export_dir.path())
        .unwrap()
        .flatten()
        .collect();
    assert_eq!(exported.len(), 1);
    let name = exported[0].file_name().into_string().unwrap();
    assert!(name.starts_with("urdu_card_") && name.ends_with(".jpg"));
}

#[tokio::test]
async fn export_pdf_downloads_a_document() {
    let service = test_service();

    let resp = service
        .client
        .post("/export/pdf")
        .content_type("application/json")
        .body_json(&card_payload())
        .send()
        .await;
    resp.assert_status_is_ok();

    let bytes = resp.0.into_body().into_vec().await.unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn canvas_export_requires_canvas_data() {
    let service = test_service();

    let resp = service
        .client
        .post("/export_pdf")
        .content_type("application/json")
        .body_json(&json!({ "width": 100, "height": 70, "dpi": 1200 }))
        .send()
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn canvas_export_embeds_a_raster() {
    let service = test_service();

    let mut png = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 16, Rgb([200, 100, 50])))
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .unwrap();
    let data_url = format!(
        "data:image/png;base64,{}",
        general_purpose::STANDARD.encode(&png)
    );

    let resp = service
        .client
        .post("/export_pdf")
        .content_type("application/json")
        .body_json(&json!({
            "canvas_data": data_url,
            "width": 100,
            "height": 70,
            "dpi": 1200
        }))
        .send()
        .await;
    resp.assert_status_is_ok();

    let bytes = resp.0.into_body().into_vec().await.unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn canvas_export_rejects_invalid_image_data() {
    let service = test_service();

    let resp = service
        .client
        .post("/export_pdf")
        .content_type("application/json")
        .body_json(&json!({
            "canvas_data": "data:image/png;base64,!!!!",
            "width": 100,
            "height": 70
        }))
        .send()
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn fonts_endpoint_lists_defaults_and_installed_files() {
    let service = test_service();
    std::fs::write(service.font_dir.path().join("MehrNastaliq.ttf"), b"stub").unwrap();

    let resp = service.client.get("/fonts").send().await;
    resp.assert_status_is_ok();

    let body = resp.0.into_body().into_string().await.unwrap();
    let fonts: Vec<String> = serde_json::from_str(&body).unwrap();
    assert!(fonts.contains(&"Noto Nastaliq Urdu".to_string()));
    assert!(fonts.contains(&"MehrNastaliq".to_string()));
}

#[tokio::test]
async fn health_endpoint_reports_status() {
    let service = test_service();

    let resp = service.client.get("/health").send().await;
    resp.assert_status(StatusCode::OK);

    let body = resp.0.into_body().into_string().await.unwrap();
    let health: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(health["status"].as_str().unwrap(), "healthy");
    assert!(health["fonts"].is_number());
}
