use card_renderer::core::renderer::CardRenderer;
use card_renderer::settings::get_config;
use card_renderer::{AppState, init_openapi_route};
use poem::listener::TcpListener;
use tracing::Level;

use std::sync::Arc;

#[tokio::main]
async fn main() {
    let log_level = Level::DEBUG;
    // Logging to File
    let file_appender = tracing_appender::rolling::daily("./logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(log_level)
        .init();

    tracing::info!("Initializing Card Renderer Service...");

    let config = get_config();
    tracing::info!("run with config: {:?}", config);

    let engine = Arc::new(
        CardRenderer::new(&config.font_dir, &config.export_dir)
            .expect("Failed to initialize card renderer"),
    );

    // Init App State
    let app_state = Arc::new(AppState { engine });

    tracing::info!("card renderer initialized successfully");

    let app = init_openapi_route(app_state.clone(), &config);
    tracing::info!("run server on {}:{}", config.host, config.port);
    poem::Server::new(TcpListener::bind(format!(
        "{}:{}",
        config.host, config.port
    )))
    .run(app)
    .await
    .unwrap()
}
