use std::env;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::info;

#[derive(Clone, Deserialize, Debug)]
pub struct Config {
    pub env: String, // file / server
    pub host: String,
    pub port: u16,
    pub prefix: Option<String>,

    /// Directory probed for `.ttf`/`.otf` font files.
    #[serde(default = "default_font_dir")]
    pub font_dir: PathBuf,

    /// Directory exported JPEGs and PDFs are written to.
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,
}

fn default_font_dir() -> PathBuf {
    PathBuf::from("static/fonts")
}

fn default_export_dir() -> PathBuf {
    PathBuf::from("exports")
}

pub fn get_config() -> Config {
    let env_var = env::var("env").unwrap_or("file".to_string());
    if env_var == "file" {
        info!("using .env file as environtment variable");
        let _ = dotenvy::dotenv();
    } else {
        info!("using server environtment as environtment variable");
    }
    envy::from_env::<Config>().unwrap()
}
