mod app;
mod application;
mod config;
mod domain;
mod loader;
mod ui;
mod utils;

use iced::{window, Size};
use tracing::{info, warn};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

use crate::config::{AppConfig, LogFormat};

fn init_tracing(format: LogFormat) {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(env_filter).init(),
    }
}

fn main() -> iced::Result {
    let config = AppConfig::from_env();
    init_tracing(config.log_format);

    info!("Starting Instagram Post Downloader...");
    if let Err(e) = config.ensure_download_root() {
        warn!(
            "Failed to create download folder {}: {}",
            config.download_root.display(),
            e
        );
    }

    iced::application(
        move || app::DownloadApp::new(config.clone()),
        app::update,
        app::view,
    )
    .title("Instagram Post Downloader")
    .window(window::Settings {
        size: Size::new(640.0, 720.0),
        resizable: false,
        ..Default::default()
    })
    .run()
}
