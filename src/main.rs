use std::sync::Arc;

use clap::Parser;
use color_eyre::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::App;
use crate::client::AdminClient;
use crate::config::KeyResolver;

mod app;
mod cli;
mod client;
mod config;
mod download;
mod export;
mod model;
mod search;
mod theme;
pub mod tui;
mod ui;

pub use theme::Theme;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let _guard = initialize_logging()?;
    info!("Starting polex");

    let args = cli::Args::parse();
    let config = config::load()?;

    let resolver = Arc::new(KeyResolver::new(Arc::new(config.keybindings.clone())));
    let theme = theme::theme_from_name(&config.theme.name);

    let base_url = args.base_url.unwrap_or_else(|| config.server.base_url.clone());
    let client = Arc::new(AdminClient::new(
        &base_url,
        config.server.username.clone(),
        config.server.password.clone(),
    ));

    let output_dir = args
        .output
        .or_else(|| config.export.output_dir.clone())
        .unwrap_or_else(download::default_output_dir);

    let mut app = App::new(client, resolver, theme, args.service_type, output_dir);
    app.run().await?;

    Ok(())
}

fn initialize_logging() -> Result<WorkerGuard> {
    let directory = dirs::data_local_dir().map_or_else(
        || std::path::PathBuf::from("logs"),
        |path| path.join("polex").join("logs"),
    );
    std::fs::create_dir_all(&directory)?;

    let file_appender = tracing_appender::rolling::daily(&directory, "polex.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    Ok(guard)
}
