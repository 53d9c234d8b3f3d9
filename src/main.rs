//! CLI entry point for the transit display server.
//!
//! Serves the JSON API the display applet reads, periodically renders the
//! applet and pushes it to the device when the image changes, and offers
//! one-shot render/push/snapshot commands for development.

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tidbyt_transit::{
    api::{AppState, create_router},
    config::{Settings, TidbytSettings, TransitSettings},
    fetch::{BasicClient, HttpClient, auth::ApiKey},
    mta::Aggregator,
    scheduler::{PeriodicTask, Scheduler},
    snapshot::TransitSource,
    tidbyt::{DisplayDevice, DisplayUpdater, PixletRenderer, PushMemo, TidbytClient, render_applet},
    weather::WeatherSource,
};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "tidbyt_transit")]
#[command(about = "Transit departures, bikes and weather for a Tidbyt display", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API and, when enabled, the periodic render-and-push task
    Serve,
    /// Render a Pixlet applet and write the image to stdout
    Render {
        /// Path to the .star applet
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Write raw image bytes instead of base64
        #[arg(long, default_value_t = false)]
        as_bytes: bool,
    },
    /// Render a Pixlet applet and push it to the device once
    Push {
        /// Path to the .star applet
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
    /// Fetch one live transit snapshot and log it
    Snapshot,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/tidbyt_transit.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("tidbyt_transit.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve => serve(Settings::from_env()?).await?,
        Commands::Render { path, as_bytes } => {
            let pixlet = std::env::var("PIXLET_PATH").unwrap_or_else(|_| "pixlet".to_string());
            info!(path = %path.display(), "Rendering applet to stdout");
            let image = render_applet(&pixlet, &path).await?;

            let mut stdout = std::io::stdout().lock();
            if as_bytes {
                stdout.write_all(&image)?;
            } else {
                stdout.write_all(STANDARD.encode(&image).as_bytes())?;
            }
            stdout.flush()?;
            info!("Finished");
        }
        Commands::Push { path } => {
            let settings = TidbytSettings::from_env()?;
            info!(path = %path.display(), "Rendering applet");
            let image = render_applet(&settings.pixlet_path, &path).await?;

            let device = TidbytClient::new(
                BasicClient::new()?,
                &settings.api_key,
                &settings.device_id,
                &settings.installation_id,
            )?;
            device.push(&image, false).await?;
            info!(path = %path.display(), "Successfully pushed applet");
        }
        Commands::Snapshot => {
            let settings = Settings::from_env()?;
            let client: Arc<dyn HttpClient> = Arc::new(BasicClient::new()?);
            let source = transit_source(&settings.transit, client)?;

            let snapshot = source.live_snapshot().await?;
            info!(snapshot = %serde_json::to_string(&snapshot)?, "Transit snapshot");
        }
    }

    Ok(())
}

/// Runs the API server until Ctrl-C, then stops the periodic tasks.
#[tracing::instrument(skip_all, fields(addr = %settings.api.addr))]
async fn serve(settings: Settings) -> Result<()> {
    let client: Arc<dyn HttpClient> = Arc::new(BasicClient::new()?);

    let transit = transit_source(&settings.transit, client.clone())?;
    let weather = WeatherSource::new(
        client.clone(),
        settings.weather.coordinates,
        settings.weather.temperature_unit,
    );
    let state = AppState::new(transit, weather).with_mocks(settings.api.transit_mock, settings.api.weather_mock);
    let app = create_router(Arc::new(state));

    let mut scheduler = Scheduler::new();
    if settings.tidbyt.enable_push {
        scheduler.add(push_task(&settings, client)?);
    } else {
        info!("Display push disabled");
    }
    scheduler.start_all();

    let listener = tokio::net::TcpListener::bind(settings.api.addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.api.addr))?;
    info!("API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown requested");
        })
        .await?;

    scheduler.stop_all().await;
    Ok(())
}

fn transit_source(settings: &TransitSettings, client: Arc<dyn HttpClient>) -> Result<TransitSource> {
    let feed_client: Arc<dyn HttpClient> = match &settings.mta_api_key {
        Some(key) => Arc::new(ApiKey::new(client.clone(), "x-api-key", key)?),
        None => client.clone(),
    };
    let aggregator = Aggregator::new(feed_client, settings.endpoints.clone());

    Ok(TransitSource::new(
        aggregator,
        client,
        settings.stations.clone(),
        &settings.citibike_station_id,
    ))
}

/// The periodic render-and-push task.
fn push_task(settings: &Settings, client: Arc<dyn HttpClient>) -> Result<PeriodicTask> {
    let tidbyt = &settings.tidbyt;

    let mut renderer = PixletRenderer::new(&tidbyt.pixlet_path, &tidbyt.app_path);
    if let Some(api_url) = &settings.api.api_url {
        renderer = renderer.with_replacement("API_URL", api_url);
    }
    let device = TidbytClient::new(
        client,
        &tidbyt.api_key,
        &tidbyt.device_id,
        &tidbyt.installation_id,
    )?;
    let updater = Arc::new(DisplayUpdater::new(
        Arc::new(renderer),
        Arc::new(device),
        Arc::new(PushMemo::new()),
    ));

    Ok(PeriodicTask::new(
        "render_and_push",
        tidbyt.push_interval,
        move || {
            let updater = Arc::clone(&updater);
            async move {
                updater.render_and_push().await?;
                Ok(())
            }
        },
    ))
}
