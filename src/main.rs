use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::sync::oneshot;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use voicemood::{audio, create_router, App, AppState, AudioSource, Completion, Config};

#[derive(Parser)]
#[command(name = "voicemood", version, about = "Record a short voice clip and get a playlist for its mood")]
struct Cli {
    /// Configuration file (extension optional)
    #[arg(long, default_value = "config/voicemood")]
    config: String,

    /// Override the inference API base URL
    #[arg(long)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record one clip, run it through the pipeline and print the result
    Record {
        /// Replay a WAV file instead of using the microphone
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Serve the HTTP control API
    Serve,
    /// List audio input devices
    Devices,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut cfg = Config::load(&cli.config)?;
    if let Some(url) = cli.api_url {
        cfg.api.base_url = url;
    }

    info!("Voicemood v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);

    match cli.command {
        Command::Record { input } => record(&cfg, input).await,
        Command::Serve => serve(&cfg).await,
        Command::Devices => devices(),
    }
}

async fn record(cfg: &Config, input: Option<PathBuf>) -> Result<()> {
    let source = match input {
        Some(path) => AudioSource::File(path),
        None => AudioSource::Microphone,
    };

    let app = App::from_config(cfg, source)?;
    let mut completions = app.completions();
    let mut status = app.capture().subscribe();

    app.capture().start().await?;
    println!(
        "Recording for up to {:.1}s, press Enter to stop early",
        app.capture().config().max_duration.as_secs_f64()
    );

    tokio::select! {
        _ = wait_for_enter() => {
            app.capture().stop().await;
        }
        _ = status.wait_for(|s| !s.is_recording()) => {}
    }

    let completion = completions
        .recv()
        .await
        .context("recording finished without reporting back")?;

    match completion {
        Completion::CaptureFailed(e) => warn!("No recording: {}", e),
        Completion::Pipeline(run) => info!("Pipeline run {:?}", run),
    }

    println!("{}", serde_json::to_string_pretty(&app.pipeline().state())?);

    app.shutdown().await;
    Ok(())
}

async fn serve(cfg: &Config) -> Result<()> {
    let app = App::from_config(cfg, AudioSource::Microphone)?;
    let state = AppState::new(app.capture().clone(), app.pipeline().clone());
    let router = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    app.shutdown().await;
    Ok(())
}

fn devices() -> Result<()> {
    let devices = audio::list_devices()?;
    if devices.is_empty() {
        println!("No input devices found");
    }
    for name in devices {
        println!("{}", name);
    }
    Ok(())
}

/// Resolve once a line is read from stdin; never resolves on EOF. The
/// reader thread is detached so a pending read never holds up process exit.
async fn wait_for_enter() {
    let (tx, rx) = oneshot::channel();
    std::thread::spawn(move || {
        let mut line = String::new();
        if matches!(std::io::stdin().read_line(&mut line), Ok(n) if n > 0) {
            let _ = tx.send(());
        }
    });
    if rx.await.is_err() {
        std::future::pending::<()>().await;
    }
}
