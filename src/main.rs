use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, Level};
use voice_capture::{create_router, AppState, CaptureController, Config, MediaDevicesFactory};

#[derive(Parser)]
#[command(name = "voice-capture")]
#[command(about = "Capture voice input and encode it as 16-bit PCM WAV")]
struct Args {
    /// Config file (extension optional)
    #[arg(short, long, default_value = "config/voice-capture")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP control API
    Serve,

    /// Record once and write the WAV to disk
    Record {
        /// Duration to record in seconds
        #[arg(short, long, default_value = "5")]
        seconds: u64,

        /// Output file (default: <recordings_path>/voice-<session>.wav)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));

    let source = cfg.capture.audio_source();
    info!("Audio source: {:?}", source);

    let devices = MediaDevicesFactory::create(source)?;
    let mut controller = CaptureController::with_devices(devices, cfg.capture.capture_config());

    match args.command {
        Command::Serve => {
            let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {}", addr))?;

            info!("HTTP server listening on {}", addr);

            let app = create_router(AppState::new(controller));
            axum::serve(listener, app)
                .await
                .context("HTTP server failed")?;
        }

        Command::Record { seconds, output } => {
            let session_id = controller.start_recording().await?;
            info!("Recording for {} seconds...", seconds);

            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(seconds)) => {}
                _ = tokio::signal::ctrl_c() => info!("Interrupted, stopping early"),
            }

            let wav = match controller.stop_recording().await {
                Ok(wav) => wav,
                Err(e) => {
                    info!("{}", e.remediation());
                    return Err(e.into());
                }
            };

            let path = output.unwrap_or_else(|| {
                PathBuf::from(&cfg.output.recordings_path).join(format!("voice-{}.wav", session_id))
            });
            if let Some(dir) = path.parent() {
                tokio::fs::create_dir_all(dir)
                    .await
                    .context("Failed to create output directory")?;
            }
            tokio::fs::write(&path, wav.as_bytes())
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;

            info!(
                "Saved {:.1}s of audio to {}",
                wav.duration_seconds(),
                path.display()
            );
        }
    }

    Ok(())
}
