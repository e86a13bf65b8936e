// Shelfsight - hold an item up to the camera and hear what it is

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shelfsight_assist::phrases::ROTATE_CUE;
use shelfsight_assist::{Assistant, Collaborators};
use shelfsight_cli::{apply_setting, print_events, AppConfig, PngOverlay, SessionConsole};
use shelfsight_core::{is_uninformative, Settings};
use shelfsight_eye::{
    build_detector, CameraManager, DetectorAdapter, DetectorBackendKind, Frame, NullOverlay,
    OverlaySurface, StillImageCamera,
};
use shelfsight_llm::{build_backend, relay_router, DescribeBackendKind, DescriptionClient};
use shelfsight_sc::{build_cue_player, build_tone_output};
use shelfsight_spk::{build_engine, SpeechChannel};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shelfsight")]
#[command(about = "Shelfsight - point the camera at an item and hear what it is", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, short, global = true, env = "SHELFSIGHT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the assistant with an interactive console
    Run {
        /// Directory of still images used as the camera feed
        #[arg(long)]
        images: Option<PathBuf>,

        /// JSON detection script used instead of the configured detector
        #[arg(long)]
        detections: Option<PathBuf>,

        /// Settings file (defaults to the per-user settings file)
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Write each overlay drawing as a PNG into this directory
        #[arg(long)]
        overlay_dir: Option<PathBuf>,

        /// Wait for `start` instead of opening the camera after loading
        #[arg(long)]
        no_auto_start: bool,
    },

    /// Show or change persisted settings
    #[command(subcommand)]
    Settings(SettingsCommands),

    /// Describe one image file and print the result
    Describe {
        /// Image to describe
        image: PathBuf,

        /// Settings file used for the field selection
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Also speak the description
        #[arg(long)]
        speak: bool,
    },

    /// Serve the image description relay over HTTP, backed by OpenAI
    Relay {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:3000")]
        bind: SocketAddr,
    },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Print the current settings
    Show {
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Change one setting, e.g. `set captureDelayMs 2000`
    Set {
        key: String,
        value: String,
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Restore the default settings
    Reset {
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_json)?;

    let config = AppConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            images,
            detections,
            settings,
            overlay_dir,
            no_auto_start,
        } => {
            run_assistant(config, images, detections, settings, overlay_dir, !no_auto_start).await?;
        }
        Commands::Settings(cmd) => {
            handle_settings_command(&config, cmd)?;
        }
        Commands::Describe {
            image,
            settings,
            speak,
        } => {
            describe_image(&config, &image, settings, speak).await?;
        }
        Commands::Relay { bind } => {
            serve_relay(&config, bind).await?;
        }
    }

    Ok(())
}

fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("Invalid log level: {}", level))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

/// Settings from an explicit file, the per-user file, or the config
fn resolve_settings(config: &AppConfig, path: Option<PathBuf>) -> Result<(Settings, PathBuf)> {
    let path = path.unwrap_or_else(Settings::default_path);
    if path.exists() {
        let settings = Settings::load(&path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?;
        Ok((settings, path))
    } else {
        Ok((config.settings.sanitized(), path))
    }
}

async fn run_assistant(
    mut config: AppConfig,
    images: Option<PathBuf>,
    detections: Option<PathBuf>,
    settings_path: Option<PathBuf>,
    overlay_dir: Option<PathBuf>,
    auto_start: bool,
) -> Result<()> {
    info!("🚀 Starting Shelfsight...");

    if let Some(dir) = images {
        config.camera.image_dir = dir;
    }
    if let Some(path) = detections {
        config.detector.backend = DetectorBackendKind::Scripted { path };
    }
    let (settings, settings_path) = resolve_settings(&config, settings_path)?;

    info!("📷 Camera frames from {}", config.camera.image_dir.display());
    let camera = Arc::new(CameraManager::new(Arc::new(StillImageCamera::new(
        config.camera.clone(),
    )?)));

    let detector = build_detector(&config.detector)?;
    let detector = Arc::new(DetectorAdapter::new(detector, &config.detector));
    info!("🔍 Detector: {}", detector.name());

    let engine = build_engine(&config.speech)?;
    info!("🗣️  Speech engine: {}", engine.name());
    let speech = Arc::new(SpeechChannel::new(engine));

    let tone_output = build_tone_output(&config.audio)?;
    let cues = build_cue_player(&config.audio);

    let describer = DescriptionClient::new(build_backend(&config.describe)?);
    info!("🧠 Description backend: {}", describer.backend_name());

    let overlay: Arc<dyn OverlaySurface> = match overlay_dir {
        Some(dir) => {
            info!("🖼️  Writing overlays to {}", dir.display());
            Arc::new(PngOverlay::new(dir)?)
        }
        None => Arc::new(NullOverlay),
    };

    let (task, handle) = Assistant::spawn(
        config.assistant_config(settings.clone(), auto_start),
        Collaborators {
            camera,
            detector,
            overlay,
            speech,
            tone_output,
            cues,
            describer,
        },
    )?;
    let printer = tokio::spawn(print_events(handle.subscribe()));
    info!("✅ Shelfsight ready");

    let console = SessionConsole::new(handle.clone(), settings, Some(settings_path));
    tokio::select! {
        result = console.run() => result?,
        _ = tokio::signal::ctrl_c() => info!("Interrupted"),
    }

    if let Err(e) = handle.shutdown().await {
        warn!("Assistant already stopped: {}", e);
    }
    task.await?;
    printer.abort();
    info!("👋 Shelfsight stopped");
    Ok(())
}

fn handle_settings_command(config: &AppConfig, cmd: SettingsCommands) -> Result<()> {
    match cmd {
        SettingsCommands::Show { path } => {
            let (settings, path) = resolve_settings(config, path)?;
            println!("# {}", path.display());
            println!("{}", toml::to_string_pretty(&settings)?);
        }
        SettingsCommands::Set { key, value, path } => {
            let (settings, path) = resolve_settings(config, path)?;
            let updated = apply_setting(&settings, &key, &value)?;
            updated.save(&path)?;
            println!("✅ {} updated in {}", key, path.display());
        }
        SettingsCommands::Reset { path } => {
            let path = path.unwrap_or_else(Settings::default_path);
            Settings::default().save(&path)?;
            println!("✅ Settings reset in {}", path.display());
        }
    }
    Ok(())
}

async fn describe_image(
    config: &AppConfig,
    image: &Path,
    settings_path: Option<PathBuf>,
    speak: bool,
) -> Result<()> {
    let (settings, _) = resolve_settings(config, settings_path)?;
    let frame = Frame::load(image, config.camera.max_width, 0)
        .with_context(|| format!("Failed to load {}", image.display()))?;
    let encoded = frame.encode_jpeg(config.camera.jpeg_quality)?;

    let client = DescriptionClient::new(build_backend(&config.describe)?);
    let description = client.describe(&encoded, &settings.fields).await?;
    println!("{}", description);

    if speak {
        let speech = SpeechChannel::new(build_engine(&config.speech)?);
        speech.say(description.clone()).await;
        if is_uninformative(&description) {
            speech.say(ROTATE_CUE).await;
        }
    }
    Ok(())
}

async fn serve_relay(config: &AppConfig, bind: SocketAddr) -> Result<()> {
    let mut describe = config.describe.clone();
    describe.backend = DescribeBackendKind::OpenAi;
    let backend = build_backend(&describe)?;

    let app = relay_router(backend);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("🚀 Description relay listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    info!("👋 Relay stopped");
    Ok(())
}
