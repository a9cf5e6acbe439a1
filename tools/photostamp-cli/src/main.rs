//! Photostamp CLI: stamp timestamps and locations onto photos.
//!
//! Usage:
//!   photostamp stamp <IMAGES>...     Stamp images and export them
//!   photostamp preview <IMAGE> -o    Render a reduced preview
//!   photostamp capture <FRAME>       Capture a still from a camera frame
//!   photostamp settings <ACTION>     Show, locate, or reset saved settings
//!   photostamp presets               List preset output sizes
//!   photostamp check                 Check fonts, folders, and export tiers

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use photostamp_common::AppConfig;
use photostamp_photo_model::PresetSize;

mod commands;

#[derive(Parser)]
#[command(
    name = "photostamp",
    about = "Burn timestamp and location overlays into photos",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stamp images and export them through the best available tier
    Stamp(commands::stamp::StampArgs),

    /// Render a reduced preview of one image with the saved settings
    Preview {
        /// Image to preview
        image: PathBuf,

        /// Output PNG path
        #[arg(short, long)]
        output: PathBuf,

        /// Longest preview edge in pixels (defaults to the configured bound)
        #[arg(long)]
        max: Option<u32>,
    },

    /// Capture a still from a camera frame image and export it
    Capture {
        /// Frame image standing in for the live camera feed
        frame: PathBuf,

        /// On-screen viewfinder size the capture is cropped to
        #[arg(long, default_value = "390x844", value_name = "WxH")]
        viewfinder: PresetSize,

        /// Treat the frame as coming from the front camera (mirrored)
        #[arg(long)]
        front: bool,
    },

    /// Show, locate, or reset saved settings
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },

    /// List preset output sizes
    Presets,

    /// Check fonts, folders, and export tiers
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load();

    // Initialize logging
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    let log_buffer = photostamp_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Stamp(args) => commands::stamp::run(args, &config, log_buffer).await,
        Commands::Preview { image, output, max } => commands::preview::run(image, output, max, &config),
        Commands::Capture {
            frame,
            viewfinder,
            front,
        } => commands::capture::run(frame, viewfinder, front, &config).await,
        Commands::Settings { action } => commands::settings::run(action),
        Commands::Presets => commands::presets::run(),
        Commands::Check => commands::check::run(&config),
    }
}
