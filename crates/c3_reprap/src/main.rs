//! simreprap
//!
//! Renders a simulated 3D printer through the c3 scene graph: hotbed, grid,
//! moving nozzle, a shadow-casting light and a status overlay.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use c3_reprap::{App, AppConfig};

#[derive(Parser)]
#[command(name = "simreprap")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "3D printer simulation viewer", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (default: simreprap.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the printer and render frames at the configured rate
    Run {
        /// Stop after this many frames (overrides frame.max_frames)
        #[arg(short, long)]
        frames: Option<u64>,

        /// Input to replay, one event per frame: q quit, m decal, d shadow target,
        /// b dump, 1 fxaa, +/- zoom, </> orbit, [/] pan
        #[arg(short, long, default_value = "")]
        keys: String,
    },

    /// Project the scene once and print the light view's geometry
    Dump {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or(filter);

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run { frames, keys } => cmd_run(config, frames, &keys),
        Commands::Dump { json } => cmd_dump(config, json),
        Commands::Config => cmd_config(&config),
    }
}

fn cmd_run(config: AppConfig, frames: Option<u64>, keys: &str) -> Result<()> {
    let max_frames = frames.unwrap_or(config.frame.max_frames);
    info!(
        "simreprap {}x{} at {} Hz",
        config.window.width, config.window.height, config.frame.rate_hz
    );
    let mut app = App::new(config)?;
    app.start_feed()?;
    app.run(max_frames, keys)?;
    info!("final state: {}", app.snapshot().status_line());
    info!(
        "{} frames, nozzle model {}",
        app.frames(),
        if app.scene.nozzle.is_some() { "loaded" } else { "missing" }
    );
    app.shutdown();
    Ok(())
}

fn cmd_dump(config: AppConfig, json: bool) -> Result<()> {
    let mut app = App::new(config)?;
    let entries = app.project_and_dump()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for entry in &entries {
            println!(
                "{:<12} {:<10} min {:?} max {:?}",
                entry.name, entry.kind, entry.min, entry.max
            );
        }
    }
    app.shutdown();
    Ok(())
}

fn cmd_config(config: &AppConfig) -> Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}
