//! Tarn Player - procedural terrain viewer
//!
//! Generates the terrain, water and trees, then opens a window with a
//! first-person camera.
//!
//! Usage:
//!   tarn-player [--config <tarn.toml>] [--seed <n>] [--fullscreen] [--dump-config]

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tarn_core::TarnConfig;
use tarn_player::PlayerApp;
use tarn_terrain::Scene;
use winit::event_loop::{ControlFlow, EventLoop};

#[derive(Parser)]
#[command(name = "tarn-player")]
#[command(about = "Tarn terrain viewer - procedural terrain with shadows, water and trees")]
struct Args {
    /// Path to a TOML config file (defaults to ./tarn.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the terrain seed
    #[arg(long)]
    seed: Option<u32>,

    /// Launch in fullscreen mode
    #[arg(long)]
    fullscreen: bool,

    /// Print the resolved config as TOML and exit
    #[arg(long)]
    dump_config: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = TarnConfig::load(args.config.as_deref()).context("Failed to load config")?;
    if let Some(seed) = args.seed {
        config.terrain.seed = seed;
    }

    if args.dump_config {
        print!("{}", config.to_toml_string().context("Failed to serialise config")?);
        return Ok(());
    }

    let scene = Scene::generate(&config).context("Failed to generate scene")?;

    log::info!("Controls:");
    log::info!("  WASD     - Move");
    log::info!("  Mouse    - Look");
    log::info!("  Escape   - Release cursor / Exit");
    log::info!("  F11      - Toggle fullscreen");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = PlayerApp::new(config, scene, args.fullscreen);
    event_loop.run_app(&mut app)?;

    Ok(())
}
