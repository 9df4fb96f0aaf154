#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the Firewall Defence experience.

mod demo;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use firewall_defence_client::{ClientConfig, SceneController, SimulationDriver};
use firewall_defence_core::{Color, WELCOME_BANNER};
use firewall_defence_rendering_macroquad::MacroquadBackend;
use firewall_defence_scene::{FrameInput, Presentation, RenderingBackend};
use glam::Vec2;
use log::info;

use crate::demo::DemoSimulation;

const WINDOW_SIZE: Vec2 = Vec2::new(960.0, 960.0);
const HEADLESS_DT: f32 = 1.0 / 60.0;

/// Command-line arguments for launching Firewall Defence.
#[derive(Debug, Parser)]
#[command(name = "firewall-defence", version, about = "Firewall Defence")]
struct CliArgs {
    /// TOML file overriding the presentation defaults.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Seed for the demo battle.
    #[arg(long, default_value_t = 7)]
    seed: u64,
    /// Run without a window and print a summary.
    #[arg(long)]
    headless: bool,
    /// Number of frames simulated in headless mode.
    #[arg(long, default_value_t = 600)]
    frames: u32,
    /// Synchronise presentation with the display refresh rate.
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    vsync: bool,
    /// Log frame timing once per second.
    #[arg(long)]
    show_fps: bool,
}

/// Entry point for the Firewall Defence command-line interface.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("error")).init();

    let args = CliArgs::parse();
    let config = match &args.config {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => ClientConfig::default(),
    };

    let simulation = DemoSimulation::new(args.seed);
    let controller = SceneController::new(config, simulation.bounds(), WINDOW_SIZE);
    let driver = SimulationDriver::new(controller, simulation);

    if args.headless {
        run_headless(driver, args.frames);
        return Ok(());
    }

    info!("launching window with seed {}", args.seed);
    MacroquadBackend::new()
        .with_vsync(args.vsync)
        .with_show_fps(args.show_fps)
        .run(
            Presentation::new("Firewall Defence", Color::from_rgb_u8(10, 14, 28)),
            driver,
        )
}

fn run_headless(mut driver: SimulationDriver<DemoSimulation>, frames: u32) {
    println!("{WELCOME_BANNER}");

    let input = FrameInput {
        viewport: WINDOW_SIZE,
        ..FrameInput::default()
    };
    let mut hits = 0;
    let mut cues = 0;
    for _ in 0..frames {
        let report = driver.tick(HEADLESS_DT, &input);
        hits += report.hits.len();
        cues += report.cues.len();
    }

    let report = driver.last_report();
    println!(
        "frames: {frames} hits: {hits} cues: {cues} kills: {} nodes: {} pooled: {}",
        driver.simulation().kills(),
        report.live_nodes,
        report.pooled,
    );
}
