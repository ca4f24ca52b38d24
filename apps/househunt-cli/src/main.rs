mod sim;

use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::Vec3;
use househunt_assets::LoadOptions;
use househunt_common::Aabb;
use househunt_kernel::{Game, GameConfig, Model, TargetHitPolicy};
use househunt_render::{DebugTextRenderer, RenderView, Renderer};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "househunt-cli", about = "Headless househunt tools")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Gameplay config (YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Load a model and print its meshes and bounds
    Inspect {
        /// glTF or GLB file
        #[arg(long)]
        model: PathBuf,
    },
    /// Run a scripted session without a window
    Simulate {
        /// glTF or GLB file; a plain box room is used when omitted
        #[arg(long)]
        model: Option<PathBuf>,
        /// Frames to simulate
        #[arg(short, long, default_value = "600")]
        frames: u64,
        /// Seed for target placement
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Frames between shots (0 never fires)
        #[arg(long, default_value = "10")]
        fire_every: u64,
        /// Hold the forward key while aiming
        #[arg(long)]
        walk: bool,
        /// Respawn hit targets instead of removing them
        #[arg(long)]
        respawn: bool,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<GameConfig> {
    match path {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("reading config {}", path.display())),
        None => Ok(GameConfig::default()),
    }
}

fn load_model(path: &Path, config: &GameConfig) -> anyhow::Result<Model> {
    let options = LoadOptions {
        texture_repeat: config.texture_repeat,
    };
    househunt_assets::load_model(path, &options)
        .with_context(|| format!("loading model {}", path.display()))
}

/// Box room large enough to contain the default start position.
fn fallback_room() -> Model {
    Model::room(
        "room",
        Aabb::new(Vec3::new(-10.0, 0.0, -20.0), Vec3::new(10.0, 12.0, 10.0)),
        0.2,
    )
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Info => {
            println!("househunt-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("input: {}", househunt_input::crate_info());
            println!("kernel: {}", househunt_kernel::crate_info());
            println!("assets: {}", househunt_assets::crate_info());
            println!("render: {}", househunt_render::crate_info());
            println!(
                "defaults: targets={} win_score={} move_step={} clearance={}",
                config.target_count, config.win_score, config.move_step, config.clearance
            );
        }
        Commands::Inspect { model } => {
            let model = load_model(&model, &config)?;
            println!("Model: {}", model.name);
            println!(
                "Meshes: {}  Vertices: {}  Triangles: {}",
                model.meshes.len(),
                model.vertex_count(),
                model.triangle_count()
            );
            if let Some(bounds) = model.bounds() {
                let size = bounds.size();
                println!(
                    "Bounds: min=({:.2}, {:.2}, {:.2}) max=({:.2}, {:.2}, {:.2}) size=({:.2}, {:.2}, {:.2})",
                    bounds.min.x,
                    bounds.min.y,
                    bounds.min.z,
                    bounds.max.x,
                    bounds.max.y,
                    bounds.max.z,
                    size.x,
                    size.y,
                    size.z
                );
            }
            for texture in &model.textures {
                println!("Texture: {} {}x{}", texture.name, texture.width, texture.height);
            }
            for mesh in &model.meshes {
                let texture = model
                    .texture_of(mesh)
                    .map(|t| format!(" texture={}", t.name))
                    .unwrap_or_default();
                let tiling = mesh
                    .tiling
                    .map(|t| format!(" repeat=({}, {})", t.repeat.x, t.repeat.y))
                    .unwrap_or_default();
                println!(
                    "  {} triangles={} double_sided={}{texture}{tiling}",
                    mesh.name,
                    mesh.triangle_count(),
                    mesh.double_sided
                );
            }
        }
        Commands::Simulate {
            model,
            frames,
            seed,
            fire_every,
            walk,
            respawn,
            json,
        } => {
            let mut config = config;
            config.seed = Some(seed);
            if respawn {
                config.target_hit_policy = TargetHitPolicy::Respawn;
            }
            let model = match &model {
                Some(path) => load_model(path, &config)?,
                None => fallback_room(),
            };

            let mut game = Game::new(config);
            game.load_model(model);
            let report = sim::run(
                &mut game,
                &sim::Script {
                    frames,
                    fire_every,
                    walk,
                },
            );

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                let view = RenderView::from_camera(game.camera());
                print!("{}", DebugTextRenderer::new().render(&game, &view));
                println!(
                    "Frames: {}  Fired: {}  Hits: {}  Blocked moves: {}  Respawns: {}",
                    report.frames, report.fired, report.hits, report.blocked_moves, report.respawns
                );
                match report.won_at_frame {
                    Some(frame) => println!("Won at frame {frame}"),
                    None => println!("No win"),
                }
            }
        }
    }

    Ok(())
}
