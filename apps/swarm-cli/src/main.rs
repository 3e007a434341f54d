use clap::{Parser, Subcommand};
use glam::Vec2;
use std::path::PathBuf;
use std::time::Instant;
use swarm_assets::{AtlasImage, AtlasSource};
use swarm_common::{MAX_ENTITIES, WORKGROUP_SIZE};
use swarm_kernel::BatchGenerator;
use swarm_render_wgpu::{Engine, EngineConfig, RenderTarget, workgroup_count};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "swarm-cli", about = "Headless tools for the swarm engine")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON engine config
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print engine limits and the GPU adapter that would be used
    Info,
    /// Render frames offscreen and report what the GPU drew
    Run {
        /// Entities to spawn
        #[arg(short, long, default_value = "100000")]
        entities: usize,
        /// Frames to render
        #[arg(short, long, default_value = "60")]
        frames: u32,
        /// Seed of the demo batch generator
        #[arg(short, long, default_value = "42")]
        seed: u64,
        #[arg(long, default_value = "1280")]
        width: u32,
        #[arg(long, default_value = "720")]
        height: u32,
        /// Click at this NDC x,y on the first frame
        #[arg(long, value_delimiter = ',', num_args = 2, allow_negative_numbers = true)]
        click: Option<Vec<f32>>,
    },
    /// Decode atlas layer images and report their mip chain
    Atlas {
        /// Layer images in type order
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Info => {
            let mut engine = Engine::new(config);
            let capacity = engine.capacity();
            println!("swarm-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("max entities: {MAX_ENTITIES}");
            println!(
                "capacity: {capacity} ({} workgroups of {WORKGROUP_SIZE})",
                workgroup_count(capacity)
            );
            println!("atlas layers: {}", engine.config().atlas.layer_count());
            println!("pick radius: {} NDC", engine.config().pick_radius_ndc);

            match engine.init(RenderTarget::Offscreen {
                width: 64,
                height: 64,
            }) {
                Ok(()) => {
                    if let Some(info) = engine.adapter_info() {
                        println!(
                            "adapter: {} ({}, {:?})",
                            info.name,
                            info.backend.to_str(),
                            info.device_type
                        );
                    }
                }
                Err(e) => println!("adapter: unavailable ({e})"),
            }
        }
        Commands::Run {
            entities,
            frames,
            seed,
            width,
            height,
            click,
        } => {
            let mut engine = Engine::new(config);
            engine.init(RenderTarget::Offscreen { width, height })?;
            engine.on_entity_selected(|selection| match selection {
                Some(id) => println!("selected: {id}"),
                None => println!("selected: nothing"),
            });

            let batch = BatchGenerator::new(seed).generate(entities);
            let accepted = engine.ingest_entities(&batch);
            println!("ingested {accepted} of {entities} entities");

            if let Some([x, y]) = click.as_deref() {
                engine.click(Vec2::new(*x, *y));
            }

            let start = Instant::now();
            for _ in 0..frames {
                engine.render();
            }
            engine.wait_idle();
            let elapsed = start.elapsed();

            let visible = engine.read_instance_count().unwrap_or(0);
            println!(
                "frames: {frames}, total {:.2?}, {:.3} ms/frame",
                elapsed,
                elapsed.as_secs_f64() * 1000.0 / f64::from(frames.max(1))
            );
            println!("live: {}, visible: {visible}", engine.live_count());
            engine.destroy();
        }
        Commands::Atlas { paths } => {
            let atlas = AtlasImage::load(&AtlasSource::files(paths))?;
            println!(
                "layers: {}, size: {}x{}, mip levels: {}",
                atlas.layer_count(),
                atlas.width(),
                atlas.height(),
                atlas.mip_level_count()
            );
        }
    }

    Ok(())
}
