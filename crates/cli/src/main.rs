//! Cache model trace runner.
//!
//! This binary drives one cache engine with the reference burst memory:
//! 1. **Run:** Replay a JSON Lines request trace and report statistics.
//! 2. **Config:** Print the effective configuration as JSON.
//!
//! Logging goes to stderr and is controlled by `RUST_LOG`
//! (e.g. `RUST_LOG=accel_cache_core=debug`).

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use accel_cache_core::Simulator;
use accel_cache_core::config::{CacheConfig, Config};
use accel_cache_core::sim::trace;

#[derive(Parser, Debug)]
#[command(
    name = "cachesim",
    author,
    version,
    about = "Cycle-stepped accelerator cache model",
    long_about = "Replay request traces against the linear, texture, or GPU pixel cache.\n\nExamples:\n  cachesim run --preset texture --trace tiles.jsonl\n  cachesim run --config l1.json --trace walk.jsonl --json\n  cachesim config --preset gpu-pixel"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Built-in cache instances.
#[derive(ValueEnum, Clone, Copy, Debug)]
enum Preset {
    /// Byte-addressed cache, ordered-list LRU.
    SetAssoc,
    /// 8x8 tile cache without mip levels, ordered-list LRU.
    Texture,
    /// 8x8 mip-aware tile cache, epoch-stamp replacement.
    GpuPixel,
}

impl Preset {
    fn cache(self) -> CacheConfig {
        match self {
            Self::SetAssoc => CacheConfig::set_assoc(),
            Self::Texture => CacheConfig::texture(),
            Self::GpuPixel => CacheConfig::gpu_pixel(),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a trace and print statistics.
    Run {
        /// JSON configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Replace the cache section with a built-in instance.
        #[arg(long, value_enum)]
        preset: Option<Preset>,

        /// JSON Lines trace file.
        #[arg(short, long)]
        trace: PathBuf,

        /// Print statistics as JSON instead of the text report.
        #[arg(long)]
        json: bool,

        /// Report sections to print (summary, access, miss, stall).
        #[arg(long, value_delimiter = ',')]
        sections: Vec<String>,
    },

    /// Print the effective configuration.
    Config {
        /// JSON configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Replace the cache section with a built-in instance.
        #[arg(long, value_enum)]
        preset: Option<Preset>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run {
            config,
            preset,
            trace,
            json,
            sections,
        } => cmd_run(config, preset, &trace, json, &sections),
        Commands::Config { config, preset } => cmd_config(config, preset),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

/// Loads the configuration file (or defaults) and applies the preset.
fn effective_config(
    path: Option<PathBuf>,
    preset: Option<Preset>,
) -> Result<Config, Box<dyn Error>> {
    let mut config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(preset) = preset {
        config.cache = preset.cache();
    }
    let geometry = config.cache.validate()?;
    debug!(
        mode = geometry.addressing.name(),
        sets = geometry.num_sets,
        ways = geometry.ways,
        payload = geometry.payload_len,
        "effective configuration"
    );
    Ok(config)
}

/// Replays the trace against a fresh simulator and prints its statistics.
fn cmd_run(
    config: Option<PathBuf>,
    preset: Option<Preset>,
    trace_path: &Path,
    json: bool,
    sections: &[String],
) -> Result<(), Box<dyn Error>> {
    let config = effective_config(config, preset)?;
    let entries = trace::load(trace_path)?;

    let mut sim = Simulator::new(&config)?;
    let _ = sim.run_trace(&entries)?;

    let stats = sim.engine.stats();
    if json {
        println!("{}", serde_json::to_string_pretty(stats)?);
    } else {
        stats.print_sections(sections);
    }

    let diagnostics = sim.engine.diagnostics();
    if !diagnostics.is_empty() {
        eprintln!("{} protocol violation(s):", diagnostics.len());
        for d in diagnostics {
            eprintln!("  {d}");
        }
    }
    Ok(())
}

/// Prints the effective configuration as JSON.
fn cmd_config(config: Option<PathBuf>, preset: Option<Preset>) -> Result<(), Box<dyn Error>> {
    let config = effective_config(config, preset)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
