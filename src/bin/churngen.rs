//! Command-line driver for the churngen pipeline.
//!
//! Every subcommand is driven by one JSON parameter file: `generate` writes
//! the synthetic dataset families, `mix` merges every discovered pair into a
//! shuffled event stream, and `queries` derives a point-query workload from
//! a generated base dataset.

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

use churngen::constants::discover::{BASE_STEM, DATASET_EXT, NOISE_STEM};
use churngen::constants::queries::WORKLOAD_FILENAME;
use churngen::constants::store::DEFAULT_STORE_FILENAME;
use churngen::{
    BenchParams, InMemoryNoise, NoiseStore, StoreBackedNoise, discover_jobs, generate_base,
    generate_noise, generate_queries, generate_reference, load_base, load_params, mix_stream,
};

#[derive(Debug, Parser)]
#[command(
    name = "churngen",
    disable_help_subcommand = true,
    about = "Synthetic insert/delete event-stream generator",
    long_about = "Generate synthetic datasets, merge them into seeded-shuffled \
insert/delete event streams, and derive point-query workloads, all driven by \
one JSON parameter file."
)]
struct Cli {
    /// JSON parameter file.
    #[arg(long, value_name = "PATH", default_value = "params.json")]
    params: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate base, noise, and reference datasets for every configured
    /// noise fraction.
    Generate,
    /// Merge every discovered dataset pair into an event stream.
    Mix {
        /// Serve noise records from the indexed on-disk store instead of
        /// memory.
        #[arg(long)]
        backed: bool,
    },
    /// Derive a point-query workload from one generated base dataset.
    Queries {
        /// Noise fraction whose directory holds the base dataset.
        #[arg(long, default_value_t = 0.0)]
        fraction: f64,
    },
}

fn main() {
    tracing_subscriber::fmt().with_target(false).init();
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let params = load_params(&cli.params)?;
    match cli.command {
        Command::Generate => generate(&params),
        Command::Mix { backed } => mix_all(&params, backed),
        Command::Queries { fraction } => queries(&params, fraction),
    }
}

/// Directory for one dataset family: `<root>/alpha_<a>/<size_factor>/<fraction>`.
fn family_dir(params: &BenchParams, fraction: f64) -> PathBuf {
    params
        .root
        .join(format!("alpha_{}", params.synth.zipf_alpha))
        .join(params.synth.size_factor.to_string())
        .join(fraction.to_string())
}

fn generate(params: &BenchParams) -> Result<(), Box<dyn Error>> {
    let profile = &params.synth;
    for &fraction in &profile.noise_fractions {
        let dir = family_dir(params, fraction);
        generate_base(profile, &dir.join(format!("{BASE_STEM}.{DATASET_EXT}")))?;
        if profile.noise_size(fraction) > 0 {
            generate_noise(
                profile,
                fraction,
                &dir.join(format!("{NOISE_STEM}.{DATASET_EXT}")),
            )?;
        }
        generate_reference(profile, fraction, &dir.join(format!("reference.{DATASET_EXT}")))?;
    }
    Ok(())
}

fn mix_all(params: &BenchParams, backed: bool) -> Result<(), Box<dyn Error>> {
    let schema = params.synth.schema();
    let jobs = discover_jobs(&params.root)?;
    info!(jobs = jobs.len(), backed, "running merge jobs");
    for job in jobs {
        let base = load_base(&job.base, &schema)?;
        let space = base.id_space();
        match &job.noise {
            Some(noise_path) if backed => {
                let store =
                    NoiseStore::recreate(params.root.join("tmp").join(DEFAULT_STORE_FILENAME))?;
                let mut source = StoreBackedNoise::load(store, noise_path, &schema, &space)?;
                mix_stream(&base, &mut source, &params.mix, &job.stream)?;
            }
            Some(noise_path) => {
                let mut source = InMemoryNoise::load(noise_path, &schema, &space)?;
                mix_stream(&base, &mut source, &params.mix, &job.stream)?;
            }
            None => {
                let mut source = InMemoryNoise::default();
                mix_stream(&base, &mut source, &params.mix, &job.stream)?;
            }
        }
    }
    Ok(())
}

fn queries(params: &BenchParams, fraction: f64) -> Result<(), Box<dyn Error>> {
    let dir = family_dir(params, fraction);
    let base = load_base(
        &dir.join(format!("{BASE_STEM}.{DATASET_EXT}")),
        &params.synth.schema(),
    )?;
    generate_queries(&base, &params.workload, &dir.join(WORKLOAD_FILENAME))?;
    Ok(())
}
