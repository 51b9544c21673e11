use anyhow::Context;
use clap::Parser;
use dpsa_common::{CommonOpts, init_tracer, tracer::TracerOptions};
use rand::{SeedableRng, rngs::StdRng};
use rayon::prelude::*;
use std::path::PathBuf;
use trace_simulator::TraceConfig;
use tracing::{debug, info};

// cargo run --bin trace-simulator -- --config simulation.json --output-dir traces --traces 100 --seed 7

#[derive(Debug, Parser)]
#[clap(author, version, about)]
struct Cli {
    /// JSON description of the traces to generate.
    #[clap(long)]
    config: PathBuf,

    /// Directory the trace files are written to.
    #[clap(long)]
    output_dir: PathBuf,

    /// Number of traces to generate.
    #[clap(long, default_value = "1")]
    traces: usize,

    /// Seed of the first trace; trace `i` is generated from `seed + i`.
    #[clap(long, default_value = "0")]
    seed: u64,

    #[clap(flatten)]
    common_opts: CommonOpts,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let tracer = init_tracer!(TracerOptions::from(&args.common_opts));

    let config = TraceConfig::from_json_file(&args.config)
        .with_context(|| format!("Cannot load {}", args.config.display()))?;
    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Cannot create {}", args.output_dir.display()))?;

    (0..args.traces)
        .into_par_iter()
        .try_for_each(|index| -> anyhow::Result<()> {
            let mut rng = StdRng::seed_from_u64(args.seed.wrapping_add(index as u64));
            let trace = config.generate(&mut rng)?;
            let path = args.output_dir.join(format!("trace_{index:05}.txt"));
            trace
                .save(&path)
                .with_context(|| format!("Cannot write {}", path.display()))?;
            debug!("Wrote {}", path.display());
            Ok(())
        })?;

    info!(
        "{} wrote {} traces to {}",
        tracer.service_name(),
        args.traces,
        args.output_dir.display()
    );
    Ok(())
}
