mod metrics;
mod processing;

use anyhow::Context;
use clap::Parser;
use dpsa_common::{CommonOpts, init_tracer, tracer::TracerOptions};
use glob::glob;
use metrics_exporter_prometheus::PrometheusBuilder;
use processing::ProcessingOptions;
use pulse_shape_analysis::{DetectorParameters, Real, calibration::Calibration};
use rayon::prelude::*;
use std::{net::SocketAddr, path::PathBuf};
use tracing::{error, info, warn};

// cargo run --bin pulse-shape-analysis -- --input "traces/*.txt" --output records.csv --threshold=-200

#[derive(Debug, Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Glob pattern matching the trace files to analyse.
    #[clap(long)]
    input: String,

    /// CSV file the records are written to.
    #[clap(long)]
    output: PathBuf,

    /// JSON file of detector parameters, used instead of the detector flags.
    #[clap(long)]
    config: Option<PathBuf>,

    /// Pedestal of every trace, overriding the trace file headers.
    #[clap(long, allow_hyphen_values = true)]
    pedestal: Option<Real>,

    /// If set, the shaped and discriminator waveforms of each candidate are saved here.
    #[clap(long)]
    save_path: Option<PathBuf>,

    /// Express the records in physical units.
    #[clap(long)]
    calibrate: bool,

    #[clap(flatten)]
    calibration: Calibration,

    /// If set, metrics are served on this address.
    #[clap(long)]
    observability_address: Option<SocketAddr>,

    #[clap(flatten)]
    parameters: DetectorParameters,

    #[clap(flatten)]
    common_opts: CommonOpts,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let tracer = init_tracer!(TracerOptions::from(&args.common_opts));

    if let Some(address) = args.observability_address {
        PrometheusBuilder::new()
            .with_http_listener(address)
            .install()
            .context("Prometheus metrics exporter should be set up")?;
    }
    metrics::describe();

    let parameters = match &args.config {
        Some(path) => DetectorParameters::from_json_file(path)
            .with_context(|| format!("Cannot load parameters from {}", path.display()))?,
        None => args.parameters.clone(),
    };
    let config = parameters.to_config()?;

    let mut paths = glob(&args.input)?.collect::<Result<Vec<_>, _>>()?;
    paths.sort();
    if paths.is_empty() {
        warn!("No trace files match {}", args.input);
    }

    if let Some(save_path) = &args.save_path {
        std::fs::create_dir_all(save_path)
            .with_context(|| format!("Cannot create {}", save_path.display()))?;
    }

    let options = ProcessingOptions {
        pedestal: args.pedestal,
        save_path: args.save_path.as_deref(),
        calibration: args.calibrate.then_some(&args.calibration),
    };

    let results: Vec<_> = paths
        .into_par_iter()
        .filter_map(
            |path| match processing::process_file(&path, &config, &options) {
                Ok(records) => Some((path, records)),
                Err(e) => {
                    error!("{}: {e:#}", path.display());
                    None
                }
            },
        )
        .collect();

    processing::write_csv(&args.output, &results)?;
    info!(
        "{} wrote records of {} trace files to {}",
        tracer.service_name(),
        results.len(),
        args.output.display()
    );
    Ok(())
}
