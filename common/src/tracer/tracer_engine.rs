use tracing::info;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt};

use crate::CommonOpts;

pub struct TracerOptions<'a> {
    /// Emit ANSI colour codes on stdout.
    pub ansi: bool,
    /// Filter directive used when `RUST_LOG` is unset or invalid.
    pub default_filter: &'a str,
}

impl<'a> From<&'a CommonOpts> for TracerOptions<'a> {
    fn from(opts: &'a CommonOpts) -> Self {
        Self {
            ansi: opts.log_ansi,
            default_filter: &opts.log_level,
        }
    }
}

/// This object initialises the stdout tracer.
pub struct TracerEngine {
    service_name: String,
}

impl TracerEngine {
    /// Initialises the stdout tracer for the crate
    /// #Arguments
    /// * `options` - The caller-specified instance of TracerOptions.
    /// * `service_name` - The name of the binary, reported once at start-up.
    /// * `module_name` - The name of the current module.
    /// #Returns
    /// An instance of TracerEngine
    pub fn new(options: TracerOptions, service_name: &str, module_name: &str) -> Self {
        let stdout_tracer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stdout)
            .with_ansi(options.ansi);

        // This filter is applied to the stdout tracer
        let log_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(options.default_filter));

        let subscriber =
            tracing_subscriber::Registry::default().with(stdout_tracer.with_filter(log_filter));

        //  A second initialisation (e.g. from tests) leaves the first subscriber in place
        if tracing::subscriber::set_global_default(subscriber).is_ok() {
            info!("{service_name} tracing initialised in {module_name}");
        }

        Self {
            service_name: service_name.to_owned(),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}
