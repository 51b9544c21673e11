pub mod metrics;
pub mod tracer;

/// A single ADC word as delivered by the digitiser.
pub type Sample = i16;

/// The number of distinct ADC codes of a 16-bit digitiser.
pub const ADC_LEVELS: f64 = 65536.0;

/// The most negative and most positive ADC codes, i.e. the rails a saturated
/// channel sits at.
pub const ADC_RAILS: (Sample, Sample) = (Sample::MIN, Sample::MAX);

#[derive(Clone, Debug, clap::Parser)]
pub struct CommonOpts {
    /// Use ANSI colour codes in log output.
    #[clap(long, env, default_value = "false")]
    pub log_ansi: bool,

    /// Filter directive used when RUST_LOG is not set.
    #[clap(long, env, default_value = "info")]
    pub log_level: String,
}
