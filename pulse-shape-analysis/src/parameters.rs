use crate::pulse_detection::{
    CFD_DELAY, CFD_FACTOR, HALF_WINDOW, MAX_PEAKS, RANGE_FROM, RANGE_TO, Real,
    energy::EnergyWindows,
    kernel::{FilterKernel, KernelError},
    peak_finder::SnippetRange,
    shaping::CfdSettings,
};
use clap::{Args, ValueEnum};
use serde::Deserialize;
use std::{fs::File, io::BufReader, path::Path};
use thiserror::Error;

const DEFAULT_THRESHOLD: Real = -211.346_531_036_437_51;
const DEFAULT_SCALE: Real = 1.64;
const DEFAULT_RC: Real = 6.0;
const DEFAULT_PROMPT_START: usize = 30;

/// The direction in which pulses leave the baseline.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Polarity {
    #[default]
    Negative,
    Positive,
}

impl Polarity {
    pub fn sign(self) -> Real {
        match self {
            Polarity::Negative => -1.0,
            Polarity::Positive => 1.0,
        }
    }

    /// Whether `value` is at or past `threshold`.
    pub fn reaches(self, value: Real, threshold: Real) -> bool {
        self.sign() * value >= self.sign() * threshold
    }

    /// Whether `value` is strictly past `threshold`.
    pub fn exceeds(self, value: Real, threshold: Real) -> bool {
        self.sign() * value > self.sign() * threshold
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Half window must be positive")]
    NonPositiveWindow,
    #[error("Snippet length {snippet} must equal the half window {half_window}")]
    SnippetLength { snippet: usize, half_window: usize },
    #[error("CFD delay {delay} must be shorter than the candidate window {window}")]
    CfdDelay { delay: usize, window: usize },
    #[error("Max peaks must be at least one")]
    ZeroCapacity,
    #[error("{0} must be finite, got {1}")]
    NonFinite(&'static str, Real),
    #[error("Energy windows {prompt_start}..{prompt_end}..{delayed_end} do not fit in a snippet of {snippet}")]
    EnergyWindows {
        prompt_start: usize,
        prompt_end: usize,
        delayed_end: usize,
        snippet: usize,
    },
    #[error("Kernel: {0}")]
    Kernel(#[from] KernelError),
    #[error("Io: {0}")]
    Io(#[from] std::io::Error),
    #[error("Json: {0}")]
    Json(#[from] serde_json::Error),
}

/// The tunables of the analysis, as given on the command line or in a JSON file.
///
/// Fields missing from a JSON file take their default values.
#[derive(Debug, Clone, PartialEq, Args, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DetectorParameters {
    #[clap(long, value_enum, default_value_t = Polarity::Negative)]
    pub polarity: Polarity,

    /// Pedestal-corrected level which opens a candidate and qualifies a shaped peak.
    #[clap(long, allow_hyphen_values = true, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: Real,

    #[clap(long, default_value_t = HALF_WINDOW)]
    pub half_window: usize,

    /// Samples before the peak index taken into the energy snippet.
    #[clap(long, default_value_t = RANGE_FROM)]
    pub range_from: usize,

    /// Samples from the peak index onwards taken into the energy snippet.
    #[clap(long, default_value_t = RANGE_TO)]
    pub range_to: usize,

    #[clap(long, default_value_t = CFD_DELAY)]
    pub cfd_delay: usize,

    #[clap(long, default_value_t = CFD_FACTOR)]
    pub cfd_factor: Real,

    /// Gain applied to the shaped waveform.
    #[clap(long, default_value_t = DEFAULT_SCALE)]
    pub scale: Real,

    /// Time constant, in samples, of the RC shaping kernel. Ignored if `taps` is given.
    #[clap(long, default_value_t = DEFAULT_RC)]
    pub rc: Real,

    /// Explicit shaping kernel taps, comma separated.
    #[clap(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub taps: Option<Vec<Real>>,

    #[clap(long, default_value_t = MAX_PEAKS)]
    pub max_peaks: usize,

    #[clap(long, default_value_t = DEFAULT_PROMPT_START)]
    pub prompt_start: usize,

    /// End of the prompt charge window, and start of the delayed one.
    #[clap(long, default_value_t = RANGE_FROM + 20)]
    pub prompt_end: usize,

    #[clap(long, default_value_t = RANGE_TO)]
    pub delayed_end: usize,
}

impl Default for DetectorParameters {
    fn default() -> Self {
        Self {
            polarity: Polarity::Negative,
            threshold: DEFAULT_THRESHOLD,
            half_window: HALF_WINDOW,
            range_from: RANGE_FROM,
            range_to: RANGE_TO,
            cfd_delay: CFD_DELAY,
            cfd_factor: CFD_FACTOR,
            scale: DEFAULT_SCALE,
            rc: DEFAULT_RC,
            taps: None,
            max_peaks: MAX_PEAKS,
            prompt_start: DEFAULT_PROMPT_START,
            prompt_end: RANGE_FROM + 20,
            delayed_end: RANGE_TO,
        }
    }
}

impl DetectorParameters {
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        Ok(serde_json::from_reader(BufReader::new(File::open(path)?))?)
    }

    /// Validates the parameters into the configuration the analysis runs on.
    pub fn to_config(&self) -> Result<AnalysisConfig, ConfigError> {
        for (name, value) in [
            ("threshold", self.threshold),
            ("cfd-factor", self.cfd_factor),
            ("scale", self.scale),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite(name, value));
            }
        }
        if self.half_window == 0 {
            return Err(ConfigError::NonPositiveWindow);
        }
        let snippet = SnippetRange {
            from: self.range_from,
            to: self.range_to,
        };
        if snippet.len() != self.half_window {
            return Err(ConfigError::SnippetLength {
                snippet: snippet.len(),
                half_window: self.half_window,
            });
        }
        if self.cfd_delay >= 3 * self.half_window {
            return Err(ConfigError::CfdDelay {
                delay: self.cfd_delay,
                window: 3 * self.half_window,
            });
        }
        if self.max_peaks == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if !(self.prompt_start <= self.prompt_end
            && self.prompt_end <= self.delayed_end
            && self.delayed_end <= snippet.len())
        {
            return Err(ConfigError::EnergyWindows {
                prompt_start: self.prompt_start,
                prompt_end: self.prompt_end,
                delayed_end: self.delayed_end,
                snippet: snippet.len(),
            });
        }
        let kernel = match &self.taps {
            Some(taps) => FilterKernel::new(taps)?,
            None => FilterKernel::rc(self.rc)?,
        };
        Ok(AnalysisConfig {
            polarity: self.polarity,
            threshold: self.threshold,
            half_window: self.half_window,
            snippet,
            cfd: CfdSettings {
                delay: self.cfd_delay,
                factor: self.cfd_factor,
            },
            scale: self.scale,
            max_peaks: self.max_peaks,
            energy: EnergyWindows {
                amplitude: 0..snippet.len(),
                prompt: self.prompt_start..self.prompt_end,
                delayed: self.prompt_end..self.delayed_end,
            },
            kernel,
        })
    }
}

/// Validated configuration of one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub(crate) polarity: Polarity,
    pub(crate) threshold: Real,
    pub(crate) half_window: usize,
    pub(crate) snippet: SnippetRange,
    pub(crate) cfd: CfdSettings,
    pub(crate) scale: Real,
    pub(crate) max_peaks: usize,
    pub(crate) energy: EnergyWindows,
    pub(crate) kernel: FilterKernel,
}

impl AnalysisConfig {
    pub fn max_peaks(&self) -> usize {
        self.max_peaks
    }
}
