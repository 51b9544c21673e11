//! Digital pulse shape analysis of digitised detector traces.
//!
//! [pulse_detection::PulseShapeAnalyser] turns one raw trace into a fixed-capacity
//! array of pulse records: pileup flags, local baseline and noise, sub-sample time,
//! amplitude and charges.
pub mod calibration;
pub mod loader;
pub mod parameters;
pub mod pulse_detection;

pub use parameters::{AnalysisConfig, ConfigError, DetectorParameters, Polarity};
pub use pulse_detection::{Analysis, PulseShapeAnalyser, Real, RecordArray};
