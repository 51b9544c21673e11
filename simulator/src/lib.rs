//! Synthetic digitiser traces: bi-exponential pulses on a pedestal with Gaussian noise.
mod pulse;
mod simulation_config;
mod trace;

pub use pulse::BiexpPulse;
pub use simulation_config::{PulsePolarity, PulseSpec, TraceConfig};
pub use trace::SimulatedTrace;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Pulse time constants must satisfy 0 < rise < decay, got rise {rise} and decay {decay}")]
    TimeConstants { rise: f64, decay: f64 },
    #[error("Noise: {0}")]
    Noise(#[from] rand_distr::NormalError),
    #[error("Io: {0}")]
    Io(#[from] std::io::Error),
    #[error("Json: {0}")]
    Json(#[from] serde_json::Error),
}
