use crate::{PulseSpec, SimulationError};

/// `f(t) = coef·(e^{-t/decay} - e^{-t/rise})` for `t >= start`, zero before.
#[derive(Debug, Clone, PartialEq)]
pub struct BiexpPulse {
    start: f64,
    rise: f64,
    decay: f64,
    coef: f64,
    peak_time: f64,
}

impl BiexpPulse {
    /// Builds the pulse described by `spec`, scaled so its extremum equals the signed amplitude.
    pub fn new(spec: &PulseSpec) -> Result<Self, SimulationError> {
        let PulseSpec {
            start,
            amplitude,
            rise,
            decay,
            polarity,
        } = *spec;
        if !(rise > 0.0 && decay > rise && decay.is_finite()) {
            return Err(SimulationError::TimeConstants { rise, decay });
        }
        // f'(t) = 0 at t = ln(decay/rise)·rise·decay/(decay - rise)
        let peak_time = f64::ln(decay / rise) * rise * decay / (decay - rise);
        let peak = f64::exp(-peak_time / decay) - f64::exp(-peak_time / rise);
        Ok(Self {
            start,
            rise,
            decay,
            coef: polarity.sign() * amplitude / peak,
            peak_time,
        })
    }

    /// Time of the extremum, measured from the start of the trace.
    pub fn peak_time(&self) -> f64 {
        self.start + self.peak_time
    }

    pub fn value_at(&self, time: f64) -> f64 {
        if time < self.start {
            return 0.0;
        }
        let time = time - self.start;
        self.coef * (f64::exp(-time / self.decay) - f64::exp(-time / self.rise))
    }
}
