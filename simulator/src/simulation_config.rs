use crate::{BiexpPulse, SimulatedTrace, SimulationError};
use dpsa_common::Sample;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::Deserialize;
use std::{fs::File, io::BufReader, path::Path};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PulsePolarity {
    #[default]
    Negative,
    Positive,
}

impl PulsePolarity {
    pub fn sign(self) -> f64 {
        match self {
            Self::Negative => -1.0,
            Self::Positive => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PulseSpec {
    /// Sample time at which the pulse leaves the pedestal.
    pub start: f64,
    /// Height of the extremum above (or below) the pedestal.
    pub amplitude: f64,
    pub rise: f64,
    pub decay: f64,
    #[serde(default)]
    pub polarity: PulsePolarity,
}

/// Describes every trace of a simulation; each generated trace draws fresh noise.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TraceConfig {
    pub length: usize,
    pub pedestal: f64,
    /// Standard deviation of the Gaussian noise added to each sample.
    pub noise: f64,
    #[serde(default)]
    pub pulses: Vec<PulseSpec>,
}

impl TraceConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, SimulationError> {
        Ok(serde_json::from_reader(BufReader::new(File::open(path)?))?)
    }

    /// Samples the pulses at integer times, adds noise and rounds to the nearest
    /// ADC code, clamping at the rails.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<SimulatedTrace, SimulationError> {
        let pulses = self
            .pulses
            .iter()
            .map(BiexpPulse::new)
            .collect::<Result<Vec<_>, _>>()?;
        let noise = Normal::new(0.0, self.noise)?;

        let samples = (0..self.length)
            .map(|index| {
                let time = index as f64;
                let signal: f64 = pulses.iter().map(|pulse| pulse.value_at(time)).sum();
                let value = self.pedestal + signal + noise.sample(rng);
                value
                    .round()
                    .clamp(f64::from(Sample::MIN), f64::from(Sample::MAX)) as Sample
            })
            .collect();

        Ok(SimulatedTrace {
            pedestal: self.pedestal,
            samples,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    const JSON: &str = r#"{
        "length": 1000,
        "pedestal": 200.0,
        "noise": 0.0,
        "pulses": [
            { "start": 100.0, "amplitude": 300.0, "rise": 2.0, "decay": 20.0 },
            { "start": 500.0, "amplitude": 100.0, "rise": 1.0, "decay": 10.0, "polarity": "positive" }
        ]
    }"#;

    #[test]
    fn parses_json() {
        let config: TraceConfig = serde_json::from_str(JSON).unwrap();
        assert_eq!(config.length, 1000);
        assert_eq!(config.pulses.len(), 2);
        assert_eq!(config.pulses[0].polarity, PulsePolarity::Negative);
        assert_eq!(config.pulses[1].polarity, PulsePolarity::Positive);
    }

    #[test]
    fn noiseless_trace() {
        let config: TraceConfig = serde_json::from_str(JSON).unwrap();
        let trace = config.generate(&mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(trace.samples.len(), 1000);
        assert_eq!(trace.samples[50], 200);
        let minimum = trace.samples[100..200].iter().min().copied().unwrap();
        assert!((-101..=-99).contains(&minimum), "{minimum}");
        let maximum = trace.samples[500..600].iter().max().copied().unwrap();
        assert!((299..=300).contains(&maximum), "{maximum}");
    }

    #[test]
    fn same_seed_same_trace() {
        let config = TraceConfig {
            length: 500,
            pedestal: 0.0,
            noise: 5.0,
            pulses: Vec::new(),
        };
        let first = config.generate(&mut StdRng::seed_from_u64(3)).unwrap();
        let second = config.generate(&mut StdRng::seed_from_u64(3)).unwrap();
        let other = config.generate(&mut StdRng::seed_from_u64(4)).unwrap();
        assert_eq!(first, second);
        assert_ne!(first, other);
    }

    #[test]
    fn clamps_to_the_rails() {
        let config = TraceConfig {
            length: 10,
            pedestal: 0.0,
            noise: 0.0,
            pulses: vec![PulseSpec {
                start: 0.0,
                amplitude: 1e6,
                rise: 1.0,
                decay: 100.0,
                polarity: PulsePolarity::Negative,
            }],
        };
        let trace = config.generate(&mut StdRng::seed_from_u64(0)).unwrap();
        assert!(trace.samples.contains(&Sample::MIN));
    }

    #[test]
    fn negative_noise_is_rejected() {
        let config = TraceConfig {
            length: 10,
            pedestal: 0.0,
            noise: -1.0,
            pulses: Vec::new(),
        };
        assert!(matches!(
            config.generate(&mut StdRng::seed_from_u64(0)),
            Err(SimulationError::Noise(_))
        ));
    }
}
