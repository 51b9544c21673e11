//! RC shaping of the baseline-corrected window and the constant-fraction discriminator derived from it.
use super::{Real, kernel::FilterKernel};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CfdSettings {
    /// Delay, in samples, of the copy the shaped waveform is compared against.
    pub delay: usize,
    /// Attenuation applied to the undelayed shaped waveform.
    pub factor: Real,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ShapedWaveforms {
    pub shaped: Vec<Real>,
    pub cfd: Vec<Real>,
}

impl ShapedWaveforms {
    pub fn new(input: &[Real], kernel: &FilterKernel, scale: Real, settings: &CfdSettings) -> Self {
        let shaped = shape(input, kernel, scale);
        let cfd = discriminate(&shaped, settings);
        Self { shaped, cfd }
    }
}

/// Convolves `input` with the normalised kernel: `Σᵢ input[n-i]·tap[i] / Σtap · scale`.
/// Samples before the start of `input` count as zero.
pub fn shape(input: &[Real], kernel: &FilterKernel, scale: Real) -> Vec<Real> {
    (0..input.len())
        .map(|n| {
            let sum = kernel
                .taps()
                .iter()
                .enumerate()
                .filter_map(|(i, tap)| {
                    n.checked_sub(i)
                        .and_then(|k| input.get(k))
                        .map(|value| value * tap)
                })
                .sum::<Real>();
            sum / kernel.sum() * scale
        })
        .collect()
}

/// `cfd[n] = shaped[n - delay] - factor·shaped[n]`, where samples before the start count as zero.
pub fn discriminate(shaped: &[Real], settings: &CfdSettings) -> Vec<Real> {
    shaped
        .iter()
        .enumerate()
        .map(|(n, value)| {
            let delayed = n
                .checked_sub(settings.delay)
                .and_then(|k| shaped.get(k))
                .copied()
                .unwrap_or_default();
            delayed - settings.factor * value
        })
        .collect()
}
