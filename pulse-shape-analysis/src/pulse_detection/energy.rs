use super::{HALF_WINDOW, RANGE_FROM, RANGE_TO, Real};
use crate::parameters::Polarity;
use std::ops::Range;

/// Where within the energy snippet each energy estimate is taken.
///
/// The prompt and delayed windows are contiguous, splitting the charge into fast and slow
/// components of the pulse shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnergyWindows {
    pub amplitude: Range<usize>,
    pub prompt: Range<usize>,
    pub delayed: Range<usize>,
}

impl Default for EnergyWindows {
    fn default() -> Self {
        Self {
            amplitude: 0..HALF_WINDOW,
            prompt: 30..RANGE_FROM + 20,
            delayed: RANGE_FROM + 20..RANGE_TO,
        }
    }
}

#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub struct Energies {
    pub max_amplitude: Real,
    pub charge_total: Real,
    pub charge_prompt: Real,
    pub charge_delayed: Real,
}

/// Computes the amplitude and charges of a snippet, sign-corrected so a pulse of
/// either polarity gives positive values.
pub fn integrate(snippet: &[Real], windows: &EnergyWindows, polarity: Polarity) -> Energies {
    let sign = polarity.sign();
    let signed = |range: &Range<usize>| {
        snippet
            .get(range.clone())
            .unwrap_or_default()
            .iter()
            .map(move |value| sign * value)
    };

    let max_amplitude = signed(&windows.amplitude).fold(0.0, Real::max);
    let charge_prompt = signed(&windows.prompt).sum::<Real>();
    let charge_delayed = signed(&windows.delayed).sum::<Real>();
    Energies {
        max_amplitude,
        charge_total: charge_prompt + charge_delayed,
        charge_prompt,
        charge_delayed,
    }
}
