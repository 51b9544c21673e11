//! Finds peaks in the shaped waveform and classifies pileup.
use super::{
    Real,
    detector::{Detector, EventFilter},
    shaping::ShapedWaveforms,
};
use crate::parameters::Polarity;
use std::{
    fmt::Display,
    ops::{BitOr, BitOrAssign},
};

/// Bitmask recording on which side of a peak another pulse was found too close to it.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pileup(u8);

impl Pileup {
    pub const NONE: Self = Self(0);
    /// Another accepted peak precedes this one within the same candidate window.
    pub const LEFT: Self = Self(1);
    /// A later peak followed this one by less than the half window and was discarded.
    pub const RIGHT: Self = Self(2);

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Pileup {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Pileup {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0
    }
}

impl Display for Pileup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The extent of the energy snippet either side of a peak index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnippetRange {
    /// Samples taken before the peak index.
    pub from: usize,
    /// Samples taken from the peak index onwards.
    pub to: usize,
}

impl SnippetRange {
    pub fn len(&self) -> usize {
        self.from + self.to
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Registers an index when the shaped waveform is past the threshold and the
/// discriminator has the pulse's sign. Further indices are ignored until the shaped
/// waveform drops back, so ringing on the discriminator does not retrigger.
#[derive(Clone)]
pub(crate) struct PeakDetector {
    threshold: Real,
    polarity: Polarity,
    detecting: bool,
}

impl PeakDetector {
    pub(crate) fn new(threshold: Real, polarity: Polarity) -> Self {
        Self {
            threshold,
            polarity,
            detecting: false,
        }
    }
}

impl Detector for PeakDetector {
    type Value = (Real, Real);
    type Event = usize;

    fn signal(&mut self, index: usize, (shaped, cfd): (Real, Real)) -> Option<usize> {
        if !self.polarity.exceeds(shaped, self.threshold) {
            self.detecting = false;
            return None;
        }
        if self.detecting || self.polarity.sign() * cfd <= 0.0 {
            return None;
        }
        self.detecting = true;
        Some(index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptedPeak {
    /// Index into the candidate window.
    pub index: usize,
    pub pileup: Pileup,
}

/// The peaks accepted in one candidate window, in detection order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PeakSearch {
    pub accepted: Vec<AcceptedPeak>,
    /// Position in `accepted` of the first peak in or after the pulse core.
    primary: Option<usize>,
}

impl PeakSearch {
    pub fn primary(&self) -> Option<&AcceptedPeak> {
        self.primary.and_then(|position| self.accepted.get(position))
    }

    pub fn peak_count(&self) -> usize {
        self.accepted.len()
    }
}

/// Scans the shaped/discriminator pair of one candidate window.
///
/// A detection closer than `half_window` to the last accepted peak is discarded and
/// marks that peak with [Pileup::RIGHT]. The primary peak is the first accepted peak at
/// or after the pulse core; it is marked with [Pileup::LEFT] if an accepted peak precedes it.
pub fn find_peaks(
    waveforms: &ShapedWaveforms,
    threshold: Real,
    polarity: Polarity,
    half_window: usize,
) -> PeakSearch {
    let mut accepted = Vec::<AcceptedPeak>::new();

    let detections = waveforms
        .shaped
        .iter()
        .copied()
        .zip(waveforms.cfd.iter().copied())
        .enumerate()
        .events(PeakDetector::new(threshold, polarity));

    for index in detections {
        match accepted.last_mut() {
            Some(last) if index - last.index < half_window => last.pileup |= Pileup::RIGHT,
            _ => accepted.push(AcceptedPeak {
                index,
                pileup: Pileup::NONE,
            }),
        }
    }

    let primary = accepted.iter().position(|peak| peak.index >= half_window);
    if let Some(peak) = primary
        .filter(|&position| position > 0)
        .and_then(|position| accepted.get_mut(position))
    {
        peak.pileup |= Pileup::LEFT;
    }
    PeakSearch { accepted, primary }
}

/// Copies `[index - range.from, index + range.to)` out of `window`, zero-filling
/// any part that falls outside it.
pub fn extract_snippet(window: &[Real], index: usize, range: &SnippetRange) -> Vec<Real> {
    (0..range.len())
        .map(|k| {
            (index + k)
                .checked_sub(range.from)
                .and_then(|offset| window.get(offset))
                .copied()
                .unwrap_or_default()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A negative pulse in the shaped waveform, with the discriminator turning
    /// negative two samples after the threshold is passed.
    fn pulse_at(shaped: &mut [Real], cfd: &mut [Real], start: usize) {
        let shape = [-5.0, -30.0, -60.0, -80.0, -60.0, -30.0, -5.0];
        let discriminator = [2.0, 10.0, -5.0, -20.0, -30.0, -20.0, -5.0];
        shaped[start..start + shape.len()].copy_from_slice(&shape);
        cfd[start..start + discriminator.len()].copy_from_slice(&discriminator);
    }

    fn waveforms(len: usize, starts: &[usize]) -> ShapedWaveforms {
        let mut shaped = vec![0.0; len];
        let mut cfd = vec![0.0; len];
        for &start in starts {
            pulse_at(&mut shaped, &mut cfd, start);
        }
        ShapedWaveforms { shaped, cfd }
    }

    #[test]
    fn single_peak() {
        let search = find_peaks(&waveforms(60, &[25]), -20.0, Polarity::Negative, 10);
        assert_eq!(
            search.accepted,
            vec![AcceptedPeak {
                index: 27,
                pileup: Pileup::NONE
            }]
        );
        assert_eq!(search.primary().map(|peak| peak.index), Some(27));
        assert_eq!(search.peak_count(), 1);
    }

    #[test]
    fn ringing_does_not_retrigger() {
        let mut waveforms = waveforms(60, &[25]);
        // The discriminator flips back and forth while the shaped pulse stays past threshold.
        waveforms.cfd[29] = 4.0;
        waveforms.cfd[30] = -4.0;
        let search = find_peaks(&waveforms, -20.0, Polarity::Negative, 10);
        assert_eq!(search.peak_count(), 1);
    }

    #[test]
    fn close_peaks_are_piled_up() {
        let search = find_peaks(&waveforms(60, &[15, 23]), -20.0, Polarity::Negative, 10);
        assert_eq!(
            search.accepted,
            vec![AcceptedPeak {
                index: 17,
                pileup: Pileup::RIGHT
            }]
        );
        assert!(search.primary().is_some_and(|peak| peak.pileup == Pileup::RIGHT));
    }

    #[test]
    fn separated_peaks_are_both_accepted() {
        let search = find_peaks(&waveforms(60, &[15, 35]), -20.0, Polarity::Negative, 10);
        let indices: Vec<_> = search.accepted.iter().map(|peak| peak.index).collect();
        assert_eq!(indices, vec![17, 37]);
        assert!(search.accepted.iter().all(|peak| peak.pileup.is_none()));
        assert_eq!(search.primary().map(|peak| peak.index), Some(17));
    }

    #[test]
    fn peak_in_left_flank_marks_primary() {
        let search = find_peaks(&waveforms(60, &[1, 20]), -20.0, Polarity::Negative, 10);
        let primary = search.primary().unwrap();
        assert_eq!(primary.index, 22);
        assert_eq!(primary.pileup, Pileup::LEFT);
        assert_eq!(search.peak_count(), 2);
    }

    #[test]
    fn no_primary_before_the_core() {
        let search = find_peaks(&waveforms(60, &[1]), -20.0, Polarity::Negative, 10);
        assert_eq!(search.peak_count(), 1);
        assert!(search.primary().is_none());
    }

    #[test]
    fn positive_polarity() {
        let mut waveforms = waveforms(60, &[25]);
        waveforms.shaped.iter_mut().for_each(|value| *value = -*value);
        waveforms.cfd.iter_mut().for_each(|value| *value = -*value);
        let search = find_peaks(&waveforms, 20.0, Polarity::Positive, 10);
        assert_eq!(search.primary().map(|peak| peak.index), Some(27));
    }

    #[test]
    fn pileup_bits_are_independent() {
        let both = Pileup::LEFT | Pileup::RIGHT;
        assert_eq!(both.bits(), 3);
        assert!(both.contains(Pileup::LEFT));
        assert!(both.contains(Pileup::RIGHT));
        assert!(!Pileup::RIGHT.contains(Pileup::LEFT));
        assert!(Pileup::NONE.is_none());
    }

    #[test]
    fn snippet_is_zero_filled_at_the_edges() {
        let window: Vec<Real> = (0..10).map(Real::from).collect();
        let range = SnippetRange { from: 3, to: 4 };
        assert_eq!(
            extract_snippet(&window, 5, &range),
            vec![2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]
        );
        assert_eq!(
            extract_snippet(&window, 1, &range),
            vec![0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 4.0]
        );
        assert_eq!(
            extract_snippet(&window, 8, &range),
            vec![5.0, 6.0, 7.0, 8.0, 9.0, 0.0, 0.0]
        );
    }
}
