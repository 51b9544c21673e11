use super::{Real, ingest::CandidateWindow};

/// Running sums over one flank of a candidate window.
#[derive(Default, Clone, Copy, Debug, PartialEq)]
struct FlankStats {
    count: usize,
    sum: Real,
    sum_of_squares: Real,
}

impl FlankStats {
    fn accumulate(values: impl Iterator<Item = Real>) -> Self {
        values.fold(Self::default(), |stats, value| Self {
            count: stats.count + 1,
            sum: stats.sum + value,
            sum_of_squares: stats.sum_of_squares + value * value,
        })
    }

    fn combine(&self, other: &Self) -> Self {
        Self {
            count: self.count + other.count,
            sum: self.sum + other.sum,
            sum_of_squares: self.sum_of_squares + other.sum_of_squares,
        }
    }

    fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn estimate(&self) -> LocalBaseline {
        if self.is_empty() {
            return LocalBaseline::default();
        }
        let count = self.count as Real;
        let mean = self.sum / count;
        // Rounding can push the variance of a flat flank just below zero.
        let variance = (self.sum_of_squares / count - mean * mean).max(0.0);
        LocalBaseline {
            baseline: mean,
            noise: variance.sqrt(),
        }
    }
}

/// The pedestal level local to a candidate, and the noise about it.
#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub struct LocalBaseline {
    pub baseline: Real,
    /// Population standard deviation of the samples the baseline was taken from.
    pub noise: Real,
}

/// Estimates the local baseline of `window` from its two flanks.
///
/// When both flanks have samples, the quieter flank is taken as the reference. If the
/// other flank's mean lies within three reference sigmas of the reference mean, both
/// flanks are pooled; otherwise the other flank is assumed to contain another pulse and
/// only the reference flank is used.
pub fn estimate(corrected: &[Real], window: &CandidateWindow) -> LocalBaseline {
    let left = FlankStats::accumulate(window.values_in(corrected, window.left_flank()));
    let right = FlankStats::accumulate(window.values_in(corrected, window.right_flank()));

    match (left.is_empty(), right.is_empty()) {
        (false, false) => {
            let (left_estimate, right_estimate) = (left.estimate(), right.estimate());
            let (reference, other) = if left_estimate.noise < right_estimate.noise {
                (left_estimate, right_estimate)
            } else {
                (right_estimate, left_estimate)
            };
            if (other.baseline - reference.baseline).abs() < 3.0 * reference.noise {
                left.combine(&right).estimate()
            } else {
                reference
            }
        }
        (false, true) => left.estimate(),
        (true, false) => right.estimate(),
        (true, true) => LocalBaseline::default(),
    }
}

/// The `3·W` samples of `window` with `baseline` removed.
/// Offsets outside the trace are filled with zero, i.e. assumed to sit on the baseline.
pub fn subtract(corrected: &[Real], window: &CandidateWindow, baseline: Real) -> Vec<Real> {
    (0..window.len())
        .map(|offset| {
            window
                .trace_index(offset, corrected.len())
                .and_then(|index| corrected.get(index))
                .map(|value| value - baseline)
                .unwrap_or_default()
        })
        .collect()
}
