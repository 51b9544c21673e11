//! The single pass over the raw trace which removes the pedestal and opens candidate windows.
use super::{
    Real,
    detector::{Detector, EventFilter},
};
use crate::parameters::{AnalysisConfig, Polarity};
use dpsa_common::Sample;
use std::ops::Range;

/// A region of `3·W` samples around a threshold crossing.
///
/// The window is split into the left baseline flank `[0, W)`, the pulse core `[W, 2W)`
/// and the right baseline flank `[2W, 3W)`. Its start may precede the trace, or its end
/// may run past it, so all access goes through [CandidateWindow::trace_index].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateWindow {
    crossing: usize,
    start: isize,
    half_window: usize,
}

impl CandidateWindow {
    pub(crate) fn new(crossing: usize, half_window: usize, look_back: usize) -> Self {
        Self {
            crossing,
            start: crossing as isize - (half_window + look_back) as isize,
            half_window,
        }
    }

    /// The trace index of the sample which opened the window.
    pub fn crossing(&self) -> usize {
        self.crossing
    }

    /// The (possibly negative) trace index of the first sample of the window.
    pub fn start(&self) -> isize {
        self.start
    }

    pub fn len(&self) -> usize {
        3 * self.half_window
    }

    pub fn is_empty(&self) -> bool {
        self.half_window == 0
    }

    pub fn left_flank(&self) -> Range<usize> {
        0..self.half_window
    }

    pub fn right_flank(&self) -> Range<usize> {
        2 * self.half_window..3 * self.half_window
    }

    /// Maps a window offset to a trace index, if the offset lands inside a trace of length `trace_len`.
    pub fn trace_index(&self, offset: usize, trace_len: usize) -> Option<usize> {
        let index = self.start.checked_add_unsigned(offset)?;
        usize::try_from(index).ok().filter(|&index| index < trace_len)
    }

    /// The values of `trace` at the window offsets in `offsets`, omitting those outside the trace.
    pub fn values_in<'a>(
        &self,
        trace: &'a [Real],
        offsets: Range<usize>,
    ) -> impl Iterator<Item = Real> + 'a {
        let window = *self;
        offsets.filter_map(move |offset| {
            window
                .trace_index(offset, trace.len())
                .and_then(|index| trace.get(index).copied())
        })
    }
}

/// Opens a candidate on the first sample of each excursion past the threshold.
///
/// An open candidate blocks new ones until the excursion returns, or until
/// more than `max_span` samples have passed since it opened.
#[derive(Clone)]
pub(crate) struct CrossingDetector {
    threshold: Real,
    polarity: Polarity,
    half_window: usize,
    look_back: usize,
    max_span: usize,
    opened: Option<usize>,
}

impl CrossingDetector {
    pub(crate) fn new(config: &AnalysisConfig) -> Self {
        Self {
            threshold: config.threshold,
            polarity: config.polarity,
            half_window: config.half_window,
            look_back: config.snippet.from,
            max_span: 3 * config.half_window,
            opened: None,
        }
    }
}

impl Detector for CrossingDetector {
    type Value = Real;
    type Event = CandidateWindow;

    fn signal(&mut self, index: usize, value: Real) -> Option<CandidateWindow> {
        let past = self.polarity.reaches(value, self.threshold);
        if let Some(opened) = self.opened {
            if past && index - opened <= self.max_span {
                return None;
            }
            self.opened = None;
        }
        past.then(|| {
            self.opened = Some(index);
            CandidateWindow::new(index, self.half_window, self.look_back)
        })
    }
}

/// The pedestal-corrected trace and the candidate windows found in it.
#[derive(Debug, Default, Clone)]
pub struct IngestedTrace {
    pub corrected: Vec<Real>,
    pub candidates: Vec<CandidateWindow>,
    /// Crossings found after the candidate capacity was reached.
    pub dropped: usize,
}

/// Subtracts `pedestal` from every sample and scans for threshold crossings, in one pass.
#[tracing::instrument(skip_all, level = "trace", fields(num_candidates, num_dropped))]
pub fn scan(samples: &[Sample], pedestal: Real, config: &AnalysisConfig) -> IngestedTrace {
    let mut corrected = Vec::with_capacity(samples.len());
    let mut candidates = Vec::with_capacity(config.max_peaks);
    let mut dropped = 0;

    let crossings = samples
        .iter()
        .map(|&raw| Real::from(raw) - pedestal)
        .inspect(|&value| corrected.push(value))
        .enumerate()
        .events(CrossingDetector::new(config));

    for candidate in crossings {
        if candidates.len() < config.max_peaks {
            candidates.push(candidate);
        } else {
            dropped += 1;
        }
    }

    tracing::Span::current().record("num_candidates", candidates.len());
    tracing::Span::current().record("num_dropped", dropped);
    IngestedTrace {
        corrected,
        candidates,
        dropped,
    }
}
