//! Digital pulse shape analysis of a single raw trace.
//!
//! A trace passes through the following stages:
//! ```text
//! ingest::scan          pedestal removal, threshold crossings -> candidate windows
//!   per candidate, in parallel:
//!   baseline::estimate  local baseline and noise from the window flanks
//!   shaping             RC shaping and the constant-fraction discriminator
//!   peak_finder         peak detection and pileup classification
//!   timing              sub-sample zero-crossing time of the primary peak
//!   energy              amplitude and charges over the snippet around the primary peak
//! record::assemble      cross-candidate merge into the fixed-capacity record array
//! ```
pub mod baseline;
pub(crate) mod detector;
pub mod energy;
pub mod ingest;
pub mod kernel;
pub mod peak_finder;
pub mod record;
pub(crate) mod save_to_file;
pub mod shaping;
pub mod timing;

use crate::parameters::AnalysisConfig;
use baseline::LocalBaseline;
use dpsa_common::Sample;
use energy::Energies;
use ingest::CandidateWindow;
use peak_finder::{PeakSearch, Pileup};
use rayon::prelude::*;
use record::{Assembly, PeakRecord};
use save_to_file::SaveToFileFilter;
use shaping::ShapedWaveforms;
use std::path::Path;

pub type Real = f64;

/// Samples in a standard trace.
pub const DATA_SIZE: usize = 3000;
/// Taps in the shaping filter.
pub const FIR_N: usize = 20;
pub const CFD_DELAY: usize = 10;
pub const CFD_FACTOR: Real = 0.492;
/// Snippet samples before the peak index, also the look-back applied to a crossing.
pub const RANGE_FROM: usize = 50;
/// Snippet samples from the peak index onwards.
pub const RANGE_TO: usize = 300;
pub const HALF_WINDOW: usize = 350;
pub const MAX_PEAKS: usize = 4;

pub use record::{RECORD_FIELDS, RecordArray};

/// The measured quantities of the primary peak of a candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimaryPeak {
    /// Index into the candidate window.
    pub index: usize,
    /// Index into the trace.
    pub absolute_index: isize,
    pub time: Real,
    pub snippet: Vec<Real>,
    pub energies: Energies,
    pub pileup: Pileup,
    /// The snippet reaches outside the trace, so part of it is zero fill.
    pub truncated: bool,
}

/// Everything computed for one candidate window.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateAnalysis {
    pub window: CandidateWindow,
    pub baseline: LocalBaseline,
    pub waveforms: ShapedWaveforms,
    pub peaks: PeakSearch,
    pub primary: Option<PrimaryPeak>,
}

impl CandidateAnalysis {
    pub(crate) fn record(&self, primary: &PrimaryPeak) -> PeakRecord {
        PeakRecord {
            pileup: primary.pileup,
            saturated: false,
            peak_count: self.peaks.peak_count(),
            baseline: self.baseline.baseline,
            noise: self.baseline.noise,
            time: primary.time,
            energies: primary.energies,
        }
    }

    /// Writes the shaped and discriminator waveforms, indexed by trace sample,
    /// to `{stem}_{position}_shaped.csv` and `{stem}_{position}_cfd.csv` in `directory`.
    pub fn save_waveforms(
        &self,
        directory: &Path,
        stem: &str,
        position: usize,
    ) -> Result<(), std::io::Error> {
        let start = self.window.start();
        for (name, waveform) in [("shaped", &self.waveforms.shaped), ("cfd", &self.waveforms.cfd)] {
            waveform
                .iter()
                .enumerate()
                .map(|(offset, value)| (start + offset as isize, value))
                .save_to_file(&directory.join(format!("{stem}_{position}_{name}.csv")))?;
        }
        Ok(())
    }
}

/// The result of analysing one trace.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    /// Candidates in start order.
    pub candidates: Vec<CandidateAnalysis>,
    /// Crossings found after the candidate capacity was reached.
    pub dropped: usize,
    pub assembly: Assembly,
}

impl Analysis {
    pub fn records(&self) -> &RecordArray {
        &self.assembly.records
    }

    /// The candidate each record was built from, paired with the record.
    pub fn record_sources(&self) -> impl Iterator<Item = (&CandidateAnalysis, &PeakRecord)> {
        self.assembly
            .sources
            .iter()
            .filter_map(|&position| self.candidates.get(position))
            .zip(self.assembly.records.records())
    }
}

pub struct PulseShapeAnalyser<'a> {
    config: &'a AnalysisConfig,
}

impl<'a> PulseShapeAnalyser<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Self { config }
    }

    /// Runs the full analysis on `samples`, whose pedestal is `pedestal`.
    #[tracing::instrument(
        skip_all,
        fields(num_samples = samples.len(), num_candidates, num_records)
    )]
    pub fn analyse(&self, samples: &[Sample], pedestal: Real) -> Analysis {
        let ingested = ingest::scan(samples, pedestal, self.config);

        let candidates: Vec<CandidateAnalysis> = ingested
            .candidates
            .par_iter()
            .map(|window| self.analyse_candidate(&ingested.corrected, window))
            .collect();

        let assembly = record::assemble(
            &candidates,
            self.config.max_peaks,
            self.config.half_window,
        );

        tracing::Span::current().record("num_candidates", candidates.len());
        tracing::Span::current().record("num_records", assembly.records.len());
        Analysis {
            candidates,
            dropped: ingested.dropped,
            assembly,
        }
    }

    #[tracing::instrument(
        skip_all,
        level = "trace",
        fields(crossing = window.crossing(), num_peaks)
    )]
    fn analyse_candidate(&self, corrected: &[Real], window: &CandidateWindow) -> CandidateAnalysis {
        let config = self.config;
        let baseline = baseline::estimate(corrected, window);
        let input = baseline::subtract(corrected, window, baseline.baseline);
        let waveforms = ShapedWaveforms::new(&input, &config.kernel, config.scale, &config.cfd);
        let peaks = peak_finder::find_peaks(
            &waveforms,
            config.threshold,
            config.polarity,
            config.half_window,
        );

        let primary = peaks.primary().map(|peak| {
            let snippet = peak_finder::extract_snippet(&input, peak.index, &config.snippet);
            let absolute_index = window.start() + peak.index as isize;
            let first = absolute_index - config.snippet.from as isize;
            let end = absolute_index + config.snippet.to as isize;
            PrimaryPeak {
                index: peak.index,
                absolute_index,
                time: timing::pulse_time(
                    &waveforms.cfd,
                    peak.index,
                    config.polarity,
                    window.start(),
                ),
                energies: energy::integrate(&snippet, &config.energy, config.polarity),
                pileup: peak.pileup,
                truncated: first < 0 || end > corrected.len() as isize,
                snippet,
            }
        });

        tracing::Span::current().record("num_peaks", peaks.peak_count());
        CandidateAnalysis {
            window: *window,
            baseline,
            waveforms,
            peaks,
            primary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::{DetectorParameters, Polarity};
    use assert_approx_eq::assert_approx_eq;
    use rand::{SeedableRng, rngs::StdRng};
    use trace_simulator::{PulsePolarity, PulseSpec, TraceConfig};

    const PEDESTAL: Real = 1000.0;

    fn simulate(starts: &[Real], seed: u64) -> Vec<Sample> {
        simulate_with_polarity(starts, seed, PulsePolarity::Negative)
    }

    fn simulate_with_polarity(starts: &[Real], seed: u64, polarity: PulsePolarity) -> Vec<Sample> {
        let config = TraceConfig {
            length: DATA_SIZE,
            pedestal: PEDESTAL,
            noise: 1.0,
            pulses: starts
                .iter()
                .map(|&start| PulseSpec {
                    start,
                    amplitude: 1000.0,
                    rise: 2.0,
                    decay: 20.0,
                    polarity,
                })
                .collect(),
        };
        config
            .generate(&mut StdRng::seed_from_u64(seed))
            .unwrap()
            .samples
    }

    fn default_config() -> AnalysisConfig {
        DetectorParameters::default().to_config().unwrap()
    }

    #[test]
    fn flat_trace_gives_empty_records() {
        let config = default_config();
        let analysis = PulseShapeAnalyser::new(&config).analyse(&[1000; DATA_SIZE], PEDESTAL);
        assert!(analysis.candidates.is_empty());
        assert!(analysis.records().is_empty());
        assert_eq!(
            analysis.records().to_flat(),
            vec![0.0; MAX_PEAKS * RECORD_FIELDS]
        );
    }

    #[test]
    fn single_pulse() {
        let config = default_config();
        let samples = simulate(&[1000.0], 1);
        let analysis = PulseShapeAnalyser::new(&config).analyse(&samples, PEDESTAL - 10.0);

        assert_eq!(analysis.candidates.len(), 1);
        assert_eq!(analysis.records().len(), 1);
        let record = analysis.records().records()[0];
        assert!(record.pileup.is_none());
        assert!(!record.saturated);
        assert_eq!(record.peak_count, 1);
        assert_approx_eq!(record.baseline, 10.0, 0.5);
        assert!(record.noise < 2.0);
        assert!(record.time > 1000.0 && record.time < 1040.0, "{}", record.time);
        assert!(record.energies.max_amplitude > 950.0 && record.energies.max_amplitude < 1050.0);
        assert!(record.energies.charge_prompt > 0.0);
        assert!(record.energies.charge_delayed > 0.0);
        assert_eq!(
            record.energies.charge_total,
            record.energies.charge_prompt + record.energies.charge_delayed
        );

        assert!(analysis.candidates[0].primary.as_ref().is_some_and(|p| !p.truncated));

        let flat = analysis.records().to_flat();
        assert_eq!(flat.len(), MAX_PEAKS * RECORD_FIELDS);
        assert!(flat[RECORD_FIELDS..].iter().all(|&field| field == 0.0));
    }

    #[test]
    fn analysis_is_deterministic() {
        let config = default_config();
        let samples = simulate(&[600.0, 1100.0, 2200.0], 2);
        let analyser = PulseShapeAnalyser::new(&config);
        assert_eq!(analyser.analyse(&samples, PEDESTAL), analyser.analyse(&samples, PEDESTAL));
    }

    #[test]
    fn separated_pulses_give_separate_records() {
        let config = default_config();
        let samples = simulate(&[1000.0, 2000.0], 3);
        let analysis = PulseShapeAnalyser::new(&config).analyse(&samples, PEDESTAL);

        let records = analysis.records().records();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|record| record.pileup.is_none()));
        assert!(records[0].time < records[1].time);
        assert_approx_eq!(records[1].time - records[0].time, 1000.0, 1.0);
    }

    #[test]
    fn close_pulses_are_piled_up() {
        let config = default_config();
        let samples = simulate(&[1000.0, 1150.0], 4);
        let analysis = PulseShapeAnalyser::new(&config).analyse(&samples, PEDESTAL);

        assert_eq!(analysis.candidates.len(), 2);
        assert_eq!(analysis.records().len(), 1);
        let record = analysis.records().records()[0];
        assert!(record.pileup.contains(Pileup::RIGHT));
        assert!(record.time < 1100.0);
    }

    #[test]
    fn pulse_near_the_end_of_the_trace() {
        let config = default_config();
        let samples = simulate(&[2700.0], 5);
        let analysis = PulseShapeAnalyser::new(&config).analyse(&samples, PEDESTAL);

        assert_eq!(analysis.records().len(), 1);
        let record = analysis.records().records()[0];
        assert_approx_eq!(record.baseline, 0.0, 0.5);
        assert!(record.time > 2700.0 && record.time < 2740.0);
        assert!(analysis.candidates[0].primary.as_ref().is_some_and(|p| p.truncated));
    }

    #[test]
    fn pulse_at_the_start_of_the_trace() {
        let config = default_config();
        let samples = simulate(&[0.0], 8);
        let analysis = PulseShapeAnalyser::new(&config).analyse(&samples, PEDESTAL);

        assert_eq!(analysis.candidates.len(), 1);
        assert!(analysis.candidates[0].window.start() < 0);
        assert_eq!(analysis.records().len(), 1);
        let record = analysis.records().records()[0];
        assert!(record.pileup.is_none());
        assert_approx_eq!(record.baseline, 0.0, 0.5);
        assert!(record.time > 0.0 && record.time < 40.0, "{}", record.time);
        assert!(analysis.candidates[0].primary.as_ref().is_some_and(|p| p.truncated));
    }

    #[test]
    fn pulse_running_off_the_end_is_truncated() {
        let config = default_config();
        let samples = simulate(&[2990.0], 9);
        let analysis = PulseShapeAnalyser::new(&config).analyse(&samples, PEDESTAL);

        let (candidate, _) = analysis.record_sources().next().unwrap();
        assert!(candidate.primary.as_ref().is_some_and(|p| p.truncated));
    }

    #[test]
    fn positive_pulse() {
        let parameters = DetectorParameters {
            polarity: Polarity::Positive,
            threshold: 211.346_531_036_437_51,
            ..Default::default()
        };
        let config = parameters.to_config().unwrap();
        let samples = simulate_with_polarity(&[1000.0], 10, PulsePolarity::Positive);
        let analysis = PulseShapeAnalyser::new(&config).analyse(&samples, PEDESTAL);

        assert_eq!(analysis.records().len(), 1);
        let record = analysis.records().records()[0];
        assert!(record.pileup.is_none());
        assert!(record.time > 1000.0 && record.time < 1040.0, "{}", record.time);
        assert!(record.energies.max_amplitude > 950.0 && record.energies.max_amplitude < 1050.0);
        assert!(record.energies.charge_prompt > 0.0);
        assert!(record.energies.charge_delayed > 0.0);
    }

    #[test]
    fn crossings_beyond_capacity_are_dropped() {
        let mut parameters = DetectorParameters::default();
        parameters.max_peaks = 2;
        let config = parameters.to_config().unwrap();
        let samples = simulate(&[500.0, 1300.0, 2100.0], 6);
        let analysis = PulseShapeAnalyser::new(&config).analyse(&samples, PEDESTAL);

        assert_eq!(analysis.dropped, 1);
        assert_eq!(analysis.records().len(), 2);
        assert_eq!(analysis.records().to_flat().len(), 2 * RECORD_FIELDS);
    }

    #[test]
    fn record_sources_pair_candidates_with_records() {
        let config = default_config();
        let samples = simulate(&[1000.0, 1150.0, 2200.0], 7);
        let analysis = PulseShapeAnalyser::new(&config).analyse(&samples, PEDESTAL);

        let pairs: Vec<_> = analysis.record_sources().collect();
        assert_eq!(pairs.len(), analysis.records().len());
        for (candidate, record) in pairs {
            let primary = candidate.primary.as_ref().unwrap();
            assert_eq!(record.time, primary.time);
        }
    }
}
