//! Conversion of records into physical units, and saturation flagging.
use crate::pulse_detection::{
    Analysis, Real, RecordArray, energy::Energies, ingest::CandidateWindow, record::PeakRecord,
};
use clap::Args;
use dpsa_common::{ADC_LEVELS, ADC_RAILS, Sample};

/// The digitiser settings needed to express a record in physical units.
#[derive(Debug, Clone, PartialEq, Args)]
pub struct Calibration {
    /// Input range of the digitiser, spanning all ADC codes.
    #[clap(long, default_value_t = 1000.0)]
    pub full_scale: Real,

    /// Offset subtracted from the calibrated baseline.
    #[clap(long, allow_hyphen_values = true, default_value_t = 0.0)]
    pub offset: Real,

    #[clap(long, default_value_t = 1.0)]
    pub sample_period: Real,

    /// Time between the start of the trace and the trigger.
    #[clap(long, allow_hyphen_values = true, default_value_t = 0.0)]
    pub pretrigger_delay: Real,
}

impl Calibration {
    fn scale(&self) -> Real {
        self.full_scale / ADC_LEVELS
    }

    /// `record` in physical units, given the pedestal its baseline is relative to.
    pub fn apply(&self, record: &PeakRecord, pedestal: Real) -> PeakRecord {
        let scale = self.scale();
        let charge_prompt = record.energies.charge_prompt * scale;
        let charge_delayed = record.energies.charge_delayed * scale;
        PeakRecord {
            baseline: (record.baseline + pedestal) * scale - self.offset,
            noise: record.noise * scale,
            time: record.time * self.sample_period - self.pretrigger_delay,
            energies: Energies {
                max_amplitude: record.energies.max_amplitude * scale,
                charge_total: charge_prompt + charge_delayed,
                charge_prompt,
                charge_delayed,
            },
            ..*record
        }
    }

    pub fn apply_all(&self, records: &RecordArray, pedestal: Real) -> RecordArray {
        let mut calibrated = RecordArray::new(records.capacity());
        for record in records.records() {
            calibrated.push(self.apply(record, pedestal));
        }
        calibrated
    }
}

fn touches_rails(samples: &[Sample], window: &CandidateWindow) -> bool {
    (0..window.len())
        .filter_map(|offset| window.trace_index(offset, samples.len()))
        .filter_map(|index| samples.get(index))
        .any(|&sample| sample == ADC_RAILS.0 || sample == ADC_RAILS.1)
}

/// Sets the saturation flag of every record whose candidate window contains a raw sample at the ADC rails.
pub fn mark_saturated(analysis: &mut Analysis, samples: &[Sample]) {
    let assembly = &mut analysis.assembly;
    for (slot, &position) in assembly.sources.iter().enumerate() {
        let Some(candidate) = analysis.candidates.get(position) else {
            continue;
        };
        if let Some(record) = assembly.records.records_mut().get_mut(slot) {
            record.saturated = touches_rails(samples, &candidate.window);
        }
    }
}
