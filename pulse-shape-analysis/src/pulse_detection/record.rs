//! Packs analysed candidates into the fixed-capacity output record array.
use super::{CandidateAnalysis, Real, energy::Energies, peak_finder::Pileup};

/// The number of numeric fields in a [PeakRecord].
pub const RECORD_FIELDS: usize = 10;

/// One pulse, in the field order of [PeakRecord::fields].
#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub struct PeakRecord {
    pub pileup: Pileup,
    /// Never set by the analysis itself, see [crate::calibration::mark_saturated].
    pub saturated: bool,
    /// The number of accepted peaks in the candidate window the record came from.
    pub peak_count: usize,
    pub baseline: Real,
    pub noise: Real,
    /// Sub-sample pulse time, in samples from the start of the trace.
    pub time: Real,
    pub energies: Energies,
}

impl PeakRecord {
    pub fn fields(&self) -> [Real; RECORD_FIELDS] {
        [
            Real::from(self.pileup.bits()),
            if self.saturated { 1.0 } else { 0.0 },
            self.peak_count as Real,
            self.baseline,
            self.noise,
            self.time,
            self.energies.max_amplitude,
            self.energies.charge_total,
            self.energies.charge_prompt,
            self.energies.charge_delayed,
        ]
    }
}

/// At most `capacity` records; the slots past the last record read as all-zero.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordArray {
    capacity: usize,
    records: Vec<PeakRecord>,
}

impl RecordArray {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            records: Vec::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Appends `record` unless the array is full, reporting whether it was stored.
    pub fn push(&mut self, record: PeakRecord) -> bool {
        if self.records.len() < self.capacity {
            self.records.push(record);
            true
        } else {
            false
        }
    }

    pub fn records(&self) -> &[PeakRecord] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [PeakRecord] {
        &mut self.records
    }

    /// Every slot up to the capacity, with zero-filled padding after the records.
    pub fn slots(&self) -> impl Iterator<Item = [Real; RECORD_FIELDS]> + '_ {
        self.records
            .iter()
            .map(PeakRecord::fields)
            .chain(std::iter::repeat([0.0; RECORD_FIELDS]))
            .take(self.capacity)
    }

    /// The flat `capacity × RECORD_FIELDS` output array.
    pub fn to_flat(&self) -> Vec<Real> {
        self.slots().flatten().collect()
    }
}

/// The records retained from a set of candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct Assembly {
    pub records: RecordArray,
    /// For each record, the position of the candidate it was built from.
    pub sources: Vec<usize>,
    /// Candidates folded into an earlier record as pileup.
    pub merged: usize,
    /// Candidates in which no primary peak was accepted.
    pub without_primary: usize,
}

/// Builds the record array from candidates given in start order.
///
/// A candidate whose primary peak lies within `half_window` samples of the primary peak
/// of the last retained record is not emitted; the retained record is marked with
/// [Pileup::RIGHT] instead.
pub fn assemble(candidates: &[CandidateAnalysis], capacity: usize, half_window: usize) -> Assembly {
    let mut records = RecordArray::new(capacity);
    let mut sources = Vec::with_capacity(capacity);
    let mut merged = 0;
    let mut without_primary = 0;
    let mut last_primary: Option<isize> = None;

    for (position, candidate) in candidates.iter().enumerate() {
        let Some(primary) = &candidate.primary else {
            without_primary += 1;
            continue;
        };
        let piled_up = last_primary
            .is_some_and(|last| primary.absolute_index.abs_diff(last) < half_window);
        if piled_up {
            if let Some(record) = records.records.last_mut() {
                record.pileup |= Pileup::RIGHT;
            }
            merged += 1;
        } else if records.push(candidate.record(primary)) {
            sources.push(position);
            last_primary = Some(primary.absolute_index);
        }
    }
    Assembly {
        records,
        sources,
        merged,
        without_primary,
    }
}
