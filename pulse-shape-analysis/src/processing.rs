use anyhow::Context;
use dpsa_common::metrics::{
    dropped_candidates::{self, DropReason},
    failures::{self, FailureKind},
    metric_names::{
        CANDIDATES_DROPPED, CANDIDATES_FOUND, FAILURES, PILEUP_FLAGGED, RECORDS_EMITTED,
        RECORDS_TRUNCATED, TRACES_PROCESSED,
    },
};
use metrics::counter;
use pulse_shape_analysis::{
    Analysis, AnalysisConfig, PulseShapeAnalyser, Real,
    calibration::{self, Calibration},
    loader::{TraceFile, TraceFileError},
    pulse_detection::RECORD_FIELDS,
};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

const CSV_HEADER: &str = "file,slot,pileup,saturation,peak_count,baseline,noise,time,max_amplitude,charge_total,charge_prompt,charge_delayed";

pub(crate) struct ProcessingOptions<'a> {
    /// Overrides any pedestal recorded in the trace files.
    pub(crate) pedestal: Option<Real>,
    pub(crate) save_path: Option<&'a Path>,
    pub(crate) calibration: Option<&'a Calibration>,
}

/// The output slots of one trace file, padding included.
pub(crate) type FileRecords = Vec<[Real; RECORD_FIELDS]>;

fn failure_kind(error: &TraceFileError) -> FailureKind {
    match error {
        TraceFileError::Io { .. } => FailureKind::TraceFileUnreadable,
        _ => FailureKind::TraceFileMalformed,
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "trace".to_owned())
}

fn record_metrics(analysis: &Analysis) {
    counter!(TRACES_PROCESSED).increment(1);
    counter!(CANDIDATES_FOUND).increment((analysis.candidates.len() + analysis.dropped) as u64);
    for (reason, count) in [
        (DropReason::OverCapacity, analysis.dropped),
        (DropReason::NoPrimaryPeak, analysis.assembly.without_primary),
        (DropReason::MergedIntoEarlier, analysis.assembly.merged),
    ] {
        if count > 0 {
            counter!(CANDIDATES_DROPPED, &[dropped_candidates::get_label(reason)])
                .increment(count as u64);
        }
    }
    let records = analysis.records().records();
    counter!(RECORDS_EMITTED).increment(records.len() as u64);
    counter!(PILEUP_FLAGGED)
        .increment(records.iter().filter(|record| !record.pileup.is_none()).count() as u64);
    counter!(RECORDS_TRUNCATED).increment(
        analysis
            .record_sources()
            .filter(|(candidate, _)| candidate.primary.as_ref().is_some_and(|peak| peak.truncated))
            .count() as u64,
    );
}

#[tracing::instrument(skip_all, fields(file = %path.display(), num_records))]
pub(crate) fn process_file(
    path: &Path,
    config: &AnalysisConfig,
    options: &ProcessingOptions,
) -> anyhow::Result<FileRecords> {
    let trace = TraceFile::load(path).inspect_err(|error| {
        counter!(FAILURES, &[failures::get_label(failure_kind(error))]).increment(1);
    })?;

    let pedestal = match options.pedestal.or(trace.pedestal) {
        Some(pedestal) => pedestal,
        None => {
            warn!("No pedestal given for {}, assuming zero", path.display());
            0.0
        }
    };

    let mut analysis = PulseShapeAnalyser::new(config).analyse(&trace.samples, pedestal);
    calibration::mark_saturated(&mut analysis, &trace.samples);
    record_metrics(&analysis);
    debug!(
        "{} candidates, {} records, {} dropped",
        analysis.candidates.len(),
        analysis.records().len(),
        analysis.dropped
    );

    if let Some(save_path) = options.save_path {
        let stem = file_stem(path);
        for (position, candidate) in analysis.candidates.iter().enumerate() {
            candidate
                .save_waveforms(save_path, &stem, position)
                .inspect_err(|_| {
                    counter!(FAILURES, &[failures::get_label(FailureKind::FileWriteFailed)])
                        .increment(1);
                })
                .with_context(|| format!("Cannot save waveforms to {}", save_path.display()))?;
        }
    }

    tracing::Span::current().record("num_records", analysis.records().len());
    let records = match options.calibration {
        Some(calibration) => calibration.apply_all(analysis.records(), pedestal),
        None => analysis.records().clone(),
    };
    Ok(records.slots().collect())
}

/// Writes one CSV line per output slot of every file, in the order given.
pub(crate) fn write_csv(path: &Path, results: &[(PathBuf, FileRecords)]) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("Cannot create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "{CSV_HEADER}")?;
    for (trace_path, slots) in results {
        for (slot, fields) in slots.iter().enumerate() {
            write!(writer, "{},{slot}", trace_path.display())?;
            for field in fields {
                write!(writer, ",{field}")?;
            }
            writeln!(writer)?;
        }
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_shape_analysis::DetectorParameters;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("dpsa-{}-{name}", std::process::id()))
    }

    #[test]
    fn processes_a_trace_file() {
        let mut text = String::from("# pedestal=100\n");
        for index in 0..3000 {
            let value = if (1000..1040).contains(&index) { -400 } else { 100 };
            text.push_str(&format!("{index},{value}\n"));
        }
        let path = temp_path("trace.txt");
        std::fs::write(&path, text).unwrap();

        let config = DetectorParameters::default().to_config().unwrap();
        let options = ProcessingOptions {
            pedestal: None,
            save_path: None,
            calibration: None,
        };
        let slots = process_file(&path, &config, &options).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(slots.len(), config.max_peaks());
        assert_eq!(slots[0][0], 0.0);
        assert_eq!(slots[0][2], 1.0);
        assert!(slots[1..].iter().all(|slot| slot.iter().all(|&field| field == 0.0)));
    }

    #[test]
    fn missing_file_is_an_error() {
        let config = DetectorParameters::default().to_config().unwrap();
        let options = ProcessingOptions {
            pedestal: Some(0.0),
            save_path: None,
            calibration: None,
        };
        assert!(process_file(&temp_path("missing.txt"), &config, &options).is_err());
    }

    #[test]
    fn csv_has_one_line_per_slot() {
        let path = temp_path("out.csv");
        let results = vec![(PathBuf::from("a.txt"), vec![[0.0; RECORD_FIELDS]; 2])];
        write_csv(&path, &results).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines[1], "a.txt,0,0,0,0,0,0,0,0,0,0,0");
        assert_eq!(lines[2], "a.txt,1,0,0,0,0,0,0,0,0,0,0");
    }
}
