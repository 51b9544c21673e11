//! Reads plain-text trace files.
//!
//! A trace file holds one sample per line, either as a bare value or as `index,value`.
//! Blank lines and lines starting with `#` are skipped, except for a
//! `# pedestal=<value>` header, which records the pedestal the trace was taken with.
use crate::pulse_detection::Real;
use dpsa_common::Sample;
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

const PEDESTAL_HEADER: &str = "pedestal=";

#[derive(Debug, Error)]
pub enum TraceFileError {
    #[error("Cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Line {line}: cannot parse sample from '{content}'")]
    Sample { line: usize, content: String },
    #[error("Line {line}: cannot parse pedestal from '{content}'")]
    Pedestal { line: usize, content: String },
    #[error("No samples found")]
    Empty,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct TraceFile {
    /// The pedestal from the file header, if it had one.
    pub pedestal: Option<Real>,
    pub samples: Vec<Sample>,
}

impl TraceFile {
    #[tracing::instrument(skip_all, level = "debug", fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, TraceFileError> {
        let text = fs::read_to_string(path).map_err(|source| TraceFileError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, TraceFileError> {
        let mut trace = Self::default();
        for (number, line) in text.lines().enumerate().map(|(n, l)| (n + 1, l.trim())) {
            if line.is_empty() {
                continue;
            }
            if let Some(comment) = line.strip_prefix('#') {
                if let Some(value) = comment.trim().strip_prefix(PEDESTAL_HEADER) {
                    let pedestal = value.trim().parse::<Real>().map_err(|_| {
                        TraceFileError::Pedestal {
                            line: number,
                            content: line.to_owned(),
                        }
                    })?;
                    trace.pedestal = Some(pedestal);
                }
                continue;
            }
            trace.samples.push(parse_sample(line).ok_or_else(|| TraceFileError::Sample {
                line: number,
                content: line.to_owned(),
            })?);
        }
        if trace.samples.is_empty() {
            return Err(TraceFileError::Empty);
        }
        Ok(trace)
    }
}

fn parse_sample(line: &str) -> Option<Sample> {
    let value = match line.split_once(',') {
        Some((index, value)) => {
            index.trim().parse::<usize>().ok()?;
            value
        }
        None => line,
    };
    value.trim().parse().ok()
}
