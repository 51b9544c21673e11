pub mod metric_names {
    use const_format::concatcp;

    pub const METRIC_NAME_PREFIX: &str = "dpsa_";

    pub const TRACES_PROCESSED: &str = concatcp!(METRIC_NAME_PREFIX, "traces_processed");
    pub const CANDIDATES_FOUND: &str = concatcp!(METRIC_NAME_PREFIX, "candidates_found");
    pub const CANDIDATES_DROPPED: &str = concatcp!(METRIC_NAME_PREFIX, "candidates_dropped");
    pub const RECORDS_EMITTED: &str = concatcp!(METRIC_NAME_PREFIX, "records_emitted");
    pub const PILEUP_FLAGGED: &str = concatcp!(METRIC_NAME_PREFIX, "pileup_flagged");
    pub const RECORDS_TRUNCATED: &str = concatcp!(METRIC_NAME_PREFIX, "records_truncated");
    pub const FAILURES: &str = concatcp!(METRIC_NAME_PREFIX, "failures");
}

pub mod dropped_candidates {
    #[derive(Debug, Clone, Eq, Hash, PartialEq)]
    pub enum DropReason {
        /// The trace produced more crossings than the record capacity.
        OverCapacity,
        /// The shaped waveform never produced an accepted peak in the pulse core.
        NoPrimaryPeak,
        /// The primary peak duplicated, or piled up on, an earlier record.
        MergedIntoEarlier,
    }

    // Label building function
    pub fn get_label(reason: DropReason) -> (&'static str, &'static str) {
        (
            "drop_reason",
            match reason {
                DropReason::OverCapacity => "over_capacity",
                DropReason::NoPrimaryPeak => "no_primary_peak",
                DropReason::MergedIntoEarlier => "merged_into_earlier",
            },
        )
    }
}

pub mod failures {
    #[derive(Debug, Clone, Eq, Hash, PartialEq)]
    pub enum FailureKind {
        TraceFileUnreadable,
        TraceFileMalformed,
        FileWriteFailed,
    }

    // Label building function
    pub fn get_label(failure_kind: FailureKind) -> (&'static str, &'static str) {
        (
            "failure_kind",
            match failure_kind {
                FailureKind::TraceFileUnreadable => "trace_file_unreadable",
                FailureKind::TraceFileMalformed => "trace_file_malformed",
                FailureKind::FileWriteFailed => "file_write_failed",
            },
        )
    }
}
