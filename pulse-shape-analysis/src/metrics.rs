use dpsa_common::metrics::metric_names::{
    CANDIDATES_DROPPED, CANDIDATES_FOUND, FAILURES, PILEUP_FLAGGED, RECORDS_EMITTED,
    RECORDS_TRUNCATED, TRACES_PROCESSED,
};

pub(crate) fn describe() {
    metrics::describe_counter!(
        TRACES_PROCESSED,
        metrics::Unit::Count,
        "Number of trace files analysed"
    );
    metrics::describe_counter!(
        CANDIDATES_FOUND,
        metrics::Unit::Count,
        "Number of threshold crossings which opened a candidate window"
    );
    metrics::describe_counter!(
        CANDIDATES_DROPPED,
        metrics::Unit::Count,
        "Number of candidates which produced no record, by reason"
    );
    metrics::describe_counter!(
        RECORDS_EMITTED,
        metrics::Unit::Count,
        "Number of pulse records written"
    );
    metrics::describe_counter!(
        PILEUP_FLAGGED,
        metrics::Unit::Count,
        "Number of pulse records carrying a pileup flag"
    );
    metrics::describe_counter!(
        RECORDS_TRUNCATED,
        metrics::Unit::Count,
        "Number of pulse records whose snippet ran past either end of the trace"
    );
    metrics::describe_counter!(FAILURES, metrics::Unit::Count, "Failures by kind");
}
