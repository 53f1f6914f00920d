use crate::models::RowOutcome;
use tracing::trace;

// Counters are emitted as trace events on `listing.metrics`; a batch run has
// no exporter to scrape them.

pub fn row_outcome(outcome: &RowOutcome) {
    trace!(
        target = "listing.metrics",
        outcome = outcome.label(),
        product_type = outcome.product_type(),
        "row_outcome"
    );
}

pub fn schema_cache(product_type: &str, result: &'static str) {
    trace!(
        target = "listing.metrics",
        product_type,
        result,
        "schema_cache_lookup"
    );
}

pub fn stage_elapsed(stage: &'static str, elapsed: std::time::Duration) {
    trace!(
        target = "listing.metrics",
        stage,
        elapsed_ms = elapsed.as_millis() as u64,
        "stage_elapsed"
    );
}
