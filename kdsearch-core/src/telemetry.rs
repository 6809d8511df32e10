//! Optional counters emitted when the `metrics` feature is enabled.

#[cfg(feature = "metrics")]
pub(crate) fn record_cas_retry() {
    metrics::counter!("kd_insert_cas_retries").increment(1);
}

#[cfg(not(feature = "metrics"))]
pub(crate) fn record_cas_retry() {}

#[cfg(feature = "metrics")]
pub(crate) fn record_nodes_visited(count: u64) {
    metrics::counter!("kd_query_nodes_visited").increment(count);
}

#[cfg(not(feature = "metrics"))]
pub(crate) fn record_nodes_visited(_count: u64) {}

#[cfg(feature = "metrics")]
pub(crate) fn record_subtree_pruned() {
    metrics::counter!("kd_query_subtrees_pruned").increment(1);
}

#[cfg(not(feature = "metrics"))]
pub(crate) fn record_subtree_pruned() {}
