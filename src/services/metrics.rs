use lazy_static::lazy_static;
use prometheus::{register_counter_vec, CounterVec};

lazy_static! {
    /// One increment per banner resolution, labelled by how it was answered.
    pub static ref RESOLUTIONS_COUNTER: CounterVec = register_counter_vec!(
        "banner_resolutions_total",
        "Banner resolutions by outcome (fast_path, cache_hit, store_hit, none, conflict)",
        &["outcome"]
    ).unwrap();

    pub static ref CACHE_ERRORS_COUNTER: CounterVec = register_counter_vec!(
        "banner_cache_errors_total",
        "Cache operations that failed and were treated as a miss",
        &["operation"]
    ).unwrap();
}

pub fn record_resolution(outcome: &str) {
    RESOLUTIONS_COUNTER.with_label_values(&[outcome]).inc();
}

pub fn record_cache_error(operation: &str) {
    CACHE_ERRORS_COUNTER.with_label_values(&[operation]).inc();
}
