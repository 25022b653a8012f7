// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade; without an installed recorder every call
//! is a no-op.

use metrics::{describe_counter, describe_gauge, describe_histogram};

/// Register all Tollgate metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "tollgate_requests_total",
        "Chat requests by final outcome"
    );
    describe_counter!(
        "tollgate_worker_selections_total",
        "Requests admitted to each worker, by tier"
    );
    describe_gauge!(
        "tollgate_worker_remaining_capacity",
        "Admissions left for a worker in the current capacity window"
    );
    describe_histogram!(
        "tollgate_request_latency_seconds",
        "End-to-end chat request latency in seconds"
    );
}

/// Record a finished request. `outcome` is `completed` or an error reason code.
pub fn record_request(outcome: &'static str) {
    metrics::counter!("tollgate_requests_total", "outcome" => outcome).increment(1);
}

/// Record a worker admission and the capacity it has left.
pub fn record_selection(worker: &str, tier: &str, remaining: u32) {
    metrics::counter!(
        "tollgate_worker_selections_total",
        "worker" => worker.to_string(),
        "tier" => tier.to_string()
    )
    .increment(1);
    set_worker_remaining(worker, remaining);
}

/// Set the remaining capacity gauge for one worker.
pub fn set_worker_remaining(worker: &str, remaining: u32) {
    metrics::gauge!("tollgate_worker_remaining_capacity", "worker" => worker.to_string())
        .set(f64::from(remaining));
}

/// Record end-to-end request latency.
pub fn record_latency(seconds: f64) {
    metrics::histogram!("tollgate_request_latency_seconds").record(seconds);
}
