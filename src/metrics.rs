//! Prometheus metrics for the agent functions
//!
//! All metrics live in the default registry. A function process handles one
//! invocation at a time, so these are mostly useful as a per-container
//! summary, printed by `homebell invoke --metrics` or scraped by a sidecar.

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter, register_int_counter_vec,
    Encoder, Histogram, HistogramVec, IntCounter, IntCounterVec, TextEncoder,
};

lazy_static! {
    /// Agent invocations by function name and outcome ("ok" / "error")
    pub static ref INVOCATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "homebell_invocations_total",
        "Agent function invocations",
        &["function", "outcome"]
    )
    .expect("invocations metric registers");

    /// Which recovery tier produced the chunk list ("strict", "relaxed", "fallback")
    pub static ref CHUNK_RECOVERY_TOTAL: IntCounterVec = register_int_counter_vec!(
        "homebell_chunk_recovery_total",
        "Chunk list recoveries by tier",
        &["tier"]
    )
    .expect("chunk recovery metric registers");

    /// Knowledge base queries that returned the no-result sentinel
    pub static ref RETRIEVAL_FAILURES_TOTAL: IntCounter = register_int_counter!(
        "homebell_retrieval_failures_total",
        "Knowledge base queries that failed"
    )
    .expect("retrieval failures metric registers");

    /// Model latency for code generation
    pub static ref GENERATION_DURATION: Histogram = register_histogram!(
        "homebell_generation_duration_seconds",
        "Time spent waiting for generated code",
        vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]
    )
    .expect("generation duration metric registers");

    /// Script executions by outcome ("success", "failure", "timeout", "launch_error")
    pub static ref SCRIPT_EXECUTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "homebell_script_executions_total",
        "Generated script executions",
        &["outcome"]
    )
    .expect("script executions metric registers");

    /// Wall-clock duration of script executions by outcome
    pub static ref SCRIPT_EXECUTION_DURATION: HistogramVec = register_histogram_vec!(
        "homebell_script_execution_duration_seconds",
        "Wall-clock duration of generated script executions",
        &["outcome"],
        vec![0.1, 0.5, 1.0, 5.0, 15.0, 60.0, 180.0]
    )
    .expect("script duration metric registers");
}

/// Render every registered metric in the text exposition format
pub fn encode() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
