//! Prometheus metrics for agent observability
//!
//! Registered in the default registry so an embedding application can
//! scrape them; the crate itself ships no metrics endpoint.

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram, register_histogram_vec, CounterVec, Histogram,
    HistogramVec,
};

lazy_static! {
    // ─────────────────────────────────────────────────────────────────────────────
    // Agent Loop Metrics
    // ─────────────────────────────────────────────────────────────────────────────

    /// Completed agent invocations at every recursion depth, by outcome.
    ///
    /// Labels:
    /// - outcome: "final" (answer produced), "depth_exceeded", "step_cap"
    pub static ref AGENT_INVOCATIONS: CounterVec = register_counter_vec!(
        "recursor_agent_invocations_total",
        "Agent invocations by outcome",
        &["outcome"]
    ).expect("failed to register AGENT_INVOCATIONS metric");

    /// Model calls made before an invocation terminated.
    pub static ref AGENT_STEPS: Histogram = register_histogram!(
        "recursor_agent_steps",
        "Model calls per agent invocation",
        prometheus::linear_buckets(1.0, 1.0, 12).expect("invalid AGENT_STEPS buckets")
    ).expect("failed to register AGENT_STEPS metric");

    /// Depth of each recursively spawned invocation (the root runs at 0
    /// and is not observed here).
    pub static ref AGENT_RECURSION_DEPTH: Histogram = register_histogram!(
        "recursor_agent_recursion_depth",
        "Depth of spawned recursive agent invocations",
        prometheus::linear_buckets(1.0, 1.0, 8).expect("invalid AGENT_RECURSION_DEPTH buckets")
    ).expect("failed to register AGENT_RECURSION_DEPTH metric");

    /// Model completion latency.
    ///
    /// Labels:
    /// - model: model identifier reported by the client
    pub static ref LLM_CALL_TIME: HistogramVec = register_histogram_vec!(
        "recursor_llm_call_seconds",
        "Model completion call duration in seconds",
        &["model"]
    ).expect("failed to register LLM_CALL_TIME metric");

    // ─────────────────────────────────────────────────────────────────────────────
    // Sandbox Metrics
    // ─────────────────────────────────────────────────────────────────────────────

    /// Code executions dispatched to sandbox workers.
    ///
    /// Labels:
    /// - status: "ok", "error" (fault captured or worker lost), "timeout"
    pub static ref CODE_EXECUTIONS: CounterVec = register_counter_vec!(
        "recursor_code_executions_total",
        "Sandbox code executions by status",
        &["status"]
    ).expect("failed to register CODE_EXECUTIONS metric");

    /// Wall-clock duration of one code execution, including any nested
    /// recursive invocations it triggered.
    pub static ref CODE_EXECUTION_DURATION: Histogram = register_histogram!(
        "recursor_code_execution_seconds",
        "Sandbox code execution duration in seconds"
    ).expect("failed to register CODE_EXECUTION_DURATION metric");
}
