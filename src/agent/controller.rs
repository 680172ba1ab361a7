//! Agent controller - recursive orchestration loop for model-driven code
//! execution
//!
//! One `run_invocation` frame is one agent invocation: it owns a fresh
//! transcript and a fresh sandbox for its whole lifetime. Recursion events
//! from the sandbox spawn a new frame at depth + 1; the only thing that
//! crosses the boundary back is the child's final answer string.

use std::sync::Arc;
use std::time::Instant;

use async_recursion::async_recursion;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::llm::{ModelClient, ModelError};
use crate::metrics::{AGENT_INVOCATIONS, AGENT_RECURSION_DEPTH, AGENT_STEPS, LLM_CALL_TIME};
use crate::sandbox::{ExecutionResult, Sandbox, SandboxConfig, SandboxError, SandboxEvent};

use super::prompt::{DEFAULT_SYSTEM_PROMPT, NO_ACTION_OBSERVATION, TASK_ROOT_PROMPT};
use super::protocol::{parse_response, ModelAction};
use super::transcript::Transcript;

/// Configuration for the agent controller
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Maximum recursion depth; the root runs at depth 0, so 0 still
    /// allows a full loop but refuses the first recursive spawn.
    pub max_depth: u32,
    /// Maximum model calls per invocation before giving up.
    pub max_steps: u32,
    /// Custom system prompt (uses the default protocol prompt if None).
    pub system_prompt: Option<String>,
    /// Print executed code and observations to the console.
    pub verbose: bool,
    /// Sandbox worker settings.
    pub sandbox: SandboxConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_depth: 4,
            max_steps: 10,
            system_prompt: None,
            verbose: false,
            sandbox: SandboxConfig::default(),
        }
    }
}

/// A unit of work for one agent invocation.
///
/// `root_prompt` is the compact instruction shown to the model;
/// `context` is the full payload, injected into the sandbox namespace
/// and never placed in the transcript.
#[derive(Debug, Clone)]
pub struct Task {
    pub root_prompt: String,
    pub context: String,
}

impl Task {
    pub fn new(root_prompt: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            root_prompt: root_prompt.into(),
            context: context.into(),
        }
    }

    /// Task for a recursively spawned child: the generic instruction as
    /// its prompt, the sub-task text as its payload.
    fn subtask(task_text: impl Into<String>) -> Self {
        Self::new(TASK_ROOT_PROMPT, task_text)
    }
}

/// Result of a completed agent run
#[derive(Debug, Clone)]
pub struct AgentResult {
    /// Final answer text (failure-shaped when a depth or step cap ended
    /// the run).
    pub final_answer: String,
    /// Total model calls across all invocations of the run.
    pub steps: u32,
    /// Total code executions dispatched to sandboxes.
    pub code_executions: u32,
    /// Total recursive invocations spawned.
    pub recursion_spawns: u32,
    /// Unique trace ID for this run.
    pub trace_id: String,
}

/// Error type for agent operations
#[derive(Debug)]
pub enum AgentError {
    /// The model client failed; not retried, the whole chain aborts.
    Model(ModelError),
    /// A sandbox worker could not be brought up.
    Sandbox(SandboxError),
}

impl std::fmt::Display for AgentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentError::Model(e) => write!(f, "Model client error: {}", e),
            AgentError::Sandbox(e) => write!(f, "Sandbox error: {}", e),
        }
    }
}

impl std::error::Error for AgentError {}

impl From<ModelError> for AgentError {
    fn from(e: ModelError) -> Self {
        AgentError::Model(e)
    }
}

impl From<SandboxError> for AgentError {
    fn from(e: SandboxError) -> Self {
        AgentError::Sandbox(e)
    }
}

/// Counters threaded through a run for the final report.
#[derive(Debug, Default)]
struct RunStats {
    steps: u32,
    executions: u32,
    recursions: u32,
}

/// Agent controller driving model calls and sandboxed execution
pub struct AgentController {
    model: Arc<dyn ModelClient>,
    config: AgentConfig,
}

impl AgentController {
    /// Create a new controller
    ///
    /// # Arguments
    /// * `model` - Model client used for every invocation of the run
    /// * `config` - Loop and sandbox configuration
    pub fn new(model: Arc<dyn ModelClient>, config: AgentConfig) -> Self {
        Self { model, config }
    }

    /// Run one top-level agent task to completion.
    ///
    /// # Arguments
    /// * `root_prompt` - Compact instruction shown to the model
    /// * `context` - Full task payload, visible only inside the sandbox
    ///
    /// # Returns
    /// The final answer plus run statistics. Depth and step exhaustion
    /// produce failure-shaped answers, not errors; only model-client and
    /// sandbox-spawn failures are `Err`.
    pub async fn run(&self, root_prompt: &str, context: &str) -> Result<AgentResult, AgentError> {
        let trace_id = Uuid::now_v7().to_string();

        let root_span = info_span!(
            "agent_task",
            trace_id = %trace_id,
            model = %self.model.model_name(),
        );

        async {
            info!(trace_id = %trace_id, "Starting agent task");

            let task = Task::new(root_prompt, context);
            let mut stats = RunStats::default();
            let final_answer = self.run_invocation(&task, 0, &trace_id, &mut stats).await?;

            info!(
                trace_id = %trace_id,
                steps = stats.steps,
                executions = stats.executions,
                recursions = stats.recursions,
                "Agent task completed"
            );

            Ok(AgentResult {
                final_answer,
                steps: stats.steps,
                code_executions: stats.executions,
                recursion_spawns: stats.recursions,
                trace_id: trace_id.clone(),
            })
        }
        .instrument(root_span)
        .await
    }

    /// Run one invocation at a fixed depth with fresh state.
    #[async_recursion]
    async fn run_invocation(
        &self,
        task: &Task,
        depth: u32,
        trace_id: &str,
        stats: &mut RunStats,
    ) -> Result<String, AgentError> {
        if depth > self.config.max_depth {
            warn!(trace_id = %trace_id, depth, "Recursion depth exhausted");
            AGENT_INVOCATIONS.with_label_values(&["depth_exceeded"]).inc();
            return Ok(depth_exceeded_answer(self.config.max_depth));
        }

        let span = info_span!("agent_invocation", trace_id = %trace_id, depth);

        async {
            let mut sandbox = Sandbox::spawn(&self.config.sandbox, &task.context).await?;
            let system_prompt = self
                .config
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());
            let mut transcript = Transcript::seed(&system_prompt, &task.root_prompt);

            debug!(
                trace_id = %trace_id,
                depth,
                seed_turns = transcript.len(),
                "Invocation started; payload lives in sandbox variable `context`"
            );

            let mut steps = 0u32;
            while steps < self.config.max_steps {
                steps += 1;
                stats.steps += 1;

                let llm_span = info_span!(
                    "llm_call",
                    trace_id = %trace_id,
                    depth,
                    step = steps,
                );
                let call_start = Instant::now();
                let response = self
                    .model
                    .complete(&transcript)
                    .instrument(llm_span)
                    .await?;
                LLM_CALL_TIME
                    .with_label_values(&[self.model.model_name()])
                    .observe(call_start.elapsed().as_secs_f64());

                debug!(
                    trace_id = %trace_id,
                    depth,
                    step = steps,
                    response_len = response.len(),
                    "Model response received"
                );
                transcript.push_model(&response);

                match parse_response(&response) {
                    ModelAction::FinalAnswer(text) => {
                        info!(trace_id = %trace_id, depth, steps, "Final answer produced");
                        AGENT_INVOCATIONS.with_label_values(&["final"]).inc();
                        AGENT_STEPS.observe(steps as f64);
                        return Ok(text);
                    }
                    ModelAction::CodeAction(code) => {
                        if self.config.verbose {
                            print_code_box(depth, &code);
                        }
                        stats.executions += 1;
                        let result = self
                            .drive_sandbox(&mut sandbox, &code, depth, trace_id, stats)
                            .await?;
                        let observation = result.observation_text();
                        if self.config.verbose {
                            println!("[AGENT] Observation:\n{}", observation);
                        }
                        transcript.push_observation(&observation);
                    }
                    ModelAction::Invalid => {
                        debug!(trace_id = %trace_id, depth, step = steps, "No action found, nudging model");
                        transcript.push_observation(NO_ACTION_OBSERVATION);
                    }
                }
            }

            warn!(trace_id = %trace_id, depth, steps, "Step cap reached without a final answer");
            AGENT_INVOCATIONS.with_label_values(&["step_cap"]).inc();
            AGENT_STEPS.observe(steps as f64);
            Ok(step_cap_answer(self.config.max_steps))
        }
        .instrument(span)
        .await
    }

    /// Drive one code execution, servicing recursion suspensions until
    /// the sandbox reports a result.
    async fn drive_sandbox(
        &self,
        sandbox: &mut Sandbox,
        code: &str,
        depth: u32,
        trace_id: &str,
        stats: &mut RunStats,
    ) -> Result<ExecutionResult, AgentError> {
        let mut event = sandbox.run(code).await;
        loop {
            match event {
                SandboxEvent::Done(result) => return Ok(result),
                SandboxEvent::Recurse { task } => {
                    stats.recursions += 1;
                    AGENT_RECURSION_DEPTH.observe((depth + 1) as f64);
                    info!(
                        trace_id = %trace_id,
                        depth,
                        subtask = %truncate_for_log(&task, 80),
                        "Spawning recursive invocation"
                    );
                    let child = Task::subtask(task);
                    let answer = self
                        .run_invocation(&child, depth + 1, trace_id, stats)
                        .await?;
                    event = sandbox.resume(&answer).await;
                }
            }
        }
    }
}

/// Deterministic answer returned when a spawn would exceed the depth cap.
fn depth_exceeded_answer(max_depth: u32) -> String {
    format!("Max recursion depth ({}) reached.", max_depth)
}

/// Deterministic answer returned when an invocation runs out of steps.
fn step_cap_answer(max_steps: u32) -> String {
    format!("Max steps ({}) reached without a final answer.", max_steps)
}

fn print_code_box(depth: u32, code: &str) {
    println!("[AGENT] Executing code (depth {}):", depth);
    println!("┌─────────────────────────────────────────");
    for line in code.lines() {
        println!("│ {}", line);
    }
    println!("└─────────────────────────────────────────");
}

/// Truncate a string for logging purposes, respecting char boundaries.
fn truncate_for_log(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars).collect();
        format!("{}... [truncated]", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_config_defaults() {
        let config = AgentConfig::default();

        assert_eq!(config.max_depth, 4);
        assert_eq!(config.max_steps, 10);
        assert!(config.system_prompt.is_none());
        assert!(!config.verbose);
        assert_eq!(config.sandbox.python_bin, "python3");
    }

    #[test]
    fn test_subtask_uses_generic_prompt() {
        let task = Task::subtask("sum the list");
        assert_eq!(task.root_prompt, TASK_ROOT_PROMPT);
        assert_eq!(task.context, "sum the list");
    }

    #[test]
    fn test_failure_answers_are_deterministic() {
        assert_eq!(depth_exceeded_answer(4), "Max recursion depth (4) reached.");
        assert_eq!(
            step_cap_answer(10),
            "Max steps (10) reached without a final answer."
        );
    }

    #[test]
    fn test_truncate_for_log() {
        assert_eq!(truncate_for_log("short", 10), "short");
        assert_eq!(
            truncate_for_log("0123456789abcdef", 10),
            "0123456789... [truncated]"
        );
        // Multi-byte input must not split a char.
        let snowmen = "☃".repeat(12);
        assert!(truncate_for_log(&snowmen, 10).starts_with('☃'));
    }
}
