//! Host side of the sandbox execution boundary
//!
//! The `Sandbox` owns one worker process and drives the line-JSON protocol
//! over its stdio. Executions never fail from the controller's point of
//! view once the handshake has succeeded: faults, lost workers, and
//! timeouts are all folded into an error-shaped [`ExecutionResult`] so the
//! loop can always produce an observation.

use std::time::{Duration, Instant};

use serde::Deserialize;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::metrics::{CODE_EXECUTIONS, CODE_EXECUTION_DURATION};

use super::worker::spawn_worker;

/// Bounded wait for the worker's ready event after spawn.
const READY_TIMEOUT: Duration = Duration::from_secs(10);

/// Sandbox configuration.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// Interpreter binary for the worker process.
    pub python_bin: String,
    /// Per-execution timeout in seconds. None means unbounded; on expiry
    /// the worker is killed and the execution observes a timeout error.
    pub exec_timeout_secs: Option<u64>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            python_bin: "python3".to_string(),
            exec_timeout_secs: None,
        }
    }
}

/// Outcome of one code execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Captured stdout/stderr text produced by the fragment.
    pub stdout: String,
    /// Fault description when the fragment raised, worker transport broke,
    /// or the execution timed out.
    pub error: Option<String>,
}

impl ExecutionResult {
    fn fault(message: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            error: Some(message.into()),
        }
    }

    /// Render this result as observation text for the transcript.
    ///
    /// Output captured before a fault is kept in front of the fault text.
    pub fn observation_text(&self) -> String {
        match &self.error {
            Some(err) if self.stdout.trim().is_empty() => err.clone(),
            Some(err) => format!("{}\n{}", self.stdout.trim_end(), err),
            None if self.stdout.is_empty() => "[No output]".to_string(),
            None => self.stdout.clone(),
        }
    }
}

/// What the worker reported after being handed a code fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SandboxEvent {
    /// Execution finished; the namespace keeps any new bindings.
    Done(ExecutionResult),
    /// The fragment called `recurse(task)` and is suspended until
    /// [`Sandbox::resume`] supplies the answer.
    Recurse { task: String },
}

/// Error type for sandbox construction
#[derive(Debug)]
pub enum SandboxError {
    Spawn(std::io::Error),
    Handshake(String),
}

impl std::fmt::Display for SandboxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SandboxError::Spawn(e) => write!(f, "Failed to spawn sandbox worker: {}", e),
            SandboxError::Handshake(msg) => write!(f, "Sandbox handshake error: {}", msg),
        }
    }
}

impl std::error::Error for SandboxError {}

impl From<std::io::Error> for SandboxError {
    fn from(e: std::io::Error) -> Self {
        SandboxError::Spawn(e)
    }
}

/// Wire events emitted by the worker.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum WorkerEvent {
    Ready,
    Recurse { task: String },
    Done { stdout: String, error: Option<String> },
}

/// One invocation's execution environment.
///
/// Owns the worker process exclusively; the worker (and with it the whole
/// namespace) is killed when the sandbox is dropped.
pub struct Sandbox {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    exec_timeout: Option<Duration>,
    exec_started: Option<Instant>,
    dead: bool,
}

impl std::fmt::Debug for Sandbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sandbox")
            .field("pid", &self.child.id())
            .field("dead", &self.dead)
            .finish()
    }
}

impl Sandbox {
    /// Spawn a worker bound to `context` and wait for its ready event.
    ///
    /// # Arguments
    /// * `config` - Interpreter binary and optional execution timeout
    /// * `context` - Payload injected into the namespace as `context`
    pub async fn spawn(config: &SandboxConfig, context: &str) -> Result<Self, SandboxError> {
        let mut child = spawn_worker(&config.python_bin)?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SandboxError::Handshake("worker stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SandboxError::Handshake("worker stdout unavailable".to_string()))?;

        let mut sandbox = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            exec_timeout: config.exec_timeout_secs.map(Duration::from_secs),
            exec_started: None,
            dead: false,
        };

        sandbox
            .send(&json!({"op": "init", "context": context}))
            .await
            .map_err(SandboxError::Handshake)?;

        match timeout(READY_TIMEOUT, sandbox.read_event()).await {
            Ok(Ok(WorkerEvent::Ready)) => {
                debug!(pid = ?sandbox.child.id(), "Sandbox worker ready");
                Ok(sandbox)
            }
            Ok(Ok(other)) => Err(SandboxError::Handshake(format!(
                "unexpected event before ready: {:?}",
                other
            ))),
            Ok(Err(msg)) => Err(SandboxError::Handshake(msg)),
            Err(_) => Err(SandboxError::Handshake(format!(
                "worker not ready within {:?}",
                READY_TIMEOUT
            ))),
        }
    }

    /// Execute one code fragment against the owned namespace.
    ///
    /// Returns `Done` with the captured output (or fault text), or
    /// `Recurse` if the fragment suspended on the recursion hook.
    pub async fn run(&mut self, code: &str) -> SandboxEvent {
        if self.dead {
            return self.finish(ExecutionResult::fault("sandbox worker is no longer running"));
        }
        self.exec_started = Some(Instant::now());
        if let Err(msg) = self.send(&json!({"op": "exec", "code": code})).await {
            self.dead = true;
            return self.finish(ExecutionResult::fault(msg));
        }
        self.await_event().await
    }

    /// Answer a pending `recurse` suspension and continue the execution.
    pub async fn resume(&mut self, answer: &str) -> SandboxEvent {
        if self.dead {
            return self.finish(ExecutionResult::fault("sandbox worker is no longer running"));
        }
        if let Err(msg) = self.send(&json!({"op": "resume", "answer": answer})).await {
            self.dead = true;
            return self.finish(ExecutionResult::fault(msg));
        }
        self.await_event().await
    }

    /// Wait for the next worker event, applying the execution timeout.
    async fn await_event(&mut self) -> SandboxEvent {
        let event = match self.exec_timeout {
            Some(limit) => match timeout(limit, self.read_event()).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(timeout_secs = limit.as_secs(), "Sandbox execution timed out");
                    let _ = self.child.start_kill();
                    self.dead = true;
                    CODE_EXECUTIONS.with_label_values(&["timeout"]).inc();
                    self.observe_duration();
                    return SandboxEvent::Done(ExecutionResult::fault(format!(
                        "execution timed out after {}s",
                        limit.as_secs()
                    )));
                }
            },
            None => self.read_event().await,
        };

        match event {
            Ok(WorkerEvent::Recurse { task }) => SandboxEvent::Recurse { task },
            Ok(WorkerEvent::Done { stdout, error }) => {
                self.finish(ExecutionResult { stdout, error })
            }
            Ok(WorkerEvent::Ready) => {
                self.dead = true;
                self.finish(ExecutionResult::fault("unexpected ready event from worker"))
            }
            Err(msg) => {
                self.dead = true;
                self.finish(ExecutionResult::fault(msg))
            }
        }
    }

    /// Record metrics for a completed execution and wrap it up.
    fn finish(&mut self, result: ExecutionResult) -> SandboxEvent {
        let status = if result.error.is_some() { "error" } else { "ok" };
        CODE_EXECUTIONS.with_label_values(&[status]).inc();
        self.observe_duration();
        SandboxEvent::Done(result)
    }

    fn observe_duration(&mut self) {
        if let Some(started) = self.exec_started.take() {
            CODE_EXECUTION_DURATION.observe(started.elapsed().as_secs_f64());
        }
    }

    async fn send(&mut self, message: &serde_json::Value) -> Result<(), String> {
        let mut line = message.to_string();
        line.push('\n');
        self.stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| format!("worker stdin closed: {}", e))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| format!("worker stdin closed: {}", e))
    }

    async fn read_event(&mut self) -> Result<WorkerEvent, String> {
        let mut line = String::new();
        let n = self
            .stdout
            .read_line(&mut line)
            .await
            .map_err(|e| format!("worker stdout closed: {}", e))?;
        if n == 0 {
            return Err("worker exited unexpectedly".to_string());
        }
        serde_json::from_str(&line).map_err(|e| format!("invalid worker event {:?}: {}", line.trim(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn python3_available() -> bool {
        tokio::process::Command::new("python3")
            .arg("--version")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    async fn spawn_default(context: &str) -> Sandbox {
        Sandbox::spawn(&SandboxConfig::default(), context)
            .await
            .expect("sandbox spawn failed")
    }

    fn expect_done(event: SandboxEvent) -> ExecutionResult {
        match event {
            SandboxEvent::Done(result) => result,
            other => panic!("expected done, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_namespace_persists_across_runs() {
        if !python3_available().await {
            eprintln!("skipping: python3 not found");
            return;
        }
        let mut sandbox = spawn_default("").await;

        let first = expect_done(sandbox.run("x = 41").await);
        assert!(first.error.is_none());

        let second = expect_done(sandbox.run("print(x + 1)").await);
        assert!(second.error.is_none());
        assert_eq!(second.stdout, "42\n");
    }

    #[tokio::test]
    async fn test_fault_is_captured_and_state_survives() {
        if !python3_available().await {
            eprintln!("skipping: python3 not found");
            return;
        }
        let mut sandbox = spawn_default("").await;

        expect_done(sandbox.run("y = 7").await);

        let fault = expect_done(sandbox.run("1 / 0").await);
        let error = fault.error.expect("fault should be captured");
        assert!(error.contains("ZeroDivisionError"), "unexpected fault: {error}");

        // Bindings made before the fault are still there.
        let after = expect_done(sandbox.run("print(y)").await);
        assert!(after.error.is_none());
        assert_eq!(after.stdout, "7\n");
    }

    #[tokio::test]
    async fn test_partial_output_kept_in_front_of_fault() {
        if !python3_available().await {
            eprintln!("skipping: python3 not found");
            return;
        }
        let mut sandbox = spawn_default("").await;

        let result = expect_done(sandbox.run("print('before')\n1 / 0").await);
        assert_eq!(result.stdout, "before\n");
        assert!(result.error.is_some());
        let observation = result.observation_text();
        assert!(observation.starts_with("before"));
        assert!(observation.contains("ZeroDivisionError"));
    }

    #[tokio::test]
    async fn test_context_binding() {
        if !python3_available().await {
            eprintln!("skipping: python3 not found");
            return;
        }
        let mut sandbox = spawn_default("hello payload").await;

        let result = expect_done(sandbox.run("print(context)").await);
        assert_eq!(result.stdout, "hello payload\n");
    }

    #[tokio::test]
    async fn test_fresh_sandbox_same_output() {
        if !python3_available().await {
            eprintln!("skipping: python3 not found");
            return;
        }
        let code = "total = sum(range(10))\nprint(total)";

        let mut first = spawn_default("same").await;
        let mut second = spawn_default("same").await;

        let a = expect_done(first.run(code).await);
        let b = expect_done(second.run(code).await);
        assert_eq!(a.stdout, b.stdout);
        assert_eq!(a.stdout, "45\n");
    }

    #[tokio::test]
    async fn test_recurse_suspends_and_resume_returns_answer() {
        if !python3_available().await {
            eprintln!("skipping: python3 not found");
            return;
        }
        let mut sandbox = spawn_default("").await;

        let event = sandbox.run("print(recurse('subtask text'))").await;
        let task = match event {
            SandboxEvent::Recurse { task } => task,
            other => panic!("expected recurse, got {:?}", other),
        };
        assert_eq!(task, "subtask text");

        let result = expect_done(sandbox.resume("child answer").await);
        assert!(result.error.is_none());
        assert_eq!(result.stdout, "child answer\n");
    }

    #[tokio::test]
    async fn test_blocked_import_reports_fault() {
        if !python3_available().await {
            eprintln!("skipping: python3 not found");
            return;
        }
        let mut sandbox = spawn_default("").await;

        let result = expect_done(sandbox.run("import os").await);
        let error = result.error.expect("blocked import should fault");
        assert!(error.contains("blocked"), "unexpected fault: {error}");

        let allowed = expect_done(sandbox.run("import math\nprint(math.floor(2.5))").await);
        assert!(allowed.error.is_none());
        assert_eq!(allowed.stdout, "2\n");
    }

    #[tokio::test]
    async fn test_exec_timeout_kills_worker() {
        if !python3_available().await {
            eprintln!("skipping: python3 not found");
            return;
        }
        let config = SandboxConfig {
            exec_timeout_secs: Some(1),
            ..SandboxConfig::default()
        };
        let mut sandbox = Sandbox::spawn(&config, "").await.expect("sandbox spawn failed");

        let result = expect_done(sandbox.run("while True:\n    pass").await);
        let error = result.error.expect("timeout should be reported");
        assert!(error.contains("timed out"), "unexpected fault: {error}");

        // The worker is gone; later runs report the loss instead of hanging.
        let after = expect_done(sandbox.run("print(1)").await);
        assert!(after.error.is_some());
    }

    #[test]
    fn test_observation_text_rendering() {
        let ok = ExecutionResult {
            stdout: "out\n".to_string(),
            error: None,
        };
        assert_eq!(ok.observation_text(), "out\n");

        let empty = ExecutionResult {
            stdout: String::new(),
            error: None,
        };
        assert_eq!(empty.observation_text(), "[No output]");

        let fault = ExecutionResult::fault("boom");
        assert_eq!(fault.observation_text(), "boom");

        let both = ExecutionResult {
            stdout: "partial\n".to_string(),
            error: Some("boom".to_string()),
        };
        assert_eq!(both.observation_text(), "partial\nboom");
    }

    #[test]
    fn test_sandbox_config_defaults() {
        let config = SandboxConfig::default();
        assert_eq!(config.python_bin, "python3");
        assert!(config.exec_timeout_secs.is_none());
    }
}
