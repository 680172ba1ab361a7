//! Recursor - recursive language-model agent runtime with isolated code
//! execution
//!
//! A controller drives the model through a Thought → Action → Observation
//! loop: the model writes Python fragments, a per-invocation worker
//! process executes them against a persistent namespace, and the captured
//! output is fed back as an observation. Code can call `recurse(subtask)`
//! to spawn a nested agent with a completely fresh transcript and
//! namespace; only the child's final answer flows back to the parent.
//!
//! # Modules
//!
//! - `agent` - Controller loop, transcript, response protocol, prompts
//! - `llm` - Model client trait and the Ollama implementation
//! - `sandbox` - Worker process and the host side of the execution boundary
//! - `metrics` - Prometheus metrics for observability
//! - `tracing` - Logging initialization
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use recursor::{AgentConfig, AgentController, OllamaClient};
//!
//! let client = Arc::new(OllamaClient::new("http://localhost:11434", "llama3.2"));
//! let controller = AgentController::new(client, AgentConfig::default());
//!
//! // The payload goes into the sandbox variable `context`, not the chat.
//! let result = controller
//!     .run("Summarize the numbers in `context`.", "3 9 27")
//!     .await?;
//! println!("{}", result.final_answer);
//! ```

pub mod agent;
pub mod llm;
pub mod metrics;
pub mod sandbox;
pub mod tracing;

// Re-export commonly used types at crate root for convenience
pub use agent::{AgentConfig, AgentController, AgentError, AgentResult, Task};
pub use llm::{ModelClient, ModelError, OllamaClient};
pub use sandbox::{ExecutionResult, Sandbox, SandboxConfig, SandboxError, SandboxEvent};
