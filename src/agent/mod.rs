//! Agent module for the recursive code-execution loop
//!
//! This module provides the loop that orchestrates:
//! - A model client producing Thought/Action text
//! - A response parser extracting code or a final answer
//! - A per-invocation sandbox executing the code
//!
//! # Architecture
//!
//! ```text
//! Task → run_invocation(depth) → model.complete(transcript)
//!              ↓
//!       parse_response → FinalAnswer → return answer
//!              ↓
//!         CodeAction → Sandbox.run(code)
//!              ↓
//!       recurse event? → run_invocation(depth + 1)   (fresh transcript,
//!              ↓            fresh sandbox; only the answer comes back)
//!       ExecutionResult → Observation turn → loop
//! ```
//!
//! Transcripts never cross depth boundaries: a child starts from its own
//! seed prompt and the parent only ever sees the child's final answer.

pub mod controller;
pub mod prompt;
pub mod protocol;
pub mod transcript;

pub use controller::{AgentConfig, AgentController, AgentError, AgentResult, Task};
pub use protocol::{parse_response, ModelAction};
pub use transcript::{Role, Transcript, Turn};
