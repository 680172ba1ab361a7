//! Sandboxed execution of model-written code
//!
//! Each agent invocation owns one sandbox, and each sandbox owns one
//! worker subprocess holding the invocation's namespace. The host and the
//! worker exchange newline-delimited JSON over the worker's stdio:
//!
//! ```text
//! Controller → Sandbox.run(code) → worker exec
//!                   ↓
//!       worker: {"event": "recurse", task}   (code called recurse)
//!                   ↓
//!       Controller runs a fresh child invocation
//!                   ↓
//!       Sandbox.resume(answer) → worker continues the fragment
//!                   ↓
//!       worker: {"event": "done", stdout, error}
//! ```
//!
//! Faults inside executed code are captured as traceback text and the
//! worker keeps running; the namespace (including mutations made before a
//! fault) persists until the sandbox is dropped.

pub mod executor;
mod worker;

pub use executor::{ExecutionResult, Sandbox, SandboxConfig, SandboxError, SandboxEvent};
