//! Prompt text for the agent protocol

/// Default system prompt describing the code/final-answer protocol and
/// the two namespace bindings the model can rely on.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a recursive coding agent.
You solve tasks by writing and executing Python code.

Rules:
1. Wrap code in ```python ... ``` or ```repl ... ``` blocks. The output will be
   returned to you as an 'Observation'.
2. You have a helper: `recurse(subtask)` - it spawns a NEW agent with a
   FRESH context to solve a sub-task and returns its answer as a string.
   Use it to decompose complex problems.
3. The task payload is in the variable `context` and may not appear in chat.
4. Use `print()` to see results.
5. When you have the final answer, output it on its own line starting
   with 'Final Answer:'.
"#;

/// Compact instruction shown to the model when the caller supplies none,
/// and as the root prompt of every recursively spawned invocation. The
/// payload itself stays out of the chat and lives in `context`.
pub const TASK_ROOT_PROMPT: &str = "Solve the task using Python execution.\n\
The full task payload is available only in the variable `context`.\n\
Read `context`, compute what is needed, and end with `Final Answer:`.";

/// Corrective observation appended when a response contains neither code
/// nor a final answer.
pub const NO_ACTION_OBSERVATION: &str = "I did not see any code or a 'Final Answer:'. \
Use ```python``` (or ```repl```) code when needed, and read task details \
from the variable `context`.";
