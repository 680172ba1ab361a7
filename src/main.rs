//! Demo entry point: run one agent task from the command line.
//!
//! The task text is taken from the arguments (a default demo query is
//! used when none are given) and becomes the sandbox payload; the model
//! is pointed at it through the generic root instruction.
//!
//! Configuration via environment variables:
//! - `RECURSOR_MODEL` - model name (default "llama3.2")
//! - `RECURSOR_OLLAMA_URL` - Ollama base URL (default "http://localhost:11434")
//! - `RECURSOR_MAX_DEPTH` - recursion depth cap (default 4)

use std::sync::Arc;

use recursor::agent::prompt::TASK_ROOT_PROMPT;
use recursor::tracing::init_tracing;
use recursor::{AgentConfig, AgentController, OllamaClient};

const DEFAULT_MODEL: &str = "llama3.2";
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const DEFAULT_TASK: &str = "Calculate the 10th Fibonacci number. \
Then, use that number to calculate its square root.";

#[tokio::main]
async fn main() {
    init_tracing("recursor");

    let model = std::env::var("RECURSOR_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
    let base_url =
        std::env::var("RECURSOR_OLLAMA_URL").unwrap_or_else(|_| DEFAULT_OLLAMA_URL.to_string());

    let task = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let task = if task.is_empty() {
        DEFAULT_TASK.to_string()
    } else {
        task
    };

    let mut config = AgentConfig {
        verbose: true,
        ..AgentConfig::default()
    };
    if let Some(depth) = std::env::var("RECURSOR_MAX_DEPTH")
        .ok()
        .and_then(|v| v.parse().ok())
    {
        config.max_depth = depth;
    }

    println!("[MAIN] Model: {} @ {}", model, base_url);
    println!("[MAIN] Task: {}", task);

    let client = Arc::new(OllamaClient::new(base_url, model));
    let controller = AgentController::new(client, config);

    match controller.run(TASK_ROOT_PROMPT, &task).await {
        Ok(result) => {
            println!("--------------------------------------------------");
            println!(
                "[MAIN] Done in {} steps, {} executions, {} recursive spawns (trace {})",
                result.steps, result.code_executions, result.recursion_spawns, result.trace_id
            );
            println!("{}", result.final_answer);
        }
        Err(e) => {
            eprintln!("[MAIN] Agent task failed: {}", e);
            std::process::exit(1);
        }
    }
}
