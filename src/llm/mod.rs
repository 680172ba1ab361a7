//! Model client abstraction
//!
//! The agent loop consumes a single capability: `complete(transcript) →
//! text`. Tests script it, production wires the Ollama client, and any
//! other provider just implements [`ModelClient`].

pub mod client;

pub use client::{ModelClient, ModelError, OllamaClient};
