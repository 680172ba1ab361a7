//! Per-invocation conversation transcript
//!
//! A transcript belongs to exactly one agent invocation and is dropped
//! when the invocation returns. Recursive children get a fresh one; this
//! is what keeps parent and child contexts invisible to each other.

/// Wire-level role of a transcript turn.
///
/// Thought/Action text arrives as one `Assistant` turn; observations go
/// back as `User` turns carrying an `Observation:` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single turn in the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// Append-only sequence of turns for one invocation.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    /// Seed a fresh transcript with the system prompt and the compact
    /// instruction for this invocation. The task payload never goes here.
    pub fn seed(system_prompt: &str, root_prompt: &str) -> Self {
        Self {
            turns: vec![Turn::system(system_prompt), Turn::user(root_prompt)],
        }
    }

    /// Append the model's raw response as an assistant turn.
    pub fn push_model(&mut self, text: &str) {
        self.turns.push(Turn::assistant(text));
    }

    /// Append an observation turn feeding execution output back to the
    /// model.
    pub fn push_observation(&mut self, text: &str) {
        self.turns.push(Turn::user(format!("Observation:\n{}", text)));
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_shape() {
        let transcript = Transcript::seed("be helpful", "solve it");
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.turns()[0].role, Role::System);
        assert_eq!(transcript.turns()[0].text, "be helpful");
        assert_eq!(transcript.turns()[1].role, Role::User);
        assert_eq!(transcript.turns()[1].text, "solve it");
    }

    #[test]
    fn test_observation_prefix() {
        let mut transcript = Transcript::seed("s", "u");
        transcript.push_model("thinking...");
        transcript.push_observation("42");

        assert_eq!(transcript.len(), 4);
        assert_eq!(transcript.turns()[2].role, Role::Assistant);
        assert_eq!(transcript.turns()[3].role, Role::User);
        assert_eq!(transcript.turns()[3].text, "Observation:\n42");
    }

    #[test]
    fn test_role_as_str() {
        assert_eq!(Role::System.as_str(), "system");
        assert_eq!(Role::User.as_str(), "user");
        assert_eq!(Role::Assistant.as_str(), "assistant");
    }
}
