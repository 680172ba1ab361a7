//! Parsing of model responses into agent actions
//!
//! The model speaks a textual protocol: one fenced code block per cycle,
//! and a literal marker line to terminate with an answer. The exact
//! delimiter strings live here as constants; nothing else in the loop
//! inspects response text.

use lazy_static::lazy_static;
use regex::Regex;

/// Marker that terminates the loop; the answer is the rest of the line.
pub const FINAL_ANSWER_MARKER: &str = "Final Answer:";

lazy_static! {
    /// First executable fenced block. Only `python`/`repl` tags count;
    /// untagged fences are prose formatting, not actions.
    static ref CODE_BLOCK: Regex =
        Regex::new(r"(?s)```(?:python|repl)\s*(.*?)```").expect("invalid CODE_BLOCK pattern");

    /// Any fenced region, used to blank out code before marker matching.
    static ref ANY_FENCE: Regex =
        Regex::new(r"(?s)```(?:python|repl)?\s*.*?```").expect("invalid ANY_FENCE pattern");

    /// Line-anchored final answer marker, case-insensitive.
    static ref FINAL_ANSWER: Regex = Regex::new(&format!(
        r"(?im)^\s*{}\s*(.+)$",
        regex::escape(FINAL_ANSWER_MARKER)
    ))
    .expect("invalid FINAL_ANSWER pattern");
}

/// What one model response asks the loop to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelAction {
    /// Terminate the invocation with this answer text.
    FinalAnswer(String),
    /// Execute this code fragment and feed back an observation.
    CodeAction(String),
    /// Neither a marker nor an executable block was found.
    Invalid,
}

/// Parse one model response into the action it requests.
///
/// Marker lines inside fenced regions are ignored, so a string literal
/// mentioning the marker in code does not terminate the loop. When a
/// response carries both a marker and code, the marker wins.
pub fn parse_response(text: &str) -> ModelAction {
    let without_code = ANY_FENCE.replace_all(text, "");
    if let Some(caps) = FINAL_ANSWER.captures(&without_code) {
        return ModelAction::FinalAnswer(caps[1].trim().to_string());
    }

    if let Some(caps) = CODE_BLOCK.captures(text) {
        return ModelAction::CodeAction(caps[1].trim().to_string());
    }

    ModelAction::Invalid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_final_answer_extraction() {
        let action = parse_response("I am done.\nFinal Answer: 42");
        assert_eq!(action, ModelAction::FinalAnswer("42".to_string()));
    }

    #[test]
    fn test_final_answer_case_insensitive() {
        let action = parse_response("final answer: done deal");
        assert_eq!(action, ModelAction::FinalAnswer("done deal".to_string()));
    }

    #[test]
    fn test_python_code_extraction() {
        let action = parse_response("Let me compute.\n```python\nprint(1 + 1)\n```\nrunning...");
        assert_eq!(action, ModelAction::CodeAction("print(1 + 1)".to_string()));
    }

    #[test]
    fn test_repl_code_extraction() {
        let action = parse_response("```repl\nx = 5\n```");
        assert_eq!(action, ModelAction::CodeAction("x = 5".to_string()));
    }

    #[test]
    fn test_untagged_fence_is_not_an_action() {
        let action = parse_response("```\nsome prose snippet\n```");
        assert_eq!(action, ModelAction::Invalid);
    }

    #[test]
    fn test_marker_inside_code_is_ignored() {
        let response = "```python\nmsg = 'Final Answer: not yet'\nprint(msg)\n```";
        let action = parse_response(response);
        assert_eq!(
            action,
            ModelAction::CodeAction("msg = 'Final Answer: not yet'\nprint(msg)".to_string())
        );
    }

    #[test]
    fn test_marker_outside_code_wins_over_code() {
        let response = "```python\nprint('x')\n```\nFinal Answer: done";
        let action = parse_response(response);
        assert_eq!(action, ModelAction::FinalAnswer("done".to_string()));
    }

    #[test]
    fn test_first_code_block_wins() {
        let response = "```python\nfirst\n```\ntext\n```python\nsecond\n```";
        let action = parse_response(response);
        assert_eq!(action, ModelAction::CodeAction("first".to_string()));
    }

    #[test]
    fn test_no_action_found() {
        assert_eq!(parse_response("just thinking out loud"), ModelAction::Invalid);
        assert_eq!(parse_response(""), ModelAction::Invalid);
    }
}
