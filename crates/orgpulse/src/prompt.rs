//! Interactive questions asked while resolving configuration
//!
//! Only configuration resolution and the final save step talk to a
//! [`Prompter`]; the pipeline never does.

use std::collections::VecDeque;
use std::io::{self, BufRead, IsTerminal, Write};

/// Source of answers to interactive questions
pub trait Prompter {
    /// Ask `question`; `None` means no answer is available (no terminal, EOF)
    fn ask(&mut self, question: &str) -> Option<String>;

    /// Whether asking can produce answers at all
    fn is_interactive(&self) -> bool {
        true
    }
}

/// Prompter that never answers
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPrompt;

impl Prompter for NoPrompt {
    fn ask(&mut self, _question: &str) -> Option<String> {
        None
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

/// Prompter reading answers from stdin, writing questions to stderr
#[derive(Debug, Default)]
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn ask(&mut self, question: &str) -> Option<String> {
        let mut stderr = io::stderr().lock();
        write!(stderr, "{question}").ok()?;
        stderr.flush().ok()?;

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}

/// Prompter replaying canned answers, recording what was asked
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    /// Questions asked so far
    pub asked: Vec<String>,
}

impl ScriptedPrompter {
    /// Prompter answering with `answers` in order, then `None`
    #[must_use]
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, question: &str) -> Option<String> {
        self.asked.push(question.to_string());
        self.answers.pop_front()
    }
}

/// Stdin when it is a terminal and prompting is allowed, otherwise nothing
#[must_use]
pub fn for_terminal(no_input: bool) -> Box<dyn Prompter> {
    if !no_input && io::stdin().is_terminal() {
        Box::new(StdinPrompter)
    } else {
        Box::new(NoPrompt)
    }
}

/// Ask whether to save the article and under which name
///
/// Returns `None` when the answer is anything but yes.
pub fn ask_save_path(prompter: &mut dyn Prompter, default_name: &str) -> Option<String> {
    let answer = prompter.ask("\nDo you want to save the article to a file? (yes/no): ")?;
    if !matches!(answer.to_lowercase().as_str(), "y" | "yes") {
        return None;
    }
    let name = prompter
        .ask(&format!("Enter desired filename (default {default_name}): "))
        .unwrap_or_default();
    if name.is_empty() {
        Some(default_name.to_string())
    } else {
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    #[test]
    fn test_scripted_prompter_replays_answers() {
        let mut prompter = ScriptedPrompter::new(["one", "two"]);
        assert_eq!(prompter.ask("first? "), Some("one".to_string()));
        assert_eq!(prompter.ask("second? "), Some("two".to_string()));
        assert_eq!(prompter.ask("third? "), None);
        let expected: Vec<String> = ["first? ", "second? ", "third? "]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(prompter.asked, expected);
    }

    #[test]
    fn test_no_prompt_never_answers() {
        let mut prompter = NoPrompt;
        assert_eq!(prompter.ask("anything? "), None);
        assert!(!prompter.is_interactive());
    }

    #[test]
    fn test_save_path_declined() {
        let mut prompter = ScriptedPrompter::new(["no"]);
        assert_eq!(ask_save_path(&mut prompter, "git_report.md"), None);
        assert_eq!(prompter.asked.len(), 1);
    }

    #[test]
    fn test_save_path_default_name() {
        let mut prompter = ScriptedPrompter::new(["YES", ""]);
        assert_eq!(
            ask_save_path(&mut prompter, "git_report.md"),
            Some("git_report.md".to_string())
        );
    }

    #[test]
    fn test_save_path_custom_name() {
        let mut prompter = ScriptedPrompter::new(["y", "march.md"]);
        assert_eq!(
            ask_save_path(&mut prompter, "git_report.md"),
            Some("march.md".to_string())
        );
    }

    #[test]
    fn test_save_path_without_answers() {
        assert_eq!(ask_save_path(&mut NoPrompt, "git_report.md"), None);
    }
}
