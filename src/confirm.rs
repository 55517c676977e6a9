//! Destructive actions go through an explicit intent that the caller must
//! confirm before anything happens.

use std::io::{self, BufRead, Write};

/// Answers yes/no questions about destructive actions.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

/// Confirms everything (`--yes`).
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&mut self, _prompt: &str) -> bool {
        true
    }
}

/// Declines everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct Decline;

impl Confirm for Decline {
    fn confirm(&mut self, _prompt: &str) -> bool {
        false
    }
}

/// Asks on stderr and reads the answer from a line reader.
pub struct Prompt<R> {
    input: R,
}

impl<R: BufRead> Prompt<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }
}

impl<R: BufRead> Confirm for Prompt<R> {
    fn confirm(&mut self, prompt: &str) -> bool {
        ask(prompt, |answer| self.input.read_line(answer))
    }
}

/// Asks on stderr and reads one line from the process stdin, without
/// buffering ahead so the shell still sees the lines after the answer.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinPrompt;

impl Confirm for StdinPrompt {
    fn confirm(&mut self, prompt: &str) -> bool {
        ask(prompt, |answer| io::stdin().read_line(answer))
    }
}

fn ask(prompt: &str, read: impl FnOnce(&mut String) -> io::Result<usize>) -> bool {
    eprint!("{} [y/N] ", prompt);
    let _ = io::stderr().flush();
    let mut answer = String::new();
    match read(&mut answer) {
        Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

/// A pending destructive action. Nothing happens until [`Intent::resolve`]
/// gets a yes from the confirmer.
#[must_use = "an intent does nothing until it is resolved"]
#[derive(Debug, Clone, PartialEq)]
pub struct Intent<T> {
    prompt: String,
    action: T,
}

impl<T> Intent<T> {
    pub fn new(prompt: impl Into<String>, action: T) -> Self {
        Self { prompt: prompt.into(), action }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Peeks at the action without executing it.
    pub fn action(&self) -> &T {
        &self.action
    }

    pub fn resolve(self, confirmer: &mut dyn Confirm) -> Option<T> {
        if confirmer.confirm(&self.prompt) {
            Some(self.action)
        } else {
            tracing::debug!(prompt = %self.prompt, "destructive action declined");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intent_runs_only_when_confirmed() {
        let intent = Intent::new("Delete this note?", 42);
        assert_eq!(intent.prompt(), "Delete this note?");
        assert_eq!(intent.clone().resolve(&mut Decline), None);
        assert_eq!(intent.resolve(&mut AssumeYes), Some(42));
    }

    #[test]
    fn prompt_reads_yes_and_no() {
        let mut yes = Prompt::new(&b"y\n"[..]);
        assert!(yes.confirm("sure?"));
        let mut long_yes = Prompt::new(&b"  YES \n"[..]);
        assert!(long_yes.confirm("sure?"));
        let mut no = Prompt::new(&b"\n"[..]);
        assert!(!no.confirm("sure?"));
        let mut closed = Prompt::new(&b""[..]);
        assert!(!closed.confirm("sure?"));
    }
}
