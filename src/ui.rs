//! Operator-facing output and confirmation prompts.

use colored::Colorize;
use std::io::{self, BufRead, Write};

/// Marker printed before successful results.
pub const CHECK_SYMBOL: &str = "\u{2714} ";

/// Marker printed before failures.
pub const CROSS_SYMBOL: &str = "\u{2716} ";

/// The only answer that confirms a prompt.
pub const YES: &str = "y";

/// Source of yes/no answers.
pub trait Confirm {
    /// Ask `message`; true only on an explicit yes.
    fn confirm(&mut self, message: &str) -> bool;
}

/// Prompts on a writer and reads single-token answers from a reader.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Consume the prompter, returning the output writer.
    pub fn into_output(self) -> W {
        self.output
    }
}

impl Prompter<io::StdinLock<'static>, io::Stdout> {
    /// A prompter on the process's terminal.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Confirm for Prompter<R, W> {
    fn confirm(&mut self, message: &str) -> bool {
        if write!(self.output, "{}", message.blue()).is_err() || self.output.flush().is_err() {
            return false;
        }

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(_) => is_yes(&line),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read confirmation");
                false
            }
        }
    }
}

/// Whether the first whitespace-delimited token of `answer` is exactly `y`.
pub fn is_yes(answer: &str) -> bool {
    answer.split_whitespace().next() == Some(YES)
}

/// Format a success line.
pub fn success_message(message: &str) -> String {
    format!("{}{}", CHECK_SYMBOL, message).green().to_string()
}

/// Format a failure line.
pub fn failure_message(message: &str) -> String {
    format!("{}{}", CROSS_SYMBOL, message).red().to_string()
}

/// Print a success line to stdout.
pub fn success(message: &str) {
    println!("{}", success_message(message));
}

/// Print a failure line to stderr.
pub fn failure(message: &str) {
    eprintln!("{}", failure_message(message));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn answer(input: &str) -> bool {
        let mut prompter = Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        prompter.confirm("Delete? [y/n]: ")
    }

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y"));
        assert!(is_yes("y\n"));
        assert!(is_yes("  y  \r\n"));
        assert!(!is_yes("n"));
        assert!(!is_yes("yes"));
        assert!(!is_yes("Y"));
        assert!(!is_yes(""));
    }

    #[test]
    fn test_prompter_answers() {
        assert!(answer("y\n"));
        assert!(!answer("n\n"));
        assert!(!answer("\n"));
        // EOF declines
        assert!(!answer(""));
    }

    #[test]
    fn test_prompter_writes_question() {
        colored::control::set_override(false);
        let mut prompter = Prompter::new(Cursor::new(b"n\n".to_vec()), Vec::new());
        prompter.confirm("Delete? [y/n]: ");

        let written = String::from_utf8(prompter.into_output()).unwrap();
        assert!(written.contains("Delete? [y/n]: "));
    }

    #[test]
    fn test_markers() {
        assert!(success_message("done").contains("\u{2714} done"));
        assert!(failure_message("oops").contains("\u{2716} oops"));
    }
}
