//! Interactive confirmation seam. The pipeline asks through the `Prompter`
//! trait so tests can inject a deterministic responder instead of stdin.

use std::collections::VecDeque;
use std::io::{BufRead, Write};

// ---------------------------------------------------------------------------
// PromptReply
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptReply {
    /// Apply the plan read-write.
    Continue,
    /// Apply nothing; finish the run read-only.
    ReadOnly,
    /// Terminate without applying.
    Stop,
}

impl PromptReply {
    /// Exact-match parse of a trimmed operator reply.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "continue" => Some(PromptReply::Continue),
            "readonly" => Some(PromptReply::ReadOnly),
            "stop" => Some(PromptReply::Stop),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Prompter
// ---------------------------------------------------------------------------

pub trait Prompter {
    /// Present the planned report and block until the operator answers.
    fn ask(&mut self, report: &str) -> std::io::Result<PromptReply>;
}

/// Blocking stdin prompter. Unrecognized input re-prompts; end of input is
/// treated as `stop` so a closed pipe never applies writes.
#[derive(Debug, Default)]
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn ask(&mut self, report: &str) -> std::io::Result<PromptReply> {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        writeln!(stdout, "{report}")?;
        loop {
            write!(stdout, "apply this plan? [continue/readonly/stop] ")?;
            stdout.flush()?;
            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                return Ok(PromptReply::Stop);
            }
            if let Some(reply) = PromptReply::parse(&line) {
                return Ok(reply);
            }
        }
    }
}

/// Canned replies for tests.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    replies: VecDeque<PromptReply>,
    pub reports_seen: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new(replies: impl IntoIterator<Item = PromptReply>) -> Self {
        Self {
            replies: replies.into_iter().collect(),
            reports_seen: Vec::new(),
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, report: &str) -> std::io::Result<PromptReply> {
        self.reports_seen.push(report.to_string());
        Ok(self.replies.pop_front().unwrap_or(PromptReply::Stop))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_exact_and_trimmed() {
        assert_eq!(PromptReply::parse("continue"), Some(PromptReply::Continue));
        assert_eq!(PromptReply::parse("  readonly \n"), Some(PromptReply::ReadOnly));
        assert_eq!(PromptReply::parse("stop"), Some(PromptReply::Stop));
        assert_eq!(PromptReply::parse("Continue"), None);
        assert_eq!(PromptReply::parse("yes"), None);
        assert_eq!(PromptReply::parse(""), None);
    }

    #[test]
    fn scripted_prompter_replays_and_records() {
        let mut p = ScriptedPrompter::new([PromptReply::Continue]);
        assert_eq!(p.ask("the plan").unwrap(), PromptReply::Continue);
        assert_eq!(p.reports_seen, vec!["the plan".to_string()]);
        // Exhausted scripts fail safe.
        assert_eq!(p.ask("again").unwrap(), PromptReply::Stop);
    }
}
