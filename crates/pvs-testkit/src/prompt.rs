use std::collections::VecDeque;

use pvs_reconcile::{Decision, Instant, Prompt, Record};

/// Replays a fixed list of operator answers, then answers `Quit` (like a
/// closed stdin).
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<Decision>,
    asked: Vec<Instant>,
}

impl ScriptedPrompt {
    pub fn new(answers: impl IntoIterator<Item = Decision>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    /// Records the operator was asked about, in order.
    pub fn asked(&self) -> &[Instant] {
        &self.asked
    }
}

impl Prompt for ScriptedPrompt {
    fn ask(&mut self, record: &Record) -> Decision {
        self.asked.push(record.timestamp());
        self.answers.pop_front().unwrap_or(Decision::Quit)
    }
}
