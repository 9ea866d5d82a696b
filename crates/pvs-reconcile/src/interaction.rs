//! Operator gate applied to each candidate before batching.
//!
//! Modes:
//! - `Automatic`: every candidate is accepted without asking.
//! - `Interactive`: each candidate goes through a [`Prompt`]. `AcceptAll`
//!   flips the policy to `Automatic` for the rest of the run; `Quit` is
//!   sticky.
//! - `DryRun`: no prompting, every candidate is a would-be accept, and the
//!   driver does not upload.

use serde::Serialize;

use crate::Record;

/// What the operator answered for one record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Skip,
    AcceptAll,
    Quit,
}

/// Source of operator decisions.
///
/// The CLI reads stdin; tests use a scripted stub.
pub trait Prompt: Send {
    fn ask(&mut self, record: &Record) -> Decision;
}

/// Stand-in for non-interactive runs.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysAccept;

impl Prompt for AlwaysAccept {
    fn ask(&mut self, _record: &Record) -> Decision {
        Decision::Accept
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionMode {
    Automatic,
    Interactive,
    DryRun,
}

/// What the driver does with the current candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gate {
    Accept,
    Skip,
    Quit,
}

#[derive(Clone, Debug)]
pub struct InteractionPolicy {
    mode: InteractionMode,
    quit: bool,
}

impl InteractionPolicy {
    pub fn new(mode: InteractionMode) -> Self {
        Self { mode, quit: false }
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn is_dry_run(&self) -> bool {
        self.mode == InteractionMode::DryRun
    }

    pub fn has_quit(&self) -> bool {
        self.quit
    }

    pub fn gate(&mut self, record: &Record, prompt: &mut dyn Prompt) -> Gate {
        if self.quit {
            return Gate::Quit;
        }
        match self.mode {
            InteractionMode::Automatic | InteractionMode::DryRun => Gate::Accept,
            InteractionMode::Interactive => match prompt.ask(record) {
                Decision::Accept => Gate::Accept,
                Decision::Skip => Gate::Skip,
                Decision::AcceptAll => {
                    self.mode = InteractionMode::Automatic;
                    Gate::Accept
                }
                Decision::Quit => {
                    self.quit = true;
                    Gate::Quit
                }
            },
        }
    }
}
