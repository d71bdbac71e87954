//! Progress surface for polling callers

use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;

pub const TOTAL_STEPS: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Step {
    Planning = 1,
    Architecture = 2,
    Development = 3,
    Review = 4,
    Testing = 5,
    Materialization = 6,
    Scoring = 7,
    Finalization = 8,
}

impl Step {
    pub const ALL: [Step; 8] = [
        Step::Planning,
        Step::Architecture,
        Step::Development,
        Step::Review,
        Step::Testing,
        Step::Materialization,
        Step::Scoring,
        Step::Finalization,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.get(usize::from(n).checked_sub(1)?).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            Step::Planning => "planning",
            Step::Architecture => "architecture",
            Step::Development => "development",
            Step::Review => "review",
            Step::Testing => "testing",
            Step::Materialization => "materialization",
            Step::Scoring => "scoring",
            Step::Finalization => "finalization",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {}/{}: {}", self.number(), TOTAL_STEPS, self.label())
    }
}

#[derive(Debug, Default)]
struct Inner {
    furthest: AtomicU8,
    active: AtomicU8,
    iteration: AtomicU32,
}

/// Cheap cloneable handle onto a pipeline's progress.
///
/// `current_step` only moves forward. The pair `(iteration, active step)`
/// never decreases within a run: an architecture revision between iterations
/// counts towards the next iteration.
#[derive(Debug, Clone, Default)]
pub struct Progress {
    inner: Arc<Inner>,
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reset(&self) {
        self.inner.furthest.store(0, Ordering::SeqCst);
        self.inner.active.store(0, Ordering::SeqCst);
        self.inner.iteration.store(0, Ordering::SeqCst);
    }

    pub(crate) fn enter(&self, step: Step) {
        self.inner.active.store(step.number(), Ordering::SeqCst);
        self.inner.furthest.fetch_max(step.number(), Ordering::SeqCst);
    }

    pub(crate) fn begin_iteration(&self, iteration: u32) {
        self.inner.iteration.fetch_max(iteration, Ordering::SeqCst);
    }

    /// Furthest step reached, 0 before the run starts
    pub fn current_step(&self) -> u8 {
        self.inner.furthest.load(Ordering::SeqCst)
    }

    /// Step being executed right now
    pub fn active_step(&self) -> Option<Step> {
        Step::from_number(self.inner.active.load(Ordering::SeqCst))
    }

    pub fn iteration(&self) -> u32 {
        self.inner.iteration.load(Ordering::SeqCst)
    }

    /// `(iteration, active step number)`
    pub fn position(&self) -> (u32, u8) {
        (self.iteration(), self.inner.active.load(Ordering::SeqCst))
    }
}

/// One line per step, marking the steps up to `reached` as done
pub fn step_report(reached: u8) -> String {
    Step::ALL
        .iter()
        .map(|step| {
            let state = if step.number() <= reached { "done" } else { "pending" };
            format!("Step {}/{} {}: {}", step.number(), TOTAL_STEPS, step.label(), state)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
