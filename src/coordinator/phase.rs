//! Run lifecycle: `Idle → Validating → (Rejected | Applying) → (Applied | Failed)`.

use log::{debug, error};
use serde::Serialize;
use std::fmt;

/// Phase of one import run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ImportPhase {
    Idle,
    Validating,
    Rejected,
    Applying,
    Applied,
    Failed,
}

impl ImportPhase {
    /// Whether the state machine allows moving from `self` to `next`.
    ///
    /// `Validating → Failed` covers store reads that error before anything
    /// was written.
    pub fn can_transition_to(self, next: ImportPhase) -> bool {
        use ImportPhase::*;
        matches!(
            (self, next),
            (Idle, Validating)
                | (Validating, Rejected)
                | (Validating, Applying)
                | (Validating, Failed)
                | (Applying, Applied)
                | (Applying, Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ImportPhase::Rejected | ImportPhase::Applied | ImportPhase::Failed
        )
    }
}

impl fmt::Display for ImportPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImportPhase::Idle => "idle",
            ImportPhase::Validating => "validating",
            ImportPhase::Rejected => "rejected",
            ImportPhase::Applying => "applying",
            ImportPhase::Applied => "applied",
            ImportPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Bookkeeping for one run.
#[derive(Debug)]
pub(crate) struct ImportRun {
    pub(crate) id: String,
    pub(crate) realm: String,
    phase: ImportPhase,
}

impl ImportRun {
    pub(crate) fn new(realm: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            realm: realm.to_string(),
            phase: ImportPhase::Idle,
        }
    }

    #[cfg(test)]
    pub(crate) fn phase(&self) -> ImportPhase {
        self.phase
    }

    pub(crate) fn advance(&mut self, next: ImportPhase) {
        if !self.phase.can_transition_to(next) {
            error!(
                "import {} on realm '{}': illegal transition {} -> {}",
                self.id, self.realm, self.phase, next
            );
            debug_assert!(false, "illegal import transition {} -> {}", self.phase, next);
        }
        debug!(
            "import {} on realm '{}': {} -> {}",
            self.id, self.realm, self.phase, next
        );
        self.phase = next;
    }
}
