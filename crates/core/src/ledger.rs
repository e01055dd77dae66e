use serde::{Deserialize, Serialize};

use crate::catalog::steps;
use crate::error::SessionError;
use crate::model::{StatusCounts, StepId, StepStatus};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerEntry {
    pub id: StepId,
    pub status: StepStatus,
    pub display_value: Option<String>,
    /// Set once a settled step has gone back to `testing`.
    #[serde(default)]
    pub reentered: bool,
}

/// Per-run status of every catalog step, kept in catalog order.
///
/// Writers are crate-private so only the detection session mutates it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            entries: steps()
                .iter()
                .map(|step| LedgerEntry {
                    id: step.id,
                    status: StepStatus::Pending,
                    display_value: None,
                    reentered: false,
                })
                .collect(),
        }
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn entry(&self, step: StepId) -> Option<&LedgerEntry> {
        self.entries.iter().find(|entry| entry.id == step)
    }

    pub fn status(&self, step: StepId) -> StepStatus {
        self.entry(step)
            .map(|entry| entry.status)
            .unwrap_or_default()
    }

    pub fn counts(&self) -> StatusCounts {
        StatusCounts::tally(self.entries.iter().map(|entry| &entry.status))
    }

    /// Marks a step as under test. Allowed from `pending`, and once from a
    /// settled status when the step is entered again.
    pub(crate) fn begin(&mut self, step: StepId) -> Result<(), SessionError> {
        let entry = self.entry_mut(step)?;
        match entry.status {
            StepStatus::Pending => {}
            status if status.is_terminal() && !entry.reentered => entry.reentered = true,
            from => {
                return Err(SessionError::InvalidTransition {
                    step,
                    from,
                    to: StepStatus::Testing,
                })
            }
        }
        entry.status = StepStatus::Testing;
        entry.display_value = None;
        Ok(())
    }

    pub(crate) fn settle(
        &mut self,
        step: StepId,
        status: StepStatus,
        display_value: Option<String>,
    ) -> Result<(), SessionError> {
        let entry = self.entry_mut(step)?;
        if entry.status != StepStatus::Testing || !status.is_terminal() {
            return Err(SessionError::InvalidTransition {
                step,
                from: entry.status,
                to: status,
            });
        }
        entry.status = status;
        entry.display_value = display_value;
        Ok(())
    }

    fn entry_mut(&mut self, step: StepId) -> Result<&mut LedgerEntry, SessionError> {
        // Every catalog step is seeded in `new`, so a miss means the id is not in the catalog.
        self.entries
            .iter_mut()
            .find(|entry| entry.id == step)
            .ok_or(SessionError::InvalidTransition {
                step,
                from: StepStatus::Pending,
                to: StepStatus::Testing,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::Ledger;
    use crate::catalog::steps;
    use crate::error::SessionError;
    use crate::model::{StepId, StepStatus};

    #[test]
    fn new_ledger_holds_every_step_as_pending() {
        let ledger = Ledger::new();
        assert_eq!(ledger.entries().len(), steps().len());
        assert!(ledger
            .entries()
            .iter()
            .all(|entry| entry.status == StepStatus::Pending));

        let counts = ledger.counts();
        assert_eq!(counts.total, steps().len());
        assert_eq!(counts.pending, steps().len());
    }

    #[test]
    fn counts_always_sum_to_total() {
        let mut ledger = Ledger::new();
        ledger.begin(StepId::Hardware).expect("begin");
        ledger
            .settle(StepId::Hardware, StepStatus::Passed, Some("M2".to_string()))
            .expect("settle");
        ledger.begin(StepId::Battery).expect("begin");

        let counts = ledger.counts();
        assert_eq!(
            counts.total,
            counts.passed
                + counts.warning
                + counts.failed
                + counts.skipped
                + counts.pending
                + counts.testing
        );
        assert_eq!(counts.passed, 1);
        assert_eq!(counts.testing, 1);
    }

    #[test]
    fn settle_requires_step_under_test() {
        let mut ledger = Ledger::new();
        let err = ledger
            .settle(StepId::Battery, StepStatus::Passed, None)
            .expect_err("pending step cannot settle");
        assert_eq!(
            err,
            SessionError::InvalidTransition {
                step: StepId::Battery,
                from: StepStatus::Pending,
                to: StepStatus::Passed,
            }
        );
    }

    #[test]
    fn settled_step_may_be_entered_again() {
        let mut ledger = Ledger::new();
        ledger.begin(StepId::Screen).expect("begin");
        ledger
            .settle(StepId::Screen, StepStatus::Warning, None)
            .expect("settle");
        ledger.begin(StepId::Screen).expect("re-enter");
        assert_eq!(ledger.status(StepId::Screen), StepStatus::Testing);
        assert!(ledger.begin(StepId::Screen).is_err());
    }

    #[test]
    fn second_re_entry_is_rejected() {
        let mut ledger = Ledger::new();
        for _ in 0..2 {
            ledger.begin(StepId::Screen).expect("begin");
            ledger
                .settle(StepId::Screen, StepStatus::Passed, None)
                .expect("settle");
        }

        let err = ledger
            .begin(StepId::Screen)
            .expect_err("only one re-entry per run");
        assert_eq!(
            err,
            SessionError::InvalidTransition {
                step: StepId::Screen,
                from: StepStatus::Passed,
                to: StepStatus::Testing,
            }
        );
        assert_eq!(ledger.status(StepId::Screen), StepStatus::Passed);
    }
}
