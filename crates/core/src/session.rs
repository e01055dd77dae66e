use tracing::{debug, info, warn};

use crate::catalog::steps;
use crate::config::SessionOptions;
use crate::error::SessionError;
use crate::ledger::Ledger;
use crate::model::{
    DetectionReport, InteractiveOutcome, Issue, RawMeasurements, RunState, StepId,
    StepMeasurement, StepStatus, UnmeasuredReason,
};
use crate::probe::{DeviceProbes, ProbeAdapter, ProbeOutcome};
use crate::report::assemble_report;
use crate::status::{derive_status, probe_failure_status};
use crate::text::{EnglishIssueText, IssueText};

/// One detection run over the step catalog.
///
/// The session owns the run state, ledger and measurements. Automatic steps
/// run back to back inside `start`/`resume_*`; the run only stops at an
/// interactive step, which must be resumed by id before anything else happens.
pub struct DetectionSession {
    adapter: ProbeAdapter,
    options: SessionOptions,
    text: Box<dyn IssueText + Send>,
    state: RunState,
    cursor: usize,
    ledger: Ledger,
    measurements: RawMeasurements,
    report: Option<DetectionReport>,
}

impl DetectionSession {
    pub fn new(probes: Box<dyn DeviceProbes>, options: SessionOptions) -> Self {
        Self {
            adapter: ProbeAdapter::new(probes),
            options,
            text: Box::new(EnglishIssueText),
            state: RunState::Idle,
            cursor: 0,
            ledger: Ledger::new(),
            measurements: RawMeasurements::default(),
            report: None,
        }
    }

    /// Replaces the text layer used when the report is assembled.
    pub fn with_issue_text(mut self, text: Box<dyn IssueText + Send>) -> Self {
        self.text = text;
        self
    }

    pub fn run_state(&self) -> RunState {
        self.state
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn measurements(&self) -> &RawMeasurements {
        &self.measurements
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// The interactive step the run is waiting on, if any.
    pub fn awaiting(&self) -> Option<StepId> {
        match self.state {
            RunState::Suspended(step) => Some(step),
            _ => None,
        }
    }

    pub fn start(&mut self) -> Result<RunState, SessionError> {
        if self.state != RunState::Idle {
            return Err(SessionError::NotIdle(self.state));
        }
        self.state = RunState::Running;
        info!(steps = steps().len(), "detection run started");
        self.advance()?;
        Ok(self.state)
    }

    pub fn resume_with_result(
        &mut self,
        step: StepId,
        outcome: InteractiveOutcome,
    ) -> Result<RunState, SessionError> {
        self.expect_suspended_at(step)?;
        if outcome.step() != step {
            return Err(SessionError::OutcomeMismatch {
                step,
                outcome: outcome.step(),
            });
        }

        let measurement = StepMeasurement::from(outcome);
        let (status, display_value) = derive_status(&measurement, &self.options.thresholds);
        self.record(measurement)?;
        self.ledger.settle(step, status, display_value)?;
        info!(%step, ?status, "interactive step resumed");

        self.continue_after(step)
    }

    pub fn resume_with_skip(&mut self, step: StepId) -> Result<RunState, SessionError> {
        self.expect_suspended_at(step)?;
        self.record_unmeasured(step, UnmeasuredReason::Skipped)?;
        self.ledger.settle(step, StepStatus::Skipped, None)?;
        info!(%step, "interactive step skipped");

        self.continue_after(step)
    }

    /// Abandons whatever the run holds and starts over from the first step.
    pub fn restart(&mut self) -> Result<RunState, SessionError> {
        info!(previous = ?self.state, "detection run restarted");
        self.reset();
        self.start()
    }

    /// Back to `idle` with a fresh ledger and no measurements.
    pub fn reset(&mut self) {
        self.state = RunState::Idle;
        self.cursor = 0;
        self.ledger = Ledger::new();
        self.measurements = RawMeasurements::default();
        self.report = None;
    }

    pub fn report(&self) -> Result<&DetectionReport, SessionError> {
        match (&self.report, self.state) {
            (Some(report), RunState::Completed) => Ok(report),
            _ => Err(SessionError::IncompleteRun(self.state)),
        }
    }

    pub fn score(&self) -> Result<u8, SessionError> {
        self.report().map(|report| report.score)
    }

    pub fn issues(&self) -> Result<&[Issue], SessionError> {
        self.report().map(|report| report.issues.as_slice())
    }

    pub fn into_report(self) -> Result<DetectionReport, SessionError> {
        match (self.report, self.state) {
            (Some(report), RunState::Completed) => Ok(report),
            (_, state) => Err(SessionError::IncompleteRun(state)),
        }
    }

    fn expect_suspended_at(&self, step: StepId) -> Result<(), SessionError> {
        match self.state {
            RunState::Suspended(current) if current == step => Ok(()),
            state => Err(SessionError::ProtocolViolation {
                expected: self.awaiting(),
                supplied: step,
                state,
            }),
        }
    }

    fn continue_after(&mut self, step: StepId) -> Result<RunState, SessionError> {
        debug!(%step, "continuing run");
        self.cursor += 1;
        self.state = RunState::Running;
        self.advance()?;
        Ok(self.state)
    }

    fn advance(&mut self) -> Result<(), SessionError> {
        while let Some(step) = steps().get(self.cursor) {
            self.ledger.begin(step.id)?;
            debug!(step = %step.id, "step started");

            if step.interactive {
                self.state = RunState::Suspended(step.id);
                info!(step = %step.id, "waiting for interactive result");
                return Ok(());
            }

            self.run_automatic(step.id)?;
            self.cursor += 1;
        }
        self.complete();
        Ok(())
    }

    fn run_automatic(&mut self, step: StepId) -> Result<(), SessionError> {
        let (status, display_value) = match self.adapter.measure(step) {
            ProbeOutcome::Measured(measurement) => {
                let settled = derive_status(&measurement, &self.options.thresholds);
                self.record(measurement)?;
                settled
            }
            ProbeOutcome::Failed(err) => {
                if step == StepId::Storage {
                    warn!(
                        %step,
                        "storage could not be read; step keeps a passed status"
                    );
                }
                self.record_unmeasured(
                    step,
                    UnmeasuredReason::ProbeFailed {
                        message: err.to_string(),
                    },
                )?;
                probe_failure_status(step)
            }
        };
        info!(%step, ?status, display = display_value.as_deref().unwrap_or(""), "step finished");
        self.ledger.settle(step, status, display_value)
    }

    fn record(&mut self, measurement: StepMeasurement) -> Result<(), SessionError> {
        let step = measurement.step();
        if self.measurements.is_recorded(step) {
            return Err(SessionError::MeasurementAlreadyRecorded(step));
        }
        self.measurements.store(measurement);
        Ok(())
    }

    fn record_unmeasured(
        &mut self,
        step: StepId,
        reason: UnmeasuredReason,
    ) -> Result<(), SessionError> {
        if self.measurements.is_recorded(step) {
            return Err(SessionError::MeasurementAlreadyRecorded(step));
        }
        self.measurements.store_unmeasured(step, reason);
        Ok(())
    }

    fn complete(&mut self) {
        self.state = RunState::Completed;
        let report = assemble_report(
            &self.ledger,
            &self.measurements,
            &self.options.thresholds,
            self.text.as_ref(),
        );
        info!(
            score = report.score,
            issues = report.issues.len(),
            report_id = %report.report_id,
            "detection run completed"
        );
        self.report = Some(report);
    }
}
