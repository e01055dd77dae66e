pub mod catalog;
pub mod classify;
pub mod config;
pub mod error;
pub mod ledger;
pub mod markdown;
pub mod model;
pub mod probe;
pub mod refurbish;
pub mod report;
pub mod score;
pub mod session;
pub mod static_probe;
pub mod status;
pub mod system_probe;
pub mod text;

pub use catalog::{find_step, steps, Step, STEP_CATALOG};
pub use classify::{classify, Classification, Finding, RuleFiring};
pub use config::{SessionOptions, Thresholds};
pub use error::{ProbeError, SessionError};
pub use ledger::{Ledger, LedgerEntry};
pub use markdown::render_markdown_summary;
pub use model::{
    DetectionReport, InteractiveOutcome, Issue, IssueCategory, IssueSeverity, Measurement,
    RawMeasurements, RuleTrace, RuleTraceStatus, RunState, StatusCounts, StepCategory, StepId,
    StepMeasurement, StepResult, StepStatus, UnmeasuredReason, REPORT_VERSION,
};
pub use probe::{DeviceProbes, ProbeAdapter, ProbeOutcome};
pub use refurbish::{assess_refurbishment, RefurbishmentSignals};
pub use report::assemble_report;
pub use score::calculate_score;
pub use session::DetectionSession;
pub use static_probe::StaticProbes;
pub use status::{derive_status, probe_failure_status};
pub use system_probe::SystemProbes;
pub use text::{render_issues, EnglishIssueText, IssueText};
