use std::path::PathBuf;

use device_checkup_core::model::{
    BatteryReading, DeviceOutcome, KeyboardOutcome, ScreenOutcome, SpeakerOutcome,
    StorageReading, TrackpadOutcome,
};
use device_checkup_core::{
    classify, render_issues, DetectionSession, EnglishIssueText, InteractiveOutcome,
    IssueCategory, IssueSeverity, ProbeError, RawMeasurements, RunState, SessionOptions,
    StaticProbes, StepId, StepStatus, Thresholds,
};

const WORN_DEVICE: &str = include_str!("../../../fixtures/worn-device-measurements.json");

fn fixtures_dir() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.pop();
    path.pop();
    path.push("fixtures");
    path
}

fn worn_measurements() -> RawMeasurements {
    serde_json::from_str(WORN_DEVICE).expect("fixture parses")
}

#[test]
fn worn_device_issues_follow_fixed_category_order() {
    let classification = classify(&worn_measurements(), &Thresholds::default());
    let issues = render_issues(&classification.firings, &EnglishIssueText);

    let summary = issues
        .iter()
        .map(|issue| (issue.rule_id.as_str(), issue.severity))
        .collect::<Vec<_>>();
    assert_eq!(
        summary,
        vec![
            ("battery_health", IssueSeverity::Failed),
            ("battery_cycle_count", IssueSeverity::Failed),
            ("storage_smart", IssueSeverity::Failed),
            ("screen_dead_pixel", IssueSeverity::Warning),
            ("keyboard_incomplete", IssueSeverity::Warning),
            ("trackpad_functions", IssueSeverity::Warning),
            ("microphone_not_working", IssueSeverity::Failed),
            ("speaker_channels", IssueSeverity::Warning),
            ("replaced_part", IssueSeverity::Warning),
            ("refurbishment_indicator", IssueSeverity::Warning),
            ("refurbishment_indicator", IssueSeverity::Warning),
        ]
    );
    assert!(issues
        .iter()
        .all(|issue| issue.category != IssueCategory::Camera));
    assert!(issues[5].description.contains("gesture"));
    assert!(issues[7].description.contains("right"));
}

#[test]
fn classification_is_repeatable_for_saved_measurements() {
    let measurements = worn_measurements();
    let first = classify(&measurements, &Thresholds::default());
    let second = classify(&measurements, &Thresholds::default());
    assert_eq!(first, second);
}

#[test]
fn threshold_file_changes_classification() {
    let thresholds =
        Thresholds::from_file(&fixtures_dir().join("strict-thresholds.json")).expect("thresholds");
    assert_eq!(thresholds.battery_health_fail, 60.0);

    let measurements = RawMeasurements {
        battery: device_checkup_core::Measurement::Measured(BatteryReading {
            health: 85.0,
            cycle_count: 420,
            design_capacity: 6000,
            current_capacity: 5100,
            is_charging: false,
            temperature: None,
        }),
        ..RawMeasurements::default()
    };

    assert!(classify(&measurements, &Thresholds::default())
        .firings
        .is_empty());
    let strict = classify(&measurements, &thresholds);
    let rules = strict
        .firings
        .iter()
        .map(|firing| firing.finding.rule_id())
        .collect::<Vec<_>>();
    assert_eq!(rules, vec!["battery_health", "battery_cycle_count"]);
}

#[test]
fn mixed_run_produces_consistent_report() {
    let probes = StaticProbes {
        battery: Ok(BatteryReading {
            health: 74.0,
            cycle_count: 640,
            design_capacity: 5000,
            current_capacity: 3700,
            is_charging: false,
            temperature: None,
        }),
        storage: Ok(StorageReading {
            model: "APPLE SSD AP0256Q".to_string(),
            smart_status: "Failing".to_string(),
            power_on_hours: Some(12_000),
            temperature: None,
        }),
        sensors: Err(ProbeError::Unavailable("no sensors".to_string())),
        ..StaticProbes::healthy()
    };
    let mut session = DetectionSession::new(Box::new(probes), SessionOptions::default());

    let mut state = session.start().expect("start");
    let outcomes = [
        InteractiveOutcome::Screen(ScreenOutcome { dead_pixel: false }),
        InteractiveOutcome::Keyboard(KeyboardOutcome {
            tested_keys: 78,
            total_keys: 78,
        }),
        InteractiveOutcome::Trackpad(TrackpadOutcome {
            click: true,
            drag: true,
            gesture: true,
        }),
    ];
    for outcome in outcomes {
        let RunState::Suspended(step) = state else {
            panic!("expected suspension, got {state:?}");
        };
        state = session
            .resume_with_result(step, outcome)
            .expect("resume");
    }
    assert_eq!(state, RunState::Suspended(StepId::Camera));
    assert_eq!(
        session.resume_with_skip(StepId::Camera).expect("skip camera"),
        RunState::Suspended(StepId::Microphone)
    );
    session
        .resume_with_result(
            StepId::Microphone,
            InteractiveOutcome::Microphone(DeviceOutcome { working: true }),
        )
        .expect("microphone");
    state = session
        .resume_with_result(
            StepId::Speaker,
            InteractiveOutcome::Speaker(SpeakerOutcome {
                left: true,
                right: true,
            }),
        )
        .expect("speaker");
    assert_eq!(state, RunState::Completed);

    let report = session.report().expect("report");
    let ledger_statuses = report
        .steps
        .iter()
        .map(|step| (step.id, step.status))
        .collect::<Vec<_>>();
    assert_eq!(
        ledger_statuses,
        vec![
            (StepId::Hardware, StepStatus::Passed),
            (StepId::Battery, StepStatus::Warning),
            (StepId::Storage, StepStatus::Warning),
            (StepId::Refurbishment, StepStatus::Passed),
            (StepId::Network, StepStatus::Passed),
            (StepId::Sensors, StepStatus::Passed),
            (StepId::Screen, StepStatus::Passed),
            (StepId::Keyboard, StepStatus::Passed),
            (StepId::Trackpad, StepStatus::Passed),
            (StepId::Camera, StepStatus::Skipped),
            (StepId::Microphone, StepStatus::Passed),
            (StepId::Speaker, StepStatus::Passed),
        ]
    );

    // (9 passed + 2 warnings * 0.5) / 12 = 83.3
    assert_eq!(report.score, 83);
    let counts = report.counts;
    assert_eq!(
        counts.total,
        counts.passed + counts.warning + counts.failed + counts.skipped + counts.pending
    );
    assert_eq!(counts.testing, 0);

    let rules = report
        .issues
        .iter()
        .map(|issue| (issue.rule_id.as_str(), issue.severity))
        .collect::<Vec<_>>();
    assert_eq!(
        rules,
        vec![
            ("battery_health", IssueSeverity::Warning),
            ("battery_cycle_count", IssueSeverity::Warning),
            ("storage_smart", IssueSeverity::Failed),
        ]
    );
    assert!(report.summaries.device.is_some());
    assert!(report.summaries.battery.is_some());
}
