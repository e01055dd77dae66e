use serde::{Deserialize, Serialize};

use crate::config::Thresholds;
use crate::model::{
    BatteryReading, DeviceOutcome, IndicatorSeverity, IssueCategory, IssueSeverity,
    KeyboardOutcome, RawMeasurements, RefurbishmentCheck, RuleTrace, RuleTraceStatus,
    ScreenOutcome, SpeakerChannel, SpeakerOutcome, StorageReading, TrackpadFunction,
    TrackpadOutcome,
};

/// What a rule observed. Carries the data the text layer needs, never prose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Finding {
    BatteryHealth { health: f64 },
    BatteryCycleCount { cycle_count: u32 },
    StorageSmart { smart_status: String },
    ScreenDeadPixel,
    KeyboardIncomplete { tested_keys: u32, total_keys: u32 },
    TrackpadFunctions { failing: Vec<TrackpadFunction> },
    CameraNotWorking,
    MicrophoneNotWorking,
    SpeakerChannels { failing: Vec<SpeakerChannel> },
    ReplacedPart { part: String },
    CertifiedRefurbishment { program: String },
    RefurbishmentIndicator { name: String, description: String },
}

impl Finding {
    pub fn rule_id(&self) -> &'static str {
        match self {
            Finding::BatteryHealth { .. } => "battery_health",
            Finding::BatteryCycleCount { .. } => "battery_cycle_count",
            Finding::StorageSmart { .. } => "storage_smart",
            Finding::ScreenDeadPixel => "screen_dead_pixel",
            Finding::KeyboardIncomplete { .. } => "keyboard_incomplete",
            Finding::TrackpadFunctions { .. } => "trackpad_functions",
            Finding::CameraNotWorking => "camera_not_working",
            Finding::MicrophoneNotWorking => "microphone_not_working",
            Finding::SpeakerChannels { .. } => "speaker_channels",
            Finding::ReplacedPart { .. } => "replaced_part",
            Finding::CertifiedRefurbishment { .. } => "certified_refurbishment",
            Finding::RefurbishmentIndicator { .. } => "refurbishment_indicator",
        }
    }

    pub fn category(&self) -> IssueCategory {
        match self {
            Finding::BatteryHealth { .. } | Finding::BatteryCycleCount { .. } => {
                IssueCategory::Battery
            }
            Finding::StorageSmart { .. } => IssueCategory::Storage,
            Finding::ScreenDeadPixel => IssueCategory::Screen,
            Finding::KeyboardIncomplete { .. } => IssueCategory::Keyboard,
            Finding::TrackpadFunctions { .. } => IssueCategory::Trackpad,
            Finding::CameraNotWorking => IssueCategory::Camera,
            Finding::MicrophoneNotWorking => IssueCategory::Microphone,
            Finding::SpeakerChannels { .. } => IssueCategory::Speaker,
            Finding::ReplacedPart { .. }
            | Finding::CertifiedRefurbishment { .. }
            | Finding::RefurbishmentIndicator { .. } => IssueCategory::Refurbishment,
        }
    }

    /// Machine-readable evidence line, independent of the text layer.
    pub fn evidence(&self) -> Option<String> {
        match self {
            Finding::BatteryHealth { health } => Some(format!("health={health:.1}%")),
            Finding::BatteryCycleCount { cycle_count } => Some(format!("cycles={cycle_count}")),
            Finding::StorageSmart { smart_status } => Some(format!("smart={smart_status}")),
            Finding::KeyboardIncomplete {
                tested_keys,
                total_keys,
            } => Some(format!("keys={tested_keys}/{total_keys}")),
            Finding::TrackpadFunctions { failing } => Some(format!(
                "failing={}",
                failing
                    .iter()
                    .map(|function| trackpad_function_id(*function))
                    .collect::<Vec<_>>()
                    .join(",")
            )),
            Finding::SpeakerChannels { failing } => Some(format!(
                "failing={}",
                failing
                    .iter()
                    .map(|channel| speaker_channel_id(*channel))
                    .collect::<Vec<_>>()
                    .join(",")
            )),
            Finding::RefurbishmentIndicator { name, .. } => Some(format!("indicator={name}")),
            Finding::ScreenDeadPixel
            | Finding::CameraNotWorking
            | Finding::MicrophoneNotWorking
            | Finding::ReplacedPart { .. }
            | Finding::CertifiedRefurbishment { .. } => None,
        }
    }
}

pub fn trackpad_function_id(function: TrackpadFunction) -> &'static str {
    match function {
        TrackpadFunction::Click => "click",
        TrackpadFunction::Drag => "drag",
        TrackpadFunction::Gesture => "gesture",
    }
}

pub fn speaker_channel_id(channel: SpeakerChannel) -> &'static str {
    match channel {
        SpeakerChannel::Left => "left",
        SpeakerChannel::Right => "right",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleFiring {
    pub finding: Finding,
    pub severity: IssueSeverity,
}

impl RuleFiring {
    fn new(finding: Finding, severity: IssueSeverity) -> Self {
        Self { finding, severity }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Classification {
    pub firings: Vec<RuleFiring>,
    pub rule_traces: Vec<RuleTrace>,
}

enum RuleResult {
    NotTested,
    Clear(String),
    Fired(Vec<RuleFiring>),
}

impl RuleResult {
    fn fired(firing: RuleFiring) -> Self {
        RuleResult::Fired(vec![firing])
    }

    fn many(firings: Vec<RuleFiring>, clear: &str) -> Self {
        if firings.is_empty() {
            RuleResult::Clear(clear.to_string())
        } else {
            RuleResult::Fired(firings)
        }
    }
}

/// Runs every rule over the final measurements. Output order is fixed by rule
/// order, not by evaluation: battery, storage, interactive categories, then
/// refurbishment findings.
pub fn classify(measurements: &RawMeasurements, thresholds: &Thresholds) -> Classification {
    let battery = measurements.battery.value();
    let refurbishment = measurements.refurbishment.value();
    let mut classification = Classification::default();

    emit(
        "battery_health",
        battery_health_rule(battery, thresholds),
        &mut classification,
    );
    emit(
        "battery_cycle_count",
        battery_cycle_rule(battery, thresholds),
        &mut classification,
    );
    emit(
        "storage_smart",
        storage_rule(measurements.storage.value()),
        &mut classification,
    );
    emit(
        "screen_dead_pixel",
        screen_rule(measurements.screen.value()),
        &mut classification,
    );
    emit(
        "keyboard_incomplete",
        keyboard_rule(measurements.keyboard.value()),
        &mut classification,
    );
    emit(
        "trackpad_functions",
        trackpad_rule(measurements.trackpad.value()),
        &mut classification,
    );
    emit(
        "camera_not_working",
        device_rule(measurements.camera.value(), Finding::CameraNotWorking),
        &mut classification,
    );
    emit(
        "microphone_not_working",
        device_rule(measurements.microphone.value(), Finding::MicrophoneNotWorking),
        &mut classification,
    );
    emit(
        "speaker_channels",
        speaker_rule(measurements.speaker.value()),
        &mut classification,
    );
    emit(
        "replaced_part",
        replaced_parts_rule(refurbishment),
        &mut classification,
    );
    emit(
        "certified_refurbishment",
        certified_program_rule(refurbishment),
        &mut classification,
    );
    emit(
        "refurbishment_indicator",
        indicator_rule(refurbishment),
        &mut classification,
    );

    classification
}

fn emit(rule_id: &str, result: RuleResult, out: &mut Classification) {
    let (status, detail) = match result {
        RuleResult::NotTested => (
            RuleTraceStatus::NotTested,
            "Category was not measured in this run.".to_string(),
        ),
        RuleResult::Clear(detail) => (RuleTraceStatus::Skipped, detail),
        RuleResult::Fired(firings) => {
            let detail = format!("Rule produced {} finding(s).", firings.len());
            out.firings.extend(firings);
            (RuleTraceStatus::Emitted, detail)
        }
    };
    out.rule_traces.push(RuleTrace {
        rule_id: rule_id.to_string(),
        status,
        detail,
    });
}

fn battery_health_rule(battery: Option<&BatteryReading>, thresholds: &Thresholds) -> RuleResult {
    let Some(battery) = battery else {
        return RuleResult::NotTested;
    };
    if battery.health >= thresholds.battery_health_pass {
        return RuleResult::Clear(format!(
            "Health {:.1}% is at or above {:.0}%.",
            battery.health, thresholds.battery_health_pass
        ));
    }
    let severity = if battery.health >= thresholds.battery_health_fail {
        IssueSeverity::Warning
    } else {
        IssueSeverity::Failed
    };
    RuleResult::fired(RuleFiring::new(
        Finding::BatteryHealth {
            health: battery.health,
        },
        severity,
    ))
}

fn battery_cycle_rule(battery: Option<&BatteryReading>, thresholds: &Thresholds) -> RuleResult {
    let Some(battery) = battery else {
        return RuleResult::NotTested;
    };
    if battery.cycle_count <= thresholds.cycle_count_warning {
        return RuleResult::Clear(format!(
            "{} cycles is within {}.",
            battery.cycle_count, thresholds.cycle_count_warning
        ));
    }
    let severity = if battery.cycle_count <= thresholds.cycle_count_fail {
        IssueSeverity::Warning
    } else {
        IssueSeverity::Failed
    };
    RuleResult::fired(RuleFiring::new(
        Finding::BatteryCycleCount {
            cycle_count: battery.cycle_count,
        },
        severity,
    ))
}

fn storage_rule(storage: Option<&StorageReading>) -> RuleResult {
    let Some(storage) = storage else {
        return RuleResult::NotTested;
    };
    if storage.is_healthy() {
        return RuleResult::Clear(format!("SMART status is {}.", storage.smart_status));
    }
    // Degraded storage is always a failure, never a warning.
    RuleResult::fired(RuleFiring::new(
        Finding::StorageSmart {
            smart_status: storage.smart_status.clone(),
        },
        IssueSeverity::Failed,
    ))
}

fn screen_rule(screen: Option<&ScreenOutcome>) -> RuleResult {
    match screen {
        None => RuleResult::NotTested,
        Some(screen) if screen.dead_pixel => RuleResult::fired(RuleFiring::new(
            Finding::ScreenDeadPixel,
            IssueSeverity::Warning,
        )),
        Some(_) => RuleResult::Clear("No dead pixels reported.".to_string()),
    }
}

fn keyboard_rule(keyboard: Option<&KeyboardOutcome>) -> RuleResult {
    let Some(keyboard) = keyboard else {
        return RuleResult::NotTested;
    };
    if keyboard.tested_ratio() >= 1.0 {
        return RuleResult::Clear("Every key registered.".to_string());
    }
    RuleResult::fired(RuleFiring::new(
        Finding::KeyboardIncomplete {
            tested_keys: keyboard.tested_keys.min(keyboard.total_keys),
            total_keys: keyboard.total_keys,
        },
        IssueSeverity::Warning,
    ))
}

fn trackpad_rule(trackpad: Option<&TrackpadOutcome>) -> RuleResult {
    let Some(trackpad) = trackpad else {
        return RuleResult::NotTested;
    };
    let failing = trackpad.failing_functions();
    if failing.is_empty() {
        return RuleResult::Clear("Click, drag and gesture all responded.".to_string());
    }
    RuleResult::fired(RuleFiring::new(
        Finding::TrackpadFunctions { failing },
        IssueSeverity::Warning,
    ))
}

fn device_rule(device: Option<&DeviceOutcome>, finding: Finding) -> RuleResult {
    match device {
        None => RuleResult::NotTested,
        Some(device) if device.working => RuleResult::Clear("Device is working.".to_string()),
        Some(_) => RuleResult::fired(RuleFiring::new(finding, IssueSeverity::Failed)),
    }
}

fn speaker_rule(speaker: Option<&SpeakerOutcome>) -> RuleResult {
    let Some(speaker) = speaker else {
        return RuleResult::NotTested;
    };
    let failing = speaker.failing_channels();
    if failing.is_empty() {
        return RuleResult::Clear("Both channels confirmed.".to_string());
    }
    RuleResult::fired(RuleFiring::new(
        Finding::SpeakerChannels { failing },
        IssueSeverity::Warning,
    ))
}

fn replaced_parts_rule(check: Option<&RefurbishmentCheck>) -> RuleResult {
    let Some(check) = check else {
        return RuleResult::NotTested;
    };
    let firings = check
        .replaced_parts
        .iter()
        .map(|part| {
            RuleFiring::new(
                Finding::ReplacedPart { part: part.clone() },
                IssueSeverity::Warning,
            )
        })
        .collect();
    RuleResult::many(firings, "No replaced parts detected.")
}

fn certified_program_rule(check: Option<&RefurbishmentCheck>) -> RuleResult {
    let Some(check) = check else {
        return RuleResult::NotTested;
    };
    match &check.details.refurb_program {
        Some(program) => RuleResult::fired(RuleFiring::new(
            Finding::CertifiedRefurbishment {
                program: program.clone(),
            },
            IssueSeverity::Warning,
        )),
        None => RuleResult::Clear("No refurbishment program recorded.".to_string()),
    }
}

fn indicator_rule(check: Option<&RefurbishmentCheck>) -> RuleResult {
    let Some(check) = check else {
        return RuleResult::NotTested;
    };
    let firings = check
        .flagged_indicators()
        .map(|indicator| {
            let severity = match indicator.severity {
                IndicatorSeverity::Critical => IssueSeverity::Failed,
                IndicatorSeverity::Warning | IndicatorSeverity::Info => IssueSeverity::Warning,
            };
            RuleFiring::new(
                Finding::RefurbishmentIndicator {
                    name: indicator.name.clone(),
                    description: indicator.description.clone(),
                },
                severity,
            )
        })
        .collect();
    RuleResult::many(firings, "No warning or critical indicators.")
}

#[cfg(test)]
mod tests {
    use super::{classify, Finding};
    use crate::config::Thresholds;
    use crate::model::{
        BatteryReading, DeviceOutcome, IndicatorSeverity, IssueCategory, IssueSeverity,
        KeyboardOutcome, Measurement, RawMeasurements, RefurbishmentCheck,
        RefurbishmentConfidence, RefurbishmentDetails, RefurbishmentIndicator, RuleTraceStatus,
        SpeakerChannel, SpeakerOutcome, StorageReading, TrackpadFunction, TrackpadOutcome,
        UnmeasuredReason,
    };

    fn with_battery(health: f64, cycle_count: u32) -> RawMeasurements {
        RawMeasurements {
            battery: Measurement::Measured(BatteryReading {
                health,
                cycle_count,
                design_capacity: 5000,
                current_capacity: 3000,
                is_charging: false,
                temperature: None,
            }),
            ..RawMeasurements::default()
        }
    }

    fn severities(measurements: &RawMeasurements, rule_id: &str) -> Vec<IssueSeverity> {
        classify(measurements, &Thresholds::default())
            .firings
            .into_iter()
            .filter(|firing| firing.finding.rule_id() == rule_id)
            .map(|firing| firing.severity)
            .collect()
    }

    #[test]
    fn battery_health_thresholds() {
        assert_eq!(
            severities(&with_battery(55.0, 100), "battery_health"),
            vec![IssueSeverity::Failed]
        );
        assert_eq!(
            severities(&with_battery(75.0, 100), "battery_health"),
            vec![IssueSeverity::Warning]
        );
        assert!(severities(&with_battery(85.0, 100), "battery_health").is_empty());
    }

    #[test]
    fn cycle_count_thresholds() {
        assert_eq!(
            severities(&with_battery(90.0, 850), "battery_cycle_count"),
            vec![IssueSeverity::Failed]
        );
        assert_eq!(
            severities(&with_battery(90.0, 600), "battery_cycle_count"),
            vec![IssueSeverity::Warning]
        );
        assert_eq!(
            severities(&with_battery(90.0, 800), "battery_cycle_count"),
            vec![IssueSeverity::Warning]
        );
        assert!(severities(&with_battery(90.0, 400), "battery_cycle_count").is_empty());
        assert!(severities(&with_battery(90.0, 500), "battery_cycle_count").is_empty());
    }

    #[test]
    fn unhealthy_storage_is_always_failed() {
        let measurements = RawMeasurements {
            storage: Measurement::Measured(StorageReading {
                model: "Generic".to_string(),
                smart_status: "Failing".to_string(),
                power_on_hours: None,
                temperature: None,
            }),
            ..RawMeasurements::default()
        };
        assert_eq!(
            severities(&measurements, "storage_smart"),
            vec![IssueSeverity::Failed]
        );
    }

    #[test]
    fn interactive_findings_name_failing_parts() {
        let measurements = RawMeasurements {
            keyboard: Measurement::Measured(KeyboardOutcome {
                tested_keys: 70,
                total_keys: 78,
            }),
            trackpad: Measurement::Measured(TrackpadOutcome {
                click: true,
                drag: false,
                gesture: false,
            }),
            camera: Measurement::Measured(DeviceOutcome { working: false }),
            microphone: Measurement::Measured(DeviceOutcome { working: true }),
            speaker: Measurement::Measured(SpeakerOutcome {
                left: false,
                right: true,
            }),
            ..RawMeasurements::default()
        };

        let classification = classify(&measurements, &Thresholds::default());
        let findings = classification
            .firings
            .iter()
            .map(|firing| (firing.finding.clone(), firing.severity))
            .collect::<Vec<_>>();

        assert_eq!(
            findings,
            vec![
                (
                    Finding::KeyboardIncomplete {
                        tested_keys: 70,
                        total_keys: 78
                    },
                    IssueSeverity::Warning
                ),
                (
                    Finding::TrackpadFunctions {
                        failing: vec![TrackpadFunction::Drag, TrackpadFunction::Gesture]
                    },
                    IssueSeverity::Warning
                ),
                (Finding::CameraNotWorking, IssueSeverity::Failed),
                (
                    Finding::SpeakerChannels {
                        failing: vec![SpeakerChannel::Left]
                    },
                    IssueSeverity::Warning
                ),
            ]
        );
    }

    #[test]
    fn refurbishment_findings_follow_fixed_order() {
        let measurements = RawMeasurements {
            refurbishment: Measurement::Measured(RefurbishmentCheck {
                is_refurbished: true,
                confidence: RefurbishmentConfidence::High,
                indicators: vec![
                    RefurbishmentIndicator {
                        name: "serial_refurb".to_string(),
                        detected: true,
                        description: "certified".to_string(),
                        severity: IndicatorSeverity::Info,
                    },
                    RefurbishmentIndicator {
                        name: "tampered_board".to_string(),
                        detected: true,
                        description: "board swapped".to_string(),
                        severity: IndicatorSeverity::Critical,
                    },
                    RefurbishmentIndicator {
                        name: "third_party_storage".to_string(),
                        detected: true,
                        description: "third-party SSD".to_string(),
                        severity: IndicatorSeverity::Warning,
                    },
                ],
                replaced_parts: vec!["Storage (SSD)".to_string(), "Display".to_string()],
                details: RefurbishmentDetails {
                    refurb_program: Some("Apple Certified Refurbished".to_string()),
                    ..RefurbishmentDetails::default()
                },
            }),
            ..RawMeasurements::default()
        };

        let firings = classify(&measurements, &Thresholds::default()).firings;
        let ids = firings
            .iter()
            .map(|firing| firing.finding.rule_id())
            .collect::<Vec<_>>();
        assert_eq!(
            ids,
            vec![
                "replaced_part",
                "replaced_part",
                "certified_refurbishment",
                "refurbishment_indicator",
                "refurbishment_indicator",
            ]
        );
        assert_eq!(firings[3].severity, IssueSeverity::Failed);
        assert_eq!(firings[4].severity, IssueSeverity::Warning);
        assert!(firings
            .iter()
            .all(|firing| firing.finding.category() == IssueCategory::Refurbishment));
    }

    #[test]
    fn skipped_categories_produce_no_findings() {
        let measurements = RawMeasurements {
            screen: Measurement::Unmeasured(UnmeasuredReason::Skipped),
            keyboard: Measurement::Unmeasured(UnmeasuredReason::Skipped),
            camera: Measurement::Unmeasured(UnmeasuredReason::Skipped),
            ..RawMeasurements::default()
        };
        let classification = classify(&measurements, &Thresholds::default());
        assert!(classification.firings.is_empty());
        assert!(classification
            .rule_traces
            .iter()
            .all(|trace| trace.status == RuleTraceStatus::NotTested));
    }

    #[test]
    fn classification_is_stable() {
        let measurements = with_battery(58.0, 900);
        let first = classify(&measurements, &Thresholds::default());
        let second = classify(&measurements, &Thresholds::default());
        assert_eq!(first, second);
        assert_eq!(first.firings.len(), 2);
    }
}
