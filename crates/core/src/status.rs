use crate::config::Thresholds;
use crate::model::{StepId, StepMeasurement, StepStatus};

/// Settled ledger status and badge text for a resolved measurement.
pub fn derive_status(
    measurement: &StepMeasurement,
    thresholds: &Thresholds,
) -> (StepStatus, Option<String>) {
    match measurement {
        StepMeasurement::Hardware(info) => (StepStatus::Passed, Some(info.cpu.model.clone())),
        StepMeasurement::Battery(battery) => {
            let status = if battery.health >= thresholds.battery_health_pass {
                StepStatus::Passed
            } else if battery.health >= thresholds.battery_health_fail {
                StepStatus::Warning
            } else {
                StepStatus::Failed
            };
            // Floored so the badge never rounds up into a better band.
            (status, Some(format!("{:.0}%", battery.health.floor())))
        }
        StepMeasurement::Storage(storage) => {
            let status = if storage.is_healthy() {
                StepStatus::Passed
            } else {
                StepStatus::Warning
            };
            (status, Some(storage.smart_status.clone()))
        }
        StepMeasurement::Refurbishment(check) => {
            if !check.is_refurbished {
                return (StepStatus::Passed, Some("not refurbished".to_string()));
            }
            let flagged = check.flagged_indicators().count();
            if flagged == 0 {
                (StepStatus::Passed, Some("refurbished".to_string()))
            } else {
                (
                    StepStatus::Warning,
                    Some(format!("refurbished, {flagged} indicator(s)")),
                )
            }
        }
        StepMeasurement::Network(network) => (
            StepStatus::Passed,
            Some(format!(
                "wifi {}, bluetooth {}",
                on_off(network.wifi.enabled),
                if network.bluetooth.available {
                    "available"
                } else {
                    "absent"
                }
            )),
        ),
        StepMeasurement::Sensors(sensors) => (
            StepStatus::Passed,
            sensors
                .max_temperature()
                .map(|celsius| format!("max {celsius:.0}°C")),
        ),
        StepMeasurement::Screen(screen) => {
            if screen.dead_pixel {
                (StepStatus::Warning, Some("dead pixel".to_string()))
            } else {
                (StepStatus::Passed, None)
            }
        }
        StepMeasurement::Keyboard(keyboard) => {
            let status = if keyboard.all_registered() {
                StepStatus::Passed
            } else {
                StepStatus::Warning
            };
            (
                status,
                Some(format!(
                    "{}/{} keys",
                    keyboard.tested_keys.min(keyboard.total_keys),
                    keyboard.total_keys
                )),
            )
        }
        StepMeasurement::Trackpad(trackpad) => {
            if trackpad.failing_functions().is_empty() {
                (StepStatus::Passed, None)
            } else {
                (StepStatus::Warning, None)
            }
        }
        StepMeasurement::Camera(device) | StepMeasurement::Microphone(device) => {
            if device.working {
                (StepStatus::Passed, None)
            } else {
                (StepStatus::Failed, None)
            }
        }
        StepMeasurement::Speaker(speaker) => {
            if speaker.failing_channels().is_empty() {
                (StepStatus::Passed, None)
            } else {
                (StepStatus::Warning, None)
            }
        }
    }
}

/// Status recorded when an automatic probe fails. Never aborts the run.
///
/// Storage keeps an optimistic `passed`, unlike battery which degrades to
/// `warning`; the badge still reads "unreadable" so the gap is visible.
pub fn probe_failure_status(step: StepId) -> (StepStatus, Option<String>) {
    match step {
        StepId::Battery => (StepStatus::Warning, Some("unreadable".to_string())),
        StepId::Storage => (StepStatus::Passed, Some("unreadable".to_string())),
        StepId::Refurbishment => (StepStatus::Passed, Some("not detected".to_string())),
        StepId::Hardware | StepId::Network | StepId::Sensors => {
            (StepStatus::Passed, Some("unavailable".to_string()))
        }
        StepId::Screen
        | StepId::Keyboard
        | StepId::Trackpad
        | StepId::Camera
        | StepId::Microphone
        | StepId::Speaker => (StepStatus::Skipped, None),
    }
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}
