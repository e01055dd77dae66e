use crate::classify::{speaker_channel_id, trackpad_function_id, Finding, RuleFiring};
use crate::model::{Issue, SpeakerChannel, TrackpadFunction};

/// Presentation layer for rule findings. Swap the implementation to localize
/// issue text without touching the rules.
pub trait IssueText {
    fn title(&self, finding: &Finding) -> String;
    fn description(&self, finding: &Finding) -> String;
    fn suggestion(&self, finding: &Finding) -> String;

    fn evidence(&self, finding: &Finding) -> Option<String> {
        finding.evidence()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishIssueText;

impl IssueText for EnglishIssueText {
    fn title(&self, finding: &Finding) -> String {
        match finding {
            Finding::BatteryHealth { .. } => "Battery health degraded".to_string(),
            Finding::BatteryCycleCount { .. } => "High battery cycle count".to_string(),
            Finding::StorageSmart { .. } => "Storage health check failed".to_string(),
            Finding::ScreenDeadPixel => "Dead pixels on screen".to_string(),
            Finding::KeyboardIncomplete { .. } => "Keyboard test incomplete".to_string(),
            Finding::TrackpadFunctions { .. } => "Trackpad functions not responding".to_string(),
            Finding::CameraNotWorking => "Camera not working".to_string(),
            Finding::MicrophoneNotWorking => "Microphone not working".to_string(),
            Finding::SpeakerChannels { .. } => "Speaker channel not working".to_string(),
            Finding::ReplacedPart { part } => format!("Replaced part: {part}"),
            Finding::CertifiedRefurbishment { .. } => "Certified refurbished device".to_string(),
            Finding::RefurbishmentIndicator { name, .. } => {
                format!("Refurbishment indicator: {}", name.replace('_', " "))
            }
        }
    }

    fn description(&self, finding: &Finding) -> String {
        match finding {
            Finding::BatteryHealth { health } => format!(
                "Battery holds {health:.0}% of its design capacity, so runtime will be noticeably shorter than new."
            ),
            Finding::BatteryCycleCount { cycle_count } => format!(
                "Battery has gone through {cycle_count} charge cycles and is nearing the end of its rated life."
            ),
            Finding::StorageSmart { smart_status } => format!(
                "The drive reports SMART status \"{smart_status}\". Data on this drive may be at risk."
            ),
            Finding::ScreenDeadPixel => {
                "One or more pixels stayed dark or stuck during the color test.".to_string()
            }
            Finding::KeyboardIncomplete {
                tested_keys,
                total_keys,
            } => format!("Only {tested_keys} of {total_keys} keys registered during the keyboard test."),
            Finding::TrackpadFunctions { failing } => format!(
                "These trackpad functions did not respond: {}.",
                join_trackpad(failing)
            ),
            Finding::CameraNotWorking => {
                "The built-in camera did not produce a usable image.".to_string()
            }
            Finding::MicrophoneNotWorking => {
                "The built-in microphone did not pick up sound.".to_string()
            }
            Finding::SpeakerChannels { failing } => format!(
                "No audio was heard from the {} speaker channel.",
                join_speakers(failing)
            ),
            Finding::ReplacedPart { part } => format!(
                "The {part} does not appear to be an original factory part."
            ),
            Finding::CertifiedRefurbishment { program } => format!(
                "This device was refurbished through the {program} program."
            ),
            Finding::RefurbishmentIndicator { description, .. } => description.clone(),
        }
    }

    fn suggestion(&self, finding: &Finding) -> String {
        match finding {
            Finding::BatteryHealth { .. } | Finding::BatteryCycleCount { .. } => {
                "Budget for a battery replacement or negotiate the price accordingly.".to_string()
            }
            Finding::StorageSmart { .. } => {
                "Back up any data and plan to replace the drive before relying on this device."
                    .to_string()
            }
            Finding::ScreenDeadPixel => {
                "Inspect the panel closely and consider a screen replacement if the defect is visible in normal use."
                    .to_string()
            }
            Finding::KeyboardIncomplete { .. } => {
                "Retest the missed keys; a repeat failure usually means the keyboard needs service."
                    .to_string()
            }
            Finding::TrackpadFunctions { .. } => {
                "Check trackpad settings and retest; persistent failures need hardware service."
                    .to_string()
            }
            Finding::CameraNotWorking | Finding::MicrophoneNotWorking => {
                "Check privacy permissions and retest; if it still fails the component needs repair."
                    .to_string()
            }
            Finding::SpeakerChannels { .. } => {
                "Retest with balance centered; a silent channel points to a failed speaker."
                    .to_string()
            }
            Finding::ReplacedPart { .. } => {
                "Ask the seller for repair records and confirm the part's quality.".to_string()
            }
            Finding::CertifiedRefurbishment { .. } => {
                "Confirm the remaining warranty coverage with the seller.".to_string()
            }
            Finding::RefurbishmentIndicator { .. } => {
                "Ask the seller about the device's service and ownership history.".to_string()
            }
        }
    }
}

/// Turns rule firings into presentable issues, preserving firing order.
pub fn render_issues(firings: &[RuleFiring], text: &dyn IssueText) -> Vec<Issue> {
    firings
        .iter()
        .map(|firing| Issue {
            rule_id: firing.finding.rule_id().to_string(),
            category: firing.finding.category(),
            severity: firing.severity,
            title: text.title(&firing.finding),
            description: text.description(&firing.finding),
            suggestion: text.suggestion(&firing.finding),
            evidence: text.evidence(&firing.finding),
        })
        .collect()
}

fn join_trackpad(failing: &[TrackpadFunction]) -> String {
    failing
        .iter()
        .map(|function| trackpad_function_id(*function))
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_speakers(failing: &[SpeakerChannel]) -> String {
    failing
        .iter()
        .map(|channel| speaker_channel_id(*channel))
        .collect::<Vec<_>>()
        .join(" and ")
}

#[cfg(test)]
mod tests {
    use super::{render_issues, EnglishIssueText, IssueText};
    use crate::classify::{Finding, RuleFiring};
    use crate::model::{IssueCategory, IssueSeverity, SpeakerChannel};

    struct TerseText;

    impl IssueText for TerseText {
        fn title(&self, finding: &Finding) -> String {
            finding.rule_id().to_uppercase()
        }

        fn description(&self, _finding: &Finding) -> String {
            String::new()
        }

        fn suggestion(&self, _finding: &Finding) -> String {
            "-".to_string()
        }
    }

    fn firings() -> Vec<RuleFiring> {
        vec![
            RuleFiring {
                finding: Finding::BatteryHealth { health: 72.4 },
                severity: IssueSeverity::Warning,
            },
            RuleFiring {
                finding: Finding::SpeakerChannels {
                    failing: vec![SpeakerChannel::Left, SpeakerChannel::Right],
                },
                severity: IssueSeverity::Warning,
            },
        ]
    }

    #[test]
    fn english_text_carries_measured_values() {
        let issues = render_issues(&firings(), &EnglishIssueText);
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].rule_id, "battery_health");
        assert_eq!(issues[0].category, IssueCategory::Battery);
        assert!(issues[0].description.contains("72%"));
        assert_eq!(issues[0].evidence.as_deref(), Some("health=72.4%"));
        assert!(issues[1].description.contains("left and right"));
    }

    #[test]
    fn text_layer_does_not_change_classification() {
        let english = render_issues(&firings(), &EnglishIssueText);
        let terse = render_issues(&firings(), &TerseText);
        assert_eq!(terse[0].title, "BATTERY_HEALTH");
        for (left, right) in english.iter().zip(&terse) {
            assert_eq!(left.rule_id, right.rule_id);
            assert_eq!(left.severity, right.severity);
            assert_eq!(left.category, right.category);
            assert_eq!(left.evidence, right.evidence);
        }
    }
}
