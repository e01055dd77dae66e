use chrono::{SecondsFormat, Utc};
use uuid::Uuid;

use crate::catalog::steps;
use crate::classify::classify;
use crate::config::Thresholds;
use crate::ledger::Ledger;
use crate::model::{
    BatterySummary, DetectionReport, DeviceSummary, NetworkSummary, RawMeasurements,
    RefurbishmentSummary, ReportSummaries, StepResult, StorageSummary, REPORT_VERSION,
};
use crate::score::calculate_score;
use crate::text::{render_issues, IssueText};

/// Freezes a finished run into a report. Issues are derived here, once, from
/// the final measurements.
pub fn assemble_report(
    ledger: &Ledger,
    measurements: &RawMeasurements,
    thresholds: &Thresholds,
    text: &dyn IssueText,
) -> DetectionReport {
    let counts = ledger.counts();
    let classification = classify(measurements, thresholds);
    let issues = render_issues(&classification.firings, text);

    DetectionReport {
        report_version: REPORT_VERSION.to_string(),
        report_id: Uuid::new_v4().to_string(),
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        score: calculate_score(&counts),
        counts,
        steps: step_results(ledger),
        summaries: build_summaries(measurements),
        issues,
        rule_traces: classification.rule_traces,
        measurements: measurements.clone(),
    }
}

fn step_results(ledger: &Ledger) -> Vec<StepResult> {
    steps()
        .iter()
        .map(|step| {
            let entry = ledger.entry(step.id);
            StepResult {
                id: step.id,
                category: step.category,
                interactive: step.interactive,
                status: entry.map(|entry| entry.status).unwrap_or_default(),
                display_value: entry.and_then(|entry| entry.display_value.clone()),
            }
        })
        .collect()
}

pub fn build_summaries(measurements: &RawMeasurements) -> ReportSummaries {
    ReportSummaries {
        device: measurements.hardware.value().map(|info| DeviceSummary {
            cpu_model: info.cpu.model.clone(),
            cpu_cores: info.cpu.cores,
            memory_bytes: info.memory.total,
            serial_number: info.serial_number.clone(),
            os: format!("{} {}", info.os_name, info.os_version)
                .trim()
                .to_string(),
            hostname: info.hostname.clone(),
        }),
        battery: measurements.battery.value().map(|battery| BatterySummary {
            health: battery.health,
            cycle_count: battery.cycle_count,
            is_charging: battery.is_charging,
        }),
        storage: measurements.storage.value().map(|storage| StorageSummary {
            model: storage.model.clone(),
            smart_status: storage.smart_status.clone(),
            healthy: storage.is_healthy(),
        }),
        network: measurements.network.value().map(|network| NetworkSummary {
            wifi_enabled: network.wifi.enabled,
            bluetooth_available: network.bluetooth.available,
        }),
        refurbishment: measurements
            .refurbishment
            .value()
            .map(|check| RefurbishmentSummary {
                is_refurbished: check.is_refurbished,
                confidence: check.confidence,
                flagged_indicators: check.flagged_indicators().count(),
                replaced_parts: check.replaced_parts.clone(),
                refurb_program: check.details.refurb_program.clone(),
            }),
    }
}
