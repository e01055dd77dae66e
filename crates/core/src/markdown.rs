use crate::model::{
    DetectionReport, IssueSeverity, RefurbishmentConfidence, RuleTraceStatus, StepStatus,
};

pub fn render_markdown_summary(report: &DetectionReport) -> String {
    let mut out = String::new();
    out.push_str("# Device Checkup Summary\n\n");
    out.push_str(&format!(
        "- Report version: `{}`\n- Report id: `{}`\n- Generated at: `{}`\n- Score: **{}/100**\n- Steps: {} passed, {} warning, {} failed, {} skipped of {}\n\n",
        report.report_version,
        report.report_id,
        report.generated_at,
        report.score,
        report.counts.passed,
        report.counts.warning,
        report.counts.failed,
        report.counts.skipped,
        report.counts.total
    ));

    out.push_str("## Device\n\n");
    match &report.summaries.device {
        Some(device) => out.push_str(&format!(
            "- CPU: {} ({} cores)\n- Memory: {}\n- Serial: `{}`\n- OS: {}\n- Hostname: `{}`\n\n",
            device.cpu_model,
            device.cpu_cores,
            human_bytes(device.memory_bytes),
            device.serial_number,
            device.os,
            device.hostname
        )),
        None => out.push_str("Hardware information unavailable.\n\n"),
    }

    out.push_str("## Components\n\n");
    if let Some(battery) = &report.summaries.battery {
        out.push_str(&format!(
            "- Battery: {:.0}% health, {} cycles{}\n",
            battery.health,
            battery.cycle_count,
            if battery.is_charging { ", charging" } else { "" }
        ));
    }
    if let Some(storage) = &report.summaries.storage {
        out.push_str(&format!(
            "- Storage: {} (SMART `{}`)\n",
            storage.model, storage.smart_status
        ));
    }
    if let Some(network) = &report.summaries.network {
        out.push_str(&format!(
            "- Wi-Fi enabled: `{}`, Bluetooth available: `{}`\n",
            network.wifi_enabled, network.bluetooth_available
        ));
    }
    if let Some(refurbishment) = &report.summaries.refurbishment {
        out.push_str(&format!(
            "- Refurbished: `{}` (confidence `{}`, {} flagged indicator(s))\n",
            refurbishment.is_refurbished,
            confidence_label(refurbishment.confidence),
            refurbishment.flagged_indicators
        ));
        if !refurbishment.replaced_parts.is_empty() {
            out.push_str(&format!(
                "  - replaced parts: {}\n",
                refurbishment.replaced_parts.join(", ")
            ));
        }
        if let Some(program) = &refurbishment.refurb_program {
            out.push_str(&format!("  - program: {program}\n"));
        }
    }
    out.push('\n');

    out.push_str("## Steps\n\n");
    for step in &report.steps {
        match &step.display_value {
            Some(value) => out.push_str(&format!(
                "- `{}`: `{}` ({})\n",
                step.id,
                status_label(step.status),
                value
            )),
            None => out.push_str(&format!("- `{}`: `{}`\n", step.id, status_label(step.status))),
        }
    }
    out.push('\n');

    out.push_str("## Issues\n\n");
    if report.issues.is_empty() {
        out.push_str("No issues found.\n\n");
    } else {
        for issue in &report.issues {
            out.push_str(&format!(
                "### {}\n\n- Severity: `{}`\n- {}\n- Suggestion: {}\n",
                issue.title,
                severity_label(issue.severity),
                issue.description,
                issue.suggestion
            ));
            if let Some(evidence) = &issue.evidence {
                out.push_str(&format!("- Evidence: `{evidence}`\n"));
            }
            out.push('\n');
        }
    }

    if !report.rule_traces.is_empty() {
        out.push_str("## Rule Traces\n\n");
        for trace in &report.rule_traces {
            out.push_str(&format!(
                "- `{}`: `{}` ({})\n",
                trace.rule_id,
                trace_label(trace.status),
                trace.detail
            ));
        }
    }

    out
}

fn status_label(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Pending => "pending",
        StepStatus::Testing => "testing",
        StepStatus::Passed => "passed",
        StepStatus::Warning => "warning",
        StepStatus::Failed => "failed",
        StepStatus::Skipped => "skipped",
    }
}

fn severity_label(severity: IssueSeverity) -> &'static str {
    match severity {
        IssueSeverity::Warning => "warning",
        IssueSeverity::Failed => "failed",
    }
}

fn confidence_label(confidence: RefurbishmentConfidence) -> &'static str {
    match confidence {
        RefurbishmentConfidence::Low => "low",
        RefurbishmentConfidence::Medium => "medium",
        RefurbishmentConfidence::High => "high",
    }
}

fn trace_label(status: RuleTraceStatus) -> &'static str {
    match status {
        RuleTraceStatus::Emitted => "emitted",
        RuleTraceStatus::Skipped => "skipped",
        RuleTraceStatus::NotTested => "not_tested",
    }
}

fn human_bytes(value: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    if value == 0 {
        return "0 B".to_string();
    }
    let mut size = value as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{size:.1} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::{human_bytes, render_markdown_summary};
    use crate::config::Thresholds;
    use crate::ledger::Ledger;
    use crate::model::{BatteryReading, Measurement, RawMeasurements, StepStatus};
    use crate::report::assemble_report;
    use crate::text::EnglishIssueText;

    #[test]
    fn summary_lists_score_and_issues() {
        let mut ledger = Ledger::new();
        for entry in Ledger::new().entries() {
            ledger.begin(entry.id).expect("begin");
            ledger
                .settle(entry.id, StepStatus::Passed, None)
                .expect("settle");
        }
        let measurements = RawMeasurements {
            battery: Measurement::Measured(BatteryReading {
                health: 58.0,
                cycle_count: 910,
                design_capacity: 5000,
                current_capacity: 2900,
                is_charging: true,
                temperature: None,
            }),
            ..RawMeasurements::default()
        };
        let report = assemble_report(
            &ledger,
            &measurements,
            &Thresholds::default(),
            &EnglishIssueText,
        );

        let markdown = render_markdown_summary(&report);
        assert!(markdown.contains("**100/100**"));
        assert!(markdown.contains("### Battery health degraded"));
        assert!(markdown.contains("### High battery cycle count"));
        assert!(markdown.contains("58% health, 910 cycles, charging"));
        assert!(markdown.contains("Hardware information unavailable."));
        assert!(markdown.contains("`battery_health`: `emitted`"));
    }

    #[test]
    fn bytes_are_human_readable() {
        assert_eq!(human_bytes(0), "0 B");
        assert_eq!(human_bytes(16 * 1024 * 1024 * 1024), "16.0 GB");
    }
}
