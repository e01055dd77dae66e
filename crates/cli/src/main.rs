mod prompt;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use device_checkup_core::{
    classify, render_issues, render_markdown_summary, DetectionReport, DetectionSession,
    DeviceProbes, EnglishIssueText, Issue, IssueSeverity, RunState, SessionOptions, StaticProbes,
    SystemProbes, Thresholds,
};
use device_checkup_service::{load_report, write_report};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::prompt::{Prompter, StepReply};

#[derive(Debug, Parser)]
#[command(
    name = "device-checkup",
    version,
    about = "Run a guided hardware checkup on a used computer and produce a condition report."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run every detection step and emit a JSON report.
    Run(RunArgs),
    /// Run the automatic probes once and print what they return.
    Probe,
    /// Re-classify issues from an existing report.
    Issues(IssuesArgs),
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Output report path.
    #[arg(long, default_value = "device-checkup-report.json", value_name = "FILE")]
    output: PathBuf,

    /// Optional markdown summary output file.
    #[arg(long, value_name = "FILE")]
    md: Option<PathBuf>,

    /// Use canned probe results for a healthy machine instead of real hardware.
    #[arg(long)]
    simulate: bool,

    /// Skip every interactive step without prompting.
    #[arg(long)]
    skip_interactive: bool,

    /// JSON file overriding the battery thresholds.
    #[arg(long, value_name = "FILE")]
    thresholds: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct IssuesArgs {
    /// Input report file.
    #[arg(long, value_name = "FILE")]
    report: PathBuf,

    /// JSON file overriding the battery thresholds.
    #[arg(long, value_name = "FILE")]
    thresholds: Option<PathBuf>,

    /// Optional markdown summary output file.
    #[arg(long, value_name = "FILE")]
    md: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run_detection_command(args),
        Commands::Probe => {
            run_probe_command();
            Ok(())
        }
        Commands::Issues(args) => run_issues_command(args),
    }
}

fn run_detection_command(args: RunArgs) -> Result<()> {
    let options = SessionOptions {
        thresholds: load_thresholds(args.thresholds.as_deref())?,
    };
    let probes: Box<dyn DeviceProbes> = if args.simulate {
        Box::new(StaticProbes::healthy())
    } else {
        Box::new(SystemProbes::new())
    };

    let mut session = DetectionSession::new(probes, options);
    let stdin = io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), io::stdout());

    let mut state = session.start()?;
    while let RunState::Suspended(step) = state {
        let reply = if args.skip_interactive {
            StepReply::Skip
        } else {
            prompter.ask(step)?
        };
        state = match reply {
            StepReply::Outcome(outcome) => session.resume_with_result(step, outcome)?,
            StepReply::Skip => session.resume_with_skip(step)?,
        };
    }

    let report = session.into_report()?;
    write_report(&report, &args.output)?;
    println!("Report written to {}", args.output.display());
    print_report(&report);

    if let Some(md_path) = args.md {
        write_markdown(&report, &md_path)?;
    }

    Ok(())
}

fn run_issues_command(args: IssuesArgs) -> Result<()> {
    let thresholds = load_thresholds(args.thresholds.as_deref())?;
    let mut report = load_report(&args.report)?;

    let classification = classify(&report.measurements, &thresholds);
    report.issues = render_issues(&classification.firings, &EnglishIssueText);
    report.rule_traces = classification.rule_traces;

    if report.issues.is_empty() {
        println!("No issues found in {}", args.report.display());
    } else {
        println!(
            "Found {} issue(s) in {}:",
            report.issues.len(),
            args.report.display()
        );
        print_issues(&report.issues);
    }

    if let Some(md_path) = args.md {
        write_markdown(&report, &md_path)?;
    }

    Ok(())
}

fn run_probe_command() {
    let probes = SystemProbes::new();
    match probes.hardware() {
        Ok(info) => {
            println!(
                "Hardware: {} ({} cores), {} memory, serial {}",
                info.cpu.model,
                info.cpu.cores,
                human_bytes(info.memory.total),
                info.serial_number
            );
            println!(
                "OS: {} {} on {}",
                info.os_name, info.os_version, info.hostname
            );
            for disk in &info.disks {
                println!(
                    "- disk {} total={} free={} kind={}",
                    disk.name,
                    human_bytes(disk.total_bytes),
                    human_bytes(disk.available_bytes),
                    disk.kind
                );
            }
        }
        Err(err) => println!("Hardware: {err}"),
    }
    match probes.battery() {
        Ok(battery) => println!(
            "Battery: {:.1}% health, {} cycles, charging={}",
            battery.health, battery.cycle_count, battery.is_charging
        ),
        Err(err) => println!("Battery: {err}"),
    }
    match probes.storage() {
        Ok(storage) => println!(
            "Storage: {} SMART={}",
            storage.model, storage.smart_status
        ),
        Err(err) => println!("Storage: {err}"),
    }
    match probes.refurbishment() {
        Ok(check) => {
            println!(
                "Refurbishment: refurbished={} confidence={:?}",
                check.is_refurbished, check.confidence
            );
            for indicator in check.indicators.iter().filter(|item| item.detected) {
                println!(
                    "- [{:?}] {}: {}",
                    indicator.severity, indicator.name, indicator.description
                );
            }
        }
        Err(err) => println!("Refurbishment: {err}"),
    }
    match probes.network() {
        Ok(network) => println!(
            "Network: wifi available={} enabled={}, bluetooth available={}",
            network.wifi.available, network.wifi.enabled, network.bluetooth.available
        ),
        Err(err) => println!("Network: {err}"),
    }
    match probes.sensors() {
        Ok(sensors) => {
            println!("Sensors: {} reading(s)", sensors.temperatures.len());
            for reading in &sensors.temperatures {
                println!("- {}: {:.1}°C", reading.label, reading.celsius);
            }
        }
        Err(err) => println!("Sensors: {err}"),
    }
}

fn print_report(report: &DetectionReport) {
    println!(
        "Score {}/100 | passed {} | warning {} | failed {} | skipped {}",
        report.score,
        report.counts.passed,
        report.counts.warning,
        report.counts.failed,
        report.counts.skipped
    );
    for step in &report.steps {
        println!(
            "- {:<13} {:?}{}",
            step.id.as_str(),
            step.status,
            step.display_value
                .as_deref()
                .map(|value| format!(" ({value})"))
                .unwrap_or_default()
        );
    }
    if report.issues.is_empty() {
        println!("No issues found.");
    } else {
        println!("{} issue(s):", report.issues.len());
        print_issues(&report.issues);
    }
}

fn print_issues(issues: &[Issue]) {
    for issue in issues {
        let severity = match issue.severity {
            IssueSeverity::Warning => "WARN",
            IssueSeverity::Failed => "FAIL",
        };
        println!("- [{severity}] {}: {}", issue.title, issue.description);
        println!("  suggestion: {}", issue.suggestion);
    }
}

fn write_markdown(report: &DetectionReport, path: &Path) -> Result<()> {
    fs::write(path, render_markdown_summary(report))
        .with_context(|| format!("failed to write markdown summary to {}", path.display()))?;
    println!("Markdown summary written to {}", path.display());
    Ok(())
}

fn load_thresholds(path: Option<&Path>) -> Result<Thresholds> {
    match path {
        Some(path) => {
            let thresholds = Thresholds::from_file(path)?;
            info!(path = %path.display(), ?thresholds, "loaded threshold overrides");
            Ok(thresholds)
        }
        None => Ok(Thresholds::default()),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
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
