use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Context, Result};
use device_checkup_core::{
    DetectionReport, DetectionSession, DeviceProbes, InteractiveOutcome, RunState,
    SessionOptions, StatusCounts, StepId, StepResult,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Point-in-time view of a session for a host UI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub run_state: RunState,
    pub steps: Vec<StepResult>,
    pub counts: StatusCounts,
    pub completed: bool,
}

type SharedSession = Arc<Mutex<DetectionSession>>;

/// Live detection sessions keyed by id. The host owns one registry; every
/// session inside it is independent of the others.
///
/// The map lock only covers lookups. Each session has its own lock, so a
/// session running its probes never blocks the rest.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, SharedSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session, runs the automatic steps and returns its id and
    /// first snapshot.
    pub fn start_session(
        &self,
        probes: Box<dyn DeviceProbes>,
        options: SessionOptions,
    ) -> Result<SessionSnapshot> {
        let session_id = Uuid::new_v4().to_string();
        let mut session = DetectionSession::new(probes, options);
        session
            .start()
            .with_context(|| format!("failed to start session {session_id}"))?;
        let snapshot = snapshot_of(&session_id, &session);

        self.lock_sessions()?
            .insert(session_id.clone(), Arc::new(Mutex::new(session)));
        info!(%session_id, "detection session registered");
        Ok(snapshot)
    }

    pub fn submit_outcome(
        &self,
        session_id: &str,
        step: StepId,
        outcome: InteractiveOutcome,
    ) -> Result<SessionSnapshot> {
        self.with_session(session_id, |session| {
            session
                .resume_with_result(step, outcome)
                .with_context(|| format!("failed to record {step} for session {session_id}"))?;
            Ok(snapshot_of(session_id, session))
        })
    }

    pub fn skip_step(&self, session_id: &str, step: StepId) -> Result<SessionSnapshot> {
        self.with_session(session_id, |session| {
            session
                .resume_with_skip(step)
                .with_context(|| format!("failed to skip {step} for session {session_id}"))?;
            Ok(snapshot_of(session_id, session))
        })
    }

    /// Drops everything the session collected and runs it again from the first step.
    pub fn restart_session(&self, session_id: &str) -> Result<SessionSnapshot> {
        self.with_session(session_id, |session| {
            session
                .restart()
                .with_context(|| format!("failed to restart session {session_id}"))?;
            Ok(snapshot_of(session_id, session))
        })
    }

    pub fn snapshot(&self, session_id: &str) -> Result<SessionSnapshot> {
        self.with_session(session_id, |session| Ok(snapshot_of(session_id, session)))
    }

    pub fn report(&self, session_id: &str) -> Result<DetectionReport> {
        self.with_session(session_id, |session| {
            session
                .report()
                .cloned()
                .with_context(|| format!("session {session_id} has no report yet"))
        })
    }

    /// Removes the session and hands back its report when the run finished.
    pub fn close_session(&self, session_id: &str) -> Result<Option<DetectionReport>> {
        let shared = self
            .lock_sessions()?
            .remove(session_id)
            .ok_or_else(|| anyhow!("detection session not found: {session_id}"))?;
        let report = lock_session(session_id, &shared)?.report().ok().cloned();
        info!(%session_id, "detection session closed");
        Ok(report)
    }

    pub fn session_ids(&self) -> Result<Vec<String>> {
        let mut ids = self.lock_sessions()?.keys().cloned().collect::<Vec<_>>();
        ids.sort();
        Ok(ids)
    }

    fn with_session<T>(
        &self,
        session_id: &str,
        f: impl FnOnce(&mut DetectionSession) -> Result<T>,
    ) -> Result<T> {
        let shared = self
            .lock_sessions()?
            .get(session_id)
            .cloned()
            .ok_or_else(|| anyhow!("detection session not found: {session_id}"))?;
        let mut session = lock_session(session_id, &shared)?;
        f(&mut session)
    }

    fn lock_sessions(&self) -> Result<MutexGuard<'_, HashMap<String, SharedSession>>> {
        self.sessions
            .lock()
            .map_err(|_| anyhow!("detection session registry lock poisoned"))
    }
}

fn lock_session<'a>(
    session_id: &str,
    shared: &'a SharedSession,
) -> Result<MutexGuard<'a, DetectionSession>> {
    shared
        .lock()
        .map_err(|_| anyhow!("detection session lock poisoned: {session_id}"))
}

fn snapshot_of(session_id: &str, session: &DetectionSession) -> SessionSnapshot {
    let run_state = session.run_state();
    let steps = session
        .ledger()
        .entries()
        .iter()
        .filter_map(|entry| {
            device_checkup_core::find_step(entry.id).map(|step| StepResult {
                id: entry.id,
                category: step.category,
                interactive: step.interactive,
                status: entry.status,
                display_value: entry.display_value.clone(),
            })
        })
        .collect();

    SessionSnapshot {
        session_id: session_id.to_string(),
        run_state,
        steps,
        counts: session.ledger().counts(),
        completed: run_state == RunState::Completed,
    }
}

pub fn load_report(path: impl AsRef<Path>) -> Result<DetectionReport> {
    let path = path.as_ref();
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read report {}", path.display()))?;
    let report: DetectionReport = serde_json::from_str(&data)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(report)
}

pub fn write_report(report: &DetectionReport, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(report).context("failed to serialize report")?;
    fs::write(path, json).with_context(|| format!("failed to write report {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::thread;
    use std::time::{Duration, Instant};

    use device_checkup_core::model::{
        BatteryReading, DeviceOutcome, HardwareInfo, NetworkReading, RefurbishmentCheck,
        ScreenOutcome, SensorReading, StorageReading,
    };
    use device_checkup_core::{
        DeviceProbes, InteractiveOutcome, ProbeError, RunState, SessionOptions, StaticProbes,
        StepId, StepStatus,
    };

    use super::{load_report, write_report, SessionRegistry};

    fn start(registry: &SessionRegistry) -> String {
        registry
            .start_session(Box::new(StaticProbes::healthy()), SessionOptions::default())
            .expect("session starts")
            .session_id
    }

    fn finish_by_skipping(registry: &SessionRegistry, session_id: &str) {
        let mut snapshot = registry.snapshot(session_id).expect("snapshot");
        while let RunState::Suspended(step) = snapshot.run_state {
            snapshot = registry.skip_step(session_id, step).expect("skip");
        }
        assert!(snapshot.completed);
    }

    #[test]
    fn sessions_advance_independently() {
        let registry = SessionRegistry::new();
        let first = start(&registry);
        let second = start(&registry);
        assert_ne!(first, second);

        let snapshot = registry
            .submit_outcome(
                &first,
                StepId::Screen,
                InteractiveOutcome::Screen(ScreenOutcome { dead_pixel: false }),
            )
            .expect("screen result");
        assert_eq!(snapshot.run_state, RunState::Suspended(StepId::Keyboard));

        let other = registry.snapshot(&second).expect("snapshot");
        assert_eq!(other.run_state, RunState::Suspended(StepId::Screen));
        assert_eq!(registry.session_ids().expect("ids").len(), 2);
    }

    #[test]
    fn wrong_step_is_reported_to_the_host() {
        let registry = SessionRegistry::new();
        let session_id = start(&registry);
        let err = registry
            .submit_outcome(
                &session_id,
                StepId::Camera,
                InteractiveOutcome::Camera(DeviceOutcome { working: true }),
            )
            .expect_err("camera is not awaited");
        assert!(format!("{err:#}").contains("protocol violation"));
        assert!(registry.report(&session_id).is_err());
    }

    #[test]
    fn restart_returns_to_first_interactive_step() {
        let registry = SessionRegistry::new();
        let session_id = start(&registry);
        registry
            .skip_step(&session_id, StepId::Screen)
            .expect("skip screen");

        let snapshot = registry.restart_session(&session_id).expect("restart");
        assert_eq!(snapshot.run_state, RunState::Suspended(StepId::Screen));
        let screen = snapshot
            .steps
            .iter()
            .find(|step| step.id == StepId::Screen)
            .expect("screen entry");
        assert_eq!(screen.status, StepStatus::Testing);
    }

    #[test]
    fn closed_session_yields_report_and_disappears() {
        let registry = SessionRegistry::new();
        let session_id = start(&registry);
        finish_by_skipping(&registry, &session_id);

        let report = registry
            .close_session(&session_id)
            .expect("close")
            .expect("completed run has a report");
        assert_eq!(report.score, 50);
        assert!(registry.snapshot(&session_id).is_err());
    }

    #[test]
    fn report_survives_a_file_round_trip() {
        let registry = SessionRegistry::new();
        let session_id = start(&registry);
        finish_by_skipping(&registry, &session_id);
        let report = registry.report(&session_id).expect("report");

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("report.json");
        write_report(&report, &path).expect("write");
        let loaded = load_report(&path).expect("load");
        assert_eq!(loaded, report);
    }

    /// Healthy probes whose hardware read takes a while, like a real
    /// `system_profiler` call.
    struct SlowProbes {
        inner: StaticProbes,
        delay: Duration,
    }

    impl DeviceProbes for SlowProbes {
        fn hardware(&self) -> Result<HardwareInfo, ProbeError> {
            thread::sleep(self.delay);
            self.inner.hardware()
        }
        fn battery(&self) -> Result<BatteryReading, ProbeError> {
            self.inner.battery()
        }
        fn storage(&self) -> Result<StorageReading, ProbeError> {
            self.inner.storage()
        }
        fn refurbishment(&self) -> Result<RefurbishmentCheck, ProbeError> {
            self.inner.refurbishment()
        }
        fn network(&self) -> Result<NetworkReading, ProbeError> {
            self.inner.network()
        }
        fn sensors(&self) -> Result<SensorReading, ProbeError> {
            self.inner.sensors()
        }
    }

    #[test]
    fn restarting_one_session_does_not_block_others() {
        let registry = SessionRegistry::new();
        let fast = start(&registry);
        let slow = registry
            .start_session(
                Box::new(SlowProbes {
                    inner: StaticProbes::healthy(),
                    delay: Duration::from_millis(400),
                }),
                SessionOptions::default(),
            )
            .expect("slow session starts")
            .session_id;

        let (started_tx, started_rx) = mpsc::channel();
        thread::scope(|scope| {
            let handle = scope.spawn(|| {
                started_tx.send(()).expect("signal");
                registry.restart_session(&slow)
            });
            started_rx.recv().expect("restart thread running");
            thread::sleep(Duration::from_millis(50));

            let begun = Instant::now();
            let snapshot = registry.snapshot(&fast).expect("fast snapshot");
            let waited = begun.elapsed();
            assert!(waited < Duration::from_millis(200), "snapshot waited {waited:?}");
            assert_eq!(snapshot.run_state, RunState::Suspended(StepId::Screen));

            let restarted = handle.join().expect("restart thread").expect("restart");
            assert_eq!(restarted.run_state, RunState::Suspended(StepId::Screen));
        });
    }
}
