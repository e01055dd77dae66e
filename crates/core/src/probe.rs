use std::time::Instant;

use tracing::{debug, warn};

use crate::error::ProbeError;
use crate::model::{
    BatteryReading, HardwareInfo, NetworkReading, RefurbishmentCheck, SensorReading, StepId,
    StepMeasurement, StorageReading,
};

/// External measurement sources for the automatic steps.
pub trait DeviceProbes: Send {
    fn hardware(&self) -> Result<HardwareInfo, ProbeError>;
    fn battery(&self) -> Result<BatteryReading, ProbeError>;
    fn storage(&self) -> Result<StorageReading, ProbeError>;
    fn refurbishment(&self) -> Result<RefurbishmentCheck, ProbeError>;
    fn network(&self) -> Result<NetworkReading, ProbeError>;
    fn sensors(&self) -> Result<SensorReading, ProbeError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Measured(StepMeasurement),
    Failed(ProbeError),
}

/// Uniform entry point over [`DeviceProbes`] keyed by step id.
pub struct ProbeAdapter {
    probes: Box<dyn DeviceProbes>,
}

impl ProbeAdapter {
    pub fn new(probes: Box<dyn DeviceProbes>) -> Self {
        Self { probes }
    }

    pub fn measure(&self, step: StepId) -> ProbeOutcome {
        let started = Instant::now();
        let result = match step {
            StepId::Hardware => self.probes.hardware().map(StepMeasurement::Hardware),
            StepId::Battery => self.probes.battery().map(StepMeasurement::Battery),
            StepId::Storage => self.probes.storage().map(StepMeasurement::Storage),
            StepId::Refurbishment => self
                .probes
                .refurbishment()
                .map(StepMeasurement::Refurbishment),
            StepId::Network => self.probes.network().map(StepMeasurement::Network),
            StepId::Sensors => self.probes.sensors().map(StepMeasurement::Sensors),
            StepId::Screen
            | StepId::Keyboard
            | StepId::Trackpad
            | StepId::Camera
            | StepId::Microphone
            | StepId::Speaker => Err(ProbeError::Unavailable(format!(
                "{step} is an interactive step"
            ))),
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(measurement) => {
                debug!(%step, elapsed_ms, "probe resolved");
                ProbeOutcome::Measured(measurement)
            }
            Err(err) => {
                warn!(%step, elapsed_ms, error = %err, "probe failed; using fallback status");
                ProbeOutcome::Failed(err)
            }
        }
    }
}
