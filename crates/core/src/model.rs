use serde::{Deserialize, Serialize};

pub const REPORT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    Hardware,
    Battery,
    Storage,
    Refurbishment,
    Network,
    Sensors,
    Screen,
    Keyboard,
    Trackpad,
    Camera,
    Microphone,
    Speaker,
}

impl StepId {
    pub fn as_str(self) -> &'static str {
        match self {
            StepId::Hardware => "hardware",
            StepId::Battery => "battery",
            StepId::Storage => "storage",
            StepId::Refurbishment => "refurbishment",
            StepId::Network => "network",
            StepId::Sensors => "sensors",
            StepId::Screen => "screen",
            StepId::Keyboard => "keyboard",
            StepId::Trackpad => "trackpad",
            StepId::Camera => "camera",
            StepId::Microphone => "microphone",
            StepId::Speaker => "speaker",
        }
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StepCategory {
    System,
    Power,
    Storage,
    Provenance,
    Connectivity,
    Display,
    Input,
    Multimedia,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    Pending,
    Testing,
    Passed,
    Warning,
    Failed,
    Skipped,
}

impl StepStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            StepStatus::Passed | StepStatus::Warning | StepStatus::Failed | StepStatus::Skipped
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "state", content = "step", rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Suspended(StepId),
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HardwareInfo {
    pub cpu: CpuInfo,
    pub memory: MemoryInfo,
    pub serial_number: String,
    pub os_name: String,
    pub os_version: String,
    pub hostname: String,
    #[serde(default)]
    pub disks: Vec<DiskSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CpuInfo {
    pub model: String,
    pub cores: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryInfo {
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiskSummary {
    pub name: String,
    pub total_bytes: u64,
    pub available_bytes: u64,
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatteryReading {
    pub health: f64,
    pub cycle_count: u32,
    pub design_capacity: u32,
    pub current_capacity: u32,
    pub is_charging: bool,
    #[serde(default)]
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageReading {
    pub model: String,
    pub smart_status: String,
    #[serde(default)]
    pub power_on_hours: Option<u64>,
    #[serde(default)]
    pub temperature: Option<f64>,
}

impl StorageReading {
    /// SMART reports either `Verified` (macOS) or `Healthy` (Windows) for a good drive.
    pub fn is_healthy(&self) -> bool {
        let status = self.smart_status.trim().to_ascii_lowercase();
        status == "verified" || status == "healthy"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkReading {
    pub wifi: WifiState,
    pub bluetooth: BluetoothState,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WifiState {
    #[serde(default = "default_true")]
    pub available: bool,
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BluetoothState {
    pub available: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SensorReading {
    pub temperatures: Vec<TemperatureReading>,
}

impl SensorReading {
    pub fn max_temperature(&self) -> Option<f32> {
        self.temperatures
            .iter()
            .map(|reading| reading.celsius)
            .max_by(|a, b| a.total_cmp(b))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemperatureReading {
    pub label: String,
    pub celsius: f32,
    #[serde(default)]
    pub critical: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefurbishmentCheck {
    pub is_refurbished: bool,
    pub confidence: RefurbishmentConfidence,
    pub indicators: Vec<RefurbishmentIndicator>,
    pub replaced_parts: Vec<String>,
    pub details: RefurbishmentDetails,
}

impl RefurbishmentCheck {
    /// Detected indicators at `warning` or `critical` severity, in probe order.
    pub fn flagged_indicators(&self) -> impl Iterator<Item = &RefurbishmentIndicator> {
        self.indicators
            .iter()
            .filter(|indicator| indicator.detected && indicator.severity != IndicatorSeverity::Info)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RefurbishmentConfidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefurbishmentIndicator {
    pub name: String,
    pub detected: bool,
    pub description: String,
    pub severity: IndicatorSeverity,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorSeverity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RefurbishmentDetails {
    #[serde(default)]
    pub serial_manufacture_date: Option<String>,
    #[serde(default)]
    pub os_install_date: Option<String>,
    #[serde(default)]
    pub battery_manufacture_date: Option<String>,
    #[serde(default)]
    pub storage_first_use_date: Option<String>,
    #[serde(default)]
    pub date_mismatch: bool,
    #[serde(default)]
    pub refurb_program: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScreenOutcome {
    pub dead_pixel: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyboardOutcome {
    pub tested_keys: u32,
    pub total_keys: u32,
}

impl KeyboardOutcome {
    pub fn tested_ratio(&self) -> f64 {
        if self.total_keys == 0 {
            return 0.0;
        }
        f64::from(self.tested_keys.min(self.total_keys)) / f64::from(self.total_keys)
    }

    pub fn all_registered(&self) -> bool {
        self.total_keys > 0 && self.tested_keys >= self.total_keys
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackpadOutcome {
    pub click: bool,
    pub drag: bool,
    pub gesture: bool,
}

impl TrackpadOutcome {
    pub fn failing_functions(&self) -> Vec<TrackpadFunction> {
        let mut failing = Vec::new();
        if !self.click {
            failing.push(TrackpadFunction::Click);
        }
        if !self.drag {
            failing.push(TrackpadFunction::Drag);
        }
        if !self.gesture {
            failing.push(TrackpadFunction::Gesture);
        }
        failing
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrackpadFunction {
    Click,
    Drag,
    Gesture,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceOutcome {
    pub working: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpeakerOutcome {
    pub left: bool,
    pub right: bool,
}

impl SpeakerOutcome {
    pub fn failing_channels(&self) -> Vec<SpeakerChannel> {
        let mut failing = Vec::new();
        if !self.left {
            failing.push(SpeakerChannel::Left);
        }
        if !self.right {
            failing.push(SpeakerChannel::Right);
        }
        failing
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SpeakerChannel {
    Left,
    Right,
}

/// Result handed back by an interactive harness when the human finishes a step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum InteractiveOutcome {
    Screen(ScreenOutcome),
    Keyboard(KeyboardOutcome),
    Trackpad(TrackpadOutcome),
    Camera(DeviceOutcome),
    Microphone(DeviceOutcome),
    Speaker(SpeakerOutcome),
}

impl InteractiveOutcome {
    pub fn step(&self) -> StepId {
        match self {
            InteractiveOutcome::Screen(_) => StepId::Screen,
            InteractiveOutcome::Keyboard(_) => StepId::Keyboard,
            InteractiveOutcome::Trackpad(_) => StepId::Trackpad,
            InteractiveOutcome::Camera(_) => StepId::Camera,
            InteractiveOutcome::Microphone(_) => StepId::Microphone,
            InteractiveOutcome::Speaker(_) => StepId::Speaker,
        }
    }
}

impl From<InteractiveOutcome> for StepMeasurement {
    fn from(outcome: InteractiveOutcome) -> Self {
        match outcome {
            InteractiveOutcome::Screen(value) => StepMeasurement::Screen(value),
            InteractiveOutcome::Keyboard(value) => StepMeasurement::Keyboard(value),
            InteractiveOutcome::Trackpad(value) => StepMeasurement::Trackpad(value),
            InteractiveOutcome::Camera(value) => StepMeasurement::Camera(value),
            InteractiveOutcome::Microphone(value) => StepMeasurement::Microphone(value),
            InteractiveOutcome::Speaker(value) => StepMeasurement::Speaker(value),
        }
    }
}

/// One resolved measurement, tagged by the step that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "step", content = "data", rename_all = "snake_case")]
pub enum StepMeasurement {
    Hardware(HardwareInfo),
    Battery(BatteryReading),
    Storage(StorageReading),
    Refurbishment(RefurbishmentCheck),
    Network(NetworkReading),
    Sensors(SensorReading),
    Screen(ScreenOutcome),
    Keyboard(KeyboardOutcome),
    Trackpad(TrackpadOutcome),
    Camera(DeviceOutcome),
    Microphone(DeviceOutcome),
    Speaker(SpeakerOutcome),
}

impl StepMeasurement {
    pub fn step(&self) -> StepId {
        match self {
            StepMeasurement::Hardware(_) => StepId::Hardware,
            StepMeasurement::Battery(_) => StepId::Battery,
            StepMeasurement::Storage(_) => StepId::Storage,
            StepMeasurement::Refurbishment(_) => StepId::Refurbishment,
            StepMeasurement::Network(_) => StepId::Network,
            StepMeasurement::Sensors(_) => StepId::Sensors,
            StepMeasurement::Screen(_) => StepId::Screen,
            StepMeasurement::Keyboard(_) => StepId::Keyboard,
            StepMeasurement::Trackpad(_) => StepId::Trackpad,
            StepMeasurement::Camera(_) => StepId::Camera,
            StepMeasurement::Microphone(_) => StepId::Microphone,
            StepMeasurement::Speaker(_) => StepId::Speaker,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum Measurement<T> {
    Pending,
    Measured(T),
    Unmeasured(UnmeasuredReason),
}

impl<T> Default for Measurement<T> {
    fn default() -> Self {
        Measurement::Pending
    }
}

impl<T> Measurement<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Measurement::Measured(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Measurement::Pending)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum UnmeasuredReason {
    ProbeFailed { message: String },
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RawMeasurements {
    #[serde(default)]
    pub hardware: Measurement<HardwareInfo>,
    #[serde(default)]
    pub battery: Measurement<BatteryReading>,
    #[serde(default)]
    pub storage: Measurement<StorageReading>,
    #[serde(default)]
    pub refurbishment: Measurement<RefurbishmentCheck>,
    #[serde(default)]
    pub network: Measurement<NetworkReading>,
    #[serde(default)]
    pub sensors: Measurement<SensorReading>,
    #[serde(default)]
    pub screen: Measurement<ScreenOutcome>,
    #[serde(default)]
    pub keyboard: Measurement<KeyboardOutcome>,
    #[serde(default)]
    pub trackpad: Measurement<TrackpadOutcome>,
    #[serde(default)]
    pub camera: Measurement<DeviceOutcome>,
    #[serde(default)]
    pub microphone: Measurement<DeviceOutcome>,
    #[serde(default)]
    pub speaker: Measurement<SpeakerOutcome>,
}

impl RawMeasurements {
    pub fn is_recorded(&self, step: StepId) -> bool {
        match step {
            StepId::Hardware => !self.hardware.is_pending(),
            StepId::Battery => !self.battery.is_pending(),
            StepId::Storage => !self.storage.is_pending(),
            StepId::Refurbishment => !self.refurbishment.is_pending(),
            StepId::Network => !self.network.is_pending(),
            StepId::Sensors => !self.sensors.is_pending(),
            StepId::Screen => !self.screen.is_pending(),
            StepId::Keyboard => !self.keyboard.is_pending(),
            StepId::Trackpad => !self.trackpad.is_pending(),
            StepId::Camera => !self.camera.is_pending(),
            StepId::Microphone => !self.microphone.is_pending(),
            StepId::Speaker => !self.speaker.is_pending(),
        }
    }

    pub(crate) fn store(&mut self, measurement: StepMeasurement) {
        match measurement {
            StepMeasurement::Hardware(v) => self.hardware = Measurement::Measured(v),
            StepMeasurement::Battery(v) => self.battery = Measurement::Measured(v),
            StepMeasurement::Storage(v) => self.storage = Measurement::Measured(v),
            StepMeasurement::Refurbishment(v) => self.refurbishment = Measurement::Measured(v),
            StepMeasurement::Network(v) => self.network = Measurement::Measured(v),
            StepMeasurement::Sensors(v) => self.sensors = Measurement::Measured(v),
            StepMeasurement::Screen(v) => self.screen = Measurement::Measured(v),
            StepMeasurement::Keyboard(v) => self.keyboard = Measurement::Measured(v),
            StepMeasurement::Trackpad(v) => self.trackpad = Measurement::Measured(v),
            StepMeasurement::Camera(v) => self.camera = Measurement::Measured(v),
            StepMeasurement::Microphone(v) => self.microphone = Measurement::Measured(v),
            StepMeasurement::Speaker(v) => self.speaker = Measurement::Measured(v),
        }
    }

    pub(crate) fn store_unmeasured(&mut self, step: StepId, reason: UnmeasuredReason) {
        match step {
            StepId::Hardware => self.hardware = Measurement::Unmeasured(reason),
            StepId::Battery => self.battery = Measurement::Unmeasured(reason),
            StepId::Storage => self.storage = Measurement::Unmeasured(reason),
            StepId::Refurbishment => self.refurbishment = Measurement::Unmeasured(reason),
            StepId::Network => self.network = Measurement::Unmeasured(reason),
            StepId::Sensors => self.sensors = Measurement::Unmeasured(reason),
            StepId::Screen => self.screen = Measurement::Unmeasured(reason),
            StepId::Keyboard => self.keyboard = Measurement::Unmeasured(reason),
            StepId::Trackpad => self.trackpad = Measurement::Unmeasured(reason),
            StepId::Camera => self.camera = Measurement::Unmeasured(reason),
            StepId::Microphone => self.microphone = Measurement::Unmeasured(reason),
            StepId::Speaker => self.speaker = Measurement::Unmeasured(reason),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    Battery,
    Storage,
    Screen,
    Keyboard,
    Trackpad,
    Camera,
    Microphone,
    Speaker,
    Refurbishment,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Warning,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Issue {
    pub rule_id: String,
    pub category: IssueCategory,
    pub severity: IssueSeverity,
    pub title: String,
    pub description: String,
    pub suggestion: String,
    #[serde(default)]
    pub evidence: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleTrace {
    pub rule_id: String,
    pub status: RuleTraceStatus,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RuleTraceStatus {
    Emitted,
    #[default]
    Skipped,
    NotTested,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct StatusCounts {
    pub total: usize,
    pub passed: usize,
    pub warning: usize,
    pub failed: usize,
    pub skipped: usize,
    pub pending: usize,
    pub testing: usize,
}

impl StatusCounts {
    pub fn tally<'a>(statuses: impl IntoIterator<Item = &'a StepStatus>) -> Self {
        let mut counts = StatusCounts::default();
        for status in statuses {
            counts.total += 1;
            match status {
                StepStatus::Pending => counts.pending += 1,
                StepStatus::Testing => counts.testing += 1,
                StepStatus::Passed => counts.passed += 1,
                StepStatus::Warning => counts.warning += 1,
                StepStatus::Failed => counts.failed += 1,
                StepStatus::Skipped => counts.skipped += 1,
            }
        }
        counts
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepResult {
    pub id: StepId,
    pub category: StepCategory,
    pub interactive: bool,
    pub status: StepStatus,
    pub display_value: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectionReport {
    pub report_version: String,
    pub report_id: String,
    pub generated_at: String,
    pub score: u8,
    pub counts: StatusCounts,
    pub steps: Vec<StepResult>,
    pub summaries: ReportSummaries,
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub rule_traces: Vec<RuleTrace>,
    pub measurements: RawMeasurements,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ReportSummaries {
    #[serde(default)]
    pub device: Option<DeviceSummary>,
    #[serde(default)]
    pub battery: Option<BatterySummary>,
    #[serde(default)]
    pub storage: Option<StorageSummary>,
    #[serde(default)]
    pub network: Option<NetworkSummary>,
    #[serde(default)]
    pub refurbishment: Option<RefurbishmentSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceSummary {
    pub cpu_model: String,
    pub cpu_cores: usize,
    pub memory_bytes: u64,
    pub serial_number: String,
    pub os: String,
    pub hostname: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatterySummary {
    pub health: f64,
    pub cycle_count: u32,
    pub is_charging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageSummary {
    pub model: String,
    pub smart_status: String,
    pub healthy: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkSummary {
    pub wifi_enabled: bool,
    pub bluetooth_available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefurbishmentSummary {
    pub is_refurbished: bool,
    pub confidence: RefurbishmentConfidence,
    pub flagged_indicators: usize,
    pub replaced_parts: Vec<String>,
    pub refurb_program: Option<String>,
}
