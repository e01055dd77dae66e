use crate::error::ProbeError;
use crate::model::{
    BatteryReading, BluetoothState, CpuInfo, HardwareInfo, MemoryInfo, NetworkReading,
    RefurbishmentCheck, RefurbishmentConfidence, RefurbishmentDetails, SensorReading,
    StorageReading, TemperatureReading, WifiState,
};
use crate::probe::DeviceProbes;

/// Canned probe results. Starts from a healthy machine; override any slot
/// with struct update syntax.
#[derive(Debug, Clone)]
pub struct StaticProbes {
    pub hardware: Result<HardwareInfo, ProbeError>,
    pub battery: Result<BatteryReading, ProbeError>,
    pub storage: Result<StorageReading, ProbeError>,
    pub refurbishment: Result<RefurbishmentCheck, ProbeError>,
    pub network: Result<NetworkReading, ProbeError>,
    pub sensors: Result<SensorReading, ProbeError>,
}

impl StaticProbes {
    pub fn healthy() -> Self {
        Self {
            hardware: Ok(HardwareInfo {
                cpu: CpuInfo {
                    model: "Apple M1".to_string(),
                    cores: 8,
                },
                memory: MemoryInfo {
                    total: 16 * 1024 * 1024 * 1024,
                },
                serial_number: "C02XK1ABCDEF".to_string(),
                os_name: "macOS".to_string(),
                os_version: "14.5".to_string(),
                hostname: "studio-mbp".to_string(),
                disks: Vec::new(),
            }),
            battery: Ok(BatteryReading {
                health: 92.0,
                cycle_count: 143,
                design_capacity: 4382,
                current_capacity: 4031,
                is_charging: false,
                temperature: Some(30.5),
            }),
            storage: Ok(StorageReading {
                model: "APPLE SSD AP0512Q".to_string(),
                smart_status: "Verified".to_string(),
                power_on_hours: None,
                temperature: None,
            }),
            refurbishment: Ok(RefurbishmentCheck {
                is_refurbished: false,
                confidence: RefurbishmentConfidence::Low,
                indicators: Vec::new(),
                replaced_parts: Vec::new(),
                details: RefurbishmentDetails::default(),
            }),
            network: Ok(NetworkReading {
                wifi: WifiState {
                    available: true,
                    enabled: true,
                },
                bluetooth: BluetoothState { available: true },
            }),
            sensors: Ok(SensorReading {
                temperatures: vec![TemperatureReading {
                    label: "CPU".to_string(),
                    celsius: 41.0,
                    critical: Some(100.0),
                }],
            }),
        }
    }
}

impl Default for StaticProbes {
    fn default() -> Self {
        Self::healthy()
    }
}

impl DeviceProbes for StaticProbes {
    fn hardware(&self) -> Result<HardwareInfo, ProbeError> {
        self.hardware.clone()
    }

    fn battery(&self) -> Result<BatteryReading, ProbeError> {
        self.battery.clone()
    }

    fn storage(&self) -> Result<StorageReading, ProbeError> {
        self.storage.clone()
    }

    fn refurbishment(&self) -> Result<RefurbishmentCheck, ProbeError> {
        self.refurbishment.clone()
    }

    fn network(&self) -> Result<NetworkReading, ProbeError> {
        self.network.clone()
    }

    fn sensors(&self) -> Result<SensorReading, ProbeError> {
        self.sensors.clone()
    }
}
