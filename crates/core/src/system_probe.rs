#[cfg(target_os = "linux")]
use std::fs;
#[cfg(target_os = "linux")]
use std::path::Path;
use std::process::Command;

use serde_json::Value;
use sysinfo::{Components, Disks, System};

use crate::error::ProbeError;
use crate::model::{
    BatteryReading, CpuInfo, DiskSummary, HardwareInfo, MemoryInfo, NetworkReading,
    RefurbishmentCheck, SensorReading, StorageReading, TemperatureReading,
};
#[cfg(any(target_os = "macos", target_os = "linux"))]
use crate::model::{BluetoothState, WifiState};
use crate::probe::DeviceProbes;
use crate::refurbish::{assess_refurbishment, RefurbishmentSignals};

const UNKNOWN: &str = "Unknown";

/// Probes backed by `sysinfo` and the platform's own reporting commands.
#[derive(Debug, Clone, Default)]
pub struct SystemProbes;

impl SystemProbes {
    pub fn new() -> Self {
        Self
    }
}

impl DeviceProbes for SystemProbes {
    fn hardware(&self) -> Result<HardwareInfo, ProbeError> {
        let mut sys = System::new_all();
        sys.refresh_all();

        let cpu = CpuInfo {
            model: sys
                .cpus()
                .first()
                .map(|cpu| cpu.brand().trim().to_string())
                .unwrap_or_default(),
            cores: sys.cpus().len(),
        };
        let disks = Disks::new_with_refreshed_list()
            .list()
            .iter()
            .map(|disk| DiskSummary {
                name: disk.name().to_string_lossy().to_string(),
                total_bytes: disk.total_space(),
                available_bytes: disk.available_space(),
                kind: format!("{:?}", disk.kind()),
            })
            .collect();

        Ok(HardwareInfo {
            cpu,
            memory: MemoryInfo {
                total: sys.total_memory(),
            },
            serial_number: serial_number(),
            os_name: System::name().unwrap_or_default(),
            os_version: System::os_version().unwrap_or_default(),
            hostname: System::host_name().unwrap_or_default(),
            disks,
        })
    }

    fn battery(&self) -> Result<BatteryReading, ProbeError> {
        #[cfg(target_os = "macos")]
        {
            let output = run_command("ioreg", &["-r", "-c", "AppleSmartBattery", "-w0"])?;
            parse_ioreg_battery(&output)
        }
        #[cfg(target_os = "linux")]
        {
            read_linux_battery()
        }
        #[cfg(not(any(target_os = "macos", target_os = "linux")))]
        {
            Err(ProbeError::Unavailable(
                "battery readings are not supported on this platform".to_string(),
            ))
        }
    }

    fn storage(&self) -> Result<StorageReading, ProbeError> {
        #[cfg(target_os = "macos")]
        {
            let output = run_command("diskutil", &["info", "disk0"])?;
            parse_diskutil_info(&output)
        }
        #[cfg(target_os = "windows")]
        {
            let output = run_command(
                "powershell",
                &[
                    "-Command",
                    "Get-PhysicalDisk | Select-Object FriendlyName, HealthStatus | ConvertTo-Json",
                ],
            )?;
            parse_physical_disk_json(&output)
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        {
            Err(ProbeError::Unavailable(
                "SMART status is not readable without elevated tooling on this platform"
                    .to_string(),
            ))
        }
    }

    fn refurbishment(&self) -> Result<RefurbishmentCheck, ProbeError> {
        Ok(assess_refurbishment(&collect_refurbishment_signals()))
    }

    fn network(&self) -> Result<NetworkReading, ProbeError> {
        #[cfg(target_os = "macos")]
        {
            let wifi = run_command("networksetup", &["-getairportpower", "en0"])
                .map(|out| out.contains("On"))
                .unwrap_or(false);
            let bluetooth = run_command("system_profiler", &["SPBluetoothDataType"])
                .map(|out| !out.trim().is_empty())
                .unwrap_or(false);
            Ok(NetworkReading {
                wifi: WifiState {
                    available: true,
                    enabled: wifi,
                },
                bluetooth: BluetoothState {
                    available: bluetooth,
                },
            })
        }
        #[cfg(target_os = "linux")]
        {
            let mut available = false;
            let mut enabled = false;
            if let Ok(entries) = fs::read_dir("/sys/class/net") {
                for entry in entries.flatten() {
                    let path = entry.path();
                    if !path.join("wireless").exists() {
                        continue;
                    }
                    available = true;
                    let state = fs::read_to_string(path.join("operstate")).unwrap_or_default();
                    enabled |= state.trim() == "up";
                }
            }
            let bluetooth = fs::read_dir("/sys/class/bluetooth")
                .map(|mut entries| entries.next().is_some())
                .unwrap_or(false);
            Ok(NetworkReading {
                wifi: WifiState { available, enabled },
                bluetooth: BluetoothState {
                    available: bluetooth,
                },
            })
        }
        #[cfg(not(any(target_os = "macos", target_os = "linux")))]
        {
            Err(ProbeError::Unavailable(
                "network adapters are not inspected on this platform".to_string(),
            ))
        }
    }

    fn sensors(&self) -> Result<SensorReading, ProbeError> {
        let components = Components::new_with_refreshed_list();
        let temperatures = components
            .list()
            .iter()
            .filter(|component| component.temperature().is_finite())
            .map(|component| TemperatureReading {
                label: component.label().to_string(),
                celsius: component.temperature(),
                critical: component.critical(),
            })
            .collect();
        Ok(SensorReading { temperatures })
    }
}

#[cfg_attr(not(any(target_os = "macos", target_os = "windows")), allow(dead_code))]
fn run_command(program: &str, args: &[&str]) -> Result<String, ProbeError> {
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|err| ProbeError::Command {
            command: program.to_string(),
            message: err.to_string(),
        })?;
    if !output.status.success() {
        return Err(ProbeError::Command {
            command: program.to_string(),
            message: format!("exited with {}", output.status),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

fn serial_number() -> String {
    #[cfg(target_os = "macos")]
    {
        run_command("ioreg", &["-l"])
            .ok()
            .and_then(|out| parse_ioreg_serial(&out))
            .unwrap_or_else(|| UNKNOWN.to_string())
    }
    #[cfg(target_os = "windows")]
    {
        run_command("wmic", &["bios", "get", "serialnumber"])
            .ok()
            .and_then(|out| parse_wmic_serial(&out))
            .unwrap_or_else(|| UNKNOWN.to_string())
    }
    #[cfg(target_os = "linux")]
    {
        fs::read_to_string("/sys/class/dmi/id/product_serial")
            .ok()
            .map(|serial| serial.trim().to_string())
            .filter(|serial| !serial.is_empty())
            .unwrap_or_else(|| UNKNOWN.to_string())
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    {
        UNKNOWN.to_string()
    }
}

pub fn parse_ioreg_serial(output: &str) -> Option<String> {
    output
        .lines()
        .find(|line| line.contains("IOPlatformSerialNumber"))
        .and_then(|line| line.split('"').nth(3))
        .map(str::to_string)
}

pub fn parse_wmic_serial(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .nth(1)
        .map(str::to_string)
}

fn extract_number(line: &str) -> Option<i64> {
    line.split('=').nth(1)?.trim().parse::<i64>().ok()
}

/// Parses `ioreg -r -c AppleSmartBattery` output.
///
/// Newer macOS exposes the real full-charge capacity as `AppleRawMaxCapacity`;
/// older releases report it in `MaxCapacity` as mAh. When `MaxCapacity` is only
/// a percentage the design capacity is used and health reads 100.
pub fn parse_ioreg_battery(output: &str) -> Result<BatteryReading, ProbeError> {
    let mut seen = false;
    let mut cycle_count = 0_u32;
    let mut design_capacity = 0_u32;
    let mut max_capacity = 0_u32;
    let mut raw_max_capacity = 0_u32;
    let mut current_capacity = 0_u32;
    let mut is_charging = false;
    let mut temperature = None;

    for line in output.lines().map(str::trim) {
        let value = extract_number(line).and_then(|value| u32::try_from(value).ok());
        if line.contains("\"CycleCount\"") && !line.contains("CycleCountLastQmax") {
            seen = true;
            cycle_count = value.unwrap_or(cycle_count);
        } else if line.contains("\"DesignCapacity\"") && !line.contains("DesignCapacityUI") {
            seen = true;
            design_capacity = value.unwrap_or(design_capacity);
        } else if line.contains("\"AppleRawMaxCapacity\"") {
            raw_max_capacity = value.unwrap_or(raw_max_capacity);
        } else if line.contains("\"MaxCapacity\"") && !line.contains("MaxCapacityUI") {
            max_capacity = value.unwrap_or(max_capacity);
        } else if line.contains("\"CurrentCapacity\"") && !line.contains("CurrentCapacityUI") {
            current_capacity = value.unwrap_or(current_capacity);
        } else if line.contains("\"IsCharging\"") {
            is_charging = line.contains("Yes");
        } else if line.contains("\"Temperature\"") {
            if let Some(value) = extract_number(line) {
                temperature = Some(value as f64 / 100.0);
            }
        }
    }

    if !seen {
        return Err(ProbeError::Unavailable("no AppleSmartBattery found".to_string()));
    }

    let actual_max = if raw_max_capacity > 0 {
        raw_max_capacity
    } else if max_capacity > 100 {
        max_capacity
    } else {
        design_capacity
    };

    Ok(BatteryReading {
        health: capacity_health(actual_max, design_capacity),
        cycle_count,
        design_capacity,
        current_capacity,
        is_charging,
        temperature,
    })
}

fn capacity_health(full: u32, design: u32) -> f64 {
    if design == 0 || full == 0 {
        return 100.0;
    }
    f64::from(full) / f64::from(design) * 100.0
}

#[cfg(target_os = "linux")]
fn read_linux_battery() -> Result<BatteryReading, ProbeError> {
    let entries = fs::read_dir("/sys/class/power_supply").map_err(|err| {
        ProbeError::Unavailable(format!("power_supply class unreadable: {err}"))
    })?;
    for entry in entries.flatten() {
        let path = entry.path();
        let kind = fs::read_to_string(path.join("type")).unwrap_or_default();
        if kind.trim() == "Battery" {
            return linux_battery_from_dir(&path);
        }
    }
    Err(ProbeError::Unavailable("no battery present".to_string()))
}

#[cfg(target_os = "linux")]
fn linux_battery_from_dir(dir: &Path) -> Result<BatteryReading, ProbeError> {
    let read = |name: &str| -> Option<u32> {
        fs::read_to_string(dir.join(name))
            .ok()
            .and_then(|value| value.trim().parse::<u64>().ok())
            // sysfs reports µAh/µWh; mAh/mWh keeps values within u32.
            .map(|value| (value / 1000) as u32)
    };
    let full = read("charge_full").or_else(|| read("energy_full"));
    let design = read("charge_full_design").or_else(|| read("energy_full_design"));
    let now = read("charge_now").or_else(|| read("energy_now"));
    let (Some(full), Some(design)) = (full, design) else {
        return Err(ProbeError::Parse {
            source_name: dir.display().to_string(),
            message: "missing full/design capacity".to_string(),
        });
    };
    let cycle_count = fs::read_to_string(dir.join("cycle_count"))
        .ok()
        .and_then(|value| value.trim().parse::<u32>().ok())
        .unwrap_or(0);
    let status = fs::read_to_string(dir.join("status")).unwrap_or_default();

    Ok(BatteryReading {
        health: capacity_health(full, design),
        cycle_count,
        design_capacity: design,
        current_capacity: now.unwrap_or(0),
        is_charging: status.trim() == "Charging",
        temperature: None,
    })
}

/// Parses `diskutil info disk0` for the SMART line and media name.
pub fn parse_diskutil_info(output: &str) -> Result<StorageReading, ProbeError> {
    let mut smart_status = None;
    let mut model = None;
    for line in output.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        match key.trim() {
            "SMART Status" => smart_status = Some(value.trim().to_string()),
            "Device / Media Name" => model = Some(value.trim().to_string()),
            _ => {}
        }
    }

    let smart_status = smart_status.ok_or_else(|| ProbeError::Parse {
        source_name: "diskutil".to_string(),
        message: "no SMART Status line".to_string(),
    })?;
    Ok(StorageReading {
        model: model.unwrap_or_else(|| UNKNOWN.to_string()),
        smart_status,
        power_on_hours: None,
        temperature: None,
    })
}

/// Parses `Get-PhysicalDisk | ConvertTo-Json`, which is an object for one
/// disk and an array for several. The first disk is taken as the system disk.
pub fn parse_physical_disk_json(output: &str) -> Result<StorageReading, ProbeError> {
    let json: Value = serde_json::from_str(output).map_err(|err| ProbeError::Parse {
        source_name: "Get-PhysicalDisk".to_string(),
        message: err.to_string(),
    })?;
    let disk = match &json {
        Value::Array(items) => items.first(),
        other => Some(other),
    }
    .ok_or_else(|| ProbeError::Unavailable("no physical disks listed".to_string()))?;

    let smart_status = disk
        .get("HealthStatus")
        .and_then(Value::as_str)
        .ok_or_else(|| ProbeError::Parse {
            source_name: "Get-PhysicalDisk".to_string(),
            message: "missing HealthStatus".to_string(),
        })?;
    Ok(StorageReading {
        model: disk
            .get("FriendlyName")
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN)
            .to_string(),
        smart_status: smart_status.to_string(),
        power_on_hours: None,
        temperature: None,
    })
}

/// Vendors of displays attached through an internal connection.
pub fn internal_display_vendors(profiler_json: &str) -> Vec<String> {
    let Ok(json) = serde_json::from_str::<Value>(profiler_json) else {
        return Vec::new();
    };
    json.get("SPDisplaysDataType")
        .and_then(Value::as_array)
        .map(|displays| {
            displays
                .iter()
                .filter(|display| {
                    display
                        .get("spdisplays_connection_type")
                        .and_then(Value::as_str)
                        .map(|kind| kind.contains("Internal"))
                        .unwrap_or(false)
                })
                .filter_map(|display| display.get("spdisplays_vendor").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

pub fn has_provisioning_udid(hardware_json: &str) -> bool {
    serde_json::from_str::<Value>(hardware_json)
        .ok()
        .and_then(|json| {
            json.get("SPHardwareDataType")
                .and_then(Value::as_array)
                .and_then(|items| items.first())
                .map(|first| first.get("provisioning_UDID").is_some())
        })
        .unwrap_or(false)
}

#[cfg(target_os = "macos")]
fn collect_refurbishment_signals() -> RefurbishmentSignals {
    let mut signals = RefurbishmentSignals {
        serial_number: Some(serial_number()).filter(|serial| serial != UNKNOWN),
        ..RefurbishmentSignals::default()
    };

    if let Ok(registry) = run_command("ioreg", &["-l"]) {
        signals.firmware_marker =
            registry.contains("refurbished") || registry.contains("Refurbished");
        signals.battery_manufacture_date = registry
            .lines()
            .filter(|line| line.contains("ManufactureDate"))
            .filter_map(|line| line.split('=').nth(1))
            .map(|value| value.trim().to_string())
            .last();
    }
    signals.os_install_date = run_command("stat", &["-f", "%SB", "/var/db/.AppleSetupDone"])
        .ok()
        .map(|out| out.trim().to_string())
        .filter(|out| !out.is_empty());
    signals.enterprise_managed = run_command("system_profiler", &["SPHardwareDataType", "-json"])
        .map(|out| has_provisioning_udid(&out))
        .unwrap_or(false);
    signals.battery_cycle_count = run_command("ioreg", &["-r", "-c", "AppleSmartBattery", "-w0"])
        .ok()
        .and_then(|out| parse_ioreg_battery(&out).ok())
        .map(|battery| battery.cycle_count);
    if let Ok(info) = run_command("diskutil", &["info", "disk0"]) {
        let internal = info
            .lines()
            .any(|line| line.contains("Device Location:") && line.contains("Internal"));
        if internal {
            signals.internal_storage_model = parse_diskutil_info(&info)
                .ok()
                .map(|storage| storage.model)
                .filter(|model| model != UNKNOWN);
        }
    }
    signals.internal_display_vendors =
        run_command("system_profiler", &["SPDisplaysDataType", "-json"])
            .map(|out| internal_display_vendors(&out))
            .unwrap_or_default();
    signals
}

#[cfg(target_os = "windows")]
fn collect_refurbishment_signals() -> RefurbishmentSignals {
    let powershell = |script: &str| run_command("powershell", &["-Command", script]).ok();
    let contains_marker = |text: &str| {
        let lowered = text.to_lowercase();
        lowered.contains("refurb") || lowered.contains("renewed")
    };

    let battery_health = powershell(
        "Get-WmiObject Win32_Battery | Select-Object DesignCapacity,FullChargeCapacity | ConvertTo-Json",
    )
    .and_then(|out| serde_json::from_str::<Value>(&out).ok())
    .and_then(|json| {
        let design = json.get("DesignCapacity").and_then(Value::as_u64)?;
        let full = json.get("FullChargeCapacity").and_then(Value::as_u64)?;
        (design > 0).then(|| full as f64 / design as f64 * 100.0)
    });

    RefurbishmentSignals {
        serial_number: Some(serial_number()).filter(|serial| serial != UNKNOWN),
        firmware_marker: powershell(
            "Get-WmiObject Win32_BIOS | Select-Object Manufacturer,SerialNumber,ReleaseDate | ConvertTo-Json",
        )
        .map(|out| contains_marker(&out))
        .unwrap_or(false),
        oem_marker: powershell(
            "Get-ItemProperty 'HKLM:\\SOFTWARE\\Microsoft\\Windows\\CurrentVersion\\OEMInformation' 2>$null | ConvertTo-Json",
        )
        .map(|out| contains_marker(&out))
        .unwrap_or(false),
        battery_health,
        os_install_date: powershell("(Get-CimInstance Win32_OperatingSystem).InstallDate")
            .map(|out| out.trim().to_string())
            .filter(|out| !out.is_empty()),
        ..RefurbishmentSignals::default()
    }
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn collect_refurbishment_signals() -> RefurbishmentSignals {
    #[cfg(target_os = "linux")]
    let battery = read_linux_battery().ok();
    #[cfg(not(target_os = "linux"))]
    let battery: Option<BatteryReading> = None;

    RefurbishmentSignals {
        serial_number: Some(serial_number()).filter(|serial| serial != UNKNOWN),
        battery_cycle_count: battery
            .as_ref()
            .map(|battery| battery.cycle_count)
            .filter(|cycles| *cycles > 0),
        ..RefurbishmentSignals::default()
    }
}
