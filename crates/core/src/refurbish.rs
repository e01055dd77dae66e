use crate::model::{
    IndicatorSeverity, RefurbishmentCheck, RefurbishmentConfidence, RefurbishmentDetails,
    RefurbishmentIndicator,
};

pub const CERTIFIED_REFURBISHED_PROGRAM: &str = "Apple Certified Refurbished";
const LOW_CYCLE_COUNT: u32 = 50;
const HIGH_BATTERY_HEALTH: f64 = 95.0;
const ORIGINAL_STORAGE_MARKERS: &[&str] = &["APPLE SSD", "Apple SSD", "Macintosh"];
const ORIGINAL_DISPLAY_MARKERS: &[&str] = &["Apple", "APP"];

/// Raw platform observations gathered by the refurbishment probe.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefurbishmentSignals {
    pub serial_number: Option<String>,
    /// Firmware/BIOS carries a "refurbished" or "renewed" marker.
    pub firmware_marker: bool,
    /// OEM information carries a refurbishment marker.
    pub oem_marker: bool,
    pub enterprise_managed: bool,
    pub battery_cycle_count: Option<u32>,
    pub battery_health: Option<f64>,
    pub internal_storage_model: Option<String>,
    pub internal_display_vendors: Vec<String>,
    pub battery_manufacture_date: Option<String>,
    pub os_install_date: Option<String>,
}

pub fn assess_refurbishment(signals: &RefurbishmentSignals) -> RefurbishmentCheck {
    let mut indicators = Vec::new();
    let mut replaced_parts = Vec::new();
    let mut marked = false;
    let mut refurb_program = None;
    let mut serial_manufacture_date = None;

    if let Some(serial) = signals.serial_number.as_deref() {
        if serial.chars().count() >= 4 {
            if serial.starts_with('F') {
                marked = true;
                refurb_program = Some(CERTIFIED_REFURBISHED_PROGRAM.to_string());
                indicators.push(indicator(
                    "serial_refurb",
                    "Serial number starts with F, the prefix used for certified refurbished units.",
                    IndicatorSeverity::Info,
                ));
            }
            let prefix = serial.chars().take(4).collect::<String>();
            serial_manufacture_date = Some(format!("serial prefix {prefix}"));
        }
    }

    if signals.firmware_marker {
        marked = true;
        indicators.push(indicator(
            "firmware_refurb",
            "Firmware carries a refurbishment marker.",
            IndicatorSeverity::Info,
        ));
    }

    if signals.oem_marker {
        marked = true;
        indicators.push(indicator(
            "oem_refurb",
            "OEM information carries a refurbishment marker.",
            IndicatorSeverity::Info,
        ));
    }

    if signals.enterprise_managed {
        indicators.push(indicator(
            "enterprise_managed",
            "Device was enrolled in enterprise management and may be a retired fleet unit.",
            IndicatorSeverity::Warning,
        ));
    }

    if let Some(cycles) = signals.battery_cycle_count {
        if cycles < LOW_CYCLE_COUNT {
            indicators.push(indicator(
                "low_battery_cycles",
                &format!("Battery has only {cycles} cycles and may have been replaced recently."),
                IndicatorSeverity::Info,
            ));
        }
    }

    if let Some(health) = signals.battery_health {
        if health > HIGH_BATTERY_HEALTH {
            indicators.push(indicator(
                "high_battery_health",
                &format!("Battery health is unusually high ({health:.1}%) and may be a replacement."),
                IndicatorSeverity::Info,
            ));
        }
    }

    if let Some(model) = signals
        .internal_storage_model
        .as_deref()
        .filter(|model| !model.is_empty())
    {
        if !is_original_storage(model) {
            indicators.push(indicator(
                "third_party_storage",
                &format!("Internal storage is not an original part: {model}"),
                IndicatorSeverity::Warning,
            ));
            replaced_parts.push("Storage (SSD)".to_string());
        }
    }

    for vendor in &signals.internal_display_vendors {
        if !ORIGINAL_DISPLAY_MARKERS
            .iter()
            .any(|marker| vendor.contains(marker))
        {
            indicators.push(indicator(
                "third_party_display",
                &format!("Internal display is not an original part: {vendor}"),
                IndicatorSeverity::Warning,
            ));
            replaced_parts.push("Display".to_string());
        }
    }

    let critical = count_severity(&indicators, IndicatorSeverity::Critical);
    let warnings = count_severity(&indicators, IndicatorSeverity::Warning);
    let confidence = if critical > 0 || warnings >= 2 {
        RefurbishmentConfidence::High
    } else if warnings > 0 || indicators.len() >= 2 {
        RefurbishmentConfidence::Medium
    } else {
        RefurbishmentConfidence::Low
    };

    RefurbishmentCheck {
        is_refurbished: marked || !replaced_parts.is_empty() || warnings > 0,
        confidence,
        indicators,
        replaced_parts,
        details: RefurbishmentDetails {
            serial_manufacture_date,
            os_install_date: signals.os_install_date.clone(),
            battery_manufacture_date: signals.battery_manufacture_date.clone(),
            storage_first_use_date: None,
            date_mismatch: signals.battery_manufacture_date.is_some()
                && signals.os_install_date.is_some(),
            refurb_program,
        },
    }
}

fn is_original_storage(model: &str) -> bool {
    model.starts_with("AP")
        || ORIGINAL_STORAGE_MARKERS
            .iter()
            .any(|marker| model.contains(marker))
}

fn indicator(name: &str, description: &str, severity: IndicatorSeverity) -> RefurbishmentIndicator {
    RefurbishmentIndicator {
        name: name.to_string(),
        detected: true,
        description: description.to_string(),
        severity,
    }
}

fn count_severity(indicators: &[RefurbishmentIndicator], severity: IndicatorSeverity) -> usize {
    indicators
        .iter()
        .filter(|indicator| indicator.severity == severity)
        .count()
}

#[cfg(test)]
mod tests {
    use super::{assess_refurbishment, RefurbishmentSignals, CERTIFIED_REFURBISHED_PROGRAM};
    use crate::model::{IndicatorSeverity, RefurbishmentConfidence};

    #[test]
    fn clean_signals_report_original_device() {
        let check = assess_refurbishment(&RefurbishmentSignals {
            serial_number: Some("C02XK1ABCDEF".to_string()),
            battery_cycle_count: Some(300),
            internal_storage_model: Some("APPLE SSD AP0512Q".to_string()),
            internal_display_vendors: vec!["Apple".to_string()],
            ..RefurbishmentSignals::default()
        });

        assert!(!check.is_refurbished);
        assert!(check.indicators.is_empty());
        assert_eq!(check.confidence, RefurbishmentConfidence::Low);
        assert_eq!(
            check.details.serial_manufacture_date.as_deref(),
            Some("serial prefix C02X")
        );
    }

    #[test]
    fn certified_serial_marks_program_without_warning() {
        let check = assess_refurbishment(&RefurbishmentSignals {
            serial_number: Some("FVFXK1ABCDEF".to_string()),
            ..RefurbishmentSignals::default()
        });

        assert!(check.is_refurbished);
        assert_eq!(
            check.details.refurb_program.as_deref(),
            Some(CERTIFIED_REFURBISHED_PROGRAM)
        );
        assert_eq!(check.flagged_indicators().count(), 0);
    }

    #[test]
    fn replaced_parts_raise_confidence() {
        let check = assess_refurbishment(&RefurbishmentSignals {
            internal_storage_model: Some("Samsung SSD 970".to_string()),
            internal_display_vendors: vec!["LG Display".to_string()],
            ..RefurbishmentSignals::default()
        });

        assert!(check.is_refurbished);
        assert_eq!(check.confidence, RefurbishmentConfidence::High);
        assert_eq!(
            check.replaced_parts,
            vec!["Storage (SSD)".to_string(), "Display".to_string()]
        );
        assert!(check
            .indicators
            .iter()
            .all(|indicator| indicator.severity == IndicatorSeverity::Warning));
    }

    #[test]
    fn two_info_indicators_are_medium_confidence() {
        let check = assess_refurbishment(&RefurbishmentSignals {
            firmware_marker: true,
            battery_cycle_count: Some(12),
            battery_manufacture_date: Some("2023-01-10".to_string()),
            os_install_date: Some("2024-03-02".to_string()),
            ..RefurbishmentSignals::default()
        });

        assert_eq!(check.confidence, RefurbishmentConfidence::Medium);
        assert!(check.details.date_mismatch);
        assert!(check.is_refurbished);
    }
}
