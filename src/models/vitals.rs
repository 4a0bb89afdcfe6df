use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Column names of the exported CSV
pub const VITALS_CSV_HEADER: &str = "Date,Heart Rate,SpO2,Blood Pressure,Temperature";

/// A single set of vital sign readings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalsResult {
    /// Heart rate in beats per minute
    pub heart_rate_bpm: u32,

    /// Blood oxygen saturation percentage
    #[serde(rename = "spO2Percent")]
    pub spo2_percent: u32,

    /// Blood pressure in mmHg
    pub blood_pressure: BloodPressure,

    /// Body temperature in degrees Celsius
    pub temperature: f64,

    /// When the reading was produced
    pub timestamp: DateTime<Utc>,
}

/// Blood pressure reading in mmHg
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloodPressure {
    pub systolic: u32,
    pub diastolic: u32,
}

/// Health status of a single reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VitalStatus {
    Normal,
    Warning,
    Critical,
}

impl std::fmt::Display for VitalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VitalStatus::Normal => write!(f, "Normal"),
            VitalStatus::Warning => write!(f, "Warning"),
            VitalStatus::Critical => write!(f, "Critical"),
        }
    }
}

impl std::fmt::Display for BloodPressure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.systolic, self.diastolic)
    }
}

impl BloodPressure {
    pub fn status(&self) -> VitalStatus {
        if self.systolic < 130 && self.diastolic < 80 {
            VitalStatus::Normal
        } else if self.systolic < 140 && self.diastolic < 90 {
            VitalStatus::Warning
        } else {
            VitalStatus::Critical
        }
    }
}

impl VitalsResult {
    /// The canned reading every mock collaborator hands out
    pub fn mock(timestamp: DateTime<Utc>) -> Self {
        Self {
            heart_rate_bpm: 72,
            spo2_percent: 98,
            blood_pressure: BloodPressure {
                systolic: 118,
                diastolic: 76,
            },
            temperature: 36.8,
            timestamp,
        }
    }

    pub fn heart_rate_status(&self) -> VitalStatus {
        if (60..=100).contains(&self.heart_rate_bpm) {
            VitalStatus::Normal
        } else {
            VitalStatus::Warning
        }
    }

    pub fn spo2_status(&self) -> VitalStatus {
        if self.spo2_percent >= 95 {
            VitalStatus::Normal
        } else if self.spo2_percent >= 90 {
            VitalStatus::Warning
        } else {
            VitalStatus::Critical
        }
    }

    pub fn blood_pressure_status(&self) -> VitalStatus {
        self.blood_pressure.status()
    }

    pub fn temperature_status(&self) -> VitalStatus {
        if (36.1..=37.2).contains(&self.temperature) {
            VitalStatus::Normal
        } else if (35.5..=37.8).contains(&self.temperature) {
            VitalStatus::Warning
        } else {
            VitalStatus::Critical
        }
    }

    /// Single-reading CSV document: header line plus one data row
    pub fn to_csv(&self) -> String {
        format!(
            "{}\n{},{},{},{},{}",
            VITALS_CSV_HEADER,
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.heart_rate_bpm,
            self.spo2_percent,
            self.blood_pressure,
            self.temperature
        )
    }

    /// Worst status across all four readings
    pub fn overall_status(&self) -> VitalStatus {
        [
            self.heart_rate_status(),
            self.spo2_status(),
            self.blood_pressure_status(),
            self.temperature_status(),
        ]
        .into_iter()
        .max()
        .unwrap_or(VitalStatus::Normal)
    }
}
