//! Per-location merge record and the presentation-ready room view derived from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::format::{format_reading, relative_time};
use crate::models::sensors::{DeviceAssignment, DeviceId, InstallationLocation, LatestSample, RawSample, SampleKey};
use crate::staleness::is_device_missing;

/// Signal quality bucket, 1 (weakest) to 5 (strongest).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SignalStrength(u8);

impl SignalStrength {
    pub fn new(value: u8) -> Option<Self> {
        (1..=5).contains(&value).then_some(SignalStrength(value))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for SignalStrength {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        SignalStrength::new(value).ok_or_else(|| format!("signal strength must be within 1..=5, got {}", value))
    }
}

impl From<SignalStrength> for u8 {
    fn from(value: SignalStrength) -> Self {
        value.0
    }
}

/// Location metadata merged with its latest sample and device assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationSamplePairing {
    pub installation_location: InstallationLocation,
    pub sample: Option<RawSample>,
    /// Epoch milliseconds of the latest sample, if one exists and its timestamp parses.
    pub device_last_seen_at: Option<i64>,
    pub is_device_assigned: bool,
    /// Reserved for signal-quality ingestion; always `None` for now.
    pub signal_strength: Option<SignalStrength>,
    pub device_id: Option<DeviceId>,
}

impl LocationSamplePairing {
    pub fn new(
        installation_location: InstallationLocation,
        latest: Option<LatestSample>,
        assignment: Option<DeviceAssignment>,
    ) -> Self {
        let (sample, device_last_seen_at) = match latest {
            Some(latest) => (latest.sample, latest.timestamp.and_then(|ts| ts.epoch_millis())),
            None => (None, None),
        };

        LocationSamplePairing {
            installation_location,
            sample,
            device_last_seen_at,
            is_device_assigned: assignment.is_some(),
            signal_strength: None,
            device_id: assignment.and_then(|a| a.device_id),
        }
    }
}

/// Presentation-ready status of one installation location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub temperature: String,
    pub humidity: String,
    pub co2: String,
    pub tvoc: String,
    pub pressure: String,
    pub battery: String,
    pub name: String,
    pub color: String,
    /// Human-relative age of the latest sample ("10 minutes ago").
    pub device_last_seen_at: Option<String>,
    pub installation_location_id: String,
    pub is_device_assigned: bool,
    pub is_device_missing: bool,
    pub signal_strength: Option<SignalStrength>,
}

impl Room {
    /// Project a pairing into its room view, evaluated against `now`.
    pub fn from_pairing(pairing: &LocationSamplePairing, now: DateTime<Utc>) -> Self {
        let sample = pairing.sample.as_ref();
        // A zero timestamp carries no information
        let last_seen = pairing.device_last_seen_at.filter(|ms| *ms != 0);
        let location = &pairing.installation_location;

        Room {
            temperature: format_reading(sample, SampleKey::Temperature, "°C"),
            humidity: format_reading(sample, SampleKey::Humidity, "%"),
            co2: format_reading(sample, SampleKey::Co2, "ppm"),
            tvoc: format_reading(sample, SampleKey::Tvoc, "iaq"),
            pressure: format_reading(sample, SampleKey::Pressure, ""),
            battery: format_reading(sample, SampleKey::Battery, "%"),
            name: location.name.clone(),
            color: location.color.clone(),
            device_last_seen_at: relative_time(last_seen, now),
            installation_location_id: location.id.0.clone(),
            is_device_assigned: pairing.is_device_assigned,
            is_device_missing: is_device_missing(pairing.is_device_assigned, last_seen, now),
            signal_strength: pairing.signal_strength,
        }
    }
}
