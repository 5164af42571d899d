//! Wire models for the upstream installation/telemetry services.
//!
//! Scope: types only. Field names follow the upstream JSON (camelCase).
//!
//! Notes
//! - Every metric in a sample is optional; a missing key and an explicit `null` decode the same way.
//! - Sample timestamps arrive as numbers or strings depending on the endpoint, so they are kept raw
//!   and parsed on demand with [`RawTimestamp::epoch_millis`].

use serde::{Deserialize, Serialize};

// =====================
// Scalar ID newtype wrappers
// =====================

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstallationId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub String);

impl core::fmt::Display for InstallationId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl core::fmt::Display for LocationId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

// =====================
// Locations
// =====================

/// A named sub-area of an installation (usually a room).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallationLocation {
    pub id: LocationId,
    pub name: String,
    /// Display tag used by clients to colour the room card.
    pub color: String,
}

// =====================
// Samples
// =====================

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SampleKey {
    Temperature,
    Dewpoint,
    Humidity,
    Co2,
    Tvoc,
    Light,
    Status,
    Pressure,
    Battery,
    KilowattHours,
}

impl SampleKey {
    pub const ALL: [SampleKey; 10] = [
        SampleKey::Temperature,
        SampleKey::Dewpoint,
        SampleKey::Humidity,
        SampleKey::Co2,
        SampleKey::Tvoc,
        SampleKey::Light,
        SampleKey::Status,
        SampleKey::Pressure,
        SampleKey::Battery,
        SampleKey::KilowattHours,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SampleKey::Temperature => "temperature",
            SampleKey::Dewpoint => "dewpoint",
            SampleKey::Humidity => "humidity",
            SampleKey::Co2 => "co2",
            SampleKey::Tvoc => "tvoc",
            SampleKey::Light => "light",
            SampleKey::Status => "status",
            SampleKey::Pressure => "pressure",
            SampleKey::Battery => "battery",
            SampleKey::KilowattHours => "kilowattHours",
        }
    }
}

/// Sensor readings of a single sample, keyed by [`SampleKey`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSample {
    /// Upstream sample type tag (device family); not interpreted here.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<i64>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub dewpoint: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub co2: Option<f64>,
    #[serde(default)]
    pub tvoc: Option<f64>,
    #[serde(default)]
    pub light: Option<f64>,
    #[serde(default)]
    pub status: Option<f64>,
    #[serde(default)]
    pub pressure: Option<f64>,
    #[serde(default)]
    pub battery: Option<f64>,
    #[serde(default)]
    pub kilowatt_hours: Option<f64>,
}

impl RawSample {
    pub fn get(&self, key: SampleKey) -> Option<f64> {
        match key {
            SampleKey::Temperature => self.temperature,
            SampleKey::Dewpoint => self.dewpoint,
            SampleKey::Humidity => self.humidity,
            SampleKey::Co2 => self.co2,
            SampleKey::Tvoc => self.tvoc,
            SampleKey::Light => self.light,
            SampleKey::Status => self.status,
            SampleKey::Pressure => self.pressure,
            SampleKey::Battery => self.battery,
            SampleKey::KilowattHours => self.kilowatt_hours,
        }
    }

    pub fn set(&mut self, key: SampleKey, value: Option<f64>) {
        let slot = match key {
            SampleKey::Temperature => &mut self.temperature,
            SampleKey::Dewpoint => &mut self.dewpoint,
            SampleKey::Humidity => &mut self.humidity,
            SampleKey::Co2 => &mut self.co2,
            SampleKey::Tvoc => &mut self.tvoc,
            SampleKey::Light => &mut self.light,
            SampleKey::Status => &mut self.status,
            SampleKey::Pressure => &mut self.pressure,
            SampleKey::Battery => &mut self.battery,
            SampleKey::KilowattHours => &mut self.kilowatt_hours,
        };
        *slot = value;
    }
}

/// Sample timestamp as sent upstream: epoch milliseconds, either numeric or stringified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Integer(i64),
    Float(f64),
    Text(String),
    /// Any other JSON shape (bool, object, array); never yields a timestamp.
    Other(serde_json::Value),
}

impl RawTimestamp {
    /// Parse as integer epoch milliseconds.
    ///
    /// Text is read up to the first non-digit (after optional leading whitespace and sign),
    /// fractional numbers are truncated. Returns `None` when no integer can be read.
    pub fn epoch_millis(&self) -> Option<i64> {
        match self {
            RawTimestamp::Integer(v) => Some(*v),
            RawTimestamp::Float(v) => {
                if v.is_finite() && v.abs() < i64::MAX as f64 {
                    Some(v.trunc() as i64)
                } else {
                    None
                }
            }
            RawTimestamp::Text(s) => parse_integer_prefix(s),
            RawTimestamp::Other(_) => None,
        }
    }
}

fn parse_integer_prefix(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    let magnitude: i64 = rest[..digits_len].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Latest-sample envelope for a location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestSample {
    /// Device that produced the sample (informational).
    #[serde(default)]
    pub device_id: Option<DeviceId>,
    #[serde(default)]
    pub timestamp: Option<RawTimestamp>,
    #[serde(default)]
    pub sample: Option<RawSample>,
}

// =====================
// Device assignments
// =====================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceAssignment {
    #[serde(default)]
    pub device_id: Option<DeviceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installation_location_id: Option<LocationId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_and_null_metrics_decode_the_same() {
        let sample: RawSample = serde_json::from_str(r#"{"temperature": 21.5, "humidity": null}"#).unwrap();
        assert_eq!(sample.get(SampleKey::Temperature), Some(21.5));
        assert_eq!(sample.get(SampleKey::Humidity), None);
        assert_eq!(sample.get(SampleKey::Co2), None);
    }

    #[test]
    fn sample_type_tag_and_camel_case_keys() {
        let sample: RawSample = serde_json::from_str(r#"{"type": 3, "kilowattHours": 12.25}"#).unwrap();
        assert_eq!(sample.kind, Some(3));
        assert_eq!(sample.get(SampleKey::KilowattHours), Some(12.25));
    }

    #[test]
    fn set_and_get_cover_every_key() {
        let mut sample = RawSample::default();
        for (i, key) in SampleKey::ALL.iter().enumerate() {
            sample.set(*key, Some(i as f64));
        }
        for (i, key) in SampleKey::ALL.iter().enumerate() {
            assert_eq!(sample.get(*key), Some(i as f64), "{}", key.as_str());
        }
    }

    #[test]
    fn sample_key_names_match_wire_names() {
        for key in SampleKey::ALL {
            let json = serde_json::to_value(key).unwrap();
            assert_eq!(json.as_str(), Some(key.as_str()));
        }
    }

    #[test]
    fn timestamp_parsing_variants() {
        let cases: [(&str, Option<i64>); 8] = [
            ("1700000000000", Some(1_700_000_000_000)),
            ("\"1700000000000\"", Some(1_700_000_000_000)),
            ("1700000000000.7", Some(1_700_000_000_000)),
            ("\"  42abc\"", Some(42)),
            ("\"-15\"", Some(-15)),
            ("\"abc\"", None),
            ("\"\"", None),
            ("\"99999999999999999999999\"", None),
        ];
        for (json, expected) in cases {
            let ts: RawTimestamp = serde_json::from_str(json).unwrap();
            assert_eq!(ts.epoch_millis(), expected, "input {json}");
        }
    }

    #[test]
    fn unexpected_timestamp_shapes_decode_without_a_value() {
        for json in ["true", "{\"x\": 1}", "[1700000000000]"] {
            let ts: RawTimestamp = serde_json::from_str(json).unwrap();
            assert!(matches!(ts, RawTimestamp::Other(_)), "input {json}");
            assert_eq!(ts.epoch_millis(), None, "input {json}");
        }

        let latest: LatestSample =
            serde_json::from_str(r#"{"deviceId": "dev-1", "timestamp": false, "sample": {"co2": 800}}"#).unwrap();
        assert_eq!(latest.timestamp.and_then(|t| t.epoch_millis()), None);
        assert_eq!(latest.sample.and_then(|s| s.co2), Some(800.0));
    }

    #[test]
    fn latest_sample_tolerates_missing_parts() {
        let latest: LatestSample = serde_json::from_str("{}").unwrap();
        assert_eq!(latest, LatestSample::default());

        let latest: LatestSample =
            serde_json::from_str(r#"{"deviceId": "dev-1", "timestamp": "1700000000000", "sample": {"co2": 800}}"#)
                .unwrap();
        assert_eq!(latest.device_id, Some(DeviceId("dev-1".into())));
        assert_eq!(latest.timestamp.and_then(|t| t.epoch_millis()), Some(1_700_000_000_000));
        assert_eq!(latest.sample.and_then(|s| s.co2), Some(800.0));
    }
}
