//! File-backed collaborator serving installations, locations, samples and assignments from a
//! JSON snapshot.
//!
//! Layout:
//! ```json
//! {
//!   "organisations": { "<organisationId>": [ { "id": "...", "address1": "...", "latitude": "..." } ] },
//!   "installations": { "<installationId>": [ { "id": "...", "name": "...", "color": "..." } ] },
//!   "samples":       { "<locationId>": { "timestamp": 1700000000000, "sample": { "temperature": 21.5 } } },
//!   "assignments":   { "<locationId>": [ { "deviceId": "..." } ] }
//! }
//! ```

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::fetch::{AuthToken, FetchError, InstallationFetcher, LocationFetcher, TelemetryFetcher};
use crate::models::installation::{InstallationResponse, OrganisationId};
use crate::models::sensors::{DeviceAssignment, InstallationId, InstallationLocation, LatestSample, LocationId};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub organisations: BTreeMap<String, Vec<InstallationResponse>>,
    #[serde(default)]
    pub installations: BTreeMap<String, Vec<InstallationLocation>>,
    /// A `null` entry means the location never reported.
    #[serde(default)]
    pub samples: BTreeMap<String, Option<LatestSample>>,
    #[serde(default)]
    pub assignments: BTreeMap<String, Vec<DeviceAssignment>>,
}

#[derive(Debug)]
pub enum SnapshotError {
    Io { path: PathBuf, source: std::io::Error },
    Json(serde_path_to_error::Error<serde_json::Error>),
}

impl core::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SnapshotError::Io { path, source } => write!(f, "failed to read {}: {}", path.display(), source),
            SnapshotError::Json(e) => write!(f, "invalid snapshot at `{}`: {}", e.path(), e.inner()),
        }
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SnapshotError::Io { source, .. } => Some(source),
            SnapshotError::Json(e) => Some(e.inner()),
        }
    }
}

impl From<serde_path_to_error::Error<serde_json::Error>> for SnapshotError {
    fn from(value: serde_path_to_error::Error<serde_json::Error>) -> Self {
        SnapshotError::Json(value)
    }
}

impl Snapshot {
    pub fn from_file(path: &Path) -> Result<Self, SnapshotError> {
        let file = File::open(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut de = serde_json::Deserializer::from_reader(BufReader::new(file));
        let snapshot: Snapshot = serde_path_to_error::deserialize(&mut de)?;
        debug!(
            "Snapshot: loaded {} organisation(s), {} installation(s), {} sample(s), {} assignment list(s) from {}",
            snapshot.organisations.len(),
            snapshot.installations.len(),
            snapshot.samples.len(),
            snapshot.assignments.len(),
            path.display()
        );
        Ok(snapshot)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let mut de = serde_json::Deserializer::from_str(json);
        Ok(serde_path_to_error::deserialize(&mut de)?)
    }
}

impl InstallationFetcher for Snapshot {
    fn list_installations(
        &self,
        organisation_id: &OrganisationId,
        _token: &AuthToken,
    ) -> Result<Vec<InstallationResponse>, FetchError> {
        self.organisations
            .get(&organisation_id.0)
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                resource: format!("organisation {}", organisation_id),
            })
    }
}

impl LocationFetcher for Snapshot {
    fn list_locations(
        &self,
        installation_id: &InstallationId,
        _token: &AuthToken,
    ) -> Result<Vec<InstallationLocation>, FetchError> {
        self.installations
            .get(&installation_id.0)
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                resource: format!("installation {}", installation_id),
            })
    }
}

impl TelemetryFetcher for Snapshot {
    fn latest_sample(&self, location_id: &LocationId, _token: &AuthToken) -> Result<Option<LatestSample>, FetchError> {
        Ok(self.samples.get(&location_id.0).cloned().flatten())
    }

    fn current_assignment(
        &self,
        location_id: &LocationId,
        _token: &AuthToken,
    ) -> Result<Option<DeviceAssignment>, FetchError> {
        Ok(self
            .assignments
            .get(&location_id.0)
            .and_then(|list| list.first().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::RoomAggregator;
    use crate::models::sensors::DeviceId;
    use chrono::{DateTime, TimeZone, Utc};

    fn load_fixture() -> Snapshot {
        Snapshot::from_file(Path::new("tests/data/snapshot.json")).expect("fixture present")
    }

    // ten minutes after the "lounge" sample (1700000000000 = 2023-11-14T22:13:20Z)
    fn fixture_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 11, 14, 22, 23, 20).unwrap()
    }

    #[test]
    fn fixture_lists_locations_in_order() {
        let snapshot = load_fixture();
        let locations = snapshot
            .list_locations(&InstallationId("inst-1".into()), &AuthToken::default())
            .unwrap();
        let ids: Vec<&str> = locations.iter().map(|l| l.id.0.as_str()).collect();
        assert_eq!(ids, ["lounge", "office", "cellar"]);
    }

    #[test]
    fn unknown_installation_is_not_found() {
        let snapshot = load_fixture();
        let err = snapshot
            .list_locations(&InstallationId("nope".into()), &AuthToken::default())
            .unwrap_err();
        assert!(matches!(err, FetchError::NotFound { .. }));
    }

    #[test]
    fn first_assignment_wins_and_null_sample_is_none() {
        let snapshot = load_fixture();
        let token = AuthToken::default();
        let assignment = snapshot
            .current_assignment(&LocationId("lounge".into()), &token)
            .unwrap()
            .unwrap();
        assert_eq!(assignment.device_id, Some(DeviceId("dev-100".into())));
        assert_eq!(snapshot.current_assignment(&LocationId("cellar".into()), &token).unwrap(), None);
        assert_eq!(snapshot.latest_sample(&LocationId("cellar".into()), &token).unwrap(), None);
        assert_eq!(snapshot.latest_sample(&LocationId("missing".into()), &token).unwrap(), None);
    }

    #[test]
    fn aggregates_fixture_into_rooms() {
        let snapshot = load_fixture();
        let rooms = RoomAggregator::default()
            .with_clock(fixture_now)
            .get_rooms(&InstallationId("inst-1".into()), &AuthToken::default(), &snapshot, &snapshot)
            .unwrap();

        assert_eq!(rooms.len(), 3);
        assert_eq!(rooms[0].name, "Lounge");
        assert_eq!(rooms[0].temperature, "21.57°C");
        assert_eq!(rooms[0].co2, "1,234ppm");
        assert_eq!(rooms[0].humidity, "N/A");
        assert_eq!(rooms[0].device_last_seen_at.as_deref(), Some("10 minutes ago"));
        assert!(!rooms[0].is_device_missing);

        // stale sample, timestamp sent as a string
        assert_eq!(rooms[1].name, "Office");
        assert_eq!(rooms[1].device_last_seen_at.as_deref(), Some("3 hours ago"));
        assert!(rooms[1].is_device_assigned);
        assert!(rooms[1].is_device_missing);

        assert_eq!(rooms[2].temperature, "N/A");
        assert!(!rooms[2].is_device_assigned);
        assert!(rooms[2].is_device_missing);
        assert_eq!(rooms[2].device_last_seen_at, None);
    }

    #[test]
    fn fixture_lists_organisation_installations() {
        let snapshot = load_fixture();
        let installations = crate::installations::get_installations(
            &OrganisationId("org-1".into()),
            &AuthToken::default(),
            &snapshot,
        )
        .unwrap();

        assert_eq!(installations.len(), 2);
        assert_eq!(installations[0].id, InstallationId("inst-1".into()));
        assert_eq!(installations[0].address, "1 Harbour Street Leith UK EH6 6LL");
        assert_eq!(installations[0].location.map(|l| l.latitude), Some(55.9756));
        // no coordinates and a partial address
        assert_eq!(installations[1].address, "Unit 4 Dundee");
        assert_eq!(installations[1].location, None);

        let err = snapshot
            .list_installations(&OrganisationId("org-x".into()), &AuthToken::default())
            .unwrap_err();
        assert!(matches!(err, FetchError::NotFound { .. }));
    }

    #[test]
    fn odd_timestamp_shapes_load_as_never_seen() {
        let snapshot = Snapshot::from_json(
            r#"{
                "installations": {"i": [{"id": "a", "name": "A", "color": "red"}]},
                "samples": {"a": {"timestamp": true, "sample": {"temperature": 20}}},
                "assignments": {"a": [{"deviceId": "dev-a"}]}
            }"#,
        )
        .unwrap();
        let rooms = RoomAggregator::default()
            .with_clock(fixture_now)
            .get_rooms(&InstallationId("i".into()), &AuthToken::default(), &snapshot, &snapshot)
            .unwrap();

        assert_eq!(rooms[0].temperature, "20°C");
        assert_eq!(rooms[0].device_last_seen_at, None);
        assert!(rooms[0].is_device_missing);
    }

    #[test]
    fn decode_errors_carry_the_json_path() {
        let err = Snapshot::from_json(r#"{"installations": {"inst-1": [{"id": "a", "name": 5, "color": "red"}]}}"#)
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("installations.inst-1[0].name"), "{msg}");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Snapshot::from_file(Path::new("tests/data/does-not-exist.json")).unwrap_err();
        assert!(matches!(err, SnapshotError::Io { .. }));
    }
}
