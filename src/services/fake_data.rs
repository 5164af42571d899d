//! Synthetic installation for demos and local runs without upstream access.
//!
//! Readings are generated once from a fixed seed, relative to the supplied "now". The last rooms
//! are deliberately degraded (stale, unassigned, never reported) so every room state shows up.

use chrono::{DateTime, Duration, Utc};
use log::info;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

use crate::fetch::{AuthToken, FetchError, InstallationFetcher, LocationFetcher, TelemetryFetcher};
use crate::models::installation::{InstallationResponse, OrganisationId, RawCoordinate};
use crate::models::sensors::{
    DeviceAssignment, DeviceId, InstallationId, InstallationLocation, LatestSample, LocationId, RawSample, RawTimestamp,
};

pub const DEFAULT_SEED: u64 = 0x0420_1337_DEAD_BEEF;
/// Organisation owning every synthetic installation.
pub const DEMO_ORGANISATION_ID: &str = "demo-org";
/// Installation listed when only an organisation is requested.
pub const DEMO_INSTALLATION_ID: &str = "demo";

const ROOM_NAMES: [&str; 8] = [
    "Living Room",
    "Kitchen",
    "Bedroom 1",
    "Bedroom 2",
    "Home Office",
    "Bathroom",
    "Hallway",
    "Nursery",
];
const ROOM_COLORS: [&str; 4] = ["#f5a623", "#4a90e2", "#7ed321", "#bd10e0"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Condition {
    Fresh,
    Stale,
    Unassigned,
    NeverReported,
}

fn condition_for(index: usize, total: usize) -> Condition {
    match total - index {
        1 => Condition::NeverReported,
        2 => Condition::Unassigned,
        3 => Condition::Stale,
        _ => Condition::Fresh,
    }
}

#[derive(Debug, Clone)]
pub struct FakeInstallation {
    installation_id: InstallationId,
    record: InstallationResponse,
    locations: Vec<InstallationLocation>,
    samples: BTreeMap<LocationId, LatestSample>,
    assignments: BTreeMap<LocationId, DeviceAssignment>,
}

impl FakeInstallation {
    pub fn generate(installation_id: InstallationId, now: DateTime<Utc>, seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let record = installation_record(&installation_id, &mut rng);
        let mut locations = Vec::with_capacity(ROOM_NAMES.len());
        let mut samples = BTreeMap::new();
        let mut assignments = BTreeMap::new();

        for (index, name) in ROOM_NAMES.iter().enumerate() {
            let id = LocationId(format!("{}-loc-{}", installation_id, index + 1));
            let device_id = DeviceId(format!("dev-{:04}", 1000 + index));
            let condition = condition_for(index, ROOM_NAMES.len());

            let age = match condition {
                Condition::Stale => Some(Duration::minutes(rng.random_range(180..600))),
                Condition::Fresh | Condition::Unassigned => Some(Duration::seconds(rng.random_range(5..1800))),
                Condition::NeverReported => None,
            };
            if let Some(age) = age {
                samples.insert(
                    id.clone(),
                    LatestSample {
                        device_id: Some(device_id.clone()),
                        timestamp: Some(RawTimestamp::Integer((now - age).timestamp_millis())),
                        sample: Some(random_sample(&mut rng)),
                    },
                );
            }
            if matches!(condition, Condition::Fresh | Condition::Stale) {
                assignments.insert(
                    id.clone(),
                    DeviceAssignment {
                        device_id: Some(device_id),
                        installation_location_id: Some(id.clone()),
                    },
                );
            }

            locations.push(InstallationLocation {
                id,
                name: name.to_string(),
                color: ROOM_COLORS[index % ROOM_COLORS.len()].to_string(),
            });
        }

        info!(
            "Fake data: generated installation {} ({} room(s), {} sample(s), {} assignment(s))",
            installation_id,
            locations.len(),
            samples.len(),
            assignments.len()
        );

        FakeInstallation {
            installation_id,
            record,
            locations,
            samples,
            assignments,
        }
    }
}

fn installation_record(installation_id: &InstallationId, rng: &mut SmallRng) -> InstallationResponse {
    // somewhere in central Edinburgh, sent as strings like the upstream does
    let latitude = 55.95 + rng.random_range(-0.02..0.02);
    let longitude = -3.19 + rng.random_range(-0.03..0.03);
    InstallationResponse {
        id: installation_id.clone(),
        kind: Some("residential".to_string()),
        organisation_id: Some(OrganisationId(DEMO_ORGANISATION_ID.to_string())),
        address1: Some(format!("{} Demo Street", rng.random_range(1..200))),
        address2: None,
        address_city: Some("Edinburgh".to_string()),
        address_country: Some("UK".to_string()),
        address_postcode: Some("EH1 1AA".to_string()),
        latitude: Some(RawCoordinate::Text(format!("{:.5}", latitude))),
        longitude: Some(RawCoordinate::Text(format!("{:.5}", longitude))),
        access_code: Some(format!("{:04}", rng.random_range(0..10_000))),
        custom_property_id: None,
    }
}

fn random_sample(rng: &mut SmallRng) -> RawSample {
    let temperature = rng.random_range(17.5..25.5);
    let humidity = rng.random_range(30.0..65.0);
    RawSample {
        kind: Some(1),
        temperature: Some(temperature),
        // Magnus approximation
        dewpoint: Some(dewpoint(temperature, humidity)),
        humidity: Some(humidity),
        co2: Some(rng.random_range(420.0..1800.0_f64).round()),
        // not every device model reports VOC
        tvoc: rng.random_bool(0.7).then(|| rng.random_range(20.0..250.0_f64).round()),
        light: Some(rng.random_range(0.0..800.0_f64).round()),
        status: Some(0.0),
        pressure: Some(rng.random_range(990.0..1030.0)),
        battery: Some(rng.random_range(15.0..100.0_f64).round()),
        kilowatt_hours: None,
    }
}

fn dewpoint(temperature_c: f64, humidity_pct: f64) -> f64 {
    const B: f64 = 17.62;
    const C: f64 = 243.12;
    let gamma = (humidity_pct / 100.0).ln() + B * temperature_c / (C + temperature_c);
    C * gamma / (B - gamma)
}

impl InstallationFetcher for FakeInstallation {
    fn list_installations(
        &self,
        organisation_id: &OrganisationId,
        _token: &AuthToken,
    ) -> Result<Vec<InstallationResponse>, FetchError> {
        if self.record.organisation_id.as_ref() != Some(organisation_id) {
            return Err(FetchError::NotFound {
                resource: format!("organisation {}", organisation_id),
            });
        }
        Ok(vec![self.record.clone()])
    }
}

impl LocationFetcher for FakeInstallation {
    fn list_locations(
        &self,
        installation_id: &InstallationId,
        _token: &AuthToken,
    ) -> Result<Vec<InstallationLocation>, FetchError> {
        if *installation_id != self.installation_id {
            return Err(FetchError::NotFound {
                resource: format!("installation {}", installation_id),
            });
        }
        Ok(self.locations.clone())
    }
}

impl TelemetryFetcher for FakeInstallation {
    fn latest_sample(&self, location_id: &LocationId, _token: &AuthToken) -> Result<Option<LatestSample>, FetchError> {
        Ok(self.samples.get(location_id).cloned())
    }

    fn current_assignment(
        &self,
        location_id: &LocationId,
        _token: &AuthToken,
    ) -> Result<Option<DeviceAssignment>, FetchError> {
        Ok(self.assignments.get(location_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::RoomAggregator;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 2, 10, 0, 0).unwrap()
    }

    fn fixed_now() -> DateTime<Utc> {
        now()
    }

    fn installation() -> InstallationId {
        InstallationId("demo".into())
    }

    #[test]
    fn generation_is_deterministic_per_seed() {
        let a = FakeInstallation::generate(installation(), now(), DEFAULT_SEED);
        let b = FakeInstallation::generate(installation(), now(), DEFAULT_SEED);
        assert_eq!(a.record, b.record);
        assert_eq!(a.locations, b.locations);
        assert_eq!(a.samples, b.samples);
        assert_eq!(a.assignments, b.assignments);
    }

    #[test]
    fn dewpoint_is_below_temperature() {
        let dp = dewpoint(21.0, 50.0);
        assert!(dp < 21.0 && dp > 9.0, "dewpoint {dp}");
    }

    #[test]
    fn rooms_cover_every_condition() {
        let fake = FakeInstallation::generate(installation(), now(), DEFAULT_SEED);
        let rooms = RoomAggregator::default()
            .with_clock(fixed_now)
            .get_rooms(&installation(), &AuthToken::default(), &fake, &fake)
            .unwrap();

        assert_eq!(rooms.len(), ROOM_NAMES.len());
        for (room, name) in rooms.iter().zip(ROOM_NAMES) {
            assert_eq!(room.name, name);
        }

        let n = rooms.len();
        assert!(rooms[..n - 3].iter().all(|r| r.is_device_assigned && !r.is_device_missing));
        // stale
        assert!(rooms[n - 3].is_device_assigned && rooms[n - 3].is_device_missing);
        // unassigned but reporting
        assert!(!rooms[n - 2].is_device_assigned && rooms[n - 2].is_device_missing);
        assert!(rooms[n - 2].device_last_seen_at.is_some());
        // never reported
        assert!(!rooms[n - 1].is_device_assigned && rooms[n - 1].is_device_missing);
        assert_eq!(rooms[n - 1].temperature, "N/A");
        assert_eq!(rooms[n - 1].device_last_seen_at, None);
    }

    #[test]
    fn demo_organisation_lists_the_installation() {
        let fake = FakeInstallation::generate(installation(), now(), DEFAULT_SEED);
        let installations = crate::installations::get_installations(
            &OrganisationId(DEMO_ORGANISATION_ID.into()),
            &AuthToken::default(),
            &fake,
        )
        .unwrap();

        assert_eq!(installations.len(), 1);
        let demo = &installations[0];
        assert_eq!(demo.id, installation());
        assert!(demo.address.ends_with("Demo Street Edinburgh UK EH1 1AA"), "{}", demo.address);
        let location = demo.location.expect("coordinates generated");
        assert!((55.9..56.0).contains(&location.latitude));
        assert!((-3.25..-3.15).contains(&location.longitude));

        let err = fake
            .list_installations(&OrganisationId("other-org".into()), &AuthToken::default())
            .unwrap_err();
        assert!(matches!(err, FetchError::NotFound { .. }));
    }

    #[test]
    fn other_installations_are_not_found() {
        let fake = FakeInstallation::generate(installation(), now(), DEFAULT_SEED);
        let err = fake
            .list_locations(&InstallationId("elsewhere".into()), &AuthToken::default())
            .unwrap_err();
        assert!(matches!(err, FetchError::NotFound { .. }));
    }
}
