//! Room aggregation: one location listing, then a bounded fan-out of per-location telemetry
//! fetches whose results are reassembled in location order.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Instant;

use crate::fetch::{AuthToken, FetchError, LocationFetcher, TelemetryFetcher};
use crate::models::room::{LocationSamplePairing, Room};
use crate::models::sensors::{DeviceAssignment, InstallationId, InstallationLocation, LatestSample, LocationId};

pub const DEFAULT_MAX_CONCURRENT_FETCHES: NonZeroUsize = match NonZeroUsize::new(16) {
    Some(n) => n,
    None => panic!("default fetch concurrency must be non-zero"),
};

type Telemetry = (Option<LatestSample>, Option<DeviceAssignment>);

#[derive(Debug)]
pub enum AggregationError {
    /// The installation's location list could not be fetched.
    Locations {
        installation_id: InstallationId,
        source: FetchError,
    },
    /// Telemetry for one location could not be fetched; no rooms are returned.
    Telemetry { location_id: LocationId, source: FetchError },
}

impl core::fmt::Display for AggregationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AggregationError::Locations {
                installation_id,
                source,
            } => write!(f, "fetching locations of installation {} failed: {}", installation_id, source),
            AggregationError::Telemetry { location_id, source } => {
                write!(f, "fetching telemetry of location {} failed: {}", location_id, source)
            }
        }
    }
}

impl std::error::Error for AggregationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AggregationError::Locations { source, .. } | AggregationError::Telemetry { source, .. } => Some(source),
        }
    }
}

/// Builds the room list of an installation from its collaborators.
#[derive(Debug, Clone)]
pub struct RoomAggregator {
    max_concurrent_fetches: NonZeroUsize,
    clock: fn() -> DateTime<Utc>,
}

impl Default for RoomAggregator {
    fn default() -> Self {
        RoomAggregator::new(DEFAULT_MAX_CONCURRENT_FETCHES)
    }
}

impl RoomAggregator {
    pub fn new(max_concurrent_fetches: NonZeroUsize) -> Self {
        RoomAggregator {
            max_concurrent_fetches,
            clock: Utc::now,
        }
    }

    /// Replace the wall clock used for staleness and relative-time fields.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn max_concurrent_fetches(&self) -> NonZeroUsize {
        self.max_concurrent_fetches
    }

    /// Resolve the rooms of an installation, in the order its locations are listed.
    ///
    /// All-or-nothing: the first failing fetch aborts the whole call.
    pub fn get_rooms<L, T>(
        &self,
        installation_id: &InstallationId,
        token: &AuthToken,
        locations: &L,
        telemetry: &T,
    ) -> Result<Vec<Room>, AggregationError>
    where
        L: LocationFetcher + ?Sized,
        T: TelemetryFetcher + ?Sized,
    {
        let started = Instant::now();
        let listed = locations
            .list_locations(installation_id, token)
            .map_err(|source| {
                warn!("Rooms: listing locations of installation {} failed: {}", installation_id, source);
                AggregationError::Locations {
                    installation_id: installation_id.clone(),
                    source,
                }
            })?;

        let pairings = self.collect_pairings(listed, token, telemetry)?;
        let rooms: Vec<Room> = pairings
            .iter()
            .map(|pairing| Room::from_pairing(pairing, (self.clock)()))
            .collect();

        debug!(
            "Rooms: installation {} resolved {} room(s) in {} ms",
            installation_id,
            rooms.len(),
            started.elapsed().as_millis()
        );
        Ok(rooms)
    }

    /// Fetch telemetry for every location concurrently and pair it with the location metadata.
    ///
    /// Results are indexed by position in `locations`, so completion order never leaks into the
    /// output. After the first failure no further locations are started.
    pub fn collect_pairings<T>(
        &self,
        locations: Vec<InstallationLocation>,
        token: &AuthToken,
        telemetry: &T,
    ) -> Result<Vec<LocationSamplePairing>, AggregationError>
    where
        T: TelemetryFetcher + ?Sized,
    {
        let total = locations.len();
        if total == 0 {
            return Ok(Vec::new());
        }
        let workers = self.max_concurrent_fetches.get().min(total);
        debug!("Rooms: fetching telemetry for {} location(s) with {} worker(s)", total, workers);

        let next = AtomicUsize::new(0);
        let failed = AtomicBool::new(false);
        let mut slots: Vec<Option<Telemetry>> = (0..total).map(|_| None).collect();
        let mut first_error: Option<AggregationError> = None;
        let (tx, rx) = mpsc::channel::<(usize, Result<Telemetry, FetchError>)>();

        thread::scope(|scope| {
            for _ in 0..workers {
                let tx = tx.clone();
                let (next, failed, locations) = (&next, &failed, &locations);
                scope.spawn(move || {
                    while !failed.load(Ordering::Acquire) {
                        let index = next.fetch_add(1, Ordering::Relaxed);
                        let Some(location) = locations.get(index) else {
                            break;
                        };
                        let result = fetch_telemetry(telemetry, &location.id, token);
                        if result.is_err() {
                            failed.store(true, Ordering::Release);
                        }
                        if tx.send((index, result)).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(tx);

            for (index, result) in rx {
                match result {
                    Ok(fetched) => slots[index] = Some(fetched),
                    Err(source) if first_error.is_none() => {
                        let location_id = locations[index].id.clone();
                        warn!("Rooms: telemetry for location {} failed: {}", location_id, source);
                        first_error = Some(AggregationError::Telemetry { location_id, source });
                    }
                    Err(source) => debug!("Rooms: discarding further failure after abort: {}", source),
                }
            }
        });

        if let Some(e) = first_error {
            return Err(e);
        }

        // Workers only stop early once a failure is flagged, and a panicking fetcher re-panics
        // out of the scope, so without an error every slot is filled.
        let pairings = locations
            .into_iter()
            .zip(slots)
            .map(|(location, slot)| {
                let (latest, assignment) = slot.expect("telemetry collected for every location");
                LocationSamplePairing::new(location, latest, assignment)
            })
            .collect();
        Ok(pairings)
    }
}

fn fetch_telemetry<T>(telemetry: &T, location_id: &LocationId, token: &AuthToken) -> Result<Telemetry, FetchError>
where
    T: TelemetryFetcher + ?Sized,
{
    let latest = telemetry.latest_sample(location_id, token)?;
    let assignment = telemetry.current_assignment(location_id, token)?;
    Ok((latest, assignment))
}
