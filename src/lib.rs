pub mod models {
    pub mod installation;
    pub mod room;
    pub mod sensors;
}

pub mod aggregator;
pub mod config;
pub mod fetch;
pub mod format;
pub mod installations;
pub mod staleness;
pub mod services {
    pub mod fake_data;
    pub mod snapshot;
}

pub use aggregator::{AggregationError, RoomAggregator};
pub use fetch::{AuthToken, FetchError, InstallationFetcher, LocationFetcher, TelemetryFetcher};
pub use models::installation::Installation;
pub use models::room::Room;
