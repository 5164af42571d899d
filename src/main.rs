use clap::Parser;
use log::{error, info};
use room_status::aggregator::RoomAggregator;
use room_status::config::{Args, Config, DataSource, Target};
use room_status::fetch::{InstallationFetcher, LocationFetcher, TelemetryFetcher};
use room_status::installations::get_installations;
use room_status::models::sensors::InstallationId;
use room_status::services::fake_data::{DEMO_INSTALLATION_ID, FakeInstallation};
use room_status::services::snapshot::Snapshot;
use serde::Serialize;

fn run(cfg: Config) -> Result<(), String> {
    info!(
        "Config loaded (target={:?}, source={:?}, max_concurrent_fetches={})",
        cfg.target, cfg.source, cfg.max_concurrent_fetches
    );

    match &cfg.source {
        DataSource::Snapshot(path) => {
            let snapshot = Snapshot::from_file(path).map_err(|e| format!("loading snapshot failed: {}", e))?;
            resolve(&cfg, &snapshot)
        }
        DataSource::Fake { seed } => {
            let installation_id = match &cfg.target {
                Target::Rooms(id) => id.clone(),
                Target::Installations(_) => InstallationId(DEMO_INSTALLATION_ID.to_string()),
            };
            let fake = FakeInstallation::generate(installation_id, chrono::Utc::now(), *seed);
            resolve(&cfg, &fake)
        }
    }
}

fn resolve<B>(cfg: &Config, backend: &B) -> Result<(), String>
where
    B: InstallationFetcher + LocationFetcher + TelemetryFetcher,
{
    match &cfg.target {
        Target::Rooms(installation_id) => {
            let rooms = RoomAggregator::new(cfg.max_concurrent_fetches)
                .get_rooms(installation_id, &cfg.auth_token, backend, backend)
                .map_err(|e| format!("resolving rooms failed: {}", e))?;
            let missing = rooms.iter().filter(|r| r.is_device_missing).count();
            info!("Resolved {} room(s), {} with a missing device", rooms.len(), missing);
            print_json(&rooms, cfg.pretty)
        }
        Target::Installations(organisation_id) => {
            let installations = get_installations(organisation_id, &cfg.auth_token, backend)
                .map_err(|e| format!("listing installations failed: {}", e))?;
            info!("Listed {} installation(s)", installations.len());
            print_json(&installations, cfg.pretty)
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<(), String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| format!("serializing output failed: {}", e))?;
    println!("{}", json);
    Ok(())
}

fn main() {
    let default_filter = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(default_filter)
        .format_timestamp_secs()
        .init();

    info!(
        "room-status {} (git {}) starting",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_TIME_GIT_HASH")
    );

    let cfg = match Config::from_args(Args::parse()) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("fatal: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = run(cfg) {
        error!("fatal: {}", e);
        std::process::exit(1);
    }
}
