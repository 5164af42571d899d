//! Runtime configuration: command-line flags, each with an environment-variable fallback.

use clap::Parser;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use crate::aggregator::DEFAULT_MAX_CONCURRENT_FETCHES;
use crate::fetch::AuthToken;
use crate::models::installation::OrganisationId;
use crate::models::sensors::InstallationId;
use crate::services::fake_data::DEFAULT_SEED;

#[derive(Debug, Parser)]
#[command(
    name = "room-status",
    version,
    about = "Resolve the room status of an installation, or list an organisation's installations"
)]
pub struct Args {
    /// Installation whose rooms are resolved.
    #[arg(long, env = "INSTALLATION_ID")]
    pub installation_id: Option<String>,

    /// Organisation whose installations are listed, instead of resolving rooms.
    #[arg(long, env = "ORGANISATION_ID")]
    pub organisation_id: Option<String>,

    /// JSON snapshot serving locations, samples and device assignments.
    #[arg(long, env = "ROOMS_SNAPSHOT")]
    pub snapshot: Option<PathBuf>,

    /// Serve a synthetic installation instead of a snapshot.
    #[arg(long, env = "ROOMS_FAKE_DATA")]
    pub fake: bool,

    #[arg(long, env = "ROOMS_FAKE_SEED")]
    pub fake_seed: Option<u64>,

    /// Bearer token forwarded to the data collaborators.
    #[arg(long, env = "ROOMS_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,

    /// Upper bound on locations fetched at the same time.
    #[arg(long, env = "MAX_CONCURRENT_FETCHES", default_value_t = DEFAULT_MAX_CONCURRENT_FETCHES)]
    pub max_concurrent_fetches: NonZeroUsize,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pub pretty: bool,
}

/// What a run produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Rooms(InstallationId),
    Installations(OrganisationId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Snapshot(PathBuf),
    Fake { seed: u64 },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub target: Target,
    pub auth_token: AuthToken,
    pub source: DataSource,
    pub max_concurrent_fetches: NonZeroUsize,
    pub pretty: bool,
}

impl Config {
    pub fn from_args(args: Args) -> Result<Self, String> {
        let installation_id = non_empty(args.installation_id.as_deref(), "INSTALLATION_ID")?;
        let organisation_id = non_empty(args.organisation_id.as_deref(), "ORGANISATION_ID")?;
        let target = match (installation_id, organisation_id) {
            (Some(id), None) => Target::Rooms(InstallationId(id)),
            (None, Some(id)) => Target::Installations(OrganisationId(id)),
            (Some(_), Some(_)) => {
                return Err("choose either --installation-id or --organisation-id, not both".to_string());
            }
            (None, None) => {
                return Err(
                    "missing target: pass --installation-id (INSTALLATION_ID) or --organisation-id (ORGANISATION_ID)"
                        .to_string(),
                );
            }
        };

        let source = match (args.snapshot, args.fake) {
            (Some(path), false) => DataSource::Snapshot(path),
            (None, true) => DataSource::Fake {
                seed: args.fake_seed.unwrap_or(DEFAULT_SEED),
            },
            (Some(_), true) => return Err("choose either --snapshot or --fake, not both".to_string()),
            (None, false) => {
                return Err("missing data source: pass --snapshot <file> (ROOMS_SNAPSHOT) or --fake".to_string());
            }
        };

        Ok(Config {
            target,
            auth_token: AuthToken::new(args.auth_token.unwrap_or_default()),
            source,
            max_concurrent_fetches: args.max_concurrent_fetches,
            pretty: args.pretty,
        })
    }
}

fn non_empty(value: Option<&str>, name: &str) -> Result<Option<String>, String> {
    match value.map(str::trim) {
        Some("") => Err(format!("{} must not be empty", name)),
        other => Ok(other.map(str::to_string)),
    }
}
