//! Capabilities the aggregator consumes from its data collaborators.
//!
//! Implementations are expected to be blocking; the aggregator calls them from worker threads,
//! hence the `Sync` bound.

use crate::models::installation::{InstallationResponse, OrganisationId};
use crate::models::sensors::{DeviceAssignment, InstallationId, InstallationLocation, LatestSample, LocationId};

/// Opaque bearer credential forwarded unchanged to the collaborators.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        AuthToken(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("AuthToken(<redacted>)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Transport failure, non-success status or rejected credentials.
    Upstream { resource: String, message: String },
    NotFound { resource: String },
}

impl core::fmt::Display for FetchError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FetchError::Upstream { resource, message } => write!(f, "upstream error for {}: {}", resource, message),
            FetchError::NotFound { resource } => write!(f, "{} not found", resource),
        }
    }
}

impl std::error::Error for FetchError {}

pub trait InstallationFetcher: Sync {
    /// Installations owned by an organisation.
    fn list_installations(
        &self,
        organisation_id: &OrganisationId,
        token: &AuthToken,
    ) -> Result<Vec<InstallationResponse>, FetchError>;
}

pub trait LocationFetcher: Sync {
    /// Locations of an installation, in display order.
    fn list_locations(
        &self,
        installation_id: &InstallationId,
        token: &AuthToken,
    ) -> Result<Vec<InstallationLocation>, FetchError>;
}

pub trait TelemetryFetcher: Sync {
    /// Most recent sample recorded for a location, `None` if it never reported.
    fn latest_sample(&self, location_id: &LocationId, token: &AuthToken) -> Result<Option<LatestSample>, FetchError>;

    /// Device currently bound to a location, `None` if unassigned.
    fn current_assignment(
        &self,
        location_id: &LocationId,
        token: &AuthToken,
    ) -> Result<Option<DeviceAssignment>, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_redacted_in_debug_output() {
        let token = AuthToken::new("secret-jwt");
        assert_eq!(token.as_str(), "secret-jwt");
        assert!(!format!("{:?}", token).contains("secret"));
    }

    #[test]
    fn fetch_error_messages() {
        let e = FetchError::Upstream {
            resource: "samples/latest".into(),
            message: "http 503".into(),
        };
        assert_eq!(e.to_string(), "upstream error for samples/latest: http 503");
        let e = FetchError::NotFound {
            resource: "installation x".into(),
        };
        assert_eq!(e.to_string(), "installation x not found");
    }
}
