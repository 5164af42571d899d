//! Installation listing for an organisation.

use log::{debug, warn};

use crate::fetch::{AuthToken, FetchError, InstallationFetcher};
use crate::models::installation::{Installation, OrganisationId};

/// Installations of an organisation in upstream order, projected for clients.
pub fn get_installations<F>(
    organisation_id: &OrganisationId,
    token: &AuthToken,
    fetcher: &F,
) -> Result<Vec<Installation>, FetchError>
where
    F: InstallationFetcher + ?Sized,
{
    let responses = fetcher.list_installations(organisation_id, token).map_err(|e| {
        warn!("Installations: listing for organisation {} failed: {}", organisation_id, e);
        e
    })?;
    let installations: Vec<Installation> = responses.into_iter().map(Installation::from_response).collect();
    debug!(
        "Installations: organisation {} has {} installation(s)",
        organisation_id,
        installations.len()
    );
    Ok(installations)
}
