//! Installations of an organisation: the upstream record and the flattened view served to clients.

use serde::{Deserialize, Serialize};

use crate::models::sensors::InstallationId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrganisationId(pub String);

impl core::fmt::Display for OrganisationId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Coordinate as sent upstream; usually a decimal string, sometimes a bare number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawCoordinate {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl RawCoordinate {
    /// Decimal degrees. Text is read up to the first character that cannot continue a number.
    pub fn degrees(&self) -> Option<f64> {
        let value = match self {
            RawCoordinate::Number(v) => *v,
            RawCoordinate::Text(s) => parse_float_prefix(s)?,
            RawCoordinate::Other(_) => return None,
        };
        value.is_finite().then_some(value)
    }
}

fn parse_float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'-' | b'+')) {
        end = 1;
    }
    let mut seen_dot = false;
    while let Some(&b) = bytes.get(end) {
        match b {
            b'0'..=b'9' => end += 1,
            b'.' if !seen_dot => {
                seen_dot = true;
                end += 1;
            }
            _ => break,
        }
    }
    // shrink until it parses, e.g. "12." or a lone sign
    (1..=end).rev().find_map(|len| s[..len].parse::<f64>().ok())
}

/// Installation record as returned by the upstream installation listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallationResponse {
    pub id: InstallationId,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub organisation_id: Option<OrganisationId>,
    #[serde(default)]
    pub address1: Option<String>,
    #[serde(default)]
    pub address2: Option<String>,
    #[serde(default)]
    pub address_city: Option<String>,
    #[serde(default)]
    pub address_country: Option<String>,
    #[serde(default)]
    pub address_postcode: Option<String>,
    #[serde(default)]
    pub latitude: Option<RawCoordinate>,
    #[serde(default)]
    pub longitude: Option<RawCoordinate>,
    #[serde(default)]
    pub access_code: Option<String>,
    #[serde(default)]
    pub custom_property_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub longitude: f64,
    pub latitude: f64,
}

/// Client-facing installation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installation {
    pub id: InstallationId,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub organisation_id: Option<OrganisationId>,
    /// Street lines, city, country and postcode joined by single spaces.
    pub address: String,
    /// Present only when both coordinates parse.
    pub location: Option<GeoLocation>,
    pub access_code: Option<String>,
    pub custom_property_id: Option<String>,
}

impl Installation {
    pub fn from_response(response: InstallationResponse) -> Self {
        let address = [
            &response.address1,
            &response.address2,
            &response.address_city,
            &response.address_country,
            &response.address_postcode,
        ]
        .into_iter()
        .filter_map(|part| part.as_deref().map(str::trim))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        let longitude = response.longitude.as_ref().and_then(RawCoordinate::degrees);
        let latitude = response.latitude.as_ref().and_then(RawCoordinate::degrees);
        let location = match (longitude, latitude) {
            (Some(longitude), Some(latitude)) => Some(GeoLocation { longitude, latitude }),
            _ => None,
        };

        Installation {
            id: response.id,
            kind: response.kind,
            organisation_id: response.organisation_id,
            address,
            location,
            access_code: response.access_code,
            custom_property_id: response.custom_property_id,
        }
    }
}
