use serde::{Deserialize, Serialize};

use crate::decompose::DecomposedAddress;

pub const SCHEMA_ORG_CONTEXT: &str = "https://schema.org";
pub const ORGANIZATION_TYPE: &str = "SportsOrganization";
pub const ADDRESS_TYPE: &str = "PostalAddress";
pub const COUNTRY_TYPE: &str = "Country";

/// The register covers clubs in Great Britain only.
pub const COUNTRY_NAME: &str = "GB";

/// One row of the CASC register CSV, as published.
#[derive(Debug, Clone, Deserialize)]
pub struct RawClubRecord {
    #[serde(rename = "Organisation Name")]
    pub organisation_name: String,
    #[serde(rename = "Address Line 1")]
    pub address_line_1: Option<String>,
    #[serde(rename = "Address Line 2")]
    pub address_line_2: Option<String>,
    #[serde(rename = "Address Line 3")]
    pub address_line_3: Option<String>,
    #[serde(rename = "Address Line 4")]
    pub address_line_4: Option<String>,
    #[serde(rename = "Postcode")]
    pub postcode: Option<String>,
}

impl RawClubRecord {
    /// The address lines that are present in the row, in register order.
    /// Blank-line filtering is the decomposer's job, not ours.
    pub fn address_lines(&self) -> Vec<&str> {
        [
            &self.address_line_1,
            &self.address_line_2,
            &self.address_line_3,
            &self.address_line_4,
        ]
        .into_iter()
        .flatten()
        .map(String::as_str)
        .collect()
    }
}

/// schema.org `PostalAddress`. Absent parts are omitted from the JSON
/// entirely, never serialized as empty strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostalAddress {
    #[serde(rename = "@type")]
    pub address_type: String,
    #[serde(rename = "streetAddress")]
    pub street_address: String,
    #[serde(rename = "addressLocality", skip_serializing_if = "Option::is_none")]
    pub address_locality: Option<String>,
    #[serde(rename = "addressRegion", skip_serializing_if = "Option::is_none")]
    pub address_region: Option<String>,
    #[serde(rename = "postalCode", skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(rename = "addressCountry")]
    pub address_country: Country,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    #[serde(rename = "@type")]
    pub country_type: String,
    pub name: String,
}

/// schema.org `SportsOrganization` envelope around one club's address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SportsOrganization {
    #[serde(rename = "@context")]
    pub context: String,
    #[serde(rename = "@type")]
    pub organization_type: String,
    pub name: String,
    pub address: PostalAddress,
}

impl PostalAddress {
    /// Pure assembly of decomposed parts into the output shape. The postcode
    /// is passed through verbatim and only dropped when the source field is
    /// empty.
    pub fn new(parts: DecomposedAddress, postcode: Option<&str>) -> Self {
        Self {
            address_type: ADDRESS_TYPE.to_string(),
            street_address: parts.street,
            address_locality: parts.locality,
            address_region: parts.region,
            postal_code: postcode.filter(|p| !p.is_empty()).map(str::to_string),
            address_country: Country {
                country_type: COUNTRY_TYPE.to_string(),
                name: COUNTRY_NAME.to_string(),
            },
        }
    }
}

impl SportsOrganization {
    pub fn new(name: &str, address: PostalAddress) -> Self {
        Self {
            context: SCHEMA_ORG_CONTEXT.to_string(),
            organization_type: ORGANIZATION_TYPE.to_string(),
            name: name.to_string(),
            address,
        }
    }
}
