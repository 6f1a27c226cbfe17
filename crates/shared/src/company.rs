//! Company-registry lookup support.
//!
//! The registry (SIREN) service is external; this module owns the strict
//! normalization boundary between its wire shape and the display model,
//! plus the client-side format validation that must happen before any
//! network call.

use serde::Deserialize;
use thiserror::Error;

/// SIREN identifiers are exactly 9 ASCII digits.
pub fn validate_siren_format(siren: &str) -> bool {
    siren.len() == 9 && siren.bytes().all(|b| b.is_ascii_digit())
}

/// Registry lookup failure, distinguished so the caller can surface a
/// specific notice per case.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Caught client-side, before any network call.
    #[error("SIREN must be exactly 9 digits")]
    InvalidFormat,
    /// Well-formed identifier the registry does not know (404).
    #[error("unknown SIREN identifier")]
    NotFound,
    /// Registry unreachable or returned an unexpected response.
    #[error("company registry lookup failed: {0}")]
    Unavailable(String),
}

impl RegistryError {
    /// Translation key for the user-facing notice.
    pub fn translation_key(&self) -> &'static str {
        match self {
            RegistryError::InvalidFormat => "siren.incorrect_format",
            RegistryError::NotFound => "siren.invalid",
            RegistryError::Unavailable(_) => "siren.verification_error",
        }
    }
}

/// Wire shape of the registry response. Field names mirror the external
/// service and must not leak past [`CompanyInfo`].
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryResponse {
    pub unite_legale: LegalUnit,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegalUnit {
    pub siren: String,
    pub denomination: String,
    #[serde(default)]
    pub activite_principale: Option<String>,
    #[serde(default)]
    pub date_creation: Option<String>,
    pub etablissement_siege: HeadOffice,
    #[serde(default)]
    pub tranche_effectifs: Option<String>,
    #[serde(default)]
    pub etat_administratif: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeadOffice {
    pub geo_adresse: String,
}

/// Internal display model for a looked-up company.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyInfo {
    pub siren: String,
    pub name: String,
    pub address: String,
    pub activity: Option<String>,
    pub creation_date: Option<String>,
    pub staff_size: String,
    pub status: &'static str,
}

impl From<RegistryResponse> for CompanyInfo {
    fn from(response: RegistryResponse) -> Self {
        let unit = response.unite_legale;
        CompanyInfo {
            siren: unit.siren,
            name: unit.denomination,
            address: unit.etablissement_siege.geo_adresse,
            activity: unit.activite_principale,
            creation_date: unit.date_creation,
            staff_size: staff_category_label(unit.tranche_effectifs.as_deref()),
            status: administrative_status_label(unit.etat_administratif.as_deref()),
        }
    }
}

/// INSEE staff-size category codes.
pub fn staff_category_label(code: Option<&str>) -> String {
    let label = match code {
        Some("00") => "0 employees",
        Some("01") => "1 or 2 employees",
        Some("02") => "3 to 5 employees",
        Some("03") => "6 to 9 employees",
        Some("11") => "10 to 19 employees",
        Some("12") => "20 to 49 employees",
        Some("21") => "50 to 99 employees",
        Some("22") => "100 to 199 employees",
        Some("31") => "200 to 249 employees",
        Some("32") => "250 to 499 employees",
        Some("41") => "500 to 999 employees",
        Some("42") => "1,000 to 1,999 employees",
        Some("51") => "2,000 to 4,999 employees",
        Some("52") => "5,000 to 9,999 employees",
        Some("53") => "10,000 employees or more",
        _ => "not reported",
    };
    label.to_string()
}

/// Administrative status: "A" active, "C" ceased, anything else unknown.
pub fn administrative_status_label(code: Option<&str>) -> &'static str {
    match code {
        Some("A") => "active",
        Some("C") => "ceased",
        _ => "unknown",
    }
}
