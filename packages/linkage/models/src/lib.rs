#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Types produced by the record-linkage pipeline.
//!
//! The linker reduces the source tables to key projections
//! ([`AgencyKey`], [`ShootingKey`]), resolves each agency to one city
//! ([`AgencyCity`]), attaches residency data ([`AgencyCensusRow`]) and
//! finally expands back out to one [`ShootingCaseRow`] per incident per
//! matching agency.

use police_residency_dataset_models::Armed;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Residency share at or above which a force counts as living mostly
/// in-city.
pub const MAJORITY_THRESHOLD: f64 = 0.5;

/// Returns the majority-residency flag for an `all` share.
///
/// A missing share has no flag: such agencies belong to neither the
/// majority nor the minority group.
#[must_use]
pub fn is_majority(all: Option<f64>) -> Option<bool> {
    all.map(|share| share >= MAJORITY_THRESHOLD)
}

/// Per-agency analytic table.
pub type AgenciesCensus = Vec<AgencyCensusRow>;

/// Per-incident analytic table.
pub type ShootingsCase = Vec<ShootingCaseRow>;

/// Which city an agency keeps when its incidents name several.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CityTieBreak {
    /// The lexicographically smallest city name.
    #[default]
    Lexicographic,
    /// The city of the first matching incident in incident-table order.
    FirstOccurrence,
}

/// Agency projection used as the left side of city resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgencyKey {
    /// Agency identifier.
    pub id: i64,
    /// Agency name.
    pub name: String,
    /// Two-letter state abbreviation.
    pub state: String,
}

/// Shooting projection used as the right side of city resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShootingKey {
    /// City of the incident.
    pub city: Option<String>,
    /// `agency_ids` coerced to a single identifier.
    pub agency_id: Option<i64>,
    /// Two-letter state abbreviation.
    pub state: String,
}

/// An agency resolved to exactly one city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgencyCity {
    /// Agency identifier.
    pub id: i64,
    /// Agency name.
    pub name: String,
    /// Two-letter state abbreviation.
    pub state: String,
    /// City supplied by a matching incident.
    pub city: String,
}

/// One agency with its city's residency statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgencyCensusRow {
    /// Agency identifier.
    pub id: i64,
    /// Agency name.
    pub name: String,
    /// Two-letter state abbreviation.
    pub state: String,
    /// City the agency was resolved to.
    pub city: String,
    /// Number of officers in the city's police force.
    pub police_force_size: u32,
    /// Share of all officers living inside the city.
    pub all: Option<f64>,
    /// Share of white officers living inside the city.
    pub white: Option<f64>,
    /// `all >= 0.5`; `None` when `all` is missing.
    pub majority: Option<bool>,
    /// Number of incidents attributed to the agency; `None` when it has none.
    pub shooting_count: Option<u64>,
}

/// One incident joined to one agency that serves its city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShootingCaseRow {
    /// Incident identifier.
    pub incident_id: i64,
    /// Date of the shooting.
    pub date: Option<String>,
    /// Kind of threat reported by police.
    pub threat_type: Option<String>,
    /// Whether and how the victim was fleeing.
    pub flee_status: Option<String>,
    /// Raw armament category.
    pub armed_with: Option<String>,
    /// Binary armed classification.
    pub armed: Option<Armed>,
    /// City of the incident (and of the agency).
    pub city: String,
    /// County of the incident.
    pub county: Option<String>,
    /// Two-letter state abbreviation.
    pub state: String,
    /// Latitude (WGS84).
    pub latitude: Option<f64>,
    /// Longitude (WGS84).
    pub longitude: Option<f64>,
    /// Victim name.
    pub victim_name: Option<String>,
    /// Victim age in years.
    pub age: Option<u32>,
    /// Victim gender.
    pub gender: Option<String>,
    /// Victim race code.
    pub race: Option<String>,
    /// Whether mental illness was reported as a factor.
    pub was_mental_illness_related: Option<String>,
    /// Whether a body camera was recording.
    pub body_camera: Option<String>,
    /// Raw `agency_ids` of the incident.
    pub agency_ids: Option<String>,
    /// Identifier of the matched agency.
    pub agency_id: i64,
    /// Name of the matched agency.
    pub agency_name: String,
    /// Number of officers in the city's police force.
    pub police_force_size: u32,
    /// Share of all officers living inside the city.
    pub all: Option<f64>,
    /// Share of white officers living inside the city.
    pub white: Option<f64>,
    /// `all >= 0.5`; `None` when `all` is missing.
    pub majority: Option<bool>,
}

impl AgencyCensusRow {
    /// Column names in serialization order.
    pub const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "state",
        "city",
        "police_force_size",
        "all",
        "white",
        "majority",
        "shooting_count",
    ];
}

impl ShootingCaseRow {
    /// Column names in serialization order.
    pub const COLUMNS: &'static [&'static str] = &[
        "incident_id",
        "date",
        "threat_type",
        "flee_status",
        "armed_with",
        "armed",
        "city",
        "county",
        "state",
        "latitude",
        "longitude",
        "victim_name",
        "age",
        "gender",
        "race",
        "was_mental_illness_related",
        "body_camera",
        "agency_ids",
        "agency_id",
        "agency_name",
        "police_force_size",
        "all",
        "white",
        "majority",
    ];
}

/// Row counts observed after each linkage step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkageStats {
    /// Agencies entering the linker (already department-filtered).
    pub agencies: usize,
    /// Incidents entering the linker.
    pub incidents: usize,
    /// Incidents whose `agency_ids` coerced to a single identifier.
    pub incidents_with_agency_id: usize,
    /// Agencies resolved to a city.
    pub resolved_agencies: usize,
    /// Agencies with residency data attached.
    pub census_agencies: usize,
    /// Rows of the per-incident table.
    pub case_rows: usize,
}

/// Both analytic tables plus the attrition observed while building them.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedTables {
    /// Per-incident analytic table.
    pub shootings_case: ShootingsCase,
    /// Per-agency analytic table.
    pub agencies_census: AgenciesCensus,
    /// Row counts after each step.
    pub stats: LinkageStats,
}
