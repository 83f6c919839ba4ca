#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Record types for the three source datasets.
//!
//! * [`RawResidencyRecord`] / [`ResidencyRecord`]: census-derived share of
//!   each city's police force that lives inside the city.
//! * [`Agency`]: law-enforcement agencies referenced by the shootings data.
//! * [`ShootingIncident`]: one fatal police shooting.
//!
//! Field names match the CSV headers of the source files so the records can
//! be deserialized directly with `csv` + `serde`.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Residency table after the stale column has been dropped.
pub type ResidencyTable = Vec<ResidencyRecord>;

/// Agency metadata table.
pub type AgencyTable = Vec<Agency>;

/// Fatal-shooting incident table.
pub type ShootingTable = Vec<ShootingIncident>;

/// Reported armament of a shooting victim, as recorded in the `armed_with`
/// column.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ArmedWith {
    /// Victim was not armed.
    Unarmed,
    /// Armament not known.
    Unknown,
    /// Investigators could not determine armament.
    Undetermined,
    /// Firearm.
    Gun,
    /// Knife or other edged weapon.
    Knife,
    /// Blunt object (bat, pipe, ...).
    BluntObject,
    /// Some other weapon.
    Other,
    /// Toy or replica firearm.
    Replica,
    /// Vehicle used as a weapon.
    Vehicle,
}

impl ArmedWith {
    /// Returns the binary armed classification for this category.
    #[must_use]
    pub const fn armed(self) -> Armed {
        match self {
            Self::Unarmed | Self::Unknown | Self::Undetermined => Armed::No,
            Self::Gun
            | Self::Knife
            | Self::BluntObject
            | Self::Other
            | Self::Replica
            | Self::Vehicle => Armed::Yes,
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Unarmed,
            Self::Unknown,
            Self::Undetermined,
            Self::Gun,
            Self::Knife,
            Self::BluntObject,
            Self::Other,
            Self::Replica,
            Self::Vehicle,
        ]
    }
}

/// Binary armed classification derived from [`ArmedWith`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Armed {
    /// Victim carried some kind of weapon.
    Yes,
    /// Victim was unarmed or armament is unknown.
    No,
}

/// What to do with an `armed_with` value outside the known categories.
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
pub enum UnmappedArmedPolicy {
    /// Abort classification with an error.
    #[default]
    Fail,
    /// Leave `armed` empty and keep going.
    Null,
}

/// A row of `police-locals.csv` as it appears on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawResidencyRecord {
    /// City name.
    pub city: String,
    /// Two-letter state abbreviation.
    pub state: String,
    /// Number of officers in the city's police force.
    pub police_force_size: Option<u32>,
    /// Share of all officers living inside the city.
    pub all: Option<f64>,
    /// Share of white officers living inside the city.
    pub white: Option<f64>,
    /// City label left over from an earlier preprocessing pass.
    #[serde(default)]
    pub city_old: Option<String>,
}

/// Census residency statistics for one city, keyed by `(city, state)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResidencyRecord {
    /// City name.
    pub city: String,
    /// Two-letter state abbreviation.
    pub state: String,
    /// Number of officers in the city's police force.
    pub police_force_size: Option<u32>,
    /// Share of all officers living inside the city, in `[0, 1]`.
    pub all: Option<f64>,
    /// Share of white officers living inside the city, in `[0, 1]`.
    pub white: Option<f64>,
}

impl From<RawResidencyRecord> for ResidencyRecord {
    fn from(raw: RawResidencyRecord) -> Self {
        Self {
            city: raw.city,
            state: raw.state,
            police_force_size: raw.police_force_size,
            all: raw.all,
            white: raw.white,
        }
    }
}

/// A law-enforcement agency from `fatal-police-shootings-agencies.csv`.
///
/// Columns other than `id`, `name` and `state` are ignored on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agency {
    /// Agency identifier referenced by `ShootingIncident::agency_ids`.
    pub id: i64,
    /// Agency name (e.g. "Springfield Police Department").
    pub name: String,
    /// Two-letter state abbreviation.
    pub state: String,
}

/// One fatal police shooting from `fatal-police-shootings-data.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShootingIncident {
    /// Incident identifier.
    pub id: i64,
    /// Date of the shooting (`YYYY-MM-DD`).
    pub date: Option<String>,
    /// Kind of threat reported by police.
    pub threat_type: Option<String>,
    /// Whether and how the victim was fleeing.
    pub flee_status: Option<String>,
    /// Raw armament category; may hold several `;`-separated categories.
    pub armed_with: Option<String>,
    /// City where the shooting happened.
    pub city: Option<String>,
    /// County where the shooting happened.
    pub county: Option<String>,
    /// Two-letter state abbreviation.
    pub state: String,
    /// Latitude (WGS84).
    pub latitude: Option<f64>,
    /// Longitude (WGS84).
    pub longitude: Option<f64>,
    /// How precisely the coordinates were located.
    pub location_precision: Option<String>,
    /// Victim name.
    pub name: Option<String>,
    /// Victim age in years.
    pub age: Option<u32>,
    /// Victim gender.
    pub gender: Option<String>,
    /// Victim race code.
    pub race: Option<String>,
    /// How the victim's race was determined.
    pub race_source: Option<String>,
    /// Whether mental illness was reported as a factor.
    pub was_mental_illness_related: Option<String>,
    /// Whether a body camera was recording.
    pub body_camera: Option<String>,
    /// Identifier(s) of the involved agencies; several are `;`-separated.
    pub agency_ids: Option<String>,
    /// Binary classification of `armed_with`; filled in after loading.
    #[serde(skip_deserializing, default)]
    pub armed: Option<Armed>,
}

impl ShootingIncident {
    /// Returns `agency_ids` coerced to a single numeric agency identifier.
    ///
    /// `None` when the field is missing or does not hold exactly one
    /// number (multi-agency lists such as `"12;34"` do not coerce).
    #[must_use]
    pub fn agency_id(&self) -> Option<i64> {
        self.agency_ids.as_deref().and_then(coerce_agency_id)
    }
}

/// Coerces a raw `agency_ids` value to an integer identifier.
///
/// Accepts integral values written as integers (`"42"`) or floats
/// (`"42.0"`). Anything else yields `None`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn coerce_agency_id(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(id) = trimmed.parse::<i64>() {
        return Some(id);
    }

    let value = trimmed.parse::<f64>().ok()?;
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15 {
        return Some(value as i64);
    }
    None
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use super::*;

    #[test]
    fn armed_with_parses_source_spellings() {
        assert_eq!(ArmedWith::from_str("gun").unwrap(), ArmedWith::Gun);
        assert_eq!(
            ArmedWith::from_str("blunt_object").unwrap(),
            ArmedWith::BluntObject
        );
        assert_eq!(
            ArmedWith::from_str("undetermined").unwrap(),
            ArmedWith::Undetermined
        );
        assert!(ArmedWith::from_str("taser").is_err());
    }

    #[test]
    fn armed_with_display_roundtrip() {
        for category in ArmedWith::all() {
            let text = category.to_string();
            assert_eq!(ArmedWith::from_str(&text).unwrap(), *category);
        }
    }

    #[test]
    fn unarmed_categories_classify_no() {
        assert_eq!(ArmedWith::Unarmed.armed(), Armed::No);
        assert_eq!(ArmedWith::Unknown.armed(), Armed::No);
        assert_eq!(ArmedWith::Undetermined.armed(), Armed::No);
    }

    #[test]
    fn weapon_categories_classify_yes() {
        for category in [
            ArmedWith::Gun,
            ArmedWith::Knife,
            ArmedWith::BluntObject,
            ArmedWith::Other,
            ArmedWith::Replica,
            ArmedWith::Vehicle,
        ] {
            assert_eq!(category.armed(), Armed::Yes, "{category:?}");
        }
    }

    #[test]
    fn armed_displays_uppercase() {
        assert_eq!(Armed::Yes.to_string(), "YES");
        assert_eq!(Armed::No.to_string(), "NO");
    }

    #[test]
    fn coerces_integral_agency_ids() {
        assert_eq!(coerce_agency_id("42"), Some(42));
        assert_eq!(coerce_agency_id(" 7 "), Some(7));
        assert_eq!(coerce_agency_id("42.0"), Some(42));
    }

    #[test]
    fn rejects_non_numeric_agency_ids() {
        assert_eq!(coerce_agency_id("12;34"), None);
        assert_eq!(coerce_agency_id(""), None);
        assert_eq!(coerce_agency_id("4.5"), None);
        assert_eq!(coerce_agency_id("abc"), None);
    }

    #[test]
    fn raw_residency_drops_city_old() {
        let raw = RawResidencyRecord {
            city: "Springfield".to_string(),
            state: "OH".to_string(),
            police_force_size: Some(50),
            all: Some(0.6),
            white: Some(0.5),
            city_old: Some("springfield".to_string()),
        };
        let record = ResidencyRecord::from(raw);
        assert_eq!(record.city, "Springfield");
        assert_eq!(record.police_force_size, Some(50));
    }
}
