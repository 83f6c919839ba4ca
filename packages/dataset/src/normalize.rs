//! Per-table cleaning rules.
//!
//! Each function consumes a table and returns the cleaned table; nothing is
//! mutated in place across stages.

use std::str::FromStr as _;

use police_residency_dataset_models::{
    AgencyTable, Armed, ArmedWith, RawResidencyRecord, ResidencyTable, ShootingTable,
    UnmappedArmedPolicy,
};

use crate::NormalizeError;

/// Drops the superseded `city_old` column from the residency table.
#[must_use]
pub fn drop_stale_column(raw: Vec<RawResidencyRecord>) -> ResidencyTable {
    raw.into_iter().map(Into::into).collect()
}

/// Keeps only agencies whose name looks like a city police department.
///
/// An empty result is valid and is returned as-is.
#[must_use]
pub fn filter_departments(agencies: AgencyTable) -> AgencyTable {
    let before = agencies.len();
    let kept: AgencyTable = agencies
        .into_iter()
        .filter(|agency| is_city_department(&agency.name))
        .collect();

    log::info!(
        "Kept {} of {before} agencies as city police departments",
        kept.len()
    );
    if kept.is_empty() {
        log::warn!("No agency names matched the department filter");
    }

    kept
}

/// Returns `true` when `name` contains "department" but not "county",
/// ignoring case.
#[must_use]
pub fn is_city_department(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("department") && !lower.contains("county")
}

/// Derives the `armed` column from `armed_with` for every incident.
///
/// # Errors
///
/// Returns [`NormalizeError::UnmappedCategory`] for the first unrecognized
/// `armed_with` value when `policy` is [`UnmappedArmedPolicy::Fail`].
pub fn classify_armed(
    shootings: ShootingTable,
    policy: UnmappedArmedPolicy,
) -> Result<ShootingTable, NormalizeError> {
    let mut unmapped = 0_usize;

    let classified = shootings
        .into_iter()
        .map(|mut incident| {
            match classify_armed_with(incident.armed_with.as_deref()) {
                Ok(armed) => incident.armed = Some(armed),
                Err(value) => match policy {
                    UnmappedArmedPolicy::Fail => {
                        return Err(NormalizeError::UnmappedCategory {
                            incident_id: incident.id,
                            value,
                        });
                    }
                    UnmappedArmedPolicy::Null => {
                        log::debug!(
                            "Incident {}: unmapped armed_with {value:?}, leaving armed empty",
                            incident.id
                        );
                        unmapped += 1;
                        incident.armed = None;
                    }
                },
            }
            Ok(incident)
        })
        .collect::<Result<ShootingTable, _>>()?;

    if unmapped > 0 {
        log::warn!("{unmapped} incidents had unmapped armed_with values");
    }

    Ok(classified)
}

/// Classifies a single raw `armed_with` value.
///
/// Missing values classify as [`Armed::No`]. Values listing several
/// `;`-separated categories are [`Armed::Yes`] when any category is a
/// weapon.
///
/// # Errors
///
/// Returns the offending category text when a component is not a known
/// [`ArmedWith`] category.
pub fn classify_armed_with(raw: Option<&str>) -> Result<Armed, String> {
    let Some(raw) = raw else {
        return Ok(Armed::No);
    };

    let mut armed = Armed::No;
    for component in raw.split(';').map(str::trim).filter(|c| !c.is_empty()) {
        let category = ArmedWith::from_str(&component.to_lowercase())
            .map_err(|_| component.to_string())?;
        if category.armed() == Armed::Yes {
            armed = Armed::Yes;
        }
    }

    Ok(armed)
}
