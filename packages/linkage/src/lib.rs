#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Record linkage of agencies, shootings, and census residency data.
//!
//! Agencies and residency rows share no key. The linker bridges them
//! through the shootings table: an agency is matched to the incidents that
//! name its id in the same state, one of those incidents' cities is kept,
//! and that `(city, state)` pair pulls in the residency statistics. The
//! resulting per-agency table is then joined back to the full incident
//! table on `(city, state)`.
//!
//! Every step takes its inputs by reference and returns a new table. A step
//! that produces no rows is logged and passed on; it is never an error.

use std::collections::{BTreeSet, HashMap};

use police_residency_dataset_models::{
    AgencyTable, ResidencyRecord, ResidencyTable, ShootingIncident, ShootingTable,
};
use police_residency_linkage_models::{
    AgenciesCensus, AgencyCensusRow, AgencyCity, AgencyKey, CityTieBreak, LinkageStats,
    LinkedTables, ShootingCaseRow, ShootingKey, ShootingsCase, is_majority,
};

/// Runs every linkage step and returns both analytic tables.
///
/// `agencies` should already be department-filtered and `shootings`
/// classified; `shooting_count` is left empty on every per-agency row.
#[must_use]
pub fn link(
    agencies: &AgencyTable,
    shootings: &ShootingTable,
    residency: &ResidencyTable,
    tie_break: CityTieBreak,
) -> LinkedTables {
    let agency_keys = project_agency_keys(agencies);
    let shooting_keys = project_shooting_keys(shootings);

    let agency_cities = resolve_agency_cities(&agency_keys, &shooting_keys, tie_break);
    warn_if_empty("city resolution", agency_cities.len());

    let agencies_census = attach_residency(&agency_cities, residency);
    warn_if_empty("residency attachment", agencies_census.len());

    let shootings_case = attach_incidents(shootings, &agencies_census);
    warn_if_empty("incident attachment", shootings_case.len());

    let stats = LinkageStats {
        agencies: agency_keys.len(),
        incidents: shooting_keys.len(),
        incidents_with_agency_id: shooting_keys
            .iter()
            .filter(|k| k.agency_id.is_some())
            .count(),
        resolved_agencies: agency_cities.len(),
        census_agencies: agencies_census.len(),
        case_rows: shootings_case.len(),
    };

    log::info!(
        "Linked {} agencies -> {} with a city -> {} with residency data; {} case rows",
        stats.agencies,
        stats.resolved_agencies,
        stats.census_agencies,
        stats.case_rows
    );

    LinkedTables {
        shootings_case,
        agencies_census,
        stats,
    }
}

/// Reduces the agency table to `(id, name, state)`.
#[must_use]
pub fn project_agency_keys(agencies: &AgencyTable) -> Vec<AgencyKey> {
    agencies
        .iter()
        .map(|agency| AgencyKey {
            id: agency.id,
            name: agency.name.clone(),
            state: agency.state.clone(),
        })
        .collect()
}

/// Reduces the shooting table to `(city, agency_id, state)`, coercing
/// `agency_ids` to a number.
#[must_use]
pub fn project_shooting_keys(shootings: &ShootingTable) -> Vec<ShootingKey> {
    shootings
        .iter()
        .map(|incident| ShootingKey {
            city: incident.city.clone(),
            agency_id: incident.agency_id(),
            state: incident.state.clone(),
        })
        .collect()
}

/// Resolves each agency to a single city through incidents sharing its id
/// and state.
///
/// Agencies without a matching incident that has a city are dropped. When
/// the same id appears on several agency rows, the first row that resolves
/// is kept. Among several candidate cities, `tie_break` decides.
#[must_use]
pub fn resolve_agency_cities(
    agency_keys: &[AgencyKey],
    shooting_keys: &[ShootingKey],
    tie_break: CityTieBreak,
) -> Vec<AgencyCity> {
    let mut cities_by_agency: HashMap<(i64, &str), Vec<&str>> = HashMap::new();
    for key in shooting_keys {
        if let (Some(agency_id), Some(city)) = (key.agency_id, key.city.as_deref()) {
            cities_by_agency
                .entry((agency_id, key.state.as_str()))
                .or_default()
                .push(city);
        }
    }

    let mut seen = BTreeSet::new();
    let mut resolved = Vec::new();

    for key in agency_keys {
        let Some(candidates) = cities_by_agency.get(&(key.id, key.state.as_str())) else {
            log::trace!("Agency {} ({}) has no incident with a city", key.id, key.name);
            continue;
        };
        let Some(city) = pick_city(candidates, tie_break) else {
            continue;
        };
        if !seen.insert(key.id) {
            log::debug!("Dropping duplicate agency id {} ({})", key.id, key.name);
            continue;
        }

        let distinct: BTreeSet<&str> = candidates.iter().copied().collect();
        if distinct.len() > 1 {
            log::debug!(
                "Agency {} ({}) spans {} cities; keeping {city}",
                key.id,
                key.name,
                distinct.len()
            );
        }

        resolved.push(AgencyCity {
            id: key.id,
            name: key.name.clone(),
            state: key.state.clone(),
            city: city.to_string(),
        });
    }

    resolved
}

fn pick_city<'a>(candidates: &[&'a str], tie_break: CityTieBreak) -> Option<&'a str> {
    match tie_break {
        CityTieBreak::FirstOccurrence => candidates.first().copied(),
        CityTieBreak::Lexicographic => candidates.iter().copied().min(),
    }
}

/// Attaches residency statistics to each resolved agency on `(city, state)`.
///
/// Agencies without a residency row, and residency rows without a police
/// force size, are dropped; residency rows no agency resolved to never
/// appear. When several residency rows share a city, the first one with a
/// force size wins. The result is ordered by `(city, state)`, keeping input
/// order within equal keys.
#[must_use]
pub fn attach_residency(
    agency_cities: &[AgencyCity],
    residency: &ResidencyTable,
) -> AgenciesCensus {
    let mut residency_by_city: HashMap<(&str, &str), Vec<&ResidencyRecord>> = HashMap::new();
    for record in residency {
        residency_by_city
            .entry((record.city.as_str(), record.state.as_str()))
            .or_default()
            .push(record);
    }

    let mut seen = BTreeSet::new();
    let mut rows = Vec::new();

    for agency in agency_cities {
        let matches = residency_by_city
            .get(&(agency.city.as_str(), agency.state.as_str()))
            .map_or(&[][..], Vec::as_slice);

        for record in matches {
            let Some(police_force_size) = record.police_force_size else {
                continue;
            };
            if !seen.insert(agency.id) {
                continue;
            }
            rows.push(AgencyCensusRow {
                id: agency.id,
                name: agency.name.clone(),
                state: agency.state.clone(),
                city: agency.city.clone(),
                police_force_size,
                all: record.all,
                white: record.white,
                majority: is_majority(record.all),
                shooting_count: None,
            });
        }
    }

    rows.sort_by(|a, b| (&a.city, &a.state).cmp(&(&b.city, &b.state)));
    rows
}

/// Joins the full incident table to the per-agency table on
/// `(city, state)`.
///
/// Produces one row per incident per agency serving the incident's city,
/// ordered by agency and then by incident order. Incidents in cities no
/// agency resolved to are dropped.
#[must_use]
pub fn attach_incidents(
    shootings: &ShootingTable,
    agencies_census: &AgenciesCensus,
) -> ShootingsCase {
    let mut incidents_by_city: HashMap<(&str, &str), Vec<&ShootingIncident>> = HashMap::new();
    for incident in shootings {
        if let Some(city) = incident.city.as_deref() {
            incidents_by_city
                .entry((city, incident.state.as_str()))
                .or_default()
                .push(incident);
        }
    }

    let index = &incidents_by_city;
    agencies_census
        .iter()
        .flat_map(move |agency| {
            index
                .get(&(agency.city.as_str(), agency.state.as_str()))
                .into_iter()
                .flatten()
                .map(move |incident| case_row(incident, agency))
        })
        .collect()
}

fn case_row(incident: &ShootingIncident, agency: &AgencyCensusRow) -> ShootingCaseRow {
    ShootingCaseRow {
        incident_id: incident.id,
        date: incident.date.clone(),
        threat_type: incident.threat_type.clone(),
        flee_status: incident.flee_status.clone(),
        armed_with: incident.armed_with.clone(),
        armed: incident.armed,
        city: agency.city.clone(),
        county: incident.county.clone(),
        state: incident.state.clone(),
        latitude: incident.latitude,
        longitude: incident.longitude,
        victim_name: incident.name.clone(),
        age: incident.age,
        gender: incident.gender.clone(),
        race: incident.race.clone(),
        was_mental_illness_related: incident.was_mental_illness_related.clone(),
        body_camera: incident.body_camera.clone(),
        agency_ids: incident.agency_ids.clone(),
        agency_id: agency.id,
        agency_name: agency.name.clone(),
        police_force_size: agency.police_force_size,
        all: agency.all,
        white: agency.white,
        majority: agency.majority,
    }
}

fn warn_if_empty(step: &str, rows: usize) {
    if rows == 0 {
        log::warn!("Linkage step '{step}' produced no rows");
    }
}
