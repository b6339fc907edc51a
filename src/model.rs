//! Value objects for users, campaigns, vehicles and their usage history, plus the JSON views served by the API.

use crate::calc;
use crate::date::format_measurement_date;
use chrono::NaiveDateTime;
use serde::Serialize;

pub const DEFAULT_UNITS: &str = "km";
/// Average car, roughly 22 mpg.
pub const DEFAULT_FUEL_L_PER_100KM: f64 = 10.6;
pub const DEFAULT_CARBON_TO_MANUFACTURE: f64 = 10_000.0;
/// About 200k miles.
pub const DEFAULT_EXPECTED_LIFE_KM: f64 = 321_868.0;

/// Id and name of a campaign, as listed on users and vehicles.
#[derive(Clone, Debug, PartialEq, Serialize, sqlx::FromRow)]
pub struct CampaignSummary {
    pub id: i64,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct User {
    pub username: String,
    pub campaigns: Vec<CampaignSummary>,
}

/// A context in which a carbon footprint is tallied, shared by its member users and vehicles.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Campaign {
    pub id: i64,
    pub name: String,
    pub offsets_available: f64,
    /// Member usernames.
    pub users: Vec<String>,
    /// Member vehicle names.
    pub vehicles: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Vehicle {
    pub id: i64,
    pub name: String,
    pub units: String,
    pub notes: Option<String>,
    pub fuel_l_per_100km: f64,
    pub carbon_to_manufacture: f64,
    pub expected_life_km: f64,
    pub campaigns: Vec<CampaignSummary>,
}

impl Vehicle {
    /// kg CO2 per km driven.
    pub fn carbon_per_unit(&self) -> f64 {
        calc::carbon_per_unit(
            self.fuel_l_per_100km,
            self.carbon_to_manufacture,
            self.expected_life_km,
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewVehicle {
    pub name: String,
    pub units: String,
    pub notes: Option<String>,
    pub fuel_l_per_100km: f64,
    pub carbon_to_manufacture: f64,
    pub expected_life_km: f64,
}

impl NewVehicle {
    /// Vehicle with the default manufacturing footprint and lifetime.
    pub fn new(name: impl Into<String>, fuel_l_per_100km: f64) -> Self {
        NewVehicle {
            name: name.into(),
            units: DEFAULT_UNITS.to_string(),
            notes: None,
            fuel_l_per_100km,
            carbon_to_manufacture: DEFAULT_CARBON_TO_MANUFACTURE,
            expected_life_km: DEFAULT_EXPECTED_LIFE_KM,
        }
    }
}

/// One reading of a vehicle's usage counter (e.g. odometer). Never updated once stored.
#[derive(Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct ResourceMeasurement {
    pub id: i64,
    pub date: NaiveDateTime,
    pub value: f64,
    pub resource: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewMeasurement {
    pub date: NaiveDateTime,
    pub value: f64,
}

#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    pub date: String,
    pub value: f64,
}

impl From<&ResourceMeasurement> for HistoryEntry {
    fn from(m: &ResourceMeasurement) -> Self {
        HistoryEntry {
            date: format_measurement_date(&m.date),
            value: m.value,
        }
    }
}

/// Body of `GET /api/resource/:id`.
#[derive(Debug, Serialize)]
pub struct VehicleView {
    pub id: i64,
    pub name: String,
    pub carbon_per_unit: f64,
    pub units: String,
    pub notes: Option<String>,
    pub fuel_l_per_100km: f64,
    pub carbon_to_manufacture: f64,
    pub expected_life_km: f64,
    pub campaigns: Vec<CampaignSummary>,
    pub history: Vec<HistoryEntry>,
}

impl VehicleView {
    pub fn new(vehicle: Vehicle, history: &[ResourceMeasurement]) -> Self {
        VehicleView {
            carbon_per_unit: vehicle.carbon_per_unit(),
            id: vehicle.id,
            name: vehicle.name,
            units: vehicle.units,
            notes: vehicle.notes,
            fuel_l_per_100km: vehicle.fuel_l_per_100km,
            carbon_to_manufacture: vehicle.carbon_to_manufacture,
            expected_life_km: vehicle.expected_life_km,
            campaigns: vehicle.campaigns,
            history: history.iter().map(HistoryEntry::from).collect(),
        }
    }
}
