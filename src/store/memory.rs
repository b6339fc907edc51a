//! In-process store with the same constraint semantics as the PostgreSQL schema. Contents are lost on exit.

use super::{CampaignRepository, MeasurementRepository, Store, UserRepository, VehicleRepository};
use crate::error::AppError;
use crate::model::{
    Campaign, CampaignSummary, NewMeasurement, NewVehicle, ResourceMeasurement, User, Vehicle,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct Tables {
    users: BTreeSet<String>,
    campaigns: BTreeMap<i64, CampaignRow>,
    vehicles: BTreeMap<i64, NewVehicle>,
    /// (campaign, username)
    campaign_users: BTreeSet<(i64, String)>,
    /// (campaign, vehicle)
    campaign_vehicles: BTreeSet<(i64, i64)>,
    measurements: Vec<ResourceMeasurement>,
    next_campaign_id: i64,
    next_vehicle_id: i64,
    next_measurement_id: i64,
}

struct CampaignRow {
    name: String,
    offsets_available: f64,
}

impl Tables {
    fn campaign_summaries(&self, ids: impl Iterator<Item = i64>) -> Vec<CampaignSummary> {
        ids.filter_map(|id| {
            self.campaigns.get(&id).map(|c| CampaignSummary {
                id,
                name: c.name.clone(),
            })
        })
        .collect()
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, AppError> {
        self.tables
            .read()
            .map_err(|_| AppError::Internal("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, AppError> {
        self.tables
            .write()
            .map_err(|_| AppError::Internal("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, username: &str) -> Result<(), AppError> {
        let mut t = self.write()?;
        if !t.users.insert(username.to_string()) {
            return Err(AppError::UsernameTaken);
        }
        Ok(())
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>, AppError> {
        let t = self.read()?;
        if !t.users.contains(username) {
            return Ok(None);
        }
        let ids: Vec<i64> = t
            .campaign_users
            .iter()
            .filter(|(_, u)| u == username)
            .map(|(c, _)| *c)
            .collect();
        Ok(Some(User {
            username: username.to_string(),
            campaigns: t.campaign_summaries(ids.into_iter()),
        }))
    }

    async fn user_exists(&self, username: &str) -> Result<bool, AppError> {
        Ok(self.read()?.users.contains(username))
    }
}

#[async_trait]
impl CampaignRepository for MemoryStore {
    async fn create_campaign(&self, username: &str, name: &str) -> Result<i64, AppError> {
        let mut t = self.write()?;
        if !t.users.contains(username) {
            return Err(AppError::NotFound(format!("user '{}'", username)));
        }
        if t.campaigns.values().any(|c| c.name == name) {
            return Err(AppError::NameTaken);
        }
        t.next_campaign_id += 1;
        let id = t.next_campaign_id;
        t.campaigns.insert(
            id,
            CampaignRow {
                name: name.to_string(),
                offsets_available: 0.0,
            },
        );
        t.campaign_users.insert((id, username.to_string()));
        Ok(id)
    }

    async fn find_campaign(&self, id: i64) -> Result<Option<Campaign>, AppError> {
        let t = self.read()?;
        let Some(row) = t.campaigns.get(&id) else {
            return Ok(None);
        };
        let users = t
            .campaign_users
            .iter()
            .filter(|(c, _)| *c == id)
            .map(|(_, u)| u.clone())
            .collect();
        let vehicles = t
            .campaign_vehicles
            .iter()
            .filter(|(c, _)| *c == id)
            .filter_map(|(_, v)| t.vehicles.get(v).map(|v| v.name.clone()))
            .collect();
        Ok(Some(Campaign {
            id,
            name: row.name.clone(),
            offsets_available: row.offsets_available,
            users,
            vehicles,
        }))
    }
}

#[async_trait]
impl VehicleRepository for MemoryStore {
    async fn create_vehicle(&self, campaign_id: i64, vehicle: &NewVehicle) -> Result<i64, AppError> {
        let mut t = self.write()?;
        if !t.campaigns.contains_key(&campaign_id) {
            return Err(AppError::NotFound(format!("campaign {}", campaign_id)));
        }
        t.next_vehicle_id += 1;
        let id = t.next_vehicle_id;
        t.vehicles.insert(id, vehicle.clone());
        t.campaign_vehicles.insert((campaign_id, id));
        Ok(id)
    }

    async fn find_vehicle(&self, id: i64) -> Result<Option<Vehicle>, AppError> {
        let t = self.read()?;
        let Some(v) = t.vehicles.get(&id) else {
            return Ok(None);
        };
        let ids: Vec<i64> = t
            .campaign_vehicles
            .iter()
            .filter(|(_, vid)| *vid == id)
            .map(|(c, _)| *c)
            .collect();
        Ok(Some(Vehicle {
            id,
            name: v.name.clone(),
            units: v.units.clone(),
            notes: v.notes.clone(),
            fuel_l_per_100km: v.fuel_l_per_100km,
            carbon_to_manufacture: v.carbon_to_manufacture,
            expected_life_km: v.expected_life_km,
            campaigns: t.campaign_summaries(ids.into_iter()),
        }))
    }
}

#[async_trait]
impl MeasurementRepository for MemoryStore {
    async fn append_measurement(
        &self,
        vehicle_id: i64,
        measurement: &NewMeasurement,
    ) -> Result<i64, AppError> {
        let mut t = self.write()?;
        if !t.vehicles.contains_key(&vehicle_id) {
            return Err(AppError::NotFound(format!("vehicle {}", vehicle_id)));
        }
        t.next_measurement_id += 1;
        let id = t.next_measurement_id;
        t.measurements.push(ResourceMeasurement {
            id,
            date: measurement.date,
            value: measurement.value,
            resource: vehicle_id,
        });
        Ok(id)
    }

    async fn list_measurements(&self, vehicle_id: i64) -> Result<Vec<ResourceMeasurement>, AppError> {
        let t = self.read()?;
        let mut rows: Vec<ResourceMeasurement> = t
            .measurements
            .iter()
            .filter(|m| m.resource == vehicle_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        Ok(rows)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), AppError> {
        self.read().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::parse_measurement_date;

    async fn seeded() -> (MemoryStore, i64) {
        let store = MemoryStore::new();
        store.create_user("alice").await.unwrap();
        let campaign = store.create_campaign("alice", "commute").await.unwrap();
        (store, campaign)
    }

    #[tokio::test]
    async fn duplicate_username_is_taken() {
        let store = MemoryStore::new();
        store.create_user("alice").await.unwrap();
        assert!(matches!(store.create_user("alice").await, Err(AppError::UsernameTaken)));
        assert!(store.user_exists("alice").await.unwrap());
        assert!(!store.user_exists("bob").await.unwrap());
    }

    #[tokio::test]
    async fn campaign_requires_known_user_before_name_check() {
        let (store, _) = seeded().await;
        assert!(matches!(
            store.create_campaign("nobody", "commute").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            store.create_campaign("alice", "commute").await,
            Err(AppError::NameTaken)
        ));
    }

    #[tokio::test]
    async fn user_lists_joined_campaigns() {
        let (store, first) = seeded().await;
        let second = store.create_campaign("alice", "holidays").await.unwrap();
        let user = store.find_user("alice").await.unwrap().unwrap();
        let ids: Vec<i64> = user.campaigns.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![first, second]);
        assert!(store.find_user("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn vehicle_joins_campaign() {
        let (store, campaign) = seeded().await;
        let id = store.create_vehicle(campaign, &NewVehicle::new("golf", 6.5)).await.unwrap();
        let vehicle = store.find_vehicle(id).await.unwrap().unwrap();
        assert_eq!(vehicle.units, "km");
        assert_eq!(vehicle.campaigns[0].name, "commute");
        let c = store.find_campaign(campaign).await.unwrap().unwrap();
        assert_eq!(c.vehicles, vec!["golf".to_string()]);
        assert!(matches!(
            store.create_vehicle(99, &NewVehicle::new("ghost", 6.5)).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn history_is_sorted_by_date() {
        let (store, campaign) = seeded().await;
        let id = store.create_vehicle(campaign, &NewVehicle::new("golf", 6.5)).await.unwrap();
        for (date, value) in [("20200301T000000Z", 300.0), ("20200101T000000Z", 100.0), ("20200201T000000Z", 200.0)] {
            let date = parse_measurement_date(date).unwrap();
            store.append_measurement(id, &NewMeasurement { date, value }).await.unwrap();
        }
        let values: Vec<f64> = store.list_measurements(id).await.unwrap().iter().map(|m| m.value).collect();
        assert_eq!(values, vec![100.0, 200.0, 300.0]);
    }

    #[tokio::test]
    async fn measurement_for_unknown_vehicle_is_rejected() {
        let store = MemoryStore::new();
        let date = parse_measurement_date("20200101T000000Z").unwrap();
        assert!(matches!(
            store.append_measurement(5, &NewMeasurement { date, value: 1.0 }).await,
            Err(AppError::NotFound(_))
        ));
    }
}
