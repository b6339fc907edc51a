//! Data access: one repository trait per entity, implemented for PostgreSQL and in memory.
//!
//! Uniqueness of usernames and campaign names is enforced by the backing store, never checked ahead
//! of the insert. Handlers only see [`AppError`] values.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{admin_connect_options, ensure_database_exists, PgStore};

use crate::error::AppError;
use crate::model::{Campaign, NewMeasurement, NewVehicle, ResourceMeasurement, User, Vehicle};
use async_trait::async_trait;

#[async_trait]
pub trait UserRepository {
    /// Fails with [`AppError::UsernameTaken`] when the username exists.
    async fn create_user(&self, username: &str) -> Result<(), AppError>;

    /// User with the campaigns they belong to, ordered by campaign id.
    async fn find_user(&self, username: &str) -> Result<Option<User>, AppError>;

    async fn user_exists(&self, username: &str) -> Result<bool, AppError>;
}

#[async_trait]
pub trait CampaignRepository {
    /// Creates the campaign with `username` as its first member. Returns the new id.
    /// Unknown user is [`AppError::NotFound`]; a duplicate name is [`AppError::NameTaken`].
    async fn create_campaign(&self, username: &str, name: &str) -> Result<i64, AppError>;

    async fn find_campaign(&self, id: i64) -> Result<Option<Campaign>, AppError>;
}

#[async_trait]
pub trait VehicleRepository {
    /// Creates the vehicle and links it to the campaign. Unknown campaign is [`AppError::NotFound`].
    async fn create_vehicle(&self, campaign_id: i64, vehicle: &NewVehicle) -> Result<i64, AppError>;

    async fn find_vehicle(&self, id: i64) -> Result<Option<Vehicle>, AppError>;
}

#[async_trait]
pub trait MeasurementRepository {
    /// Appends a reading. The vehicle is not looked up first; the store's reference check
    /// rejects unknown ids as [`AppError::NotFound`].
    async fn append_measurement(
        &self,
        vehicle_id: i64,
        measurement: &NewMeasurement,
    ) -> Result<i64, AppError>;

    /// History of one vehicle, oldest first.
    async fn list_measurements(&self, vehicle_id: i64) -> Result<Vec<ResourceMeasurement>, AppError>;
}

/// Everything the HTTP layer needs from persistence.
#[async_trait]
pub trait Store:
    UserRepository + CampaignRepository + VehicleRepository + MeasurementRepository + Send + Sync
{
    /// Readiness probe.
    async fn ping(&self) -> Result<(), AppError>;
}
