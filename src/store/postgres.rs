//! PostgreSQL store. Tables live in a schema chosen by configuration (default `public`).

use super::{CampaignRepository, MeasurementRepository, Store, UserRepository, VehicleRepository};
use crate::error::{foreign_key_violation_as, unique_violation_as, AppError, ConfigError};
use crate::model::{
    Campaign, CampaignSummary, NewMeasurement, NewVehicle, ResourceMeasurement, User, Vehicle,
    DEFAULT_CARBON_TO_MANUFACTURE, DEFAULT_EXPECTED_LIFE_KM, DEFAULT_FUEL_L_PER_100KM,
    DEFAULT_UNITS,
};
use async_trait::async_trait;
use sqlx::postgres::PgConnectOptions;
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    schema: String,
}

impl PgStore {
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        PgStore {
            pool,
            schema: schema.into(),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Schema-qualified table name (e.g. "public.campaigns").
    fn table(&self, name: &str) -> String {
        format!("{}.{}", quote_ident(&self.schema), name)
    }

    /// Create the schema and all tables if missing. Safe to run on every start.
    pub async fn ensure_tables(&self) -> Result<(), AppError> {
        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(&self.schema)))
            .execute(&self.pool)
            .await?;

        let users = self.table("users");
        let campaigns = self.table("campaigns");
        let vehicles = self.table("vehicles");
        let campaign_users = self.table("campaign_users");
        let campaign_vehicles = self.table("campaign_vehicles");
        let measurements = self.table("resource_measurements");

        let ddl = [
            format!(
                "CREATE TABLE IF NOT EXISTS {} (username TEXT PRIMARY KEY)",
                users
            ),
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {} (
                    id BIGSERIAL PRIMARY KEY,
                    name TEXT UNIQUE,
                    offsets_available DOUBLE PRECISION NOT NULL DEFAULT 0
                )
                "#,
                campaigns
            ),
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {} (
                    id BIGSERIAL PRIMARY KEY,
                    name TEXT NOT NULL,
                    units TEXT NOT NULL DEFAULT '{}',
                    notes TEXT,
                    fuel_l_per_100km DOUBLE PRECISION NOT NULL DEFAULT {},
                    carbon_to_manufacture DOUBLE PRECISION NOT NULL DEFAULT {},
                    expected_life_km DOUBLE PRECISION NOT NULL DEFAULT {}
                )
                "#,
                vehicles,
                DEFAULT_UNITS,
                DEFAULT_FUEL_L_PER_100KM,
                DEFAULT_CARBON_TO_MANUFACTURE,
                DEFAULT_EXPECTED_LIFE_KM
            ),
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {} (
                    campaign BIGINT NOT NULL REFERENCES {} (id),
                    username TEXT NOT NULL REFERENCES {} (username),
                    PRIMARY KEY (campaign, username)
                )
                "#,
                campaign_users, campaigns, users
            ),
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {} (
                    campaign BIGINT NOT NULL REFERENCES {} (id),
                    vehicle BIGINT NOT NULL REFERENCES {} (id),
                    PRIMARY KEY (campaign, vehicle)
                )
                "#,
                campaign_vehicles, campaigns, vehicles
            ),
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {} (
                    id BIGSERIAL PRIMARY KEY,
                    date TIMESTAMP NOT NULL,
                    value DOUBLE PRECISION NOT NULL,
                    resource BIGINT NOT NULL REFERENCES {} (id)
                )
                "#,
                measurements, vehicles
            ),
            format!(
                "CREATE INDEX IF NOT EXISTS resource_measurements_resource_date ON {} (resource, date)",
                measurements
            ),
        ];
        for sql in &ddl {
            tracing::debug!(sql = %sql, "ddl");
            sqlx::query(sql).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn campaigns_of_user(&self, username: &str) -> Result<Vec<CampaignSummary>, AppError> {
        let sql = format!(
            "SELECT c.id, c.name FROM {} c JOIN {} cu ON cu.campaign = c.id WHERE cu.username = $1 ORDER BY c.id",
            self.table("campaigns"),
            self.table("campaign_users")
        );
        tracing::debug!(sql = %sql, username, "query");
        let rows = sqlx::query_as::<_, CampaignSummary>(&sql)
            .bind(username)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn campaigns_of_vehicle(&self, vehicle_id: i64) -> Result<Vec<CampaignSummary>, AppError> {
        let sql = format!(
            "SELECT c.id, c.name FROM {} c JOIN {} cv ON cv.campaign = c.id WHERE cv.vehicle = $1 ORDER BY c.id",
            self.table("campaigns"),
            self.table("campaign_vehicles")
        );
        tracing::debug!(sql = %sql, vehicle_id, "query");
        let rows = sqlx::query_as::<_, CampaignSummary>(&sql)
            .bind(vehicle_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn create_user(&self, username: &str) -> Result<(), AppError> {
        let sql = format!("INSERT INTO {} (username) VALUES ($1)", self.table("users"));
        sqlx::query(&sql)
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(|e| unique_violation_as(e, AppError::UsernameTaken))?;
        Ok(())
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>, AppError> {
        if !self.user_exists(username).await? {
            return Ok(None);
        }
        let campaigns = self.campaigns_of_user(username).await?;
        Ok(Some(User {
            username: username.to_string(),
            campaigns,
        }))
    }

    async fn user_exists(&self, username: &str) -> Result<bool, AppError> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE username = $1)",
            self.table("users")
        );
        let exists: bool = sqlx::query_scalar(&sql)
            .bind(username)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

#[async_trait]
impl CampaignRepository for PgStore {
    async fn create_campaign(&self, username: &str, name: &str) -> Result<i64, AppError> {
        let mut tx = self.pool.begin().await?;

        let user: Option<String> = sqlx::query_scalar(&format!(
            "SELECT username FROM {} WHERE username = $1",
            self.table("users")
        ))
        .bind(username)
        .fetch_optional(&mut *tx)
        .await?;
        if user.is_none() {
            return Err(AppError::NotFound(format!("user '{}'", username)));
        }

        let id: i64 = sqlx::query_scalar(&format!(
            "INSERT INTO {} (name) VALUES ($1) RETURNING id",
            self.table("campaigns")
        ))
        .bind(name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| unique_violation_as(e, AppError::NameTaken))?;

        sqlx::query(&format!(
            "INSERT INTO {} (campaign, username) VALUES ($1, $2)",
            self.table("campaign_users")
        ))
        .bind(id)
        .bind(username)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(id)
    }

    async fn find_campaign(&self, id: i64) -> Result<Option<Campaign>, AppError> {
        let row: Option<(i64, Option<String>, f64)> = sqlx::query_as(&format!(
            "SELECT id, name, offsets_available FROM {} WHERE id = $1",
            self.table("campaigns")
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        let Some((id, name, offsets_available)) = row else {
            return Ok(None);
        };

        let users: Vec<String> = sqlx::query_scalar(&format!(
            "SELECT username FROM {} WHERE campaign = $1 ORDER BY username",
            self.table("campaign_users")
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let vehicles: Vec<String> = sqlx::query_scalar(&format!(
            "SELECT v.name FROM {} v JOIN {} cv ON cv.vehicle = v.id WHERE cv.campaign = $1 ORDER BY v.id",
            self.table("vehicles"),
            self.table("campaign_vehicles")
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(Campaign {
            id,
            name: name.unwrap_or_default(),
            offsets_available,
            users,
            vehicles,
        }))
    }
}

#[async_trait]
impl VehicleRepository for PgStore {
    async fn create_vehicle(&self, campaign_id: i64, vehicle: &NewVehicle) -> Result<i64, AppError> {
        let mut tx = self.pool.begin().await?;

        let campaign: Option<i64> = sqlx::query_scalar(&format!(
            "SELECT id FROM {} WHERE id = $1",
            self.table("campaigns")
        ))
        .bind(campaign_id)
        .fetch_optional(&mut *tx)
        .await?;
        if campaign.is_none() {
            return Err(AppError::NotFound(format!("campaign {}", campaign_id)));
        }

        let id: i64 = sqlx::query_scalar(&format!(
            r#"
            INSERT INTO {} (name, units, notes, fuel_l_per_100km, carbon_to_manufacture, expected_life_km)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
            self.table("vehicles")
        ))
        .bind(&vehicle.name)
        .bind(&vehicle.units)
        .bind(&vehicle.notes)
        .bind(vehicle.fuel_l_per_100km)
        .bind(vehicle.carbon_to_manufacture)
        .bind(vehicle.expected_life_km)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(&format!(
            "INSERT INTO {} (campaign, vehicle) VALUES ($1, $2)",
            self.table("campaign_vehicles")
        ))
        .bind(campaign_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(id)
    }

    async fn find_vehicle(&self, id: i64) -> Result<Option<Vehicle>, AppError> {
        let row: Option<(i64, String, String, Option<String>, f64, f64, f64)> = sqlx::query_as(&format!(
            r#"
            SELECT id, name, units, notes, fuel_l_per_100km, carbon_to_manufacture, expected_life_km
            FROM {} WHERE id = $1
            "#,
            self.table("vehicles")
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        let Some((id, name, units, notes, fuel_l_per_100km, carbon_to_manufacture, expected_life_km)) = row
        else {
            return Ok(None);
        };
        let campaigns = self.campaigns_of_vehicle(id).await?;
        Ok(Some(Vehicle {
            id,
            name,
            units,
            notes,
            fuel_l_per_100km,
            carbon_to_manufacture,
            expected_life_km,
            campaigns,
        }))
    }
}

#[async_trait]
impl MeasurementRepository for PgStore {
    async fn append_measurement(
        &self,
        vehicle_id: i64,
        measurement: &NewMeasurement,
    ) -> Result<i64, AppError> {
        let id: i64 = sqlx::query_scalar(&format!(
            "INSERT INTO {} (date, value, resource) VALUES ($1, $2, $3) RETURNING id",
            self.table("resource_measurements")
        ))
        .bind(measurement.date)
        .bind(measurement.value)
        .bind(vehicle_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| foreign_key_violation_as(e, AppError::NotFound(format!("vehicle {}", vehicle_id))))?;
        Ok(id)
    }

    async fn list_measurements(&self, vehicle_id: i64) -> Result<Vec<ResourceMeasurement>, AppError> {
        let rows = sqlx::query_as::<_, ResourceMeasurement>(&format!(
            "SELECT id, date, value, resource FROM {} WHERE resource = $1 ORDER BY date, id",
            self.table("resource_measurements")
        ))
        .bind(vehicle_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }
}

/// Splits `DATABASE_URL` into options for the server's `postgres` maintenance database and the
/// name of the target database. `None` when the URL names no database, or names `postgres` itself.
pub fn admin_connect_options(database_url: &str) -> Result<Option<(PgConnectOptions, String)>, ConfigError> {
    let opts = PgConnectOptions::from_str(database_url).map_err(|e| ConfigError::InvalidVar {
        var: "DATABASE_URL",
        value: database_url.to_string(),
        reason: e.to_string(),
    })?;
    let db_name = match opts.get_database() {
        Some(name) if !name.is_empty() && name != "postgres" => name.to_string(),
        _ => return Ok(None),
    };
    Ok(Some((opts.database("postgres"), db_name)))
}

/// Create `db_name` through the maintenance connection if it does not exist.
pub async fn ensure_database_exists(admin: &PgConnectOptions, db_name: &str) -> Result<(), sqlx::Error> {
    let mut conn: sqlx::PgConnection = admin.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
