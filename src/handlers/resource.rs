//! Vehicle handlers. Vehicles are the only kind of tracked resource, hence the `/api/resource` prefix.

use super::parse_id;
use crate::calc::mpg_to_l_per_100km;
use crate::date::parse_measurement_date;
use crate::error::AppError;
use crate::model::{NewMeasurement, NewVehicle, VehicleView};
use crate::response::created;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Form, Json,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateVehicleForm {
    pub name: String,
    /// Fuel economy in miles per US gallon.
    pub mpg: f64,
    /// Campaign id the vehicle joins.
    pub campaign: String,
    pub notes: Option<String>,
    pub carbon_to_manufacture: Option<f64>,
    pub expected_life_km: Option<f64>,
}

impl CreateVehicleForm {
    fn into_new_vehicle(self) -> Result<NewVehicle, AppError> {
        if !self.mpg.is_finite() || self.mpg <= 0.0 {
            return Err(AppError::BadRequest(format!("mpg must be a positive number, got {}", self.mpg)));
        }
        if let Some(life) = self.expected_life_km {
            if !life.is_finite() || life <= 0.0 {
                return Err(AppError::BadRequest(format!(
                    "expected_life_km must be a positive number, got {}",
                    life
                )));
            }
        }
        // Subnormal mpg overflows the conversion.
        let fuel_l_per_100km = finite("fuel_l_per_100km", mpg_to_l_per_100km(self.mpg))?;
        let mut vehicle = NewVehicle::new(self.name, fuel_l_per_100km);
        vehicle.notes = self.notes.filter(|n| !n.is_empty());
        if let Some(c) = self.carbon_to_manufacture {
            vehicle.carbon_to_manufacture = finite("carbon_to_manufacture", c)?;
        }
        if let Some(life) = self.expected_life_km {
            vehicle.expected_life_km = life;
        }
        Ok(vehicle)
    }
}

/// JSON has no NaN or infinity, so such values could never be served back.
fn finite(field: &str, v: f64) -> Result<f64, AppError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(AppError::BadRequest(format!("{} must be a finite number, got {}", field, v)))
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryForm {
    /// `YYYYMMDDThhmmssZ`
    pub date: String,
    pub value: f64,
}

/// POST /api/resource/create
pub async fn create(
    State(state): State<AppState>,
    Form(form): Form<CreateVehicleForm>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(name = %form.name, mpg = form.mpg, "creating vehicle");
    let campaign_id = parse_id(&form.campaign, "campaign")?;
    let vehicle = form.into_new_vehicle()?;
    let id = state.store.create_vehicle(campaign_id, &vehicle).await?;
    tracing::info!(id, campaign_id, fuel_l_per_100km = vehicle.fuel_l_per_100km, "vehicle created");
    Ok(created())
}

/// GET /api/resource/:id
pub async fn get(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<Json<VehicleView>, AppError> {
    let id = parse_id(&id_str, "vehicle")?;
    let vehicle = state
        .store
        .find_vehicle(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("vehicle {}", id)))?;
    let history = state.store.list_measurements(id).await?;
    Ok(Json(VehicleView::new(vehicle, &history)))
}

/// POST /api/resource/:id/history
pub async fn append_history(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    Form(form): Form<HistoryForm>,
) -> Result<impl IntoResponse, AppError> {
    let vehicle_id = parse_id(&id_str, "vehicle")?;
    let date = parse_measurement_date(&form.date)?;
    let value = finite("value", form.value)?;
    state
        .store
        .append_measurement(vehicle_id, &NewMeasurement { date, value })
        .await?;
    tracing::debug!(vehicle_id, date = %form.date, value = form.value, "measurement appended");
    Ok(created())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(mpg: f64) -> CreateVehicleForm {
        CreateVehicleForm {
            name: "golf".into(),
            mpg,
            campaign: "1".into(),
            notes: None,
            carbon_to_manufacture: None,
            expected_life_km: None,
        }
    }

    #[test]
    fn converts_mpg_and_applies_defaults() {
        let v = form(22.0).into_new_vehicle().unwrap();
        assert!((v.fuel_l_per_100km - 10.6915).abs() < 1e-3);
        assert_eq!(v.units, "km");
        assert_eq!(v.carbon_to_manufacture, 10_000.0);
        assert_eq!(v.expected_life_km, 321_868.0);
        assert_eq!(v.notes, None);
    }

    #[test]
    fn optional_fields_override_defaults() {
        let mut f = form(30.0);
        f.notes = Some("hybrid".into());
        f.carbon_to_manufacture = Some(12_000.0);
        f.expected_life_km = Some(250_000.0);
        let v = f.into_new_vehicle().unwrap();
        assert_eq!(v.notes.as_deref(), Some("hybrid"));
        assert_eq!(v.carbon_to_manufacture, 12_000.0);
        assert_eq!(v.expected_life_km, 250_000.0);
    }

    #[test]
    fn rejects_unusable_mpg() {
        for mpg in [0.0, -3.0, f64::INFINITY, f64::NAN] {
            assert!(matches!(form(mpg).into_new_vehicle(), Err(AppError::BadRequest(_))));
        }
    }

    #[test]
    fn rejects_mpg_that_overflows_conversion() {
        assert!(matches!(form(1e-320).into_new_vehicle(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn rejects_non_finite_manufacture_carbon() {
        for c in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut f = form(30.0);
            f.carbon_to_manufacture = Some(c);
            assert!(matches!(f.into_new_vehicle(), Err(AppError::BadRequest(_))));
        }
    }
}
