//! Derived values: fuel economy conversion and per-kilometre emissions.

/// US gallons in one litre.
pub const GAL_PER_L: f64 = 0.2641729;
pub const KM_PER_MILE: f64 = 1.609344;
/// kg CO2 released by burning one US gallon of gasoline (EPA figure).
pub const KG_CO2_PER_GALLON: f64 = 8.9;
pub const KG_CO2_PER_LITRE: f64 = KG_CO2_PER_GALLON * GAL_PER_L;

/// Miles per US gallon to litres per 100 km.
pub fn mpg_to_l_per_100km(mpg: f64) -> f64 {
    100.0 / (mpg * GAL_PER_L * KM_PER_MILE)
}

/// kg CO2 per km: fuel burned plus the manufacturing footprint spread over the vehicle's lifetime.
pub fn carbon_per_unit(fuel_l_per_100km: f64, carbon_to_manufacture: f64, expected_life_km: f64) -> f64 {
    let combustion = (fuel_l_per_100km / 100.0) * KG_CO2_PER_LITRE;
    let amortized_manufacture = carbon_to_manufacture / expected_life_km;
    combustion + amortized_manufacture
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn converts_22_mpg() {
        let l = mpg_to_l_per_100km(22.0);
        assert!(close(l, 10.6915, 1e-3), "got {l}");
    }

    #[test]
    fn higher_mpg_burns_less() {
        assert!(mpg_to_l_per_100km(40.0) < mpg_to_l_per_100km(20.0));
        assert!(close(mpg_to_l_per_100km(40.0) * 2.0, mpg_to_l_per_100km(20.0), 1e-9));
    }

    #[test]
    fn default_vehicle_emissions() {
        let c = carbon_per_unit(10.6, 10_000.0, 321_868.0);
        assert!(close(c, 0.2805, 1e-3), "got {c}");
        let combustion = carbon_per_unit(10.6, 0.0, 321_868.0);
        assert!(close(combustion, 0.2492, 1e-3), "got {combustion}");
    }

    #[test]
    fn manufacture_only() {
        assert!(close(carbon_per_unit(0.0, 5_000.0, 100_000.0), 0.05, 1e-12));
    }
}
