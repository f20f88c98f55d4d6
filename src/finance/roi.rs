use super::{ensure_non_negative, ensure_positive, CalcError};
use serde::{Deserialize, Serialize};

const DEFAULT_IRRADIATION: f64 = 5.0;
const DISCOUNT_RATE: f64 = 0.08;
/// Longest projection accepted; panels are rated for about 25 years.
pub const MAX_PROJECTION_YEARS: u32 = 50;

/// Mean daily irradiation (kWh per kW per day) by state.
const IRRADIATION: &[(&str, f64)] = &[
    ("Maharashtra", 5.5),
    ("Gujarat", 5.8),
    ("Rajasthan", 6.0),
    ("Karnataka", 5.2),
    ("Tamil Nadu", 5.0),
];

pub fn irradiation_for(location: &str) -> f64 {
    let location = location.trim();
    IRRADIATION
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(location))
        .map(|(_, v)| *v)
        .unwrap_or(DEFAULT_IRRADIATION)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiInputs {
    pub system_capacity_kw: f64,
    pub location: String,
    pub installation_cost: f64,
    /// Tariff in rupees per kWh.
    #[serde(default = "default_electricity_rate")]
    pub electricity_rate: f64,
    /// Panel output loss per year, in percent.
    #[serde(default = "default_degradation")]
    pub degradation_rate_percent: f64,
    #[serde(default = "default_years")]
    pub years: u32,
}

fn default_electricity_rate() -> f64 {
    8.0
}

fn default_degradation() -> f64 {
    0.5
}

fn default_years() -> u32 {
    25
}

impl RoiInputs {
    pub fn new(system_capacity_kw: f64, location: impl Into<String>, installation_cost: f64) -> Self {
        Self {
            system_capacity_kw,
            location: location.into(),
            installation_cost,
            electricity_rate: default_electricity_rate(),
            degradation_rate_percent: default_degradation(),
            years: default_years(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlySavings {
    pub year: u32,
    pub generation_kwh: f64,
    pub savings: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoiProjection {
    pub total_savings: f64,
    pub net_savings: f64,
    pub roi_percentage: f64,
    /// First year whose cumulative savings cover the installation cost, or
    /// the projection horizon when they never do.
    pub payback_period_years: u32,
    pub npv: f64,
    pub irradiation: f64,
    pub annual_savings: Vec<YearlySavings>,
}

pub fn roi_projection(inputs: &RoiInputs) -> Result<RoiProjection, CalcError> {
    let capacity = ensure_positive("system_capacity_kw", inputs.system_capacity_kw)?;
    let cost = ensure_non_negative("installation_cost", inputs.installation_cost)?;
    let tariff = ensure_non_negative("electricity_rate", inputs.electricity_rate)?;
    let degradation = ensure_non_negative("degradation_rate_percent", inputs.degradation_rate_percent)?;
    if degradation >= 100.0 {
        return Err(CalcError::invalid(
            "degradation_rate_percent",
            "below 100",
            degradation,
        ));
    }
    if inputs.years == 0 || inputs.years > MAX_PROJECTION_YEARS {
        return Err(CalcError::invalid(
            "years",
            "between 1 and 50",
            f64::from(inputs.years),
        ));
    }

    let irradiation = irradiation_for(&inputs.location);
    let retention = 1.0 - degradation / 100.0;

    let mut annual_savings = Vec::new();
    let mut total_savings = 0.0;
    let mut npv = -cost;
    let mut payback = None;
    let mut effective_capacity = capacity;

    for year in 1..=inputs.years {
        let generation_kwh = effective_capacity * irradiation * 365.0;
        let savings = generation_kwh * tariff;
        total_savings += savings;
        npv += savings / (1.0 + DISCOUNT_RATE).powf(f64::from(year));
        if payback.is_none() && total_savings >= cost {
            payback = Some(year);
        }
        annual_savings.push(YearlySavings {
            year,
            generation_kwh,
            savings,
        });
        effective_capacity *= retention;
    }

    let net_savings = total_savings - cost;
    let roi_percentage = if cost > 0.0 {
        net_savings / cost * 100.0
    } else {
        0.0
    };

    Ok(RoiProjection {
        total_savings,
        net_savings,
        roi_percentage,
        payback_period_years: payback.unwrap_or(inputs.years),
        npv,
        irradiation,
        annual_savings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_year_uses_state_irradiation() {
        let p = roi_projection(&RoiInputs::new(3.0, "maharashtra", 150_000.0)).unwrap();
        assert_eq!(p.irradiation, 5.5);
        assert_eq!(p.annual_savings.len(), 25);
        assert_eq!(p.annual_savings[0].generation_kwh, 6_022.5);
        assert_eq!(p.annual_savings[0].savings, 48_180.0);
        assert!(p.annual_savings[1].savings < p.annual_savings[0].savings);
    }

    #[test]
    fn payback_roi_and_npv_are_consistent() {
        let p = roi_projection(&RoiInputs::new(3.0, "Maharashtra", 150_000.0)).unwrap();
        assert_eq!(p.payback_period_years, 4);
        assert!((p.net_savings - (p.total_savings - 150_000.0)).abs() < 1e-6);
        assert!((p.roi_percentage - p.net_savings / 1_500.0).abs() < 1e-9);
        assert!(p.npv > 0.0 && p.npv < p.net_savings);
    }

    #[test]
    fn unknown_location_falls_back_and_never_paying_back_reports_horizon() {
        let mut inputs = RoiInputs::new(1.0, "Atlantis", 10_000_000.0);
        inputs.years = 5;
        let p = roi_projection(&inputs).unwrap();
        assert_eq!(p.irradiation, 5.0);
        assert_eq!(p.payback_period_years, 5);
        assert!(p.roi_percentage < 0.0);
    }

    #[test]
    fn rejects_bad_inputs() {
        let mut inputs = RoiInputs::new(3.0, "Gujarat", 100_000.0);
        inputs.degradation_rate_percent = 100.0;
        assert!(roi_projection(&inputs).is_err());
        assert!(roi_projection(&RoiInputs::new(0.0, "Gujarat", 1.0)).is_err());
        assert!(roi_projection(&RoiInputs::new(3.0, "Gujarat", -1.0)).is_err());
    }

    #[test]
    fn horizon_is_bounded() {
        let mut inputs = RoiInputs::new(3.0, "Gujarat", 100_000.0);
        inputs.years = MAX_PROJECTION_YEARS;
        assert_eq!(roi_projection(&inputs).unwrap().annual_savings.len(), 50);

        for years in [0, MAX_PROJECTION_YEARS + 1, u32::MAX] {
            inputs.years = years;
            let err = roi_projection(&inputs).unwrap_err();
            assert!(matches!(err, CalcError::InvalidInput { field: "years", .. }), "{err:?}");
        }
    }
}
