//! Pure loan and subsidy arithmetic shared by the CLI preview, the wizard
//! draft and the calculation mirror service.
//!
//! Amounts are rupees as `f64`. Nothing here rounds unless the function name
//! says so; callers round for display only.

pub mod emi;
pub mod roi;
pub mod schedule;
pub mod subsidy;

use thiserror::Error;

pub use emi::{monthly_installment, round_to_paise, EmiBreakdown, EmiParameters, Tenure};
pub use roi::{irradiation_for, roi_projection, RoiInputs, RoiProjection, YearlySavings};
pub use schedule::{amortization_schedule, stamp_due_dates, write_schedule_csv, ScheduleRow};
pub use subsidy::{subsidy, StateTopUp, SubsidyBreakdown, SubsidySchedule, SubsidyTier, SystemType};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("{field} must be {expected}, got {value}")]
    InvalidInput {
        field: &'static str,
        expected: &'static str,
        value: f64,
    },

    #[error("installment {installment} does not cover interest {interest} in period {period}")]
    NonAmortizing {
        period: u32,
        installment: f64,
        interest: f64,
    },

    #[error("invalid subsidy rule set: {0}")]
    InvalidRules(String),
}

impl CalcError {
    pub(crate) fn invalid(field: &'static str, expected: &'static str, value: f64) -> Self {
        Self::InvalidInput {
            field,
            expected,
            value,
        }
    }
}

pub(crate) fn ensure_positive(field: &'static str, value: f64) -> Result<f64, CalcError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(CalcError::invalid(field, "a positive finite number", value))
    }
}

pub(crate) fn ensure_non_negative(field: &'static str, value: f64) -> Result<f64, CalcError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(CalcError::invalid(field, "a non-negative finite number", value))
    }
}

/// Annual percentage → periodic monthly rate.
pub fn monthly_rate(annual_rate_percent: f64) -> f64 {
    annual_rate_percent / 12.0 / 100.0
}
