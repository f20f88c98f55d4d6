use super::{ensure_non_negative, ensure_positive, monthly_rate, CalcError};
use serde::{Deserialize, Serialize};

/// Loan tenure as entered: the wizard asks for years, calculators for months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tenure {
    Months(u32),
    Years(u32),
}

impl Tenure {
    /// Tenure in months. A year count too large to express in months is an
    /// input error rather than a clamped value.
    pub fn months(self) -> Result<u32, CalcError> {
        match self {
            Tenure::Months(m) => Ok(m),
            Tenure::Years(y) => y
                .checked_mul(12)
                .ok_or_else(|| CalcError::invalid("tenure_years", "at most 357913941", f64::from(y))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmiParameters {
    pub principal: f64,
    pub annual_rate_percent: f64,
    pub tenure: Tenure,
}

impl EmiParameters {
    pub fn new(principal: f64, annual_rate_percent: f64, tenure: Tenure) -> Self {
        Self {
            principal,
            annual_rate_percent,
            tenure,
        }
    }
}

/// Equal monthly installment for an amortizing loan.
///
/// `P·r·(1+r)^n / ((1+r)^n − 1)` with `r = rate / 12 / 100`. The annuity
/// formula is undefined at `r = 0`; a zero rate repays the principal in equal
/// parts (`P / n`). `(1+r)^n − 1` is evaluated as `expm1(n·ln1p(r))` so tiny
/// rates converge on `P / n` instead of cancelling to zero.
pub fn monthly_installment(
    principal: f64,
    annual_rate_percent: f64,
    tenure_months: u32,
) -> Result<f64, CalcError> {
    ensure_positive("principal", principal)?;
    ensure_non_negative("annual_rate_percent", annual_rate_percent)?;
    if tenure_months == 0 {
        return Err(CalcError::invalid(
            "tenure_months",
            "at least one month",
            0.0,
        ));
    }

    let n = f64::from(tenure_months);
    let r = monthly_rate(annual_rate_percent);
    if r == 0.0 {
        return Ok(principal / n);
    }

    let growth_minus_one = (n * r.ln_1p()).exp_m1();
    if !growth_minus_one.is_finite() {
        // (1+r)^n overflowed; the installment has converged on pure interest.
        return Ok(principal * r);
    }
    Ok(principal * r * (growth_minus_one + 1.0) / growth_minus_one)
}

/// Derived figures for one set of loan parameters.
///
/// Totals are computed from the unrounded installment so chained figures do
/// not inherit display rounding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EmiBreakdown {
    pub principal: f64,
    pub annual_rate_percent: f64,
    pub tenure_months: u32,
    pub monthly_installment: f64,
    pub total_payment: f64,
    pub total_interest: f64,
}

impl EmiBreakdown {
    pub fn compute(params: &EmiParameters) -> Result<Self, CalcError> {
        let tenure_months = params.tenure.months()?;
        let monthly_installment =
            monthly_installment(params.principal, params.annual_rate_percent, tenure_months)?;
        let total_payment = monthly_installment * f64::from(tenure_months);
        Ok(Self {
            principal: params.principal,
            annual_rate_percent: params.annual_rate_percent,
            tenure_months,
            monthly_installment,
            total_payment,
            total_interest: total_payment - params.principal,
        })
    }

    /// Installment rounded to whole rupees, as shown to applicants.
    pub fn rounded_installment(&self) -> f64 {
        self.monthly_installment.round()
    }
}

/// Two-decimal rounding used on the wire by the calculation endpoints.
pub fn round_to_paise(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn reference_loan_matches_annuity_formula() {
        // 2.5 lakh at 8.5 % over 10 years.
        let emi = monthly_installment(250_000.0, 8.5, 120).unwrap();
        assert!((emi - 3_099.642_221_862_78).abs() < 1e-6, "emi was {emi}");
        assert_eq!(emi.round(), 3_100.0);
    }

    #[test]
    fn years_and_months_agree() {
        let a = EmiBreakdown::compute(&EmiParameters::new(250_000.0, 8.5, Tenure::Years(10))).unwrap();
        let b = EmiBreakdown::compute(&EmiParameters::new(250_000.0, 8.5, Tenure::Months(120))).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.tenure_months, 120);
        assert!((a.total_interest - 121_957.066_623_533_5).abs() < 1e-4);
        assert_eq!(a.rounded_installment(), 3_100.0);
    }

    #[rstest]
    #[case(50_000.0, 8.5, 12)]
    #[case(250_000.0, 8.5, 120)]
    #[case(300_000.0, 10.5, 60)]
    #[case(10_000_000.0, 24.0, 300)]
    #[case(1.0, 0.01, 1)]
    fn installment_is_positive_and_repays_more_than_principal(
        #[case] principal: f64,
        #[case] rate: f64,
        #[case] months: u32,
    ) {
        let emi = monthly_installment(principal, rate, months).unwrap();
        assert!(emi > 0.0);
        assert!(emi * f64::from(months) > principal);
    }

    #[rstest]
    #[case(120_000.0, 12)]
    #[case(250_000.0, 120)]
    #[case(99_999.0, 7)]
    fn zero_rate_splits_principal_evenly(#[case] principal: f64, #[case] months: u32) {
        let emi = monthly_installment(principal, 0.0, months).unwrap();
        assert!((emi - principal / f64::from(months)).abs() < 1e-9);
    }

    #[test]
    fn tiny_rate_converges_on_even_split() {
        let emi = monthly_installment(120_000.0, 1e-12, 12).unwrap();
        assert!((emi - 10_000.0).abs() < 1e-3, "emi was {emi}");
    }

    #[test]
    fn extreme_growth_falls_back_to_interest_only() {
        let emi = monthly_installment(100_000.0, 1_000_000.0, u32::MAX).unwrap();
        assert!(emi.is_finite());
        assert!((emi - 100_000.0 * monthly_rate(1_000_000.0)).abs() < 1e-3);
    }

    #[rstest]
    #[case(0.0, 8.5, 12)]
    #[case(-1.0, 8.5, 12)]
    #[case(f64::NAN, 8.5, 12)]
    #[case(100_000.0, -0.5, 12)]
    #[case(100_000.0, f64::INFINITY, 12)]
    #[case(100_000.0, 8.5, 0)]
    fn rejects_invalid_parameters(#[case] principal: f64, #[case] rate: f64, #[case] months: u32) {
        let err = monthly_installment(principal, rate, months).unwrap_err();
        assert!(matches!(err, CalcError::InvalidInput { .. }), "{err:?}");
    }

    #[test]
    fn oversized_year_tenure_is_rejected() {
        assert_eq!(Tenure::Years(10).months(), Ok(120));
        assert_eq!(Tenure::Months(u32::MAX).months(), Ok(u32::MAX));
        let err = EmiBreakdown::compute(&EmiParameters::new(
            100_000.0,
            8.5,
            Tenure::Years(u32::MAX),
        ))
        .unwrap_err();
        assert!(
            matches!(err, CalcError::InvalidInput { field: "tenure_years", .. }),
            "{err:?}"
        );
    }

    #[test]
    fn paise_rounding() {
        assert_eq!(round_to_paise(3_099.642_221), 3_099.64);
        assert_eq!(round_to_paise(0.005), 0.01);
    }
}
