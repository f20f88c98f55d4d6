use super::{ensure_non_negative, CalcError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Central subsidy step: capacities up to and including `max_capacity_kw`
/// receive `amount`. `None` marks the open-ended top tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsidyTier {
    pub max_capacity_kw: Option<f64>,
    pub amount: f64,
}

/// State scheme paid on top of the central subsidy:
/// `min(capacity_kw * 1000 * percentage / 100, max_amount)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTopUp {
    pub percentage: f64,
    pub max_amount: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemType {
    #[default]
    Residential,
    Commercial,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubsidyBreakdown {
    pub subsidy_amount: f64,
    pub central_subsidy: f64,
    pub state_subsidy: f64,
    pub system_capacity_kw: f64,
    pub state: Option<String>,
    pub system_type: SystemType,
}

/// Validated subsidy rule set. Tiers are ascending by capacity with
/// non-decreasing amounts, and the last tier is open-ended, so the lookup is
/// total and monotonic over non-negative capacities.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubsidySchedule {
    tiers: Vec<SubsidyTier>,
    state_top_ups: BTreeMap<String, StateTopUp>,
}

#[derive(Deserialize)]
struct RuleFile {
    tiers: Vec<SubsidyTier>,
    #[serde(default)]
    state_top_ups: BTreeMap<String, StateTopUp>,
}

impl SubsidySchedule {
    pub fn new(
        tiers: Vec<SubsidyTier>,
        state_top_ups: BTreeMap<String, StateTopUp>,
    ) -> Result<Self, CalcError> {
        let Some((last, bounded)) = tiers.split_last() else {
            return Err(CalcError::InvalidRules("at least one tier is required".into()));
        };
        if last.max_capacity_kw.is_some() {
            return Err(CalcError::InvalidRules(
                "the last tier must be open-ended (max_capacity_kw = null)".into(),
            ));
        }

        let mut prev_cap = 0.0_f64;
        let mut prev_amount = 0.0_f64;
        for (i, tier) in tiers.iter().enumerate() {
            if !tier.amount.is_finite() || tier.amount < prev_amount {
                return Err(CalcError::InvalidRules(format!(
                    "tier {i}: amounts must be finite and non-decreasing"
                )));
            }
            prev_amount = tier.amount;

            if i < bounded.len() {
                match tier.max_capacity_kw {
                    Some(cap) if cap.is_finite() && cap > prev_cap => prev_cap = cap,
                    _ => {
                        return Err(CalcError::InvalidRules(format!(
                            "tier {i}: capacity bounds must be finite and strictly ascending"
                        )))
                    }
                }
            }
        }

        for (state, top_up) in &state_top_ups {
            let pct_ok = (0.0..=100.0).contains(&top_up.percentage);
            let max_ok = top_up.max_amount.is_finite() && top_up.max_amount >= 0.0;
            if !pct_ok || !max_ok {
                return Err(CalcError::InvalidRules(format!(
                    "state '{state}': percentage must be 0-100 and max_amount non-negative"
                )));
            }
        }

        Ok(Self {
            tiers,
            state_top_ups,
        })
    }

    /// PM Surya Ghar rooftop scheme as applied by the loan calculators.
    pub fn pm_surya_ghar() -> Self {
        let tiers = vec![
            SubsidyTier {
                max_capacity_kw: Some(1.0),
                amount: 30_000.0,
            },
            SubsidyTier {
                max_capacity_kw: Some(2.0),
                amount: 60_000.0,
            },
            SubsidyTier {
                max_capacity_kw: None,
                amount: 78_000.0,
            },
        ];
        let state_top_ups = [
            ("Maharashtra", 20.0, 20_000.0),
            ("Gujarat", 25.0, 25_000.0),
            ("Rajasthan", 15.0, 15_000.0),
        ]
        .into_iter()
        .map(|(state, percentage, max_amount)| {
            (
                state.to_string(),
                StateTopUp {
                    percentage,
                    max_amount,
                },
            )
        })
        .collect();
        Self {
            tiers,
            state_top_ups,
        }
    }

    /// Parse and validate a JSON rule file:
    /// `{"tiers": [{"max_capacity_kw": 1, "amount": 30000}, ...], "state_top_ups": {...}}`.
    pub fn from_json(text: &str) -> Result<Self, CalcError> {
        let file: RuleFile = serde_json::from_str(text)
            .map_err(|e| CalcError::InvalidRules(format!("malformed rule file: {e}")))?;
        Self::new(file.tiers, file.state_top_ups)
    }

    pub fn tiers(&self) -> &[SubsidyTier] {
        &self.tiers
    }

    /// Central subsidy for an installed capacity.
    pub fn subsidy_for(&self, capacity_kw: f64) -> Result<f64, CalcError> {
        let capacity_kw = ensure_non_negative("capacity_kw", capacity_kw)?;
        let amount = self
            .tiers
            .iter()
            .find(|t| t.max_capacity_kw.map_or(true, |cap| capacity_kw <= cap))
            .map(|t| t.amount)
            .unwrap_or_default();
        Ok(amount)
    }

    /// State top-up; zero for states without a scheme. Names match
    /// case-insensitively ("maharashtra" == "Maharashtra").
    pub fn state_top_up(&self, capacity_kw: f64, state: &str) -> Result<f64, CalcError> {
        let capacity_kw = ensure_non_negative("capacity_kw", capacity_kw)?;
        let state = state.trim();
        let amount = self
            .state_top_ups
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(state))
            .map(|(_, t)| (capacity_kw * 1000.0 * t.percentage / 100.0).min(t.max_amount))
            .unwrap_or(0.0);
        Ok(amount)
    }

    /// Central plus state subsidy. Commercial systems get no central subsidy.
    pub fn breakdown(
        &self,
        capacity_kw: f64,
        state: Option<&str>,
        system_type: SystemType,
    ) -> Result<SubsidyBreakdown, CalcError> {
        let central_subsidy = match system_type {
            SystemType::Residential => self.subsidy_for(capacity_kw)?,
            SystemType::Commercial => {
                ensure_non_negative("capacity_kw", capacity_kw)?;
                0.0
            }
        };
        let state_subsidy = match state {
            Some(s) => self.state_top_up(capacity_kw, s)?,
            None => 0.0,
        };
        Ok(SubsidyBreakdown {
            subsidy_amount: central_subsidy + state_subsidy,
            central_subsidy,
            state_subsidy,
            system_capacity_kw: capacity_kw,
            state: state.map(str::to_string),
            system_type,
        })
    }
}

impl Default for SubsidySchedule {
    fn default() -> Self {
        Self::pm_surya_ghar()
    }
}

/// Central subsidy under the default PM Surya Ghar tiers.
pub fn subsidy(capacity_kw: f64) -> Result<f64, CalcError> {
    SubsidySchedule::pm_surya_ghar().subsidy_for(capacity_kw)
}
