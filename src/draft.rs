//! Client-held loan application, filled in one wizard step at a time and
//! sent to the backend as a single payload once every step validates.

use crate::chainfly::types::LoanApplicationPayload;
use crate::finance::{monthly_installment, SubsidySchedule};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Rate quoted on the financial step before the lender prices the loan.
pub const PREVIEW_ANNUAL_RATE: f64 = 8.5;
/// Installed cost per kW used to guess capacity from the loan amount when
/// the solar step has not been filled in.
const ESTIMATED_COST_PER_KW: f64 = 70_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftStep {
    PersonalInfo,
    SolarSpecs,
    FinancialInfo,
    Documents,
    Review,
}

impl DraftStep {
    pub const ALL: [DraftStep; 5] = [
        DraftStep::PersonalInfo,
        DraftStep::SolarSpecs,
        DraftStep::FinancialInfo,
        DraftStep::Documents,
        DraftStep::Review,
    ];

    /// 1-based position, as shown to the applicant.
    pub fn number(self) -> usize {
        self as usize + 1
    }

    pub fn title(self) -> &'static str {
        match self {
            DraftStep::PersonalInfo => "Personal Info",
            DraftStep::SolarSpecs => "Solar Specs",
            DraftStep::FinancialInfo => "Financial Info",
            DraftStep::Documents => "Documents",
            DraftStep::Review => "Review",
        }
    }

    fn next(self) -> Option<DraftStep> {
        Self::ALL.get(self as usize + 1).copied()
    }

    fn prev(self) -> Option<DraftStep> {
        (self as usize).checked_sub(1).map(|i| Self::ALL[i])
    }
}

impl fmt::Display for DraftStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("{step} is incomplete: {}", join_issues(.issues))]
    Invalid {
        step: DraftStep,
        issues: Vec<FieldIssue>,
    },

    #[error("application is at step {0}; finish the review step before submitting")]
    NotReviewed(DraftStep),
}

impl DraftError {
    pub fn issues(&self) -> &[FieldIssue] {
        match self {
            DraftError::Invalid { issues, .. } => issues,
            DraftError::NotReviewed(_) => &[],
        }
    }
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub full_name: Option<String>,
    pub age: Option<u32>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolarSpecs {
    pub capacity_kw: Option<f64>,
    pub panel_type: Option<String>,
    pub roof_area_sqft: Option<f64>,
    pub roof_type: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialInfo {
    pub annual_income: Option<f64>,
    pub monthly_expenses: Option<f64>,
    pub existing_emis: Option<f64>,
    pub loan_amount: Option<f64>,
    pub loan_tenure_years: Option<u32>,
}

/// Local files picked for upload. Aadhaar and PAN are mandatory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentSet {
    pub aadhaar: Option<PathBuf>,
    pub pan: Option<PathBuf>,
    pub bank_statement: Option<PathBuf>,
    pub salary_slip: Option<PathBuf>,
}

/// Live figures for the financial step. `None` until the inputs they need
/// are present and valid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FinancialPreview {
    /// Rounded to whole rupees.
    pub monthly_emi: Option<f64>,
    pub subsidy: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanApplicationDraft {
    step: DraftStep,
    pub personal: PersonalInfo,
    pub solar: SolarSpecs,
    pub financial: FinancialInfo,
    pub documents: DocumentSet,
}

impl Default for LoanApplicationDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl LoanApplicationDraft {
    pub fn new() -> Self {
        Self {
            step: DraftStep::PersonalInfo,
            personal: PersonalInfo::default(),
            solar: SolarSpecs::default(),
            financial: FinancialInfo::default(),
            documents: DocumentSet::default(),
        }
    }

    pub fn current_step(&self) -> DraftStep {
        self.step
    }

    pub fn apply_personal(&mut self, personal: PersonalInfo) {
        self.personal = personal;
    }

    pub fn apply_solar(&mut self, solar: SolarSpecs) {
        self.solar = solar;
    }

    pub fn apply_financial(&mut self, financial: FinancialInfo) {
        self.financial = financial;
    }

    pub fn apply_documents(&mut self, documents: DocumentSet) {
        self.documents = documents;
    }

    /// Validate the current step and move to the next one. At Review this
    /// re-checks every step and stays put.
    pub fn advance(&mut self) -> Result<DraftStep, DraftError> {
        match self.step.next() {
            Some(next) => {
                self.validate_step(self.step)?;
                self.step = next;
            }
            None => self.validate_all()?,
        }
        Ok(self.step)
    }

    /// Step back without validating. Returns `false` on the first step.
    pub fn back(&mut self) -> bool {
        match self.step.prev() {
            Some(prev) => {
                self.step = prev;
                true
            }
            None => false,
        }
    }

    pub fn validate_step(&self, step: DraftStep) -> Result<(), DraftError> {
        let mut issues = Issues::default();
        match step {
            DraftStep::PersonalInfo => self.check_personal(&mut issues),
            DraftStep::SolarSpecs => self.check_solar(&mut issues),
            DraftStep::FinancialInfo => self.check_financial(&mut issues),
            DraftStep::Documents => self.check_documents(&mut issues),
            DraftStep::Review => {}
        }
        issues.into_result(step)
    }

    pub fn validate_all(&self) -> Result<(), DraftError> {
        DraftStep::ALL
            .iter()
            .try_for_each(|step| self.validate_step(*step))
    }

    pub fn preview(&self, schedule: &SubsidySchedule) -> FinancialPreview {
        let f = &self.financial;
        let monthly_emi = match (f.loan_amount, f.loan_tenure_years) {
            (Some(amount), Some(years)) => {
                monthly_installment(amount, PREVIEW_ANNUAL_RATE, years.saturating_mul(12))
                    .ok()
                    .map(f64::round)
            }
            _ => None,
        };
        let capacity = self
            .solar
            .capacity_kw
            .or_else(|| f.loan_amount.map(|amount| amount / ESTIMATED_COST_PER_KW));
        let subsidy = capacity.and_then(|kw| schedule.subsidy_for(kw).ok());
        FinancialPreview {
            monthly_emi,
            subsidy,
        }
    }

    /// The submission payload. Only available once the applicant has
    /// reached Review and every step validates.
    pub fn into_payload(self) -> Result<LoanApplicationPayload, DraftError> {
        if self.step != DraftStep::Review {
            return Err(DraftError::NotReviewed(self.step));
        }
        self.validate_all()?;

        let p = self.personal;
        Ok(LoanApplicationPayload {
            full_name: p.full_name.map(|s| s.trim().to_string()),
            installation_address: p.address.clone(),
            address: p.address,
            city: p.city,
            state: p.state,
            pincode: p.pincode,
            annual_income: self.financial.annual_income,
            existing_loans: self.financial.existing_emis,
            system_capacity_kw: self.solar.capacity_kw,
            roof_area_sqft: self.solar.roof_area_sqft,
            roof_type: self.solar.roof_type,
            loan_amount: self.financial.loan_amount,
            loan_tenure_years: self.financial.loan_tenure_years,
            interest_rate: Some(PREVIEW_ANNUAL_RATE),
            ..LoanApplicationPayload::default()
        })
    }

    fn check_personal(&self, issues: &mut Issues) {
        let p = &self.personal;
        issues.text_len(
            "full_name",
            p.full_name.as_deref(),
            3,
            100,
            "Name must be at least 3 characters",
        );
        match p.age {
            None => issues.push("age", "Age is required"),
            Some(age) if age < 21 => issues.push("age", "Must be at least 21 years old"),
            Some(age) if age > 70 => issues.push("age", "Must be under 70 years old"),
            Some(_) => {}
        }
        match p.email.as_deref().map(str::trim) {
            Some(email) if is_email(email) => {}
            _ => issues.push("email", "Invalid email address"),
        }
        match p.phone.as_deref().map(str::trim) {
            Some(phone) if is_indian_mobile(phone) => {}
            _ => issues.push("phone", "Invalid Indian phone number"),
        }
        issues.text_len(
            "address",
            p.address.as_deref(),
            10,
            200,
            "Address must be at least 10 characters",
        );
        issues.text_len("city", p.city.as_deref(), 2, 50, "City must be 2-50 characters");
        issues.text_len("state", p.state.as_deref(), 2, 50, "State must be 2-50 characters");
        match p.pincode.as_deref().map(str::trim) {
            Some(pin) if pin.len() == 6 && pin.bytes().all(|b| b.is_ascii_digit()) => {}
            _ => issues.push("pincode", "Invalid pincode"),
        }
    }

    fn check_solar(&self, issues: &mut Issues) {
        let s = &self.solar;
        issues.range("capacity_kw", s.capacity_kw, 1.0, 10.0, "Minimum 1 kW", "Maximum 10 kW");
        issues.range(
            "roof_area_sqft",
            s.roof_area_sqft,
            50.0,
            5000.0,
            "Minimum 50 sq ft required",
            "Maximum 5000 sq ft",
        );
        issues.required("panel_type", s.panel_type.as_deref(), "Please select panel type");
        issues.required("roof_type", s.roof_type.as_deref(), "Please select roof type");
        if let Some(lat) = s.latitude {
            if !(-90.0..=90.0).contains(&lat) {
                issues.push("latitude", "Latitude must be between -90 and 90");
            }
        }
        if let Some(lon) = s.longitude {
            if !(-180.0..=180.0).contains(&lon) {
                issues.push("longitude", "Longitude must be between -180 and 180");
            }
        }
    }

    fn check_financial(&self, issues: &mut Issues) {
        let f = &self.financial;
        issues.range(
            "annual_income",
            f.annual_income,
            100_000.0,
            f64::MAX,
            "Minimum annual income: ₹1,00,000",
            "Annual income is too large",
        );
        issues.range(
            "monthly_expenses",
            f.monthly_expenses,
            0.0,
            f64::MAX,
            "Monthly expenses cannot be negative",
            "Monthly expenses are too large",
        );
        issues.range(
            "existing_emis",
            f.existing_emis,
            0.0,
            f64::MAX,
            "Existing EMIs cannot be negative",
            "Existing EMIs are too large",
        );
        issues.range(
            "loan_amount",
            f.loan_amount,
            50_000.0,
            10_000_000.0,
            "Minimum loan: ₹50,000",
            "Maximum loan: ₹1,00,00,000",
        );
        match f.loan_tenure_years {
            None | Some(0) => issues.push("loan_tenure_years", "Minimum 1 year"),
            Some(years) if years > 25 => issues.push("loan_tenure_years", "Maximum 25 years"),
            Some(_) => {}
        }
    }

    fn check_documents(&self, issues: &mut Issues) {
        if self.documents.aadhaar.is_none() {
            issues.push("aadhaar", "Aadhaar is a mandatory document");
        }
        if self.documents.pan.is_none() {
            issues.push("pan", "PAN is a mandatory document");
        }
    }
}

#[derive(Default)]
struct Issues(Vec<FieldIssue>);

impl Issues {
    fn push(&mut self, field: &'static str, message: &str) {
        self.0.push(FieldIssue {
            field,
            message: message.to_string(),
        });
    }

    fn required(&mut self, field: &'static str, value: Option<&str>, message: &str) {
        if value.map(str::trim).map_or(true, str::is_empty) {
            self.push(field, message);
        }
    }

    fn text_len(
        &mut self,
        field: &'static str,
        value: Option<&str>,
        min: usize,
        max: usize,
        too_short: &str,
    ) {
        let len = value.map(|v| v.trim().chars().count()).unwrap_or(0);
        if len < min {
            self.push(field, too_short);
        } else if len > max {
            self.push(field, &format!("Must be at most {max} characters"));
        }
    }

    fn range(
        &mut self,
        field: &'static str,
        value: Option<f64>,
        min: f64,
        max: f64,
        too_low: &str,
        too_high: &str,
    ) {
        match value {
            Some(v) if v.is_finite() && v < min => self.push(field, too_low),
            Some(v) if v.is_finite() && v > max => self.push(field, too_high),
            Some(v) if v.is_finite() => {}
            _ => self.push(field, too_low),
        }
    }

    fn into_result(self, step: DraftStep) -> Result<(), DraftError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(DraftError::Invalid {
                step,
                issues: self.0,
            })
        }
    }
}

fn is_email(value: &str) -> bool {
    if value.len() > 255 || value.chars().any(char::is_whitespace) {
        return false;
    }
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .map_or(false, |(host, tld)| !host.is_empty() && !tld.is_empty())
                && !domain.ends_with('.')
        }
        None => false,
    }
}

fn is_indian_mobile(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10 && matches!(bytes[0], b'6'..=b'9') && bytes.iter().all(u8::is_ascii_digit)
}
