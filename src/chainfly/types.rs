//! Wire types for the ChainFly backend.
//!
//! Responses that are vendor- or model-shaped (KYC verification results,
//! AI predictions) stay `serde_json::Value` at the call site; the types here
//! cover what the client itself reads.

use crate::finance::SystemType;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// Decimal columns arrive as JSON strings ("3099.64") or numbers depending on
// the backend's serializer.
#[derive(Deserialize)]
#[serde(untagged)]
enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    fn into_f64<E: serde::de::Error>(self) -> Result<f64, E> {
        match self {
            Numeric::Number(n) => Ok(n),
            Numeric::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("expected a decimal, got {s:?}"))),
        }
    }
}

fn decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Numeric::deserialize(deserializer)?.into_f64()
}

fn optional_decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Option::<Numeric>::deserialize(deserializer)?
        .map(Numeric::into_f64)
        .transpose()
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub last_login: Option<String>,
}

// ---------------------------------------------------------------------------
// Loans
// ---------------------------------------------------------------------------

/// Create/update payload. Every field but `loan_amount` is optional on
/// create; on update all are.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoanApplicationPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pan_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aadhaar_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pincode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_income: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_loans: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_capacity_kw: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roof_area_sqft: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roof_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installation_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_tenure_years: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub current_step: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "optional_decimal")]
    pub loan_amount: Option<f64>,
    #[serde(default)]
    pub loan_tenure_years: Option<u32>,
    #[serde(default, deserialize_with = "optional_decimal")]
    pub interest_rate: Option<f64>,
    #[serde(default, deserialize_with = "optional_decimal")]
    pub system_capacity_kw: Option<f64>,
    #[serde(default, deserialize_with = "optional_decimal")]
    pub subsidy_amount: Option<f64>,
    #[serde(default, deserialize_with = "optional_decimal")]
    pub emi_amount: Option<f64>,
    #[serde(default, deserialize_with = "optional_decimal")]
    pub ai_eligibility_score: Option<f64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub submitted_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanSubmitResponse {
    pub loan_id: String,
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub workflow_steps: Vec<String>,
}

// ---------------------------------------------------------------------------
// KYC
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct AadhaarXmlRequest {
    /// Base64 encoded offline e-KYC XML.
    pub xml_content: String,
    pub share_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_application_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PanVerificationRequest {
    pub pan: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_application_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BankVerificationRequest {
    pub account_number: String,
    pub ifsc: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_application_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KycRecord {
    pub id: String,
    pub kyc_type: String,
    pub status: String,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub verification_result: Option<Value>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KycStatus {
    pub user_id: String,
    #[serde(default)]
    pub kyc_records: Vec<KycRecord>,
    pub overall_status: String,
}

// ---------------------------------------------------------------------------
// Credit bureau
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct CibilFetchRequest {
    pub pan: String,
    pub consent_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_application_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Expired,
}

impl CreditStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CreditStatus::Completed | CreditStatus::Failed | CreditStatus::Expired
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CibilReport {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub job_id: Option<String>,
    pub status: CreditStatus,
    #[serde(default, deserialize_with = "optional_decimal")]
    pub credit_score: Option<f64>,
    #[serde(default)]
    pub credit_rating: Option<String>,
    #[serde(default)]
    pub report_summary: Option<Value>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
}

// ---------------------------------------------------------------------------
// AI
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct EligibilityRequest {
    pub loan_application_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoiPredictionRequest {
    pub loan_application_id: String,
    pub system_capacity_kw: f64,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roof_angle: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AngleOptimizationRequest {
    pub loan_application_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub roof_area_sqft: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrequalRequest {
    pub annual_income: f64,
    pub existing_loans: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit_score: Option<f64>,
    pub loan_amount: f64,
    pub loan_tenure_years: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulateRequest {
    pub loan_application_id: String,
    pub scenarios: Vec<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchScoreRequest {
    pub loan_ids: Vec<String>,
    pub prediction_type: String,
}

// ---------------------------------------------------------------------------
// Calculations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmiCalculationRequest {
    pub principal: f64,
    pub interest_rate: f64,
    pub tenure_years: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmiCalculationResponse {
    #[serde(deserialize_with = "decimal")]
    pub emi_amount: f64,
    #[serde(deserialize_with = "decimal")]
    pub total_amount: f64,
    #[serde(deserialize_with = "decimal")]
    pub total_interest: f64,
    #[serde(deserialize_with = "decimal")]
    pub principal: f64,
    #[serde(deserialize_with = "decimal")]
    pub interest_rate: f64,
    pub tenure_years: u32,
    pub tenure_months: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsidyCalculationRequest {
    pub system_capacity_kw: f64,
    pub state: String,
    #[serde(default)]
    pub system_type: SystemType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsidyCalculationResponse {
    #[serde(deserialize_with = "decimal")]
    pub subsidy_amount: f64,
    #[serde(deserialize_with = "decimal")]
    pub central_subsidy: f64,
    #[serde(deserialize_with = "decimal")]
    pub state_subsidy: f64,
    #[serde(deserialize_with = "decimal")]
    pub system_capacity_kw: f64,
    pub state: String,
    pub system_type: SystemType,
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Aadhaar,
    Pan,
    BankStatement,
    IncomeProof,
    AddressProof,
    RoofPhoto,
    Other,
}

impl DocumentType {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentType::Aadhaar => "aadhaar",
            DocumentType::Pan => "pan",
            DocumentType::BankStatement => "bank_statement",
            DocumentType::IncomeProof => "income_proof",
            DocumentType::AddressProof => "address_proof",
            DocumentType::RoofPhoto => "roof_photo",
            DocumentType::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub document_type: DocumentType,
    pub file_name: String,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    pub status: String,
    #[serde(default)]
    pub ocr_data: Option<Value>,
    #[serde(default)]
    pub ocr_confidence: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrResult {
    #[serde(default)]
    pub extracted_fields: Value,
    #[serde(deserialize_with = "decimal")]
    pub confidence: f64,
    #[serde(default)]
    pub raw_text: Option<String>,
}

// ---------------------------------------------------------------------------
// Collections (UPI autopay mandates)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct MandateRequest {
    pub amount: f64,
    /// `MONTHLY`, `WEEKLY`, ...
    pub frequency: String,
    pub start_date: String,
    pub end_date: String,
    pub payer_name: String,
    pub payer_account: String,
    pub payer_ifsc: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mandate {
    pub mandate_id: String,
    pub status: String,
    #[serde(default)]
    pub data: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decimals_accept_strings_and_numbers() {
        let resp: EmiCalculationResponse = serde_json::from_value(json!({
            "emi_amount": "3099.64",
            "total_amount": 371957.07,
            "total_interest": "121957.07",
            "principal": "250000",
            "interest_rate": "8.5",
            "tenure_years": 10,
            "tenure_months": 120
        }))
        .unwrap();
        assert_eq!(resp.emi_amount, 3099.64);
        assert_eq!(resp.total_amount, 371957.07);

        let bad = serde_json::from_value::<EmiCalculationResponse>(json!({
            "emi_amount": "abc", "total_amount": 0, "total_interest": 0,
            "principal": 0, "interest_rate": 0, "tenure_years": 1, "tenure_months": 12
        }));
        assert!(bad.is_err());
    }

    #[test]
    fn loan_tolerates_missing_and_null_amounts() {
        let loan: LoanApplication = serde_json::from_value(json!({
            "id": "L1",
            "status": "draft",
            "loan_amount": "250000.00",
            "emi_amount": null
        }))
        .unwrap();
        assert_eq!(loan.loan_amount, Some(250_000.0));
        assert_eq!(loan.emi_amount, None);
        assert_eq!(loan.interest_rate, None);
    }

    #[test]
    fn payload_omits_unset_fields() {
        let payload = LoanApplicationPayload {
            loan_amount: Some(100_000.0),
            loan_tenure_years: Some(5),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({ "loan_amount": 100000.0, "loan_tenure_years": 5 })
        );
    }

    #[test]
    fn credit_status_terminal_states() {
        let report: CibilReport =
            serde_json::from_value(json!({ "status": "in_progress", "job_id": "j" })).unwrap();
        assert!(!report.status.is_terminal());
        for s in ["completed", "failed", "expired"] {
            let status: CreditStatus = serde_json::from_value(json!(s)).unwrap();
            assert!(status.is_terminal());
        }
    }

    #[test]
    fn document_type_wire_names() {
        assert_eq!(
            serde_json::to_value(DocumentType::BankStatement).unwrap(),
            json!(DocumentType::BankStatement.as_str())
        );
    }
}
