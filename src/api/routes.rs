use axum::{
    routing::{get, post},
    Router,
};

use crate::core::AppState;

pub fn router() -> Router<AppState> {
    // The backend mounts calculations under /api; the bare paths are kept
    // for clients configured with the server root as base URL.
    Router::new()
        .route("/api/health", get(health::health))
        .merge(calculate())
        .nest("/api", calculate())
}

fn calculate() -> Router<AppState> {
    Router::new()
        .route("/calculate/emi", post(calculate::emi))
        .route("/calculate/subsidy", post(calculate::subsidy))
        .route("/calculate/roi", post(calculate::roi))
}

mod health {
    use axum::Json;
    use serde_json::{json, Value};

    pub async fn health() -> Json<Value> {
        Json(json!({ "status": "ok", "service": "chainfly-calculations" }))
    }
}

mod calculate {
    use axum::{
        extract::{rejection::JsonRejection, State},
        http::StatusCode,
        Json,
    };
    use serde_json::{json, Value};
    use tracing::debug;

    use crate::chainfly::types::{
        EmiCalculationRequest, EmiCalculationResponse, SubsidyCalculationRequest,
        SubsidyCalculationResponse,
    };
    use crate::core::AppState;
    use crate::finance::{
        roi_projection, round_to_paise, EmiBreakdown, EmiParameters, RoiInputs, RoiProjection,
        Tenure,
    };

    /// Errors use the backend's `{"detail": ...}` shape.
    type Failure = (StatusCode, Json<Value>);

    fn bad_request(message: impl std::fmt::Display) -> Failure {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": message.to_string() })),
        )
    }

    fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Failure> {
        payload
            .map(|Json(v)| v)
            .map_err(|e| bad_request(e.body_text()))
    }

    pub async fn emi(
        payload: Result<Json<EmiCalculationRequest>, JsonRejection>,
    ) -> Result<Json<EmiCalculationResponse>, Failure> {
        let req = body(payload)?;
        let params = EmiParameters::new(
            req.principal,
            req.interest_rate,
            Tenure::Years(req.tenure_years),
        );
        let b = EmiBreakdown::compute(&params).map_err(bad_request)?;
        debug!(principal = req.principal, emi = b.monthly_installment, "emi calculated");

        Ok(Json(EmiCalculationResponse {
            emi_amount: round_to_paise(b.monthly_installment),
            total_amount: round_to_paise(b.total_payment),
            total_interest: round_to_paise(b.total_interest),
            principal: req.principal,
            interest_rate: req.interest_rate,
            tenure_years: req.tenure_years,
            tenure_months: b.tenure_months,
        }))
    }

    pub async fn subsidy(
        State(state): State<AppState>,
        payload: Result<Json<SubsidyCalculationRequest>, JsonRejection>,
    ) -> Result<Json<SubsidyCalculationResponse>, Failure> {
        let req = body(payload)?;
        let b = state
            .subsidy
            .breakdown(req.system_capacity_kw, Some(&req.state), req.system_type)
            .map_err(bad_request)?;

        Ok(Json(SubsidyCalculationResponse {
            subsidy_amount: round_to_paise(b.subsidy_amount),
            central_subsidy: round_to_paise(b.central_subsidy),
            state_subsidy: round_to_paise(b.state_subsidy),
            system_capacity_kw: b.system_capacity_kw,
            state: req.state,
            system_type: b.system_type,
        }))
    }

    pub async fn roi(
        payload: Result<Json<RoiInputs>, JsonRejection>,
    ) -> Result<Json<RoiProjection>, Failure> {
        let inputs = body(payload)?;
        roi_projection(&inputs).map(Json).map_err(bad_request)
    }
}
