use crate::chainfly::client::ApiClient;
use crate::chainfly::error::ApiResult;
use crate::chainfly::types::{
    EmiCalculationRequest, EmiCalculationResponse, SubsidyCalculationRequest,
    SubsidyCalculationResponse,
};
use crate::finance::SystemType;

/// Server-side counterparts of [`crate::finance`].
pub struct CalculationsApi<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn calculations(&self) -> CalculationsApi<'_> {
        CalculationsApi { client: self }
    }
}

impl CalculationsApi<'_> {
    pub async fn emi(
        &self,
        principal: f64,
        interest_rate: f64,
        tenure_years: u32,
    ) -> ApiResult<EmiCalculationResponse> {
        let request = EmiCalculationRequest {
            principal,
            interest_rate,
            tenure_years,
        };
        self.client.post("/calculate/emi", &request).await
    }

    /// `system_type` defaults to residential.
    pub async fn subsidy(
        &self,
        system_capacity_kw: f64,
        state: &str,
        system_type: Option<SystemType>,
    ) -> ApiResult<SubsidyCalculationResponse> {
        let request = SubsidyCalculationRequest {
            system_capacity_kw,
            state: state.to_string(),
            system_type: system_type.unwrap_or_default(),
        };
        self.client.post("/calculate/subsidy", &request).await
    }
}
