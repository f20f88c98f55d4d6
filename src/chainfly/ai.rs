use crate::chainfly::client::{segment, ApiClient};
use crate::chainfly::error::ApiResult;
use crate::chainfly::types::{
    AngleOptimizationRequest, BatchScoreRequest, EligibilityRequest, PrequalRequest,
    RoiPredictionRequest, SimulateRequest,
};
use serde_json::Value;

/// Model endpoints. Responses are model-specific and returned as JSON.
pub struct AiApi<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn ai(&self) -> AiApi<'_> {
        AiApi { client: self }
    }
}

impl AiApi<'_> {
    pub async fn eligibility(&self, request: &EligibilityRequest) -> ApiResult<Value> {
        self.client.post("/ai/eligibility", request).await
    }

    pub async fn roi_prediction(&self, request: &RoiPredictionRequest) -> ApiResult<Value> {
        self.client.post("/ai/roi-prediction", request).await
    }

    pub async fn angle_optimization(&self, request: &AngleOptimizationRequest) -> ApiResult<Value> {
        self.client.post("/ai/angle-optimization", request).await
    }

    pub async fn prequal(&self, request: &PrequalRequest) -> ApiResult<Value> {
        self.client.post("/ai/prequal", request).await
    }

    /// `prediction_type` defaults to `eligibility`.
    pub async fn explain(&self, loan_id: &str, prediction_type: Option<&str>) -> ApiResult<Value> {
        let prediction_type = prediction_type.unwrap_or("eligibility");
        self.client
            .get(&format!(
                "/ai/explain/{}?prediction_type={}",
                segment(loan_id),
                urlencoding::encode(prediction_type)
            ))
            .await
    }

    pub async fn simulate(&self, request: &SimulateRequest) -> ApiResult<Value> {
        self.client.post("/ai/simulate", request).await
    }

    pub async fn batch_score(&self, request: &BatchScoreRequest) -> ApiResult<Value> {
        self.client.post("/ai/batch-score", request).await
    }

    pub async fn batch_score_status(&self, job_id: &str) -> ApiResult<Value> {
        self.client
            .get(&format!("/ai/batch-score/{}/status", segment(job_id)))
            .await
    }
}
