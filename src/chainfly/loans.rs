use crate::chainfly::client::{segment, ApiClient};
use crate::chainfly::error::ApiResult;
use crate::chainfly::types::{LoanApplication, LoanApplicationPayload, LoanSubmitResponse};

pub struct LoansApi<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn loans(&self) -> LoansApi<'_> {
        LoansApi { client: self }
    }
}

impl LoansApi<'_> {
    pub async fn create(&self, payload: &LoanApplicationPayload) -> ApiResult<LoanApplication> {
        self.client.post("/loans", payload).await
    }

    pub async fn list(&self) -> ApiResult<Vec<LoanApplication>> {
        self.client.get("/loans").await
    }

    pub async fn get(&self, id: &str) -> ApiResult<LoanApplication> {
        self.client.get(&format!("/loans/{}", segment(id))).await
    }

    /// Partial update; unset fields are left out of the PATCH body.
    pub async fn update(
        &self,
        id: &str,
        payload: &LoanApplicationPayload,
    ) -> ApiResult<LoanApplication> {
        self.client
            .patch(&format!("/loans/{}", segment(id)), payload)
            .await
    }

    pub async fn submit(&self, id: &str) -> ApiResult<LoanSubmitResponse> {
        self.client
            .post_empty(&format!("/loans/{}/submit", segment(id)))
            .await
    }
}
