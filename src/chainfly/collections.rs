use crate::chainfly::client::{segment, ApiClient};
use crate::chainfly::error::ApiResult;
use crate::chainfly::types::{Mandate, MandateRequest};

/// UPI autopay mandates for EMI collection.
pub struct CollectionsApi<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn collections(&self) -> CollectionsApi<'_> {
        CollectionsApi { client: self }
    }
}

impl CollectionsApi<'_> {
    pub async fn initiate_mandate(&self, request: &MandateRequest) -> ApiResult<Mandate> {
        self.client
            .post("/collections/mandate/initiate", request)
            .await
    }

    pub async fn mandate_status(&self, mandate_id: &str) -> ApiResult<Mandate> {
        self.client
            .get(&format!("/collections/mandate/status/{}", segment(mandate_id)))
            .await
    }
}
