use crate::chainfly::client::{segment, ApiClient};
use crate::chainfly::error::ApiResult;
use crate::chainfly::types::{
    AadhaarXmlRequest, BankVerificationRequest, KycRecord, KycStatus, PanVerificationRequest,
};
use serde_json::json;

pub struct KycApi<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn kyc(&self) -> KycApi<'_> {
        KycApi { client: self }
    }
}

impl KycApi<'_> {
    pub async fn verify_aadhaar_xml(&self, request: &AadhaarXmlRequest) -> ApiResult<KycRecord> {
        self.client.post("/kyc/aadhaar-xml", request).await
    }

    pub async fn verify_pan(&self, request: &PanVerificationRequest) -> ApiResult<KycRecord> {
        self.client.post("/kyc/pan", request).await
    }

    pub async fn verify_bank(&self, request: &BankVerificationRequest) -> ApiResult<KycRecord> {
        self.client.post("/kyc/bank", request).await
    }

    /// Central KYC registry lookup by PAN. The loan id travels as a query
    /// parameter.
    pub async fn ckyc_search(
        &self,
        pan: &str,
        loan_application_id: Option<&str>,
    ) -> ApiResult<KycRecord> {
        let path = match loan_application_id {
            Some(id) => format!(
                "/kyc/ckyc-search?loan_application_id={}",
                urlencoding::encode(id)
            ),
            None => "/kyc/ckyc-search".to_string(),
        };
        self.client.post(&path, &json!({ "pan": pan })).await
    }

    pub async fn status(&self, user_id: &str) -> ApiResult<KycStatus> {
        self.client
            .get(&format!("/kyc/status/{}", segment(user_id)))
            .await
    }
}
