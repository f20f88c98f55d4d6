use crate::chainfly::client::{segment, ApiClient};
use bytes::Bytes;

pub struct ReportsApi<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn reports(&self) -> ReportsApi<'_> {
        ReportsApi { client: self }
    }
}

impl ReportsApi<'_> {
    /// Loan report PDF; `None` when it could not be fetched for any reason.
    pub async fn pdf(&self, loan_id: &str) -> Option<Bytes> {
        self.client
            .fetch_bytes(&format!("/report/{}/pdf", segment(loan_id)))
            .await
    }
}
