use crate::chainfly::client::{segment, ApiClient};
use crate::chainfly::error::{ApiError, ApiResult};
use crate::chainfly::types::{CibilFetchRequest, CibilReport};
use std::time::Duration;
use tracing::debug;

pub struct CreditApi<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn credit(&self) -> CreditApi<'_> {
        CreditApi { client: self }
    }
}

impl CreditApi<'_> {
    /// Starts a bureau pull. The report arrives asynchronously; poll with
    /// [`CreditApi::cibil_status`] or [`CreditApi::wait_for_cibil`].
    pub async fn fetch_cibil(&self, request: &CibilFetchRequest) -> ApiResult<CibilReport> {
        self.client.post("/credit/cibil/fetch", request).await
    }

    pub async fn cibil_status(&self, job_id: &str) -> ApiResult<CibilReport> {
        self.client
            .get(&format!("/credit/cibil/status/{}", segment(job_id)))
            .await
    }

    pub async fn user_cibil(&self, user_id: &str) -> ApiResult<CibilReport> {
        self.client
            .get(&format!("/credit/cibil/{}", segment(user_id)))
            .await
    }

    /// Poll until the job reaches `completed`, `failed` or `expired`.
    /// Gives up with `ApiError::Timeout` after `max_attempts` polls.
    pub async fn wait_for_cibil(
        &self,
        job_id: &str,
        interval: Duration,
        max_attempts: u32,
    ) -> ApiResult<CibilReport> {
        for attempt in 1..=max_attempts {
            let report = self.cibil_status(job_id).await?;
            if report.status.is_terminal() {
                return Ok(report);
            }
            debug!(job_id = %job_id, attempt, status = ?report.status, "credit report pending");
            if attempt < max_attempts {
                tokio::time::sleep(interval).await;
            }
        }
        Err(ApiError::Timeout {
            url: format!("{}/credit/cibil/status/{}", self.client.base_url(), job_id),
        })
    }
}
