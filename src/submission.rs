//! Submission of the aggregated assessment

use crate::client::ApiClient;
use crate::config::SubmissionConfig;
use crate::error::Result;
use crate::retry::request_with_retry;
use crate::types::AssessmentResult;
use serde_json::Value;

/// Posts an [`AssessmentResult`] to `POST /submit-assessment`
pub struct Submitter<'a> {
    client: &'a ApiClient,
    config: SubmissionConfig,
}

impl<'a> Submitter<'a> {
    /// Create a submitter over an existing client
    pub fn new(client: &'a ApiClient, config: SubmissionConfig) -> Self {
        Self { client, config }
    }

    /// Submit once, or through the client's retry policy when `retry` is enabled
    ///
    /// Returns the server's reply; the error is logged and returned, never swallowed.
    pub async fn submit(&self, result: &AssessmentResult) -> Result<Value> {
        tracing::info!(
            high_risk = result.high_risk_patients.len(),
            fever = result.fever_patients.len(),
            data_quality = result.data_quality_issues.len(),
            retry = self.config.retry,
            "Submitting assessment"
        );

        let outcome = if self.config.retry {
            request_with_retry(self.client.retry_config(), || {
                self.client.post_assessment_once(result)
            })
            .await
        } else {
            self.client.post_assessment_once(result).await
        };

        match &outcome {
            Ok(reply) => tracing::info!(reply = %reply, "Assessment submitted"),
            Err(e) => tracing::error!(error = %e, "Assessment submission failed"),
        }

        outcome
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, RetryConfig};
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> ApiClient {
        let api = ApiConfig {
            base_url: server.uri(),
            api_key: "test-key".into(),
            ..Default::default()
        };
        let retry = RetryConfig {
            max_attempts: 3,
            base_delay: Duration::from_millis(5),
            jitter: false,
        };
        ApiClient::with_retry(&api, retry).unwrap()
    }

    #[tokio::test]
    async fn test_submit_fires_once_by_default() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/submit-assessment"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let submitter = Submitter::new(&client, SubmissionConfig::default());
        let err = submitter.submit(&AssessmentResult::default()).await.unwrap_err();
        assert_eq!(err.status(), Some(503));
    }

    #[tokio::test]
    async fn test_submit_retries_when_enabled() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/submit-assessment"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/submit-assessment"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": true, "results": {"score": 91.5}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let submitter = Submitter::new(&client, SubmissionConfig { retry: true });
        let reply = submitter.submit(&AssessmentResult::default()).await.unwrap();
        assert_eq!(reply["success"], true);
    }

    #[tokio::test]
    async fn test_submit_does_not_retry_permanent_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/submit-assessment"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad payload"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let submitter = Submitter::new(&client, SubmissionConfig { retry: true });
        let err = submitter.submit(&AssessmentResult::default()).await.unwrap_err();
        assert_eq!(err.status(), Some(400));
    }
}
