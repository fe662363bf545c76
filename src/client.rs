//! HTTP client for the patient API
//!
//! All requests carry the static `x-api-key` header. Non-success responses become
//! [`Error::Http`] so the retry layers can classify them by status.

use crate::config::{ApiConfig, Config, RetryConfig};
use crate::error::{Error, Result};
use crate::pagination::PatientSource;
use crate::retry::request_with_retry;
use crate::types::{AssessmentResult, PatientPage};
use async_trait::async_trait;
use serde_json::Value;
use url::Url;

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "x-api-key";

const PATIENTS_PATH: &str = "patients";
const SUBMIT_PATH: &str = "submit-assessment";

/// Client for `GET /patients` and `POST /submit-assessment`
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
    retry: RetryConfig,
}

impl ApiClient {
    /// Build a client from the full configuration
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_retry(&config.api, config.retry.clone())
    }

    /// Build a client from API settings and an explicit request-level retry policy
    pub fn with_retry(api: &ApiConfig, retry: RetryConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(api.request_timeout)
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        // Url::join replaces the last segment unless the base ends with '/'
        let mut raw = api.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base_url = Url::parse(&raw)?;

        Ok(Self {
            http,
            base_url,
            api_key: api.api_key.clone(),
            retry,
        })
    }

    /// Request-level retry policy used by [`ApiClient::fetch_page`]
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// Single `GET /patients?page=&limit=` attempt, no retry
    pub async fn get_page_once(&self, page: u32, limit: u32) -> Result<PatientPage> {
        let url = self.endpoint(PATIENTS_PATH)?;

        let response = self
            .http
            .get(url.clone())
            .header(API_KEY_HEADER, &self.api_key)
            .query(&[("page", page), ("limit", limit)])
            .send()
            .await?;

        let response = check_status(response, &url).await?;
        Ok(response.json::<PatientPage>().await?)
    }

    /// `GET /patients` wrapped in the request-level retry policy
    pub async fn fetch_page(&self, page: u32, limit: u32) -> Result<PatientPage> {
        request_with_retry(&self.retry, || self.get_page_once(page, limit)).await
    }

    /// Single `POST /submit-assessment` attempt, no retry
    ///
    /// Returns the server's JSON reply, `Value::Null` for an empty body, or the raw
    /// text as a JSON string when the body is not JSON.
    pub async fn post_assessment_once(&self, result: &AssessmentResult) -> Result<Value> {
        let url = self.endpoint(SUBMIT_PATH)?;

        let response = self
            .http
            .post(url.clone())
            .header(API_KEY_HEADER, &self.api_key)
            .json(result)
            .send()
            .await?;

        let response = check_status(response, &url).await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }
}

#[async_trait]
impl PatientSource for ApiClient {
    async fn fetch_page(&self, page: u32, limit: u32) -> Result<PatientPage> {
        ApiClient::fetch_page(self, page, limit).await
    }
}

async fn check_status(response: reqwest::Response, url: &Url) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.ok().filter(|b| !b.is_empty());
    Err(Error::Http {
        status: status.as_u16(),
        url: url.to_string(),
        body,
    })
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> ApiClient {
        let api = ApiConfig {
            base_url: server.uri(),
            api_key: "test-key".into(),
            request_timeout: Duration::from_secs(5),
        };
        let retry = RetryConfig {
            max_attempts: 5,
            base_delay: Duration::from_millis(5),
            jitter: false,
        };
        ApiClient::with_retry(&api, retry).unwrap()
    }

    fn page_body(ids: &[&str], has_next: bool) -> Value {
        let data: Vec<Value> = ids
            .iter()
            .map(|id| json!({"patient_id": id, "blood_pressure": "120/80", "temperature": 98.6, "age": 40}))
            .collect();
        json!({"data": data, "pagination": {"hasNext": has_next}})
    }

    #[tokio::test]
    async fn test_get_page_sends_key_and_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/patients"))
            .and(query_param("page", "2"))
            .and(query_param("limit", "5"))
            .and(header(API_KEY_HEADER, "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&["A", "B"], true)))
            .expect(1)
            .mount(&server)
            .await;

        let page = test_client(&server).get_page_once(2, 5).await.unwrap();
        assert_eq!(page.data.len(), 2);
        assert!(page.pagination.has_next);
    }

    #[tokio::test]
    async fn test_base_url_path_is_preserved() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/patients"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&["A"], false)))
            .expect(1)
            .mount(&server)
            .await;

        let api = ApiConfig {
            base_url: format!("{}/api", server.uri()),
            api_key: "k".into(),
            ..Default::default()
        };
        let client = ApiClient::with_retry(&api, RetryConfig::default()).unwrap();
        let page = client.get_page_once(1, 5).await.unwrap();
        assert_eq!(page.data[0].patient_id, "A");
    }

    #[tokio::test]
    async fn test_fetch_page_retries_503_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/patients"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/patients"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&["A"], false)))
            .expect(1)
            .mount(&server)
            .await;

        let page = test_client(&server).fetch_page(1, 5).await.unwrap();
        assert_eq!(page.data[0].patient_id, "A");
        // MockServer verifies the 2 + 1 expectations on drop
    }

    #[tokio::test]
    async fn test_fetch_page_404_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/patients"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .expect(1)
            .mount(&server)
            .await;

        let err = test_client(&server).fetch_page(1, 5).await.unwrap_err();
        match err {
            Error::Http { status, body, .. } => {
                assert_eq!(status, 404);
                assert_eq!(body.as_deref(), Some("not found"));
            }
            other => panic!("Expected Http error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_page_surfaces_last_transient_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/patients"))
            .respond_with(ResponseTemplate::new(429))
            .expect(5)
            .mount(&server)
            .await;

        let err = test_client(&server).fetch_page(1, 5).await.unwrap_err();
        assert_eq!(err.status(), Some(429));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_post_assessment_sends_payload() {
        let server = MockServer::start().await;
        let mut result = AssessmentResult::default();
        result.high_risk_patients.insert("DEMO001".into());
        result.data_quality_issues.insert("DEMO004".into());

        Mock::given(method("POST"))
            .and(path("/submit-assessment"))
            .and(header(API_KEY_HEADER, "test-key"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({
                "high_risk_patients": ["DEMO001"],
                "fever_patients": [],
                "data_quality_issues": ["DEMO004"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        let reply = test_client(&server).post_assessment_once(&result).await.unwrap();
        assert_eq!(reply["success"], true);
    }

    #[tokio::test]
    async fn test_post_assessment_non_json_and_empty_replies() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/submit-assessment"))
            .respond_with(ResponseTemplate::new(200).set_body_string("accepted"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/submit-assessment"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let result = AssessmentResult::default();
        assert_eq!(
            client.post_assessment_once(&result).await.unwrap(),
            Value::String("accepted".into())
        );
        assert_eq!(client.post_assessment_once(&result).await.unwrap(), Value::Null);
    }
}
