//! API client for communicating with the energy agent

use anyhow::{Context, Result};
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Error body returned by the agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Non-success response from the agent
#[derive(Debug, Error)]
#[error("API error ({status}): {message}")]
pub struct ApiError {
    pub status: u16,
    pub code: Option<String>,
    pub message: String,
}

impl ApiError {
    fn from_body(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorResponse>(body) {
            Ok(parsed) => Self {
                status,
                code: parsed.code,
                message: parsed.error,
            },
            Err(_) => Self {
                status,
                code: None,
                message: body.to_string(),
            },
        }
    }
}

/// API client for the energy agent
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// URL of `collection/{id}`, with `id` encoded as a single path segment
    pub fn item_url(&self, collection: &str, id: &str) -> Result<Url> {
        let mut url = self.base_url.join(collection).context("Invalid path")?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Invalid API URL: {}", self.base_url))?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;
        self.get_url(url).await
    }

    /// GET one item of a collection, e.g. `api/v1/energy/{instance_id}`
    pub async fn get_item<T: DeserializeOwned>(&self, collection: &str, id: &str) -> Result<T> {
        let url = self.item_url(collection, id)?;
        self.get_url(url).await
    }

    async fn get_url<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        parse_response(response).await
    }

    /// GET a health probe; a 503 still carries a JSON body worth reading
    pub async fn get_probe<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        if response.status() == StatusCode::SERVICE_UNAVAILABLE {
            return response.json().await.context("Failed to parse response");
        }
        parse_response(response).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        parse_response(response).await
    }
}

async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T> {
    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::from_body(status, &body).into());
    }

    response.json().await.context("Failed to parse response")
}

#[cfg(test)]
mod tests {
    use super::*;
    use energy_agent_lib::{AllocationDecision, RegionSustainability, WorkloadRequest};

    #[test]
    fn test_item_url_encodes_id() {
        let client = ApiClient::new("http://localhost:8000").unwrap();

        let url = client.item_url("api/v1/energy", "i-1/../x?y#z").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/api/v1/energy/i-1%2F..%2Fx%3Fy%23z"
        );

        let url = client.item_url("api/v1/sustainability", "eu-west-1").unwrap();
        assert_eq!(url.path(), "/api/v1/sustainability/eu-west-1");
    }

    #[tokio::test]
    async fn test_get_parses_json() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/sustainability/eu-west-1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"region":"eu-west-1","renewable_percentage":60.0,"carbon_intensity":200.0}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let report: RegionSustainability = client
            .get("api/v1/sustainability/eu-west-1")
            .await
            .unwrap();

        assert_eq!(report.renewable_percentage, 60.0);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_post_sends_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/workloads/allocate")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "cpu_request": 0.5,
                "priority": "high"
            })))
            .with_status(200)
            .with_body(r#"{"status":"success","allocated_instance":"i-1","energy_consumption":2.6}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let request = WorkloadRequest {
            cpu_request: 0.5,
            memory_request: "512Mi".to_string(),
            priority: "high".to_string(),
            max_energy_consumption: None,
        };
        let decision: AllocationDecision = client
            .post("api/v1/workloads/allocate", &request)
            .await
            .unwrap();

        assert_eq!(decision.allocated_instance, "i-1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_body_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/workloads/allocate")
            .with_status(503)
            .with_body(r#"{"error":"no suitable instances found for workload allocation","code":"no_candidates"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let err = client
            .post::<AllocationDecision, _>("api/v1/workloads/allocate", &serde_json::json!({}))
            .await
            .unwrap_err();

        let api_err = err.downcast_ref::<ApiError>().unwrap();
        assert_eq!(api_err.status, 503);
        assert_eq!(api_err.code.as_deref(), Some("no_candidates"));
        assert!(err.to_string().contains("no suitable instances"));
    }

    #[tokio::test]
    async fn test_plain_text_error_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/energy")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let err = client
            .get::<serde_json::Value>("api/v1/energy")
            .await
            .unwrap_err();

        let api_err = err.downcast_ref::<ApiError>().unwrap();
        assert_eq!(api_err.message, "bad gateway");
        assert!(api_err.code.is_none());
    }

    #[tokio::test]
    async fn test_probe_reads_unavailable_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/readyz")
            .with_status(503)
            .with_body(r#"{"ready":false,"reason":"Agent not yet initialized"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let readiness: energy_agent_lib::ReadinessResponse =
            client.get_probe("readyz").await.unwrap();

        assert!(!readiness.ready);
        assert_eq!(readiness.reason.as_deref(), Some("Agent not yet initialized"));
    }

    #[test]
    fn test_invalid_url_rejected() {
        assert!(ApiClient::new("not a url").is_err());
    }
}
