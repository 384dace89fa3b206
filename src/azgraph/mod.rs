//! Azure Resource Graph listing.
//!
//! The resource-group and query scope strategies discover resources by
//! sending KQL to the Resource Graph REST endpoint. `ResourceGraphClient`
//! is the seam the strategies depend on; `RestResourceGraphClient` is the
//! production implementation with bearer-token auth and skip-token paging.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cancel::CancelToken;
use crate::error::{DiscoveryError, DiscoveryResult};

const RESOURCE_GRAPH_ENDPOINT: &str =
    "https://management.azure.com/providers/Microsoft.ResourceGraph/resources?api-version=2022-10-01";

/// One row of a Resource Graph result. The raw row doubles as the
/// resource's properties document downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphRow {
    pub id: String,
    pub data: Value,
}

/// Trait for listing resources through Azure Resource Graph
pub trait ResourceGraphClient: Send + Sync {
    fn list_resources(&self, query: &str, cancel: &CancelToken) -> DiscoveryResult<Vec<GraphRow>>;
}

/// HTTP client trait for testing
pub trait HttpClient: Send + Sync {
    fn post_json(&self, url: &str, bearer_token: &str, body: &Value) -> DiscoveryResult<String>;
}

/// Real HTTP client using reqwest
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl Default for ReqwestClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for ReqwestClient {
    fn post_json(&self, url: &str, bearer_token: &str, body: &Value) -> DiscoveryResult<String> {
        let response = self
            .client
            .post(url)
            .bearer_auth(bearer_token)
            .json(body)
            .send()
            .map_err(|err| {
                DiscoveryError::ResourceGraph(format!("requesting {}: {}", url, err))
            })?;

        let status = response.status();
        let text = response.text().map_err(|err| {
            DiscoveryError::ResourceGraph(format!("reading response body: {}", err))
        })?;
        if !status.is_success() {
            return Err(DiscoveryError::ResourceGraph(format!(
                "status {}: {}",
                status, text
            )));
        }
        Ok(text)
    }
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    subscriptions: Vec<&'a str>,
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<QueryOptions<'a>>,
}

#[derive(Debug, Serialize)]
struct QueryOptions<'a> {
    #[serde(rename = "$skipToken")]
    skip_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    data: Vec<Value>,
    #[serde(rename = "$skipToken")]
    skip_token: Option<String>,
}

/// Resource Graph client over the REST endpoint
pub struct RestResourceGraphClient<H: HttpClient> {
    subscription_id: String,
    access_token: String,
    http_client: H,
}

impl RestResourceGraphClient<ReqwestClient> {
    /// Create a new client with the default HTTP client
    pub fn new(subscription_id: &str, access_token: &str) -> Self {
        Self {
            subscription_id: subscription_id.to_string(),
            access_token: access_token.to_string(),
            http_client: ReqwestClient::new(),
        }
    }
}

impl<H: HttpClient> RestResourceGraphClient<H> {
    /// Create a new client with a custom HTTP client (for testing)
    pub fn with_client(subscription_id: &str, access_token: &str, client: H) -> Self {
        Self {
            subscription_id: subscription_id.to_string(),
            access_token: access_token.to_string(),
            http_client: client,
        }
    }
}

impl<H: HttpClient> ResourceGraphClient for RestResourceGraphClient<H> {
    fn list_resources(&self, query: &str, cancel: &CancelToken) -> DiscoveryResult<Vec<GraphRow>> {
        let mut rows = Vec::new();
        let mut skip_token: Option<String> = None;

        loop {
            if cancel.is_cancelled() {
                return Err(DiscoveryError::Cancelled);
            }

            let request = QueryRequest {
                subscriptions: vec![self.subscription_id.as_str()],
                query,
                options: skip_token
                    .as_deref()
                    .map(|token| QueryOptions { skip_token: token }),
            };
            let body = serde_json::to_value(&request)?;
            let text = self
                .http_client
                .post_json(RESOURCE_GRAPH_ENDPOINT, &self.access_token, &body)?;
            let response: QueryResponse = serde_json::from_str(&text).map_err(|err| {
                DiscoveryError::ResourceGraph(format!("decoding response: {}", err))
            })?;

            for row in response.data {
                let id = row
                    .get("id")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        DiscoveryError::ResourceGraph(
                            "result row is missing the id field".to_string(),
                        )
                    })?
                    .to_string();
                rows.push(GraphRow { id, data: row });
            }

            match response.skip_token {
                Some(token) => skip_token = Some(token),
                None => break,
            }
        }

        Ok(rows)
    }
}

/// Mock graph client for testing: answers a fixed row set for any query
/// and records the queries it was asked.
#[cfg(test)]
pub struct MockResourceGraphClient {
    rows: Vec<GraphRow>,
    error: Option<String>,
    queries: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
#[allow(dead_code)]
impl MockResourceGraphClient {
    pub fn with_rows(rows: Vec<GraphRow>) -> Self {
        Self {
            rows,
            error: None,
            queries: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn with_error(error: &str) -> Self {
        Self {
            rows: Vec::new(),
            error: Some(error.to_string()),
            queries: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// The queries received so far, in order
    pub fn recorded_queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl ResourceGraphClient for MockResourceGraphClient {
    fn list_resources(&self, query: &str, cancel: &CancelToken) -> DiscoveryResult<Vec<GraphRow>> {
        self.queries.lock().unwrap().push(query.to_string());
        if cancel.is_cancelled() {
            return Err(DiscoveryError::Cancelled);
        }
        if let Some(error) = &self.error {
            return Err(DiscoveryError::ResourceGraph(error.clone()));
        }
        Ok(self.rows.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct MockHttpClient {
        responses: Mutex<VecDeque<Result<String, String>>>,
        requests: Mutex<Vec<Value>>,
    }

    impl MockHttpClient {
        fn with_responses(responses: Vec<Result<String, String>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn recorded_requests(&self) -> Vec<Value> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl HttpClient for &MockHttpClient {
        fn post_json(&self, _url: &str, _token: &str, body: &Value) -> DiscoveryResult<String> {
            self.requests.lock().unwrap().push(body.clone());
            match self.responses.lock().unwrap().pop_front() {
                Some(Ok(response)) => Ok(response),
                Some(Err(error)) => Err(DiscoveryError::ResourceGraph(error)),
                None => Err(DiscoveryError::ResourceGraph(
                    "no response configured".to_string(),
                )),
            }
        }
    }

    fn page(ids: &[&str], skip_token: Option<&str>) -> String {
        let data: Vec<Value> = ids
            .iter()
            .map(|id| json!({ "id": id, "name": "n", "properties": {} }))
            .collect();
        let mut body = json!({ "data": data });
        if let Some(token) = skip_token {
            body["$skipToken"] = json!(token);
        }
        body.to_string()
    }

    #[test]
    fn test_list_resources_follows_skip_tokens() {
        let http = MockHttpClient::with_responses(vec![
            Ok(page(&["/id-1", "/id-2"], Some("token-1"))),
            Ok(page(&["/id-3"], None)),
        ]);
        let client = RestResourceGraphClient::with_client("sub-1", "token", &http);

        let rows = client
            .list_resources("resources | where true", &CancelToken::new())
            .unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].id, "/id-1");
        assert_eq!(rows[2].id, "/id-3");

        let requests = http.recorded_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0]["subscriptions"], json!(["sub-1"]));
        assert_eq!(requests[0]["query"], json!("resources | where true"));
        assert!(requests[0].get("options").is_none());
        assert_eq!(requests[1]["options"]["$skipToken"], json!("token-1"));
    }

    #[test]
    fn test_list_resources_keeps_raw_rows() {
        let http = MockHttpClient::with_responses(vec![Ok(page(&["/id-1"], None))]);
        let client = RestResourceGraphClient::with_client("sub-1", "token", &http);

        let rows = client.list_resources("resources", &CancelToken::new()).unwrap();

        assert_eq!(rows[0].data["name"], json!("n"));
        assert!(rows[0].data.get("properties").is_some());
    }

    #[test]
    fn test_list_resources_rejects_rows_without_id() {
        let http = MockHttpClient::with_responses(vec![Ok(
            json!({ "data": [{ "name": "no-id" }] }).to_string()
        )]);
        let client = RestResourceGraphClient::with_client("sub-1", "token", &http);

        let err = client
            .list_resources("resources", &CancelToken::new())
            .unwrap_err();

        assert!(matches!(err, DiscoveryError::ResourceGraph(_)));
    }

    #[test]
    fn test_list_resources_propagates_http_errors() {
        let http =
            MockHttpClient::with_responses(vec![Err("connection refused".to_string())]);
        let client = RestResourceGraphClient::with_client("sub-1", "token", &http);

        let err = client
            .list_resources("resources", &CancelToken::new())
            .unwrap_err();

        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_list_resources_rejects_cancelled_token_before_any_request() {
        let http = MockHttpClient::with_responses(vec![Ok(page(&["/id-1"], None))]);
        let client = RestResourceGraphClient::with_client("sub-1", "token", &http);
        let cancel = CancelToken::new();
        cancel.cancel();

        let err = client.list_resources("resources", &cancel).unwrap_err();

        assert!(matches!(err, DiscoveryError::Cancelled));
        assert!(http.recorded_requests().is_empty());
    }

    #[test]
    fn test_malformed_response_is_a_graph_error() {
        let http = MockHttpClient::with_responses(vec![Ok("not json".to_string())]);
        let client = RestResourceGraphClient::with_client("sub-1", "token", &http);

        let err = client
            .list_resources("resources", &CancelToken::new())
            .unwrap_err();

        assert!(matches!(err, DiscoveryError::ResourceGraph(_)));
        assert!(err.to_string().contains("decoding response"));
    }
}
