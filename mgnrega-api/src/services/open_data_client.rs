//! data.gov.in open-data API client

use async_trait::async_trait;
use mgnrega_common::config::OpenDataConfig;
use serde_json::Value;
use std::time::Duration;

use super::{OpenDataSource, RecordQuery, UpstreamError};

/// Client for the MGNREGA district-wise resource on data.gov.in
pub struct OpenDataClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl OpenDataClient {
    pub fn new(config: &OpenDataConfig, timeout: Duration) -> Result<Self, UpstreamError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: resource_url(&config.base_url, &config.resource_id),
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn resource_url(base_url: &str, resource_id: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), resource_id)
}

/// Query-string parameters for a record query (API key excluded)
pub fn query_params(query: &RecordQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("format", "json".to_string()),
        ("filters[state_name]", query.state.clone()),
    ];
    if let Some(district) = &query.district {
        params.push(("filters[district_name]", district.clone()));
    }
    params.push(("limit", query.limit.to_string()));
    params.push(("offset", query.offset.to_string()));
    params
}

#[async_trait]
impl OpenDataSource for OpenDataClient {
    async fn fetch_records(&self, query: &RecordQuery) -> Result<Value, UpstreamError> {
        let params = query_params(query);

        tracing::debug!(
            url = %self.endpoint,
            state = %query.state,
            district = ?query.district,
            limit = query.limit,
            offset = query.offset,
            "Querying open-data API"
        );

        let mut request = self
            .http_client
            .get(&self.endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&params);
        if let Some(key) = &self.api_key {
            request = request.query(&[("api-key", key)]);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), body = %body, "Open-data API request failed");
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: Value = response
            .json()
            .await
            .map_err(|e| UpstreamError::Parse(e.to_string()))?;

        let rows = envelope
            .get("records")
            .and_then(Value::as_array)
            .map(Vec::len)
            .unwrap_or(0);
        tracing::info!(
            state = %query.state,
            district = ?query.district,
            rows,
            "Retrieved records from open-data API"
        );

        Ok(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> OpenDataConfig {
        OpenDataConfig {
            base_url: "https://api.data.gov.in/resource/".to_string(),
            resource_id: "abc-123".to_string(),
            api_key: Some("secret".to_string()),
            district_fetch_limit: 100,
        }
    }

    #[test]
    fn test_client_creation() {
        let client = OpenDataClient::new(&config(), Duration::from_secs(15)).unwrap();
        assert_eq!(client.endpoint(), "https://api.data.gov.in/resource/abc-123");
    }

    #[test]
    fn test_query_params_with_district() {
        let params = query_params(&RecordQuery {
            state: "BIHAR".to_string(),
            district: Some("PURBI CHAMPARAN".to_string()),
            limit: 100,
            offset: 0,
        });
        assert_eq!(
            params,
            vec![
                ("format", "json".to_string()),
                ("filters[state_name]", "BIHAR".to_string()),
                ("filters[district_name]", "PURBI CHAMPARAN".to_string()),
                ("limit", "100".to_string()),
                ("offset", "0".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_params_without_district() {
        let params = query_params(&RecordQuery {
            state: "BIHAR".to_string(),
            district: None,
            limit: 10,
            offset: 20,
        });
        assert!(params.iter().all(|(k, _)| *k != "filters[district_name]"));
        assert!(params.contains(&("offset", "20".to_string())));
    }

    #[tokio::test]
    async fn test_stalled_upstream_times_out() {
        // Accept connections and never answer
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let config = OpenDataConfig {
            base_url: format!("http://{address}"),
            api_key: None,
            ..config()
        };
        let client = OpenDataClient::new(&config, Duration::from_millis(50)).unwrap();
        let result = client
            .fetch_records(&RecordQuery {
                state: "BIHAR".to_string(),
                district: Some("PATNA".to_string()),
                limit: 100,
                offset: 0,
            })
            .await;

        assert!(matches!(result, Err(UpstreamError::Timeout)), "got {result:?}");
        server.abort();
    }
}
