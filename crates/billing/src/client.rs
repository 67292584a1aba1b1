//! Hasura GraphQL client

use std::time::Duration;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BillingError, BillingResult};

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Hasura connection settings
#[derive(Debug, Clone)]
pub struct HasuraConfig {
    /// GraphQL endpoint, e.g. `https://hasura.example.com/v1/graphql`
    pub endpoint: String,
    /// Sent as `x-hasura-admin-secret` when set
    pub admin_secret: Option<String>,
    pub timeout: Duration,
}

impl HasuraConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            admin_secret: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_admin_secret(mut self, secret: impl Into<String>) -> Self {
        self.admin_secret = Some(secret.into());
        self
    }

    /// Load from `HASURA_GRAPHQL_URL`, `HASURA_ADMIN_SECRET` and `HASURA_TIMEOUT_SECS`
    pub fn from_env() -> BillingResult<Self> {
        let endpoint = std::env::var("HASURA_GRAPHQL_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| BillingError::Config("HASURA_GRAPHQL_URL not set".to_string()))?;

        let admin_secret = std::env::var("HASURA_ADMIN_SECRET")
            .ok()
            .filter(|v| !v.is_empty());

        let timeout_secs = match std::env::var("HASURA_TIMEOUT_SECS") {
            Ok(raw) => raw.parse::<u64>().map_err(|_| {
                BillingError::Config(format!("HASURA_TIMEOUT_SECS is not a number: {}", raw))
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            endpoint,
            admin_secret,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

#[derive(Serialize)]
struct GraphQlRequest<'a, V> {
    query: &'a str,
    variables: &'a V,
    #[serde(rename = "operationName")]
    operation_name: &'a str,
}

#[derive(Deserialize)]
struct GraphQlResponse {
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

/// Thin wrapper over `reqwest` that posts GraphQL operations to Hasura
///
/// Every call goes to the network; nothing is cached and nothing is retried.
#[derive(Clone)]
pub struct HasuraClient {
    http: reqwest::Client,
    config: HasuraConfig,
}

impl HasuraClient {
    pub fn new(config: HasuraConfig) -> BillingResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BillingError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    pub fn from_env() -> BillingResult<Self> {
        Self::new(HasuraConfig::from_env()?)
    }

    /// Run a query or mutation and decode its `data` into `T`
    pub async fn execute<V, T>(
        &self,
        operation_name: &str,
        query: &str,
        variables: &V,
    ) -> BillingResult<T>
    where
        V: Serialize,
        T: DeserializeOwned,
    {
        tracing::debug!(operation = operation_name, "Executing Hasura operation");

        let mut request = self.http.post(&self.config.endpoint).json(&GraphQlRequest {
            query,
            variables,
            operation_name,
        });
        if let Some(secret) = &self.config.admin_secret {
            request = request.header("x-hasura-admin-secret", secret);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                operation = operation_name,
                status = %status,
                "Hasura returned non-success status"
            );
            return Err(BillingError::Transport(format!("HTTP {}: {}", status, body)));
        }

        let parsed: GraphQlResponse = serde_json::from_str(&body).map_err(|e| {
            BillingError::MalformedResponse(format!(
                "{}: body is not a GraphQL response: {}",
                operation_name, e
            ))
        })?;

        if !parsed.errors.is_empty() {
            let messages: Vec<String> = parsed.errors.into_iter().map(|e| e.message).collect();
            tracing::warn!(
                operation = operation_name,
                errors = ?messages,
                "Hasura returned GraphQL errors"
            );
            return Err(BillingError::GraphQl(messages));
        }

        let data = parsed.data.ok_or_else(|| {
            BillingError::MalformedResponse(format!("{}: response has no data", operation_name))
        })?;

        serde_json::from_value(data).map_err(|e| {
            BillingError::MalformedResponse(format!(
                "{}: unexpected data shape: {}",
                operation_name, e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;
    use serial_test::serial;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Ping {
        ping: String,
    }

    async fn client_for(server: &mockito::ServerGuard) -> HasuraClient {
        HasuraClient::new(HasuraConfig::new(format!("{}/v1/graphql", server.url()))).unwrap()
    }

    #[tokio::test]
    async fn test_execute_decodes_data() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/graphql")
            .match_body(Matcher::PartialJson(json!({
                "operationName": "Ping",
                "variables": { "id": 1 }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":{"ping":"pong"}}"#)
            .create_async()
            .await;

        let client = client_for(&server).await;
        let result: Ping = client
            .execute("Ping", "query Ping { ping }", &json!({ "id": 1 }))
            .await
            .unwrap();

        assert_eq!(result.ping, "pong");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_admin_secret_header_sent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/graphql")
            .match_header("x-hasura-admin-secret", "s3cret")
            .with_status(200)
            .with_body(r#"{"data":{"ping":"pong"}}"#)
            .create_async()
            .await;

        let config =
            HasuraConfig::new(format!("{}/v1/graphql", server.url())).with_admin_secret("s3cret");
        let client = HasuraClient::new(config).unwrap();
        let _: Ping = client.execute("Ping", "query Ping { ping }", &json!({})).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_graphql_errors_surface() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/graphql")
            .with_status(200)
            .with_body(r#"{"errors":[{"message":"field 'ping' not found in type: 'query_root'"}]}"#)
            .create_async()
            .await;

        let client = client_for(&server).await;
        let err = client
            .execute::<_, Ping>("Ping", "query Ping { ping }", &json!({}))
            .await
            .unwrap_err();

        match err {
            BillingError::GraphQl(messages) => {
                assert_eq!(messages, vec!["field 'ping' not found in type: 'query_root'"]);
            }
            other => panic!("expected GraphQl error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_http_failure_is_transport_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/graphql")
            .with_status(503)
            .with_body("upstream unavailable")
            .create_async()
            .await;

        let client = client_for(&server).await;
        let err = client
            .execute::<_, Ping>("Ping", "query Ping { ping }", &json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::Transport(ref msg) if msg.contains("503")));
    }

    #[tokio::test]
    async fn test_missing_data_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/graphql")
            .with_status(200)
            .with_body(r#"{"data":null}"#)
            .create_async()
            .await;

        let client = client_for(&server).await;
        let err = client
            .execute::<_, Ping>("Ping", "query Ping { ping }", &json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_wrong_shape_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/graphql")
            .with_status(200)
            .with_body(r#"{"data":{"ping":42}}"#)
            .create_async()
            .await;

        let client = client_for(&server).await;
        let err = client
            .execute::<_, Ping>("Ping", "query Ping { ping }", &json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::MalformedResponse(ref msg) if msg.starts_with("Ping")));
    }

    #[tokio::test]
    async fn test_non_json_body_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/graphql")
            .with_status(200)
            .with_body("<html>gateway</html>")
            .create_async()
            .await;

        let client = client_for(&server).await;
        let err = client
            .execute::<_, Ping>("Ping", "query Ping { ping }", &json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::MalformedResponse(_)));
    }

    #[test]
    #[serial]
    fn test_config_from_env() {
        std::env::set_var("HASURA_GRAPHQL_URL", "http://localhost:8080/v1/graphql");
        std::env::set_var("HASURA_ADMIN_SECRET", "secret");
        std::env::set_var("HASURA_TIMEOUT_SECS", "3");

        let config = HasuraConfig::from_env().unwrap();
        assert_eq!(config.endpoint, "http://localhost:8080/v1/graphql");
        assert_eq!(config.admin_secret.as_deref(), Some("secret"));
        assert_eq!(config.timeout, Duration::from_secs(3));

        std::env::remove_var("HASURA_GRAPHQL_URL");
        std::env::remove_var("HASURA_ADMIN_SECRET");
        std::env::remove_var("HASURA_TIMEOUT_SECS");
    }

    #[test]
    #[serial]
    fn test_config_requires_endpoint() {
        std::env::remove_var("HASURA_GRAPHQL_URL");
        let err = HasuraConfig::from_env().unwrap_err();
        assert!(matches!(err, BillingError::Config(_)));
    }

    #[test]
    #[serial]
    fn test_config_rejects_bad_timeout() {
        std::env::set_var("HASURA_GRAPHQL_URL", "http://localhost:8080/v1/graphql");
        std::env::set_var("HASURA_TIMEOUT_SECS", "soon");

        let err = HasuraConfig::from_env().unwrap_err();
        assert!(matches!(err, BillingError::Config(ref msg) if msg.contains("soon")));

        std::env::remove_var("HASURA_GRAPHQL_URL");
        std::env::remove_var("HASURA_TIMEOUT_SECS");
    }
}
