//! HTTP client for the PingDirectory configuration API.
//!
//! [`ConfigClient`] exposes the generic Get/Add/Update/Delete/List calls;
//! each resource module adds typed wrappers for its own object type.

pub mod wire;

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::{api, ProviderConfig};
use crate::error::ProviderError;
use crate::operations::{Operation, UpdateRequest};

pub use wire::{ListResponse, Messages, RequiredAction};

/// Configuration API client.
///
/// Built once when the provider is configured and shared read-only by every
/// request afterwards.
pub struct ConfigClient {
    client: Client,
    base_url: String,
    username: String,
    password: String,
}

impl std::fmt::Debug for ConfigClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigClient")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .finish()
    }
}

impl ConfigClient {
    /// Build a client from resolved provider configuration.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let mut builder = Client::builder()
            .connect_timeout(Duration::from_secs(api::CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(api::TIMEOUT_SECS));

        if config.insecure_trust_all_tls {
            builder = builder.danger_accept_invalid_certs(true);
        }
        for path in &config.ca_certificate_pem_files {
            let pem = std::fs::read(path).map_err(|e| {
                ProviderError::Configuration(format!(
                    "failed to read CA certificate '{}': {}",
                    path, e
                ))
            })?;
            let cert = reqwest::Certificate::from_pem(&pem)?;
            builder = builder.add_root_certificate(cert);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// Create a client against an explicit base URL (for mock servers).
    pub fn with_base_url(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// The base URL of the configuration API.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(method = %method, url = %url, "configuration API request");
        self.client
            .request(method, url)
            .basic_auth(&self.username, Some(&self.password))
            .header("Accept", "application/json")
    }

    /// Check the status and decode the body.
    async fn parse_response<T: DeserializeOwned>(
        response: Response,
        context: String,
    ) -> Result<T, ProviderError> {
        let response = Self::check_status(response, context).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn check_status(response: Response, context: String) -> Result<Response, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ProviderError::Api {
            status: status.as_u16(),
            message: context,
            body,
        })
    }

    /// GET a single object.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ProviderError> {
        let response = self.request(Method::GET, path).send().await?;
        Self::parse_response(response, format!("GET {}", path)).await
    }

    /// POST a new object to a collection.
    pub async fn add<B, T>(&self, path: &str, body: &B) -> Result<T, ProviderError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::POST, path)
            .json(body)
            .send()
            .await?;
        Self::parse_response(response, format!("POST {}", path)).await
    }

    /// PATCH an object with a list of operations.
    pub async fn update<T: DeserializeOwned>(
        &self,
        path: &str,
        operations: Vec<Operation>,
    ) -> Result<T, ProviderError> {
        let response = self
            .request(Method::PATCH, path)
            .json(&UpdateRequest::new(operations))
            .send()
            .await?;
        Self::parse_response(response, format!("PATCH {}", path)).await
    }

    /// DELETE an object.
    pub async fn delete(&self, path: &str) -> Result<(), ProviderError> {
        let response = self.request(Method::DELETE, path).send().await?;
        Self::check_status(response, format!("DELETE {}", path)).await?;
        Ok(())
    }

    /// List a collection, optionally narrowed by a SCIM filter.
    pub async fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        filter: Option<&str>,
    ) -> Result<ListResponse<T>, ProviderError> {
        let full_path = match filter.filter(|f| !f.is_empty()) {
            Some(filter) => format!("{}?filter={}", path, urlencoding::encode(filter)),
            None => path.to_string(),
        };
        let response = self.request(Method::GET, &full_path).send().await?;
        Self::parse_response(response, format!("GET {}", full_path)).await
    }
}

/// Path of a named object inside a collection, e.g.
/// `/log-retention-policies/File%20Count`.
pub fn object_path(collection: &str, name: &str) -> String {
    format!("/{}/{}", collection, urlencoding::encode(name))
}

/// Path of a collection, e.g. `/log-retention-policies`.
pub fn collection_path(collection: &str) -> String {
    format!("/{}", collection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(uri: &str) -> ConfigClient {
        ConfigClient::with_base_url(format!("{}/config", uri), "cn=administrator", "password")
    }

    #[test]
    fn test_object_path_encodes_name() {
        assert_eq!(
            object_path("log-retention-policies", "File Count"),
            "/log-retention-policies/File%20Count"
        );
        assert_eq!(collection_path("server-instances"), "/server-instances");
    }

    #[tokio::test]
    async fn test_get_sends_basic_auth() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/config/license"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "license"})))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server.uri());
        let value: serde_json::Value = client.get("/license").await.unwrap();
        assert_eq!(value["id"], "license");
    }

    #[tokio::test]
    async fn test_get_not_found_keeps_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/config/log-retention-policies/missing"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"detail": "no such policy"})),
            )
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server.uri());
        let err = client
            .get::<serde_json::Value>("/log-retention-policies/missing")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(err.response_body().unwrap().contains("no such policy"));
    }

    #[tokio::test]
    async fn test_update_sends_operations() {
        let mock_server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/config/log-retention-policies/File%20Count"))
            .and(body_json(json!({"operations": [
                {"op": "replace", "path": "numberOfFiles", "value": "5"}
            ]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "File Count"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server.uri());
        let _: serde_json::Value = client
            .update(
                &object_path("log-retention-policies", "File Count"),
                vec![Operation::replace("numberOfFiles", json!("5"))],
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_list_with_filter() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/config/log-retention-policies"))
            .and(query_param("filter", "numberOfFiles gt 3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "totalResults": 1,
                "Resources": [{"id": "File Count"}]
            })))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server.uri());
        let list: ListResponse<serde_json::Value> = client
            .list("/log-retention-policies", Some("numberOfFiles gt 3"))
            .await
            .unwrap();
        assert_eq!(list.resources.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_error_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/config/log-field-mappings/in-use"))
            .respond_with(ResponseTemplate::new(409).set_body_string("still referenced"))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server.uri());
        let err = client.delete("/log-field-mappings/in-use").await.unwrap_err();
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.response_body(), Some("still referenced"));
    }

    #[test]
    fn test_from_config_missing_ca_file() {
        let config = ProviderConfig {
            https_host: "https://localhost:1443".to_string(),
            username: "cn=administrator".to_string(),
            password: "password".to_string(),
            insecure_trust_all_tls: false,
            ca_certificate_pem_files: vec!["/nonexistent/ca.pem".to_string()],
            product_version: "10.3.0.0".to_string(),
        };
        let err = ConfigClient::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("failed to read CA certificate"));
    }

    #[test]
    fn test_from_config_base_url() {
        let config = ProviderConfig {
            https_host: "https://localhost:1443".to_string(),
            username: "cn=administrator".to_string(),
            password: "password".to_string(),
            insecure_trust_all_tls: true,
            ca_certificate_pem_files: Vec::new(),
            product_version: "10.3.0.0".to_string(),
        };
        let client = ConfigClient::from_config(&config).unwrap();
        assert_eq!(client.base_url(), "https://localhost:1443/config");
    }
}
