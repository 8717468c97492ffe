//! HTTP client for the catalog REST API
//!
//! `ApiClient` owns a single `reqwest::Client` configured with the fixed
//! request timeout and JSON headers. Every JSON endpoint answers with the
//! `ApiResponse` envelope; non-2xx statuses and `success: false` envelopes
//! are both turned into `ApiError::Server`.

pub mod tokens;
pub mod upload;

use crate::config::Config;
use crate::constants::{APP_NAME, APP_VERSION};
use crate::error::{ApiError, ErrorBody};
use crate::types::ApiResponse;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error};
use url::Url;

pub use tokens::TokenApi;
pub use upload::UploadApi;

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .default_headers(headers)
            .user_agent(format!("{}/{}", APP_NAME.replace(' ', "-"), APP_VERSION))
            .build()?;

        Ok(Self {
            http,
            base_url: config.backend_url.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Raw client, for requests that leave the API (direct storage uploads)
    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Build `<base>/<segments...>` with each segment percent-encoded.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) async fn get<T, Q>(&self, segments: &[&str], query: Option<&Q>) -> Result<ApiResponse<T>, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let mut request = self.http.get(self.endpoint(segments)?);
        if let Some(query) = query {
            request = request.query(query);
        }
        self.send(Method::GET, request).await
    }

    pub(crate) async fn post<T, B>(&self, segments: &[&str], body: &B) -> Result<ApiResponse<T>, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.http.post(self.endpoint(segments)?).json(body);
        self.send(Method::POST, request).await
    }

    pub(crate) async fn put<T, B>(&self, segments: &[&str], body: &B) -> Result<ApiResponse<T>, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.http.put(self.endpoint(segments)?).json(body);
        self.send(Method::PUT, request).await
    }

    pub(crate) async fn delete<T, B>(&self, segments: &[&str], body: Option<&B>) -> Result<ApiResponse<T>, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut request = self.http.delete(self.endpoint(segments)?);
        if let Some(body) = body {
            request = request.json(body);
        }
        self.send(Method::DELETE, request).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        request: RequestBuilder,
    ) -> Result<ApiResponse<T>, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().clone();
        debug!(%method, path = url.path(), %status, "API response");

        if !status.is_success() {
            let body = response.json::<ErrorBody>().await.ok();
            if status.is_server_error() {
                error!(%method, path = url.path(), %status, "Server error");
            }
            return Err(ApiError::Server { status, body });
        }

        let envelope: ApiResponse<T> = response.json().await?;
        if !envelope.success {
            return Err(ApiError::Server {
                status,
                body: Some(ErrorBody {
                    error: envelope.error,
                    message: Some(envelope.message),
                }),
            });
        }
        Ok(envelope)
    }
}

/// Pull the payload out of an envelope, failing if the server sent none
pub(crate) fn require_data<T>(response: ApiResponse<T>) -> Result<T, ApiError> {
    response.data.ok_or(ApiError::MissingData)
}


#[cfg(test)]
mod tests {
    use super::test_support::client_for;
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn endpoint_escapes_segments() {
        let config = Config::resolve(Some("http://localhost:8080/"), None).unwrap();
        let client = ApiClient::new(&config).unwrap();
        let url = client.endpoint(&["api", "tokens", "symbol", "A/B C"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/tokens/symbol/A%2FB%20C");
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let config = Config::resolve(Some("https://example.com/catalog/"), None).unwrap();
        let client = ApiClient::new(&config).unwrap();
        let url = client.endpoint(&["api", "tokens"]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/catalog/api/tokens");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn server_error_keeps_envelope_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/tokens/stats");
                then.status(500)
                    .header("content-type", "application/json")
                    .json_body(json!({"success": false, "message": "Internal", "error": "db offline"}));
            })
            .await;

        let client = client_for(&server);
        let err = client
            .get::<serde_json::Value, ()>(&["api", "tokens", "stats"], None)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(reqwest::StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(err.display_message(), "db offline");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unsuccessful_envelope_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/tokens/missing");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({"success": false, "message": "Token not found"}));
            })
            .await;

        let client = client_for(&server);
        let err = client
            .get::<serde_json::Value, ()>(&["api", "tokens", "missing"], None)
            .await
            .unwrap_err();
        assert_eq!(err.display_message(), "Token not found");
    }
}
