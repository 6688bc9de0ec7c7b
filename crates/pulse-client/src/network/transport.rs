//! HTTP request transport
//!
//! Joins endpoint paths onto the configured origin and attaches the bearer
//! header when the credentials provider yields a token. Unary calls carry
//! the configured request timeout; streaming subscriptions are opened
//! without one, since a healthy stream can legitimately outlive any fixed
//! bound.

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::credentials::CredentialsProvider;
use crate::error::ClientError;

/// Shared HTTP transport for all API calls.
pub struct Transport {
    client: reqwest::Client,
    base_url: Url,
    request_timeout: std::time::Duration,
    credentials: Arc<dyn CredentialsProvider>,
}

impl Transport {
    pub fn new(
        config: &ClientConfig,
        credentials: Arc<dyn CredentialsProvider>,
    ) -> Result<Self, ClientError> {
        let base_url = Url::parse(&config.base_url)?;
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url,
            request_timeout: config.request_timeout(),
            credentials,
        })
    }

    /// Resolve an endpoint path against the configured origin.
    pub fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path)?)
    }

    async fn builder(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let url = self.endpoint(path)?;
        debug!(%method, %url, "sending request");

        let mut builder = self.client.request(method, url);
        if let Some(token) = self.credentials.bearer_token().await {
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }

    /// POST a JSON body and return the raw response. The status is not
    /// checked; callers map non-success statuses to their own error class.
    pub async fn post(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<Response, ClientError> {
        let builder = self.builder(Method::POST, path).await?;
        let response = builder
            .timeout(self.request_timeout)
            .json(body)
            .send()
            .await?;
        Ok(response)
    }

    /// GET an endpoint and return the raw response, status unchecked.
    pub async fn get(&self, path: &str) -> Result<Response, ClientError> {
        let builder = self.builder(Method::GET, path).await?;
        let response = builder.timeout(self.request_timeout).send().await?;
        Ok(response)
    }

    /// GET a JSON endpoint, failing on any non-success status.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.get(path).await?;
        let response = expect_success(response, path)?;
        Ok(response.json().await?)
    }

    /// POST a JSON body for a streaming response. No overall timeout is
    /// applied; the body is read incrementally by the caller.
    pub async fn post_stream(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<Response, ClientError> {
        let builder = self.builder(Method::POST, path).await?;
        let response = builder.json(body).send().await?;
        Ok(response)
    }

    /// GET an endpoint for a streaming response, without a request timeout.
    pub async fn get_stream(&self, path: &str) -> Result<Response, ClientError> {
        let builder = self.builder(Method::GET, path).await?;
        let response = builder.send().await?;
        Ok(response)
    }
}

/// Map a non-success status to [`ClientError::UnexpectedStatus`].
pub fn expect_success(response: Response, endpoint: &str) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ClientError::UnexpectedStatus {
            status: status.as_u16(),
            endpoint: endpoint.to_string(),
        })
    }
}
