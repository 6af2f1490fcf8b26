//! HTTP access used by the resolver and the downloader.
//!
//! The [`HttpSource`] trait is the seam between the pipeline and the network;
//! [`ReqwestSource`] is the real implementation.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use thiserror::Error;
use tracing::debug;

/// A response body delivered chunk by chunk.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, HttpError>>;

/// Errors that can occur while talking to a remote server.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Error reading response body: {0}")]
    Body(String),
}

/// Unauthenticated GET access to remote resources.
#[async_trait]
pub trait HttpSource: Send + Sync {
    /// Fetches the full response body.
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, HttpError>;

    /// Starts a request and returns the body as a stream of chunks.
    ///
    /// Also returns the `Content-Length`, if the server sent one.
    async fn get_stream(&self, url: &str) -> Result<(ByteStream, Option<u64>), HttpError>;
}

/// [`HttpSource`] backed by a shared `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct ReqwestSource {
    client: reqwest::Client,
}

impl ReqwestSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a preconfigured client (proxy, timeouts, TLS roots).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn send(&self, url: &str) -> Result<reqwest::Response, HttpError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| HttpError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        debug!(url, status = status.as_u16(), "Response received");
        if !status.is_success() {
            return Err(HttpError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl HttpSource for ReqwestSource {
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        let response = self.send(url).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| HttpError::Body(e.to_string()))?;
        Ok(body.to_vec())
    }

    async fn get_stream(&self, url: &str) -> Result<(ByteStream, Option<u64>), HttpError> {
        let response = self.send(url).await?;
        let total_bytes = response.content_length();
        let stream = response
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|e| HttpError::Body(e.to_string()))
            })
            .boxed();
        Ok((stream, total_bytes))
    }
}
