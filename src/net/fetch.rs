//! Cancellable HTTP requests
//!
//! Every network call races the invocation's cancellation token. When the
//! token fires, the request future is dropped, which aborts the underlying
//! connection instead of leaving it running in the background.

use crate::errors::ToolError;
use crate::net::pool::ConnectionPool;
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use reqwest::{RequestBuilder, Response};
use tokio_util::sync::CancellationToken;

/// Browser-like headers for page and image fetches
pub const BROWSER_HEADERS: &[(&str, &str)] = &[
    ("User-Agent", "toolrunner-scrape/0.1 (Wikipedia article fetcher)"),
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
    ),
    ("Accept-Language", "en-US,en;q=0.9"),
];

/// HTTP helper bound to one pool and one cancellation token
#[derive(Debug, Clone, Copy)]
pub struct Fetcher<'a> {
    pool: &'a ConnectionPool,
    cancel: &'a CancellationToken,
}

impl<'a> Fetcher<'a> {
    pub fn new(pool: &'a ConnectionPool, cancel: &'a CancellationToken) -> Self {
        Self { pool, cancel }
    }

    /// GET a URL and return the body bytes
    pub async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<Bytes, ToolError> {
        let mut request = self.pool.client()?.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = self.send(request).await?;
        let response = check_status(response)?;
        self.read_body(response).await
    }

    /// POST a JSON body with bearer auth and return the response body bytes
    pub async fn post_json(
        &self,
        url: &str,
        bearer: &str,
        body: &serde_json::Value,
    ) -> Result<Bytes, ToolError> {
        let request = self.pool.client()?.post(url).bearer_auth(bearer).json(body);

        let response = self.send(request).await?;
        let response = check_status(response)?;
        self.read_body(response).await
    }

    /// Send a request, giving up as soon as the token is cancelled
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, ToolError> {
        self.pool.record_request();

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(cancelled()),
            result = request.send() => result.map_err(|e| {
                tracing::debug!(error = %e, "request failed");
                ToolError::fetch_failed("Network error").caused_by(e)
            }),
        }
    }

    /// Stream the body into memory, bounded by the pool's body limit
    pub async fn read_body(&self, response: Response) -> Result<Bytes, ToolError> {
        let limit = self.pool.max_body_bytes();
        let mut body = BytesMut::new();
        let mut stream = response.bytes_stream();

        loop {
            let chunk = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(cancelled()),
                chunk = stream.next() => chunk,
            };

            match chunk {
                Some(Ok(bytes)) => {
                    if body.len() + bytes.len() > limit {
                        return Err(ToolError::fetch_failed(format!(
                            "Response body exceeds {} bytes",
                            limit
                        ))
                        .with_details(serde_json::json!({ "limit": limit })));
                    }
                    body.extend_from_slice(&bytes);
                }
                Some(Err(e)) => {
                    return Err(ToolError::fetch_failed("Failed to read response body").caused_by(e))
                }
                None => break,
            }
        }

        Ok(body.freeze())
    }
}

/// Map a status >= 400 to `HTTP_ERROR`
pub fn check_status(response: Response) -> Result<Response, ToolError> {
    let status = response.status();
    if status.as_u16() >= 400 {
        return Err(ToolError::http_status(
            status.as_u16(),
            format!("HTTP {} from {}", status.as_u16(), response.url()),
        ));
    }
    Ok(response)
}

fn cancelled() -> ToolError {
    ToolError::timeout("Request cancelled by execution deadline")
}
