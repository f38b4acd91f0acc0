//! Network access for cache misses.

use reqwest::Method;
use tracing::debug;

use crate::error::NetworkError;
use crate::http::{Request, Response};

pub trait Fetcher: Send + Sync {
    /// Perform the request. Any HTTP status is a successful fetch; only
    /// transport failures are errors.
    fn fetch(&self, request: &Request) -> impl Future<Output = Result<Response, NetworkError>> + Send;
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn request_error(request: &Request, e: impl std::fmt::Display) -> NetworkError {
    NetworkError::Request {
        url: request.url.to_string(),
        message: e.to_string(),
    }
}

impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        let method =
            Method::from_bytes(request.method.as_bytes()).map_err(|e| request_error(request, e))?;

        let resp = self
            .client
            .request(method, request.url.clone())
            .send()
            .await
            .map_err(|e| request_error(request, e))?;

        let status = resp.status().as_u16();
        let headers = resp
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    String::from_utf8_lossy(v.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = resp
            .bytes()
            .await
            .map_err(|e| request_error(request, e))?
            .to_vec();

        debug!(url = %request.url, status, bytes = body.len(), "fetched from network");
        Ok(Response {
            status,
            headers,
            body,
        })
    }
}
