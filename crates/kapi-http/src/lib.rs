//! [`Transport`] over HTTP(S) using `reqwest`.

mod config;

use std::time::Duration;

use kapi_client::{Action, KeysApi, RawResponse, RequestDescriptor, Transport};
use kapi_types::KapiError;
use tokio_util::sync::CancellationToken;
use url::Url;

pub use config::HttpConfig;

/// Sends each action to the first endpoint, falling through to the next
/// one only when the connection could not be established. Once a request
/// may have reached a server, its failure is returned as is.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoints: Vec<Url>,
}

impl HttpTransport {
    pub fn new(config: &HttpConfig) -> Result<Self, KapiError> {
        if config.endpoints.is_empty() {
            return Err(KapiError::InvalidConfig("no endpoints configured".into()));
        }
        let endpoints = config
            .endpoints
            .iter()
            .map(|ep| {
                Url::parse(ep).map_err(|e| KapiError::InvalidConfig(format!("endpoint {ep:?}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut builder = reqwest::Client::builder();
        if config.request_timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(config.request_timeout_ms));
        }
        let client = builder
            .build()
            .map_err(|e| KapiError::InvalidConfig(format!("build http client: {e}")))?;

        Ok(HttpTransport { client, endpoints })
    }

    pub fn endpoints(&self) -> &[Url] {
        &self.endpoints
    }

    fn build(&self, desc: RequestDescriptor) -> reqwest::RequestBuilder {
        let mut req = self.client.request(desc.method, desc.url).headers(desc.headers);
        if let Some(body) = desc.body {
            req = req.body(body);
        }
        req
    }

    async fn send(&self, desc: RequestDescriptor) -> Result<RawResponse, reqwest::Error> {
        let resp = self.build(desc).send().await?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.bytes().await?;
        Ok(RawResponse { status, headers, body })
    }
}

impl Transport for HttpTransport {
    async fn dispatch(
        &self,
        action: &Action,
        cancel: &CancellationToken,
    ) -> Result<RawResponse, KapiError> {
        if cancel.is_cancelled() {
            return Err(KapiError::Cancelled);
        }

        let mut last_err = None;
        for endpoint in &self.endpoints {
            let desc = action.request(endpoint);
            tracing::debug!(method = %desc.method, url = %desc.url, "sending request");

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(KapiError::Cancelled),
                r = self.send(desc) => r,
            };
            match result {
                Ok(raw) => return Ok(raw),
                Err(e) if e.is_connect() => {
                    tracing::warn!(%endpoint, error = %e, "connect failed, trying next endpoint");
                    last_err = Some(e.to_string());
                }
                Err(e) => {
                    tracing::warn!(%endpoint, error = %e, "request failed");
                    return Err(KapiError::Transport(e.to_string()));
                }
            }
        }
        Err(KapiError::Transport(last_err.unwrap_or_else(|| "no endpoints".into())))
    }
}

/// Keys API bound to an HTTP transport built from `config`.
pub fn keys_api(config: &HttpConfig) -> Result<KeysApi<HttpTransport>, KapiError> {
    let transport = HttpTransport::new(config)?;
    Ok(KeysApi::with_prefix(std::sync::Arc::new(transport), config.prefix.clone()))
}
