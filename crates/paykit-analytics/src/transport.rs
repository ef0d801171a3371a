//! Payload transport
//!
//! [`Transport::send`] hands off a fully encoded request URL and returns
//! immediately. The HTTP implementation spawns the GET on a Tokio runtime
//! and never reports the outcome to the caller.

use reqwest::{StatusCode, Url};
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Fire-and-forget delivery of an encoded payload URL
#[cfg_attr(test, mockall::automock)]
pub trait Transport: Send + Sync {
    /// Submit the request without waiting for it
    fn send(&self, url: Url);
}

/// Sends payloads as HTTP GET requests
pub struct HttpTransport {
    client: reqwest::Client,
    runtime: Option<Handle>,
}

impl HttpTransport {
    /// Create a transport with the given request timeout.
    ///
    /// If called inside a Tokio runtime, that runtime is remembered and used
    /// for sends issued from threads that have no runtime of their own.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            runtime: Handle::try_current().ok(),
        })
    }

    async fn request(
        client: &reqwest::Client,
        url: Url,
    ) -> std::result::Result<StatusCode, reqwest::Error> {
        let response = client.get(url).send().await?;
        Ok(response.status())
    }
}

impl Transport for HttpTransport {
    fn send(&self, url: Url) {
        let Some(runtime) = Handle::try_current().ok().or_else(|| self.runtime.clone()) else {
            debug!("Analytics: no async runtime available, dropping payload");
            return;
        };

        let client = self.client.clone();
        runtime.spawn(async move {
            let host = url.host_str().unwrap_or_default().to_string();
            match Self::request(&client, url).await {
                Ok(status) if status.is_success() => {
                    debug!(%host, "Analytics: payload delivered");
                }
                Ok(status) => {
                    debug!(%host, %status, "Analytics: payload rejected");
                }
                Err(e) => {
                    warn!(%host, error = %e, "Analytics: failed to send payload");
                }
            }
        });
    }
}
