use std::time::Duration;

use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::debug;

/// Host probed when nothing else is configured
pub const DEFAULT_PROBE_URL: &str = "https://www.google.com/";

/// Request timeout when nothing else is configured
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Outcome of a probe that got an HTTP response
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Connectivity {
    Online { body: String },
    Offline { status: u16 },
}

#[derive(Clone, Debug)]
pub struct ConnectivityProbe {
    url: String,
    timeout: Duration,
    accept_invalid_certs: bool,
}

impl ConnectivityProbe {
    /// Probe `url`. Certificate verification stays off until
    /// `accept_invalid_certs(false)` is called.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: DEFAULT_PROBE_TIMEOUT,
            accept_invalid_certs: true,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send the probe request
    pub async fn check(&self) -> Result<Connectivity, ProbeError> {
        let client = Client::builder()
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .timeout(self.timeout)
            .build()
            .map_err(ProbeError::Client)?;

        debug!(url = %self.url, "probing connectivity");

        let response = client
            .get(&self.url)
            .send()
            .await
            .map_err(|source| self.unreachable(source))?;

        let status = response.status();
        debug!(%status, "probe response");

        if status != StatusCode::OK {
            return Ok(Connectivity::Offline {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| self.unreachable(source))?;

        Ok(Connectivity::Online { body })
    }

    fn unreachable(&self, source: reqwest::Error) -> ProbeError {
        ProbeError::Unreachable {
            url: self.url.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve a single canned HTTP response on an ephemeral port
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{}/", addr)
    }

    #[tokio::test]
    async fn test_ok_is_online() {
        let url = serve_once("200 OK", "hello").await;
        let result = ConnectivityProbe::new(url).check().await.unwrap();
        assert_eq!(
            result,
            Connectivity::Online {
                body: "hello".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_non_200_is_offline() {
        let url = serve_once("204 No Content", "").await;
        let result = ConnectivityProbe::new(url).check().await.unwrap();
        assert_eq!(result, Connectivity::Offline { status: 204 });
    }

    #[tokio::test]
    async fn test_server_error_is_offline() {
        let url = serve_once("503 Service Unavailable", "down").await;
        let result = ConnectivityProbe::new(url).check().await.unwrap();
        assert_eq!(result, Connectivity::Offline { status: 503 });
    }

    #[tokio::test]
    async fn test_connection_refused_is_unreachable() {
        // Bind then drop to get a port nothing listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let probe = ConnectivityProbe::new(format!("http://{}/", addr))
            .timeout(Duration::from_secs(5));
        match probe.check().await {
            Err(ProbeError::Unreachable { url, .. }) => assert_eq!(url, probe.url()),
            other => panic!("expected Unreachable, got {:?}", other),
        }
    }
}
