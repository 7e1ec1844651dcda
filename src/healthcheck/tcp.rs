use super::HealthChecker;
use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;
use tokio::net::TcpStream;

/// Ready once a TCP connection to `host:port` succeeds.
///
/// The connection is dropped right away; nothing is sent.
pub struct TcpChecker {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpChecker {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[async_trait]
impl HealthChecker for TcpChecker {
    async fn check(&self) -> Result<bool> {
        let result = tokio::time::timeout(
            self.timeout,
            TcpStream::connect((self.host.as_str(), self.port)),
        )
        .await;

        match result {
            Ok(Ok(_stream)) => Ok(true),
            Ok(Err(_)) | Err(_) => Ok(false),
        }
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn target(&self) -> String {
        self.address()
    }
}
