// src/probes/mod.rs
//
// Ready-made condition calls for the common cases: probing an HTTP endpoint
// and opening a TCP connection. Both report latency as the observed value
// and a fail status with diagnostic output instead of erroring, so an
// unreachable dependency degrades the health body rather than the request.
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;
use url::Url;

use crate::check::Check;
use crate::condition::{CallError, CheckCall};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// GET probe against an HTTP endpoint; 2xx is a pass, anything else a fail.
pub struct HttpProbe {
    url: Url,
    client: Client,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            client: Client::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl CheckCall for HttpProbe {
    async fn evaluate(&self) -> Result<Check, CallError> {
        let start = Instant::now();
        let result = timeout(self.timeout, self.client.get(self.url.as_str()).send()).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        debug!(url = %self.url, elapsed_ms, "http probe completed");

        let check = Check::new()
            .with_component_id(self.url.as_str())
            .with_component_type("http")
            .with_observed_value(elapsed_ms)
            .with_observed_unit("ms")
            .with_time(Utc::now().to_rfc3339())?;

        Ok(match result {
            Ok(Ok(response)) if response.status().is_success() => check.with_status("pass"),
            Ok(Ok(response)) => check
                .with_status("fail")
                .with_output(format!("HTTP {}", response.status())),
            Ok(Err(e)) => check.with_status("fail").with_output(e.to_string()),
            Err(_) => check.with_status("fail").with_output("request timeout"),
        })
    }
}

/// Connect probe against a TCP address.
pub struct TcpProbe {
    addr: SocketAddr,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl CheckCall for TcpProbe {
    async fn evaluate(&self) -> Result<Check, CallError> {
        let start = Instant::now();
        let result = timeout(self.timeout, TcpStream::connect(self.addr)).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        debug!(addr = %self.addr, elapsed_ms, "tcp probe completed");

        let check = Check::new()
            .with_component_id(self.addr.to_string())
            .with_component_type("tcp")
            .with_observed_value(elapsed_ms)
            .with_observed_unit("ms")
            .with_time(Utc::now().to_rfc3339())?;

        Ok(match result {
            Ok(Ok(_)) => check.with_status("pass"),
            Ok(Err(e)) => check.with_status("fail").with_output(e.to_string()),
            Err(_) => check.with_status("fail").with_output("connect timeout"),
        })
    }
}
