//! Round-trip latency probe

use super::Measurement;
use crate::client::{HttpRequest, HttpTransport};
use crate::clock::Clock;
use crate::error::{AppError, Result};

/// Times one request to the ping endpoint
pub struct LatencyProber<'a> {
    transport: &'a dyn HttpTransport,
    clock: &'a dyn Clock,
    url: &'a str,
}

impl<'a> LatencyProber<'a> {
    pub fn new(transport: &'a dyn HttpTransport, clock: &'a dyn Clock, url: &'a str) -> Self {
        Self { transport, clock, url }
    }

    /// Round-trip time in milliseconds.
    ///
    /// The timer stops once the status line and headers have arrived. The
    /// small JSON body is never awaited, so a server that stalls after the
    /// headers cannot turn a finished measurement into a timeout.
    pub async fn probe(&self) -> Result<Measurement> {
        let request = HttpRequest::get(self.url.to_string()).no_cache();

        let start = self.clock.now();
        let response = self.transport.fetch(request).await?;
        let elapsed = self.clock.elapsed_since(start);

        if !response.is_success() {
            return Err(AppError::http_status(response.status_code));
        }

        drop(response);

        Ok(Measurement {
            raw_value: elapsed.as_nanos() as f64 / 1_000_000.0,
            elapsed,
        })
    }

    /// Latency in milliseconds
    pub async fn probe_latency(&self) -> Result<f64> {
        self.probe().await.map(|m| m.raw_value)
    }
}
