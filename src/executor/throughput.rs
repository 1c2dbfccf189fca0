//! Download and upload throughput phases

use super::{throughput_mbps, Measurement};
use crate::client::{HttpRequest, HttpTransport};
use crate::clock::Clock;
use crate::error::{AppError, Result};
use crate::models::config::mb_to_bytes;
use crate::payload::generate_payload;
use serde::{Deserialize, Serialize};

/// Transfer direction of a throughput phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Download,
    Upload,
}

/// Times the transfer of a fixed-size payload
pub struct ThroughputPhase<'a> {
    transport: &'a dyn HttpTransport,
    clock: &'a dyn Clock,
    url: &'a str,
    size_mb: f64,
}

impl<'a> ThroughputPhase<'a> {
    pub fn new(transport: &'a dyn HttpTransport, clock: &'a dyn Clock, url: &'a str, size_mb: f64) -> Self {
        Self {
            transport,
            clock,
            url,
            size_mb,
        }
    }

    /// Run the phase in the given direction
    pub async fn measure(&self, direction: Direction) -> Result<Measurement> {
        match direction {
            Direction::Download => self.measure_download().await,
            Direction::Upload => self.measure_upload().await,
        }
    }

    /// Fetch the whole payload and return raw Mbps
    pub async fn measure_download(&self) -> Result<Measurement> {
        let expected = mb_to_bytes(self.size_mb) as u64;
        let request = HttpRequest::get(self.url.to_string()).no_cache();

        let start = self.clock.now();
        let response = self.transport.fetch(request).await?;
        if !response.is_success() {
            return Err(AppError::http_status(response.status_code));
        }
        let received = response.consume_body().await?;
        let elapsed = self.clock.elapsed_since(start);

        if received < expected {
            return Err(AppError::measurement(format!(
                "Partial payload: received {} of {} bytes",
                received, expected
            )));
        }

        Ok(Measurement {
            raw_value: throughput_mbps(self.size_mb, elapsed),
            elapsed,
        })
    }

    /// Post the whole payload and return raw Mbps once it is acknowledged.
    ///
    /// The acknowledgement body is not read; the status line is the ack.
    pub async fn measure_upload(&self) -> Result<Measurement> {
        // Built before the timer starts so generation cost is not measured
        let payload = generate_payload(mb_to_bytes(self.size_mb));
        let request = HttpRequest::post_octets(self.url.to_string(), payload);

        let start = self.clock.now();
        let response = self.transport.fetch(request).await?;
        let elapsed = self.clock.elapsed_since(start);

        if !response.is_success() {
            return Err(AppError::http_status(response.status_code));
        }
        drop(response);

        Ok(Measurement {
            raw_value: throughput_mbps(self.size_mb, elapsed),
            elapsed,
        })
    }
}
