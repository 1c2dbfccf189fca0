//! Payload generation and cache-control headers for throughput tests

use bytes::Bytes;

/// Request headers that keep intermediaries from serving a cached response
pub const NO_CACHE_REQUEST_HEADERS: &[(&str, &str)] = &[
    ("Cache-Control", "no-store, no-cache"),
    ("Pragma", "no-cache"),
];

/// Response headers the payload source sends with the download payload
pub const NO_CACHE_RESPONSE_HEADERS: &[(&str, &str)] = &[
    ("Cache-Control", "no-store, no-cache, must-revalidate, proxy-revalidate"),
    ("Pragma", "no-cache"),
    ("Expires", "0"),
];

/// Content type of download and upload payloads
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Build a payload of exactly `size_bytes` bytes.
///
/// Content is a repeating byte ramp: the measurement only depends on size,
/// and a non-constant pattern avoids trivially compressible transfers.
pub fn generate_payload(size_bytes: usize) -> Bytes {
    let data: Vec<u8> = (0..size_bytes).map(|i| (i % 251) as u8).collect();
    Bytes::from(data)
}
