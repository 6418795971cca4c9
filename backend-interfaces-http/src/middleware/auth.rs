use std::borrow::Cow;
use std::io::Read;

use anyhow::{anyhow, Context, Result};
use axum::http::{header, HeaderMap};
use flate2::read::GzDecoder;

use backend_domain::{IngestEnvelope, ItemObservation, RuntimeConfig};

const SCHEMA_VERSION: &str = "v1";

/// Open when no token is configured; otherwise the bearer token must match.
pub fn authorize(config: &RuntimeConfig, headers: &HeaderMap) -> bool {
    match config.api_token.as_deref() {
        None => true,
        Some(expected) => bearer_token(headers) == Some(expected),
    }
}

/// Decodes an ingest envelope. Gzip bodies are inflated up to `max_bytes`;
/// anything larger is rejected before it is parsed.
pub fn parse_observations(
    headers: &HeaderMap,
    body: &[u8],
    max_bytes: u64,
) -> Result<Vec<ItemObservation>> {
    let payload = read_payload(headers, body, max_bytes)?;
    let envelope: IngestEnvelope = serde_json::from_slice(&payload)?;
    if envelope.schema_version.trim() != SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported schema_version '{}', expected '{}'",
            envelope.schema_version,
            SCHEMA_VERSION
        ));
    }
    Ok(envelope.items)
}

fn read_payload<'a>(headers: &HeaderMap, body: &'a [u8], max_bytes: u64) -> Result<Cow<'a, [u8]>> {
    let payload = if is_gzip(headers) {
        let mut inflated = Vec::new();
        GzDecoder::new(body)
            .take(max_bytes.saturating_add(1))
            .read_to_end(&mut inflated)
            .context("invalid gzip body")?;
        Cow::Owned(inflated)
    } else {
        Cow::Borrowed(body)
    };
    if payload.len() as u64 > max_bytes {
        return Err(anyhow!("ingest body exceeds {} bytes", max_bytes));
    }
    Ok(payload)
}

fn is_gzip(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_ENCODING)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("gzip"))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.trim().strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}
