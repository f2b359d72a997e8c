//! Session bootstrap
//!
//! Derives [`SessionParams`] from the raw body of a live-stream page. The
//! values live inside a script blob whose surrounding JSON is not uniformly
//! parseable across page variants, so extraction is fixed-pattern matching,
//! not DOM or JSON parsing. Each pattern is independent and order does not
//! matter.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{StreamlogError, StreamlogResult};
use crate::transport::ChatTransport;
use crate::types::SessionParams;

/// Canonical watch link carrying the live id
static LIVE_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<link rel="canonical" href="https://www\.youtube\.com/watch\?v=(.+?)">"#)
        .unwrap()
});

/// Replay marker; absent on a live stream
static REPLAY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""isReplay":\s*true"#).unwrap());

/// Public API key embedded in the page config
static API_KEY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""INNERTUBE_API_KEY":\s*"(.+?)""#).unwrap());

/// Client version, constrained to digits and dots so unrelated
/// "clientVersion" strings elsewhere in the blob cannot match
static CLIENT_VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""clientVersion":\s*"([\d.]+?)""#).unwrap());

/// First continuation token in the page body
static CONTINUATION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""continuation":\s*"(.+?)""#).unwrap());

/// Extract session parameters from a stream page body.
///
/// Either all five parameters are derived or this fails with the error
/// matching the first missing field; no partial result escapes.
pub fn parse_live_page(body: &str) -> StreamlogResult<SessionParams> {
    let live_id = LIVE_ID_PATTERN
        .captures(body)
        .map(|c| c[1].to_string())
        .ok_or(StreamlogError::SessionNotFound)?;

    // Absence of the key means a live stream, not an error.
    let is_replay = REPLAY_PATTERN.is_match(body);

    let api_key = API_KEY_PATTERN
        .captures(body)
        .map(|c| c[1].to_string())
        .ok_or(StreamlogError::missing_credential("API key"))?;

    let client_version = CLIENT_VERSION_PATTERN
        .captures(body)
        .map(|c| c[1].to_string())
        .ok_or(StreamlogError::missing_credential("Client version"))?;

    let continuation = CONTINUATION_PATTERN
        .captures(body)
        .map(|c| c[1].to_string())
        .ok_or(StreamlogError::MissingContinuation)?;

    Ok(SessionParams {
        live_id,
        is_replay,
        api_key,
        client_version,
        continuation,
    })
}

/// Fetch a stream page and derive session parameters from it.
pub async fn bootstrap_session(
    transport: &dyn ChatTransport,
    url: &str,
) -> StreamlogResult<SessionParams> {
    let body = transport.fetch_page(url).await?;
    parse_live_page(&body)
}
