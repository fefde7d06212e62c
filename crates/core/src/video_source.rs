//! Resolution of a lesson's `videoUrl` into something a player can load.
//!
//! The backend stores either a direct URL or a signed token of the form
//! `header.payload[.signature]`, where the payload is base64url JSON carrying
//! the real URL. Decoding is strict; the fallback to the raw value is a
//! caller decision made in [`VideoSource::resolve`].

use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeError {
    #[error("value is not a dotted token")]
    NotAToken,

    #[error("token payload is not base64: {0}")]
    Base64(String),

    #[error("token payload is not JSON: {0}")]
    Json(String),

    #[error("token payload has no url")]
    MissingUrl,

    #[error("token url is invalid: {0}")]
    InvalidUrl(String),
}

#[derive(Deserialize)]
struct TokenClaims {
    #[serde(default)]
    url: Option<String>,
    #[serde(default, rename = "videoUrl")]
    video_url: Option<String>,
}

/// Decode a signed video token and extract the URL it carries.
///
/// The signature is not verified; the CDN does that when the URL is fetched.
///
/// # Errors
///
/// Returns `DecodeError` when the value is not a token, the payload cannot be
/// decoded, or it does not carry an http(s) URL.
pub fn decode_video_token(raw: &str) -> Result<Url, DecodeError> {
    let segments: Vec<&str> = raw.trim().split('.').collect();
    if !(2..=3).contains(&segments.len()) || segments[..2].iter().any(|s| s.is_empty()) {
        return Err(DecodeError::NotAToken);
    }

    let payload = segments[1].trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| STANDARD_NO_PAD.decode(payload))
        .map_err(|e| DecodeError::Base64(e.to_string()))?;

    let claims: TokenClaims =
        serde_json::from_slice(&bytes).map_err(|e| DecodeError::Json(e.to_string()))?;
    let url = claims
        .url
        .or(claims.video_url)
        .filter(|u| !u.trim().is_empty())
        .ok_or(DecodeError::MissingUrl)?;

    parse_http_url(&url).ok_or(DecodeError::InvalidUrl(url))
}

fn parse_http_url(raw: &str) -> Option<Url> {
    let url = Url::parse(raw.trim()).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

/// Delivery format of the resolved video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// HLS playlist; needs hls.js or native HLS support.
    Hls,
    /// A plain file the `<video>` element can play directly.
    Progressive,
}

impl StreamKind {
    #[must_use]
    pub fn detect(url: &str) -> Self {
        let path = Url::parse(url).map_or_else(
            |_| url.split(['?', '#']).next().unwrap_or(url).to_string(),
            |u| u.path().to_string(),
        );
        if path.to_ascii_lowercase().ends_with(".m3u8") {
            Self::Hls
        } else {
            Self::Progressive
        }
    }
}

/// How the final URL was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOrigin {
    Direct,
    Decoded,
    /// Token decoding failed; the stored value is used as-is.
    Raw,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoSource {
    url: String,
    origin: SourceOrigin,
    kind: StreamKind,
}

impl VideoSource {
    /// Resolve a stored video reference, failing open to the raw value.
    ///
    /// Returns `None` for a blank reference.
    #[must_use]
    pub fn resolve(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let (url, origin) = if let Some(direct) = parse_http_url(raw) {
            (direct.to_string(), SourceOrigin::Direct)
        } else if raw.contains('.') {
            match decode_video_token(raw) {
                Ok(decoded) => (decoded.to_string(), SourceOrigin::Decoded),
                Err(err) => {
                    tracing::warn!(error = %err, "video token decode failed; using raw value");
                    (raw.to_string(), SourceOrigin::Raw)
                }
            }
        } else {
            (raw.to_string(), SourceOrigin::Raw)
        };

        let kind = StreamKind::detect(&url);
        Some(Self { url, origin, kind })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn origin(&self) -> SourceOrigin {
        self.origin
    }

    #[must_use]
    pub fn kind(&self) -> StreamKind {
        self.kind
    }
}
