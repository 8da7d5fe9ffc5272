//! Pairing credentials and request validation.
//!
//! Pure functions only; the display server calls these during the
//! handshake and the dispatcher calls them while applying commands.
//!
//! The PIN space is 1000-9999: 9000 values, enumerable within seconds on a
//! local network. Combined with a PIN that lives as long as the server, any
//! device that once saw the PIN can pair again. Both are known weaknesses.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::{Rng, RngCore};

pub const PIN_MIN: u16 = 1000;
pub const PIN_MAX: u16 = 9999;

/// Random bytes behind a session token.
const TOKEN_BYTES: usize = 32;

const VIDEO_EXTENSIONS: [&str; 8] = [
    ".mp4", ".mkv", ".webm", ".m3u8", ".mpd", ".avi", ".mov", ".flv",
];

/// Substrings that mark streaming endpoints without a file extension.
const STREAMING_MARKERS: [&str; 3] = ["video/", "stream", "playlist"];

/// Four ASCII digits, uniform over [`PIN_MIN`]..=[`PIN_MAX`].
pub fn generate_pin() -> String {
    rand::thread_rng().gen_range(PIN_MIN..=PIN_MAX).to_string()
}

/// Opaque session credential: 256 random bits, URL-safe base64.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// True when any non-empty allow-list entry occurs in `origin`.
pub fn validate_origin<S: AsRef<str>>(origin: &str, allowlist: &[S]) -> bool {
    allowlist.iter().any(|allowed| {
        let allowed = allowed.as_ref();
        !allowed.is_empty() && origin.contains(allowed)
    })
}

/// Exact comparison whose running time depends only on the lengths.
pub fn validate_token(presented: &str, expected: &str) -> bool {
    let (a, b) = (presented.as_bytes(), expected.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Extract the credential from an `Authorization: Bearer <token>` header value.
pub fn parse_bearer(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

/// `http`/`https` URLs with a non-empty host.
pub fn is_valid_url(s: &str) -> bool {
    parse_web_url(s).is_some()
}

/// Normalized form of a valid URL, `None` for anything [`is_valid_url`] rejects.
pub fn sanitize_url(s: &str) -> Option<String> {
    parse_web_url(s).map(String::from)
}

fn parse_web_url(s: &str) -> Option<url::Url> {
    let url = url::Url::parse(s.trim()).ok()?;
    let has_host = url.host_str().is_some_and(|h| !h.is_empty());
    (matches!(url.scheme(), "http" | "https") && has_host).then_some(url)
}

/// Whether a URL or path points at playable video rather than a page.
pub fn classify_as_video(url_or_path: &str) -> bool {
    let lower = url_or_path.to_ascii_lowercase();
    let path = lower.split(['?', '#']).next().unwrap_or_default();
    VIDEO_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
        || STREAMING_MARKERS.iter().any(|marker| lower.contains(marker))
}
