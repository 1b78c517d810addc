//! Safe web page fetching and plain-text extraction.
//!
//! URLs are validated before any network I/O: only http/https, no
//! localhost, no private/local IP literals. Downloads are streamed with a
//! hard size cap so a hostile page can't balloon memory.

use std::net::IpAddr;
use std::time::Duration;

use futures::StreamExt;
use scraper::{Html, Node};
use url::Url;

use crate::error::PipelineError;

/// Maximum bytes accepted from a single response.
pub const MAX_RESPONSE_BYTES: usize = 1_000_000;

/// User agent sent with every fetch.
pub const USER_AGENT: &str = "InquiryOS/0.1 (Research Reader)";

/// Per-request timeout.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// A downloaded page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub status: u16,
    pub html: String,
}

/// HTTP fetcher with SSRF guards and a response size cap.
#[derive(Clone)]
pub struct WebFetcher {
    client: reqwest::Client,
}

impl Default for WebFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl WebFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .gzip(true)
            .brotli(true)
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    /// Validate and download a URL's HTML.
    ///
    /// Follows redirects; non-success statuses and oversized bodies are
    /// `Transport` errors, rejected URLs are `UnsafeUrl`.
    pub async fn fetch_html(&self, url: &str) -> Result<FetchedPage, PipelineError> {
        validate_url(url)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PipelineError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::Transport(format!(
                "HTTP {} for {}",
                status.as_u16(),
                url
            )));
        }

        let mut body: Vec<u8> = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| PipelineError::Transport(e.to_string()))?;
            if body.len() + chunk.len() > MAX_RESPONSE_BYTES {
                return Err(PipelineError::Transport("Response too large".to_string()));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(FetchedPage {
            url: url.to_string(),
            status: status.as_u16(),
            html: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}

/// Reject URLs the reader must never touch.
pub fn validate_url(url: &str) -> Result<(), PipelineError> {
    let parsed =
        Url::parse(url).map_err(|_| PipelineError::UnsafeUrl(format!("Invalid URL: {url}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(PipelineError::UnsafeUrl(
            "Only http/https URLs are allowed.".to_string(),
        ));
    }

    let host = match parsed.host_str() {
        Some(host) if !host.is_empty() => host,
        _ => {
            return Err(PipelineError::UnsafeUrl(
                "URL must include a hostname.".to_string(),
            ))
        }
    };

    if host.eq_ignore_ascii_case("localhost") {
        return Err(PipelineError::UnsafeUrl(
            "Localhost URLs are not allowed.".to_string(),
        ));
    }

    // If the hostname is an IP literal, block private/local ranges
    let literal = host.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = literal.parse::<IpAddr>() {
        if is_private_or_local_ip(ip) {
            return Err(PipelineError::UnsafeUrl(
                "Private/local IP URLs are not allowed.".to_string(),
            ));
        }
    }

    Ok(())
}

fn is_private_or_local_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let octets = v4.octets();
            v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_multicast()
                || v4.is_broadcast()
                || v4.is_documentation()
                || v4.is_unspecified()
                // 100.64.0.0/10 shared address space (CGNAT)
                || (octets[0] == 100 && (octets[1] & 0xc0) == 64)
                // 198.18.0.0/15 benchmarking
                || (octets[0] == 198 && (octets[1] & 0xfe) == 18)
                // 240.0.0.0/4 reserved
                || (octets[0] & 0xf0) == 240
        }
        IpAddr::V6(v6) => {
            let segments = v6.segments();
            v6.is_loopback()
                || v6.is_multicast()
                || v6.is_unspecified()
                // fc00::/7 unique local
                || (segments[0] & 0xfe00) == 0xfc00
                // fe80::/10 link local
                || (segments[0] & 0xffc0) == 0xfe80
        }
    }
}

/// Tags whose subtrees carry no readable content.
const SKIP_TAGS: [&str; 7] = [
    "script", "style", "noscript", "header", "footer", "nav", "aside",
];

/// Extract readable text from an HTML document.
///
/// Skips script/style/chrome subtrees and normalizes all whitespace runs
/// to single spaces.
pub fn extract_text_from_html(html: &str) -> String {
    let document = Html::parse_document(html);

    let mut raw = String::new();
    let mut stack = vec![document.tree.root()];
    while let Some(node) = stack.pop() {
        match node.value() {
            Node::Text(text) => {
                raw.push(' ');
                raw.push_str(text);
                continue;
            }
            Node::Element(element) if SKIP_TAGS.contains(&element.name()) => continue,
            _ => {}
        }
        // Reversed so popping visits children in document order
        let children: Vec<_> = node.children().collect();
        stack.extend(children.into_iter().rev());
    }

    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First `max_chars` characters of the trimmed text.
pub fn basic_summary(text: &str, max_chars: usize) -> String {
    truncate_chars(text.trim(), max_chars).trim().to_string()
}

/// Truncate to a character count (not bytes, so multi-byte text is safe).
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    text.chars().take(max_chars).collect()
}
