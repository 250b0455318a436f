//! HTTP HEAD / metadata probing.
//!
//! Uses the curl crate (libcurl) to fetch response headers and decide whether
//! the resource can be split: a known `Content-Length` and `Accept-Ranges: bytes`
//! are both required, otherwise the length is reported as unknown (0) and the
//! engine falls back to a single stream.

mod parse;

pub(crate) use parse::status_code;

use std::str;

use crate::config::CurlOptions;
use crate::error::ProbeError;

/// Key headers of a HEAD response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadResult {
    /// Total size in bytes, if `Content-Length` is present and non-negative.
    pub content_length: Option<u64>,
    /// True if server sent `Accept-Ranges: bytes`.
    pub accept_ranges: bool,
}

/// What the engine knows about a remote resource before fetching it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resource {
    /// Total length in bytes; 0 means unknown.
    pub length: u64,
    pub accepts_ranges: bool,
}

impl From<HeadResult> for Resource {
    fn from(head: HeadResult) -> Self {
        let length = match head.content_length {
            Some(n) if head.accept_ranges => n,
            _ => 0,
        };
        Resource {
            length,
            accepts_ranges: head.accept_ranges,
        }
    }
}

/// Performs a HEAD request and returns the resource length and range support.
///
/// A non-2xx status is an error; missing or unusable headers only degrade the
/// result to an unknown length.
/// Runs in the current thread; call from `spawn_blocking` if used from async code.
pub fn probe(url: &str, opts: &CurlOptions) -> Result<Resource, ProbeError> {
    let mut headers: Vec<String> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url).map_err(ProbeError::Request)?;
    easy.nobody(true).map_err(ProbeError::Request)?; // HEAD request
    opts.apply(&mut easy).map_err(ProbeError::Request)?;

    {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    headers.push(s.trim_end().to_string());
                }
                true
            })
            .map_err(ProbeError::Request)?;
        transfer.perform().map_err(ProbeError::Request)?;
    }

    let code = easy.response_code().map_err(ProbeError::Request)?;
    if !(200..300).contains(&code) {
        return Err(ProbeError::BadStatus(code));
    }

    let head = parse::parse_headers(&headers);
    let resource = Resource::from(head.clone());
    if resource.length == 0 {
        tracing::warn!(
            url,
            content_length = ?head.content_length,
            accept_ranges = head.accept_ranges,
            "length unknown or ranges unsupported; using a single stream"
        );
    }
    Ok(resource)
}
