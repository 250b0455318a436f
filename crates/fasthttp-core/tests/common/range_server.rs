//! Minimal HTTP/1.1 server that supports HEAD and Range GET for integration tests.
//!
//! Serves a single static body. Responds to HEAD with Content-Length and
//! Accept-Ranges: bytes; responds to GET with Range with 206 Partial Content.
//! Every request line and Range header is recorded so tests can assert what
//! went over the wire. Options can make the server lie about the length or cut
//! a body short to exercise failure paths.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Debug, Clone, Copy)]
pub struct RangeServerOptions {
    /// Status returned to HEAD (200 = normal).
    pub head_status: u16,
    /// If false, GET ignores Range and always returns 200 with the full body.
    pub support_ranges: bool,
    /// If false, omit `Accept-Ranges: bytes` header even if ranges work.
    pub advertise_ranges: bool,
    /// If false, HEAD omits `Content-Length`.
    pub advertise_length: bool,
    /// Answer a range GET starting at this offset with the given status.
    pub fail_range_start: Option<(u64, u16)>,
    /// HEAD advertises this `Content-Length` instead of the real body size.
    pub head_length: Option<u64>,
    /// The response whose body starts at this offset (0 for a plain GET)
    /// sends its full `Content-Length` but closes after a few bytes.
    pub truncate_body: Option<u64>,
}

impl Default for RangeServerOptions {
    fn default() -> Self {
        Self {
            head_status: 200,
            support_ranges: true,
            advertise_ranges: true,
            advertise_length: true,
            fail_range_start: None,
            head_length: None,
            truncate_body: None,
        }
    }
}

/// One request as seen by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub method: String,
    pub range: Option<String>,
}

pub struct RangeServer {
    pub url: String,
    log: Arc<Mutex<Vec<Recorded>>>,
}

impl RangeServer {
    pub fn requests(&self) -> Vec<Recorded> {
        self.log.lock().unwrap().clone()
    }

    pub fn gets(&self) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == "GET")
            .collect()
    }
}

/// Starts a server in a background thread serving `body`. The server runs
/// until the process exits.
pub fn start(body: Vec<u8>) -> RangeServer {
    start_with_options(body, RangeServerOptions::default())
}

/// Like `start` but allows customizing server behavior.
pub fn start_with_options(body: Vec<u8>, opts: RangeServerOptions) -> RangeServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let log = Arc::new(Mutex::new(Vec::new()));
    let server_log = Arc::clone(&log);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let log = Arc::clone(&server_log);
            thread::spawn(move || handle(stream, &body, opts, &log));
        }
    });
    RangeServer {
        url: format!("http://127.0.0.1:{}/file.bin", port),
        log,
    }
}

fn status_text(code: u16) -> &'static str {
    match code {
        200 => "OK",
        206 => "Partial Content",
        404 => "Not Found",
        416 => "Range Not Satisfiable",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

fn handle(
    mut stream: std::net::TcpStream,
    body: &[u8],
    opts: RangeServerOptions,
    log: &Mutex<Vec<Recorded>>,
) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let (method, range_raw) = parse_request(request);
    log.lock().unwrap().push(Recorded {
        method: method.to_string(),
        range: range_raw.clone(),
    });
    let range = range_raw.as_deref().and_then(parse_range);

    let total = body.len() as u64;
    let accept_ranges = if opts.advertise_ranges && opts.support_ranges {
        "Accept-Ranges: bytes\r\n"
    } else {
        ""
    };

    if method.eq_ignore_ascii_case("HEAD") {
        let length = if opts.advertise_length {
            format!("Content-Length: {}\r\n", opts.head_length.unwrap_or(total))
        } else {
            String::new()
        };
        let response = format!(
            "HTTP/1.1 {} {}\r\n{}{}Connection: close\r\n\r\n",
            opts.head_status,
            status_text(opts.head_status),
            length,
            accept_ranges
        );
        let _ = stream.write_all(response.as_bytes());
        return;
    }

    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nConnection: close\r\n\r\n");
        return;
    }

    let ranged = range.filter(|_| opts.support_ranges);
    let slice_start = ranged.map(|(start, _)| start).unwrap_or(0);
    let (status, slice) = match ranged {
        Some((start, _)) if opts.fail_range_start.map(|(s, _)| s) == Some(start) => {
            let code = opts.fail_range_start.map(|(_, c)| c).unwrap_or(500);
            (code, &body[0..0])
        }
        Some((start, end_incl)) => {
            let end_incl = end_incl.min(total.saturating_sub(1));
            if start > end_incl || start >= total {
                (416, &body[0..0])
            } else {
                (206, &body[start as usize..=end_incl as usize])
            }
        }
        None => (200, body),
    };

    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\n{}Connection: close\r\n\r\n",
        status,
        status_text(status),
        slice.len(),
        accept_ranges
    );
    let _ = stream.write_all(response.as_bytes());
    if opts.truncate_body == Some(slice_start) && slice.len() > TRUNCATED_LEN {
        let _ = stream.write_all(&slice[..TRUNCATED_LEN]);
        let _ = stream.shutdown(std::net::Shutdown::Both);
        return;
    }
    let _ = stream.write_all(slice);
}

/// Bytes sent before a truncated response closes the connection.
const TRUNCATED_LEN: usize = 16;

/// Returns (method, raw Range header value if present).
fn parse_request(request: &str) -> (&str, Option<String>) {
    let mut method = "";
    let mut range = None;
    for line in request.lines() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if method.is_empty() {
            method = line.split_whitespace().next().unwrap_or("");
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("range") {
                range = Some(value.trim().to_string());
            }
        }
    }
    (method, range)
}

/// Parses `bytes=X-Y` into (start, end_inclusive).
fn parse_range(value: &str) -> Option<(u64, u64)> {
    let part = value.strip_prefix("bytes=")?;
    let (a, b) = part.split_once('-')?;
    let start = a.trim().parse::<u64>().ok()?;
    let end = b.trim();
    let end_incl = if end.is_empty() {
        u64::MAX
    } else {
        end.parse::<u64>().ok()?
    };
    Some((start, end_incl))
}
