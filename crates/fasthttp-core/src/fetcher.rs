//! Single-range HTTP GET streamed into a sink.
//!
//! A `Whole` range is a plain GET that must answer 200; a `Bytes` range sends
//! `Range: bytes=start-end` and must answer 206. Body increments (bounded by
//! the curl receive buffer) are written at increasing absolute offsets from
//! the range start. There are no retries: any failure is final for the range.

use std::cell::{Cell, RefCell};
use std::str;

use crate::config::CurlOptions;
use crate::error::FetchError;
use crate::planner::FetchRange;
use crate::probe::status_code;
use crate::sink::RandomAccessSink;

/// Downloads one range of `url` into `sink`. Returns the number of bytes written.
pub fn fetch_range(
    sink: &dyn RandomAccessSink,
    url: &str,
    range: FetchRange,
    opts: &CurlOptions,
) -> Result<u64, FetchError> {
    let transfer_err = |source| FetchError::Transfer { range, source };
    let expected = range.expected_status();

    // Status of the latest response seen by the header callback; with
    // redirects this ends on the final hop before any body bytes arrive.
    let status: Cell<Option<u32>> = Cell::new(None);
    let storage_error: RefCell<Option<std::io::Error>> = RefCell::new(None);
    let written = Cell::new(0u64);

    let mut easy = curl::easy::Easy::new();
    easy.url(url).map_err(transfer_err)?;
    opts.apply(&mut easy).map_err(transfer_err)?;
    if let Some(r) = range.curl_range() {
        easy.range(&r).map_err(transfer_err)?;
    }

    let outcome = {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|data| {
                if let Some(code) = str::from_utf8(data).ok().and_then(status_code) {
                    status.set(Some(code));
                }
                true
            })
            .map_err(transfer_err)?;
        transfer
            .write_function(|data| {
                // Never place a body we did not ask for (e.g. a 200 full body
                // answering a range request) into the sink.
                if status.get() != Some(expected) {
                    return Ok(0);
                }
                let offset = range.start() + written.get();
                match sink.write_at(offset, data) {
                    Ok(()) => {
                        written.set(written.get() + data.len() as u64);
                        Ok(data.len())
                    }
                    Err(e) => {
                        *storage_error.borrow_mut() = Some(e);
                        Ok(0) // abort transfer
                    }
                }
            })
            .map_err(transfer_err)?;
        transfer.perform()
    };

    let outcome = match outcome {
        Err(e) if !e.is_write_error() => return Err(transfer_err(e)),
        other => other,
    };

    let actual = easy.response_code().map_err(transfer_err)?;
    if actual != expected {
        return Err(FetchError::RangeRequest {
            expected,
            actual,
            range,
        });
    }
    if let Some(e) = storage_error.into_inner() {
        return Err(FetchError::storage(e));
    }
    outcome.map_err(transfer_err)?;

    let written = written.get();
    tracing::debug!(url, ?range, bytes = written, "range complete");
    Ok(written)
}
