//! AT-style line protocol spoken with the companion controller.
//!
//! ```text
//! request   AT+<NAME>[=<PARAM>]\n      (\r ignored)
//! response  +OK | +OK: <payload> | +ERR: <code>\r\n
//! ```
//!
//! The device also originates one unsolicited request, [`GETTIME_REQUEST`],
//! which the companion answers with `AT+SETTIME=<unix>`.

pub mod response;
pub mod schedule_text;

pub use response::{Payload, Response};

/// Command marker every request starts with.
pub const MARKER: &str = "AT+";

/// Sent at boot and while a resync is pending.
pub const GETTIME_REQUEST: &str = "AT+GETTIME";

/// A request split into name and optional parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request<'a> {
    pub name: &'a str,
    pub param: Option<&'a str>,
}

impl<'a> Request<'a> {
    /// Split `AT+NAME[=PARAM]`.  Returns `None` if the marker is missing.
    pub fn split(line: &'a str) -> Option<Self> {
        let body = line.trim_end().strip_prefix(MARKER)?;
        Some(match body.split_once('=') {
            Some((name, param)) => Self {
                name,
                param: Some(param),
            },
            None => Self {
                name: body,
                param: None,
            },
        })
    }
}
