//! Response lines: `+OK`, `+OK: <payload>`, `+ERR: <code>`.

use core::fmt::{self, Write};

use heapless::String;

use crate::error::CommandError;

/// Longest payload any handler produces (STATUS is ~80 bytes).
pub const PAYLOAD_CAP: usize = 128;
/// `+OK: ` prefix plus payload.
pub const LINE_CAP: usize = PAYLOAD_CAP + 8;

pub type Payload = String<PAYLOAD_CAP>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Ok,
    Data(Payload),
    Err(CommandError),
}

impl Response {
    /// Build a data response from format arguments.
    pub fn data(args: fmt::Arguments<'_>) -> Self {
        let mut payload = Payload::new();
        if payload.write_fmt(args).is_err() {
            log::warn!("response payload truncated at {} bytes", PAYLOAD_CAP);
        }
        Self::Data(payload)
    }

    pub fn text(text: &str) -> Self {
        Self::data(format_args!("{}", text))
    }

    pub fn is_ok(&self) -> bool {
        !matches!(self, Self::Err(_))
    }

    /// Render without line terminator.
    pub fn to_line(&self) -> String<LINE_CAP> {
        let mut line = String::new();
        // LINE_CAP covers the longest prefix plus a full payload.
        let _ = write!(line, "{self}");
        line
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => f.write_str("+OK"),
            Self::Data(payload) => write!(f, "+OK: {}", payload),
            Self::Err(e) => write!(f, "+ERR: {}", e.code()),
        }
    }
}

impl From<Result<Response, CommandError>> for Response {
    fn from(result: Result<Response, CommandError>) -> Self {
        result.unwrap_or_else(Self::Err)
    }
}
