//! Text form of the schedule table used by SCHED / GETSCHED.
//!
//! Canonical entry: `HHMM` followed by the amount letter, e.g. `0700M`.
//! Entries are joined with `;`.  An empty table is `NONE`.
//!
//! Parsing is lenient per entry: invalid entries are dropped and the rest
//! are kept.  The compact form takes the first four digits before the
//! trailing amount letter (so `07:00M` also works); failing that, the
//! legacy `HH:MM,A[,E]` form is tried.

use core::fmt::Write;

use crate::scheduler::{Amount, MAX_ENTRIES, ScheduleEntry, ScheduleTable};

use super::response::Payload;

/// Keyword for an empty table in both directions.
pub const EMPTY_TABLE: &str = "NONE";

/// Tokens examined per SCHED line, valid or not.
const MAX_TOKENS: usize = 16;

/// Parse a `;`-separated list.  Empty tokens are skipped and do not count
/// toward the token limit.
pub fn parse_table(text: &str) -> ScheduleTable {
    let mut table = ScheduleTable::new();
    for token in text.split(';').filter(|t| !t.is_empty()).take(MAX_TOKENS) {
        if table.len() >= MAX_ENTRIES {
            break;
        }
        match parse_entry(token) {
            Some(entry) => {
                // Capacity checked above.
                let _ = table.push(entry);
            }
            None => log::debug!("schedule: dropping invalid entry '{}'", token),
        }
    }
    table
}

/// Parse one entry in compact or legacy form.
pub fn parse_entry(token: &str) -> Option<ScheduleEntry> {
    parse_compact(token).or_else(|| parse_legacy(token))
}

fn parse_compact(token: &str) -> Option<ScheduleEntry> {
    let bytes = token.as_bytes();
    if bytes.len() < 5 {
        return None;
    }
    let (time, last) = bytes.split_at(bytes.len() - 1);
    let amount = Amount::from_code(last[0])?;

    let mut digits = time.iter().filter(|b| b.is_ascii_digit()).map(|b| b - b'0');
    let mut next = || digits.next();
    let (h1, h0, m1, m0) = (next()?, next()?, next()?, next()?);
    ScheduleEntry::new(h1 * 10 + h0, m1 * 10 + m0, amount)
}

fn parse_legacy(token: &str) -> Option<ScheduleEntry> {
    let (hour, rest) = token.split_once(':')?;
    let (minute, rest) = rest.split_once(',')?;
    let amount = Amount::from_code(*rest.as_bytes().first()?)?;
    ScheduleEntry::new(
        leading_number(hour)?.try_into().ok()?,
        leading_number(minute)?.try_into().ok()?,
        amount,
    )
}

/// Leading ASCII digits after optional whitespace, like C `atoi` without
/// sign handling.
fn leading_number(text: &str) -> Option<u32> {
    let text = text.trim_start();
    let end = text
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(text.len());
    text[..end].parse().ok()
}

/// Canonical text form, or `NONE` for an empty table.
pub fn format_table(entries: &[ScheduleEntry]) -> Payload {
    let mut out = Payload::new();
    if entries.is_empty() {
        let _ = out.push_str(EMPTY_TABLE);
        return out;
    }
    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            let _ = out.push(';');
        }
        // 8 x 5 chars + 7 separators fits the payload.
        let _ = write!(
            out,
            "{:02}{:02}{}",
            entry.hour(),
            entry.minute(),
            entry.amount().code() as char
        );
    }
    out
}
