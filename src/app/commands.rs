//! Inbound commands to the application service.
//!
//! [`FeederCommand::parse`] turns one framed line into a typed command.
//! All parameter validation happens here, before any device state is
//! consulted, so a malformed request is always answered the same way
//! regardless of what the feeder is doing.

use crate::app::ports::ScaleChannel;
use crate::error::CommandError;
use crate::protocol::Request;
use crate::protocol::schedule_text::{self, EMPTY_TABLE};
use crate::scheduler::{Amount, ScheduleTable};

/// Commands the companion can send.
#[derive(Debug, Clone, PartialEq)]
pub enum FeederCommand {
    /// Report time, readings, alarms and busy flag.
    Status,
    /// Dispense one portion now.
    Feed(Amount),
    /// Report last-fed / last-eaten snapshot.
    Log,
    /// Zero a load cell at its current reading.
    Tare(ScaleChannel),
    /// Derive a scale factor from a known reference weight.
    Calibrate { channel: ScaleChannel, weight_g: u32 },
    /// Re-anchor the wall clock.
    SetTime(u32),
    /// Replace the schedule table (possibly with an empty one).
    Schedule(ScheduleTable),
    /// Report the schedule table.
    GetSchedule,
    /// Storage integrity check.
    StorageDiag,
}

impl FeederCommand {
    /// Parse a line beginning with the `AT+` marker.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let request = Request::split(line).ok_or(CommandError::Syntax)?;
        let param = request.param;

        match request.name {
            "STATUS" => Ok(Self::Status),
            "LOG" => Ok(Self::Log),
            "GETSCHED" => Ok(Self::GetSchedule),
            "EEDIAG" => Ok(Self::StorageDiag),
            "FEED" => parse_amount(param).map(Self::Feed),
            "TARE" => param
                .and_then(ScaleChannel::from_name)
                .map(Self::Tare)
                .ok_or(CommandError::ParamErr),
            "CAL" => parse_calibration(param),
            "SETTIME" => parse_timestamp(param).map(Self::SetTime),
            "SCHED" => parse_schedule(param).map(Self::Schedule),
            _ => Err(CommandError::UnknownCmd),
        }
    }
}

fn parse_amount(param: Option<&str>) -> Result<Amount, CommandError> {
    match param.map(str::as_bytes) {
        Some(&[code]) => Amount::from_code(code).ok_or(CommandError::ParamErr),
        _ => Err(CommandError::ParamErr),
    }
}

fn parse_calibration(param: Option<&str>) -> Result<FeederCommand, CommandError> {
    let (sensor, weight) = param
        .and_then(|p| p.split_once(','))
        .ok_or(CommandError::ParamErr)?;
    let weight_g = weight
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|&w| w > 0)
        .ok_or(CommandError::ParamErr)?;
    let channel = ScaleChannel::from_name(sensor).ok_or(CommandError::ParamErr)?;
    Ok(FeederCommand::Calibrate { channel, weight_g })
}

/// Leading decimal digits; anything else (including 0 and overflow) is
/// rejected.
fn parse_timestamp(param: Option<&str>) -> Result<u32, CommandError> {
    let text = param.unwrap_or("");
    let end = text
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(text.len());
    text[..end]
        .parse::<u32>()
        .ok()
        .filter(|&ts| ts != 0)
        .ok_or(CommandError::InvalidTimestamp)
}

fn parse_schedule(param: Option<&str>) -> Result<ScheduleTable, CommandError> {
    match param {
        None | Some("") => Err(CommandError::ParamErr),
        Some(EMPTY_TABLE) => Ok(ScheduleTable::new()),
        Some(text) => Ok(schedule_text::parse_table(text)),
    }
}
