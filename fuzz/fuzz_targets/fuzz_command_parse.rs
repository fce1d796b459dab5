//! Fuzz target: `FeederCommand::parse`
//!
//! Arbitrary UTF-8 after the `AT+` marker must parse to a command or a
//! typed error, never a panic.  Any schedule that parses must fit the
//! table and render back through `format_table`.
//!
//! cargo fuzz run fuzz_command_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use petfeeder::app::commands::FeederCommand;
use petfeeder::protocol::schedule_text::format_table;
use petfeeder::scheduler::MAX_ENTRIES;

fuzz_target!(|data: &[u8]| {
    let Ok(body) = core::str::from_utf8(data) else {
        return;
    };
    let line = format!("AT+{body}");

    if let Ok(FeederCommand::Schedule(table)) = FeederCommand::parse(&line) {
        assert!(table.len() <= MAX_ENTRIES);
        let _ = format_table(&table);
    }
});
