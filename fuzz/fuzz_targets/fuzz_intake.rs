//! Fuzz target: `parse_config`
//!
//! Drives arbitrary bytes through the `<prefix>/config` parser and checks
//! that it never panics and never yields more commands than sections.
//!
//! cargo fuzz run fuzz_intake

#![no_main]

use hunterbridge::app::commands::{AppCommand, MAX_PAYLOAD_LEN, parse_config};
use hunterbridge::protocol::{encode_program, encode_zone};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(sections) = parse_config(data) else {
        return;
    };
    assert!(data.len() <= MAX_PAYLOAD_LEN);
    assert!(sections.len() <= 4);

    // Accepted watering commands must encode or fail cleanly.
    for cmd in sections.into_iter().flatten() {
        match cmd {
            AppCommand::Zone(z) => {
                let _ = encode_zone(z.zone, z.minutes);
            }
            AppCommand::Program(p) => {
                let _ = encode_program(p);
            }
            _ => {}
        }
    }
});
