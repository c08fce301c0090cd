//! GPIO pin assignments for the bridge board.
//!
//! Single source of truth — `main` references this module rather than
//! hard-coding pin numbers.  Numbers follow the original D1-mini wiring
//! carried over to an ESP32 DevKit (D0 → GPIO16, D1 → GPIO5, D2 → GPIO4).

// ---------------------------------------------------------------------------
// X-Core bus
// ---------------------------------------------------------------------------

/// Push-pull output to the timer's REM terminal through the level shifter.
/// Idle LOW.
pub const BUS_GPIO: i32 = 16;

// ---------------------------------------------------------------------------
// Auxiliary pump relay (optional, see `BridgeConfig::use_pump`)
// ---------------------------------------------------------------------------

/// Digital output: HIGH = relay energised.
pub const PUMP_GPIO: i32 = 5;

// ---------------------------------------------------------------------------
// Climate sensor (AM2301 / DHT21)
// ---------------------------------------------------------------------------

/// Open-drain data line with external 10 kΩ pull-up.
pub const CLIMATE_GPIO: i32 = 4;
