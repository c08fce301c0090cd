//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements     | Connects to                  |
//! |------------|----------------|------------------------------|
//! | `hardware` | ActuatorPort   | X-Core bus line, pump relay  |
//! |            | ClimateSensor  | DHT21 data line              |
//! | `log_sink` | EventSink      | Serial log output            |
//! | `mqtt`     | BrokerPort     | ESP-IDF MQTT client          |
//! | `nvs`      | StoragePort    | NVS / in-memory store        |
//! | `time`     | —              | ESP32 system timer           |
//! | `wifi`     | NetworkPort    | ESP-IDF WiFi STA             |

pub mod hardware;
pub mod log_sink;
pub mod mqtt;
pub mod nvs;
pub mod time;
pub mod wifi;
