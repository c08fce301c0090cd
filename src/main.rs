//! HunterBridge Firmware — Main Entry Point
//!
//! Hexagonal architecture around a single cooperative control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  WifiAdapter     MqttAdapter     HardwareAdapter   NvsAdapter  │
//! │  (NetworkPort)   (BrokerPort)    (ActuatorPort)    (Storage)   │
//! │  LogEventSink    Dht21 (ClimateSensor)                         │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │           UpdateDispatcher (pure logic)                │    │
//! │  │  pending set · ConfigStore · retry policies            │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  MQTT task ──▶ INBOX channel ──▶ main loop ──▶ intake          │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use anyhow::{Result, anyhow};
use esp_idf_hal::delay::{Ets, FreeRtos};
use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, PinDriver, Pull};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};
use log::{info, warn};

use hunterbridge::adapters::hardware::HardwareAdapter;
use hunterbridge::adapters::log_sink::LogEventSink;
use hunterbridge::adapters::mqtt::{self, MqttAdapter};
use hunterbridge::adapters::nvs::NvsAdapter;
use hunterbridge::adapters::time::Uptime;
use hunterbridge::adapters::wifi::WifiAdapter;
use hunterbridge::app::dispatcher::UpdateDispatcher;
use hunterbridge::config::{BridgeConfig, LinkDefaults};
use hunterbridge::drivers::bus::BusDriver;
use hunterbridge::drivers::dht::Dht21;
use hunterbridge::drivers::pump::PumpRelay;
use hunterbridge::pins;
use hunterbridge::sensors::climate::ClimateMonitor;
use hunterbridge::store::ConfigStore;

const MQTT_CLIENT_ID: &str = "hunterbridge";

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  HunterBridge v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = BridgeConfig::default();
    let peripherals = Peripherals::take()?;
    let sys_loop = EspSystemEventLoop::take()?;

    // ── 2. Durable record ─────────────────────────────────────
    let nvs = NvsAdapter::new().map_err(|e| anyhow!("NVS init failed: {e}"))?;
    let store = ConfigStore::open(nvs, LinkDefaults::from_build_env());

    // ── 3. Network and broker adapters ────────────────────────
    // WiFi keeps no state in NVS; the record is the only source of
    // credentials.
    let esp_wifi = EspWifi::new(peripherals.modem, sys_loop.clone(), None)?;
    let wifi = WifiAdapter::new(BlockingWifi::wrap(esp_wifi, sys_loop)?);
    let mqtt_adapter = MqttAdapter::new(MQTT_CLIENT_ID);

    // ── 4. Pins ───────────────────────────────────────────────
    // SAFETY: each GPIO number is claimed exactly once, here, and the
    // `pins` fields of `peripherals` are never used.
    let bus_pin = PinDriver::output(unsafe { AnyOutputPin::new(pins::BUS_GPIO) })?;
    let bus = BusDriver::new(bus_pin, Ets)?;

    let pump = if config.use_pump {
        // SAFETY: see above.
        let relay_pin = PinDriver::output(unsafe { AnyOutputPin::new(pins::PUMP_GPIO) })?;
        Some(PumpRelay::new(relay_pin)?)
    } else {
        None
    };

    // SAFETY: see above.
    let mut dht_pin = PinDriver::input_output_od(unsafe { AnyIOPin::new(pins::CLIMATE_GPIO) })?;
    dht_pin.set_pull(Pull::Up)?;
    let mut climate = match Dht21::new(dht_pin, Ets) {
        Ok(s) => Some(s),
        Err(e) => {
            warn!("DHT21 unavailable ({}), climate reports disabled", e);
            None
        }
    };

    // ── 5. Core ───────────────────────────────────────────────
    let mut dispatcher = UpdateDispatcher::new(
        store,
        wifi,
        mqtt_adapter,
        HardwareAdapter::new(bus, pump),
        FreeRtos,
        &config,
    );
    let mut sink = LogEventSink::new();
    let mut monitor = ClimateMonitor::new(u64::from(config.climate_interval_ms));
    let uptime = Uptime::new();

    dispatcher.start(&mut sink);

    // ── 6. Control loop ───────────────────────────────────────
    loop {
        while let Some(payload) = mqtt::take_inbound() {
            // Rejections are already reported through the sink.
            let _ = dispatcher.intake(&payload, &mut sink);
        }

        dispatcher.step(&mut sink);
        dispatcher.broker_mut().poll();

        if let Some(sensor) = climate.as_mut() {
            let thresholds = dispatcher.store().thresholds();
            if let Some(sample) = monitor.poll(sensor, &thresholds, uptime.millis()) {
                dispatcher.report_climate(sample, &mut sink);
            }
        }

        FreeRtos::delay_ms(config.loop_interval_ms);
    }
}
