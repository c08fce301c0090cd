fn main() {
    // Build-time fallbacks baked into `config.rs` via option_env!.
    for var in [
        "HUNTER_WIFI_SSID",
        "HUNTER_WIFI_PASSWORD",
        "HUNTER_BROKER_IP",
        "HUNTER_BROKER_PORT",
        "HUNTER_TOPIC_PREFIX",
    ] {
        println!("cargo:rerun-if-env-changed={var}");
    }

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
