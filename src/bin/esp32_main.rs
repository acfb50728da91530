//! ATOM Lite power pack firmware.
//!
//! Brings up the hardware and the network, then hands everything to the
//! control task, which owns the output controller from then on:
//! - Wi-Fi in station or soft-AP mode (front button hold toggles it)
//! - WebSocket endpoint at `/ws` carrying the binary protocol
//! - Button thread posting click/hold gestures
//! - Serial console thread (`RMPP`, `MODE`, `?`)
//!
//! # Build
//!
//! ```bash
//! # Station mode credentials are taken at build time
//! WIFI_SSID=layout WIFI_PASSWORD=secret cargo build --release --features esp32-ws
//!
//! # Flash and monitor
//! espflash flash --monitor target/xtensa-esp32-espidf/release/esp32_main
//! ```

use std::io::BufRead;
use std::thread;
use std::time::Duration;

use esp_idf_hal::adc::oneshot::AdcDriver;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use rs_rmpp::events::DEFAULT_QUEUE_DEPTH;
use rs_rmpp::hal::esp32::{
    Esp32Button, Esp32Fault, Esp32ModeStore, Esp32Pwm, Esp32Sensors, Esp32Wifi, Esp32WsServer,
};
use rs_rmpp::hal::{LogIndicator, StdClock};
use rs_rmpp::traits::Clock;
use rs_rmpp::{event_queue, Config, ControlEvent, ControlTask, NetworkConfig, OutputController};

/// Button sampling period.
const BUTTON_POLL_MS: u64 = 5;

/// Delay before rebooting after a failed start.
const RESTART_DELAY_MS: u64 = 5000;

fn main() {
    // Initialize ESP-IDF
    esp_idf_hal::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    println!();
    println!("================================");
    println!("  rs-rmpp ATOM Lite Power Pack");
    println!("================================");
    println!();

    if let Err(e) = run() {
        log::error!("boot failed: {:?}", e);
        println!("[FAIL] {:?}, restarting in {} ms", e, RESTART_DELAY_MS);
        thread::sleep(Duration::from_millis(RESTART_DELAY_MS));
        unsafe { esp_idf_hal::sys::esp_restart() };
    }
}

fn run() -> anyhow::Result<()> {
    // =========================================================================
    // Configuration
    // =========================================================================
    // A mode saved with the button overrides the build-time default.
    let nvs = EspDefaultNvsPartition::take()?;
    let mut mode_store = Esp32ModeStore::new(nvs.clone())?;

    let mut network = NetworkConfig::default();
    if let Some(ssid) = option_env!("WIFI_SSID") {
        network = network.with_station(ssid, option_env!("WIFI_PASSWORD").unwrap_or(""));
    }
    let network = network.with_stored_mode(&mut mode_store);
    let config = Config::default().with_network(network);

    let peripherals = Peripherals::take()?;

    // =========================================================================
    // Output stage (PWM on GPIO19/23, fault on GPIO22)
    // =========================================================================
    let pwm = Esp32Pwm::new(
        peripherals.pins.gpio19,
        peripherals.pins.gpio23,
        peripherals.ledc.timer0,
        peripherals.ledc.channel0,
        peripherals.ledc.channel1,
        config.output.pwm_frequency_hz,
    )?;
    println!(
        "[OK] PWM initialized (GPIO19/23, {} Hz)",
        config.output.pwm_frequency_hz
    );

    let fault = Esp32Fault::new(peripherals.pins.gpio22)?;
    println!("[OK] Fault input initialized (GPIO22)");

    let mut controller = OutputController::new(pwm, fault, LogIndicator::new());
    controller.reset_output()?;

    // =========================================================================
    // Sensors (ADC1 on GPIO33)
    // =========================================================================
    // The channel driver borrows the ADC for the life of the firmware.
    let adc: &'static AdcDriver<'static, _> = Box::leak(Box::new(AdcDriver::new(peripherals.adc1)?));
    let sensors = Esp32Sensors::new(adc, peripherals.pins.gpio33)?;
    println!("[OK] Sensors initialized (GPIO33 ADC)");

    // =========================================================================
    // Network
    // =========================================================================
    let (events, receiver) = event_queue(DEFAULT_QUEUE_DEPTH);

    let sysloop = EspSystemEventLoop::take()?;
    let wifi = Esp32Wifi::new(
        peripherals.modem,
        sysloop,
        Some(nvs),
        &config.network,
        events.clone(),
    )?;
    println!(
        "[OK] WiFi up in {} mode: {:?}",
        wifi.mode().as_str(),
        wifi.ip_addr()
    );

    let server = Esp32WsServer::new(&config.web, events.clone())?;
    let sink = server.sink()?;
    println!("[OK] WebSocket endpoint at ws://<ip>:{}/ws", config.web.port);

    // =========================================================================
    // Button thread (GPIO39)
    // =========================================================================
    let mut button = Esp32Button::new(peripherals.pins.gpio39)?;
    let button_events = events.clone();
    thread::Builder::new()
        .name("button".into())
        .stack_size(4096)
        .spawn(move || {
            let clock = StdClock::new();
            loop {
                button_events.poll_button(&mut button, clock.now_ms());
                thread::sleep(Duration::from_millis(BUTTON_POLL_MS));
            }
        })?;
    println!("[OK] Button initialized (GPIO39)");

    // =========================================================================
    // Serial console thread
    // =========================================================================
    let console_events = events;
    thread::Builder::new()
        .name("console".into())
        .stack_size(4096)
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        console_events.post(ControlEvent::console(&line));
                    }
                    Err(e) => {
                        log::warn!("console read failed: {}", e);
                        thread::sleep(Duration::from_millis(100));
                    }
                }
            }
        })?;

    println!();
    println!("Controls:");
    println!("  Button click:  Stop output (1 s restart inhibit)");
    println!("  Button hold:   Toggle Wi-Fi mode (applied after reset)");
    println!("  Console:       RMPP, MODE, ?");
    println!();
    println!("Starting control task...");
    println!();

    // =========================================================================
    // Control task
    // =========================================================================
    let clock = StdClock::new();
    let mut task = ControlTask::new(
        controller,
        sensors,
        sink,
        receiver,
        &config.output,
        clock.now_ms(),
    )
    .with_network_mode(wifi.mode())
    .with_mode_store(mode_store);

    task.run(&clock)
}
