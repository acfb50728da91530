//! Desktop power pack for trying the browser client without hardware.
//!
//! Runs the real control task against mock PWM, fault and sensor hardware and
//! serves the same WebSocket protocol as the board:
//! - WebSocket at ws://localhost:8080/ws
//! - Decoded status at http://localhost:8080/api/status
//! - Console commands (`RMPP`, `MODE`, `?`) on stdin
//!
//! # Usage
//!
//! ```sh
//! RUST_LOG=debug cargo run --example desktop_server --features web
//! ```

use std::io::BufRead;
use std::sync::Arc;
use std::thread;

use rs_rmpp::events::DEFAULT_QUEUE_DEPTH;
use rs_rmpp::hal::{LogIndicator, MockFault, MockPwm, MockSensors, StdClock};
use rs_rmpp::services::{run_server, WebServerConfig, WebTransport};
use rs_rmpp::traits::Clock;
use rs_rmpp::{event_queue, Config, ControlEvent, ControlTask, OutputController};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=================================");
    println!("  rs-rmpp Desktop Power Pack");
    println!("=================================");
    println!();

    // Central configuration - modify this for your setup
    let config = Config::default();
    // Example of customization:
    // let config = Config::default()
    //     .with_web(rs_rmpp::WebConfig::default().with_port(3000))
    //     .with_output(rs_rmpp::OutputConfig::default().with_alive_timeout_ms(5000));

    let web_config = WebServerConfig::new(([0, 0, 0, 0], 8080)).cors(config.web.cors_permissive);
    let (events, receiver) = event_queue(DEFAULT_QUEUE_DEPTH);
    let transport = Arc::new(WebTransport::new(events.clone()));

    // =========================================================================
    // Control task on its own thread, single owner of the controller
    // =========================================================================
    let sink = transport.sink();
    let output = config.output.clone();
    thread::spawn(move || {
        let clock = StdClock::new();
        let controller =
            OutputController::new(MockPwm::new(), MockFault::new(), LogIndicator::new());
        let mut task = ControlTask::new(
            controller,
            MockSensors::new(),
            sink,
            receiver,
            &output,
            clock.now_ms(),
        );
        task.run(&clock)
    });

    // =========================================================================
    // Console lines from stdin
    // =========================================================================
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines().map_while(Result::ok) {
            events.post(ControlEvent::console(&line));
        }
    });

    println!("Starting web server...");
    println!("  WebSocket: ws://{}/ws", web_config.addr);
    println!("  Status:    http://{}/api/status", web_config.addr);
    println!();
    println!("Type RMPP or MODE for a report. Press Ctrl+C to stop.");
    println!();

    let rt = tokio::runtime::Runtime::new().expect("Failed to create runtime");
    if let Err(e) = rt.block_on(run_server(transport, web_config)) {
        eprintln!("Web server error: {}", e);
        std::process::exit(1);
    }
}
