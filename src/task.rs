//! The control task: single owner of the output controller.
//!
//! Each iteration drains the event queue, polls the controller (fault line,
//! alive watchdog, inhibit timer), publishes a status frame when one is due
//! and logs the periodic debug report.
//!
//! A button hold toggles the network mode and saves it through the task's
//! [`ModeStore`]; the new mode is applied on the next boot.
//!
//! # Example
//!
//! ```rust
//! use rs_rmpp::config::OutputConfig;
//! use rs_rmpp::events::{event_queue, ControlEvent};
//! use rs_rmpp::hal::{MockFault, MockIndicator, MockPwm, MockSensors, MockSink};
//! use rs_rmpp::task::ControlTask;
//! use rs_rmpp::traits::ClientId;
//! use rs_rmpp::{OutputController, OutputMode};
//!
//! let (tx, rx) = event_queue(8);
//! let controller = OutputController::new(MockPwm::new(), MockFault::new(), MockIndicator::new());
//! let mut task = ControlTask::new(controller, MockSensors::new(), MockSink::new(), rx, &OutputConfig::default(), 0);
//!
//! tx.post(ControlEvent::frame(&[0x12, 0x00, 0x48], ClientId::Client(1)).unwrap());
//! task.run_once(10);
//! assert_eq!(task.controller().mode(), OutputMode::On);
//!
//! task.run_once(250);
//! assert_eq!(task.sink().frames.len(), 1);
//! ```

use std::time::Duration;

use crate::cli::{default_console, StatusConsole, StatusContext};
use crate::config::{MemoryModeStore, ModeStore, NetworkMode, OutputConfig};
use crate::controller::OutputController;
use crate::events::{ControlEvent, EventReceiver};
use crate::telemetry::TelemetrySampler;
use crate::timer::Interval;
use crate::traits::{
    ButtonEvent, ClientId, Clock, FaultDetector, FrameSink, Indicator, PwmOutput, Sensors,
};

/// Loop period of [`ControlTask::run`].
pub const LOOP_PERIOD_MS: u64 = 1;

/// Owns the controller and everything it talks to.
pub struct ControlTask<P, F, I, S, K, M = MemoryModeStore>
where
    P: PwmOutput,
    F: FaultDetector,
    I: Indicator,
    S: Sensors,
    K: FrameSink,
    M: ModeStore,
{
    controller: OutputController<P, F, I>,
    telemetry: TelemetrySampler<S>,
    sink: K,
    events: EventReceiver,
    console: StatusConsole,
    last_reply: String,
    debug: Interval,
    network_mode: NetworkMode,
    pending_mode: NetworkMode,
    mode_store: M,
}

impl<P, F, I, S, K> ControlTask<P, F, I, S, K>
where
    P: PwmOutput,
    F: FaultDetector,
    I: Indicator,
    S: Sensors,
    K: FrameSink,
{
    /// Assemble the task and start the controller.
    ///
    /// The network mode is kept in memory until
    /// [`with_mode_store`](Self::with_mode_store) supplies persistent storage.
    pub fn new(
        controller: OutputController<P, F, I>,
        sensors: S,
        sink: K,
        events: EventReceiver,
        config: &OutputConfig,
        now_ms: u64,
    ) -> Self {
        let mut controller = controller.with_config(config);
        controller.begin();
        let network_mode = NetworkMode::default();
        controller.set_standby_color(network_mode.standby_color());

        Self {
            controller,
            telemetry: TelemetrySampler::with_interval(sensors, config.status_interval_ms, now_ms),
            sink,
            events,
            console: default_console(),
            last_reply: String::new(),
            debug: Interval::new(config.debug_interval_ms, now_ms),
            network_mode,
            pending_mode: network_mode,
            mode_store: MemoryModeStore::new(),
        }
    }
}

impl<P, F, I, S, K, M> ControlTask<P, F, I, S, K, M>
where
    P: PwmOutput,
    F: FaultDetector,
    I: Indicator,
    S: Sensors,
    K: FrameSink,
    M: ModeStore,
{
    /// Save button mode changes to `store`.
    pub fn with_mode_store<N: ModeStore>(self, store: N) -> ControlTask<P, F, I, S, K, N> {
        ControlTask {
            controller: self.controller,
            telemetry: self.telemetry,
            sink: self.sink,
            events: self.events,
            console: self.console,
            last_reply: self.last_reply,
            debug: self.debug,
            network_mode: self.network_mode,
            pending_mode: self.pending_mode,
            mode_store: store,
        }
    }

    /// Record the mode the network came up in.
    pub fn with_network_mode(mut self, mode: NetworkMode) -> Self {
        self.network_mode = mode;
        self.pending_mode = mode;
        self.controller.set_standby_color(mode.standby_color());
        self
    }

    /// The controller.
    pub fn controller(&self) -> &OutputController<P, F, I> {
        &self.controller
    }

    /// Mutable access to the controller.
    pub fn controller_mut(&mut self) -> &mut OutputController<P, F, I> {
        &mut self.controller
    }

    /// The outbound frame sink.
    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Mutable access to the outbound frame sink.
    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    /// Mutable access to the sensors.
    pub fn sensors_mut(&mut self) -> &mut S {
        self.telemetry.sensors_mut()
    }

    /// Output of the last console command.
    pub fn last_reply(&self) -> &str {
        &self.last_reply
    }

    /// Mode the network is running in.
    pub fn network_mode(&self) -> NetworkMode {
        self.network_mode
    }

    /// Mode that takes effect on the next boot.
    pub fn pending_network_mode(&self) -> NetworkMode {
        self.pending_mode
    }

    /// The network mode store.
    pub fn mode_store(&self) -> &M {
        &self.mode_store
    }

    /// Mutable access to the network mode store.
    pub fn mode_store_mut(&mut self) -> &mut M {
        &mut self.mode_store
    }

    /// One loop iteration at `now_ms`.
    pub fn run_once(&mut self, now_ms: u64) {
        while let Some(event) = self.events.try_next() {
            self.handle_event(event, now_ms);
        }

        // A PWM error has already moved the controller to FAIL and been logged.
        let _ = self.controller.poll(now_ms);

        let state = self.controller.state();
        if let Some(frame) = self.telemetry.poll(now_ms, &state) {
            if let Err(e) = self
                .sink
                .send_binary_frame(&frame.encode(), ClientId::Broadcast)
            {
                log::debug!("status frame dropped: {:?}", e);
            }
        }

        if self.debug.tick(now_ms) {
            let report = self.telemetry.report(&state);
            log::debug!("mode {} clients {}\n{}", state.mode(), self.controller.clients(), report);
        }
    }

    /// Run forever, one iteration per [`LOOP_PERIOD_MS`].
    pub fn run<C: Clock>(&mut self, clock: &C) -> ! {
        loop {
            self.run_once(clock.now_ms());
            std::thread::sleep(Duration::from_millis(LOOP_PERIOD_MS));
        }
    }

    fn handle_event(&mut self, event: ControlEvent, now_ms: u64) {
        match event {
            ControlEvent::Frame { data, client } => {
                log::trace!("frame from {:?}: {:02x?}", client, data.as_slice());
                let _ = self.controller.process_wire_command(&data, now_ms);
            }
            ControlEvent::ClientCount(count) => {
                log::info!("{} client(s) connected", count);
                self.controller.on_client_count_changed(count);
            }
            ControlEvent::Button(ButtonEvent::Click) => {
                let _ = self.controller.stop_output(true, now_ms);
            }
            ControlEvent::Button(ButtonEvent::Hold) => self.toggle_network_mode(),
            ControlEvent::Network(event) => {
                log::debug!("network event {:?}", event);
                self.controller.on_network_event(event);
            }
            ControlEvent::ConfigChanged => self.controller.on_config_changed(),
            ControlEvent::Console(line) => self.run_console(&line),
        }
    }

    fn toggle_network_mode(&mut self) {
        let mode = self.pending_mode.toggled();
        if let Err(e) = self.mode_store.save_mode(mode) {
            log::warn!("network mode not saved: {:?}", e);
            return;
        }
        self.pending_mode = mode;
        log::info!("network mode set to {}, applied after reset", mode.as_str());
        self.controller.on_config_changed();
    }

    fn run_console(&mut self, line: &str) {
        let state = self.controller.state();
        let mut ctx = StatusContext {
            state,
            report: self.telemetry.report(&state),
        };
        self.last_reply.clear();
        match self.console.dispatch(line, &mut ctx, &mut self.last_reply) {
            Ok(()) => print!("{}", self.last_reply),
            Err(e) => println!("{}: {}", line.trim(), e),
        }
    }
}
