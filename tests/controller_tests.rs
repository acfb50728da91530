//! Integration tests for the output controller and the control task.

use rs_rmpp::codec::decode;
use rs_rmpp::config::OutputConfig;
use rs_rmpp::controller::{IgnoreReason, Outcome};
use rs_rmpp::hal::{MockButton, MockFault, MockIndicator, MockPwm, MockSensors, MockSink};
use rs_rmpp::traits::{ButtonEvent, ClientId, LedColor, LedPattern, PwmChannel};
use rs_rmpp::{
    event_queue, Command, ControlEvent, ControlTask, Direction, EventSender, OutputController,
    OutputMode,
};

type TestController = OutputController<MockPwm, MockFault, MockIndicator>;
type TestTask = ControlTask<MockPwm, MockFault, MockIndicator, MockSensors, MockSink>;

fn controller() -> TestController {
    let mut c = OutputController::new(MockPwm::new(), MockFault::new(), MockIndicator::new());
    c.begin();
    c
}

fn task() -> (EventSender, TestTask) {
    let (tx, rx) = event_queue(16);
    let task = ControlTask::new(
        OutputController::new(MockPwm::new(), MockFault::new(), MockIndicator::new()),
        MockSensors::new(),
        MockSink::new(),
        rx,
        &OutputConfig::default(),
        0,
    );
    (tx, task)
}

fn forward(duty: u16) -> [u8; 3] {
    [0x12, (duty & 0xFF) as u8, ((duty >> 8) as u8 & 0x3F) | 0x40]
}

fn reverse(duty: u16) -> [u8; 3] {
    [0x12, (duty & 0xFF) as u8, ((duty >> 8) as u8 & 0x3F) | 0x80]
}

const STOP: [u8; 3] = [0x12, 0x00, 0x00];

// ============================================================================
// End-to-end Scenarios
// ============================================================================

#[test]
fn alive_timeout_turns_output_off() {
    let mut c = controller();
    c.start_output(Direction::Forward, 0).unwrap();
    c.set_output_duty(2048).unwrap();
    assert_eq!(c.pwm().raw(PwmChannel::Two), 2047);

    c.poll(1000).unwrap();
    assert_eq!(c.mode(), OutputMode::On);

    c.poll(3500).unwrap();
    assert_eq!(c.mode(), OutputMode::Off);
    assert_eq!(c.state().direction(), Direction::None);
    assert!(!c.state().external_control());
    assert_eq!(c.pwm().raw(PwmChannel::One), 0);
    assert_eq!(c.pwm().raw(PwmChannel::Two), 0);
    assert_eq!(c.alive_remaining_ms(3500), None);
    // Watchdog expiry never inhibits.
    assert_eq!(c.inhibit_remaining_ms(3500), None);
}

#[test]
fn fault_during_run_latches_and_forces_off() {
    let mut c = controller();
    c.start_output(Direction::Forward, 0).unwrap();
    c.set_output_duty(1000).unwrap();

    c.fault_line_mut().assert_fault();
    c.poll(10).unwrap();

    assert_eq!(c.mode(), OutputMode::Fault);
    assert!(c.state().over_current());
    assert_eq!(c.pwm().raw(PwmChannel::One), 0);
    assert_eq!(c.pwm().raw(PwmChannel::Two), 0);
    assert_eq!(c.indicator().color, LedColor::Red);
    assert_eq!(c.indicator().pattern, LedPattern::BlinkFast);

    // Held line does not trip again
    let writes = c.pwm().writes.len();
    c.poll(20).unwrap();
    assert_eq!(c.pwm().writes.len(), writes);

    // Commands are refused while latched
    let outcome = c.process_wire_command(&forward(500), 30).unwrap();
    assert_eq!(outcome, Outcome::Ignored(IgnoreReason::WrongMode(OutputMode::Fault)));

    // Clear only once the line is released
    let outcome = c.stop_output(false, 40).unwrap();
    assert_eq!(outcome, Outcome::Ignored(IgnoreReason::FaultStillAsserted));
    assert_eq!(c.mode(), OutputMode::Fault);

    c.fault_line_mut().clear_fault();
    assert!(c.stop_output(false, 50).unwrap().is_applied());
    assert_eq!(c.mode(), OutputMode::Off);
    assert!(!c.state().over_current());
}

#[test]
fn inhibit_blocks_restart_until_expired() {
    let mut c = controller();
    c.start_output(Direction::Forward, 0).unwrap();
    c.stop_output(true, 0).unwrap();
    assert_eq!(c.mode(), OutputMode::Inhibit);

    let outcome = c.start_output(Direction::Forward, 500).unwrap();
    assert_eq!(outcome, Outcome::Ignored(IgnoreReason::WrongMode(OutputMode::Inhibit)));
    c.poll(500).unwrap();
    assert_eq!(c.mode(), OutputMode::Inhibit);

    c.poll(999).unwrap();
    assert_eq!(c.mode(), OutputMode::Inhibit);
    c.poll(1000).unwrap();
    assert_eq!(c.mode(), OutputMode::Off);

    assert!(c.start_output(Direction::Forward, 1000).unwrap().is_applied());
    assert_eq!(c.mode(), OutputMode::On);
}

// ============================================================================
// Wire Commands
// ============================================================================

#[test]
fn first_command_starts_and_sets_duty() {
    let mut c = controller();
    assert!(c.process_wire_command(&forward(2048), 0).unwrap().is_applied());

    assert_eq!(c.mode(), OutputMode::On);
    assert_eq!(c.state().direction(), Direction::Forward);
    assert_eq!(c.state().commanded_duty(), 2048);
    // Idle leg keeps the brake value
    assert_eq!(c.pwm().raw(PwmChannel::One), 4096);
    assert_eq!(c.pwm().raw(PwmChannel::Two), 2047);
}

#[test]
fn reverse_drives_channel_one() {
    let mut c = controller();
    c.process_wire_command(&reverse(1000), 0).unwrap();

    assert_eq!(c.state().direction(), Direction::Reverse);
    assert_eq!(c.pwm().raw(PwmChannel::One), 3095);
    assert_eq!(c.pwm().raw(PwmChannel::Two), 4096);
}

#[test]
fn commands_feed_the_watchdog() {
    let mut c = controller();
    c.process_wire_command(&forward(100), 0).unwrap();
    c.process_wire_command(&forward(100), 2000).unwrap();

    c.poll(4000).unwrap();
    assert_eq!(c.mode(), OutputMode::On);
    assert_eq!(c.alive_remaining_ms(4000), Some(1000));

    c.poll(5000).unwrap();
    assert_eq!(c.mode(), OutputMode::On);
    c.poll(5001).unwrap();
    assert_eq!(c.mode(), OutputMode::Off);
}

#[test]
fn remote_stop_does_not_inhibit() {
    let mut c = controller();
    c.process_wire_command(&forward(100), 0).unwrap();
    assert!(c.process_wire_command(&STOP, 10).unwrap().is_applied());

    assert_eq!(c.mode(), OutputMode::Off);
    assert!(c.process_wire_command(&forward(100), 20).unwrap().is_applied());
    assert_eq!(c.mode(), OutputMode::On);
}

#[test]
fn remote_stop_clears_released_fault() {
    let mut c = controller();
    c.process_wire_command(&forward(100), 0).unwrap();
    c.fault_line_mut().assert_fault();
    c.poll(5).unwrap();
    c.fault_line_mut().clear_fault();

    assert!(c.process_wire_command(&STOP, 10).unwrap().is_applied());
    assert_eq!(c.mode(), OutputMode::Off);
}

#[test]
fn opposite_direction_mid_run_keeps_latched_direction() {
    let mut c = controller();
    c.process_wire_command(&forward(100), 0).unwrap();
    c.process_wire_command(&reverse(200), 10).unwrap();

    assert_eq!(c.state().direction(), Direction::Forward);
    assert_eq!(c.state().commanded_duty(), 200);
    assert_eq!(c.pwm().raw(PwmChannel::Two), 3895);
    assert_eq!(c.pwm().raw(PwmChannel::One), 4096);
}

#[test]
fn direction_after_stop_is_free_to_change() {
    let mut c = controller();
    c.process_wire_command(&forward(100), 0).unwrap();
    c.process_wire_command(&STOP, 10).unwrap();
    c.process_wire_command(&reverse(100), 20).unwrap();

    assert_eq!(c.state().direction(), Direction::Reverse);
}

#[test]
fn pwm_failure_is_terminal() {
    let pwm = MockPwm {
        fail_writes: true,
        ..MockPwm::new()
    };
    let mut c = OutputController::new(pwm, MockFault::new(), MockIndicator::new());
    c.begin();

    assert!(c.process_wire_command(&forward(100), 0).is_err());
    assert_eq!(c.mode(), OutputMode::Fail);
    assert!(c.state().status_flags().system_fail);

    // Poll does nothing, not even a fault trip
    c.fault_line_mut().assert_fault();
    c.poll(10_000).unwrap();
    assert_eq!(c.mode(), OutputMode::Fail);
    assert!(!c.state().over_current());

    let outcome = c.process_wire_command(&forward(100), 10_010).unwrap();
    assert_eq!(outcome, Outcome::Ignored(IgnoreReason::WrongMode(OutputMode::Fail)));
}

// ============================================================================
// Control Task
// ============================================================================

#[test]
fn task_publishes_status_every_interval() {
    let (tx, mut task) = task();
    tx.post(ControlEvent::frame(&forward(1000), ClientId::Client(1)).unwrap());

    for now in (0..=1000).step_by(10) {
        task.run_once(now);
    }

    // Strictly more than 200 ms apart: 210, 420, 630, 840
    let frames = &task.sink().frames;
    assert_eq!(frames.len(), 4);
    assert!(frames.iter().all(|(_, to)| *to == ClientId::Broadcast));

    let Ok(Command::Status(status)) = decode(task.sink().last().unwrap()) else {
        panic!("last frame is not a status frame");
    };
    assert_eq!(status.output.mode, OutputMode::On);
    assert_eq!(status.output.direction, Direction::Forward);
    assert!(status.status.external_control);
    assert_eq!(status.voltage_dv, 120);
    assert_eq!(status.temperature_c, 40);
}

#[test]
fn task_stops_when_client_goes_quiet() {
    let (tx, mut task) = task();
    tx.post(ControlEvent::ClientCount(1));
    tx.post(ControlEvent::frame(&forward(1000), ClientId::Client(1)).unwrap());
    task.run_once(0);
    assert_eq!(task.controller().mode(), OutputMode::On);
    assert_eq!(task.controller().indicator().pattern, LedPattern::BlinkOn90);

    // Exactly 3 s of silence is still alive
    task.run_once(3000);
    assert_eq!(task.controller().mode(), OutputMode::On);
    task.run_once(3001);
    assert_eq!(task.controller().mode(), OutputMode::Off);
}

#[test]
fn task_button_click_then_restart() {
    let (tx, mut task) = task();
    tx.post(ControlEvent::frame(&forward(1000), ClientId::Client(1)).unwrap());
    task.run_once(0);

    tx.post(ControlEvent::Button(ButtonEvent::Click));
    task.run_once(100);
    assert_eq!(task.controller().mode(), OutputMode::Inhibit);

    // Browser keeps sending during the inhibit period
    tx.post(ControlEvent::frame(&forward(1000), ClientId::Client(1)).unwrap());
    task.run_once(600);
    assert_eq!(task.controller().mode(), OutputMode::Inhibit);

    task.run_once(1100);
    assert_eq!(task.controller().mode(), OutputMode::Off);

    tx.post(ControlEvent::frame(&forward(1000), ClientId::Client(1)).unwrap());
    task.run_once(1110);
    assert_eq!(task.controller().mode(), OutputMode::On);
}

#[test]
fn task_follows_button_thread() {
    let (tx, mut task) = task();
    let mut button = MockButton::new();
    tx.post(ControlEvent::frame(&forward(1000), ClientId::Client(1)).unwrap());
    task.run_once(0);

    // Nothing pressed yet
    assert_eq!(tx.poll_button(&mut button, 5), None);
    task.run_once(5);
    assert_eq!(task.controller().mode(), OutputMode::On);

    button.queue(ButtonEvent::Click);
    assert_eq!(tx.poll_button(&mut button, 10), Some(ButtonEvent::Click));
    task.run_once(10);
    assert_eq!(task.controller().mode(), OutputMode::Inhibit);

    button.queue(ButtonEvent::Hold);
    tx.poll_button(&mut button, 20);
    task.run_once(20);
    assert_eq!(task.controller().mode(), OutputMode::Inhibit);
    assert_eq!(task.pending_network_mode(), rs_rmpp::NetworkMode::Station);

    task.run_once(1010);
    assert_eq!(task.controller().mode(), OutputMode::Off);
}

#[test]
fn task_console_reports_mode() {
    let (tx, mut task) = task();
    tx.post(ControlEvent::console("mode"));
    task.run_once(0);

    assert!(task.last_reply().contains("Output Mode     : off"));
    assert!(task.last_reply().contains("Over Current    : false"));

    tx.post(ControlEvent::console("RMPP"));
    task.run_once(10);
    assert!(task.last_reply().contains("Input Voltage   : 12.00 V"));
}
