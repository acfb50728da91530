//! Edge case and boundary condition tests for the wire codec and the output controller

use rs_rmpp::codec::{decode, split_frame, CMD_LEN_MAX, WIRE_DUTY_MAX};
use rs_rmpp::controller::{duty_to_raw, IgnoreReason, Outcome, PWM_DUTY_MAX};
use rs_rmpp::hal::{MockFault, MockIndicator, MockPwm};
use rs_rmpp::input::{Debouncer, HOLD_TIME_MS, SAMPLE_PERIOD_MS};
use rs_rmpp::traits::{ButtonEvent, PwmChannel};
use rs_rmpp::{
    Command, Direction, FrameError, OutputCommand, OutputController, OutputMode, StatusFrame,
};

fn ready() -> OutputController<MockPwm, MockFault, MockIndicator> {
    let mut c = OutputController::new(MockPwm::new(), MockFault::new(), MockIndicator::new());
    c.begin();
    c
}

// ============================================================================
// Duty Boundary Tests
// ============================================================================

#[test]
fn duty_zero_stops_one_short_of_off() {
    let mut c = ready();
    c.start_output(Direction::Forward, 0).unwrap();
    c.set_output_duty(0).unwrap();
    assert_eq!(c.pwm().raw(PwmChannel::Two), 4094);
}

#[test]
fn duty_at_max_reaches_zero() {
    let mut c = ready();
    c.start_output(Direction::Reverse, 0).unwrap();
    c.set_output_duty(PWM_DUTY_MAX).unwrap();
    assert_eq!(c.pwm().raw(PwmChannel::One), 0);
}

#[test]
fn wire_duty_above_pwm_range_saturates() {
    let mut c = ready();
    let frame = OutputCommand {
        direction: Direction::Forward,
        duty: WIRE_DUTY_MAX,
    }
    .encode();
    c.process_wire_command(&frame, 0).unwrap();

    assert_eq!(c.state().commanded_duty(), PWM_DUTY_MAX);
    assert_eq!(c.pwm().raw(PwmChannel::Two), 0);
}

#[test]
fn commanded_duty_never_exceeds_pwm_range() {
    let mut c = ready();
    c.process_wire_command(&[0x12, 0xFF, 0x7F], 0).unwrap();
    assert_eq!(c.mode(), OutputMode::On);
    assert_eq!(c.state().commanded_duty(), 4095);

    c.process_wire_command(&[0x12, 0x00, 0x48], 10).unwrap();
    assert_eq!(c.state().commanded_duty(), 2048);
}

#[test]
fn duty_mapping_is_monotonic() {
    let mut last = duty_to_raw(0);
    for duty in 1..=PWM_DUTY_MAX {
        let raw = duty_to_raw(duty);
        assert!(raw <= last, "duty {duty}");
        last = raw;
    }
}

#[test]
fn duty_outside_on_is_recorded_as_zero() {
    let mut c = ready();
    let outcome = c.set_output_duty(1234).unwrap();
    assert_eq!(outcome, Outcome::Ignored(IgnoreReason::WrongMode(OutputMode::Off)));
    assert_eq!(c.state().commanded_duty(), 0);
    assert!(c.pwm().writes.is_empty());
}

// ============================================================================
// Frame Boundary Tests
// ============================================================================

#[test]
fn empty_frame_is_rejected() {
    assert_eq!(decode(&[]), Err(FrameError::Empty));
}

#[test]
fn truncated_output_write_is_rejected() {
    assert!(matches!(
        decode(&[0x12, 0x00]),
        Err(FrameError::Truncated { id: 0x12, expected: 2, len: 2 })
    ));
}

#[test]
fn frame_at_max_length_is_accepted_by_framing() {
    let mut buf = [0u8; CMD_LEN_MAX];
    buf[0] = 0x0F;
    let (id, payload) = split_frame(&buf).unwrap();
    assert_eq!(id, 0x0F);
    assert_eq!(payload.len(), 15);
    // Structurally fine, but not a defined command
    assert_eq!(decode(&buf), Err(FrameError::UnknownCommand(0x0F)));
}

#[test]
fn frame_over_max_length_is_rejected() {
    let buf = [0x12u8; CMD_LEN_MAX + 1];
    assert_eq!(
        decode(&buf),
        Err(FrameError::TooLong {
            len: CMD_LEN_MAX + 1
        })
    );
}

#[test]
fn trailing_checksum_byte_is_ignored() {
    let with = decode(&[0x12, 0x00, 0x48, 0xA5]).unwrap();
    let without = decode(&[0x12, 0x00, 0x48]).unwrap();
    assert_eq!(with, without);
}

#[test]
fn both_selector_bits_read_as_forward() {
    let Command::OutputWrite(cmd) = decode(&[0x12, 0x10, 0xC1]).unwrap() else {
        panic!("expected output write");
    };
    assert_eq!(cmd.direction, Direction::Forward);
    assert_eq!(cmd.duty, 0x0110);
}

#[test]
fn status_frame_with_both_direction_bits_is_malformed() {
    assert_eq!(
        decode(&[0x04, 0x32, 0x00, 0x00, 0x80]),
        Err(FrameError::Malformed(0x04))
    );
}

#[test]
fn status_frame_temperature_extremes() {
    for t in [i8::MIN, -1, 0, i8::MAX] {
        let frame = StatusFrame {
            temperature_c: t,
            ..StatusFrame::default()
        };
        let Command::Status(parsed) = decode(&frame.encode()).unwrap() else {
            panic!("expected status");
        };
        assert_eq!(parsed.temperature_c, t);
    }
}

// ============================================================================
// Controller Edge Cases
// ============================================================================

#[test]
fn malformed_frame_does_not_touch_state() {
    let mut c = ready();
    let outcome = c.process_wire_command(&[0x12, 0x00], 0).unwrap();
    assert!(matches!(
        outcome,
        Outcome::Ignored(IgnoreReason::InvalidFrame(FrameError::Truncated { .. }))
    ));
    assert_eq!(c.mode(), OutputMode::Off);
    assert!(c.pwm().writes.is_empty());
}

#[test]
fn status_frame_from_client_is_not_a_command() {
    let mut c = ready();
    let outcome = c
        .process_wire_command(&StatusFrame::default().encode(), 0)
        .unwrap();
    assert_eq!(outcome, Outcome::Ignored(IgnoreReason::NotACommand));
}

#[test]
fn stop_while_off_is_a_no_op() {
    let mut c = ready();
    let outcome = c.process_wire_command(&[0x12, 0x00, 0x00], 0).unwrap();
    assert_eq!(outcome, Outcome::Ignored(IgnoreReason::WrongMode(OutputMode::Off)));
    assert!(c.pwm().writes.is_empty());
}

#[test]
fn start_without_direction_is_ignored() {
    let mut c = ready();
    let outcome = c.start_output(Direction::None, 0).unwrap();
    assert_eq!(outcome, Outcome::Ignored(IgnoreReason::NoDirection));
    assert_eq!(c.mode(), OutputMode::Off);
}

#[test]
fn start_while_on_is_ignored() {
    let mut c = ready();
    c.start_output(Direction::Forward, 0).unwrap();
    let outcome = c.start_output(Direction::Forward, 10).unwrap();
    assert_eq!(outcome, Outcome::Ignored(IgnoreReason::WrongMode(OutputMode::On)));
}

#[test]
fn start_before_begin_is_ignored() {
    let mut c = OutputController::new(MockPwm::new(), MockFault::new(), MockIndicator::new());
    let outcome = c.start_output(Direction::Forward, 0).unwrap();
    assert_eq!(outcome, Outcome::Ignored(IgnoreReason::WrongMode(OutputMode::Init)));
}

#[test]
fn fault_while_off_latches() {
    let mut c = ready();
    c.fault_line_mut().assert_fault();
    c.poll(0).unwrap();
    assert_eq!(c.mode(), OutputMode::Fault);
    assert!(c.state().over_current());
}

#[test]
fn fault_during_inhibit_cancels_the_inhibit_timer() {
    let mut c = ready();
    c.start_output(Direction::Forward, 0).unwrap();
    c.stop_output(true, 0).unwrap();
    c.fault_line_mut().assert_fault();
    c.poll(10).unwrap();

    assert_eq!(c.mode(), OutputMode::Fault);
    assert_eq!(c.inhibit_remaining_ms(10), None);

    // Inhibit expiry must not pull the controller out of FAULT
    c.poll(2000).unwrap();
    assert_eq!(c.mode(), OutputMode::Fault);
}

#[test]
fn repeated_inhibit_stop_is_ignored() {
    let mut c = ready();
    c.start_output(Direction::Forward, 0).unwrap();
    c.stop_output(true, 0).unwrap();
    let outcome = c.stop_output(true, 900).unwrap();
    assert_eq!(outcome, Outcome::Ignored(IgnoreReason::WrongMode(OutputMode::Inhibit)));

    // Period counts from the first stop
    c.poll(1000).unwrap();
    assert_eq!(c.mode(), OutputMode::Off);
}

// ============================================================================
// Button Edge Cases
// ============================================================================

#[test]
fn single_sample_glitch_is_not_a_click() {
    let mut d = Debouncer::new();
    let events: Vec<_> = [false, true, false, false, false]
        .into_iter()
        .filter_map(|s| d.sample(s))
        .collect();
    assert!(events.is_empty());
}

#[test]
fn hold_fires_once_and_suppresses_click() {
    let mut d = Debouncer::new();
    let hold_samples = (HOLD_TIME_MS / SAMPLE_PERIOD_MS) as usize + 5;
    let mut events: Vec<_> = core::iter::repeat(true)
        .take(hold_samples)
        .filter_map(|s| d.sample(s))
        .collect();
    events.extend((0..5).filter_map(|_| d.sample(false)));
    assert_eq!(events, vec![ButtonEvent::Hold]);
}
