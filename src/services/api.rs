//! JSON response types for the desktop status API.

use serde::{Deserialize, Serialize};

use crate::codec::StatusFrame;
use crate::{Direction, OutputMode};

// ============================================================================
// Response Types
// ============================================================================

/// API response wrapper for consistent JSON structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful
    pub success: bool,
    /// Response data (present when success=true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message (present when success=false)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response with data
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Last published status frame, decoded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Output mode
    pub mode: OutputMode,
    /// Latched direction
    pub direction: Direction,
    /// A remote client is driving the output
    pub external_control: bool,
    /// Over-current latch
    pub over_current: bool,
    /// Unrecoverable internal error
    pub system_fail: bool,
    /// Input voltage in volts (0.1 V resolution)
    pub input_voltage: f32,
    /// CPU temperature in degrees Celsius
    pub cpu_temperature: i8,
    /// Connected WebSocket clients
    pub clients: usize,
}

impl StatusResponse {
    /// Build from a status frame and the current client count.
    pub fn new(frame: &StatusFrame, clients: usize) -> Self {
        Self {
            mode: frame.output.mode,
            direction: frame.output.direction,
            external_control: frame.status.external_control,
            over_current: frame.status.over_current,
            system_fail: frame.status.system_fail,
            input_voltage: frame.voltage_v(),
            cpu_temperature: frame.temperature_c,
            clients,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{OutputFlags, StatusFlags};

    #[test]
    fn api_response_ok_omits_error() {
        let json = serde_json::to_string(&ApiResponse::ok(1u8)).unwrap();
        assert_eq!(json, r#"{"success":true,"data":1}"#);
    }

    #[test]
    fn api_response_err_omits_data() {
        let json = serde_json::to_string(&ApiResponse::<()>::err("Not found")).unwrap();
        assert_eq!(json, r#"{"success":false,"error":"Not found"}"#);
    }

    #[test]
    fn status_response_from_frame() {
        let frame = StatusFrame {
            output: OutputFlags {
                mode: OutputMode::On,
                direction: Direction::Reverse,
            },
            status: StatusFlags {
                external_control: true,
                over_current: false,
                system_fail: false,
            },
            voltage_dv: 118,
            temperature_c: -5,
        };
        let status = StatusResponse::new(&frame, 2);
        assert_eq!(status.mode, OutputMode::On);
        assert_eq!(status.direction, Direction::Reverse);
        assert!(status.external_control);
        assert!((status.input_voltage - 11.8).abs() < 0.001);
        assert_eq!(status.cpu_temperature, -5);

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["mode"], "on");
        assert_eq!(json["direction"], "reverse");
    }
}
