//! Shared configuration system for desktop and ESP32.
//!
//! Uses `heapless::String` for `no_std` compatibility while remaining
//! ergonomic to use on desktop with `std`.
//!
//! # Example
//!
//! ```rust
//! use rs_rmpp::config::{Config, NetworkConfig, NetworkMode, WebConfig};
//!
//! // Use defaults (soft-AP)
//! let config = Config::default();
//! assert_eq!(config.network.mode, NetworkMode::AccessPoint);
//!
//! // Or join an existing network
//! let config = Config::default()
//!     .with_network(NetworkConfig::default().with_station("layout-net", "secret"))
//!     .with_web(WebConfig::default().with_port(3000));
//! assert_eq!(config.network.mode, NetworkMode::Station);
//! ```

use heapless::String as HString;

use crate::telemetry::{DEBUG_INTERVAL_MS, STATUS_INTERVAL_MS};
use crate::timer::{ALIVE_TIMEOUT_MS, INHIBIT_MS};
use crate::traits::LedColor;

/// Maximum length for config strings (SSIDs, passwords, hostnames)
pub const MAX_SHORT_STRING: usize = 64;

/// Type alias for config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// IPv4 address as four octets.
pub type Ipv4 = [u8; 4];

// ============================================================================
// Helper for creating heapless strings
// ============================================================================

/// Create a ShortString from a &str, truncating if too long
pub fn short_string(s: &str) -> ShortString {
    let mut hs = ShortString::new();
    let take = s.len().min(MAX_SHORT_STRING);
    // Find valid UTF-8 boundary
    let valid_end = s
        .char_indices()
        .take_while(|(i, c)| i + c.len_utf8() <= take)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    let _ = hs.push_str(&s[..valid_end]);
    hs
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete application configuration
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Wi-Fi configuration
    pub network: NetworkConfig,
    /// Web server configuration
    pub web: WebConfig,
    /// Output controller timing
    pub output: OutputConfig,
    /// Device identification
    pub device: DeviceConfig,
}

impl Config {
    /// Set network configuration
    pub fn with_network(mut self, network: NetworkConfig) -> Self {
        self.network = network;
        self
    }

    /// Set web configuration
    pub fn with_web(mut self, web: WebConfig) -> Self {
        self.web = web;
        self
    }

    /// Set output configuration
    pub fn with_output(mut self, output: OutputConfig) -> Self {
        self.output = output;
        self
    }

    /// Set device configuration
    pub fn with_device(mut self, device: DeviceConfig) -> Self {
        self.device = device;
        self
    }
}

// ============================================================================
// Network Config
// ============================================================================

/// How the Wi-Fi interface comes up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NetworkMode {
    /// Join an existing network.
    Station,
    /// Run a soft access point.
    #[default]
    AccessPoint,
}

impl NetworkMode {
    /// The other mode.
    pub fn toggled(self) -> Self {
        match self {
            NetworkMode::Station => NetworkMode::AccessPoint,
            NetworkMode::AccessPoint => NetworkMode::Station,
        }
    }

    /// LED color shown while idle in this mode.
    pub fn standby_color(self) -> LedColor {
        match self {
            NetworkMode::Station => LedColor::Blue,
            NetworkMode::AccessPoint => LedColor::Magenta,
        }
    }

    /// Short name for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            NetworkMode::Station => "station",
            NetworkMode::AccessPoint => "soft-ap",
        }
    }

    /// Stored representation.
    pub fn to_byte(self) -> u8 {
        match self {
            NetworkMode::Station => 0,
            NetworkMode::AccessPoint => 1,
        }
    }

    /// Parse the stored representation.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(NetworkMode::Station),
            1 => Some(NetworkMode::AccessPoint),
            _ => None,
        }
    }
}

/// Persistent slot for the network mode chosen with the button.
pub trait ModeStore {
    /// Error type for storage failures.
    type Error: core::fmt::Debug;

    /// Stored mode, or `None` if nothing was saved yet.
    fn load_mode(&mut self) -> Result<Option<NetworkMode>, Self::Error>;

    /// Save `mode` for the next boot.
    fn save_mode(&mut self, mode: NetworkMode) -> Result<(), Self::Error>;
}

/// [`ModeStore`] that forgets everything on reset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoryModeStore {
    mode: Option<NetworkMode>,
}

impl MemoryModeStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ModeStore for MemoryModeStore {
    type Error = core::convert::Infallible;

    fn load_mode(&mut self) -> Result<Option<NetworkMode>, Self::Error> {
        Ok(self.mode)
    }

    fn save_mode(&mut self, mode: NetworkMode) -> Result<(), Self::Error> {
        self.mode = Some(mode);
        Ok(())
    }
}

/// Wi-Fi configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NetworkConfig {
    /// Interface mode
    pub mode: NetworkMode,
    /// Station SSID
    pub ssid: ShortString,
    /// Station password
    pub password: ShortString,
    /// Static station address (`None` = DHCP)
    pub local_ip: Option<Ipv4>,
    /// Station gateway (used with `local_ip`)
    pub gateway: Ipv4,
    /// Station subnet mask (used with `local_ip`)
    pub subnet: Ipv4,
    /// Soft-AP SSID
    pub ap_ssid: ShortString,
    /// Soft-AP password
    pub ap_password: ShortString,
    /// Soft-AP address
    pub ap_ip: Ipv4,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            mode: NetworkMode::AccessPoint,
            ssid: ShortString::new(),
            password: ShortString::new(),
            local_ip: None,
            gateway: [192, 168, 1, 1],
            subnet: [255, 255, 255, 0],
            ap_ssid: short_string("RmppAtom-softAP"),
            ap_password: short_string("p@ss1234"),
            ap_ip: [192, 168, 0, 1],
        }
    }
}

impl NetworkConfig {
    /// Join `ssid` as a station
    pub fn with_station(mut self, ssid: &str, password: &str) -> Self {
        self.mode = NetworkMode::Station;
        self.ssid = short_string(ssid);
        self.password = short_string(password);
        self
    }

    /// Use a static station address
    pub fn with_static_ip(mut self, ip: Ipv4, gateway: Ipv4, subnet: Ipv4) -> Self {
        self.local_ip = Some(ip);
        self.gateway = gateway;
        self.subnet = subnet;
        self
    }

    /// Set the soft-AP credentials
    pub fn with_access_point(mut self, ssid: &str, password: &str) -> Self {
        self.ap_ssid = short_string(ssid);
        self.ap_password = short_string(password);
        self
    }

    /// Force the interface mode
    pub fn with_mode(mut self, mode: NetworkMode) -> Self {
        self.mode = mode;
        self
    }

    /// Apply the mode saved in `store`, if any.
    ///
    /// A read error is logged and leaves the mode unchanged.
    pub fn with_stored_mode<M: ModeStore>(self, store: &mut M) -> Self {
        match store.load_mode() {
            Ok(Some(mode)) => {
                log::info!("stored network mode: {}", mode.as_str());
                self.with_mode(mode)
            }
            Ok(None) => self,
            Err(e) => {
                log::warn!("stored network mode unreadable: {:?}", e);
                self
            }
        }
    }

    /// Check if station credentials are configured
    pub fn is_station_configured(&self) -> bool {
        !self.ssid.is_empty()
    }
}

// ============================================================================
// Web Config
// ============================================================================

/// Web server configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WebConfig {
    /// Port to listen on
    pub port: u16,
    /// Whether to enable CORS for all origins
    pub cors_permissive: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: 80,
            cors_permissive: true,
        }
    }
}

impl WebConfig {
    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set CORS mode
    pub fn with_cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }
}

// ============================================================================
// Output Config
// ============================================================================

/// Output controller timing
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OutputConfig {
    /// Alive watchdog period in milliseconds
    pub alive_timeout_ms: u32,
    /// Restart inhibit after a local stop in milliseconds
    pub inhibit_ms: u32,
    /// Status frame period in milliseconds
    pub status_interval_ms: u32,
    /// Debug report period in milliseconds
    pub debug_interval_ms: u32,
    /// PWM carrier frequency
    pub pwm_frequency_hz: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            alive_timeout_ms: ALIVE_TIMEOUT_MS,
            inhibit_ms: INHIBIT_MS,
            status_interval_ms: STATUS_INTERVAL_MS,
            debug_interval_ms: DEBUG_INTERVAL_MS,
            pwm_frequency_hz: crate::controller::PWM_FREQUENCY_HZ,
        }
    }
}

impl OutputConfig {
    /// Set the alive watchdog period
    pub fn with_alive_timeout_ms(mut self, ms: u32) -> Self {
        self.alive_timeout_ms = ms;
        self
    }

    /// Set the inhibit period
    pub fn with_inhibit_ms(mut self, ms: u32) -> Self {
        self.inhibit_ms = ms;
        self
    }

    /// Set the status frame period
    pub fn with_status_interval_ms(mut self, ms: u32) -> Self {
        self.status_interval_ms = ms;
        self
    }

    /// Set the debug report period
    pub fn with_debug_interval_ms(mut self, ms: u32) -> Self {
        self.debug_interval_ms = ms;
        self
    }
}

// ============================================================================
// Device Config
// ============================================================================

/// Device identification configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceConfig {
    /// Network hostname
    pub hostname: ShortString,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            hostname: short_string("rmpp-atom"),
        }
    }
}

impl DeviceConfig {
    /// Set the hostname
    pub fn with_hostname(mut self, hostname: &str) -> Self {
        self.hostname = short_string(hostname);
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
