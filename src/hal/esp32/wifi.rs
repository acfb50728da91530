//! Wi-Fi bring-up for the ATOM Lite, station or soft-AP.
//!
//! Driver events are forwarded to the control task as
//! [`ControlEvent::Network`] so the status LED follows the link state.
//!
//! # Example
//!
//! ```ignore
//! use rs_rmpp::hal::esp32::Esp32Wifi;
//! use rs_rmpp::config::NetworkConfig;
//!
//! let config = NetworkConfig::default().with_station("Layout", "secret123");
//! let wifi = Esp32Wifi::new(modem, sysloop, nvs, &config, events.clone())?;
//! println!("IP: {:?}", wifi.ip_addr());
//! ```

use crate::config::{Ipv4, NetworkConfig, NetworkMode};
use crate::events::{ControlEvent, EventSender};
use crate::traits::NetworkEvent;
use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::{EspSubscription, EspSystemEventLoop, System};
use esp_idf_svc::ipv4::{
    self, ClientConfiguration as IpClientConfiguration, ClientSettings, Mask,
    RouterConfiguration, Subnet,
};
use esp_idf_svc::netif::{EspNetif, IpEvent, NetifConfiguration, NetifStack};
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{
    AccessPointConfiguration, AuthMethod, BlockingWifi, ClientConfiguration, Configuration,
    EspWifi, WifiDriver, WifiEvent,
};
use std::net::Ipv4Addr;

/// Prefix length of a dotted mask such as 255.255.255.0.
fn prefix_len(mask: Ipv4) -> u8 {
    u32::from_be_bytes(mask).leading_ones() as u8
}

fn addr(ip: Ipv4) -> Ipv4Addr {
    Ipv4Addr::from(ip)
}

/// Wi-Fi interface in the configured mode.
///
/// Keeps the driver and the event subscriptions alive for its lifetime.
pub struct Esp32Wifi<'a> {
    wifi: BlockingWifi<EspWifi<'a>>,
    mode: NetworkMode,
    _wifi_events: EspSubscription<'static, System>,
    _ip_events: EspSubscription<'static, System>,
}

impl<'a> Esp32Wifi<'a> {
    /// Bring up Wi-Fi.
    ///
    /// Station mode connects and waits for an address; soft-AP mode starts
    /// the access point on the configured address. Station mode without
    /// credentials falls back to soft-AP.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails to start, or the station cannot
    /// associate or get an address.
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
        config: &NetworkConfig,
        events: EventSender,
    ) -> anyhow::Result<Self> {
        let mode = match config.mode {
            NetworkMode::Station if !config.is_station_configured() => {
                println!("[WARN] No station credentials, starting soft-AP");
                NetworkMode::AccessPoint
            }
            mode => mode,
        };

        let wifi_tx = events.clone();
        let wifi_events = sysloop.subscribe::<WifiEvent, _>(move |event| {
            let mapped = match event {
                WifiEvent::Ready { .. } => Some(NetworkEvent::Ready),
                WifiEvent::StaStopped { .. } => Some(NetworkEvent::StaStopped),
                WifiEvent::StaConnected { .. } => Some(NetworkEvent::StaConnected),
                WifiEvent::StaDisconnected { .. } => Some(NetworkEvent::StaDisconnected),
                WifiEvent::ApStarted { .. } => Some(NetworkEvent::ApStarted),
                WifiEvent::ApStopped { .. } => Some(NetworkEvent::ApStopped),
                _ => None,
            };
            if let Some(e) = mapped {
                wifi_tx.post(ControlEvent::Network(e));
            }
        })?;
        let ip_tx = events;
        let ip_events = sysloop.subscribe::<IpEvent, _>(move |event| {
            if let IpEvent::DhcpIpAssigned { .. } = event {
                ip_tx.post(ControlEvent::Network(NetworkEvent::GotIp));
            }
        })?;

        let driver = WifiDriver::new(modem, sysloop.clone(), nvs)?;
        let sta_netif = Self::sta_netif(config)?;
        let ap_netif = Self::ap_netif(config)?;
        let esp_wifi = EspWifi::wrap_all(driver, sta_netif, ap_netif)?;
        let mut wifi = BlockingWifi::wrap(esp_wifi, sysloop)?;

        match mode {
            NetworkMode::Station => {
                let mut ssid: heapless::String<32> = heapless::String::new();
                let _ = ssid.push_str(config.ssid.as_str());
                let mut password: heapless::String<64> = heapless::String::new();
                let _ = password.push_str(config.password.as_str());

                wifi.set_configuration(&Configuration::Client(ClientConfiguration {
                    ssid,
                    password,
                    ..Default::default()
                }))?;

                println!("[WiFi] Starting station...");
                wifi.start()?;
                println!("[WiFi] Connecting to '{}'...", config.ssid);
                wifi.connect()?;
                wifi.wait_netif_up()?;
            }
            NetworkMode::AccessPoint => {
                let mut ssid: heapless::String<32> = heapless::String::new();
                let _ = ssid.push_str(config.ap_ssid.as_str());
                let mut password: heapless::String<64> = heapless::String::new();
                let _ = password.push_str(config.ap_password.as_str());

                wifi.set_configuration(&Configuration::AccessPoint(AccessPointConfiguration {
                    ssid,
                    password,
                    auth_method: AuthMethod::WPA2Personal,
                    ..Default::default()
                }))?;

                println!("[WiFi] Starting soft-AP '{}'...", config.ap_ssid);
                wifi.start()?;
                wifi.wait_netif_up()?;
            }
        }

        let this = Self {
            wifi,
            mode,
            _wifi_events: wifi_events,
            _ip_events: ip_events,
        };
        if let Some(ip) = this.ip_addr() {
            println!("[WiFi] Up ({}), IP: {}", mode.as_str(), ip);
        }
        Ok(this)
    }

    fn sta_netif(config: &NetworkConfig) -> anyhow::Result<EspNetif> {
        let Some(ip) = config.local_ip else {
            return Ok(EspNetif::new(NetifStack::Sta)?);
        };
        let conf = NetifConfiguration {
            ip_configuration: Some(ipv4::Configuration::Client(IpClientConfiguration::Fixed(
                ClientSettings {
                    ip: addr(ip),
                    subnet: Subnet {
                        gateway: addr(config.gateway),
                        mask: Mask(prefix_len(config.subnet)),
                    },
                    dns: None,
                    secondary_dns: None,
                },
            ))),
            ..NetifConfiguration::wifi_default_client()
        };
        Ok(EspNetif::new_with_conf(&conf)?)
    }

    fn ap_netif(config: &NetworkConfig) -> anyhow::Result<EspNetif> {
        let conf = NetifConfiguration {
            ip_configuration: Some(ipv4::Configuration::Router(RouterConfiguration {
                subnet: Subnet {
                    gateway: addr(config.ap_ip),
                    mask: Mask(24),
                },
                dhcp_enabled: true,
                dns: None,
                secondary_dns: None,
            })),
            ..NetifConfiguration::wifi_default_router()
        };
        Ok(EspNetif::new_with_conf(&conf)?)
    }

    /// Mode the interface came up in.
    pub fn mode(&self) -> NetworkMode {
        self.mode
    }

    /// Address of the active interface.
    pub fn ip_addr(&self) -> Option<Ipv4Addr> {
        let netif = match self.mode {
            NetworkMode::Station => self.wifi.wifi().sta_netif(),
            NetworkMode::AccessPoint => self.wifi.wifi().ap_netif(),
        };
        netif.get_ip_info().ok().map(|info| info.ip)
    }

    /// Check if the station is associated.
    pub fn is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }
}
