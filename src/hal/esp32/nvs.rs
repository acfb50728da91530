//! Network mode persisted in the default NVS partition.

use crate::config::{ModeStore, NetworkMode};
use esp_idf_hal::sys::EspError;
use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};

/// NVS namespace for power pack settings.
const NAMESPACE: &str = "rmpp";

/// Key holding the network mode byte.
const MODE_KEY: &str = "net_mode";

/// [`ModeStore`] backed by NVS.
pub struct Esp32ModeStore {
    nvs: EspNvs<NvsDefault>,
}

impl Esp32ModeStore {
    /// Open the settings namespace, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace cannot be opened.
    pub fn new(partition: EspDefaultNvsPartition) -> Result<Self, EspError> {
        let nvs = EspNvs::new(partition, NAMESPACE, true)?;
        Ok(Self { nvs })
    }
}

impl ModeStore for Esp32ModeStore {
    type Error = EspError;

    fn load_mode(&mut self) -> Result<Option<NetworkMode>, EspError> {
        let byte = self.nvs.get_u8(MODE_KEY)?;
        Ok(byte.and_then(|b| {
            let mode = NetworkMode::from_byte(b);
            if mode.is_none() {
                log::warn!("ignoring stored network mode {}", b);
            }
            mode
        }))
    }

    fn save_mode(&mut self, mode: NetworkMode) -> Result<(), EspError> {
        self.nvs.set_u8(MODE_KEY, mode.to_byte())
    }
}
