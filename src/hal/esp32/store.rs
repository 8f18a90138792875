//! Settings persisted in the default NVS partition.

extern crate alloc;
use alloc::string::String;

use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};
use log::{info, warn};

use crate::config::{ConfigKey, ConfigStore, MAX_LONG_STRING};

/// NVS namespace holding every [`ConfigKey`].
const NAMESPACE: &str = "knobby";

/// [`ConfigStore`] over ESP-IDF NVS.
pub struct NvsStore {
    nvs: EspNvs<NvsDefault>,
}

impl NvsStore {
    /// Open (or create) the settings namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the partition cannot be opened.
    pub fn new(partition: EspDefaultNvsPartition) -> Result<Self, esp_idf_hal::sys::EspError> {
        let nvs = EspNvs::new(partition, NAMESPACE, true)?;
        info!("settings namespace '{}' open", NAMESPACE);
        Ok(Self { nvs })
    }
}

impl ConfigStore for NvsStore {
    type Error = esp_idf_hal::sys::EspError;

    fn read(&mut self, key: ConfigKey) -> Option<String> {
        // room for the terminating NUL
        let mut buf = [0u8; MAX_LONG_STRING + 1];
        match self.nvs.get_str(key.storage_key(), &mut buf) {
            Ok(value) => value.map(String::from),
            Err(e) => {
                warn!("settings read '{}' failed: {:?}", key.storage_key(), e);
                None
            }
        }
    }

    fn write(&mut self, key: ConfigKey, value: &str) -> Result<(), Self::Error> {
        self.nvs.set_str(key.storage_key(), value)
    }
}
