//! Wi-Fi station link for the connection state machine.
//!
//! Unlike a blocking bring-up, [`begin`](NetworkLink::begin) only starts the
//! join; the state machine polls [`is_connected`](NetworkLink::is_connected)
//! and owns the timeout.
//!
//! # Example
//!
//! ```ignore
//! use knobby_throttle::hal::esp32::Esp32Wifi;
//!
//! let sysloop = EspSystemEventLoop::take()?;
//! let nvs = EspDefaultNvsPartition::take()?;
//! let link = Esp32Wifi::new(peripherals.modem, sysloop, Some(nvs))?;
//! ```

extern crate alloc;
use alloc::vec::Vec;
use core::net::Ipv4Addr;

use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi};
use log::{info, warn};

use crate::config::ShortString;
use crate::traits::{InterfaceInfo, NetworkInfo, NetworkLink};

/// Station-mode Wi-Fi.
pub struct Esp32Wifi<'a> {
    wifi: EspWifi<'a>,
}

impl<'a> Esp32Wifi<'a> {
    /// Initialize the driver in station mode without joining anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver cannot be created or started.
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
    ) -> anyhow::Result<Self> {
        let mut wifi = EspWifi::new(modem, sysloop, nvs)?;
        wifi.set_configuration(&Configuration::Client(ClientConfiguration::default()))?;
        wifi.start()?;
        info!("Wi-Fi station started");
        Ok(Self { wifi })
    }

    /// Get the underlying WiFi driver for advanced operations.
    pub fn driver(&self) -> &EspWifi<'a> {
        &self.wifi
    }
}

/// Dotted netmask from a prefix length.
fn prefix_to_netmask(prefix: u8) -> Ipv4Addr {
    let bits = u32::MAX.checked_shl(32 - prefix.min(32) as u32).unwrap_or(0);
    Ipv4Addr::from(bits)
}

impl NetworkLink for Esp32Wifi<'_> {
    type Error = esp_idf_hal::sys::EspError;

    fn begin(&mut self, ssid: &str, password: &str) -> Result<(), Self::Error> {
        let mut ssid_buf: ShortString = ShortString::new();
        let _ = ssid_buf.push_str(ssid);
        let mut pass_buf: heapless::String<64> = heapless::String::new();
        let _ = pass_buf.push_str(password);

        self.wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            ssid: ssid_buf,
            password: pass_buf,
            ..Default::default()
        }))?;
        info!("joining '{}'", ssid);
        self.wifi.connect()
    }

    fn is_connected(&mut self) -> bool {
        self.wifi.is_connected().unwrap_or(false) && self.wifi.is_up().unwrap_or(false)
    }

    fn disconnect(&mut self) {
        if let Err(e) = self.wifi.disconnect() {
            warn!("Wi-Fi disconnect failed: {:?}", e);
        }
    }

    fn scan(&mut self) -> Result<Vec<NetworkInfo>, Self::Error> {
        let found = self.wifi.scan()?;
        Ok(found
            .into_iter()
            .map(|ap| NetworkInfo {
                ssid: ap.ssid.as_str().into(),
                rssi: ap.signal_strength,
                open: matches!(ap.auth_method, None | Some(AuthMethod::None)),
            })
            .collect())
    }

    fn interface_info(&mut self) -> Option<InterfaceInfo> {
        let netif = self.wifi.sta_netif();
        let ip = netif.get_ip_info().ok()?;
        let mac = netif.get_mac().ok()?;
        Some(InterfaceInfo {
            address: ip.ip,
            netmask: prefix_to_netmask(ip.subnet.mask.0),
            gateway: ip.subnet.gateway,
            mac,
        })
    }
}
