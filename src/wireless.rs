//! Values exchanged with the companion app over the short-range link.
//!
//! The transport itself (GATT server, advertising) lives behind
//! [`ConfigLink`](crate::traits::ConfigLink) and
//! [`StatusMirror`](crate::traits::StatusMirror). This module holds what the
//! transport needs to know about each value:
//!
//! - the [`Characteristic`] catalogue: service, UUID, access
//! - [`decode_write`] turning a raw write into a [`ConfigWrite`]
//! - [`apply_config_write`] persisting it and deciding what happens next
//! - the read-only [`DeviceInformation`] block
//! - formatting helpers for scan results and interface identity
//!
//! # Example
//!
//! ```rust
//! use knobby_throttle::hal::MockStore;
//! use knobby_throttle::config::{ConfigKey, ConfigStore};
//! use knobby_throttle::wireless::{apply_config_write, decode_write, Characteristic, ConfigAction};
//!
//! let mut store = MockStore::new();
//! let write = decode_write(Characteristic::WifiSsid, b"layout").unwrap();
//! assert_eq!(apply_config_write(&mut store, write).unwrap(), ConfigAction::Stored);
//! assert_eq!(store.get_or_default(ConfigKey::WifiSsid), "layout");
//!
//! let write = decode_write(Characteristic::Command, b"restart").unwrap();
//! assert_eq!(apply_config_write(&mut store, write).unwrap(), ConfigAction::Reconnect);
//! ```

extern crate alloc;
use alloc::format;
use alloc::string::String;
use core::fmt;
use core::fmt::Write as _;

use log::{info, warn};

use crate::config::{short_string, ConfigKey, ConfigStore, ShortString};
use crate::error::ThrottleError;
use crate::traits::{ConfigWrite, NetworkInfo};

// ============================================================================
// Catalogue
// ============================================================================

/// A GATT UUID.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BleUuid {
    /// Assigned 16-bit UUID.
    Short(u16),
    /// Vendor 128-bit UUID.
    Long(u128),
}

impl fmt::Display for BleUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            BleUuid::Short(v) => write!(f, "{:04x}", v),
            BleUuid::Long(v) => write!(
                f,
                "{:08x}-{:04x}-{:04x}-{:04x}-{:012x}",
                (v >> 96) as u32,
                (v >> 80) as u16,
                (v >> 64) as u16,
                (v >> 48) as u16,
                v & 0xFFFF_FFFF_FFFF
            ),
        }
    }
}

/// Vendor UUIDs share everything but bits 80..96.
const fn vendor_uuid(id: u16) -> BleUuid {
    BleUuid::Long(0x426c7565_0000_4688_b7f5_4b646f626279 | ((id as u128) << 80))
}

/// Services exposed to the app.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Service {
    /// Network settings and status.
    Wifi,
    /// Live throttle state.
    Throttle,
    /// Standard battery service.
    Battery,
    /// Standard device information service.
    DeviceInformation,
}

impl Service {
    /// Service UUID.
    pub const fn uuid(&self) -> BleUuid {
        match self {
            Service::Wifi => vendor_uuid(0x3600),
            Service::Throttle => vendor_uuid(0x3700),
            Service::Battery => BleUuid::Short(0x180F),
            Service::DeviceInformation => BleUuid::Short(0x180A),
        }
    }
}

/// How the app may access a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Access {
    /// Readable.
    pub read: bool,
    /// Writable.
    pub write: bool,
    /// Sends notifications.
    pub notify: bool,
}

impl Access {
    const READ: Access = Access { read: true, write: false, notify: false };
    const READ_WRITE: Access = Access { read: true, write: true, notify: false };
    const READ_NOTIFY: Access = Access { read: true, write: false, notify: true };
    const READ_WRITE_NOTIFY: Access = Access { read: true, write: true, notify: true };
    const WRITE: Access = Access { read: false, write: true, notify: false };
}

/// Every value exchanged with the app.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Characteristic {
    /// Throttle name (read/write)
    DeviceName,
    /// Wi-Fi network (read/write)
    WifiSsid,
    /// Wi-Fi password (read/write)
    WifiPassword,
    /// Session server host (read/write)
    ServerAddress,
    /// Session server port (read/write)
    ServerPort,
    /// Connection status text (read/notify)
    ConnectionStatus,
    /// Apply and reconnect (write)
    Command,
    /// Scan results (read/notify)
    NetworkList,
    /// Station IPv4 address (read/notify)
    LocalAddress,
    /// Subnet mask (read/notify)
    Netmask,
    /// Gateway (read/notify)
    Gateway,
    /// Station MAC (read/notify)
    MacAddress,
    /// Speed (read/notify)
    Speed,
    /// Direction (read/notify)
    Direction,
    /// Toggle position (read/notify)
    TogglePosition,
    /// Locomotive address (read/write/notify)
    SelectedAddress,
    /// Status text (read/notify)
    LongDescription,
    /// Battery percentage (read/notify)
    BatteryLevel,
    /// Manufacturer (read)
    Manufacturer,
    /// Model (read)
    ModelNumber,
    /// Serial number (read)
    SerialNumber,
    /// Hardware revision (read)
    HardwareRevision,
    /// Firmware revision (read)
    FirmwareRevision,
    /// Software revision (read)
    SoftwareRevision,
}

impl Characteristic {
    /// Every characteristic.
    pub const ALL: [Characteristic; 24] = [
        Characteristic::DeviceName,
        Characteristic::WifiSsid,
        Characteristic::WifiPassword,
        Characteristic::ServerAddress,
        Characteristic::ServerPort,
        Characteristic::ConnectionStatus,
        Characteristic::Command,
        Characteristic::NetworkList,
        Characteristic::LocalAddress,
        Characteristic::Netmask,
        Characteristic::Gateway,
        Characteristic::MacAddress,
        Characteristic::Speed,
        Characteristic::Direction,
        Characteristic::TogglePosition,
        Characteristic::SelectedAddress,
        Characteristic::LongDescription,
        Characteristic::BatteryLevel,
        Characteristic::Manufacturer,
        Characteristic::ModelNumber,
        Characteristic::SerialNumber,
        Characteristic::HardwareRevision,
        Characteristic::FirmwareRevision,
        Characteristic::SoftwareRevision,
    ];

    /// Service the value belongs to.
    pub const fn service(&self) -> Service {
        use Characteristic::*;
        match self {
            DeviceName | WifiSsid | WifiPassword | ServerAddress | ServerPort
            | ConnectionStatus | Command | NetworkList | LocalAddress | Netmask | Gateway
            | MacAddress => Service::Wifi,
            Speed | Direction | TogglePosition | SelectedAddress | LongDescription => {
                Service::Throttle
            }
            BatteryLevel => Service::Battery,
            Manufacturer | ModelNumber | SerialNumber | HardwareRevision | FirmwareRevision
            | SoftwareRevision => Service::DeviceInformation,
        }
    }

    /// Characteristic UUID.
    pub const fn uuid(&self) -> BleUuid {
        use Characteristic::*;
        match self {
            WifiSsid => vendor_uuid(0x36e1),
            WifiPassword => vendor_uuid(0x36e2),
            ServerAddress => vendor_uuid(0x36e3),
            ConnectionStatus => vendor_uuid(0x36e4),
            Command => vendor_uuid(0x36e5),
            ServerPort => vendor_uuid(0x36e6),
            NetworkList => vendor_uuid(0x36e7),
            LocalAddress => vendor_uuid(0x36e8),
            Netmask => vendor_uuid(0x36e9),
            Gateway => vendor_uuid(0x36ea),
            MacAddress => vendor_uuid(0x36eb),
            DeviceName => vendor_uuid(0x36f0),
            Speed => vendor_uuid(0x37e1),
            Direction => vendor_uuid(0x37e2),
            TogglePosition => vendor_uuid(0x37e3),
            SelectedAddress => vendor_uuid(0x37e4),
            LongDescription => vendor_uuid(0x37e5),
            BatteryLevel => BleUuid::Short(0x2A19),
            Manufacturer => BleUuid::Short(0x2A29),
            ModelNumber => BleUuid::Short(0x2A24),
            SerialNumber => BleUuid::Short(0x2A25),
            HardwareRevision => BleUuid::Short(0x2A27),
            FirmwareRevision => BleUuid::Short(0x2A26),
            SoftwareRevision => BleUuid::Short(0x2A28),
        }
    }

    /// Access rights.
    pub const fn access(&self) -> Access {
        use Characteristic::*;
        match self {
            DeviceName | WifiSsid | WifiPassword | ServerAddress | ServerPort => Access::READ_WRITE,
            Command => Access::WRITE,
            SelectedAddress => Access::READ_WRITE_NOTIFY,
            ConnectionStatus | NetworkList | LocalAddress | Netmask | Gateway | MacAddress
            | Speed | Direction | TogglePosition | LongDescription | BatteryLevel => {
                Access::READ_NOTIFY
            }
            Manufacturer | ModelNumber | SerialNumber | HardwareRevision | FirmwareRevision
            | SoftwareRevision => Access::READ,
        }
    }

    /// Look a characteristic up by UUID.
    pub fn from_uuid(uuid: BleUuid) -> Option<Characteristic> {
        Characteristic::ALL.iter().copied().find(|c| c.uuid() == uuid)
    }
}

// ============================================================================
// Writes
// ============================================================================

/// Turn a raw write into a [`ConfigWrite`].
///
/// Returns `None` for characteristics the app may not write. Bytes are taken
/// as UTF-8, with invalid sequences replaced; nothing else is checked.
pub fn decode_write(characteristic: Characteristic, value: &[u8]) -> Option<ConfigWrite> {
    let text = String::from_utf8_lossy(value).into_owned();
    match characteristic {
        Characteristic::DeviceName => Some(ConfigWrite::DeviceName(text)),
        Characteristic::WifiSsid => Some(ConfigWrite::WifiSsid(text)),
        Characteristic::WifiPassword => Some(ConfigWrite::WifiPassword(text)),
        Characteristic::ServerAddress => Some(ConfigWrite::ServerAddress(text)),
        Characteristic::ServerPort => Some(ConfigWrite::ServerPort(text)),
        Characteristic::Command => Some(ConfigWrite::Command(text)),
        Characteristic::SelectedAddress => Some(ConfigWrite::SelectedAddress(text)),
        _ => {
            warn!("write to read-only {:?} ignored", characteristic);
            None
        }
    }
}

/// What the runtime should do after a write was applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigAction {
    /// Value persisted; used on the next connection attempt.
    Stored,
    /// Drop the connection and start over with the stored settings.
    Reconnect,
    /// Stage a locomotive address.
    SelectAddress(String),
}

/// Persist a write, or translate it into an action.
///
/// # Errors
///
/// [`ThrottleError::Storage`] if the store rejects the value.
pub fn apply_config_write<C: ConfigStore + ?Sized>(
    store: &mut C,
    write: ConfigWrite,
) -> Result<ConfigAction, ThrottleError> {
    let (key, value) = match write {
        ConfigWrite::DeviceName(v) => (ConfigKey::DeviceName, v),
        ConfigWrite::WifiSsid(v) => (ConfigKey::WifiSsid, v),
        ConfigWrite::WifiPassword(v) => (ConfigKey::WifiPassword, v),
        ConfigWrite::ServerAddress(v) => (ConfigKey::ServerAddress, v),
        ConfigWrite::ServerPort(v) => (ConfigKey::ServerPort, v),
        ConfigWrite::Command(_) => {
            info!("reconnect requested");
            return Ok(ConfigAction::Reconnect);
        }
        ConfigWrite::SelectedAddress(address) => return Ok(ConfigAction::SelectAddress(address)),
    };
    store.write(key, &value).map_err(|e| {
        warn!("storing {} failed: {:?}", key.storage_key(), e);
        ThrottleError::Storage
    })?;
    info!("stored {}", key.storage_key());
    Ok(ConfigAction::Stored)
}

// ============================================================================
// Device Information
// ============================================================================

/// The read-only device information block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceInformation {
    /// Manufacturer name
    pub manufacturer: ShortString,
    /// Model number
    pub model: ShortString,
    /// Serial number (persisted)
    pub serial: ShortString,
    /// Board revision
    pub hardware_revision: ShortString,
    /// Firmware version
    pub firmware_revision: ShortString,
    /// Software stack revision
    pub software_revision: ShortString,
}

impl DeviceInformation {
    /// Build the block, reading the serial number from the store.
    pub fn load<C: ConfigStore + ?Sized>(store: &mut C) -> Self {
        Self {
            manufacturer: short_string("Knobby"),
            model: short_string("Knobby Throttle"),
            serial: short_string(&store.get_or_default(ConfigKey::SerialNumber)),
            hardware_revision: short_string("B"),
            firmware_revision: short_string(env!("CARGO_PKG_VERSION")),
            software_revision: short_string("esp-idf"),
        }
    }

    /// Value of one of the block's characteristics.
    pub fn value(&self, characteristic: Characteristic) -> Option<&str> {
        match characteristic {
            Characteristic::Manufacturer => Some(self.manufacturer.as_str()),
            Characteristic::ModelNumber => Some(self.model.as_str()),
            Characteristic::SerialNumber => Some(self.serial.as_str()),
            Characteristic::HardwareRevision => Some(self.hardware_revision.as_str()),
            Characteristic::FirmwareRevision => Some(self.firmware_revision.as_str()),
            Characteristic::SoftwareRevision => Some(self.software_revision.as_str()),
            _ => None,
        }
    }
}

// ============================================================================
// Formatting
// ============================================================================

/// Format scan results as `"<count>|ssid,rssi,enc|..."`.
///
/// `enc` is `"OPEN "` for open networks and `"*"` otherwise.
///
/// ```rust
/// use knobby_throttle::traits::NetworkInfo;
/// use knobby_throttle::wireless::format_network_list;
///
/// let list = [
///     NetworkInfo { ssid: "club".into(), rssi: -60, open: false },
///     NetworkInfo { ssid: "guest".into(), rssi: -71, open: true },
/// ];
/// assert_eq!(format_network_list(&list), "2|club,-60,*|guest,-71,OPEN ");
/// ```
pub fn format_network_list(networks: &[NetworkInfo]) -> String {
    let mut s = format!("{}", networks.len());
    for n in networks {
        let enc = if n.open { "OPEN " } else { "*" };
        let _ = write!(s, "|{},{},{}", n.ssid, n.rssi, enc);
    }
    s
}

/// Format a MAC address as colon-separated upper-case hex.
pub fn format_mac(mac: &[u8; 6]) -> String {
    format!(
        "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
        mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
    )
}
