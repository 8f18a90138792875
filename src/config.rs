//! Shared configuration for the throttle firmware.
//!
//! Uses `heapless::String` for `no_std` compatibility while remaining
//! ergonomic to use on desktop with `std`.
//!
//! Two kinds of configuration exist:
//!
//! - **Build-time tuning** ([`Config`] and its sections): timer intervals,
//!   thresholds, the button and light tables. Plain data with builders.
//! - **Persisted settings** ([`ConfigKey`] via a [`ConfigStore`]): the
//!   strings the companion app writes (device name, Wi-Fi credentials,
//!   server). Read with a default when absent, and only when a connection
//!   attempt starts.
//!
//! # Example
//!
//! ```rust
//! use knobby_throttle::config::{Config, ConnectionConfig, ThrottleConfig};
//!
//! // Use defaults
//! let config = Config::default();
//! assert_eq!(config.hardware.report_interval_ms, 66);
//!
//! // Or customize
//! let config = Config::default()
//!     .with_connection(ConnectionConfig::default().with_connect_timeout_ms(5000))
//!     .with_throttle(ThrottleConfig::default().with_default_address("L3"));
//! ```

extern crate alloc;
use alloc::string::String;

use heapless::String as HString;
use heapless::Vec as HVec;

use crate::traits::AccelRange;

/// Maximum length for short config strings (names, addresses)
pub const MAX_SHORT_STRING: usize = 32;

/// Maximum length for longer config strings (passwords, host names)
pub const MAX_LONG_STRING: usize = 64;

/// Maximum number of mapped buttons (one per expander pin).
pub const MAX_BUTTONS: usize = 16;

/// Maximum number of function indicator lights.
pub const MAX_LIGHTS: usize = 16;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Type alias for longer config strings
pub type LongString = HString<MAX_LONG_STRING>;

// ============================================================================
// Helper for creating heapless strings
// ============================================================================

/// Create a ShortString from a &str, truncating if too long
pub fn short_string(s: &str) -> ShortString {
    let mut hs = ShortString::new();
    let _ = hs.push_str(&s[..utf8_prefix(s, MAX_SHORT_STRING)]);
    hs
}

/// Create a LongString from a &str, truncating if too long
pub fn long_string(s: &str) -> LongString {
    let mut hs = LongString::new();
    let _ = hs.push_str(&s[..utf8_prefix(s, MAX_LONG_STRING)]);
    hs
}

/// Longest prefix of `s` no longer than `max` bytes ending on a char boundary.
fn utf8_prefix(s: &str, max: usize) -> usize {
    s.char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .take_while(|&end| end <= max)
        .last()
        .unwrap_or(0)
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete application configuration
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Physical inputs and polling rates
    pub hardware: HardwareConfig,
    /// Connection lifecycle timing
    pub connection: ConnectionConfig,
    /// Event routing behaviour
    pub throttle: ThrottleConfig,
}

impl Config {
    /// Set hardware configuration
    pub fn with_hardware(mut self, hardware: HardwareConfig) -> Self {
        self.hardware = hardware;
        self
    }

    /// Set connection configuration
    pub fn with_connection(mut self, connection: ConnectionConfig) -> Self {
        self.connection = connection;
        self
    }

    /// Set throttle configuration
    pub fn with_throttle(mut self, throttle: ThrottleConfig) -> Self {
        self.throttle = throttle;
        self
    }
}

// ============================================================================
// Hardware Config
// ============================================================================

/// A function button on the I/O expander.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ButtonMapping {
    /// Expander pin (0..16)
    pub pin: u8,
    /// Protocol function index
    pub function: u8,
    /// Label used in logs
    pub name: ShortString,
}

impl ButtonMapping {
    /// Create a mapping
    pub fn new(pin: u8, function: u8, name: &str) -> Self {
        Self {
            pin,
            function,
            name: short_string(name),
        }
    }
}

/// A function indicator light on the I/O expander.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FunctionLight {
    /// Protocol function index
    pub function: u8,
    /// Expander pin driving the LED (active-low)
    pub pin: u8,
}

/// Physical input configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HardwareConfig {
    /// Speed dial oversampling period
    pub sample_interval_ms: u32,
    /// Speed/toggle report period
    pub report_interval_ms: u32,
    /// Accelerometer poll period
    pub motion_interval_ms: u32,
    /// Battery poll period
    pub battery_interval_ms: u32,
    /// Minimum battery change that is reported, in millivolts
    pub battery_threshold_mv: u16,
    /// Minimum per-axis acceleration change that counts as motion, in mg
    pub motion_threshold_mg: u16,
    /// Accelerometer full-scale range
    pub accel_range: AccelRange,
    /// Expander input debounce time
    pub debounce_ms: u8,
    /// Function buttons
    pub buttons: HVec<ButtonMapping, MAX_BUTTONS>,
    /// Function indicator lights
    pub lights: HVec<FunctionLight, MAX_LIGHTS>,
    /// Status LED red, green, blue expander pins
    pub status_led_pins: [u8; 3],
    /// Status LED shares its anode
    pub status_led_common_anode: bool,
    /// Expander pin of the blinking pilot light (active low), if fitted
    pub pilot_light_pin: Option<u8>,
    /// Pilot light toggle period
    pub pilot_interval_ms: u32,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        let mut buttons = HVec::new();
        let _ = buttons.push(ButtonMapping::new(8, 9, "BRAKE"));
        let labels = [
            "BUTTON1", "BUTTON2", "BUTTON3", "BUTTON4", "BUTTON5", "BUTTON6", "BUTTON7", "BUTTON8",
        ];
        for (function, name) in labels.iter().enumerate() {
            // BUTTON1 sits on pin 7, BUTTON8 on pin 0
            let _ = buttons.push(ButtonMapping::new(7 - function as u8, function as u8, name));
        }

        let mut lights = HVec::new();
        let _ = lights.push(FunctionLight { function: 0, pin: 9 });

        Self {
            sample_interval_ms: 13,
            report_interval_ms: 66,
            motion_interval_ms: 200,
            battery_interval_ms: 2500,
            battery_threshold_mv: 50,
            motion_threshold_mg: 100,
            accel_range: AccelRange::G4,
            debounce_ms: 16,
            buttons,
            lights,
            status_led_pins: [15, 14, 13],
            status_led_common_anode: false,
            pilot_light_pin: None,
            pilot_interval_ms: 1000,
        }
    }
}

impl HardwareConfig {
    /// Set the report period; the sample period follows at five samples per report
    pub fn with_report_interval_ms(mut self, ms: u32) -> Self {
        self.report_interval_ms = ms;
        self.sample_interval_ms = (ms / 5).max(1);
        self
    }

    /// Set the battery poll period
    pub fn with_battery_interval_ms(mut self, ms: u32) -> Self {
        self.battery_interval_ms = ms;
        self
    }

    /// Set the battery report threshold
    pub fn with_battery_threshold_mv(mut self, mv: u16) -> Self {
        self.battery_threshold_mv = mv;
        self
    }

    /// Set the motion threshold
    pub fn with_motion_threshold_mg(mut self, mg: u16) -> Self {
        self.motion_threshold_mg = mg;
        self
    }

    /// Replace the button table (extra entries are dropped)
    pub fn with_buttons(mut self, buttons: &[ButtonMapping]) -> Self {
        self.buttons.clear();
        for b in buttons.iter().take(MAX_BUTTONS) {
            let _ = self.buttons.push(b.clone());
        }
        self
    }

    /// Replace the light table (extra entries are dropped)
    pub fn with_lights(mut self, lights: &[FunctionLight]) -> Self {
        self.lights.clear();
        for l in lights.iter().take(MAX_LIGHTS) {
            let _ = self.lights.push(*l);
        }
        self
    }

    /// Blink a pilot light on `pin`
    pub fn with_pilot_light(mut self, pin: u8) -> Self {
        self.pilot_light_pin = Some(pin);
        self
    }

    /// Light pin for a function, if it has one
    pub fn light_for(&self, function: u8) -> Option<u8> {
        self.lights
            .iter()
            .find(|l| l.function == function)
            .map(|l| l.pin)
    }
}

// ============================================================================
// Connection Config
// ============================================================================

/// Connection lifecycle timing
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConnectionConfig {
    /// How long a Wi-Fi join may take before falling back to scanning
    pub connect_timeout_ms: u32,
    /// Period of background scans after a failed join
    pub scan_interval_ms: u32,
    /// Delay between session open attempts
    pub session_retry_ms: u32,
    /// How long to wait for the protocol handshake after opening
    pub handshake_timeout_ms: u32,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 15_000,
            scan_interval_ms: 30_000,
            session_retry_ms: 1_000,
            handshake_timeout_ms: 10_000,
        }
    }
}

impl ConnectionConfig {
    /// Set the join timeout
    pub fn with_connect_timeout_ms(mut self, ms: u32) -> Self {
        self.connect_timeout_ms = ms;
        self
    }

    /// Set the scan period
    pub fn with_scan_interval_ms(mut self, ms: u32) -> Self {
        self.scan_interval_ms = ms;
        self
    }

    /// Set the session retry delay
    pub fn with_session_retry_ms(mut self, ms: u32) -> Self {
        self.session_retry_ms = ms;
        self
    }

    /// Set the handshake timeout
    pub fn with_handshake_timeout_ms(mut self, ms: u32) -> Self {
        self.handshake_timeout_ms = ms;
        self
    }
}

// ============================================================================
// Throttle Config
// ============================================================================

/// Event routing configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThrottleConfig {
    /// Automatic steal attempts before an in-use address is given up
    pub steal_attempts: u8,
    /// Battery voltage shown as 0%
    pub battery_empty_mv: u16,
    /// Battery voltage shown as 100%
    pub battery_full_mv: u16,
    /// Name announced to the session server
    pub device_name: ShortString,
    /// Address selected when nothing was chosen yet
    pub default_address: ShortString,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            steal_attempts: 3,
            battery_empty_mv: 3300,
            battery_full_mv: 4200,
            device_name: short_string("mylittlethrottle"),
            default_address: short_string("S21"),
        }
    }
}

impl ThrottleConfig {
    /// Set the steal attempt limit
    pub fn with_steal_attempts(mut self, attempts: u8) -> Self {
        self.steal_attempts = attempts;
        self
    }

    /// Set the battery calibration points
    pub fn with_battery_range(mut self, empty_mv: u16, full_mv: u16) -> Self {
        self.battery_empty_mv = empty_mv;
        self.battery_full_mv = full_mv;
        self
    }

    /// Set the announced device name
    pub fn with_device_name(mut self, name: &str) -> Self {
        self.device_name = short_string(name);
        self
    }

    /// Set the default locomotive address
    pub fn with_default_address(mut self, address: &str) -> Self {
        self.default_address = short_string(address);
        self
    }

    /// Map a battery voltage onto 0..=100 using the calibration points.
    pub fn battery_percent(&self, millivolts: u16) -> u8 {
        let empty = self.battery_empty_mv as i32;
        let full = self.battery_full_mv as i32;
        if full <= empty {
            return if millivolts as i32 >= full { 100 } else { 0 };
        }
        let pct = (millivolts as i32 - empty) * 100 / (full - empty);
        pct.clamp(0, 100) as u8
    }
}

// ============================================================================
// Persisted Settings
// ============================================================================

/// A persisted string setting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    /// Throttle name
    DeviceName,
    /// Serial number shown in the device information block
    SerialNumber,
    /// Wi-Fi network name
    WifiSsid,
    /// Wi-Fi password
    WifiPassword,
    /// Session server host
    ServerAddress,
    /// Session server port
    ServerPort,
}

impl ConfigKey {
    /// Every key.
    pub const ALL: [ConfigKey; 6] = [
        ConfigKey::DeviceName,
        ConfigKey::SerialNumber,
        ConfigKey::WifiSsid,
        ConfigKey::WifiPassword,
        ConfigKey::ServerAddress,
        ConfigKey::ServerPort,
    ];

    /// Storage key (short enough for NVS's 15-character limit).
    pub const fn storage_key(&self) -> &'static str {
        match self {
            ConfigKey::DeviceName => "deviceName",
            ConfigKey::SerialNumber => "serial",
            ConfigKey::WifiSsid => "ssid",
            ConfigKey::WifiPassword => "password",
            ConfigKey::ServerAddress => "server",
            ConfigKey::ServerPort => "port",
        }
    }

    /// Value used when nothing is stored.
    pub const fn default_value(&self) -> &'static str {
        match self {
            ConfigKey::DeviceName => "Device Name",
            ConfigKey::SerialNumber => "0000",
            ConfigKey::WifiSsid => "SSID",
            ConfigKey::WifiPassword => "Password",
            ConfigKey::ServerAddress => "Server",
            ConfigKey::ServerPort => "12090",
        }
    }
}

/// Named string records that survive a reboot.
pub trait ConfigStore {
    /// Error type for storage operations.
    type Error: core::fmt::Debug;

    /// Stored value, or `None` if absent or unreadable.
    fn read(&mut self, key: ConfigKey) -> Option<String>;

    /// Store a value.
    fn write(&mut self, key: ConfigKey, value: &str) -> Result<(), Self::Error>;

    /// Stored value or the key's default.
    fn get_or_default(&mut self, key: ConfigKey) -> String {
        self.read(key)
            .unwrap_or_else(|| String::from(key.default_value()))
    }
}

/// Connection settings read from the store at the start of an attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkSettings {
    /// Wi-Fi network name
    pub ssid: String,
    /// Wi-Fi password
    pub password: String,
    /// Session server host
    pub server: String,
    /// Session server port as stored; parsed on use
    pub port: String,
}

impl NetworkSettings {
    /// Load the current values (defaults where absent).
    pub fn load<S: ConfigStore + ?Sized>(store: &mut S) -> Self {
        Self {
            ssid: store.get_or_default(ConfigKey::WifiSsid),
            password: store.get_or_default(ConfigKey::WifiPassword),
            server: store.get_or_default(ConfigKey::ServerAddress),
            port: store.get_or_default(ConfigKey::ServerPort),
        }
    }

    /// The port as a number, if it parses.
    pub fn port(&self) -> Option<u16> {
        self.port.trim().parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MockStore;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.hardware.sample_interval_ms, 13);
        assert_eq!(config.hardware.report_interval_ms, 66);
        assert_eq!(config.hardware.motion_interval_ms, 200);
        assert_eq!(config.hardware.battery_interval_ms, 2500);
        assert_eq!(config.hardware.pilot_light_pin, None);
        assert_eq!(config.hardware.pilot_interval_ms, 1000);
        assert_eq!(config.connection.session_retry_ms, 1000);
        assert_eq!(config.throttle.steal_attempts, 3);
        assert_eq!(config.throttle.default_address.as_str(), "S21");
    }

    #[test]
    fn default_button_table() {
        let hw = HardwareConfig::default();
        assert_eq!(hw.buttons.len(), 9);
        assert_eq!(hw.buttons[0], ButtonMapping::new(8, 9, "BRAKE"));
        assert_eq!(hw.buttons[1], ButtonMapping::new(7, 0, "BUTTON1"));
        assert_eq!(hw.buttons[8], ButtonMapping::new(0, 7, "BUTTON8"));
    }

    #[test]
    fn light_lookup() {
        let hw = HardwareConfig::default();
        assert_eq!(hw.light_for(0), Some(9));
        assert_eq!(hw.light_for(1), None);
    }

    #[test]
    fn report_interval_drives_sampling() {
        let hw = HardwareConfig::default().with_report_interval_ms(50);
        assert_eq!(hw.report_interval_ms, 50);
        assert_eq!(hw.sample_interval_ms, 10);
        let hw = HardwareConfig::default().with_report_interval_ms(2);
        assert_eq!(hw.sample_interval_ms, 1);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::default()
            .with_hardware(HardwareConfig::default().with_battery_threshold_mv(20))
            .with_connection(ConnectionConfig::default().with_scan_interval_ms(5000))
            .with_throttle(ThrottleConfig::default().with_device_name("cab2"));
        assert_eq!(config.hardware.battery_threshold_mv, 20);
        assert_eq!(config.connection.scan_interval_ms, 5000);
        assert_eq!(config.throttle.device_name.as_str(), "cab2");
    }

    #[test]
    fn battery_percent_clamped() {
        let t = ThrottleConfig::default();
        assert_eq!(t.battery_percent(3000), 0);
        assert_eq!(t.battery_percent(3300), 0);
        assert_eq!(t.battery_percent(3750), 50);
        assert_eq!(t.battery_percent(4200), 100);
        assert_eq!(t.battery_percent(5000), 100);
    }

    #[test]
    fn battery_percent_degenerate_range() {
        let t = ThrottleConfig::default().with_battery_range(4000, 4000);
        assert_eq!(t.battery_percent(3999), 0);
        assert_eq!(t.battery_percent(4000), 100);
    }

    #[test]
    fn short_string_truncation() {
        let long = "a".repeat(100);
        assert_eq!(short_string(&long).len(), MAX_SHORT_STRING);
        assert_eq!(long_string(&long).len(), MAX_LONG_STRING);
    }

    #[test]
    fn string_helpers_utf8_boundary() {
        // 31 ASCII bytes then a 3-byte char: only the ASCII fits
        let s = alloc::format!("{}€", "x".repeat(31));
        assert_eq!(short_string(&s).len(), 31);
        assert_eq!(short_string("héllo").as_str(), "héllo");
    }

    #[test]
    fn store_defaults_when_absent() {
        let mut store = MockStore::new();
        assert_eq!(store.get_or_default(ConfigKey::WifiSsid), "SSID");
        store.write(ConfigKey::WifiSsid, "layout").unwrap();
        assert_eq!(store.get_or_default(ConfigKey::WifiSsid), "layout");
    }

    #[test]
    fn network_settings_port_parsing() {
        let mut store = MockStore::new();
        let settings = NetworkSettings::load(&mut store);
        assert_eq!(settings.port(), Some(12090));
        assert_eq!(settings.server, "Server");

        store.write(ConfigKey::ServerPort, "not a port").unwrap();
        assert_eq!(NetworkSettings::load(&mut store).port(), None);

        store.write(ConfigKey::ServerPort, " 2560 ").unwrap();
        assert_eq!(NetworkSettings::load(&mut store).port(), Some(2560));
    }

    #[test]
    fn storage_keys_fit_nvs() {
        for key in ConfigKey::ALL {
            assert!(key.storage_key().len() <= 15);
        }
    }
}
