//! Network, protocol-session, and companion-app link traits.
//!
//! The throttle talks to three remote collaborators:
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`NetworkLink`] | Wi-Fi station: join, liveness, scan, interface info |
//! | [`ProtocolSession`] | Remote command-and-control session (speed, direction, functions, roster) |
//! | [`ConfigLink`] / [`StatusMirror`] | Short-range configuration/status values for the companion app |
//!
//! None of these traits block for long. Inbound traffic is polled with
//! `try_recv` in the cooperative main loop, mirroring the sync-first design
//! of an embedded pub/sub client.
//!
//! # Session notifications
//!
//! The session reports what the server tells it as [`SessionNotification`]
//! values. A [`SessionDelegate`] is the consumer side; its
//! [`dispatch`](SessionDelegate::dispatch) method routes one notification to
//! the matching handler.
//!
//! ```rust
//! use knobby_throttle::traits::{SessionDelegate, SessionNotification};
//!
//! #[derive(Default)]
//! struct PowerWatch {
//!     power: Option<bool>,
//! }
//!
//! impl SessionDelegate for PowerWatch {
//!     fn received_track_power(&mut self, on: bool) {
//!         self.power = Some(on);
//!     }
//! }
//!
//! let mut watch = PowerWatch::default();
//! watch.dispatch(SessionNotification::TrackPower(true));
//! watch.dispatch(SessionNotification::Speed(12)); // ignored by default
//! assert_eq!(watch.power, Some(true));
//! ```

extern crate alloc;
use alloc::string::String;
use alloc::vec::Vec;
use core::net::Ipv4Addr;

use crate::input::TogglePosition;
use crate::traits::Direction;
use crate::wireless::DeviceInformation;

// ============================================================================
// Network Link
// ============================================================================

/// One access point found by a scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkInfo {
    /// Network name.
    pub ssid: String,
    /// Signal strength in dBm.
    pub rssi: i8,
    /// `true` when the network needs no password.
    pub open: bool,
}

/// Addressing of the station interface once joined.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InterfaceInfo {
    /// Local IPv4 address.
    pub address: Ipv4Addr,
    /// Subnet mask.
    pub netmask: Ipv4Addr,
    /// Default gateway.
    pub gateway: Ipv4Addr,
    /// Station MAC address.
    pub mac: [u8; 6],
}

/// Wi-Fi station link.
///
/// `begin` only starts a join; completion is observed by polling
/// [`is_connected`](Self::is_connected). The connection state machine owns
/// the timeout.
pub trait NetworkLink {
    /// Error type for link operations.
    type Error: core::fmt::Debug;

    /// Start joining a network.
    fn begin(&mut self, ssid: &str, password: &str) -> Result<(), Self::Error>;

    /// Whether the station is associated and has an address.
    fn is_connected(&mut self) -> bool;

    /// Leave the current network (or abandon a join in progress).
    fn disconnect(&mut self);

    /// Scan for visible access points.
    fn scan(&mut self) -> Result<Vec<NetworkInfo>, Self::Error>;

    /// Interface addressing, if connected.
    fn interface_info(&mut self) -> Option<InterfaceInfo>;
}

// ============================================================================
// Protocol Session
// ============================================================================

/// Outcome of a locomotive acquisition request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Acquisition {
    /// The address is now controlled by this throttle.
    Acquired,
    /// Another controller holds the address; a steal may succeed.
    InUse,
    /// The server refused the address outright.
    Refused,
}

/// Something the server reported to the session.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionNotification {
    /// Protocol version; doubles as the handshake confirmation.
    Version(String),
    /// Speed of the controlled locomotive (0..=126).
    Speed(u8),
    /// Direction of the controlled locomotive.
    Direction(Direction),
    /// State of one function of the controlled locomotive.
    Function {
        /// Function index (F0 = 0).
        index: u8,
        /// Whether the function is on.
        on: bool,
    },
    /// Layout track power.
    TrackPower(bool),
    /// Speed-step mode of the controlled locomotive.
    SpeedSteps(u8),
    /// Port of the server's web interface.
    WebPort(u16),
    /// The fast clock advanced; read it back with the session accessors.
    FastTimeChanged,
    /// The fast clock ratio changed.
    FastTimeRateChanged(f32),
    /// The server expects a keep-alive at least every this many seconds.
    HeartbeatRequired(u16),
}

/// Remote command-and-control session.
///
/// Wire framing and encoding belong to the implementation; the throttle
/// only consumes these operations. `check` processes inbound traffic and
/// queues [`SessionNotification`]s for [`try_recv`](Self::try_recv).
pub trait ProtocolSession {
    /// Error type for session operations.
    type Error: core::fmt::Debug;

    /// Open the transport to the server.
    fn open(&mut self, host: &str, port: u16) -> Result<(), Self::Error>;

    /// Close the transport.
    fn close(&mut self);

    /// Whether the transport is still open.
    fn is_connected(&mut self) -> bool;

    /// Process pending inbound data. Returns `true` if anything was read.
    fn check(&mut self) -> bool;

    /// Next queued notification, if any. Never blocks.
    fn try_recv(&mut self) -> Option<SessionNotification>;

    /// Announce this throttle's name to the server.
    fn set_device_name(&mut self, name: &str) -> Result<(), Self::Error>;

    /// Set the speed of the controlled locomotive (0..=126).
    fn set_speed(&mut self, speed: u8) -> Result<(), Self::Error>;

    /// Set the direction of the controlled locomotive.
    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error>;

    /// Press or release a function of the controlled locomotive.
    fn set_function(&mut self, index: u8, pressed: bool) -> Result<(), Self::Error>;

    /// Request control of a locomotive.
    fn add_locomotive(&mut self, address: &str) -> Result<Acquisition, Self::Error>;

    /// Give up the controlled locomotive.
    fn release_locomotive(&mut self) -> Result<(), Self::Error>;

    /// Take a locomotive away from another controller.
    fn steal_locomotive(&mut self, address: &str) -> Result<Acquisition, Self::Error>;

    /// Fast clock hour (0..24).
    fn fast_time_hours(&self) -> u8;

    /// Fast clock minute (0..60).
    fn fast_time_minutes(&self) -> u8;

    /// Fast clock ratio (0.0 when stopped).
    fn fast_time_rate(&self) -> f32;

    /// Start sending keep-alives at the server's heartbeat period.
    fn require_heartbeat(&mut self) -> Result<(), Self::Error>;
}

/// Receiver of session notifications.
///
/// Every handler defaults to a no-op so implementors only override what
/// they care about.
pub trait SessionDelegate {
    /// Protocol version / handshake received.
    fn received_version(&mut self, _version: &str) {}

    /// Server reported the locomotive speed.
    fn received_speed(&mut self, _speed: u8) {}

    /// Server reported the locomotive direction.
    fn received_direction(&mut self, _direction: Direction) {}

    /// Server reported a function state.
    fn received_function_state(&mut self, _index: u8, _on: bool) {}

    /// Server reported track power.
    fn received_track_power(&mut self, _on: bool) {}

    /// Server reported the speed-step mode.
    fn received_speed_steps(&mut self, _steps: u8) {}

    /// Server reported its web port.
    fn received_web_port(&mut self, _port: u16) {}

    /// Fast clock advanced.
    fn fast_time_changed(&mut self) {}

    /// Fast clock ratio changed.
    fn fast_time_rate_changed(&mut self, _rate: f32) {}

    /// Server announced or changed its heartbeat period.
    fn heartbeat_required(&mut self, _period_s: u16) {}

    /// Route one notification to its handler.
    fn dispatch(&mut self, notification: SessionNotification) {
        match notification {
            SessionNotification::Version(v) => self.received_version(&v),
            SessionNotification::Speed(s) => self.received_speed(s),
            SessionNotification::Direction(d) => self.received_direction(d),
            SessionNotification::Function { index, on } => self.received_function_state(index, on),
            SessionNotification::TrackPower(on) => self.received_track_power(on),
            SessionNotification::SpeedSteps(steps) => self.received_speed_steps(steps),
            SessionNotification::WebPort(port) => self.received_web_port(port),
            SessionNotification::FastTimeChanged => self.fast_time_changed(),
            SessionNotification::FastTimeRateChanged(rate) => self.fast_time_rate_changed(rate),
            SessionNotification::HeartbeatRequired(s) => self.heartbeat_required(s),
        }
    }
}

// ============================================================================
// Companion App Link
// ============================================================================

/// A value written by the companion app.
///
/// Values are opaque strings; nothing is validated on the way in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigWrite {
    /// Throttle name.
    DeviceName(String),
    /// Wi-Fi network name.
    WifiSsid(String),
    /// Wi-Fi password.
    WifiPassword(String),
    /// Session server host.
    ServerAddress(String),
    /// Session server port, as text.
    ServerPort(String),
    /// Apply settings and reconnect. The payload is ignored.
    Command(String),
    /// Locomotive address to control.
    SelectedAddress(String),
}

/// Inbound side of the companion-app link.
pub trait ConfigLink {
    /// Next pending write, if any. Never blocks.
    fn try_recv(&mut self) -> Option<ConfigWrite>;
}

/// Outbound (read/notify) side of the companion-app link.
///
/// Implementations update the readable value and notify subscribers.
pub trait StatusMirror {
    /// Connection status text.
    fn connection_status(&mut self, status: &str);

    /// Current speed (0..=126).
    fn speed(&mut self, speed: u8);

    /// Current direction.
    fn direction(&mut self, direction: Direction);

    /// Current toggle position.
    fn toggle_position(&mut self, position: TogglePosition);

    /// Locomotive address under control (or staged).
    fn selected_address(&mut self, address: &str);

    /// Free-form status text shown in the app.
    fn long_description(&mut self, text: &str);

    /// Battery charge, 0..=100.
    fn battery_percentage(&mut self, percent: u8);

    /// Station addressing after joining a network.
    fn network_identity(&mut self, info: &InterfaceInfo);

    /// Formatted scan results.
    fn network_list(&mut self, list: &str);

    /// Read-only device information block.
    fn device_information(&mut self, info: &DeviceInformation);
}
