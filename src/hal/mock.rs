//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for all hardware, network and panel
//! traits, enabling development and testing on desktop without a board.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockKnob`] | [`AnalogInput`] | Fixed or queued raw dial readings |
//! | [`MockToggle`] | [`ToggleInput`] | Settable toggle position |
//! | [`MockExpander`] | [`GpioExpander`] | Pin levels, queued interrupt masks, setup log |
//! | [`MockAccelerometer`] | [`Accelerometer`] | Settable sample, optional absence |
//! | [`MockBattery`] | [`BatteryMonitor`] | Settable voltage |
//! | [`MockStatusLed`] | [`StatusIndicator`] | Colour history |
//! | [`MockPanel`] | [`IndicatorPanel`] | Light and clock log |
//! | [`MockClock`] | [`Clock`] | Controllable time source |
//! | [`MockLink`] | [`NetworkLink`] | Reachability switch, scan results |
//! | [`MockSession`] | [`ProtocolSession`] | Call log, scripted acquisitions, queued notifications |
//! | [`MockAppLink`] | [`ConfigLink`] + [`StatusMirror`] | Queued writes, mirrored values |
//! | [`MockStore`] | [`ConfigStore`] | In-memory settings |
//! | [`MockObserver`] | [`HardwareObserver`] | Records hardware events |
//! | [`MockI2c`] | `embedded_hal::i2c::I2c` | Register-file bus for driver tests |
//!
//! # Example
//!
//! ```rust
//! use knobby_throttle::hal::{MockAppLink, MockPanel, MockSession};
//! use knobby_throttle::hardware::HardwareObserver;
//! use knobby_throttle::traits::Direction;
//! use knobby_throttle::{ThrottleConfig, ThrottleController, TogglePosition};
//!
//! let mut router = ThrottleController::new(
//!     MockSession::new(),
//!     MockAppLink::new(),
//!     MockPanel::new(),
//!     ThrottleConfig::default(),
//!     &[],
//! );
//! router.session_activated("cab");
//! router.toggle_position_changed(TogglePosition::Left);
//!
//! assert_eq!(router.session().directions(), [Direction::Reverse]);
//! ```
//!
//! [`AnalogInput`]: crate::traits::AnalogInput
//! [`ToggleInput`]: crate::traits::ToggleInput
//! [`GpioExpander`]: crate::traits::GpioExpander
//! [`Accelerometer`]: crate::traits::Accelerometer
//! [`BatteryMonitor`]: crate::traits::BatteryMonitor
//! [`StatusIndicator`]: crate::traits::StatusIndicator
//! [`IndicatorPanel`]: crate::traits::IndicatorPanel
//! [`Clock`]: crate::traits::Clock
//! [`NetworkLink`]: crate::traits::NetworkLink
//! [`ProtocolSession`]: crate::traits::ProtocolSession
//! [`ConfigLink`]: crate::traits::ConfigLink
//! [`StatusMirror`]: crate::traits::StatusMirror
//! [`ConfigStore`]: crate::config::ConfigStore
//! [`HardwareObserver`]: crate::hardware::HardwareObserver

extern crate alloc;
use alloc::collections::{BTreeMap, VecDeque};
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

use crate::config::{ConfigKey, ConfigStore};
use crate::hardware::{HardwareEvent, HardwareObserver};
use crate::input::TogglePosition;
use crate::traits::{
    AccelRange, Acceleration, Accelerometer, Acquisition, AnalogInput, BatteryMonitor, Clock,
    ConfigLink, ConfigWrite, Direction, GpioExpander, IndicatorPanel, InterfaceInfo, NetworkInfo,
    NetworkLink, ProtocolSession, Rgb, SessionNotification, StatusIndicator, StatusMirror,
    ToggleInput,
};
use crate::wireless::DeviceInformation;

// ============================================================================
// Hardware Mocks
// ============================================================================

/// Mock speed dial.
///
/// Returns queued readings first, then the fixed `raw` value.
///
/// ```rust
/// use knobby_throttle::hal::MockKnob;
/// use knobby_throttle::traits::AnalogInput;
///
/// let mut knob = MockKnob::new().with_raw(100);
/// knob.queue_raw(&[1, 2]);
/// assert_eq!(knob.read_raw(), 1);
/// assert_eq!(knob.read_raw(), 2);
/// assert_eq!(knob.read_raw(), 100);
/// ```
#[derive(Debug, Default)]
pub struct MockKnob {
    /// Reading returned when the queue is empty.
    pub raw: u16,
    /// Number of reads.
    pub reads: usize,
    queue: VecDeque<u16>,
}

impl MockKnob {
    /// Creates a dial reading 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a dial with a fixed reading.
    pub fn with_raw(mut self, raw: u16) -> Self {
        self.raw = raw;
        self
    }

    /// Change the fixed reading.
    pub fn set_raw(&mut self, raw: u16) {
        self.raw = raw;
    }

    /// Queue a recorded reading sequence.
    pub fn queue_raw(&mut self, raws: &[u16]) {
        self.queue.extend(raws.iter().copied());
    }
}

impl AnalogInput for MockKnob {
    fn read_raw(&mut self) -> u16 {
        self.reads += 1;
        self.queue.pop_front().unwrap_or(self.raw)
    }
}

/// Mock direction toggle. Starts centered (both lines high).
#[derive(Debug)]
pub struct MockToggle {
    /// Left line level.
    pub left: bool,
    /// Right line level.
    pub right: bool,
}

impl MockToggle {
    /// Creates a centered toggle.
    pub fn new() -> Self {
        Self {
            left: true,
            right: true,
        }
    }

    /// Creates a toggle with explicit line levels.
    pub fn with_levels(mut self, left: bool, right: bool) -> Self {
        self.left = left;
        self.right = right;
        self
    }

    /// Creates a toggle in the given position.
    pub fn with_position(mut self, position: TogglePosition) -> Self {
        self.set(position);
        self
    }

    /// Move the toggle.
    pub fn set(&mut self, position: TogglePosition) {
        let (left, right) = match position {
            TogglePosition::Left => (false, true),
            TogglePosition::Right => (true, false),
            TogglePosition::CenterOff => (true, true),
            TogglePosition::Unknown => (false, false),
        };
        self.left = left;
        self.right = right;
    }
}

impl Default for MockToggle {
    fn default() -> Self {
        Self::new()
    }
}

impl ToggleInput for MockToggle {
    fn left_level(&mut self) -> bool {
        self.left
    }

    fn right_level(&mut self) -> bool {
        self.right
    }
}

/// Mock battery monitor.
#[derive(Debug, Default)]
pub struct MockBattery {
    /// Voltage returned by every read.
    pub millivolts: u16,
}

impl MockBattery {
    /// Creates a battery at the given voltage.
    pub fn new(millivolts: u16) -> Self {
        Self { millivolts }
    }
}

impl BatteryMonitor for MockBattery {
    fn read_millivolts(&mut self) -> u16 {
        self.millivolts
    }
}

/// Mock I/O expander.
///
/// All pins read high (released) until changed with [`set_pin`](Self::set_pin).
/// Interrupt masks are returned in queue order, then 0.
///
/// ```rust
/// use knobby_throttle::hal::MockExpander;
/// use knobby_throttle::traits::GpioExpander;
///
/// let mut ex = MockExpander::new();
/// ex.queue_interrupt(0b100);
/// assert_eq!(ex.interrupt_source().unwrap(), 0b100);
/// assert_eq!(ex.interrupt_source().unwrap(), 0);
/// ```
#[derive(Debug)]
pub struct MockExpander {
    /// `begin` succeeded.
    pub began: bool,
    /// Make `begin` fail.
    pub fail_begin: bool,
    /// Make `interrupt_source` fail.
    pub fail_interrupt_read: bool,
    /// Configured debounce time.
    pub debounce_ms: Option<u8>,
    /// Pins configured as buttons.
    pub buttons: Vec<u8>,
    /// Pins configured as outputs.
    pub outputs: Vec<u8>,
    /// Pins configured as PWM outputs.
    pub pwm_outputs: Vec<u8>,
    /// Every `digital_write`, in order.
    pub writes: Vec<(u8, bool)>,
    /// Number of `digital_read` calls.
    pub reads: usize,
    levels: u16,
    pwm: [u8; 16],
    interrupts: VecDeque<u16>,
}

impl MockExpander {
    /// Creates an expander with every pin high.
    pub fn new() -> Self {
        Self {
            began: false,
            fail_begin: false,
            fail_interrupt_read: false,
            debounce_ms: None,
            buttons: Vec::new(),
            outputs: Vec::new(),
            pwm_outputs: Vec::new(),
            writes: Vec::new(),
            reads: 0,
            levels: 0xFFFF,
            pwm: [0; 16],
            interrupts: VecDeque::new(),
        }
    }

    /// Drive a pin level from the outside.
    pub fn set_pin(&mut self, pin: u8, high: bool) {
        if high {
            self.levels |= 1 << pin;
        } else {
            self.levels &= !(1 << pin);
        }
    }

    /// Current level of a pin.
    pub fn level(&self, pin: u8) -> bool {
        self.levels & (1 << pin) != 0
    }

    /// Last PWM value written to a pin.
    pub fn pwm(&self, pin: u8) -> u8 {
        self.pwm[pin as usize & 0x0F]
    }

    /// Queue an interrupt status mask.
    pub fn queue_interrupt(&mut self, mask: u16) {
        self.interrupts.push_back(mask);
    }
}

impl Default for MockExpander {
    fn default() -> Self {
        Self::new()
    }
}

impl GpioExpander for MockExpander {
    type Error = ();

    fn begin(&mut self) -> Result<(), ()> {
        if self.fail_begin {
            return Err(());
        }
        self.began = true;
        Ok(())
    }

    fn set_debounce_time(&mut self, ms: u8) -> Result<(), ()> {
        self.debounce_ms = Some(ms);
        Ok(())
    }

    fn setup_button(&mut self, pin: u8) -> Result<(), ()> {
        self.buttons.push(pin);
        Ok(())
    }

    fn setup_output(&mut self, pin: u8) -> Result<(), ()> {
        self.outputs.push(pin);
        Ok(())
    }

    fn setup_pwm_output(&mut self, pin: u8) -> Result<(), ()> {
        self.pwm_outputs.push(pin);
        Ok(())
    }

    fn interrupt_source(&mut self) -> Result<u16, ()> {
        if self.fail_interrupt_read {
            return Err(());
        }
        Ok(self.interrupts.pop_front().unwrap_or(0))
    }

    fn digital_read(&mut self, pin: u8) -> Result<bool, ()> {
        self.reads += 1;
        Ok(self.level(pin))
    }

    fn digital_write(&mut self, pin: u8, high: bool) -> Result<(), ()> {
        self.writes.push((pin, high));
        self.set_pin(pin, high);
        Ok(())
    }

    fn analog_write(&mut self, pin: u8, value: u8) -> Result<(), ()> {
        self.pwm[pin as usize & 0x0F] = value;
        Ok(())
    }
}

/// Mock accelerometer.
#[derive(Debug, Default)]
pub struct MockAccelerometer {
    /// Sample returned by `read`.
    pub sample: Acceleration,
    /// Range set by the driver.
    pub range: Option<AccelRange>,
    /// Device does not answer.
    pub missing: bool,
}

impl MockAccelerometer {
    /// Creates a sensor at rest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sensor that fails to start.
    pub fn with_missing(mut self) -> Self {
        self.missing = true;
        self
    }

    /// Creates a sensor returning the given sample.
    pub fn with_sample(mut self, sample: Acceleration) -> Self {
        self.sample = sample;
        self
    }
}

impl Accelerometer for MockAccelerometer {
    type Error = ();

    fn begin(&mut self) -> Result<(), ()> {
        if self.missing {
            Err(())
        } else {
            Ok(())
        }
    }

    fn set_range(&mut self, range: AccelRange) -> Result<(), ()> {
        self.range = Some(range);
        Ok(())
    }

    fn read(&mut self) -> Result<Acceleration, ()> {
        if self.missing {
            Err(())
        } else {
            Ok(self.sample)
        }
    }
}

/// Mock status LED recording every colour shown.
#[derive(Debug, Default)]
pub struct MockStatusLed {
    /// Colours in the order they were set.
    pub history: Vec<Rgb>,
}

impl MockStatusLed {
    /// Creates a dark LED.
    pub fn new() -> Self {
        Self::default()
    }

    /// Colour currently shown.
    pub fn color(&self) -> Rgb {
        self.history.last().copied().unwrap_or(Rgb::OFF)
    }
}

impl StatusIndicator for MockStatusLed {
    fn set_color(&mut self, color: Rgb) {
        self.history.push(color);
    }
}

/// Mock indicator panel.
#[derive(Debug, Default)]
pub struct MockPanel {
    /// Light changes in order.
    pub lights: Vec<(u8, bool)>,
    /// Clock values shown, with colon state.
    pub clock: Vec<(u16, bool)>,
}

impl MockPanel {
    /// Creates an empty panel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Last state of a light pin.
    pub fn light(&self, pin: u8) -> Option<bool> {
        self.lights
            .iter()
            .rev()
            .find(|(p, _)| *p == pin)
            .map(|(_, on)| *on)
    }
}

impl IndicatorPanel for MockPanel {
    fn set_function_light(&mut self, pin: u8, on: bool) {
        self.lights.push((pin, on));
    }

    fn show_clock(&mut self, value: u16, colon: bool) {
        self.clock.push((value, colon));
    }
}

/// Observer that records every event.
#[derive(Debug, Default)]
pub struct MockObserver {
    /// Events in the order they were reported.
    pub events: Vec<HardwareEvent>,
}

impl MockObserver {
    /// Number of recorded events matching `pred`.
    pub fn count<F: Fn(&HardwareEvent) -> bool>(&self, pred: F) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl HardwareObserver for MockObserver {
    fn speed_changed(&mut self, speed: u8, position: TogglePosition) {
        self.events.push(HardwareEvent::Speed(speed, position));
    }

    fn toggle_position_changed(&mut self, position: TogglePosition) {
        self.events.push(HardwareEvent::Toggle(position));
    }

    fn function_button_changed(&mut self, function: u8, pressed: bool) {
        self.events.push(HardwareEvent::Button(function, pressed));
    }

    fn battery_level_changed(&mut self, millivolts: u16) {
        self.events.push(HardwareEvent::Battery(millivolts));
    }

    fn motion_detected(&mut self) {
        self.events.push(HardwareEvent::Motion);
    }
}

// ============================================================================
// Clock Mock
// ============================================================================

/// Mock clock for testing time-dependent behavior.
///
/// Allows precise control over time for testing the interval timers and
/// connection timeouts.
///
/// # Example
///
/// ```rust
/// use knobby_throttle::hal::MockClock;
/// use knobby_throttle::traits::Clock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.set(1000);
/// assert_eq!(clock.now_ms(), 1000);
///
/// clock.advance(500);
/// assert_eq!(clock.now_ms(), 1500);
/// ```
#[derive(Debug, Default)]
pub struct MockClock {
    current_ms: u64,
}

impl MockClock {
    /// Creates a new mock clock starting at 0ms.
    pub fn new() -> Self {
        Self { current_ms: 0 }
    }

    /// Sets the current time in milliseconds.
    pub fn set(&mut self, ms: u64) {
        self.current_ms = ms;
    }

    /// Advances the clock by the given duration.
    pub fn advance(&mut self, ms: u64) {
        self.current_ms += ms;
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.current_ms
    }
}

// ============================================================================
// Network Mocks
// ============================================================================

/// Mock Wi-Fi link.
///
/// A join completes immediately when `reachable` is set, otherwise it
/// never completes.
#[derive(Debug, Default)]
pub struct MockLink {
    /// Whether a join succeeds.
    pub reachable: bool,
    /// Currently joined.
    pub connected: bool,
    /// Make `begin` fail.
    pub fail_begin: bool,
    /// Every `begin` call as (ssid, password).
    pub joins: Vec<(String, String)>,
    /// Number of `disconnect` calls.
    pub disconnects: usize,
    /// Number of scans.
    pub scans: usize,
    /// Scan results.
    pub networks: Vec<NetworkInfo>,
    /// Interface info reported once connected.
    pub interface: Option<InterfaceInfo>,
}

impl MockLink {
    /// Creates an unreachable link.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a link whose joins succeed.
    pub fn reachable() -> Self {
        Self {
            reachable: true,
            ..Self::default()
        }
    }

    /// Add a scan result.
    pub fn with_network(mut self, ssid: &str, rssi: i8, open: bool) -> Self {
        self.networks.push(NetworkInfo {
            ssid: ssid.to_string(),
            rssi,
            open,
        });
        self
    }

    /// Set the interface info.
    pub fn with_interface(mut self, info: InterfaceInfo) -> Self {
        self.interface = Some(info);
        self
    }

    /// Simulate losing the access point.
    pub fn drop_link(&mut self) {
        self.connected = false;
    }
}

impl NetworkLink for MockLink {
    type Error = ();

    fn begin(&mut self, ssid: &str, password: &str) -> Result<(), ()> {
        self.joins.push((ssid.to_string(), password.to_string()));
        if self.fail_begin {
            return Err(());
        }
        self.connected = self.reachable;
        Ok(())
    }

    fn is_connected(&mut self) -> bool {
        self.connected
    }

    fn disconnect(&mut self) {
        self.disconnects += 1;
        self.connected = false;
    }

    fn scan(&mut self) -> Result<Vec<NetworkInfo>, ()> {
        self.scans += 1;
        Ok(self.networks.clone())
    }

    fn interface_info(&mut self) -> Option<InterfaceInfo> {
        if self.connected {
            self.interface
        } else {
            None
        }
    }
}

/// One call made on a [`MockSession`].
#[derive(Clone, Debug, PartialEq)]
pub enum SessionCall {
    /// `open(host, port)`
    Open(String, u16),
    /// `close()`
    Close,
    /// `set_device_name`
    DeviceName(String),
    /// `set_speed`
    Speed(u8),
    /// `set_direction`
    Direction(Direction),
    /// `set_function`
    Function(u8, bool),
    /// `add_locomotive`
    Add(String),
    /// `release_locomotive`
    Release,
    /// `steal_locomotive`
    Steal(String),
    /// `require_heartbeat`
    RequireHeartbeat,
}

/// Mock protocol session.
///
/// Records every call. Acquisition results are scripted per call and
/// default to [`Acquisition::Acquired`].
#[derive(Debug, Default)]
pub struct MockSession {
    /// Calls in order (`check`/`try_recv`/`is_connected` are not logged).
    pub calls: Vec<SessionCall>,
    /// Transport open.
    pub connected: bool,
    /// Make `open` fail.
    pub refuse_open: bool,
    /// Fast clock hour.
    pub hours: u8,
    /// Fast clock minute.
    pub minutes: u8,
    /// Fast clock ratio.
    pub rate: f32,
    add_results: VecDeque<Acquisition>,
    steal_results: VecDeque<Acquisition>,
    inbound: VecDeque<SessionNotification>,
}

impl MockSession {
    /// Creates a closed session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next `add_locomotive` result.
    pub fn queue_add(&mut self, result: Acquisition) {
        self.add_results.push_back(result);
    }

    /// Script the next `steal_locomotive` result.
    pub fn queue_steal(&mut self, result: Acquisition) {
        self.steal_results.push_back(result);
    }

    /// Queue an inbound notification.
    pub fn push(&mut self, notification: SessionNotification) {
        self.inbound.push_back(notification);
    }

    /// Simulate the server dropping the connection.
    pub fn drop_connection(&mut self) {
        self.connected = false;
    }

    /// Speeds sent, in order.
    pub fn speeds(&self) -> Vec<u8> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                SessionCall::Speed(s) => Some(*s),
                _ => None,
            })
            .collect()
    }

    /// Directions sent, in order.
    pub fn directions(&self) -> Vec<Direction> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                SessionCall::Direction(d) => Some(*d),
                _ => None,
            })
            .collect()
    }

    /// Number of steal attempts.
    pub fn steals(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, SessionCall::Steal(_)))
            .count()
    }

    /// Number of recorded calls matching `pred`.
    pub fn count<F: Fn(&SessionCall) -> bool>(&self, pred: F) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }
}

impl ProtocolSession for MockSession {
    type Error = ();

    fn open(&mut self, host: &str, port: u16) -> Result<(), ()> {
        self.calls.push(SessionCall::Open(host.to_string(), port));
        if self.refuse_open {
            return Err(());
        }
        self.connected = true;
        Ok(())
    }

    fn close(&mut self) {
        self.calls.push(SessionCall::Close);
        self.connected = false;
    }

    fn is_connected(&mut self) -> bool {
        self.connected
    }

    fn check(&mut self) -> bool {
        !self.inbound.is_empty()
    }

    fn try_recv(&mut self) -> Option<SessionNotification> {
        self.inbound.pop_front()
    }

    fn set_device_name(&mut self, name: &str) -> Result<(), ()> {
        self.calls.push(SessionCall::DeviceName(name.to_string()));
        Ok(())
    }

    fn set_speed(&mut self, speed: u8) -> Result<(), ()> {
        self.calls.push(SessionCall::Speed(speed));
        Ok(())
    }

    fn set_direction(&mut self, direction: Direction) -> Result<(), ()> {
        self.calls.push(SessionCall::Direction(direction));
        Ok(())
    }

    fn set_function(&mut self, index: u8, pressed: bool) -> Result<(), ()> {
        self.calls.push(SessionCall::Function(index, pressed));
        Ok(())
    }

    fn add_locomotive(&mut self, address: &str) -> Result<Acquisition, ()> {
        self.calls.push(SessionCall::Add(address.to_string()));
        Ok(self.add_results.pop_front().unwrap_or(Acquisition::Acquired))
    }

    fn release_locomotive(&mut self) -> Result<(), ()> {
        self.calls.push(SessionCall::Release);
        Ok(())
    }

    fn steal_locomotive(&mut self, address: &str) -> Result<Acquisition, ()> {
        self.calls.push(SessionCall::Steal(address.to_string()));
        Ok(self.steal_results.pop_front().unwrap_or(Acquisition::Acquired))
    }

    fn fast_time_hours(&self) -> u8 {
        self.hours
    }

    fn fast_time_minutes(&self) -> u8 {
        self.minutes
    }

    fn fast_time_rate(&self) -> f32 {
        self.rate
    }

    fn require_heartbeat(&mut self) -> Result<(), Self::Error> {
        self.calls.push(SessionCall::RequireHeartbeat);
        Ok(())
    }
}

/// Mock companion-app link: queued writes in, mirrored values out.
#[derive(Debug, Default)]
pub struct MockAppLink {
    /// Connection status texts, in order.
    pub statuses: Vec<String>,
    /// Mirrored speeds.
    pub speeds: Vec<u8>,
    /// Mirrored directions.
    pub directions: Vec<Direction>,
    /// Mirrored toggle positions.
    pub toggles: Vec<TogglePosition>,
    /// Mirrored selected addresses.
    pub addresses: Vec<String>,
    /// Mirrored status descriptions.
    pub descriptions: Vec<String>,
    /// Mirrored battery percentages.
    pub battery: Vec<u8>,
    /// Last network identity.
    pub identity: Option<InterfaceInfo>,
    /// Mirrored scan lists.
    pub network_lists: Vec<String>,
    /// Published device information.
    pub device_info: Option<DeviceInformation>,
    writes: VecDeque<ConfigWrite>,
}

impl MockAppLink {
    /// Creates an idle link.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a write from the app.
    pub fn write(&mut self, write: ConfigWrite) {
        self.writes.push_back(write);
    }

    /// Last connection status text.
    pub fn status(&self) -> Option<&str> {
        self.statuses.last().map(String::as_str)
    }
}

impl ConfigLink for MockAppLink {
    fn try_recv(&mut self) -> Option<ConfigWrite> {
        self.writes.pop_front()
    }
}

impl StatusMirror for MockAppLink {
    fn connection_status(&mut self, status: &str) {
        self.statuses.push(status.to_string());
    }

    fn speed(&mut self, speed: u8) {
        self.speeds.push(speed);
    }

    fn direction(&mut self, direction: Direction) {
        self.directions.push(direction);
    }

    fn toggle_position(&mut self, position: TogglePosition) {
        self.toggles.push(position);
    }

    fn selected_address(&mut self, address: &str) {
        self.addresses.push(address.to_string());
    }

    fn long_description(&mut self, text: &str) {
        self.descriptions.push(text.to_string());
    }

    fn battery_percentage(&mut self, percent: u8) {
        self.battery.push(percent);
    }

    fn network_identity(&mut self, info: &InterfaceInfo) {
        self.identity = Some(*info);
    }

    fn network_list(&mut self, list: &str) {
        self.network_lists.push(list.to_string());
    }

    fn device_information(&mut self, info: &DeviceInformation) {
        self.device_info = Some(info.clone());
    }
}

/// In-memory settings store.
#[derive(Debug, Default)]
pub struct MockStore {
    /// Make writes fail.
    pub fail_writes: bool,
    values: BTreeMap<&'static str, String>,
}

impl MockStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with one value set.
    pub fn with(mut self, key: ConfigKey, value: &str) -> Self {
        self.values.insert(key.storage_key(), value.to_string());
        self
    }
}

impl ConfigStore for MockStore {
    type Error = ();

    fn read(&mut self, key: ConfigKey) -> Option<String> {
        self.values.get(key.storage_key()).cloned()
    }

    fn write(&mut self, key: ConfigKey, value: &str) -> Result<(), ()> {
        if self.fail_writes {
            return Err(());
        }
        self.values.insert(key.storage_key(), value.to_string());
        Ok(())
    }
}

// ============================================================================
// I2C Bus Mock
// ============================================================================

/// Register-file I2C bus.
///
/// Each registered device has 128 byte registers. A write's first byte
/// selects the register (bit 7, the auto-increment flag some devices use, is
/// ignored); following bytes are stored at consecutive registers. Reads
/// continue from the selected register.
#[derive(Debug, Default)]
pub struct MockI2c {
    /// Fail every transfer.
    pub fail: bool,
    /// Every write as (address, bytes).
    pub writes: Vec<(u8, Vec<u8>)>,
    devices: BTreeMap<u8, [u8; 128]>,
}

impl MockI2c {
    /// Creates a bus with no devices.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a device with the given register values (others are 0).
    pub fn with_device(mut self, address: u8, registers: &[(u8, u8)]) -> Self {
        let mut file = [0u8; 128];
        for &(reg, value) in registers {
            file[(reg & 0x7F) as usize] = value;
        }
        self.devices.insert(address, file);
        self
    }

    /// Current value of a device register.
    pub fn register(&self, address: u8, reg: u8) -> Option<u8> {
        self.devices
            .get(&address)
            .map(|file| file[(reg & 0x7F) as usize])
    }

    /// Set a device register.
    pub fn set_register(&mut self, address: u8, reg: u8, value: u8) {
        if let Some(file) = self.devices.get_mut(&address) {
            file[(reg & 0x7F) as usize] = value;
        }
    }
}

impl ErrorType for MockI2c {
    type Error = ErrorKind;
}

impl I2c for MockI2c {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), ErrorKind> {
        if self.fail {
            return Err(ErrorKind::Bus);
        }
        let file = self
            .devices
            .get_mut(&address)
            .ok_or(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address))?;

        let mut pointer = 0usize;
        for op in operations.iter_mut() {
            match op {
                Operation::Write(bytes) => {
                    self.writes.push((address, bytes.to_vec()));
                    if let Some((&reg, data)) = bytes.split_first() {
                        pointer = (reg & 0x7F) as usize;
                        for &b in data {
                            file[pointer & 0x7F] = b;
                            pointer += 1;
                        }
                    }
                }
                Operation::Read(buf) => {
                    for b in buf.iter_mut() {
                        *b = file[pointer & 0x7F];
                        pointer += 1;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Hardware Mock Tests
    // =========================================================================

    #[test]
    fn mock_toggle_positions() {
        let mut t = MockToggle::new();
        assert_eq!((t.left_level(), t.right_level()), (true, true));
        t.set(TogglePosition::Left);
        assert_eq!((t.left_level(), t.right_level()), (false, true));
        t.set(TogglePosition::Right);
        assert_eq!((t.left_level(), t.right_level()), (true, false));
    }

    #[test]
    fn mock_expander_write_then_read() {
        let mut ex = MockExpander::new();
        ex.digital_write(3, false).unwrap();
        assert!(!ex.digital_read(3).unwrap());
        assert_eq!(ex.writes, [(3, false)]);
        assert_eq!(ex.reads, 1);
    }

    #[test]
    fn mock_expander_failures() {
        let mut ex = MockExpander::new();
        ex.fail_begin = true;
        ex.fail_interrupt_read = true;
        assert!(ex.begin().is_err());
        assert!(ex.interrupt_source().is_err());
    }

    #[test]
    fn mock_status_led_tracks_color() {
        let mut led = MockStatusLed::new();
        assert_eq!(led.color(), Rgb::OFF);
        led.set_color(Rgb::new(1, 2, 3));
        assert_eq!(led.color(), Rgb::new(1, 2, 3));
    }

    #[test]
    fn mock_panel_last_light() {
        let mut panel = MockPanel::new();
        panel.set_function_light(9, true);
        panel.set_function_light(9, false);
        assert_eq!(panel.light(9), Some(false));
        assert_eq!(panel.light(1), None);
    }

    // =========================================================================
    // Network Mock Tests
    // =========================================================================

    #[test]
    fn mock_link_join() {
        let mut link = MockLink::new();
        link.begin("a", "b").unwrap();
        assert!(!link.is_connected());

        let mut link = MockLink::reachable();
        link.begin("a", "b").unwrap();
        assert!(link.is_connected());
        link.drop_link();
        assert!(!link.is_connected());
    }

    #[test]
    fn mock_session_scripted_acquisition() {
        let mut s = MockSession::new();
        s.queue_add(Acquisition::InUse);
        assert_eq!(s.add_locomotive("S3").unwrap(), Acquisition::InUse);
        assert_eq!(s.add_locomotive("S3").unwrap(), Acquisition::Acquired);
        assert_eq!(s.steal_locomotive("S3").unwrap(), Acquisition::Acquired);
        assert_eq!(s.steals(), 1);
    }

    #[test]
    fn mock_store_round_trip() {
        let mut store = MockStore::new().with(ConfigKey::ServerAddress, "10.0.0.2");
        assert_eq!(store.read(ConfigKey::ServerAddress).as_deref(), Some("10.0.0.2"));
        assert_eq!(store.read(ConfigKey::ServerPort), None);
        store.fail_writes = true;
        assert!(store.write(ConfigKey::ServerPort, "1").is_err());
    }

    // =========================================================================
    // I2C Mock Tests
    // =========================================================================

    #[test]
    fn mock_i2c_register_file() {
        let mut bus = MockI2c::new().with_device(0x20, &[(0x05, 0xAB)]);
        let mut buf = [0u8; 2];
        bus.write_read(0x20, &[0x05], &mut buf).unwrap();
        assert_eq!(buf, [0xAB, 0x00]);

        bus.write(0x20, &[0x10, 1, 2]).unwrap();
        assert_eq!(bus.register(0x20, 0x10), Some(1));
        assert_eq!(bus.register(0x20, 0x11), Some(2));
    }

    #[test]
    fn mock_i2c_unknown_address_nacks() {
        let mut bus = MockI2c::new();
        assert_eq!(
            bus.write(0x42, &[0]),
            Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address))
        );
    }
}
