//! Event routing between the controls, the session and the app.
//!
//! [`ThrottleController`] is the reconciliation core. It receives:
//!
//! - hardware events, as a [`HardwareObserver`]
//! - session notifications, as a [`SessionDelegate`]
//! - address selections from the companion app, via
//!   [`select_address`](ThrottleController::select_address)
//!
//! and sends the results to the [`ProtocolSession`], the app's
//! [`StatusMirror`] and the local [`IndicatorPanel`].
//!
//! # Rules
//!
//! - **Direction lock**: only Left/Right act on direction, and a direction is
//!   sent only when it differs from the session's last known one.
//! - **Speed forwarding**: every filtered speed is sent while a session is active.
//! - **Address arbitration**: app selections are staged. Once per loop,
//!   a staged address different from the active one is acquired with
//!   stop, release, add. An address held elsewhere gets a bounded number of
//!   steal attempts, one per loop, then the request is dropped.
//! - **Function feedback**: local button edges go to the session; remote
//!   function states drive the indicator lights and are never sent back.
//! - **Battery**: millivolts are scaled to a clamped percentage.
//!
//! # Example
//!
//! ```rust
//! use knobby_throttle::hal::{MockAppLink, MockPanel, MockSession};
//! use knobby_throttle::hardware::HardwareObserver;
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
//! router.arbitrate();
//! assert_eq!(router.active_address(), Some("S21"));
//!
//! router.speed_changed(40, TogglePosition::Right);
//! assert_eq!(router.session().speeds().last(), Some(&40));
//! ```

extern crate alloc;
use alloc::format;

use heapless::Vec as HVec;
use log::{debug, info, warn};

use crate::config::{short_string, FunctionLight, ShortString, ThrottleConfig, MAX_LIGHTS};
use crate::hardware::HardwareObserver;
use crate::input::TogglePosition;
use crate::traits::{
    Acquisition, Direction, IndicatorPanel, ProtocolSession, SessionDelegate, StatusMirror,
};

/// Fast clock hour and minute as a 12-hour `hhmm` readout value.
///
/// ```rust
/// use knobby_throttle::throttle::clock_value;
///
/// assert_eq!(clock_value(0, 5), 1205);
/// assert_eq!(clock_value(12, 30), 1230);
/// assert_eq!(clock_value(23, 59), 1159);
/// ```
pub fn clock_value(hours: u8, minutes: u8) -> u16 {
    let h = match hours % 12 {
        0 => 12,
        h => h,
    };
    h as u16 * 100 + minutes as u16
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Arbitration {
    Idle,
    Stealing { attempts: u8 },
}

/// What the server told us that nothing else consumes.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionInfo {
    /// Protocol version from the handshake
    pub version: Option<ShortString>,
    /// Layout track power
    pub track_power: Option<bool>,
    /// Speed-step mode of the controlled locomotive
    pub speed_steps: Option<u8>,
    /// Server web interface port
    pub web_port: Option<u16>,
    /// Fast clock ratio
    pub fast_time_rate: Option<f32>,
    /// Keep-alive period the server asked for, in seconds
    pub heartbeat_s: Option<u16>,
}

/// Snapshot of the controller for diagnostics.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControllerState {
    /// Session is active
    pub active: bool,
    /// Last speed from the dial
    pub speed: u8,
    /// Last known session direction
    pub direction: Direction,
    /// Last toggle position
    pub position: TogglePosition,
    /// Address under control
    pub active_address: Option<ShortString>,
    /// Address waiting for arbitration
    pub pending_address: Option<ShortString>,
    /// Steal attempts made for the pending address
    pub steal_attempts: u8,
    /// Motion reports since boot
    pub motion_events: u32,
    /// Last battery percentage
    pub battery_percent: Option<u8>,
}

/// Routes hardware, session and app events.
///
/// # Type Parameters
///
/// - `S`: the protocol session ([`ProtocolSession`])
/// - `M`: the app's read/notify side ([`StatusMirror`])
/// - `P`: the local lights and clock ([`IndicatorPanel`])
pub struct ThrottleController<S: ProtocolSession, M: StatusMirror, P: IndicatorPanel> {
    session: S,
    mirror: M,
    panel: P,
    config: ThrottleConfig,
    lights: HVec<FunctionLight, MAX_LIGHTS>,

    active: bool,
    speed: u8,
    direction: Direction,
    position: TogglePosition,
    active_address: Option<ShortString>,
    pending_address: Option<ShortString>,
    arbitration: Arbitration,

    colon: bool,
    info: SessionInfo,
    motion_events: u32,
    battery_percent: Option<u8>,
}

impl<S: ProtocolSession, M: StatusMirror, P: IndicatorPanel> ThrottleController<S, M, P> {
    /// Create a controller. `lights` maps function indices to indicator pins.
    pub fn new(session: S, mirror: M, panel: P, config: ThrottleConfig, lights: &[FunctionLight]) -> Self {
        let mut table = HVec::new();
        for light in lights.iter().take(MAX_LIGHTS) {
            let _ = table.push(*light);
        }
        Self {
            session,
            mirror,
            panel,
            config,
            lights: table,
            active: false,
            speed: 0,
            direction: Direction::Forward,
            position: TogglePosition::Unknown,
            active_address: None,
            pending_address: None,
            arbitration: Arbitration::Idle,
            colon: false,
            info: SessionInfo::default(),
            motion_events: 0,
            battery_percent: None,
        }
    }

    // ------------------------------------------------------------------------
    // Session lifecycle
    // ------------------------------------------------------------------------

    /// The session completed its handshake.
    ///
    /// Announces `device_name` and re-stages the last address (or the
    /// configured default) for arbitration.
    pub fn session_activated(&mut self, device_name: &str) {
        self.active = true;
        self.direction = Direction::Forward;
        self.arbitration = Arbitration::Idle;
        if let Err(e) = self.session.set_device_name(device_name) {
            warn!("announcing device name failed: {:?}", e);
        }

        let address = self
            .active_address
            .take()
            .or_else(|| self.pending_address.take())
            .unwrap_or_else(|| self.config.default_address.clone());
        info!("session active as {}, staging {}", device_name, address);
        self.mirror.selected_address(&address);
        self.pending_address = Some(address);
    }

    /// The session went away. The held address is kept for the next one.
    pub fn session_deactivated(&mut self) {
        self.active = false;
        self.arbitration = Arbitration::Idle;
        if let Some(address) = self.active_address.take() {
            if self.pending_address.is_none() {
                self.pending_address = Some(address);
            }
        }
    }

    /// Stage an address from the app. Applied by the next
    /// [`arbitrate`](Self::arbitrate); cancels any steal in progress.
    pub fn select_address(&mut self, address: &str) {
        info!("address {} selected", address);
        let address = short_string(address);
        self.mirror.selected_address(&address);
        self.pending_address = Some(address);
        self.arbitration = Arbitration::Idle;
    }

    /// One arbitration step. Returns `true` if the session was asked
    /// anything.
    pub fn arbitrate(&mut self) -> bool {
        if !self.active {
            return false;
        }
        let Some(pending) = self.pending_address.clone() else {
            return false;
        };

        if let Arbitration::Stealing { attempts } = self.arbitration {
            if attempts >= self.config.steal_attempts {
                warn!("{} still in use after {} steals, giving up", pending, attempts);
                self.mirror.long_description(&format!("{} in use", pending));
                self.pending_address = None;
                self.arbitration = Arbitration::Idle;
                return false;
            }
            self.arbitration = Arbitration::Stealing {
                attempts: attempts + 1,
            };
            let result = self.session.steal_locomotive(&pending);
            self.acquisition(pending, result);
            return true;
        }

        if self.active_address.as_ref() == Some(&pending) {
            self.pending_address = None;
            return false;
        }

        if let Err(e) = self.session.set_speed(0) {
            warn!("stopping before release failed: {:?}", e);
        }
        if let Some(old) = self.active_address.take() {
            info!("releasing {}", old);
            if let Err(e) = self.session.release_locomotive() {
                warn!("release of {} failed: {:?}", old, e);
            }
        }
        let result = self.session.add_locomotive(&pending);
        self.acquisition(pending, result);
        true
    }

    fn acquisition(&mut self, address: ShortString, result: Result<Acquisition, S::Error>) {
        match result {
            Ok(Acquisition::Acquired) => {
                info!("acquired {}", address);
                self.mirror.selected_address(&address);
                self.mirror.long_description(&format!("Controlling {}", address));
                self.active_address = Some(address);
                self.pending_address = None;
                self.arbitration = Arbitration::Idle;
                self.sync_locomotive();
            }
            Ok(Acquisition::InUse) => {
                info!("{} is in use", address);
                if self.arbitration == Arbitration::Idle {
                    self.arbitration = Arbitration::Stealing { attempts: 0 };
                }
            }
            Ok(Acquisition::Refused) => {
                warn!("{} refused", address);
                self.drop_pending(&address);
            }
            Err(e) => {
                warn!("acquiring {} failed: {:?}", address, e);
                self.drop_pending(&address);
            }
        }
    }

    fn drop_pending(&mut self, address: &str) {
        self.mirror
            .long_description(&format!("{} unavailable", address));
        self.pending_address = None;
        self.arbitration = Arbitration::Idle;
    }

    /// Bring a freshly acquired locomotive in line with the controls.
    fn sync_locomotive(&mut self) {
        if let Some(direction) = self.position.direction() {
            self.send_direction(direction);
        }
        if let Err(e) = self.session.set_speed(self.speed) {
            warn!("speed sync failed: {:?}", e);
        }
    }

    fn send_direction(&mut self, direction: Direction) {
        match self.session.set_direction(direction) {
            Ok(()) => {
                self.direction = direction;
                self.mirror.direction(direction);
            }
            Err(e) => warn!("direction {} not sent: {:?}", direction.as_str(), e),
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Whether a session is active.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Address under control.
    pub fn active_address(&self) -> Option<&str> {
        self.active_address.as_deref()
    }

    /// Address waiting for arbitration.
    pub fn pending_address(&self) -> Option<&str> {
        self.pending_address.as_deref()
    }

    /// Last known session direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Server-reported values nothing else consumes.
    pub fn session_info(&self) -> &SessionInfo {
        &self.info
    }

    /// Diagnostic snapshot.
    pub fn state(&self) -> ControllerState {
        ControllerState {
            active: self.active,
            speed: self.speed,
            direction: self.direction,
            position: self.position,
            active_address: self.active_address.clone(),
            pending_address: self.pending_address.clone(),
            steal_attempts: match self.arbitration {
                Arbitration::Idle => 0,
                Arbitration::Stealing { attempts } => attempts,
            },
            motion_events: self.motion_events,
            battery_percent: self.battery_percent,
        }
    }

    /// The protocol session.
    pub fn session(&self) -> &S {
        &self.session
    }

    /// The protocol session, mutably.
    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    /// The app mirror.
    pub fn mirror(&self) -> &M {
        &self.mirror
    }

    /// The app mirror, mutably.
    pub fn mirror_mut(&mut self) -> &mut M {
        &mut self.mirror
    }

    /// The indicator panel.
    pub fn panel(&self) -> &P {
        &self.panel
    }

    /// The indicator panel, mutably.
    pub fn panel_mut(&mut self) -> &mut P {
        &mut self.panel
    }
}

// ============================================================================
// Hardware events
// ============================================================================

impl<S: ProtocolSession, M: StatusMirror, P: IndicatorPanel> HardwareObserver
    for ThrottleController<S, M, P>
{
    fn speed_changed(&mut self, speed: u8, position: TogglePosition) {
        self.speed = speed;
        self.position = position;
        self.mirror.speed(speed);
        if self.active {
            if let Err(e) = self.session.set_speed(speed) {
                warn!("speed {} not sent: {:?}", speed, e);
            }
        }
    }

    fn toggle_position_changed(&mut self, position: TogglePosition) {
        self.position = position;
        self.mirror.toggle_position(position);
        let Some(direction) = position.direction() else {
            return;
        };
        if self.active && direction != self.direction {
            self.send_direction(direction);
        }
    }

    fn function_button_changed(&mut self, function: u8, pressed: bool) {
        debug!("F{} {}", function, if pressed { "pressed" } else { "released" });
        if self.active {
            if let Err(e) = self.session.set_function(function, pressed) {
                warn!("F{} not sent: {:?}", function, e);
            }
        }
    }

    fn battery_level_changed(&mut self, millivolts: u16) {
        let percent = self.config.battery_percent(millivolts);
        debug!("battery {} mV = {}%", millivolts, percent);
        self.battery_percent = Some(percent);
        self.mirror.battery_percentage(percent);
    }

    fn motion_detected(&mut self) {
        self.motion_events = self.motion_events.wrapping_add(1);
        debug!("motion #{}", self.motion_events);
    }
}

// ============================================================================
// Session notifications
// ============================================================================

impl<S: ProtocolSession, M: StatusMirror, P: IndicatorPanel> SessionDelegate
    for ThrottleController<S, M, P>
{
    fn received_version(&mut self, version: &str) {
        info!("server version {}", version);
        self.info.version = Some(short_string(version));
    }

    fn received_speed(&mut self, speed: u8) {
        debug!("server speed {}", speed);
    }

    fn received_direction(&mut self, direction: Direction) {
        if direction != self.direction {
            self.direction = direction;
            self.mirror.direction(direction);
        }
    }

    fn received_function_state(&mut self, index: u8, on: bool) {
        // echo of a local press or another controller: lights only
        if let Some(light) = self.lights.iter().find(|l| l.function == index) {
            self.panel.set_function_light(light.pin, on);
        }
    }

    fn received_track_power(&mut self, on: bool) {
        info!("track power {}", if on { "on" } else { "off" });
        self.info.track_power = Some(on);
    }

    fn received_speed_steps(&mut self, steps: u8) {
        self.info.speed_steps = Some(steps);
    }

    fn received_web_port(&mut self, port: u16) {
        self.info.web_port = Some(port);
    }

    fn fast_time_changed(&mut self) {
        let value = clock_value(self.session.fast_time_hours(), self.session.fast_time_minutes());
        self.colon = !self.colon;
        self.panel.show_clock(value, self.colon);
    }

    fn fast_time_rate_changed(&mut self, rate: f32) {
        self.info.fast_time_rate = Some(rate);
    }

    fn heartbeat_required(&mut self, period_s: u16) {
        info!("server heartbeat {} s", period_s);
        self.info.heartbeat_s = Some(period_s);
        if let Err(e) = self.session.require_heartbeat() {
            warn!("heartbeat request failed: {:?}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{MockAppLink, MockPanel, MockSession, SessionCall};
    use crate::traits::SessionNotification;
    use alloc::string::String;
    use alloc::vec;

    type Router = ThrottleController<MockSession, MockAppLink, MockPanel>;

    fn router() -> Router {
        ThrottleController::new(
            MockSession::new(),
            MockAppLink::new(),
            MockPanel::new(),
            ThrottleConfig::default(),
            &[FunctionLight { function: 0, pin: 9 }],
        )
    }

    fn active_on(address: &str) -> Router {
        let mut r = router();
        r.select_address(address);
        r.session_activated("cab");
        r.arbitrate();
        r.session_mut().calls.clear();
        r
    }

    // =========================================================================
    // Direction
    // =========================================================================

    #[test]
    fn direction_sent_once_per_change() {
        let mut r = active_on("S3");
        r.toggle_position_changed(TogglePosition::Left);
        r.toggle_position_changed(TogglePosition::Left);
        r.toggle_position_changed(TogglePosition::CenterOff);
        r.toggle_position_changed(TogglePosition::Left);
        r.toggle_position_changed(TogglePosition::Right);
        assert_eq!(r.session().directions(), [Direction::Reverse, Direction::Forward]);
        assert_eq!(r.mirror().directions, [Direction::Reverse, Direction::Forward]);
        assert_eq!(r.mirror().toggles.len(), 5);
    }

    #[test]
    fn direction_matching_session_is_not_resent() {
        let mut r = active_on("S3");
        r.dispatch(SessionNotification::Direction(Direction::Reverse));
        r.toggle_position_changed(TogglePosition::Left);
        assert!(r.session().directions().is_empty());
    }

    #[test]
    fn nothing_sent_without_session() {
        let mut r = router();
        r.toggle_position_changed(TogglePosition::Left);
        r.speed_changed(30, TogglePosition::Left);
        r.function_button_changed(2, true);
        assert!(r.session().calls.is_empty());
        assert_eq!(r.mirror().speeds, [30]);
    }

    // =========================================================================
    // Speed and functions
    // =========================================================================

    #[test]
    fn every_speed_forwarded() {
        let mut r = active_on("S3");
        for s in [10, 20, 20, 0] {
            r.speed_changed(s, TogglePosition::Right);
        }
        assert_eq!(r.session().speeds(), [10, 20, 20, 0]);
    }

    #[test]
    fn function_echo_lights_without_resend() {
        let mut r = active_on("S3");
        r.function_button_changed(0, true);
        r.dispatch(SessionNotification::Function { index: 0, on: true });
        r.dispatch(SessionNotification::Function { index: 5, on: true });
        assert_eq!(r.session().calls, [SessionCall::Function(0, true)]);
        assert_eq!(r.panel().lights, [(9, true)]);
    }

    // =========================================================================
    // Arbitration
    // =========================================================================

    #[test]
    fn activation_stages_default_address() {
        let mut r = router();
        r.session_activated("cab");
        assert_eq!(r.session().calls, [SessionCall::DeviceName("cab".into())]);
        assert_eq!(r.pending_address(), Some("S21"));
        assert!(r.arbitrate());
        assert_eq!(r.active_address(), Some("S21"));
        assert!(!r.arbitrate());
    }

    #[test]
    fn switch_stops_releases_then_adds() {
        let mut r = active_on("S20");
        r.select_address("S21");
        assert!(r.arbitrate());
        assert_eq!(
            r.session().calls[..3],
            [
                SessionCall::Speed(0),
                SessionCall::Release,
                SessionCall::Add("S21".into()),
            ]
        );
        assert_eq!(r.active_address(), Some("S21"));
    }

    #[test]
    fn acquisition_syncs_controls() {
        let mut r = router();
        r.session_activated("cab");
        r.toggle_position_changed(TogglePosition::Left);
        r.speed_changed(50, TogglePosition::Left);
        r.session_mut().calls.clear();

        r.arbitrate();
        assert_eq!(
            r.session().calls,
            [
                SessionCall::Speed(0),
                SessionCall::Add("S21".into()),
                SessionCall::Direction(Direction::Reverse),
                SessionCall::Speed(50),
            ]
        );
    }

    #[test]
    fn in_use_gets_three_steals_then_gives_up() {
        let mut r = active_on("S20");
        r.session_mut().queue_add(Acquisition::InUse);
        for _ in 0..3 {
            r.session_mut().queue_steal(Acquisition::InUse);
        }
        r.select_address("S21");
        for _ in 0..10 {
            r.arbitrate();
        }
        assert_eq!(r.session().steals(), 3);
        assert_eq!(r.pending_address(), None);
        assert_eq!(r.active_address(), None);
        assert_eq!(r.mirror().descriptions.last().map(String::as_str), Some("S21 in use"));
    }

    #[test]
    fn steal_success_takes_control() {
        let mut r = active_on("S20");
        r.session_mut().queue_add(Acquisition::InUse);
        r.select_address("S21");
        r.arbitrate();
        assert_eq!(r.state().steal_attempts, 0);
        r.arbitrate();
        assert_eq!(r.session().steals(), 1);
        assert_eq!(r.active_address(), Some("S21"));
    }

    #[test]
    fn new_selection_cancels_steals() {
        let mut r = active_on("S20");
        r.session_mut().queue_add(Acquisition::InUse);
        r.select_address("S21");
        r.arbitrate();
        r.select_address("S22");
        r.arbitrate();
        assert_eq!(r.session().steals(), 0);
        assert_eq!(r.active_address(), Some("S22"));
    }

    #[test]
    fn refusal_drops_request() {
        let mut r = active_on("S20");
        r.session_mut().queue_add(Acquisition::Refused);
        r.select_address("X");
        r.arbitrate();
        assert_eq!(r.pending_address(), None);
        assert!(!r.arbitrate());
    }

    #[test]
    fn deactivation_remembers_address() {
        let mut r = active_on("S7");
        r.session_deactivated();
        assert!(!r.is_active());
        assert!(!r.arbitrate());
        r.session_activated("cab");
        assert_eq!(r.pending_address(), Some("S7"));
    }

    #[test]
    fn selection_before_session_waits() {
        let mut r = router();
        r.select_address("L9");
        assert!(!r.arbitrate());
        r.session_activated("cab");
        r.arbitrate();
        assert_eq!(r.active_address(), Some("L9"));
    }

    // =========================================================================
    // Battery, clock, diagnostics
    // =========================================================================

    #[test]
    fn battery_scaled_and_clamped() {
        let mut r = router();
        r.battery_level_changed(3750);
        r.battery_level_changed(5000);
        r.battery_level_changed(2000);
        assert_eq!(r.mirror().battery, [50, 100, 0]);
    }

    #[test]
    fn fast_time_blinks_colon() {
        let mut r = router();
        r.session_mut().hours = 14;
        r.session_mut().minutes = 5;
        r.dispatch(SessionNotification::FastTimeChanged);
        r.dispatch(SessionNotification::FastTimeChanged);
        assert_eq!(r.panel().clock, vec![(205, true), (205, false)]);
    }

    #[test]
    fn server_values_recorded() {
        let mut r = router();
        r.dispatch(SessionNotification::Version("2.0".into()));
        r.dispatch(SessionNotification::TrackPower(true));
        r.dispatch(SessionNotification::WebPort(12080));
        r.dispatch(SessionNotification::FastTimeRateChanged(4.0));
        let info = r.session_info();
        assert_eq!(info.version.as_deref(), Some("2.0"));
        assert_eq!(info.track_power, Some(true));
        assert_eq!(info.web_port, Some(12080));
        assert_eq!(info.fast_time_rate, Some(4.0));
    }

    #[test]
    fn heartbeat_request_enables_keepalive() {
        let mut r = router();
        r.dispatch(SessionNotification::HeartbeatRequired(10));
        assert_eq!(r.session_info().heartbeat_s, Some(10));
        assert_eq!(r.session().count(|c| *c == SessionCall::RequireHeartbeat), 1);

        // a changed period is honoured again
        r.dispatch(SessionNotification::HeartbeatRequired(30));
        assert_eq!(r.session_info().heartbeat_s, Some(30));
        assert_eq!(r.session().count(|c| *c == SessionCall::RequireHeartbeat), 2);
    }

    #[test]
    fn motion_counted() {
        let mut r = router();
        r.motion_detected();
        r.motion_detected();
        assert_eq!(r.state().motion_events, 2);
    }
}
