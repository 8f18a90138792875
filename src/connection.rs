//! Network and session lifecycle.
//!
//! [`ConnectionStateMachine`] walks the throttle from power-up to an active
//! protocol session and back down again when something drops:
//!
//! ```text
//! Unknown -> WifiDisconnected -> WifiConnected -> SessionConnected -> SessionActive
//!                 ^                                                        |
//!                 +------------------ any loss or timeout -----------------+
//! ```
//!
//! Progress is made only on success; every failure collapses straight to
//! [`ConnectionState::WifiDisconnected`]. Waits (join timeout, background
//! scans, session retries, handshake timeout) are sub-phases advanced by
//! [`poll`](ConnectionStateMachine::poll), so nothing ever blocks and a
//! [`request_reconfigure`](ConnectionStateMachine::request_reconfigure) is
//! honoured on the very next poll.
//!
//! # Example
//!
//! ```rust
//! use knobby_throttle::config::ConnectionConfig;
//! use knobby_throttle::connection::{ConnectionNotice, ConnectionState, ConnectionStateMachine};
//! use knobby_throttle::hal::{MockLink, MockSession, MockStatusLed, MockStore};
//!
//! let mut csm = ConnectionStateMachine::new(MockStatusLed::new(), ConnectionConfig::default());
//! let mut link = MockLink::reachable();
//! let mut session = MockSession::new();
//! let mut store = MockStore::new();
//!
//! let mut now = 0;
//! while csm.state() != ConnectionState::SessionConnected {
//!     csm.poll(now, &mut link, &mut session, &mut store);
//!     now += 10;
//! }
//! assert!(session.connected);
//! ```

extern crate alloc;
use alloc::vec::Vec;

use log::{debug, info, warn};

use crate::config::{ConfigStore, ConnectionConfig, NetworkSettings};
use crate::traits::{NetworkInfo, NetworkLink, ProtocolSession, Rgb, StatusIndicator};

// ============================================================================
// States and Events
// ============================================================================

/// Connection lifecycle state. Ordered by progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConnectionState {
    /// Power-up, nothing attempted yet.
    #[default]
    Unknown,
    /// No network.
    WifiDisconnected,
    /// Joined the network, no session.
    WifiConnected,
    /// Session transport open, waiting for the handshake.
    SessionConnected,
    /// Handshake received; commands flow.
    SessionActive,
}

impl ConnectionState {
    /// Status text shown in the companion app.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Unknown => "UNKNOWN",
            ConnectionState::WifiDisconnected => "DISCONNECTED",
            ConnectionState::WifiConnected => "WIFI CONNECTED",
            ConnectionState::SessionConnected => "SERVER CONNECTED",
            ConnectionState::SessionActive => "ACTIVE",
        }
    }

    /// Status LED colour.
    pub const fn color(&self) -> Rgb {
        match self {
            ConnectionState::Unknown => Rgb::OFF,
            ConnectionState::WifiDisconnected => Rgb::new(255, 0, 0),
            ConnectionState::WifiConnected => Rgb::new(0, 0, 64),
            ConnectionState::SessionConnected => Rgb::new(0, 0, 255),
            ConnectionState::SessionActive => Rgb::new(0, 255, 0),
        }
    }
}

/// Something that happened to the link or the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The station joined a network.
    LinkUp,
    /// The station lost its network.
    LinkLost,
    /// The session transport opened.
    SessionOpened,
    /// The session transport closed or failed.
    SessionLost,
    /// The server sent its version.
    HandshakeReceived,
}

/// What a [`poll`](ConnectionStateMachine::poll) produced.
#[derive(Clone, Debug, PartialEq)]
pub enum ConnectionNotice {
    /// A new state was entered.
    Entered(ConnectionState),
    /// A background scan finished.
    ScanCompleted(Vec<NetworkInfo>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    /// Start a join on the next poll.
    Idle,
    /// Join in progress.
    Joining { since: u64 },
    /// Join timed out; scan until the network shows up.
    Scanning { next_scan: u64 },
    /// Joined; open the session when due.
    Opening { next_attempt: u64 },
    /// Session open; waiting for the version.
    AwaitingHandshake { since: u64 },
    /// Active; watch for loss.
    Monitoring,
}

// ============================================================================
// State Machine
// ============================================================================

/// Drives the connection lifecycle and the status indicator.
pub struct ConnectionStateMachine<I: StatusIndicator> {
    state: ConnectionState,
    phase: Phase,
    indicator: I,
    config: ConnectionConfig,
    settings: Option<NetworkSettings>,
    reconfigure: bool,
    now_ms: u64,
}

impl<I: StatusIndicator> ConnectionStateMachine<I> {
    /// Start in [`ConnectionState::Unknown`].
    pub fn new(indicator: I, config: ConnectionConfig) -> Self {
        Self {
            state: ConnectionState::Unknown,
            phase: Phase::Idle,
            indicator,
            config,
            settings: None,
            reconfigure: false,
            now_ms: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// The status indicator.
    pub fn indicator(&self) -> &I {
        &self.indicator
    }

    /// The status indicator, mutably.
    pub fn indicator_mut(&mut self) -> &mut I {
        &mut self.indicator
    }

    /// Settings used by the current attempt, if one started.
    pub fn settings(&self) -> Option<&NetworkSettings> {
        self.settings.as_ref()
    }

    /// Drop everything and start over with freshly loaded settings on the
    /// next poll.
    pub fn request_reconfigure(&mut self) {
        self.reconfigure = true;
    }

    /// Whether a reconfigure is waiting for the next poll.
    pub fn reconfigure_pending(&self) -> bool {
        self.reconfigure
    }

    /// Apply an event. Returns the state entered, if any.
    ///
    /// Forward events only apply from the state directly before their
    /// target; loss events apply from anywhere. Re-entering the current
    /// state does nothing.
    pub fn handle(&mut self, event: ConnectionEvent) -> Option<ConnectionState> {
        use ConnectionState::*;

        let target = match (event, self.state) {
            (ConnectionEvent::LinkLost | ConnectionEvent::SessionLost, _) => {
                self.phase = Phase::Idle;
                WifiDisconnected
            }
            (ConnectionEvent::LinkUp, WifiDisconnected) => {
                self.phase = Phase::Opening {
                    next_attempt: self.now_ms,
                };
                WifiConnected
            }
            (ConnectionEvent::SessionOpened, WifiConnected) => {
                self.phase = Phase::AwaitingHandshake { since: self.now_ms };
                SessionConnected
            }
            (ConnectionEvent::HandshakeReceived, SessionConnected) => {
                self.phase = Phase::Monitoring;
                SessionActive
            }
            (event, state) => {
                debug!("{:?} ignored in {:?}", event, state);
                return None;
            }
        };
        self.enter(target)
    }

    fn enter(&mut self, target: ConnectionState) -> Option<ConnectionState> {
        if target == self.state {
            return None;
        }
        info!("connection: {} -> {}", self.state.as_str(), target.as_str());
        self.state = target;
        self.indicator.set_color(target.color());
        Some(target)
    }

    /// Advance the lifecycle by at most one step. Never blocks.
    pub fn poll<L, S, C>(
        &mut self,
        now_ms: u64,
        link: &mut L,
        session: &mut S,
        store: &mut C,
    ) -> Option<ConnectionNotice>
    where
        L: NetworkLink,
        S: ProtocolSession,
        C: ConfigStore,
    {
        self.now_ms = now_ms;

        if self.reconfigure {
            self.reconfigure = false;
            info!("reconfigure requested, reconnecting");
            session.close();
            link.disconnect();
            self.phase = Phase::Idle;
            return self.enter(ConnectionState::WifiDisconnected).map(ConnectionNotice::Entered);
        }

        if self.state == ConnectionState::Unknown {
            return self
                .handle(ConnectionEvent::LinkLost)
                .map(ConnectionNotice::Entered);
        }

        let entered = match self.phase {
            Phase::Idle => self.start_join(link, store),
            Phase::Joining { since } => self.check_join(since, link),
            Phase::Scanning { next_scan } => return self.scan(next_scan, link),
            Phase::Opening { next_attempt } => self.open_session(next_attempt, link, session, store),
            Phase::AwaitingHandshake { since } => self.await_handshake(since, link, session),
            Phase::Monitoring => self.monitor(link, session),
        };
        entered.map(ConnectionNotice::Entered)
    }

    fn start_join<L: NetworkLink, C: ConfigStore>(
        &mut self,
        link: &mut L,
        store: &mut C,
    ) -> Option<ConnectionState> {
        if link.is_connected() {
            // still joined after a session loss: retry the session later
            let entered = self.handle(ConnectionEvent::LinkUp);
            self.phase = Phase::Opening {
                next_attempt: self.now_ms + self.config.session_retry_ms as u64,
            };
            return entered;
        }

        let settings = NetworkSettings::load(store);
        info!("joining {}", settings.ssid);
        self.phase = match link.begin(&settings.ssid, &settings.password) {
            Ok(()) => Phase::Joining { since: self.now_ms },
            Err(e) => {
                warn!("join failed to start: {:?}", e);
                Phase::Scanning {
                    next_scan: self.now_ms,
                }
            }
        };
        self.settings = Some(settings);
        None
    }

    fn check_join<L: NetworkLink>(&mut self, since: u64, link: &mut L) -> Option<ConnectionState> {
        if link.is_connected() {
            return self.handle(ConnectionEvent::LinkUp);
        }
        if self.now_ms.saturating_sub(since) >= self.config.connect_timeout_ms as u64 {
            warn!("join timed out after {} ms", self.config.connect_timeout_ms);
            link.disconnect();
            self.phase = Phase::Scanning {
                next_scan: self.now_ms,
            };
        }
        None
    }

    fn scan<L: NetworkLink>(&mut self, next_scan: u64, link: &mut L) -> Option<ConnectionNotice> {
        if link.is_connected() {
            return self
                .handle(ConnectionEvent::LinkUp)
                .map(ConnectionNotice::Entered);
        }
        if self.now_ms < next_scan {
            return None;
        }

        let next_scan = self.now_ms + self.config.scan_interval_ms as u64;
        match link.scan() {
            Ok(networks) => {
                let found = self
                    .settings
                    .as_ref()
                    .is_some_and(|s| networks.iter().any(|n| n.ssid == s.ssid));
                info!("scan found {} networks", networks.len());
                self.phase = if found {
                    Phase::Idle
                } else {
                    Phase::Scanning { next_scan }
                };
                Some(ConnectionNotice::ScanCompleted(networks))
            }
            Err(e) => {
                warn!("scan failed: {:?}", e);
                self.phase = Phase::Scanning { next_scan };
                None
            }
        }
    }

    fn open_session<L, S, C>(
        &mut self,
        next_attempt: u64,
        link: &mut L,
        session: &mut S,
        store: &mut C,
    ) -> Option<ConnectionState>
    where
        L: NetworkLink,
        S: ProtocolSession,
        C: ConfigStore,
    {
        if !link.is_connected() {
            return self.handle(ConnectionEvent::LinkLost);
        }
        if self.now_ms < next_attempt {
            return None;
        }

        let settings = NetworkSettings::load(store);
        let opened = match settings.port() {
            Some(port) => {
                info!("opening session to {}:{}", settings.server, port);
                match session.open(&settings.server, port) {
                    Ok(()) => true,
                    Err(e) => {
                        warn!("session open failed: {:?}", e);
                        false
                    }
                }
            }
            None => {
                warn!("invalid server port {:?}", settings.port);
                false
            }
        };
        self.settings = Some(settings);

        if opened {
            self.handle(ConnectionEvent::SessionOpened)
        } else {
            self.phase = Phase::Opening {
                next_attempt: self.now_ms + self.config.session_retry_ms as u64,
            };
            None
        }
    }

    fn await_handshake<L: NetworkLink, S: ProtocolSession>(
        &mut self,
        since: u64,
        link: &mut L,
        session: &mut S,
    ) -> Option<ConnectionState> {
        if let Some(lost) = self.check_loss(link, session) {
            return lost;
        }
        if self.now_ms.saturating_sub(since) >= self.config.handshake_timeout_ms as u64 {
            warn!("no handshake after {} ms", self.config.handshake_timeout_ms);
            session.close();
            return self.handle(ConnectionEvent::SessionLost);
        }
        None
    }

    fn monitor<L: NetworkLink, S: ProtocolSession>(
        &mut self,
        link: &mut L,
        session: &mut S,
    ) -> Option<ConnectionState> {
        self.check_loss(link, session).flatten()
    }

    /// `Some` when the link or the session dropped; the session is closed.
    fn check_loss<L: NetworkLink, S: ProtocolSession>(
        &mut self,
        link: &mut L,
        session: &mut S,
    ) -> Option<Option<ConnectionState>> {
        let event = if !link.is_connected() {
            warn!("network lost");
            ConnectionEvent::LinkLost
        } else if !session.is_connected() {
            warn!("session lost");
            ConnectionEvent::SessionLost
        } else {
            return None;
        };
        session.close();
        Some(self.handle(event))
    }
}
