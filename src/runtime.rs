//! Boot and one cooperative main-loop iteration.
//!
//! [`ThrottleRuntime`] owns every collaborator and runs, per [`tick`]:
//!
//! 1. pending writes from the companion app
//! 2. one [`ConnectionStateMachine`] step, with its consequences
//! 3. inbound session traffic, once a session is open
//! 4. the physical controls
//! 5. one address arbitration step
//!
//! Nothing in a tick blocks; the caller decides how often to tick.
//!
//! [`tick`]: ThrottleRuntime::tick

extern crate alloc;
use alloc::string::String;

use log::{error, info, warn};

use crate::config::{Config, ConfigKey, ConfigStore, ShortString};
use crate::connection::{ConnectionEvent, ConnectionNotice, ConnectionState, ConnectionStateMachine};
use crate::error::ThrottleError;
use crate::hardware::ControlPanel;
use crate::throttle::ThrottleController;
use crate::traits::{
    ConfigLink, IndicatorPanel, NetworkLink, ProtocolSession, SessionDelegate,
    SessionNotification, StatusIndicator, StatusMirror,
};
use crate::wireless::{apply_config_write, format_network_list, ConfigAction, DeviceInformation};

/// Collaborators handed to [`ThrottleRuntime::new`].
pub struct RuntimeParts<H, L, S, W, P, I, C> {
    /// Physical controls
    pub hardware: H,
    /// Wi-Fi station
    pub link: L,
    /// Protocol session client
    pub session: S,
    /// Companion-app link
    pub app: W,
    /// Function lights and clock readout
    pub panel: P,
    /// Connection status LED
    pub indicator: I,
    /// Persisted settings
    pub store: C,
}

/// The whole firmware, minus the loop that calls it.
pub struct ThrottleRuntime<H, L, S, W, P, I, C>
where
    H: ControlPanel,
    L: NetworkLink,
    S: ProtocolSession,
    W: ConfigLink + StatusMirror,
    P: IndicatorPanel,
    I: StatusIndicator,
    C: ConfigStore,
{
    hardware: H,
    link: L,
    store: C,
    connection: ConnectionStateMachine<I>,
    router: ThrottleController<S, W, P>,
    device_name: ShortString,
}

impl<H, L, S, W, P, I, C> ThrottleRuntime<H, L, S, W, P, I, C>
where
    H: ControlPanel,
    L: NetworkLink,
    S: ProtocolSession,
    W: ConfigLink + StatusMirror,
    P: IndicatorPanel,
    I: StatusIndicator,
    C: ConfigStore,
{
    /// Assemble the runtime.
    pub fn new(parts: RuntimeParts<H, L, S, W, P, I, C>, config: &Config) -> Self {
        Self {
            hardware: parts.hardware,
            link: parts.link,
            store: parts.store,
            connection: ConnectionStateMachine::new(parts.indicator, config.connection.clone()),
            router: ThrottleController::new(
                parts.session,
                parts.app,
                parts.panel,
                config.throttle.clone(),
                &config.hardware.lights,
            ),
            device_name: config.throttle.device_name.clone(),
        }
    }

    /// Bring up the hardware and publish the read-only values.
    ///
    /// # Errors
    ///
    /// [`ThrottleError::Hardware`] if the controls cannot be started. The
    /// firmware must not continue.
    pub fn boot(&mut self) -> Result<(), ThrottleError> {
        self.hardware.begin().map_err(|e| {
            error!("hardware bring-up failed: {}", e);
            ThrottleError::Hardware(e)
        })?;

        let info = DeviceInformation::load(&mut self.store);
        info!("{} {} serial {}", info.model, info.firmware_revision, info.serial);
        let mirror = self.router.mirror_mut();
        mirror.device_information(&info);
        mirror.connection_status(ConnectionState::WifiDisconnected.as_str());
        Ok(())
    }

    /// One main-loop iteration. Returns `true` if the controls did any work.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        self.apply_config_writes();

        let before = self.connection.state();
        match self.connection.poll(
            now_ms,
            &mut self.link,
            self.router.session_mut(),
            &mut self.store,
        ) {
            Some(ConnectionNotice::Entered(state)) => self.entered(before, state),
            Some(ConnectionNotice::ScanCompleted(networks)) => {
                self.router
                    .mirror_mut()
                    .network_list(&format_network_list(&networks));
            }
            None => {}
        }

        if self.connection.state() >= ConnectionState::SessionConnected {
            self.service_session();
        }

        let worked = self.hardware.check(now_ms, &mut self.router);
        self.router.arbitrate();
        worked
    }

    fn apply_config_writes(&mut self) {
        while let Some(write) = self.router.mirror_mut().try_recv() {
            match apply_config_write(&mut self.store, write) {
                Ok(ConfigAction::Stored) => {}
                Ok(ConfigAction::Reconnect) => self.connection.request_reconfigure(),
                Ok(ConfigAction::SelectAddress(address)) => self.router.select_address(&address),
                Err(e) => warn!("config write dropped: {}", e),
            }
        }
    }

    fn service_session(&mut self) {
        self.router.session_mut().check();
        while let Some(notification) = self.router.session_mut().try_recv() {
            if matches!(notification, SessionNotification::Version(_)) {
                let before = self.connection.state();
                if let Some(state) = self.connection.handle(ConnectionEvent::HandshakeReceived) {
                    self.entered(before, state);
                }
            }
            self.router.dispatch(notification);
        }
    }

    fn entered(&mut self, before: ConnectionState, state: ConnectionState) {
        self.router.mirror_mut().connection_status(state.as_str());

        if before == ConnectionState::SessionActive && state != ConnectionState::SessionActive {
            self.router.session_deactivated();
        }

        match state {
            ConnectionState::WifiConnected => {
                if let Some(identity) = self.link.interface_info() {
                    self.router.mirror_mut().network_identity(&identity);
                }
            }
            ConnectionState::SessionActive => {
                let name = self
                    .store
                    .read(ConfigKey::DeviceName)
                    .unwrap_or_else(|| String::from(self.device_name.as_str()));
                self.router.session_activated(&name);
                self.hardware.reset_stats();
            }
            _ => {}
        }
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// The connection state machine.
    pub fn connection(&self) -> &ConnectionStateMachine<I> {
        &self.connection
    }

    /// The event router.
    pub fn router(&self) -> &ThrottleController<S, W, P> {
        &self.router
    }

    /// The event router, mutably.
    pub fn router_mut(&mut self) -> &mut ThrottleController<S, W, P> {
        &mut self.router
    }

    /// The physical controls.
    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hardware
    }

    /// The Wi-Fi link.
    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// The settings store.
    pub fn store_mut(&mut self) -> &mut C {
        &mut self.store
    }
}
