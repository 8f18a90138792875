//! The physical control panel behind one non-blocking `check()` call.
//!
//! [`HardwareFacade`] owns the speed filter, the direction toggle, the button
//! reader, the accelerometer and the battery monitor. Each main-loop pass it:
//!
//! 1. services a pending button interrupt
//! 2. services a pending motion interrupt
//! 3. runs four independent interval timers: oversample, report, motion,
//!    battery
//! 4. blinks the [`PilotLight`], if one is fitted
//!
//! and reports what changed to a single [`HardwareObserver`].
//!
//! # Example
//!
//! ```rust
//! use knobby_throttle::config::HardwareConfig;
//! use knobby_throttle::hardware::{HardwareEvent, HardwareFacade, HardwareParts};
//! use knobby_throttle::hal::{MockAccelerometer, MockBattery, MockExpander, MockKnob, MockObserver, MockToggle};
//! use knobby_throttle::interrupt::InterruptFlag;
//! use knobby_throttle::TogglePosition;
//!
//! static BUTTONS: InterruptFlag = InterruptFlag::new();
//!
//! let parts = HardwareParts {
//!     knob: MockKnob::new().with_raw(4095),
//!     toggle: MockToggle::new().with_position(TogglePosition::Right),
//!     expander: MockExpander::new(),
//!     accelerometer: None::<MockAccelerometer>,
//!     battery: MockBattery::new(3900),
//!     button_irq: &BUTTONS,
//!     motion_irq: None,
//! };
//! let mut hw = HardwareFacade::new(parts, HardwareConfig::default());
//! hw.begin().unwrap();
//!
//! let mut observer = MockObserver::default();
//! for now in (0..=78).step_by(13) {
//!     hw.check(now, &mut observer);
//! }
//! assert!(observer.events.contains(&HardwareEvent::Speed(126, TogglePosition::Right)));
//! ```

use log::{debug, error, info, warn};

use crate::config::HardwareConfig;
use crate::error::HardwareError;
use crate::input::{AnalogInputFilter, ButtonEventSource, DigitalModeSwitch, TogglePosition};
use crate::interrupt::InterruptFlag;
use crate::timer::IntervalTimer;
use crate::traits::{
    Acceleration, Accelerometer, AnalogInput, BatteryMonitor, GpioExpander, ToggleInput,
};

/// Receiver of hardware-origin events.
///
/// All handlers default to no-ops.
pub trait HardwareObserver {
    /// A new filtered speed, with the toggle position it was taken at.
    fn speed_changed(&mut self, _speed: u8, _position: TogglePosition) {}

    /// The direction toggle moved.
    fn toggle_position_changed(&mut self, _position: TogglePosition) {}

    /// A function button was pressed or released.
    fn function_button_changed(&mut self, _function: u8, _pressed: bool) {}

    /// The battery voltage moved past the report threshold.
    fn battery_level_changed(&mut self, _millivolts: u16) {}

    /// The throttle was moved.
    fn motion_detected(&mut self) {}
}

/// What the main loop needs from the physical controls.
///
/// Implemented by [`HardwareFacade`]; the runtime only sees this trait.
pub trait ControlPanel {
    /// Bring the devices up. An error here halts the firmware.
    fn begin(&mut self) -> Result<(), HardwareError>;

    /// Run whatever is due and report changes. Returns `true` if any work
    /// was done.
    fn check<O: HardwareObserver>(&mut self, now_ms: u64, observer: &mut O) -> bool;

    /// Forget every last-known value so everything is republished.
    fn reset_stats(&mut self);
}

/// One observer callback, as data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HardwareEvent {
    /// [`HardwareObserver::speed_changed`]
    Speed(u8, TogglePosition),
    /// [`HardwareObserver::toggle_position_changed`]
    Toggle(TogglePosition),
    /// [`HardwareObserver::function_button_changed`]
    Button(u8, bool),
    /// [`HardwareObserver::battery_level_changed`]
    Battery(u16),
    /// [`HardwareObserver::motion_detected`]
    Motion,
}

/// Devices handed to [`HardwareFacade::new`].
pub struct HardwareParts<A, T, E, X, B> {
    /// Speed dial
    pub knob: A,
    /// Direction toggle lines
    pub toggle: T,
    /// I/O expander with the buttons and lights
    pub expander: E,
    /// Motion sensor, if fitted
    pub accelerometer: Option<X>,
    /// Battery sense
    pub battery: B,
    /// Raised by the expander's interrupt handler
    pub button_irq: &'static InterruptFlag,
    /// Raised by the accelerometer's interrupt handler, if wired
    pub motion_irq: Option<&'static InterruptFlag>,
}

/// A light toggled on a fixed period to show the main loop is alive.
///
/// Wired active-low on an expander pin. A blink counts as work done.
///
/// ```rust
/// use knobby_throttle::hal::MockExpander;
/// use knobby_throttle::hardware::PilotLight;
///
/// let mut expander = MockExpander::new();
/// let mut pilot = PilotLight::new(10, 1000);
/// pilot.begin(&mut expander).unwrap();
/// assert!(expander.level(10));
///
/// assert!(!pilot.check(999, &mut expander));
/// assert!(pilot.check(1000, &mut expander));
/// assert!(pilot.is_lit());
/// assert!(!expander.level(10));
/// ```
#[derive(Debug)]
pub struct PilotLight {
    pin: u8,
    timer: IntervalTimer,
    lit: bool,
}

impl PilotLight {
    /// Light on `pin`, toggled every `interval_ms`.
    pub fn new(pin: u8, interval_ms: u32) -> Self {
        Self {
            pin,
            timer: IntervalTimer::new(interval_ms as u64),
            lit: false,
        }
    }

    /// Configure the pin as an output and switch the light off.
    pub fn begin<E: GpioExpander>(&mut self, expander: &mut E) -> Result<(), E::Error> {
        expander.setup_output(self.pin)?;
        expander.digital_write(self.pin, true)?;
        self.lit = false;
        Ok(())
    }

    /// Toggle the light if the period has elapsed. Returns `true` if it did.
    pub fn check<E: GpioExpander>(&mut self, now_ms: u64, expander: &mut E) -> bool {
        if !self.timer.poll(now_ms) {
            return false;
        }
        self.lit = !self.lit;
        if let Err(e) = expander.digital_write(self.pin, !self.lit) {
            warn!("pilot light write failed: {:?}", e);
        }
        true
    }

    /// Whether the light is currently on.
    pub fn is_lit(&self) -> bool {
        self.lit
    }

    /// Expander pin.
    pub fn pin(&self) -> u8 {
        self.pin
    }
}

/// Polls every physical input from one cooperative `check()`.
pub struct HardwareFacade<A, T, E, X, B>
where
    A: AnalogInput,
    T: ToggleInput,
    E: GpioExpander,
    X: Accelerometer,
    B: BatteryMonitor,
{
    speed: AnalogInputFilter<A>,
    toggle: DigitalModeSwitch<T>,
    buttons: ButtonEventSource,
    expander: E,
    accelerometer: Option<X>,
    battery: B,
    pilot: Option<PilotLight>,
    button_irq: &'static InterruptFlag,
    motion_irq: Option<&'static InterruptFlag>,
    config: HardwareConfig,

    sample_timer: IntervalTimer,
    report_timer: IntervalTimer,
    motion_timer: IntervalTimer,
    battery_timer: IntervalTimer,

    motion_enabled: bool,
    last_motion: Option<Acceleration>,
    last_battery: Option<u16>,
}

impl<A, T, E, X, B> HardwareFacade<A, T, E, X, B>
where
    A: AnalogInput,
    T: ToggleInput,
    E: GpioExpander,
    X: Accelerometer,
    B: BatteryMonitor,
{
    /// Assemble the facade. Nothing touches the devices until [`begin`](Self::begin).
    pub fn new(parts: HardwareParts<A, T, E, X, B>, config: HardwareConfig) -> Self {
        Self {
            speed: AnalogInputFilter::new(parts.knob),
            toggle: DigitalModeSwitch::new(parts.toggle),
            buttons: ButtonEventSource::new(&config.buttons),
            expander: parts.expander,
            accelerometer: parts.accelerometer,
            battery: parts.battery,
            pilot: config
                .pilot_light_pin
                .map(|pin| PilotLight::new(pin, config.pilot_interval_ms)),
            button_irq: parts.button_irq,
            motion_irq: parts.motion_irq,
            sample_timer: IntervalTimer::new(config.sample_interval_ms as u64),
            report_timer: IntervalTimer::new(config.report_interval_ms as u64),
            motion_timer: IntervalTimer::new(config.motion_interval_ms as u64),
            battery_timer: IntervalTimer::new(config.battery_interval_ms as u64),
            config,
            motion_enabled: false,
            last_motion: None,
            last_battery: None,
        }
    }

    /// Bring up the expander and the accelerometer.
    ///
    /// # Errors
    ///
    /// [`HardwareError::ExpanderInit`] if the expander does not answer, or
    /// [`HardwareError::Bus`] if configuring it fails. An accelerometer that
    /// does not answer only disables motion reporting.
    pub fn begin(&mut self) -> Result<(), HardwareError> {
        if let Err(e) = self.expander.begin() {
            error!("I/O expander failed to start: {:?}", e);
            return Err(HardwareError::ExpanderInit);
        }
        self.configure_expander().map_err(|e| {
            error!("I/O expander setup failed: {:?}", e);
            HardwareError::Bus
        })?;

        self.motion_enabled = match self.accelerometer.as_mut() {
            Some(accel) => {
                let range = self.config.accel_range;
                match accel.begin().and_then(|_| accel.set_range(range)) {
                    Ok(()) => {
                        info!("accelerometer ready ({:?})", range);
                        true
                    }
                    Err(e) => {
                        warn!("accelerometer not found, motion disabled: {:?}", e);
                        false
                    }
                }
            }
            None => false,
        };

        info!(
            "hardware ready: {} buttons, {} lights",
            self.buttons.mappings().len(),
            self.config.lights.len()
        );
        Ok(())
    }

    fn configure_expander(&mut self) -> Result<(), E::Error> {
        self.expander.set_debounce_time(self.config.debounce_ms)?;
        for m in self.buttons.mappings() {
            self.expander.setup_button(m.pin)?;
        }
        for light in self.config.lights.iter() {
            self.expander.setup_output(light.pin)?;
            // active-low: high is off
            self.expander.digital_write(light.pin, true)?;
        }
        for pin in self.config.status_led_pins {
            self.expander.setup_pwm_output(pin)?;
        }
        if let Some(pilot) = self.pilot.as_mut() {
            pilot.begin(&mut self.expander)?;
        }
        Ok(())
    }

    /// Whether motion reporting is active.
    pub fn motion_enabled(&self) -> bool {
        self.motion_enabled
    }

    /// Run whatever is due. Returns `true` if any work was done. Never blocks.
    pub fn check<O: HardwareObserver>(&mut self, now_ms: u64, observer: &mut O) -> bool {
        let mut worked = false;

        if self.button_irq.take().is_some() {
            worked = true;
            for event in self.buttons.service(&mut self.expander) {
                observer.function_button_changed(event.function, event.pressed);
            }
        }

        if let Some(flag) = self.motion_irq {
            if flag.take().is_some() {
                worked = true;
                self.check_motion(observer);
            }
        }

        if self.sample_timer.poll(now_ms) {
            worked = true;
            self.speed.sample();
        }

        if self.report_timer.poll(now_ms) {
            worked = true;
            self.report(observer);
        }

        if self.motion_timer.poll(now_ms) {
            worked = true;
            self.check_motion(observer);
        }

        if self.battery_timer.poll(now_ms) {
            worked = true;
            self.check_battery(observer);
        }

        if let Some(pilot) = self.pilot.as_mut() {
            worked |= pilot.check(now_ms, &mut self.expander);
        }

        worked
    }

    fn report<O: HardwareObserver>(&mut self, observer: &mut O) {
        let position = self.toggle.read();
        if let Some(report) = self.speed.drain(position) {
            if report.position_changed {
                debug!("toggle {}", position.as_str());
                observer.toggle_position_changed(position);
            }
            if report.speed_changed {
                debug!("speed {}", report.speed);
                observer.speed_changed(report.speed, position);
            }
        }
    }

    fn check_motion<O: HardwareObserver>(&mut self, observer: &mut O) {
        if !self.motion_enabled {
            return;
        }
        let Some(accel) = self.accelerometer.as_mut() else {
            return;
        };
        match accel.read() {
            Ok(sample) => match self.last_motion {
                // first sample is only the baseline
                None => self.last_motion = Some(sample),
                Some(last) if last.max_axis_delta(&sample) > self.config.motion_threshold_mg => {
                    debug!("motion {:?}", sample);
                    self.last_motion = Some(sample);
                    observer.motion_detected();
                }
                Some(_) => {}
            },
            Err(e) => warn!("accelerometer read failed: {:?}", e),
        }
    }

    fn check_battery<O: HardwareObserver>(&mut self, observer: &mut O) {
        let mv = self.battery.read_millivolts();
        let report = self
            .last_battery
            .map_or(true, |last| last.abs_diff(mv) > self.config.battery_threshold_mv);
        if report {
            debug!("battery {} mV", mv);
            self.last_battery = Some(mv);
            observer.battery_level_changed(mv);
        }
    }

    /// Forget every last-known value so the next cycle republishes speed,
    /// toggle and battery. Motion takes a fresh baseline.
    pub fn reset_stats(&mut self) {
        self.speed.reset();
        self.toggle.reset();
        self.buttons.reset();
        self.last_motion = None;
        self.last_battery = None;
    }

    /// The I/O expander.
    pub fn expander_mut(&mut self) -> &mut E {
        &mut self.expander
    }

    /// The speed dial.
    pub fn knob_mut(&mut self) -> &mut A {
        self.speed.input_mut()
    }

    /// The toggle lines.
    pub fn toggle_mut(&mut self) -> &mut T {
        self.toggle.input_mut()
    }

    /// The battery monitor.
    pub fn battery_mut(&mut self) -> &mut B {
        &mut self.battery
    }

    /// The pilot light, if fitted.
    pub fn pilot(&self) -> Option<&PilotLight> {
        self.pilot.as_ref()
    }

    /// The accelerometer, if fitted.
    pub fn accelerometer_mut(&mut self) -> Option<&mut X> {
        self.accelerometer.as_mut()
    }
}

impl<A, T, E, X, B> ControlPanel for HardwareFacade<A, T, E, X, B>
where
    A: AnalogInput,
    T: ToggleInput,
    E: GpioExpander,
    X: Accelerometer,
    B: BatteryMonitor,
{
    fn begin(&mut self) -> Result<(), HardwareError> {
        HardwareFacade::begin(self)
    }

    fn check<O: HardwareObserver>(&mut self, now_ms: u64, observer: &mut O) -> bool {
        HardwareFacade::check(self, now_ms, observer)
    }

    fn reset_stats(&mut self) {
        HardwareFacade::reset_stats(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{MockAccelerometer, MockBattery, MockExpander, MockKnob, MockObserver, MockToggle};

    type Facade = HardwareFacade<MockKnob, MockToggle, MockExpander, MockAccelerometer, MockBattery>;

    fn facade(
        button_irq: &'static InterruptFlag,
        motion_irq: Option<&'static InterruptFlag>,
        accelerometer: Option<MockAccelerometer>,
    ) -> Facade {
        let parts = HardwareParts {
            knob: MockKnob::new(),
            toggle: MockToggle::new(),
            expander: MockExpander::new(),
            accelerometer,
            battery: MockBattery::new(3800),
            button_irq,
            motion_irq,
        };
        HardwareFacade::new(parts, HardwareConfig::default())
    }

    fn run(hw: &mut Facade, from: u64, to: u64, observer: &mut MockObserver) {
        let mut now = from;
        while now <= to {
            hw.check(now, observer);
            now += 1;
        }
    }

    // =========================================================================
    // Bring-up
    // =========================================================================

    #[test]
    fn begin_configures_expander() {
        static IRQ: InterruptFlag = InterruptFlag::new();
        let mut hw = facade(&IRQ, None, None);
        hw.begin().unwrap();

        let ex = hw.expander_mut();
        assert_eq!(ex.debounce_ms, Some(16));
        assert_eq!(ex.buttons.len(), 9);
        assert!(ex.buttons.contains(&8));
        assert_eq!(ex.outputs, [9]);
        assert!(ex.level(9)); // LED off
        assert_eq!(ex.pwm_outputs, [15, 14, 13]);
    }

    #[test]
    fn expander_failure_is_fatal() {
        static IRQ: InterruptFlag = InterruptFlag::new();
        let mut hw = facade(&IRQ, None, None);
        hw.expander_mut().fail_begin = true;
        assert_eq!(hw.begin(), Err(HardwareError::ExpanderInit));
    }

    #[test]
    fn accelerometer_failure_disables_motion() {
        static IRQ: InterruptFlag = InterruptFlag::new();
        let accel = MockAccelerometer::new().with_missing();
        let mut hw = facade(&IRQ, None, Some(accel));
        // not an error: the throttle runs on without motion
        assert_eq!(hw.begin(), Ok(()));
        assert!(!hw.motion_enabled());

        let mut obs = MockObserver::default();
        run(&mut hw, 0, 1000, &mut obs);
        assert_eq!(obs.count(|e| *e == HardwareEvent::Motion), 0);
    }

    // =========================================================================
    // Speed and toggle
    // =========================================================================

    #[test]
    fn report_cycle_publishes_toggle_then_speed() {
        static IRQ: InterruptFlag = InterruptFlag::new();
        let mut hw = facade(&IRQ, None, None);
        hw.begin().unwrap();
        hw.knob_mut().set_raw(2048);
        hw.toggle_mut().set(TogglePosition::Left);

        let mut obs = MockObserver::default();
        run(&mut hw, 0, 66, &mut obs);
        assert_eq!(
            obs.events,
            [
                HardwareEvent::Toggle(TogglePosition::Left),
                HardwareEvent::Speed(63, TogglePosition::Left),
            ]
        );

        // steady input stays quiet
        obs.events.clear();
        run(&mut hw, 67, 1000, &mut obs);
        assert!(obs
            .events
            .iter()
            .all(|e| matches!(e, HardwareEvent::Battery(_))));
    }

    #[test]
    fn same_toggle_twice_is_one_event() {
        static IRQ: InterruptFlag = InterruptFlag::new();
        let mut hw = facade(&IRQ, None, None);
        hw.begin().unwrap();
        hw.toggle_mut().set(TogglePosition::Right);

        let mut obs = MockObserver::default();
        run(&mut hw, 0, 200, &mut obs);
        assert_eq!(obs.count(|e| matches!(e, HardwareEvent::Toggle(_))), 1);
    }

    #[test]
    fn center_off_publishes_zero_once() {
        static IRQ: InterruptFlag = InterruptFlag::new();
        let mut hw = facade(&IRQ, None, None);
        hw.begin().unwrap();
        hw.knob_mut().set_raw(2600);
        hw.toggle_mut().set(TogglePosition::Right);

        let mut obs = MockObserver::default();
        run(&mut hw, 0, 66, &mut obs);
        assert!(obs.events.contains(&HardwareEvent::Speed(80, TogglePosition::Right)));

        obs.events.clear();
        hw.toggle_mut().set(TogglePosition::CenterOff);
        run(&mut hw, 67, 400, &mut obs);
        assert_eq!(
            obs.count(|e| *e == HardwareEvent::Speed(0, TogglePosition::CenterOff)),
            1
        );
        assert_eq!(obs.count(|e| matches!(e, HardwareEvent::Speed(..))), 1);
    }

    // =========================================================================
    // Buttons
    // =========================================================================

    #[test]
    fn button_interrupt_serviced_once() {
        static IRQ: InterruptFlag = InterruptFlag::new();
        let mut hw = facade(&IRQ, None, None);
        hw.begin().unwrap();

        hw.expander_mut().set_pin(8, false);
        hw.expander_mut().queue_interrupt(1 << 8);
        IRQ.raise(0);

        let mut obs = MockObserver::default();
        assert!(hw.check(1, &mut obs));
        assert_eq!(obs.events, [HardwareEvent::Button(9, true)]);
        assert!(!IRQ.is_pending());
    }

    #[test]
    fn failed_status_read_clears_flag() {
        static IRQ: InterruptFlag = InterruptFlag::new();
        let mut hw = facade(&IRQ, None, None);
        hw.begin().unwrap();
        hw.expander_mut().fail_interrupt_read = true;
        IRQ.raise(0);

        let mut obs = MockObserver::default();
        hw.check(1, &mut obs);
        assert!(obs.events.is_empty());
        assert!(!IRQ.is_pending());
    }

    // =========================================================================
    // Battery
    // =========================================================================

    #[test]
    fn battery_reports_past_threshold_only() {
        static IRQ: InterruptFlag = InterruptFlag::new();
        let mut hw = facade(&IRQ, None, None);
        hw.begin().unwrap();
        let mut obs = MockObserver::default();

        hw.check(2500, &mut obs);
        assert!(obs.events.contains(&HardwareEvent::Battery(3800)));

        for (i, mv) in [3810u16, 3795, 3849].iter().enumerate() {
            hw.battery_mut().millivolts = *mv;
            hw.check(2500 * (i as u64 + 2), &mut obs);
        }
        assert_eq!(obs.count(|e| matches!(e, HardwareEvent::Battery(_))), 1);

        hw.battery_mut().millivolts = 3851;
        hw.check(2500 * 5, &mut obs);
        assert!(obs.events.contains(&HardwareEvent::Battery(3851)));
    }

    #[test]
    fn battery_delta_equal_to_threshold_is_quiet() {
        static IRQ: InterruptFlag = InterruptFlag::new();
        let mut hw = facade(&IRQ, None, None);
        hw.begin().unwrap();
        let mut obs = MockObserver::default();

        hw.check(2500, &mut obs);
        hw.battery_mut().millivolts = 3850;
        hw.check(5000, &mut obs);
        hw.battery_mut().millivolts = 3750;
        hw.check(7500, &mut obs);
        assert_eq!(obs.events, [HardwareEvent::Battery(3800)]);
    }

    // =========================================================================
    // Motion
    // =========================================================================

    #[test]
    fn motion_needs_delta_above_threshold() {
        static IRQ: InterruptFlag = InterruptFlag::new();
        static MOTION: InterruptFlag = InterruptFlag::new();
        let accel = MockAccelerometer::new().with_sample(Acceleration::new(0, 0, 1000));
        let mut hw = facade(&IRQ, Some(&MOTION), Some(accel));
        hw.begin().unwrap();
        assert!(hw.motion_enabled());

        let mut obs = MockObserver::default();
        MOTION.raise(0);
        hw.check(1, &mut obs); // baseline only
        assert_eq!(obs.count(|e| *e == HardwareEvent::Motion), 0);

        if let Some(a) = hw.accelerometer_mut() {
            a.sample = Acceleration::new(50, -60, 1090);
        }
        MOTION.raise(0);
        hw.check(2, &mut obs);
        assert_eq!(obs.count(|e| *e == HardwareEvent::Motion), 0);

        if let Some(a) = hw.accelerometer_mut() {
            a.sample = Acceleration::new(0, 0, 1200);
        }
        hw.check(200, &mut obs); // picked up by the 5 Hz poll
        assert_eq!(obs.count(|e| *e == HardwareEvent::Motion), 1);
    }

    #[test]
    fn stationary_sensor_never_reports_motion() {
        static IRQ: InterruptFlag = InterruptFlag::new();
        let accel = MockAccelerometer::new().with_sample(Acceleration::new(0, 0, 1000));
        let mut hw = facade(&IRQ, None, Some(accel));
        hw.begin().unwrap();

        let mut obs = MockObserver::default();
        run(&mut hw, 0, 1000, &mut obs);
        hw.reset_stats();
        run(&mut hw, 1001, 2000, &mut obs);
        assert_eq!(obs.count(|e| *e == HardwareEvent::Motion), 0);
    }

    #[test]
    fn reset_stats_republishes() {
        static IRQ: InterruptFlag = InterruptFlag::new();
        let mut hw = facade(&IRQ, None, None);
        hw.begin().unwrap();
        hw.knob_mut().set_raw(2048);
        hw.toggle_mut().set(TogglePosition::Right);

        let mut obs = MockObserver::default();
        run(&mut hw, 0, 2500, &mut obs);
        obs.events.clear();

        hw.reset_stats();
        run(&mut hw, 2501, 5000, &mut obs);
        assert!(obs.events.contains(&HardwareEvent::Toggle(TogglePosition::Right)));
        assert!(obs.events.contains(&HardwareEvent::Speed(63, TogglePosition::Right)));
        assert!(obs.events.contains(&HardwareEvent::Battery(3800)));
    }

    // =========================================================================
    // Pilot light
    // =========================================================================

    #[test]
    fn pilot_light_blinks_each_second() {
        static IRQ: InterruptFlag = InterruptFlag::new();
        let parts = HardwareParts {
            knob: MockKnob::new(),
            toggle: MockToggle::new(),
            expander: MockExpander::new(),
            accelerometer: None::<MockAccelerometer>,
            battery: MockBattery::new(3800),
            button_irq: &IRQ,
            motion_irq: None,
        };
        let mut hw = HardwareFacade::new(parts, HardwareConfig::default().with_pilot_light(10));
        hw.begin().unwrap();
        assert!(hw.expander_mut().outputs.contains(&10));
        assert!(hw.expander_mut().level(10)); // off

        let mut obs = MockObserver::default();
        run(&mut hw, 0, 999, &mut obs);
        assert!(hw.expander_mut().level(10));
        assert!(hw.check(1000, &mut obs));
        assert!(!hw.expander_mut().level(10));
        assert_eq!(hw.pilot().map(PilotLight::is_lit), Some(true));

        run(&mut hw, 1001, 1999, &mut obs);
        assert!(!hw.expander_mut().level(10));
        hw.check(2000, &mut obs);
        assert!(hw.expander_mut().level(10));
    }

    #[test]
    fn no_pilot_light_by_default() {
        static IRQ: InterruptFlag = InterruptFlag::new();
        let mut hw = facade(&IRQ, None, None);
        hw.begin().unwrap();
        assert!(hw.pilot().is_none());
        assert!(!hw.expander_mut().outputs.contains(&10));
    }

    #[test]
    fn idle_check_does_nothing() {
        static IRQ: InterruptFlag = InterruptFlag::new();
        let mut hw = facade(&IRQ, None, None);
        hw.begin().unwrap();
        let mut obs = MockObserver::default();
        assert!(hw.check(13, &mut obs));
        assert!(!hw.check(14, &mut obs));
    }
}
