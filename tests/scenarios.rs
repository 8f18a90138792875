//! End-to-end control scenarios: physical inputs through the hardware
//! facade into the event router and out to the session.

use knobby_throttle::hal::{
    MockAccelerometer, MockAppLink, MockBattery, MockExpander, MockKnob, MockObserver, MockPanel,
    MockSession, MockToggle, SessionCall,
};
use knobby_throttle::{
    Acquisition, Direction, HardwareConfig, HardwareEvent, HardwareFacade, HardwareObserver,
    HardwareParts, InterruptFlag, SessionDelegate, SessionNotification, ThrottleConfig,
    ThrottleController, TogglePosition,
};

type Facade = HardwareFacade<MockKnob, MockToggle, MockExpander, MockAccelerometer, MockBattery>;
type Router = ThrottleController<MockSession, MockAppLink, MockPanel>;

fn facade(irq: &'static InterruptFlag, knob: MockKnob, position: TogglePosition) -> Facade {
    let mut hw = HardwareFacade::new(
        HardwareParts {
            knob,
            toggle: MockToggle::new().with_position(position),
            expander: MockExpander::new(),
            accelerometer: None,
            battery: MockBattery::new(3800),
            button_irq: irq,
            motion_irq: None,
        },
        HardwareConfig::default(),
    );
    hw.begin().unwrap();
    hw
}

fn active_router(address: &str) -> Router {
    let lights = HardwareConfig::default().lights;
    let mut router = ThrottleController::new(
        MockSession::new(),
        MockAppLink::new(),
        MockPanel::new(),
        ThrottleConfig::default().with_default_address(address),
        &lights,
    );
    router.session_activated("cab");
    router.arbitrate();
    assert_eq!(router.active_address(), Some(address));
    router
}

fn run<O: HardwareObserver>(hw: &mut Facade, from: u64, to: u64, observer: &mut O) {
    for now in from..=to {
        hw.check(now, observer);
    }
}

// ============================================================================
// Scenario A: oversampled speed, direction forwarded once
// ============================================================================

#[test]
fn half_dial_left_publishes_63_reverse_once() {
    static IRQ: InterruptFlag = InterruptFlag::new();
    let mut knob = MockKnob::new().with_raw(2048);
    knob.queue_raw(&[2048, 2048, 2048, 2048, 2048]);
    let mut hw = facade(&IRQ, knob, TogglePosition::Left);
    let mut router = active_router("S20");

    run(&mut hw, 0, 66, &mut router);
    assert_eq!(router.session().directions(), [Direction::Reverse]);
    assert_eq!(router.session().speeds().last(), Some(&63));
    assert_eq!(router.state().speed, 63);

    // later report cycles resend nothing
    let calls = router.session().calls.len();
    run(&mut hw, 67, 2000, &mut router);
    assert_eq!(router.session().directions(), [Direction::Reverse]);
    assert_eq!(router.session().calls.len(), calls);
}

// ============================================================================
// Scenario B: centering the toggle stops immediately
// ============================================================================

#[test]
fn center_off_forces_zero() {
    static IRQ: InterruptFlag = InterruptFlag::new();
    let mut hw = facade(&IRQ, MockKnob::new().with_raw(2600), TogglePosition::Right);
    let mut router = active_router("S20");

    run(&mut hw, 0, 66, &mut router);
    assert_eq!(router.session().speeds().last(), Some(&80));

    hw.toggle_mut().set(TogglePosition::CenterOff);
    run(&mut hw, 67, 132, &mut router);
    assert_eq!(router.session().speeds().last(), Some(&0));
    // centering has no direction
    assert!(router.session().directions().is_empty());

    let zeros = router.session().speeds().iter().filter(|s| **s == 0).count();
    run(&mut hw, 133, 1000, &mut router);
    assert_eq!(
        router.session().speeds().iter().filter(|s| **s == 0).count(),
        zeros
    );
}

// ============================================================================
// Scenario C: battery reports gated on the raw delta
// ============================================================================

#[test]
fn battery_small_drift_is_quiet() {
    static IRQ: InterruptFlag = InterruptFlag::new();
    let mut hw = facade(&IRQ, MockKnob::new(), TogglePosition::CenterOff);
    let mut obs = MockObserver::default();
    let battery = |obs: &MockObserver| obs.count(|e| matches!(e, HardwareEvent::Battery(_)));

    // baseline
    run(&mut hw, 0, 2500, &mut obs);
    assert_eq!(battery(&obs), 1);

    hw.battery_mut().millivolts = 3810;
    run(&mut hw, 2501, 5000, &mut obs);
    hw.battery_mut().millivolts = 3795;
    run(&mut hw, 5001, 7500, &mut obs);
    assert_eq!(battery(&obs), 1);

    hw.battery_mut().millivolts = 3900;
    run(&mut hw, 7501, 10_000, &mut obs);
    assert_eq!(battery(&obs), 2);
    assert_eq!(obs.events.last(), Some(&HardwareEvent::Battery(3900)));
}

#[test]
fn battery_percentage_clamped() {
    static IRQ: InterruptFlag = InterruptFlag::new();
    let mut hw = facade(&IRQ, MockKnob::new(), TogglePosition::CenterOff);
    let mut router = active_router("S20");

    run(&mut hw, 0, 2500, &mut router);
    assert_eq!(router.mirror().battery.last(), Some(&55));

    hw.battery_mut().millivolts = 3900;
    run(&mut hw, 2501, 5000, &mut router);
    assert_eq!(router.mirror().battery.last(), Some(&66));

    hw.battery_mut().millivolts = 4500;
    run(&mut hw, 5001, 7500, &mut router);
    assert_eq!(router.mirror().battery.last(), Some(&100));
}

// ============================================================================
// Scenario D: one press, one release
// ============================================================================

#[test]
fn button_press_then_release() {
    static IRQ: InterruptFlag = InterruptFlag::new();
    let mut hw = facade(&IRQ, MockKnob::new(), TogglePosition::CenterOff);
    let mut obs = MockObserver::default();
    let buttons = |obs: &MockObserver| -> Vec<HardwareEvent> {
        obs.events
            .iter()
            .filter(|e| matches!(e, HardwareEvent::Button(..)))
            .copied()
            .collect()
    };

    // BUTTON1 on pin 7 is F0; pin 12 is not mapped
    hw.expander_mut().set_pin(7, false);
    hw.expander_mut().queue_interrupt((1 << 7) | (1 << 12));
    IRQ.raise(0);
    hw.check(1, &mut obs);

    hw.expander_mut().set_pin(7, true);
    hw.expander_mut().queue_interrupt(1 << 7);
    IRQ.raise(0);
    hw.check(2, &mut obs);

    assert_eq!(
        buttons(&obs),
        [HardwareEvent::Button(0, true), HardwareEvent::Button(0, false)]
    );
}

#[test]
fn button_reaches_session_and_echo_only_lights() {
    static IRQ: InterruptFlag = InterruptFlag::new();
    let mut hw = facade(&IRQ, MockKnob::new(), TogglePosition::CenterOff);
    let mut router = active_router("S20");

    hw.expander_mut().set_pin(7, false);
    hw.expander_mut().queue_interrupt(1 << 7);
    IRQ.raise(0);
    hw.check(1, &mut router);
    assert!(router.session().calls.contains(&SessionCall::Function(0, true)));

    // the server echoes F0 on: the light follows, no second send
    router.dispatch(SessionNotification::Function { index: 0, on: true });
    assert_eq!(router.panel().light(9), Some(true));
    assert_eq!(
        router
            .session()
            .count(|c| matches!(c, SessionCall::Function(..))),
        1
    );
}

// ============================================================================
// Scenario E: address change with bounded steals
// ============================================================================

#[test]
fn address_change_steals_three_times_then_stops() {
    let mut router = active_router("S20");
    router.session_mut().calls.clear();
    router.session_mut().queue_add(Acquisition::InUse);
    for _ in 0..5 {
        router.session_mut().queue_steal(Acquisition::InUse);
    }

    router.select_address("S21");
    for _ in 0..10 {
        router.arbitrate();
    }

    let calls = &router.session().calls;
    assert_eq!(calls[0], SessionCall::Speed(0));
    assert_eq!(calls[1], SessionCall::Release);
    assert_eq!(calls[2], SessionCall::Add("S21".into()));
    assert_eq!(router.session().steals(), 3);
    assert_eq!(router.active_address(), None);
    assert_eq!(router.pending_address(), None);
    assert_eq!(
        router.mirror().descriptions.last().map(String::as_str),
        Some("S21 in use")
    );
}

#[test]
fn steal_succeeding_takes_the_address() {
    let mut router = active_router("S20");
    router.session_mut().queue_add(Acquisition::InUse);
    router.session_mut().queue_steal(Acquisition::InUse);
    router.session_mut().queue_steal(Acquisition::Acquired);

    router.select_address("S21");
    for _ in 0..10 {
        router.arbitrate();
    }
    assert_eq!(router.session().steals(), 2);
    assert_eq!(router.active_address(), Some("S21"));
}

#[test]
fn session_direction_updates_mirror_without_send() {
    let mut router = active_router("S20");
    router.received_direction(Direction::Reverse);
    assert_eq!(router.direction(), Direction::Reverse);
    assert!(router.session().directions().is_empty());

    // the toggle agreeing with the server sends nothing
    router.toggle_position_changed(TogglePosition::Left);
    assert!(router.session().directions().is_empty());
}
