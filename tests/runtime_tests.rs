//! The runtime driving the real expander driver over a shared register bus.
//!
//! The facade, the status LED and the light panel each hold their own
//! `Sx1509` handle on one `MockI2c`, the way the board shares one chip.

use core::cell::RefCell;

use knobby_throttle::hal::sx1509::DEFAULT_ADDRESS;
use knobby_throttle::hal::{
    ExpanderPanel, MockAccelerometer, MockAppLink, MockBattery, MockI2c, MockKnob, MockLink,
    MockSession, MockStore, MockToggle, RgbStatusLed, SessionCall, SharedI2c, Sx1509,
};
use knobby_throttle::{
    Config, ConnectionState, HardwareFacade, HardwareParts, InterruptFlag, RuntimeParts,
    SessionNotification, ThrottleRuntime, TogglePosition,
};

type Chip<'a> = Sx1509<SharedI2c<'a, MockI2c>>;
type Facade<'a> = HardwareFacade<MockKnob, MockToggle, Chip<'a>, MockAccelerometer, MockBattery>;
type Runtime<'a> = ThrottleRuntime<
    Facade<'a>,
    MockLink,
    MockSession,
    MockAppLink,
    ExpanderPanel<Chip<'a>>,
    RgbStatusLed<Chip<'a>>,
    MockStore,
>;

// I_ON registers of the status LED pins 15, 14, 13
const RED: u8 = 0x65;
const GREEN: u8 = 0x60;
const BLUE: u8 = 0x5B;

fn bus() -> RefCell<MockI2c> {
    // ID word 0xFF00 at 0x13; every input reads high (released)
    RefCell::new(MockI2c::new().with_device(
        DEFAULT_ADDRESS,
        &[(0x13, 0xFF), (0x10, 0xFF), (0x11, 0xFF)],
    ))
}

fn runtime<'a>(bus: &'a RefCell<MockI2c>, irq: &'static InterruptFlag) -> Runtime<'a> {
    let config = Config::default();
    let hardware = HardwareFacade::new(
        HardwareParts {
            knob: MockKnob::new().with_raw(1024),
            toggle: MockToggle::new().with_position(TogglePosition::Right),
            expander: Sx1509::new(SharedI2c::new(bus)),
            accelerometer: None,
            battery: MockBattery::new(3900),
            button_irq: irq,
            motion_irq: None,
        },
        config.hardware.clone(),
    );
    let parts = RuntimeParts {
        hardware,
        link: MockLink::reachable(),
        session: MockSession::new(),
        app: MockAppLink::new(),
        panel: ExpanderPanel::new(Sx1509::new(SharedI2c::new(bus))),
        indicator: RgbStatusLed::new(
            Sx1509::new(SharedI2c::new(bus)),
            config.hardware.status_led_pins,
            config.hardware.status_led_common_anode,
        ),
        store: MockStore::new(),
    };
    ThrottleRuntime::new(parts, &config)
}

fn run(rt: &mut Runtime<'_>, from: u64, to: u64) {
    let mut now = from;
    while now <= to {
        rt.tick(now);
        now += 5;
    }
}

fn activate(rt: &mut Runtime<'_>) {
    run(rt, 0, 50);
    rt.router_mut()
        .session_mut()
        .push(SessionNotification::Version("2.0".into()));
    run(rt, 55, 60);
    assert_eq!(rt.state(), ConnectionState::SessionActive);
}

fn led(bus: &RefCell<MockI2c>) -> (u8, u8, u8) {
    let bus = bus.borrow();
    let reg = |r| bus.register(DEFAULT_ADDRESS, r).unwrap_or(0);
    (reg(RED), reg(GREEN), reg(BLUE))
}

#[test]
fn boot_configures_the_chip() {
    static IRQ: InterruptFlag = InterruptFlag::new();
    let bus = bus();
    let mut rt = runtime(&bus, &IRQ);
    rt.boot().unwrap();

    let bus = bus.borrow();
    // debounce 16 ms
    assert_eq!(bus.register(DEFAULT_ADDRESS, 0x22), Some(5));
    // pin 9 (bank B bit 1) is an output, pin 7 (bank A bit 7) an input
    assert_eq!(bus.register(DEFAULT_ADDRESS, 0x0E).map(|v| v & 0x02), Some(0));
    assert_eq!(bus.register(DEFAULT_ADDRESS, 0x0F).map(|v| v & 0x80), Some(0x80));
    // LED driver enabled on 13..=15
    assert_eq!(bus.register(DEFAULT_ADDRESS, 0x20).map(|v| v & 0xE0), Some(0xE0));
}

#[test]
fn status_led_follows_the_connection() {
    static IRQ: InterruptFlag = InterruptFlag::new();
    let bus = bus();
    let mut rt = runtime(&bus, &IRQ);
    rt.boot().unwrap();

    rt.tick(0);
    assert_eq!(rt.state(), ConnectionState::WifiDisconnected);
    assert_eq!(led(&bus), (255, 0, 0));

    run(&mut rt, 5, 15);
    assert_eq!(rt.state(), ConnectionState::SessionConnected);
    assert_eq!(led(&bus), (0, 0, 255));

    rt.router_mut()
        .session_mut()
        .push(SessionNotification::Version("2.0".into()));
    rt.tick(20);
    assert_eq!(led(&bus), (0, 255, 0));

    rt.link_mut().drop_link();
    rt.tick(25);
    assert_eq!(rt.state(), ConnectionState::WifiDisconnected);
    assert_eq!(led(&bus), (255, 0, 0));
}

#[test]
fn button_interrupt_reaches_the_session() {
    static IRQ: InterruptFlag = InterruptFlag::new();
    let bus = bus();
    let mut rt = runtime(&bus, &IRQ);
    rt.boot().unwrap();
    activate(&mut rt);

    // BUTTON1 (pin 7, F0) goes low and latches its interrupt bit
    {
        let mut bus = bus.borrow_mut();
        bus.set_register(DEFAULT_ADDRESS, 0x11, 0x7F);
        bus.set_register(DEFAULT_ADDRESS, 0x18, 0x00);
        bus.set_register(DEFAULT_ADDRESS, 0x19, 0x80);
    }
    IRQ.raise(0);
    rt.tick(65);
    assert!(rt
        .router()
        .session()
        .calls
        .contains(&SessionCall::Function(0, true)));

    // the server's echo lights F0 (pin 9, active low)
    rt.router_mut()
        .session_mut()
        .push(SessionNotification::Function { index: 0, on: true });
    rt.tick(70);
    let data_b = bus.borrow().register(DEFAULT_ADDRESS, 0x10).unwrap_or(0xFF);
    assert_eq!(data_b & 0x02, 0);
}

#[test]
fn speed_dial_drives_the_session() {
    static IRQ: InterruptFlag = InterruptFlag::new();
    let bus = bus();
    let mut rt = runtime(&bus, &IRQ);
    rt.boot().unwrap();
    activate(&mut rt);
    run(&mut rt, 65, 400);

    // 1024 * 126 / 4095
    assert_eq!(rt.router().session().speeds().last(), Some(&31));

    run(&mut rt, 405, 2600);
    assert_eq!(rt.router().state().battery_percent, Some(66));
    assert_eq!(rt.router().mirror().battery.last(), Some(&66));
}

#[test]
fn server_heartbeat_is_honoured() {
    static IRQ: InterruptFlag = InterruptFlag::new();
    let bus = bus();
    let mut rt = runtime(&bus, &IRQ);
    rt.boot().unwrap();
    activate(&mut rt);
    assert_eq!(rt.router().session().count(|c| *c == SessionCall::RequireHeartbeat), 0);

    rt.router_mut()
        .session_mut()
        .push(SessionNotification::HeartbeatRequired(10));
    rt.tick(65);
    assert_eq!(rt.router().session().count(|c| *c == SessionCall::RequireHeartbeat), 1);
    assert_eq!(rt.router().session_info().heartbeat_s, Some(10));
}
