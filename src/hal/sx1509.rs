//! SX1509 16-channel I/O expander over I2C.
//!
//! Carries the function buttons (pulled-up inputs with debounce and
//! change interrupts), the indicator lights and the status LED (LED driver
//! PWM). Portable over any `embedded_hal::i2c::I2c`.
//!
//! 16-bit registers hold bank B (pins 8-15) at the lower address and bank A
//! (pins 0-7) at the next, so a word read or write at the bank B address
//! maps bit `n` to pin `n`.

use core::fmt;

use embedded_hal::i2c::I2c;
use log::{debug, info};

use crate::traits::GpioExpander;

/// Default I2C address (both ADDR pins low).
pub const DEFAULT_ADDRESS: u8 = 0x3E;

// =============================================================================
// Registers
// =============================================================================

const REG_INPUT_DISABLE_B: u8 = 0x00;
const REG_PULL_UP_B: u8 = 0x06;
const REG_DIR_B: u8 = 0x0E;
const REG_DATA_B: u8 = 0x10;
const REG_INTERRUPT_MASK_B: u8 = 0x12;
const REG_INTERRUPT_MASK_A: u8 = 0x13;
const REG_SENSE_LOW_A: u8 = 0x17;
const REG_INTERRUPT_SOURCE_B: u8 = 0x18;
const REG_CLOCK: u8 = 0x1E;
const REG_MISC: u8 = 0x1F;
const REG_LED_DRIVER_ENABLE_B: u8 = 0x20;
const REG_DEBOUNCE_CONFIG: u8 = 0x22;
const REG_DEBOUNCE_ENABLE_B: u8 = 0x23;
const REG_RESET: u8 = 0x7D;

/// Intensity (I_ON) register per pin.
const REG_I_ON: [u8; 16] = [
    0x2A, 0x2D, 0x30, 0x33, 0x36, 0x3B, 0x40, 0x45, 0x4A, 0x4D, 0x50, 0x53, 0x56, 0x5B, 0x60, 0x65,
];

/// Power-on value of the word at `REG_INTERRUPT_MASK_A` (mask A, sense high B).
const CHIP_ID: u16 = 0xFF00;

/// Internal 2 MHz oscillator.
const CLOCK_INTERNAL_2MHZ: u8 = 0x40;
/// LED driver clock = oscillator / 1.
const MISC_LED_CLOCK_DIV1: u8 = 0x10;

// =============================================================================
// Errors
// =============================================================================

/// SX1509 failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sx1509Error<E> {
    /// Bus transfer failed.
    Bus(E),
    /// Something answered, but not an SX1509 (ID word shown).
    NotFound(u16),
    /// Pin outside 0..16.
    InvalidPin(u8),
}

impl<E: fmt::Debug> fmt::Display for Sx1509Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "SX1509 bus error: {e:?}"),
            Self::NotFound(v) => write!(f, "SX1509 not found (read ID {v:#06x})"),
            Self::InvalidPin(p) => write!(f, "SX1509 has no pin {p}"),
        }
    }
}

// =============================================================================
// Driver
// =============================================================================

/// SX1509 driver.
pub struct Sx1509<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> Sx1509<I2C> {
    /// Driver at [`DEFAULT_ADDRESS`].
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, DEFAULT_ADDRESS)
    }

    /// Driver at a specific address.
    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Give the bus back.
    pub fn release(self) -> I2C {
        self.i2c
    }

    fn read_byte(&mut self, reg: u8) -> Result<u8, Sx1509Error<I2C::Error>> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.address, &[reg], &mut buf)
            .map_err(Sx1509Error::Bus)?;
        Ok(buf[0])
    }

    fn write_byte(&mut self, reg: u8, value: u8) -> Result<(), Sx1509Error<I2C::Error>> {
        self.i2c
            .write(self.address, &[reg, value])
            .map_err(Sx1509Error::Bus)
    }

    fn read_word(&mut self, reg: u8) -> Result<u16, Sx1509Error<I2C::Error>> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &[reg], &mut buf)
            .map_err(Sx1509Error::Bus)?;
        Ok(u16::from_be_bytes(buf))
    }

    fn write_word(&mut self, reg: u8, value: u16) -> Result<(), Sx1509Error<I2C::Error>> {
        let [hi, lo] = value.to_be_bytes();
        self.i2c
            .write(self.address, &[reg, hi, lo])
            .map_err(Sx1509Error::Bus)
    }

    /// Set or clear one pin's bit in a 16-bit register pair.
    fn update_bit(&mut self, reg: u8, pin: u8, set: bool) -> Result<(), Sx1509Error<I2C::Error>> {
        let word = self.read_word(reg)?;
        let word = if set {
            word | (1 << pin)
        } else {
            word & !(1 << pin)
        };
        self.write_word(reg, word)
    }

    fn check_pin(pin: u8) -> Result<(), Sx1509Error<I2C::Error>> {
        if pin < 16 {
            Ok(())
        } else {
            Err(Sx1509Error::InvalidPin(pin))
        }
    }
}

/// Debounce config value for a time in ms: 1 ms -> 1, 2 ms -> 2 ... 64 ms -> 7.
fn debounce_config(ms: u8) -> u8 {
    if ms == 0 {
        0
    } else {
        (8 - ms.leading_zeros() as u8).min(7)
    }
}

impl<I2C: I2c> GpioExpander for Sx1509<I2C> {
    type Error = Sx1509Error<I2C::Error>;

    fn begin(&mut self) -> Result<(), Self::Error> {
        self.write_byte(REG_RESET, 0x12)?;
        self.write_byte(REG_RESET, 0x34)?;

        let id = self.read_word(REG_INTERRUPT_MASK_A)?;
        if id != CHIP_ID {
            return Err(Sx1509Error::NotFound(id));
        }

        self.write_byte(REG_CLOCK, CLOCK_INTERNAL_2MHZ)?;
        self.write_byte(REG_MISC, MISC_LED_CLOCK_DIV1)?;
        info!("SX1509 at {:#04x} ready", self.address);
        Ok(())
    }

    fn set_debounce_time(&mut self, ms: u8) -> Result<(), Self::Error> {
        self.write_byte(REG_DEBOUNCE_CONFIG, debounce_config(ms))
    }

    fn setup_button(&mut self, pin: u8) -> Result<(), Self::Error> {
        Self::check_pin(pin)?;
        self.update_bit(REG_DIR_B, pin, true)?;
        self.update_bit(REG_PULL_UP_B, pin, true)?;
        self.update_bit(REG_DEBOUNCE_ENABLE_B, pin, true)?;
        // mask bit clear = interrupt enabled
        self.update_bit(REG_INTERRUPT_MASK_B, pin, false)?;

        // two sense bits per pin, four pins per register, bank A last
        let sense_reg = REG_SENSE_LOW_A - pin / 4;
        let shift = (pin % 4) * 2;
        let sense = self.read_byte(sense_reg)?;
        self.write_byte(sense_reg, sense | (0b11 << shift))?;
        debug!("SX1509 pin {} is a button", pin);
        Ok(())
    }

    fn setup_output(&mut self, pin: u8) -> Result<(), Self::Error> {
        Self::check_pin(pin)?;
        self.update_bit(REG_DIR_B, pin, false)
    }

    fn setup_pwm_output(&mut self, pin: u8) -> Result<(), Self::Error> {
        Self::check_pin(pin)?;
        self.update_bit(REG_INPUT_DISABLE_B, pin, true)?;
        self.update_bit(REG_PULL_UP_B, pin, false)?;
        self.update_bit(REG_DIR_B, pin, false)?;
        self.update_bit(REG_LED_DRIVER_ENABLE_B, pin, true)?;
        // the LED driver only runs while the data bit is low
        self.update_bit(REG_DATA_B, pin, false)?;
        self.write_byte(REG_I_ON[pin as usize], 0)
    }

    fn interrupt_source(&mut self) -> Result<u16, Self::Error> {
        let source = self.read_word(REG_INTERRUPT_SOURCE_B)?;
        self.write_word(REG_INTERRUPT_SOURCE_B, 0xFFFF)?;
        Ok(source)
    }

    fn digital_read(&mut self, pin: u8) -> Result<bool, Self::Error> {
        Self::check_pin(pin)?;
        Ok(self.read_word(REG_DATA_B)? & (1 << pin) != 0)
    }

    fn digital_write(&mut self, pin: u8, high: bool) -> Result<(), Self::Error> {
        Self::check_pin(pin)?;
        self.update_bit(REG_DATA_B, pin, high)
    }

    fn analog_write(&mut self, pin: u8, value: u8) -> Result<(), Self::Error> {
        Self::check_pin(pin)?;
        self.write_byte(REG_I_ON[pin as usize], value)
    }
}
