//! LIS3DH 3-axis accelerometer over I2C.
//!
//! High-resolution mode, block data update, 50 Hz output rate. Samples are
//! returned in milli-g for the configured range.

use core::fmt;

use embedded_hal::i2c::I2c;
use log::info;

use crate::traits::{AccelRange, Acceleration, Accelerometer};

/// Default I2C address (SDO low).
pub const DEFAULT_ADDRESS: u8 = 0x18;

// =============================================================================
// Registers
// =============================================================================

const WHO_AM_I: u8 = 0x0F;
const WHO_AM_I_VALUE: u8 = 0x33;
const CTRL_REG1: u8 = 0x20;
const CTRL_REG3: u8 = 0x22;
const CTRL_REG4: u8 = 0x23;
const OUT_X_L: u8 = 0x28;
const INT1_CFG: u8 = 0x30;
const INT1_THS: u8 = 0x32;
const INT1_DURATION: u8 = 0x33;

/// Sub-address auto-increment for multi-byte reads.
const AUTO_INCREMENT: u8 = 0x80;

/// 50 Hz, normal power, X/Y/Z enabled.
const CTRL_REG1_50HZ_XYZ: u8 = 0x47;
/// Block data update.
const CTRL_REG4_BDU: u8 = 0x80;
/// High resolution (12-bit).
const CTRL_REG4_HR: u8 = 0x08;
/// IA1 interrupt on INT1.
const CTRL_REG3_I1_IA1: u8 = 0x40;
/// OR of X/Y/Z high events.
const INT1_CFG_XYZ_HIGH: u8 = 0x2A;

fn full_scale_bits(range: AccelRange) -> u8 {
    match range {
        AccelRange::G2 => 0b00,
        AccelRange::G4 => 0b01,
        AccelRange::G8 => 0b10,
        AccelRange::G16 => 0b11,
    }
}

/// Milli-g per digit of a 12-bit sample.
fn mg_per_digit(range: AccelRange) -> i16 {
    match range {
        AccelRange::G2 => 1,
        AccelRange::G4 => 2,
        AccelRange::G8 => 4,
        AccelRange::G16 => 12,
    }
}

/// Milli-g per LSB of the interrupt threshold register.
fn threshold_mg_per_lsb(range: AccelRange) -> u16 {
    match range {
        AccelRange::G2 => 16,
        AccelRange::G4 => 32,
        AccelRange::G8 => 62,
        AccelRange::G16 => 186,
    }
}

/// LIS3DH failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lis3dhError<E> {
    /// Bus transfer failed.
    Bus(E),
    /// WHO_AM_I did not match.
    WrongDevice(u8),
}

impl<E: fmt::Debug> fmt::Display for Lis3dhError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "LIS3DH bus error: {e:?}"),
            Self::WrongDevice(id) => write!(f, "unexpected WHO_AM_I {id:#04x}"),
        }
    }
}

/// LIS3DH driver.
pub struct Lis3dh<I2C> {
    i2c: I2C,
    address: u8,
    range: AccelRange,
}

impl<I2C: I2c> Lis3dh<I2C> {
    /// Driver at [`DEFAULT_ADDRESS`], ±2 g until [`set_range`](Accelerometer::set_range).
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, DEFAULT_ADDRESS)
    }

    /// Driver at a specific address.
    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            range: AccelRange::G2,
        }
    }

    /// Give the bus back.
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Raise INT1 when any axis exceeds `threshold_mg`.
    pub fn enable_motion_interrupt(&mut self, threshold_mg: u16) -> Result<(), Lis3dhError<I2C::Error>> {
        let ths = (threshold_mg / threshold_mg_per_lsb(self.range)).min(0x7F) as u8;
        self.write_register(INT1_THS, ths)?;
        self.write_register(INT1_DURATION, 0)?;
        self.write_register(INT1_CFG, INT1_CFG_XYZ_HIGH)?;
        self.write_register(CTRL_REG3, CTRL_REG3_I1_IA1)
    }

    fn read_register(&mut self, reg: u8) -> Result<u8, Lis3dhError<I2C::Error>> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.address, &[reg], &mut buf)
            .map_err(Lis3dhError::Bus)?;
        Ok(buf[0])
    }

    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), Lis3dhError<I2C::Error>> {
        self.i2c
            .write(self.address, &[reg, value])
            .map_err(Lis3dhError::Bus)
    }
}

impl<I2C: I2c> Accelerometer for Lis3dh<I2C> {
    type Error = Lis3dhError<I2C::Error>;

    fn begin(&mut self) -> Result<(), Self::Error> {
        let id = self.read_register(WHO_AM_I)?;
        if id != WHO_AM_I_VALUE {
            return Err(Lis3dhError::WrongDevice(id));
        }
        self.write_register(CTRL_REG1, CTRL_REG1_50HZ_XYZ)?;
        self.set_range(self.range)?;
        info!("LIS3DH at {:#04x} ready", self.address);
        Ok(())
    }

    fn set_range(&mut self, range: AccelRange) -> Result<(), Self::Error> {
        let value = CTRL_REG4_BDU | CTRL_REG4_HR | (full_scale_bits(range) << 4);
        self.write_register(CTRL_REG4, value)?;
        self.range = range;
        Ok(())
    }

    fn read(&mut self) -> Result<Acceleration, Self::Error> {
        let mut buf = [0u8; 6];
        self.i2c
            .write_read(self.address, &[OUT_X_L | AUTO_INCREMENT], &mut buf)
            .map_err(Lis3dhError::Bus)?;

        // left-justified 12-bit samples
        let scale = mg_per_digit(self.range);
        let axis = |lo: u8, hi: u8| (i16::from_le_bytes([lo, hi]) >> 4) * scale;
        Ok(Acceleration::new(
            axis(buf[0], buf[1]),
            axis(buf[2], buf[3]),
            axis(buf[4], buf[5]),
        ))
    }
}
