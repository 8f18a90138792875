//! Speed dial and battery sense on ADC1.
//!
//! # Wiring
//!
//! - Speed potentiometer wiper → knob pin, ends on 3.3V and GND
//! - Battery through a 1:1 divider → battery pin

use esp_idf_hal::adc::attenuation::DB_11;
use esp_idf_hal::adc::oneshot::config::AdcChannelConfig;
use esp_idf_hal::adc::oneshot::{AdcChannelDriver, AdcDriver};
use esp_idf_hal::adc::ADC1;
use esp_idf_hal::gpio::ADCPin;
use esp_idf_hal::peripheral::Peripheral;
use log::warn;

use crate::traits::{AnalogInput, BatteryMonitor, MAX_ADC};

fn channel_config() -> AdcChannelConfig {
    AdcChannelConfig {
        attenuation: DB_11,
        ..Default::default()
    }
}

/// Speed potentiometer.
///
/// ```ignore
/// let adc = AdcDriver::new(peripherals.adc1)?;
/// let knob = Esp32Knob::new(&adc, peripherals.pins.gpio3)?;
/// ```
pub struct Esp32Knob<'d, P: ADCPin<Adc = ADC1>> {
    channel: AdcChannelDriver<'d, P, &'d AdcDriver<'d, ADC1>>,
    last: u16,
}

impl<'d, P: ADCPin<Adc = ADC1>> Esp32Knob<'d, P> {
    /// Attach the dial to `pin`.
    ///
    /// # Errors
    ///
    /// Returns an error if the ADC channel cannot be configured.
    pub fn new(
        adc: &'d AdcDriver<'d, ADC1>,
        pin: impl Peripheral<P = P> + 'd,
    ) -> Result<Self, esp_idf_hal::sys::EspError> {
        let channel = AdcChannelDriver::new(adc, pin, &channel_config())?;
        Ok(Self { channel, last: 0 })
    }
}

impl<P: ADCPin<Adc = ADC1>> AnalogInput for Esp32Knob<'_, P> {
    fn read_raw(&mut self) -> u16 {
        match self.channel.read() {
            Ok(raw) => self.last = raw.min(MAX_ADC),
            // a failed conversion repeats the previous reading
            Err(e) => warn!("speed ADC read failed: {:?}", e),
        }
        self.last
    }
}

/// Battery voltage behind a resistive divider.
pub struct Esp32Battery<'d, P: ADCPin<Adc = ADC1>> {
    channel: AdcChannelDriver<'d, P, &'d AdcDriver<'d, ADC1>>,
    divider: u16,
}

impl<'d, P: ADCPin<Adc = ADC1>> Esp32Battery<'d, P> {
    /// Full-scale input voltage at 11 dB attenuation.
    const FULL_SCALE_MV: u32 = 3300;

    /// Attach the battery sense to `pin` (1:1 divider).
    ///
    /// # Errors
    ///
    /// Returns an error if the ADC channel cannot be configured.
    pub fn new(
        adc: &'d AdcDriver<'d, ADC1>,
        pin: impl Peripheral<P = P> + 'd,
    ) -> Result<Self, esp_idf_hal::sys::EspError> {
        let channel = AdcChannelDriver::new(adc, pin, &channel_config())?;
        Ok(Self { channel, divider: 2 })
    }

    /// Set the divider ratio (battery voltage / pin voltage).
    pub fn with_divider(mut self, divider: u16) -> Self {
        self.divider = divider.max(1);
        self
    }
}

impl<P: ADCPin<Adc = ADC1>> BatteryMonitor for Esp32Battery<'_, P> {
    fn read_millivolts(&mut self) -> u16 {
        let raw = match self.channel.read() {
            Ok(raw) => raw.min(MAX_ADC) as u32,
            Err(e) => {
                warn!("battery ADC read failed: {:?}", e);
                return 0;
            }
        };
        let pin_mv = raw * Self::FULL_SCALE_MV / MAX_ADC as u32;
        (pin_mv * self.divider as u32).min(u16::MAX as u32) as u16
    }
}
