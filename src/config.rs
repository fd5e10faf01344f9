//! Bus clock configuration.
//!
//! The SCL frequency generated by the TWI is
//!
//! ```text
//! SCL = F_CPU / (16 + 2 * TWBR * prescaler)
//! ```
//!
//! The driver always selects a prescaler of 1, so `TWBR = (F_CPU / SCL - 16) / 2`.

/// The clocks the bit rate is derived from. Both values are fixed per board, so a `BusConfig` is
/// normally a `const`.
///
/// The datasheet requires `TWBR >= 10` in master mode and an SCL frequency of at most 400 kHz.
/// Neither is checked by [`Twi::init`](crate::Twi::init); [`BusConfig::within_limits`] is
/// available for a compile-time or startup assertion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusConfig {
    /// Core clock frequency in Hz.
    pub cpu_hz: u32,
    /// Target SCL frequency in Hz.
    pub bus_hz: u32,
}

/// Smallest bit rate register value allowed in master mode.
pub const MIN_BIT_RATE: u8 = 10;

/// Fastest SCL frequency the TWI supports.
pub const MAX_BUS_HZ: u32 = 400_000;

impl BusConfig {
    /// Teensy 2.0: 16 MHz crystal, bus run at 400 kHz.
    pub const TEENSY_2_0: BusConfig = BusConfig::new(16_000_000, 400_000);

    pub const fn new(cpu_hz: u32, bus_hz: u32) -> Self {
        Self { cpu_hz, bus_hz }
    }

    /// The TWBR value for this configuration with a prescaler of 1.
    ///
    /// Saturates at the register bounds instead of wrapping if the configuration is out of range.
    pub fn bit_rate(&self) -> u8 {
        let ratio = self
            .cpu_hz
            .checked_div(self.bus_hz)
            .unwrap_or(u32::max_value());
        let twbr = ratio.saturating_sub(16) / 2;
        if twbr > u8::max_value() as u32 {
            u8::max_value()
        } else {
            twbr as u8
        }
    }

    /// The SCL frequency actually produced by `bit_rate()`. TWBR is rounded down, so this is
    /// slightly above `bus_hz` when the division is inexact.
    pub fn scl_hz(&self) -> u32 {
        self.cpu_hz / (16 + 2 * self.bit_rate() as u32)
    }

    /// Whether this configuration respects the datasheet limits on TWBR and SCL frequency.
    pub fn within_limits(&self) -> bool {
        self.bus_hz <= MAX_BUS_HZ && self.bit_rate() >= MIN_BIT_RATE
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self::TEENSY_2_0
    }
}
