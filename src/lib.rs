//! Driver library for the TWI (I2C) peripheral of the ATmega32U4 on a Teensy 2.0.
//!
//! The driver is a blocking bus master with five operations: [`Twi::init`], [`Twi::start`],
//! [`Twi::send`], [`Twi::read`] and [`Twi::stop`]. Higher-level code (for example a keyboard
//! matrix scanner talking to an I/O expander on the other half of a split keyboard) strings them
//! together into transactions.
//!
//! # Construction
//!
//! To set up the driver:
//!
//! - Obtain something implementing [`TwiInterface`]. On hardware, enable the `atmega32u4` Cargo
//!   feature and build an `interface::avr::Atmega32u4Interface` from the `TWI` and `PORTD`
//!   peripherals of `avr-device`.
//! - Construct a [`Twi`], which takes ownership of the interface.
//! - Call `init` with the board's [`BusConfig`] and an `embedded-hal` microsecond delay.
//!
//! ```ignore
//! let dp = avr_device::atmega32u4::Peripherals::take().unwrap();
//! let ti = teensy_twi::interface::avr::Atmega32u4Interface::new(dp.TWI, dp.PORTD);
//! let mut twi = teensy_twi::Twi::new(ti);
//! twi.init(&teensy_twi::BusConfig::TEENSY_2_0, &mut delay);
//! ```
//!
//! # Transactions
//!
//! Every phase reports the TWI status it ended with. A status other than the ones expected for
//! that phase comes back as [`TwiError::Status`], and the caller should `stop` to put the bus back
//! in the idle state:
//!
//! ```
//! # use teensy_twi::interface::noop::{NoopDelay, NoopInterface};
//! # fn main() -> Result<(), teensy_twi::TwiError> {
//! # let mut twi = teensy_twi::Twi::new(NoopInterface::default());
//! # twi.init(&teensy_twi::BusConfig::TEENSY_2_0, &mut NoopDelay);
//! const EXPANDER: u8 = 0x20;
//! const GPIOA: u8 = 0x12;
//!
//! let result = twi
//!     .start()
//!     .and_then(|_| twi.send(EXPANDER << 1))
//!     .and_then(|_| twi.send(GPIOA))
//!     .and_then(|_| twi.send(0xFE));
//! twi.stop();
//! result?;
//! # Ok(())
//! # }
//! ```
//!
//! # Bus faults
//!
//! Before it enables anything, `init` checks whether SCL and SDA are shorted together (see
//! [`probe`]). Enabling the TWI on a shorted bus wedges it until a power cycle, so a detected
//! short is latched for the life of the `Twi`: `start`, `send` and `read` return
//! [`TwiError::Fault`], and `stop` and `init` quietly do nothing.
//!
//! ```
//! # use teensy_twi::interface::noop::NoopInterface;
//! let mut twi = teensy_twi::Twi::with_fault(NoopInterface::default(), true);
//! assert_eq!(twi.start(), Err(teensy_twi::TwiError::Fault));
//! assert_eq!(twi.start().unwrap_err().code(), teensy_twi::FAULT_SENTINEL);
//! ```
//!
//! # Concurrency
//!
//! All operations busy-wait on the hardware without a timeout. The peripheral is not guarded by
//! any lock: do not call into the driver from an interrupt handler while the main program may be
//! using it.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

extern crate embedded_hal as hal;

pub mod bus;
pub mod config;
pub mod interface;
pub mod probe;
pub mod registers;
pub mod status;

pub use bus::Twi;
pub use config::BusConfig;
pub use interface::TwiInterface;
pub use probe::ProbeReport;
pub use status::{Status, TwiError, FAULT_SENTINEL};
