//! This module provides the hardware access the driver is built on. It is a shim between the
//! bus controller and the ATmega32U4's memory-mapped TWI and port D registers.

use crate::registers::Register;

/// Register-level access to the TWI peripheral and the port its lines share. The bus controller
/// and the fault probe only ever touch hardware through this trait.
///
/// Register access on the AVR cannot fail, so none of these methods return errors.
pub trait TwiInterface {
    /// Read the current value of `reg`.
    fn read_register(&mut self, reg: Register) -> u8;

    /// Write `value` into `reg`.
    fn write_register(&mut self, reg: Register, value: u8);

    /// Block until the bits in `mask` of `reg` are all set (`set == true`) or all clear
    /// (`set == false`).
    ///
    /// The default implementation spins on `read_register` with no timeout: if the hardware never
    /// reaches the expected state, this never returns.
    fn wait_for(&mut self, reg: Register, mask: u8, set: bool) {
        loop {
            let bits = self.read_register(reg) & mask;
            if (set && bits == mask) || (!set && bits == 0) {
                return;
            }
        }
    }
}

// This is here (and has to be pub) for doctests only. It's useless otherwise.
#[doc(hidden)]
pub mod noop {
    use super::TwiInterface;
    use crate::registers::{Register, SCL, SDA, TWEA, TWINT, TWSTA};
    use crate::status::Status;

    /// Completes every phase immediately with the status a well-behaved slave would produce.
    #[derive(Default)]
    pub struct NoopInterface {
        last_control: u8,
    }

    impl TwiInterface for NoopInterface {
        fn read_register(&mut self, reg: Register) -> u8 {
            match reg {
                Register::Twcr => TWINT,
                Register::Twsr if self.last_control & TWSTA != 0 => Status::START.code(),
                Register::Twsr if self.last_control & TWEA != 0 => Status::MR_DATA_ACK.code(),
                Register::Twsr => Status::MT_DATA_ACK.code(),
                Register::Pind => SCL | SDA,
                _ => 0,
            }
        }
        fn write_register(&mut self, reg: Register, value: u8) {
            if reg == Register::Twcr {
                self.last_control = value;
            }
        }
    }

    /// A delay that returns immediately.
    pub struct NoopDelay;

    impl hal::blocking::delay::DelayUs<u8> for NoopDelay {
        fn delay_us(&mut self, _us: u8) {}
    }
}

#[cfg(feature = "atmega32u4")]
pub mod avr {
    //! The ATmega32U4 implementation, driving the real TWI and port D peripherals.

    use super::TwiInterface;
    use crate::registers::Register;
    use avr_device::atmega32u4::{PORTD, TWI};

    /// A `TwiInterface` over the ATmega32U4's TWI peripheral and port D (SCL is PD0, SDA is PD1).
    ///
    /// Taking ownership of both peripherals guarantees nothing else in the program reconfigures
    /// them behind the driver's back.
    pub struct Atmega32u4Interface {
        twi: TWI,
        portd: PORTD,
    }

    impl Atmega32u4Interface {
        pub fn new(twi: TWI, portd: PORTD) -> Self {
            Self { twi, portd }
        }

        /// Give the peripherals back.
        pub fn release(self) -> (TWI, PORTD) {
            (self.twi, self.portd)
        }
    }

    impl TwiInterface for Atmega32u4Interface {
        fn read_register(&mut self, reg: Register) -> u8 {
            match reg {
                Register::Twbr => self.twi.twbr.read().bits(),
                Register::Twsr => self.twi.twsr.read().bits(),
                Register::Twdr => self.twi.twdr.read().bits(),
                Register::Twcr => self.twi.twcr.read().bits(),
                Register::Pind => self.portd.pind.read().bits(),
                Register::Ddrd => self.portd.ddrd.read().bits(),
                Register::Portd => self.portd.portd.read().bits(),
            }
        }

        // Some of these `bits` writers are safe in the PAC and some are not.
        #[allow(unused_unsafe)]
        fn write_register(&mut self, reg: Register, value: u8) {
            match reg {
                Register::Twbr => self.twi.twbr.write(|w| unsafe { w.bits(value) }),
                Register::Twsr => self.twi.twsr.write(|w| unsafe { w.bits(value) }),
                Register::Twdr => self.twi.twdr.write(|w| unsafe { w.bits(value) }),
                Register::Twcr => self.twi.twcr.write(|w| unsafe { w.bits(value) }),
                // Writing PIND toggles PORTD on this core, which is never what a caller of
                // `write_register` means.
                Register::Pind => {}
                Register::Ddrd => self.portd.ddrd.write(|w| unsafe { w.bits(value) }),
                Register::Portd => self.portd.portd.write(|w| unsafe { w.bits(value) }),
            }
        }
    }
}
