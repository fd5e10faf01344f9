//! The registers of the ATmega32U4 that the TWI driver touches.

/// A register address in the ATmega32U4 data space. These are created by conversion from
/// `Register`. It is a newtype around `u8` that prevents arbitrary addresses from being forged
/// and handed to `TwiInterface` methods.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct RegisterAddress(pub(crate) u8);

impl From<RegisterAddress> for u8 {
    /// Convert a `RegisterAddress` into a `u8` corresponding to the data-space address.
    fn from(addr: RegisterAddress) -> u8 {
        addr.0
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Register {
    /// TWI bit rate register. Selects the division factor of the SCL clock generator.
    Twbr,

    /// TWI status register. Bits 7..3 hold the status of the last bus phase; bits 1..0 hold the
    /// prescaler selection.
    Twsr,

    /// TWI data register. Holds the next byte to transmit, or the last byte received.
    Twdr,

    /// TWI control register. Triggers bus phases and exposes the completion flag.
    Twcr,

    /// Port D input pins. Reflects the electrical level on each pin regardless of direction.
    Pind,

    /// Port D data direction register. A set bit makes the pin an output.
    Ddrd,

    /// Port D data register. For output pins, the driven level; for input pins, the pull-up
    /// enable.
    Portd,
}

impl From<Register> for RegisterAddress {
    /// Convert a `Register` into a `RegisterAddress`.
    fn from(reg: Register) -> RegisterAddress {
        use self::Register::*;
        match reg {
            Pind => RegisterAddress(0x29),
            Ddrd => RegisterAddress(0x2A),
            Portd => RegisterAddress(0x2B),
            Twbr => RegisterAddress(0xB8),
            Twsr => RegisterAddress(0xB9),
            Twdr => RegisterAddress(0xBB),
            Twcr => RegisterAddress(0xBC),
        }
    }
}

// TWCR bits
pub const TWINT: u8 = 1 << 7;
pub const TWEA: u8 = 1 << 6;
pub const TWSTA: u8 = 1 << 5;
pub const TWSTO: u8 = 1 << 4;
pub const TWEN: u8 = 1 << 2;

// TWSR bits
pub const TWPS1: u8 = 1 << 1;
pub const TWPS0: u8 = 1 << 0;
pub const TWPS_MASK: u8 = TWPS1 | TWPS0;
pub const TWS_MASK: u8 = 0xF8;

/// SCL is PD0 on the ATmega32U4.
pub const SCL: u8 = 1 << 0;
/// SDA is PD1 on the ATmega32U4.
pub const SDA: u8 = 1 << 1;
