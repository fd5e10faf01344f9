//! TWI status codes and the driver's error type.

use core::fmt;

use crate::registers::TWS_MASK;

/// The status code the TWI hardware reports in TWSR after each bus phase, with the prescaler bits
/// masked off.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status(u8);

impl Status {
    /// A START condition has been transmitted.
    pub const START: Status = Status(0x08);
    /// A repeated START condition has been transmitted.
    pub const REP_START: Status = Status(0x10);
    /// SLA+W has been transmitted and ACK received.
    pub const MT_SLA_ACK: Status = Status(0x18);
    /// SLA+W has been transmitted and NACK received.
    pub const MT_SLA_NACK: Status = Status(0x20);
    /// Data byte has been transmitted and ACK received.
    pub const MT_DATA_ACK: Status = Status(0x28);
    /// Data byte has been transmitted and NACK received.
    pub const MT_DATA_NACK: Status = Status(0x30);
    /// Arbitration lost in SLA+W, SLA+R or data bytes.
    pub const ARB_LOST: Status = Status(0x38);
    /// SLA+R has been transmitted and ACK received.
    pub const MR_SLA_ACK: Status = Status(0x40);
    /// SLA+R has been transmitted and NACK received.
    pub const MR_SLA_NACK: Status = Status(0x48);
    /// Data byte has been received and ACK returned.
    pub const MR_DATA_ACK: Status = Status(0x50);
    /// Data byte has been received and NACK returned.
    pub const MR_DATA_NACK: Status = Status(0x58);
    /// No relevant state information available.
    pub const NO_INFO: Status = Status(0xF8);
    /// Bus error due to an illegal START or STOP condition.
    pub const BUS_ERROR: Status = Status(0x00);

    /// Extract the status from a raw TWSR value.
    pub const fn from_twsr(twsr: u8) -> Self {
        Status(twsr & TWS_MASK)
    }

    /// The raw status code, as listed in the datasheet.
    pub const fn code(self) -> u8 {
        self.0
    }
}

impl From<Status> for u8 {
    fn from(status: Status) -> u8 {
        status.0
    }
}

/// The bus phases the driver checks a status for, each with the set of codes that count as
/// success for that phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Phase {
    Start,
    Send,
    Read,
}

impl Phase {
    pub(crate) fn accepts(self, status: Status) -> bool {
        match self {
            Phase::Start => status == Status::START || status == Status::REP_START,
            Phase::Send => {
                status == Status::MT_SLA_ACK
                    || status == Status::MT_DATA_ACK
                    || status == Status::MR_SLA_ACK
            }
            Phase::Read => status == Status::MR_DATA_ACK,
        }
    }

    /// `Ok` if the phase accepts `status`, otherwise the status wrapped as an error.
    pub(crate) fn check(self, status: Status) -> Result<(), TwiError> {
        if self.accepts(status) {
            Ok(())
        } else {
            Err(TwiError::Status(status))
        }
    }
}

/// The code reported for a latched bus fault. No real TWI status can take this value, since the
/// three low bits of a status are always zero.
pub const FAULT_SENTINEL: u8 = 0xFF;

/// Errors returned by the bus operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TwiError {
    /// SCL and SDA were found shorted together during `init`. The driver refuses to touch the bus
    /// for the rest of its lifetime.
    Fault,
    /// The hardware finished the phase with a status other than the ones expected for it. The bus
    /// is in an undefined protocol state; the caller should issue a STOP.
    Status(Status),
}

impl TwiError {
    /// The numeric code for this error: `FAULT_SENTINEL` for a latched fault, otherwise the raw
    /// status code. Success corresponds to 0.
    ///
    /// A bus error (`Status::BUS_ERROR`) is also 0, so a caller working only with the numeric code
    /// cannot tell it from success. Match on the `Result` to tell them apart.
    pub fn code(&self) -> u8 {
        match *self {
            TwiError::Fault => FAULT_SENTINEL,
            TwiError::Status(s) => s.code(),
        }
    }
}

impl fmt::Display for TwiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            TwiError::Fault => write!(f, "TWI disabled: SCL and SDA are shorted"),
            TwiError::Status(s) => write!(f, "unexpected TWI status 0x{:02X}", s.code()),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TwiError {}
