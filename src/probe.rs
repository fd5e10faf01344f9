//! Detection of SCL and SDA shorted together.
//!
//! Both lines have a pull-up, so with every pin on port D an input they idle high. Driving one
//! line low must not pull the other one down with it. If it does in both directions, the lines
//! are stuck together, as happens with a TRRS jack that has an integrated switch and nothing
//! plugged into it. Enabling the TWI in that state wedges the peripheral until a power cycle, so
//! the probe runs before the peripheral is touched.

use hal::blocking::delay::DelayUs;

use crate::interface::TwiInterface;
use crate::registers::{Register, SCL, SDA};

/// How long a line is held low before the other one is sampled. Long enough for the RC-limited
/// pull-up transition, negligible next to a bus clock period.
pub const SETTLE_US: u8 = 1;

/// The outcome of a probe, one flag per direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProbeReport {
    /// SDA read low while only SCL was driven low.
    pub scl_pulls_sda: bool,
    /// SCL read low while only SDA was driven low.
    pub sda_pulls_scl: bool,
}

impl ProbeReport {
    /// The lines count as shorted only when the coupling shows up in both directions.
    pub fn is_fault(&self) -> bool {
        self.scl_pulls_sda && self.sda_pulls_scl
    }
}

/// Drive each bus line low in turn and watch the other one.
///
/// The port D direction and data registers are restored to the values they had on entry, whatever
/// the outcome.
pub fn probe_lines<TI, D>(iface: &mut TI, delay: &mut D) -> ProbeReport
where
    TI: TwiInterface,
    D: DelayUs<u8>,
{
    let ddrd_orig = iface.read_register(Register::Ddrd);
    let portd_orig = iface.read_register(Register::Portd);

    // All inputs, no internal pull-ups: only the external pull-ups hold the lines.
    iface.write_register(Register::Ddrd, 0x00);
    iface.write_register(Register::Portd, 0x00);

    let scl_pulls_sda = drive_low_and_sample(iface, delay, SCL, SDA);
    let sda_pulls_scl = drive_low_and_sample(iface, delay, SDA, SCL);

    // Back to all inputs before PORTD is restored, so no pin is driven while the two registers
    // disagree.
    iface.write_register(Register::Ddrd, 0x00);
    iface.write_register(Register::Portd, portd_orig);
    iface.write_register(Register::Ddrd, ddrd_orig);

    ProbeReport {
        scl_pulls_sda,
        sda_pulls_scl,
    }
}

/// Make `driven` the only output on the port (PORTD is zero, so it goes low), wait, and report
/// whether `sampled` reads low.
fn drive_low_and_sample<TI, D>(iface: &mut TI, delay: &mut D, driven: u8, sampled: u8) -> bool
where
    TI: TwiInterface,
    D: DelayUs<u8>,
{
    iface.write_register(Register::Ddrd, driven);
    delay.delay_us(SETTLE_US);
    iface.read_register(Register::Pind) & sampled == 0
}
