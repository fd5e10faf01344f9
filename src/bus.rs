//! The bus controller. This provides the `Twi` type, which drives the TWI peripheral as a bus
//! master one phase at a time.

use hal::blocking::delay::DelayUs;

use crate::config::BusConfig;
use crate::interface::TwiInterface;
use crate::probe::{probe_lines, ProbeReport};
use crate::registers::{Register, TWEA, TWEN, TWINT, TWPS_MASK, TWSTA, TWSTO};
use crate::status::{Phase, Status, TwiError};

/// A blocking TWI bus master.
///
/// A transaction is driven by hand: `start`, `send` the address byte, then `send` or `read` data
/// bytes, then `stop`. Every operation busy-waits on the hardware with no timeout.
///
/// Once [`init`](Twi::init) has found SCL and SDA shorted together, the fault is latched for the
/// life of this value: `start`, `send` and `read` return [`TwiError::Fault`] and `stop` does
/// nothing, all without touching a register.
///
/// The peripheral is a single shared resource and `Twi` does no locking. Interrupt handlers must
/// not call into a `Twi` that the main program may be using, unless the main program masks them
/// around every call.
pub struct Twi<TI: TwiInterface> {
    iface: TI,
    fault: bool,
}

impl<TI: TwiInterface> Twi<TI> {
    /// Create a new `Twi`, taking ownership of the interface it drives the hardware through. The
    /// peripheral is not touched until `init`.
    pub fn new(iface: TI) -> Self {
        Self::with_fault(iface, false)
    }

    /// Create a `Twi` with the fault flag already in the given state.
    pub fn with_fault(iface: TI, fault: bool) -> Self {
        Self { iface, fault }
    }

    /// Whether a bus fault has been latched.
    pub fn is_faulted(&self) -> bool {
        self.fault
    }

    /// Release the interface, consuming the driver.
    pub fn release(self) -> TI {
        self.iface
    }

    /// Probe the bus lines and, if they are healthy, set up the bit rate for `config` with a
    /// prescaler of 1.
    ///
    /// If the probe finds a short, the fault is latched and the TWI registers are left in their
    /// reset state. If a fault was already latched, nothing at all is done and `None` is
    /// returned; otherwise the probe's report is returned.
    pub fn init<D: DelayUs<u8>>(
        &mut self,
        config: &BusConfig,
        delay: &mut D,
    ) -> Option<ProbeReport> {
        if self.fault {
            return None;
        }

        let report = probe_lines(&mut self.iface, delay);
        if report.is_fault() {
            self.fault = true;
            return Some(report);
        }

        let twsr = self.iface.read_register(Register::Twsr);
        self.iface.write_register(Register::Twsr, twsr & !TWPS_MASK);
        self.iface.write_register(Register::Twbr, config.bit_rate());
        Some(report)
    }

    /// Transmit a START (or repeated START) condition.
    pub fn start(&mut self) -> Result<(), TwiError> {
        self.check_fault()?;
        self.command(TWINT | TWEN | TWSTA);
        Phase::Start.check(self.status())
    }

    /// Transmit a STOP condition and wait until it has been sent. A STOP cannot fail.
    pub fn stop(&mut self) {
        if self.fault {
            return;
        }
        self.iface.write_register(Register::Twcr, TWINT | TWEN | TWSTO);
        self.iface.wait_for(Register::Twcr, TWSTO, false);
    }

    /// Transmit one byte, either an address (SLA+W / SLA+R) or data.
    ///
    /// Succeeds if the byte was acknowledged: SLA+W ACK, data ACK, or SLA+R ACK.
    pub fn send(&mut self, data: u8) -> Result<(), TwiError> {
        self.check_fault()?;
        self.iface.write_register(Register::Twdr, data);
        self.command(TWINT | TWEN);
        Phase::Send.check(self.status())
    }

    /// Receive one byte into `data` and acknowledge it.
    ///
    /// `data` is written whenever the hardware completed the phase, including when the status
    /// turns out to be wrong. It is left alone if a fault is latched.
    pub fn read(&mut self, data: &mut u8) -> Result<(), TwiError> {
        self.check_fault()?;
        self.command(TWINT | TWEN | TWEA);
        *data = self.iface.read_register(Register::Twdr);
        Phase::Read.check(self.status())
    }

    fn check_fault(&self) -> Result<(), TwiError> {
        if self.fault {
            Err(TwiError::Fault)
        } else {
            Ok(())
        }
    }

    /// Start a phase and wait for the hardware to finish it.
    fn command(&mut self, twcr: u8) {
        self.iface.write_register(Register::Twcr, twcr);
        self.iface.wait_for(Register::Twcr, TWINT, true);
    }

    fn status(&mut self) -> Status {
        Status::from_twsr(self.iface.read_register(Register::Twsr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::test_spy::{Access, SpyDelay, TestSpyInterface};
    use crate::status::FAULT_SENTINEL;
    use proptest::prelude::*;

    fn healthy() -> (TestSpyInterface, Twi<TestSpyInterface>) {
        let ei = TestSpyInterface::new();
        let twi = Twi::new(ei.split());
        (ei, twi)
    }

    fn faulted() -> (TestSpyInterface, Twi<TestSpyInterface>) {
        let ei = TestSpyInterface::new();
        let twi = Twi::with_fault(ei.split(), true);
        (ei, twi)
    }

    #[test]
    fn init_sets_bit_rate_and_clears_prescaler() {
        let (mut ei, mut twi) = healthy();
        ei.set(Register::Twsr, 0xF8 | TWPS_MASK);
        let report = twi.init(&BusConfig::TEENSY_2_0, &mut SpyDelay::new());
        assert_eq!(report, Some(ProbeReport::default()));
        assert!(!twi.is_faulted());
        assert_eq!(ei.get(Register::Twbr), 12);
        assert_eq!(ei.get(Register::Twsr) & TWPS_MASK, 0);
    }

    #[test]
    fn init_with_standard_mode_config() {
        let (ei, mut twi) = healthy();
        twi.init(&BusConfig::new(16_000_000, 100_000), &mut SpyDelay::new());
        assert_eq!(ei.get(Register::Twbr), 72);
    }

    #[test]
    fn init_on_shorted_bus_latches_fault() {
        let (mut ei, mut twi) = healthy();
        ei.short_lines();
        let report = twi.init(&BusConfig::TEENSY_2_0, &mut SpyDelay::new());
        assert!(report.map_or(false, |r| r.is_fault()));
        assert!(twi.is_faulted());
        assert!(ei.writes().iter().all(|&(r, _)| r == Register::Ddrd || r == Register::Portd));
        assert_eq!(ei.get(Register::Twbr), 0);
    }

    #[test]
    fn init_after_fault_does_nothing() {
        let (ei, mut twi) = faulted();
        let mut delay = SpyDelay::new();
        assert_eq!(twi.init(&BusConfig::TEENSY_2_0, &mut delay), None);
        assert!(twi.is_faulted());
        assert!(ei.log().is_empty());
        assert_eq!(delay.total_us, 0);
    }

    #[test]
    fn fault_is_never_reprobed() {
        let (mut ei, mut twi) = healthy();
        ei.short_lines();
        twi.init(&BusConfig::TEENSY_2_0, &mut SpyDelay::new());
        ei.clear_log();
        assert_eq!(twi.init(&BusConfig::TEENSY_2_0, &mut SpyDelay::new()), None);
        assert_eq!(twi.start(), Err(TwiError::Fault));
        assert!(ei.log().is_empty());
    }

    #[test]
    fn start_accepts_start() {
        let (mut ei, mut twi) = healthy();
        ei.push_status(0x08);
        assert_eq!(twi.start(), Ok(()));
        assert_eq!(ei.writes(), vec![(Register::Twcr, TWINT | TWEN | TWSTA)]);
    }

    #[test]
    fn start_accepts_repeated_start() {
        let (mut ei, mut twi) = healthy();
        ei.push_status(0x10);
        assert_eq!(twi.start(), Ok(()));
    }

    #[test]
    fn start_returns_arbitration_lost() {
        let (mut ei, mut twi) = healthy();
        ei.push_status(0x38);
        let err = twi.start().unwrap_err();
        assert_eq!(err, TwiError::Status(Status::ARB_LOST));
        assert_eq!(err.code(), 0x38);
    }

    #[test]
    fn start_ignores_prescaler_bits_in_status() {
        let (mut ei, mut twi) = healthy();
        ei.set(Register::Twsr, 0xF8 | 0b10);
        ei.push_status(0x08);
        assert_eq!(twi.start(), Ok(()));
    }

    #[test]
    fn start_waits_for_completion() {
        let (mut ei, mut twi) = healthy();
        ei.set_busy_polls(5);
        ei.push_status(0x08);
        assert_eq!(twi.start(), Ok(()));
        let polls = ei
            .log()
            .into_iter()
            .filter(|a| *a == Access::Read(Register::Twcr))
            .count();
        assert_eq!(polls, 6);
    }

    #[test]
    fn send_loads_data_before_triggering() {
        let (mut ei, mut twi) = healthy();
        ei.push_status(0x18);
        assert_eq!(twi.send(0x40), Ok(()));
        assert_eq!(
            ei.writes(),
            vec![(Register::Twdr, 0x40), (Register::Twcr, TWINT | TWEN)]
        );
    }

    #[test]
    fn send_accepts_acks() {
        for &code in &[0x18, 0x28, 0x40] {
            let (mut ei, mut twi) = healthy();
            ei.push_status(code);
            assert_eq!(twi.send(0x55), Ok(()));
        }
    }

    #[test]
    fn send_returns_nack() {
        let (mut ei, mut twi) = healthy();
        ei.push_status(0x20);
        assert_eq!(twi.send(0x40), Err(TwiError::Status(Status::MT_SLA_NACK)));
    }

    #[test]
    fn read_acks_and_copies_data() {
        let (mut ei, mut twi) = healthy();
        ei.push_status(0x50);
        ei.push_received(0x5A);
        let mut data = 0;
        assert_eq!(twi.read(&mut data), Ok(()));
        assert_eq!(data, 0x5A);
        assert_eq!(ei.writes(), vec![(Register::Twcr, TWINT | TWEN | TWEA)]);
    }

    #[test]
    fn read_copies_data_on_bad_status() {
        let (mut ei, mut twi) = healthy();
        ei.push_status(0x58);
        ei.push_received(0x17);
        let mut data = 0;
        assert_eq!(
            twi.read(&mut data),
            Err(TwiError::Status(Status::MR_DATA_NACK))
        );
        assert_eq!(data, 0x17);
    }

    #[test]
    fn stop_waits_for_stop_flag() {
        let (mut ei, mut twi) = healthy();
        ei.set_busy_polls(2);
        twi.stop();
        assert_eq!(
            ei.log(),
            vec![
                Access::Write(Register::Twcr, TWINT | TWEN | TWSTO),
                Access::Read(Register::Twcr),
                Access::Read(Register::Twcr),
                Access::Read(Register::Twcr),
            ]
        );
        assert_eq!(ei.get(Register::Twcr) & TWSTO, 0);
    }

    #[test]
    fn transaction_round_trip() {
        let (mut ei, mut twi) = healthy();
        twi.init(&BusConfig::TEENSY_2_0, &mut SpyDelay::new());

        ei.push_status(0x08);
        assert_eq!(twi.start(), Ok(()));

        ei.push_status(0x28);
        assert_eq!(twi.send(0x42), Ok(()));
        assert_eq!(ei.get(Register::Twdr), 0x42);

        ei.push_status(0x50);
        ei.push_received(0x99);
        let mut data = 0;
        assert_eq!(twi.read(&mut data), Ok(()));
        assert_eq!(data, 0x99);

        twi.stop();
        assert_eq!(ei.get(Register::Twcr) & TWSTO, 0);
    }

    #[test]
    fn latched_fault_blocks_everything() {
        let (mut ei, mut twi) = faulted();
        ei.push_status(0x08);
        ei.push_received(0x99);

        assert_eq!(twi.start(), Err(TwiError::Fault));
        assert_eq!(twi.send(0x42), Err(TwiError::Fault));
        let mut data = 0xAB;
        assert_eq!(twi.read(&mut data), Err(TwiError::Fault));
        assert_eq!(data, 0xAB);
        twi.stop();
        twi.init(&BusConfig::TEENSY_2_0, &mut SpyDelay::new());

        assert_eq!(twi.start().unwrap_err().code(), FAULT_SENTINEL);
        assert!(ei.log().is_empty());
    }

    proptest! {
        #[test]
        fn start_returns_unexpected_status_unchanged(code in any::<u8>()) {
            let (mut ei, mut twi) = healthy();
            let status = Status::from_twsr(code);
            ei.push_status(code);
            let result = twi.start();
            if status == Status::START || status == Status::REP_START {
                prop_assert_eq!(result, Ok(()));
            } else {
                prop_assert_eq!(result, Err(TwiError::Status(status)));
            }
        }

        #[test]
        fn send_returns_unexpected_status_unchanged(code in any::<u8>(), byte in any::<u8>()) {
            let (mut ei, mut twi) = healthy();
            let status = Status::from_twsr(code);
            ei.push_status(code);
            let result = twi.send(byte);
            if status == Status::MT_SLA_ACK
                || status == Status::MT_DATA_ACK
                || status == Status::MR_SLA_ACK
            {
                prop_assert_eq!(result, Ok(()));
            } else {
                prop_assert_eq!(result, Err(TwiError::Status(status)));
            }
        }

        #[test]
        fn read_always_copies_received_byte(code in any::<u8>(), byte in any::<u8>()) {
            let (mut ei, mut twi) = healthy();
            ei.push_status(code);
            ei.push_received(byte);
            let mut data = !byte;
            let result = twi.read(&mut data);
            prop_assert_eq!(data, byte);
            prop_assert_eq!(result.is_ok(), Status::from_twsr(code) == Status::MR_DATA_ACK);
        }
    }
}
