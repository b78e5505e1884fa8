//! Adder peripheral driver
//!
//! Sequences the peripheral through one status-gated addition:
//! wait for READY, write X and Y, wait for DONE, read SUM.

use core::fmt;

use thiserror::Error;

use crate::hal::{bus::RegisterBus, mmio::MmioBus, timer::Timer, ADDER_BASE};
use crate::regs::{self, AdderStatus};

/// Default timeout for the peripheral to become ready
const DEFAULT_READY_TIMEOUT_US: u32 = 100_000; // 100 ms
/// Default timeout for an addition to complete
const DEFAULT_DONE_TIMEOUT_US: u32 = 100_000; // 100 ms

/// Software reference for the peripheral: 32-bit wrapping addition
pub const fn reference_sum(x: u32, y: u32) -> u32 {
    x.wrapping_add(y)
}

/// Status condition a poll waits for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollStage {
    /// Waiting for READY before writing operands
    Ready,
    /// Waiting for DONE before reading SUM
    Done,
}

impl PollStage {
    /// Status flag the stage waits on
    pub const fn flag(self) -> AdderStatus {
        match self {
            PollStage::Ready => AdderStatus::READY,
            PollStage::Done => AdderStatus::DONE,
        }
    }
}

impl fmt::Display for PollStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollStage::Ready => f.write_str("READY"),
            PollStage::Done => f.write_str("DONE"),
        }
    }
}

/// Adder driver errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdderError {
    /// SUM read back from the peripheral differs from the software reference
    #[error("Hardware result {hardware} does not match reference value {reference}")]
    ResultMismatch {
        /// Value read from SUM
        hardware: u32,
        /// Value computed by [`reference_sum`]
        reference: u32,
    },
    /// A status poll did not see its flag within the configured timeout
    #[error("peripheral timed out waiting for {stage} (last status 0x{status:02x})")]
    PeripheralTimeout {
        /// Stage that timed out
        stage: PollStage,
        /// Last raw STATUS value observed
        status: u8,
    },
}

/// Driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdderConfig {
    /// Base address of the register window
    pub base: usize,
    /// Maximum time to wait for READY
    pub ready_timeout_us: u32,
    /// Maximum time to wait for DONE
    pub done_timeout_us: u32,
    /// Delay between status reads; zero busy-waits
    pub poll_interval_us: u32,
}

impl AdderConfig {
    /// Configuration with the default base address and timeouts
    pub const fn new() -> Self {
        Self {
            base: ADDER_BASE,
            ready_timeout_us: DEFAULT_READY_TIMEOUT_US,
            done_timeout_us: DEFAULT_DONE_TIMEOUT_US,
            poll_interval_us: 0,
        }
    }

    /// Set the base address of the register window
    pub const fn with_base(mut self, base: usize) -> Self {
        self.base = base;
        self
    }

    /// Set the READY timeout
    pub const fn with_ready_timeout_us(mut self, timeout_us: u32) -> Self {
        self.ready_timeout_us = timeout_us;
        self
    }

    /// Set the DONE timeout
    pub const fn with_done_timeout_us(mut self, timeout_us: u32) -> Self {
        self.done_timeout_us = timeout_us;
        self
    }

    /// Set the delay between status reads
    pub const fn with_poll_interval_us(mut self, interval_us: u32) -> Self {
        self.poll_interval_us = interval_us;
        self
    }

    const fn timeout_for(&self, stage: PollStage) -> u32 {
        match stage {
            PollStage::Ready => self.ready_timeout_us,
            PollStage::Done => self.done_timeout_us,
        }
    }
}

impl Default for AdderConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Adder peripheral driver
///
/// Owns its register bus for its whole lifetime; nothing else should touch
/// the adder's registers while a driver exists.
pub struct AdderDriver<B, T> {
    bus: B,
    timer: T,
    config: AdderConfig,
}

impl<T: Timer> AdderDriver<MmioBus, T> {
    /// Create a driver over real MMIO at `config.base`
    ///
    /// # Safety
    /// The adder's registers must be mapped at `config.base`, and no other
    /// handle to them may be used while the driver exists.
    pub unsafe fn mmio(timer: T, config: AdderConfig) -> Self {
        // SAFETY: forwarded to the caller.
        let bus = unsafe { MmioBus::new(config.base) };
        Self::new(bus, timer, config)
    }
}

impl<B: RegisterBus, T: Timer> AdderDriver<B, T> {
    /// Create a driver over an arbitrary register bus
    pub fn new(bus: B, timer: T, config: AdderConfig) -> Self {
        Self { bus, timer, config }
    }

    /// Release the bus and timer
    pub fn into_parts(self) -> (B, T) {
        (self.bus, self.timer)
    }

    /// Read the STATUS register once
    pub fn status(&self) -> AdderStatus {
        AdderStatus::from_bits_retain(regs::STATUS.read(&self.bus))
    }

    /// Wait until the peripheral reports READY
    ///
    /// # Errors
    /// [`AdderError::PeripheralTimeout`] if READY is not seen within
    /// `ready_timeout_us`.
    pub fn wait_ready(&mut self) -> Result<AdderStatus, AdderError> {
        self.poll(PollStage::Ready)
    }

    /// Write both operands, X first
    pub fn write_operands(&mut self, x: u32, y: u32) {
        regs::X.write(&self.bus, x);
        regs::Y.write(&self.bus, y);
    }

    /// Wait until the peripheral reports DONE
    ///
    /// # Errors
    /// [`AdderError::PeripheralTimeout`] if DONE is not seen within
    /// `done_timeout_us`.
    pub fn wait_done(&mut self) -> Result<AdderStatus, AdderError> {
        self.poll(PollStage::Done)
    }

    /// Read the SUM register
    pub fn read_sum(&mut self) -> u32 {
        regs::SUM.read(&self.bus)
    }

    /// Run one addition on the peripheral and return the raw SUM
    ///
    /// # Errors
    /// [`AdderError::PeripheralTimeout`] if either poll times out.
    pub fn add(&mut self, x: u32, y: u32) -> Result<u32, AdderError> {
        self.wait_ready()?;
        debug!("adder ready, writing operands {} + {}", x, y);

        self.write_operands(x, y);

        self.wait_done()?;
        let sum = self.read_sum();
        debug!("adder done, SUM = {}", sum);
        Ok(sum)
    }

    fn poll(&self, stage: PollStage) -> Result<AdderStatus, AdderError> {
        let flag = stage.flag();
        let timeout_us = self.config.timeout_for(stage);
        let start = self.timer.now_us();

        loop {
            let status = self.status();
            if status.contains(flag) {
                return Ok(status);
            }

            if self.timer.is_timeout(start, timeout_us) {
                warn!(
                    "adder poll timed out after {} us, status 0x{:02x}",
                    timeout_us,
                    status.bits()
                );
                return Err(AdderError::PeripheralTimeout {
                    stage,
                    status: status.bits(),
                });
            }

            if self.config.poll_interval_us > 0 {
                self.timer.delay_us(self.config.poll_interval_us);
            } else {
                core::hint::spin_loop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Access, SimClock, SimulatedAdder};

    fn driver(sim: &SimulatedAdder) -> AdderDriver<&SimulatedAdder, SimClock> {
        AdderDriver::new(sim, SimClock::new(1), AdderConfig::new())
    }

    #[test]
    fn reference_sum_wraps() {
        assert_eq!(reference_sum(4, 5), 9);
        assert_eq!(reference_sum(u32::MAX, 1), 0);
        assert_eq!(reference_sum(u32::MAX, u32::MAX), u32::MAX - 1);
        assert_eq!(reference_sum(0x8000_0000, 0x8000_0000), 0);
    }

    #[test]
    fn add_runs_full_sequence() {
        let sim = SimulatedAdder::new();
        let mut drv = driver(&sim);

        assert_eq!(drv.add(4, 5), Ok(9));

        let trace = sim.trace();
        assert_eq!(
            trace.as_slice(),
            &[
                Access::read(regs::ADDER_STATUS, crate::hal::bus::Width::W8, 0x2),
                Access::write(regs::ADDER_X, crate::hal::bus::Width::W32, 4),
                Access::write(regs::ADDER_Y, crate::hal::bus::Width::W32, 5),
                Access::read(regs::ADDER_STATUS, crate::hal::bus::Width::W8, 0x1),
                Access::read(regs::ADDER_SUM, crate::hal::bus::Width::W32, 9),
            ]
        );
        assert_eq!(sim.fault(), None);
    }

    #[test]
    fn into_parts_returns_the_bus_used_for_the_run() {
        let mut drv =
            AdderDriver::new(SimulatedAdder::new(), SimClock::new(1), AdderConfig::new());
        assert_eq!(drv.add(20, 22), Ok(42));

        let (sim, clock) = drv.into_parts();
        let trace = sim.trace();
        assert_eq!(trace.len(), 5);
        assert!(trace.contains(&Access::write(regs::ADDER_X, crate::hal::bus::Width::W32, 20)));
        assert!(trace.contains(&Access::write(regs::ADDER_Y, crate::hal::bus::Width::W32, 22)));
        assert_eq!(
            trace.last(),
            Some(&Access::read(regs::ADDER_SUM, crate::hal::bus::Width::W32, 42))
        );
        assert!(clock.peek() > 0);
    }

    #[test]
    fn polls_until_flags_are_raised() {
        let sim = SimulatedAdder::new().with_ready_after(3).with_done_after(2);
        let mut drv = driver(&sim);

        assert_eq!(drv.add(7, 8), Ok(15));
        assert_eq!(sim.status_reads(), 4 + 3);
    }

    #[test]
    fn ready_timeout_skips_operand_writes() {
        let sim = SimulatedAdder::new().stall_ready();
        let mut drv = AdderDriver::new(
            &sim,
            SimClock::new(10),
            AdderConfig::new().with_ready_timeout_us(100),
        );

        assert_eq!(
            drv.add(1, 2),
            Err(AdderError::PeripheralTimeout {
                stage: PollStage::Ready,
                status: 0,
            })
        );
        assert!(sim.trace().iter().all(|a| a.offset == regs::ADDER_STATUS));
    }

    #[test]
    fn done_timeout_never_reads_sum() {
        let sim = SimulatedAdder::new().stall_done();
        let mut drv = AdderDriver::new(
            &sim,
            SimClock::new(10),
            AdderConfig::new().with_done_timeout_us(50),
        );

        let err = drv.add(1, 2).unwrap_err();
        assert!(matches!(
            err,
            AdderError::PeripheralTimeout {
                stage: PollStage::Done,
                ..
            }
        ));
        assert!(sim.trace().iter().all(|a| a.offset != regs::ADDER_SUM));
    }

    #[test]
    fn undefined_status_bits_are_ignored() {
        let sim = SimulatedAdder::new().with_extra_status_bits(0xfc);
        let mut drv = driver(&sim);

        assert_eq!(drv.status().bits() & 0xfc, 0xfc);
        assert_eq!(drv.add(2, 3), Ok(5));
    }

    #[test]
    fn poll_interval_delays_between_reads() {
        let sim = SimulatedAdder::new().with_ready_after(2);
        let clock = SimClock::new(1);
        let mut drv = AdderDriver::new(
            &sim,
            &clock,
            AdderConfig::new().with_poll_interval_us(20),
        );

        drv.wait_ready().unwrap();
        assert!(clock.peek() >= 40);
    }

    #[test]
    fn timeout_message_names_the_stage() {
        let err = AdderError::PeripheralTimeout {
            stage: PollStage::Done,
            status: 0x02,
        };
        assert_eq!(
            std::format!("{err}"),
            "peripheral timed out waiting for DONE (last status 0x02)"
        );
    }
}
