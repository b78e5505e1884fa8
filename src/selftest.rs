//! Adder self-test
//!
//! Runs one addition on the peripheral and checks it against
//! [`reference_sum`].

use crate::adder::{reference_sum, AdderDriver, AdderError, PollStage};
use crate::hal::{bus::RegisterBus, timer::Timer};

/// Default first operand
pub const DEFAULT_X: u32 = 4;
/// Default second operand
pub const DEFAULT_Y: u32 = 5;

/// Exit code when SUM matches the reference
pub const EXIT_PASS: u8 = 0;
/// Exit code when SUM differs from the reference
pub const EXIT_MISMATCH: u8 = 1;
/// Exit code when the peripheral never raised a status flag
pub const EXIT_TIMEOUT: u8 = 2;

/// Operands for one self-test run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelfTest {
    x: u32,
    y: u32,
}

/// Result of a passing run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SelfTestReport {
    /// First operand
    pub x: u32,
    /// Second operand
    pub y: u32,
    /// SUM read from the peripheral
    pub sum: u32,
}

impl SelfTest {
    /// Self-test adding `x` and `y`
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Run the addition on the peripheral and verify SUM
    ///
    /// # Errors
    /// [`AdderError::ResultMismatch`] if SUM differs from [`reference_sum`],
    /// or [`AdderError::PeripheralTimeout`] if the peripheral stalls.
    pub fn run<B, T>(&self, driver: &mut AdderDriver<B, T>) -> Result<SelfTestReport, AdderError>
    where
        B: RegisterBus,
        T: Timer,
    {
        info!("adder self-test: {} + {}", self.x, self.y);

        let hardware = driver.add(self.x, self.y)?;
        let reference = reference_sum(self.x, self.y);

        if hardware != reference {
            error!(
                "Hardware result {} does not match reference value {}",
                hardware,
                reference
            );
            return Err(AdderError::ResultMismatch {
                hardware,
                reference,
            });
        }

        info!("adder self-test passed, SUM = {}", hardware);
        Ok(SelfTestReport {
            x: self.x,
            y: self.y,
            sum: hardware,
        })
    }
}

impl Default for SelfTest {
    fn default() -> Self {
        Self::new(DEFAULT_X, DEFAULT_Y)
    }
}

/// Self-test outcome mapped onto the process exit contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SelfTestOutcome {
    /// SUM matched
    Passed(SelfTestReport),
    /// SUM did not match
    Mismatch {
        /// Value read from SUM
        hardware: u32,
        /// Expected value
        reference: u32,
    },
    /// A status poll timed out
    Timeout {
        /// Stage that timed out
        stage: PollStage,
        /// Last raw STATUS value
        status: u8,
    },
}

impl SelfTestOutcome {
    /// Classify the result of [`SelfTest::run`]
    pub fn from_result(result: Result<SelfTestReport, AdderError>) -> Self {
        match result {
            Ok(report) => SelfTestOutcome::Passed(report),
            Err(AdderError::ResultMismatch {
                hardware,
                reference,
            }) => SelfTestOutcome::Mismatch {
                hardware,
                reference,
            },
            Err(AdderError::PeripheralTimeout { stage, status }) => {
                SelfTestOutcome::Timeout { stage, status }
            }
        }
    }

    /// Process exit code: 0 pass, 1 mismatch, 2 timeout
    pub const fn exit_code(&self) -> u8 {
        match self {
            SelfTestOutcome::Passed(_) => EXIT_PASS,
            SelfTestOutcome::Mismatch { .. } => EXIT_MISMATCH,
            SelfTestOutcome::Timeout { .. } => EXIT_TIMEOUT,
        }
    }

    /// Whether the run passed
    pub const fn passed(&self) -> bool {
        matches!(self, SelfTestOutcome::Passed(_))
    }
}

impl From<Result<SelfTestReport, AdderError>> for SelfTestOutcome {
    fn from(result: Result<SelfTestReport, AdderError>) -> Self {
        Self::from_result(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adder::AdderConfig;
    use crate::sim::{SimClock, SimulatedAdder};

    #[test]
    fn default_operands_pass() {
        let sim = SimulatedAdder::new();
        let mut driver = AdderDriver::new(&sim, SimClock::new(1), AdderConfig::new());

        let outcome = SelfTestOutcome::from_result(SelfTest::default().run(&mut driver));

        assert_eq!(
            outcome,
            SelfTestOutcome::Passed(SelfTestReport { x: 4, y: 5, sum: 9 })
        );
        assert_eq!(outcome.exit_code(), 0);
    }

    #[test]
    fn forced_sum_is_a_mismatch() {
        let sim = SimulatedAdder::new().with_forced_sum(10);
        let mut driver = AdderDriver::new(&sim, SimClock::new(1), AdderConfig::new());

        let result = SelfTest::default().run(&mut driver);
        assert_eq!(
            result,
            Err(AdderError::ResultMismatch {
                hardware: 10,
                reference: 9,
            })
        );

        let outcome = SelfTestOutcome::from(result);
        assert_eq!(outcome.exit_code(), 1);
        assert!(!outcome.passed());
    }

    #[test]
    fn wrapping_operands_pass() {
        let sim = SimulatedAdder::new();
        let mut driver = AdderDriver::new(&sim, SimClock::new(1), AdderConfig::new());

        let report = SelfTest::new(u32::MAX, 2).run(&mut driver).unwrap();
        assert_eq!(report.sum, 1);
    }

    #[test]
    fn timeout_exit_code() {
        let outcome = SelfTestOutcome::from_result(Err(AdderError::PeripheralTimeout {
            stage: PollStage::Ready,
            status: 0,
        }));
        assert_eq!(outcome.exit_code(), EXIT_TIMEOUT);
    }

    #[test]
    fn mismatch_message_names_both_values() {
        let err = AdderError::ResultMismatch {
            hardware: 10,
            reference: 9,
        };
        assert_eq!(
            std::format!("{err}"),
            "Hardware result 10 does not match reference value 9"
        );
    }
}
