//! Bare-metal adder self-test
//!
//! Runs the self-test against the real adder registers and parks the core.
//! The exit code is left in a static for a debugger to inspect.

#![no_std]
#![no_main]

use core::sync::atomic::{AtomicU8, Ordering};

use adder_mmio::{AdderConfig, AdderDriver, CounterTimer, SelfTest, SelfTestOutcome};

use defmt_rtt as _;
use panic_probe as _;

/// Free-running 1 MHz counter block (BCM2710 system timer)
const TIMER_BASE: usize = 0x3F00_3000;

/// Self-test exit code, 0xff until the test has run
static EXIT_CODE: AtomicU8 = AtomicU8::new(0xff);

#[no_mangle]
pub extern "C" fn _start() -> ! {
    main()
}

fn main() -> ! {
    let config = AdderConfig::new();

    // SAFETY: the adder and the system timer are mapped at these addresses on
    // the target board, and this is the only code touching them.
    let timer = unsafe { CounterTimer::new(TIMER_BASE) };
    let mut driver = unsafe { AdderDriver::mmio(timer, config) };

    let outcome = SelfTestOutcome::from_result(SelfTest::default().run(&mut driver));
    match outcome {
        SelfTestOutcome::Passed(report) => {
            defmt::info!("{} + {} = {}", report.x, report.y, report.sum);
        }
        SelfTestOutcome::Mismatch {
            hardware,
            reference,
        } => {
            defmt::error!(
                "Hardware result {} does not match reference value {}",
                hardware,
                reference
            );
        }
        SelfTestOutcome::Timeout { stage, status } => {
            defmt::error!("Peripheral timeout waiting for {:?}, status 0x{:02x}", stage, status);
        }
    }

    EXIT_CODE.store(outcome.exit_code(), Ordering::SeqCst);

    loop {
        cortex_m::asm::wfi(); // Wait for interrupt
    }
}
