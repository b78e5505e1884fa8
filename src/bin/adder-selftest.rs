//! Adder self-test runner
//!
//! Runs the self-test against the simulated adder on the host and exits with
//! 0 on a match, 1 on a mismatch, and 2 on a peripheral timeout.

use std::process::ExitCode;

use adder_mmio::{
    AdderConfig, AdderDriver, AdderError, SelfTest, SelfTestOutcome, SimulatedAdder, StdTimer,
};
use clap::Parser;

#[derive(Parser)]
#[command(name = "adder-selftest")]
#[command(version)]
#[command(about = "Run the adder peripheral self-test against a simulated register bank", long_about = None)]
struct Cli {
    /// First operand
    #[arg(long, default_value_t = adder_mmio::selftest::DEFAULT_X)]
    x: u32,

    /// Second operand
    #[arg(long, default_value_t = adder_mmio::selftest::DEFAULT_Y)]
    y: u32,

    /// Make the simulated SUM register report this value
    #[arg(long)]
    force_sum: Option<u32>,

    /// STATUS reads before READY is raised
    #[arg(long, default_value_t = 0)]
    ready_after: u32,

    /// STATUS reads before DONE is raised
    #[arg(long, default_value_t = 0)]
    done_after: u32,

    /// Never raise READY
    #[arg(long)]
    stall_ready: bool,

    /// Never raise DONE
    #[arg(long)]
    stall_done: bool,

    /// READY timeout in microseconds
    #[arg(long)]
    ready_timeout_us: Option<u32>,

    /// DONE timeout in microseconds
    #[arg(long)]
    done_timeout_us: Option<u32>,

    /// Delay between STATUS reads in microseconds
    #[arg(long, default_value_t = 0)]
    poll_interval_us: u32,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn adder(&self) -> SimulatedAdder {
        let mut adder = SimulatedAdder::new()
            .with_ready_after(self.ready_after)
            .with_done_after(self.done_after);
        if let Some(sum) = self.force_sum {
            adder = adder.with_forced_sum(sum);
        }
        if self.stall_ready {
            adder = adder.stall_ready();
        }
        if self.stall_done {
            adder = adder.stall_done();
        }
        adder
    }

    fn config(&self) -> AdderConfig {
        let mut config = AdderConfig::new().with_poll_interval_us(self.poll_interval_us);
        if let Some(timeout) = self.ready_timeout_us {
            config = config.with_ready_timeout_us(timeout);
        }
        if let Some(timeout) = self.done_timeout_us {
            config = config.with_done_timeout_us(timeout);
        }
        config
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let adder = cli.adder();
    let mut driver = AdderDriver::new(&adder, StdTimer::new(), cli.config());

    let result = SelfTest::new(cli.x, cli.y).run(&mut driver);
    match result {
        Ok(report) => {
            if cli.verbose {
                println!("{} + {} = {}", report.x, report.y, report.sum);
            }
        }
        Err(err @ AdderError::ResultMismatch { .. }) => println!("{err}"),
        Err(err @ AdderError::PeripheralTimeout { .. }) => eprintln!("{err}"),
    }

    let outcome = SelfTestOutcome::from_result(result);
    ExitCode::from(outcome.exit_code())
}
