//! Hardware Abstraction Layer
//!
//! Register buses, the volatile MMIO accessor, and the clocks used to bound
//! polling loops.

pub mod bus;
pub mod mmio;
pub mod timer;

/// Default base address of the adder's register window
///
/// The register offsets are absolute addresses on the reference platform, so
/// the window starts at zero.
pub const ADDER_BASE: usize = 0x0000_0000;
