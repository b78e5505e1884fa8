//! Simulated adder peripheral
//!
//! An in-process register bank that behaves like the adder: READY while idle,
//! busy after both operands are written, DONE once the sum is available, and
//! back to idle when SUM is read. Every access is recorded so tests can check
//! ordering, widths, and offsets. Flags can be delayed by a number of STATUS
//! reads or withheld entirely, and SUM can be forced to a wrong value.

use core::cell::{Cell, RefCell};

use heapless::Vec;

use crate::hal::bus::{RegisterBus, Width};
use crate::hal::timer::Timer;
use crate::regs::{self, AdderStatus};

/// Number of accesses kept in the trace
pub const TRACE_CAPACITY: usize = 128;

/// Access direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccessKind {
    /// Load from a register
    Read,
    /// Store to a register
    Write,
}

/// One recorded register access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Access {
    /// Direction
    pub kind: AccessKind,
    /// Byte offset from the peripheral base
    pub offset: usize,
    /// Access width
    pub width: Width,
    /// Value read or written, zero-extended
    pub value: u32,
}

impl Access {
    /// A read of `value` from `offset`
    pub const fn read(offset: usize, width: Width, value: u32) -> Self {
        Self {
            kind: AccessKind::Read,
            offset,
            width,
            value,
        }
    }

    /// A write of `value` to `offset`
    pub const fn write(offset: usize, width: Width, value: u32) -> Self {
        Self {
            kind: AccessKind::Write,
            offset,
            width,
            value,
        }
    }
}

/// Access that real hardware would not accept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusFault {
    /// No register at this offset
    Unmapped {
        /// Offending offset
        offset: usize,
    },
    /// Register accessed at the wrong width
    WrongWidth {
        /// Offending offset
        offset: usize,
        /// Width of the register
        expected: Width,
        /// Width of the access
        actual: Width,
    },
    /// Write to a read-only register or read of a write-only one
    WrongDirection {
        /// Offending offset
        offset: usize,
        /// Direction of the access
        kind: AccessKind,
    },
    /// Operand written before the pending SUM was read; the write is dropped
    WriteWhileBusy {
        /// Offending offset
        offset: usize,
    },
}

const REGISTER_MAP: [(usize, Width, AccessKind); 4] = [
    (regs::STATUS.offset(), regs::STATUS.width(), AccessKind::Read),
    (regs::X.offset(), regs::X.width(), AccessKind::Write),
    (regs::Y.offset(), regs::Y.width(), AccessKind::Write),
    (regs::SUM.offset(), regs::SUM.width(), AccessKind::Read),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Busy,
    Done,
}

struct State {
    phase: Phase,
    phase_reads: u32,
    status_reads: u32,
    x: Option<u32>,
    y: Option<u32>,
    sum: u32,
    trace: Vec<Access, TRACE_CAPACITY>,
    dropped: usize,
    fault: Option<BusFault>,
}

/// Behavioral model of the adder peripheral
pub struct SimulatedAdder {
    ready_after: Option<u32>,
    done_after: Option<u32>,
    forced_sum: Option<u32>,
    extra_status_bits: u8,
    state: RefCell<State>,
}

impl SimulatedAdder {
    /// Adder that is ready and finishes on the first STATUS read
    pub fn new() -> Self {
        Self {
            ready_after: Some(0),
            done_after: Some(0),
            forced_sum: None,
            extra_status_bits: 0,
            state: RefCell::new(State {
                phase: Phase::Idle,
                phase_reads: 0,
                status_reads: 0,
                x: None,
                y: None,
                sum: 0,
                trace: Vec::new(),
                dropped: 0,
                fault: None,
            }),
        }
    }

    /// Withhold READY for the first `reads` STATUS reads while idle
    pub fn with_ready_after(mut self, reads: u32) -> Self {
        self.ready_after = Some(reads);
        self
    }

    /// Withhold DONE for the first `reads` STATUS reads while busy
    pub fn with_done_after(mut self, reads: u32) -> Self {
        self.done_after = Some(reads);
        self
    }

    /// Never assert READY
    pub fn stall_ready(mut self) -> Self {
        self.ready_after = None;
        self
    }

    /// Never assert DONE
    pub fn stall_done(mut self) -> Self {
        self.done_after = None;
        self
    }

    /// Report `sum` from SUM regardless of the operands
    pub fn with_forced_sum(mut self, sum: u32) -> Self {
        self.forced_sum = Some(sum);
        self
    }

    /// OR undefined bits into every STATUS read
    pub fn with_extra_status_bits(mut self, bits: u8) -> Self {
        self.extra_status_bits = bits & !AdderStatus::all().bits();
        self
    }

    /// Recorded accesses, oldest first
    pub fn trace(&self) -> Vec<Access, TRACE_CAPACITY> {
        self.state.borrow().trace.clone()
    }

    /// Accesses that did not fit in the trace
    pub fn dropped_accesses(&self) -> usize {
        self.state.borrow().dropped
    }

    /// Clear the trace and the dropped counter
    pub fn clear_trace(&self) {
        let mut state = self.state.borrow_mut();
        state.trace.clear();
        state.dropped = 0;
    }

    /// First bus fault seen, if any
    pub fn fault(&self) -> Option<BusFault> {
        self.state.borrow().fault
    }

    /// Total STATUS reads so far
    pub fn status_reads(&self) -> u32 {
        self.state.borrow().status_reads
    }

    fn read(&self, offset: usize, width: Width) -> u32 {
        let mut state = self.state.borrow_mut();
        let value = if Self::check(&mut state, offset, width, AccessKind::Read) {
            match offset {
                regs::ADDER_STATUS => u32::from(self.read_status(&mut state)),
                regs::ADDER_SUM => {
                    if state.phase == Phase::Done {
                        state.phase = Phase::Idle;
                        state.phase_reads = 0;
                    }
                    state.sum
                }
                _ => 0,
            }
        } else {
            0
        };
        Self::record(&mut state, Access::read(offset, width, value));
        value
    }

    fn write(&self, offset: usize, width: Width, value: u32) {
        let mut state = self.state.borrow_mut();
        Self::record(&mut state, Access::write(offset, width, value));
        if !Self::check(&mut state, offset, width, AccessKind::Write) {
            return;
        }

        if state.phase != Phase::Idle {
            warn!("simulated adder: operand write at 0x{:04x} while busy", offset);
            Self::raise(&mut state, BusFault::WriteWhileBusy { offset });
            return;
        }

        match offset {
            regs::ADDER_X => state.x = Some(value),
            regs::ADDER_Y => state.y = Some(value),
            _ => return,
        }

        if let (Some(x), Some(y)) = (state.x, state.y) {
            state.sum = self.forced_sum.unwrap_or(x.wrapping_add(y));
            state.x = None;
            state.y = None;
            state.phase = Phase::Busy;
            state.phase_reads = 0;
        }
    }

    fn read_status(&self, state: &mut State) -> u8 {
        let polls = state.phase_reads;
        state.phase_reads = state.phase_reads.saturating_add(1);
        state.status_reads = state.status_reads.saturating_add(1);

        let raised = |after: Option<u32>| after.is_some_and(|n| polls >= n);
        let flags = match state.phase {
            Phase::Idle if raised(self.ready_after) => AdderStatus::READY,
            Phase::Busy if raised(self.done_after) => {
                state.phase = Phase::Done;
                AdderStatus::DONE
            }
            Phase::Done => AdderStatus::DONE,
            _ => AdderStatus::empty(),
        };
        flags.bits() | self.extra_status_bits
    }

    fn check(state: &mut State, offset: usize, width: Width, kind: AccessKind) -> bool {
        let fault = match REGISTER_MAP.iter().find(|(o, _, _)| *o == offset) {
            None => BusFault::Unmapped { offset },
            Some(&(_, expected, _)) if expected != width => BusFault::WrongWidth {
                offset,
                expected,
                actual: width,
            },
            Some(&(_, _, dir)) if dir != kind => BusFault::WrongDirection { offset, kind },
            Some(_) => return true,
        };

        warn!("simulated adder: bad access at offset 0x{:04x}", offset);
        Self::raise(state, fault);
        false
    }

    fn raise(state: &mut State, fault: BusFault) {
        if state.fault.is_none() {
            state.fault = Some(fault);
        }
    }

    fn record(state: &mut State, access: Access) {
        if state.trace.push(access).is_err() {
            state.dropped += 1;
        }
    }
}

impl Default for SimulatedAdder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterBus for SimulatedAdder {
    fn read8(&self, offset: usize) -> u8 {
        u8::try_from(self.read(offset, Width::W8)).unwrap_or(0)
    }

    fn read16(&self, offset: usize) -> u16 {
        u16::try_from(self.read(offset, Width::W16)).unwrap_or(0)
    }

    fn read32(&self, offset: usize) -> u32 {
        self.read(offset, Width::W32)
    }

    fn write8(&self, offset: usize, value: u8) {
        self.write(offset, Width::W8, u32::from(value))
    }

    fn write16(&self, offset: usize, value: u16) {
        self.write(offset, Width::W16, u32::from(value))
    }

    fn write32(&self, offset: usize, value: u32) {
        self.write(offset, Width::W32, value)
    }
}

/// Deterministic clock that advances a fixed step on every reading
pub struct SimClock {
    now: Cell<u64>,
    step: u64,
}

impl SimClock {
    /// Clock starting at zero, advancing `step_us` per reading
    pub const fn new(step_us: u64) -> Self {
        Self {
            now: Cell::new(0),
            step: step_us,
        }
    }

    /// Current time without advancing
    pub fn peek(&self) -> u64 {
        self.now.get()
    }
}

impl Timer for SimClock {
    fn now_us(&self) -> u64 {
        let now = self.now.get();
        self.now.set(now.wrapping_add(self.step));
        now
    }
}
