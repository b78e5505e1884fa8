//! Adder register map
//!
//! Offsets are relative to the peripheral base. Each register is a typed
//! descriptor whose value type fixes the access width, so a STATUS read is
//! always 8-bit and the operand and SUM accesses are always 32-bit.

use core::marker::PhantomData;

use bitflags::bitflags;

use crate::hal::bus::{RegisterBus, RegisterWidth, Width};

/// Status register offset (8-bit, read)
pub const ADDER_STATUS: usize = 0x2000;
/// First operand register offset (32-bit, write)
pub const ADDER_X: usize = 0x2004;
/// Second operand register offset (32-bit, write)
pub const ADDER_Y: usize = 0x2008;
/// Result register offset (32-bit, read)
pub const ADDER_SUM: usize = 0x200C;

/// STATUS register
pub const STATUS: ReadOnly<u8> = ReadOnly::at(ADDER_STATUS);
/// Operand X register
pub const X: WriteOnly<u32> = WriteOnly::at(ADDER_X);
/// Operand Y register
pub const Y: WriteOnly<u32> = WriteOnly::at(ADDER_Y);
/// SUM register
pub const SUM: ReadOnly<u32> = ReadOnly::at(ADDER_SUM);

bitflags! {
    /// Adder STATUS register flags
    ///
    /// Only bits 0 and 1 are defined. Other bits are kept as read but never
    /// consulted.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AdderStatus: u8 {
        /// Operation complete, SUM is valid
        const DONE = 1 << 0;
        /// Ready to accept new operands
        const READY = 1 << 1;
    }
}

/// Read-only register of width `W`
#[derive(Debug, Clone, Copy)]
pub struct ReadOnly<W> {
    offset: usize,
    _width: PhantomData<W>,
}

impl<W: RegisterWidth> ReadOnly<W> {
    /// Describe a read-only register at `offset`
    pub const fn at(offset: usize) -> Self {
        Self {
            offset,
            _width: PhantomData,
        }
    }

    /// Byte offset from the peripheral base
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Access width
    pub const fn width(&self) -> Width {
        W::WIDTH
    }

    /// Read the register
    pub fn read<B: RegisterBus + ?Sized>(&self, bus: &B) -> W {
        W::read_from(bus, self.offset)
    }
}

/// Write-only register of width `W`
#[derive(Debug, Clone, Copy)]
pub struct WriteOnly<W> {
    offset: usize,
    _width: PhantomData<W>,
}

impl<W: RegisterWidth> WriteOnly<W> {
    /// Describe a write-only register at `offset`
    pub const fn at(offset: usize) -> Self {
        Self {
            offset,
            _width: PhantomData,
        }
    }

    /// Byte offset from the peripheral base
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Access width
    pub const fn width(&self) -> Width {
        W::WIDTH
    }

    /// Write the register
    pub fn write<B: RegisterBus + ?Sized>(&self, bus: &B, value: W) {
        value.write_to(bus, self.offset)
    }
}
