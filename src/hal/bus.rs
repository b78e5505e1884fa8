//! Register bus abstraction
//!
//! A [`RegisterBus`] performs ordered, fixed-width accesses at byte offsets
//! into a peripheral's register window. Real hardware goes through
//! [`MmioBus`](super::mmio::MmioBus); tests go through
//! [`SimulatedAdder`](crate::sim::SimulatedAdder).

/// Access width of a register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Width {
    /// 8-bit access
    W8,
    /// 16-bit access
    W16,
    /// 32-bit access
    W32,
}

impl Width {
    /// Width in bits
    pub const fn bits(self) -> u32 {
        match self {
            Width::W8 => 8,
            Width::W16 => 16,
            Width::W32 => 32,
        }
    }
}

/// Ordered register access at byte offsets from a peripheral base
///
/// Implementations must perform every access exactly once, at the requested
/// width, in program order. There is no error path: a bad offset is a
/// platform fault.
pub trait RegisterBus {
    /// Read an 8-bit register
    fn read8(&self, offset: usize) -> u8;
    /// Read a 16-bit register
    fn read16(&self, offset: usize) -> u16;
    /// Read a 32-bit register
    fn read32(&self, offset: usize) -> u32;
    /// Write an 8-bit register
    fn write8(&self, offset: usize, value: u8);
    /// Write a 16-bit register
    fn write16(&self, offset: usize, value: u16);
    /// Write a 32-bit register
    fn write32(&self, offset: usize, value: u32);
}

impl<B: RegisterBus + ?Sized> RegisterBus for &B {
    fn read8(&self, offset: usize) -> u8 {
        (**self).read8(offset)
    }

    fn read16(&self, offset: usize) -> u16 {
        (**self).read16(offset)
    }

    fn read32(&self, offset: usize) -> u32 {
        (**self).read32(offset)
    }

    fn write8(&self, offset: usize, value: u8) {
        (**self).write8(offset, value)
    }

    fn write16(&self, offset: usize, value: u16) {
        (**self).write16(offset, value)
    }

    fn write32(&self, offset: usize, value: u32) {
        (**self).write32(offset, value)
    }
}

/// Register value type that selects the matching bus access width
pub trait RegisterWidth: Copy {
    /// Width of an access of this type
    const WIDTH: Width;

    /// Read a value of this width from the bus
    fn read_from<B: RegisterBus + ?Sized>(bus: &B, offset: usize) -> Self;

    /// Write a value of this width to the bus
    fn write_to<B: RegisterBus + ?Sized>(self, bus: &B, offset: usize);
}

impl RegisterWidth for u8 {
    const WIDTH: Width = Width::W8;

    fn read_from<B: RegisterBus + ?Sized>(bus: &B, offset: usize) -> Self {
        bus.read8(offset)
    }

    fn write_to<B: RegisterBus + ?Sized>(self, bus: &B, offset: usize) {
        bus.write8(offset, self)
    }
}

impl RegisterWidth for u16 {
    const WIDTH: Width = Width::W16;

    fn read_from<B: RegisterBus + ?Sized>(bus: &B, offset: usize) -> Self {
        bus.read16(offset)
    }

    fn write_to<B: RegisterBus + ?Sized>(self, bus: &B, offset: usize) {
        bus.write16(offset, self)
    }
}

impl RegisterWidth for u32 {
    const WIDTH: Width = Width::W32;

    fn read_from<B: RegisterBus + ?Sized>(bus: &B, offset: usize) -> Self {
        bus.read32(offset)
    }

    fn write_to<B: RegisterBus + ?Sized>(self, bus: &B, offset: usize) {
        bus.write32(offset, self)
    }
}
