//! Memory-Mapped I/O abstraction for hardware register access

use core::ptr::{read_volatile, write_volatile};

use super::bus::RegisterBus;

/// Memory-mapped I/O register wrapper
///
/// Every access is a single volatile load or store of `T`, so the compiler
/// never caches, merges, or reorders it against other MMIO accesses.
pub struct Mmio<T> {
    addr: *mut T,
}

impl<T> Mmio<T> {
    /// Create a new MMIO register at the given address
    ///
    /// # Safety
    /// The caller must ensure the address is valid, suitably aligned for `T`,
    /// and points to a hardware register of width `T`.
    pub const unsafe fn new(addr: usize) -> Self {
        Self {
            addr: addr as *mut T,
        }
    }

    /// Read from the register
    pub fn read(&self) -> T
    where
        T: Copy,
    {
        // SAFETY: validity of `addr` was promised by the caller of `new`.
        unsafe { read_volatile(self.addr) }
    }

    /// Write to the register
    pub fn write(&self, value: T) {
        // SAFETY: validity of `addr` was promised by the caller of `new`.
        unsafe { write_volatile(self.addr, value) }
    }
}

/// Register window of a peripheral mapped at a fixed base address
#[derive(Debug)]
pub struct MmioBus {
    base: usize,
}

impl MmioBus {
    /// Create a bus over the register window starting at `base`
    ///
    /// # Safety
    /// Every offset later passed to this bus must land on a mapped device
    /// register (or memory) of the width used for the access, and nothing
    /// else may hold a conflicting handle to the same window.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    fn reg<T>(&self, offset: usize) -> Mmio<T> {
        // SAFETY: covered by the contract of `MmioBus::new`.
        unsafe { Mmio::new(self.base + offset) }
    }
}

impl RegisterBus for MmioBus {
    fn read8(&self, offset: usize) -> u8 {
        self.reg::<u8>(offset).read()
    }

    fn read16(&self, offset: usize) -> u16 {
        self.reg::<u16>(offset).read()
    }

    fn read32(&self, offset: usize) -> u32 {
        self.reg::<u32>(offset).read()
    }

    fn write8(&self, offset: usize, value: u8) {
        self.reg::<u8>(offset).write(value)
    }

    fn write16(&self, offset: usize, value: u16) {
        self.reg::<u16>(offset).write(value)
    }

    fn write32(&self, offset: usize, value: u32) {
        self.reg::<u32>(offset).write(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Backs the bus with plain memory so volatile access can run on the host.
    #[test]
    fn bus_accesses_land_at_base_plus_offset() {
        let mut window = [0u32; 4];
        let bus = unsafe { MmioBus::new(window.as_mut_ptr() as usize) };

        bus.write32(0x4, 0xdead_beef);
        bus.write16(0x8, 0x1234);
        bus.write8(0xc, 0x5a);

        assert_eq!(bus.read32(0x4), 0xdead_beef);
        assert_eq!(bus.read16(0x8), 0x1234);
        assert_eq!(bus.read8(0xc), 0x5a);
        assert_eq!(bus.read32(0x0), 0);

        let window = unsafe { core::ptr::read_volatile(&window) };
        assert_eq!(window[1], 0xdead_beef);
    }
}
