//! Timers
//!
//! Provides the monotonic clock used to bound register polls

use super::mmio::Mmio;

/// Free-running counter lower 32 bits
const COUNTER_LO: usize = 0x04;
/// Free-running counter upper 32 bits
const COUNTER_HI: usize = 0x08;

/// Monotonic microsecond clock
pub trait Timer {
    /// Current time in microseconds since an arbitrary epoch
    fn now_us(&self) -> u64;

    /// Delay for the specified number of microseconds
    fn delay_us(&self, us: u32) {
        let start = self.now_us();
        while self.now_us().wrapping_sub(start) < u64::from(us) {
            core::hint::spin_loop();
        }
    }

    /// Check if `timeout_us` has elapsed since `start_us`
    fn is_timeout(&self, start_us: u64, timeout_us: u32) -> bool {
        self.now_us().wrapping_sub(start_us) >= u64::from(timeout_us)
    }
}

impl<T: Timer + ?Sized> Timer for &T {
    fn now_us(&self) -> u64 {
        (**self).now_us()
    }
}

/// 64-bit free-running microsecond counter exposed as two 32-bit registers
pub struct CounterTimer {
    base: usize,
}

impl CounterTimer {
    /// Create a timer over the counter block at `base`
    ///
    /// # Safety
    /// `base + 0x04` and `base + 0x08` must be the low and high halves of a
    /// free-running 1 MHz counter.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }
}

impl Timer for CounterTimer {
    fn now_us(&self) -> u64 {
        // SAFETY: covered by the contract of `CounterTimer::new`.
        let clo_reg = unsafe { Mmio::<u32>::new(self.base + COUNTER_LO) };
        let chi_reg = unsafe { Mmio::<u32>::new(self.base + COUNTER_HI) };

        // Read high, then low, then high again to handle carry
        let high1 = chi_reg.read();
        let low = clo_reg.read();
        let high2 = chi_reg.read();

        let (high, low) = if high1 == high2 {
            (high1, low)
        } else {
            (high2, clo_reg.read())
        };

        (u64::from(high) << 32) | u64::from(low)
    }
}

/// Host clock backed by `std::time::Instant`
#[cfg(feature = "std")]
pub struct StdTimer {
    epoch: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdTimer {
    /// Create a timer whose epoch is now
    pub fn new() -> Self {
        Self {
            epoch: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for StdTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Timer for StdTimer {
    fn now_us(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_micros()).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    struct StepClock(Cell<u64>);

    impl Timer for StepClock {
        fn now_us(&self) -> u64 {
            let now = self.0.get();
            self.0.set(now + 10);
            now
        }
    }

    #[test]
    fn counter_timer_combines_halves() {
        let mut block = [0u32; 3];
        block[1] = 0x0000_0010;
        block[2] = 0x0000_0002;
        let timer = unsafe { CounterTimer::new(block.as_mut_ptr() as usize) };
        assert_eq!(timer.now_us(), 0x0000_0002_0000_0010);
    }

    #[test]
    fn delay_and_timeout_follow_the_clock() {
        let clock = StepClock(Cell::new(0));
        let start = clock.now_us();
        assert!(!clock.is_timeout(start, 100));
        clock.delay_us(100);
        assert!(clock.is_timeout(start, 100));
    }
}
