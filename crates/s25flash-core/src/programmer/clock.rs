//! Monotonic time source for completion polling

/// Monotonic microsecond clock
///
/// The completion poller captures a baseline before its first status read
/// and compares every later reading against it.
pub trait Clock {
    /// Current time in microseconds since an arbitrary fixed origin
    fn now_us(&self) -> u64;

    /// Microseconds elapsed since `baseline`
    fn elapsed_us(&self, baseline: u64) -> u64 {
        self.now_us().saturating_sub(baseline)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_us(&self) -> u64 {
        (**self).now_us()
    }
}

/// Clock backed by `std::time::Instant`
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdClock {
    /// Create a clock whose origin is now
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for StdClock {
    fn now_us(&self) -> u64 {
        self.origin.elapsed().as_micros() as u64
    }
}
