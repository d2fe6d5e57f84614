use core::cell::RefCell;

use critical_section::Mutex;

use crate::{
    tick::Instant,
    timebase::{Timebase, TimebaseConfig},
};

/// Read access to the current time for code running outside of the timer interrupt.
pub trait Clock {
    /// Returns a consistent snapshot of the timebase.
    fn now(&self) -> Instant;
}

impl<C> Clock for &C
where
    C: Clock + ?Sized,
{
    #[inline]
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// [`Timebase`] shared between the timer interrupt and the main loop.
///
/// The counters are wider than what the AVR core reads atomically, so every access happens in a
/// critical section. Entering one saves the interrupt flag and restores it on exit instead of
/// unconditionally re-enabling interrupts, which keeps nested sections correct.
#[derive(Debug)]
pub struct SharedClock(Mutex<RefCell<Timebase>>);

impl SharedClock {
    #[must_use]
    pub const fn new(config: &TimebaseConfig) -> Self {
        Self(Mutex::new(RefCell::new(Timebase::new(config))))
    }

    /// Meant to be called exactly once per timer interrupt.
    ///
    /// Returns the period to program for the next interrupt, if it changes.
    #[inline]
    pub fn on_tick(&self) -> Option<u16> {
        critical_section::with(|cs| self.0.borrow_ref_mut(cs).on_tick())
    }

    /// Puts the timebase back into its power-on state.
    pub fn reset(&self, config: &TimebaseConfig) {
        critical_section::with(|cs| *self.0.borrow_ref_mut(cs) = Timebase::new(config));
    }
}

impl Clock for SharedClock {
    #[inline]
    fn now(&self) -> Instant {
        critical_section::with(|cs| self.0.borrow_ref(cs).now())
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, SharedClock};
    use crate::timebase::TimebaseConfig;

    const SECONDS: TimebaseConfig = TimebaseConfig {
        timer_hz: 125_000,
        base_period: 125,
        cycle_count: 0,
        long_cycles: 0,
        sub_ticks_per_tick: 1000,
        skip_zero: false,
    };

    static CLOCK: SharedClock = SharedClock::new(&SECONDS);

    #[test]
    fn test_shared_clock_snapshot() {
        let clock = SharedClock::new(&SECONDS);
        for _ in 0..2500 {
            clock.on_tick();
        }

        let now = clock.now();
        assert_eq!(now.ticks, 2);
        assert_eq!(now.sub_ticks, 500);
    }

    #[test]
    fn test_nested_reads_compose() {
        critical_section::with(|_| {
            CLOCK.on_tick();
            assert_eq!(CLOCK.now().sub_ticks, 1);
        });

        CLOCK.reset(&SECONDS);
        assert_eq!((&CLOCK).now().sub_ticks, 0);
    }
}
