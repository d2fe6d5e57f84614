use crate::tick::{Instant, Tick};

/// Static description of the periodic timer interrupt and of how interrupts get turned into
/// ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimebaseConfig {
    /// Frequency of the timer input clock, after the prescaler.
    pub timer_hz: u32,
    /// Timer input counts per interrupt (`BASE`).
    pub base_period: u16,
    /// Length of the fractional correction cycle. `0` disables the correction.
    pub cycle_count: u16,
    /// Number of positions at the start of each cycle that use `BASE + 1`.
    pub long_cycles: u16,
    /// Interrupts per tick. The sub-tick counter ripples into the tick counter.
    pub sub_ticks_per_tick: u16,
    /// Reserve `0` as "no timestamp" by never letting the tick counter hold it.
    pub skip_zero: bool,
}

impl TimebaseConfig {
    /// Interrupt period at a given correction cycle position, in timer input counts.
    #[must_use]
    pub const fn period_at(&self, position: u16) -> u16 {
        if position < self.long_cycles {
            self.base_period + 1
        } else {
            self.base_period
        }
    }

    /// Period to program before interrupts get enabled. This is cycle position `0`.
    #[must_use]
    pub const fn first_period(&self) -> u16 {
        if self.cycle_count > 0 {
            self.period_at(0)
        } else {
            self.base_period
        }
    }

    #[must_use]
    pub const fn is_corrected(&self) -> bool {
        self.cycle_count > 0
    }
}

/// Alternates between `BASE + 1` and `BASE` so that the average interrupt period matches a
/// non-integer number of timer counts.
///
/// Over any `cycle_count` consecutive periods, the timer counts add up to
/// exactly `cycle_count * BASE + long_cycles`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FractionalCorrector {
    config: TimebaseConfig,
    position: u16,
}

impl FractionalCorrector {
    /// Returns `None` when the configuration does not ask for correction.
    #[must_use]
    pub const fn new(config: TimebaseConfig) -> Option<Self> {
        if config.is_corrected() {
            Some(Self {
                config,
                position: 0,
            })
        } else {
            None
        }
    }

    /// Moves to the next cycle position and returns the period the timer must use for it.
    #[inline]
    pub fn advance(&mut self) -> u16 {
        self.position += 1;
        if self.position == self.config.cycle_count {
            self.position = 0;
        }
        self.config.period_at(self.position)
    }
}

/// Interrupt driven time keeping.
///
/// [`Timebase::on_tick`] runs once per timer interrupt. The sub-tick counter is a ripple carry
/// counter so the interrupt path never divides.
#[derive(Clone, Copy, Debug)]
pub struct Timebase {
    ticks: Tick,
    sub_ticks: u16,
    sub_ticks_per_tick: u16,
    skip_zero: bool,
    corrector: Option<FractionalCorrector>,
}

impl Timebase {
    #[must_use]
    pub const fn new(config: &TimebaseConfig) -> Self {
        Self {
            ticks: if config.skip_zero { 1 } else { 0 },
            sub_ticks: 0,
            sub_ticks_per_tick: config.sub_ticks_per_tick,
            skip_zero: config.skip_zero,
            corrector: FractionalCorrector::new(*config),
        }
    }

    /// Accounts for one timer interrupt.
    ///
    /// Returns the period to program for the next interrupt when fractional correction is
    /// configured, `None` when the current period stays.
    #[inline]
    pub fn on_tick(&mut self) -> Option<u16> {
        self.sub_ticks += 1;
        if self.sub_ticks >= self.sub_ticks_per_tick {
            self.sub_ticks = 0;
            self.ticks = self.ticks.wrapping_add(1);
            if self.skip_zero && self.ticks == 0 {
                self.ticks = 1;
            }
        }

        self.corrector.as_mut().map(FractionalCorrector::advance)
    }

    #[inline]
    #[must_use]
    pub fn now(&self) -> Instant {
        Instant::new(self.ticks, self.sub_ticks)
    }
}

#[cfg(test)]
mod tests {
    use super::{Timebase, TimebaseConfig};

    const MILLIS: TimebaseConfig = TimebaseConfig {
        timer_hz: 125_000,
        base_period: 125,
        cycle_count: 0,
        long_cycles: 0,
        sub_ticks_per_tick: 1000,
        skip_zero: false,
    };

    /// A 15.625 kHz timer input and a 16 Hz interrupt need 976.5625 counts per interrupt,
    /// i.e. 9 long periods of 977 out of every 16.
    const CORRECTED: TimebaseConfig = TimebaseConfig {
        timer_hz: 15_625,
        base_period: 976,
        cycle_count: 16,
        long_cycles: 9,
        sub_ticks_per_tick: 1,
        skip_zero: false,
    };

    #[test]
    fn test_fractional_correction_is_exact() {
        let mut timebase = Timebase::new(&CORRECTED);
        let expected = u32::from(CORRECTED.cycle_count) * u32::from(CORRECTED.base_period)
            + u32::from(CORRECTED.long_cycles);

        let mut period = CORRECTED.first_period();
        for _ in 0..50 {
            let mut sum = 0;
            for _ in 0..CORRECTED.cycle_count {
                sum += u32::from(period);
                period = timebase.on_tick().unwrap();
            }
            assert_eq!(sum, expected);
        }
    }

    #[test]
    fn test_any_window_of_a_cycle_is_exact() {
        let mut timebase = Timebase::new(&CORRECTED);
        let mut periods = std::vec![u32::from(CORRECTED.first_period())];
        for _ in 0..100 {
            periods.push(u32::from(timebase.on_tick().unwrap()));
        }

        let expected = 16 * 976 + 9;
        for window in periods.windows(usize::from(CORRECTED.cycle_count)) {
            assert_eq!(window.iter().sum::<u32>(), expected);
        }
    }

    #[test]
    fn test_long_periods_lead_the_cycle() {
        let mut timebase = Timebase::new(&CORRECTED);
        let mut periods = std::vec![CORRECTED.first_period()];
        for _ in 1..CORRECTED.cycle_count {
            periods.push(timebase.on_tick().unwrap());
        }

        let long = usize::from(CORRECTED.long_cycles);
        assert!(periods[..long].iter().all(|p| *p == 977));
        assert!(periods[long..].iter().all(|p| *p == 976));
    }

    #[test]
    fn test_uncorrected_keeps_period() {
        let mut timebase = Timebase::new(&MILLIS);
        assert_eq!(MILLIS.first_period(), 125);
        assert_eq!(timebase.on_tick(), None);
    }

    #[test]
    fn test_sub_ticks_ripple_into_ticks() {
        let mut timebase = Timebase::new(&MILLIS);
        for _ in 0..999 {
            timebase.on_tick();
        }
        assert_eq!(timebase.now().ticks, 0);
        assert_eq!(timebase.now().sub_ticks, 999);

        timebase.on_tick();
        assert_eq!(timebase.now().ticks, 1);
        assert_eq!(timebase.now().sub_ticks, 0);
    }

    #[test]
    fn test_plain_counter_wraps_through_zero() {
        let config = TimebaseConfig {
            sub_ticks_per_tick: 1,
            ..MILLIS
        };
        let mut timebase = Timebase::new(&config);
        for _ in 0..=u16::MAX {
            timebase.on_tick();
        }
        assert_eq!(timebase.now().ticks, 0);
    }

    #[test]
    fn test_sentinel_counter_never_zero() {
        let config = TimebaseConfig {
            sub_ticks_per_tick: 1,
            skip_zero: true,
            ..MILLIS
        };
        let mut timebase = Timebase::new(&config);
        assert_eq!(timebase.now().ticks, 1);

        for _ in 0..3 * u32::from(u16::MAX) {
            timebase.on_tick();
            assert_ne!(timebase.now().ticks, 0);
        }
    }

    #[test]
    fn test_sentinel_counter_skips_straight_to_one() {
        let config = TimebaseConfig {
            sub_ticks_per_tick: 1,
            skip_zero: true,
            ..MILLIS
        };
        let mut timebase = Timebase::new(&config);
        // Starts at 1, so u16::MAX - 1 increments land on u16::MAX.
        for _ in 0..u16::MAX - 1 {
            timebase.on_tick();
        }
        assert_eq!(timebase.now().ticks, u16::MAX);

        timebase.on_tick();
        assert_eq!(timebase.now().ticks, 1);
    }
}
