/// Value of the free running tick counter.
///
/// The counter wraps silently, so durations must always be computed with [`elapsed`].
pub type Tick = u16;

/// Longest duration, in ticks, that [`elapsed`] can measure unambiguously.
pub const HALF_RANGE: Tick = Tick::MAX / 2;

/// A consistent snapshot of the timebase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Instant {
    /// Whole ticks since boot, modulo the counter width.
    pub ticks: Tick,
    /// Interrupts since the last tick carry, always below the configured sub-ticks per tick.
    pub sub_ticks: u16,
}

impl Instant {
    #[must_use]
    pub const fn new(ticks: Tick, sub_ticks: u16) -> Self {
        Self { ticks, sub_ticks }
    }
}

/// Wraparound safe duration between two tick values.
#[inline]
#[must_use]
pub const fn elapsed(later: Tick, earlier: Tick) -> Tick {
    later.wrapping_sub(earlier)
}

/// Duration between two positions of a ring counter that resets to `0` at `modulus`.
///
/// A negative delta means the ring rolled over in between, so the modulus gets added back.
#[inline]
#[must_use]
pub const fn ring_elapsed(later: u16, earlier: u16, modulus: u16) -> u16 {
    if later >= earlier {
        later - earlier
    } else {
        later.wrapping_add(modulus.wrapping_sub(earlier))
    }
}
