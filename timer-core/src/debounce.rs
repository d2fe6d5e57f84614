use crate::{
    tick::{Instant, elapsed, ring_elapsed},
    timebase::TimebaseConfig,
};

/// Which part of the timebase the debounce window is measured in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeScale {
    /// Whole ticks, compared with wrapping subtraction.
    Ticks,
    /// Interrupts on the sub-tick ring, which resets every tick.
    SubTicks,
}

/// Which confirmed level changes get reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(test, derive(strum::EnumIter))]
pub enum EdgeReport {
    /// Only the transition to pressed.
    PressOnly,
    /// Both presses and releases.
    AnyChange,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DebounceConfig {
    /// Minimum time a new level has to hold before it is confirmed.
    pub window: u16,
    pub scale: TimeScale,
    pub report: EdgeReport,
}

/// A confirmed change of the logical button level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::IntoStaticStr)]
pub enum Edge {
    Pressed,
    Released,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DebounceState {
    /// The level has been confirmed and nothing else has been seen since.
    Stable(bool),
    /// A different level was first seen at `since` and has held on every sample after.
    Candidate { level: bool, since: u16 },
}

/// Button debouncer sampled once per main loop iteration.
#[derive(Clone, Copy, Debug)]
pub struct Debouncer {
    config: DebounceConfig,
    /// Sub-tick ring modulus.
    ring: u16,
    state: DebounceState,
}

impl Debouncer {
    /// Sub-tick stamps are measured on the ring of the given timebase.
    #[must_use]
    pub const fn new(config: DebounceConfig, timebase: &TimebaseConfig) -> Self {
        Self {
            config,
            ring: timebase.sub_ticks_per_tick,
            state: DebounceState::Stable(false),
        }
    }

    /// Last confirmed level.
    #[must_use]
    pub fn level(&self) -> bool {
        match self.state {
            DebounceState::Stable(level) => level,
            DebounceState::Candidate { level, .. } => !level,
        }
    }

    /// Whether a new level is waiting for its window to elapse.
    #[must_use]
    pub fn is_debouncing(&self) -> bool {
        matches!(self.state, DebounceState::Candidate { .. })
    }

    /// Feeds one raw sample, returning an edge once a new level held for the whole window.
    pub fn update(&mut self, raw: bool, now: Instant) -> Option<Edge> {
        let stamp = match self.config.scale {
            TimeScale::Ticks => now.ticks,
            TimeScale::SubTicks => now.sub_ticks,
        };

        match self.state {
            DebounceState::Stable(level) if raw != level => {
                self.state = DebounceState::Candidate {
                    level: raw,
                    since: stamp,
                };
                None
            }
            DebounceState::Stable(_) => None,
            // Flicker back to the confirmed level abandons the attempt.
            DebounceState::Candidate { level, .. } if raw != level => {
                self.state = DebounceState::Stable(raw);
                None
            }
            DebounceState::Candidate { level, since } => {
                if !self.window_elapsed(stamp, since) {
                    return None;
                }

                self.state = DebounceState::Stable(level);
                match (level, self.config.report) {
                    (true, _) => Some(Edge::Pressed),
                    (false, EdgeReport::AnyChange) => Some(Edge::Released),
                    (false, EdgeReport::PressOnly) => None,
                }
            }
        }
    }

    /// A tick stamp only says in which tick a level was first seen, up to one tick after it
    /// started, so whole ticks need one more tick to be sure the window was covered.
    fn window_elapsed(&self, stamp: u16, since: u16) -> bool {
        match self.config.scale {
            TimeScale::Ticks => elapsed(stamp, since) > self.config.window,
            TimeScale::SubTicks => ring_elapsed(stamp, since, self.ring) >= self.config.window,
        }
    }
}
