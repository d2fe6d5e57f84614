use thiserror::Error as ThisError;

use crate::{
    debounce::{DebounceConfig, EdgeReport, TimeScale},
    power::{
        Exerciser, PowerPolicy, PressAction, TimeoutAction, WarningPolicy, WarningPress,
    },
    tick::{HALF_RANGE, Tick},
    timebase::TimebaseConfig,
};

/// 8 MHz system clock divided by the timer prescaler of 64.
pub const TIMER_HZ: u32 = 125_000;

/// Timer counts per 1 ms interrupt at [`TIMER_HZ`].
pub const MILLIS_PERIOD: u16 = 125;

/// Number of pins on the port the board uses.
pub const PORT_WIDTH: u8 = 8;

const TENTHS_PER_MINUTE: Tick = 600;
const SECONDS_PER_HOUR: Tick = 3600;

/// Bit index of a pin on the board's I/O port.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PinId(pub u8);

impl PinId {
    #[inline]
    #[must_use]
    pub const fn mask(self) -> u8 {
        1 << self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::IntoStaticStr)]
pub enum Role {
    Button,
    Power,
    Warning,
    Load,
}

/// Assignment of pins to roles. Unused roles are `None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PinMap {
    pub button: Option<PinId>,
    pub power: PinId,
    pub warning: Option<PinId>,
    pub load: Option<PinId>,
}

impl PinMap {
    /// The revision B boards swap the power output with the board's other output.
    #[must_use]
    pub const fn swapped(self) -> Self {
        match (self.warning, self.load) {
            (Some(warning), _) => Self {
                power: warning,
                warning: Some(self.power),
                ..self
            },
            (None, Some(load)) => Self {
                power: load,
                load: Some(self.power),
                ..self
            },
            (None, None) => self,
        }
    }

    /// Output roles with a pin assigned.
    pub fn outputs(&self) -> impl Iterator<Item = (Role, PinId)> {
        [
            Some((Role::Power, self.power)),
            self.warning.map(|pin| (Role::Warning, pin)),
            self.load.map(|pin| (Role::Load, pin)),
        ]
        .into_iter()
        .flatten()
    }

    const fn validate(&self) -> Result<(), PolicyError> {
        let pins = [self.button, Some(self.power), self.warning, self.load];

        let mut i = 0;
        while i < pins.len() {
            if let Some(pin) = pins[i] {
                if pin.0 >= PORT_WIDTH {
                    return Err(PolicyError::PinOutOfRange(pin.0));
                }

                let mut j = i + 1;
                while j < pins.len() {
                    if let Some(other) = pins[j] {
                        if other.0 == pin.0 {
                            return Err(PolicyError::PinConflict(pin.0));
                        }
                    }
                    j += 1;
                }
            }
            i += 1;
        }

        Ok(())
    }
}

/// Everything that differs between the boards, fixed at build time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Policy {
    pub timebase: TimebaseConfig,
    /// `None` for boards without a button.
    pub debounce: Option<DebounceConfig>,
    pub power: PowerPolicy,
    pub pins: PinMap,
}

impl Policy {
    /// Checks the policy for combinations the controller cannot honor.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub const fn validate(&self) -> Result<(), PolicyError> {
        let timebase = &self.timebase;
        if timebase.base_period == 0 {
            return Err(PolicyError::ZeroBasePeriod);
        }
        if timebase.sub_ticks_per_tick == 0 {
            return Err(PolicyError::ZeroSubTicks);
        }
        if timebase.long_cycles > timebase.cycle_count {
            return Err(PolicyError::LongCyclesBeyondCycle {
                long_cycles: timebase.long_cycles,
                cycle_count: timebase.cycle_count,
            });
        }

        if let Some(debounce) = &self.debounce {
            if matches!(debounce.scale, TimeScale::SubTicks)
                && debounce.window >= timebase.sub_ticks_per_tick
            {
                return Err(PolicyError::WindowBeyondRing {
                    window: debounce.window,
                    ring: timebase.sub_ticks_per_tick,
                });
            }
            if self.pins.button.is_none() {
                return Err(PolicyError::MissingPin(Role::Button));
            }
        } else if !self.power.start_on_boot {
            return Err(PolicyError::Unreachable);
        }

        let power = &self.power;
        if power.power_off == 0 {
            return Err(PolicyError::ZeroTimeout);
        }
        if power.power_off > HALF_RANGE {
            return Err(PolicyError::TimeoutBeyondHalfRange(power.power_off));
        }

        if let Some(warning) = &power.warning {
            if warning.lead >= power.power_off {
                return Err(PolicyError::WarningAfterTimeout {
                    lead: warning.lead,
                    power_off: power.power_off,
                });
            }
            if self.pins.warning.is_none() {
                return Err(PolicyError::MissingPin(Role::Warning));
            }
        }

        if let Some(exerciser) = &power.exerciser {
            if exerciser.period == 0 {
                return Err(PolicyError::ZeroExerciserPeriod);
            }
            if exerciser.active > exerciser.period {
                return Err(PolicyError::ExerciserActiveBeyondPeriod {
                    active: exerciser.active,
                    period: exerciser.period,
                });
            }
            if self.pins.load.is_none() {
                return Err(PolicyError::MissingPin(Role::Load));
            }
        }

        self.pins.validate()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
pub enum PolicyError {
    #[error("timer base period must be at least one count")]
    ZeroBasePeriod,
    #[error("a tick must span at least one interrupt")]
    ZeroSubTicks,
    #[error("{long_cycles} long cycles do not fit in a correction cycle of {cycle_count}")]
    LongCyclesBeyondCycle { long_cycles: u16, cycle_count: u16 },
    #[error("debounce window of {window} does not fit in a sub-tick ring of {ring}")]
    WindowBeyondRing { window: u16, ring: u16 },
    #[error("sessions can be started neither by a button nor at boot")]
    Unreachable,
    #[error("power off time must be at least one tick")]
    ZeroTimeout,
    #[error("power off time of {0} ticks exceeds half of the tick counter range")]
    TimeoutBeyondHalfRange(Tick),
    #[error("warning at {lead} ticks does not come before power off at {power_off} ticks")]
    WarningAfterTimeout { lead: Tick, power_off: Tick },
    #[error("exerciser period must be at least one tick")]
    ZeroExerciserPeriod,
    #[error("exerciser active time of {active} ticks exceeds its period of {period} ticks")]
    ExerciserActiveBeyondPeriod { active: Tick, period: Tick },
    #[error("no pin assigned to the {0:?} role")]
    MissingPin(Role),
    #[error("pin {0} is assigned to more than one role")]
    PinConflict(u8),
    #[error("pin {0} does not exist on the port")]
    PinOutOfRange(u8),
}

/// Physical board layout. Revision B swaps the two output pins.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(test, derive(strum::EnumIter))]
pub enum BoardRevision {
    #[default]
    A,
    B,
}

/// The firmware images built from this workspace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::IntoStaticStr)]
#[cfg_attr(test, derive(strum::EnumIter))]
pub enum Variant {
    /// Switches AC power for 30 minutes, with a warning light for the last 5. A press during the
    /// warning keeps the power on and starts the 30 minutes over.
    AcTimer,
    /// Keeps a flow sensor's load busy for 6 hours after every press, running it for 60 seconds
    /// out of every 223.
    Intellitimer,
    /// Gates its own supply: runs the load 120 seconds out of every 223 for 6 hours after power
    /// up, then cuts the supply.
    IntellitimerV2,
}

impl Variant {
    #[must_use]
    pub const fn policy(self, revision: BoardRevision) -> Policy {
        let policy = match self {
            Self::AcTimer => AC_TIMER,
            Self::Intellitimer => INTELLITIMER,
            Self::IntellitimerV2 => INTELLITIMER_V2,
        };

        match revision {
            BoardRevision::A => policy,
            BoardRevision::B => Policy {
                pins: policy.pins.swapped(),
                ..policy
            },
        }
    }
}

const AC_TIMER: Policy = Policy {
    // 100 ms ticks. Zero is reserved so a zero timestamp can never be a real one.
    timebase: TimebaseConfig {
        timer_hz: TIMER_HZ,
        base_period: MILLIS_PERIOD,
        cycle_count: 0,
        long_cycles: 0,
        sub_ticks_per_tick: 100,
        skip_zero: true,
    },
    debounce: Some(DebounceConfig {
        window: 1,
        scale: TimeScale::Ticks,
        report: EdgeReport::PressOnly,
    }),
    power: PowerPolicy {
        press: PressAction::Toggle,
        warning: Some(WarningPolicy {
            lead: 25 * TENTHS_PER_MINUTE,
            on_press: WarningPress::ResetTimer,
        }),
        power_off: 30 * TENTHS_PER_MINUTE,
        on_timeout: TimeoutAction::PowerOff,
        exerciser: None,
        start_on_boot: false,
    },
    pins: PinMap {
        button: Some(PinId(1)),
        power: PinId(0),
        warning: Some(PinId(2)),
        load: None,
    },
};

const INTELLITIMER: Policy = Policy {
    // 1 s ticks, debounced on the millisecond ring.
    timebase: TimebaseConfig {
        timer_hz: TIMER_HZ,
        base_period: MILLIS_PERIOD,
        cycle_count: 0,
        long_cycles: 0,
        sub_ticks_per_tick: 1000,
        skip_zero: false,
    },
    debounce: Some(DebounceConfig {
        window: 50,
        scale: TimeScale::SubTicks,
        report: EdgeReport::PressOnly,
    }),
    power: PowerPolicy {
        press: PressAction::Restart,
        warning: None,
        power_off: 6 * SECONDS_PER_HOUR,
        on_timeout: TimeoutAction::PowerOff,
        exerciser: Some(Exerciser {
            period: 223,
            active: 60,
        }),
        start_on_boot: false,
    },
    pins: PinMap {
        button: Some(PinId(0)),
        power: PinId(1),
        warning: None,
        load: Some(PinId(2)),
    },
};

const INTELLITIMER_V2: Policy = Policy {
    timebase: TimebaseConfig {
        timer_hz: TIMER_HZ,
        base_period: MILLIS_PERIOD,
        cycle_count: 0,
        long_cycles: 0,
        sub_ticks_per_tick: 1000,
        skip_zero: false,
    },
    debounce: None,
    power: PowerPolicy {
        press: PressAction::Restart,
        warning: None,
        power_off: 6 * SECONDS_PER_HOUR,
        on_timeout: TimeoutAction::Shutdown,
        exerciser: Some(Exerciser {
            period: 223,
            active: 120,
        }),
        start_on_boot: true,
    },
    pins: PinMap {
        button: None,
        power: PinId(1),
        warning: None,
        load: Some(PinId(2)),
    },
};
