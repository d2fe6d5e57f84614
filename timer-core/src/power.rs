use crate::tick::{Tick, elapsed};

/// What a confirmed press does while the power is on and no warning is showing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PressAction {
    /// Turn everything off.
    Toggle,
    /// Start the on-period over.
    Restart,
}

/// What a confirmed press does while the warning is showing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(test, derive(strum::EnumIter))]
pub enum WarningPress {
    /// Clear the warning and start the on-period over, keeping the power on.
    ResetTimer,
    /// Turn everything off.
    PowerOff,
}

/// What happens once the on-period has run out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeoutAction {
    /// Back to [`PowerState::Off`], ready for the next press.
    PowerOff,
    /// Enter [`PowerState::Shutdown`] for good. Used when the outputs gate the controller's own
    /// supply, so nothing can happen afterwards anyway.
    Shutdown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WarningPolicy {
    /// Elapsed ticks after which the warning light turns on.
    pub lead: Tick,
    pub on_press: WarningPress,
}

/// Periodically runs the auxiliary load to keep an attached device busy.
///
/// The period is deliberately not a round number so it does not line up with the device's own
/// cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Exerciser {
    pub period: Tick,
    /// Ticks at the start of every period during which the load is on.
    pub active: Tick,
}

impl Exerciser {
    /// A zero period never runs the load.
    #[inline]
    #[must_use]
    pub const fn should_be_on(&self, elapsed: Tick) -> bool {
        match elapsed.checked_rem(self.period) {
            Some(offset) => offset < self.active,
            None => false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PowerPolicy {
    pub press: PressAction,
    /// `None` for boards without a warning light.
    pub warning: Option<WarningPolicy>,
    /// Length of the on-period, in ticks.
    pub power_off: Tick,
    pub on_timeout: TimeoutAction,
    /// `None` for boards without an auxiliary load.
    pub exerciser: Option<Exerciser>,
    /// Boards without a button start the on-period as soon as they boot.
    pub start_on_boot: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::IntoStaticStr)]
pub enum PowerState {
    Off,
    On,
    Warning,
    /// Terminal. No transition leaves this state.
    Shutdown,
}

/// Logical levels of the output roles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Outputs {
    pub power: bool,
    pub warning: bool,
    pub load: bool,
}

impl Outputs {
    pub const OFF: Self = Self {
        power: false,
        warning: false,
        load: false,
    };
}

/// Observable changes made by the [`PowerStateMachine`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::IntoStaticStr)]
pub enum Transition {
    PoweredOn,
    PoweredOff,
    /// A press started the on-period over without turning the power off.
    Restarted,
    WarningRaised,
    TimedOut,
    ShutDown,
    LoadSwitched(bool),
}

/// Owns the output levels and decides them from confirmed presses and elapsed time.
#[derive(Clone, Copy, Debug)]
pub struct PowerStateMachine {
    policy: PowerPolicy,
    state: PowerState,
    /// Tick at which the current on-period started.
    reference: Tick,
    outputs: Outputs,
}

impl PowerStateMachine {
    #[must_use]
    pub const fn new(policy: PowerPolicy) -> Self {
        Self {
            policy,
            state: PowerState::Off,
            reference: 0,
            outputs: Outputs::OFF,
        }
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> PowerState {
        self.state
    }

    #[inline]
    #[must_use]
    pub fn outputs(&self) -> Outputs {
        self.outputs
    }

    /// Ticks since the on-period started, if there is one.
    #[must_use]
    pub fn elapsed(&self, now: Tick) -> Option<Tick> {
        matches!(self.state, PowerState::On | PowerState::Warning)
            .then(|| elapsed(now, self.reference))
    }

    /// Starts the on-period right away on boards that have no button.
    pub fn boot(&mut self, now: Tick) -> Option<Transition> {
        (self.policy.start_on_boot && self.state == PowerState::Off).then(|| self.start(now))
    }

    /// Handles a confirmed button press.
    pub fn press(&mut self, now: Tick) -> Option<Transition> {
        let transition = match self.state {
            PowerState::Off => self.start(now),
            PowerState::On => match self.policy.press {
                PressAction::Toggle => self.stop(PowerState::Off, Transition::PoweredOff),
                PressAction::Restart => self.restart(now),
            },
            PowerState::Warning => match self.policy.warning.map(|w| w.on_press) {
                Some(WarningPress::ResetTimer) | None => self.restart(now),
                Some(WarningPress::PowerOff) => {
                    self.stop(PowerState::Off, Transition::PoweredOff)
                }
            },
            PowerState::Shutdown => return None,
        };

        Some(transition)
    }

    /// Re-evaluates the time based transitions. Meant to run on every main loop iteration
    /// without a press.
    pub fn update(&mut self, now: Tick) -> Option<Transition> {
        let elapsed = self.elapsed(now)?;

        if elapsed >= self.policy.power_off {
            return Some(match self.policy.on_timeout {
                TimeoutAction::PowerOff => self.stop(PowerState::Off, Transition::TimedOut),
                TimeoutAction::Shutdown => self.stop(PowerState::Shutdown, Transition::ShutDown),
            });
        }

        if let Some(warning) = self.policy.warning {
            if self.state == PowerState::On && elapsed >= warning.lead {
                self.state = PowerState::Warning;
                self.outputs.warning = true;
                return Some(Transition::WarningRaised);
            }
        }

        // Only act when the computed level differs, so the pin is written on actual changes.
        let should_be_on = self.load_at(elapsed);
        if should_be_on != self.outputs.load {
            self.outputs.load = should_be_on;
            return Some(Transition::LoadSwitched(should_be_on));
        }

        None
    }

    fn load_at(&self, elapsed: Tick) -> bool {
        self.policy
            .exerciser
            .is_some_and(|exerciser| exerciser.should_be_on(elapsed))
    }

    fn start(&mut self, now: Tick) -> Transition {
        self.outputs.power = true;
        self.begin_period(now);
        Transition::PoweredOn
    }

    fn restart(&mut self, now: Tick) -> Transition {
        self.begin_period(now);
        Transition::Restarted
    }

    fn begin_period(&mut self, now: Tick) {
        self.state = PowerState::On;
        self.reference = now;
        self.outputs.warning = false;
        self.outputs.load = self.load_at(0);
    }

    fn stop(&mut self, next: PowerState, transition: Transition) -> Transition {
        self.state = next;
        self.outputs = Outputs::OFF;
        transition
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::{
        Exerciser, Outputs, PowerPolicy, PowerState, PowerStateMachine, PressAction,
        TimeoutAction, Transition, WarningPolicy, WarningPress,
    };
    use crate::tick::Tick;

    /// 100 ms ticks.
    const MINUTE: Tick = 600;

    const AC_TIMER: PowerPolicy = PowerPolicy {
        press: PressAction::Toggle,
        warning: Some(WarningPolicy {
            lead: 25 * MINUTE,
            on_press: WarningPress::ResetTimer,
        }),
        power_off: 30 * MINUTE,
        on_timeout: TimeoutAction::PowerOff,
        exerciser: None,
        start_on_boot: false,
    };

    const EXERCISER: PowerPolicy = PowerPolicy {
        press: PressAction::Restart,
        warning: None,
        power_off: 6 * 3600,
        on_timeout: TimeoutAction::Shutdown,
        exerciser: Some(Exerciser {
            period: 223,
            active: 120,
        }),
        start_on_boot: true,
    };

    /// Runs `update` on every tick in `from..to`, collecting transitions.
    fn advance(
        machine: &mut PowerStateMachine,
        from: Tick,
        to: Tick,
    ) -> std::vec::Vec<(Tick, Transition)> {
        (from..to)
            .filter_map(|now| machine.update(now).map(|t| (now, t)))
            .collect()
    }

    #[test]
    fn test_ac_timer_scenario() {
        let mut machine = PowerStateMachine::new(AC_TIMER);
        assert_eq!(machine.update(10), None);

        assert_eq!(machine.press(100), Some(Transition::PoweredOn));
        assert_eq!(machine.state(), PowerState::On);
        assert!(machine.outputs().power);

        let transitions = advance(&mut machine, 100, 100 + 26 * MINUTE);
        assert_eq!(transitions, [(100 + 25 * MINUTE, Transition::WarningRaised)]);
        assert_eq!(machine.state(), PowerState::Warning);
        assert!(machine.outputs().power && machine.outputs().warning);

        let reset = 100 + 26 * MINUTE;
        assert_eq!(machine.press(reset), Some(Transition::Restarted));
        assert_eq!(machine.state(), PowerState::On);
        assert!(!machine.outputs().warning);
        assert_eq!(machine.elapsed(reset), Some(0));

        let transitions = advance(&mut machine, reset, reset + 31 * MINUTE);
        assert_eq!(
            transitions,
            [
                (reset + 25 * MINUTE, Transition::WarningRaised),
                (reset + 30 * MINUTE, Transition::TimedOut),
            ]
        );
        assert_eq!(machine.state(), PowerState::Off);
        assert_eq!(machine.outputs(), Outputs::OFF);
    }

    #[test]
    fn test_toggle_press_turns_off() {
        let mut machine = PowerStateMachine::new(AC_TIMER);
        machine.press(1);
        assert_eq!(machine.press(50), Some(Transition::PoweredOff));
        assert_eq!(machine.state(), PowerState::Off);
        assert_eq!(machine.outputs(), Outputs::OFF);
        assert_eq!(machine.elapsed(60), None);
    }

    #[test]
    fn test_warning_press_policies() {
        for on_press in WarningPress::iter() {
            let mut machine = PowerStateMachine::new(PowerPolicy {
                warning: Some(WarningPolicy {
                    lead: 25 * MINUTE,
                    on_press,
                }),
                ..AC_TIMER
            });
            machine.press(1);
            machine.update(1 + 25 * MINUTE);
            assert_eq!(machine.state(), PowerState::Warning);

            let (transition, state) = match on_press {
                WarningPress::ResetTimer => (Transition::Restarted, PowerState::On),
                WarningPress::PowerOff => (Transition::PoweredOff, PowerState::Off),
            };
            assert_eq!(machine.press(2 + 25 * MINUTE), Some(transition));
            assert_eq!(machine.state(), state);
            assert!(!machine.outputs().warning);
        }
    }

    #[test]
    fn test_timeout_across_counter_wraparound() {
        let mut machine = PowerStateMachine::new(AC_TIMER);
        let start = Tick::MAX - 100;
        machine.press(start);

        let off_at = start.wrapping_add(30 * MINUTE);
        assert_eq!(machine.update(off_at.wrapping_sub(1)), Some(Transition::WarningRaised));
        assert_eq!(machine.update(off_at), Some(Transition::TimedOut));
    }

    #[test]
    fn test_restart_press_keeps_power_on() {
        let mut machine = PowerStateMachine::new(PowerPolicy {
            start_on_boot: false,
            on_timeout: TimeoutAction::PowerOff,
            exerciser: Some(Exerciser {
                period: 223,
                active: 60,
            }),
            ..EXERCISER
        });
        assert_eq!(machine.press(0), Some(Transition::PoweredOn));
        assert!(machine.outputs().load);

        machine.update(100);
        assert!(!machine.outputs().load);

        assert_eq!(machine.press(100), Some(Transition::Restarted));
        assert!(machine.outputs().power && machine.outputs().load);
        assert_eq!(machine.elapsed(100 + 6 * 3600 - 1), Some(6 * 3600 - 1));
        assert_eq!(machine.update(100 + 6 * 3600), Some(Transition::TimedOut));
    }

    #[test]
    fn test_exerciser_switches_on_boundaries_only() {
        let mut machine = PowerStateMachine::new(EXERCISER);
        assert_eq!(machine.boot(0), Some(Transition::PoweredOn));
        assert!(machine.outputs().load);

        for now in 1..5 * 223 {
            let transition = machine.update(now);
            let phase = now % 223;

            assert_eq!(machine.outputs().load, phase < 120);
            match transition {
                Some(Transition::LoadSwitched(true)) => assert_eq!(phase, 0),
                Some(Transition::LoadSwitched(false)) => assert_eq!(phase, 120),
                None => assert!(phase != 0 && phase != 120),
                Some(other) => panic!("unexpected transition {other:?}"),
            }
        }
    }

    #[test]
    fn test_shutdown_is_terminal() {
        let mut machine = PowerStateMachine::new(EXERCISER);
        machine.boot(0);
        let transitions = advance(&mut machine, 1, 6 * 3600);
        assert!(
            transitions
                .iter()
                .all(|(_, t)| matches!(t, Transition::LoadSwitched(_)))
        );
        assert_eq!(machine.update(6 * 3600), Some(Transition::ShutDown));
        assert_eq!(machine.state(), PowerState::Shutdown);

        for now in 6 * 3600..7 * 3600 {
            assert_eq!(machine.press(now), None);
            assert_eq!(machine.update(now), None);
            assert_eq!(machine.boot(now), None);
            assert_eq!(machine.outputs(), Outputs::OFF);
        }
    }

    #[test]
    fn test_boot_without_start_on_boot() {
        let mut machine = PowerStateMachine::new(AC_TIMER);
        assert_eq!(machine.boot(1), None);
        assert_eq!(machine.state(), PowerState::Off);
    }

    #[test]
    fn test_zero_exerciser_period_keeps_load_off() {
        let mut machine = PowerStateMachine::new(PowerPolicy {
            exerciser: Some(Exerciser {
                period: 0,
                active: 0,
            }),
            ..EXERCISER
        });

        assert_eq!(machine.boot(0), Some(Transition::PoweredOn));
        assert_eq!(machine.press(10), Some(Transition::Restarted));
        assert!(advance(&mut machine, 11, 1000).is_empty());
        assert!(!machine.outputs().load);
    }
}
