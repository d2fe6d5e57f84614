use crate::{
    clock::Clock,
    debounce::Debouncer,
    hardware::HardwareAdapter,
    policy::{PinMap, Policy, PolicyError, Role},
    power::{Outputs, PowerState, PowerStateMachine, Transition},
    tick::Tick,
};

/// Main loop context. Owns every piece of state the loop touches, except for the timebase which
/// is shared with the timer interrupt through the [`Clock`].
///
/// Each [`Controller::poll`] is one iteration of the loop and never blocks.
#[derive(Debug)]
pub struct Controller<H, C> {
    hardware: H,
    clock: C,
    pins: PinMap,
    first_period: u16,
    debouncer: Option<Debouncer>,
    machine: PowerStateMachine,
    /// Levels last written to the output pins.
    written: Outputs,
}

impl<H, C> Controller<H, C>
where
    H: HardwareAdapter,
    C: Clock,
{
    /// # Errors
    ///
    /// Returns an error if the policy does not validate.
    pub fn new(policy: &Policy, hardware: H, clock: C) -> Result<Self, PolicyError> {
        policy.validate()?;

        Ok(Self {
            hardware,
            clock,
            pins: policy.pins,
            first_period: policy.timebase.first_period(),
            debouncer: policy.debounce.map(|config| Debouncer::new(config, &policy.timebase)),
            machine: PowerStateMachine::new(policy.power),
            written: Outputs::OFF,
        })
    }

    /// Drives every output to its boot level and starts the periodic tick.
    ///
    /// Boards that gate their own supply start their on-period here, so this must run as early
    /// as possible and before interrupts get enabled.
    pub fn start(&mut self) -> Option<Transition> {
        let transition = self.machine.boot(self.clock.now().ticks);
        self.write_outputs(true);
        self.hardware.configure_periodic_tick(self.first_period);
        transition
    }

    /// Runs one main loop iteration.
    pub fn poll(&mut self) -> Option<Transition> {
        self.hardware.pet_watchdog();

        // Nothing is left to do but to wait for the supply to go away.
        if self.machine.state() == PowerState::Shutdown {
            return None;
        }

        let now = self.clock.now();

        let edge = match (&mut self.debouncer, self.pins.button) {
            (Some(debouncer), Some(pin)) => debouncer.update(self.hardware.read_input(pin), now),
            _ => None,
        };

        // Releases only get reported when the policy wants them treated as button events.
        let transition = match edge {
            Some(_) => self.machine.press(now.ticks),
            None => self.machine.update(now.ticks),
        };

        self.write_outputs(false);
        transition
    }

    /// Runs the main loop forever.
    pub fn run(mut self) -> ! {
        loop {
            self.poll();
        }
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> PowerState {
        self.machine.state()
    }

    #[inline]
    #[must_use]
    pub fn outputs(&self) -> Outputs {
        self.machine.outputs()
    }

    /// Ticks into the current on-period, if any.
    #[must_use]
    pub fn elapsed(&self) -> Option<Tick> {
        self.machine.elapsed(self.clock.now().ticks)
    }

    /// Debounced button level. Always `false` on boards without a button.
    #[must_use]
    pub fn button_level(&self) -> bool {
        self.debouncer.as_ref().is_some_and(Debouncer::level)
    }

    #[inline]
    #[must_use]
    pub fn hardware(&self) -> &H {
        &self.hardware
    }

    #[inline]
    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hardware
    }

    /// Writes the outputs whose level changed since the last write, or all of them if `force`.
    fn write_outputs(&mut self, force: bool) {
        let outputs = self.machine.outputs();

        for (role, pin) in self.pins.outputs() {
            let (level, written) = match role {
                Role::Power => (outputs.power, self.written.power),
                Role::Warning => (outputs.warning, self.written.warning),
                Role::Load => (outputs.load, self.written.load),
                Role::Button => continue,
            };

            if force || level != written {
                self.hardware.set_output(pin, level);
            }
        }

        self.written = outputs;
    }
}
