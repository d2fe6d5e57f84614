use std::{fmt, time::Duration};

use timer_core::{
    Clock, Controller, Outputs, PinId, Policy, PolicyError, PowerState, SharedClock, Tick,
    Transition,
};
use tracing::instrument;

use crate::{board::SimBoard, script::ButtonScript};

/// A transition together with the simulated time it happened at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Event {
    pub at: Duration,
    pub transition: Transition,
}

/// Outcome of a [`Simulation::run`].
#[derive(Clone, Debug)]
pub struct Report {
    pub events: Vec<Event>,
    pub elapsed: Duration,
    pub interrupts: u64,
    pub writes: usize,
    pub pets: u64,
    pub state: PowerState,
    /// Ticks into the on-period still running at the end, if any.
    pub on_period: Option<Tick>,
    pub outputs: Outputs,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "simulated {:?} in {} interrupts", self.elapsed, self.interrupts)?;

        for event in &self.events {
            writeln!(f, "  {:>12?}  {:?}", event.at, event.transition)?;
        }

        writeln!(
            f,
            "final state: {}, outputs: power={} warning={} load={}",
            <&'static str>::from(self.state),
            self.outputs.power,
            self.outputs.warning,
            self.outputs.load
        )?;

        if let Some(ticks) = self.on_period {
            writeln!(f, "on-period running for {ticks} ticks")?;
        }

        write!(f, "output writes: {}, watchdog pets: {}", self.writes, self.pets)
    }
}

/// Runs the real [`Controller`] against a [`SimBoard`], firing the timer interrupt as the timer
/// hardware would and polling the main loop once after every interrupt.
#[derive(Debug)]
pub struct Simulation<'a> {
    controller: Controller<SimBoard, &'a SharedClock>,
    clock: &'a SharedClock,
    button: Option<PinId>,
    timer_hz: u64,
    /// Timer input counts between interrupts, as currently programmed.
    period: u16,
    /// Timer input counts since boot.
    counts: u64,
    interrupts: u64,
    events: Vec<Event>,
}

impl<'a> Simulation<'a> {
    /// Resets `clock` and boots a controller on a fresh board.
    ///
    /// # Errors
    ///
    /// Returns an error if the policy does not validate.
    pub fn new(policy: &Policy, clock: &'a SharedClock) -> Result<Self, PolicyError> {
        clock.reset(&policy.timebase);

        let mut controller = Controller::new(policy, SimBoard::new(), clock)?;
        let boot = controller.start();
        let period = controller
            .hardware()
            .period()
            .unwrap_or(policy.timebase.first_period());

        let mut simulation = Self {
            controller,
            clock,
            button: policy.pins.button,
            timer_hz: u64::from(policy.timebase.timer_hz),
            period,
            counts: 0,
            interrupts: 0,
            events: Vec::new(),
        };

        if let Some(transition) = boot {
            simulation.record(transition);
        }

        Ok(simulation)
    }

    /// Simulated time since boot.
    #[must_use]
    pub fn now(&self) -> Duration {
        let micros = u128::from(self.counts) * 1_000_000 / u128::from(self.timer_hz);
        Duration::from_micros(u64::try_from(micros).unwrap_or(u64::MAX))
    }

    #[inline]
    #[must_use]
    pub fn controller(&self) -> &Controller<SimBoard, &'a SharedClock> {
        &self.controller
    }

    #[inline]
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Advances the simulation until `until` simulated time since boot.
    #[instrument(skip_all, fields(until = ?until))]
    pub fn run(&mut self, script: &ButtonScript, until: Duration) {
        while self.now() < until {
            self.step(script);
        }

        tracing::debug!(
            interrupts = self.interrupts,
            ticks = self.clock.now().ticks,
            "simulation finished"
        );
    }

    /// Fires one timer interrupt, then runs one main loop iteration.
    pub fn step(&mut self, script: &ButtonScript) {
        self.counts += u64::from(self.period);
        self.interrupts += 1;
        if let Some(period) = self.clock.on_tick() {
            self.period = period;
        }

        let now = self.now();
        if let Some(pin) = self.button {
            let millis = u64::try_from(now.as_millis()).unwrap_or(u64::MAX);
            self.controller
                .hardware_mut()
                .set_input(pin, script.level(millis));
        }

        let written = self.controller.hardware().writes().len();
        let transition = self.controller.poll();

        for write in &self.controller.hardware().writes()[written..] {
            tracing::debug!(at = ?now, pin = write.pin.0, level = write.level, "output written");
        }

        if let Some(transition) = transition {
            self.record(transition);
        }
    }

    #[must_use]
    pub fn report(&self) -> Report {
        let board = self.controller.hardware();

        Report {
            events: self.events.clone(),
            elapsed: self.now(),
            interrupts: self.interrupts,
            writes: board.writes().len(),
            pets: board.pets(),
            state: self.controller.state(),
            on_period: self.controller.elapsed(),
            outputs: self.controller.outputs(),
        }
    }

    fn record(&mut self, transition: Transition) {
        let at = self.now();
        tracing::info!(
            at = ?at,
            ?transition,
            state = <&'static str>::from(self.controller.state()),
            "transition"
        );
        self.events.push(Event { at, transition });
    }
}
