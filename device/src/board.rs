use arduino_hal::{
    hal::{Wdt, wdt::Timeout},
    pac::{PORTB, TC0},
};
use timer_core::{HardwareAdapter, PinId, PinMap};

use crate::timebase::setup_periodic_tick;

/// The Trinket side of the controller: port B, the watchdog and timer0.
pub struct Board {
    port: PORTB,
    watchdog: Wdt,
    /// Handed over to the timer interrupt once the periodic tick gets configured.
    timer: Option<TC0>,
}

impl Board {
    /// Makes every mapped output a low driven output and enables the pull-up on the button pin.
    pub fn new(port: PORTB, watchdog: Wdt, timer: TC0, pins: &PinMap) -> Self {
        let outputs = pins.outputs().fold(0, |mask, (_, pin)| mask | pin.mask());
        let pull_ups = pins.button.map_or(0, PinId::mask);

        // Levels go in before the direction so outputs never glitch high.
        port.portb.write(|w| unsafe { w.bits(pull_ups) });
        port.ddrb.write(|w| unsafe { w.bits(outputs) });

        Self {
            port,
            watchdog,
            timer: Some(timer),
        }
    }

    /// Resets the board if the main loop stops petting the watchdog for half a second.
    pub fn start_watchdog(&mut self) {
        self.watchdog.start(Timeout::Ms500).ok();
    }
}

impl HardwareAdapter for Board {
    fn configure_periodic_tick(&mut self, period: u16) {
        if let Some(timer) = self.timer.take() {
            setup_periodic_tick(timer, period);
        }
    }

    /// The button shorts its pin to ground.
    fn read_input(&self, pin: PinId) -> bool {
        self.port.pinb.read().bits() & pin.mask() == 0
    }

    fn set_output(&mut self, pin: PinId, level: bool) {
        self.port.portb.modify(|r, w| {
            let bits = if level {
                r.bits() | pin.mask()
            } else {
                r.bits() & !pin.mask()
            };

            unsafe { w.bits(bits) }
        });
    }

    fn pet_watchdog(&mut self) {
        self.watchdog.feed();
    }
}
