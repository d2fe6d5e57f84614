use timer_core::{HardwareAdapter, PinId};

/// A single [`HardwareAdapter::set_output`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputWrite {
    pub pin: PinId,
    pub level: bool,
}

/// In-memory stand-in for the I/O port, watchdog and timer of the real board.
#[derive(Debug, Default)]
pub struct SimBoard {
    /// Logical levels of every pin, inputs included.
    levels: u8,
    writes: Vec<OutputWrite>,
    pets: u64,
    period: Option<u16>,
}

impl SimBoard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the logical level of an input pin, `true` meaning pressed.
    pub fn set_input(&mut self, pin: PinId, level: bool) {
        self.set_level(pin, level);
    }

    #[inline]
    #[must_use]
    pub fn level(&self, pin: PinId) -> bool {
        self.levels & pin.mask() != 0
    }

    #[inline]
    #[must_use]
    pub fn writes(&self) -> &[OutputWrite] {
        &self.writes
    }

    #[inline]
    #[must_use]
    pub fn pets(&self) -> u64 {
        self.pets
    }

    /// Period the timer got armed with, if it was.
    #[inline]
    #[must_use]
    pub fn period(&self) -> Option<u16> {
        self.period
    }

    fn set_level(&mut self, pin: PinId, level: bool) {
        if level {
            self.levels |= pin.mask();
        } else {
            self.levels &= !pin.mask();
        }
    }
}

impl HardwareAdapter for SimBoard {
    fn configure_periodic_tick(&mut self, period: u16) {
        self.period = Some(period);
    }

    fn read_input(&self, pin: PinId) -> bool {
        self.level(pin)
    }

    fn set_output(&mut self, pin: PinId, level: bool) {
        self.set_level(pin, level);
        self.writes.push(OutputWrite { pin, level });
    }

    fn pet_watchdog(&mut self) {
        self.pets += 1;
    }
}
