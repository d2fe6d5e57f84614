use crate::policy::PinId;

/// Board specific side of the controller.
///
/// Everything the core needs from the hardware goes through here; clock source, prescaler and
/// pin direction setup stay with the implementor.
pub trait HardwareAdapter {
    /// Arranges for [`crate::SharedClock::on_tick`] to run every `period` timer input counts.
    fn configure_periodic_tick(&mut self, period: u16);

    /// Logical level of an input pin, `true` meaning pressed. Active low wiring is resolved by the
    /// implementor.
    fn read_input(&self, pin: PinId) -> bool;

    /// Drives an output pin. Writing the level it already has must have no visible effect.
    fn set_output(&mut self, pin: PinId, level: bool);

    /// Must run at least once per watchdog period or the board restarts.
    fn pet_watchdog(&mut self);
}
