mod interrupts;

use arduino_hal::pac::TC0;

use crate::interrupt_cell::InterruptCell;

/// Timer that gets handed over to [`setup_periodic_tick`] and is used exclusively from the
/// compare match interrupt afterwards.
static TIMER: InterruptCell<TC0> = InterruptCell::empty();

/// Configures timer0 in CTC mode to fire the compare match interrupt every `period` timer counts
/// and fills the [`InterruptCell`] used exclusively in that interrupt.
///
/// Formula: 8 MHz / (64 * (1 + 124)) = 1000 Hz
pub fn setup_periodic_tick(timer: TC0, period: u16) {
    // WGM
    timer.tccr0a.write(|w| w.wgm0().bits(0b10));

    // Prescaler
    timer.tccr0b.write(|w| w.cs0().prescale_64());
    timer.ocr0a.write(|w| w.bits(compare_value(period)));

    // Enable the timer interrupt
    timer.timsk.write(|w| w.ocie0a().set_bit());

    TIMER.fill(timer);
}

/// The counter runs from 0 up to and including OCR0A, so a period of `n` counts needs `n - 1`.
///
/// Every period the timebase can produce fits in 8 bits, which gets asserted in [`crate::POLICY`].
#[inline]
#[allow(clippy::cast_possible_truncation)]
fn compare_value(period: u16) -> u8 {
    period.saturating_sub(1) as u8
}
