use avr_device::interrupt;

use crate::{
    CLOCK,
    timebase::{TIMER, compare_value},
};

#[interrupt(attiny85)]
fn TIMER0_COMPA() {
    let period = CLOCK.on_tick();

    if let (Some(period), Some(timer)) = (period, TIMER.get_mut()) {
        timer.ocr0a.write(|w| w.bits(compare_value(period)));
    }
}
