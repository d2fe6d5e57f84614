//! Power timer firmware.
//!
//! The code was developed for an Adafruit Trinket with an ATtiny85 running at 8 MHz.
//! Hardware components used:
//! - TIMER0
//! - Pins: PB0, PB1, PB2
//! - WDT

#![no_std]
#![no_main]

use arduino_hal::hal::Wdt;
use avr_device::interrupt;
use device::{CLOCK, POLICY, board::Board};
use panic_halt as _;
use timer_core::Controller;

#[arduino_hal::entry]
fn main() -> ! {
    let peripherals = arduino_hal::Peripherals::take().unwrap();

    let watchdog = Wdt::new(peripherals.WDT, &peripherals.CPU.mcusr);
    let board = Board::new(peripherals.PORTB, watchdog, peripherals.TC0, &POLICY.pins);

    // The policy gets validated at compile time.
    let Ok(mut controller) = Controller::new(&POLICY, board, &CLOCK) else {
        unreachable!()
    };

    // Boards that gate their own supply need to latch it before anything else.
    controller.start();

    // Disable the analog comparator
    peripherals.AC.acsr.write(|w| w.acd().set_bit());
    // Disable ADC
    peripherals.ADC.adcsra.write(|w| w.aden().clear_bit());
    // Disable power to the ADC, USI and the unused timer
    peripherals
        .CPU
        .prr
        .write(|w| w.pradc().set_bit().prusi().set_bit().prtim1().set_bit());

    controller.hardware_mut().start_watchdog();

    // Enable interrupts globally.
    unsafe { interrupt::enable() };

    controller.run()
}
