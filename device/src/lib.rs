#![no_std]
#![feature(abi_avr_interrupt)]

pub mod board;
mod interrupt_cell;
pub mod timebase;

use timer_core::{BoardRevision, Policy, SharedClock, TIMER_HZ, Variant};

#[cfg(not(any(feature = "ac-timer", feature = "intellitimer", feature = "intellitimer-v2")))]
compile_error!("one of `ac-timer`, `intellitimer` or `intellitimer-v2` must be enabled");

#[cfg(any(
    all(feature = "ac-timer", feature = "intellitimer"),
    all(feature = "ac-timer", feature = "intellitimer-v2"),
    all(feature = "intellitimer", feature = "intellitimer-v2"),
))]
compile_error!("only one timer variant can be enabled at a time");

#[cfg(feature = "ac-timer")]
const VARIANT: Variant = Variant::AcTimer;
#[cfg(feature = "intellitimer")]
const VARIANT: Variant = Variant::Intellitimer;
#[cfg(feature = "intellitimer-v2")]
const VARIANT: Variant = Variant::IntellitimerV2;

#[cfg(not(feature = "board-rev-b"))]
const REVISION: BoardRevision = BoardRevision::A;
#[cfg(feature = "board-rev-b")]
const REVISION: BoardRevision = BoardRevision::B;

/// Policy the firmware gets built with.
pub const POLICY: Policy = VARIANT.policy(REVISION);

const _: () = assert!(POLICY.validate().is_ok(), "invalid timer policy");
const _: () = assert!(
    POLICY.timebase.timer_hz == TIMER_HZ,
    "timebase expects a different timer clock"
);
// OCR0A is only 8 bits wide.
const _: () = assert!(
    POLICY.timebase.base_period <= if POLICY.timebase.is_corrected() { 255 } else { 256 },
    "timer period does not fit timer0"
);

/// Timebase shared between the timer interrupt and the main loop.
pub static CLOCK: SharedClock = SharedClock::new(&POLICY.timebase);
