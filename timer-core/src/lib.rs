//! Time keeping, button debouncing and power sequencing for single button power timers.
//!
//! Every board runs the same [`Controller`]; the differences between them are captured by a
//! [`Policy`], with one preset per [`Variant`]. The board itself is reached through the
//! [`HardwareAdapter`] trait and the timer interrupt feeds a [`SharedClock`].

#![cfg_attr(not(test), no_std)]

mod clock;
mod controller;
mod debounce;
mod hardware;
mod policy;
mod power;
mod tick;
mod timebase;

pub use clock::{Clock, SharedClock};
pub use controller::Controller;
pub use debounce::{DebounceConfig, Debouncer, Edge, EdgeReport, TimeScale};
pub use hardware::HardwareAdapter;
pub use policy::{
    BoardRevision, MILLIS_PERIOD, PORT_WIDTH, PinId, PinMap, Policy, PolicyError, Role,
    TIMER_HZ, Variant,
};
pub use power::{
    Exerciser, Outputs, PowerPolicy, PowerState, PowerStateMachine, PressAction,
    TimeoutAction, Transition, WarningPolicy, WarningPress,
};
pub use tick::{HALF_RANGE, Instant, Tick, elapsed, ring_elapsed};
pub use timebase::{FractionalCorrector, Timebase, TimebaseConfig};
