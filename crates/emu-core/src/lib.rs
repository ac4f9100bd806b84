//! Core traits and types for cycle-accurate emulation.
//!
//! Time is counted in half-cycles of the CPU clock and advances only when an
//! event fires. Every component that wants to do something at a point in
//! time registers an event with the [`EventClock`]; nothing polls.

mod bus;
mod clock;
mod observable;

pub use bus::{Bus, SimpleBus};
pub use clock::{EventClock, EventHandler, Phase};
pub use observable::{Observable, Value};
