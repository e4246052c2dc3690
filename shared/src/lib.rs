//! # IoMusT Shared
//! Wire format and timing primitives shared by the IoMusT mixing server and
//! the clients that stream to it.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod constants;
mod time_queue;
mod types;
mod wire;

pub use constants::{
    DEFAULT_PERIOD, DEFAULT_PORT, DEFAULT_RING_CAPACITY, DEFAULT_SEND_DELAY, DEFAULT_TIMEOUT,
    HEADER_SIZE,
};
pub use time_queue::TimeQueue;
pub use types::{Micros, SequenceNumber, Slot, SlotOffset};
pub use wire::{error::WireError, wire_message::WireMessage};
