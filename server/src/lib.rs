//! # IoMusT Server
//! A UDP server for networked music performance that aligns the numbered
//! messages of several unsynchronized senders into shared time slots and
//! releases each slot once every sender has contributed, or once its
//! timeout expires. Stateless forward and broadcast relays are available as
//! alternative modes.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

#[macro_use]
extern crate cfg_if;

pub mod relay;
pub mod sync;
pub mod transport;
pub mod shared {
    pub use iomust_shared::{
        Micros, SequenceNumber, Slot, SlotOffset, TimeQueue, WireError, WireMessage, HEADER_SIZE,
    };
}

mod error;
mod server;

pub use error::IomustServerError;
pub use server::{Server, ServerConfig, ServerMode, ServerStats};
pub use sync::{
    output_policy::{
        AggregateForward, BroadcastRelease, Dispatch, OutputPolicy, OutputPolicyKind,
        SlotContribution,
    },
    scheduler::{Scheduler, TimerQueue},
    stats::{SlotOutcome, SyncStats, TimeoutOutcome},
    stream::Stream,
    stream_registry::StreamRegistry,
    sync_config::SyncConfig,
    synchronizer::Synchronizer,
    transport::{OutgoingQueue, Transport},
};
