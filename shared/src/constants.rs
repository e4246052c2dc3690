use std::time::Duration;

// Wire layout

/// Destination address (4) + selector (1) + timestamp (8) + sequence number (4)
pub const HEADER_SIZE: usize = 17;
pub(crate) const SELECTOR_OFFSET: usize = 4;
pub(crate) const TIMESTAMP_OFFSET: usize = 5;
pub(crate) const SEQUENCE_OFFSET: usize = 13;

// Synchronizer defaults

/// Number of slots each stream can hold before positions are reused
pub const DEFAULT_RING_CAPACITY: usize = 100;
/// Clients emit one message every 1/1500 s
pub const DEFAULT_PERIOD: Duration = Duration::from_nanos(666_667);
/// Maximum time to wait for the rest of a slot once its first message arrives
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10);
/// Local processing time applied to every outgoing datagram
pub const DEFAULT_SEND_DELAY: Duration = Duration::from_micros(200);
/// Port the mixing server listens on
pub const DEFAULT_PORT: u16 = 9;
