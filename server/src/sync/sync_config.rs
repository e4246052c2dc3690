use std::{default::Default, time::Duration};

use iomust_shared::{DEFAULT_PERIOD, DEFAULT_RING_CAPACITY, DEFAULT_SEND_DELAY, DEFAULT_TIMEOUT};

/// Contains Config properties which will be used by the Synchronizer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncConfig {
    /// Time between two consecutive messages at the sender side
    pub period: Duration,
    /// Maximum time to wait for the rest of a slot once one of its messages
    /// has arrived
    pub timeout: Duration,
    /// Number of slots each stream can buffer
    pub ring_capacity: usize,
    /// Local processing delay applied to every released message
    pub send_delay: Duration,
    /// If set, released content goes to this port on the sender's host
    /// instead of back to the sender's source port
    pub reply_port: Option<u16>,
    /// If set, a stream joining before any timeout has fired starts the
    /// acceptance window at the newest slot seen so far, so the newcomer
    /// cannot complete slots the reference sender left behind
    pub align_window_on_join: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            period: DEFAULT_PERIOD,
            timeout: DEFAULT_TIMEOUT,
            ring_capacity: DEFAULT_RING_CAPACITY,
            send_delay: DEFAULT_SEND_DELAY,
            reply_port: None,
            align_window_on_join: false,
        }
    }
}
