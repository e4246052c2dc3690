use std::{net::SocketAddr, time::Duration};

use log::trace;
use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Normal};

use iomust_shared::{WireError, WireMessage, HEADER_SIZE};

use super::Relay;
use crate::{sync::transport::Transport, IomustServerError};

/// Contains Config properties which will be used by a BroadcastRelay
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BroadcastConfig {
    /// Every participant of the session; a message goes to all of them except
    /// the host it came from
    pub peers: Vec<SocketAddr>,
    /// If set, relayed datagrams are truncated or zero-padded to this many
    /// bytes, header included
    pub packet_size: Option<usize>,
    /// Mean of the normally distributed processing delay
    pub mean_delay: Duration,
    /// Standard deviation of the processing delay
    pub delay_std_dev: Duration,
}

/// Re-sends every message to every other peer of the session
pub struct BroadcastRelay<T: Transport> {
    config: BroadcastConfig,
    transport: T,
    latency: Normal<f64>,
    rng: StdRng,
}

impl<T: Transport> BroadcastRelay<T> {
    pub fn new(config: BroadcastConfig, transport: T) -> Result<Self, IomustServerError> {
        Self::with_rng(config, transport, StdRng::from_entropy())
    }

    /// Uses the given generator for delays, for reproducible sessions
    pub fn with_rng(
        config: BroadcastConfig,
        transport: T,
        rng: StdRng,
    ) -> Result<Self, IomustServerError> {
        let latency = Normal::new(
            config.mean_delay.as_secs_f64(),
            config.delay_std_dev.as_secs_f64(),
        )
        .map_err(|_| IomustServerError::InvalidConfig {
            reason: "broadcast delay deviation must be finite and non-negative",
        })?;

        Ok(Self {
            config,
            transport,
            latency,
            rng,
        })
    }

    /// Negative draws become zero, draws past `Duration::MAX` saturate
    fn delay(&mut self) -> Duration {
        let seconds = self.latency.sample(&mut self.rng).max(0.0);
        Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
    }

    pub fn config(&self) -> &BroadcastConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

impl<T: Transport> Relay for BroadcastRelay<T> {
    fn relay(&mut self, from: &SocketAddr, bytes: &[u8]) -> Result<(), WireError> {
        WireMessage::decode(bytes)?;

        let mut datagram = bytes.to_vec();
        if let Some(packet_size) = self.config.packet_size {
            datagram.resize(packet_size.max(HEADER_SIZE), 0);
        }

        // one delay per received message, shared by all of its copies
        let delay = self.delay();
        let mut copies = 0;
        for peer in &self.config.peers {
            if peer.ip() == from.ip() {
                continue;
            }
            self.transport.send(*peer, datagram.clone(), delay);
            copies += 1;
        }

        trace!(
            "Broadcast {} bytes from {} to {} peers after {:?}",
            datagram.len(),
            from,
            copies,
            delay
        );
        Ok(())
    }
}
