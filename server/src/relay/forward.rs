use std::{net::SocketAddr, time::Duration};

use log::trace;

use iomust_shared::{WireError, WireMessage};

use super::Relay;
use crate::sync::transport::Transport;

/// Contains Config properties which will be used by a ForwardRelay
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForwardConfig {
    /// Shortest processing delay applied to a forwarded message
    pub min_delay: Duration,
    /// Longest processing delay applied to a forwarded message
    pub max_delay: Duration,
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_micros(500),
            max_delay: Duration::from_micros(1_500),
        }
    }
}

/// Forwards every message, unchanged, to the destination written in its
/// own header
pub struct ForwardRelay<T: Transport> {
    config: ForwardConfig,
    transport: T,
    rng: fastrand::Rng,
}

impl<T: Transport> ForwardRelay<T> {
    pub fn new(config: ForwardConfig, transport: T) -> Self {
        Self::with_rng(config, transport, fastrand::Rng::new())
    }

    /// Uses the given generator for delays, for reproducible sessions
    pub fn with_rng(config: ForwardConfig, transport: T, rng: fastrand::Rng) -> Self {
        Self {
            config,
            transport,
            rng,
        }
    }

    fn delay(&self) -> Duration {
        let min = self.config.min_delay;
        let max = self.config.max_delay.max(min);
        min + (max - min).mul_f64(self.rng.f64())
    }

    pub fn config(&self) -> &ForwardConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

impl<T: Transport> Relay for ForwardRelay<T> {
    fn relay(&mut self, from: &SocketAddr, bytes: &[u8]) -> Result<(), WireError> {
        let message = WireMessage::decode(bytes)?;
        let destination = message.destination_address();
        let delay = self.delay();

        trace!(
            "Forwarding {} bytes from {} to {} after {:?}",
            bytes.len(),
            from,
            destination,
            delay
        );
        self.transport.send(destination, bytes.to_vec(), delay);
        Ok(())
    }
}
