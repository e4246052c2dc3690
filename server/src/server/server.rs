use std::{net::SocketAddr, time::Instant};

use log::{debug, info, warn};

use iomust_shared::{WireError, WireMessage};

use crate::{
    relay::{BroadcastRelay, ForwardRelay, Relay},
    sync::{scheduler::TimerQueue, synchronizer::Synchronizer, transport::OutgoingQueue},
    transport::{PacketReceiver, PacketSender, Socket},
    IomustServerError, ServerConfig, ServerMode,
};

type MixEngine = Synchronizer<OutgoingQueue, TimerQueue>;

enum Engine {
    Mix(MixEngine),
    Forward(ForwardRelay<OutgoingQueue>),
    Broadcast(BroadcastRelay<OutgoingQueue>),
}

impl Engine {
    fn new(config: &ServerConfig, now: Instant) -> Result<Self, IomustServerError> {
        let outgoing = OutgoingQueue::new(now);
        Ok(match &config.mode {
            ServerMode::Mix(policy) => Engine::Mix(Synchronizer::new(
                config.sync.clone(),
                policy.build(),
                outgoing,
                TimerQueue::new(now),
            )),
            ServerMode::Forward(forward) => {
                Engine::Forward(ForwardRelay::new(forward.clone(), outgoing))
            }
            ServerMode::Broadcast(broadcast) => {
                Engine::Broadcast(BroadcastRelay::new(broadcast.clone(), outgoing)?)
            }
        })
    }

    fn advance(&mut self, now: Instant) {
        if let Engine::Mix(synchronizer) = self {
            synchronizer.scheduler_mut().advance(now);
        }
        self.outgoing_mut().advance(now);
    }

    fn receive(&mut self, address: &SocketAddr, bytes: &[u8]) -> Result<(), WireError> {
        match self {
            Engine::Mix(synchronizer) => {
                let message = WireMessage::decode(bytes)?;
                synchronizer.add_packet(address, message);
                Ok(())
            }
            Engine::Forward(relay) => relay.relay(address, bytes),
            Engine::Broadcast(relay) => relay.relay(address, bytes),
        }
    }

    fn outgoing(&self) -> &OutgoingQueue {
        match self {
            Engine::Mix(synchronizer) => synchronizer.transport(),
            Engine::Forward(relay) => relay.transport(),
            Engine::Broadcast(relay) => relay.transport(),
        }
    }

    fn outgoing_mut(&mut self) -> &mut OutgoingQueue {
        match self {
            Engine::Mix(synchronizer) => synchronizer.transport_mut(),
            Engine::Forward(relay) => relay.transport_mut(),
            Engine::Broadcast(relay) => relay.transport_mut(),
        }
    }
}

/// Datagram counters of a Server, across every mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerStats {
    pub received: u64,
    /// Datagrams dropped because they could not be decoded
    pub malformed: u64,
    pub sent: u64,
    pub send_failures: u64,
}

/// A UDP mixing server for networked music performance.
///
/// Must be driven regularly with `update`: every call receives all pending
/// datagrams, fires due slot timeouts and flushes due outgoing datagrams.
pub struct Server {
    config: ServerConfig,
    io: Option<(Box<dyn PacketSender>, Box<dyn PacketReceiver>)>,
    engine: Engine,
    stats: ServerStats,
}

impl Server {
    /// Create a new Server
    pub fn new(config: ServerConfig) -> Result<Self, IomustServerError> {
        if config.sync.period.is_zero() {
            return Err(IomustServerError::InvalidConfig {
                reason: "period must be greater than zero",
            });
        }
        if config.sync.timeout.is_zero() {
            return Err(IomustServerError::InvalidConfig {
                reason: "timeout must be greater than zero",
            });
        }
        if config.sync.ring_capacity == 0 {
            return Err(IomustServerError::InvalidConfig {
                reason: "ring capacity must be greater than zero",
            });
        }

        let engine = Engine::new(&config, Instant::now())?;

        Ok(Self {
            config,
            io: None,
            engine,
            stats: ServerStats::default(),
        })
    }

    /// Listen on the given socket
    pub fn listen<S: Into<Box<dyn Socket>>>(&mut self, socket: S) {
        let boxed_socket: Box<dyn Socket> = socket.into();
        self.io = Some(boxed_socket.listen());
        info!("Server listening, mode {:?}", self.config.mode);
    }

    /// Returns whether or not the Server has been loaded with a socket
    pub fn is_listening(&self) -> bool {
        self.io.is_some()
    }

    /// Receives, processes timeouts and sends, in that order
    pub fn update(&mut self, now: Instant) {
        self.receive_all_packets(now);
        self.process_timeouts(now);
        self.send_all_packets(now);
    }

    /// Hands every datagram waiting on the socket to the engine. Returns how
    /// many were received.
    pub fn receive_all_packets(&mut self, now: Instant) -> usize {
        self.engine.advance(now);

        let Some((_, receiver)) = self.io.as_mut() else {
            return 0;
        };

        let mut received = 0;
        loop {
            match receiver.receive() {
                Ok(Some((address, bytes))) => {
                    received += 1;
                    self.stats.received += 1;
                    if let Err(error) = self.engine.receive(&address, bytes) {
                        self.stats.malformed += 1;
                        warn!("Dropped datagram from {}: {}", address, error);
                    }
                }
                Ok(None) => break,
                Err(error) => {
                    warn!("Server Error: {}", error);
                    break;
                }
            }
        }
        received
    }

    /// Fires every slot timeout that is due. Relays have none.
    pub fn process_timeouts(&mut self, now: Instant) {
        self.engine.advance(now);

        let Engine::Mix(synchronizer) = &mut self.engine else {
            return;
        };
        while let Some(slot) = synchronizer.scheduler_mut().pop_expired() {
            let outcome = synchronizer.check_and_send(slot);
            debug!("Timeout of slot {}: {:?}", slot, outcome);
        }
    }

    /// Writes every outgoing datagram whose send delay has elapsed to the
    /// socket. Returns how many were written.
    pub fn send_all_packets(&mut self, now: Instant) -> usize {
        self.engine.advance(now);

        let Some((sender, _)) = self.io.as_ref() else {
            return 0;
        };

        let mut sent = 0;
        let outgoing = self.engine.outgoing_mut();
        while let Some((destination, payload)) = outgoing.pop_ready() {
            match sender.send(&destination, &payload) {
                Ok(()) => {
                    sent += 1;
                    self.stats.sent += 1;
                }
                Err(error) => {
                    self.stats.send_failures += 1;
                    warn!("Server Error: {} to {}", error, destination);
                }
            }
        }
        sent
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn stats(&self) -> &ServerStats {
        &self.stats
    }

    /// The Synchronizer, in Mix mode
    pub fn synchronizer(&self) -> Option<&MixEngine> {
        match &self.engine {
            Engine::Mix(synchronizer) => Some(synchronizer),
            _ => None,
        }
    }

    /// Number of datagrams waiting for their send delay
    pub fn outgoing_len(&self) -> usize {
        self.engine.outgoing().len()
    }
}
