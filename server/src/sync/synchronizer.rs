use std::{
    collections::{BTreeSet, HashMap},
    net::SocketAddr,
};

use log::{debug, trace};

use iomust_shared::{Slot, WireMessage};

use super::{
    output_policy::{OutputPolicy, SlotContribution},
    scheduler::Scheduler,
    stats::{SlotOutcome, SyncStats, TimeoutOutcome},
    stream_registry::StreamRegistry,
    sync_config::SyncConfig,
    transport::Transport,
};

/// Aligns the numbered messages of several unsynchronized senders into
/// shared slots and releases each slot as soon as every sender has
/// contributed, or once its timeout expires.
///
/// All methods run on the single thread that delivers packets and timeouts.
/// Timeouts are never cancelled: `check_and_send` is a no-op for slots that
/// have already been released.
pub struct Synchronizer<T: Transport, S: Scheduler> {
    config: SyncConfig,
    registry: StreamRegistry,
    policy: Box<dyn OutputPolicy>,
    transport: T,
    scheduler: S,
    oldest_accepted_slot: Option<Slot>,
    newest_seen_slot: Option<Slot>,
    // released slots at or above `oldest_accepted_slot`, plus older ones
    // whose own timeouts have not fired yet
    released: BTreeSet<Slot>,
    // scheduled timeouts per slot that have not fired yet
    pending_timeouts: HashMap<Slot, usize>,
    stats: SyncStats,
}

impl<T: Transport, S: Scheduler> Synchronizer<T, S> {
    pub fn new(
        config: SyncConfig,
        policy: Box<dyn OutputPolicy>,
        transport: T,
        scheduler: S,
    ) -> Self {
        let registry = StreamRegistry::new(config.period, config.ring_capacity, config.reply_port);

        Self {
            config,
            registry,
            policy,
            transport,
            scheduler,
            oldest_accepted_slot: None,
            newest_seen_slot: None,
            released: BTreeSet::new(),
            pending_timeouts: HashMap::new(),
            stats: SyncStats::default(),
        }
    }

    /// Buffers a message from `address`, releasing its slot immediately if
    /// every known stream has now contributed to it
    pub fn add_packet(&mut self, address: &SocketAddr, message: WireMessage) -> SlotOutcome {
        self.stats.received += 1;

        let known_streams = self.registry.len();
        let slot = self
            .registry
            .resolve(address, &message)
            .normalize(message.seq_n());
        if known_streams > 0 && self.registry.len() > known_streams {
            self.on_stream_joined(address);
        }

        if !self.is_accepted(slot) {
            self.stats.rejected_late += 1;
            debug!("Rejected late message for slot {} from {}", slot, address);
            return SlotOutcome::Rejected(slot);
        }

        self.registry.resolve(address, &message).add(message);
        self.newest_seen_slot = Some(match self.newest_seen_slot {
            Some(newest) => newest.max(slot),
            None => slot,
        });
        trace!("Buffered slot {} from {}", slot, address);

        let outcome = if self.registry.all_present(slot) {
            self.release(slot);
            SlotOutcome::Released(slot)
        } else {
            SlotOutcome::Pending(slot)
        };

        // scheduled even after an immediate release, the timeout sees it was sent
        self.scheduler.after(self.config.timeout, slot);
        *self.pending_timeouts.entry(slot).or_insert(0) += 1;

        outcome
    }

    /// Handles the timeout of `slot`: releases whatever has arrived, with
    /// substitutes for the missing streams, and stops accepting older slots
    pub fn check_and_send(&mut self, slot: Slot) -> TimeoutOutcome {
        if let Some(pending) = self.pending_timeouts.get_mut(&slot) {
            *pending -= 1;
            if *pending == 0 {
                self.pending_timeouts.remove(&slot);
            }
        }

        let outcome = if self.released.contains(&slot) {
            TimeoutOutcome::AlreadyReleased
        } else if self.registry.any_present(slot) {
            self.release(slot);
            self.stats.expired += 1;
            debug!("Slot {} expired", slot);
            TimeoutOutcome::Expired
        } else {
            self.stats.empty_timeouts += 1;
            TimeoutOutcome::Empty
        };

        self.advance_oldest_accepted(slot);

        outcome
    }

    fn on_stream_joined(&mut self, address: &SocketAddr) {
        if !self.config.align_window_on_join || self.oldest_accepted_slot.is_some() {
            return;
        }
        if let Some(newest) = self.newest_seen_slot {
            debug!(
                "Stream {} joined, accepting from slot {} onwards",
                address, newest
            );
            self.advance_oldest_accepted(newest);
        }
    }

    fn is_accepted(&self, slot: Slot) -> bool {
        if let Some(oldest) = self.oldest_accepted_slot {
            if slot < oldest {
                return false;
            }
        }
        !self.released.contains(&slot)
    }

    fn advance_oldest_accepted(&mut self, slot: Slot) {
        let oldest = match self.oldest_accepted_slot {
            Some(oldest) => oldest.max(slot),
            None => slot,
        };
        self.oldest_accepted_slot = Some(oldest);
        // anything older is rejected by the bound itself; the record is only
        // kept so that its own timeout reports AlreadyReleased
        let pending_timeouts = &self.pending_timeouts;
        self.released
            .retain(|released| *released >= oldest || pending_timeouts.contains_key(released));
    }

    fn release(&mut self, slot: Slot) {
        let Some(template) = self.registry.iter().find_map(|stream| stream.get(slot)).cloned()
        else {
            return;
        };

        let mut contributions = Vec::with_capacity(self.registry.len());
        for stream in self.registry.iter() {
            let (mut message, concealed) = match stream.get(slot) {
                Some(message) => (message.clone(), false),
                None => {
                    let mut substitute = template.clone();
                    // a zero timestamp marks synthesized content
                    substitute.set_send_time(0);
                    (substitute, true)
                }
            };

            let local_seq_n = stream.denormalize(slot);
            message.set_seq_n(local_seq_n);
            if let SocketAddr::V4(reply_address) = stream.reply_address() {
                message.set_destination(*reply_address.ip());
            }

            contributions.push(SlotContribution {
                source: stream.address(),
                reply_address: stream.reply_address(),
                local_seq_n,
                message,
                concealed,
            });
        }

        let concealed = contributions.iter().filter(|c| c.concealed).count();

        let dispatches = self.policy.distribute(slot, &contributions);
        let dispatched = dispatches.len();
        for dispatch in dispatches {
            self.transport.send(
                dispatch.destination,
                dispatch.message.encode(),
                self.config.send_delay,
            );
        }

        // substitutes were never buffered, so this only clears real entries
        for stream in self.registry.iter_mut() {
            stream.clear(slot);
        }
        self.released.insert(slot);

        self.stats.released += 1;
        self.stats.concealed += concealed as u64;

        debug!(
            "Released slot {}: {} streams, {} concealed, {} messages",
            slot,
            contributions.len(),
            concealed,
            dispatched
        );
    }

    pub fn is_released(&self, slot: Slot) -> bool {
        self.released.contains(&slot)
    }

    pub fn oldest_accepted_slot(&self) -> Option<Slot> {
        self.oldest_accepted_slot
    }

    pub fn newest_seen_slot(&self) -> Option<Slot> {
        self.newest_seen_slot
    }

    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn registry(&self) -> &StreamRegistry {
        &self.registry
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }
}
