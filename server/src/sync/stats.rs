use iomust_shared::Slot;

/// What happened to a message handed to `Synchronizer::add_packet`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotOutcome {
    /// Buffered; the slot is still waiting for other streams
    Pending(Slot),
    /// Completed the slot, which was released immediately
    Released(Slot),
    /// The slot is no longer accepted; the message was dropped
    Rejected(Slot),
}

impl SlotOutcome {
    pub fn slot(&self) -> Slot {
        match self {
            SlotOutcome::Pending(slot)
            | SlotOutcome::Released(slot)
            | SlotOutcome::Rejected(slot) => *slot,
        }
    }
}

/// What a slot timeout did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutOutcome {
    /// The slot had already been released; nothing was sent
    AlreadyReleased,
    /// The slot was released with substitutes for the missing streams
    Expired,
    /// No stream holds anything for the slot
    Empty,
}

/// Running counters of a synchronizer session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Messages handed to the synchronizer
    pub received: u64,
    /// Slots released, by either path
    pub released: u64,
    /// Slots released by their timeout
    pub expired: u64,
    /// Substitutes synthesized for missing streams
    pub concealed: u64,
    /// Messages dropped because their slot was no longer accepted
    pub rejected_late: u64,
    /// Timeouts that found nothing to send
    pub empty_timeouts: u64,
}
