use std::time::Duration;

use iomust_server::{
    OutputPolicyKind, SlotOutcome, StreamRegistry, SyncConfig, Synchronizer, TimeoutOutcome,
};
use iomust_test::{ManualScheduler, RecordingTransport, TestSender};

type TestSynchronizer = Synchronizer<RecordingTransport, ManualScheduler>;

const PERIOD: Duration = Duration::from_millis(10);
const TIMEOUT: Duration = Duration::from_millis(15);

fn synchronizer(policy: OutputPolicyKind) -> TestSynchronizer {
    let _ = env_logger::builder().is_test(true).try_init();
    let config = SyncConfig {
        period: PERIOD,
        timeout: TIMEOUT,
        ..SyncConfig::default()
    };
    Synchronizer::new(
        config,
        policy.build(),
        RecordingTransport::new(),
        ManualScheduler::new(),
    )
}

/// Registers both senders. The first sender's slot 0 is released on its own
/// since nobody else is known yet; the second sender's slot 0 then arrives
/// too late but still creates its stream.
fn start_session(sync: &mut TestSynchronizer, a: &TestSender, b: &TestSender, b_offset: u32) {
    assert_eq!(
        sync.add_packet(&a.address(), a.message(0, &[0xA])),
        SlotOutcome::Released(0)
    );
    assert_eq!(
        sync.add_packet(&b.address(), b.message(b_offset, &[0xB])),
        SlotOutcome::Rejected(0)
    );
    assert_eq!(sync.registry().len(), 2);

    sync.transport_mut().take();
    sync.scheduler_mut().take_all();
}

#[test]
fn offset_aligns_sender_started_earlier() {
    // the reference sends seq 0 at t=0, the other sender seq 5 at t=0
    let reference = TestSender::new("10.0.0.1:5000", 0, PERIOD);
    let other = TestSender::new("10.0.0.2:5000", -50_000, PERIOD);
    let mut registry = StreamRegistry::new(PERIOD, 100, None);

    registry.resolve(&reference.address(), &reference.message(0, &[]));
    let stream = registry.resolve(&other.address(), &other.message(5, &[]));

    assert_eq!(stream.offset(), 5);
    assert_eq!(stream.normalize(5), 0);
    assert_eq!(stream.denormalize(0), 5);
    assert_eq!(registry.reference_time(), Some(0));
}

#[test]
fn offset_aligns_slots_across_senders() {
    let reference = TestSender::new("10.0.0.1:5000", 0, PERIOD);
    let other = TestSender::new("10.0.0.2:5000", -50_000, PERIOD);
    let mut sync = synchronizer(OutputPolicyKind::Broadcast);

    assert_eq!(
        sync.add_packet(&reference.address(), reference.message(0, &[1])),
        SlotOutcome::Released(0)
    );
    assert_eq!(
        sync.add_packet(&other.address(), other.message(6, &[2])),
        SlotOutcome::Pending(1)
    );
    assert_eq!(
        sync.add_packet(&reference.address(), reference.message(1, &[1])),
        SlotOutcome::Released(1)
    );

    // each side hears the other under its own numbering
    let transport = sync.transport();
    let to_other = transport.sent_to(&other.address());
    assert_eq!(to_other.len(), 1);
    assert_eq!(to_other[0].message.seq_n(), 6);
    assert_eq!(to_other[0].message.payload(), &[1]);
    let to_reference = transport.sent_to(&reference.address());
    assert_eq!(to_reference.len(), 1);
    assert_eq!(to_reference[0].message.seq_n(), 1);
    assert_eq!(to_reference[0].message.payload(), &[2]);
}

#[test]
fn complete_slot_is_released_without_waiting() {
    let a = TestSender::new("10.0.0.1:5000", 0, PERIOD);
    let b = TestSender::new("10.0.0.2:5000", 0, PERIOD);
    let mut sync = synchronizer(OutputPolicyKind::Broadcast);
    start_session(&mut sync, &a, &b, 0);

    assert_eq!(
        sync.add_packet(&a.address(), a.message(7, &[0xA])),
        SlotOutcome::Pending(7)
    );
    assert!(sync.transport().is_empty());
    assert_eq!(
        sync.add_packet(&b.address(), b.message(7, &[0xB])),
        SlotOutcome::Released(7)
    );

    assert_eq!(sync.transport().len(), 2);
    assert_eq!(sync.stats().concealed, 0);
    let to_a = sync.transport().sent_to(&a.address());
    assert_eq!(to_a[0].message.payload(), &[0xB]);
    assert_eq!(to_a[0].message.seq_n(), 7);
    assert_eq!(to_a[0].message.send_time(), b.message(7, &[]).send_time());
    assert_eq!(to_a[0].delay, SyncConfig::default().send_delay);

    // both timeouts still fire and find nothing left to do
    let timeouts = sync.scheduler_mut().take_all();
    assert_eq!(timeouts, vec![7, 7]);
    for slot in timeouts {
        assert_eq!(sync.check_and_send(slot), TimeoutOutcome::AlreadyReleased);
    }
    assert_eq!(sync.transport().len(), 2);
    assert_eq!(sync.stats().expired, 0);
}

#[test]
fn missing_stream_is_concealed_on_timeout() {
    let a = TestSender::new("10.0.0.1:5000", 0, PERIOD);
    // started 3 periods before a
    let b = TestSender::new("10.0.0.2:5000", -30_000, PERIOD);
    let mut sync = synchronizer(OutputPolicyKind::Broadcast);
    start_session(&mut sync, &a, &b, 3);

    assert_eq!(
        sync.add_packet(&a.address(), a.message(5, &[0xA])),
        SlotOutcome::Pending(5)
    );
    assert_eq!(sync.scheduler().pending(), &[(TIMEOUT, 5)]);
    assert!(sync.transport().is_empty());

    for slot in sync.scheduler_mut().take_all() {
        assert_eq!(sync.check_and_send(slot), TimeoutOutcome::Expired);
    }

    // b hears a's content under its own numbering
    let to_b = sync.transport().sent_to(&b.address());
    assert_eq!(to_b.len(), 1);
    assert_eq!(to_b[0].message.seq_n(), 8);
    assert_eq!(to_b[0].message.payload(), &[0xA]);

    // a hears the substitute made for b
    let to_a = sync.transport().sent_to(&a.address());
    assert_eq!(to_a.len(), 1);
    assert_eq!(to_a[0].message.seq_n(), 5);
    assert_eq!(to_a[0].message.payload(), &[0xA]);
    assert_eq!(to_a[0].message.send_time(), 0);

    assert_eq!(sync.stats().expired, 1);
    assert_eq!(sync.stats().concealed, 1);
    assert_eq!(sync.oldest_accepted_slot(), Some(5));
}

#[test]
fn concealed_slot_is_aggregated_with_substitute() {
    let a = TestSender::new("10.0.0.1:5000", 0, PERIOD);
    let b = TestSender::new("10.0.0.2:5000", -30_000, PERIOD);
    let sink = "10.0.9.9:7".parse().unwrap();
    let mut sync = synchronizer(OutputPolicyKind::AggregateForward { sink });
    start_session(&mut sync, &a, &b, 3);

    sync.add_packet(&a.address(), a.message(5, &[1, 2]));
    for slot in sync.scheduler_mut().take_all() {
        sync.check_and_send(slot);
    }

    let sent = sync.transport().sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].destination, sink);
    assert_eq!(sent[0].message.seq_n(), 5);
    assert_eq!(sent[0].message.payload(), &[1, 2, 1, 2]);
}

#[test]
fn late_message_is_dropped_without_side_effects() {
    let a = TestSender::new("10.0.0.1:5000", 0, PERIOD);
    let b = TestSender::new("10.0.0.2:5000", 0, PERIOD);
    let mut sync = synchronizer(OutputPolicyKind::Broadcast);
    start_session(&mut sync, &a, &b, 0);

    sync.add_packet(&a.address(), a.message(5, &[0xA]));
    for slot in sync.scheduler_mut().take_all() {
        sync.check_and_send(slot);
    }
    sync.transport_mut().take();
    assert_eq!(sync.oldest_accepted_slot(), Some(5));

    let b_pending = sync.registry().get(&b.address()).map(|s| s.pending());
    assert_eq!(
        sync.add_packet(&b.address(), b.message(4, &[0xB])),
        SlotOutcome::Rejected(4)
    );
    // the slot it completes was already released on timeout
    assert_eq!(
        sync.add_packet(&b.address(), b.message(5, &[0xB])),
        SlotOutcome::Rejected(5)
    );

    assert!(sync.transport().is_empty());
    assert!(sync.scheduler().is_empty());
    let stream = sync.registry().get(&b.address());
    assert_eq!(stream.map(|s| s.pending()), b_pending);
    assert_eq!(stream.map(|s| s.has(4)), Some(false));
    assert_eq!(sync.stats().rejected_late, 3);
}

#[test]
fn slots_after_the_oldest_accepted_are_still_buffered() {
    let a = TestSender::new("10.0.0.1:5000", 0, PERIOD);
    let b = TestSender::new("10.0.0.2:5000", 0, PERIOD);
    let mut sync = synchronizer(OutputPolicyKind::Broadcast);
    start_session(&mut sync, &a, &b, 0);

    sync.add_packet(&a.address(), a.message(6, &[0xA]));
    sync.add_packet(&a.address(), a.message(5, &[0xA]));
    // slot 6 times out first
    assert_eq!(sync.check_and_send(6), TimeoutOutcome::Expired);
    assert_eq!(sync.check_and_send(5), TimeoutOutcome::Expired);
    assert_eq!(sync.oldest_accepted_slot(), Some(6));

    assert_eq!(
        sync.add_packet(&b.address(), b.message(7, &[0xB])),
        SlotOutcome::Pending(7)
    );
}

#[test]
fn released_slot_timeout_after_a_later_timeout_reports_already_released() {
    let a = TestSender::new("10.0.0.1:5000", 0, PERIOD);
    let b = TestSender::new("10.0.0.2:5000", 0, PERIOD);
    let mut sync = synchronizer(OutputPolicyKind::Broadcast);
    start_session(&mut sync, &a, &b, 0);

    // slot 8 arrives before slot 7 is complete
    assert_eq!(
        sync.add_packet(&a.address(), a.message(8, &[0xA])),
        SlotOutcome::Pending(8)
    );
    assert_eq!(
        sync.add_packet(&a.address(), a.message(7, &[0xA])),
        SlotOutcome::Pending(7)
    );
    assert_eq!(
        sync.add_packet(&b.address(), b.message(7, &[0xB])),
        SlotOutcome::Released(7)
    );
    assert_eq!(sync.scheduler_mut().take_all(), vec![8, 7, 7]);

    assert_eq!(sync.check_and_send(8), TimeoutOutcome::Expired);
    assert_eq!(sync.oldest_accepted_slot(), Some(8));
    assert!(sync.is_released(7));

    assert_eq!(sync.check_and_send(7), TimeoutOutcome::AlreadyReleased);
    assert_eq!(sync.check_and_send(7), TimeoutOutcome::AlreadyReleased);
    // the last timeout of slot 7 drops its record
    assert!(!sync.is_released(7));
    assert_eq!(sync.oldest_accepted_slot(), Some(8));

    assert_eq!(sync.stats().released, 3);
    assert_eq!(sync.stats().expired, 1);
    assert_eq!(sync.stats().empty_timeouts, 0);
}
