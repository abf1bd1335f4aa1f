//! Event channel implementation using crossbeam-channel.
//!
//! The engine holds an [`EventSender`]; the front end drains the matching
//! [`EventReceiver`] on its own thread.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};

use super::Event;

/// Sends events from the engine.
///
/// Cheap to clone. Sending never fails the run; on a bounded channel it
/// waits for the front end to catch up.
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<Event>,
}

impl EventSender {
    /// Send an event.
    ///
    /// If the receiver is gone the event is dropped; progress reporting is
    /// optional.
    pub fn send(&self, event: Event) {
        let _ = self.inner.send(event);
    }
}

/// Receives events from the engine.
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Block until the next event, `None` once every sender is dropped
    pub fn recv(&self) -> Option<Event> {
        self.inner.recv().ok()
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&self) -> Option<Event> {
        self.inner.try_recv().ok()
    }

    /// Iterate until every sender is dropped
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }
}

/// Connects the engine to a front end.
pub struct EventChannel;

impl EventChannel {
    /// Create a new unbounded event channel.
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver) = unbounded();
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }

    /// Create a bounded event channel.
    ///
    /// With a capacity of zero every send waits until the front end has
    /// taken the event, which keeps the engine in step with it.
    pub fn bounded(capacity: usize) -> (EventSender, EventReceiver) {
        let (sender, receiver) = bounded(capacity);
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }
}

/// A sender whose receiver is already gone, for runs without a front end.
pub fn null_sender() -> EventSender {
    let (sender, _receiver) = EventChannel::new();
    sender
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ClassifyEvent, IncomingCounters, IntakePhase, PipelineEvent};
    use std::thread;

    #[test]
    fn counters_can_be_sent_across_threads() {
        let (sender, receiver) = EventChannel::new();

        let handle = thread::spawn(move || {
            sender.send(Event::Classify(ClassifyEvent::Progress(IncomingCounters {
                registered: 4,
                ..Default::default()
            })));
        });

        handle.join().unwrap();

        match receiver.recv().unwrap() {
            Event::Classify(ClassifyEvent::Progress(c)) => assert_eq!(c.registered, 4),
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn bounded_channel_hands_events_over_in_order() {
        let (sender, receiver) = EventChannel::bounded(0);

        let handle = thread::spawn(move || {
            sender.send(Event::Pipeline(PipelineEvent::PhaseChanged {
                phase: IntakePhase::SavingCatalog,
            }));
            sender.send(Event::Pipeline(PipelineEvent::Cancelled));
        });

        assert!(matches!(
            receiver.recv(),
            Some(Event::Pipeline(PipelineEvent::PhaseChanged { .. }))
        ));
        assert!(matches!(
            receiver.recv(),
            Some(Event::Pipeline(PipelineEvent::Cancelled))
        ));
        handle.join().unwrap();
        assert!(receiver.recv().is_none());
    }

    #[test]
    fn null_sender_does_not_panic() {
        let sender = null_sender();
        sender.send(Event::Pipeline(PipelineEvent::Cancelled));
    }

    #[test]
    fn receiver_ends_when_senders_drop() {
        let (sender, receiver) = EventChannel::new();
        sender.send(Event::Pipeline(PipelineEvent::Cancelled));
        drop(sender);

        assert_eq!(receiver.iter().count(), 1);
        assert!(receiver.try_recv().is_none());
    }
}
