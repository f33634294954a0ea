//! Event channel implementation using crossbeam-channel.
//!
//! Rename workers run on rayon threads, so the sender must be cheap to
//! clone and safe to share across them. A detached sender carries no
//! channel at all, which keeps silent runs (previews, internal reverts)
//! free of allocation.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use std::time::Duration;

use super::{BatchEvent, BatchSummary, Event};

/// Sends batch and undo progress from the executor.
#[derive(Clone, Default)]
pub struct EventSender {
    inner: Option<Sender<Event>>,
}

impl EventSender {
    /// A sender that drops every event.
    pub fn detached() -> Self {
        Self { inner: None }
    }

    /// Whether anyone can still hear this sender.
    pub fn is_attached(&self) -> bool {
        self.inner.is_some()
    }

    /// Send an event.
    ///
    /// Events sent after the receiver is gone are discarded; a UI closing
    /// its window must not abort a batch halfway through the commit phase.
    pub fn send(&self, event: Event) {
        if let Some(sender) = &self.inner {
            if sender.send(event).is_err() {
                tracing::trace!("event receiver dropped");
            }
        }
    }
}

/// Receives progress on the UI side.
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Block until the next event is received
    pub fn recv(&self) -> Option<Event> {
        self.inner.recv().ok()
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&self) -> Option<Event> {
        self.inner.try_recv().ok()
    }

    /// Drain every event currently queued
    pub fn drain(&self) -> Vec<Event> {
        self.inner.try_iter().collect()
    }

    /// Returns an iterator over received events
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }

    /// Collect the events of one run, up to and including its terminal event.
    ///
    /// Returns early with what was seen if `timeout` passes between two
    /// events or every sender is dropped.
    pub fn until_finished(&self, timeout: Duration) -> Vec<Event> {
        let mut seen = Vec::new();
        while let Ok(event) = self.inner.recv_timeout(timeout) {
            let last = event.is_terminal();
            seen.push(event);
            if last {
                break;
            }
        }
        seen
    }

    /// Summaries of every batch that completed among the queued events.
    pub fn completed_batches(&self) -> Vec<BatchSummary> {
        self.inner
            .try_iter()
            .filter_map(|event| match event {
                Event::Batch(BatchEvent::Completed { summary }) => Some(summary),
                _ => None,
            })
            .collect()
    }
}

/// A channel between the renamer and a UI layer.
pub struct EventChannel;

impl EventChannel {
    /// Create a new unbounded event channel.
    pub fn new() -> (EventSender, EventReceiver) {
        Self::wrap(unbounded())
    }

    /// Create a bounded event channel with the specified capacity.
    ///
    /// Senders block once the channel is full, which throttles a batch
    /// to the pace of a slow UI.
    pub fn bounded(capacity: usize) -> (EventSender, EventReceiver) {
        Self::wrap(bounded(capacity))
    }

    fn wrap((sender, receiver): (Sender<Event>, Receiver<Event>)) -> (EventSender, EventReceiver) {
        (
            EventSender {
                inner: Some(sender),
            },
            EventReceiver { inner: receiver },
        )
    }
}

impl Default for EventChannel {
    fn default() -> Self {
        EventChannel
    }
}

/// Sender for runs nobody watches.
pub fn null_sender() -> EventSender {
    EventSender::detached()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{BatchPhase, UndoEvent};
    use std::path::PathBuf;
    use std::thread;

    fn summary(batch_id: &str, succeeded: usize) -> BatchSummary {
        BatchSummary {
            batch_id: batch_id.into(),
            succeeded,
            failed: 0,
            skipped: 0,
            stranded: 0,
            duration_ms: 1,
        }
    }

    #[test]
    fn commits_arrive_from_worker_threads() {
        let (sender, receiver) = EventChannel::new();

        let workers: Vec<_> = ["/b.txt", "/c.txt"]
            .into_iter()
            .map(|target| {
                let sender = sender.clone();
                thread::spawn(move || {
                    sender.send(Event::Batch(BatchEvent::Committed {
                        source: PathBuf::from("/a.txt"),
                        target: PathBuf::from(target),
                    }));
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let mut targets: Vec<PathBuf> = receiver
            .drain()
            .into_iter()
            .filter_map(|event| match event {
                Event::Batch(BatchEvent::Committed { target, .. }) => Some(target),
                _ => None,
            })
            .collect();
        targets.sort();
        assert_eq!(targets, vec![PathBuf::from("/b.txt"), PathBuf::from("/c.txt")]);
    }

    #[test]
    fn null_sender_is_detached() {
        let sender = null_sender();
        assert!(!sender.is_attached());
        sender.send(Event::Batch(BatchEvent::PhaseChanged {
            phase: BatchPhase::Staging,
        }));
    }

    #[test]
    fn sending_after_the_ui_closes_is_harmless() {
        let (sender, receiver) = EventChannel::bounded(1);
        drop(receiver);

        assert!(sender.is_attached());
        sender.send(Event::Batch(BatchEvent::ConflictsFound { count: 1 }));
    }

    #[test]
    fn until_finished_stops_at_the_terminal_event() {
        let (sender, receiver) = EventChannel::new();
        sender.send(Event::Undo(UndoEvent::Started {
            batch_id: "b1".into(),
            operations: 1,
        }));
        sender.send(Event::Undo(UndoEvent::Completed {
            batch_id: "b1".into(),
            succeeded: 1,
            failed: 0,
        }));
        sender.send(Event::Batch(BatchEvent::PhaseChanged {
            phase: BatchPhase::Collecting,
        }));

        let run = receiver.until_finished(Duration::from_millis(50));

        assert_eq!(run.len(), 2);
        assert!(run[1].is_terminal());
        assert_eq!(receiver.drain().len(), 1);
    }

    #[test]
    fn until_finished_returns_partial_run_when_senders_drop() {
        let (sender, receiver) = EventChannel::new();
        sender.send(Event::Batch(BatchEvent::PhaseChanged {
            phase: BatchPhase::Staging,
        }));
        drop(sender);

        assert_eq!(receiver.until_finished(Duration::from_secs(1)).len(), 1);
    }

    #[test]
    fn completed_batches_skips_progress_events() {
        let (sender, receiver) = EventChannel::bounded(4);
        sender.send(Event::Batch(BatchEvent::PhaseChanged {
            phase: BatchPhase::Committing,
        }));
        sender.send(Event::Batch(BatchEvent::Completed {
            summary: summary("first", 2),
        }));
        sender.send(Event::Batch(BatchEvent::Completed {
            summary: summary("second", 1),
        }));

        let done = receiver.completed_batches();

        assert_eq!(done.len(), 2);
        assert_eq!(done[0].batch_id, "first");
        assert!(receiver.try_recv().is_none());
    }
}
