//! Load-progress reporting.
//!
//! Loaders push [`ProgressEvent`]s into a [`ProgressSink`]. The sink wraps an
//! unbounded channel, so emitting never waits on the consumer, and a sink
//! without a receiver (or whose receiver was dropped) silently discards
//! events.

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// A structured load-progress record.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// A loader started resolving `file` for resource `name`.
    Initiate { name: String, file: String },
    /// The file is being downloaded.
    Download { name: String, file: String },
    /// Partial progress, `progress` in percent.
    Progress {
        name: String,
        file: String,
        progress: f32,
        loaded: u64,
        total: u64,
    },
    /// The file finished loading.
    Done { name: String, file: String },
    /// Every resource needed for synthesis is loaded.
    Ready,
}

/// Non-blocking destination for [`ProgressEvent`]s.
#[derive(Debug, Clone, Default)]
pub struct ProgressSink {
    tx: Option<UnboundedSender<ProgressEvent>>,
}

impl ProgressSink {
    /// A sink that drops everything.
    pub fn none() -> Self {
        Self { tx: None }
    }

    /// A sink paired with the receiver that observes its events.
    pub fn channel() -> (Self, UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn emit(&self, event: ProgressEvent) {
        if let Some(tx) = &self.tx {
            // A closed receiver only means nobody is listening anymore.
            let _ = tx.send(event);
        }
    }

    pub fn is_attached(&self) -> bool {
        self.tx.as_ref().is_some_and(|tx| !tx.is_closed())
    }
}

impl From<UnboundedSender<ProgressEvent>> for ProgressSink {
    fn from(tx: UnboundedSender<ProgressEvent>) -> Self {
        Self { tx: Some(tx) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detached_sink_discards_events() {
        let sink = ProgressSink::none();
        assert!(!sink.is_attached());
        sink.emit(ProgressEvent::Ready);
    }

    #[test]
    fn dropped_receiver_does_not_block_emit() {
        let (sink, rx) = ProgressSink::channel();
        drop(rx);
        assert!(!sink.is_attached());
        sink.emit(ProgressEvent::Ready);
    }

    #[test]
    fn events_arrive_in_order() {
        let (sink, mut rx) = ProgressSink::channel();
        sink.emit(ProgressEvent::Initiate {
            name: "m".into(),
            file: "f".into(),
        });
        sink.emit(ProgressEvent::Ready);

        assert!(matches!(rx.try_recv(), Ok(ProgressEvent::Initiate { .. })));
        assert_eq!(rx.try_recv().ok(), Some(ProgressEvent::Ready));
        assert!(rx.try_recv().is_err());
    }
}
