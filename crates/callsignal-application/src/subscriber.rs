//! Receiving side of the transcript feed.

use callsignal_core::transcript::{ConnectionState, TranscriptSegment};
use tokio::sync::mpsc;

/// Callbacks invoked by [`crate::FeedScheduler`].
///
/// Both methods run while the scheduler holds its state lock, so an
/// implementation must return promptly and must not call back into the
/// scheduler.
pub trait FeedSubscriber: Send + Sync {
    fn on_segment(&self, segment: &TranscriptSegment);

    fn on_status(&self, state: &ConnectionState);
}

/// Everything a subscriber can observe, in emission order.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    Segment(TranscriptSegment),
    Status(ConnectionState),
}

/// Forwards feed callbacks into an unbounded channel so that async
/// consumers can process them outside the scheduler lock.
#[derive(Debug, Clone)]
pub struct ChannelSubscriber {
    tx: mpsc::UnboundedSender<FeedEvent>,
}

impl ChannelSubscriber {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<FeedEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: FeedEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!(target: "feed", "feed receiver dropped; event discarded");
        }
    }
}

impl FeedSubscriber for ChannelSubscriber {
    fn on_segment(&self, segment: &TranscriptSegment) {
        self.send(FeedEvent::Segment(segment.clone()));
    }

    fn on_status(&self, state: &ConnectionState) {
        self.send(FeedEvent::Status(state.clone()));
    }
}
