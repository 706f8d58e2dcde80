//! Event Bus (spec.md §4.8): one `tokio::sync::broadcast` channel per room.
//! Grounded on the teacher's `AgentEvent` broadcast
//! (`agent/src/agent.rs`: `broadcast::channel(100)` + `subscribe`), sized
//! here by `subscriber_buffer` (spec.md §5) instead of the teacher's fixed
//! 100, and mapping `RecvError::Lagged` onto `SLOW_CONSUMER` rather than
//! silently skipping missed events.

use debate_core::{Stage, Utterance, UtteranceKind};
use tokio::sync::broadcast;

#[derive(Debug, Clone)]
pub enum RoomEvent {
    TurnStarted { speaker_id: String, kind: UtteranceKind, is_user: bool },
    Thinking { speaker_id: String },
    NewMessage { utterance: Utterance },
    StageChanged { from: Stage, to: Stage },
    RoomEnded { reason: String },
}

/// Per-room publisher. Holds the `broadcast::Sender`; the Registry keeps
/// one of these per live room inside its `RoomHandle`.
pub struct RoomEventBus {
    tx: broadcast::Sender<RoomEvent>,
}

impl RoomEventBus {
    pub fn new(buffer: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer.max(1));
        RoomEventBus { tx }
    }

    /// Late subscribers only receive events produced after this call
    /// (spec.md §4.8: "late subscribers receive only events produced after
    /// subscription"); `broadcast::Receiver` already has this property.
    pub fn subscribe(&self) -> RoomEventReceiver {
        RoomEventReceiver { rx: self.tx.subscribe() }
    }

    pub fn publish(&self, event: RoomEvent) {
        // No active subscribers is not an error; broadcast::send only fails
        // when the receiver count is zero.
        let _ = self.tx.send(event);
    }
}

/// Wraps `broadcast::Receiver` so callers get `debate_core::Error` directly
/// instead of matching on `broadcast::error::RecvError` themselves.
pub struct RoomEventReceiver {
    rx: broadcast::Receiver<RoomEvent>,
}

impl RoomEventReceiver {
    pub async fn recv(&mut self) -> debate_core::Result<RoomEvent> {
        match self.rx.recv().await {
            Ok(event) => Ok(event),
            Err(broadcast::error::RecvError::Lagged(_)) => Err(debate_core::Error::SlowConsumer),
            Err(broadcast::error::RecvError::Closed) => Err(debate_core::Error::SlowConsumer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_published_events_in_order() {
        let bus = RoomEventBus::new(8);
        let mut rx = bus.subscribe();
        bus.publish(RoomEvent::Thinking { speaker_id: "kant".into() });
        bus.publish(RoomEvent::RoomEnded { reason: "debate_complete".into() });

        match rx.recv().await.unwrap() {
            RoomEvent::Thinking { speaker_id } => assert_eq!(speaker_id, "kant"),
            other => panic!("unexpected event: {other:?}"),
        }
        match rx.recv().await.unwrap() {
            RoomEvent::RoomEnded { reason } => assert_eq!(reason, "debate_complete"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn late_subscriber_misses_earlier_events() {
        let bus = RoomEventBus::new(8);
        bus.publish(RoomEvent::Thinking { speaker_id: "kant".into() });
        let mut rx = bus.subscribe();
        bus.publish(RoomEvent::Thinking { speaker_id: "nietzsche".into() });

        match rx.recv().await.unwrap() {
            RoomEvent::Thinking { speaker_id } => assert_eq!(speaker_id, "nietzsche"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn lagging_subscriber_sees_slow_consumer() {
        let bus = RoomEventBus::new(2);
        let mut rx = bus.subscribe();
        for i in 0..5 {
            bus.publish(RoomEvent::Thinking { speaker_id: format!("speaker-{i}") });
        }
        let err = rx.recv().await.unwrap_err();
        assert_eq!(err.kind(), "SLOW_CONSUMER");
    }
}
