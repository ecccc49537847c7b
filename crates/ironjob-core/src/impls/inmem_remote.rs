//! InMemoryRemoteQueue - 開発用・テスト用のリモートキュー
//!
//! # 実装詳細
//! - queue 名ごとに VecDeque で FIFO を管理
//! - `recreate` の delay は Clock で判定（FixedClock なら決定的）
//! - delete は reservation の一致を検証
//! - delete / recreate の呼び出しを順番どおり記録（`calls()`）
//!
//! Reservations never expire here; visibility timeouts are left to real services.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::domain::{MessageId, QueueMessage, ReservationId};
use crate::ports::{Clock, IdGenerator, RemoteError, RemoteQueue, SystemClock, UlidGenerator};

/// A mutating call received by the in-memory remote, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    Delete {
        queue: String,
        id: MessageId,
        reservation: ReservationId,
    },
    Recreate {
        body: String,
        queue: String,
        delay: Duration,
    },
}

/// Snapshot of a message still held by the in-memory remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMessage {
    pub id: MessageId,
    pub body: String,
    pub visible_at: DateTime<Utc>,
    pub reserved: bool,
}

#[derive(Debug)]
struct StoredMessage {
    id: MessageId,
    body: String,
    visible_at: DateTime<Utc>,
    reservation: Option<ReservationId>,
}

#[derive(Debug, Default)]
struct RemoteState {
    queues: HashMap<String, VecDeque<StoredMessage>>,
    calls: Vec<RemoteCall>,
}

pub struct InMemoryRemoteQueue {
    state: Mutex<RemoteState>,
    clock: Arc<dyn Clock>,
    ids: UlidGenerator<Arc<dyn Clock>>,
}

impl InMemoryRemoteQueue {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(RemoteState::default()),
            ids: UlidGenerator::new(Arc::clone(&clock)),
            clock,
        }
    }

    /// Put a message on `queue` without recording a call.
    pub async fn seed(&self, queue: &str, body: impl Into<String>) -> MessageId {
        let id = self.ids.generate_message_id();
        let stored = StoredMessage {
            id: id.clone(),
            body: body.into(),
            visible_at: self.clock.now(),
            reservation: None,
        };
        let mut state = self.state.lock().await;
        state
            .queues
            .entry(queue.to_string())
            .or_default()
            .push_back(stored);
        id
    }

    pub async fn calls(&self) -> Vec<RemoteCall> {
        self.state.lock().await.calls.clone()
    }

    pub async fn pending(&self, queue: &str) -> Vec<PendingMessage> {
        let state = self.state.lock().await;
        state
            .queues
            .get(queue)
            .map(|messages| {
                messages
                    .iter()
                    .map(|m| PendingMessage {
                        id: m.id.clone(),
                        body: m.body.clone(),
                        visible_at: m.visible_at,
                        reserved: m.reservation.is_some(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub async fn len(&self, queue: &str) -> usize {
        let state = self.state.lock().await;
        state.queues.get(queue).map_or(0, VecDeque::len)
    }

    pub async fn is_empty(&self, queue: &str) -> bool {
        self.len(queue).await == 0
    }
}

impl Default for InMemoryRemoteQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteQueue for InMemoryRemoteQueue {
    async fn delete_message(
        &self,
        queue: &str,
        id: &MessageId,
        reservation: &ReservationId,
    ) -> Result<(), RemoteError> {
        let mut state = self.state.lock().await;
        state.calls.push(RemoteCall::Delete {
            queue: queue.to_string(),
            id: id.clone(),
            reservation: reservation.clone(),
        });

        let messages = state
            .queues
            .get_mut(queue)
            .ok_or_else(|| RemoteError::QueueNotFound(queue.to_string()))?;
        let position = messages
            .iter()
            .position(|m| &m.id == id)
            .ok_or_else(|| RemoteError::MessageNotFound(id.clone()))?;

        if messages[position].reservation.as_ref() != Some(reservation) {
            return Err(RemoteError::ReservationMismatch {
                message_id: id.clone(),
                reservation: reservation.clone(),
            });
        }

        messages.remove(position);
        Ok(())
    }

    async fn recreate(
        &self,
        body: String,
        queue: &str,
        delay: Duration,
    ) -> Result<MessageId, RemoteError> {
        let delay_chrono = chrono::Duration::from_std(delay)
            .map_err(|e| RemoteError::Rejected {
                status: 400,
                message: format!("invalid delay: {e}"),
            })?;
        let visible_at = self
            .clock
            .now()
            .checked_add_signed(delay_chrono)
            .ok_or_else(|| RemoteError::Rejected {
                status: 400,
                message: format!("delay out of range: {delay:?}"),
            })?;

        let id = self.ids.generate_message_id();
        let mut state = self.state.lock().await;
        state.calls.push(RemoteCall::Recreate {
            body: body.clone(),
            queue: queue.to_string(),
            delay,
        });
        state
            .queues
            .entry(queue.to_string())
            .or_default()
            .push_back(StoredMessage {
                id: id.clone(),
                body,
                visible_at,
                reservation: None,
            });
        Ok(id)
    }

    async fn reserve(&self, queue: &str) -> Result<Option<QueueMessage>, RemoteError> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        let Some(messages) = state.queues.get_mut(queue) else {
            return Ok(None);
        };

        let Some(message) = messages
            .iter_mut()
            .find(|m| m.reservation.is_none() && m.visible_at <= now)
        else {
            return Ok(None);
        };

        let reservation = self.ids.generate_reservation_id();
        message.reservation = Some(reservation.clone());
        Ok(Some(QueueMessage::reserved(
            message.id.clone(),
            message.body.clone(),
            reservation,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::FixedClock;
    use chrono::TimeZone;

    fn fixed_remote() -> (Arc<FixedClock>, InMemoryRemoteQueue) {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let clock = Arc::new(FixedClock::new(start));
        let remote = InMemoryRemoteQueue::with_clock(clock.clone());
        (clock, remote)
    }

    #[tokio::test]
    async fn reserve_then_delete_removes_message() {
        let remote = InMemoryRemoteQueue::new();
        let id = remote.seed("default", "{}").await;

        let message = remote.reserve("default").await.unwrap().unwrap();
        assert_eq!(message.id(), &id);
        let reservation = message.reservation().unwrap().clone();

        remote
            .delete_message("default", &id, &reservation)
            .await
            .unwrap();
        assert!(remote.is_empty("default").await);
        assert_eq!(
            remote.calls().await,
            vec![RemoteCall::Delete {
                queue: "default".into(),
                id,
                reservation,
            }]
        );
    }

    #[tokio::test]
    async fn reserved_message_is_not_handed_out_twice() {
        let remote = InMemoryRemoteQueue::new();
        remote.seed("default", "{}").await;

        assert!(remote.reserve("default").await.unwrap().is_some());
        assert!(remote.reserve("default").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_with_wrong_reservation_is_rejected() {
        let remote = InMemoryRemoteQueue::new();
        let id = remote.seed("default", "{}").await;
        remote.reserve("default").await.unwrap();

        let err = remote
            .delete_message("default", &id, &ReservationId::new("stale"))
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::ReservationMismatch { .. }));
        assert_eq!(remote.len("default").await, 1);
    }

    #[tokio::test]
    async fn delete_on_unknown_queue_or_message_fails() {
        let remote = InMemoryRemoteQueue::new();
        let token = ReservationId::new("r");

        let err = remote
            .delete_message("nope", &MessageId::new("m"), &token)
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::QueueNotFound(_)));

        remote.seed("default", "{}").await;
        let err = remote
            .delete_message("default", &MessageId::new("m"), &token)
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::MessageNotFound(_)));
    }

    #[tokio::test]
    async fn recreated_message_waits_for_delay() {
        let (clock, remote) = fixed_remote();
        let id = remote
            .recreate("{}".into(), "default", Duration::from_secs(30))
            .await
            .unwrap();

        assert!(remote.reserve("default").await.unwrap().is_none());

        clock.advance(Duration::from_secs(29));
        assert!(remote.reserve("default").await.unwrap().is_none());

        clock.advance(Duration::from_secs(1));
        let message = remote.reserve("default").await.unwrap().unwrap();
        assert_eq!(message.id(), &id);
    }

    #[tokio::test]
    async fn recreate_issues_fresh_ids() {
        let remote = InMemoryRemoteQueue::new();
        let a = remote.recreate("{}".into(), "q", Duration::ZERO).await.unwrap();
        let b = remote.recreate("{}".into(), "q", Duration::ZERO).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(remote.pending("q").await.len(), 2);
    }
}
