//! RemoteQueue port - ホスト型メッセージキューへのインターフェース
//!
//! JobHandle から見ると各呼び出しは request/response です。
//! 接続プールやタイムアウトは実装側の責務で、失敗は `RemoteError` として返します。

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{MessageId, QueueMessage, ReservationId};

/// Failures reported by the remote service or its transport.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("queue not found: {0}")]
    QueueNotFound(String),

    #[error("message not found: {0}")]
    MessageNotFound(MessageId),

    /// The reservation expired or belongs to someone else.
    #[error("reservation {reservation} does not hold message {message_id}")]
    ReservationMismatch {
        message_id: MessageId,
        reservation: ReservationId,
    },

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Remote queue client.
///
/// # 契約
/// - `delete_message` は冪等ではない（失敗時はまだ reserve 中の可能性あり）
/// - `recreate` は常に新しい message id を発行する
#[async_trait]
pub trait RemoteQueue: Send + Sync {
    /// Remove a pull-reserved message. Requires the matching reservation.
    async fn delete_message(
        &self,
        queue: &str,
        id: &MessageId,
        reservation: &ReservationId,
    ) -> Result<(), RemoteError>;

    /// Publish `body` as a brand-new message, visible after `delay`.
    async fn recreate(
        &self,
        body: String,
        queue: &str,
        delay: Duration,
    ) -> Result<MessageId, RemoteError>;

    /// Reserve the next visible message, if any.
    async fn reserve(&self, queue: &str) -> Result<Option<QueueMessage>, RemoteError>;
}
