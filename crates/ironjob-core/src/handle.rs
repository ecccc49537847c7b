//! JobHandle - one reserved (or pushed) message and its lifecycle.
//!
//! # 状態遷移
//! - Reserved -> Deleted: pull なら remote delete、push なら何もしない
//! - Reserved -> Released: pull なら delete してから recreate、push なら recreate のみ
//!
//! # release の既知のリスク（at-most-once）
//! pull モードの release は delete と recreate の 2 ステップです。delete 成功後に
//! recreate が失敗すると、ジョブは remote から消えたまま再投入されません。
//! この場合は `JobError::Inconsistent` を返し、`error!` ログを出します。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::domain::{Delivery, MessageId, QueueMessage, Settlement};
use crate::error::JobError;
use crate::job::Job;
use crate::ports::RemoteQueue;

pub struct JobHandle {
    remote: Arc<dyn RemoteQueue>,
    message: QueueMessage,
    settlement: Settlement,
}

impl JobHandle {
    pub fn new(remote: Arc<dyn RemoteQueue>, message: QueueMessage) -> Self {
        Self {
            remote,
            message,
            settlement: Settlement::default(),
        }
    }

    /// The remote client this handle finalizes against.
    pub fn remote(&self) -> &Arc<dyn RemoteQueue> {
        &self.remote
    }

    /// The underlying message.
    pub fn message(&self) -> &QueueMessage {
        &self.message
    }

    pub fn is_pushed(&self) -> bool {
        self.message.is_pushed()
    }

    fn ensure_reserved(&self) -> Result<(), JobError> {
        if self.settlement.is_deleted_or_released() {
            return Err(JobError::AlreadyFinalized {
                state: self.settlement.state(),
            });
        }
        Ok(())
    }

    /// Remove the current reservation. Pushed messages have none, so this is a no-op for them.
    async fn delete_reservation(&mut self, queue: &str) -> Result<(), JobError> {
        self.settlement.mark_deleted();

        let Delivery::Reserved(reservation) = self.message.delivery() else {
            debug!(
                message_id = %self.message.id(),
                queue,
                "pushed message is acknowledged by the callback; skipping remote delete"
            );
            return Ok(());
        };

        self.remote
            .delete_message(queue, self.message.id(), reservation)
            .await?;
        debug!(message_id = %self.message.id(), queue, "deleted remote message");
        Ok(())
    }
}

#[async_trait]
impl Job for JobHandle {
    fn job_id(&self) -> &MessageId {
        self.message.id()
    }

    fn raw_body(&self) -> &str {
        self.message.body()
    }

    fn settlement(&self) -> Settlement {
        self.settlement
    }

    async fn delete(&mut self) -> Result<(), JobError> {
        self.ensure_reserved()?;

        // push の ack は callback の応答なので queue は読まない
        if self.message.is_pushed() {
            self.settlement.mark_deleted();
            debug!(
                message_id = %self.message.id(),
                "pushed message is acknowledged by the callback; skipping remote delete"
            );
            return Ok(());
        }

        let queue = self.queue_name()?;
        self.delete_reservation(&queue).await
    }

    async fn release(&mut self, delay: Duration) -> Result<(), JobError> {
        self.ensure_reserved()?;

        // 副作用の前に decode しておく（壊れた body で delete だけ走るのを防ぐ）
        let payload = self.message.payload()?;
        let queue = payload.queue()?.to_string();
        let next = payload.next_attempt();
        let attempts = next.attempts();
        let body = next.to_body()?;

        self.settlement.mark_released();

        let pulled = !self.message.is_pushed();
        if pulled {
            self.delete_reservation(&queue).await?;
        }

        match self.remote.recreate(body, &queue, delay).await {
            Ok(new_id) => {
                info!(
                    message_id = %self.message.id(),
                    new_message_id = %new_id,
                    queue = %queue,
                    attempts,
                    delay_secs = delay.as_secs(),
                    "released job"
                );
                Ok(())
            }
            Err(source) if pulled => {
                error!(
                    message_id = %self.message.id(),
                    queue = %queue,
                    error = %source,
                    "job deleted but not recreated; it is lost"
                );
                Err(JobError::Inconsistent {
                    message_id: self.message.id().clone(),
                    queue,
                    source,
                })
            }
            Err(source) => Err(source.into()),
        }
    }
}
