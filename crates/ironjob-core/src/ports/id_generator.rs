//! IdGenerator port - ID 生成の抽象化
//!
//! リモートサービスの代わりに ID を発行する実装（InMemoryRemoteQueue など）が使います。
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース

use crate::domain::{MessageId, ReservationId};
use crate::ports::Clock;
use ulid::Ulid;

pub trait IdGenerator: Send + Sync {
    fn generate_message_id(&self) -> MessageId;

    fn generate_reservation_id(&self) -> ReservationId;
}

/// UlidGenerator は ULID ベースの ID 生成器
///
/// Clock を使うので、FixedClock なら timestamp 部分が決定的になります。
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next_ulid(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis().max(0) as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_message_id(&self) -> MessageId {
        MessageId::new(self.next_ulid().to_string())
    }

    fn generate_reservation_id(&self) -> ReservationId {
        ReservationId::new(self.next_ulid().to_string())
    }
}
