//! Remote identifiers (strongly-typed, opaque strings).
//!
//! リモートキューが発行する ID はどちらも単なる文字列ですが、
//! message id と reservation id を取り違えると delete が別メッセージに
//! 効いてしまうので、Phantom type で型を分けています。
//!
//! ```ignore
//! let id = MessageId::new("6219d7e8");
//! let token = ReservationId::new("a1b2c3");
//! // remote.delete_message("default", &token, &id) // <- does not compile
//! ```

use std::fmt;
use std::marker::PhantomData;

/// IdMarker は各 ID 型のマーカー trait
pub trait IdMarker: Send + Sync + 'static {
    /// Human readable kind, used in error messages and logs.
    fn kind() -> &'static str;
}

/// Opaque identifier issued by the remote service.
///
/// `T` は PhantomData で、実行時にはメモリを消費しません。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id<T: IdMarker> {
    value: String,
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn kind(&self) -> &'static str {
        T::kind()
    }
}

impl<T: IdMarker> From<&str> for Id<T> {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<T: IdMarker> From<String> for Id<T> {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

// ========================================
// マーカー型の定義
// ========================================

/// Message のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Message {}

impl IdMarker for Message {
    fn kind() -> &'static str {
        "message"
    }
}

/// Reservation のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Reservation {}

impl IdMarker for Reservation {
    fn kind() -> &'static str {
        "reservation"
    }
}

/// Identifier of a message on the remote queue.
pub type MessageId = Id<Message>;

/// Lease token proving the holder currently owns a pull-reserved message.
pub type ReservationId = Id<Reservation>;
