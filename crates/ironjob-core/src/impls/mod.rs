//! Impls - ports の実装（開発用・テスト用）
//!
//! 本番用のリモートクライアントは別クレートに置く想定です。

pub mod inmem_remote;

pub use self::inmem_remote::{InMemoryRemoteQueue, PendingMessage, RemoteCall};
