//! ironjob-core
//!
//! Job lifecycle adapter for a hosted message queue.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, message, payload, state）
//! - **ports**: 抽象化レイヤー（RemoteQueue, Clock, IdGenerator）
//! - **impls**: 実装（InMemoryRemoteQueue など開発用）
//! - **job / handle**: Job trait と JobHandle（delete / release / attempts）
//! - **runtime**: handler registry
//! - **worker**: pull worker group と push 受信
//! - **config / retry**: WorkerConfig と RetryPolicy
//! - **observability**: tracing 初期化とカウンタ
//! - **error**: エラー型
//!
//! # 配送モード
//! - pull: reserve したメッセージは reservation 付きで明示的に delete する
//! - push: サービスがコールバックで配送し、応答で ack される（delete はしない）

pub mod config;
pub mod domain;
pub mod error;
pub mod handle;
pub mod impls;
pub mod job;
pub mod observability;
pub mod ports;
pub mod retry;
pub mod runtime;
pub mod worker;

pub use config::WorkerConfig;
pub use error::{ConfigError, JobError, RuntimeError};
pub use handle::JobHandle;
pub use job::Job;
pub use retry::RetryPolicy;
pub use runtime::{HandlerRegistry, JobHandler, Runtime};
pub use worker::{Outcome, WorkerGroup, process_job, receive_pushed};
