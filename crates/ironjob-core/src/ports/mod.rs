//! Ports - 抽象化レイヤー
//!
//! 外部システム（ホスト型メッセージキュー）と時刻・ID 生成への
//! インターフェースを trait として定義し、実装の詳細を隠蔽します。

pub mod clock;
pub mod id_generator;
pub mod remote;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::remote::{RemoteError, RemoteQueue};
