use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::{error, info};

use ironjob_core::domain::Payload;
use ironjob_core::impls::InMemoryRemoteQueue;
use ironjob_core::observability::init_tracing;
use ironjob_core::{
    HandlerRegistry, JobHandler, RetryPolicy, Runtime, RuntimeError, WorkerConfig, WorkerGroup,
};

const WAIT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct HelloPayload {
    name: String,
}

struct HelloHandler {
    remaining_failures: AtomicU32,
}

impl HelloHandler {
    fn new(n: u32) -> Self {
        Self {
            remaining_failures: AtomicU32::new(n),
        }
    }
}

#[async_trait]
impl JobHandler for HelloHandler {
    async fn handle(&self, data: &serde_json::Value) -> Result<(), RuntimeError> {
        let p = HelloPayload::deserialize(data).map_err(|e| format!("json decode: {e}"))?;

        let left = self.remaining_failures.load(Ordering::Relaxed);
        if left > 0 {
            self.remaining_failures.fetch_sub(1, Ordering::Relaxed);
            return Err(format!("intentional failure (left={left})").into());
        }

        info!(name = %p.name, "hello");
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    // (A) config: 引数があれば JSON ファイルから、なければデモ用の値
    let config = match std::env::args().nth(1) {
        Some(path) => match WorkerConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                error!(error = %e, "failed to load config");
                std::process::exit(2);
            }
        },
        None => WorkerConfig {
            poll_interval_ms: 50,
            retry: RetryPolicy {
                base_delay_secs: 1,
                multiplier: 1.0,
                max_delay_secs: 1,
            },
            ..WorkerConfig::default()
        },
    };

    // (B) remote queue と handler registry
    let remote = Arc::new(InMemoryRemoteQueue::new());

    let mut reg = HandlerRegistry::new();
    if let Err(e) = reg.register("hello", Arc::new(HelloHandler::new(2))) {
        error!(error = %e, "failed to register handler");
        std::process::exit(1);
    }
    let runtime = Arc::new(Runtime::new(Arc::new(reg)));

    // (C) ジョブ投入（attempts なし = 1 回目）
    let body = match Payload::new("hello", serde_json::json!({ "name": "iron" }), &config.queue)
        .to_body()
    {
        Ok(body) => body,
        Err(e) => {
            error!(error = %e, "failed to encode payload");
            std::process::exit(1);
        }
    };
    let id = remote.seed(&config.queue, body).await;
    info!(message_id = %id, queue = %config.queue, "enqueued job");

    // (D) worker を起動し、ジョブが片付く（delete / 失敗 / エラー）まで待つ
    let group = WorkerGroup::spawn(remote.clone(), runtime, config.clone());
    let settled = group
        .wait_until(WAIT_TIMEOUT, |c| c.deleted + c.failed + c.errors > 0)
        .await;

    let counts = group.shutdown_and_join().await;
    let remaining = remote.len(&config.queue).await;
    info!(
        deleted = counts.deleted,
        released = counts.released,
        failed = counts.failed,
        errors = counts.errors,
        remaining,
        "done"
    );

    if settled.is_none() {
        error!(
            timeout_secs = WAIT_TIMEOUT.as_secs(),
            "job did not settle before the timeout"
        );
        std::process::exit(1);
    }
    if counts.errors > 0 {
        std::process::exit(1);
    }
}
