use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::Payload;
use crate::error::RuntimeError;

/// Application logic for one job name.
///
/// Receives the payload's `data`; decode it as you like.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, data: &serde_json::Value) -> Result<(), RuntimeError>;
}

/// Registry of handlers (payload `job` -> handler).
///
/// Design:
/// - Built during initialization (mutable).
/// - Used during runtime (immutable).
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn JobHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register(
        &mut self,
        job: impl Into<String>,
        handler: Arc<dyn JobHandler>,
    ) -> Result<(), RuntimeError> {
        let job = job.into();
        if self.handlers.contains_key(&job) {
            return Err(RuntimeError::DuplicateHandler(job));
        }
        self.handlers.insert(job, handler);
        Ok(())
    }

    pub fn get(&self, job: &str) -> Option<&Arc<dyn JobHandler>> {
        self.handlers.get(job)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Runtime executes a payload by dispatching to a registered handler.
pub struct Runtime {
    registry: Arc<HandlerRegistry>,
}

impl Runtime {
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Execute one payload.
    pub async fn execute(&self, payload: &Payload) -> Result<(), RuntimeError> {
        let job = payload.job().unwrap_or_default();
        let handler = self
            .registry
            .get(job)
            .ok_or_else(|| RuntimeError::HandlerNotFound(job.to_string()))?;

        handler.handle(payload.data()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct OkHandler;

    #[async_trait]
    impl JobHandler for OkHandler {
        async fn handle(&self, _data: &serde_json::Value) -> Result<(), RuntimeError> {
            Ok(())
        }
    }

    struct NeedsName;

    #[async_trait]
    impl JobHandler for NeedsName {
        async fn handle(&self, data: &serde_json::Value) -> Result<(), RuntimeError> {
            data.get("name")
                .and_then(|v| v.as_str())
                .map(|_| ())
                .ok_or_else(|| "missing name".into())
        }
    }

    #[tokio::test]
    async fn runtime_executes_registered_handler() {
        let mut reg = HandlerRegistry::new();
        reg.register("ok", Arc::new(OkHandler)).unwrap();

        let rt = Runtime::new(Arc::new(reg));
        rt.execute(&Payload::new("ok", json!({}), "default"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn handler_sees_data_field() {
        let mut reg = HandlerRegistry::new();
        reg.register("greet", Arc::new(NeedsName)).unwrap();
        let rt = Runtime::new(Arc::new(reg));

        rt.execute(&Payload::new("greet", json!({ "name": "iron" }), "q"))
            .await
            .unwrap();
        let err = rt
            .execute(&Payload::new("greet", json!({}), "q"))
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Failed(ref m) if m == "missing name"));
    }

    #[tokio::test]
    async fn runtime_errors_when_handler_missing() {
        let rt = Runtime::new(Arc::new(HandlerRegistry::new()));

        let err = rt
            .execute(&Payload::new("missing", json!({}), "default"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("handler"));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut reg = HandlerRegistry::new();
        reg.register("ok", Arc::new(OkHandler)).unwrap();
        let err = reg.register("ok", Arc::new(OkHandler)).unwrap_err();
        assert!(matches!(err, RuntimeError::DuplicateHandler(_)));
        assert_eq!(reg.len(), 1);
    }
}
