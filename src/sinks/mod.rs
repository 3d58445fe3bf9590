use async_trait::async_trait;
use mockall::automock;
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::models::Level;

pub mod cloudwatch;
pub mod elasticsearch;
pub use cloudwatch::CloudWatchSink;
pub use elasticsearch::ElasticsearchSink;

/// One write to a sink.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkEvent {
    pub level: Level,
    pub message: String,
    pub timestamp: OffsetDateTime,
    /// Structured payload for sinks that store documents rather than lines.
    pub extras: Option<Map<String, Value>>,
}

#[async_trait]
#[automock]
pub trait LogSink: Send + Sync {
    /// Name used in responses and logs
    fn name(&self) -> &'static str;

    /// Best-effort write of a single event. Returning `Ok` only means the
    /// remote call completed.
    async fn write(&self, event: &SinkEvent) -> anyhow::Result<()>;
}

pub type Sink = std::sync::Arc<dyn LogSink + Send + Sync>;
