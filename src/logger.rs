use anyhow::bail;
use serde_json::Value;
use tracing::{error, instrument};

use crate::{
    config::DispatchSettings,
    error::DispatchError,
    models::IndexDocument,
    record::{LogRecord, iso_millis},
    sinks::{Sink, SinkEvent},
};

/// Sinks whose write failed while failures are tolerated.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Dispatched {
    pub failed: Vec<&'static str>,
}

/// Fans each record out to the log-group sink and the search-index sink.
#[derive(Clone)]
pub struct DualSinkLogger {
    log_group: Sink,
    index: Sink,
    settings: DispatchSettings,
}

impl DualSinkLogger {
    pub fn new(log_group: Sink, index: Sink, settings: DispatchSettings) -> Self {
        Self {
            log_group,
            index,
            settings,
        }
    }

    /// Sink names, joined for the confirmation message.
    pub fn destinations(&self) -> String {
        format!("{} and {}", self.log_group.name(), self.index.name())
    }

    pub fn index_document(
        &self,
        record: &LogRecord,
    ) -> Result<IndexDocument, time::error::Format> {
        Ok(IndexDocument {
            message: record.message.clone(),
            level: record.level,
            timestamp: iso_millis(record.timestamp)?,
            meta: record.meta.clone().filter(|_| self.settings.include_meta),
        })
    }

    /// Writes to both sinks concurrently. Both writes are always attempted.
    /// The log-group event is stamped with the receipt time; the record's own
    /// timestamp only travels in the index document.
    #[instrument(name = "dual_sink_logger.dispatch", skip_all, fields(level = %record.level))]
    pub async fn dispatch(&self, record: &LogRecord) -> Result<Dispatched, DispatchError> {
        let group_event = SinkEvent {
            level: record.level,
            message: record.message.clone(),
            timestamp: record.received_at,
            extras: None,
        };

        let (group_result, index_result) = tokio::join!(
            self.log_group.write(&group_event),
            self.write_index(record, &group_event)
        );

        let mut failed = Vec::new();
        for (sink, result) in [(&self.log_group, group_result), (&self.index, index_result)] {
            if let Err(e) = result {
                error!(msg = "Sink write failed", sink = sink.name(), error = %e);
                failed.push(sink.name());
            }
        }

        if failed.is_empty() || !self.settings.fail_on_sink_error {
            return Ok(Dispatched { failed });
        }

        Err(DispatchError::Sinks { sinks: failed })
    }

    async fn write_index(
        &self,
        record: &LogRecord,
        group_event: &SinkEvent,
    ) -> anyhow::Result<()> {
        let document = serde_json::to_value(self.index_document(record)?)?;
        let Value::Object(extras) = document else {
            bail!("index document did not serialize to an object");
        };
        let event = SinkEvent {
            timestamp: record.timestamp,
            extras: Some(extras),
            ..group_event.clone()
        };

        self.index.write(&event).await
    }
}
