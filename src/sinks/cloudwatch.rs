use anyhow::bail;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_cloudwatchlogs::{Client, types::InputLogEvent};
use tracing::{info, instrument};

use crate::config::CloudWatchSettings;

use super::{LogSink, SinkEvent};

/// Writes one line per event to a CloudWatch Logs stream.
pub struct CloudWatchSink {
    client: Client,
    log_group: String,
    log_stream: String,
}

impl CloudWatchSink {
    pub fn new(client: Client, log_group: String, log_stream: String) -> Self {
        Self {
            client,
            log_group,
            log_stream,
        }
    }

    /// Builds the SDK client from the standard AWS credential chain.
    pub async fn from_settings(settings: &CloudWatchSettings) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()));
        if let Some(endpoint) = &settings.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        Self::new(
            Client::new(&sdk_config),
            settings.log_group.clone(),
            settings.log_stream.clone(),
        )
    }

    /// Creates the log group and stream if they do not exist yet.
    #[instrument(
        name = "cloudwatch_sink.ensure_destination",
        skip(self),
        fields(log_group = %self.log_group, log_stream = %self.log_stream)
    )]
    pub async fn ensure_destination(&self) -> anyhow::Result<()> {
        match self
            .client
            .create_log_group()
            .log_group_name(&self.log_group)
            .send()
            .await
        {
            Ok(_) => info!(msg = "Created log group", log_group = %self.log_group),
            Err(e)
                if e.as_service_error()
                    .is_some_and(|e| e.is_resource_already_exists_exception()) => {}
            Err(e) => return Err(e.into()),
        }

        match self
            .client
            .create_log_stream()
            .log_group_name(&self.log_group)
            .log_stream_name(&self.log_stream)
            .send()
            .await
        {
            Ok(_) => info!(msg = "Created log stream", log_stream = %self.log_stream),
            Err(e)
                if e.as_service_error()
                    .is_some_and(|e| e.is_resource_already_exists_exception()) => {}
            Err(e) => return Err(e.into()),
        }

        Ok(())
    }
}

/// Renders the line stored in the stream, e.g. `info - user login`.
pub fn format_line(event: &SinkEvent) -> String {
    format!("{} - {}", event.level, event.message)
}

pub fn input_event(event: &SinkEvent) -> anyhow::Result<InputLogEvent> {
    let millis = (event.timestamp.unix_timestamp_nanos() / 1_000_000) as i64;

    let input = InputLogEvent::builder()
        .timestamp(millis)
        .message(format_line(event))
        .build()?;

    Ok(input)
}

#[async_trait]
impl LogSink for CloudWatchSink {
    fn name(&self) -> &'static str {
        "CloudWatch"
    }

    #[instrument(name = "cloudwatch_sink.write", skip_all, fields(level = %event.level))]
    async fn write(&self, event: &SinkEvent) -> anyhow::Result<()> {
        let output = self
            .client
            .put_log_events()
            .log_group_name(&self.log_group)
            .log_stream_name(&self.log_stream)
            .log_events(input_event(event)?)
            .send()
            .await?;

        // A 200 can still carry a rejected event (too old, too new or expired).
        if let Some(rejected) = output.rejected_log_events_info() {
            bail!("CloudWatch rejected log event: {rejected:?}");
        }

        Ok(())
    }
}
