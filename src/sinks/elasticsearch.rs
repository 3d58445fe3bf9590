use std::time::Duration;

use anyhow::bail;
use async_trait::async_trait;
use time::{
    UtcOffset,
    format_description::BorrowedFormatItem,
    macros::format_description,
};
use tracing::{debug, instrument};

use crate::config::IndexSettings;

use super::{LogSink, SinkEvent};

const INDEX_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year].[month].[day]");

/// Indexes one document per event into a daily `<prefix>-YYYY.MM.DD` index.
pub struct ElasticsearchSink {
    client: reqwest::Client,
    endpoint: String,
    prefix: String,
    credentials: Option<(String, Option<String>)>,
}

impl ElasticsearchSink {
    pub fn from_settings(settings: &IndexSettings) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            prefix: settings.prefix.clone(),
            credentials: settings
                .username
                .clone()
                .map(|user| (user, settings.password.clone())),
        })
    }

    pub fn index_name(&self, event: &SinkEvent) -> anyhow::Result<String> {
        let date = event.timestamp.to_offset(UtcOffset::UTC).format(INDEX_DATE)?;
        Ok(format!("{}-{}", self.prefix, date))
    }
}

#[async_trait]
impl LogSink for ElasticsearchSink {
    fn name(&self) -> &'static str {
        "Elasticsearch"
    }

    #[instrument(name = "elasticsearch_sink.write", skip_all, fields(level = %event.level))]
    async fn write(&self, event: &SinkEvent) -> anyhow::Result<()> {
        let url = format!("{}/{}/_doc", self.endpoint, self.index_name(event)?);

        let Some(document) = &event.extras else {
            bail!("event carries no index document");
        };

        let mut request = self.client.post(&url).json(document);
        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user, password.as_ref());
        }

        let response = request.send().await?.error_for_status()?;
        debug!(msg = "Indexed log document", %url, status = %response.status().as_u16());

        Ok(())
    }
}
