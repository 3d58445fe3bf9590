use config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};
use serde::Deserialize;

const ENV_PREFIX: &str = "LOG_RELAY";

#[derive(Debug, Deserialize, Clone)]
pub struct HttpSettings {
    pub host: String,
    pub port: u16,
}

impl HttpSettings {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CloudWatchSettings {
    pub region: String,
    pub log_group: String,
    pub log_stream: String,
    /// Overrides the regional endpoint, e.g. for a local stack.
    pub endpoint: Option<String>,
    /// Create the log group and stream at startup when they are missing.
    pub create_missing: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexSettings {
    pub endpoint: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub prefix: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSettings {
    /// Forward `meta` to the index sink.
    pub include_meta: bool,
    /// Answer 502 when any sink write fails instead of logging and carrying on.
    pub fail_on_sink_error: bool,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            include_meta: true,
            fail_on_sink_error: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationSettings {
    pub require_timestamp: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub server: HttpSettings,
    pub cloudwatch: CloudWatchSettings,
    pub index: IndexSettings,
    pub dispatch: DispatchSettings,
    pub validation: ValidationSettings,
}

impl ServerConfig {
    /// Defaults, then an optional `config` file, then `LOG_RELAY__*` variables.
    pub fn load() -> anyhow::Result<Self> {
        let settings = Self::builder()?
            .add_source(File::with_name("config").required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<ServerConfig>()?;

        Ok(settings)
    }

    pub fn builder() -> anyhow::Result<ConfigBuilder<DefaultState>> {
        let builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("cloudwatch.region", "us-west-2")?
            .set_default("cloudwatch.log_group", "signals-analytics")?
            .set_default("cloudwatch.log_stream", "signals-analytics-log")?
            .set_default("cloudwatch.create_missing", true)?
            .set_default("index.endpoint", "http://localhost:9200")?
            .set_default("index.prefix", "signals-analytics")?
            .set_default("index.timeout_secs", 10)?
            .set_default("dispatch.include_meta", true)?
            .set_default("dispatch.fail_on_sink_error", true)?
            .set_default("validation.require_timestamp", false)?;

        Ok(builder)
    }
}
