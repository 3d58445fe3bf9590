use serde_json::{Map, Value};
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, UtcOffset,
    format_description::{
        BorrowedFormatItem,
        well_known::{Iso8601, Rfc3339},
    },
    macros::format_description,
};
use tracing::warn;

use crate::{config::ValidationSettings, error::ValidationError, models::Level};

/// UTC instant with millisecond precision, e.g. `2023-11-14T22:13:20.000Z`.
const ISO_MILLIS: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z");

#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub level: Level,
    pub message: String,
    pub timestamp: OffsetDateTime,
    /// When the request arrived; stamps the log-group event.
    pub received_at: OffsetDateTime,
    pub meta: Option<Value>,
}

impl LogRecord {
    /// Validates a request body. `received_at` stands in for a missing or
    /// unparseable timestamp.
    pub fn from_body(
        body: &[u8],
        settings: ValidationSettings,
        received_at: OffsetDateTime,
    ) -> Result<Self, ValidationError> {
        let value: Value =
            serde_json::from_slice(body).map_err(|_| ValidationError::MalformedJson)?;
        let Value::Object(fields) = value else {
            return Err(ValidationError::NotAnObject);
        };

        Self::from_fields(fields, settings, received_at)
    }

    pub fn from_fields(
        mut fields: Map<String, Value>,
        settings: ValidationSettings,
        received_at: OffsetDateTime,
    ) -> Result<Self, ValidationError> {
        let level = required_str(&fields, "level")?;
        let level = level
            .parse::<Level>()
            .map_err(|unknown| ValidationError::UnknownLevel(unknown.0))?;
        let message = required_str(&fields, "message")?.to_string();

        let timestamp = match fields.get("timestamp").filter(|v| !v.is_null()) {
            Some(raw) => parse_timestamp(raw).unwrap_or_else(|| {
                warn!(
                    msg = "Unparseable timestamp, using receipt time",
                    timestamp = %raw
                );
                received_at
            }),
            None if settings.require_timestamp => {
                return Err(ValidationError::MissingField("timestamp"));
            }
            None => received_at,
        };

        let meta = fields.remove("meta").filter(|v| !v.is_null());

        Ok(Self {
            level,
            message,
            timestamp,
            received_at,
            meta,
        })
    }
}

fn required_str<'a>(
    fields: &'a Map<String, Value>,
    name: &'static str,
) -> Result<&'a str, ValidationError> {
    fields
        .get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or(ValidationError::MissingField(name))
}

/// Accepts epoch milliseconds (number or digit string) and ISO-8601 strings.
/// Strings without an offset are read as UTC. Instants outside years
/// 0000..=9999 are rejected so they always render as four-digit years.
pub fn parse_timestamp(raw: &Value) -> Option<OffsetDateTime> {
    parse_instant(raw).filter(|ts| (0..=9999).contains(&ts.to_offset(UtcOffset::UTC).year()))
}

fn parse_instant(raw: &Value) -> Option<OffsetDateTime> {
    match raw {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .and_then(from_epoch_millis),
        Value::String(s) => {
            let s = s.trim();
            if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
                return s.parse::<i64>().ok().and_then(from_epoch_millis);
            }

            OffsetDateTime::parse(s, &Rfc3339)
                .or_else(|_| OffsetDateTime::parse(s, &Iso8601::DEFAULT))
                .or_else(|_| {
                    PrimitiveDateTime::parse(s, &Iso8601::DEFAULT).map(|dt| dt.assume_utc())
                })
                .or_else(|_| {
                    Date::parse(s, &Iso8601::DEFAULT).map(|d| d.midnight().assume_utc())
                })
                .ok()
        }
        _ => None,
    }
}

fn from_epoch_millis(millis: i64) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).ok()
}

pub fn iso_millis(timestamp: OffsetDateTime) -> Result<String, time::error::Format> {
    timestamp.to_offset(UtcOffset::UTC).format(ISO_MILLIS)
}
