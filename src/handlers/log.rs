use axum::{Extension, Json, body::Bytes, http::HeaderMap};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use crate::{
    config::ValidationSettings,
    error::ApiError,
    headers::HEADER_REQUEST_ID,
    logger::DualSinkLogger,
    models::MessageResponse,
    record::LogRecord,
    utils::get_header,
};

#[instrument(name = "handlers.log", skip_all)]
pub async fn log_handler(
    headers: HeaderMap,
    Extension(logger): Extension<DualSinkLogger>,
    Extension(validation): Extension<ValidationSettings>,
    body: Bytes,
) -> Result<Json<MessageResponse>, ApiError> {
    let req_id = get_header(&headers, &HEADER_REQUEST_ID);

    let record = LogRecord::from_body(&body, validation, OffsetDateTime::now_utc())
        .inspect_err(|e| info!(msg = "Rejected log submission", req_id = %req_id, reason = %e))?;

    let dispatched = logger.dispatch(&record).await?;

    if dispatched.failed.is_empty() {
        info!(
            msg = "Log entry published",
            req_id = %req_id,
            level = %record.level,
            has_meta = record.meta.is_some()
        );
    } else {
        warn!(
            msg = "Log entry partially published",
            req_id = %req_id,
            level = %record.level,
            failed_sinks = %dispatched.failed.join(", ")
        );
    }

    Ok(Json(MessageResponse {
        message: format!(
            "Log entry received and published to {}",
            logger.destinations()
        ),
    }))
}
