use std::{iter::once, sync::Arc, time::Duration};

use axum::{
    Extension, ServiceExt,
    body::Body,
    extract::Request,
    http::{Response, header::AUTHORIZATION},
};
use time::UtcOffset;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    sensitive_headers::SetSensitiveRequestHeadersLayer,
    trace::TraceLayer,
};
use tracing::{Span, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use log_relay::{
    app::App,
    config::ServerConfig,
    headers::HEADER_REQUEST_ID,
    layers::logger::LoggerLayer,
    sinks::{CloudWatchSink, ElasticsearchSink},
    utils::get_request_id,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Use UTC timestamps
    let offset = UtcOffset::UTC;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .json()
                .flatten_event(true)
                .with_timer(fmt::time::OffsetTime::new(
                    offset,
                    time::format_description::well_known::Rfc3339,
                ))
                .with_level(true)
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .with(EnvFilter::from_default_env())
        .try_init()?;

    // Load configuration
    let settings = ServerConfig::load()?;
    info!(
        msg = "Loaded configuration",
        region = %settings.cloudwatch.region,
        log_group = %settings.cloudwatch.log_group,
        log_stream = %settings.cloudwatch.log_stream,
        index_endpoint = %settings.index.endpoint,
        index_prefix = %settings.index.prefix,
        include_meta = settings.dispatch.include_meta,
        fail_on_sink_error = settings.dispatch.fail_on_sink_error,
        require_timestamp = settings.validation.require_timestamp
    );

    // Build sinks
    let cloudwatch = CloudWatchSink::from_settings(&settings.cloudwatch).await;
    if settings.cloudwatch.create_missing {
        cloudwatch.ensure_destination().await?;
    }
    let elasticsearch = ElasticsearchSink::from_settings(&settings.index)?;

    // Build routes
    let app = App::new()
        .router()
        .layer(LoggerLayer::new(
            Arc::new(cloudwatch),
            Arc::new(elasticsearch),
            settings.dispatch,
        ))
        .layer(Extension(settings.validation))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .on_request(|req: &Request<Body>, _span: &Span| {
                    let headers = req
                        .headers()
                        .iter()
                        .filter(|(k, _)| k.as_str() != HEADER_REQUEST_ID.as_str())
                        .map(|(k, v)| {
                            let val = if v.is_sensitive() {
                                "******"
                            } else {
                                v.to_str().unwrap_or("<non-utf8>")
                            };
                            format!("{}: {}", k.as_str(), val)
                        })
                        .collect::<Vec<_>>()
                        .join("; ");

                    info!(
                        msg = "Request initiated",
                        req_id = %get_request_id(req.extensions()),
                        method = %req.method(),
                        uri = %req.uri(),
                        headers = %headers
                    )
                })
                .on_response(|res: &Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        msg = "Request processed",
                        req_id = %get_request_id(res.extensions()),
                        status = %res.status().as_u16(),
                        latency = ?latency
                    )
                }),
        )
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid::default()))
        .layer(SetSensitiveRequestHeadersLayer::new(once(AUTHORIZATION)));

    let addr = settings.server.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(msg = "Starting server", %addr);

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app)).await?;

    Ok(())
}
