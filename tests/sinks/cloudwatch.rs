use aws_sdk_cloudwatchlogs::{
    Client, Config,
    config::{BehaviorVersion, Credentials, Region, retry::RetryConfig},
};
use log_relay::{
    models::Level,
    sinks::{CloudWatchSink, LogSink, SinkEvent},
};
use mockito::{Matcher, Mock, ServerGuard};
use serde_json::json;
use time::macros::datetime;

const AMZ_JSON: &str = "application/x-amz-json-1.1";

fn sink(server: &ServerGuard) -> CloudWatchSink {
    let config = Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-west-2"))
        .endpoint_url(server.url())
        .credentials_provider(Credentials::new("AKIDTEST", "secret", None, None, "tests"))
        .retry_config(RetryConfig::disabled())
        .build();

    CloudWatchSink::new(
        Client::from_conf(config),
        "signals-analytics".to_string(),
        "signals-analytics-log".to_string(),
    )
}

fn event() -> SinkEvent {
    SinkEvent {
        level: Level::Error,
        message: "failed".to_string(),
        timestamp: datetime!(2023-11-14 22:13:20.123 UTC),
        extras: None,
    }
}

async fn mock_target(
    server: &mut ServerGuard,
    target: &str,
    status: usize,
    body: &str,
) -> Mock {
    server
        .mock("POST", "/")
        .match_header("x-amz-target", format!("Logs_20140328.{target}").as_str())
        .with_status(status)
        .with_header("content-type", AMZ_JSON)
        .with_body(body)
        .create_async()
        .await
}

#[tokio::test]
async fn success_put_log_events() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .match_header("x-amz-target", "Logs_20140328.PutLogEvents")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({
                "logGroupName": "signals-analytics",
                "logStreamName": "signals-analytics-log"
            })),
            Matcher::Regex(r#""message":"error - failed""#.to_string()),
            Matcher::Regex(r#""timestamp":1700000000123"#.to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", AMZ_JSON)
        .with_body(r#"{"nextSequenceToken":"49640"}"#)
        .create_async()
        .await;

    let result = sink(&server).write(&event()).await;

    assert!(result.is_ok(), "{result:?}");
    mock.assert_async().await;
}

#[tokio::test]
async fn error_rejected_event() {
    let mut server = mockito::Server::new_async().await;
    let mock = mock_target(
        &mut server,
        "PutLogEvents",
        200,
        r#"{"rejectedLogEventsInfo":{"tooOldLogEventEndIndex":1}}"#,
    )
    .await;

    let result = sink(&server).write(&event()).await;

    assert!(result.is_err());
    mock.assert_async().await;
}

#[tokio::test]
async fn error_status() {
    let mut server = mockito::Server::new_async().await;
    let mock = mock_target(
        &mut server,
        "PutLogEvents",
        400,
        r#"{"__type":"ResourceNotFoundException","message":"The specified log stream does not exist."}"#,
    )
    .await;

    let result = sink(&server).write(&event()).await;

    assert!(result.is_err());
    mock.assert_async().await;
}

#[tokio::test]
async fn success_ensure_destination_creates() {
    let mut server = mockito::Server::new_async().await;
    let group = mock_target(&mut server, "CreateLogGroup", 200, "{}").await;
    let stream = mock_target(&mut server, "CreateLogStream", 200, "{}").await;

    let result = sink(&server).ensure_destination().await;

    assert!(result.is_ok(), "{result:?}");
    group.assert_async().await;
    stream.assert_async().await;
}

#[tokio::test]
async fn success_ensure_destination_already_exists() {
    let mut server = mockito::Server::new_async().await;
    let group = mock_target(
        &mut server,
        "CreateLogGroup",
        400,
        r#"{"__type":"ResourceAlreadyExistsException","message":"The specified log group already exists"}"#,
    )
    .await;
    let stream = mock_target(
        &mut server,
        "CreateLogStream",
        400,
        r#"{"__type":"ResourceAlreadyExistsException","message":"The specified log stream already exists"}"#,
    )
    .await;

    let result = sink(&server).ensure_destination().await;

    assert!(result.is_ok(), "{result:?}");
    group.assert_async().await;
    stream.assert_async().await;
}

#[tokio::test]
async fn error_ensure_destination() {
    let mut server = mockito::Server::new_async().await;
    let group = mock_target(
        &mut server,
        "CreateLogGroup",
        400,
        r#"{"__type":"InvalidParameterException","message":"Invalid log group name"}"#,
    )
    .await;
    let stream = server
        .mock("POST", "/")
        .match_header("x-amz-target", "Logs_20140328.CreateLogStream")
        .expect(0)
        .create_async()
        .await;

    let result = sink(&server).ensure_destination().await;

    assert!(result.is_err());
    group.assert_async().await;
    stream.assert_async().await;
}
