use log_relay::{
    config::IndexSettings,
    models::Level,
    sinks::{ElasticsearchSink, LogSink, SinkEvent},
};
use mockito::Matcher;
use serde_json::{Value, json};
use time::macros::datetime;

fn settings(endpoint: String, username: Option<&str>) -> IndexSettings {
    IndexSettings {
        endpoint,
        username: username.map(str::to_string),
        password: username.map(|_| "secret".to_string()),
        prefix: "signals-analytics".to_string(),
        timeout_secs: 5,
    }
}

fn event() -> SinkEvent {
    let document = json!({
        "message": "failed",
        "level": "error",
        "timestamp": "2023-11-14T22:13:20.000Z",
        "meta": {"userId": 42}
    });
    let Value::Object(extras) = document else {
        unreachable!()
    };

    SinkEvent {
        level: Level::Error,
        message: "failed".to_string(),
        timestamp: datetime!(2023-11-14 22:13:20 UTC),
        extras: Some(extras),
    }
}

#[tokio::test]
async fn success_with_basic_auth() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/signals-analytics-2023.11.14/_doc")
        .match_header("authorization", "Basic cmVsYXk6c2VjcmV0")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({
            "message": "failed",
            "level": "error",
            "timestamp": "2023-11-14T22:13:20.000Z",
            "meta": {"userId": 42}
        })))
        .with_status(201)
        .with_body(r#"{"result":"created"}"#)
        .create_async()
        .await;

    let sink = ElasticsearchSink::from_settings(&settings(server.url(), Some("relay"))).unwrap();
    let result = sink.write(&event()).await;

    assert!(result.is_ok());
    mock.assert_async().await;
}

#[tokio::test]
async fn success_without_credentials() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/signals-analytics-2023.11.14/_doc")
        .match_header("authorization", Matcher::Missing)
        .with_status(201)
        .create_async()
        .await;

    let endpoint = format!("{}/", server.url());
    let sink = ElasticsearchSink::from_settings(&settings(endpoint, None)).unwrap();
    let result = sink.write(&event()).await;

    assert!(result.is_ok());
    mock.assert_async().await;
}

#[tokio::test]
async fn error_status() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/signals-analytics-2023.11.14/_doc")
        .with_status(503)
        .create_async()
        .await;

    let sink = ElasticsearchSink::from_settings(&settings(server.url(), None)).unwrap();
    let result = sink.write(&event()).await;

    assert!(result.is_err());
    mock.assert_async().await;
}

#[tokio::test]
async fn error_missing_document() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let sink = ElasticsearchSink::from_settings(&settings(server.url(), None)).unwrap();
    let event = SinkEvent {
        extras: None,
        ..event()
    };
    let result = sink.write(&event).await;

    assert!(result.is_err());
    mock.assert_async().await;
}

#[test]
fn index_name_uses_utc_date() {
    let sink = ElasticsearchSink::from_settings(&settings("http://localhost:9200".to_string(), None))
        .unwrap();
    let event = SinkEvent {
        timestamp: datetime!(2024-01-01 01:30:00 +03:00),
        ..event()
    };

    assert_eq!(sink.index_name(&event).unwrap(), "signals-analytics-2023.12.31");
    assert_eq!(sink.name(), "Elasticsearch");
}
