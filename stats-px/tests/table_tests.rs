use serde_json::json;
use stats_px::models::{PxQuery, PxQueryEntry, PxResponse, PxSelection};
use stats_px::{Configuration, PxClient, PxError};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> PxClient {
    PxClient::new(Arc::new(Configuration {
        base_path: server.uri(),
        user_agent: Some("stats-px-test/1.0".to_string()),
        client: reqwest::Client::new(),
        metadata_timeout: Duration::from_secs(5),
        data_timeout: Duration::from_secs(5),
    }))
}

#[tokio::test]
async fn test_table_metadata_parses_variables() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/de/px-x-test/px-x-test.px"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "title": "Population by canton",
            "variables": [
                {
                    "code": "Kanton",
                    "text": "Canton",
                    "values": ["ZH", "BE"],
                    "valueTexts": ["Zürich", "Bern"],
                    "elimination": true
                },
                {
                    "code": "Jahr",
                    "text": "Year",
                    "values": ["2020"],
                    "valueTexts": ["2020"],
                    "time": true
                }
            ]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let metadata = client
        .table_metadata("de", "px-x-test")
        .await
        .expect("metadata fetch should succeed");

    assert_eq!(metadata.title.as_deref(), Some("Population by canton"));
    assert_eq!(metadata.variables.len(), 2);
    assert_eq!(metadata.variables[0].code, "Kanton");
    assert_eq!(metadata.variables[0].value_texts[0], "Zürich");
    assert!(metadata.variables[0].elimination);
    assert!(!metadata.variables[0].time);
    assert!(metadata.variables[1].time);
}

#[tokio::test]
async fn test_table_data_posts_query_and_passes_body_through() {
    let server = MockServer::start().await;

    let query = PxQuery {
        query: vec![PxQueryEntry {
            code: "Jahr".to_string(),
            selection: PxSelection::items(vec!["2020".to_string()]),
        }],
        response: PxResponse::default(),
    };

    Mock::given(method("POST"))
        .and(path("/de/px-x-test/px-x-test.px"))
        .and(body_json(json!({
            "query": [
                {"code": "Jahr", "selection": {"filter": "item", "values": ["2020"]}}
            ],
            "response": {"format": "json-stat2"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "version": "2.0",
            "class": "dataset",
            "value": [100.5]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let data = client
        .table_data("de", "px-x-test", &query)
        .await
        .expect("data fetch should succeed");

    assert_eq!(data["class"], "dataset");
    assert_eq!(data["value"][0], 100.5);
}

#[tokio::test]
async fn test_non_json_body_passes_through_as_string() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/fr/px-x-test/px-x-test.px"))
        .respond_with(ResponseTemplate::new(200).set_body_string("a;b\n1;2\n"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let query = PxQuery {
        query: vec![],
        response: PxResponse {
            format: "csv".to_string(),
        },
    };

    let data = client
        .table_data("fr", "px-x-test", &query)
        .await
        .expect("csv fetch should succeed");

    assert_eq!(data, serde_json::Value::String("a;b\n1;2\n".to_string()));
}

#[tokio::test]
async fn test_non_success_status_is_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/de/missing/missing.px"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such table"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    match client.table_metadata("de", "missing").await {
        Err(PxError::ApiError { status, message }) => {
            assert_eq!(status, 404);
            assert!(message.contains("no such table"));
        }
        other => panic!("expected ApiError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_transient_status_is_retried() {
    let server = MockServer::start().await;

    // First attempt hits a 503, the retry lands on the 200 mock.
    Mock::given(method("GET"))
        .and(path("/de/px-x-test/px-x-test.px"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/de/px-x-test/px-x-test.px"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "title": "ok",
            "variables": []
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let metadata = client
        .table_metadata("de", "px-x-test")
        .await
        .expect("retry should recover from a transient 503");

    assert_eq!(metadata.title.as_deref(), Some("ok"));
}

#[tokio::test]
async fn test_client_error_status_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/de/px-x-test/px-x-test.px"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    match client.table_metadata("de", "px-x-test").await {
        Err(PxError::ApiError { status, .. }) => assert_eq!(status, 400),
        other => panic!("expected ApiError, got {:?}", other),
    }
}
