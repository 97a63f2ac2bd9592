use stats_px::{Configuration, PxClient, PxError};
use std::sync::Arc;
use std::time::Duration;

/// Test that we can create a client and it has expected debug output
#[test]
fn test_client_creation() {
    let config = Arc::new(Configuration {
        base_path: "https://www.pxweb.bfs.admin.ch/api/v1".to_string(),
        user_agent: Some("test-client/1.0".to_string()),
        client: reqwest::Client::new(),
        metadata_timeout: Duration::from_secs(10),
        data_timeout: Duration::from_secs(60),
    });

    let client = PxClient::new(config);

    let debug_str = format!("{:?}", client);
    assert!(debug_str.contains("PxClient"));
    assert!(debug_str.contains("pxweb.bfs.admin.ch"));
}

/// Test error types implement expected traits
#[test]
fn test_error_types() {
    let req_error = PxError::RequestError(Box::new(std::io::Error::other("test error")));
    let _display = format!("{}", req_error);
    let _debug = format!("{:?}", req_error);

    let parse_error = PxError::ParseError(
        serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err(),
    );
    let _display = format!("{}", parse_error);
    let _debug = format!("{:?}", parse_error);

    let api_error = PxError::ApiError {
        status: 404,
        message: "Table not found".to_string(),
    };
    let _display = format!("{}", api_error);
    let _debug = format!("{:?}", api_error);

    fn check_error_trait<T: std::error::Error>(_: T) {}
    check_error_trait(req_error);
}

/// Test that error messages are meaningful
#[test]
fn test_error_messages() {
    let api_error = PxError::ApiError {
        status: 404,
        message: "Table not found".to_string(),
    };

    let message = format!("{}", api_error);
    assert!(message.contains("404"));
    assert!(message.contains("Table not found"));
}
