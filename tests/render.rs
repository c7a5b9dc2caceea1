//! Integration tests for rendered output: the HTTP response a client sees
//! and the connection manager configuration handed to the proxy.

mod common;

use common::*;
use error_response_mapper::{Config, envoy};
use hyper::StatusCode;
use hyper::header::CONTENT_TYPE;
use serde_json::json;

#[tokio::test]
async fn rate_limited_response_is_rendered() {
    let mappers = default_mappers();
    let artifact = mappers.select(&flagged("RL")).unwrap();

    let resp = artifact.to_response().unwrap();
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(resp.headers()[CONTENT_TYPE], "application/json");

    let body = collect_json(resp.into_body()).await;
    assert_eq!(
        body,
        json!({
            "code": "102517",
            "message": "Too Many Requests",
            "description": "Rate limit exceeded"
        })
    );
}

#[tokio::test]
async fn authz_denial_response_is_rendered() {
    let mappers = default_mappers();
    let artifact = mappers.select(&flagged("UAEX")).unwrap();

    let resp = artifact.to_response().unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = collect_json(resp.into_body()).await;
    assert_eq!(body["code"], "102519");
}

#[test]
fn connection_manager_json_keeps_mapper_order() {
    let mappers = default_mappers();
    let value: serde_json::Value =
        serde_json::from_str(&envoy::to_json(&mappers).unwrap()).unwrap();
    let listed = value["mappers"].as_array().unwrap();

    assert_eq!(listed.len(), mappers.len());
    for (artifact, mapper) in mappers.iter().zip(listed) {
        assert_eq!(mapper["status_code"], artifact.status_code());
        assert_eq!(
            mapper["body_format_override"]["json_format"]["code"],
            artifact.body().code.as_str()
        );
    }
    assert!(listed.last().unwrap()["filter"]["and_filter"].is_object());
}

#[test]
fn config_file_renders_yaml() {
    let mappers = Config::load_from_file("./Config.yml")
        .and_then(Config::into_mappers)
        .unwrap();
    let yaml = envoy::to_yaml(&mappers).unwrap();
    assert!(yaml.contains("response_flag_filter"));
    assert!(yaml.contains("match_if_key_not_found: true"));
    assert!(yaml.contains("choreo-connect-enforcer-reply"));
}
