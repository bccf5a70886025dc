//! End-to-end tests: stream payloads in, search engine requests out

#![allow(clippy::unwrap_used)] // Tests can unwrap
#![allow(clippy::expect_used)] // Tests can expect

use listing_sync_runtime::config::SearchConfig;
use listing_sync_runtime::{IndexSync, RuntimeError, SyncConfig};
use listing_sync_testing::init_test_tracing;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn sync_for(server: &MockServer) -> IndexSync<listing_sync_opensearch::OpenSearchClient> {
    init_test_tracing();
    let config = SyncConfig {
        search: SearchConfig {
            endpoint: server.uri(),
            ..SearchConfig::default()
        },
        ..SyncConfig::default()
    };
    config.validate().expect("test config is valid");
    IndexSync::connect(&config).expect("client builds")
}

#[tokio::test]
async fn test_screening_insert_payload_writes_list_document() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/screenings/_doc/s1"))
        .and(body_json(json!({
            "id": "s1",
            "title": "Heat",
            "createdAt": 1_704_067_200_000_i64,
            "updatedAt": 1_704_067_200_000_i64
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let payload = json!({
        "Records": [{
            "eventID": "1",
            "eventName": "INSERT",
            "dynamodb": {
                "Keys": {"id": {"S": "s1"}},
                "NewImage": {
                    "id": {"S": "s1"},
                    "title": {"S": "Heat"},
                    "createdAt": {"S": "2024-01-01T00:00:00Z"},
                    "updatedAt": {"S": "2024-01-01T00:00:00Z"}
                }
            }
        }]
    });

    let sync = sync_for(&server).await;
    let attempted = sync
        .process_screening_payload(&payload.to_string())
        .await
        .unwrap();
    assert_eq!(attempted, 1);
}

#[tokio::test]
async fn test_screening_remove_payload_deletes_both_targets() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/screening-s1"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/screenings/_doc/s1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let payload = json!({
        "Records": [{
            "eventID": "2",
            "eventName": "REMOVE",
            "dynamodb": {
                "Keys": {"id": {"S": "s1"}},
                "OldImage": {"id": {"S": "s1"}}
            }
        }]
    });

    let sync = sync_for(&server).await;
    sync.process_screening_payload(&payload.to_string())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_failed_index_deletion_still_deletes_list_document() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/screening-s1"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/screenings/_doc/s1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let payload = json!({
        "Records": [{"eventName": "REMOVE", "dynamodb": {"Keys": {"id": {"S": "s1"}}}}]
    });

    let sync = sync_for(&server).await;
    assert_eq!(
        sync.process_screening_payload(&payload.to_string())
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn test_bad_article_does_not_block_the_rest() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/screening-s1/_doc/a2"))
        .and(body_json(json!({"id": "a2", "screeningId": "s1", "title": "ok"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let payload = json!({
        "Records": [
            {
                "eventName": "INSERT",
                "dynamodb": {
                    "Keys": {"id": {"S": "a1"}},
                    "NewImage": {"id": {"S": "a1"}, "title": {"S": "orphan"}}
                }
            },
            {
                "eventName": "INSERT",
                "dynamodb": {
                    "Keys": {"id": {"S": "a2"}},
                    "NewImage": {
                        "id": {"S": "a2"},
                        "screeningId": {"S": "s1"},
                        "title": {"S": "ok"}
                    }
                }
            }
        ]
    });

    let sync = sync_for(&server).await;
    let attempted = sync
        .process_article_payload(&payload.to_string())
        .await
        .unwrap();
    assert_eq!(attempted, 2);
}

#[tokio::test]
async fn test_malformed_envelope_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let sync = sync_for(&server).await;
    let result = sync.process_article_payload("not json").await;
    assert!(matches!(result, Err(RuntimeError::Payload(_))));
}

#[tokio::test]
async fn test_wildcard_screening_id_sends_no_delete() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let payload = json!({
        "Records": [
            {"eventName": "REMOVE", "dynamodb": {"Keys": {"id": {"S": "*"}}}},
            {"eventName": "REMOVE", "dynamodb": {"Keys": {"id": {"S": "x,screenings"}}}}
        ]
    });

    let sync = sync_for(&server).await;
    let attempted = sync
        .process_screening_payload(&payload.to_string())
        .await
        .unwrap();
    assert_eq!(attempted, 2);
}
