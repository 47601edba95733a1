use std::fs;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use tripstate::{
    core::store::ItineraryStore,
    documents::upload_dir::UploadDir,
    http::router,
    runtime::handle::{ItineraryHandle, RuntimeConfig, spawn_itinerary_store},
};

fn app(uploads: Option<&TempDir>) -> (Router, ItineraryHandle) {
    let docs = uploads.map(|tmp| {
        Box::new(UploadDir::new(tmp.path())) as Box<dyn tripstate::documents::DocumentStore>
    });
    let handle = spawn_itinerary_store(ItineraryStore::new(), docs, RuntimeConfig::default());
    (router(handle.clone()), handle)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            req = req.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let resp = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn trip() -> Value {
    json!({
        "title": "Spring in Lisbon",
        "activities": [
            {"type": "flight", "dateTime": "2025-04-15T08:00", "title": "Outbound"},
            {"type": "hotel", "dateTime": "2025-04-20T10:00", "title": "Check-in"}
        ]
    })
}

#[tokio::test]
async fn partial_reset_history_and_restore_end_to_end() {
    let (app, _handle) = app(None);

    let (status, _) = send(&app, Method::PUT, "/api/itinerary/current", Some(trip())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/itinerary/reset",
        Some(json!({"resetType": "partial", "partialResetOptions": {"activityTypes": ["flight"]}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Itinerary partially reset successfully");
    let kept = body["data"]["activities"].as_array().unwrap();
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0]["type"], "hotel");
    assert_eq!(body["data"]["title"], "Spring in Lisbon");

    let (status, body) = send(&app, Method::GET, "/api/itinerary/reset-history", None).await;
    assert_eq!(status, StatusCode::OK);
    let history = body["data"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["resetType"], "partial");
    assert_eq!(history[0]["partialResetOptions"]["activityTypes"], json!(["flight"]));
    assert!(history[0].get("snapshot").is_none());
    assert!(history[0].get("itineraryData").is_none());
    let timestamp = history[0]["timestamp"].as_str().unwrap().to_string();
    assert!(timestamp.ends_with('Z'), "{timestamp}");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/itinerary/restore",
        Some(json!({"timestamp": timestamp})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Itinerary restored successfully");
    assert_eq!(body["data"], trip());

    let (status, body) = send(&app, Method::GET, "/api/itinerary/current", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], trip());
}

#[tokio::test]
async fn complete_reset_returns_null_data_and_purges_uploads() {
    let tmp = TempDir::new().unwrap();
    for name in ["a.pdf", "b.pdf", "c.pdf"] {
        fs::write(tmp.path().join(name), b"x").unwrap();
    }
    let (app, _handle) = app(Some(&tmp));
    send(&app, Method::PUT, "/api/itinerary/current", Some(trip())).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/itinerary/reset",
        Some(json!({"resetType": "complete", "preserveDocuments": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Itinerary completely reset successfully");
    assert!(body.get("data").is_some_and(Value::is_null));
    assert!(body.get("warnings").is_none());
    assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 3);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/itinerary/reset",
        Some(json!({"resetType": "complete", "preserveDocuments": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);

    let (status, body) = send(&app, Method::GET, "/api/itinerary/current", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn validation_failures_map_to_bad_request() {
    let (app, _handle) = app(None);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/itinerary/reset",
        Some(json!({"resetType": "partial", "partialResetOptions": {"activityTypes": ["flight"]}})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"success": false, "message": "No itinerary data to reset"}));

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/itinerary/reset",
        Some(json!({"resetType": "everything"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid reset options");

    for reset_type in [json!(5), json!(true), json!(["partial"]), json!({"kind": "complete"})] {
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/itinerary/reset",
            Some(json!({"resetType": reset_type})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"success": false, "message": "Invalid reset options"}));
    }

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/itinerary/reset",
        Some(json!({"resetType": "partial"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid reset options");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/itinerary/reset",
        Some(json!({"resetType": "partial", "partialResetOptions": {"dateRange": {"start": "soon", "end": "later"}}})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    // Rejected partial attempts are still recorded; the unknown type and the
    // malformed body never reach the store.
    let (_, body) = send(&app, Method::GET, "/api/itinerary/reset-history", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn restore_of_unknown_backup_is_not_found() {
    let (app, _handle) = app(None);
    send(&app, Method::PUT, "/api/itinerary/current", Some(trip())).await;

    for timestamp in [
        json!("2001-01-01T00:00:00.000Z"),
        json!("not a time"),
        Value::Null,
        json!(12345),
        json!(true),
        json!({"at": "2001-01-01T00:00:00.000Z"}),
    ] {
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/itinerary/restore",
            Some(json!({"timestamp": timestamp})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"success": false, "message": "Backup not found"}));
    }

    let (_, body) = send(&app, Method::GET, "/api/itinerary/current", None).await;
    assert_eq!(body["data"], trip());
}

#[tokio::test]
async fn restore_matches_only_the_listed_timestamp_string() {
    let (app, _handle) = app(None);
    send(&app, Method::PUT, "/api/itinerary/current", Some(trip())).await;
    send(
        &app,
        Method::POST,
        "/api/itinerary/reset",
        Some(json!({"resetType": "complete", "preserveDocuments": true})),
    )
    .await;

    let (_, body) = send(&app, Method::GET, "/api/itinerary/reset-history", None).await;
    let listed = body["data"][0]["timestamp"].as_str().unwrap().to_string();
    let without_zone = listed.trim_end_matches('Z').to_string();
    let with_offset = format!("{without_zone}+00:00");
    let without_millis = format!("{}Z", &listed[..listed.len() - 5]);

    for other in [without_zone, with_offset, without_millis] {
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/itinerary/restore",
            Some(json!({"timestamp": other})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{other}");
        assert_eq!(body["message"], "Backup not found");
    }
    let (status, _) = send(&app, Method::GET, "/api/itinerary/current", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/itinerary/restore",
        Some(json!({"timestamp": listed})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], trip());
}

#[tokio::test]
async fn documents_come_back_from_restore_exactly_as_written() {
    let (app, _handle) = app(None);
    let documents = [
        json!({"title": "x"}),
        json!({"activities": [{"type": "flight", "dateTime": null, "note": 1}]}),
        json!({"activities": [{"type": 5}, {"type": null, "dateTime": "2025-04-15T08:00"}]}),
    ];

    for doc in documents {
        let (status, body) = send(&app, Method::PUT, "/api/itinerary/current", Some(doc.clone())).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"], doc);

        let (status, applied) = send(
            &app,
            Method::POST,
            "/api/itinerary/reset",
            Some(json!({"resetType": "complete", "preserveDocuments": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(applied["data"].is_null());

        let (_, history) = send(&app, Method::GET, "/api/itinerary/reset-history", None).await;
        let timestamp = history["data"].as_array().unwrap().last().unwrap()["timestamp"].clone();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/itinerary/restore",
            Some(json!({"timestamp": timestamp})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], doc);
    }
}

#[tokio::test]
async fn partial_reset_skips_non_string_types_and_missing_activities() {
    let (app, _handle) = app(None);
    let doc = json!({"activities": [{"type": 5}, {"type": "flight"}, {"type": null}]});
    send(&app, Method::PUT, "/api/itinerary/current", Some(doc)).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/itinerary/reset",
        Some(json!({"resetType": "partial", "partialResetOptions": {"activityTypes": ["flight", "5"]}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({"activities": [{"type": 5}, {"type": null}]}));

    send(&app, Method::PUT, "/api/itinerary/current", Some(json!({"title": "x"}))).await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/itinerary/reset",
        Some(json!({"resetType": "partial", "partialResetOptions": {"activityTypes": ["flight"]}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({"title": "x"}));
}

#[cfg(unix)]
#[tokio::test]
async fn purge_failure_after_complete_reset_is_a_warning() {
    let tmp = TempDir::new().unwrap();
    std::os::unix::fs::symlink(tmp.path().join("missing.pdf"), tmp.path().join("dangling")).unwrap();
    let (app, _handle) = app(Some(&tmp));
    send(&app, Method::PUT, "/api/itinerary/current", Some(trip())).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/itinerary/reset",
        Some(json!({"resetType": "complete", "preserveDocuments": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Itinerary completely reset successfully");
    assert!(body.get("data").is_some_and(Value::is_null));
    let warnings = body["warnings"].as_array().unwrap();
    assert_eq!(warnings.len(), 1);
    let warning = warnings[0].as_str().unwrap();
    assert!(warning.starts_with("Itinerary was reset, but uploaded documents could not be removed"), "{warning}");
    assert!(warning.contains("dangling"), "{warning}");

    let (status, body) = send(&app, Method::GET, "/api/itinerary/current", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (_, body) = send(&app, Method::GET, "/api/itinerary/reset-history", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn history_starts_empty_and_welcome_reports_version() {
    let (app, _handle) = app(None);

    let (status, body) = send(&app, Method::GET, "/api/itinerary/reset-history", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "data": []}));

    let (status, body) = send(&app, Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn stopped_store_surfaces_as_server_error() {
    let (app, handle) = app(None);
    handle.shutdown().await.unwrap();

    let (status, body) = send(&app, Method::GET, "/api/itinerary/reset-history", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "itinerary store is not running");
}
