//! Router tests against an in-memory store.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use washwise_core::{Machine, MachineStatus, NewUsageSession};
use washwise_db::{Database, DbConfig};
use washwise_server::{router, AppState};
use washwise_sync::{Clock, ManualClock, ShopConfig, SyncConfig};

struct TestApp {
    db: Database,
    clock: Arc<ManualClock>,
    router: Router,
}

async fn app() -> TestApp {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let clock = Arc::new(ManualClock::new(chrono::Utc::now().timestamp()));
    let config = SyncConfig {
        shops: vec![ShopConfig::new("S1", "North Laundry"), ShopConfig::new("S2", "")],
        ..Default::default()
    };
    let state = AppState::new(db.clone(), config).with_clock(clock.clone());
    TestApp {
        db,
        clock,
        router: router(state),
    }
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or_else(|_| {
        Value::String(String::from_utf8_lossy(&bytes).into_owned())
    });
    (status, body)
}

async fn seed_in_use(app: &TestApp, id: i64, started_ago: i64, avg: i64) {
    let mut m = Machine::discovered(id, format!("Dryer {id}"), "Dryer", "S1");
    m.code = MachineStatus::InUse.code();
    m.last_use_time = app.clock.now() - started_ago;
    m.avg_use_time = avg;
    app.db.machines().upsert(&m).await.unwrap();
}

// =============================================================================
// Health & shops
// =============================================================================

#[tokio::test]
async fn test_health() {
    let app = app().await;
    let (status, body) = get(&app.router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".into()));
}

#[tokio::test]
async fn test_shops_fall_back_to_unknown_name() {
    let app = app().await;
    let (status, body) = get(&app.router, "/api/v2/shops").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        serde_json::json!({
            "items": [
                { "id": "S1", "name": "North Laundry" },
                { "id": "S2", "name": "Unknown laundry" },
            ]
        })
    );
}

// =============================================================================
// v2 machines
// =============================================================================

#[tokio::test]
async fn test_machines_require_shop_id() {
    let app = app().await;
    let (status, body) = get(&app.router, "/api/v2/machines").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);
}

#[tokio::test]
async fn test_machines_report_usage_and_remaining_time() {
    let app = app().await;
    seed_in_use(&app, 42, 600, 1_800).await;
    let now = app.clock.now();
    let usages = app.db.usages();
    let sessions = [
        (now - 86_400, now - 84_600),
        (now - 9 * 86_400, now - 9 * 86_400 + 1_800),
    ];
    for (start, end) in sessions {
        usages
            .create(&NewUsageSession {
                machine_id: 42,
                start_time: start,
                end_time: end,
            })
            .await
            .unwrap();
    }
    app.db
        .machines()
        .upsert(&Machine::discovered(43, "Washer 1", "Washer", "S2"))
        .await
        .unwrap();

    let (status, body) = get(&app.router, "/api/v2/machines?shopId=S1").await;

    assert_eq!(status, StatusCode::OK);
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], 42);
    assert_eq!(items[0]["type"], "Dryer");
    assert_eq!(items[0]["status"], MachineStatus::InUse.code());
    assert_eq!(items[0]["usageCount"], 1);
    assert_eq!(items[0]["remainTime"], 1_200);
}

#[tokio::test]
async fn test_remaining_time_defaults_to_45_minutes() {
    let app = app().await;
    seed_in_use(&app, 42, 600, 0).await;

    let (_, body) = get(&app.router, "/api/v2/machines?shopId=S1").await;
    assert_eq!(body["items"][0]["remainTime"], 2_700 - 600);

    // overdue machines report zero, never negative
    app.clock.advance(10_000);
    let (_, body) = get(&app.router, "/api/v2/machines?shopId=S1").await;
    assert_eq!(body["items"][0]["remainTime"], 0);
}

// =============================================================================
// v2 machine detail
// =============================================================================

#[tokio::test]
async fn test_machine_detail_with_history() {
    let app = app().await;
    seed_in_use(&app, 42, 60, 1_800).await;
    app.db
        .usages()
        .create(&NewUsageSession {
            machine_id: 42,
            start_time: app.clock.now() - 30,
            end_time: app.clock.now() - 10,
        })
        .await
        .unwrap();

    let (status, body) = get(&app.router, "/api/v2/machine/42").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Dryer 42");
    assert_eq!(body["avgUseTime"], 1_800);
    assert_eq!(body["lastUseTime"], app.clock.now() - 60);
    assert_eq!(body["remainTime"], 1_740);

    let history = body["history"].as_object().unwrap();
    assert_eq!(history.len(), 7);
    let total: i64 = history.values().map(|v| v.as_i64().unwrap()).sum();
    assert_eq!(total, 1);
}

#[tokio::test]
async fn test_machine_detail_errors() {
    let app = app().await;

    let (status, body) = get(&app.router, "/api/v2/machine/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 404);

    let (status, body) = get(&app.router, "/api/v2/machine/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);
}

// =============================================================================
// v1
// =============================================================================

#[tokio::test]
async fn test_v1_laundry_machines_shape() {
    let app = app().await;
    seed_in_use(&app, 42, 600, 1_800).await;

    let (status, body) = get(&app.router, "/api/v1/getLaundryMachines?LaundryID=S1").await;

    assert_eq!(status, StatusCode::OK);
    let machine = &body["洗衣机"]["42"];
    assert_eq!(machine["name"], "Dryer 42");
    assert_eq!(machine["deviceCode"], MachineStatus::InUse.code());
    assert_eq!(machine["remainTime"], 1_200);
    assert_eq!(machine["errorCount"], 0);
}

#[tokio::test]
async fn test_v1_parameter_errors() {
    let app = app().await;

    let (status, body) = get(&app.router, "/api/v1/getLaundryMachines").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["msg"], "LaundryID is required");

    let (status, body) = get(&app.router, "/api/v1/getMachineDetail?MachineID=x").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["msg"], "MachineID is required");
}

#[tokio::test]
async fn test_v1_machine_detail_is_history_map() {
    let app = app().await;
    let (status, body) = get(&app.router, "/api/v1/getMachineDetail?MachineID=42").await;

    assert_eq!(status, StatusCode::OK);
    let history = body.as_object().unwrap();
    assert_eq!(history.len(), 7);
    assert!(history.values().all(|v| *v == 0));
}
