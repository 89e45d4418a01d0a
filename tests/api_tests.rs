//! API integration tests
//!
//! Need a running server on BASE_URL backed by a migrated database.

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::{SystemTime, UNIX_EPOCH};

const BASE_URL: &str = "http://localhost:8080/api/v1";
const ACTOR: &str = "1";

fn unique() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos()
}

/// A day nobody else is likely to book, so tests sharing requester 1 do not
/// cascade into each other
fn fresh_day() -> String {
    let offset = (unique() % 20_000) as i64;
    let day = chrono::NaiveDate::from_ymd_opt(2040, 1, 1).unwrap() + chrono::Duration::days(offset);
    day.format("%Y-%m-%d").to_string()
}

async fn create_room(client: &Client, capacity: i32) -> i64 {
    let response = client
        .post(format!("{}/rooms", BASE_URL))
        .json(&json!({ "name": format!("Test room {}", unique()), "capacity": capacity }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_i64().expect("No room id")
}

async fn create_booking(client: &Client, body: Value) -> reqwest::Response {
    client
        .post(format!("{}/bookings", BASE_URL))
        .header("X-Actor-Id", ACTOR)
        .json(&body)
        .send()
        .await
        .expect("Failed to send request")
}

async fn transition(client: &Client, id: i64, action: &str) -> reqwest::Response {
    client
        .post(format!("{}/bookings/{}/{}", BASE_URL, id, action))
        .header("X-Actor-Id", ACTOR)
        .send()
        .await
        .expect("Failed to send request")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_booking_requires_actor() {
    let client = Client::new();

    let response = client
        .post(format!("{}/bookings", BASE_URL))
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_booking_missing_field() {
    let client = Client::new();

    let response = create_booking(&client, json!({ "room_id": 1, "requester_id": 1 })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "BAD_REQUEST");
}

#[tokio::test]
#[ignore]
async fn test_availability_rejects_inverted_window() {
    let client = Client::new();

    let response = client
        .post(format!("{}/availability", BASE_URL))
        .json(&json!({ "from": "2040-01-01 10:00:00", "to": "2040-01-01 09:00:00" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_approval_cascade_and_lifecycle() {
    let client = Client::new();
    let room = create_room(&client, 10).await;
    let day = fresh_day();

    let first = create_booking(
        &client,
        json!({
            "room_id": room, "requester_id": 1,
            "from": format!("{} 09:00:00", day), "to": format!("{} 10:00:00", day)
        }),
    )
    .await;
    assert_eq!(first.status(), StatusCode::CREATED);
    let first: Value = first.json().await.expect("Failed to parse response");
    assert_eq!(first["status"], "pending");

    // Overlapping pending bookings are allowed on submit
    let second = create_booking(
        &client,
        json!({
            "room_id": room, "requester_id": 1,
            "from": format!("{} 09:30:00", day), "to": format!("{} 10:30:00", day)
        }),
    )
    .await;
    assert_eq!(second.status(), StatusCode::CREATED);
    let second: Value = second.json().await.expect("Failed to parse response");

    let first_id = first["id"].as_i64().unwrap();
    let second_id = second["id"].as_i64().unwrap();

    let approved = transition(&client, first_id, "approve").await;
    assert_eq!(approved.status(), StatusCode::OK);
    let approved: Value = approved.json().await.expect("Failed to parse response");
    assert_eq!(approved["booking"]["status"], "approved");
    assert_eq!(approved["cascaded"][0]["id"], second_id);
    assert_eq!(approved["cascaded"][0]["status"], "cancelled");

    let audit: Value = client
        .get(format!("{}/bookings/{}/audit", BASE_URL, second_id))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(audit[0]["action"], "auto_cancel");
    assert_eq!(
        audit[0]["note"],
        format!("auto-cancelled: room conflict (approved booking {})", first_id)
    );

    // The room now reads as busy for that window
    let availability: Value = client
        .post(format!("{}/availability", BASE_URL))
        .json(&json!({ "from": format!("{} 09:15:00", day), "to": format!("{} 09:45:00", day) }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let busy = availability["busy"].as_array().expect("busy list");
    assert!(busy.iter().any(|r| r["id"] == room));

    assert_eq!(transition(&client, first_id, "begin").await.status(), StatusCode::OK);

    let returned = transition(&client, first_id, "return").await;
    assert_eq!(returned.status(), StatusCode::OK);
    let returned: Value = returned.json().await.expect("Failed to parse response");
    assert_eq!(returned["booking"]["status"], "returned");
    assert!(returned["booking"]["actual_end"].is_string());

    // Terminal states admit no transition
    let cancel = transition(&client, first_id, "cancel").await;
    assert_eq!(cancel.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let cancel: Value = cancel.json().await.expect("Failed to parse response");
    assert_eq!(cancel["error"], "INVALID_STATE");
}

#[tokio::test]
#[ignore]
async fn test_device_exclusivity() {
    let client = Client::new();
    let room_a = create_room(&client, 10).await;
    let room_b = create_room(&client, 10).await;
    let day = fresh_day();

    let device: Value = client
        .post(format!("{}/devices", BASE_URL))
        .json(&json!({ "name": format!("Projector {}", unique()), "category": "projector" }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let device_id = device["id"].as_i64().expect("No device id");

    let first = create_booking(
        &client,
        json!({
            "room_id": room_a, "requester_id": 1, "device_ids": [device_id],
            "from": format!("{} 14:00:00", day), "to": format!("{} 15:00:00", day)
        }),
    )
    .await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = create_booking(
        &client,
        json!({
            "room_id": room_b, "requester_id": 1, "device_ids": [device_id],
            "from": format!("{} 14:30:00", day), "to": format!("{} 15:30:00", day)
        }),
    )
    .await;
    assert_eq!(second.status(), StatusCode::CONFLICT);

    let body: Value = second.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "USER_ERROR");
    assert_eq!(body["details"]["kind"], "device_booked");
}

#[tokio::test]
#[ignore]
async fn test_assistant_suggest() {
    let client = Client::new();
    create_room(&client, 6).await;

    let response = client
        .post(format!("{}/assistant/suggest", BASE_URL))
        .json(&json!({ "text": "phòng cho 5 người 9h-11h 5-3-2041, 1 máy chiếu" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["requirement"]["attendees"], 5);
    assert_eq!(body["requirement"]["window"]["start"], "2041-03-05 09:00:00");
    assert_eq!(body["requirement"]["window"]["end"], "2041-03-05 11:00:00");
    assert!(body["recommended"].is_object());
}

#[tokio::test]
#[ignore]
async fn test_assistant_unparseable_request() {
    let client = Client::new();

    let response = client
        .post(format!("{}/assistant/suggest", BASE_URL))
        .json(&json!({ "text": "phòng cho 10 người ngày mai" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "PARSE_ERROR");
}

#[tokio::test]
#[ignore]
async fn test_device_update_keeps_booking_move() {
    let client = Client::new();
    let room = create_room(&client, 10).await;
    let day = fresh_day();

    let device: Value = client
        .post(format!("{}/devices", BASE_URL))
        .json(&json!({ "name": format!("Speaker {}", unique()), "category": "speaker" }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let device_id = device["id"].as_i64().expect("No device id");

    let booking = create_booking(
        &client,
        json!({
            "room_id": room, "requester_id": 1, "device_ids": [device_id],
            "from": format!("{} 16:00:00", day), "to": format!("{} 17:00:00", day)
        }),
    )
    .await;
    assert_eq!(booking.status(), StatusCode::CREATED);
    let booking: Value = booking.json().await.expect("Failed to parse response");
    let booking_id = booking["id"].as_i64().unwrap();

    assert_eq!(transition(&client, booking_id, "approve").await.status(), StatusCode::OK);
    assert_eq!(transition(&client, booking_id, "begin").await.status(), StatusCode::OK);

    // A rename must not undo the move into the room
    let renamed = client
        .put(format!("{}/devices/{}", BASE_URL, device_id))
        .json(&json!({ "name": "Renamed speaker" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(renamed.status(), StatusCode::OK);

    let renamed: Value = renamed.json().await.expect("Failed to parse response");
    assert_eq!(renamed["name"], "Renamed speaker");
    assert_eq!(renamed["location"], "in_room");
    assert_eq!(renamed["room_id"], room);
    assert_eq!(renamed["condition"], "in_use");
}
