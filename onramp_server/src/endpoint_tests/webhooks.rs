use actix_web::{http::StatusCode, test::TestRequest};
use chrono::Utc;
use onramp_engine::{
    db_types::{Order, OrderStatusType},
    traits::OrderManagement,
    InMemoryDatabase,
};
use serde_json::json;
use stripe_tools::webhook::signature_header;

use super::{
    helpers::{seed_order, send, services, test_config, WEBHOOK_SECRET},
    mocks::MockFeed,
};
use crate::{
    integrations::stripe::StripeGateway,
    routes::STRIPE_SIGNATURE_HEADER,
    server::OnrampServices,
};

type WebhookServices = OnrampServices<InMemoryDatabase, StripeGateway, MockFeed>;

fn webhook_services(db: InMemoryDatabase) -> WebhookServices {
    let gateway = StripeGateway::new(test_config().stripe).unwrap();
    services(db, gateway, MockFeed::new())
}

fn event_body(event_type: &str, object: serde_json::Value) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "id": format!("evt_{}", Utc::now().timestamp_nanos_opt().unwrap_or_default()),
        "type": event_type,
        "created": Utc::now().timestamp(),
        "data": { "object": object },
    }))
    .unwrap()
}

fn signed(body: Vec<u8>, secret: &str) -> TestRequest {
    let header = signature_header(secret, Utc::now().timestamp(), &body).unwrap();
    TestRequest::post().uri("/api/webhooks/stripe").insert_header((STRIPE_SIGNATURE_HEADER, header)).set_payload(body)
}

async fn stored(db: &InMemoryDatabase, order: &Order) -> Order {
    db.fetch_order_by_id(&order.id).await.unwrap().unwrap()
}

#[actix_web::test]
async fn missing_signature() {
    let db = InMemoryDatabase::new();
    let order = seed_order(&db, "pi_1").await;
    let services = webhook_services(db.clone());
    let body = event_body("payment_intent.succeeded", json!({"id": "pi_1"}));
    let req = TestRequest::post().uri("/api/webhooks/stripe").set_payload(body);
    let (status, res) = send(&services, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(res["success"], false);
    assert_eq!(stored(&db, &order).await.status, OrderStatusType::Pending);
}

#[actix_web::test]
async fn forged_signature_changes_nothing() {
    let db = InMemoryDatabase::new();
    let order = seed_order(&db, "pi_1").await;
    let services = webhook_services(db.clone());
    let body = event_body("payment_intent.succeeded", json!({"id": "pi_1"}));
    let (status, _) = send(&services, signed(body, "whsec_someone_else")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(stored(&db, &order).await, order);
}

#[actix_web::test]
async fn successful_payment_completes_the_order_once() {
    let db = InMemoryDatabase::new();
    let order = seed_order(&db, "pi_1").await;
    let services = webhook_services(db.clone());
    let body = event_body("payment_intent.succeeded", json!({"id": "pi_1", "amount": 15375}));

    let (status, res) = send(&services, signed(body.clone(), WEBHOOK_SECRET)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(res, json!({"success": true, "received": true}));
    let completed = stored(&db, &order).await;
    assert_eq!(completed.status, OrderStatusType::Completed);
    let completed_at = completed.completed_at.expect("completion time should be set");

    let (status, _) = send(&services, signed(body, WEBHOOK_SECRET)).await;
    assert_eq!(status, StatusCode::OK);
    let again = stored(&db, &order).await;
    assert_eq!(again.status, OrderStatusType::Completed);
    assert_eq!(again.completed_at, Some(completed_at));
}

#[actix_web::test]
async fn failure_after_completion_is_acknowledged_but_ignored() {
    let db = InMemoryDatabase::new();
    let order = seed_order(&db, "pi_1").await;
    let services = webhook_services(db.clone());
    let success = event_body("payment_intent.succeeded", json!({"id": "pi_1"}));
    send(&services, signed(success, WEBHOOK_SECRET)).await;
    let failure = event_body("payment_intent.payment_failed", json!({"id": "pi_1"}));
    let (status, res) = send(&services, signed(failure, WEBHOOK_SECRET)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(res["received"], true);
    assert_eq!(stored(&db, &order).await.status, OrderStatusType::Completed);
}

#[actix_web::test]
async fn failed_and_canceled_payments() {
    let db = InMemoryDatabase::new();
    let failed = seed_order(&db, "pi_1").await;
    let canceled = seed_order(&db, "pi_2").await;
    let services = webhook_services(db.clone());
    let body = event_body("payment_intent.payment_failed", json!({"id": "pi_1"}));
    send(&services, signed(body, WEBHOOK_SECRET)).await;
    let body = event_body("payment_intent.canceled", json!({"id": "pi_2"}));
    send(&services, signed(body, WEBHOOK_SECRET)).await;
    assert_eq!(stored(&db, &failed).await.status, OrderStatusType::Failed);
    assert_eq!(stored(&db, &canceled).await.status, OrderStatusType::Failed);
}

#[actix_web::test]
async fn unknown_intents_and_other_events_are_acknowledged() {
    let db = InMemoryDatabase::new();
    let order = seed_order(&db, "pi_1").await;
    let services = webhook_services(db.clone());
    let body = event_body("payment_intent.succeeded", json!({"id": "pi_unknown"}));
    let (status, _) = send(&services, signed(body, WEBHOOK_SECRET)).await;
    assert_eq!(status, StatusCode::OK);
    let body = event_body("charge.refunded", json!({"id": "ch_1", "payment_intent": "pi_1", "amount_refunded": 100}));
    let (status, _) = send(&services, signed(body, WEBHOOK_SECRET)).await;
    assert_eq!(status, StatusCode::OK);
    let body = event_body("customer.created", json!({"id": "cus_1"}));
    let (status, _) = send(&services, signed(body, WEBHOOK_SECRET)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored(&db, &order).await.status, OrderStatusType::Pending);
}
