use actix_web::{http::StatusCode, test::TestRequest};
use chrono::Utc;
use mockall::predicate::eq;
use onramp_common::Cents;
use onramp_engine::{
    db_types::{CryptoAsset, OrderStatusType},
    payment_objects::{RefundReason, RefundRecord},
    traits::{GatewayError, OrderManagement},
    InMemoryDatabase,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;

use super::{
    helpers::{decimal, feed_at, intent, seed_order, send, services, with_api_key, PUBLISHABLE_KEY, TEST_API_KEY},
    mocks::{MockFeed, MockGateway},
};

fn order_body(amount: u64) -> serde_json::Value {
    json!({
        "symbol": "eth",
        "amountUSD": amount,
        "customerEmail": "alice@example.com",
        "walletAddress": "0x742d35Cc6634C0532925a3b844Bc454e4438f44e",
    })
}

#[actix_web::test]
async fn create_and_fetch_an_order() {
    let mut gateway = MockGateway::new();
    gateway
        .expect_create_intent()
        .withf(|amount, currency, meta| *amount == dec!(153.75) && currency == "usd" && meta.symbol == CryptoAsset::Eth)
        .times(1)
        .returning(|amount, _, _| Ok(intent("pi_100", amount)));
    let services = services(InMemoryDatabase::new(), gateway, feed_at(dec!(3000)));
    let req = TestRequest::post().uri("/api/orders").set_json(order_body(150));
    let (status, body) = send(&services, req).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["clientSecret"], "pi_100_secret_xyz");
    let order = &body["data"]["order"];
    assert_eq!(order["status"], "pending");
    assert_eq!(order["cryptoSymbol"], "ETH");
    assert_eq!(order["paymentIntentId"], "pi_100");
    assert_eq!(order["paymentMethod"], "card");
    assert_eq!(decimal(&order["cryptoAmount"]), dec!(0.05));
    assert_eq!(decimal(&order["totalCharged"]), dec!(153.75));

    let id = order["id"].as_str().unwrap().to_string();
    let (status, body) = send(&services, TestRequest::get().uri(&format!("/api/orders/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id.as_str());
    assert!(body["data"].get("clientSecret").is_none());
}

#[actix_web::test]
async fn orders_below_the_minimum_never_reach_the_gateway() {
    let mut gateway = MockGateway::new();
    gateway.expect_create_intent().never();
    let mut feed = MockFeed::new();
    feed.expect_fetch_price().never();
    let db = InMemoryDatabase::new();
    let services = services(db.clone(), gateway, feed);
    let req = TestRequest::post().uri("/api/orders").set_json(order_body(5));
    let (status, body) = send(&services, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(db.order_count().await, 0);
}

#[actix_web::test]
async fn invalid_wallets_and_emails() {
    let mut gateway = MockGateway::new();
    gateway.expect_create_intent().never();
    let services = services(InMemoryDatabase::new(), gateway, feed_at(dec!(3000)));
    let mut body = order_body(100);
    body["walletAddress"] = json!("0x742d35Cc6634C0532925a3b844Bc454e4438f44");
    let (status, res) = send(&services, TestRequest::post().uri("/api/orders").set_json(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(res["error"].as_str().unwrap().contains("wallet address"));
    let mut body = order_body(100);
    body["customerEmail"] = json!("alice.example.com");
    let (status, res) = send(&services, TestRequest::post().uri("/api/orders").set_json(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(res["error"], "Valid email is required");
}

#[actix_web::test]
async fn gateway_outage_is_a_bad_gateway() {
    let mut gateway = MockGateway::new();
    gateway
        .expect_create_intent()
        .returning(|_, _, _| Err(GatewayError::RequestFailed("connection reset".to_string())));
    let db = InMemoryDatabase::new();
    let services = services(db.clone(), gateway, feed_at(dec!(3000)));
    let (status, _) = send(&services, TestRequest::post().uri("/api/orders").set_json(order_body(150))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(db.order_count().await, 0);
}

#[actix_web::test]
async fn unknown_orders() {
    let services = services(InMemoryDatabase::new(), MockGateway::new(), MockFeed::new());
    let (status, body) = send(&services, TestRequest::get().uri("/api/orders/no-such-order")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn listing_orders_needs_the_api_key() {
    let db = InMemoryDatabase::new();
    seed_order(&db, "pi_1").await;
    let services = services(db, MockGateway::new(), MockFeed::new());
    let (status, body) = send(&services, TestRequest::get().uri("/api/orders")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    let (status, _) = send(&services, with_api_key(TestRequest::get().uri("/api/orders"), "guess")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = send(&services, with_api_key(TestRequest::get().uri("/api/orders"), TEST_API_KEY)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn listing_orders_by_email() {
    let db = InMemoryDatabase::new();
    seed_order(&db, "pi_1").await;
    seed_order(&db, "pi_2").await;
    let services = services(db, MockGateway::new(), MockFeed::new());
    let req = with_api_key(TestRequest::get().uri("/api/orders?email=alice@example.com"), TEST_API_KEY);
    let (status, body) = send(&services, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    let req = with_api_key(TestRequest::get().uri("/api/orders?email=bob@example.com"), TEST_API_KEY);
    let (_, body) = send(&services, req).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn admin_refunds() {
    let db = InMemoryDatabase::new();
    let order = seed_order(&db, "pi_7").await;
    db.update_order_status(&order.id, OrderStatusType::Processing, None).await.unwrap();
    db.update_order_status(&order.id, OrderStatusType::Completed, Some(Utc::now())).await.unwrap();
    let mut gateway = MockGateway::new();
    gateway
        .expect_create_refund()
        .with(eq("pi_7"), eq(Some(dec!(50))), eq(Some(RefundReason::RequestedByCustomer)))
        .times(1)
        .returning(|id, _, reason| {
            Ok(RefundRecord {
                id: "re_7".to_string(),
                payment_intent_id: id.to_string(),
                amount: Cents::from(5_000),
                status: "succeeded".to_string(),
                reason,
            })
        });
    let services = services(db.clone(), gateway, MockFeed::new());
    let uri = format!("/api/orders/{}/refund", order.id);
    let body = json!({"amountUSD": 50, "reason": "requested_by_customer"});

    let (status, _) = send(&services, TestRequest::post().uri(&uri).set_json(body.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, res) = send(&services, with_api_key(TestRequest::post().uri(&uri).set_json(body), TEST_API_KEY)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(res["data"]["order"]["status"], "refunded");
    assert_eq!(res["data"]["refund"]["id"], "re_7");
    let stored = db.fetch_order_by_id(&order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatusType::Refunded);
    assert_eq!(stored.amount_refunded, Some(Decimal::from(50)));
}

#[actix_web::test]
async fn pending_orders_cannot_be_refunded() {
    let db = InMemoryDatabase::new();
    let order = seed_order(&db, "pi_8").await;
    let mut gateway = MockGateway::new();
    gateway.expect_create_refund().never();
    let services = services(db, gateway, MockFeed::new());
    let req = with_api_key(TestRequest::post().uri(&format!("/api/orders/{}/refund", order.id)), TEST_API_KEY);
    let (status, body) = send(&services, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("cannot be refunded"));
}

#[actix_web::test]
async fn payment_config() {
    let services = services(InMemoryDatabase::new(), MockGateway::new(), MockFeed::new());
    let (status, body) = send(&services, TestRequest::get().uri("/api/payments/config")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["publishableKey"], PUBLISHABLE_KEY);
}
