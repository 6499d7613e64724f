use actix_web::{http::StatusCode, test::TestRequest};
use onramp_engine::{db_types::CryptoAsset, traits::PriceFeedError, InMemoryDatabase};
use rust_decimal_macros::dec;
use serde_json::json;

use super::{
    helpers::{decimal, feed_at, send, services, snapshot},
    mocks::{MockFeed, MockGateway},
};

#[actix_web::test]
async fn health_and_index() {
    let services = services(InMemoryDatabase::new(), MockGateway::new(), MockFeed::new());
    let (status, body) = send(&services, TestRequest::get().uri("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["environment"], "test");
    let (status, body) = send(&services, TestRequest::get().uri("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["endpoints"]["quote"], "POST /api/orders/quote");
}

#[actix_web::test]
async fn all_prices() {
    let services = services(InMemoryDatabase::new(), MockGateway::new(), feed_at(dec!(42)));
    let (status, body) = send(&services, TestRequest::get().uri("/api/crypto/prices")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let prices = body["data"].as_array().unwrap();
    assert_eq!(prices.len(), CryptoAsset::ALL.len());
    assert_eq!(prices[0]["symbol"], "BTC");
    assert_eq!(decimal(&prices[0]["priceUSD"]), dec!(42));
}

#[actix_web::test]
async fn price_for_one_symbol() {
    let mut feed = MockFeed::new();
    feed.expect_fetch_price().times(1).returning(|asset| Ok(snapshot(asset, dec!(145.2))));
    let services = services(InMemoryDatabase::new(), MockGateway::new(), feed);
    let (status, body) = send(&services, TestRequest::get().uri("/api/crypto/prices/sol")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["symbol"], "SOL");
    assert_eq!(body["data"]["name"], "Solana");
    assert_eq!(decimal(&body["data"]["priceUSD"]), dec!(145.2));
}

#[actix_web::test]
async fn unknown_symbols_are_client_errors() {
    let mut feed = MockFeed::new();
    feed.expect_fetch_price().never();
    let services = services(InMemoryDatabase::new(), MockGateway::new(), feed);
    let (status, body) = send(&services, TestRequest::get().uri("/api/crypto/prices/DOGE")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Cryptocurrency DOGE is not supported");
}

#[actix_web::test]
async fn supported_assets() {
    let services = services(InMemoryDatabase::new(), MockGateway::new(), MockFeed::new());
    let (status, body) = send(&services, TestRequest::get().uri("/api/crypto/supported")).await;
    assert_eq!(status, StatusCode::OK);
    let assets = body["data"].as_array().unwrap();
    assert_eq!(assets.len(), 6);
    assert_eq!(assets[1]["symbol"], "ETH");
    assert_eq!(assets[1]["network"], "Ethereum");
    assert_eq!(assets[1]["enabled"], true);
    assert_eq!(assets[1]["minPurchase"], "10");
    assert_eq!(assets[1]["maxPurchase"], "50000");
    assert_eq!(assets[5]["symbol"], "BNB");
    assert_eq!(assets[5]["network"], "BSC");
    assert_eq!(assets[5]["maxPurchase"], "10000");
}

#[actix_web::test]
async fn quote_for_btc() {
    let services = services(InMemoryDatabase::new(), MockGateway::new(), feed_at(dec!(50000)));
    let req = TestRequest::post().uri("/api/orders/quote").set_json(json!({"symbol": "BTC", "amountUSD": 100}));
    let (status, body) = send(&services, req).await;
    assert_eq!(status, StatusCode::OK);
    let quote = &body["data"];
    assert_eq!(quote["cryptoSymbol"], "BTC");
    assert_eq!(decimal(&quote["cryptoAmount"]), dec!(0.002));
    assert_eq!(decimal(&quote["platformFee"]), dec!(2.5));
    assert_eq!(decimal(&quote["totalCharge"]), dec!(102.5));
    assert_eq!(decimal(&quote["currentPrice"]), dec!(50000));
    assert!(quote["expiresAt"].is_string());
}

#[actix_web::test]
async fn quote_outside_the_limits() {
    let mut feed = MockFeed::new();
    feed.expect_fetch_price().never();
    let services = services(InMemoryDatabase::new(), MockGateway::new(), feed);
    for amount in [5, 20_000] {
        let req = TestRequest::post().uri("/api/orders/quote").set_json(json!({"symbol": "ETH", "amountUSD": amount}));
        let (status, body) = send(&services, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("outside the permitted range"));
    }
}

#[actix_web::test]
async fn malformed_quote_requests() {
    let services = services(InMemoryDatabase::new(), MockGateway::new(), MockFeed::new());
    let req = TestRequest::post().uri("/api/orders/quote").set_json(json!({"symbol": "BTC"}));
    let (status, body) = send(&services, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    let req = TestRequest::post().uri("/api/orders/quote").set_json(json!({"symbol": "BTC", "amountUSD": 0}));
    let (status, _) = send(&services, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn upstream_timeouts_are_gateway_timeouts() {
    let mut feed = MockFeed::new();
    feed.expect_fetch_price().returning(|asset| Err(PriceFeedError::Timeout(asset)));
    let services = services(InMemoryDatabase::new(), MockGateway::new(), feed);
    let req = TestRequest::post().uri("/api/orders/quote").set_json(json!({"symbol": "BTC", "amountUSD": 100}));
    let (status, body) = send(&services, req).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["success"], false);
    let (status, _) = send(&services, TestRequest::get().uri("/api/crypto/prices/BTC")).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
}
