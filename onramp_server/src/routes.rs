//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests:
//! ```nocompile
//!     fn my_handler() -> impl Responder {
//!         std::thread::sleep(Duration::from_secs(5)); // <-- Bad practice! Will cause the current worker thread to
//! hang!
//!     }
//! ```
//! For this reason, any long, non-cpu-bound operation (e.g. I/O, upstream API calls, etc.) should be expressed as
//! futures or asynchronous functions. Async handlers get executed concurrently by worker threads and thus don’t block
//! execution:
//!
//! ```nocompile
//!     async fn my_handler() -> impl Responder {
//!         tokio::time::sleep(Duration::from_secs(5)).await; // <-- Ok. Worker thread will handle other requests here
//!     }
//! ```
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use log::*;
use onramp_engine::{
    asset_objects::AssetCatalog,
    db_types::OrderId,
    traits::{OrderManagement, PaymentGateway, PriceFeed},
    OrderFlowApi,
    OrdersApi,
    PriceOracleApi,
    QuoteApi,
    ReconcileOutcome,
    ReconcilerApi,
};
use serde_json::json;

use crate::{
    config::Environment,
    data_objects::{
        ApiResponse,
        CreateOrderRequest,
        OrderSearchQuery,
        PaymentConfig,
        QuoteRequest,
        RefundParams,
        WebhookAck,
    },
    errors::ServerError,
};

pub const STRIPE_SIGNATURE_HEADER: &str = "Stripe-Signature";

/// Registers a generic handler as an actix service.
///
/// `route!(name => Method "/path" impl TraitA, TraitB)` creates a `NameRoute<TTraitA, TTraitB>` service that
/// dispatches to `name::<TTraitA, TTraitB>`. Appending `where admin` puts the route behind the API key middleware.
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where admin) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>)
                    .wrap($crate::middleware::ApiKeyMiddlewareFactory::new());
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health(environment: web::Data<Environment>) -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "timestamp": Utc::now(),
        "environment": environment.to_string(),
    }))
}

#[get("/")]
pub async fn index() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "name": "Onramp API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "GET /health",
            "prices": "GET /api/crypto/prices",
            "price": "GET /api/crypto/prices/{symbol}",
            "supported": "GET /api/crypto/supported",
            "quote": "POST /api/orders/quote",
            "createOrder": "POST /api/orders",
            "order": "GET /api/orders/{id}",
            "paymentConfig": "GET /api/payments/config",
            "stripeWebhook": "POST /api/webhooks/stripe",
        }
    }))
}

// ----------------------------------------------   Prices  ----------------------------------------------------
route!(prices => Get "/crypto/prices" impl PriceFeed);
pub async fn prices<F: PriceFeed>(api: web::Data<PriceOracleApi<F>>) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received request for all prices");
    let prices = api.fetch_all_prices().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(prices)))
}

route!(price_for_symbol => Get "/crypto/prices/{symbol}" impl PriceFeed);
pub async fn price_for_symbol<F: PriceFeed>(
    path: web::Path<String>,
    api: web::Data<PriceOracleApi<F>>,
) -> Result<HttpResponse, ServerError> {
    let symbol = path.into_inner();
    trace!("💻️ Received price request for {symbol}");
    let price = api.fetch_price_for_symbol(&symbol).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(price)))
}

#[get("/crypto/supported")]
pub async fn supported(catalog: web::Data<AssetCatalog>) -> impl Responder {
    HttpResponse::Ok().json(ApiResponse::new(catalog.supported()))
}

// ----------------------------------------------   Orders  ----------------------------------------------------
route!(quote => Post "/orders/quote" impl PriceFeed);
pub async fn quote<F: PriceFeed>(
    body: web::Json<QuoteRequest>,
    api: web::Data<QuoteApi<F>>,
) -> Result<HttpResponse, ServerError> {
    let (symbol, amount) = body.validate()?;
    trace!("💻️ Received quote request for ${amount} of {symbol}");
    let quote = api.quote(&symbol, amount, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(quote)))
}

route!(create_order => Post "/orders" impl OrderManagement, PaymentGateway, PriceFeed);
pub async fn create_order<B: OrderManagement, G: PaymentGateway, F: PriceFeed>(
    body: web::Json<CreateOrderRequest>,
    api: web::Data<OrderFlowApi<B, G, F>>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner().validate()?;
    debug!("💻️ Received order request for ${} of {}", request.amount_usd, request.symbol);
    let result = api.create_order(request).await.map_err(|e| {
        warn!("💻️ Could not create order. {e}");
        ServerError::from(e)
    })?;
    info!("💻️ Order {} created with payment intent {}", result.order.id, result.order.payment_intent_id);
    Ok(HttpResponse::Created().json(ApiResponse::new(result)))
}

route!(order_by_id => Get "/orders/{id}" impl OrderManagement);
pub async fn order_by_id<B: OrderManagement>(
    path: web::Path<String>,
    api: web::Data<OrdersApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    trace!("💻️ Received request for order {order_id}");
    let order = api
        .fetch_order(&order_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_id} does not exist")))?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(order)))
}

route!(list_orders => Get "/orders" impl OrderManagement where admin);
pub async fn list_orders<B: OrderManagement>(
    query: web::Query<OrderSearchQuery>,
    api: web::Data<OrdersApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let orders = match query.into_inner().email {
        Some(email) => {
            debug!("💻️ Admin request for orders placed by {email}");
            api.orders_for_email(&email).await?
        },
        None => {
            debug!("💻️ Admin request for all orders");
            api.all_orders().await?
        },
    };
    Ok(HttpResponse::Ok().json(ApiResponse::new(orders)))
}

route!(refund_order => Post "/orders/{id}/refund" impl OrderManagement, PaymentGateway, PriceFeed where admin);
pub async fn refund_order<B: OrderManagement, G: PaymentGateway, F: PriceFeed>(
    path: web::Path<String>,
    body: web::Bytes,
    api: web::Data<OrderFlowApi<B, G, F>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    let params = if body.iter().all(u8::is_ascii_whitespace) {
        RefundParams::default()
    } else {
        serde_json::from_slice::<RefundParams>(&body).map_err(|e| ServerError::InvalidRequestBody(e.to_string()))?
    };
    info!("💻️ Admin refund requested for order {order_id}");
    let result = api.refund_order(&order_id, params.validate()?).await.map_err(|e| {
        warn!("💻️ Refund for order {order_id} failed. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(result)))
}

// ----------------------------------------------   Payments  --------------------------------------------------
#[get("/payments/config")]
pub async fn payment_config(config: web::Data<PaymentConfig>) -> impl Responder {
    HttpResponse::Ok().json(ApiResponse::new(config.get_ref().clone()))
}

route!(stripe_webhook => Post "/webhooks/stripe" impl OrderManagement, PaymentGateway);
/// Route handler for payment processor notifications.
///
/// The raw body is authenticated before anything is parsed. Once a notification is authenticated, the processor
/// always receives a 200 acknowledgement, whatever the outcome of reconciliation. Reconciliation problems are
/// logged here instead.
pub async fn stripe_webhook<B: OrderManagement, G: PaymentGateway>(
    req: HttpRequest,
    body: web::Bytes,
    gateway: web::Data<G>,
    reconciler: web::Data<ReconcilerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let signature = req
        .headers()
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ServerError::MissingSignature(STRIPE_SIGNATURE_HEADER.to_string()))?;
    let event = gateway.verify_webhook(&body, signature).map_err(|e| {
        warn!("🚨️ Rejected an unauthenticated webhook delivery. {e}");
        ServerError::InvalidSignature(e.to_string())
    })?;
    let event_id = event.id.clone();
    match reconciler.reconcile(event).await {
        Ok(ReconcileOutcome::Completed(order)) => info!("💻️ Webhook {event_id}: order {} completed", order.id),
        Ok(ReconcileOutcome::Failed(order)) => info!("💻️ Webhook {event_id}: order {} failed", order.id),
        Ok(ReconcileOutcome::AlreadyApplied(order)) => {
            debug!("💻️ Webhook {event_id}: order {} was already {}", order.id, order.status)
        },
        Ok(ReconcileOutcome::RefundNoted { charge_id }) => info!("💻️ Webhook {event_id}: charge {charge_id} refunded"),
        Ok(ReconcileOutcome::Ignored(kind)) => debug!("💻️ Webhook {event_id}: ignoring {kind} event"),
        Err(e) if e.is_invalid_transition() => error!("🚨️ Webhook {event_id} contradicts the order state. {e}"),
        Err(e) => warn!("💻️ Webhook {event_id} could not be reconciled. {e}"),
    }
    Ok(HttpResponse::Ok().json(WebhookAck::received()))
}
