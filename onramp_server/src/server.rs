use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, web::ServiceConfig, App, HttpServer};
use log::*;
use onramp_engine::{
    asset_objects::AssetCatalog,
    events::EventProducers,
    helpers::KeyedLocks,
    traits::{OrderManagement, PaymentGateway, PriceFeed},
    InMemoryDatabase,
    OrderFlowApi,
    OrdersApi,
    PriceOracleApi,
    QuoteApi,
    ReconcilerApi,
};

use crate::{
    config::{Environment, ProxyConfig, ServerConfig},
    data_objects::PaymentConfig,
    errors::ServerError,
    integrations::{audit::create_audit_event_handlers, coingecko::CoinGeckoFeed, stripe::StripeGateway},
    middleware::AdminApiKey,
    routes::{
        health,
        index,
        payment_config,
        supported,
        CreateOrderRoute,
        ListOrdersRoute,
        OrderByIdRoute,
        PriceForSymbolRoute,
        PricesRoute,
        QuoteRoute,
        RefundOrderRoute,
        StripeWebhookRoute,
    },
};

/// Every component the HTTP layer needs, each constructed exactly once and shared between workers.
pub struct OnrampServices<B, G, F> {
    pub environment: Environment,
    pub api_key: AdminApiKey,
    pub proxy: ProxyConfig,
    pub payment_config: PaymentConfig,
    pub catalog: AssetCatalog,
    pub oracle: Arc<PriceOracleApi<F>>,
    pub quotes: Arc<QuoteApi<F>>,
    pub gateway: Arc<G>,
    pub orders: Arc<OrdersApi<B>>,
    pub order_flow: Arc<OrderFlowApi<B, G, F>>,
    pub reconciler: Arc<ReconcilerApi<B>>,
}

impl<B, G, F> Clone for OnrampServices<B, G, F> {
    fn clone(&self) -> Self {
        Self {
            environment: self.environment,
            api_key: self.api_key.clone(),
            proxy: self.proxy,
            payment_config: self.payment_config.clone(),
            catalog: self.catalog.clone(),
            oracle: Arc::clone(&self.oracle),
            quotes: Arc::clone(&self.quotes),
            gateway: Arc::clone(&self.gateway),
            orders: Arc::clone(&self.orders),
            order_flow: Arc::clone(&self.order_flow),
            reconciler: Arc::clone(&self.reconciler),
        }
    }
}

impl<B, G, F> OnrampServices<B, G, F>
where
    B: OrderManagement + 'static,
    G: PaymentGateway + 'static,
    F: PriceFeed + 'static,
{
    pub fn new(config: &ServerConfig, db: B, gateway: G, feed: F, producers: EventProducers) -> Self {
        let catalog = AssetCatalog::new(&config.supported_assets);
        let oracle = Arc::new(PriceOracleApi::new(feed, catalog.clone(), config.price_feed.cache_ttl));
        let quotes = Arc::new(QuoteApi::new(Arc::clone(&oracle), config.fees.clone()));
        let gateway = Arc::new(gateway);
        let orders = Arc::new(OrdersApi::new(db.clone(), producers.clone()));
        let intent_locks = Arc::new(KeyedLocks::default());
        let order_flow = Arc::new(OrderFlowApi::new(
            db.clone(),
            Arc::clone(&gateway),
            Arc::clone(&quotes),
            Arc::clone(&intent_locks),
            producers.clone(),
        ));
        let reconciler = Arc::new(ReconcilerApi::new(db, intent_locks, producers));
        Self {
            environment: config.environment,
            api_key: AdminApiKey::new(config.api_key.clone()),
            proxy: config.proxy,
            payment_config: PaymentConfig { publishable_key: config.stripe.publishable_key.clone() },
            catalog,
            oracle,
            quotes,
            gateway,
            orders,
            order_flow,
            reconciler,
        }
    }

    /// Registers the shared components and every route with an app.
    pub fn configure(&self, cfg: &mut ServiceConfig) {
        let json_config = web::JsonConfig::default()
            .error_handler(|err, _req| ServerError::InvalidRequestBody(err.to_string()).into());
        cfg.app_data(json_config)
            .app_data(web::Data::new(self.environment))
            .app_data(web::Data::new(self.api_key.clone()))
            .app_data(web::Data::new(self.proxy))
            .app_data(web::Data::new(self.payment_config.clone()))
            .app_data(web::Data::new(self.catalog.clone()))
            .app_data(web::Data::from(Arc::clone(&self.oracle)))
            .app_data(web::Data::from(Arc::clone(&self.quotes)))
            .app_data(web::Data::from(Arc::clone(&self.gateway)))
            .app_data(web::Data::from(Arc::clone(&self.orders)))
            .app_data(web::Data::from(Arc::clone(&self.order_flow)))
            .app_data(web::Data::from(Arc::clone(&self.reconciler)));
        let api_scope = web::scope("/api")
            .service(PricesRoute::<F>::new())
            .service(PriceForSymbolRoute::<F>::new())
            .service(supported)
            .service(QuoteRoute::<F>::new())
            .service(CreateOrderRoute::<B, G, F>::new())
            .service(ListOrdersRoute::<B>::new())
            .service(OrderByIdRoute::<B>::new())
            .service(RefundOrderRoute::<B, G, F>::new())
            .service(payment_config)
            .service(StripeWebhookRoute::<B, G>::new());
        cfg.service(health).service(index).service(api_scope);
    }
}

pub type LiveServices = OnrampServices<InMemoryDatabase, StripeGateway, CoinGeckoFeed>;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let feed = CoinGeckoFeed::new(&config.price_feed).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway = StripeGateway::new(config.stripe.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let db = InMemoryDatabase::new();
    let handlers = create_audit_event_handlers();
    let producers = handlers.producers();
    handlers.start_handlers();
    let services = OnrampServices::new(&config, db, gateway, feed, producers);
    info!(
        "🚀️ Offering {} with a {}% platform fee",
        services.catalog.symbols().iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", "),
        config.fees.platform_fee_percent
    );
    let srv = create_server_instance(&config, services)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: &ServerConfig, services: LiveServices) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("onramp::access_log"))
            .configure(|cfg| services.configure(cfg))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
