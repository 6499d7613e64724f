//! Shared-secret middleware for the admin routes.
//!
//! The middleware can be placed on any route or service. It compares the `x-api-key` request header against the
//! [`AdminApiKey`] registered as app data. A missing header is answered with 401 Unauthorized, and a wrong key with
//! 403 Forbidden. Rejected attempts are logged with the caller's IP address.

use std::{pin::Pin, rc::Rc};

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web,
    Error,
};
use futures::{
    future::{ok, Ready},
    Future,
};
use log::*;
use onramp_common::Secret;

use crate::{
    config::ProxyConfig,
    errors::{AuthError, ServerError},
    helpers::get_remote_ip,
};

pub const API_KEY_HEADER: &str = "x-api-key";

/// The admin API key, registered with `App::app_data` as `web::Data<AdminApiKey>`.
#[derive(Clone, Debug)]
pub struct AdminApiKey(pub Secret<String>);

impl AdminApiKey {
    pub fn new(key: Secret<String>) -> Self {
        Self(key)
    }
}

#[derive(Default)]
pub struct ApiKeyMiddlewareFactory;

impl ApiKeyMiddlewareFactory {
    pub fn new() -> Self {
        Self
    }
}

impl<S, B> Transform<S, ServiceRequest> for ApiKeyMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = ApiKeyMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(ApiKeyMiddlewareService { service: Rc::new(service) })
    }
}

pub struct ApiKeyMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for ApiKeyMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        Box::pin(async move {
            match check_api_key(&req) {
                Ok(()) => service.call(req).await.map(ServiceResponse::map_into_left_body),
                Err(e) => Ok(req.error_response(e).map_into_right_body()),
            }
        })
    }
}

fn check_api_key(req: &ServiceRequest) -> Result<(), ServerError> {
    let Some(expected) = req.app_data::<web::Data<AdminApiKey>>() else {
        error!("🚨️ No admin API key has been registered with the server. Denying access to {}", req.path());
        return Err(ServerError::ConfigurationError("Admin access is not configured".into()));
    };
    let proxy = req.app_data::<web::Data<ProxyConfig>>().map(|p| *p.get_ref()).unwrap_or_default();
    let provided = req.headers().get(API_KEY_HEADER).and_then(|v| v.to_str().ok());
    let result = match provided {
        None => Err(AuthError::MissingApiKey),
        Some(key) if expected.0.matches(key) => Ok(()),
        Some(_) => Err(AuthError::InvalidApiKey),
    };
    if let Err(e) = &result {
        let ip = get_remote_ip(req.request(), proxy).map(|ip| ip.to_string()).unwrap_or_else(|| "unknown".into());
        warn!("🚨️ Rejected admin request to {} from {ip}. {e}", req.path());
    }
    result.map_err(ServerError::from)
}
