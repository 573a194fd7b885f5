//! Access control list middleware for the storefront back office.
//! This middleware can be placed on any route or service.
//!
//! It reads the API key from the `X-Api-Key` header, resolves the key's role to a set of capabilities, and checks them
//! against the capabilities the route requires. Requests without a key, with an unknown key, or whose role lacks a
//! required capability receive a 403 Forbidden response.

use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web,
    Error,
};
use futures::{
    future::{ok, Ready},
    Future,
};
use log::*;

use crate::{
    auth::{AccessKeys, Capability, API_KEY_HEADER},
    errors::ServerError,
};

pub struct AclMiddlewareFactory {
    required: Vec<Capability>,
}

impl AclMiddlewareFactory {
    pub fn new(required: &[Capability]) -> Self {
        AclMiddlewareFactory { required: required.to_vec() }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AclMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AclMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AclMiddlewareService { required: self.required.clone(), service: Rc::new(service) })
    }
}

pub struct AclMiddlewareService<S> {
    required: Vec<Capability>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AclMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let required = self.required.clone();
        Box::pin(async move {
            let keys = req.app_data::<web::Data<AccessKeys>>().ok_or_else(|| {
                warn!("🔐️ No access keys are registered with the application. Denying access.");
                ServerError::InsufficientPermissions("Access control is not configured".into())
            })?;
            let api_key = req.headers().get(API_KEY_HEADER).and_then(|v| v.to_str().ok()).ok_or_else(|| {
                debug!("🔐️ Request to {} has no API key", req.path());
                ServerError::InsufficientPermissions("An API key is required".into())
            })?;
            let capabilities = keys.capabilities_for_key(api_key);
            if capabilities.contains_all(&required) {
                trace!("🔐️ Access to {} granted", req.path());
                service.call(req).await
            } else {
                debug!("🔐️ Access to {} denied. Required {required:?}, but key has {capabilities:?}", req.path());
                Err(ServerError::InsufficientPermissions("Insufficient permissions".into()).into())
            }
        })
    }
}
