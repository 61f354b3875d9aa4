use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::ErrorUnauthorized,
    http::header::AUTHORIZATION,
    Error,
};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use log::warn;
use std::sync::Arc;
use subtle::ConstantTimeEq;

const BEARER_SCHEME: &str = "bearer ";

/// Rejects requests whose `Authorization` header does not carry the shared
/// bearer token the listener handed to the Chainhook node.
pub struct BearerAuth {
    token: Arc<str>,
}

impl BearerAuth {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Arc::from(token.into()),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for BearerAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = BearerAuthService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(BearerAuthService {
            service,
            token: self.token.clone(),
        }))
    }
}

pub struct BearerAuthService<S> {
    service: S,
    token: Arc<str>,
}

/// Extracts the credential from a `Bearer <token>` header value. The scheme
/// is matched case-insensitively.
fn bearer_credential(header: &str) -> Option<&str> {
    if header.len() <= BEARER_SCHEME.len() {
        return None;
    }
    let (scheme, credential) = header.split_at(BEARER_SCHEME.len());
    scheme
        .eq_ignore_ascii_case(BEARER_SCHEME)
        .then_some(credential)
}

impl<S> BearerAuthService<S> {
    fn is_authorized(&self, req: &ServiceRequest) -> bool {
        let Some(credential) = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_credential)
        else {
            return false;
        };

        let provided = credential.as_bytes();
        let expected = self.token.as_bytes();
        provided.len() == expected.len() && provided.ct_eq(expected).into()
    }
}

impl<S, B> Service<ServiceRequest> for BearerAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if self.is_authorized(&req) {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        warn!("Rejected unauthorized request to {}", req.path());
        Box::pin(async move { Err(ErrorUnauthorized("Invalid authorization token")) })
    }
}

#[cfg(test)]
mod credential_tests {
    use super::bearer_credential;

    #[test]
    fn test_bearer_credential_parsing() {
        assert_eq!(bearer_credential("Bearer abc"), Some("abc"));
        assert_eq!(bearer_credential("BEARER abc"), Some("abc"));
        assert_eq!(bearer_credential("Basic abc"), None);
        assert_eq!(bearer_credential("Bearer "), None);
    }
}
