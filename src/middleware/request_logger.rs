use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, HeaderValue},
    Error, FromRequest, HttpMessage, HttpRequest,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::time::Instant;
use tracing::Instrument;

use crate::error::AppError;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Identifier tying together every log line written for one request
///
/// Assigned by `RequestLogger`, echoed back in the `x-request-id` response
/// header and available to handlers as an extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromRequest for RequestId {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    /// Never fails; outside `RequestLogger` a fresh id is generated
    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let id = req
            .extensions()
            .get::<RequestId>()
            .cloned()
            .unwrap_or_else(RequestId::generate);
        ready(Ok(id))
    }
}

/// Logs one line per request with method, path, status and latency, inside
/// a span carrying the request id.
///
/// Headers are never logged; they carry bearer tokens.
pub struct RequestLogger;

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLoggerService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLoggerService {
            service: Rc::new(service),
        }))
    }
}

pub struct RequestLoggerService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequestLoggerService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start_time = Instant::now();
        let request_id = RequestId::generate();
        req.extensions_mut().insert(request_id.clone());

        let span = tracing::info_span!(
            "request",
            request_id = %request_id.as_str(),
            method = %req.method(),
            path = %req.path(),
        );
        let service = self.service.clone();

        Box::pin(
            async move {
                tracing::debug!("Request started");

                let mut res = service.call(req).await?;

                if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
                    res.headers_mut()
                        .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
                }

                let status = res.status().as_u16();
                let elapsed_ms = start_time.elapsed().as_millis() as u64;

                if res.status().is_server_error() {
                    tracing::error!(status, elapsed_ms, "Request completed");
                } else {
                    tracing::info!(status, elapsed_ms, "Request completed");
                }

                Ok(res)
            }
            .instrument(span),
        )
    }
}
