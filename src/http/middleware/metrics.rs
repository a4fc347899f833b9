//! Request instrumentation middleware.
//!
//! Wraps any service producing `Response<Body>` and records, per request:
//! the in-flight gauge, one request counter increment, one duration
//! observation and one response-size observation, labelled by code and method.
//!
//! The in-flight guard and the pending observation move from the request
//! future into the response body, so both resolve exactly once: when the body
//! has been fully written, or when it (or the request future) is dropped.

use std::future::Future;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use std::time::Instant;

use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};
use bytes::Bytes;
use http_body::{Body as HttpBody, Frame, SizeHint};
use tower::{Layer, Service};

use crate::observability::metrics::{InFlightGuard, RequestMetrics};

/// Layer that applies [`Instrument`] to a service.
#[derive(Clone)]
pub struct InstrumentLayer {
    metrics: RequestMetrics,
}

impl InstrumentLayer {
    pub fn new(metrics: RequestMetrics) -> Self {
        Self { metrics }
    }
}

impl<S> Layer<S> for InstrumentLayer {
    type Service = Instrument<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Instrument {
            inner,
            metrics: self.metrics.clone(),
        }
    }
}

/// A service that records request metrics around an inner service.
#[derive(Clone)]
pub struct Instrument<S> {
    inner: S,
    metrics: RequestMetrics,
}

impl<S, ReqBody> Service<Request<ReqBody>> for Instrument<S>
where
    S: Service<Request<ReqBody>, Response = Response<Body>>,
    S::Future: Send + 'static,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        let in_flight = self.metrics.track_in_flight();
        let metrics = self.metrics.clone();
        let method = request.method().clone();
        let start = Instant::now();

        let future = self.inner.call(request);

        Box::pin(async move {
            let response = future.await?;
            let (parts, body) = response.into_parts();

            let record = RequestRecord {
                metrics,
                method,
                status: parts.status,
                start,
                bytes: 0,
                _in_flight: in_flight,
            };

            Ok(Response::from_parts(
                parts,
                Body::new(CountingBody {
                    inner: body,
                    record: Some(record),
                }),
            ))
        })
    }
}

/// Observation for one request, flushed exactly once.
struct RequestRecord {
    metrics: RequestMetrics,
    method: Method,
    status: StatusCode,
    start: Instant,
    bytes: u64,
    _in_flight: InFlightGuard,
}

impl RequestRecord {
    fn flush(self) {
        self.metrics
            .observe(&self.method, self.status, self.start.elapsed(), self.bytes);
    }
}

/// Response body that counts data bytes as they are written.
struct CountingBody {
    inner: Body,
    record: Option<RequestRecord>,
}

impl CountingBody {
    fn finish(&mut self) {
        if let Some(record) = self.record.take() {
            record.flush();
        }
    }
}

impl HttpBody for CountingBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = &mut *self;
        let polled = ready!(Pin::new(&mut this.inner).poll_frame(cx));

        match &polled {
            Some(Ok(frame)) => {
                if let (Some(data), Some(record)) = (frame.data_ref(), this.record.as_mut()) {
                    record.bytes += data.len() as u64;
                }
            }
            Some(Err(_)) | None => this.finish(),
        }

        Poll::Ready(polled)
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for CountingBody {
    fn drop(&mut self) {
        self.finish();
    }
}
