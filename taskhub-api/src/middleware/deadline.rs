/// Request deadline middleware
///
/// Bounds the total time spent on a request, including credential lookups and password
/// hashing. When the deadline passes, the inner future is dropped and the client receives
/// a 500 with error code `timeout`. No partial auth state is produced: a signup whose
/// store write has not completed is abandoned before the write, and a login never
/// returns a token.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use axum::Router;
/// use taskhub_api::middleware::deadline::DeadlineLayer;
///
/// let app: Router = Router::new()
///     .layer(DeadlineLayer::new(Duration::from_secs(30)));
/// ```

use std::task::{Context, Poll};
use std::time::Duration;

use axum::{
    extract::Request,
    response::{IntoResponse, Response},
};
use tower::{Layer, Service};

use crate::error::ApiError;

/// Request deadline layer
#[derive(Debug, Clone, Copy)]
pub struct DeadlineLayer {
    timeout: Duration,
}

impl DeadlineLayer {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl<S> Layer<S> for DeadlineLayer {
    type Service = DeadlineMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        DeadlineMiddleware {
            inner,
            timeout: self.timeout,
        }
    }
}

/// Request deadline service
#[derive(Debug, Clone)]
pub struct DeadlineMiddleware<S> {
    inner: S,
    timeout: Duration,
}

impl<S> Service<Request> for DeadlineMiddleware<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let method = request.method().clone();
        let path = request.uri().path().to_string();
        let future = self.inner.call(request);
        let timeout = self.timeout;

        Box::pin(async move {
            match tokio::time::timeout(timeout, future).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(
                        %method,
                        path = %path,
                        timeout_ms = timeout.as_millis() as u64,
                        "Request exceeded deadline"
                    );
                    Ok(ApiError::Timeout.into_response())
                }
            }
        })
    }
}
