//! Route and not-found handlers
//!
//! Every handler is stored in one shape: a shared closure returning a
//! boxed future that settles to `anyhow::Result<()>`. Synchronous
//! closures are wrapped into an already-resolved future, so the engine
//! only ever awaits.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::{self, BoxFuture, FutureExt};

use crate::{PathParams, QueryParams};

pub type HandlerFuture = BoxFuture<'static, anyhow::Result<()>>;

/// Invoked with `(query, params)` when its template matches
pub type RouteHandler = Arc<dyn Fn(QueryParams, PathParams) -> HandlerFuture + Send + Sync>;

/// Invoked with the raw query string, without its leading `?`, when nothing matches
pub type NotFoundHandler = Arc<dyn Fn(String) -> HandlerFuture + Send + Sync>;

/// Values a handler may settle to
pub trait IntoHandlerResult {
    fn into_handler_result(self) -> anyhow::Result<()>;
}

impl IntoHandlerResult for () {
    fn into_handler_result(self) -> anyhow::Result<()> {
        Ok(())
    }
}

impl<E> IntoHandlerResult for Result<(), E>
where
    E: Into<anyhow::Error>,
{
    fn into_handler_result(self) -> anyhow::Result<()> {
        self.map_err(Into::into)
    }
}

/// Wrap an async route handler
pub fn route<F, Fut, R>(handler: F) -> RouteHandler
where
    F: Fn(QueryParams, PathParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoHandlerResult + 'static,
{
    Arc::new(move |query: QueryParams, params: PathParams| {
        handler(query, params)
            .map(IntoHandlerResult::into_handler_result)
            .boxed()
    })
}

/// Wrap a synchronous route handler
pub fn sync<F, R>(handler: F) -> RouteHandler
where
    F: Fn(QueryParams, PathParams) -> R + Send + Sync + 'static,
    R: IntoHandlerResult,
{
    Arc::new(move |query: QueryParams, params: PathParams| {
        future::ready(handler(query, params).into_handler_result()).boxed()
    })
}

/// Wrap an async not-found handler
pub fn not_found<F, Fut, R>(handler: F) -> NotFoundHandler
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoHandlerResult + 'static,
{
    Arc::new(move |query: String| {
        handler(query)
            .map(IntoHandlerResult::into_handler_result)
            .boxed()
    })
}

/// Wrap a synchronous not-found handler
pub fn sync_not_found<F, R>(handler: F) -> NotFoundHandler
where
    F: Fn(String) -> R + Send + Sync + 'static,
    R: IntoHandlerResult,
{
    Arc::new(move |query: String| future::ready(handler(query).into_handler_result()).boxed())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sync_handler_resolves() {
        let handler = sync(|_, params: PathParams| {
            assert_eq!(params.get("id"), Some(&"7".to_string()));
        });

        let params = PathParams::from([("id".to_string(), "7".to_string())]);
        assert!(handler(QueryParams::new(), params).await.is_ok());
    }

    #[tokio::test]
    async fn test_error_results_carried() {
        let handler = route(|_, _| async { Err::<(), _>(std::io::Error::other("disk gone")) });

        let err = handler(QueryParams::new(), PathParams::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "disk gone");
    }

    #[tokio::test]
    async fn test_not_found_receives_raw_query() {
        let handler = sync_not_found(|query: String| {
            if query == "missing=1" {
                Ok(())
            } else {
                Err(anyhow::anyhow!("unexpected query {}", query))
            }
        });

        assert!(handler("missing=1".to_string()).await.is_ok());
        assert!(handler("?other".to_string()).await.is_err());
    }
}
