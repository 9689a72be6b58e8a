//! Navigation engine
//!
//! Owns the route table, the not-found slot and the generation counter.
//! Each navigation gets the next generation number when it starts; when
//! its handler settles, the result is only applied if no newer navigation
//! has started in the meantime. Older results are reported as superseded
//! rather than cancelled.

use futures_util::future::FutureExt;
use parking_lot::RwLock;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use waymark_routes::RouteTable;

use crate::event::{Dispatch, NavigationEvent, NavigationOutcome};
use crate::handler::{self, IntoHandlerResult, NotFoundHandler, RouteHandler};
use crate::listeners::{ListenerList, Subscription};
use crate::query::parse_query;
use crate::safety::logical_path;
use crate::state::EngineState;
use crate::transport::Transport;
use crate::{PathParams, QueryParams, Result};

pub type EventListener = Arc<dyn Fn(&NavigationEvent) + Send + Sync>;

pub struct NavigationEngine {
    /// Registered routes, in lookup order
    routes: RwLock<RouteTable<RouteHandler>>,
    /// Single not-found slot; last registration wins
    not_found: RwLock<Option<NotFoundHandler>>,
    /// Generation of the most recently started navigation
    generation: AtomicU64,
    /// Navigations started but not yet settled
    in_flight: AtomicUsize,
    /// Last applied (non-superseded) outcome
    current: RwLock<Option<NavigationOutcome>>,
    listeners: ListenerList<EventListener>,
}

impl NavigationEngine {
    pub fn new() -> Self {
        Self {
            routes: RwLock::new(RouteTable::new()),
            not_found: RwLock::new(None),
            generation: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            current: RwLock::new(None),
            listeners: ListenerList::new(),
        }
    }

    // === Registration ===

    /// Register an async handler for `template`
    pub fn on<F, Fut, R>(&self, template: &str, handler: F) -> Result<&Self>
    where
        F: Fn(QueryParams, PathParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoHandlerResult + 'static,
    {
        self.register(template, handler::route(handler))?;
        Ok(self)
    }

    /// Register a synchronous handler for `template`
    pub fn on_sync<F, R>(&self, template: &str, handler: F) -> Result<&Self>
    where
        F: Fn(QueryParams, PathParams) -> R + Send + Sync + 'static,
        R: IntoHandlerResult,
    {
        self.register(template, handler::sync(handler))?;
        Ok(self)
    }

    /// Register an already-wrapped handler.
    ///
    /// Registration is expected to finish before the first navigation.
    pub fn register(&self, template: &str, handler: RouteHandler) -> Result<()> {
        if let Err(e) = self.routes.write().register(template, handler) {
            tracing::warn!(template = %template, error = %e, "Rejected route template");
            return Err(e.into());
        }

        tracing::info!(template = %template, "Route registered");
        Ok(())
    }

    /// Set the async not-found handler, replacing any previous one
    pub fn not_found<F, Fut, R>(&self, handler: F) -> &Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoHandlerResult + 'static,
    {
        self.set_not_found(handler::not_found(handler));
        self
    }

    /// Set a synchronous not-found handler, replacing any previous one
    pub fn not_found_sync<F, R>(&self, handler: F) -> &Self
    where
        F: Fn(String) -> R + Send + Sync + 'static,
        R: IntoHandlerResult,
    {
        self.set_not_found(handler::sync_not_found(handler));
        self
    }

    pub fn set_not_found(&self, handler: NotFoundHandler) {
        if self.not_found.write().replace(handler).is_some() {
            tracing::debug!("Replaced not-found handler");
        }
    }

    /// Remove every route registered with exactly `template`
    pub fn unregister(&self, template: &str) -> usize {
        let removed = self.routes.write().unregister(template);
        tracing::info!(template = %template, removed, "Unregistered route");
        removed
    }

    pub fn clear_routes(&self) {
        self.routes.write().clear();
    }

    pub fn route_count(&self) -> usize {
        self.routes.read().len()
    }

    /// Registered templates in lookup order
    pub fn templates(&self) -> Vec<String> {
        self.routes.read().templates().map(str::to_string).collect()
    }

    // === Observation ===

    /// Receive every navigation event until the handle is dropped
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&NavigationEvent) + Send + Sync + 'static,
    {
        self.listeners.add(Arc::new(listener))
    }

    pub fn state(&self) -> EngineState {
        EngineState::from_in_flight(self.in_flight())
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Generation of the most recently started navigation (0 before any)
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Last applied outcome
    pub fn current(&self) -> Option<NavigationOutcome> {
        self.current.read().clone()
    }

    // === Navigation ===

    /// Programmatic navigation.
    ///
    /// `location` must pass the allow-list (`/…` or `#/…`, word characters,
    /// `-` and `/` only). A rejected location leaves no trace: nothing is
    /// written and no handler runs.
    pub async fn navigate(&self, transport: &dyn Transport, location: &str) -> Result<NavigationOutcome> {
        let path = match logical_path(location) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(location = %location, "Unsafe navigation target rejected");
                return Err(e);
            }
        };

        transport.write_location(&path).await?;

        Ok(self.on_location_changed(&path, "").await)
    }

    /// Navigation caused by an intercepted link.
    ///
    /// Link targets come from markup and are already resolved against the
    /// current URL, so they skip the allow-list applied to [`navigate`].
    ///
    /// [`navigate`]: NavigationEngine::navigate
    pub async fn follow_link(
        &self,
        transport: &dyn Transport,
        path: &str,
        query: &str,
    ) -> Result<NavigationOutcome> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let location = if query.is_empty() {
            path.to_string()
        } else {
            format!("{}?{}", path, query)
        };

        transport.write_location(&location).await?;

        Ok(self.on_location_changed(path, query).await)
    }

    /// Resolve `path` and dispatch to its handler.
    ///
    /// A leading `?` on `raw_query` is dropped, so the not-found handler
    /// always sees the bare query.
    ///
    /// Never fails: a handler error or panic is logged, published as
    /// [`NavigationEvent::HandlerFailed`] and recorded in the outcome.
    pub async fn on_location_changed(&self, path: &str, raw_query: &str) -> NavigationOutcome {
        let raw_query = raw_query.strip_prefix('?').unwrap_or(raw_query);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let _episode = Episode::enter(&self.in_flight);

        let query = parse_query(raw_query);

        tracing::debug!(generation, path = %path, "Resolving navigation");
        self.publish(&NavigationEvent::Started {
            generation,
            path: path.to_string(),
        });

        let matched = {
            let routes = self.routes.read();
            routes.find(path).map(|found| {
                (
                    found.entry.template().to_string(),
                    Arc::clone(found.entry.handler()),
                    found.params,
                )
            })
        };

        let dispatch = match matched {
            Some((template, handler, params)) => {
                tracing::debug!(generation, template = %template, "Route matched");

                let args = (query.clone(), params.clone());
                match contain(async move { handler(args.0, args.1).await }).await {
                    Ok(()) => Dispatch::Matched { template, params },
                    Err(message) => {
                        self.report_failure(generation, path, &message);
                        Dispatch::HandlerFailed {
                            template: Some(template),
                            message,
                        }
                    }
                }
            }
            None => {
                let not_found = self.not_found.read().clone();
                match not_found {
                    Some(handler) => {
                        tracing::debug!(generation, path = %path, "No route matched, running not-found handler");

                        let raw_query = raw_query.to_string();
                        match contain(async move { handler(raw_query).await }).await {
                            Ok(()) => Dispatch::NotFound,
                            Err(message) => {
                                self.report_failure(generation, path, &message);
                                Dispatch::HandlerFailed {
                                    template: None,
                                    message,
                                }
                            }
                        }
                    }
                    None => {
                        tracing::debug!(generation, path = %path, "No route matched");
                        Dispatch::Unmatched
                    }
                }
            }
        };

        self.settle(generation, path, query, dispatch)
    }

    /// Apply or supersede a finished navigation
    fn settle(&self, generation: u64, path: &str, query: QueryParams, dispatch: Dispatch) -> NavigationOutcome {
        let mut outcome = NavigationOutcome {
            generation,
            path: path.to_string(),
            query,
            dispatch,
            superseded: false,
        };

        let applied = {
            let mut current = self.current.write();
            let newest = self.generation.load(Ordering::SeqCst) == generation;
            let newer_applied = current
                .as_ref()
                .is_some_and(|applied| applied.generation > generation);

            if newest && !newer_applied {
                *current = Some(outcome.clone());
                true
            } else {
                false
            }
        };

        if applied {
            tracing::info!(generation, path = %path, template = ?outcome.template(), "Navigation completed");
            self.publish(&NavigationEvent::Completed {
                outcome: outcome.clone(),
            });
        } else {
            outcome.superseded = true;
            tracing::debug!(
                generation,
                latest = self.generation(),
                path = %path,
                "Navigation superseded"
            );
            self.publish(&NavigationEvent::Superseded {
                outcome: outcome.clone(),
            });
        }

        outcome
    }

    fn report_failure(&self, generation: u64, path: &str, message: &str) {
        tracing::error!(generation, path = %path, error = %message, "Navigation handler failed");
        self.publish(&NavigationEvent::HandlerFailed {
            generation,
            path: path.to_string(),
            message: message.to_string(),
        });
    }

    fn publish(&self, event: &NavigationEvent) {
        for listener in self.listeners.snapshot() {
            listener(event);
        }
    }
}

impl std::fmt::Debug for NavigationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationEngine")
            .field("routes", &self.templates())
            .field("generation", &self.generation())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Default for NavigationEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts one in-flight navigation for as long as it lives
struct Episode<'a> {
    in_flight: &'a AtomicUsize,
}

impl<'a> Episode<'a> {
    fn enter(in_flight: &'a AtomicUsize) -> Self {
        in_flight.fetch_add(1, Ordering::SeqCst);
        Self { in_flight }
    }
}

impl Drop for Episode<'_> {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Await a handler, turning errors and panics into a message
async fn contain<F>(handler: F) -> std::result::Result<(), String>
where
    F: Future<Output = anyhow::Result<()>>,
{
    match AssertUnwindSafe(handler).catch_unwind().await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(format!("{:#}", e)),
        Err(panic) => Err(panic_message(panic.as_ref())),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("handler panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("handler panicked: {}", message)
    } else {
        "handler panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{NavigationError, TransportError};
    use crate::transport::LocationCallback;
    use futures_util::future::BoxFuture;
    use parking_lot::Mutex;
    use tokio::sync::oneshot;

    /// Records writes; never reports external changes
    #[derive(Default)]
    struct RecordingTransport {
        writes: Arc<Mutex<Vec<String>>>,
    }

    impl Transport for RecordingTransport {
        fn current_path(&self) -> String {
            self.writes.lock().last().cloned().unwrap_or_else(|| "/".to_string())
        }

        fn current_query(&self) -> String {
            String::new()
        }

        fn write_location<'a>(&'a self, location: &'a str) -> BoxFuture<'a, std::result::Result<(), TransportError>> {
            self.writes.lock().push(location.to_string());
            Box::pin(async { Ok(()) })
        }

        fn on_external_change(&self, _callback: LocationCallback) -> Subscription {
            Subscription::empty()
        }
    }

    fn recorded_events(engine: &NavigationEngine) -> (Arc<Mutex<Vec<NavigationEvent>>>, Subscription) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let subscription = engine.subscribe(move |event| sink.lock().push(event.clone()));
        (events, subscription)
    }

    #[tokio::test]
    async fn test_navigate_writes_then_dispatches() {
        let engine = NavigationEngine::new();
        let transport = RecordingTransport::default();
        let writes = Arc::clone(&transport.writes);
        let seen = Arc::new(Mutex::new(None));

        let sink = Arc::clone(&seen);
        engine
            .on_sync("/users/:id", move |_, params| {
                // The location is already written when the handler runs
                assert_eq!(writes.lock().as_slice(), ["/users/42".to_string()]);
                *sink.lock() = params.get("id").cloned();
            })
            .unwrap();

        let outcome = engine.navigate(&transport, "/users/42").await.unwrap();

        assert_eq!(seen.lock().as_deref(), Some("42"));
        assert_eq!(outcome.template(), Some("/users/:id"));
        assert!(!outcome.superseded);
        assert_eq!(engine.current(), Some(outcome));
        assert_eq!(engine.state(), EngineState::Idle);
    }

    #[tokio::test]
    async fn test_unsafe_navigation_has_no_side_effects() {
        let engine = NavigationEngine::new();
        let transport = RecordingTransport::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        engine
            .on_sync("/:anything", move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        let (events, _subscription) = recorded_events(&engine);

        let err = engine.navigate(&transport, "../etc").await.unwrap_err();

        assert!(matches!(err, NavigationError::UnsafePath(ref target) if target == "../etc"));
        assert!(transport.writes.lock().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(events.lock().is_empty());
        assert_eq!(engine.generation(), 0);
    }

    #[tokio::test]
    async fn test_hash_target_written_as_logical_path() {
        let engine = NavigationEngine::new();
        let transport = RecordingTransport::default();
        engine.on_sync("/settings", |_, _| ()).unwrap();

        let outcome = engine.navigate(&transport, "#/settings").await.unwrap();

        assert_eq!(transport.writes.lock().as_slice(), ["/settings".to_string()]);
        assert_eq!(outcome.path, "/settings");
        assert_eq!(outcome.template(), Some("/settings"));
    }

    #[tokio::test]
    async fn test_handler_failure_is_contained() -> Result<()> {
        let engine = NavigationEngine::new();
        let transport = RecordingTransport::default();

        engine
            .on("/broken", |_, _| async { Err::<(), _>(anyhow::anyhow!("render failed")) })?
            .on_sync("/fine", |_, _| ())?;
        let (events, _subscription) = recorded_events(&engine);

        let failed = engine.navigate(&transport, "/broken").await.unwrap();
        assert_eq!(
            failed.dispatch,
            Dispatch::HandlerFailed {
                template: Some("/broken".to_string()),
                message: "render failed".to_string(),
            }
        );
        assert!(events.lock().iter().any(|event| matches!(
            event,
            NavigationEvent::HandlerFailed { message, .. } if message == "render failed"
        )));

        let next = engine.navigate(&transport, "/fine").await.unwrap();
        assert_eq!(next.template(), Some("/fine"));
        assert!(!next.is_failure());
        assert_eq!(engine.state(), EngineState::Idle);

        Ok(())
    }

    #[tokio::test]
    async fn test_handler_panic_is_contained() {
        let engine = NavigationEngine::new();
        engine
            .on_sync("/panics", |_, _| -> () { panic!("boom") })
            .unwrap();

        let outcome = engine.on_location_changed("/panics", "").await;

        assert_eq!(
            outcome.dispatch,
            Dispatch::HandlerFailed {
                template: Some("/panics".to_string()),
                message: "handler panicked: boom".to_string(),
            }
        );
        assert_eq!(engine.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_unmatched_without_not_found_is_silent() {
        let engine = NavigationEngine::new();
        engine.on_sync("/home", |_, _| ()).unwrap();

        let outcome = engine.on_location_changed("/nowhere", "?x=1").await;

        assert_eq!(outcome.dispatch, Dispatch::Unmatched);
        assert_eq!(outcome.query.get("x"), Some(&"1".to_string()));
    }

    #[tokio::test]
    async fn test_not_found_last_registration_wins() {
        let engine = NavigationEngine::new();
        let received = Arc::new(Mutex::new(Vec::new()));

        engine.not_found_sync(|_| -> anyhow::Result<()> { anyhow::bail!("stale handler") });
        let sink = Arc::clone(&received);
        engine.not_found(move |query| {
            let sink = Arc::clone(&sink);
            async move { sink.lock().push(query) }
        });

        engine.on_location_changed("/missing", "?ref=nav").await;
        let outcome = engine.on_location_changed("/gone", "ref=menu").await;

        assert_eq!(outcome.dispatch, Dispatch::NotFound);
        assert_eq!(
            received.lock().as_slice(),
            ["ref=nav".to_string(), "ref=menu".to_string()]
        );
    }

    #[tokio::test]
    async fn test_query_and_params_reach_handler() {
        let engine = NavigationEngine::new();
        let seen = Arc::new(Mutex::new(None));

        let sink = Arc::clone(&seen);
        engine
            .on("/search/:scope", move |query, params| {
                let sink = Arc::clone(&sink);
                async move {
                    *sink.lock() = Some((query, params));
                }
            })
            .unwrap();

        engine.on_location_changed("/search/docs", "?a=1&a=2&q=x+y").await;

        let (query, params) = seen.lock().clone().unwrap();
        assert_eq!(query.get("a"), Some(&"2".to_string()));
        assert_eq!(query.get("q"), Some(&"x y".to_string()));
        assert_eq!(params.get("scope"), Some(&"docs".to_string()));
    }

    #[tokio::test]
    async fn test_older_navigation_is_superseded() {
        let engine = NavigationEngine::new();
        let (release, gate) = oneshot::channel::<()>();
        let gate = Arc::new(Mutex::new(Some(gate)));

        engine
            .on("/slow", move |_, _| {
                let gate = gate.lock().take();
                async move {
                    if let Some(gate) = gate {
                        let _ = gate.await;
                    }
                }
            })
            .unwrap();
        engine.on_sync("/fast", |_, _| ()).unwrap();
        let (events, _subscription) = recorded_events(&engine);

        let slow = engine.on_location_changed("/slow", "");
        let fast = async {
            assert_eq!(engine.state(), EngineState::Resolving);
            let outcome = engine.on_location_changed("/fast", "").await;
            assert_eq!(engine.in_flight(), 1);
            let _ = release.send(());
            outcome
        };

        let (slow, fast) = tokio::join!(slow, fast);

        assert_eq!((slow.generation, fast.generation), (1, 2));
        assert!(slow.superseded);
        assert!(!fast.superseded);
        assert_eq!(slow.template(), Some("/slow"));
        assert_eq!(engine.current().map(|c| c.path), Some("/fast".to_string()));
        assert_eq!(engine.state(), EngineState::Idle);

        let events = events.lock();
        assert!(events
            .iter()
            .any(|event| matches!(event, NavigationEvent::Superseded { outcome } if outcome.generation == 1)));
        assert!(!events
            .iter()
            .any(|event| matches!(event, NavigationEvent::Completed { outcome } if outcome.generation == 1)));
    }

    #[tokio::test]
    async fn test_event_order_and_unsubscribe() {
        let engine = NavigationEngine::new();
        engine.on_sync("/", |_, _| ()).unwrap();
        let (events, subscription) = recorded_events(&engine);

        engine.on_location_changed("/", "").await;
        {
            let events = events.lock();
            assert_eq!(events.len(), 2);
            assert!(matches!(events[0], NavigationEvent::Started { generation: 1, .. }));
            assert!(matches!(events[1], NavigationEvent::Completed { .. }));
            assert!(events.iter().all(|event| event.generation() == 1));
        }

        subscription.unsubscribe();
        engine.on_location_changed("/", "").await;
        assert_eq!(events.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_follow_link_writes_query() {
        let engine = NavigationEngine::new();
        let transport = RecordingTransport::default();
        engine.on_sync("/docs/v1.2", |_, _| ()).unwrap();

        let outcome = engine
            .follow_link(&transport, "/docs/v1.2", "?tab=api")
            .await
            .unwrap();

        assert_eq!(transport.writes.lock().as_slice(), ["/docs/v1.2?tab=api".to_string()]);
        assert_eq!(outcome.query.get("tab"), Some(&"api".to_string()));
        assert_eq!(outcome.template(), Some("/docs/v1.2"));
    }

    #[test]
    fn test_registration_errors() {
        let engine = NavigationEngine::new();
        engine.on_sync("/a", |_, _| ()).unwrap();

        let err = engine.on_sync("/:x/:x", |_, _| ()).unwrap_err();
        assert!(matches!(err, NavigationError::InvalidTemplate(_)));
        assert_eq!(engine.templates(), vec!["/a".to_string()]);

        assert_eq!(engine.unregister("/a"), 1);
        assert_eq!(engine.route_count(), 0);
    }
}
