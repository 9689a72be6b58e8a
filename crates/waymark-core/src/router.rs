//! Router facade
//!
//! Binds a [`NavigationEngine`] to a [`Transport`]. `start` attaches the
//! transport listeners, runs the initial dispatch and hands back a
//! [`ListenerLoop`]; spawning that loop is what keeps back/forward, hash
//! edits and link clicks flowing into the engine.

use futures_util::stream::{self, StreamExt};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use waymark_engine::{
    IntoHandlerResult, NavigationEngine, NavigationEvent, NavigationOutcome, PathParams,
    QueryParams, Subscription, Transport,
};
use waymark_location::MemoryHistory;

use crate::config::RouterConfig;
use crate::error::CoreError;
use crate::Result;

/// A location change reported by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationChange {
    /// Back/forward or a hash edit
    External { path: String, query: String },
    /// An intercepted annotated link
    Link { path: String, query: String },
}

impl LocationChange {
    pub fn path(&self) -> &str {
        match self {
            LocationChange::External { path, .. } | LocationChange::Link { path, .. } => path,
        }
    }

    pub fn query(&self) -> &str {
        match self {
            LocationChange::External { query, .. } | LocationChange::Link { query, .. } => query,
        }
    }
}

pub struct Router {
    engine: Arc<NavigationEngine>,
    transport: Arc<dyn Transport>,
    /// Transport listeners; `None` while stopped
    subscriptions: Mutex<Option<Vec<Subscription>>>,
}

impl Router {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            engine: Arc::new(NavigationEngine::new()),
            transport,
            subscriptions: Mutex::new(None),
        }
    }

    /// Build the configured transport over `history`
    pub fn with_config(config: &RouterConfig, history: MemoryHistory) -> Result<Self> {
        config.validate()?;

        tracing::debug!(mode = ?config.mode, root = %config.root, "Creating router");
        Ok(Self::new(config.transport(history)))
    }

    /// Open `url` in a fresh [`MemoryHistory`] and route over it
    pub fn open(config: &RouterConfig, url: &str) -> Result<(Self, MemoryHistory)> {
        let history = MemoryHistory::new(url)?;
        let router = Self::with_config(config, history.clone())?;
        Ok((router, history))
    }

    pub fn engine(&self) -> &Arc<NavigationEngine> {
        &self.engine
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    // === Registration ===

    pub fn on<F, Fut, R>(&self, template: &str, handler: F) -> Result<&Self>
    where
        F: Fn(QueryParams, PathParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoHandlerResult + 'static,
    {
        self.engine.on(template, handler)?;
        Ok(self)
    }

    pub fn on_sync<F, R>(&self, template: &str, handler: F) -> Result<&Self>
    where
        F: Fn(QueryParams, PathParams) -> R + Send + Sync + 'static,
        R: IntoHandlerResult,
    {
        self.engine.on_sync(template, handler)?;
        Ok(self)
    }

    pub fn not_found<F, Fut, R>(&self, handler: F) -> &Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoHandlerResult + 'static,
    {
        self.engine.not_found(handler);
        self
    }

    pub fn not_found_sync<F, R>(&self, handler: F) -> &Self
    where
        F: Fn(String) -> R + Send + Sync + 'static,
        R: IntoHandlerResult,
    {
        self.engine.not_found_sync(handler);
        self
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&NavigationEvent) + Send + Sync + 'static,
    {
        self.engine.subscribe(listener)
    }

    // === Navigation ===

    pub async fn navigate(&self, location: &str) -> Result<NavigationOutcome> {
        Ok(self.engine.navigate(self.transport.as_ref(), location).await?)
    }

    /// Attach to the transport and dispatch the current location.
    ///
    /// Listeners are attached before the initial dispatch so no change is
    /// missed in between. Changes queue until the returned loop runs.
    pub async fn start(&self) -> Result<(NavigationOutcome, ListenerLoop)> {
        let (sender, changes) = mpsc::unbounded_channel();

        {
            let mut slot = self.subscriptions.lock();
            if slot.is_some() {
                return Err(CoreError::AlreadyStarted);
            }

            let external = sender.clone();
            let mut subscriptions = vec![self.transport.on_external_change(Arc::new(
                move |path: String, query: String| {
                    forward(&external, LocationChange::External { path, query })
                },
            ))];

            if let Some(links) = self.transport.intercept_links(Arc::new(move |path: String, query: String| {
                forward(&sender, LocationChange::Link { path, query })
            })) {
                subscriptions.push(links);
            }

            *slot = Some(subscriptions);
        }

        let path = self.transport.current_path();
        let query = self.transport.current_query();
        tracing::info!(path = %path, routes = self.engine.route_count(), "Router started");

        let outcome = self.engine.on_location_changed(&path, &query).await;

        let listener = ListenerLoop {
            engine: Arc::clone(&self.engine),
            transport: Arc::clone(&self.transport),
            changes,
        };

        Ok((outcome, listener))
    }

    /// Detach from the transport. The listener loop drains and exits.
    pub fn stop(&self) -> Result<()> {
        let subscriptions = self.subscriptions.lock().take().ok_or(CoreError::NotStarted)?;
        drop(subscriptions);

        tracing::info!("Router stopped");
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.subscriptions.lock().is_some()
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("engine", &self.engine)
            .field("started", &self.is_started())
            .finish_non_exhaustive()
    }
}

fn forward(sender: &mpsc::UnboundedSender<LocationChange>, change: LocationChange) {
    if let Err(e) = sender.send(change) {
        tracing::debug!(path = %e.0.path(), "Listener loop gone, location change dropped");
    }
}

/// Drives transport notifications into the engine.
///
/// Changes are dispatched concurrently: a slow handler never holds back
/// the next navigation, and the engine's generation counter decides which
/// result is applied.
#[must_use = "location changes are only dispatched while the loop runs"]
pub struct ListenerLoop {
    engine: Arc<NavigationEngine>,
    transport: Arc<dyn Transport>,
    changes: mpsc::UnboundedReceiver<LocationChange>,
}

impl ListenerLoop {
    /// Run until the router stops. Returns the number of changes dispatched.
    pub async fn run(self) -> usize {
        let Self {
            engine,
            transport,
            changes,
        } = self;
        let dispatched = AtomicUsize::new(0);

        let changes = stream::unfold(changes, |mut changes| async move {
            changes.recv().await.map(|change| (change, changes))
        });

        changes
            .for_each_concurrent(None, |change| {
                let engine = &engine;
                let transport = &transport;
                let dispatched = &dispatched;

                async move {
                    dispatched.fetch_add(1, Ordering::SeqCst);

                    match change {
                        LocationChange::External { path, query } => {
                            engine.on_location_changed(&path, &query).await;
                        }
                        LocationChange::Link { path, query } => {
                            if let Err(e) = engine.follow_link(transport.as_ref(), &path, &query).await {
                                tracing::warn!(path = %path, error = %e, "Link navigation failed");
                            }
                        }
                    }
                }
            })
            .await;

        let dispatched = dispatched.into_inner();
        tracing::info!(dispatched, "Listener loop stopped");
        dispatched
    }
}

impl std::fmt::Debug for ListenerLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerLoop").finish_non_exhaustive()
    }
}
