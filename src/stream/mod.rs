//! Live order stream over Server-Sent Events.
//!
//! This module is organized by concern:
//! - [`parser`] - Incremental SSE framing
//! - [`reconciler`] - Applying messages to the local order cache
//! - [`feed`] - Opening the HTTP stream
//! - [`connection`] - Connection lifecycle, token refresh, reconnection

pub mod connection;
pub mod feed;
pub mod parser;
pub mod reconciler;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::auth::TokenProvider;
use crate::config::DEFAULT_RECONNECT_DELAY;
use crate::models::Order;

pub use connection::{ConnectionState, Subscription};
pub use feed::{ByteStream, OrderFeed};
pub use parser::{SseParser, StreamMessage};
pub use reconciler::{Applied, OrderReconciler, OrderSnapshot};

use connection::{Callbacks, ConnectionManager};

/// Entry point for subscribing to live order updates.
pub struct OrderStream<F, T> {
    feed: Arc<F>,
    tokens: Arc<T>,
    reconnect_delay: Duration,
}

impl<F: OrderFeed, T: TokenProvider> OrderStream<F, T> {
    /// Creates a stream reconnecting after [`DEFAULT_RECONNECT_DELAY`].
    #[must_use]
    pub fn new(feed: Arc<F>, tokens: Arc<T>) -> Self {
        Self {
            feed,
            tokens,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }

    /// Sets the fixed delay between reconnection attempts.
    #[must_use]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Starts streaming orders on a background task.
    ///
    /// `on_data` receives the full order list on every change,
    /// `on_error` a message for every transient failure, and `on_connect`
    /// fires each time the stream opens (including after reconnects).
    /// Callbacks run on the stream task in the order messages were framed.
    ///
    /// Only one subscription per consumer should be active at a time.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use = "dropping the subscription unsubscribes"]
    pub fn subscribe<D, E>(
        &self,
        on_data: D,
        on_error: E,
        on_connect: Option<Box<dyn Fn() + Send + Sync>>,
    ) -> Subscription
    where
        D: Fn(Vec<Order>) + Send + Sync + 'static,
        E: Fn(String) + Send + Sync + 'static,
    {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Idle);

        let callbacks = Callbacks {
            on_data: Arc::new(on_data),
            on_error: Arc::new(on_error),
            on_connect: on_connect.map(Arc::from),
        };

        let manager = ConnectionManager::new(
            Arc::clone(&self.feed),
            Arc::clone(&self.tokens),
            callbacks,
            self.reconnect_delay,
            cancel_rx,
            state_tx,
        );
        tokio::spawn(manager.run());

        Subscription::new(cancel_tx, state_rx)
    }
}
