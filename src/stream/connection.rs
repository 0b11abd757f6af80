//! Order stream connection lifecycle.
//!
//! [`ConnectionManager`] opens the stream, refreshes the token once on
//! `401`, seeds the cache from the REST list, feeds the body through the
//! [`SseParser`] and [`OrderReconciler`], and reconnects after a fixed
//! delay whenever the connection fails or the server closes it.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::feed::{ByteStream, OrderFeed};
use super::parser::SseParser;
use super::reconciler::{Applied, OrderReconciler};
use crate::FoodstoreError;
use crate::auth::{AuthAttempt, TokenProvider};
use crate::models::Order;

/// Observable lifecycle of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Created, not yet connecting.
    Idle,
    /// Opening the stream (including a token refresh).
    Connecting,
    /// The stream is open and being read.
    Streaming,
    /// The server closed the stream; waiting to reconnect.
    Disconnected,
    /// The last attempt failed; waiting to reconnect.
    Error,
    /// Unsubscribed or the session is gone. Terminal.
    Closed,
}

type DataCallback = Arc<dyn Fn(Vec<Order>) + Send + Sync>;
type ErrorCallback = Arc<dyn Fn(String) + Send + Sync>;
type ConnectCallback = Arc<dyn Fn() + Send + Sync>;

/// Subscriber callbacks.
pub(crate) struct Callbacks {
    pub(crate) on_data: DataCallback,
    pub(crate) on_error: ErrorCallback,
    pub(crate) on_connect: Option<ConnectCallback>,
}

impl Callbacks {
    fn data(&self, orders: Vec<Order>) {
        (self.on_data)(orders);
    }

    fn error(&self, message: String) {
        (self.on_error)(message);
    }

    fn connected(&self) {
        if let Some(on_connect) = &self.on_connect {
            on_connect();
        }
    }
}

/// How one connection attempt ended.
enum SessionEnd {
    /// Unsubscribed; stop without callbacks.
    Cancelled,
    /// The refresh failed or the refreshed token was rejected.
    SessionInvalidated,
    /// The server closed the body.
    StreamEnded,
    /// Opening or reading failed.
    Failed(FoodstoreError),
}

/// Handle returned by [`OrderStream::subscribe`](super::OrderStream::subscribe).
///
/// Dropping it unsubscribes.
#[must_use = "dropping the subscription unsubscribes"]
pub struct Subscription {
    cancel: watch::Sender<bool>,
    state: watch::Receiver<ConnectionState>,
}

impl Subscription {
    pub(crate) fn new(
        cancel: watch::Sender<bool>,
        state: watch::Receiver<ConnectionState>,
    ) -> Self {
        Self { cancel, state }
    }

    /// Stops the stream: aborts the in-flight request or read, clears any
    /// pending reconnect, and suppresses further callbacks. Calling it
    /// again has no effect.
    pub fn unsubscribe(&self) {
        if !self.cancel.send_replace(true) {
            info!("Order stream unsubscribed");
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// A receiver to observe state changes.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Resolves once cancellation is requested or the handle is gone.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    let _ = cancel.wait_for(|cancelled| *cancelled).await;
}

/// Drives one subscription until it is cancelled or the session ends.
pub(crate) struct ConnectionManager<F, T> {
    feed: Arc<F>,
    tokens: Arc<T>,
    callbacks: Callbacks,
    reconnect_delay: Duration,
    cancel: watch::Receiver<bool>,
    state: watch::Sender<ConnectionState>,
}

impl<F: OrderFeed, T: TokenProvider> ConnectionManager<F, T> {
    pub(crate) fn new(
        feed: Arc<F>,
        tokens: Arc<T>,
        callbacks: Callbacks,
        reconnect_delay: Duration,
        cancel: watch::Receiver<bool>,
        state: watch::Sender<ConnectionState>,
    ) -> Self {
        Self {
            feed,
            tokens,
            callbacks,
            reconnect_delay,
            cancel,
            state,
        }
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.send_replace(state);
    }

    /// Runs connect / read / reconnect cycles.
    pub(crate) async fn run(self) {
        let mut cancel = self.cancel.clone();

        loop {
            if *cancel.borrow() {
                break;
            }

            self.set_state(ConnectionState::Connecting);
            let end = tokio::select! {
                biased;
                () = cancelled(&mut cancel) => SessionEnd::Cancelled,
                end = self.session() => end,
            };

            match end {
                SessionEnd::Cancelled | SessionEnd::SessionInvalidated => break,
                SessionEnd::StreamEnded => {
                    warn!("Order stream closed by server");
                    self.set_state(ConnectionState::Disconnected);
                    self.callbacks
                        .error("Connection closed by server".to_string());
                }
                SessionEnd::Failed(e) => {
                    error!("Order stream failed: {e}");
                    self.set_state(ConnectionState::Error);
                    self.callbacks.error(e.to_string());
                }
            }

            if *cancel.borrow() {
                break;
            }

            info!(
                delay_ms = u64::try_from(self.reconnect_delay.as_millis()).unwrap_or(u64::MAX),
                "Reconnecting order stream"
            );
            tokio::select! {
                biased;
                () = cancelled(&mut cancel) => break,
                () = tokio::time::sleep(self.reconnect_delay) => {}
            }
        }

        self.set_state(ConnectionState::Closed);
        info!("Order stream closed");
    }

    /// One connection: open, seed, then read until the body ends or fails.
    ///
    /// Parser and reconciler state live only as long as this call.
    async fn session(&self) -> SessionEnd {
        let body = match self.open().await {
            Ok(body) => body,
            Err(end) => return end,
        };

        self.set_state(ConnectionState::Streaming);
        self.callbacks.connected();

        let mut reconciler = OrderReconciler::new();
        match self.feed.fetch_orders().await {
            Ok(orders) => {
                info!(count = orders.len(), "Orders loaded initially");
                self.callbacks.data(reconciler.seed(orders));
            }
            Err(e) => warn!("Failed to load initial orders: {e}"),
        }

        self.read_loop(body, &mut reconciler).await
    }

    /// Opens the stream, refreshing the token at most once.
    async fn open(&self) -> Result<ByteStream, SessionEnd> {
        let mut attempt = AuthAttempt::Initial;

        loop {
            let token = self.tokens.access_token();
            if token.is_none() {
                warn!("No auth token available, connecting to order stream anyway");
            }

            info!(?attempt, "Connecting to order stream");
            match self
                .feed
                .open_stream(token.as_ref().map(|t| t.as_str()))
                .await
            {
                Ok(body) => return Ok(body),
                Err(FoodstoreError::Unauthorized) => match attempt {
                    AuthAttempt::Initial => {
                        info!("Order stream auth failed, attempting token refresh");
                        if let Err(e) = self.tokens.refresh().await {
                            error!("Token refresh failed, invalidating session: {e}");
                            self.tokens.invalidate_session();
                            return Err(SessionEnd::SessionInvalidated);
                        }
                        attempt = AuthAttempt::Refreshed;
                    }
                    AuthAttempt::Refreshed => {
                        error!("Refreshed token rejected, invalidating session");
                        self.tokens.invalidate_session();
                        return Err(SessionEnd::SessionInvalidated);
                    }
                },
                Err(e) => return Err(SessionEnd::Failed(e)),
            }
        }
    }

    /// Reads the body, delivering every reconciled snapshot in order.
    async fn read_loop(
        &self,
        mut body: ByteStream,
        reconciler: &mut OrderReconciler,
    ) -> SessionEnd {
        let mut parser = SseParser::new();

        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => return SessionEnd::Failed(e),
            };

            for message in parser.feed(&chunk) {
                debug!(event = %message.event_type, bytes = message.data.len(), "Order stream message");
                match reconciler.apply(&message) {
                    Applied::Snapshot(orders) => self.callbacks.data(orders),
                    Applied::Ignored => {}
                    Applied::Malformed(e) => self.callbacks.error(e.to_string()),
                }
            }
        }

        parser.finish();
        SessionEnd::StreamEnded
    }
}
