//! Shared test utilities: a scripted order feed, a fake token provider,
//! and order JSON builders.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use futures_util::stream;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use zeroize::Zeroizing;

use foodstore::auth::TokenProvider;
use foodstore::models::Order;
use foodstore::stream::{ByteStream, OrderFeed, OrderStream, Subscription};
use foodstore::{FoodstoreError, Result};

/// What one call to [`OrderFeed::open_stream`] does.
pub enum Attempt {
    /// Answers `401`.
    Unauthorized,
    /// Answers with a non-success status.
    Status(u16),
    /// Sends the chunks, then the server closes the body.
    Close(Vec<String>),
    /// Sends the chunks, then stays open.
    Hold(Vec<String>),
    /// Forwards chunks sent on the channel; closes when the sender drops.
    Live(mpsc::UnboundedReceiver<Bytes>),
}

/// An [`OrderFeed`] that plays back a fixed script of connection attempts.
///
/// Once the script runs out every further attempt stays open forever.
#[derive(Default)]
pub struct MockFeed {
    attempts: Mutex<VecDeque<Attempt>>,
    seed: Mutex<Option<Vec<Order>>>,
    tokens_seen: Mutex<Vec<Option<String>>>,
    opens: AtomicUsize,
}

impl MockFeed {
    /// A feed whose initial order fetch fails.
    pub fn new(attempts: Vec<Attempt>) -> Arc<Self> {
        Arc::new(Self {
            attempts: Mutex::new(attempts.into()),
            ..Self::default()
        })
    }

    /// A feed whose initial order fetch returns `orders`.
    pub fn with_seed(attempts: Vec<Attempt>, orders: Vec<Order>) -> Arc<Self> {
        Arc::new(Self {
            attempts: Mutex::new(attempts.into()),
            seed: Mutex::new(Some(orders)),
            ..Self::default()
        })
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn tokens_seen(&self) -> Vec<Option<String>> {
        self.tokens_seen.lock().unwrap().clone()
    }
}

fn chunk_stream(chunks: Vec<String>) -> impl futures_util::Stream<Item = Result<Bytes>> + Send {
    stream::iter(chunks.into_iter().map(|c| Ok(Bytes::from(c))))
}

impl OrderFeed for MockFeed {
    async fn open_stream(&self, token: Option<&str>) -> Result<ByteStream> {
        use futures_util::StreamExt;

        self.opens.fetch_add(1, Ordering::SeqCst);
        self.tokens_seen
            .lock()
            .unwrap()
            .push(token.map(str::to_string));

        let attempt = self.attempts.lock().unwrap().pop_front();
        match attempt {
            Some(Attempt::Unauthorized) => Err(FoodstoreError::Unauthorized),
            Some(Attempt::Status(code)) => Err(FoodstoreError::Status {
                status: code,
                reason: reqwest::StatusCode::from_u16(code)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .unwrap_or("")
                    .to_string(),
            }),
            Some(Attempt::Close(chunks)) => Ok(Box::pin(chunk_stream(chunks))),
            Some(Attempt::Hold(chunks)) => {
                Ok(Box::pin(chunk_stream(chunks).chain(stream::pending())))
            }
            Some(Attempt::Live(rx)) => Ok(Box::pin(stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|chunk| (Ok(chunk), rx))
            }))),
            None => Ok(Box::pin(stream::pending::<Result<Bytes>>())),
        }
    }

    async fn fetch_orders(&self) -> Result<Vec<Order>> {
        match self.seed.lock().unwrap().clone() {
            Some(orders) => Ok(orders),
            None => Err(FoodstoreError::Status {
                status: 500,
                reason: "Internal Server Error".to_string(),
            }),
        }
    }
}

/// A [`TokenProvider`] with a settable token and refresh outcome.
pub struct MockTokens {
    token: Mutex<Option<String>>,
    refresh_ok: bool,
    refreshes: AtomicUsize,
    invalidations: AtomicUsize,
}

impl MockTokens {
    /// Starts with `token`; a successful refresh swaps in `fresh-token`.
    pub fn new(token: Option<&str>, refresh_ok: bool) -> Arc<Self> {
        Arc::new(Self {
            token: Mutex::new(token.map(str::to_string)),
            refresh_ok,
            refreshes: AtomicUsize::new(0),
            invalidations: AtomicUsize::new(0),
        })
    }

    pub fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    pub fn invalidations(&self) -> usize {
        self.invalidations.load(Ordering::SeqCst)
    }
}

impl TokenProvider for MockTokens {
    fn access_token(&self) -> Option<Zeroizing<String>> {
        self.token.lock().unwrap().clone().map(Zeroizing::new)
    }

    async fn refresh(&self) -> Result<()> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        if self.refresh_ok {
            *self.token.lock().unwrap() = Some("fresh-token".to_string());
            Ok(())
        } else {
            Err(FoodstoreError::Auth("refresh rejected".to_string()))
        }
    }

    fn invalidate_session(&self) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        *self.token.lock().unwrap() = None;
    }
}

/// Everything the subscriber callbacks received.
#[derive(Default)]
pub struct Recorder {
    pub data: Mutex<Vec<Vec<Order>>>,
    pub errors: Mutex<Vec<String>>,
    pub connects: AtomicUsize,
}

impl Recorder {
    pub fn deliveries(&self) -> Vec<Vec<i64>> {
        self.data
            .lock()
            .unwrap()
            .iter()
            .map(|orders| orders.iter().map(|o| o.order_id).collect())
            .collect()
    }

    pub fn last(&self) -> Option<Vec<Order>> {
        self.data.lock().unwrap().last().cloned()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

/// Subscribes with callbacks that record into a fresh [`Recorder`].
pub fn subscribe<F, T>(stream: &OrderStream<F, T>) -> (Subscription, Arc<Recorder>)
where
    F: OrderFeed,
    T: TokenProvider,
{
    let recorder = Arc::new(Recorder::default());
    let on_data = Arc::clone(&recorder);
    let on_error = Arc::clone(&recorder);
    let on_connect = Arc::clone(&recorder);

    let subscription = stream.subscribe(
        move |orders| on_data.data.lock().unwrap().push(orders),
        move |message| on_error.errors.lock().unwrap().push(message),
        Some(Box::new(move || {
            on_connect.connects.fetch_add(1, Ordering::SeqCst);
        })),
    );
    (subscription, recorder)
}

/// Lets spawned tasks run until they are idle.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

/// An order as the backend serializes it.
pub fn order_json(id: i64, status: &str) -> Value {
    json!({
        "orderId": id,
        "customerName": format!("Khách {id}"),
        "tableNumber": id,
        "totalAmount": 0,
        "orderTime": "2024-05-01T12:00:00",
        "status": status,
        "note": null,
        "items": [
            { "orderItemId": id * 10, "productId": 1, "productName": "Phở bò",
              "productPrice": 50000, "quantity": 2, "note": null },
            { "orderItemId": id * 10 + 1, "productId": 2, "productName": "Trà đá",
              "productPrice": 5000, "quantity": 3, "note": "ít đá" }
        ]
    })
}

pub fn order(id: i64, status: &str) -> Order {
    serde_json::from_value(order_json(id, status)).unwrap()
}

/// One SSE frame.
pub fn frame(event: &str, data: &Value) -> String {
    format!("event: {event}\ndata: {data}\n\n")
}

/// The greeting the server sends when the stream opens.
pub fn ack() -> String {
    "event: connected\ndata: Connected to order updates\n\n".to_string()
}
