//! The HTTP side of the order stream.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use tracing::{debug, info};

use crate::auth::TokenProvider;
use crate::models::Order;
use crate::rest::ApiClient;
use crate::{FoodstoreError, Result};

/// Body of an open order stream.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Source of the live order stream and of the full order list.
pub trait OrderFeed: Send + Sync + 'static {
    /// Opens the SSE endpoint.
    ///
    /// Fails with [`FoodstoreError::Unauthorized`] on `401` and with
    /// [`FoodstoreError::Status`] on any other non-success status.
    fn open_stream(&self, token: Option<&str>) -> impl Future<Output = Result<ByteStream>> + Send;

    /// Fetches every order, used once per connection to seed the cache.
    fn fetch_orders(&self) -> impl Future<Output = Result<Vec<Order>>> + Send;
}

impl<T: TokenProvider> OrderFeed for ApiClient<T> {
    async fn open_stream(&self, token: Option<&str>) -> Result<ByteStream> {
        let mut request = self
            .client
            .get(self.url("/orders/stream"))
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache");
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), "Order stream response");

        if status == StatusCode::UNAUTHORIZED {
            return Err(FoodstoreError::Unauthorized);
        }
        if !status.is_success() {
            return Err(FoodstoreError::status(status));
        }

        info!("Order stream opened");
        Ok(Box::pin(
            response
                .bytes_stream()
                .map(|chunk| chunk.map_err(FoodstoreError::from)),
        ))
    }

    async fn fetch_orders(&self) -> Result<Vec<Order>> {
        self.get_all_orders().await
    }
}
