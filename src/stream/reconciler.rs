//! Applies framed stream messages to the local order cache.

use serde_json::Value;
use tracing::{debug, warn};

use super::parser::StreamMessage;
use crate::FoodstoreError;
use crate::models::Order;

/// Acknowledgement text the server sends right after the stream opens.
pub const CONNECTION_ACK: &str = "Connected to order updates";

/// Event carrying a new order, or a full list.
pub const ORDER_CREATED: &str = "order-created";
/// Event carrying a changed order, or a full list.
pub const ORDER_UPDATED: &str = "order-updated";
/// Event the server may use to seed the client with the full list.
pub const CONNECTED: &str = "connected";

/// The current set of orders, unique by `order_id`, in server order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderSnapshot {
    orders: Vec<Order>,
}

impl OrderSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn get(&self, order_id: i64) -> Option<&Order> {
        self.orders.iter().find(|o| o.order_id == order_id)
    }

    /// Replaces every order, keeping the given order.
    pub fn replace(&mut self, orders: Vec<Order>) {
        self.orders = orders;
    }

    /// Replaces the order with the same id in place, or appends it.
    pub fn upsert(&mut self, order: Order) {
        match self.position(order.order_id) {
            Some(index) => self.orders[index] = order,
            None => self.orders.push(order),
        }
    }

    /// Replaces the order with the same id in place.
    ///
    /// Returns `false`, leaving the snapshot untouched, if the id is unknown.
    pub fn update_existing(&mut self, order: Order) -> bool {
        match self.position(order.order_id) {
            Some(index) => {
                self.orders[index] = order;
                true
            }
            None => false,
        }
    }

    /// An owned copy for subscribers.
    pub fn to_vec(&self) -> Vec<Order> {
        self.orders.clone()
    }

    fn position(&self, order_id: i64) -> Option<usize> {
        self.orders.iter().position(|o| o.order_id == order_id)
    }
}

/// Result of applying one message.
#[derive(Debug)]
pub enum Applied {
    /// The snapshot changed; deliver this copy.
    Snapshot(Vec<Order>),
    /// Nothing to deliver.
    Ignored,
    /// The payload could not be interpreted. The snapshot is unchanged.
    Malformed(FoodstoreError),
}

/// Owns the [`OrderSnapshot`] for one stream session.
#[derive(Debug, Default)]
pub struct OrderReconciler {
    snapshot: OrderSnapshot,
}

impl OrderReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> &OrderSnapshot {
        &self.snapshot
    }

    /// Seeds the snapshot from the full order list.
    pub fn seed(&mut self, orders: Vec<Order>) -> Vec<Order> {
        self.snapshot.replace(orders);
        self.snapshot.to_vec()
    }

    /// Applies one message.
    pub fn apply(&mut self, message: &StreamMessage) -> Applied {
        if message.data == CONNECTION_ACK {
            debug!("Order stream acknowledged");
            return Applied::Ignored;
        }

        let payload: Value = match serde_json::from_str(&message.data) {
            Ok(value) => value,
            Err(e) => return malformed(message, e.to_string()),
        };

        if let Value::Array(_) = payload {
            return match serde_json::from_value::<Vec<Order>>(payload) {
                Ok(orders) => {
                    debug!(event = %message.event_type, count = orders.len(), "Replacing order snapshot");
                    Applied::Snapshot(self.seed(orders))
                }
                Err(e) => malformed(message, e.to_string()),
            };
        }

        match message.event_type.as_str() {
            ORDER_CREATED | ORDER_UPDATED => {}
            _ => return Applied::Ignored,
        }

        let has_id = payload
            .get("orderId")
            .is_some_and(|id| !id.is_null());
        if !has_id {
            return Applied::Ignored;
        }

        let order: Order = match serde_json::from_value(payload) {
            Ok(order) => order,
            Err(e) => return malformed(message, e.to_string()),
        };

        if message.event_type == ORDER_CREATED {
            debug!(order_id = order.order_id, "Upserting order");
            self.snapshot.upsert(order);
        } else {
            let order_id = order.order_id;
            if !self.snapshot.update_existing(order) {
                debug!(order_id, "Ignoring update for unknown order");
                return Applied::Ignored;
            }
            debug!(order_id, "Updated order");
        }

        Applied::Snapshot(self.snapshot.to_vec())
    }
}

fn malformed(message: &StreamMessage, reason: String) -> Applied {
    let preview: String = message.data.chars().take(100).collect();
    warn!(event = %message.event_type, data = %preview, "Failed to parse stream payload: {reason}");
    Applied::Malformed(FoodstoreError::MalformedMessage(reason))
}
