//! Order models as served by `/orders/getAll` and the order stream.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Offset of the restaurant's local clock (UTC+7).
const LOCAL_OFFSET_SECS: i32 = 7 * 3600;

/// A table order with its line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: i64,
    #[serde(default)]
    pub customer_name: Option<String>,
    pub table_number: i32,
    /// Stored total as reported by the server. Not reliable, use
    /// [`Order::total`].
    #[serde(default)]
    pub total_amount: Option<Decimal>,
    pub order_time: OrderTime,
    pub status: OrderStatus,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Sum of `price * quantity` over all items.
    pub fn total(&self) -> Decimal {
        self.items.iter().map(OrderItem::subtotal).sum()
    }
}

/// A line item, with the product snapshot taken when the order was placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(default)]
    pub order_item_id: Option<i64>,
    pub product_id: i64,
    pub product_name: String,
    pub product_price: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub note: Option<String>,
}

impl OrderItem {
    pub fn subtotal(&self) -> Decimal {
        self.product_price * Decimal::from(self.quantity)
    }
}

/// Server-driven order lifecycle.
///
/// `PENDING → SERVED → PAID`, with `CANCELLED` as an orthogonal terminal
/// state. `COMPLETED` is only ever displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[serde(alias = "pending")]
    Pending,
    #[serde(alias = "served")]
    Served,
    #[serde(alias = "paid")]
    Paid,
    #[serde(alias = "cancelled")]
    Cancelled,
    #[serde(alias = "completed")]
    Completed,
}

impl OrderStatus {
    /// Returns the wire name expected by the status endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Served => "SERVED",
            OrderStatus::Paid => "PAID",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Completed => "COMPLETED",
        }
    }

    /// The transition staff can request from this status, if any.
    pub fn next(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Served),
            OrderStatus::Served => Some(OrderStatus::Paid),
            _ => None,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order timestamp normalised to a fixed offset.
///
/// The server sends either an ISO-8601 string (with or without offset) or
/// a `[year, month, day, hour, minute, second?, nanosecond?]` array.
/// Timestamps without an offset are in restaurant local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OrderTime(DateTime<FixedOffset>);

impl OrderTime {
    pub fn new(at: DateTime<FixedOffset>) -> Self {
        Self(at)
    }

    /// Interprets a naive timestamp in restaurant local time. Returns
    /// `None` when the UTC instant falls outside the representable range.
    pub fn from_local(naive: NaiveDateTime) -> Option<Self> {
        let offset = local_offset();
        let utc = naive
            .checked_sub_signed(chrono::Duration::seconds(i64::from(offset.local_minus_utc())))?;
        Some(Self(DateTime::from_naive_utc_and_offset(utc, offset)))
    }

    pub fn as_datetime(&self) -> DateTime<FixedOffset> {
        self.0
    }

    /// Parses an ISO-8601 timestamp, defaulting to local time when the
    /// string carries no offset.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
            return Some(Self(at));
        }
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
                return Self::from_local(naive);
            }
        }
        None
    }

    /// Builds a timestamp from the array form.
    pub fn from_parts(parts: &[i64]) -> Option<Self> {
        if !(5..=7).contains(&parts.len()) {
            return None;
        }
        let part = |i: usize| parts.get(i).copied().unwrap_or(0);
        let date = NaiveDate::from_ymd_opt(
            i32::try_from(part(0)).ok()?,
            u32::try_from(part(1)).ok()?,
            u32::try_from(part(2)).ok()?,
        )?;
        let naive = date.and_hms_nano_opt(
            u32::try_from(part(3)).ok()?,
            u32::try_from(part(4)).ok()?,
            u32::try_from(part(5)).ok()?,
            u32::try_from(part(6)).ok()?,
        )?;
        Self::from_local(naive)
    }
}

fn local_offset() -> FixedOffset {
    FixedOffset::east_opt(LOCAL_OFFSET_SECS).expect("UTC+7 is a valid offset")
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawOrderTime {
    Text(String),
    Parts(Vec<i64>),
}

impl<'de> Deserialize<'de> for OrderTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawOrderTime::deserialize(deserializer)? {
            RawOrderTime::Text(raw) => OrderTime::parse(&raw)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid order time {raw:?}"))),
            RawOrderTime::Parts(parts) => OrderTime::from_parts(&parts).ok_or_else(|| {
                serde::de::Error::custom(format!("invalid order time array {parts:?}"))
            }),
        }
    }
}

impl Serialize for OrderTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_rfc3339())
    }
}

impl fmt::Display for OrderTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%d/%m/%Y %H:%M"))
    }
}

impl From<DateTime<FixedOffset>> for OrderTime {
    fn from(at: DateTime<FixedOffset>) -> Self {
        Self(at)
    }
}
