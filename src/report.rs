//! Order views and revenue reporting.
//!
//! Revenue only counts `PAID` orders, and every amount is recomputed from
//! the line items rather than the stored order total.

use std::collections::BTreeMap;
use std::collections::HashMap;

use chrono::{DateTime, Datelike, FixedOffset};
use rust_decimal::Decimal;

use crate::models::{Order, OrderStatus, OrderTime};
use crate::{FoodstoreError, Result};

/// Longest range a revenue report may cover.
pub const MAX_RANGE_DAYS: i64 = 31;

/// Number of entries in [`RevenueReport::top_products`].
pub const TOP_PRODUCTS: usize = 5;

/// Tab filter on the orders screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Served,
    Paid,
}

impl StatusFilter {
    pub fn matches(&self, order: &Order) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => order.status == OrderStatus::Pending,
            StatusFilter::Served => order.status == OrderStatus::Served,
            StatusFilter::Paid => order.status == OrderStatus::Paid,
        }
    }

    /// Returns the orders passing this filter, in their original order.
    pub fn apply<'a>(&self, orders: &'a [Order]) -> Vec<&'a Order> {
        orders.iter().filter(|o| self.matches(o)).collect()
    }
}

/// Order counts shown above the orders table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusCounts {
    pub total: usize,
    pub pending: usize,
    pub served: usize,
    pub paid: usize,
}

impl StatusCounts {
    pub fn from_orders(orders: &[Order]) -> Self {
        orders.iter().fold(
            Self {
                total: orders.len(),
                ..Self::default()
            },
            |mut counts, order| {
                match order.status {
                    OrderStatus::Pending => counts.pending += 1,
                    OrderStatus::Served => counts.served += 1,
                    OrderStatus::Paid => counts.paid += 1,
                    _ => {}
                }
                counts
            },
        )
    }
}

/// Inclusive time window for a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
}

impl DateRange {
    /// Creates a range of at most [`MAX_RANGE_DAYS`] days.
    ///
    /// # Errors
    ///
    /// Returns [`FoodstoreError::InvalidRange`] if `end` is before `start`
    /// or the range is too long.
    pub fn new(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Result<Self> {
        if end < start {
            return Err(FoodstoreError::InvalidRange(
                "end is before start".to_string(),
            ));
        }
        // Partial days count as a whole day.
        let span = end - start;
        let days = span.num_days() + i64::from(span.num_seconds() % 86_400 != 0);
        if days > MAX_RANGE_DAYS {
            return Err(FoodstoreError::InvalidRange(format!(
                "range of {days} days exceeds {MAX_RANGE_DAYS} days"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, time: &OrderTime) -> bool {
        let at = time.as_datetime();
        self.start <= at && at <= self.end
    }
}

/// A paid order with its recomputed total.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSummary {
    pub order_id: i64,
    pub order_time: OrderTime,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyRevenue {
    pub year: i32,
    pub month: u32,
    pub revenue: Decimal,
    pub order_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopProduct {
    pub product_name: String,
    pub quantity_sold: u64,
    pub total_revenue: Decimal,
    /// Number of paid orders containing the product.
    pub order_count: usize,
}

/// Revenue figures over a set of orders.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RevenueReport {
    /// Paid orders in their original order.
    pub paid_orders: Vec<OrderSummary>,
    /// Newest month first.
    pub monthly: Vec<MonthlyRevenue>,
    /// Best sellers by quantity, at most [`TOP_PRODUCTS`].
    pub top_products: Vec<TopProduct>,
}

impl RevenueReport {
    /// Builds the report, optionally restricted to `range`.
    pub fn build(orders: &[Order], range: Option<&DateRange>) -> Self {
        let paid: Vec<&Order> = orders
            .iter()
            .filter(|o| o.status == OrderStatus::Paid)
            .filter(|o| range.is_none_or(|r| r.contains(&o.order_time)))
            .collect();

        let paid_orders = paid
            .iter()
            .map(|o| OrderSummary {
                order_id: o.order_id,
                order_time: o.order_time,
                total_amount: o.total(),
            })
            .collect();

        let mut months: BTreeMap<(i32, u32), (Decimal, usize)> = BTreeMap::new();
        for order in &paid {
            let at = order.order_time.as_datetime();
            let entry = months.entry((at.year(), at.month())).or_default();
            entry.0 += order.total();
            entry.1 += 1;
        }
        let monthly = months
            .into_iter()
            .rev()
            .map(|((year, month), (revenue, order_count))| MonthlyRevenue {
                year,
                month,
                revenue,
                order_count,
            })
            .collect();

        let mut products: HashMap<&str, TopProduct> = HashMap::new();
        for order in &paid {
            for item in &order.items {
                let entry = products
                    .entry(item.product_name.as_str())
                    .or_insert_with(|| TopProduct {
                        product_name: item.product_name.clone(),
                        quantity_sold: 0,
                        total_revenue: Decimal::ZERO,
                        order_count: 0,
                    });
                entry.quantity_sold += u64::from(item.quantity);
                entry.total_revenue += item.subtotal();
                entry.order_count += 1;
            }
        }
        let mut top_products: Vec<TopProduct> = products.into_values().collect();
        top_products.sort_by(|a, b| {
            b.quantity_sold
                .cmp(&a.quantity_sold)
                .then_with(|| a.product_name.cmp(&b.product_name))
        });
        top_products.truncate(TOP_PRODUCTS);

        Self {
            paid_orders,
            monthly,
            top_products,
        }
    }

    /// Sum of all paid order totals.
    pub fn total_revenue(&self) -> Decimal {
        self.paid_orders.iter().map(|o| o.total_amount).sum()
    }
}

/// Formats an amount the way prices are shown to staff, e.g.
/// `1.234.000 VNĐ`.
pub fn format_price(amount: Decimal) -> String {
    let rounded = amount.round();
    let digits = rounded.abs().trunc().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped} VNĐ")
}
