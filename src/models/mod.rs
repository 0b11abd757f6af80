//! Shared models for the back-office REST API and order stream.
//!
//! Contains orders and their line items, menu products, employee
//! accounts, and payment bank accounts.

pub mod bank;
pub mod menu;
pub mod order;
pub mod staff;

pub use bank::{BankInfo, BankStatus};
pub use menu::{Category, Product};
pub use order::{Order, OrderItem, OrderStatus, OrderTime};
pub use staff::{CreateEmployeeRequest, Employee, UpdateEmployeeRequest};
