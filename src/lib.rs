//! Back-office client library for the restaurant ordering system.
//!
//! Provides typed models, an authenticated REST client, and a live order
//! stream over Server-Sent Events that keeps a local order list in sync
//! and reconnects on its own.

pub mod auth;
pub mod config;
pub mod credentials;
pub mod error;
pub mod models;
pub mod report;
pub mod rest;
pub mod stream;

pub use error::{FoodstoreError, Result};
