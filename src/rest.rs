//! REST client for the back-office API.
//!
//! [`ApiClient`] wraps every endpoint the dashboard uses. Requests carry
//! the current bearer token; a `401` triggers exactly one token refresh
//! and retry, and a failed refresh invalidates the session.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};

use crate::auth::{AuthAttempt, TokenProvider};
use crate::models::staff::STAFF_ROLES;
use crate::models::{
    BankInfo, BankStatus, CreateEmployeeRequest, Employee, Order, OrderStatus, Product,
    UpdateEmployeeRequest,
};
use crate::{FoodstoreError, Result};

/// Connect timeout for every request. The order stream has no read
/// timeout; an idle stream is healthy.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds the shared HTTP client.
///
/// # Errors
///
/// Returns [`FoodstoreError::Http`] if the TLS backend cannot be
/// initialised.
pub fn build_http_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()?)
}

/// Authenticated client for the back-office REST API.
pub struct ApiClient<T> {
    pub(crate) client: reqwest::Client,
    pub(crate) base_url: String,
    tokens: Arc<T>,
}

impl<T: TokenProvider> ApiClient<T> {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, tokens: Arc<T>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            tokens,
        }
    }

    /// The token provider shared with the order stream.
    pub fn tokens(&self) -> &Arc<T> {
        &self.tokens
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Sends a request, refreshing the token once on `401`.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<Response> {
        let mut attempt = AuthAttempt::Initial;

        loop {
            let mut request = self.client.request(method.clone(), self.url(path));
            if let Some(token) = self.tokens.access_token() {
                request = request.bearer_auth(token.as_str());
            }
            if let Some(body) = &body {
                request = request.json(body);
            }

            let response = request.send().await?;
            let status = response.status();
            debug!(%method, path, status = status.as_u16(), "API response");

            if status == StatusCode::UNAUTHORIZED && attempt == AuthAttempt::Initial {
                info!(path, "Token expired, attempting refresh");
                match self.tokens.refresh().await {
                    Ok(()) => {
                        attempt = AuthAttempt::Refreshed;
                        continue;
                    }
                    Err(e) => {
                        error!("Token refresh failed, invalidating session: {e}");
                        self.tokens.invalidate_session();
                        return Err(FoodstoreError::SessionExpired);
                    }
                }
            }

            if !status.is_success() {
                warn!(%method, path, status = status.as_u16(), "API request failed");
                return Err(FoodstoreError::status(status));
            }

            return Ok(response);
        }
    }

    async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        Ok(self.send(Method::GET, path, None).await?.json().await?)
    }

    async fn send_json<B, R>(&self, method: Method, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        Ok(self.send(method, path, Some(body)).await?.json().await?)
    }

    async fn send_empty(&self, method: Method, path: &str) -> Result<()> {
        self.send(method, path, None).await?;
        Ok(())
    }

    // -- Products --

    /// Fetches the whole menu.
    ///
    /// # Errors
    ///
    /// Returns a [`FoodstoreError`] if the request fails or the session
    /// expired.
    pub async fn get_all_products(&self) -> Result<Vec<Product>> {
        self.get_json("/menu/products/getAll").await
    }

    /// Fetches the menu and keeps the products of one category.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get_all_products`].
    pub async fn get_products_by_category(&self, category_id: i64) -> Result<Vec<Product>> {
        let mut products = self.get_all_products().await?;
        products.retain(|p| p.category.category_id == category_id);
        Ok(products)
    }

    /// Deletes a product.
    ///
    /// # Errors
    ///
    /// Returns a [`FoodstoreError`] if the request fails.
    pub async fn delete_product(&self, product_id: i64) -> Result<()> {
        self.send_empty(
            Method::DELETE,
            &format!("/menu/products/delete/{product_id}"),
        )
        .await
    }

    // -- Orders --

    /// Fetches every order known to the backend.
    ///
    /// # Errors
    ///
    /// Returns a [`FoodstoreError`] if the request fails.
    pub async fn get_all_orders(&self) -> Result<Vec<Order>> {
        self.get_json("/orders/getAll").await
    }

    /// Requests a status change for an order.
    ///
    /// # Errors
    ///
    /// Returns a [`FoodstoreError`] if the request fails.
    pub async fn update_order_status(&self, order_id: i64, status: OrderStatus) -> Result<Order> {
        info!(order_id, %status, "Updating order status");
        self.send_json(
            Method::PUT,
            &format!("/orders/{order_id}/status"),
            &serde_json::json!({ "status": status.as_str() }),
        )
        .await
    }

    /// Moves an order one step along `PENDING → SERVED → PAID`.
    ///
    /// Returns `Ok(None)` without calling the backend when the order is
    /// already in a final state.
    ///
    /// # Errors
    ///
    /// Returns a [`FoodstoreError`] if the request fails.
    pub async fn advance_order(&self, order: &Order) -> Result<Option<Order>> {
        match order.status.next() {
            Some(next) => self
                .update_order_status(order.order_id, next)
                .await
                .map(Some),
            None => Ok(None),
        }
    }

    // -- Employees --

    /// Lists admin and staff accounts.
    ///
    /// # Errors
    ///
    /// Returns a [`FoodstoreError`] if the request fails.
    pub async fn get_all_employees(&self) -> Result<Vec<Employee>> {
        self.send_json(Method::POST, "/auth/get-users-by-roles", &STAFF_ROLES)
            .await
    }

    /// Registers a new employee account.
    ///
    /// # Errors
    ///
    /// Returns a [`FoodstoreError`] if the request fails.
    pub async fn create_employee(&self, request: &CreateEmployeeRequest) -> Result<Employee> {
        self.send_json(Method::POST, "/auth/admin-register", request)
            .await
    }

    /// Updates an employee account.
    ///
    /// # Errors
    ///
    /// Returns a [`FoodstoreError`] if the request fails.
    pub async fn update_employee(
        &self,
        user_id: i64,
        request: &UpdateEmployeeRequest,
    ) -> Result<Employee> {
        self.send_json(Method::PUT, &format!("/users/update/{user_id}"), request)
            .await
    }

    /// Deletes an employee account.
    ///
    /// # Errors
    ///
    /// Returns a [`FoodstoreError`] if the request fails.
    pub async fn delete_employee(&self, user_id: i64) -> Result<()> {
        self.send_empty(Method::DELETE, &format!("/users/delete/{user_id}"))
            .await
    }

    // -- Banks --

    /// Lists bank accounts currently offered to customers.
    ///
    /// # Errors
    ///
    /// Returns a [`FoodstoreError`] if the request fails.
    pub async fn get_active_banks(&self) -> Result<Vec<BankInfo>> {
        self.get_json("/banks/active").await
    }

    /// Lists every bank account.
    ///
    /// # Errors
    ///
    /// Returns a [`FoodstoreError`] if the request fails.
    pub async fn get_all_banks(&self) -> Result<Vec<BankInfo>> {
        self.get_json("/banks").await
    }

    /// Offers a bank account to customers again.
    ///
    /// # Errors
    ///
    /// Returns a [`FoodstoreError`] if the request fails.
    pub async fn activate_bank(&self, bank_id: i64) -> Result<BankInfo> {
        self.set_bank_status(bank_id, BankStatus::Active).await
    }

    /// Stops offering a bank account.
    ///
    /// # Errors
    ///
    /// Returns a [`FoodstoreError`] if the request fails.
    pub async fn deactivate_bank(&self, bank_id: i64) -> Result<BankInfo> {
        self.set_bank_status(bank_id, BankStatus::Deactivated)
            .await
    }

    async fn set_bank_status(&self, bank_id: i64, status: BankStatus) -> Result<BankInfo> {
        let path = format!("/banks/{bank_id}/status?status={}", status.as_str());
        Ok(self.send(Method::PATCH, &path, None).await?.json().await?)
    }
}
