//! Employee accounts.

use serde::{Deserialize, Serialize};

/// Roles listed on the employee screen.
pub const STAFF_ROLES: [&str; 2] = ["ADMIN", "STAFF"];

/// An employee account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: i64,
    /// Older backends report the account id here as well.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    pub name: String,
    pub phone_number: String,
    pub role: String,
}

impl Employee {
    /// The id used by the update and delete endpoints.
    pub fn account_id(&self) -> i64 {
        self.user_id.unwrap_or(self.id)
    }
}

/// Payload for `POST /auth/admin-register`.
///
/// The role is not sent; the backend assigns it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployeeRequest {
    pub name: String,
    pub phone_number: String,
    pub password: String,
}

/// Partial update for `PUT /users/update/{id}`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmployeeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}
