//! Bank accounts shown to customers for transfer payments.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankInfo {
    pub id: i64,
    pub bank_name: String,
    pub account_number: String,
    pub account_holder: String,
    #[serde(default)]
    pub qr_code_image_url: Option<String>,
    pub status: BankStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BankStatus {
    Active,
    Deactivated,
}

impl BankStatus {
    /// Returns the value expected by the `status` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            BankStatus::Active => "ACTIVE",
            BankStatus::Deactivated => "DEACTIVATED",
        }
    }
}
