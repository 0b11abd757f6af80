//! Deserialization tests for the back-office API models.

use chrono::{Datelike, Timelike};
use rust_decimal_macros::dec;

use foodstore::credentials::AuthData;
use foodstore::models::menu::{CATEGORY_DRINKS, CATEGORY_FOOD};
use foodstore::models::{
    BankInfo, BankStatus, Employee, Order, OrderStatus, Product, UpdateEmployeeRequest,
};
use foodstore::report::{StatusCounts, format_price};

const ORDERS_JSON: &str = include_str!("fixtures/orders.json");
const PRODUCTS_JSON: &str = include_str!("fixtures/products.json");
const LOGIN_JSON: &str = include_str!("fixtures/login.json");

fn orders() -> Vec<Order> {
    serde_json::from_str(ORDERS_JSON).expect("Failed to deserialize orders")
}

#[test]
fn test_orders_deserialize() {
    let orders = orders();

    assert_eq!(orders.len(), 3);
    assert_eq!(orders[0].order_id, 41);
    assert_eq!(orders[0].customer_name.as_deref(), Some("Anh Minh"));
    assert_eq!(orders[0].table_number, 3);
    assert_eq!(orders[0].status, OrderStatus::Pending);
    assert_eq!(orders[0].note.as_deref(), Some("Không hành"));
    assert_eq!(orders[0].items[0].product_price, dec!(50000));
    assert_eq!(orders[0].items[1].note.as_deref(), Some("ít đá"));

    assert!(orders[1].customer_name.is_none());
    assert!(orders[1].note.is_none());
    assert!(orders[1].items[0].note.is_none());

    assert_eq!(orders[2].status, OrderStatus::Paid);
    assert!(orders[2].total_amount.is_none());
    assert!(orders[2].items.is_empty());
}

#[test]
fn test_order_total_ignores_stored_amount() {
    let orders = orders();

    assert_eq!(orders[0].total(), dec!(115000));
    assert_eq!(orders[1].total_amount, Some(dec!(999999)));
    assert_eq!(orders[1].total(), dec!(45000));
    assert_eq!(orders[2].total(), dec!(0));
    assert_eq!(format_price(orders[0].total()), "115.000 VNĐ");
}

#[test]
fn test_order_time_array_form_is_local_time() {
    let at = orders()[0].order_time.as_datetime();

    assert_eq!((at.year(), at.month(), at.day()), (2024, 5, 1));
    assert_eq!((at.hour(), at.minute(), at.second()), (12, 30, 15));
    assert_eq!(at.nanosecond(), 250_000_000);
    assert_eq!(at.offset().local_minus_utc(), 7 * 3600);
}

#[test]
fn test_order_time_string_forms() {
    let orders = orders();

    let with_offset = orders[1].order_time.as_datetime();
    assert_eq!(with_offset.hour(), 19);
    assert_eq!(orders[1].order_time.to_string(), "01/05/2024 19:05");

    let naive = orders[2].order_time.as_datetime();
    assert_eq!(naive.offset().local_minus_utc(), 7 * 3600);
    assert_eq!(orders[2].order_time.to_string(), "30/04/2024 23:50");
    assert!(orders[2].order_time < orders[1].order_time);
}

#[test]
fn test_invalid_order_time_is_rejected() {
    let json = r#"{"orderId":1,"tableNumber":1,"orderTime":"yesterday","status":"PENDING"}"#;
    assert!(serde_json::from_str::<Order>(json).is_err());

    let json = r#"{"orderId":1,"tableNumber":1,"orderTime":[2024,13,1,0,0],"status":"PENDING"}"#;
    assert!(serde_json::from_str::<Order>(json).is_err());
}

#[test]
fn test_unknown_order_status_is_rejected() {
    let json = r#"{"orderId":1,"tableNumber":1,"orderTime":"2024-05-01T10:00:00","status":"LOST"}"#;
    assert!(serde_json::from_str::<Order>(json).is_err());
}

#[test]
fn test_order_status_lifecycle() {
    assert_eq!(OrderStatus::Pending.next(), Some(OrderStatus::Served));
    assert_eq!(OrderStatus::Served.next(), Some(OrderStatus::Paid));
    assert_eq!(OrderStatus::Paid.next(), None);
    assert_eq!(OrderStatus::Cancelled.next(), None);
    assert_eq!(OrderStatus::Served.to_string(), "SERVED");
}

#[test]
fn test_status_counts_over_fixture() {
    let counts = StatusCounts::from_orders(&orders());
    assert_eq!(counts.total, 3);
    assert_eq!((counts.pending, counts.served, counts.paid), (1, 1, 1));
}

#[test]
fn test_products_deserialize() {
    let products: Vec<Product> =
        serde_json::from_str(PRODUCTS_JSON).expect("Failed to deserialize products");

    assert_eq!(products.len(), 2);
    assert_eq!(products[0].price, dec!(50000));
    assert_eq!(products[0].category.category_id, CATEGORY_FOOD);
    assert_eq!(products[1].category.category_id, CATEGORY_DRINKS);
    assert!(products[1].image.is_none());
}

#[test]
fn test_login_response_deserializes() {
    let auth: AuthData = serde_json::from_str(LOGIN_JSON).expect("Failed to deserialize login");

    assert_eq!(auth.user_id, 5);
    assert_eq!(auth.phone_number, "0901234567");
    assert!(auth.is_admin());
    assert_eq!(auth.token, "access-token-1");
    assert_eq!(auth.refresh_token, "refresh-token-1");

    let debug = format!("{auth:?}");
    assert!(!debug.contains("access-token-1"));
    assert!(!debug.contains("refresh-token-1"));
}

#[test]
fn test_employee_account_id_prefers_user_id() {
    let json = r#"[
        {"id": 3, "name": "Lan", "phoneNumber": "0911", "role": "STAFF"},
        {"id": 4, "userId": 14, "name": "Hùng", "phoneNumber": "0922", "role": "ADMIN"}
    ]"#;
    let employees: Vec<Employee> = serde_json::from_str(json).unwrap();

    assert_eq!(employees[0].account_id(), 3);
    assert_eq!(employees[1].account_id(), 14);
}

#[test]
fn test_employee_update_skips_unset_fields() {
    let request = UpdateEmployeeRequest {
        name: Some("Lan".to_string()),
        ..UpdateEmployeeRequest::default()
    };
    let value = serde_json::to_value(&request).unwrap();

    assert_eq!(value, serde_json::json!({ "name": "Lan" }));
}

#[test]
fn test_bank_info_deserializes() {
    let json = r#"{
        "id": 2,
        "bankName": "Vietcombank",
        "accountNumber": "0123456789",
        "accountHolder": "NGUYEN VAN A",
        "qrCodeImageUrl": null,
        "status": "DEACTIVATED"
    }"#;
    let bank: BankInfo = serde_json::from_str(json).unwrap();

    assert_eq!(bank.status, BankStatus::Deactivated);
    assert_eq!(bank.status.as_str(), "DEACTIVATED");
    assert!(bank.qr_code_image_url.is_none());
}
