use std::sync::Arc;

use foodstore::FoodstoreError;
use foodstore::auth::Session;
use foodstore::config::fetch_config;
use foodstore::credentials::TokenStore;
use foodstore::report::{StatusCounts, format_price};
use foodstore::rest::{ApiClient, build_http_client};
use foodstore::stream::OrderStream;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), FoodstoreError> {
    // Initialize tracing subscriber for logging output.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let app_config = fetch_config()?;
    let api = &app_config.api;

    let store = match &api.auth_file {
        Some(path) => TokenStore::open(path),
        None => TokenStore::in_memory(),
    };

    let http = build_http_client()?;
    let session = Session::new(http.clone(), api.base_url.clone(), store)
        .with_invalidation_hook(|| warn!("Session expired, log in again to resume"));

    if let (Some(phone), Some(password)) = (&api.phone_number, &api.password) {
        let user = session.login(phone, password).await?;
        info!(name = %user.name, admin = user.is_admin(), "Signed in");
    } else if session.store().auth_data().is_none() {
        warn!("No credentials configured, the order stream may be rejected");
    }

    let session = Arc::new(session);
    let client = Arc::new(ApiClient::new(http, api.base_url.clone(), Arc::clone(&session)));

    let stream = OrderStream::new(client, Arc::clone(&session))
        .with_reconnect_delay(api.reconnect_delay);

    let subscription = stream.subscribe(
        |orders| {
            let counts = StatusCounts::from_orders(&orders);
            let open_total: rust_decimal::Decimal = orders
                .iter()
                .filter(|o| o.status.next().is_some())
                .map(|o| o.total())
                .sum();
            info!(
                total = counts.total,
                pending = counts.pending,
                served = counts.served,
                paid = counts.paid,
                open_total = %format_price(open_total),
                "Orders updated"
            );
        },
        |message| error!("Order stream error: {message}"),
        Some(Box::new(|| info!("Order stream connected"))),
    );

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    subscription.unsubscribe();

    Ok(())
}
