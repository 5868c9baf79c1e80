//! # HTTP API
//!
//! axum server exposing the storefront over JSON.
//!
//! - Public catalog and customer cart/checkout routes under `/api/v1`
//! - Admin routes under `/api/v1/admin`, guarded by `X-Api-Key`
//! - A global rate limiter in front of everything
//!
//! The shop lives in memory behind a single `RwLock`. Every mutation runs
//! on a working copy that is persisted before it replaces the live state,
//! so a failed save leaves the live shop unchanged.

mod admin;
mod error;
mod handlers;
mod middleware;
mod types;

pub use error::ApiError;
pub use types::*;

use crate::config::{API_KEY_HEADER, ServerConfig};
use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header::CONTENT_TYPE};
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post, put};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use tienda_core::{Shop, ShopError, ShopStore};
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

// =============================================================================
// STATE
// =============================================================================

/// Shared state of the HTTP server.
#[derive(Clone)]
pub struct AppState {
    pub shop: Arc<RwLock<Shop>>,
    pub store: Arc<dyn ShopStore>,
    pub config: Arc<ServerConfig>,
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl AppState {
    pub fn new(shop: Shop, store: Arc<dyn ShopStore>, config: ServerConfig) -> Self {
        let limiter = NonZeroU32::new(config.rate_limit)
            .map(|rps| Arc::new(RateLimiter::direct(Quota::per_second(rps))));
        Self {
            shop: Arc::new(RwLock::new(shop)),
            store,
            config: Arc::new(config),
            limiter,
        }
    }

    /// Apply `op` under the write lock and persist the result.
    ///
    /// The live shop is only replaced once the store accepted the new state.
    pub async fn mutate<T>(
        &self,
        op: impl FnOnce(&mut Shop) -> Result<T, ShopError>,
    ) -> Result<T, ApiError> {
        let mut live = self.shop.write().await;
        let mut next = live.clone();
        let out = op(&mut next)?;

        if let Err(e) = self.store.save(&next) {
            tracing::error!(store = %self.store.describe(), error = %e, "persist failed; change rolled back");
            return Err(ApiError::Persist(e));
        }
        *live = next;
        Ok(out)
    }
}

// =============================================================================
// ROUTER
// =============================================================================

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origin = match config
        .cors_origin
        .as_deref()
        .map(HeaderValue::from_str)
    {
        Some(Ok(value)) => AllowOrigin::exact(value),
        Some(Err(_)) => {
            tracing::warn!("CORS origin is not a valid header value; allowing any origin");
            AllowOrigin::from(Any)
        }
        None => AllowOrigin::from(Any),
    };

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(API_KEY_HEADER)])
        .allow_origin(origin)
}

fn admin_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        // Vendors, bank accounts, tariffs
        .route("/vendors", get(admin::list_vendors).post(admin::create_vendor))
        .route("/vendors/{id}", get(admin::get_vendor).put(admin::update_vendor))
        .route("/vendors/{id}/active", put(admin::set_vendor_active))
        .route(
            "/vendors/{id}/bank-accounts",
            get(admin::list_bank_accounts).post(admin::add_bank_account),
        )
        .route("/bank-accounts/{id}", delete(admin::remove_bank_account))
        .route("/bank-accounts/{id}/primary", post(admin::set_primary_account))
        .route(
            "/vendors/{id}/tariffs",
            get(admin::list_tariffs).put(admin::set_tariff),
        )
        .route("/tariffs/{id}", delete(admin::remove_tariff))
        .route("/vendors/{id}/shipping-quote", get(admin::shipping_quote))
        .route("/vendors/{id}/sales", get(admin::vendor_sales))
        // Categories
        .route("/categories", post(admin::create_category))
        .route(
            "/categories/{id}",
            put(admin::rename_category).delete(admin::delete_category),
        )
        .route("/categories/{id}/subcategories", post(admin::create_subcategory))
        .route("/subcategories/{id}", delete(admin::delete_subcategory))
        // Products and variants
        .route("/products", get(admin::list_products).post(admin::create_product))
        .route("/products/{id}", put(admin::update_product))
        .route("/products/{id}/active", put(admin::set_product_active))
        .route("/products/{id}/variants", post(admin::add_variant))
        .route(
            "/variants/{id}",
            put(admin::update_variant).delete(admin::delete_variant),
        )
        .route("/variants/{id}/active", put(admin::set_variant_active))
        .route("/variants/{id}/stock", put(admin::set_stock))
        .route("/variants/{id}/restock", post(admin::restock))
        // Orders and sales
        .route("/orders/{id}", get(admin::get_order))
        .route("/sales/{id}", get(admin::get_sale))
        .route("/sales/{id}/pay", post(admin::pay_sale))
        .route("/sales/{id}/ship", post(admin::ship_sale))
        .route("/sales/{id}/deliver", post(admin::deliver_sale))
        .route("/sales/{id}/cancel", post(admin::cancel_sale))
        // Reports
        .route("/reports/summary", get(admin::report_summary))
        .route("/reports/top-products", get(admin::report_top_products))
        .route("/reports/low-stock", get(admin::report_low_stock))
        .route("/reports/daily", get(admin::report_daily))
        .route("/reports/status", get(admin::report_status))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::require_api_key,
        ))
}

/// Build the application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let customer = "/api/v1/customers/{customer}";

    Router::new()
        .route("/health", get(handlers::health))
        // Catalog
        .route("/api/v1/catalog", get(handlers::catalog))
        .route("/api/v1/products/{id}", get(handlers::product))
        .route("/api/v1/categories", get(handlers::categories))
        // Customer cart, checkout and orders
        .route(
            &format!("{customer}/cart"),
            get(handlers::get_cart).delete(handlers::clear_cart),
        )
        .route(&format!("{customer}/cart/items"), post(handlers::add_item))
        .route(
            &format!("{customer}/cart/items/{{variant_id}}"),
            put(handlers::update_item).delete(handlers::remove_item),
        )
        .route(&format!("{customer}/checkout"), post(handlers::checkout))
        .route(&format!("{customer}/orders"), get(handlers::orders))
        .route("/api/v1/sales/{id}/payment", get(handlers::payment))
        // Admin
        .nest("/api/v1/admin", admin_routes(&state))
        .fallback(handlers::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config))
                .layer(from_fn_with_state(state.clone(), middleware::rate_limit)),
        )
        .with_state(state)
}

/// Load the shop from `store` and serve it until Ctrl-C.
pub async fn start_server(
    store: Arc<dyn ShopStore>,
    config: ServerConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let shop = store.load()?;
    let stats = shop.stats();
    tracing::info!(
        store = %store.describe(),
        vendors = stats.vendors,
        products = stats.products,
        orders = stats.orders,
        "shop loaded"
    );
    if !config.admin_enabled() {
        tracing::warn!("no API key configured; admin routes will refuse every request");
    }
    if config.rate_limit == 0 {
        tracing::warn!("rate limiting disabled");
    }

    let addr = config.addr;
    let app = create_router(AppState::new(shop, store, config));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Tienda API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
