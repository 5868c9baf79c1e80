//! Public catalog and customer handlers.

use super::types::{
    AddItemRequest, CatalogQuery, CategoryTree, HealthResponse, UpdateItemRequest,
};
use super::{ApiError, AppState};
use crate::unix_now;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use tienda_core::{
    CartView, CatalogFilter, CustomerKey, ListingEntry, OrderView, PaymentInstructions,
    ProductDetail, ProductId, SaleId, ShippingAddress, ShopError, VariantId,
};

fn customer_key(raw: &str) -> Result<CustomerKey, ApiError> {
    CustomerKey::new(raw).map_err(ApiError::from)
}

// =============================================================================
// SYSTEM
// =============================================================================

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let shop = state.shop.read().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        stats: shop.stats(),
    })
}

pub async fn not_found() -> ApiError {
    ApiError::NoRoute
}

// =============================================================================
// CATALOG
// =============================================================================

pub async fn catalog(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Json<Vec<ListingEntry>> {
    let filter = CatalogFilter {
        category: query.category,
        subcategory: query.subcategory,
        vendor: query.vendor,
        text: query.q,
        only_available: query.available,
        include_inactive: false,
    };
    let shop = state.shop.read().await;
    Json(shop.catalog_listing(&filter))
}

/// Product detail. Inactive products and products of inactive vendors are
/// hidden from the public catalog.
pub async fn product(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ProductDetail>, ApiError> {
    let shop = state.shop.read().await;
    let id = ProductId(id);
    if !shop.is_listed(shop.product(id)?) {
        return Err(ShopError::NotFound {
            kind: "product",
            id: id.to_string(),
        }
        .into());
    }
    let mut detail = shop.product_detail(id)?;
    detail.variants.retain(|v| v.variant.active);
    Ok(Json(detail))
}

pub async fn categories(State(state): State<AppState>) -> Json<Vec<CategoryTree>> {
    let shop = state.shop.read().await;
    let tree = shop
        .categories()
        .map(|category| CategoryTree {
            category: category.clone(),
            subcategories: shop.subcategories_of(category.id).cloned().collect(),
        })
        .collect();
    Json(tree)
}

// =============================================================================
// CART
// =============================================================================

pub async fn get_cart(
    State(state): State<AppState>,
    Path(customer): Path<String>,
) -> Result<Json<CartView>, ApiError> {
    let customer = customer_key(&customer)?;
    {
        let shop = state.shop.read().await;
        if let Some(cart) = shop.open_cart_of(&customer) {
            return Ok(Json(shop.price_cart(cart.id)?));
        }
    }
    let now = unix_now();
    let view = state
        .mutate(|shop| shop.cart_view(&customer, now))
        .await?;
    Ok(Json(view))
}

pub async fn clear_cart(
    State(state): State<AppState>,
    Path(customer): Path<String>,
) -> Result<Json<CartView>, ApiError> {
    let customer = customer_key(&customer)?;
    let now = unix_now();
    let view = state
        .mutate(|shop| {
            let id = shop.clear_cart(&customer, now)?;
            shop.price_cart(id)
        })
        .await?;
    Ok(Json(view))
}

pub async fn add_item(
    State(state): State<AppState>,
    Path(customer): Path<String>,
    Json(body): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<CartView>), ApiError> {
    let customer = customer_key(&customer)?;
    let now = unix_now();
    let view = state
        .mutate(|shop| {
            let id = shop.add_to_cart(&customer, body.variant_id, body.quantity, now)?;
            shop.price_cart(id)
        })
        .await?;
    tracing::debug!(customer = %customer, variant = %body.variant_id, "item added to cart");
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn update_item(
    State(state): State<AppState>,
    Path((customer, variant_id)): Path<(String, u64)>,
    Json(body): Json<UpdateItemRequest>,
) -> Result<Json<CartView>, ApiError> {
    let customer = customer_key(&customer)?;
    let now = unix_now();
    let view = state
        .mutate(|shop| {
            let id = shop.update_cart_line(&customer, VariantId(variant_id), body.quantity, now)?;
            shop.price_cart(id)
        })
        .await?;
    Ok(Json(view))
}

pub async fn remove_item(
    State(state): State<AppState>,
    Path((customer, variant_id)): Path<(String, u64)>,
) -> Result<Json<CartView>, ApiError> {
    let customer = customer_key(&customer)?;
    let now = unix_now();
    let view = state
        .mutate(|shop| {
            let id = shop.remove_from_cart(&customer, VariantId(variant_id), now)?;
            shop.price_cart(id)
        })
        .await?;
    Ok(Json(view))
}

// =============================================================================
// CHECKOUT & ORDERS
// =============================================================================

pub async fn checkout(
    State(state): State<AppState>,
    Path(customer): Path<String>,
    Json(address): Json<ShippingAddress>,
) -> Result<(StatusCode, Json<OrderView>), ApiError> {
    let customer = customer_key(&customer)?;
    let now = unix_now();
    let view = state
        .mutate(|shop| {
            let order = shop.checkout(&customer, &address, now)?;
            shop.order_view(order)
        })
        .await?;
    tracing::info!(
        customer = %customer,
        order = %view.order.id,
        sales = view.sales.len(),
        total = %view.order.total,
        "checkout completed"
    );
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn orders(
    State(state): State<AppState>,
    Path(customer): Path<String>,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    let customer = customer_key(&customer)?;
    let shop = state.shop.read().await;
    Ok(Json(shop.orders_for(&customer)?))
}

pub async fn payment(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<PaymentInstructions>, ApiError> {
    let shop = state.shop.read().await;
    Ok(Json(shop.payment_instructions(SaleId(id))?))
}
