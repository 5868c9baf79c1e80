//! Admin handlers. Every route here sits behind the API key guard.

use super::types::{
    ActiveRequest, CategoryRequest, Created, LimitQuery, NameRequest, PayRequest, QuoteQuery,
    QuoteResponse, RangeQuery, RestockRequest, SalesQuery, ShipRequest, StockRequest,
    StockResponse, ThresholdQuery, TransitionResponse,
};
use super::{ApiError, AppState};
use crate::unix_now;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use tienda_core::{
    BankAccountId, BankAccountInput, CatalogFilter, CategoryId, DailyRevenue, ListingEntry,
    LowStockEntry, OrderId, OrderView, ProductId, ProductInput, ProductRanking, ProductUpdate,
    Sale, SaleAction, SaleId, SalesSummary, ShippingTariff, StatusCount, SubcategoryId,
    TariffId, TariffInput, VariantId, VariantInput, VariantUpdate, Vendor, VendorId,
    VendorInput, VendorUpdate,
};

/// A bank account as shown to admins: number masked.
#[derive(Debug, serde::Serialize)]
pub struct BankAccountView {
    pub id: BankAccountId,
    pub bank_name: String,
    pub holder_name: String,
    pub account: String,
    pub primary: bool,
}

fn created(id: u64) -> (StatusCode, Json<Created>) {
    (StatusCode::CREATED, Json(Created { id }))
}

fn range(query: &RangeQuery) -> (u64, u64) {
    (
        query.from,
        query.to.unwrap_or_else(|| unix_now().saturating_add(1)),
    )
}

// =============================================================================
// VENDORS
// =============================================================================

pub async fn list_vendors(State(state): State<AppState>) -> Json<Vec<Vendor>> {
    let shop = state.shop.read().await;
    Json(shop.vendors().cloned().collect())
}

pub async fn get_vendor(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Vendor>, ApiError> {
    let shop = state.shop.read().await;
    Ok(Json(shop.vendor(VendorId(id))?.clone()))
}

pub async fn create_vendor(
    State(state): State<AppState>,
    Json(input): Json<VendorInput>,
) -> Result<(StatusCode, Json<Created>), ApiError> {
    let now = unix_now();
    let id = state.mutate(|shop| shop.create_vendor(&input, now)).await?;
    tracing::info!(vendor = %id, name = %input.name, "vendor created");
    Ok(created(id.0))
}

pub async fn update_vendor(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(update): Json<VendorUpdate>,
) -> Result<StatusCode, ApiError> {
    state
        .mutate(|shop| shop.update_vendor(VendorId(id), &update))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_vendor_active(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(body): Json<ActiveRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .mutate(|shop| shop.set_vendor_active(VendorId(id), body.active))
        .await?;
    tracing::info!(vendor = id, active = body.active, "vendor activation changed");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn vendor_sales(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(query): Query<SalesQuery>,
) -> Result<Json<Vec<Sale>>, ApiError> {
    let shop = state.shop.read().await;
    let sales = shop.sales_for_vendor(VendorId(id), query.status)?;
    Ok(Json(sales.into_iter().cloned().collect()))
}

// =============================================================================
// BANK ACCOUNTS
// =============================================================================

pub async fn list_bank_accounts(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Vec<BankAccountView>>, ApiError> {
    let shop = state.shop.read().await;
    let vendor = shop.vendor(VendorId(id))?.id;
    let accounts = shop
        .bank_accounts_of(vendor)
        .map(|a| BankAccountView {
            id: a.id,
            bank_name: a.bank_name.clone(),
            holder_name: a.holder_name.clone(),
            account: a.masked_number(),
            primary: a.primary,
        })
        .collect();
    Ok(Json(accounts))
}

pub async fn add_bank_account(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(input): Json<BankAccountInput>,
) -> Result<(StatusCode, Json<Created>), ApiError> {
    let account = state
        .mutate(|shop| shop.add_bank_account(VendorId(id), &input))
        .await?;
    Ok(created(account.0))
}

pub async fn set_primary_account(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    state
        .mutate(|shop| shop.set_primary_account(BankAccountId(id)))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_bank_account(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    state
        .mutate(|shop| shop.remove_bank_account(BankAccountId(id)))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// TARIFFS
// =============================================================================

pub async fn list_tariffs(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Vec<ShippingTariff>>, ApiError> {
    let shop = state.shop.read().await;
    let vendor = shop.vendor(VendorId(id))?.id;
    Ok(Json(shop.tariffs_of(vendor).cloned().collect()))
}

pub async fn set_tariff(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(input): Json<TariffInput>,
) -> Result<Json<Created>, ApiError> {
    let tariff = state
        .mutate(|shop| shop.set_shipping_tariff(VendorId(id), &input))
        .await?;
    Ok(Json(Created { id: tariff.0 }))
}

pub async fn remove_tariff(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    state.mutate(|shop| shop.remove_tariff(TariffId(id))).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn shipping_quote(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(query): Query<QuoteQuery>,
) -> Result<Json<QuoteResponse>, ApiError> {
    let shop = state.shop.read().await;
    let vendor = VendorId(id);
    let shipping = shop.shipping_quote(vendor, &query.region, query.items, query.subtotal)?;
    Ok(Json(QuoteResponse {
        vendor_id: vendor,
        region: query.region.trim().to_uppercase(),
        shipping,
    }))
}

// =============================================================================
// CATEGORIES
// =============================================================================

pub async fn create_category(
    State(state): State<AppState>,
    Json(body): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<Created>), ApiError> {
    let id = state
        .mutate(|shop| shop.create_category(&body.name, &body.description))
        .await?;
    Ok(created(id.0))
}

pub async fn rename_category(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(body): Json<NameRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .mutate(|shop| shop.rename_category(CategoryId(id), &body.name))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    state
        .mutate(|shop| shop.delete_category(CategoryId(id)))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_subcategory(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(body): Json<NameRequest>,
) -> Result<(StatusCode, Json<Created>), ApiError> {
    let sub = state
        .mutate(|shop| shop.create_subcategory(CategoryId(id), &body.name))
        .await?;
    Ok(created(sub.0))
}

pub async fn delete_subcategory(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    state
        .mutate(|shop| shop.delete_subcategory(SubcategoryId(id)))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// PRODUCTS & VARIANTS
// =============================================================================

/// Every product, including inactive ones.
pub async fn list_products(State(state): State<AppState>) -> Json<Vec<ListingEntry>> {
    let filter = CatalogFilter {
        include_inactive: true,
        ..CatalogFilter::default()
    };
    let shop = state.shop.read().await;
    Json(shop.catalog_listing(&filter))
}

pub async fn create_product(
    State(state): State<AppState>,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<Created>), ApiError> {
    let now = unix_now();
    let id = state.mutate(|shop| shop.create_product(&input, now)).await?;
    tracing::info!(product = %id, vendor = %input.vendor_id, "product created");
    Ok(created(id.0))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(update): Json<ProductUpdate>,
) -> Result<StatusCode, ApiError> {
    state
        .mutate(|shop| shop.update_product(ProductId(id), &update))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_product_active(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(body): Json<ActiveRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .mutate(|shop| shop.set_product_active(ProductId(id), body.active))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_variant(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(input): Json<VariantInput>,
) -> Result<(StatusCode, Json<Created>), ApiError> {
    let variant = state
        .mutate(|shop| shop.add_variant(ProductId(id), &input))
        .await?;
    Ok(created(variant.0))
}

pub async fn update_variant(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(update): Json<VariantUpdate>,
) -> Result<StatusCode, ApiError> {
    state
        .mutate(|shop| shop.update_variant(VariantId(id), &update))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_variant_active(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(body): Json<ActiveRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .mutate(|shop| shop.set_variant_active(VariantId(id), body.active))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_stock(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(body): Json<StockRequest>,
) -> Result<Json<StockResponse>, ApiError> {
    let variant = VariantId(id);
    state
        .mutate(|shop| shop.set_stock(variant, body.stock))
        .await?;
    Ok(Json(StockResponse {
        variant_id: variant,
        stock: body.stock,
    }))
}

pub async fn restock(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(body): Json<RestockRequest>,
) -> Result<Json<StockResponse>, ApiError> {
    let variant = VariantId(id);
    let stock = state
        .mutate(|shop| shop.restock(variant, body.delta))
        .await?;
    tracing::info!(variant = id, delta = body.delta, stock, "variant restocked");
    Ok(Json(StockResponse {
        variant_id: variant,
        stock,
    }))
}

pub async fn delete_variant(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    state
        .mutate(|shop| shop.delete_variant(VariantId(id)))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// ORDERS & SALES
// =============================================================================

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<OrderView>, ApiError> {
    let shop = state.shop.read().await;
    Ok(Json(shop.order_view(OrderId(id))?))
}

pub async fn get_sale(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Sale>, ApiError> {
    let shop = state.shop.read().await;
    Ok(Json(shop.sale(SaleId(id))?.clone()))
}

async fn transition(
    state: &AppState,
    id: u64,
    action: SaleAction,
) -> Result<Json<TransitionResponse>, ApiError> {
    let now = unix_now();
    let status = state
        .mutate(|shop| shop.transition_sale(SaleId(id), &action, now))
        .await?;
    tracing::info!(sale = id, action = action.name(), status = status.as_str(), "sale updated");
    Ok(Json(TransitionResponse {
        sale_id: id,
        status,
    }))
}

pub async fn pay_sale(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(body): Json<PayRequest>,
) -> Result<Json<TransitionResponse>, ApiError> {
    let action = SaleAction::Pay {
        reference: body.reference,
    };
    transition(&state, id, action).await
}

pub async fn ship_sale(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(body): Json<ShipRequest>,
) -> Result<Json<TransitionResponse>, ApiError> {
    let action = SaleAction::Ship {
        tracking_code: body.tracking_code,
    };
    transition(&state, id, action).await
}

pub async fn deliver_sale(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<TransitionResponse>, ApiError> {
    transition(&state, id, SaleAction::Deliver).await
}

pub async fn cancel_sale(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<TransitionResponse>, ApiError> {
    transition(&state, id, SaleAction::Cancel).await
}

// =============================================================================
// REPORTS
// =============================================================================

pub async fn report_summary(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<SalesSummary>, ApiError> {
    let (from, to) = range(&query);
    let shop = state.shop.read().await;
    Ok(Json(shop.sales_summary(from, to)?))
}

pub async fn report_top_products(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<ProductRanking>>, ApiError> {
    let shop = state.shop.read().await;
    Ok(Json(shop.top_products(query.limit)?))
}

pub async fn report_low_stock(
    State(state): State<AppState>,
    Query(query): Query<ThresholdQuery>,
) -> Json<Vec<LowStockEntry>> {
    let shop = state.shop.read().await;
    Json(shop.low_stock(query.threshold))
}

pub async fn report_daily(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<DailyRevenue>>, ApiError> {
    let (from, to) = range(&query);
    let shop = state.shop.read().await;
    Ok(Json(shop.daily_revenue(from, to)?))
}

pub async fn report_status(State(state): State<AppState>) -> Json<Vec<StatusCount>> {
    let shop = state.shop.read().await;
    Json(shop.status_counts())
}
