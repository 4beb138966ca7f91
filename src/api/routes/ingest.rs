//! Ingest Routes
//!
//! Write endpoints for the embedded billing store. Every accepted write
//! makes the store push a fresh snapshot to the change feed, which the
//! engine turns into a new published `MetricsSnapshot`.
//!
//! - POST /api/v1/bills - Record a finalized bill
//! - POST /api/v1/products - Insert or update a catalog entry

use axum::{extract::State, http::StatusCode, Json};
use chrono::NaiveDate;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::dto::{BillRequest, IngestResponse, ProductRequest};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::store::types::{ProductRecord, SaleRecord, DATE_KEY_FORMAT};

/// POST /api/v1/bills
pub async fn add_bill(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BillRequest>,
) -> ApiResult<(StatusCode, Json<IngestResponse>)> {
    if NaiveDate::parse_from_str(&request.date_key, DATE_KEY_FORMAT).is_err() {
        return Err(ApiError::Validation(format!(
            "date_key {:?} is not a calendar date",
            request.date_key
        )));
    }

    let id = request.id.unwrap_or_else(|| Uuid::new_v4().to_string());
    let items: Vec<_> = request
        .items
        .into_iter()
        .map(|item| item.into_line_item())
        .collect();
    let total = request
        .total
        .unwrap_or_else(|| items.iter().map(|i| i.line_total).sum());

    let bill = SaleRecord {
        id: id.clone(),
        date_key: request.date_key,
        items,
        total,
    };

    tracing::info!(bill_id = %id, total = %bill.total, "Bill recorded");
    state.store.add_bill(bill).await;

    Ok((
        StatusCode::CREATED,
        Json(IngestResponse {
            status: "ok".to_string(),
            id,
        }),
    ))
}

/// POST /api/v1/products
pub async fn upsert_product(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ProductRequest>,
) -> ApiResult<(StatusCode, Json<IngestResponse>)> {
    let id = request.id.unwrap_or_else(|| Uuid::new_v4().to_string());

    let product = ProductRecord {
        id: id.clone(),
        name: request.name,
        category: request.category,
        price: request.price,
        quantity: request.quantity,
    };

    tracing::info!(product_id = %id, quantity = product.quantity, "Product upserted");
    state.store.upsert_product(product).await;

    Ok((
        StatusCode::CREATED,
        Json(IngestResponse {
            status: "ok".to_string(),
            id,
        }),
    ))
}
