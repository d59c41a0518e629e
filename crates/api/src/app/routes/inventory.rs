use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};

use stockroom_infra::ItemFilter;
use stockroom_inventory::{CreateItem, StockMove, UpdateItem};

use crate::app::services::Services;
use crate::app::{dto, errors};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route("/items/deleted", get(list_deleted))
        .route("/items/:id", put(update_item).delete(delete_item))
        .route("/items/:id/restore", put(restore_item))
        .route("/items/:id/permanent", delete(purge_item))
        .route("/items/:id/move", post(move_stock))
        .route("/items/:id/moves", get(item_moves))
        .route("/moves", get(all_moves))
}

pub async fn list_items(
    Extension(services): Extension<Arc<Services>>,
) -> axum::response::Response {
    match services.inventory.list_items(ItemFilter::Active).await {
        Ok(records) => {
            Json(records.iter().map(dto::record_to_json).collect::<Vec<_>>()).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_deleted(
    Extension(services): Extension<Arc<Services>>,
) -> axum::response::Response {
    match services.inventory.list_items(ItemFilter::Deleted).await {
        Ok(records) => {
            Json(records.iter().map(dto::record_to_json).collect::<Vec<_>>()).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_item(
    Extension(services): Extension<Arc<Services>>,
    Extension(actor): Extension<ActorContext>,
    Json(body): Json<dto::CreateItemRequest>,
) -> axum::response::Response {
    let request = match CreateItem::validated(
        &body.name,
        &body.category,
        body.quantity,
        body.reorder_threshold,
    ) {
        Ok(r) => r,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.inventory.create_item(request, actor.user_id()).await {
        Ok((item, merged)) => {
            let status = if merged { StatusCode::OK } else { StatusCode::CREATED };
            let mut body = dto::item_to_json(&item);
            body["merged"] = serde_json::Value::Bool(merged);
            (status, Json(body)).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_item(
    Extension(services): Extension<Arc<Services>>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateItemRequest>,
) -> axum::response::Response {
    let id = match errors::parse_item_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let update = match UpdateItem::validated(
        &body.name,
        &body.category,
        body.quantity,
        body.reorder_threshold,
    ) {
        Ok(u) => u,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.inventory.update_item(id, update, actor.user_id()).await {
        Ok(item) => Json(dto::item_to_json(&item)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_item(
    Extension(services): Extension<Arc<Services>>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_item_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.inventory.soft_delete_item(id, actor.user_id()).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn restore_item(
    Extension(services): Extension<Arc<Services>>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_item_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.inventory.restore_item(id, actor.user_id()).await {
        Ok(item) => Json(dto::item_to_json(&item)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn purge_item(
    Extension(services): Extension<Arc<Services>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_item_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.inventory.purge_item(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn move_stock(
    Extension(services): Extension<Arc<Services>>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::MoveStockRequest>,
) -> axum::response::Response {
    let id = match errors::parse_item_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let mv = match StockMove::validated(&body.direction, body.amount, body.reason.as_deref()) {
        Ok(m) => m,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.inventory.move_stock(id, mv, actor.user_id()).await {
        Ok(item) => Json(dto::item_to_json(&item)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn item_moves(
    Extension(services): Extension<Arc<Services>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_item_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.inventory.audit_for_item(id).await {
        Ok((item, entries)) => Json(serde_json::json!({
            "item_id": item.id.to_string(),
            "name": item.name,
            "category": item.category,
            "quantity": item.quantity,
            "entries": entries.iter().map(dto::audit_to_json).collect::<Vec<_>>(),
        }))
        .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Flat cross-item feed of every audit entry, newest first.
pub async fn all_moves(
    Extension(services): Extension<Arc<Services>>,
) -> axum::response::Response {
    let histories = match services.inventory.audit_all().await {
        Ok(h) => h,
        Err(e) => return errors::store_error_to_response(e),
    };

    let mut feed: Vec<(chrono::DateTime<chrono::Utc>, serde_json::Value)> = histories
        .iter()
        .flat_map(|h| {
            h.entries
                .iter()
                .map(move |e| (e.timestamp, dto::feed_entry_to_json(h, e)))
        })
        .collect();
    feed.sort_by(|a, b| b.0.cmp(&a.0));

    Json(feed.into_iter().map(|(_, v)| v).collect::<Vec<_>>()).into_response()
}
