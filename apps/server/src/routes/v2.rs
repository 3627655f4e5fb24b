//! `/api/v2`: shops, machine lists with recent usage, machine detail.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{usage_history, HISTORY_DAYS};
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use washwise_core::validation::{parse_machine_id, validate_shop_id};

/// Display name for shops configured without one.
pub const UNKNOWN_SHOP_NAME: &str = "Unknown laundry";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/shops", get(list_shops))
        .route("/machines", get(list_machines))
        .route("/machine/{machine_id}", get(get_machine))
}

// =============================================================================
// Response Types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct Items<T> {
    pub items: Vec<T>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShopItem {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineItem {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub machine_type: String,
    pub msg: String,
    pub status: i32,
    pub usage_count: i64,
    pub remain_time: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineDetailResponse {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub machine_type: String,
    pub msg: String,
    pub status: i32,
    pub remain_time: i64,
    pub avg_use_time: i64,
    pub last_use_time: i64,
    /// `YYYY-MM-DD` → sessions started that day
    pub history: BTreeMap<String, i64>,
}

#[derive(Debug, Deserialize)]
pub struct MachinesQuery {
    #[serde(rename = "shopId")]
    pub shop_id: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

async fn list_shops(State(state): State<AppState>) -> Json<Items<ShopItem>> {
    let items = state
        .config
        .shops
        .iter()
        .map(|shop| ShopItem {
            id: shop.id.clone(),
            name: state
                .config
                .shop_name(&shop.id)
                .unwrap_or(UNKNOWN_SHOP_NAME)
                .to_string(),
        })
        .collect();
    Json(Items { items })
}

async fn list_machines(
    State(state): State<AppState>,
    Query(query): Query<MachinesQuery>,
) -> ApiResult<Json<Items<MachineItem>>> {
    let shop_id = validate_shop_id(query.shop_id.as_deref().unwrap_or_default())?;

    let now = state.clock.now();
    let from = now - (HISTORY_DAYS as i64) * 86_400;
    let machines = state
        .db
        .machines()
        .list_by_shop_with_usage_count(shop_id, from, now + 1)
        .await?;

    let items = machines
        .into_iter()
        .map(|m| MachineItem {
            remain_time: m.machine.remaining_time(now),
            id: m.machine.id,
            name: m.machine.name,
            machine_type: m.machine.machine_type,
            msg: m.machine.msg,
            status: m.machine.code,
            usage_count: m.usage_count,
        })
        .collect();

    Ok(Json(Items { items }))
}

async fn get_machine(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<MachineDetailResponse>> {
    let machine_id = parse_machine_id(&raw_id)?;

    let machine = state
        .db
        .machines()
        .get_by_id(machine_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("machine {machine_id} not found")))?;

    let history = usage_history(&state, machine_id).await?;
    let now = state.clock.now();

    Ok(Json(MachineDetailResponse {
        remain_time: machine.remaining_time(now),
        id: machine.id,
        name: machine.name,
        machine_type: machine.machine_type,
        msg: machine.msg,
        status: machine.code,
        avg_use_time: machine.avg_use_time,
        last_use_time: machine.last_use_time,
        history,
    }))
}
