//! `/api/v1`: the legacy response shapes, kept for older clients.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::usage_history;
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use washwise_core::validation::parse_machine_id;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/getLaundryMachines", get(get_laundry_machines))
        .route("/getMachineDetail", get(get_machine_detail))
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineInfo {
    pub name: String,
    pub device_code: i32,
    pub device_msg: String,
    /// Seconds, despite older clients labelling it minutes.
    pub remain_time: i64,
    /// Always 0; error counting was never tracked.
    pub error_count: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LaundryMachinesResponse {
    #[serde(rename = "洗衣机")]
    pub machines: BTreeMap<String, MachineInfo>,
}

#[derive(Debug, Deserialize)]
pub struct LaundryQuery {
    #[serde(rename = "LaundryID")]
    pub laundry_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MachineQuery {
    #[serde(rename = "MachineID")]
    pub machine_id: Option<String>,
}

async fn get_laundry_machines(
    State(state): State<AppState>,
    Query(query): Query<LaundryQuery>,
) -> ApiResult<Json<LaundryMachinesResponse>> {
    let shop_id = query
        .laundry_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("LaundryID is required".into()))?;

    let now = state.clock.now();
    let machines = state
        .db
        .machines()
        .list_by_shop(shop_id)
        .await?
        .into_iter()
        .map(|m| {
            let info = MachineInfo {
                remain_time: m.remaining_time(now),
                name: m.name,
                device_code: m.code,
                device_msg: m.msg,
                error_count: 0,
            };
            (m.id.to_string(), info)
        })
        .collect();

    Ok(Json(LaundryMachinesResponse { machines }))
}

async fn get_machine_detail(
    State(state): State<AppState>,
    Query(query): Query<MachineQuery>,
) -> ApiResult<Json<BTreeMap<String, i64>>> {
    let machine_id = parse_machine_id(query.machine_id.as_deref().unwrap_or_default())
        .map_err(|_| ApiError::BadRequest("MachineID is required".into()))?;

    Ok(Json(usage_history(&state, machine_id).await?))
}
