//! Router assembly and helpers shared by both API versions.

pub mod v1;
pub mod v2;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Days, Local, NaiveDate, NaiveTime};
use std::collections::BTreeMap;
use tower_http::cors::CorsLayer;

use crate::error::ApiResult;
use crate::AppState;

/// Days covered by usage history and usage counts.
pub const HISTORY_DAYS: u64 = 7;

/// Builds the full router with permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", v1::routes())
        .nest("/api/v2", v2::routes())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> (StatusCode, &'static str) {
    if state.db.health_check().await {
        (StatusCode::OK, "OK")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE")
    }
}

// =============================================================================
// Usage History
// =============================================================================

/// One local calendar day as a half-open range of unix seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Day {
    /// `YYYY-MM-DD`
    pub date: String,
    pub start: i64,
    pub end: i64,
}

/// The last [`HISTORY_DAYS`] local dates ending with today, oldest first.
pub fn recent_days(now: i64) -> Vec<Day> {
    let today = DateTime::from_timestamp(now, 0)
        .map(|t| t.with_timezone(&Local))
        .unwrap_or_else(Local::now)
        .date_naive();

    (0..HISTORY_DAYS)
        .rev()
        .filter_map(|back| today.checked_sub_days(Days::new(back)))
        .filter_map(|date| {
            let next = date.succ_opt()?;
            Some(Day {
                date: date.format("%Y-%m-%d").to_string(),
                start: local_midnight(date),
                end: local_midnight(next),
            })
        })
        .collect()
}

fn local_midnight(date: NaiveDate) -> i64 {
    let naive = date.and_time(NaiveTime::MIN);
    naive
        .and_local_timezone(Local)
        .earliest()
        .map(|t| t.timestamp())
        // midnight skipped by a DST jump
        .unwrap_or_else(|| naive.and_utc().timestamp())
}

/// Sessions started per day for one machine over the recent days.
pub async fn usage_history(
    state: &AppState,
    machine_id: i64,
) -> ApiResult<BTreeMap<String, i64>> {
    let usages = state.db.usages();
    let mut history = BTreeMap::new();
    for day in recent_days(state.clock.now()) {
        let count = usages
            .count_by_machine_in_range(machine_id, day.start, day.end)
            .await?;
        history.insert(day.date, count);
    }
    Ok(history)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_days_are_contiguous() {
        let now = Local::now().timestamp();
        let days = recent_days(now);

        assert_eq!(days.len(), HISTORY_DAYS as usize);
        assert_eq!(
            days.last().unwrap().date,
            Local::now().date_naive().format("%Y-%m-%d").to_string()
        );
        for pair in days.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
            assert!(pair[0].date < pair[1].date);
        }
        let today = days.last().unwrap();
        assert!(today.start <= now && now < today.end);
    }
}
