//! Background expiry sweep.
//!
//! Flips `is_active` off once a penalty's six-month window has passed.
//! The accrual read path re-derives the window itself, so a late sweep
//! never inflates anyone's points.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::events::publisher;
use crate::schema::penalties;
use crate::AppState;

pub async fn run_expiry_sweep(state: Arc<AppState>) {
    let mut interval = tokio::time::interval(Duration::from_secs(state.config.sweep_interval_secs));

    loop {
        interval.tick().await;
        match expire_due(&state).await {
            Ok(0) => {}
            Ok(n) => tracing::info!(expired = n, "penalty expiry sweep completed"),
            Err(e) => tracing::error!(error = %e, "penalty expiry sweep failed"),
        }
    }
}

async fn expire_due(state: &Arc<AppState>) -> anyhow::Result<usize> {
    let mut conn = state.db.get()?;
    let now = Utc::now();

    let expired: Vec<(Uuid, Uuid)> = diesel::update(
        penalties::table
            .filter(penalties::is_active.eq(true))
            .filter(penalties::end_date.lt(now)),
    )
    .set(penalties::is_active.eq(false))
    .returning((penalties::id, penalties::user_id))
    .get_results(&mut conn)?;

    for (penalty_id, user_id) in &expired {
        publisher::publish_penalty_expired(&state.rabbitmq, *penalty_id, *user_id).await;
    }

    Ok(expired.len())
}
