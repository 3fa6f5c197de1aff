use std::sync::Arc;

use futures_lite::StreamExt;
use lapin::options::BasicAckOptions;

use parko_shared::types::event::{payloads, routing_keys, Event};

use crate::AppState;

/// Listen for report events and push them to the affected users'
/// rooms so open sessions see new reports without polling.
pub async fn listen_report_events(state: Arc<AppState>) -> anyhow::Result<()> {
    let mut consumer = state.rabbitmq.subscribe(
        "parko-social.report",
        &[routing_keys::REPORT_CREATED, routing_keys::REPORT_RESOLVED],
    ).await?;

    tracing::info!("listening for report events");

    while let Some(delivery) = consumer.next().await {
        match delivery {
            Ok(delivery) => {
                let routing_key = delivery.routing_key.to_string();

                if routing_key == routing_keys::REPORT_CREATED {
                    match serde_json::from_slice::<Event<payloads::ReportCreated>>(&delivery.data) {
                        Ok(event) => {
                            let data = &event.data;
                            if let Some(target) = data.reported_user_id {
                                let room = format!("user:{target}");
                                let _ = state.io.to(room).emit(
                                    "report_filed",
                                    &serde_json::json!({
                                        "report_id": data.report_id,
                                        "report_type": data.report_type,
                                        "plate_number": data.plate_number,
                                    }),
                                );
                            }
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "failed to deserialize report.created event");
                        }
                    }
                } else if routing_key == routing_keys::REPORT_RESOLVED {
                    match serde_json::from_slice::<Event<payloads::ReportResolved>>(&delivery.data) {
                        Ok(event) => {
                            let data = &event.data;
                            let room = format!("user:{}", data.reporter_id);
                            let _ = state.io.to(room).emit(
                                "report_resolved",
                                &serde_json::json!({
                                    "report_id": data.report_id,
                                    "rating": data.rating,
                                }),
                            );
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "failed to deserialize report.resolved event");
                        }
                    }
                }

                let _ = delivery.ack(BasicAckOptions::default()).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "report consumer error");
            }
        }
    }

    Ok(())
}

/// Listen for penalty events (created, expired) and notify the owner.
pub async fn listen_penalty_events(state: Arc<AppState>) -> anyhow::Result<()> {
    let mut consumer = state.rabbitmq.subscribe(
        "parko-social.penalty",
        &[routing_keys::PENALTY_CREATED, routing_keys::PENALTY_EXPIRED],
    ).await?;

    tracing::info!("listening for penalty events");

    while let Some(delivery) = consumer.next().await {
        match delivery {
            Ok(delivery) => {
                let routing_key = delivery.routing_key.to_string();

                if routing_key == routing_keys::PENALTY_CREATED {
                    match serde_json::from_slice::<Event<payloads::PenaltyCreated>>(&delivery.data) {
                        Ok(event) => {
                            let data = &event.data;
                            let room = format!("user:{}", data.user_id);
                            let _ = state.io.to(room).emit(
                                "penalty_update",
                                &serde_json::json!({
                                    "penalty_id": data.penalty_id,
                                    "penalty_type": data.penalty_type,
                                    "points": data.points,
                                    "kind": "created",
                                }),
                            );
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "failed to deserialize penalty.created event");
                        }
                    }
                } else if routing_key == routing_keys::PENALTY_EXPIRED {
                    match serde_json::from_slice::<Event<payloads::PenaltyExpired>>(&delivery.data) {
                        Ok(event) => {
                            let data = &event.data;
                            let room = format!("user:{}", data.user_id);
                            let _ = state.io.to(room).emit(
                                "penalty_update",
                                &serde_json::json!({
                                    "penalty_id": data.penalty_id,
                                    "kind": "expired",
                                }),
                            );
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "failed to deserialize penalty.expired event");
                        }
                    }
                }

                let _ = delivery.ack(BasicAckOptions::default()).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "penalty consumer error");
            }
        }
    }

    Ok(())
}
