use uuid::Uuid;

use parko_shared::clients::rabbitmq::RabbitMQClient;
use parko_shared::types::event::{payloads, routing_keys, Event};

pub async fn publish_report_created(
    rabbitmq: &RabbitMQClient,
    report_id: Uuid,
    reporter_id: Uuid,
    reported_user_id: Option<Uuid>,
    plate_number: &str,
    report_type: &str,
) {
    let event = Event::new(
        "parko-report",
        routing_keys::REPORT_CREATED,
        payloads::ReportCreated {
            report_id,
            reporter_id,
            reported_user_id,
            plate_number: plate_number.to_string(),
            report_type: report_type.to_string(),
        },
    )
    .with_user(reporter_id);

    if let Err(e) = rabbitmq.publish(routing_keys::REPORT_CREATED, &event).await {
        tracing::error!(error = %e, "failed to publish report.created event");
    }
}

pub async fn publish_report_resolved(
    rabbitmq: &RabbitMQClient,
    report_id: Uuid,
    reporter_id: Uuid,
    resolved_by: Uuid,
    rating: i32,
) {
    let event = Event::new(
        "parko-report",
        routing_keys::REPORT_RESOLVED,
        payloads::ReportResolved {
            report_id,
            reporter_id,
            resolved_by,
            rating,
        },
    )
    .with_user(resolved_by);

    if let Err(e) = rabbitmq.publish(routing_keys::REPORT_RESOLVED, &event).await {
        tracing::error!(error = %e, "failed to publish report.resolved event");
    }
}
