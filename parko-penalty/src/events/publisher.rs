use uuid::Uuid;

use parko_shared::clients::rabbitmq::RabbitMQClient;
use parko_shared::types::event::{payloads, routing_keys, Event};

pub async fn publish_penalty_created(
    rabbitmq: &RabbitMQClient,
    penalty_id: Uuid,
    user_id: Uuid,
    penalty_type: &str,
    points: i32,
) {
    let event = Event::new(
        "parko-penalty",
        routing_keys::PENALTY_CREATED,
        payloads::PenaltyCreated {
            penalty_id,
            user_id,
            penalty_type: penalty_type.to_string(),
            points,
        },
    )
    .with_user(user_id);

    if let Err(e) = rabbitmq.publish(routing_keys::PENALTY_CREATED, &event).await {
        tracing::error!(error = %e, "failed to publish penalty.created event");
    }
}

pub async fn publish_penalty_paid(rabbitmq: &RabbitMQClient, penalty_id: Uuid, user_id: Uuid) {
    let event = Event::new(
        "parko-penalty",
        routing_keys::PENALTY_PAID,
        payloads::PenaltyPaid { penalty_id, user_id },
    )
    .with_user(user_id);

    if let Err(e) = rabbitmq.publish(routing_keys::PENALTY_PAID, &event).await {
        tracing::error!(error = %e, "failed to publish penalty.paid event");
    }
}

pub async fn publish_penalty_expired(rabbitmq: &RabbitMQClient, penalty_id: Uuid, user_id: Uuid) {
    let event = Event::new(
        "parko-penalty",
        routing_keys::PENALTY_EXPIRED,
        payloads::PenaltyExpired { penalty_id, user_id },
    )
    .with_user(user_id);

    if let Err(e) = rabbitmq.publish(routing_keys::PENALTY_EXPIRED, &event).await {
        tracing::error!(error = %e, "failed to publish penalty.expired event");
    }
}
