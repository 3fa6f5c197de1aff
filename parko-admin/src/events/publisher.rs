use uuid::Uuid;

use parko_shared::clients::rabbitmq::RabbitMQClient;
use parko_shared::types::event::{payloads, routing_keys, Event};

pub async fn publish_settings_updated(rabbitmq: &RabbitMQClient, updated_by: Uuid) {
    let event = Event::new(
        "parko-admin",
        routing_keys::SETTINGS_UPDATED,
        payloads::SettingsUpdated { updated_by },
    )
    .with_user(updated_by);

    if let Err(e) = rabbitmq.publish(routing_keys::SETTINGS_UPDATED, &event).await {
        tracing::error!(error = %e, "failed to publish settings.updated event");
    }
}

pub async fn publish_role_granted(
    rabbitmq: &RabbitMQClient,
    user_id: Uuid,
    role: &str,
    granted_by: Uuid,
) {
    let event = Event::new(
        "parko-admin",
        routing_keys::ROLE_GRANTED,
        payloads::RoleGranted {
            user_id,
            role: role.to_string(),
            granted_by,
        },
    )
    .with_user(user_id);

    if let Err(e) = rabbitmq.publish(routing_keys::ROLE_GRANTED, &event).await {
        tracing::error!(error = %e, "failed to publish role.granted event");
    }
}
