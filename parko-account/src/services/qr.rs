//! QR payload assembly for car stickers.
//!
//! The client renders the QR image; the service only assembles the
//! payload string. Version field first so old stickers stay parseable.

use crate::models::Car;

pub const QR_PAYLOAD_VERSION: u8 = 1;

pub fn car_qr_payload(car: &Car) -> String {
    serde_json::json!({
        "v": QR_PAYLOAD_VERSION,
        "kind": "parko.car",
        "car_id": car.id,
        "plate": car.plate_number,
        "make": car.make,
        "model": car.model,
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn car() -> Car {
        Car {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            plate_number: "CA1234BC".to_string(),
            make: "Dacia".to_string(),
            model: "Duster".to_string(),
            color: Some("grey".to_string()),
            year: Some(2019),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn payload_carries_version_and_plate() {
        let c = car();
        let payload = car_qr_payload(&c);
        let parsed: serde_json::Value = serde_json::from_str(&payload).unwrap();

        assert_eq!(parsed["v"], 1);
        assert_eq!(parsed["kind"], "parko.car");
        assert_eq!(parsed["plate"], "CA1234BC");
        assert_eq!(parsed["car_id"], serde_json::json!(c.id));
    }
}
