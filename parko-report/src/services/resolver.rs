//! Plate-to-user resolution against parko-account.

use serde::Deserialize;
use uuid::Uuid;

/// Stored in `plate_number` when a report targets a known user and no
/// plate was typed. The sentinel string is persisted, not null, so the
/// column stays non-nullable and exports stay uniform.
pub const PLATE_SENTINEL: &str = "N/A";

/// Queries shorter than this never leave the process.
pub const MIN_RESOLVE_LEN: usize = 3;

#[derive(Debug, Deserialize)]
struct ResolvePlateResponse {
    user_id: Option<Uuid>,
}

/// Trimmed plate, or `None` when it is too short to be worth a lookup.
pub fn resolvable_plate(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.len() < MIN_RESOLVE_LEN {
        None
    } else {
        Some(trimmed)
    }
}

/// The plate string persisted with a report: the typed plate as
/// submitted, or the `"N/A"` sentinel when the target is a known user
/// and no plate was given. `None` means the submission has no target at
/// all and must be rejected.
pub fn stored_plate(target_user: Option<Uuid>, plate: Option<&str>) -> Option<String> {
    match plate.map(str::trim).filter(|p| !p.is_empty()) {
        Some(p) => Some(p.to_string()),
        None => target_user.map(|_| PLATE_SENTINEL.to_string()),
    }
}

/// Ask parko-account who owns a plate. Short queries are skipped
/// entirely; lookup failures resolve to "unknown" rather than failing
/// the submission.
pub async fn resolve_plate_to_user(
    http: &reqwest::Client,
    account_service_url: &str,
    plate: &str,
) -> Option<Uuid> {
    let query = resolvable_plate(plate)?;

    let url = format!("{account_service_url}/internal/resolve-plate");
    match http.get(&url).query(&[("plate", query)]).send().await {
        Ok(res) if res.status().is_success() => match res.json::<ResolvePlateResponse>().await {
            Ok(body) => body.user_id,
            Err(e) => {
                tracing::warn!(error = %e, "failed to parse resolve-plate response");
                None
            }
        },
        Ok(res) => {
            tracing::warn!(status = %res.status(), "resolve-plate lookup failed");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "resolve-plate request failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_plates_skip_the_lookup() {
        assert_eq!(resolvable_plate(""), None);
        assert_eq!(resolvable_plate("  "), None);
        assert_eq!(resolvable_plate("ab"), None);
        assert_eq!(resolvable_plate(" ab "), None);
        assert_eq!(resolvable_plate("ab1"), Some("ab1"));
    }

    #[test]
    fn typed_plate_is_stored_as_submitted() {
        assert_eq!(
            stored_plate(None, Some("CA 1234 BC")),
            Some("CA 1234 BC".to_string())
        );
        // A known target does not override a typed plate.
        assert_eq!(
            stored_plate(Some(Uuid::new_v4()), Some("B 777 X")),
            Some("B 777 X".to_string())
        );
    }

    #[test]
    fn known_target_without_plate_gets_the_sentinel() {
        assert_eq!(
            stored_plate(Some(Uuid::new_v4()), None),
            Some(PLATE_SENTINEL.to_string())
        );
        assert_eq!(
            stored_plate(Some(Uuid::new_v4()), Some("   ")),
            Some(PLATE_SENTINEL.to_string())
        );
    }

    #[test]
    fn no_target_and_no_plate_is_unsubmittable() {
        assert_eq!(stored_plate(None, None), None);
        assert_eq!(stored_plate(None, Some("")), None);
    }
}
