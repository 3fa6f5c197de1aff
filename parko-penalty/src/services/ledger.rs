//! Rolling-window points arithmetic.
//!
//! A penalty contributes to a driver's standing for six calendar months
//! from its start date. The accrual computation re-derives the window
//! on every read instead of trusting `is_active` alone: the expiry
//! sweep that clears the flag may lag, and the window check is cheap.

use chrono::{DateTime, Months, Utc};

use crate::models::Penalty;

/// Display ceiling for the progress indicator; the accrued total itself
/// is never capped.
pub const MAX_POINTS: i32 = 15;

pub const WINDOW_MONTHS: u32 = 6;

/// Lower edge of the rolling window, inclusive.
pub fn window_start(as_of: DateTime<Utc>) -> DateTime<Utc> {
    as_of
        .checked_sub_months(Months::new(WINDOW_MONTHS))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// A penalty stops counting six calendar months after it started.
pub fn end_date_for(start_date: DateTime<Utc>) -> DateTime<Utc> {
    start_date
        .checked_add_months(Months::new(WINDOW_MONTHS))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Sum of points over penalties that are active and started inside the
/// window `[as_of - 6 months, as_of]`. Pure; deterministic for fixed
/// inputs.
pub fn accrued_points(as_of: DateTime<Utc>, penalties: &[Penalty]) -> i32 {
    let cutoff = window_start(as_of);
    penalties
        .iter()
        .filter(|p| p.is_active)
        .filter(|p| p.start_date >= cutoff && p.start_date <= as_of)
        .map(|p| p.points)
        .sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct PointsSummary {
    /// Unclamped accrued total; can exceed `max_points`.
    pub total: i32,
    /// Number of indicator cells to light, never more than `max_points`.
    pub lit_cells: i32,
    /// True when the driver is at or past the threshold.
    pub warning: bool,
    pub max_points: i32,
}

pub fn summarize(as_of: DateTime<Utc>, penalties: &[Penalty]) -> PointsSummary {
    let total = accrued_points(as_of, penalties);
    PointsSummary {
        total,
        lit_cells: total.min(MAX_POINTS),
        warning: total >= MAX_POINTS,
        max_points: MAX_POINTS,
    }
}

/// Store-side points bound; the request DTO carries the same range so
/// the bound holds even if a caller bypasses DTO validation.
pub fn validate_points(points: i32) -> Result<(), String> {
    if (0..=MAX_POINTS).contains(&points) {
        Ok(())
    } else {
        Err(format!("points must be between 0 and {MAX_POINTS}, got {points}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn penalty(start: DateTime<Utc>, points: i32, is_active: bool) -> Penalty {
        Penalty {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            car_id: None,
            plate_number: None,
            penalty_type: "speeding".to_string(),
            points,
            fine_amount: None,
            start_date: start,
            end_date: end_date_for(start),
            due_date: None,
            payment_status: "unpaid".to_string(),
            payment_date: None,
            is_active,
            description: None,
            location: None,
            created_at: start,
        }
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn sums_active_penalties_inside_window() {
        let as_of = at(2024, 3, 1);
        let rows = vec![
            penalty(at(2024, 1, 10), 5, true),
            penalty(at(2024, 2, 20), 3, true),
        ];
        assert_eq!(accrued_points(as_of, &rows), 8);
    }

    #[test]
    fn penalty_drops_out_after_six_months() {
        let rows = vec![penalty(at(2024, 1, 10), 5, true)];

        assert_eq!(accrued_points(at(2024, 3, 1), &rows), 5);
        assert_eq!(accrued_points(at(2024, 8, 1), &rows), 0);
    }

    #[test]
    fn window_lower_edge_is_inclusive() {
        let as_of = at(2024, 7, 10);
        // Starts exactly six months before as_of (same clock time).
        let rows = vec![penalty(at(2024, 1, 10), 4, true)];
        assert_eq!(accrued_points(as_of, &rows), 4);
    }

    #[test]
    fn future_penalties_do_not_count() {
        let as_of = at(2024, 3, 1);
        let rows = vec![penalty(at(2024, 4, 1), 7, true)];
        assert_eq!(accrued_points(as_of, &rows), 0);
    }

    #[test]
    fn inactive_rows_are_ignored_even_inside_window() {
        let as_of = at(2024, 3, 1);
        let rows = vec![
            penalty(at(2024, 2, 1), 6, false),
            penalty(at(2024, 2, 15), 2, true),
        ];
        assert_eq!(accrued_points(as_of, &rows), 2);
    }

    #[test]
    fn stale_active_flag_is_not_trusted() {
        // The sweep has not run yet: an old penalty still has
        // is_active = true, but the window filter excludes it anyway.
        let as_of = at(2024, 8, 1);
        let rows = vec![penalty(at(2024, 1, 10), 9, true)];
        assert_eq!(accrued_points(as_of, &rows), 0);
    }

    #[test]
    fn adding_a_stale_penalty_never_changes_the_result() {
        let as_of = at(2024, 6, 1);
        let mut rows = vec![penalty(at(2024, 5, 1), 3, true)];
        let before = accrued_points(as_of, &rows);

        rows.push(penalty(at(2023, 10, 1), 10, true));
        assert_eq!(accrued_points(as_of, &rows), before);
    }

    #[test]
    fn summary_clamps_cells_but_not_total() {
        let as_of = at(2024, 4, 1);
        let rows = vec![
            penalty(at(2024, 1, 5), 10, true),
            penalty(at(2024, 2, 5), 8, true),
        ];

        let summary = summarize(as_of, &rows);
        assert_eq!(summary.total, 18);
        assert_eq!(summary.lit_cells, 15);
        assert!(summary.warning);
    }

    #[test]
    fn summary_at_threshold_warns() {
        let as_of = at(2024, 4, 1);
        let rows = vec![penalty(at(2024, 3, 1), 15, true)];

        let summary = summarize(as_of, &rows);
        assert_eq!(summary.total, 15);
        assert_eq!(summary.lit_cells, 15);
        assert!(summary.warning);
    }

    #[test]
    fn summary_below_threshold() {
        let as_of = at(2024, 4, 1);
        let rows = vec![penalty(at(2024, 3, 1), 4, true)];

        let summary = summarize(as_of, &rows);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.lit_cells, 4);
        assert!(!summary.warning);
    }

    #[test]
    fn end_date_is_six_calendar_months_out() {
        let start = at(2024, 1, 10);
        assert_eq!(end_date_for(start), at(2024, 7, 10));

        // Month-length clamping: Aug 31 + 6 months lands on Feb 28.
        let start = at(2024, 8, 31);
        assert_eq!(end_date_for(start), at(2025, 2, 28));
    }

    #[test]
    fn points_bounds() {
        assert!(validate_points(0).is_ok());
        assert!(validate_points(15).is_ok());
        assert!(validate_points(-1).is_err());
        assert!(validate_points(16).is_err());
    }
}
