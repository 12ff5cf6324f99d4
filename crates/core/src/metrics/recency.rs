//! Human-readable timestamps.

use chrono::{DateTime, Utc};

use crate::records::MISSING_DATE;

/// US short date, e.g. `3/4/2026`.
#[must_use]
pub fn short_date(ts: DateTime<Utc>) -> String {
    ts.format("%-m/%-d/%Y").to_string()
}

/// US date and time, e.g. `3/4/2026, 10:05:00 AM`, or "N/A".
#[must_use]
pub fn date_time_label(ts: Option<DateTime<Utc>>) -> String {
    ts.map_or_else(
        || MISSING_DATE.to_owned(),
        |ts| ts.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string(),
    )
}

/// Relative age: `Nm ago`, `Nh ago`, `Nd ago`, then the short date.
///
/// Timestamps in the future count as zero minutes old.
#[must_use]
pub fn time_ago(ts: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(ts) = ts else {
        return MISSING_DATE.to_owned();
    };
    let minutes = (now - ts).num_minutes().max(0);
    if minutes < 60 {
        format!("{minutes}m ago")
    } else if minutes < 60 * 24 {
        format!("{}h ago", minutes / 60)
    } else if minutes < 60 * 24 * 7 {
        format!("{}d ago", minutes / (60 * 24))
    } else {
        short_date(ts)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 20, 15, 30, 0).unwrap()
    }

    #[test]
    fn test_time_ago_steps() {
        let now = now();
        assert_eq!(time_ago(Some(now - Duration::minutes(5)), now), "5m ago");
        assert_eq!(time_ago(Some(now - Duration::hours(3)), now), "3h ago");
        assert_eq!(time_ago(Some(now - Duration::days(2)), now), "2d ago");
        assert_eq!(time_ago(Some(now - Duration::days(10)), now), "3/10/2026");
    }

    #[test]
    fn test_time_ago_boundaries_are_strict() {
        let now = now();
        assert_eq!(time_ago(Some(now - Duration::minutes(60)), now), "1h ago");
        assert_eq!(time_ago(Some(now - Duration::hours(24)), now), "1d ago");
        assert_eq!(time_ago(Some(now - Duration::days(7)), now), "3/13/2026");
    }

    #[test]
    fn test_time_ago_future_and_missing() {
        let now = now();
        assert_eq!(time_ago(Some(now + Duration::hours(2)), now), "0m ago");
        assert_eq!(time_ago(None, now), "N/A");
    }

    #[test]
    fn test_date_time_label() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 4, 14, 5, 9).unwrap();
        assert_eq!(date_time_label(Some(ts)), "3/4/2026, 2:05:09 PM");
        assert_eq!(date_time_label(None), "N/A");
    }
}
