//! Time-bucketed series.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use super::recency::short_date;

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Number of months shown in the trend chart, including the current one.
pub const TREND_MONTHS: u32 = 6;

/// Records created on one UTC calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub day: NaiveDate,
    /// `M/D/YYYY`.
    pub label: String,
    pub count: usize,
}

/// One month of the trend chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyPoint {
    pub month: &'static str,
    pub applications: usize,
    pub contacts: usize,
}

/// Group creation times by UTC calendar day, oldest day first.
///
/// Records without a creation time are skipped.
pub fn daily_series(
    created: impl IntoIterator<Item = Option<DateTime<Utc>>>,
) -> Vec<DailyCount> {
    let mut days: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for ts in created.into_iter().flatten() {
        *days.entry(ts.date_naive()).or_default() += 1;
    }
    days.into_iter()
        .map(|(day, count)| DailyCount {
            day,
            label: short_date(day.and_time(NaiveTime::MIN).and_utc()),
            count,
        })
        .collect()
}

/// Counts for the current month and the five before it, oldest first.
///
/// Buckets are keyed by month of year only, so a record from the same month
/// of an earlier year is counted alongside this year's.
pub fn monthly_trend(
    applications: impl IntoIterator<Item = Option<DateTime<Utc>>>,
    contacts: impl IntoIterator<Item = Option<DateTime<Utc>>>,
    now: DateTime<Utc>,
) -> Vec<MonthlyPoint> {
    let apps = month_counts(applications);
    let msgs = month_counts(contacts);

    let current = now.month0();
    (0..TREND_MONTHS)
        .rev()
        .map(|back| {
            let idx = ((current + 12 - back) % 12) as usize;
            MonthlyPoint {
                month: MONTH_NAMES[idx],
                applications: apps[idx],
                contacts: msgs[idx],
            }
        })
        .collect()
}

fn month_counts(created: impl IntoIterator<Item = Option<DateTime<Utc>>>) -> [usize; 12] {
    let mut counts = [0usize; 12];
    for ts in created.into_iter().flatten() {
        counts[ts.month0() as usize] += 1;
    }
    counts
}

/// The `limit` newest records by creation time.
///
/// Records without a creation time sort last.
pub fn most_recent<T: Clone>(
    records: &[T],
    created_at: impl Fn(&T) -> Option<DateTime<Utc>>,
    limit: usize,
) -> Vec<T> {
    let mut sorted: Vec<&T> = records.iter().collect();
    sorted.sort_by_key(|r| std::cmp::Reverse(created_at(r)));
    sorted.into_iter().take(limit).cloned().collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap())
    }

    #[test]
    fn test_daily_series_groups_and_sorts() {
        let series = daily_series([
            at(2026, 3, 5, 23),
            at(2026, 3, 4, 1),
            at(2026, 3, 5, 0),
            None,
        ]);
        let pairs: Vec<_> = series.iter().map(|d| (d.label.as_str(), d.count)).collect();
        assert_eq!(pairs, [("3/4/2026", 1), ("3/5/2026", 2)]);
    }

    #[test]
    fn test_monthly_trend_window() {
        let now = Utc.with_ymd_and_hms(2026, 2, 15, 0, 0, 0).unwrap();
        let trend = monthly_trend(
            [at(2026, 2, 1, 0), at(2025, 12, 1, 0)],
            [at(2025, 9, 3, 0)],
            now,
        );
        let months: Vec<_> = trend.iter().map(|p| p.month).collect();
        assert_eq!(months, ["Sep", "Oct", "Nov", "Dec", "Jan", "Feb"]);
        assert_eq!(trend[0].contacts, 1);
        assert_eq!(trend[3].applications, 1);
        assert_eq!(trend[5].applications, 1);
    }

    #[test]
    fn test_monthly_trend_conflates_years() {
        let now = Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap();
        let trend = monthly_trend([at(2026, 5, 1, 0), at(2023, 5, 20, 0)], [], now);
        assert_eq!(trend.last().unwrap().month, "May");
        assert_eq!(trend.last().unwrap().applications, 2);
    }

    #[test]
    fn test_most_recent() {
        let records = vec![
            ("a", at(2026, 1, 1, 0)),
            ("b", None),
            ("c", at(2026, 3, 1, 0)),
            ("d", at(2026, 2, 1, 0)),
        ];
        let newest = most_recent(&records, |r| r.1, 2);
        let ids: Vec<_> = newest.iter().map(|r| r.0).collect();
        assert_eq!(ids, ["c", "d"]);

        let all = most_recent(&records, |r| r.1, 10);
        assert_eq!(all.last().unwrap().0, "b");
    }
}
