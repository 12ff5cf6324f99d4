//! Aggregations over fetched records.
//!
//! Everything in this module is a pure function of its inputs. The current
//! time is always passed in, never read from the clock, so the same records
//! and the same `now` always produce the same output.

pub mod alerts;
pub mod buckets;
pub mod filter;
pub mod range;
pub mod recency;
pub mod series;
pub mod summary;

pub use alerts::{Alert, AlertLevel, dashboard_alerts};
pub use buckets::{
    Bucket, application_status_buckets, contact_intent_buckets, contact_status_buckets,
    plan_buckets,
};
pub use filter::{ApplicationFilter, ContactFilter};
pub use range::{TimeRange, UnknownTimeRange};
pub use recency::{date_time_label, short_date, time_ago};
pub use series::{DailyCount, MonthlyPoint, daily_series, monthly_trend, most_recent};
pub use summary::{Summary, conversion_rate};
