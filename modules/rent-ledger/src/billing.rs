//! Billing calendar helpers
//!
//! Billing months are always represented by their first day. Report ranges
//! are always whole months. The scheduler's due-date selection lives here as
//! pure functions of `(joining_date, last_due_generated_for, today)` so it can
//! be tested without a database.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

/// First day of the calendar month containing `date`
pub fn billing_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Last day of the calendar month containing `date`
pub fn month_end(date: NaiveDate) -> NaiveDate {
    let first = billing_month(date);
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(first)
}

/// Number of days in the calendar month containing `date`
pub fn days_in_month(date: NaiveDate) -> u32 {
    month_end(date).day()
}

/// Midnight UTC at the start of `date`
pub fn start_of_day_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// A whole-month reporting range `[start, end]` (both inclusive dates)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportRange {
    /// Expand optional bounds to whole months
    ///
    /// A missing `from` is the first day of the current month, a missing `to`
    /// is the last day of the current month. A supplied date is widened to the
    /// first/last day of its own month.
    pub fn resolve(from: Option<NaiveDate>, to: Option<NaiveDate>, today: NaiveDate) -> Self {
        ReportRange {
            start: billing_month(from.unwrap_or(today)),
            end: month_end(to.unwrap_or(today)),
        }
    }

    /// Half-open timestamp window covering every instant of the range
    ///
    /// Returns `[start 00:00 UTC, (end + 1 day) 00:00 UTC)` so rows collected
    /// late on the final day are included.
    pub fn timestamp_window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let after_end = self
            .end
            .checked_add_days(Days::new(1))
            .unwrap_or(self.end);
        (start_of_day_utc(self.start), start_of_day_utc(after_end))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Date the tenant's next monthly obligation falls on
///
/// With a cursor, it is one month after the cursor. Without one, it is the
/// day before the first monthly anniversary of joining. Month arithmetic
/// clamps to the target month's length (Jan 31 + 1 month = Feb 28/29).
pub fn next_due_date(joining_date: NaiveDate, last_due_generated_for: Option<NaiveDate>) -> NaiveDate {
    match last_due_generated_for {
        Some(last) => last.checked_add_months(Months::new(1)).unwrap_or(last),
        None => joining_date
            .checked_add_months(Months::new(1))
            .and_then(|anniversary| anniversary.pred_opt())
            .unwrap_or(joining_date),
    }
}

/// Due date to generate for the current month, if any
///
/// - a next due date after `today` means nothing is due yet
/// - a next due date in an earlier month collapses to the same day-of-month in
///   the current month, clamped to the month length (no backfill)
/// - the result must fall in the current month and not after `today`
pub fn due_date_to_generate(next_due: NaiveDate, today: NaiveDate) -> Option<NaiveDate> {
    if next_due > today {
        return None;
    }

    let current_month = billing_month(today);
    let mut due = next_due;
    if billing_month(next_due) < current_month {
        let day = next_due.day().min(days_in_month(today));
        due = current_month.with_day(day)?;
    }

    if billing_month(due) != current_month || due > today {
        return None;
    }
    Some(due)
}

/// Scheduler decision for one tenant: the due date to record, if generation applies today
pub fn scheduled_due_date(
    joining_date: NaiveDate,
    last_due_generated_for: Option<NaiveDate>,
    today: NaiveDate,
) -> Option<NaiveDate> {
    due_date_to_generate(next_due_date(joining_date, last_due_generated_for), today)
}
