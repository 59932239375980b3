//! Deadline arithmetic and reminder planning for projects and tasks.
//!
//! All functions take `now` explicitly. Deadlines are local wall-clock times with
//! a default time of day of 23:59.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::projects::ItemStatus;

pub const DEFAULT_DEADLINE_TIME: &str = "23:59";

/// Points along the way from "now" to the deadline at which a reminder fires.
pub const REMINDER_PERCENTAGES: [u8; 4] = [25, 50, 75, 100];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeadlineStatus {
    Overdue,
    Urgent,
    Warning,
    Ok,
}

/// Parses `YYYY-MM-DD` (or a full ISO timestamp, whose date part is used) plus an
/// optional `HH:MM` time.
pub fn parse_deadline(date: &str, time: Option<&str>) -> Option<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(date.get(..10)?, "%Y-%m-%d").ok()?;
    let time = time
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(DEFAULT_DEADLINE_TIME);
    let time = NaiveTime::parse_from_str(time.trim(), "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time.trim(), "%H:%M:%S"))
        .ok()?;
    Some(date.and_time(time))
}

/// `overdue` once passed, `urgent` under 24h, `warning` under 72h, otherwise `ok`.
pub fn deadline_status(deadline: NaiveDateTime, now: NaiveDateTime) -> DeadlineStatus {
    let hours = (deadline - now).num_seconds() as f64 / 3600.0;
    if hours < 0.0 {
        DeadlineStatus::Overdue
    } else if hours < 24.0 {
        DeadlineStatus::Urgent
    } else if hours < 72.0 {
        DeadlineStatus::Warning
    } else {
        DeadlineStatus::Ok
    }
}

fn plural(n: i64) -> &'static str {
    if n == 1 { "" } else { "s" }
}

/// Human-readable countdown in whole days, rounding partial days up.
pub fn deadline_text(deadline: NaiveDateTime, now: NaiveDateTime) -> String {
    let days = ((deadline - now).num_seconds() as f64 / 86_400.0).ceil() as i64;
    match days {
        d if d < 0 => format!("Overdue by {} day{}", d.abs(), plural(d.abs())),
        0 => "Due today".to_string(),
        1 => "Due tomorrow".to_string(),
        d => format!("{d} days left"),
    }
}

/// `"Xd Yh Zm"` until the deadline, or `"Overdue"`.
pub fn time_remaining(deadline: NaiveDateTime, now: NaiveDateTime) -> String {
    let left = deadline - now;
    if left <= Duration::zero() {
        return "Overdue".to_string();
    }
    format!(
        "{}d {}h {}m",
        left.num_days(),
        left.num_hours() % 24,
        left.num_minutes() % 60
    )
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub percentage: u8,
    pub reminder_type: String,
    pub send_at: NaiveDateTime,
    pub message: String,
}

pub fn reminder_message(percentage: u8, name: &str) -> String {
    match percentage {
        25 => format!(
            "Time to start! {name} deadline is approaching. You have 75% of time left - start working now!"
        ),
        50 => format!("Halfway there! {name} is 50% through its deadline. Complete half of the work!"),
        75 => format!("Deadline is near! {name} deadline is just around the corner. Finish up!"),
        _ => format!("Today is the deadline for {name}!"),
    }
}

pub fn reminder_type(is_project: bool, percentage: u8) -> String {
    let prefix = if is_project { "project" } else { "task" };
    if percentage >= 100 {
        format!("{prefix}_deadline")
    } else {
        format!("{prefix}_{percentage}")
    }
}

/// Spreads reminders over the time left until `deadline`.
///
/// Returns nothing when the deadline has already passed.
pub fn plan_reminders(
    is_project: bool,
    name: &str,
    deadline: NaiveDateTime,
    now: NaiveDateTime,
) -> Vec<Reminder> {
    let total = deadline - now;
    if total <= Duration::zero() {
        return Vec::new();
    }
    let total_ms = total.num_milliseconds();

    REMINDER_PERCENTAGES
        .iter()
        .map(|&pct| Reminder {
            percentage: pct,
            reminder_type: reminder_type(is_project, pct),
            send_at: now + Duration::milliseconds(total_ms * i64::from(pct) / 100),
            message: reminder_message(pct, name),
        })
        .collect()
}

/// Whether a reminder at `percentage` is due for an item in `status`.
///
/// Only open items get reminders. Elapsed time is measured from the start of the
/// deadline's own day, and nothing is sent once the deadline has passed.
pub fn should_send_reminder(
    deadline: NaiveDateTime,
    percentage: u8,
    status: ItemStatus,
    now: NaiveDateTime,
) -> bool {
    if status == ItemStatus::Done {
        return false;
    }
    let Some(day_start) = deadline.date().and_hms_opt(0, 0, 0) else {
        return false;
    };
    let total = (deadline - day_start).num_milliseconds() as f64;
    let remaining = (deadline - now).num_milliseconds() as f64;
    if total <= 0.0 || remaining <= 0.0 {
        return false;
    }
    let elapsed_pct = (total - remaining) / total * 100.0;
    elapsed_pct >= f64::from(percentage)
}
