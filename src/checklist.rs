//! Checklist items and their recurrence schedules.
//!
//! Every item answers two questions about the latest task it generated:
//!
//! - **past due**: has the window for completing that task closed?
//! - **schedule next**: is today the day to create the next task?
//!
//! Weekly and monthly items are overdue as soon as their window closes, but only
//! get a new task on their calendar slot.
//!
//! "Today" is always passed in by the caller.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{ChecklistError, Result};
use crate::fields::*;
use crate::task::Task;

/// How an item recurs. `complete_offset` is the number of days allowed to
/// finish a task minus one, so `0` means "same day".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schedule {
    /// Due the day after creation, recreated as soon as it is due.
    Daily,
    /// Created on a fixed weekday. The window never exceeds a week.
    Weekly { day_of_week: Weekday, complete_offset: u32 },
    /// Created on a fixed day of the month, clamped to short months.
    Monthly { day_of_month: u32, complete_offset: u32 },
    /// Recreated `wait` days after the previous task was finished.
    Floating { complete_offset: u32, wait: u32 },
}

/// A configured recurring item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistItem {
    pub id: String,
    /// Task line template stamped onto every generated task.
    pub text: String,
    pub schedule: Schedule,
}

impl ChecklistItem {
    pub fn kind(&self) -> ScheduleKind {
        match self.schedule {
            Schedule::Daily => ScheduleKind::Daily,
            Schedule::Weekly { .. } => ScheduleKind::Weekly,
            Schedule::Monthly { .. } => ScheduleKind::Monthly,
            Schedule::Floating { .. } => ScheduleKind::Floating,
        }
    }

    /// True once the window for finishing `latest` has elapsed as of `today`.
    pub fn past_due(&self, latest: &Task, today: NaiveDate) -> Result<bool> {
        let create = latest
            .create
            .ok_or_else(|| ChecklistError::MissingCreateDate {
                id: self.id.clone(),
                line: latest.to_string(),
            })?;
        let due = match self.schedule {
            Schedule::Daily => create,
            Schedule::Weekly { complete_offset, .. }
            | Schedule::Floating { complete_offset, .. } => add_days(create, complete_offset)?,
            Schedule::Monthly { complete_offset, .. } => monthly_due(create, complete_offset)?,
        };
        Ok((today - due).num_days() >= 1)
    }

    /// True when `today` is the day to create the next task.
    ///
    /// Floating items count from the completion date, so `latest` must already
    /// be finished; a missing completion date is an error.
    pub fn schedule_next(&self, latest: &Task, today: NaiveDate) -> Result<bool> {
        match self.schedule {
            Schedule::Daily => self.past_due(latest, today),
            Schedule::Weekly { day_of_week, .. } => Ok(today.weekday() == day_of_week),
            Schedule::Monthly { day_of_month, .. } => {
                let last = last_day_of_month(today.year(), today.month())
                    .ok_or(ChecklistError::DateOutOfRange(today))?;
                Ok(today.day() == day_of_month.min(last))
            }
            Schedule::Floating { wait, .. } => {
                let finish = latest
                    .finish
                    .ok_or_else(|| ChecklistError::MissingFinishDate(self.id.clone()))?;
                Ok((today - finish).num_days() >= i64::from(wait))
            }
        }
    }

    /// A fresh pending task for this item, created `today`.
    pub fn new_task(&self, today: NaiveDate) -> Task {
        let mut task = Task::parse(&self.text).unwrap_or_default();
        task.done = false;
        task.finish = None;
        task.create = Some(today);
        task.set_checklist_tag(&ChecklistTag::pending(self.id.as_str()));
        task
    }

    /// One-line, human readable summary of the schedule.
    pub fn describe(&self) -> String {
        match self.schedule {
            Schedule::Daily => "every day".to_string(),
            Schedule::Weekly { day_of_week, complete_offset } => format!(
                "every {}, {} to complete",
                weekday_abbr(day_of_week),
                plural_days(complete_offset + 1)
            ),
            Schedule::Monthly { day_of_month, complete_offset } => format!(
                "day {} of every month, {} to complete",
                day_of_month,
                plural_days(complete_offset + 1)
            ),
            Schedule::Floating { complete_offset, wait } => format!(
                "{} after completion, {} to complete",
                plural_days(wait),
                plural_days(complete_offset + 1)
            ),
        }
    }

    /// The JSON form of this item. Day counts are written back 1-based.
    pub fn to_record(&self) -> ItemRecord {
        let mut record = ItemRecord {
            kind: Some(self.kind().name().to_string()),
            id: Some(self.id.clone()),
            text: self.text.clone(),
            ..ItemRecord::default()
        };
        match self.schedule {
            Schedule::Daily => {}
            Schedule::Weekly { day_of_week, complete_offset } => {
                record.day = Some(FieldValue::Text(weekday_abbr(day_of_week)));
                record.complete_time = Some(FieldValue::Number(i64::from(complete_offset) + 1));
            }
            Schedule::Monthly { day_of_month, complete_offset } => {
                record.day = Some(FieldValue::Number(i64::from(day_of_month)));
                record.complete_time = Some(FieldValue::Number(i64::from(complete_offset) + 1));
            }
            Schedule::Floating { complete_offset, wait } => {
                record.complete_time = Some(FieldValue::Number(i64::from(complete_offset) + 1));
                record.wait = Some(FieldValue::Number(i64::from(wait)));
            }
        }
        record
    }
}

/// One entry of the checklist JSON document, before validation.
///
/// Numeric fields accept numbers or numeric strings; unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complete_time: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait: Option<FieldValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(i64),
    Text(String),
}

impl FieldValue {
    fn as_int(&self, field: &'static str) -> Result<i64> {
        match self {
            FieldValue::Number(n) => Ok(*n),
            FieldValue::Text(s) => s.trim().parse().map_err(|_| ChecklistError::InvalidField {
                field,
                value: s.clone(),
                reason: "expected a whole number",
            }),
        }
    }
}

impl TryFrom<ItemRecord> for ChecklistItem {
    type Error = ChecklistError;

    fn try_from(record: ItemRecord) -> Result<Self> {
        let kind = record.kind.as_deref().ok_or(ChecklistError::MissingField("type"))?;
        let kind = ScheduleKind::parse(kind)?;
        let id = record.id.clone().ok_or(ChecklistError::MissingField("id"))?;
        validate_id(&id)?;
        validate_text(&record.text)?;

        let schedule = match kind {
            ScheduleKind::Daily => Schedule::Daily,
            ScheduleKind::Weekly => {
                let day_of_week = match &record.day {
                    None => Weekday::Sun,
                    Some(FieldValue::Number(n)) => weekday_from_index(*n)?,
                    Some(FieldValue::Text(s)) => parse_weekday(s)?,
                };
                // Capped at a week so a window never overlaps the next task.
                let days = complete_days(&record)?.min(7);
                Schedule::Weekly { day_of_week, complete_offset: days - 1 }
            }
            ScheduleKind::Monthly => {
                let day = match &record.day {
                    None => 1,
                    Some(v) => v.as_int("day")?,
                };
                if !(1..=31).contains(&day) {
                    return Err(ChecklistError::InvalidField {
                        field: "day",
                        value: day.to_string(),
                        reason: "day of month must be 1 to 31",
                    });
                }
                Schedule::Monthly {
                    day_of_month: day as u32,
                    complete_offset: complete_days(&record)? - 1,
                }
            }
            ScheduleKind::Floating => {
                let wait = match &record.wait {
                    None => 0,
                    Some(v) => v.as_int("wait")?,
                };
                let wait = u32::try_from(wait).map_err(|_| ChecklistError::InvalidField {
                    field: "wait",
                    value: wait.to_string(),
                    reason: "wait must be zero or more days",
                })?;
                Schedule::Floating { complete_offset: complete_days(&record)? - 1, wait }
            }
        };

        Ok(ChecklistItem { id, text: record.text, schedule })
    }
}

/// `complete_time` as a day count of at least one. Defaults to one day.
fn complete_days(record: &ItemRecord) -> Result<u32> {
    let days = match &record.complete_time {
        None => 1,
        Some(v) => v.as_int("complete_time")?,
    };
    u32::try_from(days)
        .ok()
        .filter(|d| *d >= 1)
        .ok_or_else(|| ChecklistError::InvalidField {
            field: "complete_time",
            value: days.to_string(),
            reason: "complete_time must be at least one day",
        })
}

/// Generated tasks get their own creation date in front of the text, so the
/// text may not open with a completion mark or a date of its own.
fn validate_text(text: &str) -> Result<()> {
    match Task::parse(text) {
        Some(task) if task.done || task.create.is_some() => Err(ChecklistError::InvalidField {
            field: "text",
            value: text.to_string(),
            reason: "text must not start with 'x' or a date",
        }),
        _ => Ok(()),
    }
}

/// Ids end up inside a `checklist:<id>` tag, where whitespace would split the
/// token and `_` would be read as the start of a status suffix.
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() || id.contains('_') || id.chars().any(char::is_whitespace) {
        return Err(ChecklistError::InvalidId(id.to_string()));
    }
    Ok(())
}

/// Add `months` calendar months, clamping the day to the target month's length.
pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    let month0 = date.month0().checked_add(months)?;
    let year = date.year().checked_add(i32::try_from(month0 / 12).ok()?)?;
    let month = month0 % 12 + 1;
    let day = date.day().min(last_day_of_month(year, month)?);
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Number of days in the given month.
pub fn last_day_of_month(year: i32, month: u32) -> Option<u32> {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let first_of_next = NaiveDate::from_ymd_opt(next_year, next_month, 1)?;
    Some(first_of_next.pred_opt()?.day())
}

fn add_days(date: NaiveDate, days: u32) -> Result<NaiveDate> {
    date.checked_add_days(Days::new(u64::from(days)))
        .ok_or(ChecklistError::DateOutOfRange(date))
}

/// Due date of a monthly task.
///
/// When the window pushes the due date two or more months past the creation
/// month, the due date becomes exactly one calendar month after creation.
fn monthly_due(create: NaiveDate, complete_offset: u32) -> Result<NaiveDate> {
    let due = add_days(create, complete_offset)?;
    if (due.month() + 12 - create.month()) % 12 >= 2 {
        return add_months(create, 1).ok_or(ChecklistError::DateOutOfRange(create));
    }
    Ok(due)
}

fn plural_days(n: u32) -> String {
    if n == 1 {
        "1 day".to_string()
    } else {
        format!("{n} days")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn created(on: NaiveDate) -> Task {
        Task::created_on("a task", on)
    }

    fn finished(on: NaiveDate) -> Task {
        let mut task = Task::new("a task");
        task.complete_on(on);
        task
    }

    fn item(schedule: Schedule) -> ChecklistItem {
        ChecklistItem { id: "test".into(), text: "a task".into(), schedule }
    }

    fn weekly(day: Weekday, complete_time: u32) -> ChecklistItem {
        item(Schedule::Weekly { day_of_week: day, complete_offset: complete_time - 1 })
    }

    fn monthly(day: u32, complete_time: u32) -> ChecklistItem {
        item(Schedule::Monthly { day_of_month: day, complete_offset: complete_time - 1 })
    }

    fn floating(complete_time: u32, wait: u32) -> ChecklistItem {
        item(Schedule::Floating { complete_offset: complete_time - 1, wait })
    }

    fn sat() -> NaiveDate {
        date(2013, 12, 21)
    }

    #[test]
    fn test_add_months_clamps() {
        assert_eq!(add_months(date(2013, 1, 31), 1), Some(date(2013, 2, 28)));
        assert_eq!(add_months(date(2012, 1, 31), 1), Some(date(2012, 2, 29)));
        assert_eq!(add_months(date(2013, 12, 15), 1), Some(date(2014, 1, 15)));
        assert_eq!(add_months(date(2013, 8, 31), 13), Some(date(2014, 9, 30)));
    }

    #[test]
    fn test_last_day_of_month() {
        assert_eq!(last_day_of_month(2013, 2), Some(28));
        assert_eq!(last_day_of_month(2012, 2), Some(29));
        assert_eq!(last_day_of_month(2013, 12), Some(31));
        assert_eq!(last_day_of_month(2013, 4), Some(30));
    }

    #[test]
    fn test_daily() {
        let daily = item(Schedule::Daily);
        let today = sat();
        let yesterday = created(date(2013, 12, 20));
        let fresh = created(today);
        assert!(daily.past_due(&yesterday, today).unwrap());
        assert!(!daily.past_due(&fresh, today).unwrap());
        assert!(daily.schedule_next(&yesterday, today).unwrap());
        assert!(!daily.schedule_next(&fresh, today).unwrap());
    }

    #[test]
    fn test_weekly_past_due() {
        let today = sat();
        assert!(weekly(Weekday::Fri, 1).past_due(&created(date(2013, 12, 20)), today).unwrap());
        assert!(!weekly(Weekday::Sat, 1).past_due(&created(today), today).unwrap());
        // Thursday task with two days: due Friday, so overdue on Saturday.
        assert!(weekly(Weekday::Thu, 2).past_due(&created(date(2013, 12, 19)), today).unwrap());
        assert!(!weekly(Weekday::Fri, 2).past_due(&created(date(2013, 12, 20)), today).unwrap());
    }

    #[test]
    fn test_weekly_rollover() {
        // Made Saturday, four days to complete: due Tuesday, overdue Wednesday.
        let wed = date(2013, 12, 25);
        assert!(weekly(Weekday::Sat, 4).past_due(&created(date(2013, 12, 21)), wed).unwrap());
    }

    #[test]
    fn test_weekly_schedule_next() {
        let today = sat();
        let task = created(date(2013, 12, 14));
        assert!(weekly(Weekday::Sat, 1).schedule_next(&task, today).unwrap());
        assert!(!weekly(Weekday::Fri, 1).schedule_next(&task, today).unwrap());
    }

    #[test]
    fn test_monthly_past_due() {
        let today = sat();
        assert!(monthly(21, 1).past_due(&created(date(2013, 12, 20)), today).unwrap());
        assert!(!monthly(21, 1).past_due(&created(today), today).unwrap());
        assert!(monthly(19, 2).past_due(&created(date(2013, 12, 19)), today).unwrap());
        assert!(!monthly(20, 2).past_due(&created(date(2013, 12, 20)), today).unwrap());
    }

    #[test]
    fn test_monthly_rollover_due() {
        let today = date(2013, 3, 2);
        let feb_28 = created(date(2013, 2, 28));
        assert!(monthly(28, 2).past_due(&feb_28, today).unwrap());
        assert!(!monthly(28, 3).past_due(&feb_28, today).unwrap());
    }

    #[test]
    fn test_monthly_rollover_skips_a_month() {
        // Jan 31 + 29 days lands on Mar 1, so the due date falls back to Feb 28.
        let rule = monthly(31, 30);
        let task = created(date(2013, 1, 31));
        assert!(rule.past_due(&task, date(2013, 3, 1)).unwrap());
        assert!(!rule.past_due(&task, date(2013, 2, 28)).unwrap());
    }

    #[test]
    fn test_monthly_schedule_next() {
        let today = sat();
        let task = created(date(2013, 11, 21));
        assert!(monthly(21, 1).schedule_next(&task, today).unwrap());
        assert!(!monthly(15, 1).schedule_next(&task, today).unwrap());
        assert!(!monthly(30, 1).schedule_next(&task, today).unwrap());
    }

    #[test]
    fn test_monthly_schedule_clamps_to_short_month() {
        let task = created(date(2013, 1, 30));
        assert!(monthly(30, 4).schedule_next(&task, date(2013, 2, 28)).unwrap());
        assert!(monthly(31, 1).schedule_next(&task, date(2013, 4, 30)).unwrap());
        assert!(!monthly(31, 1).schedule_next(&task, date(2013, 4, 29)).unwrap());
    }

    #[test]
    fn test_floating_past_due() {
        let today = sat();
        let rule = floating(1, 0);
        assert!(rule.past_due(&created(date(2013, 12, 20)), today).unwrap());
        assert!(!rule.past_due(&created(today), today).unwrap());

        let rule = floating(3, 0);
        assert!(rule.past_due(&created(date(2013, 12, 18)), today).unwrap());
        assert!(!rule.past_due(&created(date(2013, 12, 20)), today).unwrap());
    }

    #[test]
    fn test_floating_schedule_next() {
        let today = sat();
        let rule = floating(1, 0);
        assert!(rule.schedule_next(&finished(date(2013, 12, 20)), today).unwrap());
        assert!(rule.schedule_next(&finished(today), today).unwrap());

        let rule = floating(1, 2);
        assert!(rule.schedule_next(&finished(date(2013, 12, 18)), today).unwrap());
        assert!(!rule.schedule_next(&finished(date(2013, 12, 20)), today).unwrap());
    }

    #[test]
    fn test_floating_requires_finish_date() {
        let err = floating(1, 0).schedule_next(&created(sat()), sat()).unwrap_err();
        assert!(matches!(err, ChecklistError::MissingFinishDate(id) if id == "test"));
    }

    #[test]
    fn test_past_due_requires_create_date() {
        let undated = Task::parse("call mum checklist:test").unwrap();
        let err = item(Schedule::Daily).past_due(&undated, sat()).unwrap_err();
        assert!(matches!(&err, ChecklistError::MissingCreateDate { id, .. } if id == "test"));
        assert_eq!(
            err.to_string(),
            "task for checklist item 'test' has no creation date: call mum checklist:test"
        );
    }

    #[test]
    fn test_past_due_is_monotonic() {
        let create = date(2013, 1, 31);
        let rules = [
            item(Schedule::Daily),
            weekly(Weekday::Sun, 3),
            monthly(31, 30),
            monthly(15, 5),
            floating(4, 1),
        ];
        for rule in &rules {
            let task = created(create);
            let mut seen_due = false;
            for offset in 0..120 {
                let today = create + chrono::Duration::days(offset);
                let due = rule.past_due(&task, today).unwrap();
                assert!(!seen_due || due, "{:?} went back to current on {today}", rule.schedule);
                seen_due |= due;
            }
            assert!(seen_due);
        }
    }

    #[test]
    fn test_new_task_is_tagged_and_dated() {
        let rule = ChecklistItem {
            id: "bills".into(),
            text: "pay bills +finances @home".into(),
            schedule: Schedule::Daily,
        };
        let task = rule.new_task(sat());
        assert_eq!(task.create, Some(sat()));
        assert!(!task.done);
        assert_eq!(task.checklist_tag(), Some(ChecklistTag::pending("bills")));
        assert_eq!(task.to_string(), "2013-12-21 pay bills +finances @home checklist:bills");
    }

    #[test]
    fn test_record_conversion() {
        let record: ItemRecord = serde_json::from_str(
            r#"{"type": "Weekly", "id": "review", "text": "weekly review", "day": "mon", "complete_time": "12"}"#,
        )
        .unwrap();
        let rule = ChecklistItem::try_from(record).unwrap();
        assert_eq!(rule.schedule, Schedule::Weekly { day_of_week: Weekday::Mon, complete_offset: 6 });

        let back = rule.to_record();
        assert_eq!(back.day, Some(FieldValue::Text("mon".into())));
        assert_eq!(back.complete_time, Some(FieldValue::Number(7)));
    }

    #[test]
    fn test_record_defaults() {
        let parse = |json: &str| {
            ChecklistItem::try_from(serde_json::from_str::<ItemRecord>(json).unwrap()).unwrap()
        };
        assert_eq!(
            parse(r#"{"type": "weekly", "id": "w"}"#).schedule,
            Schedule::Weekly { day_of_week: Weekday::Sun, complete_offset: 0 }
        );
        assert_eq!(
            parse(r#"{"type": "monthly", "id": "m"}"#).schedule,
            Schedule::Monthly { day_of_month: 1, complete_offset: 0 }
        );
        assert_eq!(
            parse(r#"{"type": "floating", "id": "f"}"#).schedule,
            Schedule::Floating { complete_offset: 0, wait: 0 }
        );
    }

    #[test]
    fn test_record_rejects_bad_values() {
        let parse = |json: &str| {
            ChecklistItem::try_from(serde_json::from_str::<ItemRecord>(json).unwrap())
        };
        assert!(matches!(parse(r#"{"id": "x"}"#), Err(ChecklistError::MissingField("type"))));
        assert!(matches!(
            parse(r#"{"type": "hourly", "id": "x"}"#),
            Err(ChecklistError::UnknownType(_))
        ));
        assert!(matches!(
            parse(r#"{"type": "monthly", "id": "x", "day": 32}"#),
            Err(ChecklistError::InvalidField { field: "day", .. })
        ));
        assert!(matches!(
            parse(r#"{"type": "floating", "id": "x", "complete_time": 0}"#),
            Err(ChecklistError::InvalidField { field: "complete_time", .. })
        ));
        assert!(matches!(
            parse(r#"{"type": "floating", "id": "x", "wait": "soon"}"#),
            Err(ChecklistError::InvalidField { field: "wait", .. })
        ));
        assert!(matches!(
            parse(r#"{"type": "daily", "id": "my_item"}"#),
            Err(ChecklistError::InvalidId(_))
        ));
    }

    #[test]
    fn test_record_rejects_leading_markers_in_text() {
        let parse = |text: &str| {
            ChecklistItem::try_from(ItemRecord {
                kind: Some("daily".into()),
                id: Some("stretch".into()),
                text: text.into(),
                ..ItemRecord::default()
            })
        };
        for text in ["2013-01-01 stretch", "x stretch", "x 2013-01-01 stretch", "(A) 2013-01-01 stretch"] {
            assert!(
                matches!(parse(text), Err(ChecklistError::InvalidField { field: "text", .. })),
                "{text} was accepted"
            );
        }

        let item = parse("(A) stretch 10 minutes +health").unwrap();
        assert_eq!(
            item.new_task(sat()).to_string(),
            "(A) 2013-12-21 stretch 10 minutes +health checklist:stretch"
        );
    }

    #[test]
    fn test_describe() {
        assert_eq!(item(Schedule::Daily).describe(), "every day");
        assert_eq!(weekly(Weekday::Sun, 1).describe(), "every sun, 1 day to complete");
        assert_eq!(monthly(15, 3).describe(), "day 15 of every month, 3 days to complete");
        assert_eq!(floating(2, 0).describe(), "0 days after completion, 2 days to complete");
    }
}
