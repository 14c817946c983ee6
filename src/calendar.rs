use std::collections::HashMap;

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};

use crate::dates::{calendar_date, parse_timestamp};
use crate::model::{
    AssignmentEvent, CalendarDayBucket, CalendarEvent, EventKind, MonthInfo, TodoItem,
};

pub const PALETTE: [&str; 7] = [
    "#B1C5FF", "#B1FFB5", "#FFB1B2", "#FFD7B1", "#D2B1FF", "#B1FFF3", "#FFC9DE",
];

/// Key shared by every todo-derived event.
pub const TODO_COLOR_KEY: &str = "__TODO__";
pub const TODO_ACCENT: &str = "#E2E4E9";

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// First-sight color assignment. A key keeps its color for the lifetime of
/// the palette; keys past the palette size reuse colors from the start.
#[derive(Debug, Default)]
pub struct ColorPalette {
    assigned: HashMap<String, &'static str>,
}

impl ColorPalette {
    pub fn new() -> Self {
        ColorPalette::default()
    }

    pub fn color_for(&mut self, key: &str) -> &'static str {
        if key == TODO_COLOR_KEY {
            return TODO_ACCENT;
        }
        let key = if key.is_empty() {
            format!("course_{}", self.assigned.len())
        } else {
            key.to_string()
        };
        let next = PALETTE[self.assigned.len() % PALETTE.len()];
        *self.assigned.entry(key).or_insert(next)
    }

    pub fn assigned_count(&self) -> usize {
        self.assigned.len()
    }
}

impl MonthInfo {
    pub fn name(&self) -> &'static str {
        MONTH_NAMES[self.month_index as usize % 12]
    }

    /// Blank cells before day 1 in a Monday-first grid.
    pub fn leading_blank_days(&self) -> u32 {
        match NaiveDate::from_ymd_opt(self.year, self.month_index + 1, 1) {
            Some(first) => first.weekday().num_days_from_monday(),
            // outside chrono's range; 0 = Sunday
            None => (day_of_week(self.year as i64, self.month_index + 1, 1) + 6) % 7,
        }
    }
}

/// Signed month displacement from the current month.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct MonthCursor {
    pub offset: i32,
}

impl MonthCursor {
    pub fn next(&mut self) {
        self.offset = self.offset.saturating_add(1);
    }

    pub fn prev(&mut self) {
        self.offset = self.offset.saturating_sub(1);
    }

    pub fn reset(&mut self) {
        self.offset = 0;
    }

    pub fn month(&self) -> MonthInfo {
        current_month(self.offset)
    }
}

pub fn current_month(offset: i32) -> MonthInfo {
    month_at(Local::now().date_naive(), offset)
}

pub fn month_at(today: NaiveDate, offset: i32) -> MonthInfo {
    let total = today.year() as i64 * 12 + today.month0() as i64 + offset as i64;
    let year = total.div_euclid(12) as i32;
    let month_index = total.rem_euclid(12) as u32;
    MonthInfo {
        year,
        month_index,
        days_in_month: days_in_month(year as i64, month_index + 1),
    }
}

fn is_leap_year(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: i64, month: u32) -> u32 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

// Sakamoto's method, proleptic Gregorian. 0 = Sunday.
fn day_of_week(year: i64, month: u32, day: u32) -> u32 {
    const OFFSETS: [i64; 12] = [0, 3, 2, 5, 0, 3, 5, 1, 4, 6, 2, 4];
    let y = if month < 3 { year - 1 } else { year };
    let sum = y + y.div_euclid(4) - y.div_euclid(100) + y.div_euclid(400)
        + OFFSETS[(month - 1) as usize]
        + day as i64;
    sum.rem_euclid(7) as u32
}

fn same_day(date: NaiveDate, year: i32, month_index: u32, day: u32) -> bool {
    date.year() == year && date.month0() == month_index && date.day() == day
}

#[derive(Debug, Default)]
pub struct CalendarAggregator {
    palette: ColorPalette,
}

impl CalendarAggregator {
    pub fn new() -> Self {
        CalendarAggregator::default()
    }

    /// Claims palette slots for every course in feed order, so a course's
    /// color does not depend on which month is rendered first.
    pub fn seed(&mut self, assignments: &[AssignmentEvent]) {
        for assignment in assignments {
            if assignment.accent_color.is_none() {
                self.palette.color_for(&assignment.course);
            }
        }
    }

    pub fn color_for(&mut self, key: &str) -> &'static str {
        self.palette.color_for(key)
    }

    /// Assignments due on the day, then todos created on it, each in input order.
    pub fn events_for_day(
        &mut self,
        year: i32,
        month_index: u32,
        day: u32,
        assignments: &[AssignmentEvent],
        todos: &[TodoItem],
    ) -> Vec<CalendarEvent> {
        let mut events = vec![];

        for assignment in assignments {
            let date = match assignment.due.as_deref().and_then(calendar_date) {
                Some(date) => date,
                None => continue,
            };
            if !same_day(date, year, month_index, day) {
                continue;
            }
            let accent_color = match &assignment.accent_color {
                Some(color) => color.clone(),
                None => self.palette.color_for(&assignment.course).to_string(),
            };
            events.push(CalendarEvent {
                title: assignment.title.clone(),
                accent_color,
                url: assignment.url.clone(),
                kind: EventKind::Assignment,
            });
        }

        for todo in todos {
            match calendar_date(&todo.created_at) {
                Some(date) if same_day(date, year, month_index, day) => {}
                _ => continue,
            }
            events.push(CalendarEvent {
                title: todo.text.clone(),
                accent_color: self.palette.color_for(TODO_COLOR_KEY).to_string(),
                url: None,
                kind: EventKind::Todo,
            });
        }

        events
    }

    pub fn month_buckets(
        &mut self,
        month: MonthInfo,
        assignments: &[AssignmentEvent],
        todos: &[TodoItem],
    ) -> Vec<CalendarDayBucket> {
        (1..=month.days_in_month)
            .map(|day| CalendarDayBucket {
                year: month.year,
                month_index: month.month_index,
                day,
                events: self.events_for_day(
                    month.year,
                    month.month_index,
                    day,
                    assignments,
                    todos,
                ),
            })
            .collect()
    }
}

/// Dated assignments due at or after `now`, soonest first.
pub fn upcoming(
    assignments: &[AssignmentEvent],
    now: NaiveDateTime,
    limit: usize,
) -> Vec<&AssignmentEvent> {
    let mut dated: Vec<(NaiveDateTime, &AssignmentEvent)> = assignments
        .iter()
        .filter_map(|assignment| {
            let due = assignment.due.as_deref().and_then(parse_timestamp)?;
            Some((due, assignment))
        })
        .filter(|(due, _)| *due >= now)
        .collect();
    dated.sort_by_key(|(due, _)| *due);
    dated
        .into_iter()
        .take(limit)
        .map(|(_, assignment)| assignment)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_of_week_matches_chrono() {
        for (y, m, d) in [(2026, 5, 9), (2000, 2, 29), (1999, 12, 31), (2024, 1, 1)] {
            let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
            assert_eq!(
                day_of_week(y as i64, m, d),
                date.weekday().num_days_from_sunday()
            );
        }
    }

    #[test]
    fn fallback_weekday_far_outside_chrono_range() {
        let month = MonthInfo {
            year: 2_000_000,
            month_index: 0,
            days_in_month: 31,
        };
        // the Gregorian cycle repeats every 400 years
        let reference = MonthInfo {
            year: 2000,
            month_index: 0,
            days_in_month: 31,
        };
        assert_eq!(month.leading_blank_days(), reference.leading_blank_days());
    }

    #[test]
    fn century_leap_rules() {
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
    }
}
