use serde::{Deserialize, Serialize};
use std::vec::Vec;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub text: String,
    pub done: bool,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

impl TodoItem {
    pub fn new(text: impl Into<String>, created_at: impl Into<String>) -> Self {
        TodoItem {
            text: text.into(),
            done: false,
            created_at: created_at.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentEvent {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_course")]
    pub course: String,
    #[serde(default)]
    pub due: Option<String>,
    #[serde(default, rename = "color")]
    pub accent_color: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

fn default_title() -> String {
    "Assignment".to_string()
}

fn default_course() -> String {
    "Canvas course".to_string()
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EventKind {
    Assignment,
    Todo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub title: String,
    pub accent_color: String,
    pub url: Option<String>,
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarDayBucket {
    pub year: i32,
    pub month_index: u32,
    pub day: u32,
    pub events: Vec<CalendarEvent>,
}

/// A resolved calendar month. `month_index` is zero-based (January is 0).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MonthInfo {
    pub year: i32,
    pub month_index: u32,
    pub days_in_month: u32,
}
