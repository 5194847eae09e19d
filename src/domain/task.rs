//! Task Entity
//!
//! Wedding to-do entries with optional due dates, plus the filter/sort
//! options and due-date bucketing used by the task list.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{null_as_default, Entity, TableRecord};

/// Tasks due within this many days are "due soon"
pub const DUE_SOON_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default)]
    pub id: i64,
    pub group_id: i64,
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_completed: bool,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(group_id: i64, description: String, due_date: Option<NaiveDate>) -> Self {
        Self {
            id: 0,
            group_id,
            description,
            is_completed: false,
            due_date,
            created_by: None,
            created_at: None,
        }
    }

    /// Bucket this task relative to `today`
    pub fn due_status(&self, today: NaiveDate) -> DueStatus {
        if self.is_completed {
            return DueStatus::Completed;
        }
        let Some(due) = self.due_date else {
            return DueStatus::NoDueDate;
        };
        let days = (due - today).num_days();
        if days < 0 {
            DueStatus::Overdue(due)
        } else if days == 0 {
            DueStatus::DueToday
        } else if days <= DUE_SOON_DAYS {
            DueStatus::DueSoon(due)
        } else {
            DueStatus::Upcoming(due)
        }
    }
}

impl Entity for Task {
    type Id = i64;

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl TableRecord for Task {
    const TABLE: &'static str = "tasks";
}

/// Due-date bucket of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DueStatus {
    Completed,
    Overdue(NaiveDate),
    DueToday,
    DueSoon(NaiveDate),
    Upcoming(NaiveDate),
    NoDueDate,
}

impl DueStatus {
    /// Text shown next to the description; None for undated open tasks
    pub fn label(&self) -> Option<String> {
        match self {
            DueStatus::Completed => Some("Completed".to_string()),
            DueStatus::Overdue(d) => Some(format!("Overdue ({})", d.format("%b %-d"))),
            DueStatus::DueToday => Some("Due Today".to_string()),
            DueStatus::DueSoon(d) => Some(format!("Due Soon ({})", d.format("%b %-d"))),
            DueStatus::Upcoming(d) => Some(format!("Due {}", d.format("%b %-d"))),
            DueStatus::NoDueDate => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DueStatus::Completed => "completed",
            DueStatus::Overdue(_) => "overdue",
            DueStatus::DueToday => "due_today",
            DueStatus::DueSoon(_) => "due_soon",
            DueStatus::Upcoming(_) => "upcoming",
            DueStatus::NoDueDate => "no_due_date",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl TaskFilter {
    pub fn from_str(s: &str) -> Self {
        match s {
            "pending" => TaskFilter::Pending,
            "completed" => TaskFilter::Completed,
            _ => TaskFilter::All,
        }
    }

    /// Required completion state, None for no filter
    pub fn completed(&self) -> Option<bool> {
        match self {
            TaskFilter::All => None,
            TaskFilter::Pending => Some(false),
            TaskFilter::Completed => Some(true),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskSort {
    #[default]
    CreatedAsc,
    CreatedDesc,
    DueAsc,
    DueDesc,
}

impl TaskSort {
    pub fn from_str(s: &str) -> Self {
        match s {
            "created_date_desc" | "created_desc" => TaskSort::CreatedDesc,
            "due_date_asc" | "due_asc" => TaskSort::DueAsc,
            "due_date_desc" | "due_desc" => TaskSort::DueDesc,
            _ => TaskSort::CreatedAsc,
        }
    }

    /// (column, ascending, nulls last)
    pub fn ordering(&self) -> (&'static str, bool, bool) {
        match self {
            TaskSort::CreatedAsc => ("created_at", true, false),
            TaskSort::CreatedDesc => ("created_at", false, false),
            TaskSort::DueAsc => ("due_date", true, true),
            TaskSort::DueDesc => ("due_date", false, true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task_due(due: Option<NaiveDate>) -> Task {
        Task::new(1, "Book mehendi artist".to_string(), due)
    }

    #[test]
    fn test_due_buckets() {
        let today = date(2025, 7, 3);
        assert_eq!(task_due(Some(date(2025, 7, 1))).due_status(today), DueStatus::Overdue(date(2025, 7, 1)));
        assert_eq!(task_due(Some(today)).due_status(today), DueStatus::DueToday);
        assert_eq!(task_due(Some(date(2025, 7, 10))).due_status(today), DueStatus::DueSoon(date(2025, 7, 10)));
        assert_eq!(task_due(Some(date(2025, 7, 11))).due_status(today), DueStatus::Upcoming(date(2025, 7, 11)));
        assert_eq!(task_due(None).due_status(today), DueStatus::NoDueDate);

        let mut done = task_due(Some(date(2025, 6, 1)));
        done.is_completed = true;
        assert_eq!(done.due_status(today), DueStatus::Completed);
    }

    #[test]
    fn test_due_labels() {
        assert_eq!(DueStatus::Overdue(date(2025, 7, 1)).label().as_deref(), Some("Overdue (Jul 1)"));
        assert_eq!(DueStatus::DueSoon(date(2025, 7, 10)).label().as_deref(), Some("Due Soon (Jul 10)"));
        assert_eq!(DueStatus::Upcoming(date(2025, 12, 25)).label().as_deref(), Some("Due Dec 25"));
        assert_eq!(DueStatus::DueToday.label().as_deref(), Some("Due Today"));
        assert!(DueStatus::NoDueDate.label().is_none());
    }

    #[test]
    fn test_sort_and_filter_parsing() {
        assert_eq!(TaskSort::from_str("due_date_asc").ordering(), ("due_date", true, true));
        assert_eq!(TaskSort::from_str("unknown"), TaskSort::CreatedAsc);
        assert_eq!(TaskFilter::from_str("pending").completed(), Some(false));
        assert_eq!(TaskFilter::All.completed(), None);
    }
}
