use crate::domain;
use crate::domain::task::UnknownLabel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A checklist item as the API returns it
#[derive(Deserialize, Debug)]
#[cfg_attr(test, derive(Serialize))]
pub struct SubtaskRecord {
    pub id: i64,
    pub task_id: i64,
    pub title: String,
    #[serde(default)]
    pub is_done: bool,
}

impl From<SubtaskRecord> for domain::task::Subtask {
    fn from(value: SubtaskRecord) -> Self {
        domain::task::Subtask {
            id: value.id,
            task_id: value.task_id,
            title: value.title,
            is_done: value.is_done,
        }
    }
}

/// A task as the API returns it. The API sends `null` for empty collections.
#[derive(Deserialize, Debug)]
#[cfg_attr(test, derive(Serialize))]
pub struct TaskRecord {
    pub id: i64,
    #[serde(default)]
    pub user_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub labels: Option<Vec<String>>,
    #[serde(default)]
    pub reminder_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub recurrence_pattern: Option<String>,
    #[serde(default)]
    pub subtasks: Option<Vec<SubtaskRecord>>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

impl TryFrom<TaskRecord> for domain::task::Task {
    type Error = UnknownLabel;

    fn try_from(value: TaskRecord) -> Result<Self, Self::Error> {
        // Older rows may never have had a status or priority written
        let status = match value.status.as_str() {
            "" => domain::task::TaskStatus::default(),
            label => label.parse()?,
        };
        let priority = match value.priority.as_str() {
            "" => domain::task::Priority::default(),
            label => label.parse()?,
        };

        Ok(domain::task::Task {
            id: value.id,
            owner_user_id: value.user_id,
            title: value.title,
            description: value.description,
            status,
            priority,
            labels: value.labels.unwrap_or_default(),
            reminder_time: value.reminder_time,
            recurrence: domain::task::Recurrence::from(
                value.recurrence_pattern.as_deref().unwrap_or_default(),
            ),
            subtasks: value
                .subtasks
                .unwrap_or_default()
                .into_iter()
                .map(domain::task::Subtask::from)
                .collect(),
            created_at: value.created_at,
        })
    }
}

/// Body for `POST /tasks/`
#[derive(Serialize, Debug)]
#[cfg_attr(test, derive(Deserialize, PartialEq, Eq))]
pub struct CreateTaskBody {
    pub title: String,
    pub description: String,
    pub priority: String,
    pub reminder_time: Option<DateTime<Utc>>,
    pub recurrence_pattern: String,
}

impl From<&domain::task::NewTask> for CreateTaskBody {
    fn from(value: &domain::task::NewTask) -> Self {
        CreateTaskBody {
            title: value.title.clone(),
            description: value.description.clone(),
            priority: value.priority.to_string(),
            reminder_time: value.reminder_time,
            recurrence_pattern: value.recurrence.as_str().to_owned(),
        }
    }
}

/// Body for `PUT /tasks/{id}`
#[derive(Serialize, Debug)]
#[cfg_attr(test, derive(Deserialize))]
pub struct StatusUpdateBody {
    pub status: String,
}

impl From<domain::task::TaskStatus> for StatusUpdateBody {
    fn from(value: domain::task::TaskStatus) -> Self {
        StatusUpdateBody {
            status: value.to_string(),
        }
    }
}

/// Body for `POST /tasks/{id}/subtasks`
#[derive(Serialize, Debug)]
#[cfg_attr(test, derive(Deserialize))]
pub struct SubtaskBody {
    pub title: String,
}

impl From<&domain::task::NewSubtask> for SubtaskBody {
    fn from(value: &domain::task::NewSubtask) -> Self {
        SubtaskBody {
            title: value.title.clone(),
        }
    }
}
