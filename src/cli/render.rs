use crate::domain::task::{Priority, Task, TaskStatus};
use chrono::TimeZone;
use std::fmt::Display;

const BAR_WIDTH: usize = 10;

fn priority_tag(priority: Priority) -> &'static str {
    match priority {
        Priority::Low => "LOW",
        Priority::Medium => "MEDIUM",
        Priority::High => "HIGH",
    }
}

fn status_mark(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "[ ]",
        TaskStatus::InProgress => "[~]",
        TaskStatus::Done => "[x]",
    }
}

/// A ten cell progress bar followed by the percentage, e.g. `[####------] 40%`
pub fn progress_bar(percent: u8) -> String {
    let filled = (usize::from(percent.min(100)) * BAR_WIDTH) / 100;
    format!(
        "[{}{}] {percent}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled)
    )
}

/// Renders one task as a block of lines, showing the reminder in `tz`
pub fn task_block<Tz>(task: &Task, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut heading = format!(
        "{} #{} {} [{}]",
        status_mark(task.status),
        task.id,
        task.title,
        priority_tag(task.priority)
    );
    if task.recurrence.is_recurring() {
        heading.push_str(&format!(" 🔄 {}", task.recurrence));
    }
    if !task.labels.is_empty() {
        heading.push_str(&format!(" ({})", task.labels.join(", ")));
    }

    let mut details = Vec::new();
    if !task.description.is_empty() {
        details.push(task.description.clone());
    }
    if let Some(reminder_time) = task.reminder_time {
        details.push(format!(
            "⏰ {}",
            reminder_time.with_timezone(tz).format("%Y-%m-%d %H:%M")
        ));
    }
    if !task.subtasks.is_empty() {
        details.push(progress_bar(task.progress_percent()));
        details.extend(task.subtasks.iter().map(|subtask| {
            let mark = if subtask.is_done { "[x]" } else { "[ ]" };
            format!("{mark} #{} {}", subtask.id, subtask.title)
        }));
    }

    std::iter::once(heading)
        .chain(details.into_iter().map(|line| format!("    {line}")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders the whole list, or a hint when it's empty
pub fn task_list<Tz>(tasks: &[Task], tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if tasks.is_empty() {
        return "No tasks yet. Add one with `taskbell add`.".to_owned();
    }

    tasks
        .iter()
        .map(|task| task_block(task, tz))
        .collect::<Vec<_>>()
        .join("\n")
}
