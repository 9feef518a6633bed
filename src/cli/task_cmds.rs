use super::{AppContext, CommandError, render};
use crate::domain::alert::driven_ports::AckPrompt;
use crate::domain::task::driven_ports::{TaskReader, TaskWriter};
use crate::domain::task::driving_ports::TaskPort;
use crate::domain::task::{NewSubtask, NewTask, TaskStatus};
use chrono::{DateTime, Local, NaiveDateTime, Utc};
use tracing::info;

/// Formats accepted for a reminder given in local time
const LOCAL_REMINDER_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"];

/// Parses a reminder argument. RFC 3339 instants are taken as-is, anything else is read as
/// a wall-clock time in the local time zone.
pub fn parse_reminder(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }

    let naive = LOCAL_REMINDER_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .ok_or_else(|| {
            format!("\"{raw}\" is not a time, use RFC 3339 or \"YYYY-MM-DD HH:MM\"")
        })?;

    naive
        .and_local_timezone(Local)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| format!("\"{raw}\" does not exist in the local time zone"))
}

fn print_tasks(app: &AppContext) {
    println!("{}", render::task_list(&app.cache.snapshot(), &Local));
}

pub async fn list(
    app: &AppContext,
    task_service: &impl TaskPort,
    task_api: &(impl TaskReader + TaskWriter),
) -> Result<(), CommandError> {
    task_service
        .refresh(&app.session, &app.cache, &app.ext_cxn, task_api)
        .await?;

    print_tasks(app);
    Ok(())
}

pub async fn add(
    new_task: &NewTask,
    app: &AppContext,
    task_service: &impl TaskPort,
    task_api: &(impl TaskReader + TaskWriter),
) -> Result<(), CommandError> {
    info!("Adding task \"{}\"", new_task.title);
    task_service
        .create_task(new_task, &app.session, &app.cache, &app.ext_cxn, task_api)
        .await?;

    println!("Added \"{}\".", new_task.title);
    print_tasks(app);
    Ok(())
}

pub async fn set_status(
    task_id: i64,
    status: TaskStatus,
    app: &AppContext,
    task_service: &impl TaskPort,
    task_api: &(impl TaskReader + TaskWriter),
) -> Result<(), CommandError> {
    task_service
        .set_task_status(task_id, status, &app.session, &app.cache, &app.ext_cxn, task_api)
        .await?;

    println!("Task #{task_id} is now {status}.");
    Ok(())
}

pub async fn toggle(
    task_id: i64,
    app: &AppContext,
    task_service: &impl TaskPort,
    task_api: &(impl TaskReader + TaskWriter),
) -> Result<(), CommandError> {
    // The cache starts empty on every invocation and toggling reads the current status from it
    task_service
        .refresh(&app.session, &app.cache, &app.ext_cxn, task_api)
        .await?;
    let status = task_service
        .toggle_task_status(task_id, &app.session, &app.cache, &app.ext_cxn, task_api)
        .await?;

    println!("Task #{task_id} is now {status}.");
    Ok(())
}

/// Deletes a task once the user confirms, or straight away when `confirmed` is already set
pub async fn delete(
    task_id: i64,
    confirmed: bool,
    prompt: &impl AckPrompt,
    app: &AppContext,
    task_service: &impl TaskPort,
    task_api: &(impl TaskReader + TaskWriter),
) -> Result<(), CommandError> {
    if !confirmed && !prompt.confirm(&format!("Delete task #{task_id}?")).await {
        println!("Kept task #{task_id}.");
        return Ok(());
    }

    task_service
        .delete_task(task_id, &app.session, &app.cache, &app.ext_cxn, task_api)
        .await?;

    println!("Deleted task #{task_id}.");
    Ok(())
}

pub async fn add_subtask(
    task_id: i64,
    subtask: &NewSubtask,
    app: &AppContext,
    task_service: &impl TaskPort,
    task_api: &(impl TaskReader + TaskWriter),
) -> Result<(), CommandError> {
    task_service
        .add_subtask(task_id, subtask, &app.session, &app.cache, &app.ext_cxn, task_api)
        .await?;

    if let Some(task) = app.cache.find(task_id) {
        println!("{}", render::task_block(&task, &Local));
    }
    Ok(())
}

pub async fn toggle_subtask(
    subtask_id: i64,
    app: &AppContext,
    task_service: &impl TaskPort,
    task_api: &(impl TaskReader + TaskWriter),
) -> Result<(), CommandError> {
    task_service
        .toggle_subtask(subtask_id, &app.session, &app.cache, &app.ext_cxn, task_api)
        .await?;

    println!("Toggled checklist item #{subtask_id}.");
    Ok(())
}

pub async fn delete_subtask(
    subtask_id: i64,
    confirmed: bool,
    prompt: &impl AckPrompt,
    app: &AppContext,
    task_service: &impl TaskPort,
    task_api: &(impl TaskReader + TaskWriter),
) -> Result<(), CommandError> {
    if !confirmed
        && !prompt
            .confirm(&format!("Delete checklist item #{subtask_id}?"))
            .await
    {
        println!("Kept checklist item #{subtask_id}.");
        return Ok(());
    }

    task_service
        .delete_subtask(subtask_id, &app.session, &app.cache, &app.ext_cxn, task_api)
        .await?;

    println!("Deleted checklist item #{subtask_id}.");
    Ok(())
}
