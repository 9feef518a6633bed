//! The `taskbell` command line, the driving adapter for every user action

pub mod auth_cmds;
pub mod render;
pub mod task_cmds;
pub mod watch;

use crate::config::Config;
use crate::domain;
use crate::domain::alert::AlertSink;
use crate::domain::session::SessionHolder;
use crate::domain::task::{Priority, Recurrence, TaskCache, TaskService, TaskStatus};
use crate::domain::user::driving_ports::AuthError;
use crate::domain::user::{AuthService, Credentials, Registration};
use crate::persistence;
use crate::persistence::http_auth_driven_ports::HttpAuthenticator;
use crate::persistence::http_task_driven_ports::HttpTaskApi;
use crate::persistence::token_file::FileTokenStore;
use crate::terminal_alarm::{BellPlayer, StdinPrompt};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

/// taskbell: a terminal client for your task list, with audible reminders.
#[derive(Parser)]
#[command(name = "taskbell", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create an account.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Log in and remember the session.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Forget the session and any cached tasks.
    Logout,

    /// Show every task.
    List,

    /// Add a task.
    Add {
        title: String,
        #[arg(short, long)]
        description: Option<String>,
        /// low, medium or high.
        #[arg(short, long, default_value = "medium")]
        priority: Priority,
        /// When to ring, as RFC 3339 or local "YYYY-MM-DD HH:MM".
        #[arg(short, long, value_parser = task_cmds::parse_reminder)]
        remind_at: Option<DateTime<Utc>>,
        /// daily, weekly, monthly or any other label. Leave out for one-off tasks.
        #[arg(long)]
        repeat: Option<Recurrence>,
    },

    /// Set a task's status to pending, in_progress or done.
    Status { task_id: i64, status: TaskStatus },

    /// Mark a task done, or reopen it if it already is.
    Toggle { task_id: i64 },

    /// Delete a task after asking for confirmation.
    Delete {
        task_id: i64,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },

    /// Manage a task's checklist.
    Subtask {
        #[command(subcommand)]
        action: SubtaskCommand,
    },

    /// Keep running and ring when reminders come due.
    Watch,
}

#[derive(Subcommand)]
pub enum SubtaskCommand {
    /// Add a checklist item to a task.
    Add { task_id: i64, title: String },
    /// Tick or untick a checklist item.
    Toggle { subtask_id: i64 },
    /// Delete a checklist item after asking for confirmation.
    Delete {
        subtask_id: i64,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}

/// Everything a command needs to reach the API and the local session
pub struct AppContext {
    pub config: Config,
    pub ext_cxn: persistence::ExternalConnectivity,
    pub session: SessionHolder<FileTokenStore>,
    pub cache: TaskCache,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self, anyhow::Error> {
        let ext_cxn =
            persistence::ExternalConnectivity::new(&config.api_url, config.request_timeout)?;
        let session = SessionHolder::new(FileTokenStore::new(config.storage_path.clone()))?;

        Ok(AppContext {
            config,
            ext_cxn,
            session,
            cache: TaskCache::new(),
        })
    }
}

/// What the user gets told when a command fails
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Your session has expired. Log in again.")]
    SessionExpired,
    #[error("You are not logged in. Run `taskbell login` first.")]
    NotLoggedIn,
    #[error("The email or password was not accepted.")]
    InvalidCredentials,
    #[error("Some input was invalid: {0}")]
    Invalid(ValidationErrors),
    #[error("No task or checklist item has that ID.")]
    NotFound,
    #[error("Something went wrong. Please try again.")]
    Failed(#[source] anyhow::Error),
}

impl From<domain::Error> for CommandError {
    fn from(value: domain::Error) -> Self {
        match value {
            domain::Error::Unauthorized => Self::SessionExpired,
            domain::Error::NotLoggedIn => Self::NotLoggedIn,
            domain::Error::Invalid(validation_errors) => Self::Invalid(validation_errors),
            domain::Error::DoesNotExist => Self::NotFound,
            request_failure @ domain::Error::RequestFailure { .. } => {
                Self::Failed(request_failure.into())
            }
        }
    }
}

impl From<AuthError> for CommandError {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::Invalid(validation_errors) => Self::Invalid(validation_errors),
            AuthError::InvalidCredentials => Self::InvalidCredentials,
            AuthError::PortError(cause) => Self::Failed(cause),
        }
    }
}

impl From<anyhow::Error> for CommandError {
    fn from(value: anyhow::Error) -> Self {
        Self::Failed(value)
    }
}

/// Runs one command. Unexpected failures are logged in full before being reported.
pub async fn run(command: Command, app: &AppContext) -> Result<(), CommandError> {
    let result = dispatch(command, app).await;
    if let Err(CommandError::Failed(cause)) = &result {
        error!("Command failed: {cause:#}");
    }

    result
}

async fn dispatch(command: Command, app: &AppContext) -> Result<(), CommandError> {
    let task_service = TaskService {};
    let task_api = HttpTaskApi {};
    let auth_service = AuthService {};
    let authenticator = HttpAuthenticator {};

    match command {
        Command::Register {
            name,
            email,
            password,
        } => {
            let registration = Registration {
                name,
                email,
                password,
            };
            auth_cmds::register(&registration, app, &auth_service, &authenticator).await
        }
        Command::Login { email, password } => {
            let credentials = Credentials { email, password };
            auth_cmds::login(
                &credentials,
                app,
                &auth_service,
                &authenticator,
                &task_service,
                &task_api,
            )
            .await
        }
        Command::Logout => auth_cmds::logout(&app.session, &app.cache, &auth_service),
        Command::List => task_cmds::list(app, &task_service, &task_api).await,
        Command::Add {
            title,
            description,
            priority,
            remind_at,
            repeat,
        } => {
            let new_task = domain::task::NewTask {
                title,
                description: description.unwrap_or_default(),
                priority,
                reminder_time: remind_at,
                recurrence: repeat.unwrap_or_default(),
            };
            task_cmds::add(&new_task, app, &task_service, &task_api).await
        }
        Command::Status { task_id, status } => {
            task_cmds::set_status(task_id, status, app, &task_service, &task_api).await
        }
        Command::Toggle { task_id } => {
            task_cmds::toggle(task_id, app, &task_service, &task_api).await
        }
        Command::Delete { task_id, yes } => {
            let prompt = StdinPrompt::new();
            task_cmds::delete(task_id, yes, &prompt, app, &task_service, &task_api).await
        }
        Command::Subtask { action } => match action {
            SubtaskCommand::Add { task_id, title } => {
                let subtask = domain::task::NewSubtask { title };
                task_cmds::add_subtask(task_id, &subtask, app, &task_service, &task_api).await
            }
            SubtaskCommand::Toggle { subtask_id } => {
                task_cmds::toggle_subtask(subtask_id, app, &task_service, &task_api).await
            }
            SubtaskCommand::Delete { subtask_id, yes } => {
                let prompt = StdinPrompt::new();
                task_cmds::delete_subtask(subtask_id, yes, &prompt, app, &task_service, &task_api)
                    .await
            }
        },
        Command::Watch => {
            let alerts = AlertSink::new(BellPlayer::new(app.config.alarm_rings), StdinPrompt::new());
            watch::watch(app, &task_service, &task_api, &alerts).await
        }
    }
}
