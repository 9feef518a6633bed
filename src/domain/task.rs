use crate::domain;
use crate::domain::session::SessionHolder;
use crate::domain::session::driven_ports::TokenStore;
use crate::domain::task::driven_ports::{TaskReader, TaskWriter};
use crate::domain::task::driving_ports::TaskPort;
use crate::external_connections::ExternalConnectivity;
use chrono::{DateTime, Utc};
use derive_more::Display;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::sync::{PoisonError, RwLock};
use thiserror::Error;
use tracing::{debug, info};
use validator::Validate;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Display)]
pub enum TaskStatus {
    #[default]
    #[display("pending")]
    Pending,
    #[display("in_progress")]
    InProgress,
    #[display("done")]
    Done,
}

impl TaskStatus {
    /// The status a task moves to when the user flips it: done tasks go back to pending,
    /// everything else gets finished
    pub fn toggled(self) -> TaskStatus {
        match self {
            Self::Done => Self::Pending,
            Self::Pending | Self::InProgress => Self::Done,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Display)]
pub enum Priority {
    #[display("low")]
    Low,
    #[default]
    #[display("medium")]
    Medium,
    #[display("high")]
    High,
}

/// A label the API stores alongside a task describing how it repeats. Labels this client
/// doesn't know about are kept verbatim so they survive a round trip.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub enum Recurrence {
    #[default]
    Once,
    Daily,
    Weekly,
    Monthly,
    Other(String),
}

impl Recurrence {
    /// The wire label for this recurrence. A non-repeating task uses the empty string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Once => "",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Other(label) => label,
        }
    }

    pub fn is_recurring(&self) -> bool {
        !matches!(self, Self::Once)
    }
}

impl From<&str> for Recurrence {
    fn from(value: &str) -> Self {
        match value {
            "" => Self::Once,
            "daily" => Self::Daily,
            "weekly" => Self::Weekly,
            "monthly" => Self::Monthly,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl FromStr for Recurrence {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Recurrence::from(s))
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unrecognized {kind} \"{value}\"")]
pub struct UnknownLabel {
    kind: &'static str,
    value: String,
}

impl FromStr for TaskStatus {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            other => Err(UnknownLabel {
                kind: "task status",
                value: other.to_owned(),
            }),
        }
    }
}

impl FromStr for Priority {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(UnknownLabel {
                kind: "priority",
                value: other.to_owned(),
            }),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Subtask {
    pub id: i64,
    pub task_id: i64,
    pub title: String,
    pub is_done: bool,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Task {
    pub id: i64,
    pub owner_user_id: i64,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub labels: Vec<String>,
    pub reminder_time: Option<DateTime<Utc>>,
    pub recurrence: Recurrence,
    pub subtasks: Vec<Subtask>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// A task can only ring while it has a reminder and hasn't been finished
    pub fn is_alert_eligible(&self) -> bool {
        self.reminder_time.is_some() && self.status != TaskStatus::Done
    }

    /// Percentage of finished checklist items, rounded. Tasks without a checklist report 0.
    pub fn progress_percent(&self) -> u8 {
        if self.subtasks.is_empty() {
            return 0;
        }

        let done = self.subtasks.iter().filter(|sub| sub.is_done).count();
        ((done as f64 / self.subtasks.len() as f64) * 100.0).round() as u8
    }
}

#[derive(Clone, Debug, Validate)]
pub struct NewTask {
    #[validate(length(min = 1))]
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub reminder_time: Option<DateTime<Utc>>,
    pub recurrence: Recurrence,
}

#[derive(Clone, Debug, Validate)]
pub struct NewSubtask {
    #[validate(length(min = 1))]
    pub title: String,
}

/// The locally mirrored task list. It is only ever replaced as a whole.
#[derive(Default, Debug)]
pub struct TaskCache {
    tasks: RwLock<Vec<Task>>,
}

impl TaskCache {
    pub fn new() -> TaskCache {
        TaskCache::default()
    }

    /// A copy of the cached tasks in the order the API returned them
    pub fn snapshot(&self) -> Vec<Task> {
        self.tasks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn replace(&self, tasks: Vec<Task>) {
        *self.tasks.write().unwrap_or_else(PoisonError::into_inner) = tasks;
    }

    pub fn clear(&self) {
        self.replace(Vec::new());
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        self.tasks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn find(&self, task_id: i64) -> Option<Task> {
        self.tasks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|task| task.id == task_id)
            .cloned()
    }
}

pub mod driven_ports {
    use super::*;
    use crate::domain::DrivenPortError;

    pub trait TaskReader {
        async fn fetch_tasks(
            &self,
            token: &str,
            ext_cxn: &impl ExternalConnectivity,
        ) -> Result<Vec<Task>, DrivenPortError>;
    }

    pub trait TaskWriter {
        async fn create_task(
            &self,
            token: &str,
            new_task: &NewTask,
            ext_cxn: &impl ExternalConnectivity,
        ) -> Result<(), DrivenPortError>;

        async fn update_task_status(
            &self,
            token: &str,
            task_id: i64,
            status: TaskStatus,
            ext_cxn: &impl ExternalConnectivity,
        ) -> Result<(), DrivenPortError>;

        async fn delete_task(
            &self,
            token: &str,
            task_id: i64,
            ext_cxn: &impl ExternalConnectivity,
        ) -> Result<(), DrivenPortError>;

        async fn create_subtask(
            &self,
            token: &str,
            task_id: i64,
            subtask: &NewSubtask,
            ext_cxn: &impl ExternalConnectivity,
        ) -> Result<(), DrivenPortError>;

        async fn toggle_subtask(
            &self,
            token: &str,
            subtask_id: i64,
            ext_cxn: &impl ExternalConnectivity,
        ) -> Result<(), DrivenPortError>;

        async fn delete_subtask(
            &self,
            token: &str,
            subtask_id: i64,
            ext_cxn: &impl ExternalConnectivity,
        ) -> Result<(), DrivenPortError>;
    }
}

pub mod driving_ports {
    use super::*;
    use crate::domain::Error;

    /// Every mutation goes straight to the API and is followed by a full [TaskPort::refresh].
    /// A rejected session token on any call ends the session.
    pub trait TaskPort {
        async fn refresh(
            &self,
            session: &SessionHolder<impl TokenStore>,
            cache: &TaskCache,
            ext_cxn: &impl ExternalConnectivity,
            task_read: &impl TaskReader,
        ) -> Result<(), Error>;
        async fn create_task(
            &self,
            new_task: &NewTask,
            session: &SessionHolder<impl TokenStore>,
            cache: &TaskCache,
            ext_cxn: &impl ExternalConnectivity,
            task_api: &(impl TaskReader + TaskWriter),
        ) -> Result<(), Error>;
        async fn set_task_status(
            &self,
            task_id: i64,
            status: TaskStatus,
            session: &SessionHolder<impl TokenStore>,
            cache: &TaskCache,
            ext_cxn: &impl ExternalConnectivity,
            task_api: &(impl TaskReader + TaskWriter),
        ) -> Result<(), Error>;
        async fn toggle_task_status(
            &self,
            task_id: i64,
            session: &SessionHolder<impl TokenStore>,
            cache: &TaskCache,
            ext_cxn: &impl ExternalConnectivity,
            task_api: &(impl TaskReader + TaskWriter),
        ) -> Result<TaskStatus, Error>;
        async fn delete_task(
            &self,
            task_id: i64,
            session: &SessionHolder<impl TokenStore>,
            cache: &TaskCache,
            ext_cxn: &impl ExternalConnectivity,
            task_api: &(impl TaskReader + TaskWriter),
        ) -> Result<(), Error>;
        async fn add_subtask(
            &self,
            task_id: i64,
            subtask: &NewSubtask,
            session: &SessionHolder<impl TokenStore>,
            cache: &TaskCache,
            ext_cxn: &impl ExternalConnectivity,
            task_api: &(impl TaskReader + TaskWriter),
        ) -> Result<(), Error>;
        async fn toggle_subtask(
            &self,
            subtask_id: i64,
            session: &SessionHolder<impl TokenStore>,
            cache: &TaskCache,
            ext_cxn: &impl ExternalConnectivity,
            task_api: &(impl TaskReader + TaskWriter),
        ) -> Result<(), Error>;
        async fn delete_subtask(
            &self,
            subtask_id: i64,
            session: &SessionHolder<impl TokenStore>,
            cache: &TaskCache,
            ext_cxn: &impl ExternalConnectivity,
            task_api: &(impl TaskReader + TaskWriter),
        ) -> Result<(), Error>;
    }
}

pub struct TaskService {}

/// Reads the session token, failing if nobody is logged in
fn active_token(session: &SessionHolder<impl TokenStore>) -> Result<String, domain::Error> {
    session.token().ok_or(domain::Error::NotLoggedIn)
}

impl driving_ports::TaskPort for TaskService {
    #[tracing::instrument(skip_all)]
    async fn refresh(
        &self,
        session: &SessionHolder<impl TokenStore>,
        cache: &TaskCache,
        ext_cxn: &impl ExternalConnectivity,
        task_read: &impl TaskReader,
    ) -> Result<(), domain::Error> {
        let token = active_token(session)?;

        match task_read.fetch_tasks(&token, ext_cxn).await {
            Ok(tasks) => {
                debug!("Fetched {} tasks", tasks.len());
                cache.replace(tasks);
                Ok(())
            }
            Err(port_err) => {
                cache.clear();
                Err(session.settle_port_error(port_err, "fetch tasks", cache))
            }
        }
    }

    async fn create_task(
        &self,
        new_task: &NewTask,
        session: &SessionHolder<impl TokenStore>,
        cache: &TaskCache,
        ext_cxn: &impl ExternalConnectivity,
        task_api: &(impl TaskReader + TaskWriter),
    ) -> Result<(), domain::Error> {
        new_task.validate()?;
        let token = active_token(session)?;

        info!("Creating task \"{}\"", new_task.title);
        task_api
            .create_task(&token, new_task, ext_cxn)
            .await
            .map_err(|err| session.settle_port_error(err, "create a task", cache))?;

        self.refresh(session, cache, ext_cxn, task_api).await
    }

    async fn set_task_status(
        &self,
        task_id: i64,
        status: TaskStatus,
        session: &SessionHolder<impl TokenStore>,
        cache: &TaskCache,
        ext_cxn: &impl ExternalConnectivity,
        task_api: &(impl TaskReader + TaskWriter),
    ) -> Result<(), domain::Error> {
        let token = active_token(session)?;

        info!("Setting task {task_id} to {status}");
        task_api
            .update_task_status(&token, task_id, status, ext_cxn)
            .await
            .map_err(|err| session.settle_port_error(err, "update a task", cache))?;

        self.refresh(session, cache, ext_cxn, task_api).await
    }

    async fn toggle_task_status(
        &self,
        task_id: i64,
        session: &SessionHolder<impl TokenStore>,
        cache: &TaskCache,
        ext_cxn: &impl ExternalConnectivity,
        task_api: &(impl TaskReader + TaskWriter),
    ) -> Result<TaskStatus, domain::Error> {
        let Some(task) = cache.find(task_id) else {
            return Err(domain::Error::DoesNotExist);
        };

        let new_status = task.status.toggled();
        self.set_task_status(task_id, new_status, session, cache, ext_cxn, task_api)
            .await?;

        Ok(new_status)
    }

    async fn delete_task(
        &self,
        task_id: i64,
        session: &SessionHolder<impl TokenStore>,
        cache: &TaskCache,
        ext_cxn: &impl ExternalConnectivity,
        task_api: &(impl TaskReader + TaskWriter),
    ) -> Result<(), domain::Error> {
        let token = active_token(session)?;

        info!("Deleting task {task_id}");
        task_api
            .delete_task(&token, task_id, ext_cxn)
            .await
            .map_err(|err| session.settle_port_error(err, "delete a task", cache))?;

        self.refresh(session, cache, ext_cxn, task_api).await
    }

    async fn add_subtask(
        &self,
        task_id: i64,
        subtask: &NewSubtask,
        session: &SessionHolder<impl TokenStore>,
        cache: &TaskCache,
        ext_cxn: &impl ExternalConnectivity,
        task_api: &(impl TaskReader + TaskWriter),
    ) -> Result<(), domain::Error> {
        subtask.validate()?;
        let token = active_token(session)?;

        info!("Adding checklist item to task {task_id}");
        task_api
            .create_subtask(&token, task_id, subtask, ext_cxn)
            .await
            .map_err(|err| session.settle_port_error(err, "add a checklist item", cache))?;

        self.refresh(session, cache, ext_cxn, task_api).await
    }

    async fn toggle_subtask(
        &self,
        subtask_id: i64,
        session: &SessionHolder<impl TokenStore>,
        cache: &TaskCache,
        ext_cxn: &impl ExternalConnectivity,
        task_api: &(impl TaskReader + TaskWriter),
    ) -> Result<(), domain::Error> {
        let token = active_token(session)?;

        info!("Toggling checklist item {subtask_id}");
        task_api
            .toggle_subtask(&token, subtask_id, ext_cxn)
            .await
            .map_err(|err| session.settle_port_error(err, "toggle a checklist item", cache))?;

        self.refresh(session, cache, ext_cxn, task_api).await
    }

    async fn delete_subtask(
        &self,
        subtask_id: i64,
        session: &SessionHolder<impl TokenStore>,
        cache: &TaskCache,
        ext_cxn: &impl ExternalConnectivity,
        task_api: &(impl TaskReader + TaskWriter),
    ) -> Result<(), domain::Error> {
        let token = active_token(session)?;

        info!("Deleting checklist item {subtask_id}");
        task_api
            .delete_subtask(&token, subtask_id, ext_cxn)
            .await
            .map_err(|err| session.settle_port_error(err, "delete a checklist item", cache))?;

        self.refresh(session, cache, ext_cxn, task_api).await
    }
}


#[cfg(test)]
pub mod test_util {
    use super::*;
    use crate::domain::DrivenPortError;
    use crate::domain::test_util::Connectivity;
    use chrono::TimeZone;

    /// In-memory stand-in for the remote task API
    pub struct InMemoryTaskApi {
        pub tasks: Vec<Task>,
        pub connected: Connectivity,
        pub tokens_seen: Vec<String>,
        pub fetch_count: usize,
        highest_task_id: i64,
        highest_subtask_id: i64,
    }

    impl InMemoryTaskApi {
        pub fn new() -> InMemoryTaskApi {
            InMemoryTaskApi {
                tasks: Vec::new(),
                connected: Connectivity::Connected,
                tokens_seen: Vec::new(),
                fetch_count: 0,
                highest_task_id: 0,
                highest_subtask_id: 0,
            }
        }

        pub fn new_with_tasks(tasks: Vec<Task>) -> RwLock<InMemoryTaskApi> {
            let mut api = Self::new();
            api.highest_task_id = tasks.iter().map(|task| task.id).max().unwrap_or(0);
            api.highest_subtask_id = tasks
                .iter()
                .flat_map(|task| task.subtasks.iter().map(|sub| sub.id))
                .max()
                .unwrap_or(0);
            api.tasks = tasks;
            RwLock::new(api)
        }

        pub fn new_locked() -> RwLock<InMemoryTaskApi> {
            RwLock::new(Self::new())
        }

        fn record_call(&mut self, token: &str) -> Result<(), DrivenPortError> {
            self.tokens_seen.push(token.to_owned());
            self.connected.blow_up_if_unreachable()
        }

        fn task_mut(&mut self, task_id: i64) -> Result<&mut Task, DrivenPortError> {
            self.tasks
                .iter_mut()
                .find(|task| task.id == task_id)
                .ok_or(DrivenPortError::DoesNotExist)
        }
    }

    impl driven_ports::TaskReader for RwLock<InMemoryTaskApi> {
        async fn fetch_tasks(
            &self,
            token: &str,
            _ext_cxn: &impl ExternalConnectivity,
        ) -> Result<Vec<Task>, DrivenPortError> {
            let mut api = self.write().expect("task api rw lock poisoned");
            api.record_call(token)?;
            api.fetch_count += 1;

            Ok(api.tasks.clone())
        }
    }

    impl driven_ports::TaskWriter for RwLock<InMemoryTaskApi> {
        async fn create_task(
            &self,
            token: &str,
            new_task: &NewTask,
            _ext_cxn: &impl ExternalConnectivity,
        ) -> Result<(), DrivenPortError> {
            let mut api = self.write().expect("task api rw lock poisoned");
            api.record_call(token)?;

            api.highest_task_id += 1;
            let task_id = api.highest_task_id;
            api.tasks.push(Task {
                id: task_id,
                owner_user_id: 1,
                title: new_task.title.clone(),
                description: new_task.description.clone(),
                status: TaskStatus::Pending,
                priority: new_task.priority,
                labels: Vec::new(),
                reminder_time: new_task.reminder_time,
                recurrence: new_task.recurrence.clone(),
                subtasks: Vec::new(),
                created_at: fixed_instant(),
            });
            Ok(())
        }

        async fn update_task_status(
            &self,
            token: &str,
            task_id: i64,
            status: TaskStatus,
            _ext_cxn: &impl ExternalConnectivity,
        ) -> Result<(), DrivenPortError> {
            let mut api = self.write().expect("task api rw lock poisoned");
            api.record_call(token)?;

            api.task_mut(task_id)?.status = status;
            Ok(())
        }

        async fn delete_task(
            &self,
            token: &str,
            task_id: i64,
            _ext_cxn: &impl ExternalConnectivity,
        ) -> Result<(), DrivenPortError> {
            let mut api = self.write().expect("task api rw lock poisoned");
            api.record_call(token)?;

            api.tasks.retain(|task| task.id != task_id);
            Ok(())
        }

        async fn create_subtask(
            &self,
            token: &str,
            task_id: i64,
            subtask: &NewSubtask,
            _ext_cxn: &impl ExternalConnectivity,
        ) -> Result<(), DrivenPortError> {
            let mut api = self.write().expect("task api rw lock poisoned");
            api.record_call(token)?;

            api.highest_subtask_id += 1;
            let subtask_id = api.highest_subtask_id;
            api.task_mut(task_id)?.subtasks.push(Subtask {
                id: subtask_id,
                task_id,
                title: subtask.title.clone(),
                is_done: false,
            });
            Ok(())
        }

        async fn toggle_subtask(
            &self,
            token: &str,
            subtask_id: i64,
            _ext_cxn: &impl ExternalConnectivity,
        ) -> Result<(), DrivenPortError> {
            let mut api = self.write().expect("task api rw lock poisoned");
            api.record_call(token)?;

            let subtask = api
                .tasks
                .iter_mut()
                .flat_map(|task| task.subtasks.iter_mut())
                .find(|sub| sub.id == subtask_id)
                .ok_or(DrivenPortError::DoesNotExist)?;
            subtask.is_done = !subtask.is_done;
            Ok(())
        }

        async fn delete_subtask(
            &self,
            token: &str,
            subtask_id: i64,
            _ext_cxn: &impl ExternalConnectivity,
        ) -> Result<(), DrivenPortError> {
            let mut api = self.write().expect("task api rw lock poisoned");
            api.record_call(token)?;

            for task in api.tasks.iter_mut() {
                task.subtasks.retain(|sub| sub.id != subtask_id);
            }
            Ok(())
        }
    }

    pub fn fixed_instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0)
            .single()
            .expect("fixed test instant is valid")
    }

    /// A pending, medium priority task with no reminder
    pub fn task_with_id(id: i64) -> Task {
        Task {
            id,
            owner_user_id: 1,
            title: format!("Task {id}"),
            description: String::new(),
            status: TaskStatus::Pending,
            priority: Priority::Medium,
            labels: Vec::new(),
            reminder_time: None,
            recurrence: Recurrence::Once,
            subtasks: Vec::new(),
            created_at: fixed_instant(),
        }
    }

    pub fn subtask(id: i64, task_id: i64, is_done: bool) -> Subtask {
        Subtask {
            id,
            task_id,
            title: format!("Checklist item {id}"),
            is_done,
        }
    }
}
