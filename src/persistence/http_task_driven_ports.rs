use super::send_checked;
use crate::domain;
use crate::domain::DrivenPortError;
use crate::domain::task::{NewSubtask, NewTask, Task, TaskStatus};
use crate::dto::task::{CreateTaskBody, StatusUpdateBody, SubtaskBody, TaskRecord};
use crate::external_connections::ExternalConnectivity;
use anyhow::Context;
use tracing::debug;

/// Reads and writes tasks through the task API's REST endpoints
pub struct HttpTaskApi {}

impl domain::task::driven_ports::TaskReader for HttpTaskApi {
    #[tracing::instrument(skip_all)]
    async fn fetch_tasks(
        &self,
        token: &str,
        ext_cxn: &impl ExternalConnectivity,
    ) -> Result<Vec<Task>, DrivenPortError> {
        let request = ext_cxn
            .http_client()
            .get(ext_cxn.api_url("/tasks/"))
            .bearer_auth(token);
        let records: Option<Vec<TaskRecord>> = send_checked(request, "fetch tasks")
            .await?
            .json()
            .await
            .context("decoding the task list")?;

        let tasks = records
            .unwrap_or_default()
            .into_iter()
            .map(Task::try_from)
            .collect::<Result<Vec<_>, _>>()
            .context("reading tasks from the API")?;

        debug!("Fetched {} tasks", tasks.len());
        Ok(tasks)
    }
}

impl domain::task::driven_ports::TaskWriter for HttpTaskApi {
    #[tracing::instrument(skip_all)]
    async fn create_task(
        &self,
        token: &str,
        new_task: &NewTask,
        ext_cxn: &impl ExternalConnectivity,
    ) -> Result<(), DrivenPortError> {
        let request = ext_cxn
            .http_client()
            .post(ext_cxn.api_url("/tasks/"))
            .bearer_auth(token)
            .json(&CreateTaskBody::from(new_task));
        send_checked(request, "create a task").await?;

        Ok(())
    }

    #[tracing::instrument(skip(self, token, ext_cxn))]
    async fn update_task_status(
        &self,
        token: &str,
        task_id: i64,
        status: TaskStatus,
        ext_cxn: &impl ExternalConnectivity,
    ) -> Result<(), DrivenPortError> {
        let request = ext_cxn
            .http_client()
            .put(ext_cxn.api_url(&format!("/tasks/{task_id}")))
            .bearer_auth(token)
            .json(&StatusUpdateBody::from(status));
        send_checked(request, "update a task's status").await?;

        Ok(())
    }

    #[tracing::instrument(skip(self, token, ext_cxn))]
    async fn delete_task(
        &self,
        token: &str,
        task_id: i64,
        ext_cxn: &impl ExternalConnectivity,
    ) -> Result<(), DrivenPortError> {
        let request = ext_cxn
            .http_client()
            .delete(ext_cxn.api_url(&format!("/tasks/{task_id}")))
            .bearer_auth(token);
        send_checked(request, "delete a task").await?;

        Ok(())
    }

    #[tracing::instrument(skip(self, token, subtask, ext_cxn))]
    async fn create_subtask(
        &self,
        token: &str,
        task_id: i64,
        subtask: &NewSubtask,
        ext_cxn: &impl ExternalConnectivity,
    ) -> Result<(), DrivenPortError> {
        let request = ext_cxn
            .http_client()
            .post(ext_cxn.api_url(&format!("/tasks/{task_id}/subtasks")))
            .bearer_auth(token)
            .json(&SubtaskBody::from(subtask));
        send_checked(request, "add a checklist item").await?;

        Ok(())
    }

    #[tracing::instrument(skip(self, token, ext_cxn))]
    async fn toggle_subtask(
        &self,
        token: &str,
        subtask_id: i64,
        ext_cxn: &impl ExternalConnectivity,
    ) -> Result<(), DrivenPortError> {
        let request = ext_cxn
            .http_client()
            .put(ext_cxn.api_url(&format!("/subtasks/{subtask_id}")))
            .bearer_auth(token);
        send_checked(request, "toggle a checklist item").await?;

        Ok(())
    }

    #[tracing::instrument(skip(self, token, ext_cxn))]
    async fn delete_subtask(
        &self,
        token: &str,
        subtask_id: i64,
        ext_cxn: &impl ExternalConnectivity,
    ) -> Result<(), DrivenPortError> {
        let request = ext_cxn
            .http_client()
            .delete(ext_cxn.api_url(&format!("/subtasks/{subtask_id}")))
            .bearer_auth(token);
        send_checked(request, "delete a checklist item").await?;

        Ok(())
    }
}
