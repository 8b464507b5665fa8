use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::error::DomainError;
use crate::groups::ensure_member;
use crate::identity::ActorIdentity;
use crate::ports::groups::GroupRepository;
use crate::ports::tasks::TaskRepository;
use crate::util::{now_ms, uuid_v7_without_dashes};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub task_id: String,
    pub group_id: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub assignees: Vec<String>,
    pub due_date_ms: Option<i64>,
    pub created_by: String,
    pub created_at_ms: i64,
}

#[derive(Clone, Debug)]
pub struct TaskCreate {
    pub title: String,
    pub description: String,
    pub assignees: Vec<String>,
    pub due_date_ms: Option<i64>,
}

#[derive(Clone)]
pub struct TaskService {
    groups: Arc<dyn GroupRepository>,
    tasks: Arc<dyn TaskRepository>,
}

impl TaskService {
    pub fn new(groups: Arc<dyn GroupRepository>, tasks: Arc<dyn TaskRepository>) -> Self {
        Self { groups, tasks }
    }

    pub async fn add(
        &self,
        actor: &ActorIdentity,
        group_id: &str,
        input: TaskCreate,
    ) -> DomainResult<Task> {
        ensure_member(self.groups.as_ref(), group_id, &actor.user_id).await?;

        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(DomainError::Validation("title is required".into()));
        }
        if title.chars().count() > 200 {
            return Err(DomainError::Validation("title exceeds max length of 200".into()));
        }

        let task = Task {
            task_id: uuid_v7_without_dashes(),
            group_id: group_id.to_string(),
            title,
            description: input.description.trim().to_string(),
            status: TaskStatus::Todo,
            assignees: input.assignees,
            due_date_ms: input.due_date_ms,
            created_by: actor.user_id.clone(),
            created_at_ms: now_ms(),
        };
        self.tasks.create_task(&task).await
    }

    pub async fn list(&self, actor: &ActorIdentity, group_id: &str) -> DomainResult<Vec<Task>> {
        ensure_member(self.groups.as_ref(), group_id, &actor.user_id).await?;
        self.tasks.list_tasks(group_id).await
    }

    pub async fn update_status(
        &self,
        actor: &ActorIdentity,
        group_id: &str,
        task_id: &str,
        status: TaskStatus,
    ) -> DomainResult<Task> {
        ensure_member(self.groups.as_ref(), group_id, &actor.user_id).await?;
        let mut task = self
            .tasks
            .get_task(group_id, task_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        task.status = status;
        self.tasks.update_task(&task).await
    }
}
