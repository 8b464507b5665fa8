use crate::DomainResult;
use crate::ports::BoxFuture;
use crate::tasks::Task;

pub trait TaskRepository: Send + Sync {
    fn create_task(&self, task: &Task) -> BoxFuture<'_, DomainResult<Task>>;

    fn get_task(&self, group_id: &str, task_id: &str)
    -> BoxFuture<'_, DomainResult<Option<Task>>>;

    fn update_task(&self, task: &Task) -> BoxFuture<'_, DomainResult<Task>>;

    fn list_tasks(&self, group_id: &str) -> BoxFuture<'_, DomainResult<Vec<Task>>>;

    fn delete_tasks_by_group(&self, group_id: &str) -> BoxFuture<'_, DomainResult<()>>;
}
