use std::collections::HashMap;
use std::sync::Arc;

use studygroup_domain::DomainResult;
use studygroup_domain::error::DomainError;
use studygroup_domain::files::FileAttachment;
use studygroup_domain::groups::{Group, GroupStores};
use studygroup_domain::messages::Message;
use studygroup_domain::polls::Poll;
use studygroup_domain::ports::BoxFuture;
use studygroup_domain::ports::files::{FileRepository, FileStore};
use studygroup_domain::ports::groups::GroupRepository;
use studygroup_domain::ports::messages::MessageRepository;
use studygroup_domain::ports::polls::PollRepository;
use studygroup_domain::ports::resources::ResourceRepository;
use studygroup_domain::ports::tasks::TaskRepository;
use studygroup_domain::resources::Resource;
use studygroup_domain::tasks::Task;
use tokio::sync::RwLock;

/// Wires every in-memory repository into one bundle for the API state.
pub fn memory_group_stores(file_store: Arc<dyn FileStore>) -> GroupStores {
    GroupStores {
        groups: Arc::new(InMemoryGroupRepository::default()),
        messages: Arc::new(InMemoryMessageRepository::default()),
        resources: Arc::new(InMemoryResourceRepository::default()),
        tasks: Arc::new(InMemoryTaskRepository::default()),
        polls: Arc::new(InMemoryPollRepository::default()),
        files: Arc::new(InMemoryFileRepository::default()),
        file_store,
    }
}

#[derive(Default)]
pub struct InMemoryGroupRepository {
    store: Arc<RwLock<HashMap<String, Group>>>,
}

impl GroupRepository for InMemoryGroupRepository {
    fn create_group(&self, group: &Group) -> BoxFuture<'_, DomainResult<Group>> {
        let group = group.clone();
        let store = self.store.clone();
        Box::pin(async move {
            let mut store = store.write().await;
            if store.contains_key(&group.group_id) {
                return Err(DomainError::Conflict);
            }
            store.insert(group.group_id.clone(), group.clone());
            Ok(group)
        })
    }

    fn get_group(&self, group_id: &str) -> BoxFuture<'_, DomainResult<Option<Group>>> {
        let group_id = group_id.to_string();
        let store = self.store.clone();
        Box::pin(async move { Ok(store.read().await.get(&group_id).cloned()) })
    }

    fn get_group_by_join_code(
        &self,
        join_code: &str,
    ) -> BoxFuture<'_, DomainResult<Option<Group>>> {
        let join_code = join_code.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            Ok(store
                .read()
                .await
                .values()
                .find(|group| group.join_code == join_code)
                .cloned())
        })
    }

    fn get_group_by_course(&self, course_id: &str) -> BoxFuture<'_, DomainResult<Option<Group>>> {
        let course_id = course_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            Ok(store
                .read()
                .await
                .values()
                .find(|group| group.course_id.as_deref() == Some(course_id.as_str()))
                .cloned())
        })
    }

    fn join_code_exists(&self, join_code: &str) -> BoxFuture<'_, DomainResult<bool>> {
        let join_code = join_code.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            Ok(store
                .read()
                .await
                .values()
                .any(|group| group.join_code == join_code))
        })
    }

    fn update_group(&self, group: &Group) -> BoxFuture<'_, DomainResult<Group>> {
        let group = group.clone();
        let store = self.store.clone();
        Box::pin(async move {
            let mut store = store.write().await;
            if !store.contains_key(&group.group_id) {
                return Err(DomainError::NotFound);
            }
            store.insert(group.group_id.clone(), group.clone());
            Ok(group)
        })
    }

    fn delete_group(&self, group_id: &str) -> BoxFuture<'_, DomainResult<()>> {
        let group_id = group_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            store.write().await.remove(&group_id);
            Ok(())
        })
    }

    fn list_groups_by_user(&self, user_id: &str) -> BoxFuture<'_, DomainResult<Vec<Group>>> {
        let user_id = user_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            let mut groups: Vec<Group> = store
                .read()
                .await
                .values()
                .filter(|group| group.is_member(&user_id))
                .cloned()
                .collect();
            groups.sort_by(|a, b| a.created_at_ms.cmp(&b.created_at_ms));
            Ok(groups)
        })
    }
}

/// Per-group append-only logs; listing returns the log as inserted so
/// timestamp ties keep their arrival order.
#[derive(Default)]
pub struct InMemoryMessageRepository {
    store: Arc<RwLock<HashMap<String, Vec<Message>>>>,
}

impl MessageRepository for InMemoryMessageRepository {
    fn create_message(&self, message: &Message) -> BoxFuture<'_, DomainResult<Message>> {
        let message = message.clone();
        let store = self.store.clone();
        Box::pin(async move {
            store
                .write()
                .await
                .entry(message.group_id.clone())
                .or_default()
                .push(message.clone());
            Ok(message)
        })
    }

    fn list_messages(&self, group_id: &str) -> BoxFuture<'_, DomainResult<Vec<Message>>> {
        let group_id = group_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            Ok(store
                .read()
                .await
                .get(&group_id)
                .cloned()
                .unwrap_or_default())
        })
    }

    fn delete_messages_by_group(&self, group_id: &str) -> BoxFuture<'_, DomainResult<()>> {
        let group_id = group_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            store.write().await.remove(&group_id);
            Ok(())
        })
    }
}

#[derive(Default)]
pub struct InMemoryResourceRepository {
    store: Arc<RwLock<HashMap<String, Vec<Resource>>>>,
}

impl ResourceRepository for InMemoryResourceRepository {
    fn create_resource(&self, resource: &Resource) -> BoxFuture<'_, DomainResult<Resource>> {
        let resource = resource.clone();
        let store = self.store.clone();
        Box::pin(async move {
            store
                .write()
                .await
                .entry(resource.group_id.clone())
                .or_default()
                .push(resource.clone());
            Ok(resource)
        })
    }

    fn list_resources(&self, group_id: &str) -> BoxFuture<'_, DomainResult<Vec<Resource>>> {
        let group_id = group_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            Ok(store
                .read()
                .await
                .get(&group_id)
                .cloned()
                .unwrap_or_default())
        })
    }

    fn delete_resources_by_group(&self, group_id: &str) -> BoxFuture<'_, DomainResult<()>> {
        let group_id = group_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            store.write().await.remove(&group_id);
            Ok(())
        })
    }
}

#[derive(Default)]
pub struct InMemoryTaskRepository {
    store: Arc<RwLock<HashMap<String, Vec<Task>>>>,
}

impl TaskRepository for InMemoryTaskRepository {
    fn create_task(&self, task: &Task) -> BoxFuture<'_, DomainResult<Task>> {
        let task = task.clone();
        let store = self.store.clone();
        Box::pin(async move {
            store
                .write()
                .await
                .entry(task.group_id.clone())
                .or_default()
                .push(task.clone());
            Ok(task)
        })
    }

    fn get_task(&self, group_id: &str, task_id: &str) -> BoxFuture<'_, DomainResult<Option<Task>>> {
        let group_id = group_id.to_string();
        let task_id = task_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            Ok(store
                .read()
                .await
                .get(&group_id)
                .and_then(|tasks| tasks.iter().find(|task| task.task_id == task_id))
                .cloned())
        })
    }

    fn update_task(&self, task: &Task) -> BoxFuture<'_, DomainResult<Task>> {
        let task = task.clone();
        let store = self.store.clone();
        Box::pin(async move {
            let mut store = store.write().await;
            let tasks = store.get_mut(&task.group_id).ok_or(DomainError::NotFound)?;
            let slot = tasks
                .iter_mut()
                .find(|existing| existing.task_id == task.task_id)
                .ok_or(DomainError::NotFound)?;
            *slot = task.clone();
            Ok(task)
        })
    }

    fn list_tasks(&self, group_id: &str) -> BoxFuture<'_, DomainResult<Vec<Task>>> {
        let group_id = group_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            Ok(store
                .read()
                .await
                .get(&group_id)
                .cloned()
                .unwrap_or_default())
        })
    }

    fn delete_tasks_by_group(&self, group_id: &str) -> BoxFuture<'_, DomainResult<()>> {
        let group_id = group_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            store.write().await.remove(&group_id);
            Ok(())
        })
    }
}

#[derive(Default)]
pub struct InMemoryPollRepository {
    store: Arc<RwLock<HashMap<String, Vec<Poll>>>>,
}

impl PollRepository for InMemoryPollRepository {
    fn create_poll(&self, poll: &Poll) -> BoxFuture<'_, DomainResult<Poll>> {
        let poll = poll.clone();
        let store = self.store.clone();
        Box::pin(async move {
            store
                .write()
                .await
                .entry(poll.group_id.clone())
                .or_default()
                .push(poll.clone());
            Ok(poll)
        })
    }

    fn get_poll(&self, group_id: &str, poll_id: &str) -> BoxFuture<'_, DomainResult<Option<Poll>>> {
        let group_id = group_id.to_string();
        let poll_id = poll_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            Ok(store
                .read()
                .await
                .get(&group_id)
                .and_then(|polls| polls.iter().find(|poll| poll.poll_id == poll_id))
                .cloned())
        })
    }

    fn update_poll(&self, poll: &Poll) -> BoxFuture<'_, DomainResult<Poll>> {
        let poll = poll.clone();
        let store = self.store.clone();
        Box::pin(async move {
            let mut store = store.write().await;
            let polls = store.get_mut(&poll.group_id).ok_or(DomainError::NotFound)?;
            let slot = polls
                .iter_mut()
                .find(|existing| existing.poll_id == poll.poll_id)
                .ok_or(DomainError::NotFound)?;
            *slot = poll.clone();
            Ok(poll)
        })
    }

    fn list_polls(&self, group_id: &str) -> BoxFuture<'_, DomainResult<Vec<Poll>>> {
        let group_id = group_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            Ok(store
                .read()
                .await
                .get(&group_id)
                .cloned()
                .unwrap_or_default())
        })
    }

    fn delete_polls_by_group(&self, group_id: &str) -> BoxFuture<'_, DomainResult<()>> {
        let group_id = group_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            store.write().await.remove(&group_id);
            Ok(())
        })
    }
}

#[derive(Default)]
pub struct InMemoryFileRepository {
    store: Arc<RwLock<HashMap<String, Vec<FileAttachment>>>>,
}

impl FileRepository for InMemoryFileRepository {
    fn create_file(&self, file: &FileAttachment) -> BoxFuture<'_, DomainResult<FileAttachment>> {
        let file = file.clone();
        let store = self.store.clone();
        Box::pin(async move {
            store
                .write()
                .await
                .entry(file.group_id.clone())
                .or_default()
                .push(file.clone());
            Ok(file)
        })
    }

    fn list_files(&self, group_id: &str) -> BoxFuture<'_, DomainResult<Vec<FileAttachment>>> {
        let group_id = group_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            Ok(store
                .read()
                .await
                .get(&group_id)
                .cloned()
                .unwrap_or_default())
        })
    }

    fn delete_files_by_group(&self, group_id: &str) -> BoxFuture<'_, DomainResult<()>> {
        let group_id = group_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            store.write().await.remove(&group_id);
            Ok(())
        })
    }
}
