//! Shared in-memory fixtures for service tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::DomainResult;
use crate::error::DomainError;
use crate::files::FileAttachment;
use crate::groups::{Group, GroupService, GroupStores};
use crate::identity::ActorIdentity;
use crate::invite::InviteCodec;
use crate::messages::Message;
use crate::polls::Poll;
use crate::ports::BoxFuture;
use crate::ports::files::{FileRepository, FileStore};
use crate::ports::groups::GroupRepository;
use crate::ports::messages::MessageRepository;
use crate::ports::polls::PollRepository;
use crate::ports::resources::ResourceRepository;
use crate::ports::tasks::TaskRepository;
use crate::resources::Resource;
use crate::tasks::Task;

#[derive(Default)]
struct InMemoryGroups {
    groups: Mutex<HashMap<String, Group>>,
}

impl GroupRepository for InMemoryGroups {
    fn create_group(&self, group: &Group) -> BoxFuture<'_, DomainResult<Group>> {
        let group = group.clone();
        Box::pin(async move {
            let mut groups = self.groups.lock().unwrap();
            if groups.contains_key(&group.group_id) {
                return Err(DomainError::Conflict);
            }
            groups.insert(group.group_id.clone(), group.clone());
            Ok(group)
        })
    }

    fn get_group(&self, group_id: &str) -> BoxFuture<'_, DomainResult<Option<Group>>> {
        let group_id = group_id.to_string();
        Box::pin(async move { Ok(self.groups.lock().unwrap().get(&group_id).cloned()) })
    }

    fn get_group_by_join_code(
        &self,
        join_code: &str,
    ) -> BoxFuture<'_, DomainResult<Option<Group>>> {
        let join_code = join_code.to_string();
        Box::pin(async move {
            Ok(self
                .groups
                .lock()
                .unwrap()
                .values()
                .find(|group| group.join_code == join_code)
                .cloned())
        })
    }

    fn get_group_by_course(&self, course_id: &str) -> BoxFuture<'_, DomainResult<Option<Group>>> {
        let course_id = course_id.to_string();
        Box::pin(async move {
            Ok(self
                .groups
                .lock()
                .unwrap()
                .values()
                .find(|group| group.course_id.as_deref() == Some(course_id.as_str()))
                .cloned())
        })
    }

    fn join_code_exists(&self, join_code: &str) -> BoxFuture<'_, DomainResult<bool>> {
        let join_code = join_code.to_string();
        Box::pin(async move {
            Ok(self
                .groups
                .lock()
                .unwrap()
                .values()
                .any(|group| group.join_code == join_code))
        })
    }

    fn update_group(&self, group: &Group) -> BoxFuture<'_, DomainResult<Group>> {
        let group = group.clone();
        Box::pin(async move {
            let mut groups = self.groups.lock().unwrap();
            if !groups.contains_key(&group.group_id) {
                return Err(DomainError::NotFound);
            }
            groups.insert(group.group_id.clone(), group.clone());
            Ok(group)
        })
    }

    fn delete_group(&self, group_id: &str) -> BoxFuture<'_, DomainResult<()>> {
        let group_id = group_id.to_string();
        Box::pin(async move {
            self.groups.lock().unwrap().remove(&group_id);
            Ok(())
        })
    }

    fn list_groups_by_user(&self, user_id: &str) -> BoxFuture<'_, DomainResult<Vec<Group>>> {
        let user_id = user_id.to_string();
        Box::pin(async move {
            let mut groups: Vec<Group> = self
                .groups
                .lock()
                .unwrap()
                .values()
                .filter(|group| group.is_member(&user_id))
                .cloned()
                .collect();
            groups.sort_by(|a, b| a.created_at_ms.cmp(&b.created_at_ms));
            Ok(groups)
        })
    }
}

// Messages kept as a flat Vec so insertion order survives timestamp ties.
#[derive(Default)]
struct InMemoryMessages {
    messages: Mutex<Vec<Message>>,
}

impl MessageRepository for InMemoryMessages {
    fn create_message(&self, message: &Message) -> BoxFuture<'_, DomainResult<Message>> {
        let message = message.clone();
        Box::pin(async move {
            self.messages.lock().unwrap().push(message.clone());
            Ok(message)
        })
    }

    fn list_messages(&self, group_id: &str) -> BoxFuture<'_, DomainResult<Vec<Message>>> {
        let group_id = group_id.to_string();
        Box::pin(async move {
            Ok(self
                .messages
                .lock()
                .unwrap()
                .iter()
                .filter(|message| message.group_id == group_id)
                .cloned()
                .collect())
        })
    }

    fn delete_messages_by_group(&self, group_id: &str) -> BoxFuture<'_, DomainResult<()>> {
        let group_id = group_id.to_string();
        Box::pin(async move {
            self.messages
                .lock()
                .unwrap()
                .retain(|message| message.group_id != group_id);
            Ok(())
        })
    }
}

#[derive(Default)]
struct InMemoryResources {
    resources: Mutex<Vec<Resource>>,
}

impl ResourceRepository for InMemoryResources {
    fn create_resource(&self, resource: &Resource) -> BoxFuture<'_, DomainResult<Resource>> {
        let resource = resource.clone();
        Box::pin(async move {
            self.resources.lock().unwrap().push(resource.clone());
            Ok(resource)
        })
    }

    fn list_resources(&self, group_id: &str) -> BoxFuture<'_, DomainResult<Vec<Resource>>> {
        let group_id = group_id.to_string();
        Box::pin(async move {
            Ok(self
                .resources
                .lock()
                .unwrap()
                .iter()
                .filter(|resource| resource.group_id == group_id)
                .cloned()
                .collect())
        })
    }

    fn delete_resources_by_group(&self, group_id: &str) -> BoxFuture<'_, DomainResult<()>> {
        let group_id = group_id.to_string();
        Box::pin(async move {
            self.resources
                .lock()
                .unwrap()
                .retain(|resource| resource.group_id != group_id);
            Ok(())
        })
    }
}

#[derive(Default)]
struct InMemoryTasks {
    tasks: Mutex<Vec<Task>>,
}

impl TaskRepository for InMemoryTasks {
    fn create_task(&self, task: &Task) -> BoxFuture<'_, DomainResult<Task>> {
        let task = task.clone();
        Box::pin(async move {
            self.tasks.lock().unwrap().push(task.clone());
            Ok(task)
        })
    }

    fn get_task(&self, group_id: &str, task_id: &str) -> BoxFuture<'_, DomainResult<Option<Task>>> {
        let group_id = group_id.to_string();
        let task_id = task_id.to_string();
        Box::pin(async move {
            Ok(self
                .tasks
                .lock()
                .unwrap()
                .iter()
                .find(|task| task.group_id == group_id && task.task_id == task_id)
                .cloned())
        })
    }

    fn update_task(&self, task: &Task) -> BoxFuture<'_, DomainResult<Task>> {
        let task = task.clone();
        Box::pin(async move {
            let mut tasks = self.tasks.lock().unwrap();
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
        Box::pin(async move {
            Ok(self
                .tasks
                .lock()
                .unwrap()
                .iter()
                .filter(|task| task.group_id == group_id)
                .cloned()
                .collect())
        })
    }

    fn delete_tasks_by_group(&self, group_id: &str) -> BoxFuture<'_, DomainResult<()>> {
        let group_id = group_id.to_string();
        Box::pin(async move {
            self.tasks
                .lock()
                .unwrap()
                .retain(|task| task.group_id != group_id);
            Ok(())
        })
    }
}

#[derive(Default)]
struct InMemoryPolls {
    polls: Mutex<Vec<Poll>>,
}

impl PollRepository for InMemoryPolls {
    fn create_poll(&self, poll: &Poll) -> BoxFuture<'_, DomainResult<Poll>> {
        let poll = poll.clone();
        Box::pin(async move {
            self.polls.lock().unwrap().push(poll.clone());
            Ok(poll)
        })
    }

    fn get_poll(&self, group_id: &str, poll_id: &str) -> BoxFuture<'_, DomainResult<Option<Poll>>> {
        let group_id = group_id.to_string();
        let poll_id = poll_id.to_string();
        Box::pin(async move {
            Ok(self
                .polls
                .lock()
                .unwrap()
                .iter()
                .find(|poll| poll.group_id == group_id && poll.poll_id == poll_id)
                .cloned())
        })
    }

    fn update_poll(&self, poll: &Poll) -> BoxFuture<'_, DomainResult<Poll>> {
        let poll = poll.clone();
        Box::pin(async move {
            let mut polls = self.polls.lock().unwrap();
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
        Box::pin(async move {
            Ok(self
                .polls
                .lock()
                .unwrap()
                .iter()
                .filter(|poll| poll.group_id == group_id)
                .cloned()
                .collect())
        })
    }

    fn delete_polls_by_group(&self, group_id: &str) -> BoxFuture<'_, DomainResult<()>> {
        let group_id = group_id.to_string();
        Box::pin(async move {
            self.polls
                .lock()
                .unwrap()
                .retain(|poll| poll.group_id != group_id);
            Ok(())
        })
    }
}

#[derive(Default)]
struct InMemoryFiles {
    files: Mutex<Vec<FileAttachment>>,
}

impl FileRepository for InMemoryFiles {
    fn create_file(&self, file: &FileAttachment) -> BoxFuture<'_, DomainResult<FileAttachment>> {
        let file = file.clone();
        Box::pin(async move {
            self.files.lock().unwrap().push(file.clone());
            Ok(file)
        })
    }

    fn list_files(&self, group_id: &str) -> BoxFuture<'_, DomainResult<Vec<FileAttachment>>> {
        let group_id = group_id.to_string();
        Box::pin(async move {
            Ok(self
                .files
                .lock()
                .unwrap()
                .iter()
                .filter(|file| file.group_id == group_id)
                .cloned()
                .collect())
        })
    }

    fn delete_files_by_group(&self, group_id: &str) -> BoxFuture<'_, DomainResult<()>> {
        let group_id = group_id.to_string();
        Box::pin(async move {
            self.files
                .lock()
                .unwrap()
                .retain(|file| file.group_id != group_id);
            Ok(())
        })
    }
}

/// Records puts and deletes without touching a filesystem.
#[derive(Default)]
struct RecordingFileStore {
    paths: Mutex<Vec<String>>,
}

impl FileStore for RecordingFileStore {
    fn put(&self, stored_name: &str, _bytes: Vec<u8>) -> BoxFuture<'_, DomainResult<String>> {
        let path = format!("mem://{stored_name}");
        Box::pin(async move {
            self.paths.lock().unwrap().push(path.clone());
            Ok(path)
        })
    }

    fn delete(&self, path: &str) -> BoxFuture<'_, DomainResult<()>> {
        let path = path.to_string();
        Box::pin(async move {
            self.paths.lock().unwrap().retain(|kept| kept != &path);
            Ok(())
        })
    }
}

pub(crate) struct TestStores {
    groups: Arc<InMemoryGroups>,
    messages: Arc<InMemoryMessages>,
    resources: Arc<InMemoryResources>,
    tasks: Arc<InMemoryTasks>,
    polls: Arc<InMemoryPolls>,
    files: Arc<InMemoryFiles>,
    file_store: Arc<RecordingFileStore>,
}

impl TestStores {
    pub(crate) fn new() -> Self {
        Self {
            groups: Arc::new(InMemoryGroups::default()),
            messages: Arc::new(InMemoryMessages::default()),
            resources: Arc::new(InMemoryResources::default()),
            tasks: Arc::new(InMemoryTasks::default()),
            polls: Arc::new(InMemoryPolls::default()),
            files: Arc::new(InMemoryFiles::default()),
            file_store: Arc::new(RecordingFileStore::default()),
        }
    }

    pub(crate) fn groups(&self) -> Arc<dyn GroupRepository> {
        self.groups.clone()
    }

    pub(crate) fn messages(&self) -> Arc<dyn MessageRepository> {
        self.messages.clone()
    }

    pub(crate) fn resources(&self) -> Arc<dyn ResourceRepository> {
        self.resources.clone()
    }

    pub(crate) fn tasks(&self) -> Arc<dyn TaskRepository> {
        self.tasks.clone()
    }

    pub(crate) fn polls(&self) -> Arc<dyn PollRepository> {
        self.polls.clone()
    }

    pub(crate) fn files(&self) -> Arc<dyn FileRepository> {
        self.files.clone()
    }

    pub(crate) fn file_store(&self) -> Arc<dyn FileStore> {
        self.file_store.clone()
    }

    pub(crate) fn stored_paths(&self) -> Vec<String> {
        self.file_store.paths.lock().unwrap().clone()
    }

    pub(crate) fn group_service(&self) -> GroupService {
        let stores = GroupStores {
            groups: self.groups(),
            messages: self.messages(),
            resources: self.resources(),
            tasks: self.tasks(),
            polls: self.polls(),
            files: self.files(),
            file_store: self.file_store(),
        };
        let codec = InviteCodec::new(self.groups(), "test-secret", 7, 20);
        GroupService::new(stores, codec)
    }

    pub(crate) async fn seed_group(&self, owner: &ActorIdentity, peers: &[&ActorIdentity]) -> Group {
        let service = self.group_service();
        let group = service
            .create_group(owner, "seeded group", "")
            .await
            .expect("seed group");
        for peer in peers {
            service
                .join_group(peer, Some(group.join_code.clone()), None)
                .await
                .expect("seed join");
        }
        service
            .get_group(owner, &group.group_id)
            .await
            .expect("seeded group readback")
    }
}
