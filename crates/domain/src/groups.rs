use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::error::DomainError;
use crate::identity::ActorIdentity;
use crate::invite::InviteCodec;
use crate::ports::files::{FileRepository, FileStore};
use crate::ports::groups::GroupRepository;
use crate::ports::messages::MessageRepository;
use crate::ports::polls::PollRepository;
use crate::ports::resources::ResourceRepository;
use crate::ports::tasks::TaskRepository;
use crate::util::{now_ms, uuid_v7_without_dashes};

const MAX_NAME_LENGTH: usize = 100;
const MAX_DESCRIPTION_LENGTH: usize = 500;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GroupRole {
    Admin,
    Member,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupMember {
    pub user_id: String,
    pub role: GroupRole,
    pub joined_at_ms: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Group {
    pub group_id: String,
    pub name: String,
    pub description: String,
    pub join_code: String,
    pub invite_token: Option<String>,
    pub course_id: Option<String>,
    pub created_by: String,
    pub members: Vec<GroupMember>,
    pub active: bool,
    pub created_at_ms: i64,
}

impl Group {
    pub fn is_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|member| member.user_id == user_id)
    }

    pub fn member_ids(&self) -> Vec<String> {
        self.members
            .iter()
            .map(|member| member.user_id.clone())
            .collect()
    }
}

/// The membership guard. The sole authorization boundary for every
/// group-scoped operation, REST and realtime alike; re-evaluated per
/// call because membership can change between any two calls.
pub async fn ensure_member(
    repository: &dyn GroupRepository,
    group_id: &str,
    user_id: &str,
) -> DomainResult<Group> {
    let group = repository
        .get_group(group_id)
        .await?
        .filter(|group| group.active)
        .ok_or(DomainError::NotFound)?;
    if !group.is_member(user_id) {
        return Err(DomainError::Forbidden);
    }
    Ok(group)
}

/// Every repository the lifecycle service touches during cascading
/// cleanup, bundled so the API state can hand one handle around.
#[derive(Clone)]
pub struct GroupStores {
    pub groups: Arc<dyn GroupRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub resources: Arc<dyn ResourceRepository>,
    pub tasks: Arc<dyn TaskRepository>,
    pub polls: Arc<dyn PollRepository>,
    pub files: Arc<dyn FileRepository>,
    pub file_store: Arc<dyn FileStore>,
}

#[derive(Clone)]
pub struct GroupService {
    stores: GroupStores,
    codec: InviteCodec,
}

impl GroupService {
    pub fn new(stores: GroupStores, codec: InviteCodec) -> Self {
        Self { stores, codec }
    }

    pub async fn create_group(
        &self,
        actor: &ActorIdentity,
        name: &str,
        description: &str,
    ) -> DomainResult<Group> {
        self.create_group_inner(actor, name, description, None).await
    }

    /// One group per course; the course id itself is opaque to this
    /// subsystem.
    pub async fn create_course_group(
        &self,
        actor: &ActorIdentity,
        course_id: &str,
        name: &str,
        description: &str,
    ) -> DomainResult<Group> {
        let course_id = course_id.trim();
        if course_id.is_empty() {
            return Err(DomainError::Validation("course_id is required".into()));
        }
        if self
            .stores
            .groups
            .get_group_by_course(course_id)
            .await?
            .is_some()
        {
            return Err(DomainError::Conflict);
        }
        self.create_group_inner(actor, name, description, Some(course_id.to_string()))
            .await
    }

    async fn create_group_inner(
        &self,
        actor: &ActorIdentity,
        name: &str,
        description: &str,
        course_id: Option<String>,
    ) -> DomainResult<Group> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::Validation("name is required".into()));
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(DomainError::Validation(format!(
                "name exceeds max length of {MAX_NAME_LENGTH}"
            )));
        }
        let description = description.trim();
        if description.chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err(DomainError::Validation(format!(
                "description exceeds max length of {MAX_DESCRIPTION_LENGTH}"
            )));
        }

        let group_id = uuid_v7_without_dashes();
        let join_code = self.codec.generate_join_code().await?;
        let invite_token = self.codec.issue_invite_token(&group_id)?;
        let now = now_ms();

        let group = Group {
            group_id,
            name: name.to_string(),
            description: description.to_string(),
            join_code,
            invite_token: Some(invite_token),
            course_id,
            created_by: actor.user_id.clone(),
            members: vec![GroupMember {
                user_id: actor.user_id.clone(),
                role: GroupRole::Admin,
                joined_at_ms: now,
            }],
            active: true,
            created_at_ms: now,
        };
        self.stores.groups.create_group(&group).await
    }

    /// Join by exactly one of join code or invite token. Idempotent for
    /// existing members. A verified token may outlive its group, so the
    /// group is re-resolved after verification.
    pub async fn join_group(
        &self,
        actor: &ActorIdentity,
        join_code: Option<String>,
        invite_token: Option<String>,
    ) -> DomainResult<Group> {
        let group = match (join_code, invite_token) {
            (Some(code), None) => {
                let code = code.trim().to_uppercase();
                self.stores
                    .groups
                    .get_group_by_join_code(&code)
                    .await?
                    .ok_or(DomainError::NotFound)?
            }
            (None, Some(token)) => {
                let group_id = self.codec.verify_invite_token(token.trim())?;
                self.stores
                    .groups
                    .get_group(&group_id)
                    .await?
                    .ok_or(DomainError::NotFound)?
            }
            _ => {
                return Err(DomainError::Validation(
                    "provide exactly one of join_code or invite_token".into(),
                ));
            }
        };
        self.add_member_if_absent(group, actor).await
    }

    pub async fn join_course_group(
        &self,
        actor: &ActorIdentity,
        course_id: &str,
    ) -> DomainResult<Group> {
        let group = self
            .stores
            .groups
            .get_group_by_course(course_id.trim())
            .await?
            .ok_or(DomainError::NotFound)?;
        self.add_member_if_absent(group, actor).await
    }

    pub async fn get_course_group_by_course(&self, course_id: &str) -> DomainResult<Group> {
        self.stores
            .groups
            .get_group_by_course(course_id.trim())
            .await?
            .ok_or(DomainError::NotFound)
    }

    async fn add_member_if_absent(
        &self,
        mut group: Group,
        actor: &ActorIdentity,
    ) -> DomainResult<Group> {
        if group.is_member(&actor.user_id) {
            return Ok(group);
        }
        group.members.push(GroupMember {
            user_id: actor.user_id.clone(),
            role: GroupRole::Member,
            joined_at_ms: now_ms(),
        });
        self.stores.groups.update_group(&group).await
    }

    /// The owner's membership is not self-service removable while other
    /// members remain; a sole owner leaving is equivalent to deleting
    /// the group. An empty member set never persists.
    pub async fn leave_group(&self, actor: &ActorIdentity, group_id: &str) -> DomainResult<()> {
        let mut group = self
            .stores
            .groups
            .get_group(group_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        if !group.is_member(&actor.user_id) {
            return Err(DomainError::Forbidden);
        }
        if actor.user_id == group.created_by && group.members.len() > 1 {
            return Err(DomainError::OwnerCannotLeave);
        }

        group.members.retain(|member| member.user_id != actor.user_id);
        if group.members.is_empty() {
            return self.cascade_delete(&group).await;
        }
        self.stores.groups.update_group(&group).await?;
        Ok(())
    }

    pub async fn delete_group(&self, actor: &ActorIdentity, group_id: &str) -> DomainResult<()> {
        let group = self
            .stores
            .groups
            .get_group(group_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        if actor.user_id != group.created_by {
            return Err(DomainError::Forbidden);
        }
        self.cascade_delete(&group).await
    }

    pub async fn list_groups_by_user(&self, user_id: &str) -> DomainResult<Vec<Group>> {
        self.stores.groups.list_groups_by_user(user_id).await
    }

    pub async fn get_group(&self, actor: &ActorIdentity, group_id: &str) -> DomainResult<Group> {
        ensure_member(self.stores.groups.as_ref(), group_id, &actor.user_id).await
    }

    pub async fn ensure_member(&self, group_id: &str, user_id: &str) -> DomainResult<Group> {
        ensure_member(self.stores.groups.as_ref(), group_id, user_id).await
    }

    /// Removes everything scoped to the group, then the group itself.
    /// A storage failure for one file's bytes is logged and skipped so a
    /// single storage hiccup cannot leave the group undeletable.
    async fn cascade_delete(&self, group: &Group) -> DomainResult<()> {
        let attachments = self.stores.files.list_files(&group.group_id).await?;
        for attachment in &attachments {
            if let Err(err) = self.stores.file_store.delete(&attachment.path).await {
                tracing::warn!(
                    group_id = %group.group_id,
                    path = %attachment.path,
                    error = %err,
                    "failed to delete file bytes during group cleanup"
                );
            }
        }
        self.stores.files.delete_files_by_group(&group.group_id).await?;
        self.stores
            .messages
            .delete_messages_by_group(&group.group_id)
            .await?;
        self.stores
            .resources
            .delete_resources_by_group(&group.group_id)
            .await?;
        self.stores.tasks.delete_tasks_by_group(&group.group_id).await?;
        self.stores.polls.delete_polls_by_group(&group.group_id).await?;
        self.stores.groups.delete_group(&group.group_id).await?;
        tracing::info!(group_id = %group.group_id, "group deleted with cascading cleanup");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::MessageService;
    use crate::testing::TestStores;

    #[tokio::test]
    async fn create_group_seeds_owner_as_admin_with_join_code() {
        let stores = TestStores::new();
        let owner = ActorIdentity::with_user_id("owner-1");
        let service = stores.group_service();

        let group = service
            .create_group(&owner, "Algo Study", "weekly practice")
            .await
            .expect("group");

        assert_eq!(group.join_code.len(), 6);
        assert_eq!(group.members.len(), 1);
        assert_eq!(group.members[0].role, GroupRole::Admin);
        assert_eq!(group.created_by, "owner-1");
        assert!(group.invite_token.is_some());
    }

    #[tokio::test]
    async fn create_group_requires_a_name() {
        let stores = TestStores::new();
        let owner = ActorIdentity::with_user_id("owner-1");
        let service = stores.group_service();
        assert!(matches!(
            service.create_group(&owner, "   ", "").await,
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn join_codes_are_unique_across_many_groups() {
        let stores = TestStores::new();
        let service = stores.group_service();

        let mut codes = std::collections::HashSet::new();
        for i in 0..1_000 {
            let owner = ActorIdentity::with_user_id(format!("owner-{i}"));
            let group = service
                .create_group(&owner, format!("group {i}").as_str(), "")
                .await
                .expect("group");
            assert!(codes.insert(group.join_code), "duplicate join code");
        }
    }

    #[tokio::test]
    async fn join_by_code_is_idempotent() {
        let stores = TestStores::new();
        let owner = ActorIdentity::with_user_id("owner-1");
        let joiner = ActorIdentity::with_user_id("joiner-1");
        let service = stores.group_service();

        let group = service.create_group(&owner, "g", "").await.expect("group");
        let joined = service
            .join_group(&joiner, Some(group.join_code.clone()), None)
            .await
            .expect("join");
        assert_eq!(joined.members.len(), 2);

        let again = service
            .join_group(&joiner, Some(group.join_code.clone()), None)
            .await
            .expect("rejoin");
        assert_eq!(again.members.len(), 2);
    }

    #[tokio::test]
    async fn join_requires_exactly_one_identifier() {
        let stores = TestStores::new();
        let actor = ActorIdentity::with_user_id("u-1");
        let service = stores.group_service();

        assert!(matches!(
            service.join_group(&actor, None, None).await,
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            service
                .join_group(&actor, Some("ABC123".into()), Some("tok".into()))
                .await,
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn join_by_invite_token_resolves_the_group() {
        let stores = TestStores::new();
        let owner = ActorIdentity::with_user_id("owner-1");
        let joiner = ActorIdentity::with_user_id("joiner-1");
        let service = stores.group_service();

        let group = service.create_group(&owner, "g", "").await.expect("group");
        let token = group.invite_token.clone().expect("token");
        let joined = service
            .join_group(&joiner, None, Some(token))
            .await
            .expect("join");
        assert_eq!(joined.group_id, group.group_id);
        assert!(joined.is_member("joiner-1"));
    }

    #[tokio::test]
    async fn invite_token_outliving_its_group_is_not_found() {
        let stores = TestStores::new();
        let owner = ActorIdentity::with_user_id("owner-1");
        let joiner = ActorIdentity::with_user_id("joiner-1");
        let service = stores.group_service();

        let group = service.create_group(&owner, "g", "").await.expect("group");
        let token = group.invite_token.clone().expect("token");
        service
            .delete_group(&owner, &group.group_id)
            .await
            .expect("delete");

        assert!(matches!(
            service.join_group(&joiner, None, Some(token)).await,
            Err(DomainError::NotFound)
        ));
    }

    #[tokio::test]
    async fn owner_cannot_leave_while_others_remain() {
        let stores = TestStores::new();
        let owner = ActorIdentity::with_user_id("owner-1");
        let joiner = ActorIdentity::with_user_id("joiner-1");
        let service = stores.group_service();

        let group = service.create_group(&owner, "g", "").await.expect("group");
        service
            .join_group(&joiner, Some(group.join_code.clone()), None)
            .await
            .expect("join");

        assert!(matches!(
            service.leave_group(&owner, &group.group_id).await,
            Err(DomainError::OwnerCannotLeave)
        ));
    }

    #[tokio::test]
    async fn last_member_leaving_cascades_the_group_away() {
        let stores = TestStores::new();
        let owner = ActorIdentity::with_user_id("owner-1");
        let service = stores.group_service();

        let group = service.create_group(&owner, "g", "").await.expect("group");
        let messages = MessageService::new(stores.groups(), stores.messages());
        messages
            .send(&owner, &group.group_id, "goodbye")
            .await
            .expect("message");

        service
            .leave_group(&owner, &group.group_id)
            .await
            .expect("leave");

        assert!(matches!(
            service.get_group(&owner, &group.group_id).await,
            Err(DomainError::NotFound)
        ));
        assert!(matches!(
            messages.history(&owner, &group.group_id).await,
            Err(DomainError::NotFound)
        ));
    }

    #[tokio::test]
    async fn delete_is_owner_only_and_removes_dependents() {
        let stores = TestStores::new();
        let owner = ActorIdentity::with_user_id("owner-1");
        let joiner = ActorIdentity::with_user_id("joiner-1");
        let service = stores.group_service();

        let group = service.create_group(&owner, "g", "").await.expect("group");
        service
            .join_group(&joiner, Some(group.join_code.clone()), None)
            .await
            .expect("join");

        assert!(matches!(
            service.delete_group(&joiner, &group.group_id).await,
            Err(DomainError::Forbidden)
        ));

        let file_service = crate::files::FileService::new(
            stores.groups(),
            stores.files(),
            stores.file_store(),
            crate::files::MAX_UPLOAD_BYTES,
        );
        file_service
            .store(&owner, &group.group_id, "a.txt", "text/plain", vec![1])
            .await
            .expect("file");
        assert_eq!(stores.stored_paths().len(), 1);

        service
            .delete_group(&owner, &group.group_id)
            .await
            .expect("delete");
        assert!(stores.stored_paths().is_empty());
        assert!(matches!(
            service.get_group(&owner, &group.group_id).await,
            Err(DomainError::NotFound)
        ));
    }

    #[tokio::test]
    async fn member_leave_keeps_group_alive() {
        let stores = TestStores::new();
        let owner = ActorIdentity::with_user_id("owner-1");
        let joiner = ActorIdentity::with_user_id("joiner-1");
        let service = stores.group_service();

        let group = service.create_group(&owner, "g", "").await.expect("group");
        service
            .join_group(&joiner, Some(group.join_code.clone()), None)
            .await
            .expect("join");
        service
            .leave_group(&joiner, &group.group_id)
            .await
            .expect("leave");

        let remaining = service.get_group(&owner, &group.group_id).await.unwrap();
        assert_eq!(remaining.members.len(), 1);
        assert!(matches!(
            service.get_group(&joiner, &group.group_id).await,
            Err(DomainError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn course_groups_resolve_and_join_by_course_id() {
        let stores = TestStores::new();
        let owner = ActorIdentity::with_user_id("owner-1");
        let student = ActorIdentity::with_user_id("student-1");
        let service = stores.group_service();

        let group = service
            .create_course_group(&owner, "course-7", "Rust 101", "")
            .await
            .expect("group");
        assert_eq!(group.course_id.as_deref(), Some("course-7"));

        assert!(matches!(
            service.create_course_group(&owner, "course-7", "dup", "").await,
            Err(DomainError::Conflict)
        ));

        let resolved = service
            .get_course_group_by_course("course-7")
            .await
            .expect("resolved");
        assert_eq!(resolved.group_id, group.group_id);

        let joined = service
            .join_course_group(&student, "course-7")
            .await
            .expect("join");
        assert!(joined.is_member("student-1"));
    }
}
