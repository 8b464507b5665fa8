use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::error::DomainError;
use crate::groups::ensure_member;
use crate::identity::ActorIdentity;
use crate::ports::groups::GroupRepository;
use crate::ports::resources::ResourceRepository;
use crate::util::{now_ms, uuid_v7_without_dashes};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Resource {
    pub resource_id: String,
    pub group_id: String,
    pub title: String,
    pub url: String,
    pub kind: String,
    pub created_by: String,
    pub created_at_ms: i64,
}

#[derive(Clone, Debug)]
pub struct ResourceCreate {
    pub title: String,
    pub url: String,
    pub kind: String,
}

#[derive(Clone)]
pub struct ResourceService {
    groups: Arc<dyn GroupRepository>,
    resources: Arc<dyn ResourceRepository>,
}

impl ResourceService {
    pub fn new(groups: Arc<dyn GroupRepository>, resources: Arc<dyn ResourceRepository>) -> Self {
        Self { groups, resources }
    }

    pub async fn add(
        &self,
        actor: &ActorIdentity,
        group_id: &str,
        input: ResourceCreate,
    ) -> DomainResult<Resource> {
        ensure_member(self.groups.as_ref(), group_id, &actor.user_id).await?;
        let input = validate_resource_input(input)?;

        let resource = Resource {
            resource_id: uuid_v7_without_dashes(),
            group_id: group_id.to_string(),
            title: input.title,
            url: input.url,
            kind: input.kind,
            created_by: actor.user_id.clone(),
            created_at_ms: now_ms(),
        };
        self.resources.create_resource(&resource).await
    }

    pub async fn list(&self, actor: &ActorIdentity, group_id: &str) -> DomainResult<Vec<Resource>> {
        ensure_member(self.groups.as_ref(), group_id, &actor.user_id).await?;
        self.resources.list_resources(group_id).await
    }
}

fn validate_resource_input(mut input: ResourceCreate) -> DomainResult<ResourceCreate> {
    input.title = input.title.trim().to_string();
    input.url = input.url.trim().to_string();
    input.kind = input.kind.trim().to_lowercase();

    if input.title.is_empty() {
        return Err(DomainError::Validation("title is required".into()));
    }
    if input.title.chars().count() > 200 {
        return Err(DomainError::Validation("title exceeds max length of 200".into()));
    }
    if input.url.is_empty() {
        return Err(DomainError::Validation("url is required".into()));
    }
    if input.kind.is_empty() {
        return Err(DomainError::Validation("kind is required".into()));
    }
    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestStores;

    #[tokio::test]
    async fn add_and_list_for_members_only() {
        let stores = TestStores::new();
        let owner = ActorIdentity::with_user_id("owner-1");
        let outsider = ActorIdentity::with_user_id("stranger");
        let group = stores.seed_group(&owner, &[]).await;

        let service = ResourceService::new(stores.groups(), stores.resources());
        let resource = service
            .add(
                &owner,
                &group.group_id,
                ResourceCreate {
                    title: "Big-O cheatsheet".into(),
                    url: "https://example.com/bigo".into(),
                    kind: "Link".into(),
                },
            )
            .await
            .expect("resource");
        assert_eq!(resource.kind, "link");

        let listed = service.list(&owner, &group.group_id).await.unwrap();
        assert_eq!(listed.len(), 1);

        assert!(matches!(
            service.list(&outsider, &group.group_id).await,
            Err(DomainError::Forbidden)
        ));
    }

    #[test]
    fn resource_input_requires_title_and_url() {
        let err = validate_resource_input(ResourceCreate {
            title: "  ".into(),
            url: "https://example.com".into(),
            kind: "link".into(),
        })
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg == "title is required"));

        assert!(
            validate_resource_input(ResourceCreate {
                title: "t".into(),
                url: "".into(),
                kind: "link".into(),
            })
            .is_err()
        );
    }
}
