use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::error::DomainError;
use crate::groups::ensure_member;
use crate::identity::ActorIdentity;
use crate::ports::groups::GroupRepository;
use crate::ports::messages::MessageRepository;
use crate::util::{now_ms, uuid_v7_without_dashes};

pub const MAX_MESSAGE_LENGTH: usize = 2_000;

/// Immutable once created; append-only per group.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub message_id: String,
    pub group_id: String,
    pub sender_id: String,
    pub text: String,
    pub created_at_ms: i64,
}

#[derive(Clone)]
pub struct MessageService {
    groups: Arc<dyn GroupRepository>,
    messages: Arc<dyn MessageRepository>,
}

impl MessageService {
    pub fn new(groups: Arc<dyn GroupRepository>, messages: Arc<dyn MessageRepository>) -> Self {
        Self { groups, messages }
    }

    /// Persists a message with a server-assigned id and timestamp. The
    /// membership guard runs on every call; senders who left the group a
    /// moment ago are rejected here, not upstream.
    pub async fn send(
        &self,
        actor: &ActorIdentity,
        group_id: &str,
        text: &str,
    ) -> DomainResult<Message> {
        ensure_member(self.groups.as_ref(), group_id, &actor.user_id).await?;

        let text = text.trim();
        validate_message_text(text)?;

        let message = Message {
            message_id: uuid_v7_without_dashes(),
            group_id: group_id.to_string(),
            sender_id: actor.user_id.clone(),
            text: text.to_string(),
            created_at_ms: now_ms(),
        };
        self.messages.create_message(&message).await
    }

    pub async fn history(
        &self,
        actor: &ActorIdentity,
        group_id: &str,
    ) -> DomainResult<Vec<Message>> {
        ensure_member(self.groups.as_ref(), group_id, &actor.user_id).await?;
        self.messages.list_messages(group_id).await
    }
}

pub fn validate_message_text(text: &str) -> DomainResult<()> {
    if text.is_empty() {
        return Err(DomainError::Validation("message text is required".into()));
    }
    if text.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(DomainError::Validation(format!(
            "message text exceeds max length of {MAX_MESSAGE_LENGTH}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestStores;

    #[tokio::test]
    async fn send_assigns_server_side_id_and_timestamp() {
        let stores = TestStores::new();
        let owner = ActorIdentity::with_user_id("owner-1");
        let group = stores.seed_group(&owner, &[]).await;

        let service = MessageService::new(stores.groups(), stores.messages());
        let message = service
            .send(&owner, &group.group_id, "  hello world  ")
            .await
            .expect("message");

        assert_eq!(message.text, "hello world");
        assert_eq!(message.sender_id, "owner-1");
        assert!(!message.message_id.is_empty());
        assert!(message.created_at_ms > 0);
    }

    #[tokio::test]
    async fn non_members_cannot_send_or_read() {
        let stores = TestStores::new();
        let owner = ActorIdentity::with_user_id("owner-1");
        let outsider = ActorIdentity::with_user_id("stranger");
        let group = stores.seed_group(&owner, &[]).await;

        let service = MessageService::new(stores.groups(), stores.messages());
        assert!(matches!(
            service.send(&outsider, &group.group_id, "hi").await,
            Err(DomainError::Forbidden)
        ));
        assert!(matches!(
            service.history(&outsider, &group.group_id).await,
            Err(DomainError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn history_preserves_send_order() {
        let stores = TestStores::new();
        let owner = ActorIdentity::with_user_id("owner-1");
        let peer = ActorIdentity::with_user_id("peer-1");
        let group = stores.seed_group(&owner, &[&peer]).await;

        let service = MessageService::new(stores.groups(), stores.messages());
        let first = service.send(&owner, &group.group_id, "m1").await.unwrap();
        let second = service.send(&peer, &group.group_id, "m2").await.unwrap();

        let history = service.history(&owner, &group.group_id).await.unwrap();
        assert_eq!(
            history.iter().map(|m| m.message_id.as_str()).collect::<Vec<_>>(),
            vec![first.message_id.as_str(), second.message_id.as_str()]
        );
    }

    #[test]
    fn blank_and_oversized_text_are_rejected() {
        assert!(validate_message_text("").is_err());
        assert!(validate_message_text(&"x".repeat(2_001)).is_err());
        assert!(validate_message_text(&"x".repeat(2_000)).is_ok());
    }
}
