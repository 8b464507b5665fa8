use serde::{Deserialize, Serialize};
use serde_json::Value;
use studygroup_domain::messages::Message;

/// Frames a client may send over the gateway socket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientEvent {
    JoinGroup {
        group_id: String,
    },
    LeaveGroup {
        group_id: String,
    },
    SendMessage {
        group_id: String,
        text: String,
    },
    Typing {
        group_id: String,
        is_typing: bool,
    },
    /// Client-originated broadcast hint; the payload is relayed as-is
    /// once membership is re-checked. It is not persisted here, the REST
    /// call that created the resource already did that.
    NewResource {
        group_id: String,
        resource: Value,
    },
    NewTask {
        group_id: String,
        task: Value,
    },
    TaskUpdated {
        group_id: String,
        task: Value,
    },
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::JoinGroup { .. } => "join-group",
            ClientEvent::LeaveGroup { .. } => "leave-group",
            ClientEvent::SendMessage { .. } => "send-message",
            ClientEvent::Typing { .. } => "typing",
            ClientEvent::NewResource { .. } => "new-resource",
            ClientEvent::NewTask { .. } => "new-task",
            ClientEvent::TaskUpdated { .. } => "task-updated",
        }
    }

    pub fn group_id(&self) -> &str {
        match self {
            ClientEvent::JoinGroup { group_id }
            | ClientEvent::LeaveGroup { group_id }
            | ClientEvent::SendMessage { group_id, .. }
            | ClientEvent::Typing { group_id, .. }
            | ClientEvent::NewResource { group_id, .. }
            | ClientEvent::NewTask { group_id, .. }
            | ClientEvent::TaskUpdated { group_id, .. } => group_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OnlineMember {
    pub user_id: String,
    pub display_name: String,
}

/// Frames the gateway pushes to clients, both as direct replies and as
/// room broadcasts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEvent {
    OnlineMembers {
        group_id: String,
        members: Vec<OnlineMember>,
    },
    UserJoined {
        group_id: String,
        user_id: String,
        display_name: String,
    },
    UserLeft {
        group_id: String,
        user_id: String,
    },
    NewMessage {
        message: Message,
    },
    ResourceAdded {
        group_id: String,
        resource: Value,
    },
    TaskAdded {
        group_id: String,
        task: Value,
    },
    TaskStatusChanged {
        group_id: String,
        task: Value,
    },
    UserTyping {
        group_id: String,
        user_id: String,
        display_name: String,
        is_typing: bool,
    },
    Error {
        group_id: Option<String>,
        message: String,
    },
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::OnlineMembers { .. } => "online-members",
            ServerEvent::UserJoined { .. } => "user-joined",
            ServerEvent::UserLeft { .. } => "user-left",
            ServerEvent::NewMessage { .. } => "new-message",
            ServerEvent::ResourceAdded { .. } => "resource-added",
            ServerEvent::TaskAdded { .. } => "task-added",
            ServerEvent::TaskStatusChanged { .. } => "task-status-changed",
            ServerEvent::UserTyping { .. } => "user-typing",
            ServerEvent::Error { .. } => "error",
        }
    }

    /// Presence echoes a client does not need about itself.
    pub fn suppressed_for(&self, user_id: &str) -> bool {
        match self {
            ServerEvent::UserJoined { user_id: origin, .. }
            | ServerEvent::UserTyping { user_id: origin, .. } => origin == user_id,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_events_deserialize_from_kebab_case_tags() {
        let event: ClientEvent = serde_json::from_value(json!({
            "type": "send-message",
            "group_id": "g1",
            "text": "hi"
        }))
        .expect("event");
        assert!(matches!(event, ClientEvent::SendMessage { .. }));
        assert_eq!(event.name(), "send-message");
        assert_eq!(event.group_id(), "g1");
    }

    #[test]
    fn unknown_client_event_tag_is_rejected() {
        let parsed = serde_json::from_value::<ClientEvent>(json!({
            "type": "self-destruct",
            "group_id": "g1"
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn server_events_serialize_with_type_tag() {
        let event = ServerEvent::UserTyping {
            group_id: "g1".into(),
            user_id: "u1".into(),
            display_name: "Ana".into(),
            is_typing: true,
        };
        let value = serde_json::to_value(&event).expect("json");
        assert_eq!(value["type"], "user-typing");
        assert_eq!(value["user_id"], "u1");
        assert_eq!(value["is_typing"], true);
    }

    #[test]
    fn presence_echoes_are_suppressed_for_their_origin_only() {
        let typing = ServerEvent::UserTyping {
            group_id: "g1".into(),
            user_id: "u1".into(),
            display_name: "Ana".into(),
            is_typing: true,
        };
        assert!(typing.suppressed_for("u1"));
        assert!(!typing.suppressed_for("u2"));

        let message = ServerEvent::NewMessage {
            message: studygroup_domain::messages::Message {
                message_id: "m1".into(),
                group_id: "g1".into(),
                sender_id: "u1".into(),
                text: "hi".into(),
                created_at_ms: 1,
            },
        };
        assert!(!message.suppressed_for("u1"));
    }
}
