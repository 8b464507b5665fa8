use studygroup_domain::identity::ActorIdentity;

use super::events::{ClientEvent, ServerEvent};
use crate::error::ApiError;
use crate::observability;
use crate::state::AppState;

/// What the socket loop should do after one client frame: deliver the
/// direct replies, then adjust this connection's room subscriptions.
#[derive(Default)]
pub struct SessionReply {
    pub direct: Vec<ServerEvent>,
    pub subscribe: Option<String>,
    pub unsubscribe: Option<String>,
}

impl SessionReply {
    fn error(group_id: &str, err: ApiError) -> Self {
        Self {
            direct: vec![ServerEvent::Error {
                group_id: Some(group_id.to_string()),
                message: err.to_string(),
            }],
            ..Self::default()
        }
    }
}

/// One authenticated gateway connection. Everything here is plain async
/// logic over the shared state so it can be exercised without a socket.
pub struct Session {
    state: AppState,
    actor: ActorIdentity,
    connection_id: String,
}

impl Session {
    pub fn new(state: AppState, actor: ActorIdentity, connection_id: String) -> Self {
        Self {
            state,
            actor,
            connection_id,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.actor.user_id
    }

    /// Announces this connection, and closes out any rooms a replaced
    /// connection of the same user was still in.
    pub async fn announce_connect(&self) {
        let replaced_rooms = self.state.presence.connect(
            &self.actor.user_id,
            &self.actor.display_name,
            &self.connection_id,
        );
        for group_id in replaced_rooms {
            self.publish_user_left(&group_id).await;
        }
    }

    pub async fn handle_event(&self, event: ClientEvent) -> SessionReply {
        observability::register_gateway_event(event.name(), "in");
        match event {
            ClientEvent::JoinGroup { group_id } => self.join_group(group_id).await,
            ClientEvent::LeaveGroup { group_id } => self.leave_group(group_id).await,
            ClientEvent::SendMessage { group_id, text } => {
                self.send_message(group_id, text).await
            }
            ClientEvent::Typing { group_id, is_typing } => {
                self.typing(group_id, is_typing).await
            }
            ClientEvent::NewResource { group_id, resource } => {
                self.rebroadcast(group_id, |group_id| ServerEvent::ResourceAdded {
                    group_id,
                    resource,
                })
                .await
            }
            ClientEvent::NewTask { group_id, task } => {
                self.rebroadcast(group_id, |group_id| ServerEvent::TaskAdded {
                    group_id,
                    task,
                })
                .await
            }
            ClientEvent::TaskUpdated { group_id, task } => {
                self.rebroadcast(group_id, |group_id| ServerEvent::TaskStatusChanged {
                    group_id,
                    task,
                })
                .await
            }
        }
    }

    async fn join_group(&self, group_id: String) -> SessionReply {
        if let Err(err) = self
            .state
            .groups
            .ensure_member(&group_id, &self.actor.user_id)
            .await
        {
            return SessionReply::error(&group_id, err.into());
        }
        if !self
            .state
            .presence
            .join_room(&self.actor.user_id, &self.connection_id, &group_id)
        {
            // already in the room, or this socket was replaced
            return SessionReply::default();
        }

        self.publish(
            &group_id,
            ServerEvent::UserJoined {
                group_id: group_id.clone(),
                user_id: self.actor.user_id.clone(),
                display_name: self.actor.display_name.clone(),
            },
        )
        .await;

        let members = self.state.presence.online_in(&group_id);
        SessionReply {
            direct: vec![ServerEvent::OnlineMembers {
                group_id: group_id.clone(),
                members,
            }],
            subscribe: Some(group_id),
            unsubscribe: None,
        }
    }

    async fn leave_group(&self, group_id: String) -> SessionReply {
        let was_in_room =
            self.state
                .presence
                .leave_room(&self.actor.user_id, &self.connection_id, &group_id);
        if was_in_room {
            self.publish_user_left(&group_id).await;
        }
        SessionReply {
            direct: Vec::new(),
            subscribe: None,
            unsubscribe: Some(group_id),
        }
    }

    /// Persist first, broadcast second; any message a subscriber sees is
    /// already in history.
    async fn send_message(&self, group_id: String, text: String) -> SessionReply {
        match self.state.messages.send(&self.actor, &group_id, &text).await {
            Ok(message) => {
                self.publish(&group_id, ServerEvent::NewMessage { message })
                    .await;
                SessionReply::default()
            }
            Err(err) => SessionReply::error(&group_id, err.into()),
        }
    }

    /// Ephemeral and advisory; gated on room subscription only, which a
    /// join already authorized.
    async fn typing(&self, group_id: String, is_typing: bool) -> SessionReply {
        if !self
            .state
            .presence
            .in_room(&self.actor.user_id, &self.connection_id, &group_id)
        {
            return SessionReply::error(&group_id, ApiError::Forbidden);
        }
        self.publish(
            &group_id,
            ServerEvent::UserTyping {
                group_id: group_id.clone(),
                user_id: self.actor.user_id.clone(),
                display_name: self.actor.display_name.clone(),
                is_typing,
            },
        )
        .await;
        SessionReply::default()
    }

    /// Relay policy for client-originated hints: the payload goes out
    /// verbatim, but only after membership is re-checked against the
    /// store. The gateway never interprets or persists these payloads.
    async fn rebroadcast<F>(&self, group_id: String, build: F) -> SessionReply
    where
        F: FnOnce(String) -> ServerEvent,
    {
        if let Err(err) = self
            .state
            .groups
            .ensure_member(&group_id, &self.actor.user_id)
            .await
        {
            return SessionReply::error(&group_id, err.into());
        }
        let event = build(group_id.clone());
        self.publish(&group_id, event).await;
        SessionReply::default()
    }

    /// Socket teardown. Ignored if a newer connection took over.
    pub async fn teardown(&self) {
        let rooms = self
            .state
            .presence
            .disconnect(&self.actor.user_id, &self.connection_id);
        for group_id in rooms {
            self.publish_user_left(&group_id).await;
        }
    }

    async fn publish_user_left(&self, group_id: &str) {
        self.publish(
            group_id,
            ServerEvent::UserLeft {
                group_id: group_id.to_string(),
                user_id: self.actor.user_id.clone(),
            },
        )
        .await;
    }

    async fn publish(&self, group_id: &str, event: ServerEvent) {
        observability::register_gateway_event(event.name(), "out");
        self.state.rooms.publish(group_id, event).await;
    }
}
