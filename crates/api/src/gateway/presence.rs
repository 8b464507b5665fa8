use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use super::events::OnlineMember;

struct PresenceEntry {
    display_name: String,
    connection_id: String,
    rooms: HashSet<String>,
}

/// Tracks which users are connected and which rooms each connection has
/// joined. A user has at most one live entry; a fresh connection replaces
/// the previous one, and teardown of the stale socket is ignored via the
/// connection id check.
#[derive(Default)]
pub struct PresenceRegistry {
    entries: RwLock<HashMap<String, PresenceEntry>>,
}

impl PresenceRegistry {
    /// Returns the rooms the replaced connection was in, if any, so the
    /// gateway can announce the implicit departures.
    pub fn connect(
        &self,
        user_id: &str,
        display_name: &str,
        connection_id: &str,
    ) -> Vec<String> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let previous = entries.insert(
            user_id.to_string(),
            PresenceEntry {
                display_name: display_name.to_string(),
                connection_id: connection_id.to_string(),
                rooms: HashSet::new(),
            },
        );
        previous.map(|entry| entry.rooms.into_iter().collect()).unwrap_or_default()
    }

    pub fn join_room(&self, user_id: &str, connection_id: &str, group_id: &str) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        match entries.get_mut(user_id) {
            Some(entry) if entry.connection_id == connection_id => {
                entry.rooms.insert(group_id.to_string())
            }
            _ => false,
        }
    }

    pub fn in_room(&self, user_id: &str, connection_id: &str, group_id: &str) -> bool {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .get(user_id)
            .map(|entry| entry.connection_id == connection_id && entry.rooms.contains(group_id))
            .unwrap_or(false)
    }

    pub fn leave_room(&self, user_id: &str, connection_id: &str, group_id: &str) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        match entries.get_mut(user_id) {
            Some(entry) if entry.connection_id == connection_id => entry.rooms.remove(group_id),
            _ => false,
        }
    }

    pub fn online_in(&self, group_id: &str) -> Vec<OnlineMember> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let mut members: Vec<OnlineMember> = entries
            .iter()
            .filter(|(_, entry)| entry.rooms.contains(group_id))
            .map(|(user_id, entry)| OnlineMember {
                user_id: user_id.clone(),
                display_name: entry.display_name.clone(),
            })
            .collect();
        members.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        members
    }

    /// Removes the entry only when it still belongs to this connection;
    /// returns the rooms that should see a departure.
    pub fn disconnect(&self, user_id: &str, connection_id: &str) -> Vec<String> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        match entries.get(user_id) {
            Some(entry) if entry.connection_id == connection_id => entries
                .remove(user_id)
                .map(|entry| entry.rooms.into_iter().collect())
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }
}
