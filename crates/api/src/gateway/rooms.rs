use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};

use super::events::ServerEvent;

/// One broadcast channel per group room, created lazily on the first
/// subscriber. Slow consumers observe `Lagged` rather than applying
/// backpressure to publishers.
#[derive(Clone)]
pub struct RoomHub {
    capacity: usize,
    rooms: Arc<RwLock<HashMap<String, broadcast::Sender<ServerEvent>>>>,
}

impl RoomHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            rooms: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn subscribe(&self, group_id: &str) -> broadcast::Receiver<ServerEvent> {
        if let Some(sender) = self.rooms.read().await.get(group_id) {
            return sender.subscribe();
        }
        let mut rooms = self.rooms.write().await;
        rooms
            .entry(group_id.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Fire-and-forget; a room with no listeners is dropped on the spot.
    pub async fn publish(&self, group_id: &str, event: ServerEvent) {
        let delivered = {
            let rooms = self.rooms.read().await;
            match rooms.get(group_id) {
                Some(sender) => sender.send(event).is_ok(),
                None => return,
            }
        };
        if !delivered {
            let mut rooms = self.rooms.write().await;
            if let Some(sender) = rooms.get(group_id) {
                if sender.receiver_count() == 0 {
                    rooms.remove(group_id);
                }
            }
        }
    }

    #[cfg(test)]
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}
