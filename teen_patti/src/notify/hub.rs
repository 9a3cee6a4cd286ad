//! In-process notification hub.
//!
//! Holds one bounded queue per connected user and the set of users that
//! follow each room. A push connection calls [`ChannelHub::connect`] and
//! drains the returned receiver.

use super::{NotificationBus, events::RoomEvent};
use crate::room::{RoomId, UserId};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};

/// Default per-user queue depth
pub const DEFAULT_QUEUE_DEPTH: usize = 64;

pub struct ChannelHub {
    users: RwLock<HashMap<UserId, mpsc::Sender<Arc<RoomEvent>>>>,
    rooms: RwLock<HashMap<RoomId, HashSet<UserId>>>,
    queue_depth: usize,
}

impl Default for ChannelHub {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_DEPTH)
    }
}

impl ChannelHub {
    pub fn new(queue_depth: usize) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            rooms: RwLock::new(HashMap::new()),
            queue_depth: queue_depth.max(1),
        }
    }

    /// Register a push connection for a user, replacing any earlier one.
    pub async fn connect(&self, user_id: UserId) -> mpsc::Receiver<Arc<RoomEvent>> {
        let (sender, receiver) = mpsc::channel(self.queue_depth);
        if self.users.write().await.insert(user_id, sender).is_some() {
            log::debug!("User {} reconnected, replacing previous channel", user_id);
        }
        receiver
    }

    /// Drop a push connection. A newer connection registered for the same
    /// user in the meantime stays in place.
    pub async fn disconnect(&self, user_id: UserId, receiver: mpsc::Receiver<Arc<RoomEvent>>) {
        drop(receiver);
        let mut users = self.users.write().await;
        if users.get(&user_id).is_some_and(|sender| sender.is_closed()) {
            users.remove(&user_id);
        }
    }

    pub async fn is_connected(&self, user_id: UserId) -> bool {
        self.users.read().await.contains_key(&user_id)
    }

    /// Users following a room's channel
    pub async fn channel_members(&self, room_id: RoomId) -> Vec<UserId> {
        let mut members: Vec<UserId> = self
            .rooms
            .read()
            .await
            .get(&room_id)
            .map(|users| users.iter().copied().collect())
            .unwrap_or_default();
        members.sort_unstable();
        members
    }

    async fn deliver(&self, recipients: &[UserId], event: Arc<RoomEvent>) {
        let mut users = self.users.write().await;
        for user_id in recipients {
            let Some(sender) = users.get(user_id) else {
                continue;
            };
            match sender.try_send(event.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    log::warn!(
                        "User {} channel full, dropping {} notification",
                        user_id,
                        event.name()
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    log::debug!("User {} disconnected, removing", user_id);
                    users.remove(user_id);
                }
            }
        }
    }
}

#[async_trait]
impl NotificationBus for ChannelHub {
    async fn send_to_user(&self, user_id: UserId, event: RoomEvent) {
        self.deliver(&[user_id], Arc::new(event)).await;
    }

    async fn send_to_room(&self, room_id: RoomId, event: RoomEvent) {
        let recipients = self.channel_members(room_id).await;
        if recipients.is_empty() {
            return;
        }
        self.deliver(&recipients, Arc::new(event)).await;
    }

    async fn join_channel(&self, user_id: UserId, room_id: RoomId) {
        self.rooms
            .write()
            .await
            .entry(room_id)
            .or_default()
            .insert(user_id);
    }

    async fn leave_channel(&self, user_id: UserId, room_id: RoomId) {
        let mut rooms = self.rooms.write().await;
        if let Some(users) = rooms.get_mut(&room_id) {
            users.remove(&user_id);
            if users.is_empty() {
                rooms.remove(&room_id);
            }
        }
    }
}
