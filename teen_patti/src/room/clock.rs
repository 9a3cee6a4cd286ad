//! Per-room start countdowns.
//!
//! Each countdown is a spawned task that publishes one update per tick and
//! then hands the room to a [`CountdownExpiry`]. The registry of running
//! countdowns belongs to the `GameClock` instance.

use super::{config::RoomConfig, models::RoomId};
use crate::notify::{NotificationBus, RoomEvent};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use std::time::Duration;
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{Instant, interval_at},
};

/// Receives rooms whose countdown ran to completion.
#[async_trait]
pub trait CountdownExpiry: Send + Sync + 'static {
    async fn countdown_expired(&self, room_id: RoomId);
}

struct Countdown {
    generation: u64,
    task: JoinHandle<()>,
}

type CountdownMap = Arc<Mutex<HashMap<RoomId, Countdown>>>;

pub struct GameClock {
    countdowns: CountdownMap,
    next_generation: AtomicU64,
    countdown_secs: u32,
    tick: Duration,
    bus: Arc<dyn NotificationBus>,
}

impl GameClock {
    pub fn new(config: &RoomConfig, bus: Arc<dyn NotificationBus>) -> Self {
        Self {
            countdowns: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(1),
            countdown_secs: config.countdown_secs,
            tick: config.tick_interval(),
            bus,
        }
    }

    /// Start a countdown for a room, replacing any countdown already running
    /// for it.
    pub async fn start(&self, room_id: RoomId, on_expiry: Arc<dyn CountdownExpiry>) {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);

        let mut countdowns = self.countdowns.lock().await;
        if let Some(previous) = countdowns.remove(&room_id) {
            previous.task.abort();
            log::debug!("Restarting countdown for room {}", room_id);
        }

        let task = tokio::spawn(run_countdown(
            room_id,
            generation,
            self.countdown_secs,
            self.tick,
            self.countdowns.clone(),
            self.bus.clone(),
            on_expiry,
        ));
        countdowns.insert(room_id, Countdown { generation, task });

        log::info!(
            "Started {} tick countdown for room {}",
            self.countdown_secs,
            room_id
        );
    }

    /// Stop a room's countdown. Returns `false` when none was running,
    /// including when it has already expired.
    pub async fn cancel(&self, room_id: RoomId) -> bool {
        match self.countdowns.lock().await.remove(&room_id) {
            Some(countdown) => {
                countdown.task.abort();
                log::info!("Cancelled countdown for room {}", room_id);
                true
            }
            None => false,
        }
    }

    pub async fn is_running(&self, room_id: RoomId) -> bool {
        self.countdowns.lock().await.contains_key(&room_id)
    }

    pub async fn active_count(&self) -> usize {
        self.countdowns.lock().await.len()
    }

    /// Abort every running countdown
    pub async fn shutdown(&self) {
        let mut countdowns = self.countdowns.lock().await;
        for (_, countdown) in countdowns.drain() {
            countdown.task.abort();
        }
    }
}

async fn run_countdown(
    room_id: RoomId,
    generation: u64,
    countdown_secs: u32,
    tick: Duration,
    countdowns: CountdownMap,
    bus: Arc<dyn NotificationBus>,
    on_expiry: Arc<dyn CountdownExpiry>,
) {
    let mut ticker = interval_at(Instant::now() + tick, tick);

    for seconds_remaining in (1..countdown_secs).rev() {
        ticker.tick().await;
        bus.send_to_room(
            room_id,
            RoomEvent::GameCountdownUpdate {
                room_id,
                seconds_remaining,
            },
        )
        .await;
    }
    ticker.tick().await;

    // Claim the slot before running the game. Once it is gone a cancel is a
    // no-op and cannot interrupt the expiry below.
    {
        let mut countdowns = countdowns.lock().await;
        match countdowns.get(&room_id) {
            Some(current) if current.generation == generation => {
                countdowns.remove(&room_id);
            }
            _ => return,
        }
    }

    log::info!("Countdown expired for room {}", room_id);
    on_expiry.countdown_expired(room_id).await;
}
