//! The arena task: sole owner of the world and its tick loop

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::ws::protocol::ServerMsg;
use crate::ws::session::SessionRegistry;

use super::world::{PlayerId, World};
use super::{Effect, GameCommand};

/// Queued commands from sessions and timers
const COMMAND_BUFFER: usize = 1024;
/// Broadcast backlog before slow clients start skipping
const EVENT_BUFFER: usize = 256;

/// A broadcast envelope; `except` names the one client that should skip it
#[derive(Debug, Clone)]
pub struct Outbound {
    pub except: Option<PlayerId>,
    pub msg: ServerMsg,
}

impl Outbound {
    pub fn is_for(&self, player_id: &str) -> bool {
        self.except.as_deref() != Some(player_id)
    }
}

/// Cloneable handle used by sessions and HTTP routes
#[derive(Clone)]
pub struct ArenaHandle {
    command_tx: mpsc::Sender<GameCommand>,
    events_tx: broadcast::Sender<Outbound>,
    player_count: Arc<AtomicUsize>,
}

impl ArenaHandle {
    /// Queue a command; fails only once the arena has stopped
    pub async fn send(&self, command: GameCommand) -> Result<(), mpsc::error::SendError<GameCommand>> {
        self.command_tx.send(command).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Outbound> {
        self.events_tx.subscribe()
    }

    /// Humans and bots currently in the world
    pub fn player_count(&self) -> usize {
        self.player_count.load(Ordering::Relaxed)
    }
}

/// The authoritative game loop
pub struct Arena {
    world: World,
    command_rx: mpsc::Receiver<GameCommand>,
    /// Weak so the arena never keeps its own inbox open
    command_tx: mpsc::WeakSender<GameCommand>,
    events_tx: broadcast::Sender<Outbound>,
    sessions: Arc<SessionRegistry>,
    player_count: Arc<AtomicUsize>,
}

impl Arena {
    pub fn new(world: World, sessions: Arc<SessionRegistry>) -> (Self, ArenaHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (events_tx, _) = broadcast::channel(EVENT_BUFFER);
        let player_count = Arc::new(AtomicUsize::new(0));

        let arena = Self {
            world,
            command_rx,
            command_tx: command_tx.downgrade(),
            events_tx: events_tx.clone(),
            sessions,
            player_count: player_count.clone(),
        };
        let handle = ArenaHandle {
            command_tx,
            events_tx,
            player_count,
        };

        (arena, handle)
    }

    /// Run until every handle is dropped
    pub async fn run(mut self) {
        let period = self.world.config().tick_period;
        info!(tick_ms = period.as_millis() as u64, "Arena started");

        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let effects = self.world.tick();
                    self.publish(effects);
                }
                command = self.command_rx.recv() => match command {
                    Some(command) => {
                        let effects = self.world.handle_command(command);
                        self.publish(effects);
                    }
                    None => break,
                },
            }
        }

        info!(ticks = self.world.tick_count(), "Arena stopped");
    }

    fn publish(&mut self, effects: Vec<Effect>) {
        self.player_count
            .store(self.world.players().len(), Ordering::Relaxed);
        self.dispatch(effects);
    }

    fn dispatch(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Broadcast(msg) => self.broadcast(None, msg),
                Effect::BroadcastExcept { except, msg } => self.broadcast(Some(except), msg),
                Effect::Send { to, msg } => {
                    if !self.sessions.send_to(&to, msg) {
                        debug!(player_id = %to, "Direct message dropped");
                    }
                }
                Effect::ScheduleRespawn { player_id } => self.schedule_respawn(player_id),
            }
        }
    }

    fn broadcast(&self, except: Option<PlayerId>, msg: ServerMsg) {
        // No subscribers simply means nobody is connected
        let _ = self.events_tx.send(Outbound { except, msg });
    }

    /// Fire-and-forget timer that feeds a respawn back through the inbox
    fn schedule_respawn(&self, player_id: PlayerId) {
        let Some(command_tx) = self.command_tx.upgrade() else {
            return;
        };
        let delay = self.world.config().respawn_delay;

        debug!(player_id = %player_id, delay_ms = delay.as_millis() as u64, "Respawn scheduled");
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = command_tx.send(GameCommand::Respawn { player_id }).await;
        });
    }
}
