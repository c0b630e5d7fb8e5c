//! Session state and authoritative tick loop

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::interval;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::util::time::Clock;
use crate::ws::protocol::ServerMsg;

use super::combat::{CombatSystem, HitResult};
use super::fighter::{ActorState, Slot};
use super::gesture::Gesture;
use super::input::{apply_input, InputSnapshot};
use super::physics::{OpponentView, PhysicsSystem};
use super::snapshot::SnapshotBuilder;

/// Identity of one websocket connection
pub type ConnectionId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Both player slots are taken")]
    Full,

    #[error("Session task is no longer running")]
    Closed,
}

/// An occupied slot and the connection that owns it
#[derive(Debug, Clone)]
struct Seat {
    conn_id: ConnectionId,
    actor: ActorState,
}

/// The two-slot fight (owned by the session task)
pub struct Session {
    seats: [Option<Seat>; 2],
    clock: Arc<dyn Clock>,
}

impl Session {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            seats: [None, None],
            clock,
        }
    }

    /// Claim the lowest free slot for `conn_id`
    pub fn join(&mut self, conn_id: ConnectionId) -> Result<Slot, SessionError> {
        let slot = Slot::ALL
            .into_iter()
            .find(|slot| self.seats[slot.index()].is_none())
            .ok_or(SessionError::Full)?;

        self.seats[slot.index()] = Some(Seat {
            conn_id,
            actor: ActorState::spawn(slot),
        });
        Ok(slot)
    }

    /// Free whichever slot `conn_id` holds
    pub fn leave(&mut self, conn_id: ConnectionId) -> Option<Slot> {
        let slot = self.slot_of(conn_id)?;
        self.seats[slot.index()] = None;
        Some(slot)
    }

    pub fn slot_of(&self, conn_id: ConnectionId) -> Option<Slot> {
        Slot::ALL.into_iter().find(|slot| {
            self.seats[slot.index()]
                .as_ref()
                .is_some_and(|seat| seat.conn_id == conn_id)
        })
    }

    /// Apply an input update from `conn_id`. Input from a connection that
    /// holds no slot is ignored.
    pub fn apply_input(&mut self, conn_id: ConnectionId, input: InputSnapshot) -> Option<Gesture> {
        let now_ms = self.clock.now_ms();
        let slot = self.slot_of(conn_id)?;
        let seat = self.seats[slot.index()].as_mut()?;
        apply_input(&mut seat.actor, input, now_ms)
    }

    /// Advance the simulation by `dt_ms` of elapsed time
    pub fn tick(&mut self, dt_ms: f32) -> Vec<HitResult> {
        match &mut self.seats {
            [Some(a), Some(b)] => {
                let view_a = OpponentView::of(&a.actor);
                let view_b = OpponentView::of(&b.actor);
                PhysicsSystem::integrate(&mut a.actor, Some(view_b), dt_ms);
                PhysicsSystem::integrate(&mut b.actor, Some(view_a), dt_ms);
                CombatSystem::resolve(&mut a.actor, &mut b.actor)
            }
            [Some(seat), None] | [None, Some(seat)] => {
                PhysicsSystem::integrate(&mut seat.actor, None, dt_ms);
                // Nobody to hit; drop presses so they can't land once someone joins
                seat.actor.just_punched = false;
                seat.actor.just_kicked = false;
                Vec::new()
            }
            [None, None] => Vec::new(),
        }
    }

    pub fn actor(&self, slot: Slot) -> Option<&ActorState> {
        self.seats[slot.index()].as_ref().map(|seat| &seat.actor)
    }

    pub fn actors(&self) -> impl Iterator<Item = &ActorState> {
        self.seats.iter().flatten().map(|seat| &seat.actor)
    }

    pub fn player_count(&self) -> usize {
        self.seats.iter().flatten().count()
    }

    pub fn snapshot(&self) -> ServerMsg {
        SnapshotBuilder::build(self.actors())
    }
}

/// Requests from connection tasks, applied one at a time by the session task
#[derive(Debug)]
pub enum SessionCommand {
    Join {
        conn_id: ConnectionId,
        reply: oneshot::Sender<Result<JoinTicket, SessionError>>,
    },
    Input {
        conn_id: ConnectionId,
        input: InputSnapshot,
    },
    Leave {
        conn_id: ConnectionId,
    },
}

/// Granted seat plus the subscription to session broadcasts
#[derive(Debug)]
pub struct JoinTicket {
    pub slot: Slot,
    pub updates: broadcast::Receiver<ServerMsg>,
}

/// Handle to the running session
#[derive(Clone)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<SessionCommand>,
    player_count: Arc<AtomicUsize>,
}

impl SessionHandle {
    pub async fn join(&self, conn_id: ConnectionId) -> Result<JoinTicket, SessionError> {
        let (reply, reply_rx) = oneshot::channel();
        self.command_tx
            .send(SessionCommand::Join { conn_id, reply })
            .await
            .map_err(|_| SessionError::Closed)?;
        reply_rx.await.map_err(|_| SessionError::Closed)?
    }

    pub async fn input(&self, conn_id: ConnectionId, input: InputSnapshot) -> Result<(), SessionError> {
        self.command_tx
            .send(SessionCommand::Input { conn_id, input })
            .await
            .map_err(|_| SessionError::Closed)
    }

    pub async fn leave(&self, conn_id: ConnectionId) -> Result<(), SessionError> {
        self.command_tx
            .send(SessionCommand::Leave { conn_id })
            .await
            .map_err(|_| SessionError::Closed)
    }

    pub fn player_count(&self) -> usize {
        self.player_count.load(Ordering::Relaxed)
    }
}

/// The authoritative session task
pub struct SessionRunner {
    session: Session,
    clock: Arc<dyn Clock>,
    tick_interval: Duration,
    command_rx: mpsc::Receiver<SessionCommand>,
    updates_tx: broadcast::Sender<ServerMsg>,
    player_count: Arc<AtomicUsize>,
}

impl SessionRunner {
    pub fn new(clock: Arc<dyn Clock>, tick_interval: Duration) -> (Self, SessionHandle) {
        let (command_tx, command_rx) = mpsc::channel(256);
        let (updates_tx, _) = broadcast::channel(64);
        let player_count = Arc::new(AtomicUsize::new(0));

        let handle = SessionHandle {
            command_tx,
            player_count: player_count.clone(),
        };

        let runner = Self {
            session: Session::new(clock.clone()),
            clock,
            tick_interval,
            command_rx,
            updates_tx,
            player_count,
        };

        (runner, handle)
    }

    /// Run the tick loop until every handle is dropped
    pub async fn run(mut self) {
        info!(tick_ms = self.tick_interval.as_millis() as u64, "Session loop started");

        let mut ticker = interval(self.tick_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut last_tick = self.clock.now_ms();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let now = self.clock.now_ms();
                    let dt_ms = now.saturating_sub(last_tick) as f32;
                    last_tick = now;
                    self.run_tick(dt_ms);
                }
                command = self.command_rx.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
            }
        }

        info!("Session loop stopped");
    }

    fn run_tick(&mut self, dt_ms: f32) {
        if self.session.player_count() == 0 {
            return;
        }

        for hit in self.session.tick(dt_ms) {
            debug!(
                attacker = %hit.attacker,
                target = %hit.target,
                strike = ?hit.strike,
                damage = hit.damage,
                target_health = hit.target_health,
                "Hit landed"
            );
        }

        // No receivers is fine
        let _ = self.updates_tx.send(self.session.snapshot());
    }

    fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Join { conn_id, reply } => self.handle_join(conn_id, reply),
            SessionCommand::Input { conn_id, input } => {
                if let Some(gesture) = self.session.apply_input(conn_id, input) {
                    debug!(conn_id = %conn_id, gesture = ?gesture, "Special move triggered");
                }
            }
            SessionCommand::Leave { conn_id } => self.handle_leave(conn_id),
        }
    }

    fn handle_join(
        &mut self,
        conn_id: ConnectionId,
        reply: oneshot::Sender<Result<JoinTicket, SessionError>>,
    ) {
        let slot = match self.session.join(conn_id) {
            Ok(slot) => slot,
            Err(e) => {
                warn!(conn_id = %conn_id, "Rejecting connection, session full");
                let _ = reply.send(Err(e));
                return;
            }
        };

        // Subscribe before announcing so the newcomer sees its own status
        let ticket = JoinTicket {
            slot,
            updates: self.updates_tx.subscribe(),
        };
        if reply.send(Ok(ticket)).is_err() {
            debug!(conn_id = %conn_id, slot = %slot, "Connection gone before seating");
            self.session.leave(conn_id);
            return;
        }

        self.publish_player_count();
        info!(
            conn_id = %conn_id,
            slot = %slot,
            player_count = self.session.player_count(),
            "Player joined"
        );
    }

    fn handle_leave(&mut self, conn_id: ConnectionId) {
        let Some(slot) = self.session.leave(conn_id) else {
            return;
        };

        self.publish_player_count();
        info!(
            conn_id = %conn_id,
            slot = %slot,
            player_count = self.session.player_count(),
            "Player left"
        );
    }

    fn publish_player_count(&self) {
        let player_count = self.session.player_count();
        self.player_count.store(player_count, Ordering::Relaxed);
        let _ = self.updates_tx.send(ServerMsg::Status { player_count });
    }
}
