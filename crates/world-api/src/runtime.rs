use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use contracts::{
    Direction, DiscoveryEntry, Intent, LeaseDenied, LeaseResponse, Observation, RejectReason,
    ReleaseLeaseResponse,
    SubmitIntentRequest, SubmitIntentResponse, TickEvent, TickResult, ViewerMessage, WorldConfig,
    WORLD_VERSION,
};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Duration, Instant};
use tracing::{debug, error, info, warn};
use world_core::observe::{self, ObservationParams};
use world_core::{run_tick, GridWorld, IntentQueue, LeaseManager, WorldCommand, WorldError};

const INBOX_DEPTH: usize = 256;

#[derive(Debug)]
pub enum RuntimeError {
    /// The scheduler task is gone; every adapter call fails from here on.
    Stopped,
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "world runtime has stopped"),
        }
    }
}

impl std::error::Error for RuntimeError {}

/// How the scheduler task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeExit {
    /// Orderly shutdown: the current tick completed and subscribers were
    /// told before the task returned.
    Shutdown,
    /// An invariant violation aborted a tick. State was rolled back and a
    /// fatal record logged; the process hosting the runtime must exit.
    Fatal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeMetrics {
    pub current_tick: u64,
    pub overruns: u64,
    pub leases_swept: u64,
}

enum CoreRequest {
    SubmitIntent {
        request: SubmitIntentRequest,
        reply: oneshot::Sender<SubmitIntentResponse>,
    },
    AcquireLease {
        entity_id: String,
        controller_id: String,
        reply: oneshot::Sender<LeaseResponse>,
    },
    RenewLease {
        lease_id: String,
        reply: oneshot::Sender<LeaseResponse>,
    },
    ReleaseLease {
        lease_id: String,
        reply: oneshot::Sender<ReleaseLeaseResponse>,
    },
    ValidateLease {
        lease_id: String,
        entity_id: String,
        reply: oneshot::Sender<bool>,
    },
    ListEntities {
        reply: oneshot::Sender<Vec<DiscoveryEntry>>,
    },
    ViewerSnapshot {
        reply: oneshot::Sender<ViewerMessage>,
    },
    QueueCommand {
        command: WorldCommand,
    },
    Metrics {
        reply: oneshot::Sender<RuntimeMetrics>,
    },
    Shutdown,
}

/// Cloneable adapter-side handle. All kernel access funnels through the
/// scheduler's inbox; adapters never touch world state directly.
#[derive(Clone)]
pub struct WorldHandle {
    requests: mpsc::Sender<CoreRequest>,
    ticks: broadcast::Sender<TickEvent>,
    observations: broadcast::Sender<Observation>,
    viewer: broadcast::Sender<ViewerMessage>,
    config: WorldConfig,
}

impl WorldHandle {
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn subscribe_ticks(&self) -> broadcast::Receiver<TickEvent> {
        self.ticks.subscribe()
    }

    pub fn subscribe_observations(&self) -> broadcast::Receiver<Observation> {
        self.observations.subscribe()
    }

    pub fn subscribe_viewer(&self) -> broadcast::Receiver<ViewerMessage> {
        self.viewer.subscribe()
    }

    pub async fn submit_intent(
        &self,
        request: SubmitIntentRequest,
    ) -> Result<SubmitIntentResponse, RuntimeError> {
        self.roundtrip(|reply| CoreRequest::SubmitIntent { request, reply })
            .await
    }

    pub async fn acquire_lease(
        &self,
        entity_id: String,
        controller_id: String,
    ) -> Result<LeaseResponse, RuntimeError> {
        self.roundtrip(|reply| CoreRequest::AcquireLease {
            entity_id,
            controller_id,
            reply,
        })
        .await
    }

    pub async fn renew_lease(&self, lease_id: String) -> Result<LeaseResponse, RuntimeError> {
        self.roundtrip(|reply| CoreRequest::RenewLease { lease_id, reply })
            .await
    }

    pub async fn release_lease(
        &self,
        lease_id: String,
    ) -> Result<ReleaseLeaseResponse, RuntimeError> {
        self.roundtrip(|reply| CoreRequest::ReleaseLease { lease_id, reply })
            .await
    }

    pub async fn validate_lease(
        &self,
        lease_id: String,
        entity_id: String,
    ) -> Result<bool, RuntimeError> {
        self.roundtrip(|reply| CoreRequest::ValidateLease {
            lease_id,
            entity_id,
            reply,
        })
        .await
    }

    pub async fn list_entities(&self) -> Result<Vec<DiscoveryEntry>, RuntimeError> {
        self.roundtrip(|reply| CoreRequest::ListEntities { reply }).await
    }

    pub async fn viewer_snapshot(&self) -> Result<ViewerMessage, RuntimeError> {
        self.roundtrip(|reply| CoreRequest::ViewerSnapshot { reply })
            .await
    }

    pub async fn metrics(&self) -> Result<RuntimeMetrics, RuntimeError> {
        self.roundtrip(|reply| CoreRequest::Metrics { reply }).await
    }

    pub async fn queue_command(&self, command: WorldCommand) -> Result<(), RuntimeError> {
        self.requests
            .send(CoreRequest::QueueCommand { command })
            .await
            .map_err(|_| RuntimeError::Stopped)
    }

    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.requests
            .send(CoreRequest::Shutdown)
            .await
            .map_err(|_| RuntimeError::Stopped)
    }

    async fn roundtrip<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> CoreRequest,
    ) -> Result<T, RuntimeError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.requests
            .send(build(reply_tx))
            .await
            .map_err(|_| RuntimeError::Stopped)?;
        reply_rx.await.map_err(|_| RuntimeError::Stopped)
    }
}

/// Builds the world from the config and spawns the scheduler task that owns
/// it. Returns the adapter handle and the task's join handle; the exit value
/// tells the host whether the stop was orderly.
pub fn spawn_runtime(
    config: WorldConfig,
) -> Result<(WorldHandle, JoinHandle<RuntimeExit>), WorldError> {
    let world = GridWorld::from_config(&config)?;

    let (requests_tx, requests_rx) = mpsc::channel(INBOX_DEPTH);
    let queue_depth = config.broadcast.queue_depth.max(1);
    let (ticks_tx, _) = broadcast::channel(queue_depth);
    let (observations_tx, _) = broadcast::channel(queue_depth);
    let (viewer_tx, _) = broadcast::channel(queue_depth);

    let handle = WorldHandle {
        requests: requests_tx,
        ticks: ticks_tx.clone(),
        observations: observations_tx.clone(),
        viewer: viewer_tx.clone(),
        config: config.clone(),
    };

    let scheduler = Scheduler {
        config,
        world,
        queue: IntentQueue::default(),
        leases: LeaseManager::new(handle.config.lease.ttl_ms),
        pending_commands: Vec::new(),
        last_result: TickResult::empty(0),
        metrics: RuntimeMetrics::default(),
        ticks: ticks_tx,
        observations: observations_tx,
        viewer: viewer_tx,
        shutting_down: false,
    };

    let join = tokio::spawn(scheduler.run(requests_rx));
    Ok((handle, join))
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

struct Scheduler {
    config: WorldConfig,
    world: GridWorld,
    queue: IntentQueue,
    leases: LeaseManager,
    pending_commands: Vec<WorldCommand>,
    last_result: TickResult,
    metrics: RuntimeMetrics,
    ticks: broadcast::Sender<TickEvent>,
    observations: broadcast::Sender<Observation>,
    viewer: broadcast::Sender<ViewerMessage>,
    shutting_down: bool,
}

impl Scheduler {
    /// The single-threaded tick driver. Suspends only while waiting on the
    /// intent deadline and the period boundary; resolution never yields.
    async fn run(mut self, mut inbox: mpsc::Receiver<CoreRequest>) -> RuntimeExit {
        let period = Duration::from_millis(self.config.tick.duration_ms.max(1));
        let deadline_offset = Duration::from_millis(self.config.tick.deadline_ms);
        info!(
            tick_duration_ms = self.config.tick.duration_ms,
            deadline_ms = self.config.tick.deadline_ms,
            "tick loop started"
        );

        loop {
            let tick_id = self.world.tick();
            let tick_start = Instant::now();
            let tick_start_ms = now_ms();
            let deadline_wall_ms = tick_start_ms + self.config.tick.deadline_ms;

            self.metrics.current_tick = tick_id;
            self.metrics.leases_swept += self.leases.sweep_expired(tick_start_ms) as u64;
            self.queue.open_tick(tick_id, deadline_wall_ms);

            let _ = self.ticks.send(TickEvent {
                tick_id,
                tick_start_ms,
                intent_deadline_ms: deadline_wall_ms,
                tick_duration_ms: self.config.tick.duration_ms,
                world_version: WORLD_VERSION.to_string(),
            });
            let _ = self.viewer.send(ViewerMessage::TickStarted {
                tick_id,
                tick_start_ms,
                deadline_ms: deadline_wall_ms,
                tick_duration_ms: self.config.tick.duration_ms,
            });
            self.push_observations(deadline_wall_ms);

            if !self.shutting_down {
                self.serve_until(&mut inbox, tick_start + deadline_offset)
                    .await;
            }

            self.queue.close();
            let intents = self.queue.drain();
            let commands = std::mem::take(&mut self.pending_commands);
            debug!(tick_id, intents = intents.len(), "resolving tick");
            match run_tick(
                &mut self.world,
                intents,
                commands,
                self.config.foraging.regen_every_ticks,
            ) {
                Ok(result) => self.emit_tick_completed(&result),
                Err(violation) => {
                    error!(tick_id, %violation, "invariant violation; tick rolled back, aborting");
                    let _ = self.viewer.send(ViewerMessage::Shutdown { tick_id });
                    return RuntimeExit::Fatal;
                }
            }

            let period_end = tick_start + period;
            if Instant::now() > period_end {
                self.metrics.overruns += 1;
                warn!(tick_id, overruns = self.metrics.overruns, "tick overran its period");
            } else if !self.shutting_down {
                self.serve_until(&mut inbox, period_end).await;
            }

            if self.shutting_down {
                let _ = self.viewer.send(ViewerMessage::Shutdown {
                    tick_id: self.world.tick(),
                });
                info!("tick loop stopped");
                return RuntimeExit::Shutdown;
            }
        }
    }

    /// Serves adapter requests until the wakeup instant, a shutdown signal,
    /// or the handle side going away (treated as shutdown).
    async fn serve_until(&mut self, inbox: &mut mpsc::Receiver<CoreRequest>, wakeup: Instant) {
        loop {
            tokio::select! {
                _ = sleep_until(wakeup) => return,
                request = inbox.recv() => match request {
                    Some(request) => {
                        if self.handle_request(request) {
                            return;
                        }
                    }
                    None => {
                        self.shutting_down = true;
                        return;
                    }
                },
            }
        }
    }

    /// Returns true when the request asks the scheduler to stop.
    fn handle_request(&mut self, request: CoreRequest) -> bool {
        match request {
            CoreRequest::SubmitIntent { request, reply } => {
                let response = self.submit_intent(request);
                let _ = reply.send(response);
            }
            CoreRequest::AcquireLease {
                entity_id,
                controller_id,
                reply,
            } => {
                let response = if self.world.get_entity(&entity_id).is_err() {
                    LeaseResponse::denied(LeaseDenied::UnknownEntity)
                } else {
                    match self.leases.acquire(&entity_id, &controller_id, now_ms()) {
                        Ok(lease) => {
                            info!(%entity_id, %controller_id, lease_id = %lease.lease_id, "lease acquired");
                            LeaseResponse::granted(&lease)
                        }
                        Err(denied) => LeaseResponse::denied(denied),
                    }
                };
                let _ = reply.send(response);
            }
            CoreRequest::RenewLease { lease_id, reply } => {
                let response = match self.leases.renew(&lease_id, now_ms()) {
                    Ok(lease) => LeaseResponse::granted(&lease),
                    Err(denied) => LeaseResponse::denied(denied),
                };
                let _ = reply.send(response);
            }
            CoreRequest::ReleaseLease { lease_id, reply } => {
                let success = self.leases.release(&lease_id);
                if success {
                    info!(%lease_id, "lease released");
                }
                let _ = reply.send(ReleaseLeaseResponse { success });
            }
            CoreRequest::ValidateLease {
                lease_id,
                entity_id,
                reply,
            } => {
                let _ = reply.send(self.leases.validate(&lease_id, &entity_id, now_ms()));
            }
            CoreRequest::ListEntities { reply } => {
                let now = now_ms();
                let entries = self
                    .world
                    .entities()
                    .values()
                    .map(|entity| DiscoveryEntry {
                        entity_id: entity.entity_id.clone(),
                        entity_type: entity.entity_type.clone(),
                        tags: entity.tags.iter().cloned().collect(),
                        spawn_tick: entity.spawn_tick,
                        has_active_lease: self
                            .leases
                            .lease_for_entity(&entity.entity_id, now)
                            .is_some(),
                    })
                    .collect();
                let _ = reply.send(entries);
            }
            CoreRequest::ViewerSnapshot { reply } => {
                let _ = reply.send(
                    self.world
                        .viewer_snapshot(self.config.tick.duration_ms),
                );
            }
            CoreRequest::QueueCommand { command } => {
                self.pending_commands.push(command);
            }
            CoreRequest::Metrics { reply } => {
                let _ = reply.send(self.metrics);
            }
            CoreRequest::Shutdown => {
                self.shutting_down = true;
                return true;
            }
        }
        false
    }

    fn submit_intent(&mut self, request: SubmitIntentRequest) -> SubmitIntentResponse {
        let now = now_ms();
        if !self
            .leases
            .validate(&request.lease_id, &request.entity_id, now)
        {
            return SubmitIntentResponse::rejected(RejectReason::InvalidLease);
        }
        if self.world.get_entity(&request.entity_id).is_err() {
            return SubmitIntentResponse::rejected(RejectReason::UnknownEntity);
        }
        if let Intent::Move {
            direction: Direction::None,
        } = request.intent
        {
            return SubmitIntentResponse::rejected(RejectReason::IllegalAction);
        }
        match self
            .queue
            .submit(&request.entity_id, request.tick_id, request.intent, now)
        {
            Ok(()) => SubmitIntentResponse::accepted(),
            Err(reason) => {
                debug!(
                    entity_id = %request.entity_id,
                    tick_id = request.tick_id,
                    ?reason,
                    "intent rejected"
                );
                SubmitIntentResponse::rejected(reason)
            }
        }
    }

    /// Observations go out at tick start for every entity under an active
    /// lease; the prior tick's result supplies the events.
    fn push_observations(&mut self, deadline_wall_ms: u64) {
        let now = now_ms();
        let params = ObservationParams {
            radius: self.config.observation.radius,
            hearing_radius: self.config.observation.hearing_radius(),
        };
        let leased: Vec<String> = self
            .world
            .entities()
            .keys()
            .filter(|entity_id| self.leases.lease_for_entity(entity_id, now).is_some())
            .cloned()
            .collect();
        for entity_id in leased {
            match observe::generate(
                &self.world,
                &entity_id,
                params,
                deadline_wall_ms,
                &self.last_result,
            ) {
                Ok(observation) => {
                    let _ = self.observations.send(observation);
                }
                Err(err) => warn!(%entity_id, %err, "observation generation failed"),
            }
        }
    }

    fn emit_tick_completed(&mut self, result: &TickResult) {
        for spawned in &result.spawns {
            let _ = self.viewer.send(ViewerMessage::EntitySpawned {
                tick_id: result.tick_id,
                entity: spawned.clone(),
            });
        }
        for departed in &result.despawns {
            let _ = self.viewer.send(ViewerMessage::EntityDespawned {
                tick_id: result.tick_id,
                entity_id: departed.entity_id.clone(),
            });
        }
        let _ = self.viewer.send(ViewerMessage::TickCompleted {
            tick_id: result.tick_id,
            moves: result.moves.iter().map(Into::into).collect(),
            object_changes: result.object_changes.clone(),
            actions_processed: result.actions_processed(),
        });
        self.last_result = result.clone();
    }
}
