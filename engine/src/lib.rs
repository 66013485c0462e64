#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Concurrent runtime for Citadel Defence.
//!
//! The engine owns the threads: a spawn loop, a wall worker draining a
//! bounded request queue, a score loop, and one movement thread per robot.
//! Threads never touch state directly. They ask the pure systems for
//! commands, apply them to the shared [`World`], and publish the resulting
//! events to the [`ArenaListener`]. No world lock is held while the listener
//! runs.

use std::{
    sync::{
        mpsc::{self, Receiver, RecvTimeoutError, SyncSender},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use citadel_defence_core::{
    ArenaListener, CellCoord, Command, Config, ConfigError, Event, PlacementError, RenderSnapshot,
    RobotId,
};
use citadel_defence_system_builder::Builder;
use citadel_defence_system_movement::{Animation, Fate, Pilot, Slide};
use citadel_defence_system_scoring::Scoring;
use citadel_defence_system_spawning::{Config as SpawningConfig, Spawning};
use citadel_defence_world::{self as world, query, World};
use tracing::{debug, error, info, trace, warn};

/// How long the wall worker waits on an empty queue before re-checking the
/// stop signal.
const INTAKE_POLL: Duration = Duration::from_millis(50);

/// Handle to a running (or runnable) game.
pub struct Engine {
    shared: Arc<Shared>,
    builder: Builder,
    intake: Mutex<Option<SyncSender<CellCoord>>>,
    pending: Mutex<Option<Receiver<CellCoord>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

/// State every engine thread holds on to.
struct Shared {
    world: World,
    listener: Arc<dyn ArenaListener>,
    animation: Animation,
    robot_tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("phase", &query::phase(&self.shared.world))
            .field("builder", &self.builder)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Builds an engine for `config`. Nothing runs until [`Engine::start`].
    pub fn new(config: Config, listener: Arc<dyn ArenaListener>) -> Result<Self, ConfigError> {
        let builder = Builder::new(config.grid(), config.wall_cooldown);
        let animation = Animation::new(config.animation_window, config.animation_tick);
        let world = World::new(config)?;
        let (sender, receiver) = mpsc::sync_channel(query::config(&world).wall_capacity);
        Ok(Self {
            shared: Arc::new(Shared {
                world,
                listener,
                animation,
                robot_tasks: Mutex::new(Vec::new()),
            }),
            builder,
            intake: Mutex::new(Some(sender)),
            pending: Mutex::new(Some(receiver)),
            workers: Mutex::new(Vec::new()),
        })
    }

    /// Starts the game and its worker threads. Later calls do nothing.
    pub fn start(&self) {
        let events = self.shared.execute(Command::Start);
        if events.is_empty() {
            return;
        }
        let Some(receiver) = lock(&self.pending).take() else {
            return;
        };

        let mut workers = lock(&self.workers);
        let shared = Arc::clone(&self.shared);
        workers.extend(spawn_named("spawner", move || spawn_loop(&shared)));
        let shared = Arc::clone(&self.shared);
        let builder = self.builder;
        workers.extend(spawn_named("wall-worker", move || {
            wall_worker(&shared, builder, &receiver);
        }));
        let shared = Arc::clone(&self.shared);
        workers.extend(spawn_named("scorer", move || score_loop(&shared)));
        info!(workers = workers.len(), "engine started");
    }

    /// Handles a click on grid cell `(x, y)`.
    ///
    /// Accepted clicks are queued for the wall worker; the wall appears once
    /// the worker reaches it and only if the cell is still free.
    pub fn on_cell_clicked(&self, x: i64, y: i64) -> Result<(), PlacementError> {
        let command = self.builder.request(x, y).map_err(|reason| {
            debug!(x, y, %reason, "click rejected");
            reason
        })?;
        let cell = self.builder.outcome(&self.shared.execute(command))?;

        let sender = lock(&self.intake).clone();
        match sender.map(|sender| sender.send(cell)) {
            Some(Ok(())) => Ok(()),
            _ => {
                debug!(?cell, "wall queue closed");
                let _ = self.shared.execute(self.builder.cancel(cell));
                Err(PlacementError::NotRunning)
            }
        }
    }

    /// Consistent view of robots, walls, score and phase.
    #[must_use]
    pub fn render_snapshot(&self) -> RenderSnapshot {
        query::render_snapshot(&self.shared.world)
    }

    /// Blocks until the game is over or `timeout` elapses. Returns whether
    /// the game is over.
    pub fn wait_for_game_over(&self, timeout: Duration) -> bool {
        self.shared.world.signal().wait_until_over(timeout)
    }

    /// Shared world for read-only queries.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.shared.world
    }

    /// Ends the game and joins every thread the engine started.
    pub fn shutdown(&self) {
        let _ = self.shared.execute(Command::EndGame);
        drop(lock(&self.intake).take());

        let workers = std::mem::take(&mut *lock(&self.workers));
        let joined = join_all(workers);
        // The spawner is gone, so no robot task can be added past this point.
        let tasks = std::mem::take(&mut *lock(&self.shared.robot_tasks));
        let joined = joined + join_all(tasks);
        if joined > 0 {
            info!(threads = joined, "engine stopped");
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Shared {
    /// Applies `command`, publishes the events, and hands them back.
    fn execute(&self, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        world::apply(&self.world, command, &mut events);
        self.publish(&events);
        events
    }

    fn publish(&self, events: &[Event]) {
        let mut redraw = false;
        for event in events {
            log_event(event);
            redraw |= event.requires_redraw();
        }
        if redraw {
            self.listener.request_redraw();
        }
        for event in events {
            if let Event::GameOver { cause } = event {
                self.listener.game_over(*cause);
            }
        }
    }
}

fn log_event(event: &Event) {
    match event {
        Event::PhaseChanged { phase } => info!(?phase, "phase changed"),
        Event::RobotSpawned {
            robot,
            cell,
            step_delay,
        } => info!(
            robot = robot.get(),
            column = cell.column(),
            row = cell.row(),
            delay_ms = step_delay.as_millis() as u64,
            "robot spawned"
        ),
        Event::SpawnBlocked => debug!("every spawn corner is taken"),
        Event::SpawnRejected { robot } => debug!(robot = robot.get(), "robot id in use"),
        Event::RobotClaimedCell { robot, from, to } => {
            trace!(robot = robot.get(), ?from, ?to, "cell claimed");
        }
        Event::RobotMoved { robot, position } => trace!(robot = robot.get(), ?position, "moved"),
        Event::RobotArrived { robot, cell } => trace!(robot = robot.get(), ?cell, "arrived"),
        Event::RobotStalled { robot, cell } => debug!(robot = robot.get(), ?cell, "robot stalled"),
        Event::RobotDestroyed { robot, cell } => {
            info!(robot = robot.get(), ?cell, "robot destroyed");
        }
        Event::CitadelBreached { robot } => info!(robot = robot.get(), "citadel breached"),
        Event::WallQueued { cell, in_flight } => debug!(?cell, in_flight, "wall queued"),
        Event::WallRejected { cell, reason } => debug!(?cell, %reason, "wall rejected"),
        Event::WallPlaced { cell } => info!(?cell, "wall placed"),
        Event::WallDiscarded { cell, in_flight } => {
            debug!(?cell, in_flight, "wall request discarded");
        }
        Event::WallDamaged { cell, robot } => info!(?cell, robot = robot.get(), "wall damaged"),
        Event::WallDestroyed {
            cell,
            robot,
            in_flight,
        } => info!(?cell, robot = robot.get(), in_flight, "wall destroyed"),
        Event::ScoreAwarded { points, total } => trace!(points, total, "score awarded"),
        Event::GameOver { cause } => info!(?cause, "game over"),
    }
}

fn spawn_loop(shared: &Arc<Shared>) {
    let world = &shared.world;
    let config = query::config(world);
    let interval = config.spawn_interval;
    let mut spawning = Spawning::new(SpawningConfig::from(config));
    let mut last = Instant::now();

    while world.signal().sleep(interval) {
        let now = Instant::now();
        let dt = now.duration_since(last);
        last = now;

        let mut commands = Vec::new();
        spawning.handle(
            dt,
            query::phase(world),
            &query::robot_ids(world),
            &query::grid(world),
            &mut commands,
        );
        for command in commands {
            for event in shared.execute(command) {
                if let Event::RobotSpawned {
                    robot, step_delay, ..
                } = event
                {
                    launch_robot(shared, robot, step_delay);
                }
            }
        }
    }
}

fn launch_robot(shared: &Arc<Shared>, robot: RobotId, step_delay: Duration) {
    let pilot = Pilot::new(robot, step_delay, shared.animation);
    let task_shared = Arc::clone(shared);
    let Some(handle) = spawn_named(&format!("robot-{}", robot.get()), move || {
        robot_task(&task_shared, pilot);
    }) else {
        return;
    };
    let mut tasks = lock(&shared.robot_tasks);
    tasks.retain(|task| !task.is_finished());
    tasks.push(handle);
}

fn robot_task(shared: &Shared, pilot: Pilot) {
    let signal = shared.world.signal();
    'steps: while signal.sleep(pilot.pause()) {
        match pilot.assess(&shared.execute(pilot.advance())) {
            Fate::Gone => break,
            Fate::Stalled => continue,
            Fate::Claimed => {
                let started = Instant::now();
                loop {
                    let events = shared.execute(pilot.animate(started.elapsed()));
                    match pilot.slide(&events) {
                        Slide::Arrived => break,
                        Slide::Gone => break 'steps,
                        Slide::Moving => {
                            if !signal.sleep(pilot.animation().tick()) {
                                break 'steps;
                            }
                        }
                    }
                }
            }
        }
    }
    trace!(robot = pilot.robot().get(), "robot task finished");
}

fn wall_worker(shared: &Shared, builder: Builder, receiver: &Receiver<CellCoord>) {
    let signal = shared.world.signal();
    while !signal.is_over() {
        match receiver.recv_timeout(INTAKE_POLL) {
            Ok(cell) => {
                let cooldown = builder.cooldown(&shared.execute(builder.place(cell)));
                if !cooldown.is_zero() && !signal.sleep(cooldown) {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

fn score_loop(shared: &Shared) {
    let world = &shared.world;
    let config = query::config(world);
    let mut scoring = Scoring::new(config.score_interval, config.score_per_interval);
    let mut dt = Duration::ZERO;
    let mut last = Instant::now();

    loop {
        let mut commands = Vec::new();
        scoring.handle(dt, query::phase(world), &mut commands);
        for command in commands {
            let _ = shared.execute(command);
        }
        if !world.signal().sleep(config.score_interval) {
            break;
        }
        let now = Instant::now();
        dt = now.duration_since(last);
        last = now;
    }
}

fn spawn_named<F>(name: &str, task: F) -> Option<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    match thread::Builder::new().name(name.to_owned()).spawn(task) {
        Ok(handle) => Some(handle),
        Err(err) => {
            error!(thread = name, %err, "failed to spawn thread");
            None
        }
    }
}

/// Joins `handles`, skipping the calling thread. Returns how many were
/// joined.
fn join_all(handles: Vec<JoinHandle<()>>) -> usize {
    let current = thread::current().id();
    let mut joined = 0;
    for handle in handles {
        if handle.thread().id() == current {
            continue;
        }
        let name = handle.thread().name().unwrap_or("unnamed").to_owned();
        match handle.join() {
            Ok(()) => joined += 1,
            Err(_) => warn!(thread = %name, "thread panicked"),
        }
    }
    joined
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
