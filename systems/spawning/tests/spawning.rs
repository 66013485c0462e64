use std::time::Duration;

use citadel_defence_core::{CellCoord, Command, Config as GameConfig, Event, Phase, RobotId};
use citadel_defence_system_spawning::{Config, Spawning};
use citadel_defence_world::{self as world, query, World};

fn seeded(interval: Duration, seed: u64) -> Spawning {
    Spawning::new(
        Config::new(
            interval,
            Duration::from_millis(500),
            Duration::from_millis(2000),
            10_000,
        )
        .with_seed(seed),
    )
}

fn grid() -> citadel_defence_core::Grid {
    GameConfig::default().grid()
}

#[test]
fn emits_one_spawn_per_elapsed_interval() {
    let mut spawning = seeded(Duration::from_millis(500), 0x1234_5678);
    let mut commands = Vec::new();
    spawning.handle(
        Duration::from_secs(2),
        Phase::Running,
        &[],
        &grid(),
        &mut commands,
    );
    assert_eq!(commands.len(), 4, "expected one spawn per interval");

    let mut ids = Vec::new();
    for command in &commands {
        match command {
            Command::SpawnRobot {
                robot,
                cells,
                step_delay,
            } => {
                ids.push(*robot);
                assert!(robot.get() < 10_000);
                assert!(*step_delay >= Duration::from_millis(500));
                assert!(*step_delay < Duration::from_millis(2000));

                let mut sorted = cells.clone();
                sorted.sort();
                let mut corners = grid().corners().to_vec();
                corners.sort();
                assert_eq!(sorted, corners, "every corner offered exactly once");
            }
            other => panic!("unexpected command emitted: {other:?}"),
        }
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 4, "identifiers within one batch are unique");
}

#[test]
fn partial_intervals_carry_over() {
    let mut spawning = seeded(Duration::from_secs(1), 3);
    let mut commands = Vec::new();
    spawning.handle(
        Duration::from_millis(600),
        Phase::Running,
        &[],
        &grid(),
        &mut commands,
    );
    assert!(commands.is_empty(), "no spawn before a full interval");

    spawning.handle(
        Duration::from_millis(600),
        Phase::Running,
        &[],
        &grid(),
        &mut commands,
    );
    assert_eq!(commands.len(), 1);
}

#[test]
fn idle_phases_reset_the_clock() {
    let mut spawning = seeded(Duration::from_secs(1), 9);
    let mut commands = Vec::new();
    spawning.handle(
        Duration::from_millis(900),
        Phase::Running,
        &[],
        &grid(),
        &mut commands,
    );
    spawning.handle(
        Duration::from_secs(5),
        Phase::Over,
        &[],
        &grid(),
        &mut commands,
    );
    assert!(commands.is_empty(), "nothing spawns once the game is over");

    spawning.handle(
        Duration::from_millis(900),
        Phase::Running,
        &[],
        &grid(),
        &mut commands,
    );
    assert!(commands.is_empty(), "accumulator resets while idle");
}

#[test]
fn live_identifiers_are_never_reused() {
    let mut spawning = Spawning::new(
        Config::new(
            Duration::from_millis(10),
            Duration::from_millis(5),
            Duration::from_millis(5),
            4,
        )
        .with_seed(11),
    );
    let live = [RobotId::new(0), RobotId::new(2), RobotId::new(3)];
    let mut commands = Vec::new();
    spawning.handle(
        Duration::from_millis(30),
        Phase::Running,
        &live,
        &grid(),
        &mut commands,
    );

    let spawned: Vec<_> = commands
        .iter()
        .filter_map(|command| match command {
            Command::SpawnRobot {
                robot, step_delay, ..
            } => Some((*robot, *step_delay)),
            _ => None,
        })
        .collect();
    assert_eq!(
        spawned,
        vec![(RobotId::new(1), Duration::from_millis(5))],
        "only one identifier was free"
    );
}

#[test]
fn same_seed_replays_the_same_commands() {
    let run = |seed| {
        let mut spawning = seeded(Duration::from_millis(250), seed);
        let mut commands = Vec::new();
        for _ in 0..8 {
            spawning.handle(
                Duration::from_millis(400),
                Phase::Running,
                &[],
                &grid(),
                &mut commands,
            );
        }
        commands
    };
    assert_eq!(run(0x4d59_5df4_d0f3_3173), run(0x4d59_5df4_d0f3_3173));
    assert_ne!(run(1), run(2));
}

#[test]
fn spawn_commands_land_on_a_free_corner() {
    let world = World::new(GameConfig::default()).expect("default config");
    let mut events = Vec::new();
    world::apply(&world, Command::Start, &mut events);

    let mut spawning = seeded(Duration::from_secs(1), 42);
    for _ in 0..6 {
        let mut commands = Vec::new();
        spawning.handle(
            Duration::from_secs(1),
            query::phase(&world),
            &query::robot_ids(&world),
            &query::grid(&world),
            &mut commands,
        );
        for command in commands {
            world::apply(&world, command, &mut events);
        }
    }

    let spawned: Vec<CellCoord> = events
        .iter()
        .filter_map(|event| match event {
            Event::RobotSpawned { cell, .. } => Some(*cell),
            _ => None,
        })
        .collect();
    let blocked = events
        .iter()
        .filter(|event| matches!(event, Event::SpawnBlocked))
        .count();

    assert_eq!(spawned.len(), 4, "four corners fit four robots");
    assert_eq!(blocked, 2, "remaining attempts find every corner taken");
    for cell in &spawned {
        assert!(query::grid(&world).corners().contains(cell));
    }
    assert_eq!(query::robot_ids(&world).len(), 4);
}
