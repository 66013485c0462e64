use std::time::Duration;

use citadel_defence_core::{CellCoord, Command, Config, Event, Point, RobotId};
use citadel_defence_system_movement::{Animation, Fate, Pilot, Slide};
use citadel_defence_world::{self as world, query, World};

fn running_world() -> World {
    let world = World::new(Config::default()).expect("default config");
    let mut events = Vec::new();
    world::apply(&world, Command::Start, &mut events);
    world
}

fn spawn(world: &World, robot: RobotId, cell: CellCoord) {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::SpawnRobot {
            robot,
            cells: vec![cell],
            step_delay: Duration::from_millis(500),
        },
        &mut events,
    );
    assert!(matches!(events.as_slice(), [Event::RobotSpawned { .. }]));
}

fn pilot(robot: RobotId) -> Pilot {
    Pilot::new(
        robot,
        Duration::from_millis(500),
        Animation::new(Duration::from_millis(400), Duration::from_millis(100)),
    )
}

fn run(world: &World, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, command, &mut events);
    events
}

#[test]
fn pilot_slides_a_robot_into_its_claimed_cell() {
    let world = running_world();
    let robot = RobotId::new(1);
    spawn(&world, robot, CellCoord::new(0, 0));
    let pilot = pilot(robot);

    let events = run(&world, pilot.advance());
    assert_eq!(pilot.assess(&events), Fate::Claimed);

    let mut trail = Vec::new();
    for sample in 0..=4 {
        let elapsed = Duration::from_millis(100 * sample);
        let events = run(&world, pilot.animate(elapsed));
        let slide = pilot.slide(&events);
        trail.push(query::robot(&world, robot).expect("robot alive").position);
        if sample < 4 {
            assert_eq!(slide, Slide::Moving);
        } else {
            assert_eq!(slide, Slide::Arrived);
        }
    }

    assert_eq!(
        trail,
        vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 0.25),
            Point::new(0.0, 0.5),
            Point::new(0.0, 0.75),
            Point::new(0.0, 1.0),
        ]
    );
}

#[test]
fn blocked_robot_stalls_and_retries() {
    let world = World::new(Config {
        grid_width: 5,
        grid_height: 5,
        ..Config::default()
    })
    .expect("small grid");
    let _ = run(&world, Command::Start);

    let cornered = RobotId::new(1);
    let below = RobotId::new(2);
    let beside = RobotId::new(3);
    spawn(&world, cornered, CellCoord::new(0, 0));
    spawn(&world, below, CellCoord::new(0, 1));
    spawn(&world, beside, CellCoord::new(1, 0));

    let stuck = pilot(cornered);
    let events = run(&world, stuck.advance());
    assert_eq!(stuck.assess(&events), Fate::Stalled);
    assert_eq!(
        query::robot(&world, cornered).map(|robot| robot.claimed),
        Some(CellCoord::new(0, 0))
    );

    let mover = pilot(below);
    assert_eq!(mover.assess(&run(&world, mover.advance())), Fate::Claimed);
    let still_held = run(&world, stuck.advance());
    assert_eq!(stuck.assess(&still_held), Fate::Stalled);

    let landed = run(&world, mover.animate(Duration::from_secs(1)));
    assert_eq!(mover.slide(&landed), Slide::Arrived);
    assert_eq!(stuck.assess(&run(&world, stuck.advance())), Fate::Claimed);
    assert_eq!(
        query::robot(&world, cornered).map(|robot| robot.claimed),
        Some(CellCoord::new(0, 1))
    );
}

#[test]
fn robot_hitting_a_wall_is_gone() {
    let world = running_world();
    let wall = CellCoord::new(0, 1);
    let _ = run(&world, Command::ReserveWall { cell: wall });
    let _ = run(&world, Command::PlaceWall { cell: wall });

    let robot = RobotId::new(8);
    spawn(&world, robot, CellCoord::new(0, 0));
    let pilot = pilot(robot);
    let events = run(&world, pilot.advance());
    assert_eq!(pilot.assess(&events), Fate::Gone);
    assert_eq!(query::robot(&world, robot), None);
    assert_eq!(pilot.slide(&run(&world, pilot.animate(Duration::ZERO))), Slide::Gone);
}
