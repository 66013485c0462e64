#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line adapter that runs a Citadel Defence game.

mod frame;

use std::{
    fs,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, PoisonError,
    },
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use citadel_defence_core::{ArenaListener, Config, GameOverCause, WELCOME_BANNER};
use citadel_defence_engine::Engine;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Runs a game without a window, optionally printing ASCII frames.
#[derive(Parser, Debug)]
#[command(name = "citadel-defence", version, about)]
struct Args {
    /// TOML file overriding the default tuning.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for the robot spawner.
    #[arg(long)]
    seed: Option<u64>,

    /// Stop the game after this many seconds if the citadel still stands.
    #[arg(long, default_value_t = 120)]
    duration: u64,

    /// Cell to click at start, written as `x,y`. Repeatable.
    #[arg(long = "wall", value_name = "X,Y", value_parser = parse_cell)]
    walls: Vec<(i64, i64)>,

    /// Print an ASCII frame whenever the arena changes.
    #[arg(long)]
    frames: bool,

    /// Minimum pause between printed frames, in milliseconds.
    #[arg(long, default_value_t = 250)]
    frame_interval_ms: u64,
}

/// Listener that remembers whether a redraw is pending and how the game ended.
#[derive(Debug, Default)]
struct TerminalListener {
    dirty: AtomicBool,
    cause: Mutex<Option<GameOverCause>>,
}

impl TerminalListener {
    fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }

    fn cause(&self) -> Option<GameOverCause> {
        *self.cause.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ArenaListener for TerminalListener {
    fn request_redraw(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    fn game_over(&self, cause: GameOverCause) {
        *self.cause.lock().unwrap_or_else(PoisonError::into_inner) = Some(cause);
    }
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = load_config(&args)?;
    let grid = config.grid();

    println!("{WELCOME_BANNER}");
    let listener = Arc::new(TerminalListener::default());
    let engine = Engine::new(config, listener.clone()).context("failed to build engine")?;
    engine.start();

    for &(x, y) in &args.walls {
        match engine.on_cell_clicked(x, y) {
            Ok(()) => info!(x, y, "wall requested"),
            Err(reason) => warn!(x, y, %reason, "wall request refused"),
        }
    }

    let deadline = Instant::now().checked_add(Duration::from_secs(args.duration));
    let frame_interval = Duration::from_millis(args.frame_interval_ms.max(1));
    loop {
        let over = engine.wait_for_game_over(frame_interval);
        if args.frames && listener.take_dirty() {
            println!("{}\n", frame::render_frame(&engine.render_snapshot(), grid));
        }
        if over || deadline_passed(deadline, Instant::now()) {
            break;
        }
    }
    engine.shutdown();

    let snapshot = engine.render_snapshot();
    if args.frames {
        println!("{}\n", frame::render_frame(&snapshot, grid));
    }
    println!("{}", snapshot.status_line());
    println!("{}", describe(listener.cause()));
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            toml::from_str(&text)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => Config::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn parse_cell(raw: &str) -> Result<(i64, i64), String> {
    let (x, y) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got `{raw}`"))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<i64>()
            .map_err(|err| format!("invalid coordinate `{part}`: {err}"))
    };
    Ok((parse(x)?, parse(y)?))
}

/// A run with no representable deadline lasts until the citadel falls.
fn deadline_passed(deadline: Option<Instant>, now: Instant) -> bool {
    deadline.is_some_and(|deadline| now >= deadline)
}

fn describe(cause: Option<GameOverCause>) -> String {
    match cause {
        Some(GameOverCause::CitadelBreached { robot }) => {
            format!("Game over: robot {} breached the citadel", robot.get())
        }
        Some(GameOverCause::Shutdown) => "Game over: stopped".to_owned(),
        None => "Game over".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cell_arguments() {
        assert_eq!(parse_cell("3,4"), Ok((3, 4)));
        assert_eq!(parse_cell(" -1 , 2"), Ok((-1, 2)));
        assert!(parse_cell("3").is_err());
        assert!(parse_cell("a,2").is_err());
    }

    #[test]
    fn args_accept_repeated_walls() {
        let args = Args::try_parse_from([
            "citadel-defence",
            "--wall",
            "1,2",
            "--wall",
            "3,4",
            "--seed",
            "9",
        ])
        .expect("valid arguments");
        assert_eq!(args.walls, vec![(1, 2), (3, 4)]);
        assert_eq!(args.seed, Some(9));
        assert_eq!(args.duration, 120);
    }

    #[test]
    fn longest_duration_never_expires() {
        let args = Args::try_parse_from(["citadel-defence", "--duration", "18446744073709551615"])
            .expect("valid arguments");
        assert_eq!(args.duration, u64::MAX);

        let now = Instant::now();
        let deadline = now.checked_add(Duration::from_secs(args.duration));
        assert!(!deadline_passed(deadline, now));
        assert!(!deadline_passed(None, now));
        assert!(deadline_passed(Some(now), now));
    }

    #[test]
    fn describes_each_cause() {
        assert_eq!(
            describe(Some(GameOverCause::CitadelBreached {
                robot: citadel_defence_core::RobotId::new(12)
            })),
            "Game over: robot 12 breached the citadel"
        );
        assert_eq!(describe(Some(GameOverCause::Shutdown)), "Game over: stopped");
    }
}
