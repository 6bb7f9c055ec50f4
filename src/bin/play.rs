use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use maze_chase::constants::FPS;
use maze_chase::engine::{GameEngine, GameEngineOptions};
use maze_chase::layout::{default_level, load_level};
use maze_chase::logging::{event_name, Level, StructuredLogLine};
use maze_chase::types::Direction;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

#[derive(Parser, Debug)]
#[command(author, version, about = "Runs the chase in real time, steered from stdin")]
struct Cli {
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    map: Option<PathBuf>,
    #[arg(long, default_value_t = FPS)]
    fps: u32,
    #[arg(long)]
    player_interval: Option<u32>,
    #[arg(long)]
    ghost_interval: Option<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Command {
    Steer(Direction),
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let word = line.trim().to_ascii_lowercase();
    if word == "quit" {
        return Some(Command::Quit);
    }
    Direction::parse_move(&word).map(Command::Steer)
}

fn frame_period(fps: u32) -> Duration {
    Duration::from_millis(1000 / u64::from(fps.max(1)))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let seed = cli
        .seed
        .unwrap_or_else(|| chrono::Utc::now().timestamp_millis().unsigned_abs());
    let run_id = format!("play-{seed}");

    let level = match cli.map.as_deref() {
        Some(path) => load_level(path),
        None => default_level(),
    };
    let mut options = GameEngineOptions::default();
    if let Some(interval) = cli.player_interval {
        options.player_frame_interval = interval.max(1);
    }
    if let Some(interval) = cli.ghost_interval {
        options.ghost_frame_interval = interval.max(1);
    }
    let mut engine = match level.and_then(|grid| GameEngine::new(grid, seed, options)) {
        Ok(engine) => engine,
        Err(error) => {
            StructuredLogLine::new(
                Level::Error,
                "level_load_failed",
                &run_id,
                json!({ "error": error.to_string() }),
            )
            .seed(seed)
            .emit();
            std::process::exit(2);
        }
    };

    StructuredLogLine::new(
        Level::Info,
        "game_started",
        &run_id,
        json!({ "fps": cli.fps, "ghosts": engine.ghost_personalities() }),
    )
    .seed(seed)
    .emit();

    let (tx, mut rx) = mpsc::channel::<Command>(32);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if let Some(command) = parse_command(&line) {
                let quit = command == Command::Quit;
                if tx.send(command).await.is_err() || quit {
                    break;
                }
            }
        }
    });

    let mut interval = tokio::time::interval(frame_period(cli.fps));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut stdin_open = true;

    while !engine.is_ended() {
        tokio::select! {
            _ = interval.tick() => {
                let before = engine.build_summary();
                if let Err(error) = engine.step_frame() {
                    StructuredLogLine::new(
                        Level::Error,
                        "step_failed",
                        &run_id,
                        json!({ "error": error.to_string() }),
                    )
                    .seed(seed)
                    .frame(engine.frame())
                    .emit();
                    std::process::exit(2);
                }
                let after = engine.build_summary();
                if after.player_ticks == before.player_ticks && after.ghost_ticks == before.ghost_ticks {
                    continue;
                }

                let snapshot = engine.build_snapshot(true);
                for event in &snapshot.events {
                    StructuredLogLine::new(
                        Level::Info,
                        event_name(event),
                        &run_id,
                        serde_json::to_value(event).unwrap_or_default(),
                    )
                    .seed(seed)
                    .frame(snapshot.frame)
                    .emit();
                }
                match serde_json::to_string(&snapshot) {
                    Ok(line) => println!("{line}"),
                    Err(error) => {
                        StructuredLogLine::new(
                            Level::Warn,
                            "snapshot_encode_failed",
                            &run_id,
                            json!({ "error": error.to_string() }),
                        )
                        .emit();
                    }
                }
            }
            command = rx.recv(), if stdin_open => {
                match command {
                    Some(Command::Steer(dir)) => engine.set_player_direction(dir),
                    Some(Command::Quit) => break,
                    None => stdin_open = false,
                }
            }
        }
    }

    let summary = engine.build_summary();
    StructuredLogLine::new(
        Level::Info,
        "game_finished",
        &run_id,
        serde_json::to_value(&summary).unwrap_or_default(),
    )
    .seed(seed)
    .frame(summary.frames)
    .emit();
}
