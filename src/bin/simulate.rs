use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use maze_chase::engine::{GameEngine, GameEngineOptions};
use maze_chase::grid::Grid;
use maze_chase::layout::{default_level, load_level};
use maze_chase::logging::{event_name, Level, StructuredLogLine};
use maze_chase::types::{Direction, GameOverReason, GameSummary};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use serde_json::json;

const WANDER_TURN_FRAMES: u64 = 15;

#[derive(Parser, Debug)]
#[command(author, version, about = "Runs headless chase scenarios and reports anomalies")]
struct Cli {
    /// Run one scenario built from the flags below instead of the default set.
    #[arg(long)]
    single: bool,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value_t = 3_000)]
    frames: u64,
    #[arg(long, value_enum)]
    player: Option<PlayerScript>,
    /// Level file; the built-in maze is used when omitted.
    #[arg(long)]
    map: Option<PathBuf>,
    #[arg(long)]
    player_interval: Option<u32>,
    #[arg(long)]
    ghost_interval: Option<u32>,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
    /// Log every runtime event, not just scenario boundaries.
    #[arg(long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
enum PlayerScript {
    Idle,
    Wander,
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    seed: u64,
    player: PlayerScript,
    #[serde(rename = "maxFrames")]
    max_frames: u64,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u64,
    player: PlayerScript,
    #[serde(flatten)]
    summary: GameSummary,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    frame: u64,
    message: String,
}

#[derive(Clone, Debug)]
struct ScenarioRunResult {
    result: ScenarioResultLine,
    anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageFrames")]
    average_frames: u64,
    #[serde(rename = "reasonCounts")]
    reason_counts: BTreeMap<String, usize>,
    scenarios: Vec<ScenarioResultLine>,
}

fn main() {
    let cli = Cli::parse();
    let scenarios = resolve_scenarios(&cli);
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(seed_hint, chrono::Utc::now().timestamp_millis()));

    let level = match load_grid(cli.map.as_deref()) {
        Ok(level) => level,
        Err(error) => {
            StructuredLogLine::new(
                Level::Error,
                "level_load_failed",
                &run_id,
                json!({
                    "path": cli.map.as_ref().map(|path| path.to_string_lossy().to_string()),
                    "error": error.to_string(),
                }),
            )
            .emit();
            std::process::exit(2);
        }
    };
    let options = build_options(&cli);

    let mut has_anomaly = false;
    let mut results = Vec::new();
    let mut reason_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_frames = 0u64;
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        StructuredLogLine::new(
            Level::Info,
            "scenario_started",
            &run_id,
            json!({ "scenario": scenario.name, "player": scenario.player, "maxFrames": scenario.max_frames }),
        )
        .seed(scenario.seed)
        .emit();

        let run = match run_scenario(&scenario, level.clone(), options.clone(), &run_id, cli.verbose) {
            Ok(run) => run,
            Err(error) => {
                StructuredLogLine::new(
                    Level::Error,
                    "scenario_failed",
                    &run_id,
                    json!({ "scenario": scenario.name, "error": error }),
                )
                .seed(scenario.seed)
                .emit();
                std::process::exit(2);
            }
        };

        for anomaly in &run.anomaly_records {
            StructuredLogLine::new(
                Level::Warn,
                "anomaly_detected",
                &run_id,
                json!({ "scenario": scenario.name, "message": anomaly.message }),
            )
            .seed(scenario.seed)
            .frame(anomaly.frame)
            .emit();
        }

        if !run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += run.anomaly_records.len();
        total_frames += run.result.summary.frames;
        *reason_counts
            .entry(reason_key(run.result.summary.reason))
            .or_insert(0) += 1;

        StructuredLogLine::new(
            Level::Info,
            "scenario_finished",
            &run_id,
            json!({
                "scenario": scenario.name,
                "reason": run.result.summary.reason,
                "dotsEaten": run.result.summary.dots_eaten,
                "recoveries": run.result.summary.recoveries,
                "anomalyCount": run.anomaly_records.len(),
            }),
        )
        .seed(scenario.seed)
        .frame(run.result.summary.frames)
        .emit();

        match serde_json::to_string(&run.result) {
            Ok(line) => println!("{line}"),
            Err(error) => {
                StructuredLogLine::new(
                    Level::Error,
                    "result_encode_failed",
                    &run_id,
                    json!({ "error": error.to_string() }),
                )
                .emit();
            }
        }
        results.push(run.result);
    }

    let summary = build_run_summary(run_id.clone(), results, reason_counts, total_anomalies, total_frames);

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            StructuredLogLine::new(
                Level::Error,
                "summary_write_failed",
                &run_id,
                json!({ "path": path.to_string_lossy(), "error": error.to_string() }),
            )
            .emit();
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    StructuredLogLine::new(
        Level::Info,
        "run_finished",
        &run_id,
        json!({
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "averageFrames": summary.average_frames,
            "reasonCounts": summary.reason_counts,
            "summaryOut": summary_out_written,
        }),
    )
    .emit();

    if has_anomaly {
        std::process::exit(1);
    }
}

fn load_grid(path: Option<&Path>) -> Result<Grid, maze_chase::error::LayoutError> {
    match path {
        Some(path) => load_level(path),
        None => default_level(),
    }
}

fn build_options(cli: &Cli) -> GameEngineOptions {
    let mut options = GameEngineOptions::default();
    if let Some(interval) = cli.player_interval {
        options.player_frame_interval = interval.max(1);
    }
    if let Some(interval) = cli.ghost_interval {
        options.ghost_frame_interval = interval.max(1);
    }
    options
}

fn run_scenario(
    scenario: &Scenario,
    level: Grid,
    options: GameEngineOptions,
    run_id: &str,
    verbose: bool,
) -> Result<ScenarioRunResult, String> {
    let mut engine =
        GameEngine::new(level, scenario.seed, options).map_err(|error| error.to_string())?;
    let mut input_rng = StdRng::seed_from_u64(scenario.seed ^ 0x5eed_cafe);
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();

    while !engine.is_ended() {
        if engine.frame() >= scenario.max_frames {
            engine.finish(GameOverReason::FrameLimit);
            break;
        }
        if scenario.player == PlayerScript::Wander && engine.frame() % WANDER_TURN_FRAMES == 0 {
            engine.set_player_direction(random_direction(&mut input_rng));
        }
        engine.step_frame().map_err(|error| error.to_string())?;

        let snapshot = engine.build_snapshot(true);
        if verbose {
            for event in &snapshot.events {
                StructuredLogLine::new(
                    Level::Info,
                    event_name(event),
                    run_id,
                    serde_json::to_value(event).unwrap_or_default(),
                )
                .seed(scenario.seed)
                .frame(snapshot.frame)
                .emit();
            }
        }
        for message in engine.occupancy_anomalies() {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.frame,
                message,
            );
        }
    }

    Ok(ScenarioRunResult {
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            seed: scenario.seed,
            player: scenario.player,
            summary: engine.build_summary(),
            anomalies,
        },
        anomaly_records,
    })
}

fn random_direction(rng: &mut StdRng) -> Direction {
    match rng.random_range(0..4) {
        0 => Direction::Up,
        1 => Direction::Down,
        2 => Direction::Left,
        _ => Direction::Right,
    }
}

fn resolve_scenarios(cli: &Cli) -> Vec<Scenario> {
    let seed = cli
        .seed
        .unwrap_or_else(|| chrono::Utc::now().timestamp_millis().unsigned_abs());
    let max_frames = cli.frames.max(1);

    if cli.single || cli.player.is_some() {
        let player = cli.player.unwrap_or(PlayerScript::Wander);
        return vec![Scenario {
            name: format!("custom-{}", script_key(player)),
            seed,
            player,
            max_frames,
        }];
    }

    vec![
        Scenario {
            name: "idle-player".to_string(),
            seed,
            player: PlayerScript::Idle,
            max_frames,
        },
        Scenario {
            name: "wandering-player".to_string(),
            seed: seed.wrapping_add(1),
            player: PlayerScript::Wander,
            max_frames,
        },
    ]
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    frame: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        frame,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_run_id(seed: u64, timestamp_ms: i64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    run_id: String,
    scenarios: Vec<ScenarioResultLine>,
    reason_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
    total_frames: u64,
) -> RunSummary {
    let scenario_count = scenarios.len();
    let average_frames = if scenario_count == 0 {
        0
    } else {
        total_frames / scenario_count as u64
    };
    RunSummary {
        run_id,
        scenario_count,
        anomaly_count,
        average_frames,
        reason_counts,
        scenarios,
    }
}

fn reason_key(reason: Option<GameOverReason>) -> String {
    match reason {
        Some(GameOverReason::Caught) => "caught",
        Some(GameOverReason::FrameLimit) => "frame_limit",
        None => "unfinished",
    }
    .to_string()
}

fn script_key(script: PlayerScript) -> &'static str {
    match script {
        PlayerScript::Idle => "idle",
        PlayerScript::Wander => "wander",
    }
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario(player: PlayerScript, max_frames: u64) -> Scenario {
        Scenario {
            name: "test".to_string(),
            seed: 42,
            player,
            max_frames,
        }
    }

    #[test]
    fn default_run_id_contains_seed_and_timestamp() {
        assert_eq!(default_run_id(42, 123456789), "sim-42-123456789");
    }

    #[test]
    fn scenario_stops_at_frame_limit_without_anomalies() {
        let level = default_level().expect("default level");
        let run = run_scenario(
            &scenario(PlayerScript::Idle, 10),
            level,
            GameEngineOptions::default(),
            "test",
            false,
        )
        .expect("scenario runs");
        assert_eq!(run.result.summary.frames, 10);
        assert_eq!(run.result.summary.reason, Some(GameOverReason::FrameLimit));
        assert!(run.anomaly_records.is_empty());
    }

    #[test]
    fn idle_player_is_eventually_caught() {
        let level = default_level().expect("default level");
        let run = run_scenario(
            &scenario(PlayerScript::Idle, 20_000),
            level,
            GameEngineOptions::default(),
            "test",
            false,
        )
        .expect("scenario runs");
        assert_eq!(run.result.summary.reason, Some(GameOverReason::Caught));
        assert!(run.result.anomalies.is_empty(), "{:?}", run.result.anomalies);
    }

    #[test]
    fn build_run_summary_calculates_average_frames() {
        let summary = build_run_summary(
            "sim-42-1".to_string(),
            Vec::new(),
            BTreeMap::from([("caught".to_string(), 2usize)]),
            0,
            300,
        );
        assert_eq!(summary.average_frames, 0);
        assert_eq!(summary.scenario_count, 0);
    }

    #[test]
    fn write_summary_returns_error_when_parent_does_not_exist() {
        let target = std::env::temp_dir()
            .join(format!("maze-chase-missing-{}", std::process::id()))
            .join("nested")
            .join("summary.json");
        let summary = build_run_summary("sim-1-1".to_string(), Vec::new(), BTreeMap::new(), 0, 0);
        assert!(write_summary(&target, &summary).is_err());
    }

    #[test]
    fn push_anomaly_keeps_records_and_deduplicates_summary_messages() {
        let mut anomalies = Vec::new();
        let mut records = Vec::new();
        let mut seen = HashSet::new();
        push_anomaly(&mut anomalies, &mut records, &mut seen, 10, "same".to_string());
        push_anomaly(&mut anomalies, &mut records, &mut seen, 11, "same".to_string());

        assert_eq!(anomalies.len(), 1);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].frame, 11);
    }
}
