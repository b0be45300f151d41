use clap::Parser;
use maze_chase_engine::constants::FRIGHTENED_TICKS;
use maze_chase_engine::engine::GameEngine;
use maze_chase_engine::level::Level;
use maze_chase_engine::types::{
    Direction, GameEvent, GameOutcome, GhostLifecycle, GhostVisual, Snapshot, Tile, Vec2,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Run a single custom scenario instead of the default battery.
    #[arg(long)]
    single: bool,
    #[arg(long)]
    policy: Option<String>,
    #[arg(long)]
    max_ticks: Option<u64>,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

/// Input collaborator used for headless runs: a small deterministic pilot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum PilotPolicy {
    /// Beeline for pellets, dodge only adjacent ghosts.
    Greedy,
    /// Keep a wider berth before returning to pellets.
    Cautious,
}

impl PilotPolicy {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "greedy" => Some(Self::Greedy),
            "cautious" => Some(Self::Cautious),
            _ => None,
        }
    }

    fn danger_radius(self) -> i32 {
        match self {
            Self::Greedy => 2,
            Self::Cautious => 4,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    policy: PilotPolicy,
    #[serde(rename = "maxTicks")]
    max_ticks: u64,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    policy: PilotPolicy,
    outcome: Option<GameOutcome>,
    #[serde(rename = "finishedTick")]
    finished_tick: u64,
    score: i32,
    #[serde(rename = "pelletsEaten")]
    pellets_eaten: i32,
    #[serde(rename = "ghostsCaptured")]
    ghosts_captured: i32,
    #[serde(rename = "livesLost")]
    lives_lost: i32,
    #[serde(rename = "wavesSeen")]
    waves_seen: i32,
    #[serde(rename = "powerPelletsEaten")]
    power_pellets_eaten: i32,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
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
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageScore")]
    average_score: i32,
    #[serde(rename = "outcomeCounts")]
    outcome_counts: BTreeMap<String, usize>,
    scenarios: Vec<ScenarioResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
    level: String,
    event: String,
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

fn main() {
    let cli = Cli::parse();
    let scenarios = resolve_scenarios(&cli);
    let run_started_at_ms = now_ms();
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(run_started_at_ms));

    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut outcome_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_score = 0i64;
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        emit_log(
            "info",
            "scenario_started",
            &run_id,
            Some(&scenario.name),
            None,
            json!({
                "policy": scenario.policy,
                "maxTicks": scenario.max_ticks,
            }),
        );
        let scenario_run = run_scenario(&scenario);

        for anomaly in &scenario_run.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &run_id,
                Some(&scenario.name),
                Some(anomaly.tick),
                json!({ "message": anomaly.message }),
            );
        }
        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();
        total_score += scenario_run.result.score as i64;
        *outcome_counts
            .entry(outcome_key(scenario_run.result.outcome))
            .or_insert(0) += 1;

        emit_log(
            "info",
            "scenario_finished",
            &run_id,
            Some(&scenario.name),
            Some(scenario_run.result.finished_tick),
            json!({
                "outcome": scenario_run.result.outcome,
                "score": scenario_run.result.score,
                "anomalyCount": scenario_run.anomaly_records.len(),
            }),
        );

        println!(
            "{}",
            serde_json::to_string(&scenario_run.result).expect("scenario result should serialize")
        );
        scenario_results.push(scenario_run.result);
    }

    let run_finished_at_ms = now_ms();
    let summary = build_run_summary(
        run_id.clone(),
        run_started_at_ms,
        run_finished_at_ms,
        scenario_results,
        outcome_counts,
        total_anomalies,
        total_score,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &run_id,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "run_finished",
        &run_id,
        None,
        None,
        json!({
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "averageScore": summary.average_score,
            "outcomeCounts": summary.outcome_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn run_scenario(scenario: &Scenario) -> ScenarioRunResult {
    // Pristine copy for geometry checks; the engine owns its own level.
    let board = Level::built_in();
    let mut engine = GameEngine::new(Level::built_in());

    let mut pellets: HashSet<(i32, i32)> = HashSet::new();
    for y in 0..board.height() {
        for x in 0..board.width() {
            if matches!(
                board.tile(Vec2 { x, y }),
                Tile::Pellet | Tile::PowerPellet
            ) {
                pellets.insert((x, y));
            }
        }
    }

    let mut pellets_eaten = 0;
    let mut power_pellets_eaten = 0;
    let mut ghosts_captured = 0;
    let mut lives_lost = 0;
    let mut waves_seen = 0;
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut last_tick = 0u64;
    let mut prev_score = 0;
    let mut prev_lives = engine.lives();
    let mut prev_pellets = engine.pellets_remaining();

    while !engine.is_ended() {
        if engine.tick() >= scenario.max_ticks {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                engine.tick(),
                "tick budget exhausted before a terminal outcome".to_string(),
            );
            break;
        }

        let probe = engine.build_snapshot(false);
        let desired = choose_direction(&board, &probe, &pellets, scenario.policy.danger_radius());
        engine.set_desired_direction(desired);
        engine.step();

        let snapshot = engine.build_snapshot(true);
        last_tick = snapshot.tick;

        for message in collect_snapshot_anomalies(
            &board,
            &snapshot,
            prev_score,
            prev_lives,
            prev_pellets,
        ) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                message,
            );
        }
        prev_score = snapshot.score;
        prev_lives = snapshot.lives;
        prev_pellets = snapshot.pellets_remaining;

        for event in &snapshot.events {
            match event {
                GameEvent::PelletEaten { x, y, .. } => {
                    pellets.remove(&(*x, *y));
                    pellets_eaten += 1;
                }
                GameEvent::PowerPelletEaten { x, y, .. } => {
                    pellets.remove(&(*x, *y));
                    pellets_eaten += 1;
                    power_pellets_eaten += 1;
                }
                GameEvent::GhostCaptured { .. } => ghosts_captured += 1,
                GameEvent::LifeLost { .. } => lives_lost += 1,
                GameEvent::WaveChanged { .. } => waves_seen += 1,
                _ => {}
            }
        }
    }

    let summary = engine.build_summary();
    ScenarioRunResult {
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            policy: scenario.policy,
            outcome: engine.outcome(),
            finished_tick: last_tick,
            score: summary.score,
            pellets_eaten,
            ghosts_captured,
            lives_lost,
            waves_seen,
            power_pellets_eaten,
            anomalies,
        },
        anomaly_records,
    }
}

/// Deterministic pilot for the player: flee nearby ghosts, otherwise head
/// for the closest remaining pellet.
fn choose_direction(
    board: &Level,
    snapshot: &Snapshot,
    pellets: &HashSet<(i32, i32)>,
    danger_radius: i32,
) -> Direction {
    let player = Vec2 {
        x: snapshot.player.x,
        y: snapshot.player.y,
    };
    let threats: Vec<Vec2> = snapshot
        .ghosts
        .iter()
        .filter(|ghost| ghost.visual == GhostVisual::Normal)
        .filter(|ghost| ghost.lifecycle == GhostLifecycle::Active)
        .map(|ghost| Vec2 {
            x: ghost.x,
            y: ghost.y,
        })
        .collect();

    let nearest_threat = threats
        .iter()
        .map(|threat| manhattan(player, *threat))
        .min();
    if nearest_threat.is_some_and(|dist| dist <= danger_radius) {
        return escape_direction(board, player, &threats);
    }
    pellet_direction(board, player, pellets)
}

fn escape_direction(board: &Level, player: Vec2, threats: &[Vec2]) -> Direction {
    let mut best = Direction::None;
    let mut best_dist = i32::MIN;
    for dir in Direction::CARDINALS {
        let Some(next) = board.neighbor(player, dir) else {
            continue;
        };
        if !walkable(board, next) {
            continue;
        }
        let dist = threats
            .iter()
            .map(|threat| manhattan(next, *threat))
            .min()
            .unwrap_or(i32::MAX);
        if dist > best_dist {
            best_dist = dist;
            best = dir;
        }
    }
    best
}

/// Breadth-first toward the nearest pellet; returns the first step of the
/// shortest path, or `None` when no pellet is reachable.
fn pellet_direction(board: &Level, player: Vec2, pellets: &HashSet<(i32, i32)>) -> Direction {
    let mut seen = HashSet::new();
    let mut queue = VecDeque::new();
    seen.insert((player.x, player.y));
    for dir in Direction::CARDINALS {
        let Some(next) = board.neighbor(player, dir) else {
            continue;
        };
        if !walkable(board, next) {
            continue;
        }
        if seen.insert((next.x, next.y)) {
            queue.push_back((next, dir));
        }
    }
    while let Some((pos, first_dir)) = queue.pop_front() {
        if pellets.contains(&(pos.x, pos.y)) {
            return first_dir;
        }
        for dir in Direction::CARDINALS {
            let Some(next) = board.neighbor(pos, dir) else {
                continue;
            };
            if !walkable(board, next) {
                continue;
            }
            if seen.insert((next.x, next.y)) {
                queue.push_back((next, first_dir));
            }
        }
    }
    Direction::None
}

fn walkable(board: &Level, pos: Vec2) -> bool {
    matches!(
        board.tile(pos),
        Tile::Open | Tile::Pellet | Tile::PowerPellet
    )
}

fn manhattan(a: Vec2, b: Vec2) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

fn collect_snapshot_anomalies(
    board: &Level,
    snapshot: &Snapshot,
    prev_score: i32,
    prev_lives: i32,
    prev_pellets: i32,
) -> Vec<String> {
    let mut anomalies = Vec::new();

    for ghost in &snapshot.ghosts {
        let pos = Vec2 {
            x: ghost.x,
            y: ghost.y,
        };
        let tile = board.tile(pos);
        if tile == Tile::Wall {
            anomalies.push(format!(
                "ghost {:?} on a wall tile at ({}, {})",
                ghost.personality, ghost.x, ghost.y
            ));
        }
        if ghost.lifecycle == GhostLifecycle::Active
            && ghost.visual != GhostVisual::Eaten
            && matches!(tile, Tile::House | Tile::Door)
        {
            anomalies.push(format!(
                "active ghost {:?} inside the pen at ({}, {})",
                ghost.personality, ghost.x, ghost.y
            ));
        }
    }

    if snapshot.score < prev_score {
        anomalies.push(format!(
            "score regressed: {} -> {}",
            prev_score, snapshot.score
        ));
    }
    if snapshot.lives > prev_lives {
        anomalies.push(format!(
            "lives increased: {} -> {}",
            prev_lives, snapshot.lives
        ));
    }
    if snapshot.pellets_remaining > prev_pellets || snapshot.pellets_remaining < 0 {
        anomalies.push(format!(
            "pellet count out of order: {} -> {}",
            prev_pellets, snapshot.pellets_remaining
        ));
    }
    if snapshot.frightened_ticks > FRIGHTENED_TICKS {
        anomalies.push(format!(
            "frightened countdown above its ceiling: {}",
            snapshot.frightened_ticks
        ));
    }
    anomalies
}

fn resolve_scenarios(cli: &Cli) -> Vec<Scenario> {
    let policy = cli
        .policy
        .as_deref()
        .and_then(PilotPolicy::parse)
        .unwrap_or(PilotPolicy::Greedy);

    if cli.single || cli.policy.is_some() || cli.max_ticks.is_some() {
        let max_ticks = cli.max_ticks.unwrap_or(40_000).clamp(1_000, 400_000);
        return vec![Scenario {
            name: format!("custom-{policy:?}").to_lowercase(),
            policy,
            max_ticks,
        }];
    }

    vec![
        Scenario {
            name: "greedy-clear".to_string(),
            policy: PilotPolicy::Greedy,
            max_ticks: 40_000,
        },
        Scenario {
            name: "cautious-clear".to_string(),
            policy: PilotPolicy::Cautious,
            max_ticks: 40_000,
        },
    ]
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_run_id(timestamp_ms: u64) -> String {
    format!("sim-{timestamp_ms}")
}

fn outcome_key(outcome: Option<GameOutcome>) -> String {
    match outcome {
        Some(GameOutcome::LevelCleared) => "level_cleared",
        Some(GameOutcome::LivesExhausted) => "lives_exhausted",
        None => "unfinished",
    }
    .to_string()
}

fn build_run_summary(
    run_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    scenarios: Vec<ScenarioResultLine>,
    outcome_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
    total_score: i64,
) -> RunSummary {
    let scenario_count = scenarios.len();
    let average_score = if scenario_count == 0 {
        0
    } else {
        (total_score / scenario_count as i64) as i32
    };
    RunSummary {
        run_id,
        started_at_ms,
        finished_at_ms,
        scenario_count,
        anomaly_count,
        average_score,
        outcome_counts,
        scenarios,
    }
}

fn emit_log(
    level: &str,
    event: &str,
    run_id: &str,
    scenario: Option<&str>,
    tick: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        run_id: run_id.to_string(),
        scenario: scenario.map(|value| value.to_string()),
        tick,
        details,
    };
    eprintln!(
        "{}",
        serde_json::to_string(&log_line).expect("structured log should serialize")
    );
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).expect("run summary should serialize");
    std::fs::write(path, summary_text)
}
