use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::constants::{GHOST_FRAME_INTERVAL, PLAYER_FRAME_INTERVAL};
use crate::error::{GridError, LayoutError};
use crate::ghost::{Ghost, GhostTuning, Occupant};
use crate::grid::Grid;
use crate::layout::{find_ghost_starts, find_player_start};
use crate::player::Player;
use crate::types::{
    Cell, Direction, GameOverReason, GameSummary, Personality, RuntimeEvent, Snapshot, Vec2,
};

mod occupancy_system;
mod spawn_system;

#[derive(Clone, Debug)]
pub struct GameEngineOptions {
    pub player_frame_interval: u32,
    pub ghost_frame_interval: u32,
    pub ghost_tuning: GhostTuning,
}

impl Default for GameEngineOptions {
    fn default() -> Self {
        Self {
            player_frame_interval: PLAYER_FRAME_INTERVAL,
            ghost_frame_interval: GHOST_FRAME_INTERVAL,
            ghost_tuning: GhostTuning::default(),
        }
    }
}

/// Owns the grid and every actor on it. All mutation goes through the
/// `step_*` methods, which process the player and then each ghost in
/// creation order; one ghost's decide-and-move finishes before the next
/// ghost looks at the grid.
#[derive(Clone, Debug)]
pub struct GameEngine {
    pub options: GameEngineOptions,

    grid: Grid,
    walls: Vec<Vec2>,
    rng: StdRng,
    player: Player,
    ghosts: Vec<Ghost>,
    events: Vec<RuntimeEvent>,

    frame: u64,
    player_ticks: u64,
    ghost_ticks: u64,
    player_frame_counter: u32,
    ghost_frame_counter: u32,
    dots_eaten: u32,
    ended: bool,
    end_reason: Option<GameOverReason>,
    caught_by: Option<String>,
    next_id_counter: u64,
}

impl GameEngine {
    pub fn new(grid: Grid, seed: u64, options: GameEngineOptions) -> Result<Self, LayoutError> {
        let start = find_player_start(&grid).ok_or(LayoutError::MissingPlayer)?;
        let walls = grid.positions_of(Cell::Wall);
        let mut engine = Self {
            options,
            grid,
            walls,
            rng: StdRng::seed_from_u64(seed),
            player: Player::new(start),
            ghosts: Vec::new(),
            events: Vec::new(),
            frame: 0,
            player_ticks: 0,
            ghost_ticks: 0,
            player_frame_counter: 0,
            ghost_frame_counter: 0,
            dots_eaten: 0,
            ended: false,
            end_reason: None,
            caught_by: None,
            next_id_counter: 1,
        };
        engine.spawn_ghosts();
        Ok(engine)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn ghosts(&self) -> &[Ghost] {
        &self.ghosts
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn end_reason(&self) -> Option<GameOverReason> {
        self.end_reason
    }

    pub fn set_player_direction(&mut self, dir: Direction) {
        self.player.set_next_direction(dir);
    }

    /// Stops the game from outside, e.g. when a driver hits its frame cap.
    pub fn finish(&mut self, reason: GameOverReason) {
        if self.ended {
            return;
        }
        self.ended = true;
        self.end_reason = Some(reason);
    }

    /// Advances one frame of the external clock, firing the player and
    /// ghost ticks whenever their frame counters come due.
    pub fn step_frame(&mut self) -> Result<(), GridError> {
        if self.ended {
            return Ok(());
        }
        self.frame += 1;

        self.player_frame_counter += 1;
        if self.player_frame_counter >= self.options.player_frame_interval {
            self.player_frame_counter = 0;
            self.step_player()?;
        }

        self.ghost_frame_counter += 1;
        if self.ghost_frame_counter >= self.options.ghost_frame_interval {
            self.ghost_frame_counter = 0;
            self.step_ghosts()?;
        }
        Ok(())
    }

    pub fn step_player(&mut self) -> Result<(), GridError> {
        if self.ended {
            return Ok(());
        }
        self.player_ticks += 1;

        let Some(entered) = self.player.update(&mut self.grid)? else {
            return Ok(());
        };
        let pos = self.player.pos();
        if entered == Cell::Dot {
            self.dots_eaten += 1;
            self.events.push(RuntimeEvent::DotEaten { x: pos.x, y: pos.y });
        }
        if let Some(ghost_idx) = self.ghosts.iter().position(|ghost| ghost.pos() == pos) {
            self.catch_player(ghost_idx);
        }
        Ok(())
    }

    pub fn step_ghosts(&mut self) -> Result<(), GridError> {
        if self.ended {
            return Ok(());
        }
        self.ghost_ticks += 1;
        let player_pos = self.player.pos();

        for idx in 0..self.ghosts.len() {
            let others: Vec<Occupant> = self
                .ghosts
                .iter()
                .enumerate()
                .filter(|(other_idx, _)| *other_idx != idx)
                .map(|(_, ghost)| ghost.occupant())
                .collect();

            let recoveries_before = self.ghosts[idx].recoveries();
            let step = self.ghosts[idx].calculate_move(
                player_pos,
                &self.grid,
                &self.options.ghost_tuning,
                &mut self.rng,
            );
            if self.ghosts[idx].recoveries() != recoveries_before {
                let pos = self.ghosts[idx].pos();
                self.events.push(RuntimeEvent::GhostRecovered {
                    ghost_id: self.ghosts[idx].id.clone(),
                    x: pos.x,
                    y: pos.y,
                });
            }

            self.ghosts[idx].apply_move(step, &mut self.grid, &others)?;
            if self.ghosts[idx].pos() == player_pos {
                self.catch_player(idx);
                return Ok(());
            }
        }
        Ok(())
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let snapshot = Snapshot {
            frame: self.frame,
            tick: self.ghost_ticks,
            tiles: self.grid.to_rows(),
            player: self.player.view(),
            ghosts: self.ghosts.iter().map(Ghost::view).collect(),
            dots_remaining: self.dots_remaining(),
            ended: self.ended,
            events: if include_events {
                self.events.clone()
            } else {
                Vec::new()
            },
        };
        if include_events {
            self.events.clear();
        }
        snapshot
    }

    pub fn build_summary(&self) -> GameSummary {
        GameSummary {
            reason: self.end_reason,
            frames: self.frame,
            player_ticks: self.player_ticks,
            ghost_ticks: self.ghost_ticks,
            dots_eaten: self.dots_eaten,
            dots_remaining: self.dots_remaining(),
            recoveries: self.ghosts.iter().map(Ghost::recoveries).sum(),
            caught_by: self.caught_by.clone(),
        }
    }

    pub fn ghost_personalities(&self) -> Vec<Personality> {
        self.ghosts.iter().map(|ghost| ghost.personality).collect()
    }

    fn catch_player(&mut self, ghost_idx: usize) {
        let ghost_id = self.ghosts[ghost_idx].id.clone();
        let pos = self.ghosts[ghost_idx].pos();
        self.events.push(RuntimeEvent::PlayerCaught {
            ghost_id: ghost_id.clone(),
            x: pos.x,
            y: pos.y,
        });
        self.caught_by = Some(ghost_id);
        self.finish(GameOverReason::Caught);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::Rng;

    use super::*;
    use crate::layout::{default_level, parse_level};

    const OPEN_ROOM: &str = "\
G....
.....
.....
.....
....P";

    fn engine_for(level: &str, seed: u64) -> GameEngine {
        let grid = parse_level(level).expect("level parses");
        GameEngine::new(grid, seed, GameEngineOptions::default()).expect("engine builds")
    }

    fn random_direction(rng: &mut StdRng) -> Direction {
        match rng.random_range(0..4) {
            0 => Direction::Up,
            1 => Direction::Down,
            2 => Direction::Left,
            _ => Direction::Right,
        }
    }

    #[test]
    fn ghosts_get_personalities_round_robin() {
        let engine = engine_for("GGGGG\n..P..", 1);
        assert_eq!(
            engine.ghost_personalities(),
            vec![
                Personality::Chaser,
                Personality::Ambusher,
                Personality::Random,
                Personality::Flanker,
                Personality::Chaser,
            ]
        );
        let ids: Vec<&str> = engine.ghosts().iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["ghost_1", "ghost_2", "ghost_3", "ghost_4", "ghost_5"]);
    }

    #[test]
    fn chaser_crosses_open_room_in_eight_ticks() {
        let mut engine = engine_for(OPEN_ROOM, 3);
        for tick in 1..=8 {
            assert!(!engine.is_ended(), "caught early at tick {tick}");
            engine.step_ghosts().expect("grid write");
        }
        assert_eq!(engine.ghosts()[0].pos(), Vec2::new(4, 4));
        assert!(engine.is_ended());
        assert_eq!(engine.end_reason(), Some(GameOverReason::Caught));

        let summary = engine.build_summary();
        assert_eq!(summary.ghost_ticks, 8);
        assert_eq!(summary.caught_by.as_deref(), Some("ghost_1"));

        engine.step_ghosts().expect("no-op after end");
        assert_eq!(engine.build_summary().ghost_ticks, 8);
    }

    #[test]
    fn player_walking_into_a_ghost_ends_the_game() {
        let mut engine = engine_for("#P G#", 5);
        engine.set_player_direction(Direction::Right);
        engine.step_player().expect("grid write");
        assert!(!engine.is_ended());
        engine.step_player().expect("grid write");
        assert!(engine.is_ended());
        let snapshot = engine.build_snapshot(true);
        assert!(snapshot.ended);
        assert!(snapshot
            .events
            .iter()
            .any(|event| matches!(event, RuntimeEvent::PlayerCaught { ghost_id, .. } if ghost_id == "ghost_1")));
    }

    #[test]
    fn frames_gate_player_and_ghost_ticks() {
        let mut engine = engine_for("#####\n#P..#\n#####", 1);
        for _ in 0..35 {
            engine.step_frame().expect("grid write");
        }
        let summary = engine.build_summary();
        assert_eq!(summary.frames, 35);
        assert_eq!(summary.player_ticks, 7);
        assert_eq!(summary.ghost_ticks, 5);
    }

    #[test]
    fn build_snapshot_drains_events_when_requested() {
        let mut engine = engine_for("#P..#", 1);
        engine.set_player_direction(Direction::Right);
        engine.step_player().expect("grid write");

        let peek = engine.build_snapshot(false);
        assert!(peek.events.is_empty());
        let drained = engine.build_snapshot(true);
        assert_eq!(drained.events, vec![RuntimeEvent::DotEaten { x: 2, y: 0 }]);
        assert!(engine.build_snapshot(true).events.is_empty());
        assert_eq!(drained.dots_remaining, 1);
    }

    #[test]
    fn same_seed_produces_same_progression() {
        let level = default_level().expect("default level");
        let mut a = GameEngine::new(level.clone(), 424_242, GameEngineOptions::default())
            .expect("engine builds");
        let mut b =
            GameEngine::new(level, 424_242, GameEngineOptions::default()).expect("engine builds");

        for frame in 0..600 {
            if frame % 40 == 0 {
                let dir = [Direction::Left, Direction::Up, Direction::Right, Direction::Down]
                    [(frame / 40) % 4];
                a.set_player_direction(dir);
                b.set_player_direction(dir);
            }
            a.step_frame().expect("grid write");
            b.step_frame().expect("grid write");
            assert_eq!(a.grid(), b.grid());
            for (ga, gb) in a.ghosts().iter().zip(b.ghosts()) {
                assert_eq!(ga.pos(), gb.pos());
                assert_eq!(ga.target(), gb.target());
            }
            if a.is_ended() || b.is_ended() {
                assert_eq!(a.is_ended(), b.is_ended());
                break;
            }
        }
    }

    #[test]
    fn occupancy_matches_actor_positions_throughout_play() {
        for seed in 0..20u64 {
            let mut engine =
                GameEngine::new(default_level().expect("default level"), seed, GameEngineOptions::default())
                    .expect("engine builds");
            let mut input_rng = StdRng::seed_from_u64(seed + 1_000);
            for frame in 0..2_000u32 {
                if frame % 15 == 0 {
                    engine.set_player_direction(random_direction(&mut input_rng));
                }
                engine.step_frame().expect("grid write");
                if engine.is_ended() {
                    break;
                }
                let anomalies = engine.occupancy_anomalies();
                assert!(anomalies.is_empty(), "seed={seed} frame={frame}: {anomalies:?}");

                let marked: HashSet<Vec2> = engine.grid().positions_of(Cell::Ghost).into_iter().collect();
                let actual: HashSet<Vec2> = engine.ghosts().iter().map(Ghost::pos).collect();
                assert_eq!(marked, actual);
            }
        }
    }

    #[test]
    fn dots_are_only_lost_to_the_player() {
        for seed in 0..10u64 {
            let mut engine =
                GameEngine::new(default_level().expect("default level"), seed, GameEngineOptions::default())
                    .expect("engine builds");
            let initial = engine.dots_remaining();
            let mut input_rng = StdRng::seed_from_u64(seed);
            for frame in 0..1_500u32 {
                if frame % 20 == 0 {
                    engine.set_player_direction(random_direction(&mut input_rng));
                }
                engine.step_frame().expect("grid write");
                if engine.is_ended() {
                    break;
                }
                let summary = engine.build_summary();
                assert_eq!(
                    summary.dots_remaining + summary.dots_eaten as usize,
                    initial,
                    "seed={seed} frame={frame}"
                );
            }
        }
    }

    #[test]
    fn boxed_in_ghost_reports_recovery() {
        let mut engine = engine_for("#####\n#G#P#\n#####", 9);
        for _ in 0..5 {
            engine.step_ghosts().expect("grid write");
        }
        let events = engine.build_snapshot(true).events;
        assert_eq!(
            events,
            vec![RuntimeEvent::GhostRecovered {
                ghost_id: "ghost_1".to_string(),
                x: 1,
                y: 1
            }]
        );
        assert_eq!(engine.build_summary().recoveries, 1);
    }

    #[test]
    fn engine_requires_a_player() {
        let grid = Grid::filled(3, 3, Cell::Dot);
        let result = GameEngine::new(grid, 1, GameEngineOptions::default());
        assert!(matches!(result, Err(LayoutError::MissingPlayer)));
    }
}
