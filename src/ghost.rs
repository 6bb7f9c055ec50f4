use std::collections::VecDeque;

use rand::seq::IndexedRandom;
use rand::Rng;

use crate::constants::{
    AMBUSH_LEAD, FLANK_OFFSET, GHOST_SPAWN_UNDERLAY, PATH_REFRESH_INTERVAL,
    RANDOM_RETARGET_CHANCE, STUCK_THRESHOLD,
};
use crate::error::GridError;
use crate::grid::Grid;
use crate::pathfinder::find_path;
use crate::types::{Cell, GhostView, Personality, Step, Vec2};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GhostTuning {
    pub stuck_threshold: u32,
    pub path_refresh_interval: u32,
    pub random_retarget_chance: f64,
}

impl Default for GhostTuning {
    fn default() -> Self {
        Self {
            stuck_threshold: STUCK_THRESHOLD,
            path_refresh_interval: PATH_REFRESH_INTERVAL,
            random_retarget_chance: RANDOM_RETARGET_CHANCE,
        }
    }
}

/// Where another ghost stands and what terrain it is hiding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Occupant {
    pub pos: Vec2,
    pub underlay: Cell,
}

#[derive(Clone, Debug)]
pub struct Ghost {
    pub id: String,
    pub personality: Personality,
    pos: Vec2,
    target: Vec2,
    path: VecDeque<Vec2>,
    path_update_counter: u32,
    underlay: Cell,
    stuck_counter: u32,
    last_position: Vec2,
    recoveries: u32,
}

impl Ghost {
    pub fn spawn(id: String, pos: Vec2, personality: Personality) -> Self {
        Self {
            id,
            personality,
            pos,
            target: pos,
            path: VecDeque::new(),
            path_update_counter: 0,
            underlay: GHOST_SPAWN_UNDERLAY,
            stuck_counter: 0,
            last_position: pos,
            recoveries: 0,
        }
    }

    pub fn pos(&self) -> Vec2 {
        self.pos
    }

    pub fn target(&self) -> Vec2 {
        self.target
    }

    pub fn path(&self) -> &VecDeque<Vec2> {
        &self.path
    }

    pub fn underlay(&self) -> Cell {
        self.underlay
    }

    pub fn recoveries(&self) -> u32 {
        self.recoveries
    }

    pub fn occupant(&self) -> Occupant {
        Occupant {
            pos: self.pos,
            underlay: self.underlay,
        }
    }

    pub fn view(&self) -> GhostView {
        GhostView {
            id: self.id.clone(),
            x: self.pos.x,
            y: self.pos.y,
            personality: self.personality,
            target: self.target,
            path_len: self.path.len(),
        }
    }

    /// Decides this tick's displacement. Runs, in order: stuck detection,
    /// target derivation, the path refresh cadence and step extraction.
    pub fn calculate_move<R: Rng>(
        &mut self,
        player: Vec2,
        grid: &Grid,
        tuning: &GhostTuning,
        rng: &mut R,
    ) -> Step {
        self.recover_if_stuck(grid, tuning.stuck_threshold, rng);

        // An emergency target from recovery is normally overwritten here.
        if let Some(target) = derive_target(
            self.personality,
            self.pos,
            player,
            self.path.is_empty(),
            grid,
            tuning.random_retarget_chance,
            rng,
        ) {
            self.target = target;
        }

        if self.path.front().is_some_and(|&head| head != self.pos) {
            self.path.clear();
        }

        self.path_update_counter += 1;
        if self.path_update_counter >= tuning.path_refresh_interval || self.path.is_empty() {
            self.path_update_counter = 0;
            self.path = find_path(grid, self.pos, self.target).into();
            if self.path.is_empty() {
                // May be diagonal or point into a wall; `apply_move` decides.
                return Step::toward(self.pos, self.target);
            }
        }

        if self.path.len() > 1 {
            self.path.pop_front();
            if let Some(&next) = self.path.front() {
                return Step::between(self.pos, next);
            }
        }

        self.path.clear();
        Step::ZERO
    }

    /// Counts ticks without progress. Past the threshold the path is dropped
    /// and, except for random wanderers, a random open neighbour becomes the
    /// target. Returns whether recovery fired.
    pub fn recover_if_stuck<R: Rng>(
        &mut self,
        grid: &Grid,
        threshold: u32,
        rng: &mut R,
    ) -> bool {
        if self.pos == self.last_position {
            self.stuck_counter += 1;
        } else {
            self.stuck_counter = 0;
            self.last_position = self.pos;
        }

        if self.stuck_counter <= threshold {
            return false;
        }

        self.path.clear();
        self.stuck_counter = 0;
        self.recoveries += 1;
        if self.personality != Personality::Random {
            let neighbors: Vec<Vec2> = grid.traversable_neighbors(self.pos).collect();
            if let Some(&next) = neighbors.choose(rng) {
                self.target = next;
            }
        }
        true
    }

    /// Applies a displacement to the ghost and the grid. Moves into walls or
    /// off the grid are ignored and return `Ok(false)`.
    ///
    /// `others` lists the remaining ghosts so that a shared cell keeps its
    /// ghost marker and its real terrain when one of them leaves.
    pub fn apply_move(
        &mut self,
        step: Step,
        grid: &mut Grid,
        others: &[Occupant],
    ) -> Result<bool, GridError> {
        let next = self.pos.offset(step.dx, step.dy);
        if step.is_zero() || !grid.is_traversable(next.x, next.y) {
            return Ok(false);
        }

        let left_behind = self.underlay;
        self.underlay = match grid.get(next.x, next.y)? {
            Cell::Ghost => others
                .iter()
                .find(|other| other.pos == next)
                .map(|other| other.underlay)
                .unwrap_or(left_behind),
            // The player eats whatever it stands on.
            Cell::Player => Cell::Empty,
            terrain => terrain,
        };

        let still_occupied = others.iter().any(|other| other.pos == self.pos);
        let restored = if still_occupied {
            Cell::Ghost
        } else {
            left_behind
        };
        grid.set(self.pos.x, self.pos.y, restored)?;

        self.pos = next;
        grid.set(next.x, next.y, Cell::Ghost)?;
        Ok(true)
    }
}

/// Picks the tile a ghost heads for this tick. `None` keeps the current target.
pub fn derive_target<R: Rng>(
    personality: Personality,
    ghost: Vec2,
    player: Vec2,
    path_empty: bool,
    grid: &Grid,
    retarget_chance: f64,
    rng: &mut R,
) -> Option<Vec2> {
    let max_x = (grid.width() - 1).max(0);
    let max_y = (grid.height() - 1).max(0);
    let dx = player.x - ghost.x;
    let dy = player.y - ghost.y;

    match personality {
        Personality::Chaser => Some(player),
        Personality::Ambusher => {
            let lead_x = if dx > 0 { AMBUSH_LEAD } else { -AMBUSH_LEAD };
            let lead_y = if dy > 0 { AMBUSH_LEAD } else { -AMBUSH_LEAD };
            Some(Vec2::new(
                (player.x + lead_x).clamp(0, max_x),
                (player.y + lead_y).clamp(0, max_y),
            ))
        }
        Personality::Random => {
            if grid.width() <= 0 || grid.height() <= 0 {
                return None;
            }
            if path_empty || rng.random_bool(retarget_chance.clamp(0.0, 1.0)) {
                Some(Vec2::new(
                    rng.random_range(0..grid.width()),
                    rng.random_range(0..grid.height()),
                ))
            } else {
                None
            }
        }
        Personality::Flanker => {
            let target = if dx.abs() > dy.abs() {
                let side = if dy > 0 { -FLANK_OFFSET } else { FLANK_OFFSET };
                Vec2::new(player.x, player.y + side)
            } else {
                let side = if dx > 0 { -FLANK_OFFSET } else { FLANK_OFFSET };
                Vec2::new(player.x + side, player.y)
            };
            Some(Vec2::new(
                target.x.clamp(0, max_x),
                target.y.clamp(0, max_y),
            ))
        }
    }
}
