//! Shortest 4-connected paths over the occupancy grid.
//!
//! Every non-wall cell is traversable at cost 1, including cells currently
//! marked by the player or a ghost. The frontier is ordered by accumulated
//! cost plus Manhattan distance to the goal; the heuristic is consistent on a
//! unit-cost grid, so the first time the goal is popped its path is minimal.
//! When several shortest paths exist, which one comes back depends on the
//! frontier's tie-break and callers must not rely on a particular route.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::grid::Grid;
use crate::types::Vec2;

const UNSEEN: usize = usize::MAX;

/// Finds a shortest path from `start` to `goal`, both inclusive.
///
/// Returns `[start]` when `start == goal`, and an empty path when either end
/// is outside the grid, the goal is a wall, or the goal is unreachable.
pub fn find_path(grid: &Grid, start: Vec2, goal: Vec2) -> Vec<Vec2> {
    if !grid.in_bounds(start.x, start.y) || !grid.is_traversable(goal.x, goal.y) {
        return Vec::new();
    }
    if start == goal {
        return vec![start];
    }

    let Ok(start_idx) = grid.index(start.x, start.y) else {
        return Vec::new();
    };
    let Ok(goal_idx) = grid.index(goal.x, goal.y) else {
        return Vec::new();
    };

    let cell_count = grid.cell_count();
    let mut best_cost = vec![u32::MAX; cell_count];
    let mut came_from = vec![UNSEEN; cell_count];
    best_cost[start_idx] = 0;

    // Min-heap on (estimate, cost, cell index).
    let mut frontier: BinaryHeap<Reverse<(u32, u32, usize)>> = BinaryHeap::new();
    frontier.push(Reverse((heuristic(start, goal), 0, start_idx)));

    while let Some(Reverse((_, cost, idx))) = frontier.pop() {
        if idx == goal_idx {
            return reconstruct(grid, &came_from, start_idx, goal_idx);
        }
        if cost > best_cost[idx] {
            continue;
        }

        let pos = position_of(grid, idx);
        for next in grid.traversable_neighbors(pos) {
            let Ok(next_idx) = grid.index(next.x, next.y) else {
                continue;
            };
            let tentative = cost + 1;
            if tentative < best_cost[next_idx] {
                best_cost[next_idx] = tentative;
                came_from[next_idx] = idx;
                frontier.push(Reverse((tentative + heuristic(next, goal), tentative, next_idx)));
            }
        }
    }

    Vec::new()
}

fn heuristic(from: Vec2, to: Vec2) -> u32 {
    from.x.abs_diff(to.x) + from.y.abs_diff(to.y)
}

fn position_of(grid: &Grid, idx: usize) -> Vec2 {
    let idx = idx as i32;
    Vec2::new(idx % grid.width(), idx / grid.width())
}

fn reconstruct(grid: &Grid, came_from: &[usize], start_idx: usize, goal_idx: usize) -> Vec<Vec2> {
    let mut path = vec![position_of(grid, goal_idx)];
    let mut current = goal_idx;
    while current != start_idx {
        current = came_from[current];
        if current == UNSEEN {
            return Vec::new();
        }
        path.push(position_of(grid, current));
    }
    path.reverse();
    path
}
