use std::collections::BTreeSet;

use super::*;

impl GameEngine {
    /// Dots still on the board, counting those hidden under ghosts once per cell.
    pub fn dots_remaining(&self) -> usize {
        let hidden: BTreeSet<Vec2> = self
            .ghosts
            .iter()
            .filter(|ghost| ghost.underlay() == Cell::Dot)
            .map(Ghost::pos)
            .collect();
        self.grid.count(Cell::Dot) + hidden.len()
    }

    /// Checks the grid against the actors that are supposed to be on it.
    /// Returns one message per broken rule; empty when consistent.
    pub fn occupancy_anomalies(&self) -> Vec<String> {
        let mut anomalies = Vec::new();

        let marked: BTreeSet<Vec2> = self.grid.positions_of(Cell::Ghost).into_iter().collect();
        let occupied: BTreeSet<Vec2> = self.ghosts.iter().map(Ghost::pos).collect();
        for pos in marked.difference(&occupied) {
            anomalies.push(format!("ghost marker without ghost at ({},{})", pos.x, pos.y));
        }
        for pos in occupied.difference(&marked) {
            if self.caught_by.is_some() && *pos == self.player.pos() {
                continue;
            }
            anomalies.push(format!("ghost at ({},{}) is not marked", pos.x, pos.y));
        }

        if self.caught_by.is_none() {
            let players = self.grid.positions_of(Cell::Player);
            if players != [self.player.pos()] {
                anomalies.push(format!(
                    "player at ({},{}) but player cells are {:?}",
                    self.player.pos().x,
                    self.player.pos().y,
                    players
                ));
            }
        }

        let walls = self.grid.positions_of(Cell::Wall);
        if walls != self.walls {
            anomalies.push(format!(
                "wall layout changed: {} walls, expected {}",
                walls.len(),
                self.walls.len()
            ));
        }

        for ghost in &self.ghosts {
            if matches!(ghost.underlay(), Cell::Ghost | Cell::Player | Cell::Wall) {
                anomalies.push(format!(
                    "{} remembers {:?} as terrain",
                    ghost.id,
                    ghost.underlay()
                ));
            }
        }
        anomalies
    }
}
