use crate::error::GridError;
use crate::grid::Grid;
use crate::types::{Cell, Direction, PlayerView, Vec2};

#[derive(Clone, Debug)]
pub struct Player {
    pos: Vec2,
    direction: Direction,
    next_direction: Direction,
}

impl Player {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            direction: Direction::None,
            next_direction: Direction::None,
        }
    }

    pub fn pos(&self) -> Vec2 {
        self.pos
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn queued_direction(&self) -> Direction {
        self.next_direction
    }

    /// Queues a turn; it is taken on the first tick where it is not blocked.
    /// Queueing `Direction::None` clears the pending turn.
    pub fn set_next_direction(&mut self, dir: Direction) {
        self.next_direction = dir;
    }

    pub fn can_move(&self, dir: Direction, grid: &Grid) -> bool {
        let (dx, dy) = dir.delta();
        let next = self.pos.offset(dx, dy);
        grid.is_traversable(next.x, next.y)
    }

    /// Advances one tick. Returns what the player stepped onto, or `None`
    /// when it did not move. Whatever was there is consumed.
    pub fn update(&mut self, grid: &mut Grid) -> Result<Option<Cell>, GridError> {
        if self.next_direction != Direction::None && self.can_move(self.next_direction, grid) {
            self.direction = self.next_direction;
            self.next_direction = Direction::None;
        }

        if self.direction == Direction::None || !self.can_move(self.direction, grid) {
            return Ok(None);
        }

        let (dx, dy) = self.direction.delta();
        let next = self.pos.offset(dx, dy);
        let entered = grid.get(next.x, next.y)?;
        grid.set(self.pos.x, self.pos.y, Cell::Empty)?;
        self.pos = next;
        grid.set(next.x, next.y, Cell::Player)?;
        Ok(Some(entered))
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            x: self.pos.x,
            y: self.pos.y,
            dir: self.direction,
            queued_dir: self.next_direction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{find_player_start, parse_level};

    fn setup(level: &str) -> (Grid, Player) {
        let grid = parse_level(level).expect("level parses");
        let start = find_player_start(&grid).expect("player start");
        (grid, Player::new(start))
    }

    #[test]
    fn idle_player_stays_put() {
        let (mut grid, mut player) = setup("#P.#");
        assert_eq!(player.update(&mut grid), Ok(None));
        assert_eq!(player.pos(), Vec2::new(1, 0));
    }

    #[test]
    fn player_consumes_dots() {
        let (mut grid, mut player) = setup("#P. #");
        player.set_next_direction(Direction::Right);

        assert_eq!(player.update(&mut grid), Ok(Some(Cell::Dot)));
        assert_eq!(grid.get(1, 0), Ok(Cell::Empty));
        assert_eq!(grid.get(2, 0), Ok(Cell::Player));
        assert_eq!(player.queued_direction(), Direction::None);

        assert_eq!(player.update(&mut grid), Ok(Some(Cell::Empty)));
        assert_eq!(grid.get(2, 0), Ok(Cell::Empty));
        assert_eq!(grid.count(Cell::Dot), 0);
        assert_eq!(grid.count(Cell::Player), 1);
    }

    #[test]
    fn wall_stops_motion_but_keeps_direction() {
        let (mut grid, mut player) = setup("#P.#");
        player.set_next_direction(Direction::Right);
        assert!(player.update(&mut grid).expect("grid write").is_some());
        assert_eq!(player.update(&mut grid), Ok(None));
        assert_eq!(player.pos(), Vec2::new(2, 0));
        assert_eq!(player.direction(), Direction::Right);
    }

    #[test]
    fn blocked_turn_stays_queued_until_legal() {
        let (mut grid, mut player) = setup("#P..#\n###.#");
        player.set_next_direction(Direction::Right);
        player.update(&mut grid).expect("grid write");

        player.set_next_direction(Direction::Down);
        player.update(&mut grid).expect("grid write");
        assert_eq!(player.pos(), Vec2::new(3, 0));
        assert_eq!(player.direction(), Direction::Right);
        assert_eq!(player.queued_direction(), Direction::Down);

        player.update(&mut grid).expect("grid write");
        assert_eq!(player.pos(), Vec2::new(3, 1));
        assert_eq!(player.direction(), Direction::Down);
        assert_eq!(player.queued_direction(), Direction::None);
    }

    #[test]
    fn grid_edge_blocks_like_a_wall() {
        let (mut grid, mut player) = setup("P.");
        player.set_next_direction(Direction::Left);
        assert_eq!(player.update(&mut grid), Ok(None));
        assert_eq!(player.queued_direction(), Direction::Left);
    }
}
