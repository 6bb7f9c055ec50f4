use super::*;

impl GameEngine {
    /// Turns every ghost seed in the level into a ghost, in row-major order.
    pub(super) fn spawn_ghosts(&mut self) {
        for (index, pos) in find_ghost_starts(&self.grid).into_iter().enumerate() {
            let id = self.make_id("ghost");
            self.ghosts
                .push(Ghost::spawn(id, pos, Personality::for_spawn_index(index)));
        }
    }

    pub(super) fn make_id(&mut self, prefix: &str) -> String {
        let id = format!("{}_{}", prefix, self.next_id_counter);
        self.next_id_counter = self.next_id_counter.saturating_add(1);
        id
    }
}
