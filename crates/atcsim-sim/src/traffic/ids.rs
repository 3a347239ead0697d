//! Stable aircraft ids and their current register rows.
//!
//! Rows move on every delete; an `AircraftId` does not. The table maps each
//! id's slot to the row it occupies now, and bumps the slot's generation when
//! the aircraft goes away, so an id kept across a delete resolves to nothing
//! even after the slot is reused.

use atcsim_core::types::AircraftId;

#[derive(Debug, Clone, Copy)]
struct Slot {
    generation: u32,
    row: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct IdTable {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl IdTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue an id for an aircraft placed at `row`. Freed slots are reused
    /// most recent first.
    pub fn issue(&mut self, row: usize) -> AircraftId {
        match self.free.pop() {
            Some(slot) => {
                let entry = &mut self.slots[slot as usize];
                entry.row = Some(row);
                AircraftId::new(slot, entry.generation)
            }
            None => {
                let slot = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    row: Some(row),
                });
                AircraftId::new(slot, 0)
            }
        }
    }

    /// Forget `id`. Stale or unknown ids are ignored.
    pub fn retire(&mut self, id: AircraftId) {
        if let Some(entry) = self.live_mut(id) {
            entry.generation += 1;
            entry.row = None;
            self.free.push(id.slot);
        }
    }

    /// Record that `id` now lives at `row` after a compaction.
    pub fn relocate(&mut self, id: AircraftId, row: usize) {
        if let Some(entry) = self.live_mut(id) {
            entry.row = Some(row);
        }
    }

    pub fn row_of(&self, id: AircraftId) -> Option<usize> {
        self.slots
            .get(id.slot as usize)
            .filter(|entry| entry.generation == id.generation)
            .and_then(|entry| entry.row)
    }

    pub fn is_live(&self, id: AircraftId) -> bool {
        self.row_of(id).is_some()
    }

    /// Number of ids currently issued.
    pub fn live(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    fn live_mut(&mut self, id: AircraftId) -> Option<&mut Slot> {
        self.slots
            .get_mut(id.slot as usize)
            .filter(|entry| entry.generation == id.generation && entry.row.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retired_id_never_resolves_to_the_slots_next_owner() {
        let mut table = IdTable::new();
        let first = table.issue(0);
        assert_eq!(first, AircraftId::new(0, 0));
        assert_eq!(table.row_of(first), Some(0));

        table.retire(first);
        assert_eq!(table.row_of(first), None);

        let second = table.issue(3);
        assert_eq!(second, AircraftId::new(0, 1));
        assert_eq!(table.row_of(second), Some(3));
        assert_eq!(table.row_of(first), None);
    }

    #[test]
    fn relocate_follows_compaction() {
        let mut table = IdTable::new();
        let a = table.issue(0);
        let b = table.issue(1);
        let c = table.issue(2);

        // Row 1 deleted: c slides down.
        table.retire(b);
        table.relocate(c, 1);
        assert_eq!(table.row_of(a), Some(0));
        assert_eq!(table.row_of(c), Some(1));

        // A stale id cannot move anything.
        table.relocate(b, 0);
        assert_eq!(table.row_of(b), None);
        assert_eq!(table.live(), 2);
    }

    #[test]
    fn retiring_twice_frees_the_slot_once() {
        let mut table = IdTable::new();
        let a = table.issue(0);
        table.retire(a);
        table.retire(a);
        let b = table.issue(0);
        let c = table.issue(1);
        assert_ne!(b.slot, c.slot);
        assert_eq!(table.live(), 2);
    }
}
