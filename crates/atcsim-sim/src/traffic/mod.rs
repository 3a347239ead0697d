//! Entity store: the aircraft register plus every per-row dependent.
//!
//! All resizes go through [`Traffic::create`] and [`Traffic::delete`], which
//! broadcast the change to each dependent so row indices stay aligned.

pub mod ids;
pub mod lockstep;
pub mod register;

use std::collections::HashSet;
use std::ops::Range;

use tracing::debug;

use atcsim_core::types::AircraftId;

use crate::error::{Result, TrafficError};
use crate::systems::conflict::ConflictState;

pub use lockstep::LockstepArrays;
pub use register::{AircraftRegister, NewAircraft};

/// The register and everything that must resize with it.
#[derive(Default)]
pub struct Traffic {
    pub register: AircraftRegister,
    pub conflict: ConflictState,
    dependents: Vec<Box<dyn LockstepArrays>>,
}

impl Traffic {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ntraf(&self) -> usize {
        self.register.ntraf()
    }

    /// Attach an external per-row structure. It is grown to the current
    /// register length and receives every later create/delete.
    pub fn register_dependent(&mut self, mut dependent: Box<dyn LockstepArrays>) -> Result<()> {
        let ntraf = self.ntraf();
        if dependent.len() > ntraf {
            return Err(TrafficError::MisalignedDependent {
                expected: ntraf,
                found: dependent.len(),
            });
        }
        let missing = ntraf - dependent.len();
        if missing > 0 {
            dependent.on_create(missing);
        }
        self.dependents.push(dependent);
        Ok(())
    }

    /// Built-in per-row structures, then registered external ones.
    fn lockstep_members(&mut self) -> Vec<&mut dyn LockstepArrays> {
        let mut members: Vec<&mut dyn LockstepArrays> = Vec::new();
        members.push(&mut self.conflict);
        for dependent in self.dependents.iter_mut() {
            members.push(dependent.as_mut());
        }
        members
    }

    /// Append aircraft. Fails without touching any array if a callsign is
    /// already active or repeated within the batch.
    pub fn create(&mut self, aircraft: &[NewAircraft], now: f64) -> Result<Range<usize>> {
        let mut seen = HashSet::new();
        for new in aircraft {
            if self.register.contains(&new.callsign) || !seen.insert(new.callsign.as_str()) {
                return Err(TrafficError::DuplicateCallsign(new.callsign.clone()));
            }
        }

        let rows = self.register.create(aircraft, now);
        for member in self.lockstep_members() {
            member.on_create(rows.len());
        }
        debug_assert!(self.is_aligned(), "lockstep misalignment after create");
        debug!(count = rows.len(), ntraf = self.ntraf(), "aircraft created");
        Ok(rows)
    }

    /// Remove rows in one atomic compaction. Input order and duplicates do
    /// not matter. Returns the callsigns removed.
    pub fn delete(&mut self, rows: &[usize]) -> Vec<String> {
        let rows = lockstep::descending_rows(rows, self.ntraf());
        if rows.is_empty() {
            return Vec::new();
        }
        let callsigns: Vec<String> = rows
            .iter()
            .rev()
            .map(|&r| self.register.callsign[r].clone())
            .collect();

        self.register.on_delete(&rows);
        for member in self.lockstep_members() {
            member.on_delete(&rows);
        }
        self.conflict.forget(&callsigns);
        debug_assert!(self.is_aligned(), "lockstep misalignment after delete");
        debug!(count = rows.len(), ntraf = self.ntraf(), "aircraft deleted");
        callsigns
    }

    /// True when the register and every dependent have `ntraf` rows.
    pub fn is_aligned(&self) -> bool {
        let n = self.ntraf();
        self.register.is_aligned()
            && self.conflict.len() == n
            && self.dependents.iter().all(|d| d.len() == n)
    }

    pub fn id2idx(&self, callsign: &str) -> Option<usize> {
        self.register.id2idx(callsign)
    }

    pub fn id2idx_batch(&self, callsigns: &[&str]) -> Vec<Option<usize>> {
        self.register.id2idx_batch(callsigns)
    }

    /// Row of `callsign`, or `UnknownCallsign`.
    pub fn require(&self, callsign: &str) -> Result<usize> {
        self.id2idx(callsign)
            .ok_or_else(|| TrafficError::UnknownCallsign(callsign.to_string()))
    }

    pub fn row_of(&self, id: AircraftId) -> Option<usize> {
        self.register.row_of(id)
    }
}
