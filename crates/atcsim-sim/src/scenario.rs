//! Pending scenario commands, ordered by the sim time they fire at.

use atcsim_core::commands::TimedCommand;
use atcsim_core::constants::TIME_EPSILON;

/// Commands waiting for their time. Equal times keep insertion order.
#[derive(Debug, Clone, Default)]
pub struct ScenarioTimeline {
    pending: Vec<TimedCommand>,
}

impl ScenarioTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge commands whose times are relative to `offset`.
    pub fn merge(&mut self, commands: impl IntoIterator<Item = TimedCommand>, offset: f64) {
        self.pending.extend(
            commands
                .into_iter()
                .map(|c| TimedCommand::new(c.time + offset, c.command)),
        );
        // Stable sort: equal times stay in file / merge order.
        self.pending.sort_by(|a, b| a.time.total_cmp(&b.time));
    }

    /// Take the earliest command due at `now`, with the time it was
    /// scheduled for.
    pub fn pop_due(&mut self, now: f64) -> Option<TimedCommand> {
        let first = self.pending.first()?;
        if first.time > now + TIME_EPSILON {
            return None;
        }
        Some(self.pending.remove(0))
    }

    /// Drop pending commands bound to `callsign`, up to its next pending
    /// creation. Commands after a re-creation belong to the new aircraft.
    /// Returns how many were dropped.
    pub fn detach(&mut self, callsign: &str) -> usize {
        let bound = |c: &TimedCommand| c.command.callsign() == Some(callsign);
        let end = self
            .pending
            .iter()
            .position(|c| c.command.is_creation() && bound(c))
            .unwrap_or(self.pending.len());
        let before = self.pending.len();
        let mut i = 0;
        self.pending.retain(|c| {
            let keep = i >= end || !bound(c);
            i += 1;
            keep
        });
        before - self.pending.len()
    }

    pub fn next_time(&self) -> Option<f64> {
        self.pending.first().map(|c| c.time)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
