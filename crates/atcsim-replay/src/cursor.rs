//! Forward-only read cursor over a track table.

use atcsim_core::constants::TIME_EPSILON;
use atcsim_core::types::TrackSample;

use crate::table::TrackTable;

/// Hands out one time bucket per call, in time order. Never rewinds.
#[derive(Debug, Clone)]
pub struct ReplayCursor {
    table: TrackTable,
    next: usize,
    /// Sim time at which the table's t = 0 plays.
    offset: f64,
}

impl ReplayCursor {
    pub fn new(table: TrackTable, offset: f64) -> Self {
        Self {
            table,
            next: 0,
            offset,
        }
    }

    /// Sim time of the next unread bucket.
    pub fn next_time(&self) -> Option<f64> {
        self.table
            .rows()
            .get(self.next)
            .map(|r| self.offset + r.sim_time)
    }

    /// If the next bucket is due at `now`, return all of its rows as samples
    /// and advance past it.
    pub fn next_batch(&mut self, now: f64) -> Option<Vec<TrackSample>> {
        let due = self.next_time()?;
        if due > now + TIME_EPSILON {
            return None;
        }

        let rows = &self.table.rows()[self.next..];
        let bucket = rows[0].sim_time;
        let len = rows
            .iter()
            .take_while(|r| (r.sim_time - bucket).abs() <= TIME_EPSILON)
            .count();

        let batch = rows[..len].iter().map(|r| r.to_sample(self.offset)).collect();
        self.next += len;
        Some(batch)
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.table.len()
    }

    pub fn remaining(&self) -> usize {
        self.table.len() - self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TrackRow;

    fn table() -> TrackTable {
        let row = |t: f64, cs: &str| TrackRow {
            sim_time: t,
            callsign: cs.into(),
            lat: 52.0,
            lon: 4.0,
            alt: 1000.0,
            heading: 0.0,
            speed: 100.0,
        };
        TrackTable::from_rows(vec![row(0.0, "A"), row(0.0, "B"), row(5.0, "A"), row(10.0, "A")])
    }

    #[test]
    fn test_cursor_returns_one_bucket_and_advances() {
        let mut cursor = ReplayCursor::new(table(), 100.0);
        assert!(cursor.next_batch(99.0).is_none());

        let batch = cursor.next_batch(100.0).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].timestamp, 100.0);
        assert!(cursor.next_batch(100.0).is_none(), "bucket consumed exactly once");

        assert_eq!(cursor.next_time(), Some(105.0));
    }

    #[test]
    fn test_cursor_drains_overdue_buckets_in_order() {
        let mut cursor = ReplayCursor::new(table(), 0.0);
        let mut times = Vec::new();
        while let Some(batch) = cursor.next_batch(20.0) {
            times.push(batch[0].timestamp);
        }
        assert_eq!(times, vec![0.0, 5.0, 10.0]);
        assert!(cursor.is_finished());
        assert_eq!(cursor.remaining(), 0);
    }
}
