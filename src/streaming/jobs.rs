use std::collections::VecDeque;
use std::fmt;

use crate::elements::{TileIndex, TileRect};

/// Request for one tile. Tiles inside the view area are retrieved and added
/// to the active set; tiles in the surrounding ring are only prefetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrieveTileJob {
    pub tile_index: TileIndex,
    pub zoom: u32,
    pub add_immediately: bool,
}

impl RetrieveTileJob {
    pub fn new(tile_index: TileIndex, zoom: u32, add_immediately: bool) -> RetrieveTileJob {
        RetrieveTileJob {
            tile_index,
            zoom,
            add_immediately,
        }
    }

    fn same_tile(&self, other: &RetrieveTileJob) -> bool {
        self.tile_index == other.tile_index && self.zoom == other.zoom
    }
}

impl fmt::Display for RetrieveTileJob {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} zoom {} [{}]",
            self.tile_index,
            self.zoom,
            if self.add_immediately { "retrieve" } else { "prefetch" }
        )
    }
}

/// Pending jobs, oldest at the front.
#[derive(Debug, Default)]
pub struct JobQueue {
    jobs: VecDeque<RetrieveTileJob>,
}

impl JobQueue {
    pub fn new() -> JobQueue {
        JobQueue::default()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RetrieveTileJob> {
        self.jobs.iter()
    }

    /// Adds `job` at the back. If a job for the same tile is already queued
    /// it keeps its place and takes the new `add_immediately`; returns false
    /// when nothing changed.
    pub fn push(&mut self, job: RetrieveTileJob) -> bool {
        match self.jobs.iter_mut().find(|j| j.same_tile(&job)) {
            Some(j) => {
                if j.add_immediately == job.add_immediately {
                    false
                } else {
                    j.add_immediately = job.add_immediately;
                    true
                }
            }
            None => {
                self.jobs.push_back(job);
                true
            }
        }
    }

    /// Drops queued jobs for tiles outside `area`. Returns the number removed.
    pub fn retain_within(&mut self, area: &TileRect) -> usize {
        let before = self.jobs.len();
        self.jobs.retain(|j| area.contains(&j.tile_index));
        before - self.jobs.len()
    }

    /// Removes the jobs a worker should run now: every job `is_available`
    /// accepts, scanning from the back, then if `download` is set the oldest
    /// remaining job whatever its state.
    pub fn take_jobs<F>(&mut self, is_available: F, download: bool) -> Vec<RetrieveTileJob>
    where
        F: Fn(&RetrieveTileJob) -> bool,
    {
        let mut res = Vec::new();
        let mut i = self.jobs.len();
        while i > 0 {
            i -= 1;
            if is_available(&self.jobs[i]) {
                if let Some(j) = self.jobs.remove(i) {
                    res.push(j);
                }
            }
        }
        if download {
            if let Some(j) = self.jobs.pop_front() {
                res.push(j);
            }
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(x: i32, y: i32, add: bool) -> RetrieveTileJob {
        RetrieveTileJob::new(TileIndex::new(x, y), 16, add)
    }

    #[test]
    fn test_push_dedup() {
        let mut q = JobQueue::new();
        assert!(q.push(job(1, 1, false)));
        assert!(q.push(job(2, 1, true)));
        assert!(!q.push(job(1, 1, false)));
        assert_eq!(q.len(), 2);

        assert!(q.push(job(1, 1, true)));
        assert_eq!(q.len(), 2);
        assert_eq!(q.iter().next(), Some(&job(1, 1, true)));

        // another zoom is another tile
        assert!(q.push(RetrieveTileJob::new(TileIndex::new(1, 1), 15, true)));
        assert_eq!(q.len(), 3);
    }

    #[test]
    fn test_retain_within() {
        let mut q = JobQueue::new();
        for x in 0..5 {
            q.push(job(x, 0, false));
        }
        let area = TileRect::new(TileIndex::new(1, 0), TileIndex::new(3, 2));
        assert_eq!(q.retain_within(&area), 2);
        let xs: Vec<_> = q.iter().map(|j| j.tile_index.x).collect();
        assert_eq!(xs, vec![1, 2, 3]);
    }

    #[test]
    fn test_take_jobs() {
        let mut q = JobQueue::new();
        for x in 0..6 {
            q.push(job(x, 0, x % 2 == 0));
        }
        let cached = |j: &RetrieveTileJob| j.tile_index.x == 2 || j.tile_index.x == 4;

        // cache-only worker: available jobs, newest first
        let got = q.take_jobs(cached, false);
        assert_eq!(got, vec![job(4, 0, true), job(2, 0, true)]);
        assert_eq!(q.len(), 4);

        assert!(q.take_jobs(cached, false).is_empty());

        // download worker also takes the oldest job
        let got = q.take_jobs(|j| j.tile_index.x == 5, true);
        assert_eq!(got, vec![job(5, 0, false), job(0, 0, true)]);
        let xs: Vec<_> = q.iter().map(|j| j.tile_index.x).collect();
        assert_eq!(xs, vec![1, 3]);

        let mut empty = JobQueue::new();
        assert!(empty.take_jobs(|_| true, true).is_empty());
    }
}
