use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, TryLockError};
use std::thread;
use std::time::Duration;

use crate::datasource::TileDataSource;
use crate::message;
use crate::streaming::{ActiveTiles, JobQueue, RetrieveTileJob};
use crate::utils::Timer;

/// State shared between the controller and the workers. The two mutexes are
/// never held at the same time.
#[derive(Debug, Default)]
pub struct SharedState {
    pub jobs: Mutex<JobQueue>,
    pub tiles: Mutex<ActiveTiles>,
    pub running: AtomicBool,
    /// Jobs taken off the queue and not yet finished. Only incremented while
    /// the job queue is locked.
    pub in_flight: AtomicUsize,
}

impl SharedState {
    pub fn new() -> SharedState {
        SharedState::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// True when no job is queued or being worked on.
    pub fn is_idle(&self) -> bool {
        let jobs = self.jobs.lock().unwrap();
        jobs.is_empty() && self.in_flight.load(Ordering::SeqCst) == 0
    }
}

#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub name: String,
    pub download: bool,
    pub lock_backoff: Duration,
    pub idle_sleep: Duration,
}

fn run_job(source: &dyn TileDataSource, job: &RetrieveTileJob, staged: &mut Vec<crate::elements::TileData>) {
    if job.add_immediately {
        match source.retrieve(job.tile_index, job.zoom) {
            Ok(t) => {
                staged.push(t);
            }
            Err(e) => {
                message!("dropping {}: {}", job, e);
            }
        }
    } else if let Err(e) = source.prefetch(job.tile_index, job.zoom) {
        message!("prefetch {} failed: {}", job, e);
    }
}

/// Body of one worker thread: repeatedly claim jobs, run them with no lock
/// held, then merge retrieved tiles into the active set. Returns when the
/// running flag is cleared.
pub fn run_worker(shared: Arc<SharedState>, source: Arc<dyn TileDataSource>, settings: WorkerSettings) {
    message!("{} started [download={}]", settings.name, settings.download);
    let mut num_jobs = 0;
    let tx = Timer::new();

    while shared.is_running() {
        let jobs = match shared.jobs.try_lock() {
            Ok(mut q) => {
                let jobs = q.take_jobs(
                    |j| source.is_tile_cache_available(j.tile_index, j.zoom),
                    settings.download,
                );
                shared.in_flight.fetch_add(jobs.len(), Ordering::SeqCst);
                jobs
            }
            Err(TryLockError::WouldBlock) => {
                thread::sleep(settings.lock_backoff);
                continue;
            }
            Err(TryLockError::Poisoned(_)) => {
                message!("{}: job queue poisoned, stopping", settings.name);
                break;
            }
        };

        if jobs.is_empty() {
            thread::sleep(settings.idle_sleep);
            continue;
        }

        let mut staged = Vec::new();
        for job in &jobs {
            if shared.is_running() {
                run_job(source.as_ref(), job, &mut staged);
            }
        }

        if !staged.is_empty() {
            let mut tiles = shared.tiles.lock().unwrap();
            for t in staged {
                tiles.merge(t);
            }
        }
        num_jobs += jobs.len();
        shared.in_flight.fetch_sub(jobs.len(), Ordering::SeqCst);
    }
    message!(
        "{} finished: {} jobs in {:0.1}s",
        settings.name,
        num_jobs,
        tx.since()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::{synthetic_tile_document, MemoryTileDataSource};
    use crate::elements::{TileIndex, TileRect};

    fn settings(download: bool) -> WorkerSettings {
        WorkerSettings {
            name: String::from("test-worker"),
            download,
            lock_backoff: Duration::from_millis(1),
            idle_sleep: Duration::from_millis(1),
        }
    }

    fn wait_idle(shared: &SharedState) {
        let tx = Timer::new();
        while !shared.is_idle() {
            assert!(tx.since() < 10.0, "workers did not finish");
            thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn test_cache_only_worker_leaves_cold_tiles() {
        let source = Arc::new(MemoryTileDataSource::new());
        let hot = TileIndex::new(3, 3);
        let cold = TileIndex::new(3, 4);
        source.insert(hot, 4, synthetic_tile_document(hot, 4).into_bytes(), true);
        source.insert(cold, 4, synthetic_tile_document(cold, 4).into_bytes(), false);

        let shared = Arc::new(SharedState::new());
        {
            let mut q = shared.jobs.lock().unwrap();
            q.push(RetrieveTileJob::new(cold, 4, true));
            q.push(RetrieveTileJob::new(hot, 4, true));
        }
        shared.running.store(true, Ordering::SeqCst);

        let (s, src) = (shared.clone(), source.clone());
        let h = thread::spawn(move || run_worker(s, src, settings(false)));

        let tx = Timer::new();
        while shared.tiles.lock().unwrap().is_empty() {
            assert!(tx.since() < 10.0);
            thread::sleep(Duration::from_millis(2));
        }
        thread::sleep(Duration::from_millis(20));
        shared.running.store(false, Ordering::SeqCst);
        h.join().unwrap();

        assert_eq!(shared.tiles.lock().unwrap().indices(), vec![hot]);
        let q = shared.jobs.lock().unwrap();
        assert_eq!(q.iter().copied().collect::<Vec<_>>(), vec![RetrieveTileJob::new(cold, 4, true)]);
        assert_eq!(source.retrieved(), vec![hot]);
    }

    #[test]
    fn test_download_worker() {
        let source = Arc::new(MemoryTileDataSource::new());
        let area = TileRect::new(TileIndex::new(2, 2), TileIndex::new(4, 4));
        for idx in area.iter() {
            source.insert(idx, 4, synthetic_tile_document(idx, 4).into_bytes(), false);
        }
        let shared = Arc::new(SharedState::new());
        {
            let mut q = shared.jobs.lock().unwrap();
            for idx in area.iter() {
                q.push(RetrieveTileJob::new(idx, 4, idx.x != 4));
            }
            // no document: the job is dropped
            q.push(RetrieveTileJob::new(TileIndex::new(9, 9), 4, true));
        }
        shared.running.store(true, Ordering::SeqCst);

        let mut handles = Vec::new();
        for download in [true, false] {
            let (s, src) = (shared.clone(), source.clone());
            let src: Arc<dyn TileDataSource> = src;
            handles.push(thread::spawn(move || run_worker(s, src, settings(download))));
        }
        wait_idle(&shared);
        shared.running.store(false, Ordering::SeqCst);
        for h in handles {
            h.join().unwrap();
        }

        let mut got = shared.tiles.lock().unwrap().indices();
        got.sort();
        let mut want: Vec<_> = area.iter().filter(|i| i.x != 4).collect();
        want.sort();
        assert_eq!(got, want);
        for idx in area.iter() {
            assert!(source.is_tile_cache_available(idx, 4));
        }
        assert!(shared.tiles.lock().unwrap().is_updated());
    }
}
