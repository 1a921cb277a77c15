use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use glam::{DVec2, Vec3};

use crate::config::ViewerConfig;
use crate::datasource::TileDataSource;
use crate::elements::{LonLat, TileData, TileIndex, TileRect};
use crate::geometry::{
    build_vertices, lonlat_to_tile_index, lonlat_to_xy, tile_origin, xy_to_lonlat,
    Vertex,
};
use crate::message;
use crate::streaming::{run_worker, RetrieveTileJob, SharedState, WorkerSettings};
use crate::utils::{Error, Result};

/// Camera or player position in scene units, relative to the current
/// origin. Scene x is map x (east) and scene z is map y (north).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlayerState {
    pub position: Vec3,
}

impl PlayerState {
    pub fn new(position: Vec3) -> PlayerState {
        PlayerState { position }
    }
}

/// Keeps the tiles around a moving viewpoint loaded. The controller side
/// (`update_current_tile`, `tick`, `take_geometry`) runs on the caller's
/// thread; retrieval happens on worker threads started by `start`.
pub struct TileStreamer {
    config: ViewerConfig,
    source: Arc<dyn TileDataSource>,
    shared: Arc<SharedState>,
    workers: Vec<thread::JoinHandle<()>>,

    current_tile: Option<TileIndex>,
    view_area: Option<TileRect>,
    origin: LonLat,
}

impl TileStreamer {
    pub fn new(config: ViewerConfig, source: Arc<dyn TileDataSource>) -> Result<TileStreamer> {
        config.validate()?;
        let origin = config.start_location();
        Ok(TileStreamer {
            config,
            source,
            shared: Arc::new(SharedState::new()),
            workers: Vec::new(),
            current_tile: None,
            view_area: None,
            origin,
        })
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn zoom(&self) -> u32 {
        self.config.zoom_level
    }

    pub fn current_tile(&self) -> Option<TileIndex> {
        self.current_tile
    }

    pub fn view_area(&self) -> Option<TileRect> {
        self.view_area
    }

    /// Lon/lat of the scene origin: the minimum corner of the current tile.
    pub fn origin(&self) -> LonLat {
        self.origin
    }

    pub fn is_running(&self) -> bool {
        !self.workers.is_empty()
    }

    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Err(Error::InvalidInputError(String::from(
                "tile streamer already started",
            )));
        }
        self.shared.running.store(true, Ordering::SeqCst);

        for i in 0..self.config.num_workers {
            let settings = WorkerSettings {
                name: format!("tile-worker-{}", i),
                download: i < self.config.download_workers,
                lock_backoff: Duration::from_millis(self.config.lock_backoff_millis),
                idle_sleep: Duration::from_millis(self.config.idle_sleep_millis),
            };
            let shared = self.shared.clone();
            let source = self.source.clone();
            let h = thread::Builder::new()
                .name(settings.name.clone())
                .spawn(move || run_worker(shared, source, settings));
            match h {
                Ok(h) => {
                    self.workers.push(h);
                }
                Err(e) => {
                    self.shutdown()?;
                    return Err(Error::Io(e));
                }
            }
        }
        Ok(())
    }

    /// Clears the running flag and joins the workers. A worker blocked in a
    /// fetch finishes that call first.
    pub fn shutdown(&mut self) -> Result<()> {
        self.shared.running.store(false, Ordering::SeqCst);
        let mut res = Ok(());
        for h in std::mem::take(&mut self.workers) {
            if let Err(e) = h.join() {
                res = Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("failed to join {:?}", e),
                )));
            }
        }
        res
    }

    /// Moves the view to `new_tile`: resets the origin, evicts tiles outside
    /// the new view area and queues jobs for the tiles that were not already
    /// in view. Returns the number of jobs queued or changed.
    pub fn update_current_tile(&mut self, new_tile: TileIndex) -> usize {
        let zoom = self.config.zoom_level;
        self.current_tile = Some(new_tile);
        self.origin = tile_origin(new_tile, zoom);

        let new_view = TileRect::from_center_radius(new_tile, self.config.view_distance);
        let old_view = self.view_area.replace(new_view);

        let evicted = {
            let mut tiles = self.shared.tiles.lock().unwrap();
            let evicted = tiles.set_view_area(new_view);
            tiles.mark_updated();
            evicted
        };

        let fetch_area = TileRect::from_center_radius(
            new_tile,
            self.config.view_distance + self.config.prefetch_distance,
        );
        let wanted = |idx: &TileIndex| {
            idx.is_valid(zoom) && !old_view.map_or(false, |v| v.contains(idx))
        };

        let mut queued = 0;
        let pruned = {
            let mut jobs = self.shared.jobs.lock().unwrap();
            let pruned = jobs.retain_within(&fetch_area);

            // view tiles first so the download worker reaches them before the ring
            for idx in new_view.iter().filter(|i| wanted(i)) {
                if jobs.push(RetrieveTileJob::new(idx, zoom, true)) {
                    queued += 1;
                }
            }
            for idx in fetch_area.iter().filter(|i| !new_view.contains(i) && wanted(i)) {
                if jobs.push(RetrieveTileJob::new(idx, zoom, false)) {
                    queued += 1;
                }
            }
            pruned
        };
        message!(
            "current tile {}: view {}, {} evicted, {} queued, {} pruned",
            new_tile,
            new_view,
            evicted,
            queued,
            pruned
        );
        queued
    }

    /// Per-frame update. Derives the tile under `player`, and when it has
    /// changed moves the view there and rebases `player` onto the new origin.
    /// Returns true if the current tile changed.
    pub fn tick(&mut self, player: &mut PlayerState) -> bool {
        let scale = self.config.world_scale;
        let origin_xy = lonlat_to_xy(&self.origin);
        let world = DVec2::new(player.position.x as f64, player.position.z as f64) / scale + origin_xy;
        let tile = lonlat_to_tile_index(&xy_to_lonlat(world), self.config.zoom_level);
        if self.current_tile == Some(tile) {
            return false;
        }
        self.update_current_tile(tile);

        let local = (world - lonlat_to_xy(&self.origin)) * scale;
        player.position.x = local.x as f32;
        player.position.z = local.y as f32;
        true
    }

    /// Rebuilds the vertex list if the active tiles changed since the last
    /// call. Never blocks: returns None if the tile set is busy or unchanged.
    pub fn take_geometry(&self) -> Option<Vec<Vertex>> {
        let tiles = match self.shared.tiles.try_lock() {
            Ok(mut t) => t.take_updated()?,
            Err(_) => {
                return None;
            }
        };
        Some(build_vertices(&tiles, &self.origin, self.config.world_scale))
    }

    pub fn active_tiles(&self) -> Vec<Arc<TileData>> {
        self.shared.tiles.lock().unwrap().tiles().to_vec()
    }

    pub fn queued_jobs(&self) -> Vec<RetrieveTileJob> {
        self.shared.jobs.lock().unwrap().iter().copied().collect()
    }

    /// True when there are no queued or running jobs.
    pub fn is_idle(&self) -> bool {
        self.shared.is_idle()
    }
}

impl Drop for TileStreamer {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            message!("tile streamer shutdown: {}", e);
        }
    }
}
