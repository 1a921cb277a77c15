use std::sync::Arc;

use crate::elements::{TileData, TileIndex, TileRect};

/// Tiles currently shown, plus the flag telling the render path to rebuild
/// its vertex buffer.
#[derive(Debug, Default)]
pub struct ActiveTiles {
    tiles: Vec<Arc<TileData>>,
    updated: bool,
    view_area: Option<TileRect>,
}

impl ActiveTiles {
    pub fn new() -> ActiveTiles {
        ActiveTiles::default()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tiles(&self) -> &[Arc<TileData>] {
        &self.tiles
    }

    pub fn indices(&self) -> Vec<TileIndex> {
        self.tiles.iter().map(|t| t.index).collect()
    }

    pub fn is_updated(&self) -> bool {
        self.updated
    }

    pub fn mark_updated(&mut self) {
        self.updated = true;
    }

    /// Sets the view area and removes every tile outside it.
    pub fn set_view_area(&mut self, area: TileRect) -> usize {
        self.view_area = Some(area);
        let before = self.tiles.len();
        self.tiles.retain(|t| area.contains(&t.index));
        before - self.tiles.len()
    }

    /// Adds a finished tile, replacing any tile with the same index. Tiles
    /// outside the current view area are dropped.
    pub fn merge(&mut self, tile: TileData) -> bool {
        if let Some(area) = &self.view_area {
            if !area.contains(&tile.index) {
                return false;
            }
        }
        let tile = Arc::new(tile);
        match self.tiles.iter_mut().find(|t| t.index == tile.index) {
            Some(t) => {
                *t = tile;
            }
            None => {
                self.tiles.push(tile);
            }
        }
        self.updated = true;
        true
    }

    /// Returns a snapshot of the tiles if they changed since the last call.
    pub fn take_updated(&mut self) -> Option<Vec<Arc<TileData>>> {
        if !self.updated {
            return None;
        }
        self.updated = false;
        Some(self.tiles.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::lonlat_bounds_from_tile;

    fn tile(x: i32, y: i32) -> TileData {
        let idx = TileIndex::new(x, y);
        TileData::new(idx, 16, lonlat_bounds_from_tile(idx, 16))
    }

    #[test]
    fn test_merge_and_evict() {
        let mut a = ActiveTiles::new();
        assert!(a.take_updated().is_none());

        for (x, y) in [(5, 5), (5, 6), (7, 7)] {
            assert!(a.merge(tile(x, y)));
        }
        assert_eq!(a.len(), 3);
        assert_eq!(a.take_updated().map(|t| t.len()), Some(3));
        assert!(a.take_updated().is_none());

        let removed = a.set_view_area(TileRect::from_center_radius(TileIndex::new(5, 5), 1));
        assert_eq!(removed, 1);
        assert_eq!(a.indices(), vec![TileIndex::new(5, 5), TileIndex::new(5, 6)]);

        // late arrival outside the view is discarded
        assert!(!a.merge(tile(7, 7)));
        assert!(!a.is_updated());

        // same index replaces
        let mut t = tile(5, 6);
        t.zoom = 17;
        assert!(a.merge(t));
        assert_eq!(a.len(), 2);
        assert_eq!(a.tiles()[1].zoom, 17);
        assert!(a.is_updated());
    }
}
