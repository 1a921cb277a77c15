use std::path::Path;

use crate::datasource::TileDataSource;
use crate::elements::{LonLatRect, TileData, TileIndex};
use crate::geometry::{lonlat_bounds_from_tile, lonlat_to_tile_index};
use crate::message;
use crate::osmxml::{collect_features, read_osm_xml, FeatureSet};
use crate::utils::{Result, Timer};

/// Serves tiles cut from a single local OSM XML extract, parsed once up
/// front. Each feature belongs to the tile containing its first point.
pub struct OsmFileDataSource {
    features: FeatureSet,
    bounds: Option<LonLatRect>,
}

impl OsmFileDataSource {
    pub fn from_bytes(data: &[u8]) -> Result<OsmFileDataSource> {
        let doc = read_osm_xml(data)?;
        let features = collect_features(&doc);
        let bounds = match doc.bounds {
            Some(b) => Some(b),
            None => {
                let mut b = LonLatRect::empty();
                for ll in doc.nodes.values() {
                    b.expand(ll);
                }
                if b.is_empty() {
                    None
                } else {
                    Some(b)
                }
            }
        };
        Ok(OsmFileDataSource { features, bounds })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<OsmFileDataSource> {
        let tx = Timer::new();
        let data = std::fs::read(path.as_ref())?;
        let res = OsmFileDataSource::from_bytes(&data)?;
        message!(
            "read {}: {} features in {:0.1}s",
            path.as_ref().display(),
            res.features.len(),
            tx.since()
        );
        Ok(res)
    }

    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    pub fn bounds(&self) -> Option<&LonLatRect> {
        self.bounds.as_ref()
    }
}

impl TileDataSource for OsmFileDataSource {
    fn is_tile_cache_available(&self, index: TileIndex, zoom: u32) -> bool {
        match &self.bounds {
            Some(b) => b.overlaps(&lonlat_bounds_from_tile(index, zoom)),
            None => false,
        }
    }

    fn retrieve(&self, index: TileIndex, zoom: u32) -> Result<TileData> {
        let bounds = lonlat_bounds_from_tile(index, zoom);
        Ok(self
            .features
            .select(|p| lonlat_to_tile_index(p, zoom) == index)
            .into_tile(index, zoom, bounds))
    }

    fn prefetch(&self, _index: TileIndex, _zoom: u32) -> Result<bool> {
        Ok(false)
    }
}
