use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use crate::datasource::TileDataSource;
use crate::elements::{TileData, TileIndex};
use crate::osmxml::parse_tile;
use crate::utils::{Error, Result};

type TileKey = (u32, i32, i32);

fn key(index: TileIndex, zoom: u32) -> TileKey {
    (zoom, index.x, index.y)
}

#[derive(Default)]
struct MemoryInner {
    documents: BTreeMap<TileKey, Vec<u8>>,
    cached: BTreeSet<TileKey>,
    retrieved: Vec<TileIndex>,
    prefetched: Vec<TileIndex>,
}

/// Serves OSM XML documents held in memory. A document only counts as
/// cache-available once it has been marked cached, prefetched or retrieved,
/// which lets tests drive the worker priority rules without a network.
#[derive(Default)]
pub struct MemoryTileDataSource {
    inner: Mutex<MemoryInner>,
}

impl MemoryTileDataSource {
    pub fn new() -> MemoryTileDataSource {
        MemoryTileDataSource::default()
    }

    pub fn insert(&self, index: TileIndex, zoom: u32, document: Vec<u8>, cached: bool) {
        let mut inner = self.inner.lock().unwrap();
        inner.documents.insert(key(index, zoom), document);
        if cached {
            inner.cached.insert(key(index, zoom));
        }
    }

    /// Tiles passed to `retrieve`, in call order.
    pub fn retrieved(&self) -> Vec<TileIndex> {
        self.inner.lock().unwrap().retrieved.clone()
    }

    /// Tiles passed to `prefetch`, in call order.
    pub fn prefetched(&self) -> Vec<TileIndex> {
        self.inner.lock().unwrap().prefetched.clone()
    }
}

impl TileDataSource for MemoryTileDataSource {
    fn is_tile_cache_available(&self, index: TileIndex, zoom: u32) -> bool {
        self.inner.lock().unwrap().cached.contains(&key(index, zoom))
    }

    fn retrieve(&self, index: TileIndex, zoom: u32) -> Result<TileData> {
        let data = {
            let mut inner = self.inner.lock().unwrap();
            inner.retrieved.push(index);
            match inner.documents.get(&key(index, zoom)) {
                Some(d) => d.clone(),
                None => {
                    return Err(Error::NotFound(format!("{} zoom {}", index, zoom)));
                }
            }
        };
        let tile = parse_tile(index, zoom, &data)?;
        self.inner.lock().unwrap().cached.insert(key(index, zoom));
        Ok(tile)
    }

    fn prefetch(&self, index: TileIndex, zoom: u32) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        inner.prefetched.push(index);
        let k = key(index, zoom);
        if !inner.documents.contains_key(&k) {
            return Err(Error::NotFound(format!("{} zoom {}", index, zoom)));
        }
        Ok(inner.cached.insert(k))
    }
}

/// A small valid document for `index`: the tile's bounds and one 3 level
/// building in the middle of the tile.
#[cfg(test)]
pub fn synthetic_tile_document(index: TileIndex, zoom: u32) -> String {
    let b = crate::geometry::lonlat_bounds_from_tile(index, zoom);
    let at = |fx: f64, fy: f64| {
        (
            b.min.lon + (b.max.lon - b.min.lon) * fx,
            b.min.lat + (b.max.lat - b.min.lat) * fy,
        )
    };
    let corners = [at(0.4, 0.4), at(0.6, 0.4), at(0.6, 0.6), at(0.4, 0.6)];

    let mut doc = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<osm version=\"0.6\">\n");
    doc.push_str(&format!(
        "  <bounds minlat=\"{}\" minlon=\"{}\" maxlat=\"{}\" maxlon=\"{}\"/>\n",
        b.min.lat, b.min.lon, b.max.lat, b.max.lon
    ));
    for (i, (lon, lat)) in corners.iter().enumerate() {
        doc.push_str(&format!(
            "  <node id=\"{}\" lat=\"{}\" lon=\"{}\"/>\n",
            i + 1,
            lat,
            lon
        ));
    }
    doc.push_str("  <way id=\"100\">\n");
    for r in [1, 2, 3, 4, 1] {
        doc.push_str(&format!("    <nd ref=\"{}\"/>\n", r));
    }
    doc.push_str("    <tag k=\"building\" v=\"yes\"/>\n");
    doc.push_str("    <tag k=\"building:levels\" v=\"3\"/>\n");
    doc.push_str("  </way>\n</osm>\n");
    doc
}
