mod cache;
mod file;
mod memory;
mod osm;
mod overpass;

pub use crate::datasource::cache::TileCache;
pub use crate::datasource::file::OsmFileDataSource;
pub use crate::datasource::memory::MemoryTileDataSource;
pub use crate::datasource::osm::OsmTileDataSource;
pub use crate::datasource::overpass::{
    coordinate_precision, overpass_query, OverpassEndpoint, RemoteEndpoint, DEFAULT_ENDPOINT_URL,
};

#[cfg(test)]
pub use crate::datasource::memory::synthetic_tile_document;

use crate::elements::{TileData, TileIndex};
use crate::utils::Result;

/// Source of parsed tiles. Implementations are shared between worker
/// threads, and every call may block on disk or network.
pub trait TileDataSource: Sync + Send {
    /// True if `retrieve` can be served without a network round trip.
    fn is_tile_cache_available(&self, index: TileIndex, zoom: u32) -> bool;

    fn retrieve(&self, index: TileIndex, zoom: u32) -> Result<TileData>;

    /// Makes the tile cache-available without parsing it. Returns true if
    /// anything was fetched, false if the tile was already present.
    fn prefetch(&self, index: TileIndex, zoom: u32) -> Result<bool>;
}
