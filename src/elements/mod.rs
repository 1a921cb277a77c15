mod features;
mod lonlat;
mod tile;
mod tileindex;

pub use crate::elements::features::{
    BuildingRecord, HighwayRecord, WaterFeatureRecord, DEFAULT_BUILDING_HEIGHT,
};
pub use crate::elements::lonlat::{LonLat, LonLatRect};
pub use crate::elements::tile::TileData;
pub use crate::elements::tileindex::{num_tiles_per_axis, TileIndex, TileRect, MAX_ZOOM};
