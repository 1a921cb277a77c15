use crate::elements::{
    BuildingRecord, HighwayRecord, LonLatRect, TileIndex, WaterFeatureRecord,
};

/// Parsed content of one tile.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TileData {
    pub index: TileIndex,
    pub zoom: u32,
    pub bounds: LonLatRect,

    pub buildings: Vec<BuildingRecord>,
    pub highways: Vec<HighwayRecord>,
    pub water_features: Vec<WaterFeatureRecord>,
}

impl TileData {
    pub fn new(index: TileIndex, zoom: u32, bounds: LonLatRect) -> TileData {
        TileData {
            index,
            zoom,
            bounds,
            buildings: Vec::new(),
            highways: Vec::new(),
            water_features: Vec::new(),
        }
    }

    pub fn num_features(&self) -> usize {
        self.buildings.len() + self.highways.len() + self.water_features.len()
    }
}
