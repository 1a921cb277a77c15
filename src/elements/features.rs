use crate::elements::LonLat;

pub const DEFAULT_BUILDING_HEIGHT: f64 = 6.0;

/// Building footprint. The outline is an open ring (first point differs from
/// the last) in lon/lat.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct BuildingRecord {
    pub outline: Vec<LonLat>,
    pub height_in_meters: f64,
    pub height_from_ground: f64,
}

impl BuildingRecord {
    pub fn new(outline: Vec<LonLat>) -> BuildingRecord {
        BuildingRecord {
            outline,
            height_in_meters: DEFAULT_BUILDING_HEIGHT,
            height_from_ground: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct HighwayRecord {
    pub points: Vec<LonLat>,
    pub num_lanes: u32,
    pub road_width: f64,
}

impl HighwayRecord {
    pub fn new(points: Vec<LonLat>, num_lanes: u32, road_width: f64) -> HighwayRecord {
        HighwayRecord {
            points,
            num_lanes,
            road_width,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct WaterFeatureRecord {
    pub outline: Vec<LonLat>,
}

impl WaterFeatureRecord {
    pub fn new(outline: Vec<LonLat>) -> WaterFeatureRecord {
        WaterFeatureRecord { outline }
    }
}
