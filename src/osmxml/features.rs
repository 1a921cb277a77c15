use crate::elements::{
    BuildingRecord, HighwayRecord, LonLat, LonLatRect, TileData, TileIndex, WaterFeatureRecord,
};
use crate::osmxml::{OsmDocument, OsmWay};
use crate::utils::parse_tag_number;

use std::collections::BTreeMap;

pub const METERS_PER_LEVEL: f64 = 3.0;
pub const PRIMARY_HIGHWAY_LANE_WIDTH_METERS: f64 = 2.0;
pub const RESIDENTIAL_HIGHWAY_LANE_WIDTH_METERS: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub enum Feature {
    Building(BuildingRecord),
    Highway(HighwayRecord),
    Water(WaterFeatureRecord),
}

/// Records extracted from one document, not yet assigned to a tile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSet {
    pub buildings: Vec<BuildingRecord>,
    pub highways: Vec<HighwayRecord>,
    pub water_features: Vec<WaterFeatureRecord>,
}

impl FeatureSet {
    pub fn push(&mut self, f: Feature) {
        match f {
            Feature::Building(b) => self.buildings.push(b),
            Feature::Highway(h) => self.highways.push(h),
            Feature::Water(w) => self.water_features.push(w),
        }
    }

    pub fn len(&self) -> usize {
        self.buildings.len() + self.highways.len() + self.water_features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_tile(self, index: TileIndex, zoom: u32, bounds: LonLatRect) -> TileData {
        let mut tile = TileData::new(index, zoom, bounds);
        tile.buildings = self.buildings;
        tile.highways = self.highways;
        tile.water_features = self.water_features;
        tile
    }

    /// Copies the records whose first point satisfies `keep`.
    pub fn select<F: Fn(&LonLat) -> bool>(&self, keep: F) -> FeatureSet {
        let inside = |pts: &[LonLat]| pts.first().map_or(false, &keep);
        FeatureSet {
            buildings: self
                .buildings
                .iter()
                .filter(|b| inside(&b.outline))
                .cloned()
                .collect(),
            highways: self
                .highways
                .iter()
                .filter(|h| inside(&h.points))
                .cloned()
                .collect(),
            water_features: self
                .water_features
                .iter()
                .filter(|w| inside(&w.outline))
                .cloned()
                .collect(),
        }
    }
}

fn resolve_points(way: &OsmWay, nodes: &BTreeMap<i64, LonLat>) -> Vec<LonLat> {
    way.refs.iter().filter_map(|r| nodes.get(r).copied()).collect()
}

fn resolve_ring(way: &OsmWay, nodes: &BTreeMap<i64, LonLat>) -> Option<Vec<LonLat>> {
    let mut pts = resolve_points(way, nodes);
    if pts.len() > 1 && pts.first() == pts.last() {
        pts.pop();
    }
    if pts.len() < 3 {
        return None;
    }
    Some(pts)
}

fn tag_number(way: &OsmWay, key: &str) -> Option<f64> {
    way.get_tag(key).and_then(parse_tag_number)
}

fn building_heights(way: &OsmWay) -> (f64, f64) {
    let height = tag_number(way, "height");
    let levels = tag_number(way, "building:levels");

    let total = match (height, levels) {
        (Some(h), _) => Some(h),
        (None, Some(l)) => Some(l * METERS_PER_LEVEL),
        (None, None) => None,
    };

    let min_height = tag_number(way, "min_height");
    let from_ground = match min_height {
        Some(mh) => Some(mh),
        None => tag_number(way, "building:min_levels").map(|ml| ml * METERS_PER_LEVEL),
    };

    let height_in_meters = match (total, from_ground) {
        // both measured in meters: thin slabs keep their tagged thickness
        (Some(t), Some(g)) if height.is_some() && min_height.is_some() => (t - g).max(0.0),
        (Some(t), Some(g)) => f64::max(t - g, METERS_PER_LEVEL),
        (Some(t), None) => t,
        (None, _) => crate::elements::DEFAULT_BUILDING_HEIGHT,
    };
    (
        height_in_meters.max(0.0),
        from_ground.unwrap_or(0.0).max(0.0),
    )
}

fn is_water(way: &OsmWay) -> bool {
    way.has_tag("water") || way.get_tag("natural") == Some("water")
}

/// Classifies a way as a building (or building part), highway or water
/// feature. Buildings take
/// precedence over highways, which take precedence over water. Refs to nodes
/// not present in `nodes` are skipped; a way left with too few points is
/// dropped.
pub fn classify_way(way: &OsmWay, nodes: &BTreeMap<i64, LonLat>) -> Option<Feature> {
    if way.has_tag("building") || way.has_tag("building:part") {
        let outline = resolve_ring(way, nodes)?;
        let (height_in_meters, height_from_ground) = building_heights(way);
        return Some(Feature::Building(BuildingRecord {
            outline,
            height_in_meters,
            height_from_ground,
        }));
    }

    if let Some(hw) = way.get_tag("highway") {
        let points = resolve_points(way, nodes);
        if points.len() < 2 {
            return None;
        }
        let lanes = match tag_number(way, "lanes") {
            Some(l) if l >= 1.0 => l,
            _ => 1.0,
        };
        let lane_width = if hw == "primary" {
            PRIMARY_HIGHWAY_LANE_WIDTH_METERS
        } else {
            RESIDENTIAL_HIGHWAY_LANE_WIDTH_METERS
        };
        return Some(Feature::Highway(HighwayRecord::new(
            points,
            lanes.round() as u32,
            lane_width * lanes,
        )));
    }

    if is_water(way) {
        let outline = resolve_ring(way, nodes)?;
        return Some(Feature::Water(WaterFeatureRecord::new(outline)));
    }
    None
}

pub fn collect_features(doc: &OsmDocument) -> FeatureSet {
    let mut res = FeatureSet::default();
    for w in &doc.ways {
        if let Some(f) = classify_way(w, &doc.nodes) {
            res.push(f);
        }
    }
    res
}
