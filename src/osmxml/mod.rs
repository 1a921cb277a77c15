mod features;
mod read_xml;

pub use crate::osmxml::features::{
    classify_way, collect_features, Feature, FeatureSet, METERS_PER_LEVEL,
    PRIMARY_HIGHWAY_LANE_WIDTH_METERS, RESIDENTIAL_HIGHWAY_LANE_WIDTH_METERS,
};
pub use crate::osmxml::read_xml::{read_osm_xml, OsmDocument, OsmWay, Tag};

use crate::elements::{TileData, TileIndex};
use crate::utils::{Error, Result};

/// Parses an OSM XML document fetched for one tile into its typed records.
/// The document must carry a `<bounds>` element.
pub fn parse_tile(index: TileIndex, zoom: u32, data: &[u8]) -> Result<TileData> {
    let doc = read_osm_xml(data)?;
    let bounds = match doc.bounds {
        Some(b) => b,
        None => {
            return Err(Error::XmlDataError(format!(
                "{} zoom {}: document has no bounds element",
                index, zoom
            )));
        }
    };
    Ok(collect_features(&doc).into_tile(index, zoom, bounds))
}
