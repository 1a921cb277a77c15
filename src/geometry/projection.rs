//! Conversions between lon/lat degrees, spherical web mercator metres and
//! slippy-map tile indices.

use glam::DVec2;
use std::f64::consts::PI;

use crate::elements::{num_tiles_per_axis, LonLat, LonLatRect, TileIndex};

pub const EARTH_RADIUS: f64 = 6378137.0;

// keeps tile corners inside their own tile after a round trip
const TILE_EPSILON: f64 = 1e-9;

pub fn lonlat_to_xy(lonlat: &LonLat) -> DVec2 {
    let x = lonlat.lon.to_radians() * EARTH_RADIUS;
    let y = (lonlat.lat.to_radians() / 2.0 + PI / 4.0).tan().ln() * EARTH_RADIUS;
    DVec2::new(x, y)
}

pub fn xy_to_lonlat(xy: DVec2) -> LonLat {
    let lon = (xy.x / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (xy.y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
    LonLat::new(lon, lat)
}

/// Tile containing `lonlat`. Points beyond the mercator limits (or on the
/// antimeridian) are clamped onto the edge tiles.
pub fn lonlat_to_tile_index(lonlat: &LonLat, zoom: u32) -> TileIndex {
    let n = num_tiles_per_axis(zoom);
    let scale = n as f64;

    let x = ((lonlat.lon + 180.0) / 360.0 * scale + TILE_EPSILON).floor();

    let lat = lonlat.lat.to_radians();
    let y = ((1.0 - lat.tan().asinh() / PI) / 2.0 * scale + TILE_EPSILON).floor();

    let clamp = |v: f64| -> i32 {
        if v.is_nan() || v < 0.0 {
            0
        } else if v >= scale {
            n - 1
        } else {
            v as i32
        }
    };
    TileIndex::new(clamp(x), clamp(y))
}

/// Upper-left (north-west) corner of a tile.
pub fn tile_index_to_lonlat(index: TileIndex, zoom: u32) -> LonLat {
    let scale = num_tiles_per_axis(zoom) as f64;
    let lon = index.x as f64 / scale * 360.0 - 180.0;

    let n = PI - 2.0 * PI * index.y as f64 / scale;
    let lat = n.sinh().atan().to_degrees();
    LonLat::new(lon, lat)
}

pub fn lonlat_bounds_from_tile(index: TileIndex, zoom: u32) -> LonLatRect {
    let n = num_tiles_per_axis(zoom);

    let mut min = tile_index_to_lonlat(index, zoom);
    let mut max = tile_index_to_lonlat(index.offset(1, 1), zoom);
    if index.x + 1 >= n {
        max.lon = 180.0;
    }
    if index.y + 1 >= n {
        max.lat = -90.0;
    }

    // tile rows run north to south
    std::mem::swap(&mut min.lat, &mut max.lat);

    LonLatRect { min, max }
}

/// South-west corner of a tile, used as the floating origin. Unlike
/// `lonlat_bounds_from_tile` this is never clamped, so the last row stays
/// inside the projectable latitude range.
pub fn tile_origin(index: TileIndex, zoom: u32) -> LonLat {
    let west = tile_index_to_lonlat(index, zoom);
    let south = tile_index_to_lonlat(index.offset(0, 1), zoom);
    LonLat::new(west.lon, south.lat)
}
