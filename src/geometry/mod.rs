pub mod kernel;
pub mod mesh;
pub mod projection;

pub use crate::geometry::kernel::{
    is_ccw, is_collinear, is_point_inside_triangle, is_polygon_ccw, normalize_ring,
    polygon_triangulation, remove_collinear_points,
};
pub use crate::geometry::mesh::{append_tile_geometry_vertices, build_vertices, Vertex};
pub use crate::geometry::projection::{
    lonlat_bounds_from_tile, lonlat_to_tile_index, lonlat_to_xy, tile_index_to_lonlat,
    tile_origin, xy_to_lonlat, EARTH_RADIUS,
};
