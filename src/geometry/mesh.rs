use glam::{DVec2, Vec3};
use std::sync::Arc;

use crate::elements::{LonLat, TileData};
use crate::geometry::kernel::{normalize_ring, polygon_triangulation};
use crate::geometry::projection::lonlat_to_xy;
use crate::message;

const TOP_COLOR: [f32; 3] = [0.9, 0.9, 0.9];
const SIDE_COLOR: [f32; 3] = [0.65, 0.65, 0.65];
const BOTTOM_COLOR: [f32; 3] = [0.35, 0.35, 0.35];
const ROAD_COLOR: [f32; 3] = [0.0, 0.5, 0.5];
const WATER_COLOR: [f32; 3] = [0.8314, 0.9451, 0.9765];

const UP: [f32; 3] = [0.0, 1.0, 0.0];
const DOWN: [f32; 3] = [0.0, -1.0, 0.0];

/// Vertex layout handed to the renderer. Scene space is y-up, with map x on
/// the x axis and map y (north) on the z axis.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub uv: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex {
    fn new(p: DVec2, height: f64, color: [f32; 3], uv: [f32; 2], normal: [f32; 3]) -> Vertex {
        Vertex {
            position: [p.x as f32, height as f32, p.y as f32],
            color,
            uv,
            normal,
        }
    }
}

struct LocalFrame {
    origin: DVec2,
}

impl LocalFrame {
    fn new(origin: &LonLat) -> LocalFrame {
        LocalFrame {
            origin: lonlat_to_xy(origin),
        }
    }

    /// Metres relative to the origin, not yet scaled.
    fn local(&self, p: &LonLat) -> DVec2 {
        lonlat_to_xy(p) - self.origin
    }

    fn ring(&self, outline: &[LonLat]) -> Vec<DVec2> {
        outline.iter().map(|p| self.local(p)).collect()
    }
}

/// Normalizes and triangulates an outline given in local metres. Returns the
/// cleaned ring and the triangle list, both still unscaled.
fn triangulate_outline(
    mut points: Vec<DVec2>,
    what: &str,
    tile: &TileData,
) -> (Vec<DVec2>, Vec<DVec2>) {
    let num_input = points.len();
    if !normalize_ring(&mut points) {
        message!(
            "{} in {} with {} points is still not CCW after normalizing",
            what,
            tile.index,
            num_input
        );
    }
    let mut triangles = Vec::new();
    if !polygon_triangulation(&points, &mut triangles) && points.len() >= 3 {
        message!(
            "{} in {}: triangulation stopped after {} of {} triangles",
            what,
            tile.index,
            triangles.len() / 3,
            points.len() - 2
        );
    }
    (points, triangles)
}

fn face_normal(a: &Vertex, b: &Vertex, c: &Vertex) -> [f32; 3] {
    let a = Vec3::from_array(a.position);
    let b = Vec3::from_array(b.position);
    let c = Vec3::from_array(c.position);
    (c - a).cross(b - a).normalize_or_zero().to_array()
}

/// Appends the vertices for every building, highway and water feature in
/// `tile`, positioned relative to `origin` and multiplied by `scale`. Returns
/// the number of vertices appended.
pub fn append_tile_geometry_vertices(
    tile: &TileData,
    origin: &LonLat,
    scale: f64,
    dest: &mut Vec<Vertex>,
) -> usize {
    let start = dest.len();
    let frame = LocalFrame::new(origin);

    for building in &tile.buildings {
        let (ring, triangles) = triangulate_outline(frame.ring(&building.outline), "building", tile);

        let base = building.height_from_ground * scale;
        let top = base + building.height_in_meters * scale;

        for p in &triangles {
            dest.push(Vertex::new(*p * scale, top, TOP_COLOR, [0.0, 0.0], UP));
        }
        for p in triangles.iter().rev() {
            dest.push(Vertex::new(*p * scale, base, BOTTOM_COLOR, [0.0, 0.0], DOWN));
        }

        let n = ring.len();
        if n < 3 {
            continue;
        }
        for j in 0..n {
            let p0 = ring[j] * scale;
            let p1 = ring[(j + 1) % n] * scale;

            let quad = [
                Vertex::new(p0, base, SIDE_COLOR, [0.0, 0.0], UP),
                Vertex::new(p1, base, SIDE_COLOR, [1.0, 0.0], UP),
                Vertex::new(p1, top, SIDE_COLOR, [1.0, 1.0], UP),
                Vertex::new(p1, top, SIDE_COLOR, [1.0, 1.0], UP),
                Vertex::new(p0, top, SIDE_COLOR, [0.0, 1.0], UP),
                Vertex::new(p0, base, SIDE_COLOR, [0.0, 0.0], UP),
            ];
            for tri in quad.chunks(3) {
                let normal = face_normal(&tri[0], &tri[1], &tri[2]);
                for v in tri {
                    dest.push(Vertex { normal, ..*v });
                }
            }
        }
    }

    for highway in &tile.highways {
        let width = highway.road_width * scale;
        for pair in highway.points.windows(2) {
            let a = frame.local(&pair[0]) * scale;
            let b = frame.local(&pair[1]) * scale;

            let dir = b - a;
            if dir.length_squared() == 0.0 {
                continue;
            }
            let side = dir.perp().normalize() * (width / 2.0);

            let p0 = a + side;
            let p1 = a - side;
            let p2 = b - side;
            let p3 = b + side;
            for p in [p0, p1, p2, p2, p3, p0] {
                dest.push(Vertex::new(p, 0.0, ROAD_COLOR, [0.0, 0.0], UP));
            }
        }
    }

    for water in &tile.water_features {
        let (_, triangles) = triangulate_outline(frame.ring(&water.outline), "water feature", tile);
        for p in &triangles {
            dest.push(Vertex::new(*p * scale, 0.0, WATER_COLOR, [0.0, 0.0], UP));
        }
    }

    dest.len() - start
}

/// Builds the full vertex list for a set of tiles.
pub fn build_vertices(tiles: &[Arc<TileData>], origin: &LonLat, scale: f64) -> Vec<Vertex> {
    let mut vertices = Vec::new();
    for t in tiles {
        append_tile_geometry_vertices(t, origin, scale, &mut vertices);
    }
    vertices
}
